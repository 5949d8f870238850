// Copyright 2025 the Aperture Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Aperture Dirty: generation-counted change tracking.
//!
//! This crate provides the building blocks for "recompute only what changed"
//! pipelines where a handful of input fields feed a derived, cached result.
//! Rather than mutable boolean flags, every tracked value carries an explicit
//! **revision counter** that is bumped when (and only when) the value actually
//! changes:
//!
//! - [`Tracked`]: a single value with optional validation, a revision counter,
//!   and a per-consumer "seen" watermark.
//! - [`RevisionStamp`]: group dirtiness over several trackers, detected by
//!   watching the *sum* of their revisions move past a recorded watermark.
//!
//! Revisions only ever grow, which is what makes the summed watermark sound:
//! any change to any member strictly increases the sum.
//!
//! # Quick start
//!
//! ```
//! use aperture_dirty::{RevisionStamp, Tracked};
//!
//! let mut strength = Tracked::with_validator(0.5_f64, |s| (0.0..=1.0).contains(s));
//! let mut count = Tracked::new(5_u32);
//!
//! let mut stamp = RevisionStamp::new();
//! assert!(stamp.is_stale(strength.revision() + count.revision()));
//!
//! // Consume the current state.
//! stamp.observe(strength.revision() + count.revision());
//! assert!(!stamp.is_stale(strength.revision() + count.revision()));
//!
//! // Setting an equal value is not a change...
//! strength.set(0.5);
//! assert!(!stamp.is_stale(strength.revision() + count.revision()));
//!
//! // ...but a different value is.
//! strength.set(0.25);
//! assert!(stamp.is_stale(strength.revision() + count.revision()));
//! ```

#![no_std]

mod tracker;

pub use tracker::{RevisionStamp, Tracked};
