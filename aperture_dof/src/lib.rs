// Copyright 2025 the Aperture Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Aperture DoF: depth-of-field planning for a lens-blur compositor.
//!
//! This crate turns focus geometry and a blur strength into everything a
//! spatially varying blur backend needs: a list of blur kernels and a
//! *kernel map* described as a gradient whose stop levels are kernel
//! indices. It never touches pixels; rasterizing the map and compositing
//! the blur are backend work behind the `aperture_imaging` traits.
//!
//! Three focus strategies are provided:
//!
//! - **Elliptic focus** ([`EllipticFocusDepthOfField`]): sharp inside an
//!   ellipse, blur ramping radially outside it.
//! - **Lens tilt** ([`LensTiltDepthOfField`]): a sharp band with an
//!   independent blur strength beyond each edge.
//! - **Focus object** ([`FocusObjectDepthOfField`]): a masked object kept
//!   sharp, with independent strengths above and below a horizon line.
//!
//! All three implement [`DepthOfFieldEffect`]. Preparing an effect is
//! incremental: inputs are change-tracked, and an untouched effect
//! re-prepares without recomputing kernels, gradients, or the kernel-map
//! request.
//!
//! ## Quick Start
//!
//! ```rust
//! use aperture_dof::{
//!     DepthOfFieldEffect, EllipticFocusDepthOfField, FocusEllipse, Prepared, Quality,
//! };
//! use aperture_imaging::{ImageInfo, ImageSource};
//! use kurbo::{Point, Vec2};
//!
//! struct Photo;
//! impl ImageSource for Photo {
//!     fn info(&self) -> ImageInfo {
//!         ImageInfo::new(4096, 4096)
//!     }
//! }
//!
//! let focus = FocusEllipse::new(Point::new(0.5, 0.5), Vec2::new(0.25, 0.15));
//! let mut effect = EllipticFocusDepthOfField::new(Photo, focus, 0.8, Quality::Full);
//!
//! match effect.prepare() {
//!     Prepared::Blur(params) => {
//!         // Hand `params` to a lens-blur compositor.
//!         assert!(!params.kernels.is_empty());
//!     }
//!     Prepared::Passthrough => {
//!         // Render the source unblurred.
//!     }
//! }
//! ```
//!
//! The lower-level pieces are exported too: [`KernelGenerator`] derives
//! kernel shapes, sizes, and band widths from strength and image size;
//! [`linear_gradient`] and [`radial_gradient`] turn kernel bands and focus
//! geometry into gradient stops; [`FocusBand`] and [`band_from_horizon`]
//! cover the focus-band geometry.

mod effect;
mod geom;
mod gradient;
mod kernel;

pub use effect::{
    DepthOfFieldEffect, EllipticFocusDepthOfField, FocusObjectDepthOfField, LensTiltDepthOfField,
    Prepared, Quality,
};
pub use geom::{BandEdge, FocusBand, FocusEllipse, band_from_horizon, upper_edge};
pub use gradient::{
    MIN_DIFF_BETWEEN_STOPS, ensure_min_diff_between_stops, linear_gradient, radial_gradient,
};
pub use kernel::{KernelBand, KernelGenerator};
