// Copyright 2025 the Aperture Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Tracked values and group revision stamps.

/// A value with change detection, optional validation, and a revision counter.
///
/// `Tracked` wraps a value of type `T`. Every [`set`](Self::set) that actually
/// changes the value (by `PartialEq`) bumps the revision; assigning an equal
/// value leaves the revision untouched. A tracker is *dirty* while its
/// revision is ahead of the watermark recorded by the last
/// [`reset`](Self::reset).
///
/// Validation, when present, runs on every explicit `set` and rejects invalid
/// values by panicking at the assignment site. Construction never runs the
/// validator; constructors are expected to be handed already-valid defaults
/// (or to use [`new_dirty`](Self::new_dirty) for deliberately unset state).
///
/// # Example
///
/// ```
/// use aperture_dirty::Tracked;
///
/// let mut zoom = Tracked::new(1.0_f64);
/// assert!(!zoom.is_dirty());
///
/// zoom.set(1.0);
/// assert!(!zoom.is_dirty());
///
/// zoom.set(2.0);
/// assert!(zoom.is_dirty());
///
/// zoom.reset();
/// assert!(!zoom.is_dirty());
/// ```
#[derive(Clone)]
pub struct Tracked<T> {
    value: T,
    validator: Option<fn(&T) -> bool>,
    revision: u64,
    seen: u64,
}

impl<T: core::fmt::Debug> core::fmt::Debug for Tracked<T> {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("Tracked")
            .field("value", &self.value)
            .field("has_validator", &self.validator.is_some())
            .field("revision", &self.revision)
            .field("seen", &self.seen)
            .finish()
    }
}

impl<T> Tracked<T> {
    /// Creates a clean tracker holding `value`, with no validation.
    #[must_use]
    pub fn new(value: T) -> Self {
        Self {
            value,
            validator: None,
            revision: 0,
            seen: 0,
        }
    }

    /// Creates a clean tracker holding `value`, validated on every set.
    ///
    /// The validator is not run on `value` itself.
    #[must_use]
    pub fn with_validator(value: T, validator: fn(&T) -> bool) -> Self {
        Self {
            value,
            validator: Some(validator),
            revision: 0,
            seen: 0,
        }
    }

    /// Creates a tracker that starts out dirty.
    ///
    /// Useful for inputs whose initial value must be consumed at least once
    /// even if the caller never touches it (e.g. a default quality setting).
    #[must_use]
    pub fn new_dirty(value: T) -> Self {
        Self {
            value,
            validator: None,
            revision: 1,
            seen: 0,
        }
    }

    /// As [`new_dirty`](Self::new_dirty), with a validator for later sets.
    #[must_use]
    pub fn new_dirty_with_validator(value: T, validator: fn(&T) -> bool) -> Self {
        Self {
            value,
            validator: Some(validator),
            revision: 1,
            seen: 0,
        }
    }

    /// Returns a reference to the current value.
    #[must_use]
    pub fn get(&self) -> &T {
        &self.value
    }

    /// Returns `true` if the value changed since the last [`reset`](Self::reset).
    #[must_use]
    pub fn is_dirty(&self) -> bool {
        self.revision != self.seen
    }

    /// Marks the current value as consumed.
    pub fn reset(&mut self) {
        self.seen = self.revision;
    }

    /// Returns the revision counter.
    ///
    /// Starts at 0 (or 1 for [`new_dirty`](Self::new_dirty)) and increases by
    /// one on every effective change. Suitable for summing across trackers
    /// with a [`RevisionStamp`].
    #[must_use]
    pub fn revision(&self) -> u64 {
        self.revision
    }

    /// Bumps the revision without touching the value.
    ///
    /// For inputs whose change cannot be detected by `PartialEq`, such as an
    /// opaque image handle being swapped for another.
    pub fn touch(&mut self) {
        self.revision += 1;
    }

    /// Replaces the value, unconditionally counting it as a change.
    ///
    /// For types without a usable `PartialEq` (opaque handles, boxed
    /// sources): a replacement is treated like a reference change.
    pub fn replace(&mut self, value: T) {
        self.value = value;
        self.revision += 1;
    }
}

impl<T: PartialEq> Tracked<T> {
    /// Assigns a new value, bumping the revision if it differs from the old.
    ///
    /// The assignment happens unconditionally; only the revision bump is
    /// conditional on the value actually changing.
    ///
    /// # Panics
    ///
    /// Panics if the tracker has a validator and `value` fails it. Passing an
    /// out-of-range value is a programming error, not a runtime condition,
    /// and is never silently clamped.
    pub fn set(&mut self, value: T) {
        if let Some(validator) = self.validator {
            assert!(validator(&value), "Tracked::set: value failed validation");
        }
        if self.value != value {
            self.revision += 1;
        }
        self.value = value;
    }
}

/// Group dirtiness over several [`Tracked`] values.
///
/// A stamp records the last observed sum of member revisions. The group is
/// considered dirty ("stale") whenever the current sum differs from the
/// recorded one. Because revisions are monotonic, any member change strictly
/// increases the sum, so no change can be missed or cancelled out.
///
/// A freshly created stamp is stale for any revision sum, so derived state is
/// always computed at least once.
///
/// # Example
///
/// ```
/// use aperture_dirty::{RevisionStamp, Tracked};
///
/// let mut a = Tracked::new(1_u32);
/// let mut b = Tracked::new(2_u32);
/// let mut stamp = RevisionStamp::new();
///
/// assert!(stamp.is_stale(a.revision() + b.revision()));
/// stamp.observe(a.revision() + b.revision());
///
/// b.set(3);
/// assert!(stamp.is_stale(a.revision() + b.revision()));
/// ```
#[derive(Clone, Copy, Debug)]
pub struct RevisionStamp {
    observed: Option<u64>,
}

impl RevisionStamp {
    /// Creates a stamp that has observed nothing yet.
    #[must_use]
    pub fn new() -> Self {
        Self { observed: None }
    }

    /// Returns `true` if `revision_sum` differs from the last observed sum,
    /// or if nothing has been observed yet.
    #[must_use]
    pub fn is_stale(&self, revision_sum: u64) -> bool {
        self.observed != Some(revision_sum)
    }

    /// Records `revision_sum` as consumed.
    pub fn observe(&mut self, revision_sum: u64) {
        self.observed = Some(revision_sum);
    }
}

impl Default for RevisionStamp {
    fn default() -> Self {
        Self::new()
    }
}
