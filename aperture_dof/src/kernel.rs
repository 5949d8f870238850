// Copyright 2025 the Aperture Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Blur-kernel band derivation.

use aperture_dirty::{RevisionStamp, Tracked};
use aperture_imaging::{BlurKernel, BlurKernelShape};
use kurbo::Size;
use smallvec::SmallVec;

/// Pixel count at which an image earns the full 255 px maximum kernel
/// (8 megapixels; smaller images scale the maximum down by `sqrt`).
const REFERENCE_PIXEL_COUNT: f64 = 8.0 * 1024.0 * 1024.0;

/// Largest kernel size generated as a 1 px-wide circular transition step.
const SMALL_KERNEL_BREAK_POINT: u32 = 7;

/// Maximum number of large hexagonal kernels.
const MAX_LARGE_KERNELS: u32 = 5;

/// Upper bound on any kernel size (kernel maps are 8-bit).
const MAX_KERNEL_SIZE: f64 = 255.0;

/// A discrete blur step: one kernel and the relative share of the
/// focus-to-blur transition it occupies.
///
/// Widths are relative; only their ratios matter to gradient spacing.
#[derive(Copy, Clone, Debug, PartialEq)]
pub struct KernelBand {
    /// The blur kernel for this step.
    pub kernel: BlurKernel,
    /// Relative width of this step along the transition axis.
    pub width: f64,
}

impl KernelBand {
    /// Creates a new band.
    #[must_use]
    pub fn new(kernel: BlurKernel, width: f64) -> Self {
        Self { kernel, width }
    }
}

/// Band lists are bounded: up to 7 small circle bands plus 5 hexagons.
pub(crate) type KernelBands = SmallVec<[KernelBand; 12]>;

/// Derives a list of weighted blur-kernel bands from source size, blur
/// strength, and a target kernel count.
///
/// The derived band list is cached and recomputed only when an input
/// actually changed; [`kernel_bands`](Self::kernel_bands) is otherwise a
/// cheap cache read. The list is ordered by strictly increasing kernel
/// size, and an empty list means the configuration produces no visible
/// blur (strength effectively zero, or the image too small).
///
/// # Example
///
/// ```
/// use aperture_dof::KernelGenerator;
/// use kurbo::Size;
///
/// let mut generator = KernelGenerator::new();
/// generator.set_kernel_count(5);
/// generator.set_source_size(Size::new(4096.0, 4096.0));
/// generator.set_strength(1.0);
///
/// let bands = generator.kernel_bands();
/// assert_eq!(bands.last().unwrap().kernel.size, 255);
/// ```
#[derive(Clone, Debug)]
pub struct KernelGenerator {
    kernel_count: Tracked<u32>,
    source_size: Tracked<Size>,
    strength: Tracked<f64>,
    stamp: RevisionStamp,
    bands: KernelBands,
}

impl KernelGenerator {
    /// Creates a generator with unset inputs.
    ///
    /// All inputs start dirty; until a positive source size and a non-zero
    /// strength are provided, the generator derives an empty band list.
    #[must_use]
    pub fn new() -> Self {
        Self {
            kernel_count: Tracked::new_dirty_with_validator(1, |c| (1..=50).contains(c)),
            source_size: Tracked::new_dirty_with_validator(Size::ZERO, |s| {
                s.width > 0.0 && s.height > 0.0
            }),
            strength: Tracked::new_dirty_with_validator(0.0, |s| (0.0..=1.0).contains(s)),
            stamp: RevisionStamp::new(),
            bands: KernelBands::new(),
        }
    }

    /// Target number of discrete kernel steps.
    #[must_use]
    pub fn kernel_count(&self) -> u32 {
        *self.kernel_count.get()
    }

    /// Sets the target number of discrete kernel steps.
    ///
    /// # Panics
    ///
    /// Panics unless `count` is in `1..=50`.
    pub fn set_kernel_count(&mut self, count: u32) {
        self.kernel_count.set(count);
    }

    /// Source image dimensions in pixels.
    #[must_use]
    pub fn source_size(&self) -> Size {
        *self.source_size.get()
    }

    /// Sets the source image dimensions in pixels.
    ///
    /// # Panics
    ///
    /// Panics unless both dimensions are positive.
    pub fn set_source_size(&mut self, size: Size) {
        self.source_size.set(size);
    }

    /// Normalized blur strength.
    #[must_use]
    pub fn strength(&self) -> f64 {
        *self.strength.get()
    }

    /// Sets the normalized blur strength.
    ///
    /// # Panics
    ///
    /// Panics unless `strength` is in `[0.0, 1.0]`.
    pub fn set_strength(&mut self, strength: f64) {
        self.strength.set(strength);
    }

    /// Returns `true` if any input changed since the bands were last derived.
    #[must_use]
    pub fn is_dirty(&self) -> bool {
        self.stamp.is_stale(self.revision_sum())
    }

    /// Returns the kernel bands, recomputing them only if an input changed.
    pub fn kernel_bands(&mut self) -> &[KernelBand] {
        let sum = self.revision_sum();
        if self.stamp.is_stale(sum) {
            self.bands = self.derive_bands();
            self.stamp.observe(sum);
        }
        &self.bands
    }

    /// Appends this generator's bands to `out`.
    ///
    /// Two generators' lists concatenated into one accumulator share a
    /// single kernel index space, which is how a two-sided (asymmetric)
    /// blur transition is assembled.
    pub fn append_kernel_bands(&mut self, out: &mut Vec<KernelBand>) {
        out.extend_from_slice(self.kernel_bands());
    }

    fn revision_sum(&self) -> u64 {
        self.kernel_count.revision() + self.source_size.revision() + self.strength.revision()
    }

    fn derive_bands(&self) -> KernelBands {
        let mut bands = KernelBands::new();

        let max_kernel_size = self.max_kernel_size();
        if max_kernel_size == 0 {
            return bands;
        }

        // Stronger blur spends less of the transition range on the smallest
        // kernels.
        let transition_gradient = 0.7 / (1.0 + self.strength() * 2.0);

        for size in 1..=SMALL_KERNEL_BREAK_POINT.min(max_kernel_size) {
            bands.push(KernelBand::new(
                BlurKernel::new(BlurKernelShape::Circle, size),
                f64::from(size),
            ));
        }

        if max_kernel_size > SMALL_KERNEL_BREAK_POINT {
            let large_sizes = large_kernel_sizes(max_kernel_size);
            let kernel_count = self.kernel_count() as usize;
            for (i, &size) in large_sizes.iter().enumerate() {
                // The last requested band always reaches the maximum size, so
                // a single-kernel (preview) configuration blurs at full
                // strength with one kernel.
                let actual_size = if i + 1 >= kernel_count {
                    max_kernel_size
                } else {
                    size
                };
                bands.push(KernelBand::new(
                    BlurKernel::new(BlurKernelShape::Hexagon, actual_size),
                    f64::from(size),
                ));
            }
        }

        for band in &mut bands {
            band.width = band.width.powf(transition_gradient);
        }

        merge_equal_sizes(bands)
    }

    #[allow(
        clippy::cast_possible_truncation,
        clippy::cast_sign_loss,
        reason = "clamped to [0, 255] before truncation"
    )]
    fn max_kernel_size(&self) -> u32 {
        let size = self.source_size();
        let pixel_count = size.width * size.height;
        let max = ((pixel_count / REFERENCE_PIXEL_COUNT).sqrt() * MAX_KERNEL_SIZE
            * self.strength())
        .min(MAX_KERNEL_SIZE);
        max as u32
    }
}

impl Default for KernelGenerator {
    fn default() -> Self {
        Self::new()
    }
}

/// Evenly spaced large-kernel sizes between the small-kernel break point and
/// `max_kernel_size`, with a minimum spacing of 2 px.
fn large_kernel_sizes(max_kernel_size: u32) -> SmallVec<[u32; 5]> {
    let mut sizes = SmallVec::new();

    let count = MAX_LARGE_KERNELS.min((max_kernel_size - SMALL_KERNEL_BREAK_POINT) / 2);
    if count == 0 {
        return sizes;
    }

    let span = f64::from(max_kernel_size - SMALL_KERNEL_BREAK_POINT);
    let step = (span / f64::from(count + 1)).max(2.0);
    let min_size = f64::from(SMALL_KERNEL_BREAK_POINT) + step;

    for i in 0..count {
        #[allow(
            clippy::cast_possible_truncation,
            clippy::cast_sign_loss,
            reason = "sizes stay within (7, 255]"
        )]
        sizes.push((min_size + f64::from(i) * step) as u32);
    }
    sizes
}

/// Merges consecutive bands with equal kernel sizes by summing their widths.
///
/// Equal sizes only arise when trailing large bands were capped to the
/// maximum kernel size.
fn merge_equal_sizes(bands: KernelBands) -> KernelBands {
    let mut merged = KernelBands::new();
    let mut iter = bands.into_iter();
    let Some(mut previous) = iter.next() else {
        return merged;
    };
    for band in iter {
        if previous.kernel.size == band.kernel.size {
            previous.width += band.width;
        } else {
            merged.push(previous);
            previous = band;
        }
    }
    merged.push(previous);
    merged
}

#[cfg(test)]
mod tests {
    use super::*;

    fn configured(count: u32, size: Size, strength: f64) -> KernelGenerator {
        let mut generator = KernelGenerator::new();
        generator.set_kernel_count(count);
        generator.set_source_size(size);
        generator.set_strength(strength);
        generator
    }

    #[test]
    fn full_quality_at_reference_scale() {
        // 4096x4096 is twice the reference pixel count, so the raw maximum
        // overshoots and clamps to 255.
        let mut generator = configured(5, Size::new(4096.0, 4096.0), 1.0);
        let bands = generator.kernel_bands();

        assert_eq!(bands.len(), 12);
        for (i, band) in bands[..7].iter().enumerate() {
            assert_eq!(band.kernel.shape, BlurKernelShape::Circle);
            assert_eq!(band.kernel.size as usize, i + 1);
        }
        for band in &bands[7..] {
            assert_eq!(band.kernel.shape, BlurKernelShape::Hexagon);
        }
        assert_eq!(bands[11].kernel.size, 255);
    }

    #[test]
    fn sizes_strictly_increase_and_widths_are_positive() {
        let mut generator = configured(5, Size::new(3000.0, 2000.0), 0.8);
        let bands = generator.kernel_bands();
        assert!(!bands.is_empty());
        for pair in bands.windows(2) {
            assert!(pair[0].kernel.size < pair[1].kernel.size);
        }
        for band in bands {
            assert!(band.width > 0.0);
        }
    }

    #[test]
    fn small_band_widths_follow_the_transition_exponent() {
        let strength = 0.6;
        let mut generator = configured(5, Size::new(4096.0, 4096.0), strength);
        let g = 0.7 / (1.0 + strength * 2.0);
        let bands = generator.kernel_bands();
        for (i, band) in bands[..7].iter().enumerate() {
            let expected = ((i + 1) as f64).powf(g);
            assert!((band.width - expected).abs() < 1e-12);
        }
    }

    #[test]
    fn preview_count_merges_large_bands_into_one_max_kernel() {
        let mut generator = configured(1, Size::new(4096.0, 4096.0), 1.0);
        let bands = generator.kernel_bands();
        // 7 circles plus a single merged hexagon at the maximum size.
        assert_eq!(bands.len(), 8);
        assert_eq!(bands[7].kernel.shape, BlurKernelShape::Hexagon);
        assert_eq!(bands[7].kernel.size, 255);
    }

    #[test]
    fn zero_strength_produces_no_bands() {
        let mut generator = configured(5, Size::new(4096.0, 4096.0), 0.0);
        assert!(generator.kernel_bands().is_empty());
    }

    #[test]
    fn tiny_image_produces_no_bands() {
        let mut generator = configured(5, Size::new(10.0, 10.0), 1.0);
        assert!(generator.kernel_bands().is_empty());
    }

    #[test]
    fn no_large_bands_when_span_is_too_narrow() {
        // A maximum kernel size of 8 leaves no room for large kernels
        // ((8 - 7) / 2 == 0), so only the circles are produced.
        // 93x93 at full strength yields a maximum kernel size of 8.
        let mut generator = configured(5, Size::new(93.0, 93.0), 1.0);
        let bands = generator.kernel_bands();
        assert!(!bands.is_empty());
        assert!(bands.iter().all(|b| b.kernel.shape == BlurKernelShape::Circle));
    }

    #[test]
    fn cached_until_an_input_changes() {
        let mut generator = configured(5, Size::new(4096.0, 4096.0), 1.0);
        assert!(generator.is_dirty());
        let first: Vec<_> = generator.kernel_bands().to_vec();
        assert!(!generator.is_dirty());

        // Re-assigning identical inputs is not a change.
        generator.set_kernel_count(5);
        generator.set_source_size(Size::new(4096.0, 4096.0));
        generator.set_strength(1.0);
        assert!(!generator.is_dirty());
        assert_eq!(generator.kernel_bands(), first.as_slice());

        generator.set_strength(0.5);
        assert!(generator.is_dirty());
        assert_ne!(generator.kernel_bands(), first.as_slice());
    }

    #[test]
    fn append_concatenates_two_generators() {
        let mut a = configured(5, Size::new(4096.0, 4096.0), 1.0);
        let mut b = configured(5, Size::new(4096.0, 4096.0), 0.3);
        let mut combined = Vec::new();
        a.append_kernel_bands(&mut combined);
        let a_len = combined.len();
        b.append_kernel_bands(&mut combined);
        assert_eq!(combined.len(), a_len + b.kernel_bands().len());
        assert_eq!(&combined[..a_len], a.kernel_bands());
    }

    #[test]
    #[should_panic(expected = "value failed validation")]
    fn kernel_count_out_of_range_panics() {
        let mut generator = KernelGenerator::new();
        generator.set_kernel_count(51);
    }

    #[test]
    #[should_panic(expected = "value failed validation")]
    fn strength_out_of_range_panics() {
        let mut generator = KernelGenerator::new();
        generator.set_strength(1.1);
    }

    #[test]
    #[should_panic(expected = "value failed validation")]
    fn non_positive_size_panics() {
        let mut generator = KernelGenerator::new();
        generator.set_source_size(Size::new(0.0, 100.0));
    }
}
