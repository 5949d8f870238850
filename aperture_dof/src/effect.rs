// Copyright 2025 the Aperture Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Depth-of-field effect orchestration.
//!
//! Three strategies — elliptic focus, lens tilt (focus band), and focus
//! object (mask + horizon) — wire kernel generation, focus geometry, and
//! gradient-stop generation into a single *prepare* step. Preparing is
//! incremental: each effect tracks its inputs and rebuilds only the pieces
//! whose inputs actually changed, so re-preparing an untouched effect is a
//! cache read.

use aperture_dirty::Tracked;
use aperture_imaging::{
    BlurKernel, EdgeMirroring, FocusEdgeSoftening, GradientSpec, ImageInfo, ImageSource,
    KernelMapSpec, KernelMapType, LensBlurParams,
};
use kurbo::{Point, Size};

use crate::geom::{BandEdge, FocusBand, FocusEllipse, band_from_horizon, upper_edge};
use crate::gradient::{linear_gradient, radial_gradient};
use crate::kernel::{KernelBand, KernelGenerator};

/// Rendering quality of a depth-of-field effect.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub enum Quality {
    /// Fast preview: a single kernel step at full blur strength.
    Preview,
    /// Full quality: five kernel steps for a progressive transition.
    Full,
}

impl Quality {
    /// Number of discrete kernel steps requested from each generator.
    #[must_use]
    pub fn kernel_count(self) -> u32 {
        match self {
            Self::Preview => 1,
            Self::Full => 5,
        }
    }

    /// The quality exposure handed to the compositor.
    #[must_use]
    pub fn rendering_quality(self) -> f64 {
        match self {
            Self::Preview => 0.5,
            Self::Full => 1.0,
        }
    }
}

/// The outcome of preparing an effect for rendering.
#[derive(Debug)]
pub enum Prepared<'a> {
    /// No blur is needed; the caller should render the raw source image and
    /// bypass the blur stage entirely.
    Passthrough,
    /// Blur is needed; the parameters to hand to the lens-blur compositor.
    Blur(LensBlurParams<'a>),
}

impl Prepared<'_> {
    /// Returns `true` if blurring is needed.
    #[must_use]
    pub fn blur_needed(&self) -> bool {
        matches!(self, Self::Blur(_))
    }
}

/// The lens-blur configuration owned by an effect.
///
/// Holds the kernels and kernel-map request most recently computed by a
/// prepare, plus the compositor settings the active strategy selected.
#[derive(Clone, Debug)]
struct LensBlurState {
    kernels: Vec<BlurKernel>,
    kernel_map: Option<KernelMapSpec>,
    map_type: KernelMapType,
    edge_mirroring: EdgeMirroring,
    edge_softening: FocusEdgeSoftening,
    map_generation: u64,
}

impl LensBlurState {
    fn new() -> Self {
        Self {
            kernels: Vec::new(),
            kernel_map: None,
            map_type: KernelMapType::Continuous,
            edge_mirroring: EdgeMirroring::Off,
            edge_softening: FocusEdgeSoftening::Off,
            map_generation: 0,
        }
    }

    fn set_map(&mut self, spec: KernelMapSpec) {
        self.kernel_map = Some(spec);
        self.map_generation += 1;
    }
}

/// State shared by all three strategies: the source image, the tracked
/// quality setting, the per-prepare source-size cache, and the owned
/// lens-blur configuration.
struct EffectCore<S> {
    source: S,
    cached_info: Option<ImageInfo>,
    quality: Tracked<Quality>,
    lens: LensBlurState,
}

impl<S: core::fmt::Debug> core::fmt::Debug for EffectCore<S> {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("EffectCore")
            .field("source", &self.source)
            .field("cached_info", &self.cached_info)
            .field("quality", &self.quality)
            .field("lens", &self.lens)
            .finish()
    }
}

impl<S: ImageSource> EffectCore<S> {
    fn new(source: S, quality: Quality) -> Self {
        let mut tracked_quality = Tracked::new_dirty(Quality::Preview);
        tracked_quality.set(quality);
        Self {
            source,
            cached_info: None,
            quality: tracked_quality,
            lens: LensBlurState::new(),
        }
    }

    /// Starts a prepare cycle: the source size is re-queried once per
    /// prepare, so a resized or replaced source is picked up.
    fn begin_prepare(&mut self) {
        self.cached_info = None;
    }

    fn source_info(&mut self) -> ImageInfo {
        match self.cached_info {
            Some(info) => info,
            None => {
                let info = self.source.info();
                self.cached_info = Some(info);
                info
            }
        }
    }

    fn source_size(&mut self) -> Size {
        self.source_info().size()
    }

    /// Kernel maps are rasterized at half the source resolution.
    fn kernel_map_size(&mut self) -> ImageInfo {
        let info = self.source_info();
        ImageInfo::new(info.width / 2, info.height / 2)
    }

    fn set_source(&mut self, source: S) {
        self.source = source;
        self.cached_info = None;
    }

    /// Shared tail of every prepare: derive the blend width, map the
    /// quality exposure, and consume the quality tracker. The quality
    /// tracker is only consumed when blur applies, so a passthrough prepare
    /// leaves a later, blurring prepare with the dirtiness it needs.
    fn finish_prepare(&mut self, blur_applies: bool) -> Prepared<'_> {
        if !blur_applies {
            return Prepared::Passthrough;
        }
        let rendering_quality = self.quality.get().rendering_quality();
        self.quality.reset();

        let Some(kernel_map) = self.lens.kernel_map.as_ref() else {
            return Prepared::Passthrough;
        };
        let max_kernel_size = self.lens.kernels.iter().map(|k| k.size).max().unwrap_or(0);

        Prepared::Blur(LensBlurParams {
            kernels: &self.lens.kernels,
            kernel_map,
            map_type: self.lens.map_type,
            edge_mirroring: self.lens.edge_mirroring,
            edge_softening: self.lens.edge_softening,
            blend_kernel_width: max_kernel_size / 2,
            rendering_quality,
        })
    }
}

/// The operations common to every depth-of-field strategy.
///
/// An effect owns its source image, its lens-blur configuration, and (for
/// the focus-object strategy) its object mask; dropping the effect releases
/// them all.
pub trait DepthOfFieldEffect {
    /// The bound source image type.
    type Source: ImageSource;

    /// Current rendering quality.
    fn quality(&self) -> Quality;

    /// Sets the rendering quality.
    fn set_quality(&mut self, quality: Quality);

    /// The bound source image.
    fn source(&self) -> &Self::Source;

    /// Replaces the source image, invalidating the cached source size.
    fn set_source(&mut self, source: Self::Source);

    /// Recomputes whatever changed and returns either the lens-blur
    /// parameters or [`Prepared::Passthrough`] when no blur is needed.
    ///
    /// Idempotent while no input changes: a second prepare returns the same
    /// parameters without rebuilding kernels, gradients, or the kernel-map
    /// request.
    fn prepare(&mut self) -> Prepared<'_>;

    /// The kernel list most recently computed by a prepare.
    fn kernels(&self) -> &[BlurKernel];

    /// The kernel-map request most recently computed by a prepare.
    fn kernel_map(&self) -> Option<&KernelMapSpec>;

    /// Bumped every time the kernel-map request is rebuilt. Lets callers
    /// (and tests) observe that untouched prepares rebuild nothing.
    fn map_generation(&self) -> u64;
}

fn valid_strength(strength: &f64) -> bool {
    (0.0..=1.0).contains(strength)
}

/// A depth-of-field effect with an elliptic focus area.
///
/// Content inside the ellipse stays sharp; blur ramps up radially outside
/// it. In [`Quality::Full`], the blur strengthens progressively along the
/// ellipse's radii.
///
/// # Example
///
/// ```
/// use aperture_dof::{
///     DepthOfFieldEffect, EllipticFocusDepthOfField, FocusEllipse, Quality,
/// };
/// use aperture_imaging::{ImageInfo, ImageSource};
/// use kurbo::{Point, Vec2};
///
/// struct Photo;
/// impl ImageSource for Photo {
///     fn info(&self) -> ImageInfo {
///         ImageInfo::new(4096, 4096)
///     }
/// }
///
/// let ellipse = FocusEllipse::new(Point::new(0.5, 0.5), Vec2::new(0.25, 0.15));
/// let mut effect = EllipticFocusDepthOfField::new(Photo, ellipse, 0.8, Quality::Full);
/// let prepared = effect.prepare();
/// assert!(prepared.blur_needed());
/// ```
pub struct EllipticFocusDepthOfField<S> {
    core: EffectCore<S>,
    focus_area: Tracked<FocusEllipse>,
    strength: Tracked<f64>,
    generator: KernelGenerator,
}

impl<S: core::fmt::Debug> core::fmt::Debug for EllipticFocusDepthOfField<S> {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("EllipticFocusDepthOfField")
            .field("core", &self.core)
            .field("focus_area", &self.focus_area)
            .field("strength", &self.strength)
            .field("generator", &self.generator)
            .finish()
    }
}

impl<S: ImageSource> EllipticFocusDepthOfField<S> {
    /// Creates the effect.
    ///
    /// # Panics
    ///
    /// Panics unless `strength` is in `[0.0, 1.0]`.
    pub fn new(source: S, focus_area: FocusEllipse, strength: f64, quality: Quality) -> Self {
        let mut tracked_strength = Tracked::new_dirty_with_validator(0.0, valid_strength);
        tracked_strength.set(strength);
        Self {
            core: EffectCore::new(source, quality),
            focus_area: Tracked::new_dirty(focus_area),
            strength: tracked_strength,
            generator: KernelGenerator::new(),
        }
    }

    /// The elliptic focus area.
    #[must_use]
    pub fn focus_area(&self) -> FocusEllipse {
        *self.focus_area.get()
    }

    /// Sets the elliptic focus area.
    pub fn set_focus_area(&mut self, focus_area: FocusEllipse) {
        self.focus_area.set(focus_area);
    }

    /// The blur strength.
    #[must_use]
    pub fn strength(&self) -> f64 {
        *self.strength.get()
    }

    /// Sets the blur strength.
    ///
    /// # Panics
    ///
    /// Panics unless `strength` is in `[0.0, 1.0]`.
    pub fn set_strength(&mut self, strength: f64) {
        self.strength.set(strength);
    }

    fn try_prepare_lens_blur(&mut self) -> bool {
        let kernel_count = self.core.quality.get().kernel_count();
        let source_size = self.core.source_size();
        self.generator.set_kernel_count(kernel_count);
        self.generator.set_source_size(source_size);
        self.generator.set_strength(*self.strength.get());

        // Snapshot dirtiness before fetching: the fetch consumes it.
        let quality_dirty = self.core.quality.is_dirty();
        let generator_dirty = self.generator.is_dirty();
        let bands: Vec<KernelBand> = self.generator.kernel_bands().to_vec();
        let blur_applies = !bands.is_empty();

        if blur_applies && (quality_dirty || generator_dirty || self.focus_area.is_dirty()) {
            if let Some(gradient) = radial_gradient(self.focus_area.get(), &bands) {
                let size = self.core.kernel_map_size();
                self.core.lens.set_map(KernelMapSpec {
                    gradient: GradientSpec::Radial(gradient),
                    size,
                    masked: false,
                });
            }
            self.core.lens.kernels = bands.iter().map(|band| band.kernel).collect();
            self.core.lens.map_type = KernelMapType::Continuous;
            self.core.lens.edge_mirroring = EdgeMirroring::Off;
            self.core.lens.edge_softening = FocusEdgeSoftening::Off;
        }

        self.strength.reset();
        self.focus_area.reset();

        blur_applies
    }
}

impl<S: ImageSource> DepthOfFieldEffect for EllipticFocusDepthOfField<S> {
    type Source = S;

    fn quality(&self) -> Quality {
        *self.core.quality.get()
    }

    fn set_quality(&mut self, quality: Quality) {
        self.core.quality.set(quality);
    }

    fn source(&self) -> &S {
        &self.core.source
    }

    fn set_source(&mut self, source: S) {
        self.core.set_source(source);
    }

    fn prepare(&mut self) -> Prepared<'_> {
        self.core.begin_prepare();
        let blur_applies = self.try_prepare_lens_blur();
        self.core.finish_prepare(blur_applies)
    }

    fn kernels(&self) -> &[BlurKernel] {
        &self.core.lens.kernels
    }

    fn kernel_map(&self) -> Option<&KernelMapSpec> {
        self.core.lens.kernel_map.as_ref()
    }

    fn map_generation(&self) -> u64 {
        self.core.lens.map_generation
    }
}

/// A depth-of-field effect that imitates a tilted lens: a user-defined band
/// stays in focus, and blur strengthens outward from both of its edges,
/// with an independent strength per edge.
pub struct LensTiltDepthOfField<S> {
    core: EffectCore<S>,
    focus_band: Tracked<FocusBand>,
    edge1_generator: KernelGenerator,
    edge2_generator: KernelGenerator,
}

impl<S: core::fmt::Debug> core::fmt::Debug for LensTiltDepthOfField<S> {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("LensTiltDepthOfField")
            .field("core", &self.core)
            .field("focus_band", &self.focus_band)
            .field("edge1_generator", &self.edge1_generator)
            .field("edge2_generator", &self.edge2_generator)
            .finish()
    }
}

impl<S: ImageSource> LensTiltDepthOfField<S> {
    /// Creates the effect.
    ///
    /// # Panics
    ///
    /// Panics unless both strengths are in `[0.0, 1.0]`.
    pub fn new(
        source: S,
        focus_band: FocusBand,
        strength_at_edge1: f64,
        strength_at_edge2: f64,
        quality: Quality,
    ) -> Self {
        let mut edge1_generator = KernelGenerator::new();
        let mut edge2_generator = KernelGenerator::new();
        edge1_generator.set_strength(strength_at_edge1);
        edge2_generator.set_strength(strength_at_edge2);
        Self {
            core: EffectCore::new(source, quality),
            focus_band: Tracked::new_dirty(focus_band),
            edge1_generator,
            edge2_generator,
        }
    }

    /// The in-focus band.
    #[must_use]
    pub fn focus_band(&self) -> FocusBand {
        *self.focus_band.get()
    }

    /// Sets the in-focus band.
    pub fn set_focus_band(&mut self, focus_band: FocusBand) {
        self.focus_band.set(focus_band);
    }

    /// Blur strength on the edge1 side of the band.
    #[must_use]
    pub fn strength_at_edge1(&self) -> f64 {
        self.edge1_generator.strength()
    }

    /// Sets the blur strength on the edge1 side.
    ///
    /// # Panics
    ///
    /// Panics unless `strength` is in `[0.0, 1.0]`.
    pub fn set_strength_at_edge1(&mut self, strength: f64) {
        self.edge1_generator.set_strength(strength);
    }

    /// Blur strength on the edge2 side of the band.
    #[must_use]
    pub fn strength_at_edge2(&self) -> f64 {
        self.edge2_generator.strength()
    }

    /// Sets the blur strength on the edge2 side.
    ///
    /// # Panics
    ///
    /// Panics unless `strength` is in `[0.0, 1.0]`.
    pub fn set_strength_at_edge2(&mut self, strength: f64) {
        self.edge2_generator.set_strength(strength);
    }

    fn try_prepare_lens_blur(&mut self) -> bool {
        let kernel_count = self.core.quality.get().kernel_count();
        let source_size = self.core.source_size();
        self.edge1_generator.set_kernel_count(kernel_count);
        self.edge2_generator.set_kernel_count(kernel_count);
        self.edge1_generator.set_source_size(source_size);
        self.edge2_generator.set_source_size(source_size);

        let quality_dirty = self.core.quality.is_dirty();
        let generators_dirty = self.edge1_generator.is_dirty() || self.edge2_generator.is_dirty();

        let edge1_bands: Vec<KernelBand> = self.edge1_generator.kernel_bands().to_vec();
        let edge2_bands: Vec<KernelBand> = self.edge2_generator.kernel_bands().to_vec();
        let blur_applies = !(edge1_bands.is_empty() && edge2_bands.is_empty());

        if quality_dirty || generators_dirty {
            let kernels: Vec<BlurKernel> = edge1_bands
                .iter()
                .chain(&edge2_bands)
                .map(|band| band.kernel)
                .collect();
            if !kernels.is_empty() {
                self.core.lens.kernels = kernels;
            }
        }

        if blur_applies && (quality_dirty || generators_dirty || self.focus_band.is_dirty()) {
            let gradient = linear_gradient(
                self.focus_band.get(),
                source_size,
                &edge1_bands,
                &edge2_bands,
                false,
            );
            let size = self.core.kernel_map_size();
            self.core.lens.set_map(KernelMapSpec {
                gradient: GradientSpec::Linear(gradient),
                size,
                masked: false,
            });
            self.core.lens.map_type = KernelMapType::Continuous;
            self.core.lens.edge_mirroring = EdgeMirroring::Off;
            self.core.lens.edge_softening = FocusEdgeSoftening::Off;
        }

        self.focus_band.reset();

        blur_applies
    }
}

impl<S: ImageSource> DepthOfFieldEffect for LensTiltDepthOfField<S> {
    type Source = S;

    fn quality(&self) -> Quality {
        *self.core.quality.get()
    }

    fn set_quality(&mut self, quality: Quality) {
        self.core.quality.set(quality);
    }

    fn source(&self) -> &S {
        &self.core.source
    }

    fn set_source(&mut self, source: S) {
        self.core.set_source(source);
    }

    fn prepare(&mut self) -> Prepared<'_> {
        self.core.begin_prepare();
        let blur_applies = self.try_prepare_lens_blur();
        self.core.finish_prepare(blur_applies)
    }

    fn kernels(&self) -> &[BlurKernel] {
        &self.core.lens.kernels
    }

    fn kernel_map(&self) -> Option<&KernelMapSpec> {
        self.core.lens.kernel_map.as_ref()
    }

    fn map_generation(&self) -> u64 {
        self.core.lens.map_generation
    }
}

/// A depth-of-field effect that keeps a masked object in focus.
///
/// A grayscale object mask marks the content that stays sharp; everything
/// else blurs progressively outward from a user-defined horizon line, with
/// independent strengths above and below the horizon. The kernel-map
/// request is [`masked`](KernelMapSpec::masked): the backend forces masked
/// pixels to the in-focus level after rasterizing the gradient.
pub struct FocusObjectDepthOfField<S, M> {
    core: EffectCore<S>,
    object_mask: Tracked<M>,
    horizon_point1: Tracked<Point>,
    horizon_point2: Tracked<Point>,
    /// Strength above the horizon.
    edge1_generator: KernelGenerator,
    /// Strength below the horizon.
    edge2_generator: KernelGenerator,
}

impl<S: core::fmt::Debug, M> core::fmt::Debug for FocusObjectDepthOfField<S, M> {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("FocusObjectDepthOfField")
            .field("core", &self.core)
            .field("horizon_point1", &self.horizon_point1)
            .field("horizon_point2", &self.horizon_point2)
            .field("edge1_generator", &self.edge1_generator)
            .field("edge2_generator", &self.edge2_generator)
            .finish_non_exhaustive()
    }
}

impl<S: ImageSource, M: ImageSource> FocusObjectDepthOfField<S, M> {
    /// Creates the effect.
    ///
    /// # Panics
    ///
    /// Panics unless both strengths are in `[0.0, 1.0]`.
    pub fn new(
        source: S,
        object_mask: M,
        horizon_point1: Point,
        horizon_point2: Point,
        strength_below_horizon: f64,
        strength_above_horizon: f64,
        quality: Quality,
    ) -> Self {
        let mut edge1_generator = KernelGenerator::new();
        let mut edge2_generator = KernelGenerator::new();
        edge1_generator.set_strength(strength_above_horizon);
        edge2_generator.set_strength(strength_below_horizon);
        Self {
            core: EffectCore::new(source, quality),
            object_mask: Tracked::new_dirty(object_mask),
            horizon_point1: Tracked::new_dirty(horizon_point1),
            horizon_point2: Tracked::new_dirty(horizon_point2),
            edge1_generator,
            edge2_generator,
        }
    }

    /// The object mask.
    #[must_use]
    pub fn object_mask(&self) -> &M {
        self.object_mask.get()
    }

    /// Replaces the object mask.
    ///
    /// Mask sources are opaque, so a replacement always counts as a change.
    pub fn set_object_mask(&mut self, object_mask: M) {
        self.object_mask.replace(object_mask);
    }

    /// The first horizon point.
    #[must_use]
    pub fn horizon_point1(&self) -> Point {
        *self.horizon_point1.get()
    }

    /// Sets the first horizon point.
    pub fn set_horizon_point1(&mut self, point: Point) {
        self.horizon_point1.set(point);
    }

    /// The second horizon point.
    #[must_use]
    pub fn horizon_point2(&self) -> Point {
        *self.horizon_point2.get()
    }

    /// Sets the second horizon point.
    pub fn set_horizon_point2(&mut self, point: Point) {
        self.horizon_point2.set(point);
    }

    /// Blur strength below the horizon line.
    #[must_use]
    pub fn strength_below_horizon(&self) -> f64 {
        self.edge2_generator.strength()
    }

    /// Sets the blur strength below the horizon line.
    ///
    /// # Panics
    ///
    /// Panics unless `strength` is in `[0.0, 1.0]`.
    pub fn set_strength_below_horizon(&mut self, strength: f64) {
        self.edge2_generator.set_strength(strength);
    }

    /// Blur strength above the horizon line.
    #[must_use]
    pub fn strength_above_horizon(&self) -> f64 {
        self.edge1_generator.strength()
    }

    /// Sets the blur strength above the horizon line.
    ///
    /// # Panics
    ///
    /// Panics unless `strength` is in `[0.0, 1.0]`.
    pub fn set_strength_above_horizon(&mut self, strength: f64) {
        self.edge1_generator.set_strength(strength);
    }

    fn try_prepare_lens_blur(&mut self) -> bool {
        let band = band_from_horizon(*self.horizon_point1.get(), *self.horizon_point2.get());

        let kernel_count = self.core.quality.get().kernel_count();
        let source_size = self.core.source_size();
        self.edge1_generator.set_kernel_count(kernel_count);
        self.edge2_generator.set_kernel_count(kernel_count);
        self.edge1_generator.set_source_size(source_size);
        self.edge2_generator.set_source_size(source_size);

        let quality_dirty = self.core.quality.is_dirty();
        let generators_dirty = self.edge1_generator.is_dirty() || self.edge2_generator.is_dirty();

        // The above-horizon strength follows whichever band edge sits
        // higher, so callers may supply the horizon points in either order.
        let (above_bands, below_bands): (Vec<KernelBand>, Vec<KernelBand>) =
            match upper_edge(&band) {
                BandEdge::Edge1 => (
                    self.edge1_generator.kernel_bands().to_vec(),
                    self.edge2_generator.kernel_bands().to_vec(),
                ),
                BandEdge::Edge2 => (
                    self.edge2_generator.kernel_bands().to_vec(),
                    self.edge1_generator.kernel_bands().to_vec(),
                ),
            };

        // The gradient ramps the below side through the first kernel
        // indices; the kernel list uses the same order.
        let kernels: Vec<BlurKernel> = below_bands
            .iter()
            .chain(&above_bands)
            .map(|band| band.kernel)
            .collect();
        let blur_applies = !kernels.is_empty();

        if quality_dirty
            || generators_dirty
            || self.horizon_point1.is_dirty()
            || self.horizon_point2.is_dirty()
            || self.object_mask.is_dirty()
        {
            let apply_small_blur_focus = !above_bands.is_empty() && !below_bands.is_empty();

            if blur_applies {
                let gradient = linear_gradient(
                    &band,
                    source_size,
                    &below_bands,
                    &above_bands,
                    apply_small_blur_focus,
                );
                let size = self.core.kernel_map_size();
                self.core.lens.set_map(KernelMapSpec {
                    gradient: GradientSpec::Linear(gradient),
                    size,
                    masked: true,
                });
                self.core.lens.kernels = kernels;
                self.core.lens.map_type = KernelMapType::Continuous;
                self.core.lens.edge_mirroring = EdgeMirroring::On;
                self.core.lens.edge_softening = FocusEdgeSoftening::Low;
            }
        }

        self.object_mask.reset();
        self.horizon_point1.reset();
        self.horizon_point2.reset();

        blur_applies
    }
}

impl<S: ImageSource, M: ImageSource> DepthOfFieldEffect for FocusObjectDepthOfField<S, M> {
    type Source = S;

    fn quality(&self) -> Quality {
        *self.core.quality.get()
    }

    fn set_quality(&mut self, quality: Quality) {
        self.core.quality.set(quality);
    }

    fn source(&self) -> &S {
        &self.core.source
    }

    fn set_source(&mut self, source: S) {
        self.core.set_source(source);
    }

    fn prepare(&mut self) -> Prepared<'_> {
        self.core.begin_prepare();
        let blur_applies = self.try_prepare_lens_blur();
        self.core.finish_prepare(blur_applies)
    }

    fn kernels(&self) -> &[BlurKernel] {
        &self.core.lens.kernels
    }

    fn kernel_map(&self) -> Option<&KernelMapSpec> {
        self.core.lens.kernel_map.as_ref()
    }

    fn map_generation(&self) -> u64 {
        self.core.lens.map_generation
    }
}
