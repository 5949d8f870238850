// Copyright 2025 the Aperture Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Aperture Imaging: backend-agnostic lens-blur contract types.
//!
//! This crate defines the plain-old-data vocabulary shared between the
//! depth-of-field core (`aperture_dof`) and concrete imaging backends:
//! blur-kernel descriptors, gradient specifications with kernel-index stops,
//! kernel-map requests, and the parameter block a lens-blur compositor
//! consumes. It also defines the traits those backends implement.
//!
//! # Position in the stack
//!
//! - **Core** (`aperture_dof`): pure CPU math that turns focus geometry and
//!   blur strength into kernels and a kernel-map request.
//! - **Contracts (this crate)**: the data handed across the seam, plus the
//!   [`ImageSource`], [`GradientRasterizer`], [`MaskCombiner`], and
//!   [`LensBlurCompositor`] traits.
//! - **Backends**: renderers (GPU or CPU) that rasterize gradients, combine
//!   object masks, and composite the spatially varying blur. None are
//!   implemented here.
//!
//! The core never touches pixels: a *kernel map* is described as a gradient
//! over normalized image space whose stop levels are kernel indices, and the
//! backend turns that into a raster. [`GradientStop::to_color_stop`] bridges
//! to [`peniko`] for backends that already consume peniko gradients.

#![no_std]

extern crate alloc;

use alloc::vec::Vec;

use kurbo::{Point, Vec2};

/// Pixel dimensions of an image.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub struct ImageInfo {
    /// Width in pixels.
    pub width: u32,
    /// Height in pixels.
    pub height: u32,
}

impl ImageInfo {
    /// Creates a new `ImageInfo`.
    #[must_use]
    pub fn new(width: u32, height: u32) -> Self {
        Self { width, height }
    }

    /// Total number of pixels.
    #[must_use]
    pub fn pixel_count(&self) -> u64 {
        u64::from(self.width) * u64::from(self.height)
    }

    /// Dimensions as a `kurbo::Size`.
    #[must_use]
    pub fn size(&self) -> kurbo::Size {
        kurbo::Size::new(f64::from(self.width), f64::from(self.height))
    }
}

/// Synchronous pixel-dimension query on a bound image.
///
/// The depth-of-field core only ever needs an image's dimensions; fetching
/// and decoding pixels belongs to the backend. Callers with asynchronous
/// image pipelines are expected to resolve the image *before* handing it to
/// the core, so that `info` can answer without suspending.
pub trait ImageSource {
    /// Returns the image's pixel dimensions.
    fn info(&self) -> ImageInfo;
}

impl<T: ImageSource + ?Sized> ImageSource for &T {
    fn info(&self) -> ImageInfo {
        (**self).info()
    }
}

/// Shape of a predefined blur kernel.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub enum BlurKernelShape {
    /// Circular aperture. Used for the small near-focus transition steps.
    Circle,
    /// Hexagonal aperture, approximating a physical iris. Used for the
    /// large out-of-focus kernels.
    Hexagon,
}

/// A predefined blur kernel: a shape and a size in pixels.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub struct BlurKernel {
    /// Kernel shape.
    pub shape: BlurKernelShape,
    /// Kernel size in pixels. At most 255, as kernels are indexed through
    /// an 8-bit kernel map.
    pub size: u32,
}

impl BlurKernel {
    /// Creates a new kernel descriptor.
    #[must_use]
    pub fn new(shape: BlurKernelShape, size: u32) -> Self {
        Self { shape, size }
    }
}

/// A single stop of a kernel-map gradient.
///
/// `offset` is a normalized position along the gradient axis. `level` is the
/// kernel index encoded as an 8-bit grayscale value: level 0 is "in focus"
/// (no kernel), level `n` selects the `n`-th kernel (1-based) of the
/// accompanying kernel list.
#[derive(Copy, Clone, Debug, PartialEq)]
pub struct GradientStop {
    /// Normalized position along the gradient axis.
    ///
    /// Nominally in `[0, 1]`; stop-collision repair may nudge stops slightly
    /// past either end, and linear gradients may project outside the unit
    /// range for off-image geometry. Rasterizers clamp.
    pub offset: f64,
    /// Kernel index encoded as a grayscale level.
    pub level: u8,
}

impl GradientStop {
    /// Creates a new stop.
    #[must_use]
    pub fn new(offset: f64, level: u8) -> Self {
        Self { offset, level }
    }

    /// Converts to a grayscale [`peniko::ColorStop`].
    ///
    /// The kernel index becomes an opaque gray so that a peniko-consuming
    /// rasterizer produces exactly the 8-bit kernel map the compositor
    /// expects (after conversion to a single-channel raster).
    #[must_use]
    pub fn to_color_stop(&self) -> peniko::ColorStop {
        let l = self.level;
        #[allow(
            clippy::cast_possible_truncation,
            reason = "offsets are normalized; rasterizers clamp"
        )]
        let offset = self.offset as f32;
        peniko::ColorStop::from((offset, peniko::Color::from_rgba8(l, l, l, 255)))
    }
}

/// A linear kernel-map gradient in unit image coordinates.
///
/// Levels vary along the `start`→`end` axis; every line perpendicular to
/// that axis is an iso-level line.
#[derive(Clone, Debug, PartialEq)]
pub struct LinearGradientSpec {
    /// Start point of the gradient axis (offset 0).
    pub start: Point,
    /// End point of the gradient axis (offset 1).
    pub end: Point,
    /// Stops ordered by strictly increasing offset.
    pub stops: Vec<GradientStop>,
}

impl LinearGradientSpec {
    /// Converts to a [`peniko::Gradient`] with grayscale stops.
    #[must_use]
    pub fn to_peniko(&self) -> peniko::Gradient {
        let stops: Vec<peniko::ColorStop> =
            self.stops.iter().map(GradientStop::to_color_stop).collect();
        peniko::Gradient {
            kind: peniko::GradientKind::Linear(peniko::LinearGradientPosition::new(
                (self.start.x, self.start.y),
                (self.end.x, self.end.y),
            )),
            extend: peniko::Extend::Pad,
            stops: peniko::ColorStops::from(stops.as_slice()),
            ..peniko::Gradient::default()
        }
    }
}

/// A radial kernel-map gradient in unit image coordinates.
///
/// Offset 0 is the center; offset 1 lies on the ellipse described by
/// `radius`. A non-circular radius is an elliptical gradient: backends
/// rasterize a circular gradient of radius `radius.x` under a y-scale of
/// `radius.y / radius.x`.
#[derive(Clone, Debug, PartialEq)]
pub struct RadialGradientSpec {
    /// Center of the gradient.
    pub center: Point,
    /// Per-axis radius at offset 1.
    pub radius: Vec2,
    /// Stops ordered by strictly increasing offset.
    pub stops: Vec<GradientStop>,
}

impl RadialGradientSpec {
    /// Converts to a [`peniko::Gradient`] with grayscale stops.
    ///
    /// The returned gradient is circular with radius `radius.x`; the
    /// elliptical aspect (`radius.y / radius.x`) is the backend's transform
    /// to apply, since peniko radial positions are circles.
    #[must_use]
    pub fn to_peniko(&self) -> peniko::Gradient {
        let stops: Vec<peniko::ColorStop> =
            self.stops.iter().map(GradientStop::to_color_stop).collect();
        #[allow(
            clippy::cast_possible_truncation,
            reason = "unit-space radii are small"
        )]
        let radius = self.radius.x as f32;
        peniko::Gradient {
            kind: peniko::GradientKind::Radial(peniko::RadialGradientPosition::new_two_point(
                (self.center.x, self.center.y),
                0.0,
                (self.center.x, self.center.y),
                radius,
            )),
            extend: peniko::Extend::Pad,
            stops: peniko::ColorStops::from(stops.as_slice()),
            ..peniko::Gradient::default()
        }
    }
}

/// A kernel-map gradient, linear or radial.
#[derive(Clone, Debug, PartialEq)]
pub enum GradientSpec {
    /// Linear gradient (focus band / tilt / object-mask horizon).
    Linear(LinearGradientSpec),
    /// Radial gradient (elliptic focus).
    Radial(RadialGradientSpec),
}

impl GradientSpec {
    /// The gradient's stops.
    #[must_use]
    pub fn stops(&self) -> &[GradientStop] {
        match self {
            Self::Linear(g) => &g.stops,
            Self::Radial(g) => &g.stops,
        }
    }

    /// Converts to a [`peniko::Gradient`] with grayscale stops.
    #[must_use]
    pub fn to_peniko(&self) -> peniko::Gradient {
        match self {
            Self::Linear(g) => g.to_peniko(),
            Self::Radial(g) => g.to_peniko(),
        }
    }
}

/// How a compositor interpolates between the kernels named by the map.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub enum KernelMapType {
    /// Each pixel uses exactly the kernel its map level names.
    Discrete,
    /// Levels between two kernel indices blend the two kernels.
    Continuous,
}

/// Whether the focus-area edge is mirrored into the blurred region.
///
/// Mirroring prevents in-focus content from bleeding into the blur when the
/// focus edge is hard (the object-mask case).
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub enum EdgeMirroring {
    /// No mirroring.
    Off,
    /// Mirror content at the focus-area edge.
    On,
}

/// Softening applied to the focus-area edge by the compositor.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub enum FocusEdgeSoftening {
    /// No softening.
    Off,
    /// Slight softening.
    Low,
    /// Moderate softening.
    Medium,
    /// Strong softening.
    High,
}

/// A kernel-map construction request.
///
/// This is the core's entire contribution to kernel-map building: the
/// gradient to rasterize, the raster size (half the source resolution, for
/// performance), and whether an object mask must be combined in. The actual
/// rasterization is backend work.
#[derive(Clone, Debug, PartialEq)]
pub struct KernelMapSpec {
    /// Gradient describing kernel levels over unit image space.
    pub gradient: GradientSpec,
    /// Target raster size in pixels.
    pub size: ImageInfo,
    /// When `true`, an object mask supplied alongside the request forces
    /// masked pixels to level 0 (in focus) after rasterization.
    pub masked: bool,
}

/// The parameter block consumed by a lens-blur compositor.
///
/// Borrowed from a prepared depth-of-field effect; valid until the effect is
/// next mutated.
#[derive(Clone, Debug, PartialEq)]
pub struct LensBlurParams<'a> {
    /// Kernels indexed by the kernel map's levels, level 1 first.
    pub kernels: &'a [BlurKernel],
    /// The kernel-map request.
    pub kernel_map: &'a KernelMapSpec,
    /// Map interpolation mode.
    pub map_type: KernelMapType,
    /// Focus-area edge mirroring.
    pub edge_mirroring: EdgeMirroring,
    /// Focus-area edge softening.
    pub edge_softening: FocusEdgeSoftening,
    /// Half-width of the blend kernel, derived as half the largest kernel
    /// size.
    pub blend_kernel_width: u32,
    /// Rendering-quality exposure in `[0, 1]` (0.5 preview, 1.0 full).
    pub rendering_quality: f64,
}

/// Rasterizes kernel-map gradients.
///
/// The produced raster's pixel levels must match the stop sequence under
/// standard linear interpolation between stops, with levels clamped at the
/// outermost stops beyond them.
pub trait GradientRasterizer {
    /// The raster type this backend produces.
    type Raster;

    /// Rasterizes `gradient` at `size`.
    fn rasterize(&mut self, gradient: &GradientSpec, size: ImageInfo) -> Self::Raster;
}

/// Combines a rasterized kernel map with an object mask.
///
/// Pixels covered by the mask are forced to level 0, producing a sharp
/// object silhouette surrounded by the gradient's progressive blur.
pub trait MaskCombiner: GradientRasterizer {
    /// The mask image type this backend accepts.
    type Mask;

    /// Rasterizes `gradient` and forces masked pixels to level 0.
    fn combine(
        &mut self,
        gradient: &GradientSpec,
        mask: &Self::Mask,
        kernels: &[BlurKernel],
        size: ImageInfo,
    ) -> Self::Raster;
}

/// Applies a spatially varying blur given kernels and a kernel-map raster.
pub trait LensBlurCompositor: GradientRasterizer {
    /// The image type consumed and produced.
    type Image;

    /// Blurs `source` according to `params`.
    fn composite(&mut self, source: &Self::Image, params: &LensBlurParams<'_>) -> Self::Image;
}
