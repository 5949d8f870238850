// Copyright 2025 the Aperture Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Gradient-stop generation: converting focus geometry and kernel bands into
//! the (offset, level) sequences a kernel-map rasterizer consumes.
//!
//! Levels are kernel indices: level 0 is in focus, level `n` selects the
//! `n`-th kernel of the effect's kernel list. Offsets live on the gradient
//! axis (linear) or along the radius (radial).

use aperture_imaging::{GradientStop, LinearGradientSpec, RadialGradientSpec};
use kurbo::{Point, Size, Vec2};

use crate::geom::{FocusBand, FocusEllipse};
use crate::kernel::KernelBand;

/// Minimum offset separation between adjacent stops. Rasterizers
/// interpolate linearly between stops and need strictly increasing offsets.
pub const MIN_DIFF_BETWEEN_STOPS: f64 = 1e-5;

/// Fraction of the geometric blur span used for the focus-to-blur
/// transition. Concentrating the kernel ramp in the first quarter keeps the
/// perceptual transition near the focus edge, with the rest of the span at
/// full blur.
const FOCUS_TO_BLUR_TRANSITION_WIDTH: f64 = 0.25;

/// Repairs a stop list so offsets are strictly increasing.
///
/// Stops are sorted by offset, then walked low to high; whenever two
/// adjacent stops are closer than [`MIN_DIFF_BETWEEN_STOPS`], the higher
/// stop is moved to `max(both) + MIN_DIFF_BETWEEN_STOPS`, and the repair
/// propagates forward. The later stop always wins the contested position,
/// so ties break stably.
#[must_use]
pub fn ensure_min_diff_between_stops(mut stops: Vec<GradientStop>) -> Vec<GradientStop> {
    stops.sort_by(|a, b| a.offset.total_cmp(&b.offset));

    let mut iter = stops.into_iter();
    let Some(first) = iter.next() else {
        return Vec::new();
    };

    let mut repaired = vec![first];
    let mut lower = first;
    for higher in iter {
        if higher.offset - lower.offset < MIN_DIFF_BETWEEN_STOPS {
            let replacement = GradientStop::new(
                higher.offset.max(lower.offset) + MIN_DIFF_BETWEEN_STOPS,
                higher.level,
            );
            repaired.push(replacement);
            lower = replacement;
        } else {
            repaired.push(higher);
            lower = higher;
        }
    }
    repaired
}

/// Builds the linear kernel-map gradient for a focus band.
///
/// The gradient axis runs along the band's edge line (perpendicular to the
/// in-focus band itself). Each side of the band gets its own kernel ramp:
/// `edge1_bands` spaces the stops on the edge1 side and `edge2_bands` the
/// edge2 side, with edge2's kernel indices continuing after edge1's so the
/// two sides address disjoint ranges of one shared kernel list.
///
/// `apply_small_blur_focus` raises the in-focus level from 0 to 1, so even
/// the focus area receives the smallest kernel. It is additionally forced
/// on when the band's edges coincide (a zero-width focus band leaves no
/// region that should stay perfectly sharp).
#[must_use]
pub fn linear_gradient(
    band: &FocusBand,
    source_size: Size,
    edge1_bands: &[KernelBand],
    edge2_bands: &[KernelBand],
    apply_small_blur_focus: bool,
) -> LinearGradientSpec {
    let start = band.axis_point(0.0);
    let end = band.axis_point(1.0);
    let stops = linear_stops(
        band,
        source_size,
        start,
        end,
        edge1_bands,
        edge2_bands,
        apply_small_blur_focus,
    );
    LinearGradientSpec { start, end, stops }
}

fn linear_stops(
    band: &FocusBand,
    source_size: Size,
    start: Point,
    end: Point,
    edge1_bands: &[KernelBand],
    edge2_bands: &[KernelBand],
    mut apply_small_blur_focus: bool,
) -> Vec<GradientStop> {
    let edge1_first_offset = axis_offset(start, end, band.edge1);
    let edge2_first_offset = axis_offset(start, end, band.edge2);

    let edge1_pixels = Point::new(
        band.edge1.x * source_size.width,
        band.edge1.y * source_size.height,
    );
    let edge2_pixels = Point::new(
        band.edge2.x * source_size.width,
        band.edge2.y * source_size.height,
    );

    let focus_band_width = (edge1_first_offset - edge2_first_offset).abs();
    let focus_band_width_pixels = edge1_pixels.distance(edge2_pixels);

    let blur_area_width = if focus_band_width_pixels > 0.0 {
        let scale_factor = focus_band_width / focus_band_width_pixels;
        let blur_area_width_pixels = (source_size.height - focus_band_width_pixels) / 2.0 * 0.9;

        if blur_area_width_pixels < 1.0 {
            // The band leaves less than a pixel to blur into: treat the
            // whole image as in focus.
            return vec![GradientStop::new(0.5, 0)];
        }

        blur_area_width_pixels * scale_factor
    } else {
        // Coincident edges: no measurable band. Blur both sides across half
        // the axis and keep a minimally blurred focus point.
        apply_small_blur_focus = true;
        0.5
    };

    // Each side's ramp runs away from the band, in opposite directions.
    let (edge1_last_offset, edge2_last_offset) = if edge1_first_offset > edge2_first_offset {
        (
            edge1_first_offset + blur_area_width,
            edge2_first_offset - blur_area_width,
        )
    } else {
        (
            edge1_first_offset - blur_area_width,
            edge2_first_offset + blur_area_width,
        )
    };

    let mut stops = side_stops(
        apply_small_blur_focus,
        edge1_bands,
        edge1_first_offset,
        edge1_last_offset,
        0,
    );
    stops.extend(side_stops(
        apply_small_blur_focus,
        edge2_bands,
        edge2_first_offset,
        edge2_last_offset,
        edge1_bands.len(),
    ));

    ensure_min_diff_between_stops(stops)
}

/// One side's run of stops: the in-focus stop at the band edge, then one
/// stop per kernel band, spaced proportionally to band width across the
/// transition fraction of the span. Kernel indices are 1-based, starting
/// after `first_kernel_index`.
fn side_stops(
    apply_small_blur_focus: bool,
    bands: &[KernelBand],
    first_stop_offset: f64,
    last_stop_offset: f64,
    first_kernel_index: usize,
) -> Vec<GradientStop> {
    if bands.is_empty() {
        return Vec::new();
    }

    let sum_of_band_widths: f64 = bands.iter().map(|band| band.width).sum();
    let span = last_stop_offset - first_stop_offset;

    let focus_level = u8::from(apply_small_blur_focus);
    let mut stops = vec![GradientStop::new(first_stop_offset, focus_level)];

    let mut current_offset = if span > 0.0 {
        first_stop_offset + MIN_DIFF_BETWEEN_STOPS
    } else {
        first_stop_offset - MIN_DIFF_BETWEEN_STOPS
    };

    let mut level = level_at(first_kernel_index);
    for band in bands {
        level += 1;
        stops.push(GradientStop::new(current_offset, level));
        current_offset +=
            band.width / sum_of_band_widths * span * FOCUS_TO_BLUR_TRANSITION_WIDTH;
    }
    stops.push(GradientStop::new(current_offset, level));

    ensure_min_diff_between_stops(stops)
}

/// Builds the radial kernel-map gradient for an elliptic focus area, or
/// `None` when there are no kernel bands (no blur needed).
///
/// The gradient's radius — the distance at which offset reaches 1 — is 90%
/// of unit space scaled to the ellipse's aspect ratio, so the ramp leaves
/// the ellipse boundary with the same shape as the ellipse itself. A
/// degenerate ellipse (both radii below [`MIN_DIFF_BETWEEN_STOPS`]) falls
/// back to an epsilon radius: the focus area collapses to a point but the
/// gradient stays well-formed.
#[must_use]
pub fn radial_gradient(
    ellipse: &FocusEllipse,
    bands: &[KernelBand],
) -> Option<RadialGradientSpec> {
    if bands.is_empty() {
        return None;
    }

    let radius = ellipse.radius;
    let max_blur_radius = if radius.x < MIN_DIFF_BETWEEN_STOPS && radius.y < MIN_DIFF_BETWEEN_STOPS
    {
        Vec2::new(MIN_DIFF_BETWEEN_STOPS, MIN_DIFF_BETWEEN_STOPS)
    } else {
        let factor = 0.9;
        if radius.x > radius.y {
            Vec2::new(factor, factor * radius.y / radius.x)
        } else {
            Vec2::new(factor * radius.x / radius.y, factor)
        }
    };

    let stops = radial_stops(ellipse, max_blur_radius, bands);

    Some(RadialGradientSpec {
        center: ellipse.center,
        radius: max_blur_radius,
        stops,
    })
}

fn radial_stops(
    ellipse: &FocusEllipse,
    max_blur_radius: Vec2,
    bands: &[KernelBand],
) -> Vec<GradientStop> {
    let mut stops = Vec::new();

    let first_stop_offset = if max_blur_radius.x > MIN_DIFF_BETWEEN_STOPS {
        let first = ellipse.radius.x / max_blur_radius.x;
        // Anchor the focus area from the center out to the ellipse boundary.
        stops.push(GradientStop::new(0.0, 0));
        stops.push(GradientStop::new(first, 0));
        first
    } else {
        MIN_DIFF_BETWEEN_STOPS
    };

    let sum_of_band_widths: f64 = bands.iter().map(|band| band.width).sum();
    let mut current_offset = first_stop_offset + MIN_DIFF_BETWEEN_STOPS;

    let mut level = 0_u8;
    for band in bands {
        level += 1;
        stops.push(GradientStop::new(current_offset, level));
        current_offset += band.width / sum_of_band_widths
            * (1.0 - first_stop_offset)
            * FOCUS_TO_BLUR_TRANSITION_WIDTH;
    }
    stops.push(GradientStop::new(current_offset, level));

    ensure_min_diff_between_stops(stops)
}

/// Projection of `p` onto the start→end axis, as a fraction of the axis
/// length.
fn axis_offset(start: Point, end: Point, p: Point) -> f64 {
    p.distance(start) / start.distance(end)
}

/// Kernel levels are 8-bit; band counts are bounded well below 255.
#[allow(clippy::cast_possible_truncation, reason = "band counts are < 255")]
fn level_at(index: usize) -> u8 {
    debug_assert!(index <= usize::from(u8::MAX), "kernel index exceeds 8 bits");
    index as u8
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::kernel::KernelGenerator;

    fn bands_for(strength: f64) -> Vec<KernelBand> {
        let mut generator = KernelGenerator::new();
        generator.set_kernel_count(5);
        generator.set_source_size(Size::new(1000.0, 1000.0));
        generator.set_strength(strength);
        generator.kernel_bands().to_vec()
    }

    fn assert_strictly_increasing(stops: &[GradientStop]) {
        for pair in stops.windows(2) {
            assert!(
                pair[1].offset - pair[0].offset >= MIN_DIFF_BETWEEN_STOPS,
                "stops too close: {} then {}",
                pair[0].offset,
                pair[1].offset
            );
        }
    }

    #[test]
    fn repair_leaves_well_spaced_stops_alone() {
        let stops = vec![
            GradientStop::new(0.1, 0),
            GradientStop::new(0.5, 1),
            GradientStop::new(0.9, 2),
        ];
        assert_eq!(ensure_min_diff_between_stops(stops.clone()), stops);
    }

    #[test]
    fn repair_pushes_colliding_stops_apart() {
        let stops = vec![
            GradientStop::new(0.5, 0),
            GradientStop::new(0.5, 1),
            GradientStop::new(0.5, 2),
        ];
        let repaired = ensure_min_diff_between_stops(stops);
        assert_eq!(repaired.len(), 3);
        assert_strictly_increasing(&repaired);
        // The later stop always wins the contested position.
        assert_eq!(repaired[0].level, 0);
        assert_eq!(repaired[1].level, 1);
        assert_eq!(repaired[2].level, 2);
    }

    #[test]
    fn repair_sorts_unordered_input() {
        let stops = vec![
            GradientStop::new(0.9, 2),
            GradientStop::new(0.1, 0),
            GradientStop::new(0.5, 1),
        ];
        let repaired = ensure_min_diff_between_stops(stops);
        assert_strictly_increasing(&repaired);
        assert_eq!(repaired[0].offset, 0.1);
    }

    #[test]
    fn repair_of_empty_list_is_empty() {
        assert!(ensure_min_diff_between_stops(Vec::new()).is_empty());
    }

    #[test]
    fn vertical_band_with_equal_strengths_is_symmetric() {
        let band = FocusBand::new(Point::new(0.5, 0.4), Point::new(0.5, 0.6));
        let bands = bands_for(1.0);
        let gradient =
            linear_gradient(&band, Size::new(1000.0, 1000.0), &bands, &bands, false);

        // Axis runs down the image; the band edges project to 0.4 and 0.6.
        assert_eq!(gradient.start, Point::new(0.5, 0.0));
        assert_eq!(gradient.end, Point::new(0.5, 1.0));

        let stops = &gradient.stops;
        assert_strictly_increasing(stops);

        // The two in-focus stops bracket the band.
        assert!(stops.iter().any(|s| (s.offset - 0.4).abs() < 1e-9 && s.level == 0));
        assert!(stops.iter().any(|s| (s.offset - 0.6).abs() < 1e-9 && s.level == 0));

        // Offsets mirror around 0.5.
        for stop in stops {
            let mirrored = 1.0 - stop.offset;
            assert!(
                stops.iter().any(|s| (s.offset - mirrored).abs() < 1e-4),
                "no mirror for offset {}",
                stop.offset
            );
        }
    }

    #[test]
    fn second_side_kernel_indices_continue_after_the_first() {
        let band = FocusBand::new(Point::new(0.5, 0.4), Point::new(0.5, 0.6));
        let side1 = bands_for(1.0);
        let side2 = bands_for(0.5);
        let gradient =
            linear_gradient(&band, Size::new(1000.0, 1000.0), &side1, &side2, false);

        let max_level = gradient.stops.iter().map(|s| s.level).max().unwrap();
        assert_eq!(usize::from(max_level), side1.len() + side2.len());
    }

    #[test]
    fn nearly_full_height_band_degenerates_to_a_single_focus_stop() {
        // Band covers 98% of a 100 px image: the remaining blur area is
        // under a pixel.
        let band = FocusBand::new(Point::new(0.5, 0.01), Point::new(0.5, 0.99));
        let bands = bands_for(1.0);
        let gradient =
            linear_gradient(&band, Size::new(100.0, 100.0), &bands, &bands, false);
        assert_eq!(gradient.stops, vec![GradientStop::new(0.5, 0)]);
    }

    #[test]
    fn coincident_edges_force_small_blur_focus() {
        let band = FocusBand::new(Point::new(0.5, 0.5), Point::new(0.5, 0.5));
        let bands = bands_for(1.0);
        let gradient =
            linear_gradient(&band, Size::new(1000.0, 1000.0), &bands, &bands, false);
        assert_strictly_increasing(&gradient.stops);
        // The focus stops carry level 1, not 0.
        assert!(gradient.stops.iter().all(|s| s.level >= 1));
    }

    #[test]
    fn radial_gradient_without_bands_is_none() {
        let ellipse = FocusEllipse::new(Point::new(0.5, 0.5), Vec2::new(0.2, 0.1));
        assert!(radial_gradient(&ellipse, &[]).is_none());
    }

    #[test]
    fn radial_gradient_keeps_ellipse_aspect() {
        let ellipse = FocusEllipse::new(Point::new(0.5, 0.5), Vec2::new(0.2, 0.1));
        let bands = bands_for(1.0);
        let gradient = radial_gradient(&ellipse, &bands).unwrap();

        assert_eq!(gradient.center, Point::new(0.5, 0.5));
        assert!((gradient.radius.x - 0.9).abs() < 1e-12);
        assert!((gradient.radius.y - 0.45).abs() < 1e-12);

        // Center anchor, then the focus stop at the ellipse boundary.
        assert_eq!(gradient.stops[0], GradientStop::new(0.0, 0));
        assert!((gradient.stops[1].offset - 0.2 / 0.9).abs() < 1e-12);
        assert_eq!(gradient.stops[1].level, 0);
        assert_strictly_increasing(&gradient.stops);

        let max_level = gradient.stops.iter().map(|s| s.level).max().unwrap();
        assert_eq!(usize::from(max_level), bands.len());
    }

    #[test]
    fn degenerate_ellipse_falls_back_to_epsilon_radius() {
        let ellipse = FocusEllipse::new(Point::new(0.5, 0.5), Vec2::ZERO);
        let bands = bands_for(1.0);
        let gradient = radial_gradient(&ellipse, &bands).unwrap();

        assert_eq!(gradient.radius, Vec2::new(1e-5, 1e-5));
        assert_strictly_increasing(&gradient.stops);
        for stop in &gradient.stops {
            assert!(stop.offset.is_finite());
        }
    }
}
