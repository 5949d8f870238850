// Copyright 2025 the Aperture Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Focus-region geometry: bands, ellipses, and the lines between them.
//!
//! All coordinates are in the unit space of the image: the top-left corner
//! is `(0, 0)` and the bottom-right corner is `(1, 1)`.

use kurbo::{Point, Vec2};

/// Slopes flatter/steeper than this are treated as axis-aligned to avoid
/// division by zero.
const DEGENERATE_SLOPE: f64 = 1e-3;

/// Separation used to encode a direction as two points.
const DIRECTION_STEP: f64 = 1e-5;

/// A focus band, defined by two edge points in unit image coordinates.
///
/// The distance between the edges is the width of the in-focus band; the
/// band itself runs perpendicular to the edge1–edge2 line, through both
/// edges. Content between the edges stays sharp, and content beyond either
/// edge is blurred progressively with distance.
#[derive(Copy, Clone, Debug, PartialEq)]
pub struct FocusBand {
    /// First edge point.
    pub edge1: Point,
    /// Second edge point.
    pub edge2: Point,
}

impl FocusBand {
    /// Creates a band from its two edge points.
    #[must_use]
    pub fn new(edge1: Point, edge2: Point) -> Self {
        Self { edge1, edge2 }
    }

    /// Returns `true` if the edge1–edge2 line is close enough to vertical
    /// that its slope cannot be computed reliably.
    #[must_use]
    pub fn is_vertical(&self) -> bool {
        (self.edge1.x - self.edge2.x).abs() < DEGENERATE_SLOPE
    }

    /// Returns `true` if the edge1–edge2 line is close enough to horizontal
    /// that the inverse slope cannot be computed reliably.
    #[must_use]
    pub fn is_horizontal(&self) -> bool {
        (self.edge1.y - self.edge2.y).abs() < DEGENERATE_SLOPE
    }

    /// The line through both edges, as a function of one parameter.
    ///
    /// For a non-vertical band the parameter is the x coordinate and the
    /// returned point is `(t, slope * t + intercept)`. A near-vertical band
    /// degenerates to the vertical line through edge1, parameterized by y.
    /// Used as the gradient axis: `axis_point(0.0)` and `axis_point(1.0)`
    /// are the gradient's start and end.
    #[must_use]
    pub fn axis_point(&self, t: f64) -> Point {
        if self.is_vertical() {
            // Vertical special case, avoids dividing by a ~zero run.
            return Point::new(self.edge1.x, t);
        }
        let slope = (self.edge2.y - self.edge1.y) / (self.edge2.x - self.edge1.x);
        let y_intercept = self.edge1.y - self.edge1.x * slope;
        Point::new(t, slope * t + y_intercept)
    }

    /// The point on the edge1–edge2 line with the given x coordinate, or
    /// `None` for a near-vertical band (where x does not determine a point).
    #[must_use]
    pub fn point_from_x(&self, x: f64) -> Option<Point> {
        if self.is_vertical() {
            return None;
        }
        let slope = (self.edge2.y - self.edge1.y) / (self.edge2.x - self.edge1.x);
        let y_intercept = self.edge1.y - self.edge1.x * slope;
        Some(Point::new(x, slope * x + y_intercept))
    }

    /// The point on the edge1–edge2 line with the given y coordinate, or
    /// `None` for a near-horizontal band.
    #[must_use]
    pub fn point_from_y(&self, y: f64) -> Option<Point> {
        if self.is_horizontal() {
            return None;
        }
        let slope = (self.edge2.x - self.edge1.x) / (self.edge2.y - self.edge1.y);
        let x_intercept = self.edge1.x - self.edge1.y * slope;
        Some(Point::new(slope * y + x_intercept, y))
    }
}

/// Identifies one of a band's two edges.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum BandEdge {
    /// The band's first edge point.
    Edge1,
    /// The band's second edge point.
    Edge2,
}

/// Which of the band's edges lies higher in the image (smaller y).
///
/// When both edges are at the same height, edge1 wins, so the answer is
/// stable for a given band regardless of how the caller oriented it.
#[must_use]
pub fn upper_edge(band: &FocusBand) -> BandEdge {
    if band.edge1.y > band.edge2.y {
        BandEdge::Edge2
    } else {
        BandEdge::Edge1
    }
}

/// Builds the focus band whose axis is the perpendicular bisector of the
/// segment `p1`–`p2`.
///
/// `p1` and `p2` describe a horizon line; the blur transition then runs
/// *along* that horizon, i.e. perpendicular to the returned band's edge
/// line. The returned edges are two points [`1e-5`] apart through the
/// segment's midpoint, encoding the perpendicular direction without a
/// meaningful width (the caller treats the band as zero-width).
///
/// Near-vertical and near-horizontal segments (component difference below
/// `1e-3`) use axis-aligned perpendiculars directly.
#[must_use]
pub fn band_from_horizon(p1: Point, p2: Point) -> FocusBand {
    let x_diff = p1.x - p2.x;
    let y_diff = p1.y - p2.y;

    let midpoint = Point::new((p1.x + p2.x) / 2.0, (p1.y + p2.y) / 2.0);

    if x_diff.abs() < DEGENERATE_SLOPE {
        // Vertical horizon: the perpendicular is horizontal.
        return FocusBand::new(
            Point::new(midpoint.x, midpoint.y),
            Point::new(midpoint.x + DIRECTION_STEP, midpoint.y),
        );
    }
    if y_diff.abs() < DEGENERATE_SLOPE {
        // Horizontal horizon: the perpendicular is vertical.
        return FocusBand::new(
            Point::new(midpoint.x, midpoint.y),
            Point::new(midpoint.x, midpoint.y + DIRECTION_STEP),
        );
    }

    let slope = (p2.y - p1.y) / (p2.x - p1.x);
    let perp_slope = -1.0 / slope;
    let intercept = midpoint.y - perp_slope * midpoint.x;
    let at = |x: f64| Point::new(midpoint.x + x, perp_slope * (midpoint.x + x) + intercept);

    FocusBand::new(at(0.0), at(DIRECTION_STEP))
}

/// An elliptic focus area: center and per-axis radius, in unit image
/// coordinates. Content inside the ellipse stays sharp.
///
/// A degenerate ellipse (radii near zero) is a valid input meaning
/// "essentially no focus region"; downstream gradient generation falls back
/// to a minimum-epsilon radius rather than failing.
#[derive(Copy, Clone, Debug, PartialEq)]
pub struct FocusEllipse {
    /// Center of the ellipse.
    pub center: Point,
    /// Radius along x and y.
    pub radius: Vec2,
}

impl FocusEllipse {
    /// Creates an ellipse from center and radius.
    #[must_use]
    pub fn new(center: Point, radius: Vec2) -> Self {
        Self { center, radius }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn axis_point_on_a_diagonal_band() {
        let band = FocusBand::new(Point::new(0.0, 0.0), Point::new(1.0, 1.0));
        let p = band.axis_point(0.25);
        assert!((p.x - 0.25).abs() < 1e-12);
        assert!((p.y - 0.25).abs() < 1e-12);
    }

    #[test]
    fn axis_point_on_a_vertical_band_is_parameterized_by_y() {
        let band = FocusBand::new(Point::new(0.5, 0.4), Point::new(0.5, 0.6));
        assert!(band.is_vertical());
        assert_eq!(band.axis_point(0.0), Point::new(0.5, 0.0));
        assert_eq!(band.axis_point(1.0), Point::new(0.5, 1.0));
    }

    #[test]
    fn point_from_x_and_y_roundtrip() {
        let band = FocusBand::new(Point::new(0.2, 0.1), Point::new(0.8, 0.7));
        let p = band.point_from_x(0.5).unwrap();
        assert!((p.y - 0.4).abs() < 1e-12);
        let q = band.point_from_y(0.4).unwrap();
        assert!((q.x - 0.5).abs() < 1e-12);
    }

    #[test]
    fn point_from_x_is_undefined_for_vertical_bands() {
        let band = FocusBand::new(Point::new(0.5, 0.0), Point::new(0.5, 1.0));
        assert!(band.point_from_x(0.3).is_none());
        assert!(band.point_from_y(0.3).is_some());
    }

    #[test]
    fn point_from_y_is_undefined_for_horizontal_bands() {
        let band = FocusBand::new(Point::new(0.0, 0.5), Point::new(1.0, 0.5));
        assert!(band.point_from_y(0.3).is_none());
        assert!(band.point_from_x(0.3).is_some());
    }

    #[test]
    fn upper_edge_is_stable_under_point_order() {
        let a = Point::new(0.2, 0.2);
        let b = Point::new(0.8, 0.8);
        assert_eq!(upper_edge(&FocusBand::new(a, b)), BandEdge::Edge1);
        assert_eq!(upper_edge(&FocusBand::new(b, a)), BandEdge::Edge2);
    }

    #[test]
    fn band_from_horizontal_horizon_is_vertical() {
        let band = band_from_horizon(Point::new(0.25, 0.5), Point::new(0.75, 0.5));
        assert_eq!(band.edge1, Point::new(0.5, 0.5));
        assert_eq!(band.edge2, Point::new(0.5, 0.5 + 1e-5));
    }

    #[test]
    fn band_from_vertical_horizon_is_horizontal() {
        let band = band_from_horizon(Point::new(0.5, 0.25), Point::new(0.5, 0.75));
        assert_eq!(band.edge1, Point::new(0.5, 0.5));
        assert_eq!(band.edge2, Point::new(0.5 + 1e-5, 0.5));
    }

    #[test]
    fn band_from_diagonal_horizon_is_perpendicular() {
        let p1 = Point::new(0.0, 0.0);
        let p2 = Point::new(1.0, 1.0);
        let band = band_from_horizon(p1, p2);
        let horizon = p2 - p1;
        let edge_dir = band.edge2 - band.edge1;
        assert!(horizon.dot(edge_dir).abs() < 1e-12);
        // Through the midpoint.
        assert!((band.edge1 - Point::new(0.5, 0.5)).hypot() < 1e-12);
    }

    #[test]
    fn duplicate_horizon_points_still_produce_a_band() {
        // Collinear/duplicate points are valid user input; both diffs are
        // degenerate so the vertical-horizon case wins.
        let band = band_from_horizon(Point::new(0.5, 0.5), Point::new(0.5, 0.5));
        assert!((band.edge2 - band.edge1).hypot() > 0.0);
    }
}
