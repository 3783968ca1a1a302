//! Points, rectangles and the two-point measurements every gesture is built from.

#[cfg(test)]
#[path = "geometry_test.rs"]
mod geometry_test;

use serde::{Deserialize, Serialize};

use crate::consts::NEUTRAL_SCALE;

/// A point in absolute (screen) or view-relative space.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Point {
    pub x: f64,
    pub y: f64,
}

impl Point {
    #[must_use]
    pub fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }
}

/// An axis-aligned rectangle in absolute coordinates.
///
/// Edges are stored directly (`left <= right`, `top <= bottom`) because
/// alignment math reads edges far more often than sizes.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Rect {
    pub left: f64,
    pub top: f64,
    pub right: f64,
    pub bottom: f64,
}

impl Rect {
    #[must_use]
    pub fn new(left: f64, top: f64, right: f64, bottom: f64) -> Self {
        Self { left, top, right, bottom }
    }

    /// Build a rectangle from its top-left corner and size.
    #[must_use]
    pub fn from_origin_size(x: f64, y: f64, width: f64, height: f64) -> Self {
        Self { left: x, top: y, right: x + width, bottom: y + height }
    }

    #[must_use]
    pub fn width(&self) -> f64 {
        self.right - self.left
    }

    #[must_use]
    pub fn height(&self) -> f64 {
        self.bottom - self.top
    }

    #[must_use]
    pub fn center_x(&self) -> f64 {
        (self.left + self.right) / 2.0
    }

    #[must_use]
    pub fn center_y(&self) -> f64 {
        (self.top + self.bottom) / 2.0
    }

    #[must_use]
    pub fn center(&self) -> Point {
        Point::new(self.center_x(), self.center_y())
    }

    /// The same rectangle translated by `(dx, dy)`.
    #[must_use]
    pub fn offset(&self, dx: f64, dy: f64) -> Self {
        Self { left: self.left + dx, top: self.top + dy, right: self.right + dx, bottom: self.bottom + dy }
    }
}

/// Euclidean distance between two points.
#[must_use]
pub fn distance(a: Point, b: Point) -> f64 {
    let dx = a.x - b.x;
    let dy = a.y - b.y;
    (dx * dx + dy * dy).sqrt()
}

/// Angle of the vector `to -> from` in degrees, normalized to `[0, 360)`.
#[must_use]
pub fn angle_degrees(from: Point, to: Point) -> f64 {
    let dx = from.x - to.x;
    let dy = from.y - to.y;
    let mut degrees = dy.atan2(dx).to_degrees();
    if degrees < 0.0 {
        degrees += 360.0;
    }
    // atan2 of a tiny negative angle can round up to exactly 360.
    if degrees >= 360.0 { 0.0 } else { degrees }
}

/// Point halfway between `a` and `b`.
#[must_use]
pub fn midpoint(a: Point, b: Point) -> Point {
    Point::new((a.x + b.x) / 2.0, (a.y + b.y) / 2.0)
}

/// Replace a NaN or infinite scale ratio with the neutral `1.0`.
#[must_use]
pub fn safe_scale(ratio: f64) -> f64 {
    if ratio.is_finite() { ratio } else { NEUTRAL_SCALE }
}

/// Ratio of two distances, neutral when either is degenerate.
///
/// A zero distance means the two contacts coincide; collapsing a body to
/// scale `0` from one noisy frame is never what a consumer wants, so it is
/// treated like the NaN/infinite cases.
#[must_use]
pub fn scale_ratio(current: f64, previous: f64) -> f64 {
    if current == 0.0 || previous == 0.0 {
        return NEUTRAL_SCALE;
    }
    safe_scale(current / previous)
}
