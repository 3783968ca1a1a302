//! Measurement pass: which anchors are within magnetism range, and how far.
//!
//! The engine itself never measures for attachment; it is handed the
//! per-axis measurements each frame. [`analyze`] is the stock way to produce
//! them. The one place the engine reads layout directly is immunity, through
//! [`alignment_distance`] against the cached anchor.

#[cfg(test)]
#[path = "measure_test.rs"]
mod measure_test;

use std::collections::HashMap;

use serde::Serialize;

use super::magnet::{Alignment, Axis, Magnet, MagneticBody, Measurement, TargetId};
use crate::geometry::Rect;

/// Resolves targets to their current rectangles. `None` means the target is
/// no longer laid out.
pub trait Layout {
    fn rect_of(&self, target: TargetId) -> Option<Rect>;
}

impl Layout for HashMap<TargetId, Rect> {
    fn rect_of(&self, target: TargetId) -> Option<Rect> {
        self.get(&target).copied()
    }
}

/// Qualifying measurements split by axis, in evaluation order.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct AxisMeasurements {
    pub horizontal: Vec<Measurement>,
    pub vertical: Vec<Measurement>,
}

impl AxisMeasurements {
    pub fn axis(&self, axis: Axis) -> &[Measurement] {
        match axis {
            Axis::Horizontal => &self.horizontal,
            Axis::Vertical => &self.vertical,
        }
    }
}

/// Signed distance from the anchor edge to the body edge named by
/// `alignment`. Positive when the body edge lies right of / below the anchor
/// edge.
pub fn alignment_distance(alignment: Alignment, body: &Rect, anchor: &Rect) -> f64 {
    alignment.body.position(body, alignment.axis) - alignment.anchor.position(anchor, alignment.axis)
}

/// Measure `body` against every magnet.
///
/// Magnets are visited in list order and, within a magnet, body alignments
/// in the body's order. A pairing is kept when the magnet offers its anchor
/// edge and the distance is within that axis's magnetism threshold. A
/// detached body yields nothing; detached magnets and magnets sharing the
/// body's target are skipped.
pub fn analyze(body: &MagneticBody, magnets: &[Magnet], layout: &impl Layout) -> AxisMeasurements {
    let mut out = AxisMeasurements::default();
    let Some(body_rect) = layout.rect_of(body.target) else {
        return out;
    };

    for (index, magnet) in magnets.iter().enumerate() {
        if magnet.target == body.target {
            continue;
        }
        let Some(anchor_rect) = layout.rect_of(magnet.target) else {
            continue;
        };
        for &alignment in &body.alignments {
            if !magnet.offers(alignment) {
                continue;
            }
            let distance = alignment_distance(alignment, &body_rect, &anchor_rect);
            if distance.abs() > magnet.thresholds(alignment.axis).magnetism {
                continue;
            }
            let measurement = Measurement { distance, alignment, magnet: index };
            match alignment.axis {
                Axis::Horizontal => out.horizontal.push(measurement),
                Axis::Vertical => out.vertical.push(measurement),
            }
        }
    }

    out
}
