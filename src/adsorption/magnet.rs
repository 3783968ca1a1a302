//! Data model for magnetic bodies and the anchors they snap to.
//!
//! A [`MagneticBody`] lists the edge pairings it is willing to snap with; a
//! [`Magnet`] lists the edges it offers and carries per-axis thresholds. A
//! pairing qualifies against a magnet when the magnet offers the pairing's
//! anchor edge on the same axis.

#[cfg(test)]
#[path = "magnet_test.rs"]
mod magnet_test;

use serde::{Deserialize, Serialize};

use crate::consts::{DEFAULT_IMMUNITY_THRESHOLD, DEFAULT_MAGNETISM_THRESHOLD, RELEASE_MULTIPLIER};
use crate::geometry::Rect;

/// Host-side identifier of a laid-out rectangle.
pub type TargetId = u32;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Axis {
    Horizontal,
    Vertical,
}

/// Edge of a rectangle along one axis. `Start` is left or top, `End` is
/// right or bottom.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Edge {
    Start,
    Center,
    End,
}

impl Edge {
    pub const ALL: [Edge; 3] = [Edge::Start, Edge::Center, Edge::End];

    /// Coordinate of this edge of `rect` along `axis`.
    pub fn position(self, rect: &Rect, axis: Axis) -> f64 {
        match (axis, self) {
            (Axis::Horizontal, Edge::Start) => rect.left,
            (Axis::Horizontal, Edge::Center) => rect.center_x(),
            (Axis::Horizontal, Edge::End) => rect.right,
            (Axis::Vertical, Edge::Start) => rect.top,
            (Axis::Vertical, Edge::Center) => rect.center_y(),
            (Axis::Vertical, Edge::End) => rect.bottom,
        }
    }
}

/// One of the nine pairings per axis: which body edge lines up with which
/// anchor edge.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Alignment {
    pub axis: Axis,
    pub body: Edge,
    pub anchor: Edge,
}

impl Alignment {
    pub fn horizontal(body: Edge, anchor: Edge) -> Self {
        Self { axis: Axis::Horizontal, body, anchor }
    }

    pub fn vertical(body: Edge, anchor: Edge) -> Self {
        Self { axis: Axis::Vertical, body, anchor }
    }

    /// Every pairing on `axis`, body edge major.
    pub fn all(axis: Axis) -> Vec<Alignment> {
        Edge::ALL
            .iter()
            .flat_map(|&body| Edge::ALL.iter().map(move |&anchor| Alignment { axis, body, anchor }))
            .collect()
    }
}

/// An edge a magnet offers for snapping.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct AnchorEdge {
    pub axis: Axis,
    pub edge: Edge,
}

impl AnchorEdge {
    pub fn new(axis: Axis, edge: Edge) -> Self {
        Self { axis, edge }
    }
}

/// The three chained distances that drive one axis of the snap cycle.
///
/// When deserializing, `release` defaults to twice `magnetism` and
/// `immunity` to the shared default.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(from = "ThresholdsDoc")]
pub struct AxisThresholds {
    /// Distance within which the anchor attracts the body.
    pub magnetism: f64,
    /// Opposing travel that tears the body off an attached anchor.
    pub release: f64,
    /// Aligned drift after release during which re-attachment is suppressed.
    pub immunity: f64,
}

impl AxisThresholds {
    pub fn new(magnetism: f64) -> Self {
        Self {
            magnetism,
            release: magnetism * RELEASE_MULTIPLIER,
            immunity: DEFAULT_IMMUNITY_THRESHOLD,
        }
    }
}

impl Default for AxisThresholds {
    fn default() -> Self {
        Self::new(DEFAULT_MAGNETISM_THRESHOLD)
    }
}

#[derive(Deserialize)]
struct ThresholdsDoc {
    #[serde(default = "default_magnetism")]
    magnetism: f64,
    release: Option<f64>,
    immunity: Option<f64>,
}

fn default_magnetism() -> f64 {
    DEFAULT_MAGNETISM_THRESHOLD
}

impl From<ThresholdsDoc> for AxisThresholds {
    fn from(doc: ThresholdsDoc) -> Self {
        let base = AxisThresholds::new(doc.magnetism);
        Self {
            magnetism: base.magnetism,
            release: doc.release.unwrap_or(base.release),
            immunity: doc.immunity.unwrap_or(base.immunity),
        }
    }
}

/// The rectangle being dragged.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MagneticBody {
    pub target: TargetId,
    pub alignments: Vec<Alignment>,
}

impl MagneticBody {
    /// A body that snaps with every pairing on both axes.
    pub fn new(target: TargetId) -> Self {
        let mut alignments = Alignment::all(Axis::Horizontal);
        alignments.extend(Alignment::all(Axis::Vertical));
        Self { target, alignments }
    }

    pub fn with_alignments(target: TargetId, alignments: Vec<Alignment>) -> Self {
        Self { target, alignments }
    }
}

/// A candidate anchor.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Magnet {
    pub target: TargetId,
    pub edges: Vec<AnchorEdge>,
    #[serde(default)]
    pub horizontal: AxisThresholds,
    #[serde(default)]
    pub vertical: AxisThresholds,
}

impl Magnet {
    /// A magnet offering all six edges with default thresholds.
    pub fn new(target: TargetId) -> Self {
        let edges = [Axis::Horizontal, Axis::Vertical]
            .iter()
            .flat_map(|&axis| Edge::ALL.iter().map(move |&edge| AnchorEdge::new(axis, edge)))
            .collect();
        Self {
            target,
            edges,
            horizontal: AxisThresholds::default(),
            vertical: AxisThresholds::default(),
        }
    }

    #[must_use]
    pub fn with_edges(mut self, edges: Vec<AnchorEdge>) -> Self {
        self.edges = edges;
        self
    }

    #[must_use]
    pub fn with_thresholds(mut self, horizontal: AxisThresholds, vertical: AxisThresholds) -> Self {
        self.horizontal = horizontal;
        self.vertical = vertical;
        self
    }

    pub fn thresholds(&self, axis: Axis) -> AxisThresholds {
        match axis {
            Axis::Horizontal => self.horizontal,
            Axis::Vertical => self.vertical,
        }
    }

    /// Whether this magnet offers the anchor edge `alignment` pairs with.
    pub fn offers(&self, alignment: Alignment) -> bool {
        self.edges.iter().any(|e| e.axis == alignment.axis && e.edge == alignment.anchor)
    }
}

/// One qualifying pairing found by a measurement pass.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Measurement {
    /// Body edge minus anchor edge along the alignment's axis.
    pub distance: f64,
    pub alignment: Alignment,
    /// Index into the engine's magnet list.
    pub magnet: usize,
}
