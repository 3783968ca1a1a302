//! Magnetic adsorption engine.
//!
//! DESIGN
//! ======
//! Each axis runs its own cycle `Free -> Attached -> Releasing -> Immune ->
//! Free`, independent of the other axis.
//!
//! - Free: the first frame whose measurements contain an anchor on a laid-out
//!   target attaches. The winner is the measurement with the largest
//!   magnetism threshold for the axis; ties keep the earliest. The corrected
//!   delta on that frame is `-distance`, so the edges coincide.
//! - Attached / Releasing: the body holds still (corrected delta `0`). The
//!   axis remembers a movement track. Motion against the track spends the
//!   release budget; motion along it flips the track and refills the budget
//!   to the largest release threshold among the anchors currently qualifying.
//!   An empty budget releases the body and enters immunity.
//! - Immune: re-attachment is suppressed. Motion along the track flips it and
//!   clears immunity at once. Motion against it clears immunity once the live
//!   aligned distance to the cached anchor exceeds the immunity budget, or,
//!   in [`ImmunityMode::RawMotion`], once raw travel has spent the budget.
//!
//! Frames with zero motion on an axis leave that axis's track and budgets
//! untouched.

pub mod magnet;
pub mod measure;

#[cfg(test)]
#[path = "adsorption_test.rs"]
mod adsorption_test;

use serde::Serialize;
use tracing::{debug, trace};

use crate::config::{AdsorptionConfig, ImmunityMode};
use crate::geometry::Point;
use magnet::{Alignment, Axis, AxisThresholds, Magnet, MagneticBody, Measurement};
use measure::{AxisMeasurements, Layout, alignment_distance, analyze};

/// Where one axis is in its snap cycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum AxisPhase {
    Free,
    /// Snapped with a full release budget.
    Attached,
    /// Snapped, with part of the release budget spent.
    Releasing,
    Immune,
}

/// Remembered travel direction along one axis.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Track {
    /// Toward larger coordinates (left to right, top to bottom).
    Forward,
    Backward,
}

impl Track {
    fn of(motion: f64) -> Option<Self> {
        if motion > 0.0 {
            Some(Track::Forward)
        } else if motion < 0.0 {
            Some(Track::Backward)
        } else {
            None
        }
    }

    fn reversed(self) -> Self {
        match self {
            Track::Forward => Track::Backward,
            Track::Backward => Track::Forward,
        }
    }
}

/// Anchor an axis attached to, kept for release refills and immunity.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct Anchor {
    pub magnet: usize,
    pub alignment: Alignment,
}

#[derive(Debug, Clone, Default)]
struct AxisState {
    attached: bool,
    immune: bool,
    pending_release: f64,
    max_release: f64,
    pending_immunity: f64,
    track: Option<Track>,
    anchor: Option<Anchor>,
}

impl AxisState {
    fn phase(&self) -> AxisPhase {
        if self.attached {
            if self.pending_release < self.max_release {
                AxisPhase::Releasing
            } else {
                AxisPhase::Attached
            }
        } else if self.immune {
            AxisPhase::Immune
        } else {
            AxisPhase::Free
        }
    }
}

/// Input for one drag frame.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct AdsorptionFrame {
    /// Raw motion of the pointer since the previous frame.
    pub delta: Point,
    pub horizontal: Vec<Measurement>,
    pub vertical: Vec<Measurement>,
}

impl AdsorptionFrame {
    pub fn new(delta: Point, measurements: AxisMeasurements) -> Self {
        Self {
            delta,
            horizontal: measurements.horizontal,
            vertical: measurements.vertical,
        }
    }

    fn axis(&self, axis: Axis) -> (f64, &[Measurement]) {
        match axis {
            Axis::Horizontal => (self.delta.x, &self.horizontal),
            Axis::Vertical => (self.delta.y, &self.vertical),
        }
    }
}

/// Result of one drag frame.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct AdsorptionOutcome {
    pub horizontal: AxisPhase,
    pub vertical: AxisPhase,
    /// Delta the host should apply to the body.
    pub delta: Point,
}

/// Snap engine for one body against an ordered list of magnets.
#[derive(Debug, Clone)]
pub struct Adsorption {
    body: MagneticBody,
    magnets: Vec<Magnet>,
    config: AdsorptionConfig,
    horizontal: AxisState,
    vertical: AxisState,
}

impl Adsorption {
    pub fn new(body: MagneticBody, magnets: Vec<Magnet>, config: AdsorptionConfig) -> Self {
        Self {
            body,
            magnets,
            config,
            horizontal: AxisState::default(),
            vertical: AxisState::default(),
        }
    }

    // --- Queries ---

    pub fn body(&self) -> &MagneticBody {
        &self.body
    }

    pub fn magnets(&self) -> &[Magnet] {
        &self.magnets
    }

    pub fn phase(&self, axis: Axis) -> AxisPhase {
        self.axis(axis).phase()
    }

    pub fn is_attached(&self, axis: Axis) -> bool {
        self.axis(axis).attached
    }

    pub fn is_immune(&self, axis: Axis) -> bool {
        self.axis(axis).immune
    }

    pub fn pending_release(&self, axis: Axis) -> f64 {
        self.axis(axis).pending_release
    }

    pub fn pending_immunity(&self, axis: Axis) -> f64 {
        self.axis(axis).pending_immunity
    }

    pub fn track(&self, axis: Axis) -> Option<Track> {
        self.axis(axis).track
    }

    pub fn anchor(&self, axis: Axis) -> Option<Anchor> {
        self.axis(axis).anchor
    }

    /// Live aligned distance between the body and the cached anchor. `0` when
    /// the axis has no anchor or either rectangle is detached.
    pub fn anchor_distance(&self, axis: Axis, layout: &impl Layout) -> f64 {
        let Some(anchor) = self.axis(axis).anchor else {
            return 0.0;
        };
        let Some(magnet) = self.magnets.get(anchor.magnet) else {
            return 0.0;
        };
        match (layout.rect_of(self.body.target), layout.rect_of(magnet.target)) {
            (Some(body), Some(target)) => alignment_distance(anchor.alignment, &body, &target),
            _ => 0.0,
        }
    }

    // --- Frame intake ---

    /// Measure with [`analyze`] and run one frame.
    pub fn drag(&mut self, delta: Point, layout: &impl Layout) -> AdsorptionOutcome {
        let frame = AdsorptionFrame::new(delta, analyze(&self.body, &self.magnets, layout));
        self.on_move(&frame, layout)
    }

    /// Run one frame. `layout` must describe the body before `frame.delta`
    /// is applied.
    pub fn on_move(&mut self, frame: &AdsorptionFrame, layout: &impl Layout) -> AdsorptionOutcome {
        let dx = self.step_axis(Axis::Horizontal, frame, layout);
        let dy = self.step_axis(Axis::Vertical, frame, layout);
        AdsorptionOutcome {
            horizontal: self.phase(Axis::Horizontal),
            vertical: self.phase(Axis::Vertical),
            delta: Point::new(dx, dy),
        }
    }

    fn step_axis(&mut self, axis: Axis, frame: &AdsorptionFrame, layout: &impl Layout) -> f64 {
        let (motion, measurements) = frame.axis(axis);
        let (attached, immune) = {
            let state = self.axis(axis);
            (state.attached, state.immune)
        };

        if attached {
            if self.consume_release(axis, motion, measurements, layout) {
                self.release(axis);
                self.enter_immunity(axis);
                return motion;
            }
            return 0.0;
        }

        if immune {
            self.consume_immunity(axis, motion, layout);
            return motion;
        }

        match self.attach(axis, measurements, motion, layout) {
            Some(winner) => -winner.distance,
            None => motion,
        }
    }

    // --- Transitions ---

    /// Attach `axis` to the best measurement, if any qualifies. Returns the
    /// winning measurement.
    pub fn attach(
        &mut self,
        axis: Axis,
        measurements: &[Measurement],
        motion: f64,
        layout: &impl Layout,
    ) -> Option<Measurement> {
        let winner = self.winner(axis, measurements, layout)?;
        let release = self.magnets[winner.magnet].thresholds(axis).release;

        let state = self.axis_mut(axis);
        state.attached = true;
        state.immune = false;
        state.pending_immunity = 0.0;
        state.pending_release = release;
        state.max_release = release;
        state.track = Track::of(motion);
        state.anchor = Some(Anchor {
            magnet: winner.magnet,
            alignment: winner.alignment,
        });

        debug!(?axis, magnet = winner.magnet, distance = winner.distance, release, "adsorption: attached");
        Some(winner)
    }

    /// Spend or refill the release budget for one frame of motion. Returns
    /// `true` when the budget is exhausted.
    pub fn consume_release(
        &mut self,
        axis: Axis,
        motion: f64,
        measurements: &[Measurement],
        layout: &impl Layout,
    ) -> bool {
        let Some(direction) = Track::of(motion) else {
            return false;
        };
        if !self.axis(axis).attached {
            return false;
        }
        let refill = self.refill_release(axis, measurements, layout);

        let state = self.axis_mut(axis);
        match state.track {
            Some(track) if track != direction => {
                state.pending_release -= motion.abs();
                trace!(?axis, pending = state.pending_release, "adsorption: release spent");
            }
            _ => {
                state.track = Some(direction.reversed());
                state.pending_release = refill;
                state.max_release = refill;
                trace!(?axis, pending = refill, "adsorption: release refilled");
            }
        }
        state.pending_release <= 0.0
    }

    pub fn release(&mut self, axis: Axis) {
        let state = self.axis_mut(axis);
        state.attached = false;
        state.pending_release = 0.0;
        state.max_release = 0.0;
        debug!(?axis, "adsorption: released");
    }

    /// Start immunity with the cached anchor's immunity threshold.
    pub fn enter_immunity(&mut self, axis: Axis) {
        let budget = self.anchor_thresholds(axis).map_or(0.0, |t| t.immunity);
        if budget <= 0.0 {
            self.clear_immunity(axis);
            return;
        }
        let state = self.axis_mut(axis);
        state.immune = true;
        state.pending_immunity = budget;
        debug!(?axis, budget, "adsorption: immune");
    }

    /// Apply one frame of motion to immunity. Returns `true` when immunity
    /// clears.
    pub fn consume_immunity(&mut self, axis: Axis, motion: f64, layout: &impl Layout) -> bool {
        let Some(direction) = Track::of(motion) else {
            return false;
        };
        if !self.axis(axis).immune {
            return false;
        }

        if self.axis(axis).track == Some(direction) {
            self.axis_mut(axis).track = Some(direction.reversed());
            self.clear_immunity(axis);
            return true;
        }

        let cleared = match self.config.immunity_mode {
            ImmunityMode::AlignmentDistance => {
                let drift = self.anchor_distance(axis, layout).abs();
                trace!(?axis, drift, pending = self.axis(axis).pending_immunity, "adsorption: immunity drift");
                drift > self.axis(axis).pending_immunity
            }
            ImmunityMode::RawMotion => {
                let state = self.axis_mut(axis);
                state.pending_immunity -= motion.abs();
                state.pending_immunity <= 0.0
            }
        };
        if cleared {
            self.clear_immunity(axis);
        }
        cleared
    }

    pub fn clear_immunity(&mut self, axis: Axis) {
        let state = self.axis_mut(axis);
        state.immune = false;
        state.pending_immunity = 0.0;
        debug!(?axis, "adsorption: free");
    }

    /// Forget both axes, e.g. when a drag ends.
    pub fn reset(&mut self) {
        self.horizontal = AxisState::default();
        self.vertical = AxisState::default();
    }

    // --- Helpers ---

    fn axis(&self, axis: Axis) -> &AxisState {
        match axis {
            Axis::Horizontal => &self.horizontal,
            Axis::Vertical => &self.vertical,
        }
    }

    fn axis_mut(&mut self, axis: Axis) -> &mut AxisState {
        match axis {
            Axis::Horizontal => &mut self.horizontal,
            Axis::Vertical => &mut self.vertical,
        }
    }

    fn anchor_thresholds(&self, axis: Axis) -> Option<AxisThresholds> {
        let anchor = self.axis(axis).anchor?;
        self.magnets.get(anchor.magnet).map(|m| m.thresholds(axis))
    }

    /// Largest-magnetism measurement whose magnet is laid out. Earliest wins ties.
    fn winner(&self, axis: Axis, measurements: &[Measurement], layout: &impl Layout) -> Option<Measurement> {
        let mut best: Option<(f64, Measurement)> = None;
        for m in measurements {
            let Some(magnet) = self.magnets.get(m.magnet) else {
                continue;
            };
            if layout.rect_of(magnet.target).is_none() {
                continue;
            }
            let magnetism = magnet.thresholds(axis).magnetism;
            if best.is_none_or(|(top, _)| magnetism > top) {
                best = Some((magnetism, *m));
            }
        }
        best.map(|(_, m)| m)
    }

    /// Release budget after a refill: the winner among the frame's
    /// measurements, falling back to the cached anchor.
    fn refill_release(&self, axis: Axis, measurements: &[Measurement], layout: &impl Layout) -> f64 {
        if let Some(winner) = self.winner(axis, measurements, layout) {
            return self.magnets[winner.magnet].thresholds(axis).release;
        }
        self.anchor_thresholds(axis).map_or(self.axis(axis).max_release, |t| t.release)
    }
}
