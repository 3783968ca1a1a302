#![allow(clippy::float_cmp)]

use std::collections::HashMap;

use super::magnet::{Edge, TargetId};
use super::*;
use crate::geometry::Rect;

const BODY: TargetId = 1;
const ANCHOR: TargetId = 2;

// =============================================================
// Helpers
// =============================================================

/// Host that applies each corrected delta to the body rect.
struct Host {
    layout: HashMap<TargetId, Rect>,
    engine: Adsorption,
}

impl Host {
    /// Body 20 wide with its left edge at `left`; anchor spans 100..200 and
    /// sits far below so only the left-to-left pairing ever measures.
    fn new(left: f64, mode: ImmunityMode) -> Self {
        let mut layout = HashMap::new();
        layout.insert(BODY, Rect::from_origin_size(left, 0.0, 20.0, 20.0));
        layout.insert(ANCHOR, Rect::new(100.0, 500.0, 200.0, 600.0));
        let body = MagneticBody::with_alignments(BODY, vec![Alignment::horizontal(Edge::Start, Edge::Start)]);
        let config = AdsorptionConfig { immunity_mode: mode };
        Self {
            layout,
            engine: Adsorption::new(body, vec![Magnet::new(ANCHOR)], config),
        }
    }

    fn drag(&mut self, dx: f64) -> AdsorptionOutcome {
        let out = self.engine.drag(Point::new(dx, 0.0), &self.layout);
        let rect = self.layout[&BODY];
        self.layout.insert(BODY, rect.offset(out.delta.x, out.delta.y));
        out
    }

    fn left(&self) -> f64 {
        self.layout[&BODY].left
    }

    fn phase(&self) -> AxisPhase {
        self.engine.phase(Axis::Horizontal)
    }
}

/// Drag right from 50 until the body snaps to the anchor at 100.
fn attached(mode: ImmunityMode) -> Host {
    let mut host = Host::new(50.0, mode);
    for _ in 0..3 {
        assert_eq!(host.drag(10.0).horizontal, AxisPhase::Free);
    }
    let out = host.drag(10.0);
    assert_eq!(out.horizontal, AxisPhase::Attached);
    assert_eq!(out.delta.x, 20.0);
    assert_eq!(host.left(), 100.0);
    host
}

/// Attached host pushed on until the release budget runs out.
fn immune(mode: ImmunityMode) -> Host {
    let mut host = attached(mode);
    // Continuing the attaching direction flips the track and refills first.
    assert_eq!(host.drag(10.0).delta.x, 0.0);
    for _ in 0..3 {
        let out = host.drag(10.0);
        assert_eq!(out.horizontal, AxisPhase::Releasing);
        assert_eq!(out.delta.x, 0.0);
    }
    let out = host.drag(10.0);
    assert_eq!(out.horizontal, AxisPhase::Immune);
    assert_eq!(out.delta.x, 10.0);
    assert_eq!(host.left(), 110.0);
    host
}

fn measurement(distance: f64, magnet: usize) -> Measurement {
    Measurement {
        distance,
        alignment: Alignment::horizontal(Edge::Start, Edge::Start),
        magnet,
    }
}

fn layout_with(targets: &[TargetId]) -> HashMap<TargetId, Rect> {
    let mut layout: HashMap<TargetId, Rect> = targets
        .iter()
        .map(|&t| (t, Rect::new(100.0, 100.0, 200.0, 200.0)))
        .collect();
    layout.insert(BODY, Rect::new(90.0, 90.0, 110.0, 110.0));
    layout
}

fn frame(dx: f64, horizontal: Vec<Measurement>) -> AdsorptionFrame {
    AdsorptionFrame {
        delta: Point::new(dx, 0.0),
        horizontal,
        vertical: Vec::new(),
    }
}

fn engine(magnets: Vec<Magnet>) -> Adsorption {
    Adsorption::new(MagneticBody::new(BODY), magnets, AdsorptionConfig::default())
}

// =============================================================
// Full cycle
// =============================================================

#[test]
fn monotonic_drag_attaches_releases_and_frees() {
    let mut host = immune(ImmunityMode::AlignmentDistance);
    assert_eq!(host.engine.pending_immunity(Axis::Horizontal), 20.0);

    // Aligned drift 10 and 20 do not exceed the budget of 20.
    assert_eq!(host.drag(10.0).horizontal, AxisPhase::Immune);
    assert_eq!(host.drag(10.0).horizontal, AxisPhase::Immune);
    // Drift 30 does.
    let out = host.drag(10.0);
    assert_eq!(out.horizontal, AxisPhase::Free);
    assert_eq!(host.left(), 140.0);

    // Out of magnetism range, so it stays free.
    assert_eq!(host.drag(10.0).horizontal, AxisPhase::Free);
    assert_eq!(host.left(), 150.0);
}

#[test]
fn attach_holds_the_body_still() {
    let mut host = attached(ImmunityMode::AlignmentDistance);
    assert_eq!(host.engine.track(Axis::Horizontal), Some(Track::Forward));
    assert_eq!(host.engine.pending_release(Axis::Horizontal), 40.0);

    host.drag(10.0);
    assert_eq!(host.left(), 100.0);
    assert_eq!(host.engine.track(Axis::Horizontal), Some(Track::Backward));
    assert_eq!(host.engine.pending_release(Axis::Horizontal), 40.0);
}

#[test]
fn reversing_right_after_release_clears_immunity() {
    let mut host = immune(ImmunityMode::AlignmentDistance);
    let out = host.drag(-10.0);
    assert_eq!(out.horizontal, AxisPhase::Free);
    assert_eq!(out.delta.x, -10.0);
    assert_eq!(host.left(), 100.0);

    // Back on the anchor edge: the next frame snaps again.
    assert_eq!(host.drag(-5.0).horizontal, AxisPhase::Attached);
    assert_eq!(host.left(), 100.0);
}

#[test]
fn reversing_while_attached_resets_the_release_budget() {
    let mut host = attached(ImmunityMode::AlignmentDistance);
    host.drag(10.0);
    host.drag(10.0);
    host.drag(10.0);
    assert_eq!(host.engine.pending_release(Axis::Horizontal), 20.0);

    let out = host.drag(-10.0);
    assert_eq!(out.horizontal, AxisPhase::Attached);
    assert_eq!(host.engine.pending_release(Axis::Horizontal), 40.0);
    assert_eq!(host.engine.track(Axis::Horizontal), Some(Track::Forward));

    host.drag(-10.0);
    assert_eq!(host.engine.pending_release(Axis::Horizontal), 30.0);
    assert_eq!(host.left(), 100.0);
}

#[test]
fn zero_motion_keeps_track_and_budgets() {
    let mut host = attached(ImmunityMode::AlignmentDistance);
    host.drag(10.0);
    host.drag(10.0);
    let out = host.drag(0.0);
    assert_eq!(out.horizontal, AxisPhase::Releasing);
    assert_eq!(out.delta.x, 0.0);
    assert_eq!(host.engine.pending_release(Axis::Horizontal), 30.0);
    assert_eq!(host.engine.track(Axis::Horizontal), Some(Track::Backward));
}

// =============================================================
// Immunity modes
// =============================================================

#[test]
fn raw_motion_mode_spends_the_budget_on_travel() {
    let mut host = immune(ImmunityMode::RawMotion);
    let out = host.drag(20.0);
    assert_eq!(out.horizontal, AxisPhase::Free);
    assert_eq!(host.engine.pending_immunity(Axis::Horizontal), 0.0);
}

#[test]
fn alignment_mode_ignores_travel_the_body_has_not_made() {
    let mut host = immune(ImmunityMode::AlignmentDistance);
    // Drift is measured before the frame's delta lands: 10 from the anchor.
    assert_eq!(host.drag(20.0).horizontal, AxisPhase::Immune);
    assert_eq!(host.engine.pending_immunity(Axis::Horizontal), 20.0);
}

#[test]
fn detached_anchor_freezes_immunity() {
    let mut host = immune(ImmunityMode::AlignmentDistance);
    host.layout.remove(&ANCHOR);
    assert_eq!(host.engine.anchor_distance(Axis::Horizontal, &host.layout), 0.0);
    for _ in 0..5 {
        assert_eq!(host.drag(10.0).horizontal, AxisPhase::Immune);
    }
}

#[test]
fn zero_immunity_threshold_goes_straight_to_free() {
    let magnet = Magnet::new(ANCHOR).with_thresholds(
        AxisThresholds { magnetism: 20.0, release: 10.0, immunity: 0.0 },
        AxisThresholds::default(),
    );
    let layout = layout_with(&[ANCHOR]);
    let mut engine = engine(vec![magnet]);
    engine.on_move(&frame(5.0, vec![measurement(-10.0, 0)]), &layout);
    engine.on_move(&frame(-5.0, vec![measurement(0.0, 0)]), &layout);
    let out = engine.on_move(&frame(-10.0, vec![measurement(0.0, 0)]), &layout);
    assert_eq!(out.horizontal, AxisPhase::Free);
    assert!(!engine.is_immune(Axis::Horizontal));
}

// =============================================================
// Winner selection and axes
// =============================================================

#[test]
fn winner_has_largest_magnetism_and_earliest_on_ties() {
    let magnets = vec![
        Magnet::new(2).with_thresholds(AxisThresholds::new(10.0), AxisThresholds::default()),
        Magnet::new(3).with_thresholds(AxisThresholds::new(30.0), AxisThresholds::default()),
        Magnet::new(4).with_thresholds(AxisThresholds::new(30.0), AxisThresholds::default()),
    ];
    let layout = layout_with(&[2, 3, 4]);
    let mut engine = engine(magnets);
    let out = engine.on_move(
        &frame(1.0, vec![measurement(-2.0, 0), measurement(-5.0, 1), measurement(-1.0, 2)]),
        &layout,
    );
    assert_eq!(out.delta.x, 5.0);
    assert_eq!(engine.anchor(Axis::Horizontal).map(|a| a.magnet), Some(1));
    assert_eq!(engine.pending_release(Axis::Horizontal), 60.0);
}

#[test]
fn detached_magnets_never_win() {
    let layout = layout_with(&[]);
    let mut engine = engine(vec![Magnet::new(2)]);
    let out = engine.on_move(&frame(3.0, vec![measurement(-4.0, 0)]), &layout);
    assert_eq!(out.horizontal, AxisPhase::Free);
    assert_eq!(out.delta.x, 3.0);
}

#[test]
fn axes_are_independent() {
    let layout = layout_with(&[2]);
    let mut engine = engine(vec![Magnet::new(2)]);
    let out = engine.on_move(
        &AdsorptionFrame {
            delta: Point::new(2.0, 7.0),
            horizontal: vec![measurement(3.0, 0)],
            vertical: Vec::new(),
        },
        &layout,
    );
    assert_eq!(out.horizontal, AxisPhase::Attached);
    assert_eq!(out.vertical, AxisPhase::Free);
    assert_eq!(out.delta, Point::new(-3.0, 7.0));
}

#[test]
fn attaching_without_motion_takes_its_track_from_the_first_move() {
    let layout = layout_with(&[2]);
    let mut engine = engine(vec![Magnet::new(2)]);
    engine.on_move(&frame(0.0, vec![measurement(1.0, 0)]), &layout);
    assert_eq!(engine.track(Axis::Horizontal), None);

    engine.on_move(&frame(-4.0, vec![measurement(0.0, 0)]), &layout);
    assert_eq!(engine.track(Axis::Horizontal), Some(Track::Forward));
    assert_eq!(engine.pending_release(Axis::Horizontal), 40.0);

    engine.on_move(&frame(-4.0, vec![measurement(0.0, 0)]), &layout);
    assert_eq!(engine.pending_release(Axis::Horizontal), 36.0);
}

#[test]
fn refill_uses_the_frames_best_anchor() {
    let magnets = vec![
        Magnet::new(2),
        Magnet::new(3).with_thresholds(AxisThresholds::new(50.0), AxisThresholds::default()),
    ];
    let layout = layout_with(&[2, 3]);
    let mut engine = engine(magnets);
    engine.on_move(&frame(1.0, vec![measurement(0.0, 0)]), &layout);
    assert_eq!(engine.pending_release(Axis::Horizontal), 40.0);

    engine.on_move(&frame(1.0, vec![measurement(0.0, 0), measurement(10.0, 1)]), &layout);
    assert_eq!(engine.pending_release(Axis::Horizontal), 100.0);
}

#[test]
fn reset_frees_both_axes() {
    let mut host = attached(ImmunityMode::AlignmentDistance);
    host.engine.reset();
    assert_eq!(host.phase(), AxisPhase::Free);
    assert_eq!(host.engine.anchor(Axis::Horizontal), None);
    assert_eq!(host.engine.track(Axis::Horizontal), None);
}
