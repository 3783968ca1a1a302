//! End-to-end properties exercised through the public API only.

#![allow(clippy::float_cmp)]

use std::cell::RefCell;
use std::collections::HashMap;
use std::rc::Rc;

use gesture_engine::{
    AccumulationThresholds, Action, Adsorption, AdsorptionConfig, Alignment, Axis, AxisPhase, Contact, ContactSnapshot,
    Edge, GestureConfig, GestureDetector, GestureState, Magnet, MagneticBody, MoveListener, Point, PointerId, Rect,
    ScaleListener, TargetId, TouchListener,
};

// =============================================================
// Helpers
// =============================================================

#[derive(Clone, Default)]
struct Events(Rc<RefCell<Vec<(&'static str, f64)>>>);

impl Events {
    fn push(&self, name: &'static str, value: f64) {
        self.0.borrow_mut().push((name, value));
    }

    fn count(&self, name: &str) -> usize {
        self.0.borrow().iter().filter(|(n, _)| *n == name).count()
    }

    fn values(&self, name: &str) -> Vec<f64> {
        self.0.borrow().iter().filter(|(n, _)| *n == name).map(|&(_, v)| v).collect()
    }
}

/// Touch listener that consumes long presses.
struct Taps(Events);

impl TouchListener for Taps {
    fn on_click(&mut self, _state: &mut GestureState) {
        self.0.push("click", 0.0);
    }

    fn on_long_press(&mut self, _state: &mut GestureState) -> bool {
        true
    }

    fn on_long_click(&mut self, _state: &mut GestureState) {
        self.0.push("long_click", 0.0);
    }

    fn on_touch_end(&mut self, _state: &mut GestureState) {
        self.0.push("end", 0.0);
    }
}

struct Pinch(Events);

impl ScaleListener for Pinch {
    fn on_scale(&mut self, state: &mut GestureState) -> bool {
        self.0.push("scale", state.scale_factor());
        true
    }
}

impl MoveListener for Pinch {
    fn on_move(&mut self, state: &mut GestureState) -> bool {
        self.0.push("move", state.move_x());
        true
    }
}

fn snap(action: Action, contacts: &[(PointerId, f64, f64)], time: u64) -> ContactSnapshot {
    let contacts = contacts.iter().map(|&(id, x, y)| Contact::new(id, x, y)).collect();
    ContactSnapshot::new(action, contacts, time).unwrap()
}

fn detector(config: GestureConfig) -> GestureDetector {
    let mut detector = GestureDetector::new(config);
    detector.set_view_bounds(Rect::new(0.0, 0.0, 500.0, 500.0));
    detector
}

fn pinch_detector(events: &Events, move_threshold: f64) -> GestureDetector {
    let config = GestureConfig {
        thresholds: AccumulationThresholds { move_x: move_threshold, ..AccumulationThresholds::default() },
        ..GestureConfig::default()
    };
    let mut detector = detector(config);
    detector.set_touch_listener(Taps(events.clone()));
    detector.set_scale_listener(Pinch(events.clone()));
    detector.set_move_listener(Pinch(events.clone()));
    detector
}

// =============================================================
// Taps
// =============================================================

#[test]
fn still_press_yields_exactly_one_click_or_long_click() {
    for double_click in [false, true] {
        for hold in [20, 90, 250, 450, 520, 2000] {
            let events = Events::default();
            let mut detector = detector(GestureConfig { double_click_enabled: double_click, ..GestureConfig::default() });
            detector.set_touch_listener(Taps(events.clone()));

            assert!(detector.on_touch_event(snap(Action::Down, &[(0, 50.0, 50.0)], 0)));
            for tick in [100, 500] {
                if tick < hold {
                    detector.on_tick(tick);
                }
            }
            detector.on_touch_event(snap(Action::Up, &[(0, 50.0, 50.0)], hold));
            detector.on_tick(hold + 1000);

            let taps = events.count("click") + events.count("long_click");
            assert_eq!(taps, 1, "hold {hold} ms, double click {double_click}");
            assert_eq!(events.count("end"), 1, "hold {hold} ms, double click {double_click}");
            assert!(detector.state().is_completed());
        }
    }
}

#[test]
fn completed_session_rejects_until_next_down() {
    let events = Events::default();
    let mut detector = detector(GestureConfig { double_click_enabled: false, ..GestureConfig::default() });
    detector.set_touch_listener(Taps(events.clone()));

    detector.on_touch_event(snap(Action::Down, &[(0, 10.0, 10.0)], 0));
    detector.on_touch_event(snap(Action::Up, &[(0, 10.0, 10.0)], 30));
    assert!(detector.state().is_completed());

    assert!(!detector.on_touch_event(snap(Action::Move, &[(0, 40.0, 10.0)], 40)));
    assert!(!detector.on_touch_event(snap(Action::Up, &[(0, 40.0, 10.0)], 50)));
    assert!(!detector.on_touch_event(snap(Action::Cancel, &[(0, 40.0, 10.0)], 60)));
    assert!(detector.on_touch_event(snap(Action::Down, &[(0, 40.0, 10.0)], 70)));
}

// =============================================================
// Multi-finger
// =============================================================

#[test]
fn spreading_from_100_to_200_scales_by_exactly_two() {
    let events = Events::default();
    let mut detector = pinch_detector(&events, 0.0);
    assert!(detector.on_touch_event(snap(Action::Down, &[(0, 100.0, 100.0)], 0)));
    assert!(detector.on_touch_event(snap(Action::PointerDown(1), &[(0, 100.0, 100.0), (1, 200.0, 100.0)], 100)));
    assert!(detector.on_touch_event(snap(Action::Move, &[(0, 100.0, 100.0), (1, 300.0, 100.0)], 116)));
    assert_eq!(events.values("scale"), vec![2.0]);
}

#[test]
fn coincident_contacts_scale_neutrally() {
    let events = Events::default();
    let mut detector = pinch_detector(&events, 0.0);
    detector.on_touch_event(snap(Action::Down, &[(0, 100.0, 100.0)], 0));
    detector.on_touch_event(snap(Action::PointerDown(1), &[(0, 100.0, 100.0), (1, 100.0, 100.0)], 10));
    detector.on_touch_event(snap(Action::Move, &[(0, 100.0, 100.0), (1, 100.0, 100.0)], 20));
    detector.on_touch_event(snap(Action::Move, &[(0, 100.0, 100.0), (1, 130.0, 100.0)], 30));
    let values = events.values("scale");
    assert_eq!(values.len(), 2);
    assert!(values.iter().all(|v| v.is_finite()));
    assert_eq!(values[0], 1.0);
}

#[test]
fn gated_move_steps_once_per_whole_threshold() {
    // Both contacts shift by k * 10 + 3; the midpoint moves the same amount.
    for k in 0u8..4 {
        let events = Events::default();
        let mut detector = pinch_detector(&events, 10.0);
        detector.on_touch_event(snap(Action::Down, &[(0, 100.0, 100.0)], 0));
        detector.on_touch_event(snap(Action::PointerDown(1), &[(0, 100.0, 100.0), (1, 200.0, 100.0)], 10));

        let shift = f64::from(k) * 10.0 + 3.0;
        detector.on_touch_event(snap(Action::Move, &[(0, 100.0 + shift, 100.0), (1, 200.0 + shift, 100.0)], 20));

        let moves = events.values("move");
        if k == 0 {
            assert_eq!(moves, vec![0.0]);
        } else {
            assert_eq!(moves.len(), usize::from(k));
            assert!(moves.iter().all(|&v| v == 10.0));
        }
    }
}

// =============================================================
// Adsorption
// =============================================================

const BODY: TargetId = 1;
const ANCHOR: TargetId = 2;

fn drag(engine: &mut Adsorption, layout: &mut HashMap<TargetId, Rect>, dx: f64) -> AxisPhase {
    let out = engine.drag(Point::new(dx, 0.0), layout);
    let body = layout[&BODY].offset(out.delta.x, out.delta.y);
    layout.insert(BODY, body);
    out.horizontal
}

fn adsorption_host() -> (Adsorption, HashMap<TargetId, Rect>) {
    let body = MagneticBody::with_alignments(BODY, vec![Alignment::horizontal(Edge::End, Edge::Start)]);
    let engine = Adsorption::new(body, vec![Magnet::new(ANCHOR)], AdsorptionConfig::default());
    let mut layout = HashMap::new();
    layout.insert(BODY, Rect::new(0.0, 0.0, 30.0, 30.0));
    layout.insert(ANCHOR, Rect::new(60.0, 300.0, 90.0, 330.0));
    (engine, layout)
}

#[test]
fn anchor_cycle_attach_release_immune_free() {
    let (mut engine, mut layout) = adsorption_host();

    // Right edge 30 -> 35 -> 40: 20 short of the anchor's left edge at 60.
    assert_eq!(drag(&mut engine, &mut layout, 5.0), AxisPhase::Free);
    assert_eq!(drag(&mut engine, &mut layout, 5.0), AxisPhase::Free);
    assert_eq!(drag(&mut engine, &mut layout, 5.0), AxisPhase::Attached);
    assert_eq!(layout[&BODY].right, 60.0);

    // The first push past the anchor re-arms; 40 more units release.
    assert_eq!(drag(&mut engine, &mut layout, 8.0), AxisPhase::Attached);
    let mut travelled = 0.0;
    while engine.phase(Axis::Horizontal) != AxisPhase::Immune {
        drag(&mut engine, &mut layout, 8.0);
        travelled += 8.0;
        assert!(travelled <= 40.0);
    }
    assert_eq!(travelled, 40.0);

    // Aligned drift must exceed 20 before the anchor can be escaped.
    let mut drift_frames = 0;
    while engine.phase(Axis::Horizontal) == AxisPhase::Immune {
        drag(&mut engine, &mut layout, 8.0);
        drift_frames += 1;
        assert!(drift_frames < 10);
    }
    assert!(layout[&BODY].right - 60.0 > 20.0);
    assert_eq!(engine.phase(Axis::Horizontal), AxisPhase::Free);
}

#[test]
fn reversal_after_release_clears_immunity_instantly() {
    let (mut engine, mut layout) = adsorption_host();
    for _ in 0..3 {
        drag(&mut engine, &mut layout, 5.0);
    }
    for _ in 0..6 {
        drag(&mut engine, &mut layout, 8.0);
    }
    assert_eq!(engine.phase(Axis::Horizontal), AxisPhase::Immune);
    assert_eq!(drag(&mut engine, &mut layout, -1.0), AxisPhase::Free);
}

#[test]
fn reversal_while_attached_refills_release() {
    let (mut engine, mut layout) = adsorption_host();
    for _ in 0..3 {
        drag(&mut engine, &mut layout, 5.0);
    }
    drag(&mut engine, &mut layout, 8.0);
    drag(&mut engine, &mut layout, 8.0);
    drag(&mut engine, &mut layout, 8.0);
    assert_eq!(engine.pending_release(Axis::Horizontal), 24.0);

    assert_eq!(drag(&mut engine, &mut layout, -3.0), AxisPhase::Attached);
    assert_eq!(engine.pending_release(Axis::Horizontal), 40.0);
}
