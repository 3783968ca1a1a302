//! Per-session gesture state and the consumer query surface.
//!
//! DESIGN
//! ======
//! `GestureState` is everything one touch interaction owns: the three
//! snapshots, the tracked pointers, the progress flags and the four
//! accumulators. The detector mutates it while classifying a frame and hands
//! `&mut GestureState` to listener callbacks, which use the queries below and
//! the `consume_*` / `offset_*` mutators. A listener never holds the detector,
//! so it cannot feed a nested frame in the middle of one.
//!
//! Raw deltas are measured once per move frame (see `measure`). Queries expose
//! them through the accumulators, so a consumer always sees the gated,
//! post-consumption value for the step it is currently being called for.

#[cfg(test)]
#[path = "state_test.rs"]
mod state_test;

use crate::accumulate::{Accumulator, Quantity};
use crate::config::{AccumulationThresholds, GestureConfig};
use crate::consts::NEUTRAL_SCALE;
use crate::error::GestureError;
use crate::geometry::{Point, Rect, angle_degrees, distance, midpoint, scale_ratio};
use crate::snapshot::{ContactSnapshot, PointerId};

/// Progress flags for one session.
#[allow(clippy::struct_excessive_bools)]
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub(crate) struct SessionFlags {
    pub single_finger: bool,
    pub multi_finger: bool,
    pub moving: bool,
    pub rotating: bool,
    pub scaling: bool,
    pub used_multi_finger: bool,
    pub long_press: bool,
    pub single_tap_scroll: bool,
    pub completed: bool,
    pub trigger_double_click: bool,
    pub double_tap_scrolling: bool,
}

/// Ungated per-frame measurements.
#[derive(Debug, Clone, Copy, PartialEq)]
pub(crate) struct RawDeltas {
    pub move_x: f64,
    pub move_y: f64,
    pub rotation: f64,
    pub scale: f64,
}

impl Default for RawDeltas {
    fn default() -> Self {
        Self { move_x: 0.0, move_y: 0.0, rotation: 0.0, scale: NEUTRAL_SCALE }
    }
}

/// Which accumulators gate one listener's callback loop.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum Channel {
    /// Single-finger touch move: all four quantities.
    Touch,
    Move,
    Rotate,
    Scale,
}

/// State of the current (or last) touch session.
#[derive(Debug, Clone)]
pub struct GestureState {
    pub(crate) config: GestureConfig,
    pub(crate) view_bounds: Rect,
    pub(crate) pivot: Point,
    pub(crate) current: Option<ContactSnapshot>,
    pub(crate) previous: Option<ContactSnapshot>,
    pub(crate) start: Option<ContactSnapshot>,
    pub(crate) major_id: Option<PointerId>,
    pub(crate) minor_id: Option<PointerId>,
    pub(crate) flags: SessionFlags,
    pub(crate) raw: RawDeltas,
    pub(crate) move_x: Accumulator,
    pub(crate) move_y: Accumulator,
    pub(crate) rotation: Accumulator,
    pub(crate) scale: Accumulator,
    touch_offset: Point,
    raw_touch_offset: Point,
}

impl GestureState {
    #[must_use]
    pub fn new(config: GestureConfig) -> Self {
        let mut state = Self {
            config,
            view_bounds: Rect::default(),
            pivot: Point::default(),
            current: None,
            previous: None,
            start: None,
            major_id: None,
            minor_id: None,
            flags: SessionFlags { completed: true, ..SessionFlags::default() },
            raw: RawDeltas::default(),
            move_x: Accumulator::new(Quantity::Delta),
            move_y: Accumulator::new(Quantity::Delta),
            rotation: Accumulator::new(Quantity::Delta),
            scale: Accumulator::new(Quantity::Ratio),
            touch_offset: Point::default(),
            raw_touch_offset: Point::default(),
        };
        state.apply_thresholds(config.thresholds);
        state
    }

    // --- Snapshots ---

    /// Copy of the frame being processed.
    #[must_use]
    pub fn current_snapshot(&self) -> Option<ContactSnapshot> {
        self.current.clone()
    }

    /// Copy of the frame before the current one (the current one on a down).
    #[must_use]
    pub fn previous_snapshot(&self) -> Option<ContactSnapshot> {
        self.previous.clone()
    }

    /// Copy of the down frame that started the session.
    #[must_use]
    pub fn start_snapshot(&self) -> Option<ContactSnapshot> {
        self.start.clone()
    }

    // --- Touch position ---

    /// Major contact x relative to the view bounds, plus any one-shot offset.
    #[must_use]
    pub fn touch_x(&self) -> f64 {
        self.major_position().map_or(0.0, |p| p.x - self.view_bounds.left) + self.touch_offset.x
    }

    /// Major contact y relative to the view bounds, plus any one-shot offset.
    #[must_use]
    pub fn touch_y(&self) -> f64 {
        self.major_position().map_or(0.0, |p| p.y - self.view_bounds.top) + self.touch_offset.y
    }

    /// Major contact x in screen space, plus any one-shot offset.
    #[must_use]
    pub fn touch_raw_x(&self) -> f64 {
        self.major_position().map_or(0.0, |p| p.x) + self.raw_touch_offset.x
    }

    /// Major contact y in screen space, plus any one-shot offset.
    #[must_use]
    pub fn touch_raw_y(&self) -> f64 {
        self.major_position().map_or(0.0, |p| p.y) + self.raw_touch_offset.y
    }

    fn major_position(&self) -> Option<Point> {
        let id = self.major_id?;
        self.current.as_ref()?.position_of(id)
    }

    // --- Deltas ---

    /// Scale ratio to multiply into the body's scale. `1.0` means unchanged.
    #[must_use]
    pub fn scale_factor(&self) -> f64 {
        self.scale.exposed(self.raw.scale)
    }

    /// Rotation delta in degrees.
    #[must_use]
    pub fn rotation(&self) -> f64 {
        self.rotation.exposed(self.raw.rotation)
    }

    /// Horizontal translation to add to the body.
    #[must_use]
    pub fn move_x(&self) -> f64 {
        self.move_x.exposed(self.raw.move_x)
    }

    /// Vertical translation to add to the body.
    #[must_use]
    pub fn move_y(&self) -> f64 {
        self.move_y.exposed(self.raw.move_y)
    }

    // --- Session ---

    /// Reference point for single-finger rotate/scale, in screen space.
    #[must_use]
    pub fn pivot(&self) -> Point {
        self.pivot
    }

    #[must_use]
    pub fn view_bounds(&self) -> Rect {
        self.view_bounds
    }

    #[must_use]
    pub fn major_id(&self) -> Option<PointerId> {
        self.major_id
    }

    #[must_use]
    pub fn minor_id(&self) -> Option<PointerId> {
        self.minor_id
    }

    #[must_use]
    pub fn is_completed(&self) -> bool {
        self.flags.completed
    }

    #[must_use]
    pub fn is_multi_finger(&self) -> bool {
        self.flags.multi_finger
    }

    #[must_use]
    pub fn is_single_finger(&self) -> bool {
        self.flags.single_finger
    }

    /// A second contact touched down at some point in this session.
    #[must_use]
    pub fn used_multi_finger(&self) -> bool {
        self.flags.used_multi_finger
    }

    #[must_use]
    pub fn config(&self) -> &GestureConfig {
        &self.config
    }

    // --- Consumption ---

    /// Eat part of the move delta for the rest of this frame. Sign is ignored.
    pub fn consume_move(&mut self, x: f64, y: f64) {
        self.move_x.consume_external(x);
        self.move_y.consume_external(y);
    }

    /// Eat part of the rotation delta for the rest of this frame. Sign is ignored.
    pub fn consume_rotation(&mut self, degrees: f64) {
        self.rotation.consume_external(degrees);
    }

    /// Eat part of the scale ratio's distance from `1.0` for the rest of this frame.
    pub fn consume_scale(&mut self, amount: f64) {
        self.scale.consume_external(amount);
    }

    /// Shift what `touch_x`/`touch_y` report until the next frame.
    pub fn offset_touch_location(&mut self, dx: f64, dy: f64) {
        self.touch_offset = Point::new(dx, dy);
    }

    /// Shift what `touch_raw_x`/`touch_raw_y` report until the next frame.
    pub fn offset_touch_raw_location(&mut self, dx: f64, dy: f64) {
        self.raw_touch_offset = Point::new(dx, dy);
    }

    // --- Engine-side transitions ---

    pub(crate) fn apply_thresholds(&mut self, thresholds: AccumulationThresholds) {
        self.config.thresholds = thresholds;
        self.move_x.set_threshold(thresholds.move_x);
        self.move_y.set_threshold(thresholds.move_y);
        self.rotation.set_threshold(thresholds.rotation);
        self.scale.set_threshold(thresholds.scale);
    }

    /// Start a fresh session from a validated down frame.
    pub(crate) fn start_session(&mut self, snapshot: ContactSnapshot) {
        self.major_id = Some(snapshot.primary().id);
        self.minor_id = None;
        self.pivot = self.view_bounds.center();
        self.flags = SessionFlags::default();
        self.start = Some(snapshot.clone());
        self.previous = Some(snapshot.clone());
        self.current = Some(snapshot);
        self.reset_counters();
    }

    /// Rotate snapshots for a new frame and clear every per-frame adjustment.
    pub(crate) fn advance_frame(&mut self, snapshot: ContactSnapshot) {
        self.previous = self.current.take().or_else(|| Some(snapshot.clone()));
        self.current = Some(snapshot);
        self.raw = RawDeltas::default();
        self.touch_offset = Point::default();
        self.raw_touch_offset = Point::default();
        self.move_x.begin_event();
        self.move_y.begin_event();
        self.rotation.begin_event();
        self.scale.begin_event();
    }

    /// Measure this frame's raw deltas against the previous frame.
    ///
    /// Two tracked contacts use the major/minor distance, angle and midpoint.
    /// One contact uses the major against the pivot for rotate/scale and the
    /// major's own displacement for move.
    pub(crate) fn measure(&mut self) -> Result<(), GestureError> {
        let (Some(current), Some(previous), Some(major)) = (&self.current, &self.previous, self.major_id) else {
            return Ok(());
        };
        let cur_major = current.require(major)?;
        let prev_major = previous.require(major)?;
        self.raw = match self.minor_id.filter(|_| self.flags.multi_finger) {
            Some(minor) => {
                let cur_minor = current.require(minor)?;
                let prev_minor = previous.require(minor)?;
                let cur_mid = midpoint(cur_major, cur_minor);
                let prev_mid = midpoint(prev_major, prev_minor);
                RawDeltas {
                    move_x: cur_mid.x - prev_mid.x,
                    move_y: cur_mid.y - prev_mid.y,
                    rotation: angle_degrees(cur_major, cur_minor) - angle_degrees(prev_major, prev_minor),
                    scale: scale_ratio(distance(cur_major, cur_minor), distance(prev_major, prev_minor)),
                }
            }
            None => RawDeltas {
                move_x: cur_major.x - prev_major.x,
                move_y: cur_major.y - prev_major.y,
                rotation: angle_degrees(cur_major, self.pivot) - angle_degrees(prev_major, self.pivot),
                scale: scale_ratio(distance(cur_major, self.pivot), distance(prev_major, self.pivot)),
            },
        };
        tracing::trace!(
            move_x = self.raw.move_x,
            move_y = self.raw.move_y,
            rotation = self.raw.rotation,
            scale = self.raw.scale,
            "measured frame"
        );
        Ok(())
    }

    /// Feed this frame's raw deltas into the accumulators behind `channel`.
    pub(crate) fn record(&mut self, channel: Channel) {
        for (acc, raw) in self.channel_mut(channel) {
            acc.record(raw);
        }
    }

    /// Whether any accumulator behind `channel` holds a full chunk.
    pub(crate) fn can_consume(&self, channel: Channel) -> bool {
        self.channel(channel).iter().any(|acc| acc.can_consume())
    }

    /// One callback step on `channel` has run.
    pub(crate) fn step_done(&mut self, channel: Channel) {
        for (acc, _) in self.channel_mut(channel) {
            acc.step_done();
        }
    }

    pub(crate) fn finish_loop(&mut self, channel: Channel) {
        for (acc, _) in self.channel_mut(channel) {
            acc.finish_loop();
        }
    }

    fn channel(&self, channel: Channel) -> Vec<&Accumulator> {
        match channel {
            Channel::Touch => vec![&self.move_x, &self.move_y, &self.rotation, &self.scale],
            Channel::Move => vec![&self.move_x, &self.move_y],
            Channel::Rotate => vec![&self.rotation],
            Channel::Scale => vec![&self.scale],
        }
    }

    fn channel_mut(&mut self, channel: Channel) -> Vec<(&mut Accumulator, f64)> {
        let raw = self.raw;
        match channel {
            Channel::Touch => vec![
                (&mut self.move_x, raw.move_x),
                (&mut self.move_y, raw.move_y),
                (&mut self.rotation, raw.rotation),
                (&mut self.scale, raw.scale),
            ],
            Channel::Move => vec![(&mut self.move_x, raw.move_x), (&mut self.move_y, raw.move_y)],
            Channel::Rotate => vec![(&mut self.rotation, raw.rotation)],
            Channel::Scale => vec![(&mut self.scale, raw.scale)],
        }
    }

    pub(crate) fn has_raw_motion(&self) -> bool {
        self.raw.move_x != 0.0 || self.raw.move_y != 0.0
    }

    /// Drop the session's running data. Thresholds and config survive.
    pub(crate) fn recycle(&mut self) {
        self.flags = SessionFlags { completed: true, ..SessionFlags::default() };
        self.major_id = None;
        self.minor_id = None;
        self.raw = RawDeltas::default();
        self.touch_offset = Point::default();
        self.raw_touch_offset = Point::default();
        self.reset_counters();
    }

    fn reset_counters(&mut self) {
        self.move_x.reset();
        self.move_y.reset();
        self.rotation.reset();
        self.scale.reset();
    }
}
