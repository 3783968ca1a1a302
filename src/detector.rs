//! Gesture arbitration engine.
//!
//! DESIGN
//! ======
//! One `GestureDetector` per view. Each `on_touch_event` call classifies one
//! contact frame against the running session and runs every listener callback
//! that frame triggers before returning.
//!
//! Session lifecycle:
//! - A down while the previous session is completed asks the touch listener
//!   whether to begin. A down while a session is still open (the double-tap
//!   window after a first tap) joins that session.
//! - A second contact asks the scale, rotate and move listeners whether they
//!   want to begin; the frame is handled if any accepts. From then on the
//!   session has "used multi-finger" and no tap, press, long press or double
//!   tap can fire.
//! - Lifting back to one contact ends every active multi-finger listener and
//!   returns to single-finger progress.
//! - The session completes on a click, a consumed long press, a double tap's
//!   release, a cancel, or a final lift with nothing left pending. Completed
//!   sessions reject every frame until the next down.
//!
//! Tap timing lives in [`TapDetector`]. Its signals are filtered here by what
//! only the arbitration engine knows: finger count, multi-finger history and
//! the give-up-on-scroll policy.

#[cfg(test)]
#[path = "detector_test.rs"]
mod detector_test;

use crate::config::{AccumulationThresholds, GestureConfig, TapTimings};
use crate::error::GestureError;
use crate::geometry::Rect;
use crate::listener::{MoveListener, RotateListener, ScaleListener, TouchListener};
use crate::snapshot::{Action, ContactSnapshot, PointerId};
use crate::state::{Channel, GestureState};
use crate::tap::{TapDetector, TapSignal};

/// Multi-touch gesture classifier.
pub struct GestureDetector {
    state: GestureState,
    tap: TapDetector,
    touch: Option<Box<dyn TouchListener>>,
    scale: Option<Box<dyn ScaleListener>>,
    rotate: Option<Box<dyn RotateListener>>,
    mover: Option<Box<dyn MoveListener>>,
}

impl Default for GestureDetector {
    fn default() -> Self {
        Self::new(GestureConfig::default())
    }
}

impl GestureDetector {
    #[must_use]
    pub fn new(config: GestureConfig) -> Self {
        Self {
            state: GestureState::new(config),
            tap: TapDetector::new(config.tap, config.double_click_enabled),
            touch: None,
            scale: None,
            rotate: None,
            mover: None,
        }
    }

    // --- Listeners ---

    /// Required for any session to start.
    pub fn set_touch_listener(&mut self, listener: impl TouchListener + 'static) {
        self.touch = Some(Box::new(listener));
    }

    pub fn set_scale_listener(&mut self, listener: impl ScaleListener + 'static) {
        self.scale = Some(Box::new(listener));
    }

    pub fn set_rotate_listener(&mut self, listener: impl RotateListener + 'static) {
        self.rotate = Some(Box::new(listener));
    }

    pub fn set_move_listener(&mut self, listener: impl MoveListener + 'static) {
        self.mover = Some(Box::new(listener));
    }

    // --- Configuration ---

    /// Screen-space bounds of the view. Its center becomes the pivot of the next session.
    pub fn set_view_bounds(&mut self, bounds: Rect) {
        self.state.view_bounds = bounds;
    }

    /// Replace the whole configuration. Counters of a running session are kept.
    pub fn set_config(&mut self, config: GestureConfig) {
        self.state.config = config;
        self.state.apply_thresholds(config.thresholds);
        self.tap.set_timings(config.tap);
        self.tap.set_double_tap_enabled(config.double_click_enabled);
    }

    /// With double click off, a tap clicks on release instead of after the double-tap window.
    pub fn set_double_click_enabled(&mut self, enabled: bool) {
        self.state.config.double_click_enabled = enabled;
        self.tap.set_double_tap_enabled(enabled);
    }

    pub fn set_give_up_click_on_single_tap_scroll(&mut self, give_up: bool) {
        self.state.config.give_up_click_on_single_tap_scroll = give_up;
    }

    pub fn set_give_up_click_on_double_tap_scroll(&mut self, give_up: bool) {
        self.state.config.give_up_click_on_double_tap_scroll = give_up;
    }

    pub fn set_resume_single_finger_after_multi(&mut self, resume: bool) {
        self.state.config.resume_single_finger_after_multi = resume;
    }

    pub fn set_tap_timings(&mut self, timings: TapTimings) {
        self.state.config.tap = timings;
        self.tap.set_timings(timings);
    }

    /// Emit horizontal moves in chunks of `value`. `0` disables gating.
    pub fn accumulate_move_x(&mut self, value: f64) {
        self.set_thresholds(AccumulationThresholds { move_x: value, ..self.state.config.thresholds });
    }

    /// Emit vertical moves in chunks of `value`. `0` disables gating.
    pub fn accumulate_move_y(&mut self, value: f64) {
        self.set_thresholds(AccumulationThresholds { move_y: value, ..self.state.config.thresholds });
    }

    /// Emit rotations in chunks of `value` degrees. `0` disables gating.
    pub fn accumulate_rotation(&mut self, value: f64) {
        self.set_thresholds(AccumulationThresholds { rotation: value, ..self.state.config.thresholds });
    }

    /// Emit scale steps whenever the ratio moved `value` away from `1.0`. `0` disables gating.
    pub fn accumulate_scale(&mut self, value: f64) {
        self.set_thresholds(AccumulationThresholds { scale: value, ..self.state.config.thresholds });
    }

    fn set_thresholds(&mut self, thresholds: AccumulationThresholds) {
        self.state.apply_thresholds(thresholds);
    }

    // --- Queries ---

    #[must_use]
    pub fn state(&self) -> &GestureState {
        &self.state
    }

    #[must_use]
    pub fn config(&self) -> &GestureConfig {
        self.state.config()
    }

    /// Earliest pending tap timer, for hosts that schedule `on_tick` themselves.
    #[must_use]
    pub fn next_deadline(&self) -> Option<u64> {
        self.tap.next_deadline()
    }

    // --- Intake ---

    /// Classify one frame. Returns whether the frame was handled.
    ///
    /// A frame that breaks the event contract cancels the running session and
    /// is reported as unhandled.
    pub fn on_touch_event(&mut self, snapshot: ContactSnapshot) -> bool {
        match self.try_on_touch_event(snapshot) {
            Ok(handled) => handled,
            Err(e) => {
                tracing::warn!(error = %e, "contact frame broke the event contract; session cancelled");
                false
            }
        }
    }

    /// Like [`GestureDetector::on_touch_event`], but surfaces contract violations.
    ///
    /// # Errors
    ///
    /// Returns [`GestureError::MissingPointer`] when a tracked contact is absent
    /// from a frame used for delta math. The session is cancelled first.
    pub fn try_on_touch_event(&mut self, snapshot: ContactSnapshot) -> Result<bool, GestureError> {
        let due = self.tap.advance(snapshot.time_ms());
        self.dispatch(&due);
        tracing::trace!(action = ?snapshot.action(), pointers = snapshot.pointer_count(), "frame");
        let result = match snapshot.action() {
            Action::Down => Ok(self.on_down(snapshot)),
            Action::PointerDown(id) => Ok(self.on_pointer_down(snapshot, id)),
            Action::Move => self.on_move(snapshot),
            Action::PointerUp(id) => Ok(self.on_pointer_up(snapshot, id)),
            Action::Up => Ok(self.on_up(snapshot)),
            Action::Cancel => Ok(self.on_cancel(snapshot)),
        };
        if result.is_err() {
            self.abort();
        }
        result
    }

    /// Fire tap timers due at `now_ms` (same timebase as snapshot timestamps).
    ///
    /// Hosts call this between frames so that a still press becomes a long
    /// press and a lone tap is confirmed without waiting for the next frame.
    /// Returns whether any timer fired.
    pub fn on_tick(&mut self, now_ms: u64) -> bool {
        let due = self.tap.advance(now_ms);
        self.dispatch(&due);
        !due.is_empty()
    }

    fn on_down(&mut self, snapshot: ContactSnapshot) -> bool {
        if self.state.flags.completed {
            let position = snapshot.primary().position;
            self.state.start_session(snapshot.clone());
            if let Some(touch) = self.touch.as_deref_mut() {
                touch.provide_pivot(&mut self.state.pivot);
            }
            let bounds = self.state.view_bounds;
            let (x, y) = (position.x - bounds.left, position.y - bounds.top);
            let begin = self.touch.as_deref_mut().is_some_and(|t| t.on_begin_touch(&mut self.state, x, y));
            if !begin {
                self.recycle();
                return false;
            }
            tracing::debug!(x, y, pivot_x = self.state.pivot.x, pivot_y = self.state.pivot.y, "session started");
        } else {
            self.state.advance_frame(snapshot.clone());
            self.state.major_id = Some(snapshot.primary().id);
            self.state.minor_id = None;
            tracing::debug!("second press joined open session");
        }
        self.state.flags.single_finger = true;
        self.state.flags.multi_finger = false;
        let signals = self.tap.on_event(&snapshot);
        self.dispatch(&signals);
        true
    }

    fn on_pointer_down(&mut self, snapshot: ContactSnapshot, id: PointerId) -> bool {
        if self.state.flags.completed {
            return false;
        }
        self.state.advance_frame(snapshot.clone());
        if self.state.minor_id.is_none() && self.state.major_id != Some(id) {
            self.state.minor_id = Some(id);
        }
        if !self.state.flags.multi_finger {
            self.begin_multi();
        }
        self.state.flags.trigger_double_click = false;
        self.state.flags.used_multi_finger = true;
        let signals = self.tap.on_event(&snapshot);
        self.dispatch(&signals);
        self.state.flags.multi_finger
    }

    fn begin_multi(&mut self) {
        let state = &mut self.state;
        let scaling = self.scale.as_deref_mut().is_some_and(|l| l.on_begin_scale(state));
        let rotating = self.rotate.as_deref_mut().is_some_and(|l| l.on_begin_rotate(state));
        let moving = self.mover.as_deref_mut().is_some_and(|l| l.on_begin_move(state));
        state.flags.scaling = scaling;
        state.flags.rotating = rotating;
        state.flags.moving = moving;
        let accepted = state.flags.scaling || state.flags.rotating || state.flags.moving;
        state.flags.multi_finger = accepted;
        state.flags.single_finger = !accepted;
        if accepted {
            tracing::debug!(
                scaling = state.flags.scaling,
                rotating = state.flags.rotating,
                moving = state.flags.moving,
                "multi-finger phase started"
            );
        }
    }

    fn on_move(&mut self, snapshot: ContactSnapshot) -> Result<bool, GestureError> {
        if self.state.flags.completed {
            return Ok(false);
        }
        let pointers = snapshot.pointer_count();
        self.state.advance_frame(snapshot.clone());
        self.state.measure()?;
        if self.state.flags.multi_finger && pointers > 1 {
            return Ok(self.multi_move());
        }
        if !self.state.flags.single_finger {
            return Ok(false);
        }
        let handled = self.single_move();
        let signals = self.tap.on_event(&snapshot);
        self.dispatch(&signals);
        Ok(handled)
    }

    fn multi_move(&mut self) -> bool {
        let state = &mut self.state;
        let mut handled = false;
        if state.flags.moving
            && let Some(l) = self.mover.as_deref_mut()
        {
            state.record(Channel::Move);
            let keep = drive(state, Channel::Move, |s| l.on_move(s));
            if !keep {
                l.on_move_end(state);
            }
            state.flags.moving = keep;
            handled |= keep;
        }
        if state.flags.rotating
            && let Some(l) = self.rotate.as_deref_mut()
        {
            state.record(Channel::Rotate);
            let keep = drive(state, Channel::Rotate, |s| l.on_rotate(s));
            if !keep {
                l.on_rotate_end(state);
            }
            state.flags.rotating = keep;
            handled |= keep;
        }
        if state.flags.scaling
            && let Some(l) = self.scale.as_deref_mut()
        {
            state.record(Channel::Scale);
            let keep = drive(state, Channel::Scale, |s| l.on_scale(s));
            if !keep {
                l.on_scale_end(state);
            }
            state.flags.scaling = keep;
            handled |= keep;
        }
        handled
    }

    fn single_move(&mut self) -> bool {
        let state = &mut self.state;
        if state.flags.used_multi_finger && !state.config.resume_single_finger_after_multi {
            return false;
        }
        let Some(touch) = self.touch.as_deref_mut() else {
            return false;
        };
        if state.has_raw_motion() {
            state.flags.single_tap_scroll = true;
        }
        state.record(Channel::Touch);
        drive(state, Channel::Touch, |s| touch.on_touch_move(s))
    }

    fn on_pointer_up(&mut self, snapshot: ContactSnapshot, id: PointerId) -> bool {
        if self.state.flags.completed {
            return false;
        }
        let remaining = snapshot.pointer_count().saturating_sub(1);
        self.state.advance_frame(snapshot.clone());
        self.reassign_pointers(&snapshot, id);
        let handled = if remaining <= 1 { self.end_multi() } else { self.state.flags.multi_finger };
        let signals = self.tap.on_event(&snapshot);
        self.dispatch(&signals);
        handled
    }

    /// Keep major/minor pointing at contacts that are still down after `lifted` goes.
    fn reassign_pointers(&mut self, snapshot: &ContactSnapshot, lifted: PointerId) {
        let state = &mut self.state;
        if state.major_id == Some(lifted) {
            state.major_id = state.minor_id.take();
        }
        if state.minor_id == Some(lifted) {
            state.minor_id = None;
        }
        let mut others = snapshot.contacts().iter().map(|c| c.id).filter(|id| *id != lifted);
        if state.major_id.is_none() {
            state.major_id = others.next();
        }
        if state.minor_id.is_none() {
            let major = state.major_id;
            state.minor_id = others.find(|id| Some(*id) != major);
        }
    }

    /// End every active multi-finger listener and fall back to single-finger progress.
    fn end_multi(&mut self) -> bool {
        let state = &mut self.state;
        let mut ended = false;
        if state.flags.scaling
            && let Some(l) = self.scale.as_deref_mut()
        {
            l.on_scale_end(state);
            ended = true;
        }
        if state.flags.rotating
            && let Some(l) = self.rotate.as_deref_mut()
        {
            l.on_rotate_end(state);
            ended = true;
        }
        if state.flags.moving
            && let Some(l) = self.mover.as_deref_mut()
        {
            l.on_move_end(state);
            ended = true;
        }
        if state.flags.multi_finger {
            tracing::debug!("multi-finger phase ended");
        }
        state.flags.scaling = false;
        state.flags.rotating = false;
        state.flags.moving = false;
        state.flags.multi_finger = false;
        state.flags.single_finger = true;
        ended
    }

    fn on_up(&mut self, snapshot: ContactSnapshot) -> bool {
        if self.state.flags.completed {
            return false;
        }
        self.state.advance_frame(snapshot.clone());
        if self.state.flags.multi_finger {
            self.end_multi();
        }
        let flags = &self.state.flags;
        let config = &self.state.config;
        let abandoned_tap =
            flags.single_tap_scroll && (config.give_up_click_on_single_tap_scroll || !self.tap.in_tap_region());
        if !flags.trigger_double_click && (flags.long_press || flags.used_multi_finger || abandoned_tap) {
            let reason = if flags.long_press {
                "long press released"
            } else if flags.used_multi_finger {
                "multi-finger released"
            } else {
                "drag released"
            };
            self.finish(reason);
            return true;
        }
        let signals = self.tap.on_event(&snapshot);
        self.dispatch(&signals);
        if !self.state.flags.completed && !self.tap.has_pending_continuation() {
            self.finish("released");
        }
        true
    }

    fn on_cancel(&mut self, snapshot: ContactSnapshot) -> bool {
        if self.state.flags.completed {
            return false;
        }
        self.state.advance_frame(snapshot);
        self.abort();
        true
    }

    // --- Tap signals ---

    fn dispatch(&mut self, signals: &[TapSignal]) {
        for &signal in signals {
            if self.state.flags.completed {
                return;
            }
            self.on_tap_signal(signal);
        }
    }

    fn on_tap_signal(&mut self, signal: TapSignal) {
        tracing::trace!(?signal, "tap signal");
        let flags = &self.state.flags;
        let config = self.state.config;
        let single = flags.single_finger && !flags.used_multi_finger;
        let scrolled_away = config.give_up_click_on_single_tap_scroll && flags.single_tap_scroll;
        match signal {
            TapSignal::ShowPress => {
                if single && !flags.trigger_double_click {
                    self.with_touch(|t, s| t.on_press(s));
                }
            }
            TapSignal::SingleTapUp => {
                if single && !config.double_click_enabled && !scrolled_away {
                    self.with_touch(|t, s| t.on_click(s));
                    self.finish("click");
                }
            }
            TapSignal::LongPress => {
                if single && !flags.trigger_double_click {
                    let consumed = self.touch.as_deref_mut().is_some_and(|t| t.on_long_press(&mut self.state));
                    if consumed {
                        self.with_touch(|t, s| t.on_long_click(s));
                        self.finish("long click");
                    } else {
                        self.state.flags.long_press = true;
                    }
                }
            }
            TapSignal::SingleTapConfirmed => {
                if single && config.double_click_enabled && !scrolled_away {
                    self.with_touch(|t, s| t.on_click(s));
                    self.finish("click");
                } else {
                    self.finish("tap abandoned");
                }
            }
            TapSignal::DoubleTap => {
                self.state.flags.trigger_double_click = true;
            }
            TapSignal::DoubleTapMove => {
                if flags.trigger_double_click && self.state.has_raw_motion() {
                    self.state.flags.double_tap_scrolling = true;
                }
            }
            TapSignal::DoubleTapUp => {
                if flags.trigger_double_click {
                    let give_up = config.give_up_click_on_double_tap_scroll && flags.double_tap_scrolling;
                    if !give_up {
                        self.with_touch(|t, s| t.on_double_click(s));
                    }
                    self.finish("double click");
                }
            }
        }
    }

    // --- Completion ---

    fn with_touch(&mut self, f: impl FnOnce(&mut dyn TouchListener, &mut GestureState)) {
        if let Some(touch) = self.touch.as_deref_mut() {
            f(touch, &mut self.state);
        }
    }

    /// End the session normally.
    fn finish(&mut self, reason: &'static str) {
        self.with_touch(|t, s| t.on_touch_end(s));
        self.recycle();
        tracing::debug!(reason, "session completed");
    }

    /// Cancel the running session: end multi-finger listeners, then notify the touch listener.
    fn abort(&mut self) {
        if self.state.flags.completed {
            return;
        }
        if self.state.flags.multi_finger {
            self.end_multi();
        }
        self.with_touch(|t, s| t.on_touch_cancel(s));
        self.recycle();
        tracing::debug!("session cancelled");
    }

    fn recycle(&mut self) {
        self.state.recycle();
        self.tap.reset();
    }
}

/// Run one listener's callback loop over `channel`.
///
/// While any gated accumulator holds a full chunk the callback runs once per
/// chunk; otherwise it runs once with whatever the accumulators expose.
/// Returns the last callback result. A `false` result stops the loop.
fn drive(state: &mut GestureState, channel: Channel, mut step: impl FnMut(&mut GestureState) -> bool) -> bool {
    let keep = if state.can_consume(channel) {
        let mut keep = true;
        while keep && state.can_consume(channel) {
            keep = step(state);
            state.step_done(channel);
        }
        keep
    } else {
        step(state)
    };
    state.finish_loop(channel);
    keep
}
