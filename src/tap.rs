//! Tap / long-press / double-tap sub-detector.
//!
//! DESIGN
//! ======
//! This is the platform tap adapter rebuilt as an explicit state machine.
//! It has no clock of its own: timers are deadlines (`*_at`, in the same
//! millisecond timebase as snapshot timestamps) and fire only when the owner
//! calls [`TapDetector::advance`] with a time at or past them. The arbitration
//! engine advances to each frame's timestamp before forwarding the frame, and
//! hosts call `GestureDetector::on_tick` between frames so a press held
//! perfectly still still becomes a long press.
//!
//! The detector emits raw [`TapSignal`]s only. Whether a signal turns into a
//! consumer callback (finger count, multi-finger history, give-up policy) is
//! decided by the arbitration engine.

#[cfg(test)]
#[path = "tap_test.rs"]
mod tap_test;

use crate::config::TapTimings;
use crate::geometry::{Point, distance};
use crate::snapshot::{Action, ContactSnapshot};

/// Raw timing-derived signals.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TapSignal {
    /// Contact held inside the touch slop for the tap timeout.
    ShowPress,
    /// Contact lifted inside the touch slop before a long press.
    SingleTapUp,
    /// Contact held inside the touch slop for the long-press timeout.
    LongPress,
    /// The double-tap window closed without a second tap.
    SingleTapConfirmed,
    /// A second down landed inside the double-tap window and slop.
    DoubleTap,
    /// The second press of a double tap moved.
    DoubleTapMove,
    /// The second press of a double tap lifted.
    DoubleTapUp,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Timer {
    ShowPress,
    LongPress,
    TapConfirm,
}

/// Where the previous tap went down and when it lifted.
#[derive(Debug, Clone, Copy)]
struct PreviousTap {
    down: Point,
    up_ms: u64,
    in_double_tap_region: bool,
}

#[allow(clippy::struct_excessive_bools)]
#[derive(Debug, Clone)]
pub struct TapDetector {
    timings: TapTimings,
    double_tap_enabled: bool,
    show_press_at: Option<u64>,
    long_press_at: Option<u64>,
    tap_confirm_at: Option<u64>,
    down: Option<Point>,
    still_down: bool,
    in_tap_region: bool,
    in_double_tap_region: bool,
    in_long_press: bool,
    defer_confirm: bool,
    double_tapping: bool,
    previous: Option<PreviousTap>,
}

impl TapDetector {
    #[must_use]
    pub fn new(timings: TapTimings, double_tap_enabled: bool) -> Self {
        Self {
            timings,
            double_tap_enabled,
            show_press_at: None,
            long_press_at: None,
            tap_confirm_at: None,
            down: None,
            still_down: false,
            in_tap_region: false,
            in_double_tap_region: false,
            in_long_press: false,
            defer_confirm: false,
            double_tapping: false,
            previous: None,
        }
    }

    pub fn set_timings(&mut self, timings: TapTimings) {
        self.timings = timings;
    }

    pub fn set_double_tap_enabled(&mut self, enabled: bool) {
        self.double_tap_enabled = enabled;
        if !enabled {
            self.tap_confirm_at = None;
            self.defer_confirm = false;
        }
    }

    /// The contact has not left the touch slop since it went down.
    #[must_use]
    pub fn in_tap_region(&self) -> bool {
        self.in_tap_region
    }

    #[must_use]
    pub fn is_double_tapping(&self) -> bool {
        self.double_tapping
    }

    /// A single-tap confirmation is still owed (double-tap window open).
    #[must_use]
    pub fn has_pending_continuation(&self) -> bool {
        self.tap_confirm_at.is_some() || self.defer_confirm
    }

    /// Earliest armed deadline, for hosts that schedule their own ticks.
    #[must_use]
    pub fn next_deadline(&self) -> Option<u64> {
        [self.show_press_at, self.long_press_at, self.tap_confirm_at].into_iter().flatten().min()
    }

    /// Fire every timer whose deadline is at or before `now_ms`, in deadline order.
    pub fn advance(&mut self, now_ms: u64) -> Vec<TapSignal> {
        let mut signals = Vec::new();
        while let Some((at, timer)) = self.next_due(now_ms) {
            tracing::trace!(at, ?timer, "tap timer fired");
            match timer {
                Timer::ShowPress => {
                    self.show_press_at = None;
                    signals.push(TapSignal::ShowPress);
                }
                Timer::LongPress => {
                    self.long_press_at = None;
                    self.tap_confirm_at = None;
                    self.defer_confirm = false;
                    self.in_long_press = true;
                    signals.push(TapSignal::LongPress);
                }
                Timer::TapConfirm => {
                    self.tap_confirm_at = None;
                    if self.still_down {
                        self.defer_confirm = true;
                    } else {
                        signals.push(TapSignal::SingleTapConfirmed);
                    }
                }
            }
        }
        signals
    }

    fn next_due(&self, now_ms: u64) -> Option<(u64, Timer)> {
        [
            (self.show_press_at, Timer::ShowPress),
            (self.long_press_at, Timer::LongPress),
            (self.tap_confirm_at, Timer::TapConfirm),
        ]
        .into_iter()
        .filter_map(|(at, timer)| at.filter(|at| *at <= now_ms).map(|at| (at, timer)))
        .min_by_key(|(at, _)| *at)
    }

    /// Feed one frame. Call [`TapDetector::advance`] with the frame time first.
    pub fn on_event(&mut self, snapshot: &ContactSnapshot) -> Vec<TapSignal> {
        let time = snapshot.time_ms();
        let position = snapshot.primary().position;
        match snapshot.action() {
            Action::Down => self.on_down(position, time),
            Action::Move => self.on_move(position),
            Action::Up => self.on_up(time),
            Action::PointerDown(_) | Action::Cancel => {
                self.cancel_taps();
                Vec::new()
            }
            Action::PointerUp(_) => Vec::new(),
        }
    }

    fn on_down(&mut self, position: Point, time: u64) -> Vec<TapSignal> {
        let mut signals = Vec::new();
        let had_tap_pending = self.tap_confirm_at.take().is_some();
        if had_tap_pending && self.double_tap_enabled && self.is_considered_double_tap(position, time) {
            self.double_tapping = true;
            signals.push(TapSignal::DoubleTap);
        } else if self.double_tap_enabled {
            self.tap_confirm_at = Some(time.saturating_add(self.timings.double_tap_timeout_ms));
        }
        self.down = Some(position);
        self.still_down = true;
        self.in_tap_region = true;
        self.in_double_tap_region = true;
        self.in_long_press = false;
        self.defer_confirm = false;
        self.show_press_at = Some(time.saturating_add(self.timings.tap_timeout_ms));
        self.long_press_at = Some(time.saturating_add(self.timings.long_press_timeout_ms));
        signals
    }

    fn on_move(&mut self, position: Point) -> Vec<TapSignal> {
        if self.double_tapping {
            return vec![TapSignal::DoubleTapMove];
        }
        let Some(down) = self.down else {
            return Vec::new();
        };
        let travel = distance(down, position);
        if self.in_tap_region && travel > self.timings.touch_slop {
            self.in_tap_region = false;
            self.tap_confirm_at = None;
            self.show_press_at = None;
            self.long_press_at = None;
        }
        if travel > self.timings.double_tap_slop {
            self.in_double_tap_region = false;
        }
        Vec::new()
    }

    fn on_up(&mut self, time: u64) -> Vec<TapSignal> {
        let mut signals = Vec::new();
        self.still_down = false;
        if self.double_tapping {
            signals.push(TapSignal::DoubleTapUp);
        } else if self.in_long_press {
            self.tap_confirm_at = None;
            self.in_long_press = false;
        } else if self.in_tap_region {
            signals.push(TapSignal::SingleTapUp);
            if self.defer_confirm {
                signals.push(TapSignal::SingleTapConfirmed);
            }
        }
        if let Some(down) = self.down {
            self.previous = Some(PreviousTap { down, up_ms: time, in_double_tap_region: self.in_double_tap_region });
        }
        self.double_tapping = false;
        self.defer_confirm = false;
        self.show_press_at = None;
        self.long_press_at = None;
        signals
    }

    fn is_considered_double_tap(&self, second_down: Point, time: u64) -> bool {
        let Some(previous) = self.previous else {
            return false;
        };
        if !previous.in_double_tap_region {
            return false;
        }
        let Some(gap) = time.checked_sub(previous.up_ms) else {
            return false;
        };
        if gap > self.timings.double_tap_timeout_ms || gap < self.timings.double_tap_min_time_ms {
            return false;
        }
        distance(previous.down, second_down) <= self.timings.double_tap_slop
    }

    /// A second contact (or a cancel) ends every tap interpretation.
    fn cancel_taps(&mut self) {
        self.show_press_at = None;
        self.long_press_at = None;
        self.tap_confirm_at = None;
        self.double_tapping = false;
        self.in_tap_region = false;
        self.in_double_tap_region = false;
        self.defer_confirm = false;
        self.in_long_press = false;
    }

    /// Forget everything, including the previous tap.
    pub fn reset(&mut self) {
        self.cancel_taps();
        self.down = None;
        self.still_down = false;
        self.previous = None;
    }
}
