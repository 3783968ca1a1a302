//! Consumer callback traits.
//!
//! Every method has a default, so a consumer implements only what it cares
//! about. A detector with no listener for an axis simply skips that axis.
//! Callbacks get `&mut GestureState` to read deltas and consume part of them.

use crate::geometry::Point;
use crate::state::GestureState;

/// Session lifecycle and single-finger gestures.
pub trait TouchListener {
    /// A new session is starting at view-relative `(x, y)`. Return `false` to
    /// ignore the whole interaction.
    fn on_begin_touch(&mut self, _state: &mut GestureState, _x: f64, _y: f64) -> bool {
        true
    }

    /// Adjust the single-finger pivot (screen space) for the new session.
    fn provide_pivot(&mut self, _pivot: &mut Point) {}

    /// Single-finger move step. The return value is reported as the frame's handled flag.
    fn on_touch_move(&mut self, _state: &mut GestureState) -> bool {
        true
    }

    /// The contact stayed still long enough to show pressed feedback.
    fn on_press(&mut self, _state: &mut GestureState) {}

    fn on_click(&mut self, _state: &mut GestureState) {}

    /// Return `true` to consume the long press; the session then ends with a long click.
    fn on_long_press(&mut self, _state: &mut GestureState) -> bool {
        false
    }

    fn on_long_click(&mut self, _state: &mut GestureState) {}

    fn on_double_click(&mut self, _state: &mut GestureState) {}

    fn on_touch_end(&mut self, _state: &mut GestureState) {}

    fn on_touch_cancel(&mut self, _state: &mut GestureState) {}
}

/// Pinch scaling.
pub trait ScaleListener {
    fn on_begin_scale(&mut self, _state: &mut GestureState) -> bool {
        true
    }

    /// One scale step; read [`GestureState::scale_factor`]. Return `false` to end scaling.
    fn on_scale(&mut self, _state: &mut GestureState) -> bool {
        true
    }

    fn on_scale_end(&mut self, _state: &mut GestureState) {}
}

/// Two-finger rotation.
pub trait RotateListener {
    fn on_begin_rotate(&mut self, _state: &mut GestureState) -> bool {
        true
    }

    /// One rotation step; read [`GestureState::rotation`]. Return `false` to end rotating.
    fn on_rotate(&mut self, _state: &mut GestureState) -> bool {
        true
    }

    fn on_rotate_end(&mut self, _state: &mut GestureState) {}
}

/// Multi-finger translation.
pub trait MoveListener {
    fn on_begin_move(&mut self, _state: &mut GestureState) -> bool {
        true
    }

    /// One move step; read [`GestureState::move_x`] / [`GestureState::move_y`].
    /// Return `false` to end moving.
    fn on_move(&mut self, _state: &mut GestureState) -> bool {
        true
    }

    fn on_move_end(&mut self, _state: &mut GestureState) {}
}
