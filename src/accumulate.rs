//! Accumulation gating for move, rotation and scale deltas.
//!
//! DESIGN
//! ======
//! A consumer may ask for deltas in fixed-size chunks instead of raw per-frame
//! values: "call me once per 10 px of horizontal travel". Each frame's signed
//! offset from neutral is added to a running total, so travel in opposite
//! directions cancels. While the total holds at least one threshold another
//! chunk is available; each emitted chunk moves the total one threshold back
//! toward zero and carries the total's sign. One fast swipe can therefore
//! emit several callbacks in a single frame.
//!
//! Chunk availability is compared with a relative tolerance, so a frame of
//! exactly `k` thresholds emits `k` chunks even when the threshold has no
//! exact binary representation.
//!
//! With no threshold (`0`) the accumulator is transparent: the raw delta is
//! exposed once per frame. Inside a multi-step loop driven by a different,
//! gated quantity the transparent value is exposed on the first step only, so
//! the raw delta is never applied twice.
//!
//! Independently, a consumer may "eat" part of the exposed value for the rest
//! of the current frame (`consume_external`). That reduction is cleared when
//! the next frame begins.

#[cfg(test)]
#[path = "accumulate_test.rs"]
mod accumulate_test;

use crate::consts::NEUTRAL_SCALE;

/// Relative slack when deciding whether a full chunk is available.
const CHUNK_TOLERANCE: f64 = 1e-9;

/// How a quantity's magnitude and neutral value are defined.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Quantity {
    /// Additive delta (move, rotation); neutral is `0`, magnitude is `|v|`.
    Delta,
    /// Multiplicative ratio (scale); neutral is `1`, magnitude is `|v - 1|`.
    Ratio,
}

impl Quantity {
    fn neutral(self) -> f64 {
        match self {
            Self::Delta => 0.0,
            Self::Ratio => NEUTRAL_SCALE,
        }
    }

    /// Signed offset of `value` from the neutral point.
    fn offset(self, value: f64) -> f64 {
        value - self.neutral()
    }

    /// Rebuild a value from a signed magnitude around the neutral point.
    fn compose(self, sign: f64, magnitude: f64) -> f64 {
        self.neutral() + sign * magnitude
    }
}

fn sign_of(offset: f64) -> f64 {
    if offset < 0.0 { -1.0 } else { 1.0 }
}

/// Running accumulation counters for one quantity.
#[derive(Debug, Clone, PartialEq)]
pub struct Accumulator {
    quantity: Quantity,
    threshold: f64,
    /// Signed offset recorded but not yet emitted as chunks.
    accumulated: f64,
    external: f64,
    emitted: bool,
}

impl Accumulator {
    #[must_use]
    pub fn new(quantity: Quantity) -> Self {
        Self { quantity, threshold: 0.0, accumulated: 0.0, external: 0.0, emitted: false }
    }

    /// Set the chunk size. Non-finite or negative values disable gating.
    pub fn set_threshold(&mut self, threshold: f64) {
        self.threshold = if threshold.is_finite() && threshold > 0.0 { threshold } else { 0.0 };
    }

    #[must_use]
    pub fn threshold(&self) -> f64 {
        self.threshold
    }

    #[must_use]
    pub fn is_gated(&self) -> bool {
        self.threshold > 0.0
    }

    /// Signed offset accumulated but not yet emitted as chunks.
    #[must_use]
    pub fn pending(&self) -> f64 {
        self.accumulated
    }

    /// Start a new frame: drop per-frame external consumption and re-arm the
    /// ungated single emission.
    pub fn begin_event(&mut self) {
        self.external = 0.0;
        self.emitted = false;
    }

    /// Add one frame's raw value to the running total.
    pub fn record(&mut self, raw: f64) {
        let offset = self.quantity.offset(raw);
        if self.is_gated() && offset.is_finite() {
            self.accumulated += offset;
        }
    }

    /// Whether at least one full chunk is available.
    #[must_use]
    pub fn can_consume(&self) -> bool {
        self.is_gated() && self.accumulated.abs() >= self.threshold * (1.0 - CHUNK_TOLERANCE)
    }

    /// Mark one chunk as emitted, or the single raw emission for an ungated quantity.
    pub fn step_done(&mut self) {
        if self.can_consume() {
            self.accumulated -= sign_of(self.accumulated) * self.threshold;
            if self.accumulated.abs() < self.threshold * CHUNK_TOLERANCE {
                self.accumulated = 0.0;
            }
        } else if !self.is_gated() {
            self.emitted = true;
        }
    }

    /// Re-arm the ungated single emission once a callback loop finishes, so
    /// post-frame queries still see the raw value.
    pub fn finish_loop(&mut self) {
        self.emitted = false;
    }

    /// Reduce the exposed value for the rest of this frame.
    pub fn consume_external(&mut self, amount: f64) {
        if amount.is_finite() {
            self.external += amount.abs();
        }
    }

    /// The value a consumer observes for a frame whose raw value is `raw`.
    ///
    /// A gated chunk takes the sign of the running total, not of `raw`.
    #[must_use]
    pub fn exposed(&self, raw: f64) -> f64 {
        let q = self.quantity;
        let (sign, magnitude) = if self.is_gated() {
            let magnitude = if self.can_consume() { self.threshold } else { 0.0 };
            (sign_of(self.accumulated), magnitude)
        } else if self.emitted {
            (1.0, 0.0)
        } else {
            let offset = q.offset(raw);
            (sign_of(offset), offset.abs())
        };
        q.compose(sign, (magnitude - self.external).max(0.0))
    }

    /// Clear every running counter. The threshold is configuration and survives.
    pub fn reset(&mut self) {
        self.accumulated = 0.0;
        self.external = 0.0;
        self.emitted = false;
    }
}
