//! Shared numeric constants for the gesture and adsorption engines.

// ── Tap timing ──────────────────────────────────────────────────

/// Time a contact must stay down inside the touch slop before `press` fires.
pub const TAP_TIMEOUT_MS: u64 = 100;

/// Time a contact must stay down inside the touch slop before `long-press` fires.
pub const LONG_PRESS_TIMEOUT_MS: u64 = 500;

/// Window after the first down during which a second tap counts as a double tap.
pub const DOUBLE_TAP_TIMEOUT_MS: u64 = 300;

/// Minimum gap between the first up and the second down of a double tap.
pub const DOUBLE_TAP_MIN_TIME_MS: u64 = 40;

// ── Slops ───────────────────────────────────────────────────────

/// Travel from the down position after which a contact is no longer a tap.
pub const TOUCH_SLOP: f64 = 8.0;

/// Maximum distance between the two downs of a double tap.
pub const DOUBLE_TAP_SLOP: f64 = 100.0;

// ── Numeric neutrals ────────────────────────────────────────────

/// Scale ratio that leaves a body unchanged.
pub const NEUTRAL_SCALE: f64 = 1.0;

// ── Adsorption ──────────────────────────────────────────────────

/// Default distance at which a magnet starts attracting a body.
pub const DEFAULT_MAGNETISM_THRESHOLD: f64 = 20.0;

/// Release threshold as a multiple of the magnetism threshold.
pub const RELEASE_MULTIPLIER: f64 = 2.0;

/// Default post-release distance during which re-attachment is suppressed.
pub const DEFAULT_IMMUNITY_THRESHOLD: f64 = 20.0;
