//! Typed configuration for the detector and the adsorption engine.
//!
//! Everything has a default, so `GestureConfig::default()` is a complete,
//! working setup. Hosts that prefer declarative setup can load the same
//! structure from JSON or from `GESTURE_*` environment variables.

#[cfg(test)]
#[path = "config_test.rs"]
mod config_test;

use serde::{Deserialize, Serialize};

use crate::consts::{
    DOUBLE_TAP_MIN_TIME_MS, DOUBLE_TAP_SLOP, DOUBLE_TAP_TIMEOUT_MS, LONG_PRESS_TIMEOUT_MS, TAP_TIMEOUT_MS, TOUCH_SLOP,
};
use crate::error::ConfigError;

/// Timings and slops for the tap / long-press / double-tap sub-detector.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TapTimings {
    pub tap_timeout_ms: u64,
    pub long_press_timeout_ms: u64,
    pub double_tap_timeout_ms: u64,
    pub double_tap_min_time_ms: u64,
    pub touch_slop: f64,
    pub double_tap_slop: f64,
}

impl Default for TapTimings {
    fn default() -> Self {
        Self {
            tap_timeout_ms: TAP_TIMEOUT_MS,
            long_press_timeout_ms: LONG_PRESS_TIMEOUT_MS,
            double_tap_timeout_ms: DOUBLE_TAP_TIMEOUT_MS,
            double_tap_min_time_ms: DOUBLE_TAP_MIN_TIME_MS,
            touch_slop: TOUCH_SLOP,
            double_tap_slop: DOUBLE_TAP_SLOP,
        }
    }
}

/// Minimum accumulated magnitude before each quantity's callback fires.
///
/// `0` disables gating for that quantity. Scale is measured as distance of the
/// ratio from `1.0`.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct AccumulationThresholds {
    pub move_x: f64,
    pub move_y: f64,
    pub rotation: f64,
    pub scale: f64,
}

/// Detector configuration.
#[allow(clippy::struct_excessive_bools)]
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct GestureConfig {
    /// Defer single taps until the double-tap window closes.
    pub double_click_enabled: bool,
    /// Drop a pending single tap if the contact moved before lifting.
    pub give_up_click_on_single_tap_scroll: bool,
    /// Drop a double tap if the second press moved before lifting.
    pub give_up_click_on_double_tap_scroll: bool,
    /// Keep delivering single-finger moves after a multi-finger phase ends.
    pub resume_single_finger_after_multi: bool,
    pub thresholds: AccumulationThresholds,
    pub tap: TapTimings,
}

impl Default for GestureConfig {
    fn default() -> Self {
        Self {
            double_click_enabled: true,
            give_up_click_on_single_tap_scroll: true,
            give_up_click_on_double_tap_scroll: true,
            resume_single_finger_after_multi: false,
            thresholds: AccumulationThresholds::default(),
            tap: TapTimings::default(),
        }
    }
}

impl GestureConfig {
    /// Build config from process environment variables.
    ///
    /// All optional; absent keys keep their defaults:
    /// - `GESTURE_DOUBLE_CLICK`, `GESTURE_GIVE_UP_SINGLE_TAP_SCROLL`,
    ///   `GESTURE_GIVE_UP_DOUBLE_TAP_SCROLL`, `GESTURE_RESUME_SINGLE_AFTER_MULTI`
    ///   (`true`/`false`/`1`/`0`/`yes`/`no`)
    /// - `GESTURE_ACCUMULATE_MOVE_X`, `GESTURE_ACCUMULATE_MOVE_Y`,
    ///   `GESTURE_ACCUMULATE_ROTATION`, `GESTURE_ACCUMULATE_SCALE`
    /// - `GESTURE_TAP_TIMEOUT_MS`, `GESTURE_LONG_PRESS_TIMEOUT_MS`,
    ///   `GESTURE_DOUBLE_TAP_TIMEOUT_MS`, `GESTURE_TOUCH_SLOP`
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError`] when a present value does not parse or is out of range.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| std::env::var_os(key).map(|v| v.to_string_lossy().into_owned()))
    }

    /// Same as [`GestureConfig::from_env`] but reads keys through `lookup`.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError`] when a present value does not parse or is out of range.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let defaults = Self::default();
        let thresholds = AccumulationThresholds {
            move_x: parse_f64(&lookup, "GESTURE_ACCUMULATE_MOVE_X", defaults.thresholds.move_x)?,
            move_y: parse_f64(&lookup, "GESTURE_ACCUMULATE_MOVE_Y", defaults.thresholds.move_y)?,
            rotation: parse_f64(&lookup, "GESTURE_ACCUMULATE_ROTATION", defaults.thresholds.rotation)?,
            scale: parse_f64(&lookup, "GESTURE_ACCUMULATE_SCALE", defaults.thresholds.scale)?,
        };
        let tap = TapTimings {
            tap_timeout_ms: parse_u64(&lookup, "GESTURE_TAP_TIMEOUT_MS", defaults.tap.tap_timeout_ms)?,
            long_press_timeout_ms: parse_u64(&lookup, "GESTURE_LONG_PRESS_TIMEOUT_MS", defaults.tap.long_press_timeout_ms)?,
            double_tap_timeout_ms: parse_u64(&lookup, "GESTURE_DOUBLE_TAP_TIMEOUT_MS", defaults.tap.double_tap_timeout_ms)?,
            touch_slop: parse_f64(&lookup, "GESTURE_TOUCH_SLOP", defaults.tap.touch_slop)?,
            ..defaults.tap
        };
        let config = Self {
            double_click_enabled: parse_bool(&lookup, "GESTURE_DOUBLE_CLICK", defaults.double_click_enabled)?,
            give_up_click_on_single_tap_scroll: parse_bool(
                &lookup,
                "GESTURE_GIVE_UP_SINGLE_TAP_SCROLL",
                defaults.give_up_click_on_single_tap_scroll,
            )?,
            give_up_click_on_double_tap_scroll: parse_bool(
                &lookup,
                "GESTURE_GIVE_UP_DOUBLE_TAP_SCROLL",
                defaults.give_up_click_on_double_tap_scroll,
            )?,
            resume_single_finger_after_multi: parse_bool(
                &lookup,
                "GESTURE_RESUME_SINGLE_AFTER_MULTI",
                defaults.resume_single_finger_after_multi,
            )?,
            thresholds,
            tap,
        };
        config.validate()?;
        Ok(config)
    }

    /// Parse a JSON document; missing fields keep their defaults.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Json`] for malformed JSON and
    /// [`ConfigError::OutOfRange`] for negative thresholds or slops.
    pub fn from_json(text: &str) -> Result<Self, ConfigError> {
        let config: Self = serde_json::from_str(text)?;
        config.validate()?;
        Ok(config)
    }

    /// Reject negative or non-finite thresholds and slops.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::OutOfRange`] naming the first offending field.
    pub fn validate(&self) -> Result<(), ConfigError> {
        let checks = [
            ("thresholds.move_x", self.thresholds.move_x),
            ("thresholds.move_y", self.thresholds.move_y),
            ("thresholds.rotation", self.thresholds.rotation),
            ("thresholds.scale", self.thresholds.scale),
            ("tap.touch_slop", self.tap.touch_slop),
            ("tap.double_tap_slop", self.tap.double_tap_slop),
        ];
        for (key, value) in checks {
            if !value.is_finite() || value < 0.0 {
                return Err(ConfigError::OutOfRange { key: key.into(), value });
            }
        }
        Ok(())
    }
}

/// How the adsorption engine spends the post-release immunity budget.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ImmunityMode {
    /// Compare the live aligned-edge distance against the budget. Tolerates
    /// hosts that round positions to integers and silently lose sub-unit motion.
    #[default]
    AlignmentDistance,
    /// Subtract raw motion from the budget. Exact for float-positioned hosts.
    RawMotion,
}

/// Adsorption engine configuration.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct AdsorptionConfig {
    pub immunity_mode: ImmunityMode,
}

fn parse_bool(lookup: &impl Fn(&str) -> Option<String>, key: &str, default: bool) -> Result<bool, ConfigError> {
    let Some(raw) = lookup(key) else {
        return Ok(default);
    };
    match raw.trim().to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Ok(true),
        "0" | "false" | "no" | "off" => Ok(false),
        _ => Err(ConfigError::InvalidBool { key: key.into(), value: raw }),
    }
}

fn parse_f64(lookup: &impl Fn(&str) -> Option<String>, key: &str, default: f64) -> Result<f64, ConfigError> {
    let Some(raw) = lookup(key) else {
        return Ok(default);
    };
    raw.trim().parse::<f64>().map_err(|_| ConfigError::InvalidNumber { key: key.into(), value: raw })
}

fn parse_u64(lookup: &impl Fn(&str) -> Option<String>, key: &str, default: u64) -> Result<u64, ConfigError> {
    let Some(raw) = lookup(key) else {
        return Ok(default);
    };
    raw.trim().parse::<u64>().map_err(|_| ConfigError::InvalidNumber { key: key.into(), value: raw })
}
