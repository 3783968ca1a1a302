//! Multi-touch gesture arbitration and magnetic adsorption.
//!
//! This crate classifies a stream of raw pointer-contact frames into taps,
//! long presses, double taps, single/multi-finger pans, pinch scaling and
//! two-finger rotation, and separately decides when a dragged rectangle snaps
//! to nearby alignment targets and when it breaks free again. The host owns
//! the pointer source, rendering and coordinate resolution; it feeds resolved
//! absolute positions and rectangles in and applies the deltas that come out.
//!
//! ## Module layout
//!
//! | Module | Role |
//! |--------|------|
//! | [`detector`] | Gesture arbitration engine ([`detector::GestureDetector`]) |
//! | [`state`] | Per-session gesture state and the consumer query surface |
//! | [`snapshot`] | Validated contact frames fed into the detector |
//! | [`tap`] | Timestamp-driven tap / long-press / double-tap sub-detector |
//! | [`accumulate`] | Threshold gating for move, rotate and scale deltas |
//! | [`listener`] | Optional consumer callback traits |
//! | [`adsorption`] | Magnetic snap engine, its data model and measurement pass |
//! | [`geometry`] | Points, rectangles, distance / angle / midpoint helpers |
//! | [`config`] | Typed configuration with env and JSON loaders |
//! | [`error`] | Contract-violation and configuration errors |
//! | [`consts`] | Shared numeric defaults (timings, slops, thresholds) |

pub mod accumulate;
pub mod adsorption;
pub mod config;
pub mod consts;
pub mod detector;
pub mod error;
pub mod geometry;
pub mod listener;
pub mod snapshot;
pub mod state;
pub mod tap;

pub use adsorption::magnet::{Alignment, AnchorEdge, Axis, AxisThresholds, Edge, Magnet, MagneticBody, Measurement, TargetId};
pub use adsorption::measure::{AxisMeasurements, Layout, alignment_distance, analyze};
pub use adsorption::{Adsorption, AdsorptionFrame, AdsorptionOutcome, AxisPhase, Track};
pub use config::{AccumulationThresholds, AdsorptionConfig, GestureConfig, ImmunityMode, TapTimings};
pub use detector::GestureDetector;
pub use error::{ConfigError, GestureError};
pub use geometry::{Point, Rect};
pub use listener::{MoveListener, RotateListener, ScaleListener, TouchListener};
pub use snapshot::{Action, Contact, ContactSnapshot, PointerId};
pub use state::GestureState;
