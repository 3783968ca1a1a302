//! Error types.
//!
//! `GestureError` describes contract violations by the upstream event source:
//! frames that cannot come from a well-behaved pointer stack. They are never
//! recovered inside a session; the detector aborts the session instead.
//! `ConfigError` covers configuration text that does not parse.

use crate::snapshot::PointerId;

/// A contact frame broke the event-source contract.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum GestureError {
    /// A frame arrived with no contacts at all.
    #[error("contact snapshot has no contacts")]
    EmptySnapshot,
    /// The same pointer id appears twice in one frame.
    #[error("pointer {0} appears more than once in a snapshot")]
    DuplicatePointer(PointerId),
    /// A primary down arrived with more than one contact.
    #[error("down event carries {0} contacts, expected exactly one")]
    UnexpectedContactCount(usize),
    /// A secondary down/up names a pointer the frame does not contain.
    #[error("action pointer {0} is not present in its snapshot")]
    MissingActionPointer(PointerId),
    /// A tracked major/minor pointer is absent from a frame used for delta math.
    #[error("tracked pointer {0} is missing from the snapshot")]
    MissingPointer(PointerId),
}

/// Configuration text could not be turned into a typed config.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    /// A boolean setting was not one of the accepted spellings.
    #[error("{key}: expected a boolean, got '{value}'")]
    InvalidBool { key: String, value: String },
    /// A numeric setting did not parse.
    #[error("{key}: expected a number, got '{value}'")]
    InvalidNumber { key: String, value: String },
    /// A threshold or timing was negative or not finite.
    #[error("{key}: must be a finite, non-negative value, got {value}")]
    OutOfRange { key: String, value: f64 },
    /// JSON configuration did not deserialize.
    #[error("invalid JSON configuration: {0}")]
    Json(#[from] serde_json::Error),
}
