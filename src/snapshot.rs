//! Contact snapshots: one validated frame of pointer input.
//!
//! A snapshot is the only thing the detector ever sees from the host's pointer
//! source. It is validated once on construction so the engine can rely on
//! unique pointer ids and a present action pointer for the rest of its life.

#[cfg(test)]
#[path = "snapshot_test.rs"]
mod snapshot_test;

use serde::{Deserialize, Serialize};

use crate::error::GestureError;
use crate::geometry::Point;

/// Identifier the pointer source assigns to one contact for its whole lifetime.
pub type PointerId = u32;

/// What changed in this frame.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case", tag = "kind", content = "pointer")]
pub enum Action {
    /// The first contact landed.
    Down,
    /// An additional contact landed.
    PointerDown(PointerId),
    /// One or more contacts moved.
    Move,
    /// A contact other than the last one lifted. It is still present in this frame.
    PointerUp(PointerId),
    /// The last contact lifted. It is still present in this frame.
    Up,
    /// The pointer source aborted the interaction.
    Cancel,
}

/// One contact in a frame.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Contact {
    pub id: PointerId,
    /// Absolute (screen) position.
    pub position: Point,
}

impl Contact {
    #[must_use]
    pub fn new(id: PointerId, x: f64, y: f64) -> Self {
        Self { id, position: Point::new(x, y) }
    }
}

/// Immutable view of one input frame.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ContactSnapshot {
    action: Action,
    contacts: Vec<Contact>,
    time_ms: u64,
}

impl ContactSnapshot {
    /// Validate and build a snapshot.
    ///
    /// # Errors
    ///
    /// Returns a [`GestureError`] if the frame has no contacts, repeats a
    /// pointer id, carries more than one contact on `Down`, or names an
    /// action pointer it does not contain.
    pub fn new(action: Action, contacts: Vec<Contact>, time_ms: u64) -> Result<Self, GestureError> {
        if contacts.is_empty() {
            return Err(GestureError::EmptySnapshot);
        }
        for (i, contact) in contacts.iter().enumerate() {
            if contacts[..i].iter().any(|c| c.id == contact.id) {
                return Err(GestureError::DuplicatePointer(contact.id));
            }
        }
        match action {
            Action::Down if contacts.len() != 1 => return Err(GestureError::UnexpectedContactCount(contacts.len())),
            Action::PointerDown(id) | Action::PointerUp(id) if !contacts.iter().any(|c| c.id == id) => {
                return Err(GestureError::MissingActionPointer(id));
            }
            _ => {}
        }
        Ok(Self { action, contacts, time_ms })
    }

    #[must_use]
    pub fn action(&self) -> Action {
        self.action
    }

    #[must_use]
    pub fn contacts(&self) -> &[Contact] {
        &self.contacts
    }

    #[must_use]
    pub fn time_ms(&self) -> u64 {
        self.time_ms
    }

    #[must_use]
    pub fn pointer_count(&self) -> usize {
        self.contacts.len()
    }

    /// Position of `id` in this frame, if the pointer is present.
    #[must_use]
    pub fn position_of(&self, id: PointerId) -> Option<Point> {
        self.contacts.iter().find(|c| c.id == id).map(|c| c.position)
    }

    /// Position of `id`, treating absence as a contract violation.
    ///
    /// # Errors
    ///
    /// Returns [`GestureError::MissingPointer`] if `id` is not in this frame.
    pub fn require(&self, id: PointerId) -> Result<Point, GestureError> {
        self.position_of(id).ok_or(GestureError::MissingPointer(id))
    }

    /// The first contact in frame order.
    #[must_use]
    pub fn primary(&self) -> Contact {
        // `new` rejects empty frames, so index 0 always exists.
        self.contacts[0]
    }
}

/// Wire form used when snapshots are read from recorded scripts.
#[derive(Deserialize)]
struct RawSnapshot {
    action: Action,
    contacts: Vec<Contact>,
    #[serde(default)]
    time_ms: u64,
}

impl<'de> Deserialize<'de> for ContactSnapshot {
    fn deserialize<D: serde::Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let raw = RawSnapshot::deserialize(deserializer)?;
        Self::new(raw.action, raw.contacts, raw.time_ms).map_err(serde::de::Error::custom)
    }
}
