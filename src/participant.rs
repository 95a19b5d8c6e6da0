//! Participant identity.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Error returned when constructing a [`ParticipantId`] from an empty string.
#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
#[error("participant id must not be empty")]
pub struct EmptyParticipantId;

/// Opaque, globally unique identifier for a communication endpoint.
///
/// A `ParticipantId` never compares equal to the empty string; the only
/// constructors are [`ParticipantId::new`] and [`TryFrom`] implementations
/// that enforce this invariant.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ParticipantId(String);

impl ParticipantId {
    /// Build a participant id, rejecting the empty string.
    pub fn new(id: impl Into<String>) -> Result<Self, EmptyParticipantId> {
        let id = id.into();
        if id.is_empty() {
            return Err(EmptyParticipantId);
        }
        Ok(Self(id))
    }

    /// Borrow the underlying string.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl TryFrom<String> for ParticipantId {
    type Error = EmptyParticipantId;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::new(value)
    }
}

impl TryFrom<&str> for ParticipantId {
    type Error = EmptyParticipantId;

    fn try_from(value: &str) -> Result<Self, Self::Error> {
        Self::new(value)
    }
}

impl fmt::Display for ParticipantId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rejects_empty_id() {
        assert!(ParticipantId::new("").is_err());
    }

    #[test]
    fn accepts_non_empty_id() {
        let id = ParticipantId::new("provider-1").unwrap();
        assert_eq!(id.as_str(), "provider-1");
    }
}
