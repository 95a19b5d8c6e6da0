//! Subscription identifiers.

use serde::{Deserialize, Serialize};
use std::fmt;
use uuid::Uuid;

/// Error returned when parsing a [`SubscriptionId`] from a string fails.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("invalid subscription id: {0}")]
pub struct ParseSubscriptionIdError(String);

/// A globally unique subscription identifier.
///
/// Wraps a UUIDv7 so natural string ordering tracks creation order. The
/// wire form is prefixed (`sub_<uuid>`); [`SubscriptionId::parse_lenient`]
/// also accepts a bare UUID for interop with the consumer-assigned ids
/// carried in a [`SubscriptionRequest`](crate::message::SubscriptionRequest).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct SubscriptionId(Uuid);

const PREFIX: &str = "sub_";

impl SubscriptionId {
    /// Generate a fresh, time-ordered subscription id.
    pub fn generate() -> Self {
        Self(Uuid::now_v7())
    }

    /// Parse the canonical prefixed form, e.g. `"sub_<uuid>"`.
    pub fn parse(s: &str) -> Result<Self, ParseSubscriptionIdError> {
        let raw = s
            .strip_prefix(PREFIX)
            .ok_or_else(|| ParseSubscriptionIdError(s.to_string()))?;
        Uuid::parse_str(raw)
            .map(Self)
            .map_err(|_| ParseSubscriptionIdError(s.to_string()))
    }

    /// Parse either the canonical prefixed form or a bare UUID string.
    pub fn parse_lenient(s: &str) -> Result<Self, ParseSubscriptionIdError> {
        if let Ok(id) = Self::parse(s) {
            return Ok(id);
        }
        Uuid::parse_str(s)
            .map(Self)
            .map_err(|_| ParseSubscriptionIdError(s.to_string()))
    }
}

impl fmt::Display for SubscriptionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{PREFIX}{}", self.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn generated_ids_round_trip_through_display_and_parse() {
        let id = SubscriptionId::generate();
        let rendered = id.to_string();
        assert!(rendered.starts_with(PREFIX));
        assert_eq!(SubscriptionId::parse(&rendered).unwrap(), id);
    }

    #[test]
    fn lenient_parse_accepts_bare_uuid() {
        let id = SubscriptionId::generate();
        let bare = id.to_string().strip_prefix(PREFIX).unwrap().to_string();
        assert_eq!(SubscriptionId::parse_lenient(&bare).unwrap(), id);
    }

    #[test]
    fn parse_rejects_garbage() {
        assert!(SubscriptionId::parse("not-a-uuid").is_err());
        assert!(SubscriptionId::parse_lenient("not-a-uuid").is_err());
    }
}
