//! The transport-agnostic envelope and its message kinds.

use crate::participant::ParticipantId;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::time::{SystemTime, UNIX_EPOCH};

/// Discriminates the payload carried by an [`Envelope`].
///
/// `BroadcastSubscriptionRequest` and `Multicast` are part of the wider
/// system's data model but have no handling component in this subsystem;
/// the [`crate::dispatch::Dispatcher`] treats them like any other
/// unrecognized kind and drops them with a warning.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum MessageKind {
    /// A method invocation directed at a provider.
    Request,
    /// The response to a prior `Request`.
    Reply,
    /// A consumer asking a provider to begin publishing an attribute.
    SubscriptionRequest,
    /// A provider's published attribute value or event.
    SubscriptionPublication,
    /// A consumer asking a provider to stop publishing.
    SubscriptionStop,
    /// Out of scope: multicast event fan-out subscription setup.
    BroadcastSubscriptionRequest,
    /// Out of scope: multicast publication delivery.
    Multicast,
}

/// Current time in milliseconds since the Unix epoch.
pub fn now_ms() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .expect("system clock before epoch")
        .as_millis() as u64
}

/// A transport-agnostic message, opaque to any specific serializer.
///
/// Invariant: `expiry_date_ms` must exceed the wall-clock time at
/// construction; [`Envelope::new`] enforces this by construction rather
/// than validation, since [`crate::message::factory::MessageFactory`] is
/// the only place envelopes are built.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Envelope {
    /// Unique id of this message, independent of any request/reply
    /// correlation id carried in the payload.
    pub message_id: String,
    /// Discriminates how the payload should be interpreted.
    pub kind: MessageKind,
    /// Originating participant.
    pub sender: ParticipantId,
    /// Destination participant.
    pub recipient: ParticipantId,
    /// Wall-clock deadline, in milliseconds since the Unix epoch, after
    /// which the envelope is considered expired and must be discarded
    /// unprocessed.
    pub expiry_date_ms: u64,
    /// Free-form transport/routing metadata.
    pub headers: HashMap<String, String>,
    /// Serialized body; interpretation depends on `kind`.
    pub payload: Vec<u8>,
}

impl Envelope {
    /// Returns `true` if `expiry_date_ms` is strictly before `now_ms`.
    pub fn is_expired_at(&self, now_ms: u64) -> bool {
        self.expiry_date_ms < now_ms
    }
}
