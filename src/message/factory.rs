//! Builds envelopes from typed bodies.
//!
//! Pure functions: given source/destination participants, a
//! [`MessagingQos`], and a typed body, each constructor returns an
//! [`Envelope`] with `expiry_date_ms = now + ttl`, a fresh `message_id`,
//! and a JSON-serialized payload. No I/O, no clock injection — the
//! [`crate::publication::Clock`] abstraction governs scheduling, not
//! envelope stamping.

use super::envelope::{now_ms, Envelope, MessageKind};
use super::qos::MessagingQos;
use super::request::{Reply, Request, SubscriptionPublication, SubscriptionRequest, SubscriptionStop};
use crate::participant::ParticipantId;
use std::collections::HashMap;
use uuid::Uuid;

/// Error returned when a body fails to serialize. Bodies constructed by
/// this crate are always serializable; this exists for API completeness
/// and to avoid an `unwrap` at the call site.
#[derive(Debug, thiserror::Error)]
#[error("failed to serialize envelope payload: {0}")]
pub struct EnvelopeEncodeError(#[from] serde_json::Error);

/// Constructs envelopes of each message kind.
pub struct MessageFactory;

impl MessageFactory {
    fn envelope(
        kind: MessageKind,
        sender: ParticipantId,
        recipient: ParticipantId,
        qos: &MessagingQos,
        payload: Vec<u8>,
    ) -> Envelope {
        Envelope {
            message_id: Uuid::now_v7().to_string(),
            kind,
            sender,
            recipient,
            expiry_date_ms: now_ms() + qos.ttl.as_millis() as u64,
            headers: HashMap::new(),
            payload,
        }
    }

    /// Build a `Request` envelope.
    pub fn create_request(
        sender: ParticipantId,
        recipient: ParticipantId,
        qos: &MessagingQos,
        request: &Request,
    ) -> Result<Envelope, EnvelopeEncodeError> {
        let payload = serde_json::to_vec(request)?;
        Ok(Self::envelope(MessageKind::Request, sender, recipient, qos, payload))
    }

    /// Build a `Reply` envelope.
    pub fn create_reply(
        sender: ParticipantId,
        recipient: ParticipantId,
        qos: &MessagingQos,
        reply: &Reply,
    ) -> Result<Envelope, EnvelopeEncodeError> {
        let payload = serde_json::to_vec(reply)?;
        Ok(Self::envelope(MessageKind::Reply, sender, recipient, qos, payload))
    }

    /// Build a `SubscriptionRequest` envelope.
    pub fn create_subscription_request(
        sender: ParticipantId,
        recipient: ParticipantId,
        qos: &MessagingQos,
        request: &SubscriptionRequest,
    ) -> Result<Envelope, EnvelopeEncodeError> {
        let payload = serde_json::to_vec(request)?;
        Ok(Self::envelope(
            MessageKind::SubscriptionRequest,
            sender,
            recipient,
            qos,
            payload,
        ))
    }

    /// Build a `SubscriptionPublication` envelope.
    pub fn create_subscription_publication(
        sender: ParticipantId,
        recipient: ParticipantId,
        qos: &MessagingQos,
        publication: &SubscriptionPublication,
    ) -> Result<Envelope, EnvelopeEncodeError> {
        let payload = serde_json::to_vec(publication)?;
        Ok(Self::envelope(
            MessageKind::SubscriptionPublication,
            sender,
            recipient,
            qos,
            payload,
        ))
    }

    /// Build a `SubscriptionStop` envelope.
    pub fn create_subscription_stop(
        sender: ParticipantId,
        recipient: ParticipantId,
        qos: &MessagingQos,
        stop: &SubscriptionStop,
    ) -> Result<Envelope, EnvelopeEncodeError> {
        let payload = serde_json::to_vec(stop)?;
        Ok(Self::envelope(
            MessageKind::SubscriptionStop,
            sender,
            recipient,
            qos,
            payload,
        ))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::message::value::RpcValue;
    use std::time::Duration;

    fn participants() -> (ParticipantId, ParticipantId) {
        (
            ParticipantId::new("consumer-1").unwrap(),
            ParticipantId::new("provider-1").unwrap(),
        )
    }

    #[test]
    fn request_envelope_expires_after_ttl() {
        let (sender, recipient) = participants();
        let qos = MessagingQos::with_ttl(Duration::from_secs(30));
        let request = Request::new("getLocation", vec![], vec![]);
        let before = now_ms();
        let envelope = MessageFactory::create_request(sender, recipient, &qos, &request).unwrap();
        assert_eq!(envelope.kind, MessageKind::Request);
        assert!(envelope.expiry_date_ms >= before + 30_000);
    }

    #[test]
    fn reply_payload_round_trips() {
        let (sender, recipient) = participants();
        let qos = MessagingQos::default();
        let reply = Reply::success("r1", vec![RpcValue::Bool(true)]);
        let envelope = MessageFactory::create_reply(sender, recipient, &qos, &reply).unwrap();
        let decoded: Reply = serde_json::from_slice(&envelope.payload).unwrap();
        assert_eq!(decoded.request_reply_id, "r1");
    }
}
