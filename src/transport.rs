//! The messaging-stub contract transports must implement.
//!
//! Transports (WebSocket, HTTP, in-process) are out of scope for this
//! crate; this module only specifies the collaborator interface the
//! [`crate::provider::SendHandle`] ultimately forwards to, and the
//! addressing scheme the routing table uses.

use crate::message::Envelope;
use crate::participant::ParticipantId;
use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::RwLock;

/// Destination for a transport stub, keyed by [`ParticipantId`] in the
/// routing table.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum Address {
    /// Same-process delivery, no serialization required.
    InProcess,
    /// A named channel endpoint, e.g. a message broker topic.
    Channel(String),
    /// A WebSocket server endpoint.
    WebSocket {
        /// Application-level sub-protocol.
        protocol: String,
        /// Hostname.
        host: String,
        /// Port.
        port: u16,
        /// Path component of the URL.
        path: String,
    },
    /// A WebSocket client connection identified by its connection id.
    WebSocketClient(String),
}

/// A transport's handle to a specific destination.
#[async_trait]
pub trait MessagingStub: Send + Sync {
    /// Hand an outbound envelope to the transport. Asynchronous; may fail;
    /// failures are logged by the implementor and never propagated back
    /// into the dispatcher.
    async fn transmit(&self, envelope: Envelope);
}

/// Produces [`MessagingStub`]s for a given [`Address`].
pub trait StubFactory: Send + Sync {
    /// Whether this factory knows how to build a stub for `address`.
    fn can_create(&self, address: &Address) -> bool;

    /// Build a stub for `address`. Only called after `can_create` returns
    /// `true`.
    fn create(&self, address: &Address) -> Arc<dyn MessagingStub>;
}

/// Maps participants to the address a transport should use to reach them.
#[derive(Default)]
pub struct RoutingTable {
    routes: RwLock<HashMap<ParticipantId, Address>>,
}

impl RoutingTable {
    /// Create an empty routing table.
    pub fn new() -> Self {
        Self {
            routes: RwLock::new(HashMap::new()),
        }
    }

    /// Record the address to use for `participant_id`.
    pub async fn set(&self, participant_id: ParticipantId, address: Address) {
        self.routes.write().await.insert(participant_id, address);
    }

    /// Look up the address for `participant_id`.
    pub async fn get(&self, participant_id: &ParticipantId) -> Option<Address> {
        self.routes.read().await.get(participant_id).cloned()
    }
}
