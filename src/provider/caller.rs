//! The provider-side adapter interface and the capability used to send
//! envelopes without handing out the full [`crate::dispatch::Dispatcher`].

use crate::error::RpcError;
use crate::message::{Envelope, RpcValue};
use async_trait::async_trait;
use std::sync::Arc;
use tokio::sync::broadcast;

/// Adapts a locally registered provider to the dispatcher's generic
/// request/attribute protocol.
///
/// Implementors decode `params` according to `param_datatypes` and invoke
/// the user's typed provider method; see
/// [`crate::dispatch::RequestInterpreter`] for the layer that builds these
/// adapters from a provider object and an interface descriptor.
#[async_trait]
pub trait RequestCaller: Send + Sync {
    /// Invoke a method by name with positional parameters.
    async fn invoke(
        &self,
        operation_name: &str,
        params: Vec<RpcValue>,
        param_datatypes: Vec<String>,
    ) -> Result<Vec<RpcValue>, RpcError>;

    /// Read the current value of an attribute for a publication tick.
    async fn get_attribute(&self, attribute_name: &str) -> Result<Vec<RpcValue>, RpcError>;

    /// Subscribe to change notifications for an attribute, if the provider
    /// supports push notification for it. Returns `None` when the
    /// attribute only supports polling (periodic QoS).
    fn subscribe_to_changes(&self, attribute_name: &str) -> Option<broadcast::Receiver<Vec<RpcValue>>> {
        let _ = attribute_name;
        None
    }
}

/// A small send capability, handed to [`RequestCaller`] implementations
/// and publication tasks instead of the full `Dispatcher`, breaking the
/// cyclic reference the dispatcher would otherwise need with its managers.
#[async_trait]
pub trait EnvelopeSender: Send + Sync {
    /// Hand an outbound envelope to the transport layer.
    async fn send(&self, envelope: Envelope);
}

/// Cheaply cloneable handle wrapping an [`EnvelopeSender`].
#[derive(Clone)]
pub struct SendHandle(Arc<dyn EnvelopeSender>);

impl SendHandle {
    /// Wrap a sender implementation.
    pub fn new(sender: Arc<dyn EnvelopeSender>) -> Self {
        Self(sender)
    }

    /// Send an envelope through the wrapped sender.
    pub async fn send(&self, envelope: Envelope) {
        self.0.send(envelope).await;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::message::MessageKind;
    use crate::participant::ParticipantId;
    use std::collections::HashMap;
    use std::sync::atomic::{AtomicUsize, Ordering};

    struct CountingSender(AtomicUsize);

    #[async_trait]
    impl EnvelopeSender for CountingSender {
        async fn send(&self, _envelope: Envelope) {
            self.0.fetch_add(1, Ordering::SeqCst);
        }
    }

    #[tokio::test]
    async fn send_handle_forwards_to_wrapped_sender() {
        let sender = Arc::new(CountingSender(AtomicUsize::new(0)));
        let handle = SendHandle::new(sender.clone());
        handle
            .send(Envelope {
                message_id: "m1".into(),
                kind: MessageKind::Reply,
                sender: ParticipantId::new("a").unwrap(),
                recipient: ParticipantId::new("b").unwrap(),
                expiry_date_ms: u64::MAX,
                headers: HashMap::new(),
                payload: Vec::new(),
            })
            .await;
        assert_eq!(sender.0.load(Ordering::SeqCst), 1);
    }
}
