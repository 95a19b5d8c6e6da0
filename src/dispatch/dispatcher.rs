//! Demultiplexes incoming envelopes by kind to the appropriate
//! manager/registry, and answers outbound replies for inbound requests.

use super::interpreter::RequestInterpreter;
use super::reply_directory::ReplyCallerDirectory;
use crate::config::RpcConfig;
use crate::error::RpcError;
use crate::message::{
    now_ms, Envelope, MessageFactory, MessageKind, MessagingQos, Reply, Request,
    SubscriptionPublication, SubscriptionRequest, SubscriptionStop,
};
use crate::participant::ParticipantId;
use crate::provider::{RequestCaller, RequestCallerRegistry, SendHandle};
use crate::publication::{Clock, PublicationManager};
use crate::subscription::SubscriptionManager;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::{mpsc, Mutex};
use tracing::{trace, warn};

/// Entry point for inbound envelopes and provider (de)registration.
///
/// Owns exactly one [`SubscriptionManager`] and one [`PublicationManager`]
/// for the process (per spec ownership rules). A small worker pool drains
/// the inbound queue so dispatch can proceed in parallel across
/// recipients while preserving per-connection order when the transport
/// delivers serially into `receive`.
pub struct Dispatcher {
    registry: Arc<RequestCallerRegistry>,
    reply_directory: Arc<ReplyCallerDirectory>,
    subscription_manager: Arc<SubscriptionManager>,
    publication_manager: Arc<PublicationManager>,
    send: SendHandle,
    inbound: mpsc::Sender<Envelope>,
}

impl Dispatcher {
    /// Construct a dispatcher and spawn its worker pool and reply sweeper.
    pub fn new(config: &RpcConfig, send: SendHandle, clock: Arc<dyn Clock>) -> Self {
        let registry = Arc::new(RequestCallerRegistry::new());
        let reply_directory = ReplyCallerDirectory::spawn(config.reply_sweep_interval);
        let subscription_manager = Arc::new(SubscriptionManager::new());
        let publication_manager = Arc::new(PublicationManager::new(
            send.clone(),
            clock,
            config.subscription_store_path.clone(),
        ));

        let (tx, rx) = mpsc::channel(config.default_channel_buffer);
        let rx = Arc::new(Mutex::new(rx));

        let dispatcher = Self {
            registry,
            reply_directory,
            subscription_manager,
            publication_manager,
            send,
            inbound: tx,
        };

        for _ in 0..config.dispatch_workers {
            let worker = dispatcher.worker_handle();
            let rx = Arc::clone(&rx);
            tokio::spawn(async move {
                loop {
                    let envelope = {
                        let mut rx = rx.lock().await;
                        rx.recv().await
                    };
                    match envelope {
                        Some(envelope) => worker.dispatch_one(envelope).await,
                        None => return,
                    }
                }
            });
        }

        dispatcher
    }

    fn worker_handle(&self) -> DispatcherWorker {
        DispatcherWorker {
            registry: Arc::clone(&self.registry),
            reply_directory: Arc::clone(&self.reply_directory),
            subscription_manager: Arc::clone(&self.subscription_manager),
            publication_manager: Arc::clone(&self.publication_manager),
            send: self.send.clone(),
        }
    }

    /// Enqueue an envelope for dispatch. Non-blocking: a full queue logs a
    /// warning and drops the envelope rather than applying backpressure to
    /// the transport.
    pub fn receive(&self, envelope: Envelope) {
        if let Err(err) = self.inbound.try_send(envelope) {
            warn!(error = %err, "dispatch queue full, dropping envelope");
        }
    }

    /// Register a provider adapter and reactivate any subscriptions
    /// parked `Pending` for it.
    pub fn add_request_caller(&self, provider_participant_id: ParticipantId, caller: Arc<dyn RequestCaller>) {
        self.registry.add(provider_participant_id.clone(), Arc::clone(&caller));
        self.publication_manager
            .restore_subscriptions(&provider_participant_id, caller);
    }

    /// Deregister a provider adapter and stop every publication it serves.
    pub fn remove_request_caller(&self, provider_participant_id: &ParticipantId) {
        self.registry.remove(provider_participant_id);
        self.publication_manager.stop_publications(provider_participant_id);
    }

    /// Register a new subscription the local process will relay
    /// publications for once it receives them.
    pub fn subscription_manager(&self) -> &SubscriptionManager {
        &self.subscription_manager
    }

    /// Register a pending reply and its TTL, returning the receiver to
    /// await. Pairs with a `Request` envelope sent through `send`.
    pub fn await_reply(&self, request_reply_id: String, expiry_date_ms: u64) -> tokio::sync::oneshot::Receiver<Reply> {
        self.reply_directory.register(request_reply_id, expiry_date_ms)
    }
}

/// The per-worker view of a [`Dispatcher`]'s shared state.
struct DispatcherWorker {
    registry: Arc<RequestCallerRegistry>,
    reply_directory: Arc<ReplyCallerDirectory>,
    subscription_manager: Arc<SubscriptionManager>,
    publication_manager: Arc<PublicationManager>,
    send: SendHandle,
}

impl DispatcherWorker {
    async fn dispatch_one(&self, envelope: Envelope) {
        if envelope.is_expired_at(now_ms()) {
            warn!(message_id = %envelope.message_id, "dropping expired envelope");
            return;
        }

        match envelope.kind {
            MessageKind::Request => self.handle_request(envelope).await,
            MessageKind::Reply => self.handle_reply(envelope),
            MessageKind::SubscriptionRequest => self.handle_subscription_request(envelope),
            MessageKind::SubscriptionStop => self.handle_subscription_stop(envelope),
            MessageKind::SubscriptionPublication => self.handle_subscription_publication(envelope).await,
            MessageKind::BroadcastSubscriptionRequest | MessageKind::Multicast => {
                warn!(message_id = %envelope.message_id, kind = ?envelope.kind, "unsupported message kind dropped");
            }
        }
    }

    async fn handle_request(&self, envelope: Envelope) {
        let request: Request = match serde_json::from_slice(&envelope.payload) {
            Ok(request) => request,
            Err(err) => {
                warn!(error = %err, "malformed request envelope dropped");
                return;
            }
        };

        let reply = match self.registry.get(&envelope.recipient) {
            Some(caller) => {
                let request_reply_id = request.request_reply_id.clone();
                match tokio::spawn(async move { RequestInterpreter::interpret(caller.as_ref(), request).await }).await {
                    Ok(reply) => reply,
                    Err(_join_err) => {
                        Reply::failure(request_reply_id, RpcError::runtime("provider method panicked"))
                    }
                }
            }
            None => Reply::failure(
                request.request_reply_id,
                RpcError::provider_runtime("no provider registered"),
            ),
        };

        self.send_reply(envelope.recipient, envelope.sender, reply).await;
    }

    async fn send_reply(&self, sender: ParticipantId, recipient: ParticipantId, reply: Reply) {
        match MessageFactory::create_reply(sender, recipient, &MessagingQos::default(), &reply) {
            Ok(envelope) => self.send.send(envelope).await,
            Err(err) => warn!(error = %err, "failed to encode reply"),
        }
    }

    fn handle_reply(&self, envelope: Envelope) {
        match serde_json::from_slice::<Reply>(&envelope.payload) {
            Ok(reply) => {
                if !self.reply_directory.resolve(reply) {
                    trace!(message_id = %envelope.message_id, "reply for unknown or already-timed-out request dropped");
                }
            }
            Err(err) => warn!(error = %err, "malformed reply envelope dropped"),
        }
    }

    fn handle_subscription_request(&self, envelope: Envelope) {
        match serde_json::from_slice::<SubscriptionRequest>(&envelope.payload) {
            Ok(request) => {
                self.publication_manager
                    .add(request, envelope.sender, envelope.recipient, &self.registry);
            }
            Err(err) => warn!(error = %err, "malformed subscription request dropped"),
        }
    }

    fn handle_subscription_stop(&self, envelope: Envelope) {
        match serde_json::from_slice::<SubscriptionStop>(&envelope.payload) {
            Ok(stop) => self.publication_manager.stop(stop.subscription_id),
            Err(err) => warn!(error = %err, "malformed subscription stop dropped"),
        }
    }

    async fn handle_subscription_publication(&self, envelope: Envelope) {
        match serde_json::from_slice::<SubscriptionPublication>(&envelope.payload) {
            Ok(publication) => self.subscription_manager.deliver(publication).await,
            Err(err) => warn!(error = %err, "malformed subscription publication dropped"),
        }
    }
}
