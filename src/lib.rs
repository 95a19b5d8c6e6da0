#![warn(missing_docs)]
//! # rpcbus
//!
//! Dispatcher and subscription/publication middleware for
//! location-transparent remote procedure calls and attribute
//! publish/subscribe between consumers and providers.
//!
//! ## Architecture
//!
//! ```text
//! ┌────────────────────────────────────────────────────────────────┐
//! │                           Transport                            │
//! │        (WebSocket / channel / in-process — out of scope)       │
//! └───────────────────────────┬──────────────────────────────────--┘
//!                              │ Envelope
//!                              ▼
//! ┌──────────────────────────────────────────────────────────────--┐
//! │                          Dispatcher                             │
//! │   receive(envelope) → demux by kind, N-worker inbound queue     │
//! └───────┬────────────┬─────────────┬──────────────┬─────────────-┘
//!         │Request     │Reply        │SubRequest/Stop│SubPublication
//!         ▼            ▼             ▼               ▼
//! ┌───────────────┐ ┌──────────┐ ┌────────────────┐ ┌────────────────┐
//! │RequestInterp. │ │ReplyCaller│ │PublicationMgr  │ │SubscriptionMgr │
//! │ + RequestCaller│ │Directory  │ │(provider side) │ │(consumer side) │
//! └───────────────┘ └──────────┘ └────────────────┘ └────────────────┘
//! ```
//!
//! ## Quick start
//!
//! ```rust,no_run
//! use rpcbus::config::RpcConfig;
//! use rpcbus::dispatch::Dispatcher;
//! use rpcbus::participant::ParticipantId;
//! use rpcbus::provider::SendHandle;
//! use rpcbus::publication::SystemClock;
//! use std::sync::Arc;
//!
//! # async fn run(send: SendHandle) -> Result<(), Box<dyn std::error::Error>> {
//! let config = RpcConfig::new().with_dispatch_workers(4);
//! config.validate()?;
//! let dispatcher = Dispatcher::new(&config, send, Arc::new(SystemClock));
//! let provider_id = ParticipantId::new("my-provider")?;
//! // dispatcher.add_request_caller(provider_id, my_caller);
//! # let _ = provider_id;
//! # Ok(())
//! # }
//! ```
//!
//! ## Module map
//!
//! - [`message`]: envelopes, typed request/reply/subscription bodies, QoS,
//!   and the factory that builds them.
//! - [`participant`]: the opaque endpoint identifier.
//! - [`provider`]: the adapter interface local providers implement, and
//!   the send capability used to answer without a full dispatcher handle.
//! - [`dispatch`]: envelope demultiplexing, request/reply correlation.
//! - [`subscription`]: consumer-side subscription tracking and delivery.
//! - [`publication`]: provider-side scheduling, persistence, and restore.
//! - [`transport`] / [`discovery`]: collaborator contracts, not
//!   implemented here.
//! - [`error`]: the shared error taxonomy.
//! - [`config`]: runtime configuration and validation.

pub mod config;
pub mod discovery;
pub mod dispatch;
pub mod error;
pub mod message;
pub mod participant;
pub mod provider;
pub mod publication;
pub mod subscription;
pub mod transport;

/// Convenience re-exports for common call sites.
pub mod prelude {
    pub use crate::config::RpcConfig;
    pub use crate::dispatch::Dispatcher;
    pub use crate::error::{RpcError, RpcErrorCode, RpcResult};
    pub use crate::message::{
        Envelope, MessageFactory, MessageKind, MessagingQos, Reply, Request, SubscriptionPublication,
        SubscriptionQos, SubscriptionRequest, SubscriptionStop,
    };
    pub use crate::participant::ParticipantId;
    pub use crate::provider::{EnvelopeSender, RequestCaller, SendHandle};
    pub use crate::publication::{Clock, PublicationManager, SystemClock};
    pub use crate::subscription::{Listener, SubscriptionId, SubscriptionManager};
}
