//! The consumer-side record of a live subscription and the listener it
//! feeds.

use super::id::SubscriptionId;
use crate::error::RpcError;
use crate::message::{RpcValue, SubscriptionQos};
use async_trait::async_trait;
use std::sync::atomic::{AtomicU8, Ordering};
use std::sync::Arc;
use tokio::sync::Mutex;
use tokio::time::Instant;

/// Receives publications for a single subscription.
///
/// Implementors decode `response` according to the listener's own declared
/// type; this trait only guarantees delivery order per
/// `subscription_id` (see [`super::SubscriptionManager::deliver`]).
#[async_trait]
pub trait Listener: Send + Sync {
    /// Called with a successful publication's response values.
    async fn on_receive(&self, response: Vec<RpcValue>);

    /// Called when a publication carried an error, or when the missed-
    /// publication alert timer elapses.
    async fn on_error(&self, error: RpcError);
}

/// Why a [`SubscriptionCallback`]'s timers were cancelled.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CancellationReason {
    /// `unregister_subscription` was called.
    Unregistered,
    /// The subscription's validity window elapsed.
    Expired,
}

/// Lifecycle of a consumer-side subscription callback.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u8)]
pub enum SubscriptionState {
    /// Registered locally; no publication received yet.
    Registered = 0,
    /// At least one publication has been delivered.
    Live = 1,
    /// Validity window elapsed.
    Expired = 2,
    /// Explicitly unregistered or stopped.
    Stopped = 3,
}

impl SubscriptionState {
    fn from_u8(v: u8) -> Self {
        match v {
            0 => Self::Registered,
            1 => Self::Live,
            2 => Self::Expired,
            _ => Self::Stopped,
        }
    }
}

/// A registered listener plus the bookkeeping the
/// [`super::SubscriptionManager`] needs to route publications and enforce
/// missed-publication alerts.
pub struct SubscriptionCallback {
    /// Identifies this subscription across its lifetime.
    pub subscription_id: SubscriptionId,
    /// The registered listener.
    pub listener: Arc<dyn Listener>,
    /// The QoS this subscription was registered with.
    pub qos: SubscriptionQos,
    state: AtomicU8,
    last_received_at: Mutex<Instant>,
}

impl SubscriptionCallback {
    /// Create a new callback in the `Registered` state.
    pub fn new(subscription_id: SubscriptionId, listener: Arc<dyn Listener>, qos: SubscriptionQos) -> Self {
        Self {
            subscription_id,
            listener,
            qos,
            state: AtomicU8::new(SubscriptionState::Registered as u8),
            last_received_at: Mutex::new(Instant::now()),
        }
    }

    /// Current lifecycle state.
    pub fn state(&self) -> SubscriptionState {
        SubscriptionState::from_u8(self.state.load(Ordering::Acquire))
    }

    /// Transition to a new lifecycle state.
    pub fn set_state(&self, state: SubscriptionState) {
        self.state.store(state as u8, Ordering::Release);
    }

    /// Record that a publication (successful or not) was just delivered,
    /// resetting the alert clock.
    pub async fn mark_delivered(&self) {
        *self.last_received_at.lock().await = Instant::now();
        if self.state() == SubscriptionState::Registered {
            self.set_state(SubscriptionState::Live);
        }
    }

    /// Time elapsed since the last delivered publication.
    pub async fn time_since_last_delivery(&self) -> tokio::time::Duration {
        self.last_received_at.lock().await.elapsed()
    }
}
