//! The provider-side record of a subscription the local process must
//! satisfy.

use crate::message::SubscriptionRequest;
use crate::participant::ParticipantId;
use crate::subscription::SubscriptionId;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Mutex;

/// Lifecycle of a provider-side subscription entry.
///
/// `Pending → Active` on caller registration; `Active → Stopped` on
/// `stop`, `stop_publications`, or caller removal; `Active → Expired` when
/// wall-clock reaches `expires_at_ms`. All terminal states cancel and
/// remove the entry's scheduler task.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EntryState {
    /// No provider caller registered yet; no timers armed.
    Pending,
    /// Caller present, timers armed.
    Active,
    /// Validity window elapsed.
    Expired,
    /// Stop received, or the caller was removed.
    Stopped,
}

/// A subscription the local process, acting as provider, must satisfy.
pub struct SubscriptionEntry {
    /// The request as received (or refreshed) from the consumer.
    pub request: SubscriptionRequest,
    /// The consumer that will receive publications.
    pub proxy_participant_id: ParticipantId,
    /// The provider this subscription targets.
    pub provider_participant_id: ParticipantId,
    /// When this entry was first created, in epoch milliseconds.
    pub created_at_ms: u64,
    /// Absolute expiry, in epoch milliseconds, or `None` for no expiry.
    pub expires_at_ms: Option<u64>,
    state: Mutex<EntryState>,
    last_publication_at_ms: AtomicU64,
}

impl SubscriptionEntry {
    /// Create a new entry in the `Pending` state.
    pub fn new(
        request: SubscriptionRequest,
        proxy_participant_id: ParticipantId,
        provider_participant_id: ParticipantId,
        created_at_ms: u64,
    ) -> Self {
        let expires_at_ms = request
            .qos
            .expires_at()
            .map(|validity| created_at_ms + validity.as_millis() as u64);
        Self {
            request,
            proxy_participant_id,
            provider_participant_id,
            created_at_ms,
            expires_at_ms,
            state: Mutex::new(EntryState::Pending),
            last_publication_at_ms: AtomicU64::new(0),
        }
    }

    /// This entry's subscription id.
    pub fn subscription_id(&self) -> SubscriptionId {
        self.request.subscription_id
    }

    /// Current lifecycle state.
    pub fn state(&self) -> EntryState {
        *self.state.lock().expect("entry state lock poisoned")
    }

    /// Transition to a new lifecycle state.
    pub fn set_state(&self, state: EntryState) {
        *self.state.lock().expect("entry state lock poisoned") = state;
    }

    /// Whether `now_ms` is at or past this entry's expiry.
    pub fn is_expired_at(&self, now_ms: u64) -> bool {
        matches!(self.expires_at_ms, Some(expires_at) if now_ms >= expires_at)
    }

    /// Record that a publication was just sent.
    pub fn mark_published(&self, now_ms: u64) {
        self.last_publication_at_ms.store(now_ms, Ordering::Release);
    }

    /// The time of the last publication, in epoch milliseconds, or the
    /// entry's creation time if none has been sent yet.
    pub fn last_publication_at_ms(&self) -> u64 {
        let stamp = self.last_publication_at_ms.load(Ordering::Acquire);
        if stamp == 0 {
            self.created_at_ms
        } else {
            stamp
        }
    }
}
