//! Provider-side subscription scheduling, persistence, and lifecycle.

use super::clock::Clock;
use super::entry::{EntryState, SubscriptionEntry};
use super::scheduler;
use super::store::{PersistedEntry, SubscriptionStore};
use crate::message::SubscriptionRequest;
use crate::participant::ParticipantId;
use crate::provider::{RequestCaller, RequestCallerRegistry, SendHandle};
use crate::subscription::SubscriptionId;
use dashmap::DashMap;
use std::collections::HashMap;
use std::path::PathBuf;
use std::sync::Arc;
use tokio::task::JoinHandle;
use tracing::warn;

/// Owns the scheduling of outgoing publications for every subscription the
/// local process serves as provider.
///
/// [`Self::add`], [`Self::restore_subscriptions`], [`Self::stop`], and
/// [`Self::stop_publications`] are the only mutation points; each persists
/// the resulting set of Active/Pending entries before returning.
pub struct PublicationManager {
    entries: DashMap<SubscriptionId, Arc<SubscriptionEntry>>,
    tasks: DashMap<SubscriptionId, JoinHandle<()>>,
    store: Option<SubscriptionStore>,
    clock: Arc<dyn Clock>,
    send: SendHandle,
}

impl PublicationManager {
    /// Create a manager, loading any persisted entries as `Pending`.
    pub fn new(send: SendHandle, clock: Arc<dyn Clock>, store_path: Option<PathBuf>) -> Self {
        let store = store_path.map(SubscriptionStore::new);
        let entries = DashMap::new();

        if let Some(store) = &store {
            match store.load() {
                Ok(persisted) => {
                    for (id, entry) in persisted {
                        let reconstructed = Arc::new(SubscriptionEntry::new(
                            entry.request,
                            entry.proxy_participant_id,
                            entry.provider_participant_id,
                            entry.created_at_ms,
                        ));
                        entries.insert(id, reconstructed);
                    }
                }
                Err(err) => warn!(error = %err, "failed to load subscription store"),
            }
        }

        Self {
            entries,
            tasks: DashMap::new(),
            store,
            clock,
            send,
        }
    }

    /// Add or refresh a subscription entry, deduplicated by
    /// `subscription_id`. If the provider's caller is already registered
    /// the entry activates immediately; otherwise it is parked `Pending`.
    pub fn add(
        &self,
        request: SubscriptionRequest,
        proxy_participant_id: ParticipantId,
        provider_participant_id: ParticipantId,
        registry: &RequestCallerRegistry,
    ) {
        let id = request.subscription_id;
        let created_at_ms = self
            .entries
            .get(&id)
            .map(|existing| existing.created_at_ms)
            .unwrap_or_else(|| self.clock.now_ms());

        let entry = Arc::new(SubscriptionEntry::new(
            request,
            proxy_participant_id,
            provider_participant_id.clone(),
            created_at_ms,
        ));
        self.entries.insert(id, Arc::clone(&entry));

        match registry.get(&provider_participant_id) {
            Some(caller) => {
                entry.set_state(EntryState::Active);
                self.activate(id, entry, caller);
            }
            None => entry.set_state(EntryState::Pending),
        }
        self.persist();
    }

    /// Activate every `Pending` entry belonging to `provider_participant_id`
    /// now that its caller has (re)registered.
    pub fn restore_subscriptions(&self, provider_participant_id: &ParticipantId, caller: Arc<dyn RequestCaller>) {
        let pending: Vec<(SubscriptionId, Arc<SubscriptionEntry>)> = self
            .entries
            .iter()
            .filter(|e| &e.provider_participant_id == provider_participant_id && e.state() == EntryState::Pending)
            .map(|e| (e.subscription_id(), Arc::clone(e.value())))
            .collect();

        for (id, entry) in pending {
            entry.set_state(EntryState::Active);
            self.activate(id, entry, Arc::clone(&caller));
        }
        self.persist();
    }

    /// Cancel timers, transition to `Stopped`, and drop the entry (and its
    /// persisted record). Idempotent.
    pub fn stop(&self, subscription_id: SubscriptionId) {
        if let Some((_, entry)) = self.entries.remove(&subscription_id) {
            entry.set_state(EntryState::Stopped);
        }
        if let Some((_, handle)) = self.tasks.remove(&subscription_id) {
            handle.abort();
        }
        self.persist();
    }

    /// Bulk-stop every entry belonging to `provider_participant_id`.
    ///
    /// Per the resolved restore-on-reattach policy (see `DESIGN.md`),
    /// stopped entries are discarded rather than kept parked for a
    /// reattach window: a later `add` for the same `subscription_id` is
    /// treated as a brand-new subscription.
    pub fn stop_publications(&self, provider_participant_id: &ParticipantId) {
        let ids: Vec<SubscriptionId> = self
            .entries
            .iter()
            .filter(|e| &e.provider_participant_id == provider_participant_id)
            .map(|e| e.subscription_id())
            .collect();
        for id in ids {
            self.stop(id);
        }
    }

    /// Number of entries currently tracked (any state).
    pub fn count(&self) -> usize {
        self.entries.len()
    }

    /// Current lifecycle state of an entry, if it exists.
    pub fn state_of(&self, subscription_id: SubscriptionId) -> Option<EntryState> {
        self.entries.get(&subscription_id).map(|e| e.state())
    }

    fn activate(&self, id: SubscriptionId, entry: Arc<SubscriptionEntry>, caller: Arc<dyn RequestCaller>) {
        if let Some((_, old)) = self.tasks.remove(&id) {
            old.abort();
        }
        let handle = scheduler::spawn(entry, caller, self.send.clone(), Arc::clone(&self.clock));
        self.tasks.insert(id, handle);
    }

    fn persist(&self) {
        let Some(store) = &self.store else {
            return;
        };
        let snapshot: HashMap<SubscriptionId, PersistedEntry> = self
            .entries
            .iter()
            .filter(|e| matches!(e.state(), EntryState::Active | EntryState::Pending))
            .map(|e| {
                (
                    e.subscription_id(),
                    PersistedEntry {
                        request: e.request.clone(),
                        proxy_participant_id: e.proxy_participant_id.clone(),
                        provider_participant_id: e.provider_participant_id.clone(),
                        created_at_ms: e.created_at_ms,
                    },
                )
            })
            .collect();
        if let Err(err) = store.save(&snapshot) {
            warn!(error = %err, "failed to persist subscription store");
        }
    }
}
