//! Maps a provider participant id to its registered adapter.

use super::caller::RequestCaller;
use crate::participant::ParticipantId;
use dashmap::DashMap;
use std::sync::Arc;

/// `providerParticipantId → RequestCaller` registry.
///
/// Reads (the dispatch hot path) are lock-free per [`dashmap`]'s sharding;
/// `add`/`remove` acquire only the affected shard.
#[derive(Default)]
pub struct RequestCallerRegistry {
    callers: DashMap<ParticipantId, Arc<dyn RequestCaller>>,
}

impl RequestCallerRegistry {
    /// Create an empty registry.
    pub fn new() -> Self {
        Self {
            callers: DashMap::new(),
        }
    }

    /// Register (or replace) the adapter for `provider_participant_id`,
    /// returning the previously registered adapter if any.
    pub fn add(
        &self,
        provider_participant_id: ParticipantId,
        caller: Arc<dyn RequestCaller>,
    ) -> Option<Arc<dyn RequestCaller>> {
        self.callers.insert(provider_participant_id, caller)
    }

    /// Deregister the adapter for `provider_participant_id`, if present.
    pub fn remove(&self, provider_participant_id: &ParticipantId) -> Option<Arc<dyn RequestCaller>> {
        self.callers.remove(provider_participant_id).map(|(_, v)| v)
    }

    /// Look up the adapter for `provider_participant_id`.
    pub fn get(&self, provider_participant_id: &ParticipantId) -> Option<Arc<dyn RequestCaller>> {
        self.callers
            .get(provider_participant_id)
            .map(|entry| Arc::clone(entry.value()))
    }

    /// Whether a provider is currently registered.
    pub fn contains(&self, provider_participant_id: &ParticipantId) -> bool {
        self.callers.contains_key(provider_participant_id)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::RpcError;
    use crate::message::RpcValue;
    use async_trait::async_trait;

    struct StubCaller;

    #[async_trait]
    impl RequestCaller for StubCaller {
        async fn invoke(
            &self,
            _operation_name: &str,
            _params: Vec<RpcValue>,
            _param_datatypes: Vec<String>,
        ) -> Result<Vec<RpcValue>, RpcError> {
            Ok(vec![])
        }

        async fn get_attribute(&self, _attribute_name: &str) -> Result<Vec<RpcValue>, RpcError> {
            Ok(vec![])
        }
    }

    #[test]
    fn add_then_get_then_remove() {
        let registry = RequestCallerRegistry::new();
        let id = ParticipantId::new("provider-1").unwrap();
        assert!(registry.add(id.clone(), Arc::new(StubCaller)).is_none());
        assert!(registry.contains(&id));
        assert!(registry.get(&id).is_some());
        assert!(registry.remove(&id).is_some());
        assert!(!registry.contains(&id));
    }

    #[test]
    fn remove_of_unknown_provider_is_none() {
        let registry = RequestCallerRegistry::new();
        let id = ParticipantId::new("ghost").unwrap();
        assert!(registry.remove(&id).is_none());
    }
}
