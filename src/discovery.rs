//! The arbitration collaborator: out of scope, specified only as an
//! oracle returning a participant id.

use crate::error::RpcError;
use crate::participant::ParticipantId;
use async_trait::async_trait;

/// Selects a concrete provider for a domain/interface pair under some
/// arbitration strategy (QoS, keyword, fixed-participant). Implementors
/// are expected to consult a capability/discovery directory not modeled
/// by this crate.
#[async_trait]
pub trait Arbitrator: Send + Sync {
    /// Resolve `domain`/`interface_name` to a concrete provider, or an
    /// [`crate::error::RpcErrorCode::Discovery`] error if arbitration
    /// fails.
    async fn arbitrate(&self, domain: &str, interface_name: &str) -> Result<ParticipantId, RpcError>;
}
