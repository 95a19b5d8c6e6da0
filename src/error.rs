//! Error taxonomy shared by the dispatcher, subscription manager, and
//! publication manager.
//!
//! All fallible operations in this crate resolve to an [`RpcErrorCode`] plus
//! a human-readable message. Codes never escape as Rust panics: a failure
//! inside a provider method, an interpreter lookup, or a publication getter
//! is always packaged into a [`Reply`](crate::message::Reply) or
//! [`SubscriptionPublication`](crate::message::SubscriptionPublication) body
//! instead of propagating to the caller.

use serde::{Deserialize, Serialize};
use std::fmt;
use thiserror::Error;

/// Error kinds surfaced to listeners and callers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
#[non_exhaustive]
pub enum RpcErrorCode {
    /// Generic unexpected failure.
    Runtime,
    /// Reply TTL elapsed, or a subscription alert fired.
    TimeOut,
    /// Arbitration failed in the (out of scope) discovery collaborator.
    Discovery,
    /// Unknown method, arity/type mismatch, or interpreter failure.
    MethodInvocation,
    /// The provider method raised a domain error.
    ProviderRuntime,
    /// `alertAfterIntervalMs` elapsed with no publication.
    PublicationMissed,
    /// The provider signaled a modeled error from its interface.
    Application,
}

impl RpcErrorCode {
    /// The wire representation used in `SCREAMING_SNAKE_CASE` JSON payloads.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Runtime => "RUNTIME",
            Self::TimeOut => "TIME_OUT",
            Self::Discovery => "DISCOVERY",
            Self::MethodInvocation => "METHOD_INVOCATION",
            Self::ProviderRuntime => "PROVIDER_RUNTIME",
            Self::PublicationMissed => "PUBLICATION_MISSED",
            Self::Application => "APPLICATION",
        }
    }
}

impl fmt::Display for RpcErrorCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// A structured RPC error, carried inside a [`Reply`](crate::message::Reply)
/// or [`SubscriptionPublication`](crate::message::SubscriptionPublication)
/// body rather than thrown across a thread boundary.
#[derive(Debug, Clone, Serialize, Deserialize, Error)]
#[error("[{code}] {message}")]
pub struct RpcError {
    /// Error category.
    pub code: RpcErrorCode,
    /// Human-readable description.
    pub message: String,
    /// Optional structured detail payload.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub details: Option<serde_json::Value>,
}

impl RpcError {
    /// Build an error with the given code and message.
    pub fn new(code: RpcErrorCode, message: impl Into<String>) -> Self {
        Self {
            code,
            message: message.into(),
            details: None,
        }
    }

    /// Attach a structured detail payload.
    pub fn with_details(mut self, details: impl Serialize) -> Self {
        self.details = serde_json::to_value(details).ok();
        self
    }

    /// Construct a [`RpcErrorCode::Runtime`] error.
    pub fn runtime(message: impl Into<String>) -> Self {
        Self::new(RpcErrorCode::Runtime, message)
    }

    /// Construct a [`RpcErrorCode::TimeOut`] error.
    pub fn timed_out(message: impl Into<String>) -> Self {
        Self::new(RpcErrorCode::TimeOut, message)
    }

    /// Construct a [`RpcErrorCode::Discovery`] error.
    pub fn discovery(message: impl Into<String>) -> Self {
        Self::new(RpcErrorCode::Discovery, message)
    }

    /// Construct a [`RpcErrorCode::MethodInvocation`] error.
    pub fn method_invocation(message: impl Into<String>) -> Self {
        Self::new(RpcErrorCode::MethodInvocation, message)
    }

    /// Construct a [`RpcErrorCode::ProviderRuntime`] error.
    pub fn provider_runtime(message: impl Into<String>) -> Self {
        Self::new(RpcErrorCode::ProviderRuntime, message)
    }

    /// Construct a [`RpcErrorCode::PublicationMissed`] error.
    pub fn publication_missed(message: impl Into<String>) -> Self {
        Self::new(RpcErrorCode::PublicationMissed, message)
    }

    /// Construct a [`RpcErrorCode::Application`] error.
    pub fn application(message: impl Into<String>) -> Self {
        Self::new(RpcErrorCode::Application, message)
    }
}

/// Result alias used throughout the crate's public API.
pub type RpcResult<T> = Result<T, RpcError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn error_round_trips_through_json() {
        let err = RpcError::provider_runtime("boom").with_details(serde_json::json!({"k": 1}));
        let json = serde_json::to_string(&err).unwrap();
        let back: RpcError = serde_json::from_str(&json).unwrap();
        assert_eq!(back.code, RpcErrorCode::ProviderRuntime);
        assert_eq!(back.message, "boom");
        assert_eq!(back.details.unwrap()["k"], 1);
    }

    #[test]
    fn display_includes_code_and_message() {
        let err = RpcError::timed_out("no reply");
        assert_eq!(err.to_string(), "[TIME_OUT] no reply");
    }
}
