//! Payload bodies carried inside an [`Envelope`](super::Envelope).

use super::qos::SubscriptionQos;
use super::value::RpcValue;
use crate::error::RpcError;
use crate::subscription::SubscriptionId;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// A method invocation directed at a provider.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Request {
    /// Correlates this request with its eventual [`Reply`].
    pub request_reply_id: String,
    /// Name of the provider method to invoke.
    pub method_name: String,
    /// Positional parameter values.
    pub params: Vec<RpcValue>,
    /// Declared datatype name for each entry in `params`, used by the
    /// [`crate::dispatch::RequestInterpreter`] to select an overload.
    pub param_datatypes: Vec<String>,
}

impl Request {
    /// Build a request with a freshly generated correlation id.
    pub fn new(
        method_name: impl Into<String>,
        params: Vec<RpcValue>,
        param_datatypes: Vec<String>,
    ) -> Self {
        Self {
            request_reply_id: Uuid::now_v7().to_string(),
            method_name: method_name.into(),
            params,
            param_datatypes,
        }
    }
}

/// The outcome of a method invocation: either a positional response list or
/// a structured error.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ReplyBody {
    /// Successful invocation; `response[i]` corresponds to the method's
    /// `i`-th declared output.
    Response(Vec<RpcValue>),
    /// Invocation failed; see [`RpcError`] for the error taxonomy.
    Error(RpcError),
}

/// Response to a prior [`Request`], correlated by `request_reply_id`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Reply {
    /// Echoes the originating [`Request::request_reply_id`].
    pub request_reply_id: String,
    /// Successful response values, or the error that occurred.
    pub body: ReplyBody,
}

impl Reply {
    /// Build a successful reply.
    pub fn success(request_reply_id: impl Into<String>, response: Vec<RpcValue>) -> Self {
        Self {
            request_reply_id: request_reply_id.into(),
            body: ReplyBody::Response(response),
        }
    }

    /// Build an error reply.
    pub fn failure(request_reply_id: impl Into<String>, error: RpcError) -> Self {
        Self {
            request_reply_id: request_reply_id.into(),
            body: ReplyBody::Error(error),
        }
    }
}

/// A consumer's ask for a provider to begin (or refresh) publishing an
/// attribute or event.
///
/// `subscription_id` is assigned by the consumer at registration time (see
/// [`crate::subscription::SubscriptionManager::register_subscription`]) and
/// preserved verbatim through transport, so the provider-side
/// [`crate::publication::PublicationManager`] can deduplicate re-sent
/// requests by id.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SubscriptionRequest {
    /// Identifies this subscription across its lifetime.
    pub subscription_id: SubscriptionId,
    /// Name of the attribute or event being subscribed to.
    pub subscribe_to_name: String,
    /// Scheduling policy for publications.
    pub qos: SubscriptionQos,
}

/// A provider's published value (or error) for a live subscription.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SubscriptionPublication {
    /// Identifies the subscription this publication satisfies.
    pub subscription_id: SubscriptionId,
    /// The published value(s), or the error that occurred producing them.
    pub body: ReplyBody,
}

impl SubscriptionPublication {
    /// Build a successful publication.
    pub fn success(subscription_id: SubscriptionId, response: Vec<RpcValue>) -> Self {
        Self {
            subscription_id,
            body: ReplyBody::Response(response),
        }
    }

    /// Build an error publication, e.g. for a missed-publication alert.
    pub fn failure(subscription_id: SubscriptionId, error: RpcError) -> Self {
        Self {
            subscription_id,
            body: ReplyBody::Error(error),
        }
    }
}

/// A consumer's ask for a provider to stop publishing a subscription.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct SubscriptionStop {
    /// Identifies the subscription to stop.
    pub subscription_id: SubscriptionId,
}
