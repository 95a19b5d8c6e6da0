//! Envelopes, typed message bodies, QoS, and the factory that builds them.

mod envelope;
pub mod factory;
pub mod framing;
mod qos;
mod request;
pub mod value;

pub use envelope::{now_ms, Envelope, MessageKind};
pub use factory::{EnvelopeEncodeError, MessageFactory};
pub use framing::split_json_objects;
pub use qos::{MessagingQos, QosValidationError, SubscriptionQos};
pub use request::{
    Reply, ReplyBody, Request, SubscriptionPublication, SubscriptionRequest, SubscriptionStop,
};
pub use value::{RpcValue, SchemaRegistry};
