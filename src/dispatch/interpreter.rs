//! Turns a [`Request`] into a [`Reply`] by invoking the target provider's
//! [`RequestCaller`].
//!
//! There is no separate interface-registrar type in this crate: arity
//! checking, `param_datatypes` validation, and method-name resolution are
//! entirely the contract of the `RequestCaller` implementation passed in —
//! see [`crate::provider::RequestCaller::invoke`]. A caller that receives
//! the wrong number of params, a datatype it doesn't recognize, or an
//! unknown method name is expected to return
//! [`crate::error::RpcErrorCode::MethodInvocation`] rather than panic;
//! `RequestInterpreter` only wraps whatever the caller returns into a
//! `Reply`, successful or not.

use crate::message::{Reply, Request};
use crate::provider::RequestCaller;

/// Invokes a provider method and packages the result as a [`Reply`].
pub struct RequestInterpreter;

impl RequestInterpreter {
    /// Invoke `request` against `caller`, never panicking: any error the
    /// provider raises is embedded in the returned `Reply` rather than
    /// propagated.
    pub async fn interpret(caller: &dyn RequestCaller, request: Request) -> Reply {
        let Request {
            request_reply_id,
            method_name,
            params,
            param_datatypes,
        } = request;

        match caller.invoke(&method_name, params, param_datatypes).await {
            Ok(response) => Reply::success(request_reply_id, response),
            Err(error) => Reply::failure(request_reply_id, error),
        }
    }
}
