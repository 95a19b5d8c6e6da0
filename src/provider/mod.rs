//! Provider-side adapter interface and registry.

mod caller;
mod registry;

pub use caller::{EnvelopeSender, RequestCaller, SendHandle};
pub use registry::RequestCallerRegistry;
