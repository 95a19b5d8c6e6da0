//! Dynamic-type payloads.
//!
//! The original system carries `list<variant>` bodies tagged by datatype
//! name strings (see `spec.md` §9 Design Notes). This crate replaces that
//! with a tagged sum of known value kinds plus an opaque struct blob for
//! domain types, resolved against a small per-interface schema registry.

use dashmap::DashMap;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// A single value carried in a [`Request`](crate::message::Request) or
/// [`Reply`](crate::message::Reply) parameter/response list.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum RpcValue {
    /// Boolean value.
    Bool(bool),
    /// Signed 64-bit integer.
    I64(i64),
    /// Double-precision float.
    F64(f64),
    /// UTF-8 string.
    Str(String),
    /// Raw octets (e.g. for an opaque domain blob).
    Bytes(Vec<u8>),
    /// An ordered list of values.
    List(Vec<RpcValue>),
    /// A named struct with declared field order, resolved through a
    /// [`SchemaRegistry`].
    Struct {
        /// Fully-qualified type name, e.g. `"joynr.types.GpsLocation"`.
        type_name: String,
        /// Field values in declaration order.
        fields: Vec<RpcValue>,
    },
}

impl RpcValue {
    /// Convenience constructor for [`RpcValue::Struct`].
    pub fn struct_of(type_name: impl Into<String>, fields: Vec<RpcValue>) -> Self {
        Self::Struct {
            type_name: type_name.into(),
            fields,
        }
    }
}

/// Declares the field names of a struct type used by an interface.
///
/// The registry exists only to give `Struct` payloads a stable, named field
/// ordering across process boundaries; it performs no type validation
/// beyond recording declared field names.
#[derive(Debug, Default)]
pub struct SchemaRegistry {
    interfaces: DashMap<String, HashMap<String, Vec<String>>>,
}

impl SchemaRegistry {
    /// Create an empty registry.
    pub fn new() -> Self {
        Self {
            interfaces: DashMap::new(),
        }
    }

    /// Declare the field names of `type_name` within `interface_name`.
    pub fn declare(
        &self,
        interface_name: impl Into<String>,
        type_name: impl Into<String>,
        fields: Vec<String>,
    ) {
        self.interfaces
            .entry(interface_name.into())
            .or_default()
            .insert(type_name.into(), fields);
    }

    /// Look up the declared field names for `type_name` within
    /// `interface_name`.
    pub fn fields_of(&self, interface_name: &str, type_name: &str) -> Option<Vec<String>> {
        self.interfaces
            .get(interface_name)
            .and_then(|types| types.get(type_name).cloned())
    }
}
