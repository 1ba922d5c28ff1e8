//! Coercion of caller input into request payloads and query params.
//!
//! # Design
//! A value offers up to two capabilities through [`RequestInput`]: it can be
//! viewed as a key/value mapping, as an ordered sequence, or neither.
//! [`input_to_payload`] accepts either form and prefers the mapping;
//! [`input_to_params`] accepts only the mapping, because query strings are
//! key/value pairs. Anything else is a `TypeMismatch`, never stringified.

use std::collections::{BTreeMap, HashMap};

use serde::Serialize;
use serde_json::{Map, Value};

use crate::error::{Error, Result};

/// A request body: a JSON object or a JSON array.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum Payload {
    Mapping(Map<String, Value>),
    Sequence(Vec<Value>),
}

impl From<Map<String, Value>> for Payload {
    fn from(map: Map<String, Value>) -> Self {
        Payload::Mapping(map)
    }
}

impl From<Vec<Value>> for Payload {
    fn from(seq: Vec<Value>) -> Self {
        Payload::Sequence(seq)
    }
}

/// Query parameters.
pub type Params = Map<String, Value>;

/// Capabilities a value offers to the coercion helpers.
///
/// Both methods default to `None`, so a type opts into exactly the forms it
/// supports. Implement this for domain types directly, or wrap any
/// `Serialize` type in [`Json`].
pub trait RequestInput {
    fn to_mapping(&self) -> Option<Map<String, Value>> {
        None
    }

    fn to_sequence(&self) -> Option<Vec<Value>> {
        None
    }

    /// Name reported in `TypeMismatch` errors.
    fn type_name(&self) -> &'static str {
        std::any::type_name::<Self>()
    }
}

/// Mapping if available, else sequence, else `TypeMismatch`.
pub fn input_to_payload<I: RequestInput + ?Sized>(input: &I) -> Result<Payload> {
    if let Some(map) = input.to_mapping() {
        return Ok(Payload::Mapping(map));
    }
    if let Some(seq) = input.to_sequence() {
        return Ok(Payload::Sequence(seq));
    }
    Err(Error::TypeMismatch {
        expected: "mapping or sequence",
        found: input.type_name(),
    })
}

/// Mapping, else `TypeMismatch`. Sequences are rejected.
pub fn input_to_params<I: RequestInput + ?Sized>(input: &I) -> Result<Params> {
    input.to_mapping().ok_or_else(|| Error::TypeMismatch {
        expected: "mapping",
        found: input.type_name(),
    })
}

/// Adapts any `Serialize` value: objects become mappings, arrays become
/// sequences, everything else offers neither.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Json<T>(pub T);

impl<T: Serialize> RequestInput for Json<T> {
    fn to_mapping(&self) -> Option<Map<String, Value>> {
        serde_json::to_value(&self.0).ok()?.to_mapping()
    }

    fn to_sequence(&self) -> Option<Vec<Value>> {
        serde_json::to_value(&self.0).ok()?.to_sequence()
    }

    fn type_name(&self) -> &'static str {
        std::any::type_name::<T>()
    }
}

impl<T: RequestInput + ?Sized> RequestInput for &T {
    fn to_mapping(&self) -> Option<Map<String, Value>> {
        (**self).to_mapping()
    }

    fn to_sequence(&self) -> Option<Vec<Value>> {
        (**self).to_sequence()
    }

    fn type_name(&self) -> &'static str {
        (**self).type_name()
    }
}

impl RequestInput for Value {
    fn to_mapping(&self) -> Option<Map<String, Value>> {
        self.as_object().cloned()
    }

    fn to_sequence(&self) -> Option<Vec<Value>> {
        self.as_array().cloned()
    }

    fn type_name(&self) -> &'static str {
        match self {
            Value::Null => "null",
            Value::Bool(_) => "boolean",
            Value::Number(_) => "number",
            Value::String(_) => "string",
            Value::Array(_) => "array",
            Value::Object(_) => "object",
        }
    }
}

impl RequestInput for Map<String, Value> {
    fn to_mapping(&self) -> Option<Map<String, Value>> {
        Some(self.clone())
    }
}

impl<V: Serialize> RequestInput for HashMap<String, V> {
    fn to_mapping(&self) -> Option<Map<String, Value>> {
        map_entries(self.iter())
    }
}

impl<V: Serialize> RequestInput for BTreeMap<String, V> {
    fn to_mapping(&self) -> Option<Map<String, Value>> {
        map_entries(self.iter())
    }
}

impl<T: Serialize> RequestInput for Vec<T> {
    fn to_sequence(&self) -> Option<Vec<Value>> {
        self.iter().map(|v| serde_json::to_value(v).ok()).collect()
    }
}

impl<A: Serialize, B: Serialize> RequestInput for (A, B) {
    fn to_sequence(&self) -> Option<Vec<Value>> {
        Some(vec![
            serde_json::to_value(&self.0).ok()?,
            serde_json::to_value(&self.1).ok()?,
        ])
    }
}

impl RequestInput for str {}

impl RequestInput for String {}

fn map_entries<'a, V: Serialize + 'a>(
    entries: impl Iterator<Item = (&'a String, &'a V)>,
) -> Option<Map<String, Value>> {
    entries
        .map(|(k, v)| Some((k.clone(), serde_json::to_value(v).ok()?)))
        .collect()
}
