//! Result objects built from validated response bodies.
//!
//! [`classify`] is the single place where a JSON body is turned into one of
//! the three shapes callers receive: an array becomes a [`Collection`], a
//! non-empty object becomes a [`Resource`], and anything trivial (empty body,
//! `null`, `{}`, a bare scalar) becomes [`ApiObject::Success`].

use serde::de::DeserializeOwned;
use serde_json::{Map, Value};

use crate::error::{Error, Result};
use crate::http::{find_header, RateLimit};

/// A single Feedly resource (subscription, category, entry, ...).
#[derive(Debug, Clone, PartialEq)]
pub struct Resource {
    fields: Map<String, Value>,
}

impl Resource {
    pub fn new(fields: Map<String, Value>) -> Self {
        Self { fields }
    }

    pub fn get(&self, key: &str) -> Option<&Value> {
        self.fields.get(key)
    }

    /// String field shorthand; `None` when absent or not a string.
    pub fn str(&self, key: &str) -> Option<&str> {
        self.get(key)?.as_str()
    }

    pub fn fields(&self) -> &Map<String, Value> {
        &self.fields
    }

    pub fn into_fields(self) -> Map<String, Value> {
        self.fields
    }

    /// Deserialize the resource into a caller-defined type.
    pub fn deserialize<T: DeserializeOwned>(&self) -> Result<T> {
        Ok(serde_json::from_value(Value::Object(self.fields.clone()))?)
    }
}

/// An ordered list of resources plus the headers of the response that
/// carried them.
#[derive(Debug, Clone, PartialEq)]
pub struct Collection {
    items: Vec<Resource>,
    headers: Vec<(String, String)>,
}

impl Collection {
    pub fn new(items: Vec<Resource>, headers: Vec<(String, String)>) -> Self {
        Self { items, headers }
    }

    pub fn items(&self) -> &[Resource] {
        &self.items
    }

    pub fn iter(&self) -> std::slice::Iter<'_, Resource> {
        self.items.iter()
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    pub fn header(&self, name: &str) -> Option<&str> {
        find_header(&self.headers, name)
    }

    pub fn headers(&self) -> &[(String, String)] {
        &self.headers
    }

    pub fn rate_limit(&self) -> RateLimit {
        RateLimit::from_headers(&self.headers)
    }

    pub fn deserialize<T: DeserializeOwned>(&self) -> Result<Vec<T>> {
        self.items.iter().map(|r| r.deserialize()).collect()
    }
}

impl IntoIterator for Collection {
    type Item = Resource;
    type IntoIter = std::vec::IntoIter<Resource>;

    fn into_iter(self) -> Self::IntoIter {
        self.items.into_iter()
    }
}

impl<'a> IntoIterator for &'a Collection {
    type Item = &'a Resource;
    type IntoIter = std::slice::Iter<'a, Resource>;

    fn into_iter(self) -> Self::IntoIter {
        self.items.iter()
    }
}

/// What a successful call returned.
#[derive(Debug, Clone, PartialEq)]
pub enum ApiObject {
    Resource(Resource),
    Collection(Collection),
    /// The operation completed and the server sent nothing worth keeping.
    Success,
}

impl ApiObject {
    pub fn as_resource(&self) -> Option<&Resource> {
        match self {
            ApiObject::Resource(r) => Some(r),
            _ => None,
        }
    }

    pub fn as_collection(&self) -> Option<&Collection> {
        match self {
            ApiObject::Collection(c) => Some(c),
            _ => None,
        }
    }

    pub fn into_resource(self) -> Option<Resource> {
        match self {
            ApiObject::Resource(r) => Some(r),
            _ => None,
        }
    }

    pub fn into_collection(self) -> Option<Collection> {
        match self {
            ApiObject::Collection(c) => Some(c),
            _ => None,
        }
    }

    pub fn is_success(&self) -> bool {
        matches!(self, ApiObject::Success)
    }
}

/// Parse a raw body. Empty or whitespace-only bodies parse as `None`.
pub fn parse_body(body: &str) -> Result<Option<Value>> {
    if body.trim().is_empty() {
        return Ok(None);
    }
    Ok(Some(serde_json::from_str(body)?))
}

/// Choose the result shape for a parsed body.
pub fn classify(body: Option<Value>, headers: Vec<(String, String)>) -> Result<ApiObject> {
    match body {
        Some(Value::Array(values)) => {
            let items = values
                .into_iter()
                .enumerate()
                .map(|(i, value)| match value {
                    Value::Object(fields) => Ok(Resource::new(fields)),
                    other => Err(Error::UnexpectedBody(format!(
                        "collection element {i} is not an object: {other}"
                    ))),
                })
                .collect::<Result<Vec<_>>>()?;
            Ok(ApiObject::Collection(Collection::new(items, headers)))
        }
        Some(Value::Object(fields)) if !fields.is_empty() => Ok(ApiObject::Resource(Resource::new(fields))),
        _ => Ok(ApiObject::Success),
    }
}
