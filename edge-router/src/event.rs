//! CDN hook event model.
//!
//! Mirrors the JSON document the CDN hands to request hooks. Only the fields the routers read
//! or write are typed; everything else is carried through untouched so a forwarded request
//! serializes back to the same content it arrived with.

use crate::errors::EdgeRouterError;
use http::StatusCode;
use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// Lowercase header name to the list of entries sent under that name.
pub type Headers = IndexMap<String, Vec<HeaderEntry>>;

#[derive(Clone, Debug, Deserialize, Serialize, PartialEq)]
pub struct HeaderEntry {
    /// Header name as sent by the client, with its original casing
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub key: Option<String>,
    pub value: String,
}

impl HeaderEntry {
    pub fn new<K, V>(key: K, value: V) -> Self
    where
        K: Into<String>,
        V: Into<String>,
    {
        HeaderEntry {
            key: Some(key.into()),
            value: value.into(),
        }
    }
}

#[derive(Clone, Debug, Deserialize, Serialize, PartialEq)]
pub struct CloudFrontEvent {
    #[serde(rename = "Records")]
    pub records: Vec<EventRecord>,
}

#[derive(Clone, Debug, Deserialize, Serialize, PartialEq)]
pub struct EventRecord {
    pub cf: CloudFrontRecord,
}

#[derive(Clone, Debug, Deserialize, Serialize, PartialEq)]
pub struct CloudFrontRecord {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub config: Option<Value>,
    pub request: CloudFrontRequest,
}

impl CloudFrontEvent {
    pub fn from_slice(bytes: &[u8]) -> Result<Self, EdgeRouterError> {
        Ok(serde_json::from_slice(bytes)?)
    }

    /// The request carried by the event. The CDN delivers exactly one record per invocation.
    pub fn into_request(self) -> Result<CloudFrontRequest, EdgeRouterError> {
        self.records
            .into_iter()
            .next()
            .map(|record| record.cf.request)
            .ok_or(EdgeRouterError::EmptyEvent)
    }
}

#[derive(Clone, Debug, Default, Deserialize, Serialize, PartialEq)]
pub struct CloudFrontRequest {
    #[serde(default)]
    pub uri: String,
    /// Raw query string without the leading `?`
    #[serde(default)]
    pub querystring: String,
    #[serde(default)]
    pub headers: Headers,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub origin: Option<Origin>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl CloudFrontRequest {
    /// Value of the first entry under `name`, if there is one.
    pub fn first_header_value(&self, name: &str) -> Option<&str> {
        self.headers
            .get(name)
            .and_then(|entries| entries.first())
            .map(|entry| entry.value.as_str())
    }

    /// Values of every entry under `name`, in order.
    pub fn header_values<'a>(&'a self, name: &str) -> impl Iterator<Item = &'a str> + use<'a> {
        self.headers
            .get(name)
            .into_iter()
            .flatten()
            .map(|entry| entry.value.as_str())
    }

    /// Replaces all entries under `name` with a single entry.
    pub fn set_header(&mut self, name: &str, key: &str, value: &str) {
        self.headers
            .insert(name.to_string(), vec![HeaderEntry::new(key, value)]);
    }

    pub fn custom_origin(&self) -> Option<&CustomOrigin> {
        self.origin.as_ref().and_then(|o| o.custom.as_ref())
    }

    pub fn custom_origin_mut(&mut self) -> Option<&mut CustomOrigin> {
        self.origin.as_mut().and_then(|o| o.custom.as_mut())
    }
}

#[derive(Clone, Debug, Default, Deserialize, Serialize, PartialEq)]
pub struct Origin {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub custom: Option<CustomOrigin>,
    /// Other origin kinds (such as `s3`) are passed through as-is
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

#[derive(Clone, Debug, Default, Deserialize, Serialize, PartialEq)]
pub struct CustomOrigin {
    #[serde(rename = "domainName")]
    pub domain_name: String,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

/// A synthetic response generated by a hook instead of forwarding to the origin.
#[derive(Clone, Debug, Deserialize, Serialize, PartialEq)]
pub struct CloudFrontResponse {
    pub status: String,
    #[serde(rename = "statusDescription")]
    pub status_description: String,
    #[serde(default)]
    pub headers: Headers,
}

impl CloudFrontResponse {
    pub fn new(status: StatusCode) -> Self {
        CloudFrontResponse {
            status: status.as_str().to_string(),
            status_description: status.canonical_reason().unwrap_or_default().to_string(),
            headers: Headers::new(),
        }
    }

    pub fn with_header(mut self, name: &str, key: &str, value: &str) -> Self {
        self.headers
            .insert(name.to_string(), vec![HeaderEntry::new(key, value)]);
        self
    }
}

/// What a hook hands back to the CDN: the (possibly mutated) request or a synthetic response.
#[derive(Clone, Debug, Deserialize, Serialize, PartialEq)]
#[serde(untagged)]
pub enum HookResult {
    Response(CloudFrontResponse),
    Request(CloudFrontRequest),
}
