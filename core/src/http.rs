//! HTTP transport types for the Feedly pipeline.
//!
//! # Design
//! Requests and responses are plain data. The pipeline builds `HttpRequest`
//! values and inspects `HttpResponse` values; a `Transport` implementation
//! performs the network round-trip in between. Owned `String` / `Vec` fields
//! keep the values free of lifetimes so they can be recorded in tests and
//! handed to any HTTP backend.

use std::fmt;

/// HTTP method for a request.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum HttpMethod {
    Get,
    Post,
    Put,
    Delete,
}

impl HttpMethod {
    pub fn as_str(&self) -> &'static str {
        match self {
            HttpMethod::Get => "GET",
            HttpMethod::Post => "POST",
            HttpMethod::Put => "PUT",
            HttpMethod::Delete => "DELETE",
        }
    }

    /// Whether request params travel in the JSON body rather than the query.
    pub fn carries_body(&self) -> bool {
        matches!(self, HttpMethod::Post | HttpMethod::Put)
    }
}

impl fmt::Display for HttpMethod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// An HTTP request described as plain data.
///
/// `path` is the absolute URL without a query string. Query parameters are
/// kept unencoded in `query` and rendered by [`HttpRequest::url`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HttpRequest {
    pub method: HttpMethod,
    pub path: String,
    pub query: Vec<(String, String)>,
    pub headers: Vec<(String, String)>,
    pub body: Option<String>,
}

impl HttpRequest {
    /// The full URL, with query parameters percent-encoded.
    pub fn url(&self) -> String {
        if self.query.is_empty() {
            return self.path.clone();
        }
        let query = self
            .query
            .iter()
            .map(|(k, v)| format!("{}={}", urlencoding::encode(k), urlencoding::encode(v)))
            .collect::<Vec<_>>()
            .join("&");
        format!("{}?{query}", self.path)
    }

    pub fn header(&self, name: &str) -> Option<&str> {
        find_header(&self.headers, name)
    }
}

/// An HTTP response described as plain data.
///
/// Produced by a `Transport` after executing an `HttpRequest`. The body is
/// kept raw; JSON parsing happens in the pipeline so that parse failures are
/// reported through the crate's own error type.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HttpResponse {
    pub status: u16,
    pub headers: Vec<(String, String)>,
    pub body: String,
}

impl HttpResponse {
    pub fn is_success(&self) -> bool {
        (200..=299).contains(&self.status)
    }

    pub fn header(&self, name: &str) -> Option<&str> {
        find_header(&self.headers, name)
    }
}

/// Case-insensitive header lookup. The first matching entry wins.
pub fn find_header<'a>(headers: &'a [(String, String)], name: &str) -> Option<&'a str> {
    headers
        .iter()
        .find(|(k, _)| k.eq_ignore_ascii_case(name))
        .map(|(_, v)| v.as_str())
}

/// Insert or replace a header, matching names case-insensitively.
pub(crate) fn set_header(headers: &mut Vec<(String, String)>, name: &str, value: &str) {
    match headers.iter_mut().find(|(k, _)| k.eq_ignore_ascii_case(name)) {
        Some(entry) => entry.1 = value.to_string(),
        None => headers.push((name.to_string(), value.to_string())),
    }
}

/// Feedly's request quota, reported on every response.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct RateLimit {
    /// Requests allowed per window.
    pub limit: Option<u64>,
    /// Requests already made in the current window.
    pub count: Option<u64>,
    /// Seconds until the window resets.
    pub reset: Option<u64>,
}

impl RateLimit {
    pub fn from_headers(headers: &[(String, String)]) -> Self {
        let numeric = |name: &str| find_header(headers, name).and_then(|v| v.trim().parse().ok());
        Self {
            limit: numeric("X-Ratelimit-Limit"),
            count: numeric("X-Ratelimit-Count"),
            reset: numeric("X-Ratelimit-Reset"),
        }
    }

    pub fn remaining(&self) -> Option<u64> {
        Some(self.limit?.saturating_sub(self.count?))
    }
}

/// Percent-encode an identifier for use as a single path segment.
///
/// Feedly ids embed URLs (`feed/http://example.com/rss`), so every reserved
/// character including `/` must be escaped.
pub fn escape_id(id: &str) -> String {
    urlencoding::encode(id).into_owned()
}
