//! Error types for the Feedly client.
//!
//! # Design
//! Every failure the pipeline can observe is translated at the boundary where
//! it happens (transport call, status check, JSON parse, input coercion) into
//! one `Error` variant. Status failures keep the full `ErrorResponse` so
//! callers can log the body or inspect rate-limit headers before deciding to
//! retry. [`Error::kind`] flattens the variants into a `Copy` tag for
//! matching.

use std::fmt;

use thiserror::Error;

use crate::http::{find_header, HttpResponse, RateLimit};

/// Shorthand for results produced by this crate.
pub type Result<T, E = Error> = std::result::Result<T, E>;

/// A non-2xx response, kept intact for inspection.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ErrorResponse {
    pub status: u16,
    pub headers: Vec<(String, String)>,
    pub body: String,
}

impl ErrorResponse {
    /// Feedly's `errorMessage` field when the body is a Feedly error
    /// document, otherwise the raw body.
    pub fn message(&self) -> String {
        serde_json::from_str::<serde_json::Value>(&self.body)
            .ok()
            .and_then(|v| v.get("errorMessage")?.as_str().map(str::to_string))
            .unwrap_or_else(|| self.body.clone())
    }

    pub fn header(&self, name: &str) -> Option<&str> {
        find_header(&self.headers, name)
    }

    pub fn rate_limit(&self) -> RateLimit {
        RateLimit::from_headers(&self.headers)
    }
}

impl From<HttpResponse> for ErrorResponse {
    fn from(response: HttpResponse) -> Self {
        Self {
            status: response.status,
            headers: response.headers,
            body: response.body,
        }
    }
}

impl fmt::Display for ErrorResponse {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "HTTP {}: {}", self.status, self.message())
    }
}

/// Errors returned by `FeedlrClient` and the input coercion helpers.
#[derive(Debug, Error)]
pub enum Error {
    /// The transport gave up waiting for the server.
    #[error("request timed out: {message}")]
    RequestTimeout { message: String },

    #[error("bad request: {0}")]
    BadRequest(ErrorResponse),

    #[error("unauthorized: {0}")]
    Unauthorized(ErrorResponse),

    /// Usually a rate-limit or OAuth scope violation.
    #[error("forbidden: {0}")]
    Forbidden(ErrorResponse),

    #[error("not found: {0}")]
    NotFound(ErrorResponse),

    /// Any 5xx status.
    #[error("server error: {0}")]
    ServerError(ErrorResponse),

    /// A non-2xx status with no dedicated variant.
    #[error("client error: {0}")]
    ClientError(ErrorResponse),

    /// The transport failed for a reason other than a timeout (connection
    /// refused, DNS, TLS, framing).
    #[error("transport failure: {message}")]
    Transport {
        message: String,
        #[source]
        source: Option<Box<dyn std::error::Error + Send + Sync>>,
    },

    /// The response body was not valid JSON.
    #[error("failed to parse response body: {0}")]
    Parse(#[from] serde_json::Error),

    /// The body was valid JSON but not a shape the object builder accepts.
    #[error("unexpected response body: {0}")]
    UnexpectedBody(String),

    /// Caller input lacks the capability a coercion helper requires.
    #[error("can't convert {found} into {expected}")]
    TypeMismatch {
        expected: &'static str,
        found: &'static str,
    },
}

/// Flat classification of an [`Error`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorKind {
    RequestTimeout,
    BadRequest,
    Unauthorized,
    Forbidden,
    NotFound,
    ServerError,
    ClientError,
    ParseError,
    TypeMismatch,
}

impl ErrorKind {
    /// The kind a non-2xx status maps to. Returns `None` for 2xx.
    pub fn from_status(status: u16) -> Option<Self> {
        match status {
            200..=299 => None,
            400 => Some(ErrorKind::BadRequest),
            401 => Some(ErrorKind::Unauthorized),
            403 => Some(ErrorKind::Forbidden),
            404 => Some(ErrorKind::NotFound),
            500..=599 => Some(ErrorKind::ServerError),
            _ => Some(ErrorKind::ClientError),
        }
    }

    /// Everything raised by a request, as opposed to a caller input mistake.
    pub fn is_client_error(&self) -> bool {
        !matches!(self, ErrorKind::TypeMismatch)
    }
}

impl Error {
    /// Map a non-2xx response to its variant. A 2xx response is reported as
    /// `ClientError` since it should never reach this constructor.
    pub fn from_response(response: HttpResponse) -> Self {
        let kind = ErrorKind::from_status(response.status).unwrap_or(ErrorKind::ClientError);
        let response = ErrorResponse::from(response);
        match kind {
            ErrorKind::BadRequest => Error::BadRequest(response),
            ErrorKind::Unauthorized => Error::Unauthorized(response),
            ErrorKind::Forbidden => Error::Forbidden(response),
            ErrorKind::NotFound => Error::NotFound(response),
            ErrorKind::ServerError => Error::ServerError(response),
            _ => Error::ClientError(response),
        }
    }

    pub fn kind(&self) -> ErrorKind {
        match self {
            Error::RequestTimeout { .. } => ErrorKind::RequestTimeout,
            Error::BadRequest(_) => ErrorKind::BadRequest,
            Error::Unauthorized(_) => ErrorKind::Unauthorized,
            Error::Forbidden(_) => ErrorKind::Forbidden,
            Error::NotFound(_) => ErrorKind::NotFound,
            Error::ServerError(_) => ErrorKind::ServerError,
            Error::ClientError(_) | Error::Transport { .. } => ErrorKind::ClientError,
            Error::Parse(_) | Error::UnexpectedBody(_) => ErrorKind::ParseError,
            Error::TypeMismatch { .. } => ErrorKind::TypeMismatch,
        }
    }

    /// The failed response, for status errors.
    pub fn response(&self) -> Option<&ErrorResponse> {
        match self {
            Error::BadRequest(r)
            | Error::Unauthorized(r)
            | Error::Forbidden(r)
            | Error::NotFound(r)
            | Error::ServerError(r)
            | Error::ClientError(r) => Some(r),
            _ => None,
        }
    }

    pub fn status(&self) -> Option<u16> {
        self.response().map(|r| r.status)
    }
}
