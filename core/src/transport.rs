//! The HTTP capability the pipeline is built on.
//!
//! # Design
//! `FeedlrClient` never opens a socket itself. It hands an `HttpRequest` to a
//! [`Transport`] and gets back an `HttpResponse` whatever the status code;
//! only failures to complete the round-trip are errors. Those come in two
//! families, timeouts and everything else, so the pipeline can map them onto
//! its own error taxonomy.

use std::io;

use thiserror::Error;

use crate::http::{HttpRequest, HttpResponse};

/// Executes one HTTP round-trip.
///
/// Implementations must return non-2xx responses as `Ok` data.
pub trait Transport {
    fn send(&self, request: &HttpRequest) -> Result<HttpResponse, TransportError>;
}

impl<T: Transport + ?Sized> Transport for &T {
    fn send(&self, request: &HttpRequest) -> Result<HttpResponse, TransportError> {
        (**self).send(request)
    }
}

impl<T: Transport + ?Sized> Transport for Box<T> {
    fn send(&self, request: &HttpRequest) -> Result<HttpResponse, TransportError> {
        (**self).send(request)
    }
}

#[derive(Debug, Error)]
pub enum TransportError {
    #[error("timed out: {0}")]
    Timeout(String),

    #[error("{message}")]
    Client {
        message: String,
        #[source]
        source: Option<Box<dyn std::error::Error + Send + Sync>>,
    },
}

impl TransportError {
    pub fn client(message: impl Into<String>) -> Self {
        TransportError::Client {
            message: message.into(),
            source: None,
        }
    }
}

/// I/O timeouts surface as `Timeout` whichever layer raised them.
impl From<io::Error> for TransportError {
    fn from(err: io::Error) -> Self {
        match err.kind() {
            io::ErrorKind::TimedOut | io::ErrorKind::WouldBlock => TransportError::Timeout(err.to_string()),
            _ => TransportError::Client {
                message: err.to_string(),
                source: Some(Box::new(err)),
            },
        }
    }
}

#[cfg(feature = "ureq")]
pub use self::blocking::UreqTransport;

#[cfg(feature = "ureq")]
mod blocking {
    use std::fmt;
    use std::time::Duration;

    use super::{Transport, TransportError};
    use crate::config::ClientConfig;
    use crate::http::{HttpMethod, HttpRequest, HttpResponse};

    /// Blocking transport backed by a `ureq` agent.
    ///
    /// Status codes are returned as data (`http_status_as_error(false)`) so
    /// the pipeline's validator sees every response.
    #[derive(Clone)]
    pub struct UreqTransport {
        agent: ureq::Agent,
    }

    impl fmt::Debug for UreqTransport {
        fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
            f.debug_struct("UreqTransport").finish_non_exhaustive()
        }
    }

    impl UreqTransport {
        pub fn new(timeout: Option<Duration>) -> Self {
            let agent = ureq::Agent::config_builder()
                .http_status_as_error(false)
                .timeout_global(timeout)
                .build()
                .new_agent();
            Self { agent }
        }

        pub fn from_config(config: &ClientConfig) -> Self {
            Self::new(config.timeout())
        }
    }

    impl Default for UreqTransport {
        fn default() -> Self {
            Self::new(None)
        }
    }

    impl Transport for UreqTransport {
        fn send(&self, request: &HttpRequest) -> Result<HttpResponse, TransportError> {
            let url = request.url();
            let result = match (request.method, request.body.as_deref()) {
                (HttpMethod::Get, _) => with_headers(self.agent.get(&url), &request.headers).call(),
                (HttpMethod::Delete, _) => with_headers(self.agent.delete(&url), &request.headers).call(),
                (HttpMethod::Post, Some(body)) => {
                    with_headers(self.agent.post(&url), &request.headers).send(body.as_bytes())
                }
                (HttpMethod::Post, None) => with_headers(self.agent.post(&url), &request.headers).send_empty(),
                (HttpMethod::Put, Some(body)) => {
                    with_headers(self.agent.put(&url), &request.headers).send(body.as_bytes())
                }
                (HttpMethod::Put, None) => with_headers(self.agent.put(&url), &request.headers).send_empty(),
            };
            let mut response = result.map_err(translate)?;

            let status = response.status().as_u16();
            let headers = response
                .headers()
                .iter()
                .filter_map(|(name, value)| Some((name.as_str().to_string(), value.to_str().ok()?.to_string())))
                .collect();
            let body = response.body_mut().read_to_string().map_err(translate)?;

            Ok(HttpResponse { status, headers, body })
        }
    }

    fn with_headers<B>(mut builder: ureq::RequestBuilder<B>, headers: &[(String, String)]) -> ureq::RequestBuilder<B> {
        for (name, value) in headers {
            builder = builder.header(name.as_str(), value.as_str());
        }
        builder
    }

    /// Socket errors follow the `From<io::Error>` timeout rule.
    pub(super) fn translate(err: ureq::Error) -> TransportError {
        match err {
            ureq::Error::Io(io_err) => TransportError::from(io_err),
            ureq::Error::Timeout(_) => TransportError::Timeout(err.to_string()),
            other => TransportError::Client {
                message: other.to_string(),
                source: Some(Box::new(other)),
            },
        }
    }
}
