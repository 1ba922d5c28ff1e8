//! Client configuration.
//!
//! `ClientConfig` is built once and handed to `FeedlrClient::new`; nothing in
//! the pipeline mutates it afterwards. It derives `Deserialize` so hosts can
//! load it from whatever config format they already use.

use std::time::Duration;

use serde::Deserialize;

pub const PRODUCTION_URL: &str = "https://cloud.feedly.com/v3";
pub const SANDBOX_URL: &str = "https://sandbox.feedly.com/v3";

const DEFAULT_USER_AGENT: &str = concat!("feedlr-core/", env!("CARGO_PKG_VERSION"));

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct ClientConfig {
    /// API root, e.g. `https://cloud.feedly.com/v3`. Trailing slashes are
    /// trimmed by [`ClientConfig::new`] and on use.
    pub base_url: String,

    /// Sent as `Authorization: OAuth <token>` on every request.
    #[serde(default)]
    pub oauth_access_token: Option<String>,

    #[serde(default = "default_user_agent")]
    pub user_agent: String,

    /// Extra headers applied before auth and per-call headers.
    #[serde(default)]
    pub default_headers: Vec<(String, String)>,

    /// Transport timeout. `None` leaves the transport's own default.
    #[serde(default)]
    pub timeout_ms: Option<u64>,
}

fn default_user_agent() -> String {
    DEFAULT_USER_AGENT.to_string()
}

impl ClientConfig {
    pub fn new(base_url: &str) -> Self {
        Self {
            base_url: base_url.trim_end_matches('/').to_string(),
            oauth_access_token: None,
            user_agent: default_user_agent(),
            default_headers: Vec::new(),
            timeout_ms: None,
        }
    }

    pub fn production() -> Self {
        Self::new(PRODUCTION_URL)
    }

    pub fn sandbox() -> Self {
        Self::new(SANDBOX_URL)
    }

    pub fn with_oauth_access_token(mut self, token: impl Into<String>) -> Self {
        self.oauth_access_token = Some(token.into());
        self
    }

    pub fn with_header(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.default_headers.push((name.into(), value.into()));
        self
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout_ms = Some(u64::try_from(timeout.as_millis()).unwrap_or(u64::MAX));
        self
    }

    pub fn timeout(&self) -> Option<Duration> {
        self.timeout_ms.map(Duration::from_millis)
    }

    /// Join a path like `/subscriptions` onto the API root.
    pub fn url(&self, path: &str) -> String {
        format!(
            "{}/{}",
            self.base_url.trim_end_matches('/'),
            path.trim_start_matches('/')
        )
    }
}
