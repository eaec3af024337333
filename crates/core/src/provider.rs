use serde::{Deserialize, Serialize};
use std::fmt;
use std::time::Duration;

/// Opaque API secret. `Debug` redacts the value and the type is deliberately
/// not `Serialize`, so a provider record can never leak its credential into
/// logs, responses or persisted state.
#[derive(Clone, PartialEq, Eq)]
pub struct Credential(String);

impl Credential {
    pub fn new(secret: impl Into<String>) -> Self {
        Self(secret.into())
    }

    /// The raw secret; only the wire layer should call this.
    pub fn expose(&self) -> &str {
        &self.0
    }
}

impl fmt::Debug for Credential {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("Credential(****)")
    }
}

/// The closed set of wire formats the router can speak. Adding a vendor
/// format means adding a variant here plus one adapter module.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum WireFormat {
    OpenAiChat,
    GeminiNative,
}

/// Per-provider sliding-window thresholds.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct RateLimit {
    pub requests_per_window: u32,
    pub window: Duration,
    pub tokens_per_window: Option<u64>,
}

impl RateLimit {
    pub fn per_minute(requests: u32) -> Self {
        Self {
            requests_per_window: requests,
            window: Duration::from_secs(60),
            tokens_per_window: None,
        }
    }

    pub fn with_token_limit(mut self, tokens: u64) -> Self {
        self.tokens_per_window = Some(tokens);
        self
    }

    /// A limit the local window can never trip.
    pub fn unlimited() -> Self {
        Self {
            requests_per_window: u32::MAX,
            window: Duration::from_secs(60),
            tokens_per_window: None,
        }
    }

    pub fn is_unlimited(&self) -> bool {
        self.requests_per_window == u32::MAX && self.tokens_per_window.is_none()
    }
}

/// A configured upstream vendor. Read-only during request handling; a new
/// snapshot replaces the pool on reload without stopping in-flight requests.
#[derive(Debug, Clone)]
pub struct ProviderConfig {
    pub id: String,
    pub display_name: String,
    pub endpoint_url: String,
    pub credential: Option<Credential>,
    pub model: String,
    pub wire_format: WireFormat,
    /// Lower is tried first.
    pub priority: u32,
    pub enabled: bool,
    pub rate_limit: RateLimit,
}

impl ProviderConfig {
    pub fn new(
        id: &str,
        endpoint_url: &str,
        model: &str,
        wire_format: WireFormat,
    ) -> Self {
        Self {
            id: id.to_string(),
            display_name: id.to_string(),
            endpoint_url: endpoint_url.to_string(),
            credential: None,
            model: model.to_string(),
            wire_format,
            priority: 100,
            enabled: true,
            rate_limit: RateLimit::unlimited(),
        }
    }

    pub fn with_display_name(mut self, name: &str) -> Self {
        self.display_name = name.to_string();
        self
    }

    pub fn with_credential(mut self, credential: Credential) -> Self {
        self.credential = Some(credential);
        self
    }

    pub fn with_priority(mut self, priority: u32) -> Self {
        self.priority = priority;
        self
    }

    pub fn with_rate_limit(mut self, rate_limit: RateLimit) -> Self {
        self.rate_limit = rate_limit;
        self
    }

    pub fn disabled(mut self) -> Self {
        self.enabled = false;
        self
    }

    pub fn has_credential(&self) -> bool {
        self.credential.is_some()
    }
}
