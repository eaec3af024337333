//! Provider-list loading.
//!
//! The persisted provider record never contains a secret: each entry names
//! the environment variable holding its credential (`credential_env`), and
//! the value is resolved at load time. An entry whose variable is unset
//! loads without a credential and is therefore never selectable, which is
//! preferable to failing the whole list.

use crate::provider::{Credential, ProviderConfig, RateLimit, WireFormat};
use anyhow::{Context, Result};
use serde::Deserialize;
use std::path::Path;
use std::time::Duration;
use tracing::warn;

/// On-disk shape of the provider list.
#[derive(Debug, Deserialize)]
pub struct ProvidersFile {
    pub providers: Vec<ProviderEntry>,
}

#[derive(Debug, Deserialize)]
pub struct ProviderEntry {
    pub id: String,
    #[serde(default)]
    pub display_name: Option<String>,
    pub endpoint_url: String,
    #[serde(default)]
    pub credential_env: Option<String>,
    pub model: String,
    pub wire_format: WireFormat,
    #[serde(default = "default_priority")]
    pub priority: u32,
    #[serde(default = "default_enabled")]
    pub enabled: bool,
    #[serde(default)]
    pub requests_per_window: Option<u32>,
    #[serde(default = "default_window_secs")]
    pub window_secs: u64,
    #[serde(default)]
    pub tokens_per_window: Option<u64>,
}

fn default_priority() -> u32 {
    100
}

fn default_enabled() -> bool {
    true
}

fn default_window_secs() -> u64 {
    60
}

impl ProviderEntry {
    fn into_config(self) -> ProviderConfig {
        let credential = self.credential_env.as_deref().and_then(|var| {
            match std::env::var(var) {
                Ok(value) if !value.is_empty() => Some(Credential::new(value)),
                _ => {
                    warn!(
                        provider = %self.id,
                        env = var,
                        "credential variable unset; provider will not be selectable"
                    );
                    None
                }
            }
        });

        let rate_limit = match self.requests_per_window {
            Some(requests) => RateLimit {
                requests_per_window: requests,
                window: Duration::from_secs(self.window_secs),
                tokens_per_window: self.tokens_per_window,
            },
            None => match self.tokens_per_window {
                Some(tokens) => RateLimit::unlimited().with_token_limit(tokens),
                None => RateLimit::unlimited(),
            },
        };

        let mut provider = ProviderConfig::new(
            &self.id,
            &self.endpoint_url,
            &self.model,
            self.wire_format,
        )
        .with_priority(self.priority)
        .with_rate_limit(rate_limit);

        if let Some(name) = self.display_name {
            provider = provider.with_display_name(&name);
        }
        if let Some(credential) = credential {
            provider = provider.with_credential(credential);
        }
        if !self.enabled {
            provider = provider.disabled();
        }
        provider
    }
}

/// Parse a provider list from a JSON document.
pub fn parse_providers(raw: &str) -> Result<Vec<ProviderConfig>> {
    let file: ProvidersFile = serde_json::from_str(raw).context("invalid providers file")?;
    Ok(file
        .providers
        .into_iter()
        .map(ProviderEntry::into_config)
        .collect())
}

/// Load the provider list from a JSON file, resolving credentials from the
/// environment (a `.env` file is honored if present).
pub fn load_providers(path: &Path) -> Result<Vec<ProviderConfig>> {
    dotenv::dotenv().ok();
    let raw = std::fs::read_to_string(path)
        .with_context(|| format!("reading providers file {}", path.display()))?;
    parse_providers(&raw)
}

#[cfg(test)]
mod tests {
    use super::*;

    const SAMPLE: &str = r#"{
        "providers": [
            {
                "id": "openai-main",
                "display_name": "OpenAI",
                "endpoint_url": "https://api.openai.com/v1/chat/completions",
                "credential_env": "SWITCHBOARD_TEST_OPENAI_KEY",
                "model": "gpt-4o-mini",
                "wire_format": "open_ai_chat",
                "priority": 1,
                "requests_per_window": 60,
                "window_secs": 60,
                "tokens_per_window": 90000
            },
            {
                "id": "gemini-backup",
                "endpoint_url": "https://generativelanguage.googleapis.com/v1beta/models/gemini-1.5-flash:generateContent",
                "credential_env": "SWITCHBOARD_TEST_MISSING_KEY",
                "model": "gemini-1.5-flash",
                "wire_format": "gemini_native",
                "priority": 2
            }
        ]
    }"#;

    #[test]
    fn parses_entries_and_resolves_credentials() {
        std::env::set_var("SWITCHBOARD_TEST_OPENAI_KEY", "sk-test");
        std::env::remove_var("SWITCHBOARD_TEST_MISSING_KEY");

        let providers = parse_providers(SAMPLE).expect("sample should parse");
        assert_eq!(providers.len(), 2);

        let openai = &providers[0];
        assert_eq!(openai.id, "openai-main");
        assert_eq!(openai.wire_format, WireFormat::OpenAiChat);
        assert!(openai.has_credential());
        assert_eq!(openai.rate_limit.requests_per_window, 60);
        assert_eq!(openai.rate_limit.tokens_per_window, Some(90000));

        // Unset env var: entry loads, but with no credential.
        let gemini = &providers[1];
        assert!(!gemini.has_credential());
        assert!(gemini.enabled);
        assert!(gemini.rate_limit.is_unlimited());
    }

    #[test]
    fn load_from_file() {
        std::env::set_var("SWITCHBOARD_TEST_OPENAI_KEY", "sk-test");
        let dir = tempfile::tempdir().expect("tempdir");
        let path = dir.path().join("providers.json");
        std::fs::write(&path, SAMPLE).expect("write sample");

        let providers = load_providers(&path).expect("file should load");
        assert_eq!(providers.len(), 2);
    }

    #[test]
    fn rejects_garbage() {
        assert!(parse_providers("not json").is_err());
    }
}
