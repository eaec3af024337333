//! Error taxonomy for the provider router.
//!
//! Individual attempt failures are recovered inside the fallback executor;
//! only `Exhausted`, `NoProviderAvailable` and `InvalidRequest` ever reach
//! the facade's caller. Nothing here is fatal to the process.

use serde::Serialize;
use std::time::Duration;
use thiserror::Error;

/// Classified result of one provider attempt.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum AttemptOutcome {
    Success,
    RateLimited,
    AuthError,
    Timeout,
    ServerError,
    Malformed,
}

/// One entry of the per-request attempt log, in try order. Ephemeral:
/// surfaced to the caller for metrics and error messages, never persisted.
#[derive(Debug, Clone, Serialize)]
pub struct Attempt {
    pub provider_id: String,
    pub outcome: AttemptOutcome,
    pub latency: Duration,
}

#[derive(Debug, Error)]
pub enum RouterError {
    #[error("provider {provider_id} rate limited the call")]
    RateLimited { provider_id: String },

    #[error("provider {provider_id} rejected the credential (HTTP {status})")]
    AuthError { provider_id: String, status: u16 },

    /// Also covers connection failures: either way the vendor never answered.
    #[error("provider {provider_id} did not answer within {timeout:?}")]
    Timeout {
        provider_id: String,
        timeout: Duration,
    },

    #[error("provider {provider_id} returned HTTP {status}")]
    UpstreamServerError { provider_id: String, status: u16 },

    #[error("provider {provider_id} returned a malformed body: {reason}")]
    MalformedResponse { provider_id: String, reason: String },

    #[error("no provider available: {reason}")]
    NoProviderAvailable { reason: String },

    #[error("all {count} provider attempts failed; last: {last}", count = .attempts.len())]
    Exhausted {
        attempts: Vec<Attempt>,
        last: Box<RouterError>,
    },

    #[error("invalid request: {reason}")]
    InvalidRequest { reason: String },
}

impl RouterError {
    /// Attempt-log classification of an individual attempt failure.
    pub fn outcome(&self) -> AttemptOutcome {
        match self {
            RouterError::RateLimited { .. } => AttemptOutcome::RateLimited,
            RouterError::AuthError { .. } => AttemptOutcome::AuthError,
            RouterError::Timeout { .. } => AttemptOutcome::Timeout,
            RouterError::UpstreamServerError { .. } => AttemptOutcome::ServerError,
            RouterError::MalformedResponse { .. } => AttemptOutcome::Malformed,
            // Terminal kinds never appear as a single attempt's outcome.
            RouterError::NoProviderAvailable { .. }
            | RouterError::Exhausted { .. }
            | RouterError::InvalidRequest { .. } => AttemptOutcome::ServerError,
        }
    }

    /// Classify a non-2xx HTTP status from a vendor.
    pub fn from_status(provider_id: &str, status: u16) -> Self {
        match status {
            429 => RouterError::RateLimited {
                provider_id: provider_id.to_string(),
            },
            401 | 403 => RouterError::AuthError {
                provider_id: provider_id.to_string(),
                status,
            },
            408 => RouterError::Timeout {
                provider_id: provider_id.to_string(),
                timeout: Duration::ZERO,
            },
            // 5xx, and any status the taxonomy has no finer class for.
            _ => RouterError::UpstreamServerError {
                provider_id: provider_id.to_string(),
                status,
            },
        }
    }
}

pub type RouterResult<T> = Result<T, RouterError>;
