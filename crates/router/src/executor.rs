//! Fallback-chain execution: walk the candidates a selection policy
//! yields, one wire call each, stopping at the first success or when the
//! chain is exhausted. All per-attempt failures are recovered here; only
//! terminal errors leave this module.

use crate::policy::SelectionPolicy;
use crate::usage::UsageTracker;
use crate::wire;
use anyhow::{anyhow, Result};
use rand::Rng;
use reqwest::Client;
use std::collections::HashSet;
use std::sync::Arc;
use std::time::Duration;
use switchboard_core::{
    Attempt, AttemptOutcome, ChatRequest, ChatResponse, ProviderConfig, RouterError,
};
use tokio::time::Instant;
use tracing::{debug, error, info, warn};
use uuid::Uuid;

/// Tunables for one executor instance.
#[derive(Debug, Clone)]
pub struct ExecutorConfig {
    /// Bound on each network attempt, connection included.
    pub attempt_timeout: Duration,
    /// How long round-robin waits before re-scanning an empty pool.
    pub empty_scan_delay: Duration,
    /// Outer re-scan rounds before giving up, round-robin only.
    pub max_selection_rounds: u32,
}

impl Default for ExecutorConfig {
    fn default() -> Self {
        Self {
            attempt_timeout: Duration::from_secs(30),
            empty_scan_delay: Duration::from_millis(250),
            max_selection_rounds: 4,
        }
    }
}

pub struct FallbackExecutor {
    client: Client,
    tracker: Arc<UsageTracker>,
    config: ExecutorConfig,
}

impl FallbackExecutor {
    pub fn new(tracker: Arc<UsageTracker>, config: ExecutorConfig) -> Result<Self> {
        let client = Client::builder()
            .timeout(config.attempt_timeout)
            .build()
            .map_err(|e| anyhow!("failed to build HTTP client: {e}"))?;
        Ok(Self {
            client,
            tracker,
            config,
        })
    }

    /// Run one logical request against the snapshot: Selecting →
    /// Attempting, until Succeeded or Exhausted.
    pub async fn run(
        &self,
        policy: &dyn SelectionPolicy,
        snapshot: &[ProviderConfig],
        request: &ChatRequest,
        request_id: Uuid,
    ) -> Result<(ChatResponse, Vec<Attempt>), RouterError> {
        let mut attempts: Vec<Attempt> = Vec::new();
        let mut visited: HashSet<String> = HashSet::new();
        let mut last_error: Option<RouterError> = None;
        let mut rounds = 0u32;

        loop {
            let provider = policy
                .candidates(snapshot, &self.tracker)
                .into_iter()
                .find(|p| !visited.contains(&p.id));

            let provider = match provider {
                Some(p) => p,
                None => {
                    // Waiting only helps while some unvisited provider
                    // could re-enter its window; once everything left is
                    // visited, re-scanning cannot surface a new candidate.
                    let window_may_clear = snapshot
                        .iter()
                        .any(|p| !visited.contains(&p.id) && p.enabled && p.has_credential());
                    if policy.retry_on_empty()
                        && rounds < self.config.max_selection_rounds
                        && window_may_clear
                    {
                        rounds += 1;
                        let delay = jittered(self.config.empty_scan_delay);
                        debug!(
                            %request_id,
                            round = rounds,
                            ?delay,
                            "no selectable provider, waiting before re-scan"
                        );
                        tokio::time::sleep(delay).await;
                        continue;
                    }
                    break;
                }
            };

            visited.insert(provider.id.clone());
            // The attempt runs on its own task so that usage is recorded
            // even when the caller drops this future mid-flight; a request
            // already on the wire still counts against the local estimate.
            let attempt_task = self.spawn_attempt(provider.clone(), request.clone());
            let (result, latency) = match attempt_task.await {
                Ok(outcome) => outcome,
                Err(join_err) => (
                    Err(RouterError::MalformedResponse {
                        provider_id: provider.id.clone(),
                        reason: format!("attempt task failed: {join_err}"),
                    }),
                    Duration::ZERO,
                ),
            };

            match result {
                Ok(response) => {
                    attempts.push(Attempt {
                        provider_id: provider.id.clone(),
                        outcome: AttemptOutcome::Success,
                        latency,
                    });
                    info!(
                        %request_id,
                        provider = %provider.id,
                        latency_ms = latency.as_millis() as u64,
                        tokens = response.tokens_used,
                        attempts = attempts.len(),
                        "request served"
                    );
                    return Ok((response, attempts));
                }
                Err(err) => {
                    let outcome = err.outcome();
                    match outcome {
                        AttemptOutcome::RateLimited => {
                            warn!(%request_id, provider = %provider.id, "vendor rate limited, window saturated");
                        }
                        AttemptOutcome::AuthError => {
                            // Operational alert: a bad credential fails
                            // silently until the whole pool is misconfigured.
                            error!(%request_id, provider = %provider.id, "credential rejected by vendor");
                        }
                        _ => {
                            warn!(%request_id, provider = %provider.id, %err, "attempt failed, moving to next candidate");
                        }
                    }

                    attempts.push(Attempt {
                        provider_id: provider.id.clone(),
                        outcome,
                        latency,
                    });
                    last_error = Some(err);
                }
            }
        }

        match last_error {
            Some(last) => Err(RouterError::Exhausted {
                attempts,
                last: Box::new(last),
            }),
            // Nothing was ever attempted: the pool is empty, disabled,
            // uncredentialed, or every member sits outside its window.
            None => Err(RouterError::NoProviderAvailable {
                reason: no_provider_reason(snapshot),
            }),
        }
    }

    /// Detached attempt task: the wire call and its usage recording run to
    /// completion regardless of whether the caller keeps waiting.
    fn spawn_attempt(
        &self,
        provider: ProviderConfig,
        request: ChatRequest,
    ) -> tokio::task::JoinHandle<(Result<ChatResponse, RouterError>, Duration)> {
        let client = self.client.clone();
        let tracker = Arc::clone(&self.tracker);
        let attempt_timeout = self.config.attempt_timeout;
        tokio::spawn(async move {
            let started = Instant::now();
            let result = attempt(&client, &provider, &request, attempt_timeout).await;
            let latency = started.elapsed();
            match &result {
                Ok(response) => {
                    tracker.record_usage(&provider.id, u64::from(response.tokens_used));
                }
                Err(err) => {
                    tracker.record_usage(&provider.id, 0);
                    if err.outcome() == AttemptOutcome::RateLimited {
                        // A live 429 outranks the local estimate; park the
                        // provider for the rest of its window.
                        tracker.saturate(&provider);
                    }
                }
            }
            (result, latency)
        })
    }
}

async fn attempt(
    client: &Client,
    provider: &ProviderConfig,
    request: &ChatRequest,
    attempt_timeout: Duration,
) -> Result<ChatResponse, RouterError> {
    let payload = wire::to_wire_request(provider, request);
    let builder = client.post(&provider.endpoint_url).json(&payload);
    let builder = wire::apply_auth(builder, provider);

    let response = builder
        .send()
        .await
        .map_err(|e| classify_transport(provider, e, attempt_timeout))?;

    let status = response.status();
    if !status.is_success() {
        return Err(RouterError::from_status(&provider.id, status.as_u16()));
    }

    let body = response
        .text()
        .await
        .map_err(|e| RouterError::MalformedResponse {
            provider_id: provider.id.clone(),
            reason: format!("failed to read body: {e}"),
        })?;
    wire::from_wire_response(provider, &body)
}

/// Timeouts and connection failures share the `Timeout` class: either way
/// the vendor never answered. Anything else that broke mid-exchange is a
/// malformed exchange.
fn classify_transport(
    provider: &ProviderConfig,
    error: reqwest::Error,
    timeout: Duration,
) -> RouterError {
    if error.is_timeout() || error.is_connect() {
        RouterError::Timeout {
            provider_id: provider.id.clone(),
            timeout,
        }
    } else {
        RouterError::MalformedResponse {
            provider_id: provider.id.clone(),
            reason: error.to_string(),
        }
    }
}

fn no_provider_reason(snapshot: &[ProviderConfig]) -> String {
    if snapshot.is_empty() {
        return "provider pool is empty".to_string();
    }
    if snapshot
        .iter()
        .all(|p| !p.enabled || !p.has_credential())
    {
        return "every provider is disabled or missing a credential".to_string();
    }
    "every provider is outside its rate window".to_string()
}

fn jittered(delay: Duration) -> Duration {
    let base = delay.as_millis() as f64;
    let jitter = rand::thread_rng().gen_range(-0.1..0.1) * base;
    Duration::from_millis((base + jitter).max(0.0) as u64)
}
