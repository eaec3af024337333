//! Router facade: the single entry point collaborators call. Wires the
//! pool, policy and executor together and translates the executor's
//! terminal state into the public result.

use crate::executor::{ExecutorConfig, FallbackExecutor};
use crate::policy::{PriorityFallback, SelectionPolicy};
use crate::pool::{ProviderPool, ProviderSource, StaticProviderSource};
use crate::usage::UsageTracker;
use anyhow::Result;
use serde::Serialize;
use std::sync::Arc;
use switchboard_core::{Attempt, ChatRequest, ChatResponse, ProviderConfig, RouterError};
use tracing::debug;
use uuid::Uuid;

/// A successful route, with the attempt trail for caller-side metrics.
#[derive(Debug, Clone)]
pub struct RoutedResponse {
    pub response: ChatResponse,
    pub attempts: Vec<Attempt>,
}

/// Point-in-time availability of one provider.
#[derive(Debug, Clone, Serialize)]
pub struct ProviderStatus {
    pub id: String,
    pub display_name: String,
    pub enabled: bool,
    pub current_requests: u32,
    pub request_limit: u32,
    pub current_tokens: u64,
    pub token_limit: Option<u64>,
    pub available: bool,
}

pub struct RouterBuilder {
    source: Arc<dyn ProviderSource>,
    policy: Arc<dyn SelectionPolicy>,
    executor_config: ExecutorConfig,
}

impl RouterBuilder {
    pub fn new(source: Arc<dyn ProviderSource>) -> Self {
        Self {
            source,
            policy: Arc::new(PriorityFallback),
            executor_config: ExecutorConfig::default(),
        }
    }

    pub fn policy(mut self, policy: Arc<dyn SelectionPolicy>) -> Self {
        self.policy = policy;
        self
    }

    pub fn executor_config(mut self, config: ExecutorConfig) -> Self {
        self.executor_config = config;
        self
    }

    pub fn build(self) -> Result<Router> {
        let tracker = Arc::new(UsageTracker::new());
        let executor = FallbackExecutor::new(Arc::clone(&tracker), self.executor_config)?;
        Ok(Router {
            pool: ProviderPool::new(self.source, tracker),
            policy: self.policy,
            executor,
        })
    }
}

pub struct Router {
    pool: ProviderPool,
    policy: Arc<dyn SelectionPolicy>,
    executor: FallbackExecutor,
}

impl Router {
    pub fn builder(source: Arc<dyn ProviderSource>) -> RouterBuilder {
        RouterBuilder::new(source)
    }

    /// Priority-fallback router over a fixed provider list.
    pub fn with_static_providers(providers: Vec<ProviderConfig>) -> Result<Self> {
        Self::builder(Arc::new(StaticProviderSource::new(providers))).build()
    }

    /// Route one normalized chat request to whichever provider the active
    /// policy and the fallback chain settle on.
    pub async fn route(&self, request: ChatRequest) -> Result<RoutedResponse, RouterError> {
        if request.messages.is_empty() {
            return Err(RouterError::InvalidRequest {
                reason: "messages must not be empty".to_string(),
            });
        }

        let request_id = Uuid::new_v4();
        let snapshot = self.pool.snapshot().await;
        debug!(
            %request_id,
            providers = snapshot.len(),
            policy = self.policy.name(),
            "routing chat request"
        );

        let (response, attempts) = self
            .executor
            .run(self.policy.as_ref(), &snapshot, &request, request_id)
            .await?;
        Ok(RoutedResponse { response, attempts })
    }

    /// Per-provider availability snapshot for the observability surface.
    pub async fn status(&self) -> Vec<ProviderStatus> {
        let snapshot = self.pool.snapshot().await;
        snapshot
            .iter()
            .map(|p| {
                let usage = self.pool.tracker().snapshot(p);
                ProviderStatus {
                    id: p.id.clone(),
                    display_name: p.display_name.clone(),
                    enabled: p.enabled,
                    current_requests: usage.requests,
                    request_limit: p.rate_limit.requests_per_window,
                    current_tokens: usage.tokens,
                    token_limit: p.rate_limit.tokens_per_window,
                    available: self.pool.is_selectable(p),
                }
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use switchboard_core::{ChatMessage, Credential, RateLimit, WireFormat};

    #[tokio::test]
    async fn empty_messages_are_rejected() {
        let router = Router::with_static_providers(vec![]).expect("build");
        let err = router.route(ChatRequest::new(vec![])).await.unwrap_err();
        assert!(matches!(err, RouterError::InvalidRequest { .. }));
    }

    #[tokio::test]
    async fn empty_pool_reports_no_provider() {
        let router = Router::with_static_providers(vec![]).expect("build");
        let err = router
            .route(ChatRequest::new(vec![ChatMessage::user("hi")]))
            .await
            .unwrap_err();
        assert!(matches!(err, RouterError::NoProviderAvailable { .. }));
    }

    #[tokio::test]
    async fn status_reflects_configuration() {
        let providers = vec![
            ProviderConfig::new("a", "http://localhost", "m", WireFormat::OpenAiChat)
                .with_priority(1)
                .with_credential(Credential::new("key"))
                .with_rate_limit(RateLimit::per_minute(5).with_token_limit(1000)),
            ProviderConfig::new("b", "http://localhost", "m", WireFormat::GeminiNative)
                .with_priority(2)
                .disabled(),
        ];
        let router = Router::with_static_providers(providers).expect("build");

        let status = router.status().await;
        assert_eq!(status.len(), 2);
        assert_eq!(status[0].id, "a");
        assert_eq!(status[0].request_limit, 5);
        assert_eq!(status[0].token_limit, Some(1000));
        assert!(status[0].available);
        assert!(!status[1].available);
        assert!(!status[1].enabled);
    }
}
