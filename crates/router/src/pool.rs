//! Provider pool: where the configured provider set comes from, and which
//! of its members may be tried right now.

use crate::usage::UsageTracker;
use async_trait::async_trait;
use std::sync::Arc;
use switchboard_core::ProviderConfig;
use tokio::sync::RwLock;

/// Source of the configured provider list. One implementation wraps a
/// fixed startup list, another an administrator-editable store; swapping
/// one for the other must not change selection behavior.
#[async_trait]
pub trait ProviderSource: Send + Sync {
    /// Current provider set, sorted ascending by priority.
    async fn snapshot(&self) -> Vec<ProviderConfig>;
}

/// Fixed list configured at process start.
pub struct StaticProviderSource {
    providers: Vec<ProviderConfig>,
}

impl StaticProviderSource {
    pub fn new(mut providers: Vec<ProviderConfig>) -> Self {
        providers.sort_by_key(|p| p.priority);
        Self { providers }
    }
}

#[async_trait]
impl ProviderSource for StaticProviderSource {
    async fn snapshot(&self) -> Vec<ProviderConfig> {
        self.providers.clone()
    }
}

/// Reloadable list. `replace` swaps in a whole new snapshot atomically;
/// requests already holding the old snapshot finish against it.
pub struct SharedProviderSource {
    providers: RwLock<Arc<Vec<ProviderConfig>>>,
}

impl SharedProviderSource {
    pub fn new(mut providers: Vec<ProviderConfig>) -> Self {
        providers.sort_by_key(|p| p.priority);
        Self {
            providers: RwLock::new(Arc::new(providers)),
        }
    }

    pub async fn replace(&self, mut providers: Vec<ProviderConfig>) {
        providers.sort_by_key(|p| p.priority);
        *self.providers.write().await = Arc::new(providers);
    }
}

#[async_trait]
impl ProviderSource for SharedProviderSource {
    async fn snapshot(&self) -> Vec<ProviderConfig> {
        self.providers.read().await.as_ref().clone()
    }
}

/// A provider may be tried when it is enabled, has a credential, and is
/// inside its local usage window.
pub fn is_selectable(provider: &ProviderConfig, tracker: &UsageTracker) -> bool {
    provider.enabled && provider.has_credential() && tracker.is_within_limits(provider)
}

/// The configured provider set plus the usage state needed to answer
/// "which of these may be tried right now".
pub struct ProviderPool {
    source: Arc<dyn ProviderSource>,
    tracker: Arc<UsageTracker>,
}

impl ProviderPool {
    pub fn new(source: Arc<dyn ProviderSource>, tracker: Arc<UsageTracker>) -> Self {
        Self { source, tracker }
    }

    pub async fn snapshot(&self) -> Vec<ProviderConfig> {
        self.source.snapshot().await
    }

    pub fn is_selectable(&self, provider: &ProviderConfig) -> bool {
        is_selectable(provider, &self.tracker)
    }

    pub fn tracker(&self) -> &Arc<UsageTracker> {
        &self.tracker
    }
}
