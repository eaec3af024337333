//! Sliding-window usage accounting, one window per provider.
//!
//! State is purely in-process: it is a local approximation of vendor-side
//! limits and resets to empty on restart. Multi-instance deployments will
//! see local estimates diverge from true vendor usage; that trade-off is
//! accepted here rather than papered over.

use std::collections::HashMap;
use std::sync::{Arc, Mutex, RwLock};
use switchboard_core::ProviderConfig;
use tokio::time::Instant;
use tracing::debug;

#[derive(Debug, Clone, Copy)]
struct UsageEvent {
    at: Instant,
    tokens: u64,
}

#[derive(Debug, Default)]
struct ProviderWindow {
    events: Vec<UsageEvent>,
}

impl ProviderWindow {
    /// Drop events older than the window. O(window size), done lazily at
    /// each read and write.
    fn prune(&mut self, window: std::time::Duration, now: Instant) {
        self.events.retain(|e| now.duration_since(e.at) < window);
    }

    fn totals(&self) -> (u32, u64) {
        let requests = self.events.len() as u32;
        let tokens = self.events.iter().map(|e| e.tokens).sum();
        (requests, tokens)
    }
}

/// Point-in-time usage for one provider, for the status surface.
#[derive(Debug, Clone, Copy, serde::Serialize)]
pub struct UsageSnapshot {
    pub requests: u32,
    pub tokens: u64,
}

/// Per-provider rolling usage counters. The only shared mutable state in
/// the router; each provider's window has its own lock so unrelated
/// vendors never serialize on each other.
#[derive(Debug, Default)]
pub struct UsageTracker {
    windows: RwLock<HashMap<String, Arc<Mutex<ProviderWindow>>>>,
}

impl UsageTracker {
    pub fn new() -> Self {
        Self::default()
    }

    fn window(&self, provider_id: &str) -> Arc<Mutex<ProviderWindow>> {
        if let Some(win) = self
            .windows
            .read()
            .unwrap_or_else(|e| e.into_inner())
            .get(provider_id)
        {
            return Arc::clone(win);
        }
        let mut windows = self.windows.write().unwrap_or_else(|e| e.into_inner());
        Arc::clone(windows.entry(provider_id.to_string()).or_default())
    }

    /// Record one attempt against a provider. `tokens` is whatever the
    /// vendor reported, 0 for failures without usage data.
    pub fn record_usage(&self, provider_id: &str, tokens: u64) {
        let win = self.window(provider_id);
        let mut win = win.lock().unwrap_or_else(|e| e.into_inner());
        win.events.push(UsageEvent {
            at: Instant::now(),
            tokens,
        });
    }

    /// Whether the provider is inside both its request and token windows.
    ///
    /// Fail-open by design: a provider with no recorded history answers
    /// `true`. An unrecognized id must not silently become permanently
    /// blocked.
    pub fn is_within_limits(&self, provider: &ProviderConfig) -> bool {
        let existing = self
            .windows
            .read()
            .unwrap_or_else(|e| e.into_inner())
            .get(&provider.id)
            .cloned();
        let Some(win) = existing else {
            return true;
        };

        let limit = &provider.rate_limit;
        let mut win = win.lock().unwrap_or_else(|e| e.into_inner());
        win.prune(limit.window, Instant::now());
        let (requests, tokens) = win.totals();

        if requests >= limit.requests_per_window {
            return false;
        }
        if let Some(token_limit) = limit.tokens_per_window {
            if tokens >= token_limit {
                return false;
            }
        }
        true
    }

    /// Fill the provider's window after a live vendor 429. The vendor's
    /// verdict is stronger evidence than the local estimate, so the
    /// provider stays unavailable until the window naturally clears.
    /// Both thresholds count: a token-only limit is saturated with one
    /// synthetic token event.
    pub fn saturate(&self, provider: &ProviderConfig) {
        let limit = &provider.rate_limit;
        if limit.is_unlimited() {
            // No local window to fill; nothing to do.
            debug!(provider = %provider.id, "429 on provider with no local limits");
            return;
        }

        let win = self.window(&provider.id);
        let mut win = win.lock().unwrap_or_else(|e| e.into_inner());
        let now = Instant::now();
        win.prune(limit.window, now);
        let (requests, tokens) = win.totals();
        if limit.requests_per_window != u32::MAX {
            for _ in requests..limit.requests_per_window {
                win.events.push(UsageEvent { at: now, tokens: 0 });
            }
        }
        if let Some(token_limit) = limit.tokens_per_window {
            if tokens < token_limit {
                win.events.push(UsageEvent {
                    at: now,
                    tokens: token_limit - tokens,
                });
            }
        }
    }

    /// Current counters for one provider, pruned to its window.
    pub fn snapshot(&self, provider: &ProviderConfig) -> UsageSnapshot {
        let existing = self
            .windows
            .read()
            .unwrap_or_else(|e| e.into_inner())
            .get(&provider.id)
            .cloned();
        let Some(win) = existing else {
            return UsageSnapshot {
                requests: 0,
                tokens: 0,
            };
        };
        let mut win = win.lock().unwrap_or_else(|e| e.into_inner());
        win.prune(provider.rate_limit.window, Instant::now());
        let (requests, tokens) = win.totals();
        UsageSnapshot { requests, tokens }
    }
}
