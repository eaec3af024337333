//! Selection policies: pure candidate-ordering functions over a pool
//! snapshot and the current usage state. Neither policy does network I/O
//! or touches usage counters.

use crate::pool::is_selectable;
use crate::usage::UsageTracker;
use std::sync::atomic::{AtomicUsize, Ordering};
use switchboard_core::ProviderConfig;

/// Decides which providers a single request may try, in order. An empty
/// result means nothing is selectable right now; `retry_on_empty` says
/// whether that is worth waiting out or terminal.
pub trait SelectionPolicy: Send + Sync {
    fn candidates(
        &self,
        snapshot: &[ProviderConfig],
        tracker: &UsageTracker,
    ) -> Vec<ProviderConfig>;

    fn retry_on_empty(&self) -> bool {
        false
    }

    fn name(&self) -> &'static str;
}

/// Always try in fixed priority order. Deterministic for a given pool and
/// usage state; the right choice when cost or quality ranking across
/// providers matters more than spreading load.
pub struct PriorityFallback;

impl SelectionPolicy for PriorityFallback {
    fn candidates(
        &self,
        snapshot: &[ProviderConfig],
        tracker: &UsageTracker,
    ) -> Vec<ProviderConfig> {
        // Snapshot is already priority-sorted by the pool.
        snapshot
            .iter()
            .filter(|p| is_selectable(p, tracker))
            .cloned()
            .collect()
    }

    fn name(&self) -> &'static str {
        "priority_fallback"
    }
}

/// Rotate a cursor shared across all requests, skipping unavailable
/// providers. The cursor is owned here and injected into the router, not
/// ambient global state, and it advances on every scan step so repeated
/// calls rotate even through skipped entries.
#[derive(Default)]
pub struct RoundRobin {
    cursor: AtomicUsize,
}

impl RoundRobin {
    pub fn new() -> Self {
        Self::default()
    }
}

impl SelectionPolicy for RoundRobin {
    fn candidates(
        &self,
        snapshot: &[ProviderConfig],
        tracker: &UsageTracker,
    ) -> Vec<ProviderConfig> {
        if snapshot.is_empty() {
            return Vec::new();
        }
        // At most one full scan per selection. A slightly stale cursor
        // read under concurrency is fine; it self-corrects on the next
        // rotation.
        for _ in 0..snapshot.len() {
            let slot = self.cursor.fetch_add(1, Ordering::Relaxed) % snapshot.len();
            let provider = &snapshot[slot];
            if is_selectable(provider, tracker) {
                return vec![provider.clone()];
            }
        }
        Vec::new()
    }

    fn retry_on_empty(&self) -> bool {
        true
    }

    fn name(&self) -> &'static str {
        "round_robin"
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use switchboard_core::{Credential, RateLimit, WireFormat};

    fn provider(id: &str, priority: u32) -> ProviderConfig {
        ProviderConfig::new(id, "http://localhost", "m", WireFormat::OpenAiChat)
            .with_priority(priority)
            .with_credential(Credential::new("key"))
    }

    fn snapshot() -> Vec<ProviderConfig> {
        vec![provider("a", 1), provider("b", 2), provider("c", 3)]
    }

    #[tokio::test]
    async fn priority_order_is_deterministic() {
        let tracker = UsageTracker::new();
        let snapshot = snapshot();
        let policy = PriorityFallback;

        let first: Vec<_> = policy
            .candidates(&snapshot, &tracker)
            .into_iter()
            .map(|p| p.id)
            .collect();
        let second: Vec<_> = policy
            .candidates(&snapshot, &tracker)
            .into_iter()
            .map(|p| p.id)
            .collect();
        assert_eq!(first, ["a", "b", "c"]);
        assert_eq!(first, second);
    }

    #[tokio::test]
    async fn priority_filters_unselectable() {
        let tracker = UsageTracker::new();
        let mut snapshot = snapshot();
        snapshot[0].enabled = false;
        snapshot[2].credential = None;

        let ids: Vec<_> = PriorityFallback
            .candidates(&snapshot, &tracker)
            .into_iter()
            .map(|p| p.id)
            .collect();
        assert_eq!(ids, ["b"]);
    }

    #[tokio::test]
    async fn round_robin_visits_each_provider_once_per_cycle() {
        let tracker = UsageTracker::new();
        let snapshot = snapshot();
        let policy = RoundRobin::new();

        let mut seen = Vec::new();
        for _ in 0..3 {
            let cands = policy.candidates(&snapshot, &tracker);
            assert_eq!(cands.len(), 1);
            seen.push(cands[0].id.clone());
        }
        let mut sorted = seen.clone();
        sorted.sort();
        assert_eq!(sorted, ["a", "b", "c"]);

        // The fourth selection starts the cycle again.
        assert_eq!(policy.candidates(&snapshot, &tracker)[0].id, seen[0]);
    }

    #[tokio::test]
    async fn round_robin_skips_rate_limited_providers() {
        let tracker = UsageTracker::new();
        let mut snapshot = snapshot();
        snapshot[0] = snapshot[0].clone().with_rate_limit(RateLimit::per_minute(1));
        tracker.record_usage("a", 1);

        let policy = RoundRobin::new();
        for _ in 0..4 {
            let cands = policy.candidates(&snapshot, &tracker);
            assert_eq!(cands.len(), 1);
            assert_ne!(cands[0].id, "a");
        }
    }

    #[tokio::test]
    async fn round_robin_empty_scan_asks_caller_to_wait() {
        let tracker = UsageTracker::new();
        let snapshot: Vec<ProviderConfig> = snapshot()
            .into_iter()
            .map(|p| p.disabled())
            .collect();

        let policy = RoundRobin::new();
        assert!(policy.candidates(&snapshot, &tracker).is_empty());
        assert!(policy.retry_on_empty());
        assert!(!PriorityFallback.retry_on_empty());
    }
}
