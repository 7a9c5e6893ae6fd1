//! Usage tracking against remote quota counters.
//!
//! The server's counters are authoritative: every RPC returns the updated
//! snapshot and the local cache is overwritten with it, even when it
//! disagrees with the client's optimistic expectation. Prechecks read the
//! last-known cached value; they do not re-fetch per dispatch.

use std::sync::Mutex;
use std::sync::atomic::{AtomicU32, Ordering};

use async_trait::async_trait;
use thiserror::Error;
use tracing::{debug, warn};

/// Counter values as reported by the usage service.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct UsageSnapshot {
    pub prompt_count: u32,
    pub synthesis_count: u32,
}

/// Configured ceilings.
#[derive(Debug, Clone, Copy)]
pub struct UsageLimits {
    pub llm_prompt_limit: u32,
    pub synthesize_limit: u32,
}

impl Default for UsageLimits {
    fn default() -> Self {
        Self {
            llm_prompt_limit: 50,
            synthesize_limit: 10,
        }
    }
}

#[derive(Debug, Error)]
pub enum UsageError {
    #[error("network error calling usage service: {source}")]
    Network {
        #[source]
        source: reqwest::Error,
    },
    #[error("usage service returned invalid response: {reason}")]
    InvalidResponse { reason: String },
}

impl UsageError {
    pub fn network(source: reqwest::Error) -> Self {
        Self::Network { source }
    }

    pub fn invalid_response(reason: impl Into<String>) -> Self {
        Self::InvalidResponse {
            reason: reason.into(),
        }
    }
}

/// Remote usage RPCs, keyed by user.
#[async_trait]
pub trait UsageBackend: Send + Sync {
    async fn get_llm_usage(&self, user_id: &str) -> Result<UsageSnapshot, UsageError>;

    /// Records `count` prompt units, returns the updated counters.
    async fn update_llm_usage(&self, user_id: &str, count: u32)
    -> Result<UsageSnapshot, UsageError>;

    /// Records one synthesis unit, returns the updated counters.
    async fn update_synthesize_usage(&self, user_id: &str) -> Result<UsageSnapshot, UsageError>;
}

#[async_trait]
impl UsageBackend for Box<dyn UsageBackend> {
    async fn get_llm_usage(&self, user_id: &str) -> Result<UsageSnapshot, UsageError> {
        (**self).get_llm_usage(user_id).await
    }

    async fn update_llm_usage(
        &self,
        user_id: &str,
        count: u32,
    ) -> Result<UsageSnapshot, UsageError> {
        (**self).update_llm_usage(user_id, count).await
    }

    async fn update_synthesize_usage(&self, user_id: &str) -> Result<UsageSnapshot, UsageError> {
        (**self).update_synthesize_usage(user_id).await
    }
}

/// In-process usage backend.
///
/// Stands in for the remote service when no `[usage]` endpoint is
/// configured, and doubles as the test harness backend.
#[derive(Debug, Default)]
pub struct LocalUsageLedger {
    prompts: AtomicU32,
    syntheses: AtomicU32,
}

impl LocalUsageLedger {
    pub fn new() -> Self {
        Self::default()
    }

    fn snapshot(&self) -> UsageSnapshot {
        UsageSnapshot {
            prompt_count: self.prompts.load(Ordering::SeqCst),
            synthesis_count: self.syntheses.load(Ordering::SeqCst),
        }
    }
}

#[async_trait]
impl UsageBackend for LocalUsageLedger {
    async fn get_llm_usage(&self, _user_id: &str) -> Result<UsageSnapshot, UsageError> {
        Ok(self.snapshot())
    }

    async fn update_llm_usage(
        &self,
        _user_id: &str,
        count: u32,
    ) -> Result<UsageSnapshot, UsageError> {
        self.prompts.fetch_add(count, Ordering::SeqCst);
        Ok(self.snapshot())
    }

    async fn update_synthesize_usage(&self, _user_id: &str) -> Result<UsageSnapshot, UsageError> {
        self.syntheses.fetch_add(1, Ordering::SeqCst);
        Ok(self.snapshot())
    }
}

/// Cached view of the user's usage counters plus the configured ceilings.
pub struct UsageTracker<B> {
    backend: B,
    user_id: String,
    limits: UsageLimits,
    cached: Mutex<UsageSnapshot>,
}

impl<B: UsageBackend> UsageTracker<B> {
    pub fn new(backend: B, user_id: impl Into<String>, limits: UsageLimits) -> Self {
        Self {
            backend,
            user_id: user_id.into(),
            limits,
            cached: Mutex::new(UsageSnapshot::default()),
        }
    }

    pub fn limits(&self) -> UsageLimits {
        self.limits
    }

    pub fn cached(&self) -> UsageSnapshot {
        *self.cached.lock().expect("usage cache poisoned")
    }

    fn store(&self, snapshot: UsageSnapshot) {
        *self.cached.lock().expect("usage cache poisoned") = snapshot;
    }

    /// Re-fetches the counters from the backend.
    pub async fn refresh(&self) -> Result<UsageSnapshot, UsageError> {
        let snapshot = self.backend.get_llm_usage(&self.user_id).await?;
        debug!(
            prompts = snapshot.prompt_count,
            syntheses = snapshot.synthesis_count,
            "Refreshed usage counters"
        );
        self.store(snapshot);
        Ok(snapshot)
    }

    /// Whether `count` further prompt units fit under the ceiling, judged
    /// against the last-known server value.
    pub fn prompt_budget_allows(&self, count: u32) -> bool {
        self.cached().prompt_count.saturating_add(count) <= self.limits.llm_prompt_limit
    }

    pub fn synthesis_budget_allows(&self) -> bool {
        self.cached().synthesis_count < self.limits.synthesize_limit
    }

    /// Records spent prompt units. A failed RPC is logged and swallowed:
    /// the dispatch it accounts for has already happened.
    pub async fn record_prompts(&self, count: u32) {
        match self.backend.update_llm_usage(&self.user_id, count).await {
            Ok(snapshot) => self.store(snapshot),
            Err(err) => warn!(%err, count, "failed to record prompt usage"),
        }
    }

    pub async fn record_synthesis(&self) {
        match self.backend.update_synthesize_usage(&self.user_id).await {
            Ok(snapshot) => self.store(snapshot),
            Err(err) => warn!(%err, "failed to record synthesis usage"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn tracker(limits: UsageLimits) -> UsageTracker<LocalUsageLedger> {
        UsageTracker::new(LocalUsageLedger::new(), "tester", limits)
    }

    #[tokio::test]
    async fn budget_is_judged_against_cached_counters() {
        let tracker = tracker(UsageLimits {
            llm_prompt_limit: 3,
            synthesize_limit: 1,
        });

        assert!(tracker.prompt_budget_allows(3));
        assert!(!tracker.prompt_budget_allows(4));

        tracker.record_prompts(2).await;
        assert!(tracker.prompt_budget_allows(1));
        assert!(!tracker.prompt_budget_allows(2));
    }

    #[tokio::test]
    async fn synthesis_budget_closes_at_the_limit() {
        let tracker = tracker(UsageLimits {
            llm_prompt_limit: 10,
            synthesize_limit: 1,
        });

        assert!(tracker.synthesis_budget_allows());
        tracker.record_synthesis().await;
        assert!(!tracker.synthesis_budget_allows());
    }

    #[tokio::test]
    async fn server_snapshot_overwrites_local_expectation() {
        struct DriftingBackend;

        #[async_trait]
        impl UsageBackend for DriftingBackend {
            async fn get_llm_usage(&self, _u: &str) -> Result<UsageSnapshot, UsageError> {
                Ok(UsageSnapshot {
                    prompt_count: 7,
                    synthesis_count: 0,
                })
            }

            async fn update_llm_usage(
                &self,
                _u: &str,
                _count: u32,
            ) -> Result<UsageSnapshot, UsageError> {
                // Server counted more than the client expected.
                Ok(UsageSnapshot {
                    prompt_count: 9,
                    synthesis_count: 0,
                })
            }

            async fn update_synthesize_usage(
                &self,
                _u: &str,
            ) -> Result<UsageSnapshot, UsageError> {
                Ok(UsageSnapshot::default())
            }
        }

        let tracker = UsageTracker::new(DriftingBackend, "tester", UsageLimits::default());
        tracker.refresh().await.unwrap();
        assert_eq!(tracker.cached().prompt_count, 7);

        tracker.record_prompts(1).await;
        assert_eq!(tracker.cached().prompt_count, 9);
    }
}
