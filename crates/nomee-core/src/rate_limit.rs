//! Sliding-window submission rate limiting.
//!
//! The limiter counts attempts per (hashed identifier, action) inside a
//! trailing window. Counting and recording happen in a single atomic store
//! call, so concurrent submissions from one identifier cannot slip past
//! the limit.

use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};
use tokio::sync::Mutex;
use tracing::{debug, warn};

use crate::config::{FailurePolicy, RateLimitPolicy};
use crate::error::{Error, Result};
use crate::identity::IdentifierHash;
use crate::traits::{RateLimitKey, RateLimitStore, WindowOutcome};

/// Outcome of a rate limit check.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct RateLimitDecision {
    pub allowed: bool,
    /// When the oldest attempt in the window expires.
    pub reset_at: DateTime<Utc>,
    /// Attempts left in the current window.
    pub remaining: u32,
    /// The store failed and the failure policy decided the outcome.
    pub degraded: bool,
}

/// Rate limiter over an injected store.
#[derive(Clone)]
pub struct RateLimiter {
    store: Arc<dyn RateLimitStore>,
}

impl RateLimiter {
    pub fn new(store: Arc<dyn RateLimitStore>) -> Self {
        Self { store }
    }

    /// Limiter backed by a fresh in-memory store.
    pub fn in_memory() -> Self {
        Self::new(Arc::new(MemoryRateLimitStore::new()))
    }

    pub fn store(&self) -> &Arc<dyn RateLimitStore> {
        &self.store
    }

    /// Check and, when allowed, record an attempt at the current time.
    pub async fn check(
        &self,
        identifier: &IdentifierHash,
        action: &str,
        policy: &RateLimitPolicy,
    ) -> RateLimitDecision {
        self.check_at(identifier, action, policy, Utc::now()).await
    }

    /// Check and record as of `now`.
    ///
    /// Store errors never propagate: the policy's [`FailurePolicy`] turns
    /// them into an allow or a deny with `degraded` set.
    pub async fn check_at(
        &self,
        identifier: &IdentifierHash,
        action: &str,
        policy: &RateLimitPolicy,
        now: DateTime<Utc>,
    ) -> RateLimitDecision {
        let key = RateLimitKey::new(identifier.clone(), action);
        let Some(since) = now.checked_sub_signed(policy.window) else {
            return self.on_failure(
                identifier,
                action,
                policy,
                now,
                &Error::Config(format!("window {} out of range", policy.window)),
            );
        };

        match self
            .store
            .record_if_below(&key, since, now, policy.max_requests)
            .await
        {
            Ok(outcome) => {
                let reset_at = window_end(outcome.oldest.unwrap_or(now), policy.window);
                let decision = RateLimitDecision {
                    allowed: outcome.recorded,
                    reset_at,
                    remaining: policy.max_requests.saturating_sub(outcome.count),
                    degraded: false,
                };
                debug!(
                    subsystem = "limiter",
                    component = "rate_limiter",
                    op = "check",
                    action,
                    identifier = identifier.log_prefix(),
                    allowed = decision.allowed,
                    count = outcome.count,
                    max = policy.max_requests,
                    "Rate limit checked"
                );
                decision
            }
            Err(e) => self.on_failure(identifier, action, policy, now, &e),
        }
    }

    fn on_failure(
        &self,
        identifier: &IdentifierHash,
        action: &str,
        policy: &RateLimitPolicy,
        now: DateTime<Utc>,
        error: &Error,
    ) -> RateLimitDecision {
        let allowed = policy.on_store_error == FailurePolicy::FailOpen;
        warn!(
            subsystem = "limiter",
            component = "rate_limiter",
            op = "check",
            action,
            identifier = identifier.log_prefix(),
            policy = %policy.on_store_error,
            allowed,
            error = %error,
            "Rate limit check failed, applying failure policy"
        );
        RateLimitDecision {
            allowed,
            reset_at: window_end(now, policy.window),
            remaining: 0,
            degraded: true,
        }
    }

    /// Attempts currently inside the window, without recording one.
    pub async fn peek(
        &self,
        identifier: &IdentifierHash,
        action: &str,
        policy: &RateLimitPolicy,
        now: DateTime<Utc>,
    ) -> Result<u32> {
        let key = RateLimitKey::new(identifier.clone(), action);
        let since = now
            .checked_sub_signed(policy.window)
            .ok_or_else(|| Error::Config(format!("window {} out of range", policy.window)))?;
        self.store.count_in_window(&key, since).await
    }
}

/// End of a window starting at `start`, saturating at the latest
/// representable instant.
fn window_end(start: DateTime<Utc>, window: Duration) -> DateTime<Utc> {
    start
        .checked_add_signed(window)
        .unwrap_or(DateTime::<Utc>::MAX_UTC)
}

/// In-memory store. The window check and the insert happen under one lock.
#[derive(Debug, Default)]
pub struct MemoryRateLimitStore {
    attempts: Mutex<HashMap<RateLimitKey, Vec<DateTime<Utc>>>>,
}

impl MemoryRateLimitStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl RateLimitStore for MemoryRateLimitStore {
    async fn count_in_window(&self, key: &RateLimitKey, since: DateTime<Utc>) -> Result<u32> {
        let attempts = self.attempts.lock().await;
        let count = attempts
            .get(key)
            .map(|ts| ts.iter().filter(|t| **t > since).count())
            .unwrap_or(0);
        Ok(count as u32)
    }

    async fn record_if_below(
        &self,
        key: &RateLimitKey,
        since: DateTime<Utc>,
        now: DateTime<Utc>,
        max: u32,
    ) -> Result<WindowOutcome> {
        let mut attempts = self.attempts.lock().await;
        let entry = attempts.entry(key.clone()).or_default();
        entry.retain(|t| *t > since);

        let recorded = (entry.len() as u32) < max;
        if recorded {
            entry.push(now);
        }

        Ok(WindowOutcome {
            recorded,
            count: entry.len() as u32,
            oldest: entry.iter().copied().min(),
        })
    }

    async fn purge_before(&self, cutoff: DateTime<Utc>) -> Result<u64> {
        let mut attempts = self.attempts.lock().await;
        let mut removed = 0u64;
        for timestamps in attempts.values_mut() {
            let before = timestamps.len();
            timestamps.retain(|t| *t > cutoff);
            removed += (before - timestamps.len()) as u64;
        }
        attempts.retain(|_, ts| !ts.is_empty());
        Ok(removed)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    struct UnavailableStore;

    #[async_trait]
    impl RateLimitStore for UnavailableStore {
        async fn count_in_window(&self, _: &RateLimitKey, _: DateTime<Utc>) -> Result<u32> {
            Err(Error::Store("offline".to_string()))
        }

        async fn record_if_below(
            &self,
            _: &RateLimitKey,
            _: DateTime<Utc>,
            _: DateTime<Utc>,
            _: u32,
        ) -> Result<WindowOutcome> {
            Err(Error::Store("offline".to_string()))
        }

        async fn purge_before(&self, _: DateTime<Utc>) -> Result<u64> {
            Err(Error::Store("offline".to_string()))
        }
    }

    fn t0() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2026, 3, 1, 9, 0, 0).unwrap()
    }

    #[tokio::test]
    async fn test_three_allowed_then_denied_with_reset() {
        let limiter = RateLimiter::in_memory();
        let id = IdentifierHash::from_email("maya@example.com");
        let policy = RateLimitPolicy::new(3, Duration::milliseconds(86_400_000));

        for (i, offset) in [0, 10, 20].into_iter().enumerate() {
            let decision = limiter
                .check_at(&id, "submit", &policy, t0() + Duration::minutes(offset))
                .await;
            assert!(decision.allowed, "attempt {} should be allowed", i + 1);
            assert_eq!(decision.remaining, 2 - i as u32);
        }

        let fourth = limiter
            .check_at(&id, "submit", &policy, t0() + Duration::minutes(30))
            .await;
        assert!(!fourth.allowed);
        assert_eq!(fourth.remaining, 0);
        assert_eq!(fourth.reset_at, t0() + Duration::hours(24));
        assert!(!fourth.degraded);
    }

    #[tokio::test]
    async fn test_window_slides() {
        let limiter = RateLimiter::in_memory();
        let id = IdentifierHash::from_email("a@b.c");
        let policy = RateLimitPolicy::new(1, Duration::hours(1));

        assert!(limiter.check_at(&id, "submit", &policy, t0()).await.allowed);
        assert!(
            !limiter
                .check_at(&id, "submit", &policy, t0() + Duration::minutes(59))
                .await
                .allowed
        );
        // The first attempt expires exactly one window later.
        assert!(
            limiter
                .check_at(&id, "submit", &policy, t0() + Duration::hours(1))
                .await
                .allowed
        );
    }

    #[tokio::test]
    async fn test_keys_are_isolated_by_identifier_and_action() {
        let limiter = RateLimiter::in_memory();
        let a = IdentifierHash::from_email("a@b.c");
        let b = IdentifierHash::from_email("b@b.c");
        let policy = RateLimitPolicy::new(1, Duration::hours(1));

        assert!(limiter.check_at(&a, "submit", &policy, t0()).await.allowed);
        assert!(limiter.check_at(&b, "submit", &policy, t0()).await.allowed);
        assert!(limiter.check_at(&a, "upload", &policy, t0()).await.allowed);
        assert!(!limiter.check_at(&a, "submit", &policy, t0()).await.allowed);
    }

    #[tokio::test]
    async fn test_denied_attempts_are_not_recorded() {
        let limiter = RateLimiter::in_memory();
        let id = IdentifierHash::from_email("a@b.c");
        let policy = RateLimitPolicy::new(2, Duration::hours(1));

        for _ in 0..5 {
            limiter.check_at(&id, "submit", &policy, t0()).await;
        }
        let count = limiter.peek(&id, "submit", &policy, t0()).await.unwrap();
        assert_eq!(count, 2);
    }

    #[tokio::test]
    async fn test_concurrent_checks_never_exceed_limit() {
        let limiter = RateLimiter::in_memory();
        let id = IdentifierHash::from_email("burst@example.com");
        let policy = RateLimitPolicy::submission();

        let checks = (0..20).map(|_| limiter.check_at(&id, "submit", &policy, t0()));
        let decisions = futures::future::join_all(checks).await;

        let allowed = decisions.iter().filter(|d| d.allowed).count();
        assert_eq!(allowed, 3);
    }

    #[tokio::test]
    async fn test_fail_open_on_store_error() {
        let limiter = RateLimiter::new(Arc::new(UnavailableStore));
        let id = IdentifierHash::from_email("a@b.c");
        let policy = RateLimitPolicy::submission();

        let decision = limiter.check_at(&id, "submit", &policy, t0()).await;
        assert!(decision.allowed);
        assert!(decision.degraded);
    }

    #[tokio::test]
    async fn test_fail_closed_on_store_error() {
        let limiter = RateLimiter::new(Arc::new(UnavailableStore));
        let id = IdentifierHash::from_email("a@b.c");
        let policy = RateLimitPolicy::submission().with_failure_policy(FailurePolicy::FailClosed);

        let decision = limiter.check_at(&id, "submit", &policy, t0()).await;
        assert!(!decision.allowed);
        assert!(decision.degraded);
        assert_eq!(decision.reset_at, t0() + policy.window);
    }

    #[tokio::test]
    async fn test_window_past_calendar_range_applies_failure_policy() {
        let limiter = RateLimiter::in_memory();
        let id = IdentifierHash::from_email("a@b.c");
        let open = RateLimitPolicy::new(3, Duration::seconds(100_000_000_000_000));
        let closed = open.clone().with_failure_policy(FailurePolicy::FailClosed);

        let decision = limiter.check_at(&id, "submit", &open, t0()).await;
        assert!(decision.allowed);
        assert!(decision.degraded);
        assert_eq!(decision.reset_at, DateTime::<Utc>::MAX_UTC);

        let decision = limiter.check_at(&id, "submit", &closed, t0()).await;
        assert!(!decision.allowed);
        assert!(decision.degraded);
        assert!(limiter.peek(&id, "submit", &open, t0()).await.is_err());
    }

    #[tokio::test]
    async fn test_fail_closed_policy_from_config() {
        let config = crate::config::AppConfig::from_lookup(|key| {
            (key == "NOMEE_RATE_LIMIT_FAIL_OPEN").then(|| "false".to_string())
        })
        .unwrap();
        let limiter = RateLimiter::new(Arc::new(UnavailableStore));
        let id = IdentifierHash::from_email("a@b.c");

        let decision = limiter.check_at(&id, "submit", &config.rate_limit, t0()).await;
        assert!(!decision.allowed);
        assert!(decision.degraded);
    }

    #[tokio::test]
    async fn test_memory_store_drops_expired_attempts() {
        let store = MemoryRateLimitStore::new();
        let key = RateLimitKey::new(IdentifierHash::from_email("a@b.c"), "submit");
        let window = Duration::hours(1);

        for hour in 0..50 {
            let now = t0() + Duration::hours(hour);
            let outcome = store.record_if_below(&key, now - window, now, 3).await.unwrap();
            assert!(outcome.recorded);
            assert_eq!(outcome.count, 1);
            assert_eq!(outcome.oldest, Some(now));
        }

        let attempts = store.attempts.lock().await;
        assert_eq!(attempts.get(&key).map(Vec::len), Some(1));
    }

    #[tokio::test]
    async fn test_purge_before_removes_expired() {
        let store = MemoryRateLimitStore::new();
        let key = RateLimitKey::new(IdentifierHash::from_email("a@b.c"), "submit");
        let since = t0() - Duration::days(7);
        store.record_if_below(&key, since, t0(), 10).await.unwrap();
        store
            .record_if_below(&key, since, t0() + Duration::days(2), 10)
            .await
            .unwrap();

        let removed = store.purge_before(t0() + Duration::days(1)).await.unwrap();
        assert_eq!(removed, 1);
        assert_eq!(store.count_in_window(&key, since).await.unwrap(), 1);
    }
}
