//! Core traits for Nomee abstractions.
//!
//! These traits define the seams where storage is pluggable, so the
//! limiter can run against PostgreSQL in production and an in-memory store
//! in tests.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::error::Result;
use crate::identity::IdentifierHash;

// =============================================================================
// RATE LIMIT STORE
// =============================================================================

/// Keyspace entry for a rate-limited action.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct RateLimitKey {
    pub identifier: IdentifierHash,
    pub action: String,
}

impl RateLimitKey {
    pub fn new(identifier: IdentifierHash, action: impl Into<String>) -> Self {
        Self {
            identifier,
            action: action.into(),
        }
    }
}

/// Result of an atomic check-and-record.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct WindowOutcome {
    /// Whether a new attempt was recorded.
    pub recorded: bool,
    /// Attempts inside the window after this call.
    pub count: u32,
    /// Oldest attempt inside the window after this call.
    pub oldest: Option<DateTime<Utc>>,
}

/// Storage for timestamped attempts keyed by (identifier hash, action).
///
/// `record_if_below` must be atomic with respect to concurrent callers on
/// the same key: counting the window and inserting the new attempt happen
/// as one step, so at most `max` attempts ever land inside a window.
#[async_trait]
pub trait RateLimitStore: Send + Sync {
    /// Count attempts with a timestamp strictly after `since`.
    async fn count_in_window(&self, key: &RateLimitKey, since: DateTime<Utc>) -> Result<u32>;

    /// Record an attempt at `now` if fewer than `max` attempts fall
    /// strictly after `since`.
    async fn record_if_below(
        &self,
        key: &RateLimitKey,
        since: DateTime<Utc>,
        now: DateTime<Utc>,
        max: u32,
    ) -> Result<WindowOutcome>;

    /// Drop attempts at or before `cutoff`. Returns how many were removed.
    async fn purge_before(&self, cutoff: DateTime<Utc>) -> Result<u64>;
}
