//! PostgreSQL-backed rate limit store.
//!
//! Attempts live in `rate_limit_attempts`, one row per accepted attempt.
//! The check-and-record path runs in a single transaction holding a
//! transaction-scoped advisory lock on the (identifier, action) key, so two
//! concurrent submissions for the same email can never both observe room in
//! the window and both insert.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::{Pool, Postgres};
use tracing::{debug, info};

use nomee_core::{Error, RateLimitKey, RateLimitStore, Result, WindowOutcome};

/// PostgreSQL implementation of [`RateLimitStore`].
#[derive(Clone)]
pub struct PgRateLimitStore {
    pool: Pool<Postgres>,
}

impl PgRateLimitStore {
    pub fn new(pool: Pool<Postgres>) -> Self {
        Self { pool }
    }
}

/// Advisory lock key text; hashed server-side with `hashtextextended`.
fn lock_key(key: &RateLimitKey) -> String {
    format!("rate_limit:{}:{}", key.identifier.as_str(), key.action)
}

#[async_trait]
impl RateLimitStore for PgRateLimitStore {
    async fn count_in_window(&self, key: &RateLimitKey, since: DateTime<Utc>) -> Result<u32> {
        let count: i64 = sqlx::query_scalar(
            r#"
            SELECT COUNT(*)
            FROM rate_limit_attempts
            WHERE identifier_hash = $1 AND action = $2 AND attempted_at > $3
            "#,
        )
        .bind(key.identifier.as_str())
        .bind(&key.action)
        .bind(since)
        .fetch_one(&self.pool)
        .await
        .map_err(Error::Database)?;

        Ok(count.max(0) as u32)
    }

    async fn record_if_below(
        &self,
        key: &RateLimitKey,
        since: DateTime<Utc>,
        now: DateTime<Utc>,
        max: u32,
    ) -> Result<WindowOutcome> {
        let mut tx = self.pool.begin().await.map_err(Error::Database)?;

        // Serializes callers on this key until commit or rollback.
        sqlx::query("SELECT pg_advisory_xact_lock(hashtextextended($1, 0))")
            .bind(lock_key(key))
            .execute(&mut *tx)
            .await
            .map_err(Error::Database)?;

        // The insert runs against the same snapshot as the count, so
        // `window_attempts` never includes the row being added.
        let (recorded, prior, oldest): (bool, i64, Option<DateTime<Utc>>) = sqlx::query_as(
            r#"
            WITH window_attempts AS (
                SELECT attempted_at
                FROM rate_limit_attempts
                WHERE identifier_hash = $1 AND action = $2 AND attempted_at > $3
            ),
            inserted AS (
                INSERT INTO rate_limit_attempts (identifier_hash, action, attempted_at)
                SELECT $1, $2, $4::timestamptz
                WHERE (SELECT COUNT(*) FROM window_attempts) < $5::bigint
                RETURNING attempted_at
            )
            SELECT
                EXISTS (SELECT 1 FROM inserted),
                (SELECT COUNT(*) FROM window_attempts),
                (SELECT MIN(attempted_at) FROM window_attempts)
            "#,
        )
        .bind(key.identifier.as_str())
        .bind(&key.action)
        .bind(since)
        .bind(now)
        .bind(i64::from(max))
        .fetch_one(&mut *tx)
        .await
        .map_err(Error::Database)?;

        let count = prior.max(0) as u32;

        tx.commit().await.map_err(Error::Database)?;

        let outcome = if recorded {
            WindowOutcome {
                recorded,
                count: count + 1,
                oldest: Some(oldest.map_or(now, |o| o.min(now))),
            }
        } else {
            WindowOutcome {
                recorded,
                count,
                oldest,
            }
        };

        debug!(
            subsystem = "database",
            component = "rate_limits",
            op = "record_if_below",
            identifier = key.identifier.log_prefix(),
            action = %key.action,
            recorded,
            count = outcome.count,
            "Rate limit window checked"
        );
        Ok(outcome)
    }

    async fn purge_before(&self, cutoff: DateTime<Utc>) -> Result<u64> {
        let result = sqlx::query("DELETE FROM rate_limit_attempts WHERE attempted_at <= $1")
            .bind(cutoff)
            .execute(&self.pool)
            .await
            .map_err(Error::Database)?;

        let removed = result.rows_affected();
        if removed > 0 {
            info!(
                subsystem = "database",
                component = "rate_limits",
                op = "purge",
                removed,
                "Purged expired rate limit attempts"
            );
        }
        Ok(removed)
    }
}
