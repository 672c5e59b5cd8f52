//! Runtime configuration.
//!
//! Every value has a default in [`crate::defaults`] and can be overridden
//! through environment variables. Unparsable values keep the default and
//! log a warning.
//!
//! | Variable | Default |
//! |----------|---------|
//! | `NOMEE_EVIDENCE_FLOOR` | 3 |
//! | `NOMEE_STRENGTH_CORE` | 3 |
//! | `NOMEE_STRENGTH_STRONG` | 2 |
//! | `NOMEE_CONSISTENCY_MIN_CONTRIBUTORS` | 2 |
//! | `NOMEE_SUBMIT_LIMIT` | 3 |
//! | `NOMEE_SUBMIT_WINDOW_SECS` | 86400 |
//! | `NOMEE_RATE_LIMIT_FAIL_OPEN` | true |
//! | `NOMEE_VOCABULARY_PATH` | (built-in vocabulary) |
//! | `DATABASE_URL` | (in-memory rate limit store) |

use std::path::PathBuf;
use std::str::FromStr;

use chrono::Duration;
use serde::{Deserialize, Serialize};
use tracing::warn;

use crate::defaults;
use crate::error::{Error, Result};
use crate::models::Strength;

// =============================================================================
// SIGNAL BUILDER
// =============================================================================

/// Limits and thresholds for the aggregate signal builder.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SignalConfig {
    /// Total contributions required before any panel is built.
    pub evidence_floor: usize,
    pub top_limit: usize,
    pub consistent_limit: usize,
    pub impact_limit: usize,
    /// Distinct contributors required for a "most consistent" label.
    pub consistency_min_contributors: usize,
    /// Count at or above which a signal is Core.
    pub strength_core_min: usize,
    /// Count at or above which a signal is Strong.
    pub strength_strong_min: usize,
    pub excerpt_chars: usize,
    pub snippet_before: usize,
    pub snippet_after: usize,
}

impl Default for SignalConfig {
    fn default() -> Self {
        Self {
            evidence_floor: defaults::SIGNAL_EVIDENCE_FLOOR,
            top_limit: defaults::SIGNAL_TOP_LIMIT,
            consistent_limit: defaults::SIGNAL_CONSISTENT_LIMIT,
            impact_limit: defaults::SIGNAL_IMPACT_LIMIT,
            consistency_min_contributors: defaults::SIGNAL_CONSISTENCY_MIN_CONTRIBUTORS,
            strength_core_min: defaults::STRENGTH_CORE_MIN,
            strength_strong_min: defaults::STRENGTH_STRONG_MIN,
            excerpt_chars: defaults::SIGNAL_EXCERPT_CHARS,
            snippet_before: defaults::SIGNAL_SNIPPET_BEFORE,
            snippet_after: defaults::SIGNAL_SNIPPET_AFTER,
        }
    }
}

impl SignalConfig {
    pub fn from_env() -> Self {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Build from an arbitrary key lookup (environment, test map).
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let base = Self::default();
        Self {
            evidence_floor: parse_or(&lookup, "NOMEE_EVIDENCE_FLOOR", base.evidence_floor),
            strength_core_min: parse_or(&lookup, "NOMEE_STRENGTH_CORE", base.strength_core_min),
            strength_strong_min: parse_or(
                &lookup,
                "NOMEE_STRENGTH_STRONG",
                base.strength_strong_min,
            ),
            consistency_min_contributors: parse_or(
                &lookup,
                "NOMEE_CONSISTENCY_MIN_CONTRIBUTORS",
                base.consistency_min_contributors,
            ),
            ..base
        }
    }

    /// Bucket a count: Core at `strength_core_min`, Strong at
    /// `strength_strong_min`, Emerging below.
    pub fn strength(&self, count: usize) -> Strength {
        if count >= self.strength_core_min {
            Strength::Core
        } else if count >= self.strength_strong_min {
            Strength::Strong
        } else {
            Strength::Emerging
        }
    }

    pub fn validate(&self) -> Result<()> {
        if self.strength_strong_min > self.strength_core_min {
            return Err(Error::Config(format!(
                "strong threshold {} exceeds core threshold {}",
                self.strength_strong_min, self.strength_core_min
            )));
        }
        if self.consistency_min_contributors == 0 {
            return Err(Error::Config(
                "consistency gate must require at least one contributor".to_string(),
            ));
        }
        Ok(())
    }
}

// =============================================================================
// RATE LIMITING
// =============================================================================

/// What the limiter does when its backing store cannot answer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FailurePolicy {
    /// Allow the attempt; the limiter is advisory while the store is down.
    FailOpen,
    /// Deny the attempt until the store recovers.
    FailClosed,
}

impl std::fmt::Display for FailurePolicy {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::FailOpen => write!(f, "fail_open"),
            Self::FailClosed => write!(f, "fail_closed"),
        }
    }
}

/// Attempt budget for one rate-limited action.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RateLimitPolicy {
    pub max_requests: u32,
    pub window: Duration,
    pub on_store_error: FailurePolicy,
}

impl RateLimitPolicy {
    pub fn new(max_requests: u32, window: Duration) -> Self {
        Self {
            max_requests,
            window,
            on_store_error: FailurePolicy::FailOpen,
        }
    }

    pub fn with_failure_policy(mut self, policy: FailurePolicy) -> Self {
        self.on_store_error = policy;
        self
    }

    /// Testimonial submissions: 3 per 24 hours per hashed email, failing
    /// open when the store is unavailable.
    pub fn submission() -> Self {
        Self::new(
            defaults::SUBMISSION_MAX_REQUESTS,
            Duration::seconds(defaults::SUBMISSION_WINDOW_SECS),
        )
    }

    pub fn from_env() -> Self {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let base = Self::submission();
        let max_requests = parse_or(&lookup, "NOMEE_SUBMIT_LIMIT", base.max_requests);
        let window_secs = parse_or(
            &lookup,
            "NOMEE_SUBMIT_WINDOW_SECS",
            defaults::SUBMISSION_WINDOW_SECS,
        );
        let window = Duration::try_seconds(window_secs).unwrap_or_else(|| {
            warn!(
                key = "NOMEE_SUBMIT_WINDOW_SECS",
                value = window_secs,
                "Window out of range, using default"
            );
            base.window
        });
        let fail_open = parse_bool_or(&lookup, "NOMEE_RATE_LIMIT_FAIL_OPEN", true);

        Self {
            max_requests,
            window,
            on_store_error: if fail_open {
                FailurePolicy::FailOpen
            } else {
                FailurePolicy::FailClosed
            },
        }
    }

    pub fn validate(&self) -> Result<()> {
        if self.max_requests == 0 {
            return Err(Error::Config("rate limit must allow at least one request".into()));
        }
        if self.window <= Duration::zero() {
            return Err(Error::Config("rate limit window must be positive".into()));
        }
        if self.window > Duration::seconds(defaults::MAX_RATE_LIMIT_WINDOW_SECS) {
            return Err(Error::Config(format!(
                "rate limit window exceeds {} seconds",
                defaults::MAX_RATE_LIMIT_WINDOW_SECS
            )));
        }
        Ok(())
    }
}

impl Default for RateLimitPolicy {
    fn default() -> Self {
        Self::submission()
    }
}

// =============================================================================
// APPLICATION
// =============================================================================

/// Everything the binary needs, gathered from the environment.
#[derive(Debug, Clone)]
pub struct AppConfig {
    pub signals: SignalConfig,
    pub rate_limit: RateLimitPolicy,
    pub vocabulary_path: Option<PathBuf>,
    pub database_url: Option<String>,
}

impl AppConfig {
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self> {
        let non_empty = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());
        let config = Self {
            signals: SignalConfig::from_lookup(&lookup),
            rate_limit: RateLimitPolicy::from_lookup(&lookup),
            vocabulary_path: non_empty(defaults::ENV_VOCABULARY_PATH).map(PathBuf::from),
            database_url: non_empty(defaults::ENV_DATABASE_URL),
        };
        config.signals.validate()?;
        config.rate_limit.validate()?;
        Ok(config)
    }
}

fn parse_or<T: FromStr + Copy>(lookup: impl Fn(&str) -> Option<String>, key: &str, default: T) -> T {
    match lookup(key) {
        None => default,
        Some(raw) => raw.trim().parse().unwrap_or_else(|_| {
            warn!(key, value = %raw, "Unparsable configuration value, using default");
            default
        }),
    }
}

/// Recognizes "true", "1", "yes", "on" (case-insensitive) as true and
/// "false", "0", "no", "off" as false.
fn parse_bool_or(lookup: impl Fn(&str) -> Option<String>, key: &str, default: bool) -> bool {
    let Some(raw) = lookup(key) else {
        return default;
    };
    match raw.trim().to_lowercase().as_str() {
        "true" | "1" | "yes" | "on" => true,
        "false" | "0" | "no" | "off" => false,
        _ => {
            warn!(key, value = %raw, "Unparsable boolean, using default");
            default
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn lookup(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key| map.get(key).cloned()
    }

    #[test]
    fn test_signal_defaults() {
        let config = SignalConfig::default();
        assert_eq!(config.evidence_floor, 3);
        assert_eq!(config.top_limit, 6);
        assert_eq!(config.consistent_limit, 4);
        assert_eq!(config.impact_limit, 4);
        assert_eq!(config.excerpt_chars, 80);
    }

    #[test]
    fn test_strength_buckets() {
        let config = SignalConfig::default();
        assert_eq!(config.strength(0), Strength::Emerging);
        assert_eq!(config.strength(1), Strength::Emerging);
        assert_eq!(config.strength(2), Strength::Strong);
        assert_eq!(config.strength(3), Strength::Core);
        assert_eq!(config.strength(40), Strength::Core);
    }

    #[test]
    fn test_signal_config_from_lookup() {
        let config = SignalConfig::from_lookup(lookup(&[
            ("NOMEE_EVIDENCE_FLOOR", "5"),
            ("NOMEE_STRENGTH_CORE", "not-a-number"),
        ]));
        assert_eq!(config.evidence_floor, 5);
        assert_eq!(config.strength_core_min, 3);
    }

    #[test]
    fn test_signal_config_rejects_inverted_thresholds() {
        let config = SignalConfig {
            strength_core_min: 2,
            strength_strong_min: 4,
            ..Default::default()
        };
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_submission_policy() {
        let policy = RateLimitPolicy::submission();
        assert_eq!(policy.max_requests, 3);
        assert_eq!(policy.window, Duration::hours(24));
        assert_eq!(policy.on_store_error, FailurePolicy::FailOpen);
    }

    #[test]
    fn test_rate_limit_policy_from_lookup() {
        let policy = RateLimitPolicy::from_lookup(lookup(&[
            ("NOMEE_SUBMIT_LIMIT", "5"),
            ("NOMEE_SUBMIT_WINDOW_SECS", "60"),
            ("NOMEE_RATE_LIMIT_FAIL_OPEN", "off"),
        ]));
        assert_eq!(policy.max_requests, 5);
        assert_eq!(policy.window, Duration::seconds(60));
        assert_eq!(policy.on_store_error, FailurePolicy::FailClosed);
    }

    #[test]
    fn test_rate_limit_policy_validation() {
        assert!(RateLimitPolicy::new(0, Duration::hours(1)).validate().is_err());
        assert!(RateLimitPolicy::new(1, Duration::zero()).validate().is_err());
        assert!(RateLimitPolicy::submission().validate().is_ok());
        assert!(RateLimitPolicy::new(1, Duration::days(365)).validate().is_ok());
        assert!(RateLimitPolicy::new(1, Duration::days(366)).validate().is_err());
    }

    #[test]
    fn test_window_beyond_duration_range_keeps_default() {
        let policy = RateLimitPolicy::from_lookup(lookup(&[(
            "NOMEE_SUBMIT_WINDOW_SECS",
            "9223372036854775807",
        )]));
        assert_eq!(policy.window, Duration::hours(24));
    }

    #[test]
    fn test_app_config_rejects_oversized_window() {
        let err = AppConfig::from_lookup(lookup(&[("NOMEE_SUBMIT_WINDOW_SECS", "100000000000000")]))
            .unwrap_err();
        assert!(matches!(err, Error::Config(_)));
    }

    #[test]
    fn test_app_config_fail_closed_from_lookup() {
        let config =
            AppConfig::from_lookup(lookup(&[("NOMEE_RATE_LIMIT_FAIL_OPEN", "false")])).unwrap();
        assert_eq!(config.rate_limit.on_store_error, FailurePolicy::FailClosed);

        let config = AppConfig::from_lookup(lookup(&[])).unwrap();
        assert_eq!(config.rate_limit.on_store_error, FailurePolicy::FailOpen);
    }

    #[test]
    fn test_app_config_from_lookup() {
        let config = AppConfig::from_lookup(lookup(&[
            ("NOMEE_VOCABULARY_PATH", "/etc/nomee/vocab.yaml"),
            ("DATABASE_URL", "  "),
        ]))
        .unwrap();
        assert_eq!(
            config.vocabulary_path,
            Some(PathBuf::from("/etc/nomee/vocab.yaml"))
        );
        assert!(config.database_url.is_none());
    }

    #[test]
    fn test_app_config_rejects_zero_limit() {
        let err = AppConfig::from_lookup(lookup(&[("NOMEE_SUBMIT_LIMIT", "0")])).unwrap_err();
        assert!(matches!(err, Error::Config(_)));
    }
}
