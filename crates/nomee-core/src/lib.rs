//! # nomee-core
//!
//! Core types, configuration, and abstractions for Nomee.
//!
//! This crate provides the data structures shared by the text-analysis and
//! storage crates, the tunable vocabulary, the input sanitization boundary,
//! and the submission rate limiter with its store abstraction.

pub mod config;
pub mod defaults;
pub mod error;
pub mod identity;
pub mod input;
pub mod logging;
pub mod models;
pub mod rate_limit;
pub mod traits;
pub mod vocabulary;

// Re-export commonly used types at crate root
pub use config::{AppConfig, FailurePolicy, RateLimitPolicy, SignalConfig};
pub use error::{Error, Result};
pub use identity::{normalize_email, IdentifierHash};
pub use input::{sanitize_text, sanitize_traits};
pub use models::*;
pub use rate_limit::{MemoryRateLimitStore, RateLimitDecision, RateLimiter};
pub use traits::*;
pub use vocabulary::{ImpactTerm, Vocabulary, VocabularyTier};
