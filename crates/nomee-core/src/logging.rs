//! Structured logging schema and field name constants for Nomee.
//!
//! All crates use these constants for consistent structured logging fields,
//! so log aggregation can query by the same field names across subsystems.
//!
//! ## Log Level Contract
//!
//! | Level | Usage |
//! |-------|-------|
//! | ERROR | Degraded service, requires operator attention |
//! | WARN  | Recoverable issue, automatic fallback applied |
//! | INFO  | Lifecycle events (startup, migrations), operation completions |
//! | DEBUG | Decision points, intermediate values, config choices |
//! | TRACE | Per-item iteration, high-volume data (matches, spans) |

// ─── Identity fields ───────────────────────────────────────────────────────

/// Subsystem originating the log event.
/// Values: "signals", "limiter", "database", "cli"
pub const SUBSYSTEM: &str = "subsystem";

/// Component within a subsystem.
/// Examples: "extractor", "highlighter", "signal_builder", "pool"
pub const COMPONENT: &str = "component";

/// Logical operation name.
/// Examples: "extract", "highlight", "build", "check"
pub const OPERATION: &str = "op";

// ─── Entity fields ─────────────────────────────────────────────────────────

/// Rate-limited action name.
pub const ACTION: &str = "action";

/// Truncated identifier hash (never the full hash, never an email).
pub const IDENTIFIER: &str = "identifier";

/// Tier of an extracted phrase or highlight.
pub const TIER: &str = "tier";

// ─── Measurement fields ────────────────────────────────────────────────────

/// Wall-clock duration in milliseconds.
pub const DURATION_MS: &str = "duration_ms";

/// Number of results returned by an operation.
pub const RESULT_COUNT: &str = "result_count";

/// Number of input items (contributions, patterns, cards).
pub const INPUT_COUNT: &str = "input_count";

/// Byte length of an analysed text.
pub const TEXT_LEN: &str = "text_len";

// ─── Outcome fields ────────────────────────────────────────────────────────

/// Whether a rate-limited attempt was allowed.
pub const ALLOWED: &str = "allowed";

/// Boolean success/failure indicator.
pub const SUCCESS: &str = "success";

/// Error message when an operation fails.
pub const ERROR_MSG: &str = "error";

/// Number of leading hex characters of an identifier hash that may be logged.
pub const IDENTIFIER_LOG_PREFIX: usize = 8;
