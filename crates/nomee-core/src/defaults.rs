//! Centralized default constants for Nomee.
//!
//! **This module is the single source of truth** for shared default values.
//! Thresholds here are product-tuned heuristics; anything a deployment may
//! want to change is also exposed through [`crate::config`].

// =============================================================================
// EXTRACTOR
// =============================================================================

/// Minimum number of highlight patterns returned for any text.
pub const EXTRACT_MIN_PATTERNS: usize = 2;

/// Maximum number of highlight patterns returned for any text.
pub const EXTRACT_MAX_PATTERNS: usize = 4;

/// Only the first N contributor-selected traits are considered.
pub const EXTRACT_TRAIT_CANDIDATES: usize = 2;

/// Traits longer than this many words are never used as theme patterns.
pub const EXTRACT_TRAIT_MAX_WORDS: usize = 2;

/// Working-style matches inside the first N words of a text are ignored.
pub const EXTRACT_OPENER_WORDS: usize = 3;

/// At most this many contextual impact verbs are added.
pub const EXTRACT_MAX_CONTEXTUAL: usize = 1;

/// Frequency recorded for a freshly extracted pattern.
pub const PATTERN_FREQUENCY: u32 = 1;

// =============================================================================
// HIGHLIGHTER
// =============================================================================

/// Maximum marker (trait-origin) highlights per text.
pub const HIGHLIGHT_MAX_MARKERS: usize = 5;

/// Maximum impact highlights per text.
pub const HIGHLIGHT_MAX_IMPACT: usize = 3;

/// Default caller-supplied highlight budget.
pub const HIGHLIGHT_DEFAULT_BUDGET: usize = 8;

/// Maximum number of display pills for a single testimonial.
pub const PILL_COUNT: usize = 3;

// =============================================================================
// SIGNAL BUILDER
// =============================================================================

/// Minimum total contributions before any signal panel is shown.
pub const SIGNAL_EVIDENCE_FLOOR: usize = 3;

/// Number of entries in the Top Signals view.
pub const SIGNAL_TOP_LIMIT: usize = 6;

/// Number of entries in the Most Consistent view.
pub const SIGNAL_CONSISTENT_LIMIT: usize = 4;

/// Number of entries in the Proof of Impact view.
pub const SIGNAL_IMPACT_LIMIT: usize = 4;

/// Distinct contributors required before a label counts as consistent.
pub const SIGNAL_CONSISTENCY_MIN_CONTRIBUTORS: usize = 2;

/// Count at or above which a signal is "Core".
pub const STRENGTH_CORE_MIN: usize = 3;

/// Count at or above which a signal is "Strong" (below Core).
pub const STRENGTH_STRONG_MIN: usize = 2;

/// Example excerpts are truncated to this many characters.
pub const SIGNAL_EXCERPT_CHARS: usize = 80;

/// Characters kept before an impact word in its snippet.
pub const SIGNAL_SNIPPET_BEFORE: usize = 20;

/// Characters kept after an impact word in its snippet.
pub const SIGNAL_SNIPPET_AFTER: usize = 40;

/// Ellipsis appended to truncated excerpts and snippets.
pub const ELLIPSIS: &str = "...";

// =============================================================================
// RATE LIMITING
// =============================================================================

/// Action name used for testimonial submissions.
pub const SUBMISSION_ACTION: &str = "submit_contribution";

/// Submissions allowed per window per hashed email.
pub const SUBMISSION_MAX_REQUESTS: u32 = 3;

/// Submission window in seconds (24 hours).
pub const SUBMISSION_WINDOW_SECS: i64 = 24 * 60 * 60;

/// Longest accepted rate limit window in seconds (365 days).
pub const MAX_RATE_LIMIT_WINDOW_SECS: i64 = 365 * 24 * 60 * 60;

// =============================================================================
// ENVIRONMENT
// =============================================================================

/// Environment variable for an external vocabulary file.
pub const ENV_VOCABULARY_PATH: &str = "NOMEE_VOCABULARY_PATH";

/// Environment variable for the PostgreSQL connection string.
pub const ENV_DATABASE_URL: &str = "DATABASE_URL";

// =============================================================================
// VOCABULARY
// =============================================================================

/// Two-word working-style phrases, matched as substrings.
pub const IMPACTFUL_PHRASES: &[&str] = &[
    "calm confidence",
    "detail oriented",
    "clear communicator",
    "strategic thinker",
    "problem solver",
    "quick learner",
    "deep expertise",
    "steady hand",
    "high standards",
    "strong ownership",
    "creative thinking",
    "thoughtful feedback",
];

/// Single working-style adjectives, matched on word boundaries.
pub const IMPACTFUL_ADJECTIVES: &[&str] = &[
    "strategic",
    "empathetic",
    "reliable",
    "thoughtful",
    "supportive",
    "proactive",
    "organized",
    "creative",
    "responsive",
    "insightful",
    "patient",
    "collaborative",
    "dependable",
    "resourceful",
    "decisive",
    "adaptable",
    "meticulous",
    "innovative",
    "knowledgeable",
    "professional",
    "efficient",
    "transparent",
    "genuine",
    "humble",
    "generous",
    "calm",
    "focused",
    "diligent",
    "articulate",
    "approachable",
];

/// Impact verbs eligible for the contextual extractor tier.
pub const CONTEXTUAL_VERBS: &[&str] = &[
    "unblocked",
    "delivered",
    "streamlined",
    "shipped",
    "launched",
    "transformed",
    "simplified",
    "accelerated",
    "resolved",
    "elevated",
];

/// Ordered fallback themes used to guarantee the minimum pattern count.
pub const FALLBACK_THEMES: &[&str] = &["reliable", "thoughtful", "supportive", "collaborative"];

/// Words that must never surface as (part of) a highlight phrase.
pub const EXCLUDED_WORDS: &[&str] = &[
    // pronouns
    "i", "me", "my", "mine", "we", "us", "our", "you", "your", "he", "him", "his", "she", "her",
    "hers", "they", "them", "their", "it", "its",
    // articles
    "a", "an", "the",
    // sentence openers
    "working", "work", "with",
    // common first names
    "maya", "john", "sarah", "michael", "david", "emily", "chris", "alex", "jessica", "james",
    "daniel", "laura", "matt", "anna", "mike", "emma", "ryan", "olivia", "kevin", "rachel",
];

/// Verbs highlighted as impact spans regardless of extracted patterns.
pub const HIGHLIGHT_IMPACT_VERBS: &[&str] = &[
    "increased",
    "decreased",
    "reduced",
    "grew",
    "doubled",
    "tripled",
    "shipped",
    "launched",
    "delivered",
    "saved",
    "improved",
    "boosted",
    "accelerated",
    "streamlined",
    "generated",
    "cut",
    "drove",
    "exceeded",
    "scaled",
    "built",
    "led",
    "closed",
    "won",
    "secured",
    "transformed",
    "unblocked",
    "automated",
    "optimized",
    "expanded",
    "raised",
];

/// Impact dictionary for the Proof of Impact view: (word, display phrase).
pub const IMPACT_TERMS: &[(&str, &str)] = &[
    ("revenue", "Grew revenue"),
    ("sales", "Drove sales"),
    ("profit", "Improved profit"),
    ("growth", "Drove growth"),
    ("increased", "Increased results"),
    ("doubled", "Doubled results"),
    ("tripled", "Tripled results"),
    ("grew", "Grew the business"),
    ("scaled", "Scaled operations"),
    ("expanded", "Expanded reach"),
    ("saved", "Saved time and money"),
    ("reduced", "Reduced costs"),
    ("cut", "Cut waste"),
    ("costs", "Lowered costs"),
    ("budget", "Managed budget"),
    ("efficiency", "Boosted efficiency"),
    ("streamlined", "Streamlined process"),
    ("automated", "Automated work"),
    ("optimized", "Optimized systems"),
    ("faster", "Moved faster"),
    ("deadline", "Hit deadlines"),
    ("deadlines", "Hit deadlines"),
    ("shipped", "Shipped work"),
    ("launched", "Launched initiatives"),
    ("delivered", "Delivered results"),
    ("completed", "Completed projects"),
    ("built", "Built solutions"),
    ("designed", "Designed solutions"),
    ("created", "Created value"),
    ("solved", "Solved problems"),
    ("resolved", "Resolved issues"),
    ("fixed", "Fixed problems"),
    ("unblocked", "Unblocked teams"),
    ("improved", "Improved outcomes"),
    ("transformed", "Transformed the team"),
    ("led", "Led initiatives"),
    ("mentored", "Mentored others"),
    ("coached", "Coached the team"),
    ("trained", "Trained colleagues"),
    ("hired", "Built the team"),
    ("retention", "Improved retention"),
    ("customers", "Served customers"),
    ("clients", "Served clients"),
    ("users", "Helped users"),
    ("satisfaction", "Raised satisfaction"),
    ("quality", "Raised quality"),
    ("won", "Won deals"),
    ("closed", "Closed deals"),
    ("secured", "Secured wins"),
    ("funding", "Secured funding"),
];
