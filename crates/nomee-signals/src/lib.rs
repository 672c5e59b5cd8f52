//! # nomee-signals
//!
//! Text analysis for Nomee testimonials.
//!
//! This crate provides:
//! - Highlight phrase extraction from a single testimonial
//! - Quote highlighting into non-overlapping plain/highlight segments
//! - Display pills for testimonial cards
//! - Aggregate signals (Top Signals, Most Consistent, Proof of Impact)
//!   across a contribution collection
//!
//! Everything here is pure and synchronous. The default entry points use
//! the built-in vocabulary; build an [`Extractor`], [`Highlighter`], or
//! [`SignalBuilder`] from a custom [`Vocabulary`] to tune it.
//!
//! ## Example
//!
//! ```ignore
//! use nomee_signals::{extract_keywords_from_text, highlight_quote, segments_to_plain};
//!
//! let quote = "Working with Maya was great. She brought calm confidence and delivered.";
//! let patterns = extract_keywords_from_text(Some(quote), None);
//! let segments = highlight_quote(quote, &patterns, 8, true);
//! assert_eq!(segments_to_plain(&segments), quote);
//! ```

pub mod aggregate;
pub mod extract;
pub mod highlight;
pub mod pills;
pub mod text;

// Re-export core types
pub use nomee_core::*;

pub use aggregate::{build_signals, rank_trait_signals, relationship_breakdown, SignalBuilder};
pub use extract::{default_extractor, extract_keywords_from_text, Extractor};
pub use highlight::{
    highlight_quote, segments_to_plain, HighlightOptions, HighlightStyle, Highlighter, Segment,
};
pub use pills::{extract_three_pills, pills_with};
