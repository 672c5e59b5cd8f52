//! Rule-based highlight phrase extraction.
//!
//! Produces two to four [`HighlightPattern`]s for a testimonial by walking
//! tiers in order:
//!
//! 1. **Theme**: the first two contributor traits that are one or two words
//!    long and appear verbatim in the text.
//! 2. **Working style**: vocabulary phrases (substring match), then
//!    adjectives (whole-word match). Matches inside the first three words
//!    are ignored so sentence openers like "Working with Maya" are not
//!    echoed back.
//! 3. **Contextual**: one impact verb, only when two or three patterns
//!    already exist.
//! 4. **Fallback**: default themes until two patterns exist.
//!
//! A final pass deduplicates, removes phrases containing excluded words
//! (pronouns, articles, first names), tops up again, and truncates to four.

use std::collections::HashSet;

use once_cell::sync::Lazy;
use regex::Regex;
use tracing::{debug, trace};

use nomee_core::defaults::{
    EXTRACT_MAX_CONTEXTUAL, EXTRACT_MAX_PATTERNS, EXTRACT_MIN_PATTERNS, EXTRACT_OPENER_WORDS,
    EXTRACT_TRAIT_CANDIDATES, EXTRACT_TRAIT_MAX_WORDS,
};
use nomee_core::{sanitize_text, HighlightPattern, Tier, Vocabulary};

use crate::text::{normalize_phrase, opener_end, word_count, word_regex};

static DEFAULT_EXTRACTOR: Lazy<Extractor> = Lazy::new(|| Extractor::new(&Vocabulary::default()));

/// Extract highlight phrases with the built-in vocabulary.
///
/// `None` text is treated as empty and `None` traits as no traits.
pub fn extract_keywords_from_text(
    text: Option<&str>,
    traits: Option<&[String]>,
) -> Vec<HighlightPattern> {
    let text = sanitize_text(text);
    DEFAULT_EXTRACTOR.extract(&text, traits.unwrap_or_default())
}

/// Shared default extractor.
pub fn default_extractor() -> &'static Extractor {
    &DEFAULT_EXTRACTOR
}

/// Extractor with its vocabulary compiled once.
#[derive(Debug, Clone)]
pub struct Extractor {
    phrases: Vec<String>,
    adjectives: Vec<(String, Regex)>,
    contextual: Vec<(String, Regex)>,
    fallback: Vec<String>,
    excluded: HashSet<String>,
}

impl Extractor {
    pub fn new(vocab: &Vocabulary) -> Self {
        let excluded: HashSet<String> = vocab
            .excluded_words
            .iter()
            .map(|w| normalize_phrase(w))
            .collect();

        Self {
            phrases: vocab
                .impactful_phrases
                .iter()
                .map(|p| normalize_phrase(p))
                .filter(|p| !p.is_empty())
                .collect(),
            adjectives: compile_words(&vocab.impactful_adjectives),
            contextual: compile_words(&vocab.contextual_verbs),
            fallback: vocab
                .fallback_themes
                .iter()
                .map(|t| normalize_phrase(t))
                .filter(|t| !t.is_empty())
                .collect(),
            excluded,
        }
    }

    /// Extract between two and four patterns from `text`.
    ///
    /// Blank text short-circuits to the first two fallback themes.
    pub fn extract(&self, text: &str, traits: &[String]) -> Vec<HighlightPattern> {
        let text = text.trim();
        if text.is_empty() {
            let mut patterns = Vec::new();
            self.top_up(&mut patterns);
            return patterns;
        }

        let lower = text.to_lowercase();
        let mut patterns: Vec<HighlightPattern> = Vec::new();

        self.trait_tier(&lower, traits, &mut patterns);
        if patterns.len() < EXTRACT_MAX_PATTERNS {
            self.working_style_tier(text, &lower, &mut patterns);
        }
        if (EXTRACT_MIN_PATTERNS..EXTRACT_MAX_PATTERNS).contains(&patterns.len()) {
            self.contextual_tier(text, &mut patterns);
        }
        self.top_up(&mut patterns);

        // Post-filter
        let mut seen = HashSet::new();
        patterns.retain(|p| seen.insert(p.phrase.clone()) && !self.is_excluded(&p.phrase));
        if patterns.len() < EXTRACT_MIN_PATTERNS {
            debug!(
                subsystem = "signals",
                component = "extractor",
                remaining = patterns.len(),
                "Exclusion filter dropped patterns, topping up from fallback themes"
            );
            self.top_up(&mut patterns);
        }
        patterns.truncate(EXTRACT_MAX_PATTERNS);

        debug!(
            subsystem = "signals",
            component = "extractor",
            op = "extract",
            text_len = text.len(),
            result_count = patterns.len(),
            "Extracted highlight patterns"
        );
        patterns
    }

    fn trait_tier(&self, lower: &str, traits: &[String], patterns: &mut Vec<HighlightPattern>) {
        for raw in traits.iter().take(EXTRACT_TRAIT_CANDIDATES) {
            let phrase = normalize_phrase(raw);
            let words = word_count(&phrase);
            if !(1..=EXTRACT_TRAIT_MAX_WORDS).contains(&words) || !lower.contains(&phrase) {
                continue;
            }
            trace!(phrase = %phrase, tier = %Tier::Theme, "Trait found in text");
            push_unique(patterns, phrase, Tier::Theme);
        }
    }

    fn working_style_tier(&self, text: &str, lower: &str, patterns: &mut Vec<HighlightPattern>) {
        let lower_guard = opener_end(lower, EXTRACT_OPENER_WORDS);
        for phrase in &self.phrases {
            if patterns.len() >= EXTRACT_MAX_PATTERNS {
                return;
            }
            let past_opener = lower
                .match_indices(phrase.as_str())
                .any(|(i, _)| i >= lower_guard);
            if past_opener {
                trace!(phrase = %phrase, tier = %Tier::WorkingStyle, "Phrase matched");
                push_unique(patterns, phrase.clone(), Tier::WorkingStyle);
            }
        }

        let guard = opener_end(text, EXTRACT_OPENER_WORDS);
        for (adjective, re) in &self.adjectives {
            if patterns.len() >= EXTRACT_MAX_PATTERNS {
                return;
            }
            if re.find_iter(text).any(|m| m.start() >= guard) {
                trace!(phrase = %adjective, tier = %Tier::WorkingStyle, "Adjective matched");
                push_unique(patterns, adjective.clone(), Tier::WorkingStyle);
            }
        }
    }

    fn contextual_tier(&self, text: &str, patterns: &mut Vec<HighlightPattern>) {
        let mut added = 0;
        for (verb, re) in &self.contextual {
            if added >= EXTRACT_MAX_CONTEXTUAL || patterns.len() >= EXTRACT_MAX_PATTERNS {
                return;
            }
            if re.is_match(text) && push_unique(patterns, verb.clone(), Tier::Contextual) {
                trace!(phrase = %verb, tier = %Tier::Contextual, "Impact verb matched");
                added += 1;
            }
        }
    }

    /// Append fallback themes until the minimum is reached.
    fn top_up(&self, patterns: &mut Vec<HighlightPattern>) {
        for theme in &self.fallback {
            if patterns.len() >= EXTRACT_MIN_PATTERNS {
                return;
            }
            if !self.is_excluded(theme) {
                push_unique(patterns, theme.clone(), Tier::Theme);
            }
        }
    }

    fn is_excluded(&self, phrase: &str) -> bool {
        phrase
            .split_whitespace()
            .any(|w| self.excluded.contains(w))
    }
}

fn compile_words(list: &[String]) -> Vec<(String, Regex)> {
    list.iter()
        .filter_map(|w| word_regex(w).map(|re| (normalize_phrase(w), re)))
        .collect()
}

/// Push a pattern unless the phrase is already present.
fn push_unique(patterns: &mut Vec<HighlightPattern>, phrase: String, tier: Tier) -> bool {
    if patterns.iter().any(|p| p.phrase == phrase) {
        return false;
    }
    patterns.push(HighlightPattern::new(phrase, tier));
    true
}
