//! Tunable dictionaries used by extraction, highlighting, and aggregation.
//!
//! The built-in lists live in [`crate::defaults`]. Deployments can override
//! any list with a YAML or JSON file; keys left out keep their defaults.
//!
//! ```yaml
//! fallback_themes: [dependable, thoughtful]
//! impact_terms:
//!   - { word: revenue, phrase: Grew revenue }
//! ```

use std::collections::HashSet;
use std::path::Path;

use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use crate::defaults;
use crate::error::{Error, Result};

/// An impact dictionary entry: the matched word and its display phrase.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ImpactTerm {
    pub word: String,
    pub phrase: String,
}

/// Which list a vocabulary entry belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum VocabularyTier {
    ImpactfulPhrase,
    ImpactfulAdjective,
    ContextualVerb,
    FallbackTheme,
    ExcludedWord,
    HighlightImpactVerb,
    ImpactTerm,
}

/// All dictionaries in one place.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Vocabulary {
    pub impactful_phrases: Vec<String>,
    pub impactful_adjectives: Vec<String>,
    pub contextual_verbs: Vec<String>,
    pub fallback_themes: Vec<String>,
    pub excluded_words: Vec<String>,
    pub highlight_impact_verbs: Vec<String>,
    pub impact_terms: Vec<ImpactTerm>,
}

fn owned(list: &[&str]) -> Vec<String> {
    list.iter().map(|s| s.to_string()).collect()
}

impl Default for Vocabulary {
    fn default() -> Self {
        Self {
            impactful_phrases: owned(defaults::IMPACTFUL_PHRASES),
            impactful_adjectives: owned(defaults::IMPACTFUL_ADJECTIVES),
            contextual_verbs: owned(defaults::CONTEXTUAL_VERBS),
            fallback_themes: owned(defaults::FALLBACK_THEMES),
            excluded_words: owned(defaults::EXCLUDED_WORDS),
            highlight_impact_verbs: owned(defaults::HIGHLIGHT_IMPACT_VERBS),
            impact_terms: defaults::IMPACT_TERMS
                .iter()
                .map(|(word, phrase)| ImpactTerm {
                    word: word.to_string(),
                    phrase: phrase.to_string(),
                })
                .collect(),
        }
    }
}

impl Vocabulary {
    /// Parse a YAML document, then normalize and validate it.
    pub fn from_yaml_str(s: &str) -> Result<Self> {
        let vocab: Self = serde_yaml::from_str(s)?;
        vocab.finish()
    }

    /// Parse a JSON document, then normalize and validate it.
    pub fn from_json_str(s: &str) -> Result<Self> {
        let vocab: Self = serde_json::from_str(s)?;
        vocab.finish()
    }

    /// Load from a `.yaml`, `.yml`, or `.json` file.
    pub fn from_path(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let raw = std::fs::read_to_string(path)?;
        let ext = path
            .extension()
            .and_then(|e| e.to_str())
            .map(str::to_lowercase)
            .unwrap_or_default();

        let vocab = match ext.as_str() {
            "yaml" | "yml" => Self::from_yaml_str(&raw)?,
            "json" => Self::from_json_str(&raw)?,
            other => {
                return Err(Error::Config(format!(
                    "Unsupported vocabulary file extension '{}' for {}",
                    other,
                    path.display()
                )))
            }
        };

        info!(
            subsystem = "signals",
            component = "vocabulary",
            op = "load",
            path = %path.display(),
            entries = vocab.entries().len(),
            "Loaded vocabulary"
        );
        Ok(vocab)
    }

    fn finish(mut self) -> Result<Self> {
        self.normalize();
        self.validate()?;
        Ok(self)
    }

    /// Trim and lowercase every matched term; display phrases keep casing.
    pub fn normalize(&mut self) {
        for list in [
            &mut self.impactful_phrases,
            &mut self.impactful_adjectives,
            &mut self.contextual_verbs,
            &mut self.fallback_themes,
            &mut self.excluded_words,
            &mut self.highlight_impact_verbs,
        ] {
            normalize_list(list);
        }

        let mut seen = HashSet::new();
        self.impact_terms.retain_mut(|term| {
            term.word = term.word.trim().to_lowercase();
            term.phrase = term.phrase.trim().to_string();
            !term.word.is_empty() && seen.insert(term.word.clone())
        });
    }

    /// Check the invariants extraction relies on.
    ///
    /// The extractor tops up from `fallback_themes`, skipping excluded
    /// words, so at least two usable themes must exist.
    pub fn validate(&self) -> Result<()> {
        let excluded = self.excluded_set();
        let usable = self
            .fallback_themes
            .iter()
            .filter(|t| !t.split_whitespace().any(|w| excluded.contains(w)))
            .count();
        if usable < defaults::EXTRACT_MIN_PATTERNS {
            return Err(Error::Config(format!(
                "vocabulary needs at least {} fallback themes outside the excluded words, found {}",
                defaults::EXTRACT_MIN_PATTERNS,
                usable
            )));
        }

        if let Some(term) = self.impact_terms.iter().find(|t| t.phrase.is_empty()) {
            return Err(Error::Config(format!(
                "impact term '{}' has an empty display phrase",
                term.word
            )));
        }

        debug!(
            subsystem = "signals",
            component = "vocabulary",
            fallback_themes = usable,
            "Vocabulary validated"
        );
        Ok(())
    }

    /// Lowercase excluded words as a set.
    pub fn excluded_set(&self) -> HashSet<&str> {
        self.excluded_words.iter().map(String::as_str).collect()
    }

    /// Flattened `(term, tier)` view of every list.
    pub fn entries(&self) -> Vec<(String, VocabularyTier)> {
        let mut out = Vec::new();
        out.extend(tagged(&self.impactful_phrases, VocabularyTier::ImpactfulPhrase));
        out.extend(tagged(
            &self.impactful_adjectives,
            VocabularyTier::ImpactfulAdjective,
        ));
        out.extend(tagged(&self.contextual_verbs, VocabularyTier::ContextualVerb));
        out.extend(tagged(&self.fallback_themes, VocabularyTier::FallbackTheme));
        out.extend(tagged(&self.excluded_words, VocabularyTier::ExcludedWord));
        out.extend(tagged(
            &self.highlight_impact_verbs,
            VocabularyTier::HighlightImpactVerb,
        ));
        out.extend(
            self.impact_terms
                .iter()
                .map(|t| (t.word.clone(), VocabularyTier::ImpactTerm)),
        );
        out
    }
}

fn tagged(
    list: &[String],
    tier: VocabularyTier,
) -> impl Iterator<Item = (String, VocabularyTier)> + '_ {
    list.iter().map(move |t| (t.clone(), tier))
}

fn normalize_list(list: &mut Vec<String>) {
    let mut seen = HashSet::new();
    list.retain_mut(|term| {
        *term = term
            .split_whitespace()
            .collect::<Vec<_>>()
            .join(" ")
            .to_lowercase();
        !term.is_empty() && seen.insert(term.clone())
    });
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn test_default_vocabulary_is_valid() {
        let vocab = Vocabulary::default();
        assert!(vocab.validate().is_ok());
        assert_eq!(vocab.fallback_themes[0], "reliable");
        assert_eq!(vocab.fallback_themes[1], "thoughtful");
        assert!(vocab.impact_terms.len() >= 50);
        assert_eq!(vocab.highlight_impact_verbs.len(), 30);
    }

    #[test]
    fn test_partial_yaml_keeps_defaults() {
        let vocab = Vocabulary::from_yaml_str("contextual_verbs: [Rescued, '  Unstuck ']").unwrap();
        assert_eq!(vocab.contextual_verbs, vec!["rescued", "unstuck"]);
        assert_eq!(vocab.fallback_themes, Vocabulary::default().fallback_themes);
    }

    #[test]
    fn test_json_impact_terms_are_normalized() {
        let vocab = Vocabulary::from_json_str(
            r#"{"impact_terms": [{"word": " Revenue ", "phrase": "Grew revenue"},
                                  {"word": "revenue", "phrase": "Duplicate"}]}"#,
        )
        .unwrap();
        assert_eq!(vocab.impact_terms.len(), 1);
        assert_eq!(vocab.impact_terms[0].word, "revenue");
        assert_eq!(vocab.impact_terms[0].phrase, "Grew revenue");
    }

    #[test]
    fn test_too_few_fallback_themes_rejected() {
        let err = Vocabulary::from_yaml_str("fallback_themes: [reliable, she]").unwrap_err();
        assert!(matches!(err, Error::Config(_)));
    }

    #[test]
    fn test_empty_phrase_rejected() {
        let err = Vocabulary::from_json_str(r#"{"impact_terms": [{"word": "x", "phrase": " "}]}"#)
            .unwrap_err();
        assert!(err.to_string().contains("empty display phrase"));
    }

    #[test]
    fn test_from_path_by_extension() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("vocab.yml");
        let mut file = std::fs::File::create(&path).unwrap();
        writeln!(file, "fallback_themes: [steady, kind]").unwrap();

        let vocab = Vocabulary::from_path(&path).unwrap();
        assert_eq!(vocab.fallback_themes, vec!["steady", "kind"]);

        let bad = dir.path().join("vocab.toml");
        std::fs::write(&bad, "x = 1").unwrap();
        assert!(matches!(Vocabulary::from_path(&bad), Err(Error::Config(_))));
    }

    #[test]
    fn test_entries_are_tagged() {
        let vocab = Vocabulary::default();
        let entries = vocab.entries();
        assert!(entries
            .iter()
            .any(|(t, tier)| t == "calm confidence" && *tier == VocabularyTier::ImpactfulPhrase));
        assert!(entries
            .iter()
            .any(|(t, tier)| t == "revenue" && *tier == VocabularyTier::ImpactTerm));
    }
}
