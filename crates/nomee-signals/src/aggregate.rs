//! Aggregate signals across a testimonial collection.
//!
//! Builds the three summary views shown on a profile:
//!
//! - **Top Signals**: the first entries of an upstream-ranked trait list,
//!   each with its source mix and one example excerpt.
//! - **Most Consistent**: traits used by at least two distinct
//!   contributors, ranked by how many.
//! - **Proof of Impact**: impact dictionary words counted over every
//!   excerpt, mapped to display phrases, with a snippet around the first hit.
//!
//! Fewer than three contributions (or no ranked traits) yields
//! [`SignalSummary::insufficient`] rather than a low-confidence guess.

use std::collections::{BTreeMap, HashMap, HashSet};

use once_cell::sync::Lazy;
use regex::Regex;
use tracing::debug;
use uuid::Uuid;

use nomee_core::{
    Contribution, RelationshipBucket, Signal, SignalCard, SignalConfig, SignalSummary, SourceMix,
    TraitSignal, Vocabulary,
};

use crate::text::{snippet_around, truncate_chars, word_regex};

static DEFAULT_BUILDER: Lazy<SignalBuilder> =
    Lazy::new(|| SignalBuilder::new(SignalConfig::default(), &Vocabulary::default()));

/// Build signals with default thresholds and vocabulary.
pub fn build_signals(
    cards: &[SignalCard],
    trait_signals: &[TraitSignal],
    total_contributions: usize,
) -> SignalSummary {
    DEFAULT_BUILDER.build(cards, trait_signals, total_contributions)
}

/// Count cards mentioning each trait, descending; ties keep first appearance.
pub fn rank_trait_signals(cards: &[SignalCard]) -> Vec<TraitSignal> {
    let mut order: Vec<TraitSignal> = Vec::new();
    let mut index: HashMap<String, usize> = HashMap::new();

    for card in cards {
        for label in distinct_labels(&card.traits) {
            let key = label.to_lowercase();
            match index.get(&key) {
                Some(&i) => order[i].count += 1,
                None => {
                    index.insert(key, order.len());
                    order.push(TraitSignal {
                        label: label.to_string(),
                        count: 1,
                    });
                }
            }
        }
    }

    order.sort_by(|a, b| b.count.cmp(&a.count));
    order
}

/// How many contributions fall in each relationship bucket.
pub fn relationship_breakdown(
    contributions: &[Contribution],
) -> BTreeMap<RelationshipBucket, usize> {
    let mut out = BTreeMap::new();
    for c in contributions {
        *out.entry(c.relationship_bucket()).or_insert(0) += 1;
    }
    out
}

/// Trimmed, non-empty labels of a card, first spelling per case-folded key.
fn distinct_labels(traits: &[String]) -> Vec<&str> {
    let mut seen = HashSet::new();
    traits
        .iter()
        .map(|t| t.trim())
        .filter(|t| !t.is_empty() && seen.insert(t.to_lowercase()))
        .collect()
}

/// Impact dictionary entries sharing one display phrase.
#[derive(Debug, Clone)]
struct ImpactGroup {
    phrase: String,
    words: Vec<Regex>,
}

/// Signal builder with thresholds and the impact dictionary compiled once.
#[derive(Debug, Clone)]
pub struct SignalBuilder {
    config: SignalConfig,
    impact: Vec<ImpactGroup>,
}

impl SignalBuilder {
    pub fn new(config: SignalConfig, vocab: &Vocabulary) -> Self {
        let mut impact: Vec<ImpactGroup> = Vec::new();
        for term in &vocab.impact_terms {
            let Some(re) = word_regex(&term.word) else {
                continue;
            };
            match impact.iter_mut().find(|g| g.phrase == term.phrase) {
                Some(group) => group.words.push(re),
                None => impact.push(ImpactGroup {
                    phrase: term.phrase.clone(),
                    words: vec![re],
                }),
            }
        }
        Self { config, impact }
    }

    pub fn config(&self) -> &SignalConfig {
        &self.config
    }

    /// Convenience: derive cards, ranking, and total from contributions.
    pub fn build_from_contributions(&self, contributions: &[Contribution]) -> SignalSummary {
        let cards: Vec<SignalCard> = contributions.iter().map(SignalCard::from).collect();
        let ranked = rank_trait_signals(&cards);
        self.build(&cards, &ranked, contributions.len())
    }

    pub fn build(
        &self,
        cards: &[SignalCard],
        trait_signals: &[TraitSignal],
        total_contributions: usize,
    ) -> SignalSummary {
        if total_contributions < self.config.evidence_floor || trait_signals.is_empty() {
            debug!(
                subsystem = "signals",
                component = "signal_builder",
                total_contributions,
                evidence_floor = self.config.evidence_floor,
                ranked = trait_signals.len(),
                "Not enough evidence for signal panels"
            );
            return SignalSummary::insufficient();
        }

        let summary = SignalSummary {
            sufficient: true,
            top_signals: self.top_signals(cards, trait_signals),
            most_consistent: self.most_consistent(cards),
            proof_of_impact: self.proof_of_impact(cards),
        };

        debug!(
            subsystem = "signals",
            component = "signal_builder",
            op = "build",
            input_count = cards.len(),
            top = summary.top_signals.len(),
            consistent = summary.most_consistent.len(),
            impact = summary.proof_of_impact.len(),
            "Built signal summary"
        );
        summary
    }

    fn signal(
        &self,
        label: String,
        count: usize,
        mix: SourceMix,
        example: Option<String>,
    ) -> Signal {
        Signal {
            label,
            count,
            source_label: mix.label().to_string(),
            source_mix: mix,
            strength: self.config.strength(count),
            example,
        }
    }

    fn excerpt(&self, card: &SignalCard) -> Option<String> {
        let text = card.excerpt.trim();
        (!text.is_empty()).then(|| truncate_chars(text, self.config.excerpt_chars))
    }

    fn top_signals(&self, cards: &[SignalCard], trait_signals: &[TraitSignal]) -> Vec<Signal> {
        trait_signals
            .iter()
            .filter(|ts| !ts.label.trim().is_empty())
            .take(self.config.top_limit)
            .map(|ts| {
                let label = ts.label.trim();
                let mut mix = SourceMix::default();
                let mut example = None;
                for card in cards.iter().filter(|c| c.has_trait(label)) {
                    mix.add(card.source);
                    if example.is_none() {
                        example = self.excerpt(card);
                    }
                }
                self.signal(label.to_string(), ts.count, mix, example)
            })
            .collect()
    }

    fn most_consistent(&self, cards: &[SignalCard]) -> Vec<Signal> {
        struct Usage {
            label: String,
            contributors: HashSet<Uuid>,
            mix: SourceMix,
            example: Option<String>,
        }

        let mut order: Vec<Usage> = Vec::new();
        let mut index: HashMap<String, usize> = HashMap::new();

        for card in cards {
            for label in distinct_labels(&card.traits) {
                let key = label.to_lowercase();
                let i = *index.entry(key).or_insert_with(|| {
                    order.push(Usage {
                        label: label.to_string(),
                        contributors: HashSet::new(),
                        mix: SourceMix::default(),
                        example: None,
                    });
                    order.len() - 1
                });
                let usage = &mut order[i];
                usage.contributors.insert(card.contributor_key());
                usage.mix.add(card.source);
                if usage.example.is_none() {
                    usage.example = self.excerpt(card);
                }
            }
        }

        let mut kept: Vec<Usage> = order
            .into_iter()
            .filter(|u| u.contributors.len() >= self.config.consistency_min_contributors)
            .collect();
        kept.sort_by(|a, b| b.contributors.len().cmp(&a.contributors.len()));
        kept.into_iter()
            .take(self.config.consistent_limit)
            .map(|u| self.signal(u.label, u.contributors.len(), u.mix, u.example))
            .collect()
    }

    fn proof_of_impact(&self, cards: &[SignalCard]) -> Vec<Signal> {
        let mut found: Vec<Signal> = Vec::new();

        for group in &self.impact {
            let mut total = 0;
            let mut mix = SourceMix::default();
            let mut snippet = None;

            for card in cards {
                let mut in_card = 0;
                for re in &group.words {
                    for m in re.find_iter(&card.excerpt) {
                        in_card += 1;
                        if snippet.is_none() {
                            snippet = Some(snippet_around(
                                &card.excerpt,
                                m.start(),
                                m.end(),
                                self.config.snippet_before,
                                self.config.snippet_after,
                            ));
                        }
                    }
                }
                if in_card > 0 {
                    total += in_card;
                    mix.add(card.source);
                }
            }

            if total > 0 {
                found.push(self.signal(group.phrase.clone(), total, mix, snippet));
            }
        }

        found.sort_by(|a, b| b.count.cmp(&a.count));
        found.truncate(self.config.impact_limit);
        found
    }
}
