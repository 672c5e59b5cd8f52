//! Quote highlighting.
//!
//! Finds pattern occurrences (and, optionally, quantified impact such as
//! `37%`, `$4,500`, `3x`, `6 months` or impact verbs) in a testimonial and
//! splits it into plain and highlighted [`Segment`]s.
//!
//! Candidates are ranked marker-before-impact, then by tier, then by
//! position, and accepted greedily when they overlap nothing already
//! accepted. Marker spans are capped at five (or the caller's budget when
//! lower) and impact spans at three. Concatenating the segment texts always
//! reproduces the input exactly.

use std::cmp::Reverse;

use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Deserialize, Serialize};
use tracing::{debug, trace};

use nomee_core::defaults::{HIGHLIGHT_DEFAULT_BUDGET, HIGHLIGHT_MAX_IMPACT, HIGHLIGHT_MAX_MARKERS};
use nomee_core::{HighlightPattern, Tier, Vocabulary};

use crate::text::{alternation_regex, word_regex};

/// Numbers with a currency, percent, multiplier, magnitude, or duration.
static QUANTITY_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(
        r"(?i)(?:\$\d+(?:,\d{3})*(?:\.\d+)?(?:[kmb]\b)?|\b\d+(?:,\d{3})*(?:\.\d+)?(?:%|x\b|[kmb]\b|\s+(?:hours?|days?|weeks?|months?|quarters?|years?)\b))",
    )
    .expect("quantity regex is valid")
});

static DEFAULT_HIGHLIGHTER: Lazy<Highlighter> =
    Lazy::new(|| Highlighter::new(&Vocabulary::default()));

/// Visual category of a highlighted span.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum HighlightStyle {
    /// Trait-origin highlight from a caller-supplied pattern.
    Marker,
    /// Detected impact: quantities and impact verbs.
    Impact,
}

/// A piece of highlighted output.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "lowercase")]
pub enum Segment {
    Plain {
        text: String,
    },
    Highlight {
        text: String,
        style: HighlightStyle,
        tier: Tier,
        #[serde(skip_serializing_if = "Option::is_none")]
        tooltip: Option<String>,
    },
}

impl Segment {
    pub fn text(&self) -> &str {
        match self {
            Self::Plain { text } | Self::Highlight { text, .. } => text,
        }
    }

    pub fn style(&self) -> Option<HighlightStyle> {
        match self {
            Self::Plain { .. } => None,
            Self::Highlight { style, .. } => Some(*style),
        }
    }
}

/// Concatenate segment texts, dropping styling.
pub fn segments_to_plain(segments: &[Segment]) -> String {
    segments.iter().map(Segment::text).collect()
}

/// Caps and switches for one highlighting call.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct HighlightOptions {
    /// Caller budget; lowers the marker cap when below it.
    pub max_highlights: usize,
    pub impact_detection: bool,
    pub max_markers: usize,
    pub max_impact: usize,
}

impl Default for HighlightOptions {
    fn default() -> Self {
        Self {
            max_highlights: HIGHLIGHT_DEFAULT_BUDGET,
            impact_detection: true,
            max_markers: HIGHLIGHT_MAX_MARKERS,
            max_impact: HIGHLIGHT_MAX_IMPACT,
        }
    }
}

impl HighlightOptions {
    pub fn new(max_highlights: usize, impact_detection: bool) -> Self {
        Self {
            max_highlights,
            impact_detection,
            ..Default::default()
        }
    }

    fn marker_cap(&self) -> usize {
        self.max_markers.min(self.max_highlights)
    }
}

/// Highlight with the built-in vocabulary.
pub fn highlight_quote(
    text: &str,
    patterns: &[HighlightPattern],
    max_highlights: usize,
    enable_impact_detection: bool,
) -> Vec<Segment> {
    DEFAULT_HIGHLIGHTER.highlight(
        text,
        patterns,
        HighlightOptions::new(max_highlights, enable_impact_detection),
    )
}

#[derive(Debug, Clone, Copy)]
struct Candidate {
    start: usize,
    end: usize,
    style: HighlightStyle,
    tier: Tier,
}

impl Candidate {
    fn overlaps(&self, other: &Candidate) -> bool {
        self.start < other.end && other.start < self.end
    }
}

/// Highlighter with the impact-verb dictionary compiled once.
#[derive(Debug, Clone)]
pub struct Highlighter {
    impact_verbs: Option<Regex>,
}

impl Highlighter {
    pub fn new(vocab: &Vocabulary) -> Self {
        Self {
            impact_verbs: alternation_regex(&vocab.highlight_impact_verbs),
        }
    }

    pub fn highlight(
        &self,
        text: &str,
        patterns: &[HighlightPattern],
        options: HighlightOptions,
    ) -> Vec<Segment> {
        if text.is_empty() || (patterns.is_empty() && !options.impact_detection) {
            return vec![Segment::Plain {
                text: text.to_string(),
            }];
        }

        let mut candidates = self.pattern_candidates(text, patterns);
        if options.impact_detection {
            candidates.extend(self.impact_candidates(text));
        }

        candidates.sort_by_key(|c| {
            let tier_rank = match c.style {
                HighlightStyle::Marker => c.tier.priority(),
                HighlightStyle::Impact => 0,
            };
            (c.style, tier_rank, c.start, Reverse(c.end))
        });

        let accepted = select(&candidates, options);
        debug!(
            subsystem = "signals",
            component = "highlighter",
            op = "highlight",
            text_len = text.len(),
            input_count = candidates.len(),
            result_count = accepted.len(),
            "Highlighted quote"
        );
        emit(text, accepted)
    }

    fn pattern_candidates(&self, text: &str, patterns: &[HighlightPattern]) -> Vec<Candidate> {
        let mut out = Vec::new();
        for pattern in patterns {
            let Some(re) = word_regex(&pattern.phrase) else {
                continue;
            };
            for m in re.find_iter(text) {
                out.push(Candidate {
                    start: m.start(),
                    end: m.end(),
                    style: HighlightStyle::Marker,
                    tier: pattern.tier,
                });
            }
        }
        out
    }

    fn impact_candidates(&self, text: &str) -> Vec<Candidate> {
        let quantities = QUANTITY_RE.find_iter(text);
        let verbs = self
            .impact_verbs
            .iter()
            .flat_map(|re| re.find_iter(text));
        quantities
            .chain(verbs)
            .filter(|m| !m.as_str().is_empty())
            .map(|m| Candidate {
                start: m.start(),
                end: m.end(),
                style: HighlightStyle::Impact,
                tier: Tier::Impact,
            })
            .collect()
    }
}

/// Greedy non-overlapping selection in priority order with per-style caps.
fn select(candidates: &[Candidate], options: HighlightOptions) -> Vec<Candidate> {
    let marker_cap = options.marker_cap();
    let mut markers = 0;
    let mut impacts = 0;
    let mut accepted: Vec<Candidate> = Vec::new();

    for candidate in candidates {
        let (used, cap) = match candidate.style {
            HighlightStyle::Marker => (&mut markers, marker_cap),
            HighlightStyle::Impact => (&mut impacts, options.max_impact),
        };
        if *used >= cap {
            trace!(style = ?candidate.style, "Highlight cap reached");
            continue;
        }
        if accepted.iter().any(|a| a.overlaps(candidate)) {
            continue;
        }
        *used += 1;
        accepted.push(*candidate);
    }

    accepted.sort_by_key(|c| c.start);
    accepted
}

fn emit(text: &str, accepted: Vec<Candidate>) -> Vec<Segment> {
    let mut segments = Vec::with_capacity(accepted.len() * 2 + 1);
    let mut cursor = 0;

    for c in accepted {
        if c.start > cursor {
            segments.push(Segment::Plain {
                text: text[cursor..c.start].to_string(),
            });
        }
        let tooltip = match c.style {
            HighlightStyle::Marker => c.tier.tooltip().map(str::to_string),
            HighlightStyle::Impact => None,
        };
        segments.push(Segment::Highlight {
            text: text[c.start..c.end].to_string(),
            style: c.style,
            tier: c.tier,
            tooltip,
        });
        cursor = c.end;
    }

    if cursor < text.len() {
        segments.push(Segment::Plain {
            text: text[cursor..].to_string(),
        });
    }
    segments
}
