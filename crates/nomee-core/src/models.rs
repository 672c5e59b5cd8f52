//! Core data models for Nomee.
//!
//! These types are shared across the Nomee crates and represent the
//! contributions being analysed and the patterns and signals derived from
//! them.

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::defaults::PATTERN_FREQUENCY;
use crate::input::{lenient_string, lenient_trait_groups, sanitize_text, sanitize_traits};

// =============================================================================
// PATTERN TYPES
// =============================================================================

/// Priority category of an extracted phrase.
///
/// Declaration order is highlight precedence: a `Theme` match beats an
/// overlapping `WorkingStyle` match, and so on.
#[derive(
    Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
#[serde(rename_all = "kebab-case")]
pub enum Tier {
    /// Contributor-selected trait found verbatim in the text.
    Theme,
    /// Working-style phrase or adjective from the vocabulary.
    #[default]
    WorkingStyle,
    /// Impact verb giving context to the praise.
    Contextual,
    /// Quantified or verb-driven impact.
    Impact,
}

impl Tier {
    /// Precedence rank; lower wins.
    pub fn priority(self) -> u8 {
        match self {
            Self::Theme => 0,
            Self::WorkingStyle => 1,
            Self::Contextual => 2,
            Self::Impact => 3,
        }
    }

    /// Tooltip label shown on marker highlights. Impact spans carry none.
    pub fn tooltip(self) -> Option<&'static str> {
        match self {
            Self::Theme => Some("Theme"),
            Self::WorkingStyle => Some("Working style"),
            Self::Contextual => Some("Context"),
            Self::Impact => None,
        }
    }
}

impl std::fmt::Display for Tier {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Theme => write!(f, "theme"),
            Self::WorkingStyle => write!(f, "working-style"),
            Self::Contextual => write!(f, "contextual"),
            Self::Impact => write!(f, "impact"),
        }
    }
}

impl std::str::FromStr for Tier {
    type Err = String;
    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "theme" => Ok(Self::Theme),
            "working-style" | "working_style" | "workingstyle" => Ok(Self::WorkingStyle),
            "contextual" => Ok(Self::Contextual),
            "impact" => Ok(Self::Impact),
            _ => Err(format!("Invalid tier: {}", s)),
        }
    }
}

/// A phrase worth highlighting in a testimonial.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HighlightPattern {
    /// Lowercase phrase, one to three words.
    pub phrase: String,
    pub tier: Tier,
    /// Ordering hint only; always 1 for a single extraction call.
    #[serde(default = "default_frequency")]
    pub frequency: u32,
}

fn default_frequency() -> u32 {
    PATTERN_FREQUENCY
}

impl HighlightPattern {
    pub fn new(phrase: impl Into<String>, tier: Tier) -> Self {
        Self {
            phrase: phrase.into(),
            tier,
            frequency: PATTERN_FREQUENCY,
        }
    }

    /// Whitespace-separated words of the phrase.
    pub fn words(&self) -> impl Iterator<Item = &str> {
        self.phrase.split_whitespace()
    }
}

// =============================================================================
// CONTRIBUTION TYPES
// =============================================================================

/// Where a contribution came from.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SourceType {
    /// Submitted through the contributor form.
    #[default]
    Direct,
    /// Extracted from an uploaded screenshot or other import.
    Imported,
}

impl std::fmt::Display for SourceType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Direct => write!(f, "direct"),
            Self::Imported => write!(f, "imported"),
        }
    }
}

impl std::str::FromStr for SourceType {
    type Err = String;
    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "direct" => Ok(Self::Direct),
            "imported" | "upload" | "uploaded" => Ok(Self::Imported),
            _ => Err(format!("Invalid source type: {}", s)),
        }
    }
}

/// Loose bucketing of the free-form relationship label.
#[derive(
    Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
#[serde(rename_all = "lowercase")]
pub enum RelationshipBucket {
    Client,
    Peer,
    Manager,
    Partner,
    #[default]
    Other,
}

impl RelationshipBucket {
    /// Bucket a relationship label by keyword. Unknown labels map to `Other`.
    pub fn from_label(label: &str) -> Self {
        let label = label.to_lowercase();
        let has = |keys: &[&str]| keys.iter().any(|k| label.contains(k));

        if has(&["client", "customer"]) {
            Self::Client
        } else if has(&["manager", "boss", "supervisor", "director", "lead"]) {
            Self::Manager
        } else if has(&["peer", "colleague", "coworker", "co-worker", "teammate"]) {
            Self::Peer
        } else if has(&["partner", "vendor", "collaborator", "contractor"]) {
            Self::Partner
        } else {
            Self::Other
        }
    }
}

impl std::fmt::Display for RelationshipBucket {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Client => write!(f, "client"),
            Self::Peer => write!(f, "peer"),
            Self::Manager => write!(f, "manager"),
            Self::Partner => write!(f, "partner"),
            Self::Other => write!(f, "other"),
        }
    }
}

/// A unit of feedback about a subject person.
///
/// Deserialization is lenient: `null` or non-string fields become empty,
/// and non-string trait entries are dropped.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Contribution {
    pub id: Uuid,
    #[serde(default, deserialize_with = "lenient_string")]
    pub written_note: String,
    #[serde(default, deserialize_with = "lenient_string")]
    pub ai_extracted_excerpt: String,
    /// Up to four parallel trait lists selected by the contributor.
    #[serde(default, deserialize_with = "lenient_trait_groups")]
    pub trait_groups: Vec<Vec<String>>,
    #[serde(default)]
    pub source: SourceType,
    #[serde(default)]
    pub contributor_id: Option<Uuid>,
    #[serde(default, deserialize_with = "lenient_string")]
    pub relationship: String,
}

impl Contribution {
    /// Feedback text: the written note when present, else the AI excerpt.
    pub fn body(&self) -> String {
        let note = sanitize_text(Some(self.written_note.as_str()));
        if note.is_empty() {
            sanitize_text(Some(self.ai_extracted_excerpt.as_str()))
        } else {
            note
        }
    }

    /// All trait labels across groups, deduplicated.
    pub fn traits(&self) -> Vec<String> {
        sanitize_traits(self.trait_groups.iter().flatten())
    }

    pub fn relationship_bucket(&self) -> RelationshipBucket {
        RelationshipBucket::from_label(&self.relationship)
    }

    /// Identity used for distinct-contributor counting.
    pub fn contributor_key(&self) -> Uuid {
        self.contributor_id.unwrap_or(self.id)
    }
}

/// The slice of a contribution the signal builder needs.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SignalCard {
    pub id: Uuid,
    pub excerpt: String,
    pub traits: Vec<String>,
    #[serde(rename = "type")]
    pub source: SourceType,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub contributor_id: Option<Uuid>,
}

impl SignalCard {
    /// Distinct-contributor key, falling back to the card id.
    pub fn contributor_key(&self) -> Uuid {
        self.contributor_id.unwrap_or(self.id)
    }

    /// Case-insensitive match using the same lowercase key as trait ranking.
    pub fn has_trait(&self, label: &str) -> bool {
        let key = label.to_lowercase();
        self.traits.iter().any(|t| t.to_lowercase() == key)
    }
}

impl From<&Contribution> for SignalCard {
    fn from(c: &Contribution) -> Self {
        Self {
            id: c.id,
            excerpt: c.body(),
            traits: c.traits(),
            source: c.source,
            contributor_id: c.contributor_id,
        }
    }
}

// =============================================================================
// SIGNAL TYPES
// =============================================================================

/// How many backing contributions came from each source.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SourceMix {
    pub direct: usize,
    pub imported: usize,
}

impl SourceMix {
    pub fn add(&mut self, source: SourceType) {
        match source {
            SourceType::Direct => self.direct += 1,
            SourceType::Imported => self.imported += 1,
        }
    }

    pub fn total(&self) -> usize {
        self.direct + self.imported
    }

    /// Display label: "Direct", "Imported", "Mixed", or "None".
    pub fn label(&self) -> &'static str {
        match (self.direct > 0, self.imported > 0) {
            (true, true) => "Mixed",
            (true, false) => "Direct",
            (false, true) => "Imported",
            (false, false) => "None",
        }
    }
}

/// Qualitative strength bucket for a signal count.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Strength {
    Core,
    Strong,
    Emerging,
}

impl std::fmt::Display for Strength {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Core => write!(f, "Core"),
            Self::Strong => write!(f, "Strong"),
            Self::Emerging => write!(f, "Emerging"),
        }
    }
}

/// A pre-ranked trait label and its count from upstream aggregation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TraitSignal {
    pub label: String,
    pub count: usize,
}

/// An aggregated signal ready for display.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Signal {
    pub label: String,
    pub count: usize,
    pub source_mix: SourceMix,
    pub source_label: String,
    pub strength: Strength,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub example: Option<String>,
}

/// The three parallel signal views.
///
/// `sufficient == false` is the "not enough data" sentinel: every list is
/// empty and callers render their placeholder state.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SignalSummary {
    pub sufficient: bool,
    pub top_signals: Vec<Signal>,
    pub most_consistent: Vec<Signal>,
    pub proof_of_impact: Vec<Signal>,
}

impl SignalSummary {
    pub fn insufficient() -> Self {
        Self::default()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_tier_priority_order() {
        assert!(Tier::Theme.priority() < Tier::WorkingStyle.priority());
        assert!(Tier::WorkingStyle.priority() < Tier::Contextual.priority());
        assert!(Tier::Contextual.priority() < Tier::Impact.priority());
    }

    #[test]
    fn test_tier_serde_kebab_case() {
        let json = serde_json::to_string(&Tier::WorkingStyle).unwrap();
        assert_eq!(json, "\"working-style\"");
        let tier: Tier = serde_json::from_str("\"contextual\"").unwrap();
        assert_eq!(tier, Tier::Contextual);
    }

    #[test]
    fn test_tier_from_str_roundtrips_display() {
        for tier in [Tier::Theme, Tier::WorkingStyle, Tier::Contextual, Tier::Impact] {
            assert_eq!(tier.to_string().parse::<Tier>().unwrap(), tier);
        }
        assert!("loud".parse::<Tier>().is_err());
    }

    #[test]
    fn test_impact_tier_has_no_tooltip() {
        assert_eq!(Tier::Impact.tooltip(), None);
        assert_eq!(Tier::WorkingStyle.tooltip(), Some("Working style"));
    }

    #[test]
    fn test_relationship_bucketing() {
        assert_eq!(
            RelationshipBucket::from_label("Former Client"),
            RelationshipBucket::Client
        );
        assert_eq!(
            RelationshipBucket::from_label("my manager at Acme"),
            RelationshipBucket::Manager
        );
        assert_eq!(
            RelationshipBucket::from_label("Teammate"),
            RelationshipBucket::Peer
        );
        assert_eq!(
            RelationshipBucket::from_label("agency partner"),
            RelationshipBucket::Partner
        );
        assert_eq!(
            RelationshipBucket::from_label("neighbor"),
            RelationshipBucket::Other
        );
        assert_eq!(RelationshipBucket::from_label(""), RelationshipBucket::Other);
    }

    #[test]
    fn test_contribution_body_prefers_written_note() {
        let c = Contribution {
            written_note: "  Great partner.  ".to_string(),
            ai_extracted_excerpt: "From screenshot".to_string(),
            ..Default::default()
        };
        assert_eq!(c.body(), "Great partner.");

        let c = Contribution {
            written_note: "   ".to_string(),
            ai_extracted_excerpt: "From screenshot".to_string(),
            ..Default::default()
        };
        assert_eq!(c.body(), "From screenshot");
    }

    #[test]
    fn test_contribution_lenient_deserialize() {
        let json = r#"{
            "id": "00000000-0000-0000-0000-000000000001",
            "written_note": null,
            "ai_extracted_excerpt": "Shipped it",
            "trait_groups": [["Reliable", 3, null, "Calm"], "bogus", ["reliable", "Kind"]],
            "source": "imported",
            "relationship": 42
        }"#;
        let c: Contribution = serde_json::from_str(json).unwrap();
        assert_eq!(c.written_note, "");
        assert_eq!(c.body(), "Shipped it");
        assert_eq!(c.traits(), vec!["Reliable", "Calm", "Kind"]);
        assert_eq!(c.source, SourceType::Imported);
        assert_eq!(c.relationship, "42");
        assert_eq!(c.contributor_key(), c.id);
    }

    #[test]
    fn test_signal_card_from_contribution() {
        let contributor = Uuid::new_v4();
        let c = Contribution {
            id: Uuid::new_v4(),
            written_note: "Steady hand".to_string(),
            trait_groups: vec![vec!["Calm".to_string()]],
            contributor_id: Some(contributor),
            ..Default::default()
        };
        let card = SignalCard::from(&c);
        assert_eq!(card.excerpt, "Steady hand");
        assert_eq!(card.contributor_key(), contributor);
        assert!(card.has_trait("calm"));
    }

    #[test]
    fn test_has_trait_folds_non_ascii_case() {
        let card = SignalCard {
            id: Uuid::new_v4(),
            excerpt: String::new(),
            traits: vec!["ÉCLAIRÉ".to_string()],
            source: SourceType::Direct,
            contributor_id: None,
        };
        assert!(card.has_trait("éclairé"));
        assert!(card.has_trait("Éclairé"));
        assert!(!card.has_trait("eclaire"));
    }

    #[test]
    fn test_source_mix_label() {
        let mut mix = SourceMix::default();
        assert_eq!(mix.label(), "None");
        mix.add(SourceType::Direct);
        assert_eq!(mix.label(), "Direct");
        mix.add(SourceType::Imported);
        assert_eq!(mix.label(), "Mixed");
        assert_eq!(mix.total(), 2);
    }

    #[test]
    fn test_signal_card_serializes_source_as_type() {
        let card = SignalCard {
            id: Uuid::nil(),
            excerpt: String::new(),
            traits: vec![],
            source: SourceType::Imported,
            contributor_id: None,
        };
        let value = serde_json::to_value(&card).unwrap();
        assert_eq!(value["type"], "imported");
        assert!(value.get("contributor_id").is_none());
    }
}
