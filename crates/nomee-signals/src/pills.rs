//! Display pills for a single testimonial card.

use std::collections::HashSet;

use nomee_core::defaults::PILL_COUNT;
use nomee_core::{sanitize_text, sanitize_traits};

use crate::extract::{default_extractor, Extractor};
use crate::text::title_case;

/// Up to three title-cased pills: the contributor's own traits first, then
/// phrases extracted from the text.
pub fn extract_three_pills(text: Option<&str>, traits: Option<&[String]>) -> Vec<String> {
    pills_with(default_extractor(), text, traits)
}

pub fn pills_with(
    extractor: &Extractor,
    text: Option<&str>,
    traits: Option<&[String]>,
) -> Vec<String> {
    let text = sanitize_text(text);
    let traits = sanitize_traits(traits.unwrap_or_default());

    let mut seen = HashSet::new();
    let mut pills = Vec::with_capacity(PILL_COUNT);

    let extracted = extractor.extract(&text, &traits);
    let candidates = traits
        .iter()
        .map(String::as_str)
        .chain(extracted.iter().map(|p| p.phrase.as_str()));

    for candidate in candidates {
        if pills.len() >= PILL_COUNT {
            break;
        }
        if seen.insert(candidate.to_lowercase()) {
            pills.push(title_case(candidate));
        }
    }
    pills
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_traits_come_first() {
        let traits = vec!["responsive".to_string(), "Calm".to_string()];
        let pills = extract_three_pills(
            Some("On every project he was strategic, thoughtful and calm."),
            Some(traits.as_slice()),
        );
        assert_eq!(pills.len(), 3);
        assert_eq!(pills[0], "Responsive");
        assert_eq!(pills[1], "Calm");
    }

    #[test]
    fn test_empty_input_gets_fallback_pills() {
        let pills = extract_three_pills(None, None);
        assert_eq!(pills, vec!["Reliable", "Thoughtful"]);
    }

    #[test]
    fn test_pills_deduplicate_case_insensitively() {
        let traits = vec!["Strategic".to_string(), "STRATEGIC".to_string()];
        let pills = extract_three_pills(
            Some("Through the rebuild she stayed strategic and calm confidence showed."),
            Some(traits.as_slice()),
        );
        let lower: Vec<String> = pills.iter().map(|p| p.to_lowercase()).collect();
        let unique: HashSet<_> = lower.iter().collect();
        assert_eq!(unique.len(), lower.len());
        assert_eq!(pills[0], "Strategic");
        assert!(pills.len() <= 3);
    }
}
