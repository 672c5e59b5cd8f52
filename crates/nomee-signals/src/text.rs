//! Small string helpers shared by the extractor, highlighter, and builder.
//!
//! All offsets are byte offsets into the string they were computed on and
//! always land on char boundaries.

use regex::Regex;
use tracing::warn;

use nomee_core::defaults::ELLIPSIS;

/// Case-insensitive regex matching `phrase` as whole words.
///
/// Word boundaries are only added next to word characters, so phrases such
/// as `$4k` or `go-to` still match. Returns `None` for empty phrases.
pub fn word_regex(phrase: &str) -> Option<Regex> {
    let phrase = phrase.trim();
    let first = phrase.chars().next()?;
    let last = phrase.chars().last()?;

    let lead = if is_word_char(first) { r"\b" } else { "" };
    let trail = if is_word_char(last) { r"\b" } else { "" };
    let pattern = format!("(?i){}{}{}", lead, regex::escape(phrase), trail);

    match Regex::new(&pattern) {
        Ok(re) => Some(re),
        Err(e) => {
            warn!(phrase, error = %e, "Skipping phrase that does not compile to a regex");
            None
        }
    }
}

/// Case-insensitive alternation of whole words, or `None` when empty.
pub fn alternation_regex<S: AsRef<str>>(words: &[S]) -> Option<Regex> {
    let escaped: Vec<String> = words
        .iter()
        .map(|w| w.as_ref().trim())
        .filter(|w| !w.is_empty())
        .map(regex::escape)
        .collect();
    if escaped.is_empty() {
        return None;
    }
    let pattern = format!(r"(?i)\b(?:{})\b", escaped.join("|"));
    match Regex::new(&pattern) {
        Ok(re) => Some(re),
        Err(e) => {
            warn!(error = %e, "Word list does not compile to a regex");
            None
        }
    }
}

fn is_word_char(c: char) -> bool {
    c.is_alphanumeric() || c == '_'
}

/// Byte offset where the first `n` whitespace-separated words end.
///
/// Texts with `n` words or fewer return their full length.
pub fn opener_end(text: &str, n: usize) -> usize {
    if n == 0 {
        return 0;
    }
    let mut words = 0;
    let mut in_word = false;
    for (i, c) in text.char_indices() {
        if c.is_whitespace() {
            if in_word {
                in_word = false;
                words += 1;
                if words == n {
                    return i;
                }
            }
        } else {
            in_word = true;
        }
    }
    text.len()
}

/// Number of whitespace-separated words.
pub fn word_count(text: &str) -> usize {
    text.split_whitespace().count()
}

/// Collapse internal whitespace and lowercase.
pub fn normalize_phrase(text: &str) -> String {
    text.split_whitespace()
        .collect::<Vec<_>>()
        .join(" ")
        .to_lowercase()
}

/// Keep the first `max_chars` characters, appending an ellipsis when cut.
pub fn truncate_chars(text: &str, max_chars: usize) -> String {
    match text.char_indices().nth(max_chars) {
        None => text.to_string(),
        Some((cut, _)) => format!("{}{}", text[..cut].trim_end(), ELLIPSIS),
    }
}

/// Window of `before` characters ahead of `start` and `after` characters
/// past `end`, with ellipses on whichever sides were cut.
pub fn snippet_around(text: &str, start: usize, end: usize, before: usize, after: usize) -> String {
    let from = text[..start]
        .char_indices()
        .rev()
        .take(before)
        .last()
        .map(|(i, _)| i)
        .unwrap_or(start);
    let to = text[end..]
        .char_indices()
        .nth(after)
        .map(|(i, _)| end + i)
        .unwrap_or(text.len());

    let prefix = if from > 0 { ELLIPSIS } else { "" };
    let suffix = if to < text.len() { ELLIPSIS } else { "" };
    format!("{}{}{}", prefix, text[from..to].trim(), suffix)
}

/// Uppercase the first letter of every word.
pub fn title_case(text: &str) -> String {
    text.split_whitespace()
        .map(|word| {
            let mut chars = word.chars();
            match chars.next() {
                Some(first) => first.to_uppercase().chain(chars).collect::<String>(),
                None => String::new(),
            }
        })
        .collect::<Vec<_>>()
        .join(" ")
}
