//! Splitting a generated reply into individual bio suggestions
//!
//! The model is asked for a list labelled "1." and "2.". [`extract_suggestions`]
//! does the mechanical split on those markers; [`SuggestionFormat::Numbered`]
//! accepts any item count and `N)` numbering as well.

use regex::Regex;
use serde::{Deserialize, Serialize};
use std::str::Split;
use std::sync::OnceLock;

const FIRST_MARKER: &str = "1.";
const SPLIT_MARKER: &str = "2.";

/// Lazy, restartable sequence of suggestion slices
///
/// Cloning the iterator restarts it from wherever the clone was taken.
#[derive(Debug, Clone)]
pub struct Suggestions<'a> {
    inner: Option<Split<'a, &'static str>>,
}

impl<'a> Iterator for Suggestions<'a> {
    type Item = &'a str;

    fn next(&mut self) -> Option<&'a str> {
        self.inner.as_mut()?.next()
    }
}

/// Split a reply on the literal "1." / "2." markers.
///
/// Everything up to and including the first "1." is discarded, then the rest
/// is split on every "2.". Without a "1." the whole content is split.
/// Empty or missing content yields nothing.
pub fn extract_suggestions(content: Option<&str>) -> Suggestions<'_> {
    let inner = match content {
        None | Some("") => None,
        Some(text) => {
            let rest = match text.find(FIRST_MARKER) {
                Some(idx) => &text[idx + FIRST_MARKER.len()..],
                None => text,
            };
            Some(rest.split(SPLIT_MARKER))
        }
    };
    Suggestions { inner }
}

fn numbered_marker() -> &'static Regex {
    static MARKER: OnceLock<Regex> = OnceLock::new();
    MARKER.get_or_init(|| {
        Regex::new(r"(?:^|\s)\d{1,2}[.)](?:\s+|$)").expect("numbered marker regex is valid")
    })
}

/// Split a reply on any `N.` or `N)` list marker.
///
/// Text before the first marker is dropped. With no marker at all the whole
/// content is returned as a single item.
pub fn extract_numbered(content: Option<&str>) -> Vec<&str> {
    let text = match content {
        None | Some("") => return Vec::new(),
        Some(text) => text,
    };

    let mut items = Vec::new();
    let mut item_start: Option<usize> = None;

    for marker in numbered_marker().find_iter(text) {
        if let Some(start) = item_start {
            items.push(&text[start..marker.start()]);
        }
        item_start = Some(marker.end());
    }

    match item_start {
        Some(start) => items.push(&text[start..]),
        None => items.push(text),
    }

    items
}

/// How a reply is turned into cards
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SuggestionFormat {
    /// Literal "1." / "2." split
    #[default]
    Marker,
    /// Any count of `N.` / `N)` items
    Numbered,
}

impl SuggestionFormat {
    pub fn from_str(s: &str) -> Option<Self> {
        match s.trim().to_lowercase().as_str() {
            "marker" => Some(SuggestionFormat::Marker),
            "numbered" => Some(SuggestionFormat::Numbered),
            _ => None,
        }
    }

    pub fn split(self, content: Option<&str>) -> Vec<&str> {
        match self {
            SuggestionFormat::Marker => extract_suggestions(content).collect(),
            SuggestionFormat::Numbered => extract_numbered(content),
        }
    }

    /// Card texts as displayed: trimmed, blank pieces skipped
    pub fn cards(self, content: Option<&str>) -> Vec<String> {
        self.split(content)
            .into_iter()
            .map(str::trim)
            .filter(|s| !s.is_empty())
            .map(str::to_string)
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_splits_after_first_marker() {
        let parts: Vec<&str> =
            extract_suggestions(Some("Some preamble 1. First bio text 2. Second bio text"))
                .collect();
        assert_eq!(parts, vec![" First bio text ", " Second bio text"]);
    }

    #[test]
    fn test_empty_and_missing_content_yield_nothing() {
        assert_eq!(extract_suggestions(Some("")).count(), 0);
        assert_eq!(extract_suggestions(None).count(), 0);
    }

    #[test]
    fn test_sequence_is_restartable() {
        let suggestions = extract_suggestions(Some("1. a 2. b"));
        let first: Vec<&str> = suggestions.clone().collect();
        let second: Vec<&str> = suggestions.collect();
        assert_eq!(first, second);
        assert_eq!(first.len(), 2);
    }

    #[test]
    fn test_missing_markers_degrade_to_single_piece() {
        let parts: Vec<&str> = extract_suggestions(Some("just one bio")).collect();
        assert_eq!(parts, vec!["just one bio"]);
    }

    #[test]
    fn test_partial_stream_gives_one_piece() {
        let parts: Vec<&str> = extract_suggestions(Some("1. Tool-builder extra")).collect();
        assert_eq!(parts, vec![" Tool-builder extra"]);
    }

    #[test]
    fn test_every_split_marker_splits() {
        let parts: Vec<&str> = extract_suggestions(Some("1. a 2. b 2. c")).collect();
        assert_eq!(parts, vec![" a ", " b ", " c"]);
    }

    #[test]
    fn test_numbered_handles_three_items_and_parens() {
        let items = extract_numbered(Some("Here you go:\n1) One\n2) Two\n3) Three"));
        let trimmed: Vec<&str> = items.iter().map(|s| s.trim()).collect();
        assert_eq!(trimmed, vec!["One", "Two", "Three"]);
    }

    #[test]
    fn test_numbered_ignores_decimals_inside_text() {
        let items = extract_numbered(Some("1. Shipping v2.0 soon 2. Coffee first"));
        let trimmed: Vec<&str> = items.iter().map(|s| s.trim()).collect();
        assert_eq!(trimmed, vec!["Shipping v2.0 soon", "Coffee first"]);
    }

    #[test]
    fn test_numbered_without_markers_is_whole_content() {
        assert_eq!(extract_numbered(Some("no list here")), vec!["no list here"]);
        assert!(extract_numbered(None).is_empty());
    }

    #[test]
    fn test_cards_are_trimmed_and_skip_blanks() {
        let content = "1. Tool-builder extraordinaire. 2. I make things that work (mostly).";
        assert_eq!(
            SuggestionFormat::Marker.cards(Some(content)),
            vec![
                "Tool-builder extraordinaire.".to_string(),
                "I make things that work (mostly).".to_string()
            ]
        );
        assert!(SuggestionFormat::Marker.cards(Some("1.")).is_empty());
    }

    #[test]
    fn test_format_from_str() {
        assert_eq!(SuggestionFormat::from_str("Numbered"), Some(SuggestionFormat::Numbered));
        assert_eq!(SuggestionFormat::from_str("marker"), Some(SuggestionFormat::Marker));
        assert_eq!(SuggestionFormat::from_str("bullets"), None);
    }
}
