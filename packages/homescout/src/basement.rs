//! Basement signal derivation.
//!
//! The upstream API places basement information inconsistently in up to
//! three locations: a structured "details" group, a structured
//! "features" group, or only inside the free-text description. That
//! ambiguity is inherent to the source, not a defect to fix, so the
//! derivation is a fixed confidence hierarchy:
//!
//! 1. structured details with an explicit finished/unfinished indicator
//!    (highest confidence, short-circuits),
//! 2. a recognized finished-basement token in the features groups,
//! 3. a case-insensitive keyword scan over the free-text fields.
//!
//! No match at any level yields `Unknown`, never `Unfinished`.

use crate::types::{BasementSignal, TextBlock};

/// Phrases that indicate a basement is being talked about at all.
const BASEMENT_MENTIONS: &[&str] = &[
    "basement",
    "lower level",
    "walkout",
    "walk-out",
    "daylight basement",
];

/// Markers for finished or partially finished basements.
const FINISHED_MARKERS: &[&str] = &[
    "finished",
    "partially finished",
    "partial",
    "renovated",
    "remodeled",
];

/// Markers for explicitly unfinished basements.
const UNFINISHED_MARKERS: &[&str] = &["unfinished", "rough", "concrete floor", "bare concrete"];

/// Explicit no-basement phrasings in free text.
const NO_BASEMENT_MARKERS: &[&str] = &["no basement", "slab foundation", "crawl space only"];

/// Resolve the basement signal from the three upstream locations.
pub fn derive(details: &[TextBlock], features: &[TextBlock], free_text: &[String]) -> BasementSignal {
    // 1. Structured details - an explicit indicator wins outright.
    if let Some(signal) = scan_blocks(details) {
        return signal;
    }

    // 2. Features groups - only a finished token counts here.
    if let Some(BasementSignal::Finished) = scan_blocks(features) {
        return BasementSignal::Finished;
    }

    // 3. Free text, last resort.
    for text in free_text {
        let lower = text.to_lowercase();
        if NO_BASEMENT_MARKERS.iter().any(|m| lower.contains(m)) {
            return BasementSignal::Unfinished;
        }
        if !mentions_basement(&lower) {
            continue;
        }
        if UNFINISHED_MARKERS.iter().any(|m| lower.contains(m)) {
            return BasementSignal::Unfinished;
        }
        if FINISHED_MARKERS.iter().any(|m| lower.contains(m)) {
            return BasementSignal::Finished;
        }
    }

    BasementSignal::Unknown
}

fn mentions_basement(lower: &str) -> bool {
    BASEMENT_MENTIONS.iter().any(|m| lower.contains(m))
}

/// Scan structured groups for an explicit finished/unfinished indicator.
fn scan_blocks(blocks: &[TextBlock]) -> Option<BasementSignal> {
    for block in blocks {
        for line in &block.text {
            let lower = line.to_lowercase();
            if !mentions_basement(&lower) {
                continue;
            }
            if UNFINISHED_MARKERS.iter().any(|m| lower.contains(m)) {
                return Some(BasementSignal::Unfinished);
            }
            if FINISHED_MARKERS.iter().any(|m| lower.contains(m)) {
                return Some(BasementSignal::Finished);
            }
        }
    }
    None
}

#[cfg(test)]
mod tests {
    use super::*;

    fn block(lines: &[&str]) -> TextBlock {
        TextBlock::new("Interior", lines.iter().map(|s| s.to_string()).collect())
    }

    #[test]
    fn test_details_indicator_short_circuits() {
        // Conflicting signals: details say unfinished, features and text say finished.
        let details = vec![block(&["Basement: Unfinished"])];
        let features = vec![block(&["Finished basement"])];
        let text = vec!["Gorgeous finished basement rec room".to_string()];
        assert_eq!(
            derive(&details, &features, &text),
            BasementSignal::Unfinished
        );
    }

    #[test]
    fn test_features_token_beats_free_text() {
        let features = vec![block(&["Partially finished basement"])];
        let text = vec!["Unfinished basement with storage".to_string()];
        assert_eq!(derive(&[], &features, &text), BasementSignal::Finished);
    }

    #[test]
    fn test_free_text_finished_phrasing() {
        let text = vec!["Spacious walk-out basement, fully renovated.".to_string()];
        assert_eq!(derive(&[], &[], &text), BasementSignal::Finished);
    }

    #[test]
    fn test_free_text_unfinished_phrasing() {
        let text = vec!["Basement is rough, bare concrete throughout.".to_string()];
        assert_eq!(derive(&[], &[], &text), BasementSignal::Unfinished);
    }

    #[test]
    fn test_no_basement_phrasing_is_unfinished() {
        let text = vec!["Ranch on slab foundation, no basement.".to_string()];
        assert_eq!(derive(&[], &[], &text), BasementSignal::Unfinished);
    }

    #[test]
    fn test_absence_of_signal_is_unknown_not_unfinished() {
        let text = vec!["Charming three bedroom with large yard.".to_string()];
        assert_eq!(derive(&[], &[], &text), BasementSignal::Unknown);
        assert_eq!(derive(&[], &[], &[]), BasementSignal::Unknown);
    }

    #[test]
    fn test_bare_basement_mention_is_unknown() {
        // "Basement" with no finish context is ambiguous, not a yes.
        let text = vec!["Home has a basement.".to_string()];
        assert_eq!(derive(&[], &[], &text), BasementSignal::Unknown);
    }
}
