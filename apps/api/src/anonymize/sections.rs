use std::sync::Arc;

use tracing::debug;

use crate::anonymize::models::ExtractedSections;
use crate::anonymize::patterns::{PatternLibrary, SectionKind};

/// Splits section bodies into items. Runs on anonymized text only.
#[derive(Debug, Clone)]
pub struct SectionExtractor {
    patterns: Arc<PatternLibrary>,
}

impl SectionExtractor {
    pub fn new(patterns: Arc<PatternLibrary>) -> Self {
        Self { patterns }
    }

    /// Never fails: a missing or empty section is an empty list.
    pub fn extract(&self, text: &str) -> ExtractedSections {
        let mut sections = ExtractedSections::default();

        for matcher in self.patterns.sections() {
            let kind = matcher.kind();
            let Some(found) = matcher.find_first(text) else {
                continue;
            };
            let items = split_items(kind, found.body);
            debug!(section = kind.as_str(), items = items.len(), "Extracted section");
            *sections.slot_mut(kind) = items;
        }

        sections
    }
}

/// Skills are one comma-separated line; other sections list one item per line.
fn split_items(kind: SectionKind, body: &str) -> Vec<String> {
    let separator = match kind {
        SectionKind::Skills => ',',
        _ => '\n',
    };
    body.trim()
        .split(separator)
        .map(str::trim)
        .filter(|item| !item.is_empty())
        .map(String::from)
        .collect()
}
