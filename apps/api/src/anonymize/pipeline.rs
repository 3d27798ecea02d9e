use std::sync::Arc;

use tracing::debug;

use crate::anonymize::models::StructuredRecord;
use crate::anonymize::patterns::PatternLibrary;
use crate::anonymize::redactor::{Redaction, Redactor};
use crate::anonymize::sections::SectionExtractor;
use crate::anonymize::tagger::EntityTagger;

/// Redaction followed by section extraction over the redacted text. No I/O, no shared mutable
/// state; clone freely across tasks.
#[derive(Debug, Clone)]
pub struct Pipeline {
    redactor: Redactor,
    extractor: SectionExtractor,
}

impl Pipeline {
    pub fn new(patterns: Arc<PatternLibrary>) -> Self {
        Self {
            redactor: Redactor::new(Arc::clone(&patterns)),
            extractor: SectionExtractor::new(patterns),
        }
    }

    pub fn redactor(&self) -> &Redactor {
        &self.redactor
    }

    pub fn run(&self, raw: &str, tagger: &dyn EntityTagger) -> StructuredRecord {
        let redaction = self.redactor.redact(raw, tagger);
        self.finish(redaction)
    }

    /// Extracts sections from an already redacted text and assembles the record.
    pub fn finish(&self, redaction: Redaction) -> StructuredRecord {
        let Redaction {
            text,
            audit,
            degraded,
        } = redaction;

        let sections = self.extractor.extract(&text);
        debug!(
            degraded = degraded.is_some(),
            skills = sections.skills.len(),
            education = sections.education.len(),
            experience = sections.experience.len(),
            certifications = sections.certifications.len(),
            "Pipeline finished"
        );

        StructuredRecord {
            anonymized_text: text,
            sections,
            pii: audit,
            degraded: degraded.is_some(),
            degraded_reason: degraded.map(|e| e.to_string()),
        }
    }
}
