//! Entity tagger capability: the seam between redaction and whatever recognises names and
//! places. The redactor only ever sees `EntitySpan`s or a `TaggerError`.

use std::time::Duration;

use thiserror::Error;

use crate::anonymize::models::{EntityLabel, EntitySpan};

/// Either variant means "no entities available"; the redactor degrades instead of failing.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum TaggerError {
    #[error("entity tagger unavailable: {0}")]
    Unavailable(String),

    #[error("entity tagger timed out after {0:?}")]
    TimedOut(Duration),
}

/// Synchronous entity recognition over one text snapshot.
///
/// Implementations must be stateless per call so one instance can serve concurrent requests.
pub trait EntityTagger: Send + Sync {
    fn tag(&self, text: &str) -> Result<Vec<EntitySpan>, TaggerError>;

    fn name(&self) -> &'static str;
}

/// Tagger used when entity recognition is switched off. Every call fails, so every record is
/// explicitly marked degraded rather than silently missing names.
pub struct DisabledTagger;

impl EntityTagger for DisabledTagger {
    fn tag(&self, _text: &str) -> Result<Vec<EntitySpan>, TaggerError> {
        Err(TaggerError::Unavailable(
            "entity tagging is disabled".to_string(),
        ))
    }

    fn name(&self) -> &'static str {
        "none"
    }
}

/// Builds a span for the first occurrence of `surface` in `text`, for backends that return
/// entity strings without offsets.
pub fn locate_span(text: &str, surface: &str, label: EntityLabel) -> Option<EntitySpan> {
    let surface = surface.trim();
    if surface.is_empty() {
        return None;
    }
    text.find(surface)
        .map(|start| EntitySpan::new(start, start + surface.len(), label, surface))
}
