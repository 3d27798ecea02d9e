//! Tagger backends: async adapters the HTTP layer awaits between the contact and entity passes.
//!
//! `AppState` holds an `Arc<dyn TaggerBackend>`, chosen at startup via `ENTITY_TAGGER`.
//! The regex passes and in-process taggers are CPU-bound and run on the blocking pool, so the
//! tagger deadline applies to them as well as to the LLM backend.

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use serde::Deserialize;
use tracing::{debug, warn};

use crate::anonymize::models::{EntityLabel, EntitySpan, StructuredRecord};
use crate::anonymize::pipeline::Pipeline;
use crate::anonymize::prompts::{ENTITY_TAG_PROMPT_TEMPLATE, ENTITY_TAG_SYSTEM};
use crate::anonymize::tagger::{locate_span, EntityTagger, TaggerError};
use crate::errors::AppError;
use crate::llm_client::LlmClient;

#[async_trait]
pub trait TaggerBackend: Send + Sync {
    async fn tag(&self, text: &str) -> Result<Vec<EntitySpan>, TaggerError>;

    fn name(&self) -> &'static str;
}

/// Runs an in-process `EntityTagger`.
pub struct LocalTagger(pub Arc<dyn EntityTagger>);

#[async_trait]
impl TaggerBackend for LocalTagger {
    async fn tag(&self, text: &str) -> Result<Vec<EntitySpan>, TaggerError> {
        let tagger = Arc::clone(&self.0);
        let text = text.to_string();
        tokio::task::spawn_blocking(move || tagger.tag(&text))
            .await
            .map_err(|e| TaggerError::Unavailable(format!("tagger task failed: {e}")))?
    }

    fn name(&self) -> &'static str {
        self.0.name()
    }
}

#[derive(Debug, Deserialize)]
struct TaggedEntities {
    entities: Vec<TaggedEntity>,
}

#[derive(Debug, Deserialize)]
struct TaggedEntity {
    label: String,
    text: String,
}

/// Entity recognition via the LLM. Only ever sees text whose emails and phones are masked.
pub struct LlmEntityTagger {
    llm: LlmClient,
}

impl LlmEntityTagger {
    pub fn new(llm: LlmClient) -> Self {
        Self { llm }
    }
}

#[async_trait]
impl TaggerBackend for LlmEntityTagger {
    async fn tag(&self, text: &str) -> Result<Vec<EntitySpan>, TaggerError> {
        if text.trim().is_empty() {
            return Ok(Vec::new());
        }

        let prompt = ENTITY_TAG_PROMPT_TEMPLATE.replace("{resume_text}", text);
        let response: TaggedEntities = self
            .llm
            .call_json(&prompt, ENTITY_TAG_SYSTEM)
            .await
            .map_err(|e| TaggerError::Unavailable(format!("LLM entity tagging failed: {e}")))?;

        Ok(entities_to_spans(text, response.entities))
    }

    fn name(&self) -> &'static str {
        "llm"
    }
}

/// Anchors each returned entity at its first occurrence. Unknown labels and strings the model
/// invented are skipped.
fn entities_to_spans(text: &str, entities: Vec<TaggedEntity>) -> Vec<EntitySpan> {
    entities
        .into_iter()
        .filter_map(|entity| {
            let label = match entity.label.to_ascii_uppercase().as_str() {
                "PERSON" => EntityLabel::Person,
                "LOCATION" | "GPE" | "LOC" => EntityLabel::Location,
                other => {
                    debug!(label = other, "Ignoring entity with unsupported label");
                    return None;
                }
            };
            locate_span(text, &entity.text, label)
        })
        .collect()
}

/// Full pipeline with an async tagger, bounded by `timeout`. A timeout is a tagger failure
/// like any other and produces a degraded record.
pub async fn run_with_backend(
    pipeline: &Pipeline,
    backend: &dyn TaggerBackend,
    timeout: Duration,
    raw: &str,
) -> Result<StructuredRecord, AppError> {
    let p = pipeline.clone();
    let raw = raw.to_string();
    let contacts = blocking("contact masking", move || p.redactor().mask_contacts(&raw)).await?;

    let tagged = match tokio::time::timeout(timeout, backend.tag(&contacts.text)).await {
        Ok(result) => result,
        Err(_) => {
            warn!(backend = backend.name(), ?timeout, "Entity tagger timed out");
            Err(TaggerError::TimedOut(timeout))
        }
    };

    let p = pipeline.clone();
    blocking("entity masking", move || {
        let redaction = p.redactor().mask_entities(contacts, tagged);
        p.finish(redaction)
    })
    .await
}

async fn blocking<T, F>(stage: &'static str, f: F) -> Result<T, AppError>
where
    F: FnOnce() -> T + Send + 'static,
    T: Send + 'static,
{
    tokio::task::spawn_blocking(f).await.map_err(|e| {
        AppError::Internal(anyhow::anyhow!("spawn_blocking failed in {stage}: {e}"))
    })
}
