use std::sync::Arc;

use anyhow::{Context, Result};
use tracing::{info, warn};

use crate::anonymize::backend::{LlmEntityTagger, LocalTagger, TaggerBackend};
use crate::anonymize::heuristic::HeuristicTagger;
use crate::anonymize::patterns::PatternLibrary;
use crate::anonymize::pipeline::Pipeline;
use crate::anonymize::schema::OutputSchema;
use crate::anonymize::tagger::DisabledTagger;
use crate::config::{Config, TaggerKind};
use crate::llm_client::{self, LlmClient};

/// Shared application state injected into all route handlers via Axum extractors.
#[derive(Clone)]
pub struct AppState {
    pub config: Config,
    /// Compiled once at startup; cheap to clone (patterns are behind an `Arc`).
    pub pipeline: Pipeline,
    /// Pluggable entity tagger. Default: heuristic. Swap via ENTITY_TAGGER.
    pub tagger: Arc<dyn TaggerBackend>,
    /// Output field mapping for `/api/v1/parse`. Immutable after startup.
    pub output_schema: Arc<OutputSchema>,
}

impl AppState {
    /// Compiles patterns, picks the tagger backend, and loads the output schema.
    /// A pattern that fails to compile aborts startup.
    pub fn from_config(config: Config) -> Result<Self> {
        let patterns = Arc::new(PatternLibrary::new().context("Pattern library failed to build")?);
        let pipeline = Pipeline::new(patterns);

        let tagger: Arc<dyn TaggerBackend> = match config.tagger {
            TaggerKind::Heuristic => {
                let heuristic = HeuristicTagger::new(&config.extra_locations)
                    .context("Heuristic tagger failed to build")?;
                Arc::new(LocalTagger(Arc::new(heuristic)))
            }
            TaggerKind::Llm => {
                let api_key = config
                    .anthropic_api_key
                    .clone()
                    .context("ENTITY_TAGGER=llm requires ANTHROPIC_API_KEY")?;
                let llm =
                    LlmClient::new(&config.anthropic_api_url, api_key, config.tagger_timeout)
                    .context("Failed to build LLM client")?;
                info!("LLM entity tagger initialized (model: {})", llm_client::MODEL);
                Arc::new(LlmEntityTagger::new(llm))
            }
            TaggerKind::Disabled => {
                warn!("Entity tagging disabled; every record will be degraded");
                Arc::new(LocalTagger(Arc::new(DisabledTagger)))
            }
        };

        let output_schema = match &config.output_schema_path {
            Some(path) => OutputSchema::load(path)?,
            None => OutputSchema::default(),
        };
        info!(
            "Entity tagger: {}, output schema: {} fields",
            tagger.name(),
            output_schema.fields().len()
        );

        Ok(AppState {
            config,
            pipeline,
            tagger,
            output_schema: Arc::new(output_schema),
        })
    }
}
