use axum::{extract::State, Json};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use tracing::{info, info_span, Instrument};
use uuid::Uuid;

use crate::anonymize::backend::run_with_backend;
use crate::anonymize::models::StructuredRecord;
use crate::errors::AppError;
use crate::state::AppState;

#[derive(Debug, Deserialize)]
pub struct AnonymizeRequest {
    /// Plain text already decoded from the uploaded document.
    pub text: String,
}

#[derive(Debug, Serialize)]
pub struct AnonymizeResponse {
    pub request_id: Uuid,
    pub processed_at: DateTime<Utc>,
    pub tagger: &'static str,
    pub record: StructuredRecord,
}

/// POST /api/v1/anonymize
pub async fn handle_anonymize(
    State(state): State<AppState>,
    Json(req): Json<AnonymizeRequest>,
) -> Result<Json<AnonymizeResponse>, AppError> {
    let request_id = Uuid::new_v4();
    let record = anonymize(&state, &req.text)
        .instrument(info_span!("anonymize", %request_id))
        .await?;

    Ok(Json(AnonymizeResponse {
        request_id,
        processed_at: Utc::now(),
        tagger: state.tagger.name(),
        record,
    }))
}

/// POST /api/v1/parse
///
/// Same processing as `/anonymize`, rendered through the configured output schema.
pub async fn handle_parse(
    State(state): State<AppState>,
    Json(req): Json<AnonymizeRequest>,
) -> Result<Json<Map<String, Value>>, AppError> {
    let request_id = Uuid::new_v4();
    let record = anonymize(&state, &req.text)
        .instrument(info_span!("parse", %request_id))
        .await?;

    Ok(Json(state.output_schema.apply(&record)))
}

async fn anonymize(state: &AppState, text: &str) -> Result<StructuredRecord, AppError> {
    let limit = state.config.max_text_bytes;
    if text.len() > limit {
        return Err(AppError::PayloadTooLarge(format!(
            "Resume text is {} bytes; the limit is {limit} bytes",
            text.len()
        )));
    }

    let record = run_with_backend(
        &state.pipeline,
        state.tagger.as_ref(),
        state.config.tagger_timeout,
        text,
    )
    .await?;

    info!(
        tagger = state.tagger.name(),
        degraded = record.degraded,
        emails = record.pii.emails.len(),
        phones = record.pii.phones.len(),
        addresses = record.pii.addresses.len(),
        "Resume anonymized"
    );

    Ok(record)
}
