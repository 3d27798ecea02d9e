pub mod health;

use axum::{
    extract::DefaultBodyLimit,
    routing::{get, post},
    Router,
};

use crate::anonymize::handlers;
use crate::state::AppState;

/// JSON framing on top of the text itself.
const BODY_OVERHEAD_BYTES: usize = 64 * 1024;

pub fn build_router(state: AppState) -> Router {
    // JSON escaping can inflate the text, so the raw body gets headroom; the handler enforces
    // the exact limit on the decoded text.
    let body_limit = state
        .config
        .max_text_bytes
        .saturating_mul(2)
        .saturating_add(BODY_OVERHEAD_BYTES);

    Router::new()
        .route("/health", get(health::health_handler))
        .route("/api/v1/anonymize", post(handlers::handle_anonymize))
        .route("/api/v1/parse", post(handlers::handle_parse))
        .layer(DefaultBodyLimit::max(body_limit))
        .with_state(state)
}
