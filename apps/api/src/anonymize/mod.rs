// Resume anonymization: contact and entity redaction, then section extraction.
// The pipeline itself is synchronous and I/O-free; only `backend` and `handlers` touch async.

pub mod backend;
pub mod handlers;
pub mod heuristic;
pub mod models;
pub mod patterns;
pub mod pipeline;
pub mod prompts;
pub mod redactor;
pub mod schema;
pub mod sections;
pub mod tagger;
