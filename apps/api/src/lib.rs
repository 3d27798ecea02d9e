//! Resume anonymizer: masks contact details, the candidate's name and locations in resume
//! text, then pulls skills, education, experience and certifications out of what remains.
//!
//! The core (`anonymize::pipeline`) is synchronous and does no I/O. The HTTP layer wraps it
//! with an async entity-tagger backend and an output schema.

pub mod anonymize;
pub mod config;
pub mod errors;
pub mod llm_client;
pub mod routes;
pub mod state;
