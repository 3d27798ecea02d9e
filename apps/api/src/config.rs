use std::path::PathBuf;
use std::str::FromStr;
use std::time::Duration;

use anyhow::{bail, Context, Result};

use crate::llm_client;

/// Which entity tagger backs the name/location pass.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TaggerKind {
    Heuristic,
    Llm,
    /// No tagger: every record is produced in degraded mode.
    Disabled,
}

impl FromStr for TaggerKind {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "heuristic" => Ok(TaggerKind::Heuristic),
            "llm" => Ok(TaggerKind::Llm),
            "none" | "disabled" => Ok(TaggerKind::Disabled),
            other => bail!("Unknown ENTITY_TAGGER '{other}' (expected heuristic, llm, or none)"),
        }
    }
}

/// Application configuration loaded from environment variables.
/// Start-up fails if a value is present but invalid.
#[derive(Debug, Clone)]
pub struct Config {
    pub port: u16,
    pub rust_log: String,
    pub tagger: TaggerKind,
    /// Required when `tagger` is `Llm`.
    pub anthropic_api_key: Option<String>,
    pub anthropic_api_url: String,
    pub tagger_timeout: Duration,
    pub max_text_bytes: usize,
    pub output_schema_path: Option<PathBuf>,
    pub extra_locations: Vec<String>,
}

impl Default for Config {
    fn default() -> Self {
        Config {
            port: 8080,
            rust_log: "info".to_string(),
            tagger: TaggerKind::Heuristic,
            anthropic_api_key: None,
            anthropic_api_url: llm_client::DEFAULT_API_URL.to_string(),
            tagger_timeout: Duration::from_secs(20),
            max_text_bytes: 5 * 1024 * 1024,
            output_schema_path: None,
            extra_locations: Vec::new(),
        }
    }
}

impl Config {
    pub fn from_env() -> Result<Self> {
        dotenvy::dotenv().ok(); // load .env if present; ignore if missing
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Builds the config from any key lookup; `from_env` passes the process environment.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self> {
        let defaults = Config::default();

        let tagger = match lookup("ENTITY_TAGGER") {
            Some(v) => v.parse()?,
            None => defaults.tagger,
        };
        let anthropic_api_key = lookup("ANTHROPIC_API_KEY").filter(|k| !k.trim().is_empty());
        if tagger == TaggerKind::Llm && anthropic_api_key.is_none() {
            bail!("ENTITY_TAGGER=llm requires ANTHROPIC_API_KEY to be set");
        }

        Ok(Config {
            port: parse_or("PORT", &lookup, defaults.port)?,
            rust_log: lookup("RUST_LOG").unwrap_or(defaults.rust_log),
            tagger,
            anthropic_api_key,
            anthropic_api_url: lookup("ANTHROPIC_API_URL")
                .filter(|u| !u.trim().is_empty())
                .unwrap_or(defaults.anthropic_api_url),
            tagger_timeout: Duration::from_secs(parse_or(
                "TAGGER_TIMEOUT_SECS",
                &lookup,
                defaults.tagger_timeout.as_secs(),
            )?),
            max_text_bytes: parse_or("MAX_TEXT_BYTES", &lookup, defaults.max_text_bytes)?,
            output_schema_path: lookup("OUTPUT_SCHEMA_PATH")
                .filter(|p| !p.trim().is_empty())
                .map(PathBuf::from),
            extra_locations: lookup("EXTRA_LOCATIONS")
                .map(|v| {
                    v.split(',')
                        .map(str::trim)
                        .filter(|s| !s.is_empty())
                        .map(String::from)
                        .collect()
                })
                .unwrap_or_default(),
        })
    }
}

fn parse_or<T>(key: &str, lookup: &impl Fn(&str) -> Option<String>, default: T) -> Result<T>
where
    T: FromStr,
    T::Err: std::error::Error + Send + Sync + 'static,
{
    match lookup(key) {
        Some(v) => v
            .trim()
            .parse::<T>()
            .with_context(|| format!("{key} has an invalid value '{v}'")),
        None => Ok(default),
    }
}
