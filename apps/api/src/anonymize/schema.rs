//! Output schema: renames record fields into the shape clients consume.
//!
//! The schema is an ordered, immutable value held in `AppState`; nothing about it is global.
//! Any internal field without a value renders as JSON `null` instead of being omitted, and the
//! degraded-mode flag is always present in the output, under its internal name if the schema
//! does not map it.

use std::path::Path;

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::anonymize::models::StructuredRecord;

const DEGRADED_FIELD: &str = "degraded_mode";

/// Source of one output key: a single internal field, or several rendered as a nested object.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum SchemaField {
    Single(String),
    Nested(Vec<String>),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OutputSchema {
    fields: Vec<(String, SchemaField)>,
}

impl Default for OutputSchema {
    fn default() -> Self {
        Self::from_pairs(&[
            ("Skill_Set", "skills"),
            ("Experience_Summary", "experience"),
            ("Anonymized_Resume_Text", "anonymized_resume_text"),
            ("Certifications_List", "certifications"),
            ("Education_Records", "education"),
            ("Degraded_Mode", DEGRADED_FIELD),
        ])
    }
}

impl OutputSchema {
    pub fn new(fields: Vec<(String, SchemaField)>) -> Self {
        Self { fields }
    }

    pub fn from_pairs(pairs: &[(&str, &str)]) -> Self {
        Self::new(
            pairs
                .iter()
                .map(|(key, field)| (key.to_string(), SchemaField::Single(field.to_string())))
                .collect(),
        )
    }

    /// Parses a JSON object of `"Output_Key": "internal_field"` (or a list of internal fields).
    /// Key order in the document is kept.
    pub fn from_json(json: &str) -> Result<Self> {
        let map: Map<String, Value> =
            serde_json::from_str(json).context("Output schema must be a JSON object")?;
        let fields = map
            .into_iter()
            .map(|(key, value)| {
                let field: SchemaField = serde_json::from_value(value).with_context(|| {
                    format!("Output schema key '{key}' must map to a string or a list of strings")
                })?;
                Ok((key, field))
            })
            .collect::<Result<Vec<_>>>()?;
        Ok(Self::new(fields))
    }

    pub fn load(path: &Path) -> Result<Self> {
        let json = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read output schema from {}", path.display()))?;
        Self::from_json(&json)
    }

    pub fn fields(&self) -> &[(String, SchemaField)] {
        &self.fields
    }

    /// Whether any output key (nested or not) is sourced from `field`.
    pub fn maps(&self, field: &str) -> bool {
        self.fields.iter().any(|(_, source)| match source {
            SchemaField::Single(name) => name == field,
            SchemaField::Nested(names) => names.iter().any(|name| name == field),
        })
    }

    pub fn apply(&self, record: &StructuredRecord) -> Map<String, Value> {
        let flat = record_fields(record);
        let lookup = |name: &str| flat.get(name).cloned().unwrap_or(Value::Null);

        let mut out: Map<String, Value> = self
            .fields
            .iter()
            .map(|(key, field)| {
                let value = match field {
                    SchemaField::Single(name) => lookup(name),
                    SchemaField::Nested(names) => Value::Object(
                        names
                            .iter()
                            .map(|name| (name.clone(), lookup(name)))
                            .collect(),
                    ),
                };
                (key.clone(), value)
            })
            .collect();

        if !self.maps(DEGRADED_FIELD) {
            out.insert(DEGRADED_FIELD.to_string(), Value::Bool(record.degraded));
        }
        out
    }
}

/// The record as a flat map keyed by internal field name.
fn record_fields(record: &StructuredRecord) -> Map<String, Value> {
    match serde_json::to_value(record) {
        Ok(Value::Object(map)) => map,
        _ => Map::new(),
    }
}
