use serde::{Deserialize, Serialize};

use crate::anonymize::patterns::SectionKind;

pub const EMAIL_PLACEHOLDER: &str = "***@***.com";
pub const PHONE_PLACEHOLDER: &str = "XXX-XXX-XXXX";
pub const NAME_PLACEHOLDER: &str = "[CANDIDATE NAME]";
pub const ADDRESS_PLACEHOLDER: &str = "[ADDRESS]";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum EntityLabel {
    Person,
    Location,
}

/// A labelled region reported by an entity tagger. Offsets are byte offsets into the exact
/// text the tagger was given and mean nothing once that text has been rewritten.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EntitySpan {
    pub start: usize,
    pub end: usize,
    pub label: EntityLabel,
    pub text: String,
}

impl EntitySpan {
    pub fn new(start: usize, end: usize, label: EntityLabel, text: impl Into<String>) -> Self {
        Self {
            start,
            end,
            label,
            text: text.into(),
        }
    }
}

/// What was removed from the text. Field names follow the `masked_*` vocabulary the output
/// schema addresses them by.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PiiAuditRecord {
    #[serde(rename = "masked_emails")]
    pub emails: Vec<String>,
    #[serde(rename = "masked_phones")]
    pub phones: Vec<String>,
    #[serde(rename = "masked_name")]
    pub candidate_name: Option<String>,
    #[serde(rename = "masked_addresses")]
    pub addresses: Vec<String>,
}

impl PiiAuditRecord {
    pub fn is_empty(&self) -> bool {
        self.emails.is_empty()
            && self.phones.is_empty()
            && self.candidate_name.is_none()
            && self.addresses.is_empty()
    }

    /// Every recorded value, in audit order.
    pub fn values(&self) -> impl Iterator<Item = &str> {
        self.emails
            .iter()
            .chain(self.phones.iter())
            .chain(self.candidate_name.iter())
            .chain(self.addresses.iter())
            .map(String::as_str)
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExtractedSections {
    pub skills: Vec<String>,
    pub education: Vec<String>,
    pub experience: Vec<String>,
    pub certifications: Vec<String>,
}

impl ExtractedSections {
    pub fn get(&self, kind: SectionKind) -> &[String] {
        match kind {
            SectionKind::Skills => &self.skills,
            SectionKind::Education => &self.education,
            SectionKind::Experience => &self.experience,
            SectionKind::Certifications => &self.certifications,
        }
    }

    pub(crate) fn slot_mut(&mut self, kind: SectionKind) -> &mut Vec<String> {
        match kind {
            SectionKind::Skills => &mut self.skills,
            SectionKind::Education => &mut self.education,
            SectionKind::Experience => &mut self.experience,
            SectionKind::Certifications => &mut self.certifications,
        }
    }
}

/// Final output of one pipeline run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StructuredRecord {
    #[serde(rename = "anonymized_resume_text")]
    pub anonymized_text: String,
    #[serde(flatten)]
    pub sections: ExtractedSections,
    #[serde(flatten)]
    pub pii: PiiAuditRecord,
    /// True when the entity tagger could not be used and only emails/phones were masked.
    #[serde(rename = "degraded_mode")]
    pub degraded: bool,
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub degraded_reason: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_entity_label_serde_uppercase() {
        assert_eq!(
            serde_json::to_string(&EntityLabel::Person).unwrap(),
            r#""PERSON""#
        );
        let label: EntityLabel = serde_json::from_str(r#""LOCATION""#).unwrap();
        assert_eq!(label, EntityLabel::Location);
    }

    #[test]
    fn test_audit_values_in_order() {
        let audit = PiiAuditRecord {
            emails: vec!["a@b.io".into()],
            phones: vec!["555-123-4567".into()],
            candidate_name: Some("Jane Doe".into()),
            addresses: vec!["Boston".into()],
        };
        let values: Vec<_> = audit.values().collect();
        assert_eq!(values, vec!["a@b.io", "555-123-4567", "Jane Doe", "Boston"]);
        assert!(!audit.is_empty());
        assert!(PiiAuditRecord::default().is_empty());
    }

    #[test]
    fn test_record_serializes_flat_internal_names() {
        let record = StructuredRecord {
            anonymized_text: "Skills: Rust".into(),
            sections: ExtractedSections {
                skills: vec!["Rust".into()],
                ..Default::default()
            },
            pii: PiiAuditRecord::default(),
            degraded: false,
            degraded_reason: None,
        };
        let value = serde_json::to_value(&record).unwrap();
        assert_eq!(value["anonymized_resume_text"], "Skills: Rust");
        assert_eq!(value["skills"][0], "Rust");
        assert_eq!(value["masked_emails"], serde_json::json!([]));
        assert!(value["masked_name"].is_null());
        assert_eq!(value["degraded_mode"], false);
        assert!(value.get("degraded_reason").is_none());
    }
}
