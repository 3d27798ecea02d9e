//! Redactor: masks contact details and tagged entities, in a fixed order.
//!
//! 1. emails, 2. phone numbers, 3. one tagger call on the result, then the candidate name and
//!    every location. Each pass reads the output of the previous one, and tagger spans are only
//!    ever interpreted against the exact snapshot they were computed on.
//!
//! Names and locations are masked by literal substitution of every occurrence of the surface
//! string, not by offset. This over-matches on purpose (a name repeated in a footer is caught
//! too) and can also mask an unrelated word that happens to equal a place name.

use std::collections::{HashMap, HashSet};
use std::sync::Arc;

use regex::NoExpand;
use tracing::{debug, warn};

use crate::anonymize::models::{
    EntityLabel, EntitySpan, PiiAuditRecord, ADDRESS_PLACEHOLDER, EMAIL_PLACEHOLDER,
    NAME_PLACEHOLDER, PHONE_PLACEHOLDER,
};
use crate::anonymize::patterns::PatternLibrary;
use crate::anonymize::tagger::{EntityTagger, TaggerError};

/// Text after the email and phone passes, plus what they removed. This is the snapshot the
/// entity tagger must be run against.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ContactRedaction {
    pub text: String,
    pub emails: Vec<String>,
    pub phones: Vec<String>,
}

/// Fully redacted text with its audit trail.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Redaction {
    pub text: String,
    pub audit: PiiAuditRecord,
    /// Set when the tagger failed and only emails/phones were masked.
    pub degraded: Option<TaggerError>,
}

impl Redaction {
    pub fn is_degraded(&self) -> bool {
        self.degraded.is_some()
    }
}

#[derive(Debug, Clone)]
pub struct Redactor {
    patterns: Arc<PatternLibrary>,
}

impl Redactor {
    pub fn new(patterns: Arc<PatternLibrary>) -> Self {
        Self { patterns }
    }

    /// Runs all passes with a synchronous tagger.
    pub fn redact(&self, raw: &str, tagger: &dyn EntityTagger) -> Redaction {
        let contacts = self.mask_contacts(raw);
        let tagged = tagger.tag(&contacts.text);
        self.mask_entities(contacts, tagged)
    }

    /// Passes 1 and 2: emails, then phone numbers found in the email-masked text.
    pub fn mask_contacts(&self, raw: &str) -> ContactRedaction {
        let email = self.patterns.email();
        let emails: Vec<String> = email.find_all(raw).into_iter().map(String::from).collect();
        let text = email
            .regex()
            .replace_all(raw, NoExpand(EMAIL_PLACEHOLDER))
            .into_owned();

        let phone = self.patterns.phone();
        let phones: Vec<String> = phone
            .find_all(&text)
            .into_iter()
            .map(|m| m.number)
            .collect();
        let text = phone
            .regex()
            .replace_all(&text, NoExpand(PHONE_PLACEHOLDER))
            .into_owned();

        debug!(
            emails = emails.len(),
            phones = phones.len(),
            "Masked contact details"
        );

        ContactRedaction {
            text,
            emails,
            phones,
        }
    }

    /// Pass 3: applies the tagger's verdict on `contacts.text`. A tagger error yields a
    /// degraded redaction with no name or addresses.
    pub fn mask_entities(
        &self,
        contacts: ContactRedaction,
        tagged: Result<Vec<EntitySpan>, TaggerError>,
    ) -> Redaction {
        let ContactRedaction {
            text: snapshot,
            emails,
            phones,
        } = contacts;

        let mut audit = PiiAuditRecord {
            emails,
            phones,
            ..Default::default()
        };

        let spans = match tagged {
            Ok(spans) => spans,
            Err(e) => {
                warn!(error = %e, "Entity tagger failed, masking emails and phones only");
                return Redaction {
                    text: snapshot,
                    audit,
                    degraded: Some(e),
                };
            }
        };

        let spans = usable_spans(&snapshot, spans);
        debug!(spans = spans.len(), "Applying entity spans");

        let mut text = snapshot.clone();

        if let Some(person) = spans.iter().find(|s| s.label == EntityLabel::Person) {
            text = text.replace(&person.text, NAME_PLACEHOLDER);
            audit.candidate_name = Some(person.text.clone());
        }

        // Every span is recorded, so the list can hold duplicates, but each distinct surface is
        // substituted once: a second pass over the same string finds nothing.
        let mut replaced: HashSet<&str> = HashSet::new();
        for location in spans.iter().filter(|s| s.label == EntityLabel::Location) {
            if replaced.insert(location.text.as_str()) {
                text = text.replace(&location.text, ADDRESS_PLACEHOLDER);
            }
            audit.addresses.push(location.text.clone());
        }

        Redaction {
            text,
            audit,
            degraded: None,
        }
    }
}

/// Drops spans whose surface is blank or absent from the snapshot, then orders the rest by
/// position. The sort is stable, so spans at the same offset keep tagger order.
fn usable_spans(snapshot: &str, spans: Vec<EntitySpan>) -> Vec<EntitySpan> {
    let mut present: HashMap<String, bool> = HashMap::new();
    let mut kept = Vec::with_capacity(spans.len());

    for span in spans {
        if span.text.trim().is_empty() {
            continue;
        }
        let found = *present
            .entry(span.text.clone())
            .or_insert_with(|| snapshot.contains(span.text.as_str()));
        if !found {
            warn!(
                label = ?span.label,
                start = span.start,
                end = span.end,
                "Dropping entity span not present in tagged text"
            );
            continue;
        }
        kept.push(span);
    }

    kept.sort_by_key(|span| span.start);
    kept
}

#[cfg(test)]
mod tests {
    use std::sync::Mutex;

    use super::*;
    use crate::anonymize::tagger::fixtures::FixedTagger;

    fn redactor() -> Redactor {
        Redactor::new(Arc::new(PatternLibrary::new().unwrap()))
    }

    /// Remembers the text it was asked to tag.
    struct SnapshotTagger {
        seen: Mutex<Option<String>>,
        spans: Vec<(EntityLabel, &'static str)>,
    }

    impl EntityTagger for SnapshotTagger {
        fn tag(&self, text: &str) -> Result<Vec<EntitySpan>, TaggerError> {
            *self.seen.lock().unwrap() = Some(text.to_string());
            Ok(FixedTagger::locating(text, &self.spans).0.unwrap())
        }

        fn name(&self) -> &'static str {
            "snapshot"
        }
    }

    #[test]
    fn test_email_and_phone_masked() {
        let raw = "Contact: jane@example.com or 555-123-4567. Skills: Python, SQL, Go";
        let r = redactor().redact(raw, &FixedTagger(Ok(vec![])));

        assert_eq!(r.audit.emails, vec!["jane@example.com"]);
        assert_eq!(r.audit.phones, vec!["555-123-4567"]);
        assert_eq!(
            r.text,
            "Contact: ***@***.com or XXX-XXX-XXXX. Skills: Python, SQL, Go"
        );
        assert!(!r.is_degraded());
    }

    #[test]
    fn test_phone_audit_excludes_country_prefix() {
        let r = redactor().redact("Call +1 (555) 123-4567 now", &FixedTagger(Ok(vec![])));
        assert_eq!(r.audit.phones, vec!["(555) 123-4567"]);
        assert!(!r.text.contains("123-4567"));
        assert!(r.text.contains(PHONE_PLACEHOLDER));
    }

    #[test]
    fn test_emails_masked_before_phones() {
        let r = redactor().redact("5551234567@example.com", &FixedTagger(Ok(vec![])));
        assert_eq!(r.audit.emails, vec!["5551234567@example.com"]);
        assert!(r.audit.phones.is_empty());
        assert_eq!(r.text, EMAIL_PLACEHOLDER);
    }

    #[test]
    fn test_tagger_sees_contact_masked_text() {
        let tagger = SnapshotTagger {
            seen: Mutex::new(None),
            spans: vec![],
        };
        redactor().redact("Jane jane@example.com 555-123-4567", &tagger);
        let seen = tagger.seen.lock().unwrap().clone().unwrap();
        assert_eq!(seen, "Jane ***@***.com XXX-XXX-XXXX");
    }

    #[test]
    fn test_every_occurrence_of_name_replaced() {
        let raw = "Jane Doe\nSoftware Engineer\nReferences: ask Jane Doe";
        let tagger = SnapshotTagger {
            seen: Mutex::new(None),
            spans: vec![(EntityLabel::Person, "Jane Doe")],
        };
        let r = redactor().redact(raw, &tagger);
        assert_eq!(
            r.text,
            "[CANDIDATE NAME]\nSoftware Engineer\nReferences: ask [CANDIDATE NAME]"
        );
        assert_eq!(r.audit.candidate_name.as_deref(), Some("Jane Doe"));
    }

    #[test]
    fn test_only_first_person_is_candidate() {
        let raw = "Jane Doe worked with John Smith";
        let tagger = FixedTagger(Ok(vec![
            EntitySpan::new(21, 31, EntityLabel::Person, "John Smith"),
            EntitySpan::new(0, 8, EntityLabel::Person, "Jane Doe"),
        ]));
        let r = redactor().redact(raw, &tagger);
        assert_eq!(r.audit.candidate_name.as_deref(), Some("Jane Doe"));
        assert_eq!(r.text, "[CANDIDATE NAME] worked with John Smith");
    }

    #[test]
    fn test_all_locations_replaced_and_recorded() {
        let raw = "Lives in Boston, Massachusetts. Moved from Denver.";
        let tagger = SnapshotTagger {
            seen: Mutex::new(None),
            spans: vec![
                (EntityLabel::Location, "Boston"),
                (EntityLabel::Location, "Massachusetts"),
                (EntityLabel::Location, "Denver"),
            ],
        };
        let r = redactor().redact(raw, &tagger);
        assert_eq!(
            r.text,
            "Lives in [ADDRESS], [ADDRESS]. Moved from [ADDRESS]."
        );
        assert_eq!(r.audit.addresses, vec!["Boston", "Massachusetts", "Denver"]);
    }

    #[test]
    fn test_duplicate_location_spans_kept_in_audit() {
        let raw = "Austin office, Austin team";
        let tagger = FixedTagger(Ok(vec![
            EntitySpan::new(0, 6, EntityLabel::Location, "Austin"),
            EntitySpan::new(15, 21, EntityLabel::Location, "Austin"),
        ]));
        let r = redactor().redact(raw, &tagger);
        assert_eq!(r.text, "[ADDRESS] office, [ADDRESS] team");
        assert_eq!(r.audit.addresses, vec!["Austin", "Austin"]);
    }

    #[test]
    fn test_location_substring_of_word_is_masked_too() {
        let raw = "Reading, PA. Enjoys Reading books";
        let tagger = FixedTagger(Ok(vec![EntitySpan::new(
            0,
            7,
            EntityLabel::Location,
            "Reading",
        )]));
        let r = redactor().redact(raw, &tagger);
        assert_eq!(r.text, "[ADDRESS], PA. Enjoys [ADDRESS] books");
    }

    #[test]
    fn test_spans_not_in_text_are_dropped() {
        let tagger = FixedTagger(Ok(vec![
            EntitySpan::new(0, 5, EntityLabel::Person, "Ghost"),
            EntitySpan::new(0, 0, EntityLabel::Location, " "),
        ]));
        let r = redactor().redact("Plain resume text", &tagger);
        assert_eq!(r.text, "Plain resume text");
        assert!(r.audit.candidate_name.is_none());
        assert!(r.audit.addresses.is_empty());
    }

    #[test]
    fn test_tagger_failure_degrades() {
        let raw = "Jane Doe, jane@example.com, 555-123-4567";
        let r = redactor().redact(raw, &FixedTagger::failing());
        assert!(r.is_degraded());
        assert_eq!(r.text, "Jane Doe, ***@***.com, XXX-XXX-XXXX");
        assert!(r.audit.candidate_name.is_none());
        assert!(r.audit.addresses.is_empty());
        assert_eq!(r.audit.emails, vec!["jane@example.com"]);
    }

    #[test]
    fn test_no_matches_leaves_text_unchanged() {
        let raw = "Experienced engineer.\n\nSkills: Rust";
        let r = redactor().redact(raw, &FixedTagger(Ok(vec![])));
        assert_eq!(r.text, raw);
        assert!(r.audit.is_empty());
    }

    #[test]
    fn test_redaction_is_deterministic() {
        let raw = "Jane Doe\njane@example.com | 555-123-4567 | Boston\nJane Doe";
        let tagger = SnapshotTagger {
            seen: Mutex::new(None),
            spans: vec![
                (EntityLabel::Person, "Jane Doe"),
                (EntityLabel::Location, "Boston"),
            ],
        };
        let first = redactor().redact(raw, &tagger);
        let second = redactor().redact(raw, &tagger);
        assert_eq!(first, second);
    }

    #[test]
    fn test_no_audited_value_leaks() {
        let raw = "Jane Doe | jane@example.com | +1 555.123.4567 | Denver, Colorado\n\
                   Reach Jane Doe at 555-987-6543";
        let tagger = SnapshotTagger {
            seen: Mutex::new(None),
            spans: vec![
                (EntityLabel::Person, "Jane Doe"),
                (EntityLabel::Location, "Denver"),
                (EntityLabel::Location, "Colorado"),
            ],
        };
        let r = redactor().redact(raw, &tagger);
        assert_eq!(r.audit.phones.len(), 2);
        for value in r.audit.values() {
            assert!(raw.contains(value), "{value} was never in the input");
            assert!(!r.text.contains(value), "{value} leaked into {}", r.text);
        }
    }

    #[test]
    fn test_phone_audit_is_verbatim_number_without_prefix() {
        let raw = "Mobile +1 555.123.4567";
        let r = redactor().redact(raw, &FixedTagger(Ok(vec![])));
        assert_eq!(r.audit.phones, vec!["555.123.4567"]);
        assert!(raw.contains(r.audit.phones[0].as_str()));
        assert!(!r.text.contains("555.123.4567"));
        assert!(r.text.contains(PHONE_PLACEHOLDER));
    }

    #[test]
    fn test_many_repeated_locations() {
        let raw = "Boston, Denver; ".repeat(20_000);
        let spans: Vec<EntitySpan> = (0..20_000)
            .flat_map(|i| {
                let base = i * 16;
                [
                    EntitySpan::new(base, base + 6, EntityLabel::Location, "Boston"),
                    EntitySpan::new(base + 8, base + 14, EntityLabel::Location, "Denver"),
                ]
            })
            .collect();

        let r = redactor().redact(&raw, &FixedTagger(Ok(spans)));
        assert_eq!(r.audit.addresses.len(), 40_000);
        assert_eq!(r.audit.addresses[0], "Boston");
        assert_eq!(r.audit.addresses[1], "Denver");
        assert!(!r.text.contains("Boston"));
        assert!(!r.text.contains("Denver"));
        assert_eq!(r.text, "[ADDRESS], [ADDRESS]; ".repeat(20_000));
    }
}
