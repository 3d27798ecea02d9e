//! Pattern library: compiled matchers for contact details and resume section headers.
//!
//! Built once at start-up and shared read-only (`Arc<PatternLibrary>`). Every matcher is a
//! pure function of its input, so a single library serves any number of concurrent requests.

use regex::Regex;
use serde::{Deserialize, Serialize};
use thiserror::Error;

const EMAIL_PATTERN: &str = r"\b[A-Za-z0-9._%+-]+@[A-Za-z0-9.-]+\.[A-Za-z]{2,}\b";

/// Optional country-code prefix followed by a 10-digit number. Only `number` is PII we report;
/// the prefix is swallowed by the replacement but never recorded on its own.
const PHONE_PATTERN: &str = r"\b(?P<prefix>\+?\d{1,3}[-.\s]??)?(?P<number>\(?\d{3}\)?[-.\s]??\d{3}[-.\s]??\d{4}|\d{10})\b";

/// Skills run to the end of the line; every other section runs to the next blank line.
const LINE_TERMINATOR: &str = r"(?:\n|$)";
const BLANK_LINE_TERMINATOR: &str = r"(?:\n\n|$)";

#[derive(Debug, Error)]
#[error("failed to compile {name} pattern: {source}")]
pub struct PatternCompileError {
    pub name: String,
    #[source]
    pub source: regex::Error,
}

/// Resume sections recognised by header keyword.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SectionKind {
    Skills,
    Education,
    Experience,
    Certifications,
}

impl SectionKind {
    pub const ALL: [SectionKind; 4] = [
        SectionKind::Skills,
        SectionKind::Education,
        SectionKind::Experience,
        SectionKind::Certifications,
    ];

    /// Header keywords as regex fragments, highest priority first.
    fn header_keywords(self) -> &'static [&'static str] {
        match self {
            SectionKind::Skills => &["Skills?"],
            SectionKind::Education => &["Education"],
            SectionKind::Experience => &["Experience", "Work History"],
            SectionKind::Certifications => &["Certifications"],
        }
    }

    fn terminator(self) -> &'static str {
        match self {
            SectionKind::Skills => LINE_TERMINATOR,
            _ => BLANK_LINE_TERMINATOR,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            SectionKind::Skills => "skills",
            SectionKind::Education => "education",
            SectionKind::Experience => "experience",
            SectionKind::Certifications => "certifications",
        }
    }
}

/// A phone number located in text.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PhoneMatch {
    /// The whole match, prefix included. This is what gets replaced.
    pub full: String,
    /// The number without any country-code prefix, as written.
    pub number: String,
    /// `number` with every non-digit removed.
    pub digits: String,
    pub start: usize,
    pub end: usize,
}

/// The body of the first occurrence of a section header.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SectionMatch<'t> {
    pub kind: SectionKind,
    pub header: &'t str,
    pub body: &'t str,
}

#[derive(Debug, Clone)]
pub struct EmailMatcher {
    regex: Regex,
}

impl EmailMatcher {
    /// Every email address in document order.
    pub fn find_all<'t>(&self, text: &'t str) -> Vec<&'t str> {
        self.regex.find_iter(text).map(|m| m.as_str()).collect()
    }

    pub fn regex(&self) -> &Regex {
        &self.regex
    }
}

#[derive(Debug, Clone)]
pub struct PhoneMatcher {
    regex: Regex,
}

impl PhoneMatcher {
    /// Every phone number in document order.
    pub fn find_all(&self, text: &str) -> Vec<PhoneMatch> {
        self.regex
            .captures_iter(text)
            .filter_map(|caps| {
                let full = caps.get(0)?;
                let number = caps.name("number")?.as_str();
                Some(PhoneMatch {
                    full: full.as_str().to_string(),
                    number: number.to_string(),
                    digits: number.chars().filter(|c| c.is_ascii_digit()).collect(),
                    start: full.start(),
                    end: full.end(),
                })
            })
            .collect()
    }

    pub fn regex(&self) -> &Regex {
        &self.regex
    }
}

/// Locates one section. Alternative header keywords are separate regexes tried in priority
/// order; the first keyword that occurs anywhere wins, and only its first occurrence counts.
#[derive(Debug, Clone)]
pub struct SectionMatcher {
    kind: SectionKind,
    alternatives: Vec<Regex>,
}

impl SectionMatcher {
    pub fn kind(&self) -> SectionKind {
        self.kind
    }

    pub fn find_first<'t>(&self, text: &'t str) -> Option<SectionMatch<'t>> {
        self.alternatives.iter().find_map(|regex| {
            let caps = regex.captures(text)?;
            Some(SectionMatch {
                kind: self.kind,
                header: caps.name("header")?.as_str(),
                body: caps.name("body").map(|m| m.as_str()).unwrap_or_default(),
            })
        })
    }
}

/// Process-wide, read-only set of compiled matchers.
#[derive(Debug, Clone)]
pub struct PatternLibrary {
    email: EmailMatcher,
    phone: PhoneMatcher,
    sections: Vec<SectionMatcher>,
}

impl PatternLibrary {
    pub fn new() -> Result<Self, PatternCompileError> {
        let email = EmailMatcher {
            regex: compile("email", EMAIL_PATTERN)?,
        };
        let phone = PhoneMatcher {
            regex: compile("phone", PHONE_PATTERN)?,
        };

        let sections = SectionKind::ALL
            .iter()
            .map(|&kind| {
                let alternatives = kind
                    .header_keywords()
                    .iter()
                    .map(|keyword| compile(kind.as_str(), &section_pattern(keyword, kind)))
                    .collect::<Result<Vec<_>, _>>()?;
                Ok(SectionMatcher { kind, alternatives })
            })
            .collect::<Result<Vec<_>, PatternCompileError>>()?;

        Ok(Self {
            email,
            phone,
            sections,
        })
    }

    pub fn email(&self) -> &EmailMatcher {
        &self.email
    }

    pub fn phone(&self) -> &PhoneMatcher {
        &self.phone
    }

    pub fn section(&self, kind: SectionKind) -> &SectionMatcher {
        // `new` builds one matcher per kind in `SectionKind::ALL` order.
        let index = SectionKind::ALL
            .iter()
            .position(|k| *k == kind)
            .unwrap_or_default();
        &self.sections[index]
    }

    pub fn sections(&self) -> &[SectionMatcher] {
        &self.sections
    }
}

/// Case-insensitive, `.` matches newlines: header, then any colons/whitespace (line breaks
/// included), then a lazy body up to the section's terminator.
fn section_pattern(keyword: &str, kind: SectionKind) -> String {
    format!(
        r"(?is)(?P<header>{keyword})[:\s]*(?P<body>.*?){}",
        kind.terminator()
    )
}

pub(crate) fn compile(name: &str, pattern: &str) -> Result<Regex, PatternCompileError> {
    Regex::new(pattern).map_err(|source| PatternCompileError {
        name: name.to_string(),
        source,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn library() -> PatternLibrary {
        PatternLibrary::new().unwrap()
    }

    #[test]
    fn test_library_compiles_one_matcher_per_section() {
        let lib = library();
        assert_eq!(lib.sections().len(), SectionKind::ALL.len());
        for kind in SectionKind::ALL {
            assert_eq!(lib.section(kind).kind(), kind);
        }
    }

    #[test]
    fn test_invalid_pattern_reports_name() {
        let err = compile("broken", "(unclosed").unwrap_err();
        assert_eq!(err.name, "broken");
        assert!(err.to_string().contains("broken"));
    }

    #[test]
    fn test_email_finds_all_in_order() {
        let lib = library();
        let found = lib
            .email()
            .find_all("a.b@example.com, then c_d+x@mail.co.uk and done");
        assert_eq!(found, vec!["a.b@example.com", "c_d+x@mail.co.uk"]);
    }

    #[test]
    fn test_email_requires_tld() {
        assert!(library().email().find_all("user@localhost").is_empty());
    }

    #[test]
    fn test_phone_dashed() {
        let found = library().phone().find_all("call 555-123-4567 today");
        assert_eq!(found.len(), 1);
        assert_eq!(found[0].full, "555-123-4567");
        assert_eq!(found[0].number, "555-123-4567");
        assert_eq!(found[0].digits, "5551234567");
    }

    #[test]
    fn test_phone_prefix_not_part_of_number() {
        let found = library().phone().find_all("tel 1 555.123.4567");
        assert_eq!(found.len(), 1);
        assert_eq!(found[0].full, "1 555.123.4567");
        assert_eq!(found[0].number, "555.123.4567");
        assert_eq!(found[0].digits, "5551234567");
    }

    #[test]
    fn test_phone_plain_ten_digits() {
        let found = library().phone().find_all("mobile: 5551234567");
        assert_eq!(found.len(), 1);
        assert_eq!(found[0].digits, "5551234567");
    }

    #[test]
    fn test_phone_ignores_short_numbers() {
        assert!(library().phone().find_all("Class of 2019, GPA 3.9").is_empty());
    }

    #[test]
    fn test_skills_stop_at_line_break() {
        let lib = library();
        let m = lib
            .section(SectionKind::Skills)
            .find_first("Skills: Rust, Go\nMore text")
            .unwrap();
        assert_eq!(m.body, "Rust, Go");
    }

    #[test]
    fn test_skills_header_on_own_line() {
        let lib = library();
        let m = lib
            .section(SectionKind::Skills)
            .find_first("SKILLS:\nRust, Go\nMore text")
            .unwrap();
        assert_eq!(m.header, "SKILLS");
        assert_eq!(m.body, "Rust, Go");
    }

    #[test]
    fn test_education_stops_at_blank_line() {
        let lib = library();
        let m = lib
            .section(SectionKind::Education)
            .find_first("Education:\nBSc CS\nMSc CS\n\nExperience:\nAcme")
            .unwrap();
        assert_eq!(m.body, "BSc CS\nMSc CS");
    }

    #[test]
    fn test_section_without_blank_line_runs_to_end() {
        let lib = library();
        let m = lib
            .section(SectionKind::Certifications)
            .find_first("Certifications: AWS SAA\nCKA")
            .unwrap();
        assert_eq!(m.body, "AWS SAA\nCKA");
    }

    #[test]
    fn test_only_first_occurrence_reported() {
        let lib = library();
        let m = lib
            .section(SectionKind::Education)
            .find_first("Education: first\n\nEducation: second")
            .unwrap();
        assert_eq!(m.body, "first");
    }

    #[test]
    fn test_experience_prefers_experience_keyword() {
        let lib = library();
        let text = "Work History: Old Co\n\nExperience: New Co";
        let m = lib.section(SectionKind::Experience).find_first(text).unwrap();
        assert_eq!(m.header, "Experience");
        assert_eq!(m.body, "New Co");
    }

    #[test]
    fn test_experience_falls_back_to_work_history() {
        let lib = library();
        let m = lib
            .section(SectionKind::Experience)
            .find_first("work history:\nAcme Corp\nGlobex")
            .unwrap();
        assert_eq!(m.body, "Acme Corp\nGlobex");
    }

    #[test]
    fn test_missing_header_is_none() {
        let lib = library();
        assert!(lib
            .section(SectionKind::Certifications)
            .find_first("nothing to see")
            .is_none());
    }
}
