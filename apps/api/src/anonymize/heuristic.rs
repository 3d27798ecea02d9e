//! Rule-based entity tagger: a gazetteer for places and two layout rules for the candidate's
//! name. Needs no model, so it is the default backend.
//!
//! Name rules:
//! - a `Name: First Last` line anywhere in the document
//! - one of the first few non-empty lines, when it is 2 to 4 capitalised words and not a section
//!   header. Job-title lines above the name are skipped; any other line ends the search.

use regex::Regex;

use crate::anonymize::models::{EntityLabel, EntitySpan};
use crate::anonymize::patterns::{compile, PatternCompileError};
use crate::anonymize::tagger::{EntityTagger, TaggerError};

const US_STATES: &[&str] = &[
    "Alabama", "Alaska", "Arizona", "Arkansas", "California", "Colorado", "Connecticut",
    "Delaware", "Florida", "Georgia", "Hawaii", "Idaho", "Illinois", "Indiana", "Iowa",
    "Kansas", "Kentucky", "Louisiana", "Maine", "Maryland", "Massachusetts", "Michigan",
    "Minnesota", "Mississippi", "Missouri", "Montana", "Nebraska", "Nevada", "New Hampshire",
    "New Jersey", "New Mexico", "New York", "North Carolina", "North Dakota", "Ohio",
    "Oklahoma", "Oregon", "Pennsylvania", "Rhode Island", "South Carolina", "South Dakota",
    "Tennessee", "Texas", "Utah", "Vermont", "Virginia", "Washington", "West Virginia",
    "Wisconsin", "Wyoming",
];

const CITIES: &[&str] = &[
    "New York City", "Los Angeles", "Chicago", "Houston", "Phoenix", "Philadelphia",
    "San Antonio", "San Diego", "Dallas", "San Jose", "Austin", "Jacksonville",
    "San Francisco", "Columbus", "Seattle", "Denver", "Boston", "Nashville", "Detroit",
    "Portland", "Las Vegas", "Atlanta", "Miami", "Minneapolis", "Pittsburgh", "Baltimore",
    "Toronto", "Vancouver", "Montreal", "London", "Manchester", "Dublin", "Paris", "Berlin",
    "Munich", "Amsterdam", "Madrid", "Barcelona", "Zurich", "Stockholm", "Bangalore",
    "Bengaluru", "Mumbai", "Delhi", "Hyderabad", "Pune", "Chennai", "Singapore", "Tokyo",
    "Sydney", "Melbourne",
];

const COUNTRIES: &[&str] = &[
    "United States", "USA", "Canada", "Mexico", "Brazil", "United Kingdom", "UK", "Ireland",
    "France", "Germany", "Spain", "Italy", "Netherlands", "Switzerland", "Sweden", "Poland",
    "India", "China", "Japan", "Australia", "New Zealand", "Nigeria", "Kenya", "Israel",
];

/// Words that make a leading line a heading rather than a name.
const HEADING_WORDS: &[&str] = &[
    "resume",
    "curriculum",
    "vitae",
    "skills",
    "skill",
    "education",
    "experience",
    "certifications",
    "history",
    "summary",
    "profile",
    "objective",
    "contact",
];

/// Words that make a leading line a job title. Such lines are skipped, not taken as the name.
const TITLE_WORDS: &[&str] = &[
    "engineer",
    "developer",
    "programmer",
    "manager",
    "analyst",
    "designer",
    "architect",
    "consultant",
    "scientist",
    "director",
    "specialist",
    "administrator",
    "officer",
    "intern",
    "associate",
    "senior",
    "junior",
    "staff",
    "lead",
    "principal",
    "head",
];

/// How many non-empty lines from the top may hold the name.
const NAME_SEARCH_LINES: usize = 3;

const NAME_WORDS: &str = r"[A-Z][A-Za-z'\-]+(?:[ \t]+[A-Z][A-Za-z'\-.]*){1,3}";

pub struct HeuristicTagger {
    locations: Regex,
    labelled_name: Regex,
    name_line: Regex,
}

impl HeuristicTagger {
    /// Builds the gazetteer from the built-in lists plus `extra_locations`.
    pub fn new(extra_locations: &[String]) -> Result<Self, PatternCompileError> {
        let mut places: Vec<&str> = US_STATES
            .iter()
            .chain(CITIES)
            .chain(COUNTRIES)
            .copied()
            .chain(extra_locations.iter().map(String::as_str))
            .map(str::trim)
            .filter(|p| !p.is_empty())
            .collect();
        // Longest first so "New York City" wins over "New York" at the same position.
        places.sort_by(|a, b| b.len().cmp(&a.len()).then_with(|| a.cmp(b)));
        places.dedup();

        let alternation = places
            .iter()
            .map(|p| regex::escape(p))
            .collect::<Vec<_>>()
            .join("|");

        Ok(Self {
            locations: compile("gazetteer", &format!(r"\b(?:{alternation})\b"))?,
            labelled_name: compile(
                "labelled name",
                &format!(r"(?m)^[ \t]*Name[ \t]*[:\-][ \t]*(?P<name>{NAME_WORDS})[ \t]*\r?$"),
            )?,
            name_line: compile("name line", &format!(r"^{NAME_WORDS}$"))?,
        })
    }

    fn person_spans(&self, text: &str) -> Vec<EntitySpan> {
        let mut spans: Vec<EntitySpan> = self
            .labelled_name
            .captures_iter(text)
            .filter_map(|caps| caps.name("name"))
            .map(|m| EntitySpan::new(m.start(), m.end(), EntityLabel::Person, m.as_str()))
            .collect();

        if let Some(span) = self.leading_name(text) {
            spans.push(span);
        }
        spans
    }

    fn leading_name(&self, text: &str) -> Option<EntitySpan> {
        let mut offset = 0;
        let mut non_empty = 0;
        for line in text.split_inclusive('\n') {
            let line_start = offset;
            offset += line.len();

            let trimmed = line.trim();
            if trimmed.is_empty() {
                continue;
            }
            non_empty += 1;
            if non_empty > NAME_SEARCH_LINES {
                return None;
            }
            if has_any_word(trimmed, TITLE_WORDS) {
                continue;
            }
            if !self.name_line.is_match(trimmed) || has_any_word(trimmed, HEADING_WORDS) {
                return None;
            }
            let start = line_start + (line.len() - line.trim_start().len());
            return Some(EntitySpan::new(
                start,
                start + trimmed.len(),
                EntityLabel::Person,
                trimmed,
            ));
        }
        None
    }
}

fn has_any_word(line: &str, words: &[&str]) -> bool {
    line.split_whitespace().any(|word| {
        let word = word.trim_matches(|c: char| !c.is_alphanumeric()).to_lowercase();
        words.contains(&word.as_str())
    })
}

impl EntityTagger for HeuristicTagger {
    fn tag(&self, text: &str) -> Result<Vec<EntitySpan>, TaggerError> {
        let mut spans = self.person_spans(text);
        spans.extend(
            self.locations
                .find_iter(text)
                .map(|m| EntitySpan::new(m.start(), m.end(), EntityLabel::Location, m.as_str())),
        );
        spans.sort_by_key(|s| s.start);
        Ok(spans)
    }

    fn name(&self) -> &'static str {
        "heuristic"
    }
}
