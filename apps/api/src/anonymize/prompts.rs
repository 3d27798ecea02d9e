// Prompt constants for LLM-backed entity tagging.

pub const ENTITY_TAG_SYSTEM: &str = "You are a named-entity recognizer for resumes. \
    You MUST respond with valid JSON only. \
    Do NOT include any text outside the JSON object. \
    Do NOT use markdown code fences.";

pub const ENTITY_TAG_PROMPT_TEMPLATE: &str = r#"Identify people and places in the resume text below.

Return JSON of the form:
{"entities": [{"label": "PERSON" | "LOCATION", "text": "<exact substring>"}]}

Rules:
- "text" must be copied character-for-character from the resume.
- PERSON: full names of people. List the resume owner's name first if present.
- LOCATION: cities, states, countries, and street addresses.
- Ignore placeholders such as ***@***.com and XXX-XXX-XXXX.
- If nothing is found, return {"entities": []}.

Resume:
{resume_text}"#;
