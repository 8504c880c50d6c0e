//! Best-effort decoding of JSON produced by a language model.
//!
//! Model output regularly arrives wrapped in a code fence, with raw newlines
//! inside string literals, stray backslashes from Windows paths or regexes,
//! and unescaped quotes from embedded code samples. [`parse_json`] tries a
//! strict parse first and only then runs a single cleanup pass. It is not a
//! relaxed JSON dialect: anything that already parses is returned as is and
//! shape checks are left to the caller.

use std::sync::OnceLock;

use regex::Regex;
use serde_json::Value;

use crate::models::NamedDocument;

/// Both the strict parse and the cleanup pass failed
///
/// Carries the error from the strict parse of the original text, which is
/// the one that points at what the model actually emitted.
#[derive(Debug, thiserror::Error)]
#[error("Could not parse model output as JSON: {source}")]
pub struct JsonRecoveryError {
    #[source]
    pub source: serde_json::Error,
}

#[derive(Debug, thiserror::Error)]
pub enum GenerationError {
    #[error(transparent)]
    Recovery(#[from] JsonRecoveryError),
    #[error("Model output is valid JSON but not a list of documents: {0}")]
    UnexpectedShape(String),
}

fn fence_open_regex() -> &'static Regex {
    static FENCE_OPEN_REGEX: OnceLock<Regex> = OnceLock::new();
    FENCE_OPEN_REGEX.get_or_init(|| {
        Regex::new(r"(?m)^[ \t]*```[ \t]*(json|JSON)?[ \t]*\r?$").expect("Invalid fence regex")
    })
}

/// Decode JSON from model output, recovering from common formatting damage
///
/// Each candidate text is tried strictly and then through the cleanup pass;
/// the first one that parses wins. Text that is not JSON at all is returned
/// as a string value.
pub fn parse_json(text: &str) -> Result<Value, JsonRecoveryError> {
    let candidates = candidates(text);
    let primary = candidates.first().copied().unwrap_or(text);

    let mut original_error = None;
    for candidate in &candidates {
        match parse_candidate(candidate) {
            Ok(value) => return Ok(value),
            Err(e) => {
                log::debug!("JSON candidate rejected ({e})");
                original_error.get_or_insert(e);
            }
        }
    }

    let cleaned = strip_noise(primary);
    if !looks_like_json(cleaned) {
        let wrapped = format!("{{\"content\": \"{}\"}}", escape_raw(cleaned));
        if let Ok(mut value) = serde_json::from_str::<Value>(&wrapped) {
            return Ok(value["content"].take());
        }
    }

    match original_error {
        Some(source) => {
            log::warn!("JSON cleanup failed, reporting original error ({source})");
            Err(JsonRecoveryError { source })
        }
        None => {
            serde_json::from_str::<Value>(primary).map_err(|source| JsonRecoveryError { source })
        }
    }
}

fn parse_candidate(text: &str) -> Result<Value, serde_json::Error> {
    let original_error = match serde_json::from_str::<Value>(text) {
        Ok(value) => return Ok(value),
        Err(e) => e,
    };

    let cleaned = strip_noise(text);
    if !looks_like_json(cleaned) {
        return Err(original_error);
    }
    serde_json::from_str::<Value>(&repair(cleaned)).map_err(|_| original_error)
}

fn strip_noise(text: &str) -> &str {
    text.trim_start_matches('\u{feff}').trim()
}

fn looks_like_json(text: &str) -> bool {
    text.starts_with('{') || text.starts_with('[')
}

/// Decode a generation response into its document list
///
/// Expects an array of `{"filename": ..., "content": ...}` objects.
pub fn parse_generated_files(text: &str) -> Result<Vec<NamedDocument>, GenerationError> {
    let value = parse_json(text)?;

    if !value.is_array() {
        return Err(GenerationError::UnexpectedShape(format!(
            "expected an array, found {}",
            json_kind(&value)
        )));
    }

    serde_json::from_value(value).map_err(|e| GenerationError::UnexpectedShape(e.to_string()))
}

/// Texts worth parsing, most likely first
///
/// Output that already starts like JSON is tried whole before any fence,
/// since fences found in it belong to string values. Otherwise the fenced
/// interiors come first, cut at each following fence in turn so that a fence
/// inside a string value does not end the block early, and the whole text
/// last.
fn candidates(text: &str) -> Vec<&str> {
    let mut candidates = Vec::new();
    if looks_like_json(strip_noise(text)) {
        candidates.push(text);
    }

    if let Some(opening) = opening_fence(text) {
        let body = &text[opening.end()..];
        let body = body.strip_prefix('\n').unwrap_or(body);
        let before = candidates.len();
        candidates.extend(body.match_indices("```").map(|(end, _)| &body[..end]));
        if candidates.len() == before {
            candidates.push(body);
        }
    }

    if !candidates.contains(&text) {
        candidates.push(text);
    }
    candidates
}

/// A `json` fence anywhere wins over the first bare one
fn opening_fence(text: &str) -> Option<regex::Match<'_>> {
    let regex = fence_open_regex();
    regex
        .captures_iter(text)
        .find(|c| c.get(1).is_some())
        .and_then(|c| c.get(0))
        .or_else(|| regex.find(text))
}

/// Fix string literals in structurally valid JSON text
fn repair(text: &str) -> String {
    let chars: Vec<char> = text.chars().collect();
    let mut out = String::with_capacity(text.len() + 16);
    let mut in_string = false;
    let mut i = 0;

    while i < chars.len() {
        let c = chars[i];

        if !in_string {
            if c == '"' {
                in_string = true;
            }
            out.push(c);
            i += 1;
            continue;
        }

        match c {
            '\\' if starts_valid_escape(&chars, i + 1) => {
                out.push('\\');
                out.push(chars[i + 1]);
                i += 2;
                continue;
            }
            '\\' => out.push_str("\\\\"),
            '"' if closes_string(&chars, i + 1) => {
                in_string = false;
                out.push('"');
            }
            '"' => out.push_str("\\\""),
            c if c.is_control() => push_control(&mut out, c),
            c => out.push(c),
        }
        i += 1;
    }

    out
}

/// Escape free text so it can sit inside a JSON string literal
fn escape_raw(text: &str) -> String {
    let mut out = String::with_capacity(text.len() + 16);
    for c in text.chars() {
        match c {
            '\\' => out.push_str("\\\\"),
            '"' => out.push_str("\\\""),
            c if c.is_control() => push_control(&mut out, c),
            c => out.push(c),
        }
    }
    out
}

fn push_control(out: &mut String, c: char) {
    match c {
        '\n' => out.push_str("\\n"),
        '\r' => out.push_str("\\r"),
        '\t' => out.push_str("\\t"),
        '\u{8}' => out.push_str("\\b"),
        '\u{c}' => out.push_str("\\f"),
        _ => {}
    }
}

/// Whether the char after a backslash forms a legal JSON escape
fn starts_valid_escape(chars: &[char], at: usize) -> bool {
    match chars.get(at) {
        Some('"' | '\\' | '/' | 'b' | 'f' | 'n' | 'r' | 't') => true,
        Some('u') => {
            chars.len() > at + 4 && chars[at + 1..=at + 4].iter().all(|c| c.is_ascii_hexdigit())
        }
        _ => false,
    }
}

/// A quote ends the literal when the next significant char is structural
fn closes_string(chars: &[char], from: usize) -> bool {
    match chars[from..].iter().find(|c| !c.is_whitespace()) {
        None => true,
        Some(c) => matches!(c, ',' | '}' | ']' | ':'),
    }
}

fn json_kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "a boolean",
        Value::Number(_) => "a number",
        Value::String(_) => "a string",
        Value::Array(_) => "an array",
        Value::Object(_) => "an object",
    }
}
