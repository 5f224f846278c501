//! Heuristic extraction of identifiers from free text and structured
//! function-call records.
//!
//! Each extractor is a prioritized, ordered list of pure pattern-matchers
//! tried in sequence; adding a pattern means appending to the list, not
//! touching call sites.

use once_cell::sync::Lazy;
use regex::Regex;
use serde_json::Value;

use crate::sanitize::{is_valid_medical_id, normalize_medical_id, sanitize_text};

/// A pure matcher: free text in, candidate value out.
pub type Matcher = fn(&str) -> Option<String>;

/// Function name the voice agent calls to fetch a patient mid-call.
pub const PATIENT_FETCH_FUNCTION: &str = "fetch_patient";

static AGENT_PARENTHESIZED: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?i)\bagent \(([^)]+)\)").expect("valid regex"));

static IDENTIFYING_AS: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?i)\bidentifying as ([^.,;\n]+)").expect("valid regex"));

static PATIENT_AS: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?i)\bpatient as ([^.,;\n]+)").expect("valid regex"));

static MEDICAL_ID_ANYWHERE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?i)\bMED\d{3}\b").expect("valid regex"));

fn agent_parenthesized(text: &str) -> Option<String> {
    capture_name(&AGENT_PARENTHESIZED, text)
}

fn identifying_as(text: &str) -> Option<String> {
    capture_name(&IDENTIFYING_AS, text)
}

fn patient_as(text: &str) -> Option<String> {
    capture_name(&PATIENT_AS, text)
}

fn capture_name(pattern: &Regex, text: &str) -> Option<String> {
    let captured = pattern.captures(text)?.get(1)?.as_str();
    let name = sanitize_text(captured);
    if name.is_empty() {
        None
    } else {
        Some(name)
    }
}

/// Matchers for recovering a bot name from a call summary.
pub const BOT_NAME_MATCHERS: &[Matcher] = &[agent_parenthesized, identifying_as];

/// Matchers for recovering a patient name from a call summary.
pub const PATIENT_NAME_MATCHERS: &[Matcher] = &[patient_as];

/// Recover a bot name from free text, e.g. "handled by agent (Triage)".
pub fn extract_bot_name(text: &str) -> Option<String> {
    BOT_NAME_MATCHERS.iter().find_map(|matcher| matcher(text))
}

/// Recover a patient name from free text, e.g. "identified the patient as
/// John Doe."
pub fn extract_patient_name(text: &str) -> Option<String> {
    PATIENT_NAME_MATCHERS.iter().find_map(|matcher| matcher(text))
}

/// Find a medical ID anywhere in free text, uppercased on match.
pub fn extract_medical_id(text: &str) -> Option<String> {
    MEDICAL_ID_ANYWHERE
        .find(text)
        .map(|m| m.as_str().to_ascii_uppercase())
}

/// Scan structured function-call records for a medical ID.
///
/// Looks for a record whose `function` or `name` is the patient-fetch
/// function, or whose `arguments` carry a `medical_id`; the extracted value
/// is sanitized, uppercased, and format-checked.
pub fn medical_id_from_function_calls(calls: &Value) -> Option<String> {
    let calls = calls.as_array()?;

    let record = calls.iter().find(|call| {
        call.get("function").and_then(Value::as_str) == Some(PATIENT_FETCH_FUNCTION)
            || call.get("name").and_then(Value::as_str) == Some(PATIENT_FETCH_FUNCTION)
            || call
                .get("arguments")
                .map(|args| args.get("medical_id").is_some())
                .unwrap_or(false)
    })?;

    let arguments = record.get("arguments")?;
    let raw = arguments
        .get("medical_id")
        .or_else(|| arguments.get("id"))?
        .as_str()?;

    let id = normalize_medical_id(&sanitize_text(raw));
    if is_valid_medical_id(&id) {
        Some(id)
    } else {
        None
    }
}
