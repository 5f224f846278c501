//! Input sanitization and format validators.
//!
//! Transcripts and summaries arrive from the call platform as free text and
//! are later rendered on the dashboard, so string fields are stripped of
//! HTML before anything else sees them.

use once_cell::sync::Lazy;
use regex::Regex;

static SCRIPT_BLOCK: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?is)<(script|style)\b[^>]*>.*?</(script|style)\s*>").expect("valid regex")
});

static HTML_TAG: Lazy<Regex> = Lazy::new(|| Regex::new(r"(?s)<[^>]*>").expect("valid regex"));

static PHONE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^\+?[\d\s\-()]{10,}$").expect("valid regex"));

static MEDICAL_ID: Lazy<Regex> = Lazy::new(|| Regex::new(r"(?i)^MED\d{3}$").expect("valid regex"));

/// Trim and strip HTML from a string field.
///
/// Script and style elements are removed together with their contents; any
/// remaining tags are dropped. Stripping repeats until the text is stable,
/// which makes the function idempotent: `sanitize_text(sanitize_text(s)) ==
/// sanitize_text(s)` for all inputs.
pub fn sanitize_text(input: &str) -> String {
    let mut current = input.trim().to_string();
    loop {
        let pass = SCRIPT_BLOCK.replace_all(&current, "");
        let pass = HTML_TAG.replace_all(&pass, "");
        let next = pass.trim().to_string();
        if next == current {
            return next;
        }
        current = next;
    }
}

/// Loose phone-number check: optional `+`, then at least ten characters of
/// digits, spaces, dashes, or parentheses.
pub fn is_valid_phone(phone: &str) -> bool {
    PHONE.is_match(phone)
}

/// Canonical medical-ID check: `MED` followed by exactly three digits,
/// case-insensitive.
pub fn is_valid_medical_id(id: &str) -> bool {
    MEDICAL_ID.is_match(id)
}

/// Uppercase a medical ID into its canonical stored form.
pub fn normalize_medical_id(id: &str) -> String {
    id.trim().to_ascii_uppercase()
}
