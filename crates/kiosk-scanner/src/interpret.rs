//! Extraction of the canonical identifier from a sanitized scan.
//!
//! Most scans are plain codes and pass through unchanged. ID cards printed
//! with an object-like QR payload (`{id: '…', studentNo: '…'}`) are parsed on
//! a best-effort basis and reduced to the student number or ID.

use std::sync::LazyLock;

use kiosk_core::CanonicalIdentifier;
use regex::Regex;
use serde_json::Value;
use tracing::debug;

use crate::decoder::ScanCode;
use crate::sanitize::sanitize;

/// Optionally quoted object key followed by a colon.
static LOOSE_KEY: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r#"['"]?([A-Za-z0-9_]+)['"]?\s*:"#).expect("loose key pattern is valid")
});

/// Payload fields checked for the identifier, in priority order.
const IDENTIFIER_FIELDS: [&str; 2] = ["studentNo", "id"];

/// Derive the canonical identifier from a sanitized scan string.
///
/// Returns `None` only when `sanitized` is empty. Parse failures fall back
/// to the sanitized string and are never reported as errors.
///
/// # Examples
///
/// ```
/// use kiosk_scanner::interpret;
///
/// let id = interpret(r#"{studentNo: "2023-0001"}"#).unwrap();
/// assert_eq!(id.as_str(), "2023-0001");
///
/// let plain = interpret("2023-0099").unwrap();
/// assert_eq!(plain.as_str(), "2023-0099");
/// ```
#[must_use]
pub fn interpret(sanitized: &str) -> Option<CanonicalIdentifier> {
    let value = if is_object_like(sanitized) {
        extract_from_payload(sanitized).unwrap_or_else(|| sanitized.to_string())
    } else {
        sanitized.to_string()
    };
    CanonicalIdentifier::new(value).ok()
}

/// Run a decoded scan code through [`sanitize`] and [`interpret`].
///
/// Consumes the scan code. Returns `None` when nothing survives
/// sanitization, e.g. a scan made only of control characters.
#[must_use]
pub fn canonicalize(code: ScanCode) -> Option<CanonicalIdentifier> {
    let sanitized = sanitize(code.as_str());
    let identifier = interpret(&sanitized);
    if identifier.is_none() {
        debug!(raw_len = code.len(), "Scan code empty after sanitization");
    }
    identifier
}

fn is_object_like(s: &str) -> bool {
    s.starts_with('{') && s.ends_with('}')
}

fn extract_from_payload(s: &str) -> Option<String> {
    let normalized = LOOSE_KEY.replace_all(s, "\"$1\":").replace('\'', "\"");
    let parsed: Value = match serde_json::from_str(&normalized) {
        Ok(value) => value,
        Err(e) => {
            debug!(error = %e, "Could not parse object-like scan payload");
            return None;
        }
    };

    let field = IDENTIFIER_FIELDS
        .iter()
        .filter_map(|name| parsed.get(name))
        .find(|value| is_truthy(value));

    let extracted = match field {
        Some(Value::String(text)) => text.clone(),
        Some(other) => other.to_string(),
        None => parsed.to_string(),
    };
    debug!(identifier = %extracted, "Parsed object-like scan payload");
    Some(extracted)
}

/// Empty strings, zero, `false` and `null` do not count as a present field.
fn is_truthy(value: &Value) -> bool {
    match value {
        Value::Null => false,
        Value::Bool(b) => *b,
        Value::String(s) => !s.is_empty(),
        Value::Number(n) => n.as_f64().is_some_and(|f| f != 0.0),
        Value::Array(_) | Value::Object(_) => true,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    fn resolved(input: &str) -> String {
        interpret(input).unwrap().into_inner()
    }

    #[test]
    fn test_loosely_quoted_student_no() {
        assert_eq!(resolved(r#"{studentNo: "2023-0001"}"#), "2023-0001");
    }

    #[rstest]
    #[case(r#"{"studentNo":"2023-0002","id":"abc"}"#, "2023-0002")]
    #[case("{'id': 'abc123'}", "abc123")]
    #[case(r#"{studentNo: "", id: "abc"}"#, "abc")]
    #[case("{id: 42}", "42")]
    fn test_identifier_field_priority(#[case] input: &str, #[case] expected: &str) {
        assert_eq!(resolved(input), expected);
    }

    #[test]
    fn test_object_without_identifier_is_stringified() {
        assert_eq!(resolved("{name: 'Ana'}"), r#"{"name":"Ana"}"#);
    }

    #[rstest]
    #[case("{studentNo: }")]
    #[case("{not json at all}")]
    #[case("{")]
    fn test_malformed_payload_falls_back(#[case] input: &str) {
        assert_eq!(resolved(input), input);
    }

    #[rstest]
    #[case("2023-0099")]
    #[case("id: 5")]
    #[case("{half")]
    fn test_plain_codes_pass_through(#[case] input: &str) {
        assert_eq!(resolved(input), input);
    }

    #[test]
    fn test_empty_input_has_no_identifier() {
        assert!(interpret("").is_none());
    }

    #[test]
    fn test_canonicalize_sanitizes_first() {
        let code = ScanCode::new("  \x0220231234\x03 ").unwrap();
        assert_eq!(canonicalize(code).unwrap().as_str(), "20231234");

        let noise = ScanCode::new("\x02\x03").unwrap();
        assert!(canonicalize(noise).is_none());
    }
}
