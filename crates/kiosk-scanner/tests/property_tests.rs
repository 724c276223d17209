//! Property-based tests for the sanitizer and payload interpreter.
//!
//! These tests use proptest to generate arbitrary scanner output and verify
//! that the pipeline invariants hold for every input.

use kiosk_scanner::{interpret, sanitize};
use proptest::prelude::*;

/// Strategy for noisy scanner output: printable text mixed with control
/// characters, repeated digits and separator runs.
fn noisy_scan() -> impl Strategy<Value = String> {
    prop::string::string_regex("[ \\x00-\\x1f\\x7f-\\x9fA-Za-z0-9{}\":,_-]{0,64}")
        .expect("Failed to create noisy scan regex strategy")
}

/// Strategy for codes that a well-behaved scanner would emit.
fn clean_code() -> impl Strategy<Value = String> {
    prop::string::string_regex("[A-Z]{0,3}[0-9]{4}")
        .expect("Failed to create clean code regex strategy")
}

proptest! {
    /// Property: sanitizing twice is the same as sanitizing once.
    #[test]
    fn prop_sanitize_is_idempotent(raw in noisy_scan()) {
        let once = sanitize(&raw);
        prop_assert_eq!(sanitize(&once), once);
    }

    /// Property: sanitized output has no control characters and no
    /// surrounding whitespace.
    #[test]
    fn prop_sanitize_output_is_clean(raw in noisy_scan()) {
        let out = sanitize(&raw);
        prop_assert!(!out.chars().any(char::is_control));
        prop_assert_eq!(out.trim(), out.as_str());
    }

    /// Property: no character survives sanitization in a run of three or more.
    #[test]
    fn prop_no_long_runs(raw in noisy_scan()) {
        let out: Vec<char> = sanitize(&raw).chars().collect();
        for window in out.windows(3) {
            prop_assert!(!(window[0] == window[1] && window[1] == window[2]));
        }
    }

    /// Property: a non-empty sanitized string always yields an identifier,
    /// and plain (non-object) strings are passed through unchanged.
    #[test]
    fn prop_interpret_total(raw in noisy_scan()) {
        let sanitized = sanitize(&raw);
        match interpret(&sanitized) {
            Some(id) => {
                prop_assert!(!id.as_str().is_empty());
                if !(sanitized.starts_with('{') && sanitized.ends_with('}')) {
                    prop_assert_eq!(id.as_str(), sanitized.as_str());
                }
            }
            None => prop_assert!(sanitized.is_empty()),
        }
    }

    /// Property: a clean code wrapped in an object payload resolves to the code.
    #[test]
    fn prop_object_payload_yields_student_no(code in clean_code()) {
        let payload = format!("{{studentNo: '{code}', id: 'other'}}");
        let id = interpret(&payload).unwrap();
        prop_assert_eq!(id.as_str(), code.as_str());
    }
}
