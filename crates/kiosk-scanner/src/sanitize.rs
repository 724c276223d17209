//! Repair of malformed raw scan strings.
//!
//! Keyboard-emulating scanners on flaky USB hubs fire keys twice, stutter on
//! long runs, and leak device control codes into the stream. [`sanitize`]
//! applies a fixed sequence of repairs:
//!
//! 1. Strip control characters (U+0000–U+001F, U+007F–U+009F).
//! 2. Collapse doubled structural tokens `{ } " : ,` to one occurrence.
//! 3. Collapse any run of three or more identical characters to one.
//! 4. Collapse runs of two or more `-`/`_` to a single `-`.
//! 5. Trim surrounding whitespace.
//!
//! The function is total and idempotent.
//!
//! # Examples
//!
//! ```
//! use kiosk_scanner::sanitize;
//!
//! assert_eq!(sanitize("SS2255--228811111155"), "SS2255-2288155");
//! assert_eq!(sanitize("{{\"\"key\"\"::\"\"value\"\"}}"), "{\"key\":\"value\"}");
//! ```

use std::sync::LazyLock;

use regex::{Captures, Regex};

/// Device control codes leaked by the scanner.
static DEVICE_CONTROL: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"[\x00-\x1F\x7F-\x{9F}]").expect("device control pattern is valid")
});

/// Doubled structural tokens from duplicate key-fire.
static STRUCTURAL_REPEAT: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r#"\{\{+|\}\}+|""+|::+|,,+"#).expect("structural repeat pattern is valid")
});

static DASH_RUN: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"[-_]{2,}").expect("dash run pattern is valid"));

/// Repair a raw scan string. Never fails.
#[must_use]
pub fn sanitize(raw: &str) -> String {
    let stripped = DEVICE_CONTROL.replace_all(raw, "");
    let structural = STRUCTURAL_REPEAT.replace_all(&stripped, |caps: &Captures| caps[0][..1].to_string());
    // Identical-character runs need a backreference, which `regex` lacks.
    let runs = collapse_runs(&structural);
    let dashes = DASH_RUN.replace_all(&runs, "-");
    dashes.trim().to_string()
}

fn collapse_runs(input: &str) -> String {
    let chars: Vec<char> = input.chars().collect();
    let mut out = String::with_capacity(input.len());
    let mut i = 0;
    while i < chars.len() {
        let c = chars[i];
        let run = chars[i..].iter().take_while(|&&next| next == c).count();
        if run >= 3 {
            out.push(c);
        } else {
            out.extend(std::iter::repeat_n(c, run));
        }
        i += run;
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[test]
    fn test_strips_control_characters() {
        assert_eq!(sanitize("ab\x00\x1Fcd"), "abcd");
        assert_eq!(sanitize("a\u{7F}b\u{85}c\u{9F}"), "abc");
    }

    #[test]
    fn test_collapses_doubled_structural_tokens() {
        assert_eq!(
            sanitize(r#"{{""key""::""value""}}"#),
            r#"{"key":"value"}"#
        );
        assert_eq!(sanitize("a,,,b"), "a,b");
    }

    #[test]
    fn test_collapses_runs_and_hyphens() {
        assert_eq!(sanitize("SS2255--228811111155"), "SS2255-2288155");
    }

    #[rstest]
    #[case("   foo  ", "foo")]
    #[case("", "")]
    #[case("\x02\x03", "")]
    #[case("a__b", "a-b")]
    #[case("a-_-b", "a-b")]
    #[case("a_b", "a_b")]
    #[case("aab", "aab")]
    #[case("aaab", "ab")]
    #[case("2023-0001", "2023-01")]
    fn test_sanitize_cases(#[case] input: &str, #[case] expected: &str) {
        assert_eq!(sanitize(input), expected);
    }

    #[test]
    fn test_control_removal_happens_before_run_detection() {
        // The NUL splits the run only until it is stripped.
        assert_eq!(sanitize("1\x001\x001"), "1");
    }

    #[rstest]
    #[case("")]
    #[case("SS2255--228811111155")]
    #[case(r#"{{""key""::""value""}}"#)]
    #[case("  x   y  ")]
    #[case("a--__--b")]
    fn test_idempotent(#[case] input: &str) {
        let once = sanitize(input);
        assert_eq!(sanitize(&once), once);
    }
}
