//! Display helpers for visit times and durations.

use chrono::{DateTime, Duration, Local, Utc};

/// Format a visit duration: `1h 5m`, `12m 3s` or `45s`.
///
/// Negative durations render as `0m`.
#[must_use]
pub fn format_duration(duration: Duration) -> String {
    let total = duration.num_seconds();
    if total <= 0 {
        return "0m".to_string();
    }
    let hours = total / 3600;
    let minutes = (total % 3600) / 60;
    let seconds = total % 60;
    if hours > 0 {
        format!("{hours}h {minutes}m")
    } else if minutes > 0 {
        format!("{minutes}m {seconds}s")
    } else {
        format!("{seconds}s")
    }
}

/// Wall-clock time of an event in the kiosk's local timezone (`HH:MM`).
#[must_use]
pub fn format_clock(at: DateTime<Utc>) -> String {
    at.with_timezone(&Local).format("%H:%M").to_string()
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[rstest]
    #[case(0, "0m")]
    #[case(-30, "0m")]
    #[case(45, "45s")]
    #[case(723, "12m 3s")]
    #[case(3900, "1h 5m")]
    fn test_format_duration(#[case] seconds: i64, #[case] expected: &str) {
        assert_eq!(format_duration(Duration::seconds(seconds)), expected);
    }

    #[test]
    fn test_format_clock_shape() {
        let formatted = format_clock(Utc::now());
        assert_eq!(formatted.len(), 5);
        assert_eq!(formatted.chars().nth(2), Some(':'));
    }
}
