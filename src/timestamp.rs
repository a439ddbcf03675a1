//! Timestamp rendering for event records.
//!
//! The collector expects epoch seconds with millisecond precision unless a
//! custom `chrono` strftime pattern is configured.

use std::fmt::Write;

use chrono::format::{Item, StrftimeItems};
use chrono::{DateTime, Utc};

/// Render `instant` as fractional epoch seconds, e.g. `1700000000.123`.
pub fn epoch_seconds(instant: DateTime<Utc>) -> String {
    let millis = instant.timestamp_millis();
    let sign = if millis < 0 { "-" } else { "" };
    let magnitude = millis.unsigned_abs();
    format!("{sign}{}.{:03}", magnitude / 1000, magnitude % 1000)
}

/// Render `instant` with `format`, falling back to [`epoch_seconds`] when the
/// pattern is absent, blank, or cannot be rendered.
pub fn format_timestamp(instant: DateTime<Utc>, format: Option<&str>) -> String {
    let Some(pattern) = format.filter(|p| !p.trim().is_empty()) else {
        return epoch_seconds(instant);
    };
    let mut out = String::new();
    // An unsupported specifier surfaces as fmt::Error rather than a panic here.
    if write!(out, "{}", instant.format(pattern)).is_err() {
        return epoch_seconds(instant);
    }
    out
}

/// Return `true` when every specifier in `pattern` is understood by chrono.
pub fn is_valid_format(pattern: &str) -> bool {
    !StrftimeItems::new(pattern).any(|item| matches!(item, Item::Error))
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;
    use rstest::rstest;

    fn instant() -> DateTime<Utc> {
        Utc.timestamp_millis_opt(1_700_000_000_042)
            .single()
            .expect("valid timestamp")
    }

    #[test]
    fn epoch_seconds_keeps_three_decimals() {
        assert_eq!(epoch_seconds(instant()), "1700000000.042");
    }

    #[rstest]
    #[case(-1_500, "-1.500")]
    #[case(-250, "-0.250")]
    #[case(0, "0.000")]
    fn epoch_seconds_keeps_sign_apart_from_magnitude(#[case] millis: i64, #[case] expected: &str) {
        let instant = Utc
            .timestamp_millis_opt(millis)
            .single()
            .expect("valid timestamp");
        assert_eq!(epoch_seconds(instant), expected);
    }

    #[rstest]
    #[case(None)]
    #[case(Some(""))]
    #[case(Some("   "))]
    fn missing_pattern_uses_epoch(#[case] pattern: Option<&str>) {
        assert_eq!(format_timestamp(instant(), pattern), "1700000000.042");
    }

    #[test]
    fn custom_pattern_is_applied() {
        assert_eq!(
            format_timestamp(instant(), Some("%Y-%m-%dT%H:%M:%S%.3fZ")),
            "2023-11-14T22:13:20.042Z"
        );
    }

    #[test]
    fn invalid_pattern_falls_back_to_epoch() {
        assert!(!is_valid_format("%Q"));
        assert_eq!(format_timestamp(instant(), Some("%Q")), "1700000000.042");
    }
}
