//! Media time formatting and parsing.
//!
//! Used by the player output and by anything rendering bookmark / note
//! timestamps next to the seek bar.

use crate::error::CoreError;
use crate::types::Seconds;

/// Whole seconds in a media position, treating negative or non-finite
/// input as zero.
fn whole_seconds(secs: Seconds) -> u64 {
    if secs.is_finite() && secs > 0.0 {
        secs.floor() as u64
    } else {
        0
    }
}

/// Format a position as `m:ss`, or `h:mm:ss` once it reaches an hour.
pub fn format_timestamp(secs: Seconds) -> String {
    let total = whole_seconds(secs);
    let (hours, minutes, seconds) = (total / 3600, (total % 3600) / 60, total % 60);

    if hours > 0 {
        format!("{hours}:{minutes:02}:{seconds:02}")
    } else {
        format!("{minutes}:{seconds:02}")
    }
}

/// Format a length for catalog listings: `1h 5m`, `2h`, `12m`, `45s`.
///
/// Seconds are only shown for lengths under a minute.
pub fn format_duration(secs: Seconds) -> String {
    let total = whole_seconds(secs);
    let (hours, minutes) = (total / 3600, (total % 3600) / 60);

    match (hours, minutes) {
        (0, 0) => format!("{total}s"),
        (0, m) => format!("{m}m"),
        (h, 0) => format!("{h}h"),
        (h, m) => format!("{h}h {m}m"),
    }
}

/// Parse `ss`, `m:ss` or `h:mm:ss` back into seconds.
pub fn parse_timestamp(input: &str) -> Result<Seconds, CoreError> {
    let trimmed = input.trim();
    let invalid = || {
        CoreError::Validation(format!(
            "Invalid timestamp '{trimmed}'. Expected ss, m:ss or h:mm:ss"
        ))
    };

    if trimmed.is_empty() {
        return Err(invalid());
    }

    let parts: Vec<&str> = trimmed.split(':').collect();
    if parts.len() > 3 {
        return Err(invalid());
    }

    let mut total: u64 = 0;
    for (index, part) in parts.iter().enumerate() {
        if part.is_empty() || !part.chars().all(|c| c.is_ascii_digit()) {
            return Err(invalid());
        }
        let value: u64 = part.parse().map_err(|_| invalid())?;
        // Every field after the leading one is a base-60 digit.
        if index > 0 && value >= 60 {
            return Err(invalid());
        }
        total = total * 60 + value;
    }

    Ok(total as Seconds)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn timestamps_under_an_hour_use_minutes() {
        assert_eq!(format_timestamp(0.0), "0:00");
        assert_eq!(format_timestamp(65.9), "1:05");
        assert_eq!(format_timestamp(1799.0), "29:59");
    }

    #[test]
    fn timestamps_over_an_hour_pad_minutes() {
        assert_eq!(format_timestamp(3600.0), "1:00:00");
        assert_eq!(format_timestamp(3723.0), "1:02:03");
    }

    #[test]
    fn negative_and_nan_positions_format_as_zero() {
        assert_eq!(format_timestamp(-5.0), "0:00");
        assert_eq!(format_timestamp(f64::NAN), "0:00");
    }

    #[test]
    fn durations_pick_the_coarsest_units() {
        assert_eq!(format_duration(45.0), "45s");
        assert_eq!(format_duration(720.0), "12m");
        assert_eq!(format_duration(750.0), "12m");
        assert_eq!(format_duration(7200.0), "2h");
        assert_eq!(format_duration(3900.0), "1h 5m");
        assert_eq!(format_duration(0.0), "0s");
    }

    #[test]
    fn parse_accepts_all_three_shapes() {
        assert_eq!(parse_timestamp("45").unwrap(), 45.0);
        assert_eq!(parse_timestamp("2:05").unwrap(), 125.0);
        assert_eq!(parse_timestamp(" 1:02:03 ").unwrap(), 3723.0);
    }

    #[test]
    fn parse_rejects_malformed_input() {
        assert!(parse_timestamp("").is_err());
        assert!(parse_timestamp("1:60").is_err());
        assert!(parse_timestamp("a:10").is_err());
        assert!(parse_timestamp("1::0").is_err());
        assert!(parse_timestamp("1:2:3:4").is_err());
        assert!(parse_timestamp("-1").is_err());
    }

    #[test]
    fn parse_inverts_format() {
        for secs in [0.0, 59.0, 61.0, 3599.0, 3723.0] {
            assert_eq!(parse_timestamp(&format_timestamp(secs)).unwrap(), secs);
        }
    }
}
