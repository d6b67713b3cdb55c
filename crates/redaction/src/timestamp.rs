//! `HH:MM:SS.mmm` overlay text

use chrono::NaiveTime;

const MS_PER_DAY: u64 = 86_400_000;

/// Format a stream position as `HH:MM:SS.mmm`.
///
/// Positions past 24h wrap around, the day count is not shown.
pub fn format_timestamp(timestamp_ms: u64) -> String {
    let ms = timestamp_ms % MS_PER_DAY;
    let secs = (ms / 1000) as u32;
    let nanos = ((ms % 1000) * 1_000_000) as u32;
    NaiveTime::from_num_seconds_from_midnight_opt(secs, nanos)
        .unwrap_or_default()
        .format("%H:%M:%S%.3f")
        .to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_zero() {
        assert_eq!(format_timestamp(0), "00:00:00.000");
    }

    #[test]
    fn test_hours_minutes_seconds_millis() {
        assert_eq!(format_timestamp(3_723_456), "01:02:03.456");
        assert_eq!(format_timestamp(40), "00:00:00.040");
        assert_eq!(format_timestamp(59_999), "00:00:59.999");
    }

    #[test]
    fn test_wraps_after_a_day() {
        assert_eq!(format_timestamp(MS_PER_DAY + 1_000), "00:00:01.000");
    }
}
