//! Human-readable duration rendering
//!
//! Produces the compact `1h2m3.5s` / `250ms` / `12.3µs` form used by the
//! access-log line and by the string duration encoder.

use std::time::Duration;

/// Render a duration in compact unit form.
///
/// Sub-second values use the largest unit below a second (`ns`, `µs`, `ms`)
/// with up to three fractional digits; larger values are broken into hours,
/// minutes and (fractional) seconds with trailing zeros trimmed.
///
/// ```
/// use rust_logger_facade::core::duration::format_duration;
/// use std::time::Duration;
///
/// assert_eq!(format_duration(Duration::from_millis(1500)), "1.5s");
/// assert_eq!(format_duration(Duration::from_secs(90)), "1m30s");
/// assert_eq!(format_duration(Duration::from_micros(250)), "250µs");
/// ```
pub fn format_duration(d: Duration) -> String {
    let nanos = d.as_nanos();
    if nanos == 0 {
        return "0s".to_string();
    }
    if nanos < 1_000 {
        return format!("{}ns", nanos);
    }
    if nanos < 1_000_000 {
        return format!("{}µs", fractional(nanos, 1_000));
    }
    if nanos < 1_000_000_000 {
        return format!("{}ms", fractional(nanos, 1_000_000));
    }

    let total_secs = d.as_secs();
    let hours = total_secs / 3600;
    let minutes = (total_secs % 3600) / 60;
    let secs = total_secs % 60;
    let sub_nanos = d.subsec_nanos();

    let mut out = String::new();
    if hours > 0 {
        out.push_str(&format!("{}h", hours));
    }
    if hours > 0 || minutes > 0 {
        out.push_str(&format!("{}m", minutes));
    }
    out.push_str(&secs.to_string());
    if sub_nanos > 0 {
        let frac = format!("{:09}", sub_nanos);
        out.push('.');
        out.push_str(frac.trim_end_matches('0'));
    }
    out.push('s');
    out
}

/// `value / unit` with the remainder rendered as trimmed decimal digits.
fn fractional(value: u128, unit: u128) -> String {
    let whole = value / unit;
    let rem = value % unit;
    if rem == 0 {
        return whole.to_string();
    }
    let width = unit.to_string().len() - 1;
    let frac = format!("{:0width$}", rem, width = width);
    format!("{}.{}", whole, frac.trim_end_matches('0'))
}

/// Drop the sub-second part of a duration.
pub fn truncate_to_seconds(d: Duration) -> Duration {
    Duration::from_secs(d.as_secs())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_sub_second_units() {
        assert_eq!(format_duration(Duration::ZERO), "0s");
        assert_eq!(format_duration(Duration::from_nanos(850)), "850ns");
        assert_eq!(format_duration(Duration::from_nanos(1_500)), "1.5µs");
        assert_eq!(format_duration(Duration::from_micros(2_345)), "2.345ms");
        assert_eq!(format_duration(Duration::from_millis(250)), "250ms");
    }

    #[test]
    fn test_seconds_and_above() {
        assert_eq!(format_duration(Duration::from_millis(1500)), "1.5s");
        assert_eq!(format_duration(Duration::from_secs(59)), "59s");
        assert_eq!(format_duration(Duration::from_millis(61_250)), "1m1.25s");
        assert_eq!(format_duration(Duration::from_secs(3600)), "1h0m0s");
        assert_eq!(format_duration(Duration::from_secs(3725)), "1h2m5s");
    }

    #[test]
    fn test_truncate_to_seconds() {
        let d = Duration::from_millis(75_999);
        assert_eq!(truncate_to_seconds(d), Duration::from_secs(75));
        assert_eq!(format_duration(truncate_to_seconds(d)), "1m15s");
    }
}
