use chrono::{DateTime, NaiveDate, NaiveDateTime, Utc};
use rust_decimal::{Decimal, RoundingStrategy};

pub const SECONDS_PER_DAY: f64 = 86_400.0;

#[must_use]
pub fn datetime_to_unix_seconds(time: DateTime<Utc>) -> f64 {
    time.timestamp_millis() as f64 / 1000.0
}

/// Converts surface time (unix seconds) back into a UTC instant.
///
/// Returns `None` for non-finite or out-of-range input.
#[must_use]
pub fn unix_seconds_to_datetime(seconds: f64) -> Option<DateTime<Utc>> {
    if !seconds.is_finite() {
        return None;
    }
    let millis = (seconds * 1000.0).round();
    if millis < i64::MIN as f64 || millis > i64::MAX as f64 {
        return None;
    }
    DateTime::from_timestamp_millis(millis as i64)
}

/// Parses the timestamp shapes the data backend emits.
///
/// Accepted: RFC 3339, naive `yyyy-mm-ddThh:mm:ss[.f]` (or with a space
/// separator), and plain `yyyy-mm-dd`. Naive values are read as UTC, and a
/// plain date maps to UTC midnight.
#[must_use]
pub fn parse_timestamp(raw: &str) -> Option<DateTime<Utc>> {
    let raw = raw.trim();
    if raw.is_empty() {
        return None;
    }
    if let Ok(parsed) = DateTime::parse_from_rfc3339(raw) {
        return Some(parsed.with_timezone(&Utc));
    }
    for format in ["%Y-%m-%dT%H:%M:%S%.f", "%Y-%m-%d %H:%M:%S%.f"] {
        if let Ok(naive) = NaiveDateTime::parse_from_str(raw, format) {
            return Some(naive.and_utc());
        }
    }
    NaiveDate::parse_from_str(raw, "%Y-%m-%d")
        .ok()
        .and_then(|date| date.and_hms_opt(0, 0, 0))
        .map(|naive| naive.and_utc())
}

/// Parses a backend timestamp straight into surface time.
#[must_use]
pub fn parse_unix_seconds(raw: &str) -> Option<f64> {
    parse_timestamp(raw).map(datetime_to_unix_seconds)
}

/// UTC calendar day of a surface time.
#[must_use]
pub fn utc_day(seconds: f64) -> Option<NaiveDate> {
    unix_seconds_to_datetime(seconds).map(|time| time.date_naive())
}

/// Formats a surface time as `dd/mm/yyyy` (UTC).
#[must_use]
pub fn format_day_month_year(seconds: f64) -> Option<String> {
    utc_day(seconds).map(|day| day.format("%d/%m/%Y").to_string())
}

/// Formats a price with the fixed two-decimal precision used in legends.
///
/// Exact midpoints round away from zero. Non-finite input falls back to the
/// float formatter.
#[must_use]
pub fn format_price(price: f64) -> String {
    match Decimal::from_f64_retain(price) {
        Some(value) => {
            let rounded = value.round_dp_with_strategy(2, RoundingStrategy::MidpointAwayFromZero);
            format!("{rounded:.2}")
        }
        None => format!("{price:.2}"),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_timestamp_accepts_backend_shapes() {
        let midnight = parse_unix_seconds("2024-03-05").expect("date only");
        assert_eq!(midnight, 1_709_596_800.0);
        assert_eq!(parse_unix_seconds("2024-03-05T00:00:00"), Some(midnight));
        assert_eq!(parse_unix_seconds("2024-03-05 00:00:00.000"), Some(midnight));
        assert_eq!(parse_unix_seconds("2024-03-05T07:00:00+07:00"), Some(midnight));
        assert_eq!(parse_unix_seconds("not a date"), None);
        assert_eq!(parse_unix_seconds(""), None);
    }

    #[test]
    fn day_month_year_formatting_is_zero_padded() {
        assert_eq!(
            format_day_month_year(1_709_596_800.0).as_deref(),
            Some("05/03/2024")
        );
        assert_eq!(format_day_month_year(f64::NAN), None);
    }

    #[test]
    fn price_formatting_uses_two_decimals() {
        assert_eq!(format_price(12.0), "12.00");
        assert_eq!(format_price(12.345_6), "12.35");
        assert_eq!(format_price(1_250.5), "1250.50");
    }

    #[test]
    fn price_midpoints_round_away_from_zero() {
        // Both are exact in binary, so only the rounding rule decides.
        assert_eq!(format_price(0.625), "0.63");
        assert_eq!(format_price(10.125), "10.13");
        assert_eq!(format_price(f64::NAN), "NaN");
    }
}
