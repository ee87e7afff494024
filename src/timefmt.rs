//! Date and time strings for the event panel and the recent list.

use std::fmt::Display;

use chrono::{DateTime, Datelike, Local, NaiveDate, NaiveDateTime, Offset, TimeZone, Timelike, Utc};
use serde::Serialize;

/// Shown in place of a field that cannot be computed.
pub const MISSING: &str = "-";

/// Left-pad with zeros to `size` characters, keeping only the last `size`.
///
/// `pad(5, 2) == "05"`, `pad(123, 2) == "23"`.
#[must_use]
pub fn pad(n: impl Display, size: usize) -> String {
    let s = format!("0000{n}");
    let skip = s.chars().count().saturating_sub(size);
    s.chars().skip(skip).collect()
}

/// `YYYY-MM-DD` in the time zone of `dt`.
#[must_use]
pub fn date_string<Tz: TimeZone>(dt: &DateTime<Tz>) -> String {
    format!(
        "{}-{}-{}",
        pad(dt.year(), 4),
        pad(dt.month(), 2),
        pad(dt.day(), 2)
    )
}

/// `HH:MM:SS` in the time zone of `dt`.
#[must_use]
pub fn time_string<Tz: TimeZone>(dt: &DateTime<Tz>) -> String {
    format!(
        "{}:{}:{}",
        pad(dt.hour(), 2),
        pad(dt.minute(), 2),
        pad(dt.second(), 2)
    )
}

/// `UTC±HH:MM` for the offset of `dt`.
///
/// The raw offset counts minutes behind UTC, so zones ahead of UTC render
/// with `+` and everything else with `-`.
#[must_use]
pub fn timezone_offset_string<Tz: TimeZone>(dt: &DateTime<Tz>) -> String {
    let raw = -dt.offset().fix().local_minus_utc() / 60;
    let sign = if raw < 0 { '+' } else { '-' };
    let minutes = raw.unsigned_abs();
    format!("UTC{sign}{}:{}", pad(minutes / 60, 2), pad(minutes % 60, 2))
}

/// Whether to render in the viewer's zone or in UTC.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum TimeMode {
    Local,
    Utc,
}

/// Date, time and zone label for one timestamp.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FormattedTime {
    pub date: String,
    pub time: String,
    pub timezone: String,
}

impl FormattedTime {
    /// Format a raw event time. Unparseable input gives sentinel fields.
    #[must_use]
    pub fn from_raw(raw: Option<&str>, mode: TimeMode) -> Self {
        match raw.and_then(parse_event_time) {
            Some(ts) => Self::new(ts, mode),
            None => Self::missing(),
        }
    }

    #[must_use]
    pub fn new(ts: DateTime<Utc>, mode: TimeMode) -> Self {
        match mode {
            TimeMode::Local => Self::in_zone(&ts.with_timezone(&Local)),
            TimeMode::Utc => Self {
                date: date_string(&ts),
                time: time_string(&ts),
                timezone: "UTC".to_string(),
            },
        }
    }

    /// Format in an explicit zone.
    #[must_use]
    pub fn in_zone<Tz: TimeZone>(dt: &DateTime<Tz>) -> Self {
        Self {
            date: date_string(dt),
            time: time_string(dt),
            timezone: timezone_offset_string(dt),
        }
    }

    #[must_use]
    pub fn missing() -> Self {
        Self {
            date: MISSING.to_string(),
            time: MISSING.to_string(),
            timezone: MISSING.to_string(),
        }
    }
}

/// Parse an event time: epoch milliseconds, RFC 3339, or a naive
/// timestamp read as UTC. Seconds may be left out, and a bare
/// `YYYY-MM-DD` is midnight UTC.
#[must_use]
pub fn parse_event_time(raw: &str) -> Option<DateTime<Utc>> {
    let raw = raw.trim();
    if let Ok(ms) = raw.parse::<i64>() {
        return Utc.timestamp_millis_opt(ms).single();
    }
    if let Ok(dt) = DateTime::parse_from_rfc3339(raw) {
        return Some(dt.with_timezone(&Utc));
    }
    let naive = [
        "%Y-%m-%dT%H:%M:%S%.f",
        "%Y-%m-%d %H:%M:%S%.f",
        "%Y-%m-%dT%H:%M",
        "%Y-%m-%d %H:%M",
    ]
    .iter()
    .find_map(|fmt| NaiveDateTime::parse_from_str(raw, fmt).ok())
    .or_else(|| {
        NaiveDate::parse_from_str(raw, "%Y-%m-%d")
            .ok()
            .and_then(|date| date.and_hms_opt(0, 0, 0))
    })?;
    Some(naive.and_utc())
}

#[cfg(test)]
mod tests {
    use chrono::FixedOffset;

    use super::*;

    #[test]
    fn test_pad() {
        assert_eq!(pad(5, 2), "05");
        assert_eq!(pad(123, 2), "23");
        assert_eq!(pad(2023, 4), "2023");
        assert_eq!(pad(7, 4), "0007");
    }

    #[test]
    fn test_utc_date_and_time() {
        let ts = parse_event_time("2023-01-05T00:00:00Z").expect("valid timestamp");
        assert_eq!(date_string(&ts), "2023-01-05");
        assert_eq!(time_string(&ts), "00:00:00");

        let formatted = FormattedTime::new(ts, TimeMode::Utc);
        assert_eq!(formatted.date, "2023-01-05");
        assert_eq!(formatted.timezone, "UTC");
    }

    #[test]
    fn test_fixed_zone_formatting() {
        let ts = parse_event_time("2023-01-05T20:30:09Z").expect("valid timestamp");
        let tokyo = FixedOffset::east_opt(9 * 3600).expect("valid offset");
        let formatted = FormattedTime::in_zone(&ts.with_timezone(&tokyo));
        assert_eq!(formatted.date, "2023-01-06");
        assert_eq!(formatted.time, "05:30:09");
        assert_eq!(formatted.timezone, "UTC+09:00");
    }

    #[test]
    fn test_offset_sign_inversion() {
        let ts = parse_event_time("2023-06-01T12:00:00Z").expect("valid timestamp");
        let west = FixedOffset::west_opt(3 * 3600 + 30 * 60).expect("valid offset");
        assert_eq!(timezone_offset_string(&ts.with_timezone(&west)), "UTC-03:30");
        assert_eq!(timezone_offset_string(&ts), "UTC-00:00");
    }

    #[test]
    fn test_parse_epoch_millis() {
        let ts = parse_event_time("1672876800000").expect("valid millis");
        assert_eq!(date_string(&ts), "2023-01-05");
    }

    #[test]
    fn test_parse_naive_as_utc() {
        let ts = parse_event_time("2023-01-05T10:11:12.500").expect("valid naive");
        assert_eq!(time_string(&ts), "10:11:12");
    }

    #[test]
    fn test_parse_date_only_as_midnight_utc() {
        let ts = parse_event_time("2023-01-05").expect("valid date");
        assert_eq!(date_string(&ts), "2023-01-05");
        assert_eq!(time_string(&ts), "00:00:00");
    }

    #[test]
    fn test_parse_without_seconds() {
        let ts = parse_event_time("2023-01-05T10:00").expect("valid minutes");
        assert_eq!(time_string(&ts), "10:00:00");
        assert!(parse_event_time("2023-01-05 10:07").is_some());
    }

    #[test]
    fn test_unparseable_time_is_missing() {
        assert_eq!(FormattedTime::from_raw(Some("yesterday"), TimeMode::Utc), FormattedTime::missing());
        assert_eq!(FormattedTime::from_raw(None, TimeMode::Local).date, MISSING);
    }
}
