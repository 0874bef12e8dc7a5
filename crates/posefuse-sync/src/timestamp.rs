use chrono::{Local, NaiveDateTime, TimeZone};

/// Date-time layout with fractional seconds.
pub const DATETIME_FRACTIONAL_FORMAT: &str = "%Y-%m-%d %H:%M:%S%.f";

/// Date-time layout without fractional seconds.
pub const DATETIME_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

/// Error types for the timestamp module.
#[derive(Debug, thiserror::Error, PartialEq)]
pub enum TimestampError {
    /// The value is neither epoch milliseconds nor a known date-time layout.
    #[error("Unrecognized timestamp format: {0:?}")]
    UnrecognizedFormat(String),

    /// The date-time falls in a daylight saving gap of the time zone.
    #[error("Date-time {0:?} does not exist in the time zone")]
    NonexistentTime(String),
}

/// A timestamp as found in a pose source, before normalization.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RawTimestamp {
    /// Already in epoch milliseconds.
    EpochMs(i64),
    /// Text: epoch milliseconds or a date-time.
    Text(String),
}

impl From<i64> for RawTimestamp {
    fn from(value: i64) -> Self {
        RawTimestamp::EpochMs(value)
    }
}

impl From<&str> for RawTimestamp {
    fn from(value: &str) -> Self {
        RawTimestamp::Text(value.to_string())
    }
}

impl From<String> for RawTimestamp {
    fn from(value: String) -> Self {
        RawTimestamp::Text(value)
    }
}

impl std::fmt::Display for RawTimestamp {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            RawTimestamp::EpochMs(ms) => write!(f, "{ms}"),
            RawTimestamp::Text(text) => write!(f, "{text}"),
        }
    }
}

/// Normalize a raw timestamp into epoch milliseconds.
///
/// Text is tried as an integer first, then as `YYYY-MM-DD HH:MM:SS.ffffff`, then
/// as `YYYY-MM-DD HH:MM:SS`. Date-times carry no zone and are read as wall-clock
/// time in the local time zone, the clock the pose logger stamps with.
/// Sub-millisecond digits are truncated.
///
/// Use [`normalize_timestamp_in`] to read date-times in a fixed zone.
pub fn normalize_timestamp(raw: &RawTimestamp) -> Result<i64, TimestampError> {
    normalize_timestamp_in(raw, &Local)
}

/// Normalize a raw timestamp, reading date-times as wall-clock time in `zone`.
///
/// A date-time repeated by a daylight saving change resolves to its earlier
/// instant.
///
/// Example:
///
/// ```
/// use chrono::Utc;
/// use posefuse_sync::timestamp::normalize_timestamp_in;
///
/// assert_eq!(normalize_timestamp_in(&"1700000000123".into(), &Utc).unwrap(), 1_700_000_000_123);
/// assert_eq!(normalize_timestamp_in(&"1970-01-01 00:00:01.5".into(), &Utc).unwrap(), 1500);
/// assert!(normalize_timestamp_in(&"yesterday".into(), &Utc).is_err());
/// ```
pub fn normalize_timestamp_in<Tz: TimeZone>(
    raw: &RawTimestamp,
    zone: &Tz,
) -> Result<i64, TimestampError> {
    let text = match raw {
        RawTimestamp::EpochMs(ms) => return Ok(*ms),
        RawTimestamp::Text(text) => text.trim(),
    };

    if let Ok(ms) = text.parse::<i64>() {
        return Ok(ms);
    }

    let naive = [DATETIME_FRACTIONAL_FORMAT, DATETIME_FORMAT]
        .iter()
        .find_map(|format| NaiveDateTime::parse_from_str(text, format).ok())
        .ok_or_else(|| TimestampError::UnrecognizedFormat(text.to_string()))?;

    naive
        .and_local_timezone(zone.clone())
        .earliest()
        .map(|dt| dt.timestamp_millis())
        .ok_or_else(|| TimestampError::NonexistentTime(text.to_string()))
}

/// Format epoch milliseconds as a UTC date-time, for display.
pub fn format_epoch_ms(ms: i64) -> Option<String> {
    chrono::DateTime::from_timestamp_millis(ms)
        .map(|dt| dt.naive_utc().format(DATETIME_FORMAT).to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{FixedOffset, Utc};

    #[test]
    fn test_epoch_ms_passthrough() -> Result<(), TimestampError> {
        assert_eq!(normalize_timestamp(&RawTimestamp::EpochMs(42))?, 42);
        assert_eq!(normalize_timestamp(&"1700000000000".into())?, 1_700_000_000_000);
        assert_eq!(normalize_timestamp(&" 95 ".into())?, 95);
        assert_eq!(normalize_timestamp(&"-5".into())?, -5);
        Ok(())
    }

    #[test]
    fn test_datetime_with_fraction() -> Result<(), TimestampError> {
        let ms = normalize_timestamp_in(&"2024-03-01 12:30:45.123456".into(), &Utc)?;
        assert_eq!(ms, 1_709_296_245_123);
        let ms = normalize_timestamp_in(&"2024-03-01 12:30:45.9".into(), &Utc)?;
        assert_eq!(ms, 1_709_296_245_900);
        Ok(())
    }

    #[test]
    fn test_datetime_without_fraction() -> Result<(), TimestampError> {
        assert_eq!(
            normalize_timestamp_in(&"2024-03-01 12:30:45".into(), &Utc)?,
            1_709_296_245_000
        );
        assert_eq!(normalize_timestamp_in(&"1970-01-01 00:00:00".into(), &Utc)?, 0);
        Ok(())
    }

    #[test]
    fn test_datetime_in_zone() -> Result<(), TimestampError> {
        let plus_one = FixedOffset::east_opt(3600).unwrap();
        assert_eq!(
            normalize_timestamp_in(&"2024-03-01 12:30:45".into(), &plus_one)?,
            1_709_296_245_000 - 3_600_000
        );

        // integers are already absolute
        assert_eq!(normalize_timestamp_in(&"95".into(), &plus_one)?, 95);
        Ok(())
    }

    #[test]
    fn test_datetime_defaults_to_local_zone() -> Result<(), TimestampError> {
        let text = "2024-03-01 12:30:45";
        let expected = NaiveDateTime::parse_from_str(text, DATETIME_FORMAT)
            .unwrap()
            .and_local_timezone(Local)
            .earliest()
            .unwrap()
            .timestamp_millis();
        assert_eq!(normalize_timestamp(&text.into())?, expected);
        Ok(())
    }

    #[test]
    fn test_unrecognized() {
        for text in ["", "12.5", "2024-03-01", "2024/03/01 12:30:45", "noon"] {
            assert_eq!(
                normalize_timestamp(&text.into()),
                Err(TimestampError::UnrecognizedFormat(text.to_string()))
            );
        }
    }

    #[test]
    fn test_format_epoch_ms() {
        assert_eq!(
            format_epoch_ms(1_709_296_245_123).as_deref(),
            Some("2024-03-01 12:30:45")
        );
    }
}
