//! Block timestamp parsing.
//!
//! Tendermint headers carry RFC3339 timestamps with up to nine fractional
//! digits, and some chains emit more than nine. Anything past nanosecond
//! precision is truncated before parsing.

use chrono::{DateTime, Utc};
use thiserror::Error;

/// Fractional digits chrono can represent.
const MAX_FRACTION_DIGITS: usize = 9;

#[derive(Debug, Error)]
#[error("unparseable block time {raw:?}: {source}")]
pub struct BlockTimeError {
    raw: String,
    #[source]
    source: chrono::ParseError,
}

/// Parse a block timestamp like `2025-01-01T00:00:00.123456789Z`.
///
/// A literal `Z` suffix is UTC offset zero; explicit numeric offsets are
/// accepted as well and normalized to UTC.
pub fn parse_block_time(raw: &str) -> Result<DateTime<Utc>, BlockTimeError> {
    let trimmed = truncate_fraction(raw);
    DateTime::parse_from_rfc3339(&trimmed)
        .map(|dt| dt.with_timezone(&Utc))
        .map_err(|source| BlockTimeError { raw: raw.to_string(), source })
}

/// Keep at most nine digits of the fractional-seconds run.
fn truncate_fraction(raw: &str) -> String {
    let Some(dot) = raw.find('.') else {
        return raw.to_string();
    };
    let fraction_start = dot + 1;
    let digits = raw[fraction_start..]
        .bytes()
        .take_while(|b| b.is_ascii_digit())
        .count();
    if digits <= MAX_FRACTION_DIGITS {
        return raw.to_string();
    }
    let mut out = String::with_capacity(raw.len());
    out.push_str(&raw[..fraction_start + MAX_FRACTION_DIGITS]);
    out.push_str(&raw[fraction_start + digits..]);
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Timelike;

    #[test]
    fn parses_nanosecond_fraction_with_z_suffix() {
        let ts = parse_block_time("2025-01-01T00:00:00.123456789Z").unwrap();
        assert_eq!(ts.nanosecond(), 123_456_789);
        assert_eq!(ts.to_rfc3339(), "2025-01-01T00:00:00.123456789+00:00");
    }

    #[test]
    fn truncates_fraction_beyond_nine_digits() {
        let ts = parse_block_time("2025-01-01T00:00:00.1234567891234Z").unwrap();
        assert_eq!(ts.nanosecond(), 123_456_789);
    }

    #[test]
    fn parses_without_fraction() {
        let ts = parse_block_time("2025-06-30T12:34:56Z").unwrap();
        assert_eq!(ts.nanosecond(), 0);
    }

    #[test]
    fn normalizes_explicit_offsets_to_utc() {
        let ts = parse_block_time("2025-01-01T02:00:00.5+02:00").unwrap();
        assert_eq!(ts.to_rfc3339(), "2025-01-01T00:00:00.500+00:00");
    }

    #[test]
    fn rejects_garbage() {
        assert!(parse_block_time("not a timestamp").is_err());
        assert!(parse_block_time("").is_err());
    }
}
