use anyhow::{anyhow, Result};
use cadence_core::calendar::parse_iso_date;
use chrono::{NaiveDate, NaiveTime, TimeZone, Utc};
use chrono_english::{parse_date_string, Dialect};

/// Parses a calendar date relative to `today`.
///
/// ISO dates are taken as is; anything else goes through natural-language
/// parsing ("tomorrow", "next friday", "3 days").
pub fn parse_date(input: &str, today: NaiveDate) -> Result<NaiveDate> {
    if let Ok(date) = parse_iso_date(input) {
        return Ok(date);
    }
    let now = Utc.from_utc_datetime(&today.and_time(NaiveTime::MIN));
    parse_date_string(input.trim(), now, Dialect::Us)
        .map(|parsed| parsed.date_naive())
        .map_err(|e| anyhow!("Failed to parse date '{}': {}", input, e))
}

pub fn parse_optional_date(input: Option<&str>, today: NaiveDate) -> Result<Option<NaiveDate>> {
    input.map(|s| parse_date(s, today)).transpose()
}
