use chrono::{DateTime, NaiveDate, NaiveDateTime};
use regex::Regex;
use std::sync::OnceLock;

static MS_DATE: OnceLock<Regex> = OnceLock::new();

/// Parses the API's serialized date formats into a calendar date.
///
/// List endpoints emit `/Date(1714521600000+0000)/` (milliseconds since the
/// epoch); a few report fields carry `2024-05-01T00:00:00` instead. Anything
/// else is `None` and the caller skips the record with a diagnostic.
pub fn parse_api_date(raw: &str) -> Option<NaiveDate> {
    let re = MS_DATE.get_or_init(|| Regex::new(r"/Date\((-?\d+)").unwrap());
    if let Some(caps) = re.captures(raw) {
        let ms: i64 = caps.get(1)?.as_str().parse().ok()?;
        return Some(DateTime::from_timestamp_millis(ms)?.date_naive());
    }
    NaiveDateTime::parse_from_str(raw, "%Y-%m-%dT%H:%M:%S")
        .map(|dt| dt.date())
        .ok()
}
