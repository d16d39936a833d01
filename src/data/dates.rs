use chrono::{DateTime, NaiveDate, NaiveDateTime};
use polars::prelude::{Column, DataType, IntoColumn, IntoSeries, PolarsResult, StringChunked};

/// Canonical storage format of every date column after loading.
pub const ISO_DATE_FORMAT: &str = "%Y-%m-%d";

/// Human-readable label used on bar-chart axes, e.g. "January 01, 2021".
pub const LONG_DATE_FORMAT: &str = "%B %d, %Y";

const DATETIME_FORMATS: &[&str] = &[
    "%Y-%m-%d %H:%M:%S",
    "%Y-%m-%d %H:%M:%S%.f",
    "%Y-%m-%dT%H:%M:%S",
    "%Y-%m-%dT%H:%M:%S%.f",
    "%Y-%m-%d %H:%M",
    "%Y/%m/%d %H:%M:%S",
    "%m/%d/%Y %H:%M:%S",
    "%m/%d/%Y %H:%M",
];

const DATE_FORMATS: &[&str] = &["%Y-%m-%d", "%Y/%m/%d", "%m/%d/%Y", "%d %B %Y", "%B %d, %Y"];

/// Parses a date-like string permissively.
///
/// Offsets are ignored: the calendar date as written is kept. Returns `None`
/// for anything that is not recognizably a date, never a guessed value.
pub fn parse_date(raw: &str) -> Option<NaiveDate> {
    let raw = raw.trim();
    if raw.is_empty() {
        return None;
    }

    if let Ok(dt) = DateTime::parse_from_rfc3339(raw) {
        return Some(dt.naive_local().date());
    }
    if let Ok(dt) = DateTime::parse_from_str(raw, "%Y-%m-%d %H:%M:%S%:z") {
        return Some(dt.naive_local().date());
    }

    DATETIME_FORMATS
        .iter()
        .find_map(|fmt| NaiveDateTime::parse_from_str(raw, fmt).ok())
        .map(|dt| dt.date())
        .or_else(|| {
            DATE_FORMATS
                .iter()
                .find_map(|fmt| NaiveDate::parse_from_str(raw, fmt).ok())
        })
}

pub fn to_iso_date(raw: &str) -> Option<String> {
    parse_date(raw).map(|d| d.format(ISO_DATE_FORMAT).to_string())
}

pub fn to_long_date(iso: &str) -> Option<String> {
    NaiveDate::parse_from_str(iso, ISO_DATE_FORMAT)
        .ok()
        .map(|d| d.format(LONG_DATE_FORMAT).to_string())
}

pub(crate) fn iso_date_udf(c: Column) -> PolarsResult<Column> {
    map_strings(c, to_iso_date)
}

pub(crate) fn long_date_udf(c: Column) -> PolarsResult<Column> {
    map_strings(c, to_long_date)
}

fn map_strings(c: Column, f: fn(&str) -> Option<String>) -> PolarsResult<Column> {
    let as_str = c.cast(&DataType::String)?;
    let out = as_str
        .str()?
        .into_iter()
        .map(|opt| opt.and_then(f))
        .collect::<StringChunked>()
        .into_series()
        .into_column();
    Ok(out)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_common_timestamp_layouts() {
        let want = NaiveDate::from_ymd_opt(2021, 1, 2);
        assert_eq!(parse_date("2021-01-02"), want);
        assert_eq!(parse_date("2021-01-02 23:59:59"), want);
        assert_eq!(parse_date("2021-01-02T08:15:00"), want);
        assert_eq!(parse_date("2021-01-02 08:15:00.123"), want);
        assert_eq!(parse_date("2021-01-02T08:15:00+05:00"), want);
        assert_eq!(parse_date("01/02/2021"), want);
        assert_eq!(parse_date("  2021/01/02 "), want);
    }

    #[test]
    fn unparseable_values_stay_missing() {
        assert_eq!(parse_date(""), None);
        assert_eq!(parse_date("yesterday"), None);
        assert_eq!(parse_date("2021-13-45"), None);
        assert_eq!(to_iso_date("n/a"), None);
    }

    #[test]
    fn long_date_label() {
        assert_eq!(
            to_long_date("2021-01-01").as_deref(),
            Some("January 01, 2021")
        );
        assert_eq!(to_long_date("not a date"), None);
    }
}
