//! Date helpers.

use chrono::{Local, NaiveDate};

/// Text format used to persist calendar dates.
pub const DATE_FORMAT: &str = "%Y-%m-%d";

/// Return today's date in the local time zone.
#[must_use]
pub fn today() -> NaiveDate {
    Local::now().date_naive()
}

/// Render a date in [`DATE_FORMAT`].
#[must_use]
pub fn format_date(date: NaiveDate) -> String {
    date.format(DATE_FORMAT).to_string()
}

/// Parse a date previously rendered with [`format_date`].
///
/// # Errors
///
/// Returns [`chrono::ParseError`] when `text` is not a `YYYY-MM-DD` date.
pub fn parse_date(text: &str) -> Result<NaiveDate, chrono::ParseError> {
    NaiveDate::parse_from_str(text, DATE_FORMAT)
}
