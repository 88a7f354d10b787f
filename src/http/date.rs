//! HTTP date handling module
//!
//! `Last-Modified` generation and `If-Modified-Since` evaluation.

use chrono::{DateTime, NaiveDateTime, Utc};

/// IMF-fixdate, e.g. `Sun, 06 Nov 1994 08:49:37 GMT`
const IMF_FIXDATE: &str = "%a, %d %b %Y %H:%M:%S GMT";

/// Format a timestamp for the `Last-Modified` header
pub fn format_http_date(time: DateTime<Utc>) -> String {
    time.format(IMF_FIXDATE).to_string()
}

/// Parse an IMF-fixdate header value
pub fn parse_http_date(value: &str) -> Option<DateTime<Utc>> {
    NaiveDateTime::parse_from_str(value.trim(), IMF_FIXDATE)
        .ok()
        .map(|naive| naive.and_utc())
}

/// Whether a client's `If-Modified-Since` covers the file's modification time
///
/// Comparison happens at whole-second precision since that is all the
/// header can carry. Unparseable values never match.
pub fn is_not_modified(if_modified_since: Option<&str>, modified: DateTime<Utc>) -> bool {
    if_modified_since
        .and_then(parse_http_date)
        .is_some_and(|since| modified.timestamp() <= since.timestamp())
}
