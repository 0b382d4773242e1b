//! The single textual timestamp format shared by the staged input and the
//! `start` field of every output record.

use chrono::NaiveDateTime;

/// `YYYY-MM-DD HH:MM:SS`, no zone. Source records are written in UTC.
pub const TIMESTAMP_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

pub fn parse_timestamp(value: &str) -> Result<NaiveDateTime, chrono::ParseError> {
    NaiveDateTime::parse_from_str(value, TIMESTAMP_FORMAT)
}

pub fn format_timestamp(ts: NaiveDateTime) -> String {
    ts.format(TIMESTAMP_FORMAT).to_string()
}
