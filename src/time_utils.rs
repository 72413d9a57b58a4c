// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Shared helpers for date/time formatting.

use chrono::{DateTime, NaiveDateTime, SecondsFormat, Utc};

/// Format used for local (naive) timestamps in storage and output.
pub const LOCAL_DATETIME_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

/// Format a UTC timestamp as RFC3339 using a `Z` suffix.
pub fn format_utc_rfc3339(date: DateTime<Utc>) -> String {
    date.to_rfc3339_opts(SecondsFormat::Secs, true)
}

/// Parse an RFC3339 timestamp into UTC.
pub fn parse_utc_rfc3339(value: &str) -> Option<DateTime<Utc>> {
    DateTime::parse_from_rfc3339(value)
        .ok()
        .map(|dt| dt.with_timezone(&Utc))
}

/// Format a naive local timestamp as `YYYY-MM-DD HH:MM:SS`.
pub fn format_local(date: NaiveDateTime) -> String {
    date.format(LOCAL_DATETIME_FORMAT).to_string()
}

/// Parse a `YYYY-MM-DD HH:MM:SS` local timestamp.
pub fn parse_local(value: &str) -> Option<NaiveDateTime> {
    NaiveDateTime::parse_from_str(value, LOCAL_DATETIME_FORMAT).ok()
}

/// Format a duration in whole seconds as `H:MM:SS`, prefixed with `N day(s), ` past 24h.
pub fn format_duration_secs(total: i64) -> String {
    let (sign, total) = if total < 0 { ("-", -total) } else { ("", total) };
    let days = total / 86_400;
    let rest = total % 86_400;
    let clock = format!("{}:{:02}:{:02}", rest / 3600, (rest % 3600) / 60, rest % 60);

    match days {
        0 => format!("{}{}", sign, clock),
        1 => format!("{}1 day, {}", sign, clock),
        n => format!("{}{} days, {}", sign, n, clock),
    }
}
