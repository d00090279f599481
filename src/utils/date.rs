// src/utils/date.rs

//! Timestamp parsing and event-date extraction from free text.
//!
//! Titles frequently carry the date of the recorded show, which is a better
//! signal than the upload timestamp. Extraction runs three tiers in order:
//! `YYYY-MM-DD`, `DD-MM-YYYY`, then a bare year.

use std::sync::LazyLock;

use chrono::{DateTime, Datelike, NaiveDate, NaiveDateTime, Utc};
use regex::Regex;

const YEAR: &str = r"(19[89]\d|20[0-2]\d)";
const MONTH: &str = r"(0[1-9]|1[0-2])";
const DAY: &str = r"(0[1-9]|[12]\d|3[01])";

static YMD: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(&format!(r"(?:^|\D){YEAR}[-/.]{MONTH}[-/.]{DAY}(?:\D|$)"))
        .expect("ymd pattern is valid")
});

static DMY: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(&format!(r"(?:^|\D){DAY}[-/.]{MONTH}[-/.]{YEAR}(?:\D|$)"))
        .expect("dmy pattern is valid")
});

static BARE_YEAR: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(&format!(r"(?:^|\D){YEAR}(?:\D|$)")).expect("year pattern is valid")
});

/// Date information found in a piece of text.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DateSignal {
    /// A complete calendar date
    Full(NaiveDate),
    /// Only a year was present
    Year(i32),
}

impl DateSignal {
    /// Collapse to a date; a bare year becomes January 1.
    pub fn to_date(self) -> Option<NaiveDate> {
        match self {
            DateSignal::Full(date) => Some(date),
            DateSignal::Year(year) => NaiveDate::from_ymd_opt(year, 1, 1),
        }
    }
}

/// Parse an upstream timestamp such as `1991-09-28T00:00:00Z`.
///
/// Offsets are honoured; a timestamp without an offset is taken as UTC.
/// Malformed input yields `None`.
pub fn parse_timestamp(raw: &str) -> Option<DateTime<Utc>> {
    let raw = raw.trim();
    if raw.is_empty() {
        return None;
    }
    if let Ok(dt) = DateTime::parse_from_rfc3339(raw) {
        return Some(dt.with_timezone(&Utc));
    }
    NaiveDateTime::parse_from_str(raw, "%Y-%m-%dT%H:%M:%S%.f")
        .ok()
        .map(|naive| naive.and_utc())
}

/// Scan text for the highest-confidence date signal.
pub fn scan_date(text: &str) -> Option<DateSignal> {
    let ymd = YMD.captures_iter(text).find_map(|caps| {
        calendar_date(&caps[1], &caps[2], &caps[3])
    });
    if let Some(date) = ymd {
        return Some(DateSignal::Full(date));
    }

    let dmy = DMY.captures_iter(text).find_map(|caps| {
        calendar_date(&caps[3], &caps[2], &caps[1])
    });
    if let Some(date) = dmy {
        return Some(DateSignal::Full(date));
    }

    BARE_YEAR
        .captures(text)
        .and_then(|caps| caps[1].parse().ok())
        .map(DateSignal::Year)
}

/// Extract a date from free text; a bare year yields January 1 of that year.
pub fn extract_date_from_text(text: &str) -> Option<NaiveDate> {
    scan_date(text).and_then(DateSignal::to_date)
}

/// Resolve the canonical event date from a title and the publish timestamp.
///
/// A full date in the title always wins. A bare title year defers to the
/// publish date when both agree on the year, since the publish date is more
/// precise; otherwise the title year stands on its own.
pub fn resolve_event_date(title: &str, published: Option<&DateTime<Utc>>) -> Option<NaiveDate> {
    let published = published.map(|dt| dt.date_naive());
    match scan_date(title) {
        Some(DateSignal::Full(date)) => Some(date),
        Some(DateSignal::Year(year)) => match published {
            Some(date) if date.year() == year => Some(date),
            _ => DateSignal::Year(year).to_date(),
        },
        None => published,
    }
}

/// Render a date as `YYYY-MM-DD`, or "Unknown" when absent.
pub fn format_date(date: Option<NaiveDate>) -> String {
    date.map(|d| d.format("%Y-%m-%d").to_string())
        .unwrap_or_else(|| "Unknown".to_string())
}

fn calendar_date(year: &str, month: &str, day: &str) -> Option<NaiveDate> {
    NaiveDate::from_ymd_opt(year.parse().ok()?, month.parse().ok()?, day.parse().ok()?)
}
