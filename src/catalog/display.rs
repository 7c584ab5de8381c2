//! Text shown for event fields. Anything unknown renders as [`PLACEHOLDER`].

use crate::model::Event;
use chrono::NaiveDate;
use itertools::Itertools;
use lazy_static::lazy_static;
use regex::Regex;

pub const PLACEHOLDER: &str = "TBD";

lazy_static! {
    static ref CLOCK_TIME: Regex = Regex::new(r"^\s*(\d{1,2})(?::(\d{1,2}))?").unwrap();
}

pub fn or_placeholder(value: Option<&str>) -> &str {
    value.unwrap_or(PLACEHOLDER)
}

/// e.g. "March 14, 2025"
pub fn format_date(date: Option<NaiveDate>) -> String {
    match date {
        Some(date) => date.format("%B %-d, %Y").to_string(),
        None => PLACEHOLDER.to_string(),
    }
}

/// 12 hour clock, e.g. "8:30 PM". Unknown or unreadable times are left blank.
pub fn format_time(time: Option<&str>) -> String {
    let Some(captures) = time.and_then(|time| CLOCK_TIME.captures(time)) else {
        return String::new();
    };

    let hours = captures[1].parse::<u32>().unwrap_or(0) % 24;
    let minutes = captures
        .get(2)
        .and_then(|m| m.as_str().parse::<u32>().ok())
        .unwrap_or(0)
        % 60;
    let (hour, suffix) = match hours {
        0 => (12, "AM"),
        1..=11 => (hours, "AM"),
        12 => (12, "PM"),
        _ => (hours - 12, "PM"),
    };

    format!("{hour}:{minutes:02} {suffix}")
}

/// e.g. "1,500 people"
pub fn format_capacity(capacity: Option<u32>) -> String {
    match capacity {
        Some(capacity) if capacity > 0 => format!("{} people", group_thousands(capacity)),
        _ => PLACEHOLDER.to_string(),
    }
}

pub fn format_rating(rating: f64) -> String {
    if rating > 0.0 {
        rating.to_string()
    } else {
        "N/A".to_string()
    }
}

/// One line summary used by listings
pub fn summary(event: &Event) -> String {
    let when = match format_time(event.time.as_deref()) {
        time if time.is_empty() => format_date(event.date),
        time => format!("{} {}", format_date(event.date), time),
    };

    format!(
        "{} | {} | {} | {}",
        event.title,
        when,
        or_placeholder(event.venue.as_deref()),
        event.ticket_status()
    )
}

fn group_thousands(value: u32) -> String {
    let digits = value.to_string();
    let bytes = digits.as_bytes();

    bytes
        .rchunks(3)
        .rev()
        .map(|chunk| String::from_utf8_lossy(chunk).into_owned())
        .join(",")
}
