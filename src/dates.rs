use chrono::{DateTime, Datelike, NaiveDate, NaiveDateTime};

/// Printed in place of any date that could not be read.
pub const DATE_NOT_AVAILABLE: &str = "Date not available";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DateStyle {
    /// `January 5, 2025`
    Long,
    /// `5th day of January 2025`
    Ordinal,
}

const DATETIME_FORMATS: [&str; 3] = [
    "%Y-%m-%dT%H:%M:%S%.f",
    "%Y-%m-%d %H:%M:%S%.f",
    "%Y-%m-%d %H:%M:%S",
];

const DATE_FORMATS: [&str; 3] = ["%Y-%m-%d", "%m/%d/%Y", "%B %d, %Y"];

pub fn parse_date(raw: &str) -> Option<NaiveDate> {
    let raw = raw.trim();
    if raw.is_empty() {
        return None;
    }
    if let Ok(dt) = DateTime::parse_from_rfc3339(raw) {
        return Some(dt.date_naive());
    }
    if let Some(dt) = DATETIME_FORMATS
        .iter()
        .find_map(|f| NaiveDateTime::parse_from_str(raw, f).ok())
    {
        return Some(dt.date());
    }
    DATE_FORMATS
        .iter()
        .find_map(|f| NaiveDate::parse_from_str(raw, f).ok())
}

pub fn format_date(raw: &str, style: DateStyle) -> Option<String> {
    let date = parse_date(raw)?;
    Some(match style {
        DateStyle::Long => date.format("%B %-d, %Y").to_string(),
        DateStyle::Ordinal => format!(
            "{}{} day of {}",
            date.day(),
            ordinal_suffix(date.day()),
            date.format("%B %Y")
        ),
    })
}

fn ordinal_suffix(day: u32) -> &'static str {
    if (11..=13).contains(&(day % 100)) {
        return "th";
    }
    match day % 10 {
        1 => "st",
        2 => "nd",
        3 => "rd",
        _ => "th",
    }
}
