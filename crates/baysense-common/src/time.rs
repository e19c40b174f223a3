//! Date handling for imagery queries.
//!
//! All dates exchanged with the backend are calendar dates in `yyyy-MM-dd`
//! form; timestamps are accepted on input and truncated to their date part.

use chrono::{DateTime, NaiveDate};
use serde::{Deserialize, Serialize};

use crate::DashboardError;

/// Wire format for dates in query strings and responses.
pub const API_DATE_FORMAT: &str = "%Y-%m-%d";

/// Parse an ISO 8601 date or timestamp into a calendar date.
pub fn parse_iso_date(s: &str) -> Option<NaiveDate> {
    let s = s.trim();
    if let Ok(date) = NaiveDate::parse_from_str(s, API_DATE_FORMAT) {
        return Some(date);
    }
    if let Ok(dt) = DateTime::parse_from_rfc3339(s) {
        return Some(dt.date_naive());
    }
    // "2024-01-05T00:00:00" without offset
    s.get(..10)
        .filter(|_| s.as_bytes().get(10) == Some(&b'T'))
        .and_then(|head| NaiveDate::parse_from_str(head, API_DATE_FORMAT).ok())
}

pub fn format_api_date(date: NaiveDate) -> String {
    date.format(API_DATE_FORMAT).to_string()
}

/// Long display form used in tooltips, e.g. "January 5, 2024".
///
/// Missing values render as "N/A" and unparseable ones as "Invalid Date".
pub fn format_long_date(raw: Option<&str>) -> String {
    match raw.map(str::trim).filter(|s| !s.is_empty()) {
        None => "N/A".to_string(),
        Some(s) => match parse_iso_date(s) {
            Some(date) => date.format("%B %-d, %Y").to_string(),
            None => "Invalid Date".to_string(),
        },
    }
}

/// Latest date in an unordered list of ISO date strings.
pub fn latest_available_date(dates: &[String]) -> Option<NaiveDate> {
    dates.iter().filter_map(|d| parse_iso_date(d)).max()
}

pub fn is_date_available(date: NaiveDate, dates: &[String]) -> bool {
    dates.iter().any(|d| parse_iso_date(d) == Some(date))
}

/// An inclusive range of calendar dates.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct DateRange {
    pub start: NaiveDate,
    pub end: NaiveDate,
}

impl DateRange {
    pub fn new(start: NaiveDate, end: NaiveDate) -> Result<Self, DashboardError> {
        if start > end {
            return Err(DashboardError::invalid(
                "start_date",
                format!("{} is after end date {}", start, end),
            ));
        }
        Ok(Self { start, end })
    }

    pub fn contains(&self, date: NaiveDate) -> bool {
        date >= self.start && date <= self.end
    }

    /// Caption used above the legend, e.g. "2025-01-01 to 2025-03-31".
    pub fn caption(&self) -> String {
        format!(
            "{} to {}",
            format_api_date(self.start),
            format_api_date(self.end)
        )
    }
}

/// Maximum scene cloud cover percentage used to filter imagery.
///
/// The selection slider moves in steps of 10 between 10 and 100.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "u8", into = "u8")]
pub struct CloudCover(u8);

impl CloudCover {
    pub const MIN: u8 = 10;
    pub const MAX: u8 = 100;
    pub const STEP: u8 = 10;

    pub fn new(percent: u8) -> Result<Self, DashboardError> {
        if !(Self::MIN..=Self::MAX).contains(&percent) || percent % Self::STEP != 0 {
            return Err(DashboardError::invalid(
                "cloud_cover",
                format!(
                    "{} must be a multiple of {} between {} and {}",
                    percent,
                    Self::STEP,
                    Self::MIN,
                    Self::MAX
                ),
            ));
        }
        Ok(Self(percent))
    }

    pub fn percent(&self) -> u8 {
        self.0
    }
}

impl Default for CloudCover {
    fn default() -> Self {
        Self(20)
    }
}

impl TryFrom<u8> for CloudCover {
    type Error = DashboardError;

    fn try_from(value: u8) -> Result<Self, Self::Error> {
        Self::new(value)
    }
}

impl From<CloudCover> for u8 {
    fn from(value: CloudCover) -> Self {
        value.0
    }
}
