//! Year / month / day buckets for picking an imagery date.
//!
//! The picker is a single reducer: every event re-derives the three bucket
//! levels in dependency order (year, then month, then day) so a refreshed
//! date list can never leave a stale child selection behind.

use chrono::{Datelike, NaiveDate};
use std::collections::BTreeSet;
use tracing::debug;

use crate::time::{format_api_date, parse_iso_date};

/// Input to [`DateBuckets::reduce`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DateEvent {
    /// A fresh (unordered, possibly duplicated) list of ISO date strings.
    DatesLoaded(Vec<String>),
    YearSelected(String),
    MonthSelected(String),
    DaySelected(String),
    /// The overlay date owned by the parent changed.
    OverlayDateChanged(Option<NaiveDate>),
    /// Step to the next available date.
    Next,
    /// Step to the previous available date.
    Prev,
}

/// Sorted, de-duplicated list of available dates with adjacency lookups.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DateNavigator {
    dates: Vec<NaiveDate>,
}

impl DateNavigator {
    /// Build from raw strings; unparseable entries are dropped one by one.
    pub fn from_strings(raw: &[String]) -> Self {
        let set: BTreeSet<NaiveDate> = raw.iter().filter_map(|s| parse_iso_date(s)).collect();
        Self {
            dates: set.into_iter().collect(),
        }
    }

    pub fn dates(&self) -> &[NaiveDate] {
        &self.dates
    }

    pub fn is_empty(&self) -> bool {
        self.dates.is_empty()
    }

    pub fn contains(&self, date: NaiveDate) -> bool {
        self.dates.binary_search(&date).is_ok()
    }

    pub fn latest(&self) -> Option<NaiveDate> {
        self.dates.last().copied()
    }

    /// Date following `current`, or `None` at the end of the list or when
    /// `current` is not an available date.
    pub fn next(&self, current: NaiveDate) -> Option<NaiveDate> {
        let idx = self.dates.binary_search(&current).ok()?;
        self.dates.get(idx + 1).copied()
    }

    pub fn prev(&self, current: NaiveDate) -> Option<NaiveDate> {
        let idx = self.dates.binary_search(&current).ok()?;
        idx.checked_sub(1).and_then(|i| self.dates.get(i)).copied()
    }

    pub fn can_next(&self, current: Option<NaiveDate>) -> bool {
        current.and_then(|d| self.next(d)).is_some()
    }

    pub fn can_prev(&self, current: Option<NaiveDate>) -> bool {
        current.and_then(|d| self.prev(d)).is_some()
    }
}

/// Cascading year/month/day selection over a list of available dates.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DateBuckets {
    navigator: DateNavigator,
    overlay_date: Option<NaiveDate>,
    years: Vec<String>,
    months: Vec<String>,
    days: Vec<String>,
    selected_year: Option<String>,
    selected_month: Option<String>,
    selected_day: Option<String>,
}

impl DateBuckets {
    pub fn new(dates: &[String]) -> Self {
        let mut buckets = Self::default();
        buckets.reduce(DateEvent::DatesLoaded(dates.to_vec()));
        buckets
    }

    /// Apply one event and re-derive every dependent level.
    pub fn reduce(&mut self, event: DateEvent) {
        match event {
            DateEvent::DatesLoaded(raw) => {
                self.navigator = DateNavigator::from_strings(&raw);
                debug!(
                    received = raw.len(),
                    usable = self.navigator.dates().len(),
                    "Loaded available dates"
                );
            }
            DateEvent::YearSelected(year) => {
                if self.years.contains(&year) {
                    self.selected_year = Some(year);
                }
            }
            DateEvent::MonthSelected(month) => {
                if self.months.contains(&month) {
                    self.selected_month = Some(month);
                }
            }
            DateEvent::DaySelected(day) => {
                if self.days.contains(&day) {
                    self.selected_day = Some(day);
                }
            }
            DateEvent::OverlayDateChanged(date) => self.sync_to(date),
            DateEvent::Next => {
                if let Some(next) = self.overlay_date.and_then(|d| self.navigator.next(d)) {
                    self.sync_to(Some(next));
                }
            }
            DateEvent::Prev => {
                if let Some(prev) = self.overlay_date.and_then(|d| self.navigator.prev(d)) {
                    self.sync_to(Some(prev));
                }
            }
        }
        self.rederive();
    }

    fn sync_to(&mut self, date: Option<NaiveDate>) {
        self.overlay_date = date;
        match date {
            Some(d) => {
                self.selected_year = Some(format!("{:04}", d.year()));
                self.selected_month = Some(format!("{:02}", d.month()));
                self.selected_day = Some(format!("{:02}", d.day()));
            }
            None => {
                self.selected_year = None;
                self.selected_month = None;
                self.selected_day = None;
            }
        }
    }

    /// Date the selections fall back to when they become invalid: the
    /// overlay date if it is available, otherwise the latest date.
    fn anchor(&self) -> Option<NaiveDate> {
        self.overlay_date
            .filter(|d| self.navigator.contains(*d))
            .or_else(|| self.navigator.latest())
    }

    fn rederive(&mut self) {
        if self.navigator.is_empty() {
            self.years.clear();
            self.months.clear();
            self.days.clear();
            self.selected_year = None;
            self.selected_month = None;
            self.selected_day = None;
            return;
        }

        let anchor = self.anchor();
        let dates = self.navigator.dates();

        self.years = distinct(dates.iter().map(|d| format!("{:04}", d.year())));
        self.selected_year = pick(
            self.selected_year.take(),
            &self.years,
            anchor.map(|a| format!("{:04}", a.year())),
        );

        let year = self.selected_year.clone();
        self.months = distinct(
            dates
                .iter()
                .filter(|d| Some(format!("{:04}", d.year())) == year)
                .map(|d| format!("{:02}", d.month())),
        );
        let anchor_month = anchor
            .filter(|a| Some(format!("{:04}", a.year())) == year)
            .map(|a| format!("{:02}", a.month()));
        self.selected_month = pick(self.selected_month.take(), &self.months, anchor_month);

        let month = self.selected_month.clone();
        let in_month = |d: &&NaiveDate| {
            Some(format!("{:04}", d.year())) == year && Some(format!("{:02}", d.month())) == month
        };
        self.days = distinct(dates.iter().filter(in_month).map(|d| format!("{:02}", d.day())));
        let anchor_day = anchor
            .filter(|a| in_month(&a))
            .map(|a| format!("{:02}", a.day()));
        self.selected_day = pick(self.selected_day.take(), &self.days, anchor_day);
    }

    pub fn years(&self) -> &[String] {
        &self.years
    }

    pub fn months(&self) -> &[String] {
        &self.months
    }

    pub fn days(&self) -> &[String] {
        &self.days
    }

    pub fn selected_year(&self) -> Option<&str> {
        self.selected_year.as_deref()
    }

    pub fn selected_month(&self) -> Option<&str> {
        self.selected_month.as_deref()
    }

    pub fn selected_day(&self) -> Option<&str> {
        self.selected_day.as_deref()
    }

    pub fn overlay_date(&self) -> Option<NaiveDate> {
        self.overlay_date
    }

    pub fn navigator(&self) -> &DateNavigator {
        &self.navigator
    }

    pub fn can_next(&self) -> bool {
        self.navigator.can_next(self.overlay_date)
    }

    pub fn can_prev(&self) -> bool {
        self.navigator.can_prev(self.overlay_date)
    }

    /// The date composed from the current year, month and day selections,
    /// provided it is one of the available dates.
    pub fn candidate_date(&self) -> Option<NaiveDate> {
        let composed = format!(
            "{}-{}-{}",
            self.selected_year.as_deref()?,
            self.selected_month.as_deref()?,
            self.selected_day.as_deref()?
        );
        parse_iso_date(&composed).filter(|d| self.navigator.contains(*d))
    }

    /// Commit the composed selection as the overlay date.
    ///
    /// Returns the committed date formatted for the API.
    pub fn commit(&mut self) -> Option<String> {
        let date = self.candidate_date()?;
        self.reduce(DateEvent::OverlayDateChanged(Some(date)));
        Some(format_api_date(date))
    }
}

fn distinct(values: impl Iterator<Item = String>) -> Vec<String> {
    values.collect::<BTreeSet<_>>().into_iter().collect()
}

fn pick(current: Option<String>, options: &[String], preferred: Option<String>) -> Option<String> {
    if let Some(current) = current.filter(|c| options.contains(c)) {
        return Some(current);
    }
    preferred
        .filter(|p| options.contains(p))
        .or_else(|| options.first().cloned())
}
