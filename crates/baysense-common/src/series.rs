//! Parameter time series: chart rows, summary statistics and CSV export.

use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::debug;

use crate::time::parse_iso_date;

/// One sample of a parameter time series.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SeriesPoint {
    /// Date as received from the backend.
    pub date: String,
    pub value: f64,
}

impl SeriesPoint {
    pub fn new(date: impl Into<String>, value: f64) -> Self {
        Self {
            date: date.into(),
            value,
        }
    }
}

/// Decode raw `{date, value}` objects, dropping entries that lack a usable
/// date or a finite numeric value. The result is sorted by date.
pub fn parse_series(raw: &[Value]) -> Vec<SeriesPoint> {
    let mut points: Vec<SeriesPoint> = raw
        .iter()
        .filter_map(|item| {
            let date = item.get("date")?.as_str()?;
            parse_iso_date(date)?;
            let value = item.get("value")?.as_f64().filter(|v| v.is_finite())?;
            Some(SeriesPoint::new(date, value))
        })
        .collect();
    if points.len() != raw.len() {
        debug!(
            received = raw.len(),
            kept = points.len(),
            "Dropped unusable series samples"
        );
    }
    points.sort_by_key(|p| parse_iso_date(&p.date));
    points
}

/// Summary shown above the chart.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct SeriesStats {
    pub min: f64,
    pub max: f64,
    pub mean: f64,
    pub count: usize,
}

impl SeriesStats {
    /// `None` for an empty series.
    pub fn compute(points: &[SeriesPoint]) -> Option<Self> {
        if points.is_empty() {
            return None;
        }
        let (min, max, sum) = points.iter().fold(
            (f64::INFINITY, f64::NEG_INFINITY, 0.0),
            |(min, max, sum), p| (min.min(p.value), max.max(p.value), sum + p.value),
        );
        Some(Self {
            min,
            max,
            mean: sum / points.len() as f64,
            count: points.len(),
        })
    }

    /// `(min, max, mean)` with five decimals.
    pub fn formatted(&self) -> (String, String, String) {
        (
            format!("{:.5}", self.min),
            format!("{:.5}", self.max),
            format!("{:.5}", self.mean),
        )
    }
}

/// A point prepared for the chart widget.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ChartRow {
    pub date: String,
    pub value: f64,
    /// Value with two decimals, as shown on hover.
    pub display_value: String,
}

pub fn chart_rows(points: &[SeriesPoint]) -> Vec<ChartRow> {
    points
        .iter()
        .map(|p| ChartRow {
            date: p.date.clone(),
            value: p.value,
            display_value: format!("{:.2}", p.value),
        })
        .collect()
}

/// Render samples as CSV: a `Date,Value` header, one row per sample,
/// `\n` between rows and no trailing newline.
///
/// Values use the shortest representation that round-trips, so `1.2`
/// stays `1.2` and `3.0` prints as `3`.
pub fn to_csv(points: &[SeriesPoint]) -> String {
    std::iter::once("Date,Value".to_string())
        .chain(points.iter().map(|p| format!("{},{}", p.date, p.value)))
        .collect::<Vec<_>>()
        .join("\n")
}

/// Download file name for a parameter's series, e.g. `Turbidity_data.csv`.
pub fn csv_file_name(parameter_label: &str) -> String {
    format!("{}_data.csv", parameter_label)
}
