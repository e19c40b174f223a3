//! Wire types for the backend REST API.

use baysense_common::feature::{ingest_cages, FeatureParseError};
use baysense_common::time::format_api_date;
use baysense_common::{
    CageRecord, CloudCover, DashboardError, DashboardResult, DateRange, FeatureIngest, Parameter,
    TileUrlTemplate,
};
use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::warn;

/// Filters shared by every imagery request.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct AnalysisQuery {
    pub parameter: Parameter,
    pub range: DateRange,
    pub cloud_cover: CloudCover,
}

impl AnalysisQuery {
    pub(crate) fn range_params(&self) -> Vec<(&'static str, String)> {
        vec![
            ("start_date", format_api_date(self.range.start)),
            ("end_date", format_api_date(self.range.end)),
            ("cloud_cover", self.cloud_cover.percent().to_string()),
        ]
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
pub(crate) struct AvailableDatesResponse {
    #[serde(default)]
    pub available_dates: Vec<String>,
}

/// Parameter tile source plus its stretch range.
///
/// `tile_url` is null when no imagery matched the filters.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct TileResponse {
    #[serde(default)]
    pub tile_url: Option<String>,
    #[serde(default)]
    pub legend_min: Option<f64>,
    #[serde(default)]
    pub legend_max: Option<f64>,
}

impl TileResponse {
    /// Validated template, or `None` when the backend had no imagery.
    pub fn template(&self) -> DashboardResult<Option<TileUrlTemplate>> {
        parse_template(self.tile_url.as_deref())
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RgbTileResponse {
    #[serde(default)]
    pub tile_url: Option<String>,
}

impl RgbTileResponse {
    pub fn template(&self) -> DashboardResult<Option<TileUrlTemplate>> {
        parse_template(self.tile_url.as_deref())
    }
}

fn parse_template(raw: Option<&str>) -> DashboardResult<Option<TileUrlTemplate>> {
    match raw.map(str::trim).filter(|s| !s.is_empty()) {
        Some(url) => TileUrlTemplate::parse(url).map(Some),
        None => Ok(None),
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
pub(crate) struct ParameterValuesResponse {
    #[serde(default)]
    pub values: Vec<Value>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub(crate) struct ErrorBody {
    #[serde(default)]
    pub error: Option<String>,
}

/// One forecast step.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ForecastEntry {
    /// Local time, "YYYY-MM-DD HH:MM:SS".
    pub datetime: String,
    #[serde(default)]
    pub temperature: Option<f64>,
    #[serde(default)]
    pub humidity: Option<f64>,
    #[serde(default)]
    pub rainfall: Option<f64>,
    #[serde(default)]
    pub gust_speed: Option<f64>,
}

impl ForecastEntry {
    pub fn timestamp(&self) -> Option<NaiveDateTime> {
        NaiveDateTime::parse_from_str(self.datetime.trim(), "%Y-%m-%d %H:%M:%S").ok()
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct WeatherResponse {
    /// City the forecast was resolved to.
    #[serde(default)]
    pub location: Option<String>,
    #[serde(default)]
    pub forecast: Vec<ForecastEntry>,
}

/// Which cages to retrieve.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CageScope {
    All,
    Farm(String),
    /// An empty list means every cage.
    Farms(Vec<String>),
}

#[derive(Debug, Clone, Default, Deserialize)]
pub(crate) struct FarmCagesResponse {
    #[serde(default)]
    pub cages: Vec<Value>,
}

/// Cage records decoded one by one; undecodable records are kept as errors.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct CageRecords {
    pub records: Vec<CageRecord>,
    pub malformed: Vec<FeatureParseError>,
    /// Position of each record in the response.
    positions: Vec<usize>,
}

impl CageRecords {
    pub(crate) fn decode(values: Vec<Value>) -> Self {
        let mut out = Self::default();
        for (index, value) in values.into_iter().enumerate() {
            match serde_json::from_value::<CageRecord>(value) {
                Ok(record) => {
                    out.records.push(record);
                    out.positions.push(index);
                }
                Err(e) => {
                    warn!(index = index, error = %e, "Skipping undecodable cage record");
                    out.malformed.push(FeatureParseError {
                        index,
                        message: e.to_string(),
                    });
                }
            }
        }
        out
    }

    /// Point features for the cage overlay, with every skipped record.
    pub fn into_ingest(self) -> FeatureIngest {
        let mut ingest = ingest_cages(&self.records);
        for err in ingest.errors.iter_mut() {
            if let Some(position) = self.positions.get(err.index) {
                err.index = *position;
            }
        }
        ingest.errors.extend(self.malformed);
        ingest.errors.sort_by_key(|e| e.index);
        ingest
    }
}

/// Body of a non-2xx response, reduced to the backend's `error` field.
pub(crate) fn error_message(body: &str) -> Option<String> {
    serde_json::from_str::<ErrorBody>(body)
        .ok()
        .and_then(|b| b.error)
        .filter(|e| !e.trim().is_empty())
}

pub(crate) fn malformed(endpoint: &str, e: impl std::fmt::Display) -> DashboardError {
    DashboardError::MalformedData(format!("{}: {}", endpoint, e))
}
