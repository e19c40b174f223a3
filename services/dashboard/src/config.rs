//! Dashboard configuration.
//!
//! Loaded from an optional YAML file; every section falls back to the
//! defaults used by the deployed dashboard. Backend location and token can
//! be overridden from the environment by the binary.

use std::path::Path;
use std::time::Duration;

use anyhow::{Context, Result};
use baysense_client::{AnalysisQuery, ClientConfig};
use baysense_common::{
    CloudCover, DashboardError, DashboardResult, DateRange, MapCoordinate, Parameter, Viewport,
};
use chrono::NaiveDate;
use map_layers::MapOptions;
use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use crate::panel::ImageMode;

// ============================================================================
// Root
// ============================================================================

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DashboardConfig {
    pub api: ApiConfig,
    pub map: MapConfig,
    pub analysis: AnalysisConfig,
    pub weather: WeatherConfig,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ApiConfig {
    pub base_url: String,
    pub timeout_secs: u64,
    /// Authorization header value for the cage endpoints.
    pub auth_token: Option<String>,
}

impl Default for ApiConfig {
    fn default() -> Self {
        Self {
            base_url: "http://localhost:5000".to_string(),
            timeout_secs: 30,
            auth_token: None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct MapConfig {
    /// `[lon, lat]`
    pub center: [f64; 2],
    pub zoom: f64,
    pub width: u32,
    pub height: u32,
}

impl Default for MapConfig {
    fn default() -> Self {
        Self {
            center: [121.3301436972315, 14.078182532529903],
            zoom: 16.7,
            width: 1280,
            height: 800,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AnalysisConfig {
    pub parameter: Parameter,
    pub cloud_cover: u8,
    pub start_date: NaiveDate,
    /// Today when unset.
    pub end_date: Option<NaiveDate>,
    pub mode: ImageMode,
}

impl Default for AnalysisConfig {
    fn default() -> Self {
        Self {
            parameter: Parameter::Chlorophyll,
            cloud_cover: 20,
            start_date: NaiveDate::from_ymd_opt(2025, 1, 1).unwrap_or(NaiveDate::MIN),
            end_date: None,
            mode: ImageMode::Composite,
        }
    }
}

/// Forecast advisory thresholds.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct WeatherConfig {
    pub enabled: bool,
    /// m/s
    pub gust_warning: f64,
    /// mm over the next 24 hours
    pub rain_warning: f64,
}

impl Default for WeatherConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            gust_warning: 15.0,
            rain_warning: 50.0,
        }
    }
}

// ============================================================================
// Loading
// ============================================================================

impl DashboardConfig {
    /// Load and validate a YAML file.
    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file: {}", path.display()))?;
        let config = Self::from_yaml(&content)
            .with_context(|| format!("Failed to parse config file: {}", path.display()))?;
        info!(path = %path.display(), "Loaded dashboard config");
        Ok(config)
    }

    pub fn from_yaml(content: &str) -> Result<Self> {
        let config: Self = serde_yaml::from_str(content).context("Invalid YAML")?;
        config.validate()?;
        Ok(config)
    }

    /// Environment and command-line values win over the file.
    pub fn apply_overrides(&mut self, base_url: Option<String>, auth_token: Option<String>) {
        if let Some(url) = base_url.filter(|u| !u.trim().is_empty()) {
            debug!(base_url = %url, "Overriding backend URL");
            self.api.base_url = url;
        }
        if let Some(token) = auth_token.filter(|t| !t.trim().is_empty()) {
            self.api.auth_token = Some(token);
        }
    }

    pub fn validate(&self) -> DashboardResult<()> {
        if self.api.base_url.trim().is_empty() {
            return Err(DashboardError::Config("api.base_url is empty".to_string()));
        }
        if self.api.timeout_secs == 0 {
            return Err(DashboardError::Config(
                "api.timeout_secs must be positive".to_string(),
            ));
        }

        let [lon, lat] = self.map.center;
        if !(-180.0..=180.0).contains(&lon) || !(-90.0..=90.0).contains(&lat) {
            return Err(DashboardError::Config(format!(
                "map.center [{}, {}] is not a lon/lat pair",
                lon, lat
            )));
        }
        if !(Viewport::MIN_ZOOM..=Viewport::MAX_ZOOM).contains(&self.map.zoom) {
            return Err(DashboardError::Config(format!(
                "map.zoom {} outside {}..={}",
                self.map.zoom,
                Viewport::MIN_ZOOM,
                Viewport::MAX_ZOOM
            )));
        }
        if self.map.width == 0 || self.map.height == 0 {
            return Err(DashboardError::Config("map size must be non-zero".to_string()));
        }

        CloudCover::new(self.analysis.cloud_cover)
            .map_err(|e| DashboardError::Config(e.to_string()))?;
        if let Some(end) = self.analysis.end_date {
            DateRange::new(self.analysis.start_date, end)
                .map_err(|e| DashboardError::Config(e.to_string()))?;
        }

        if self.weather.gust_warning <= 0.0 || self.weather.rain_warning <= 0.0 {
            return Err(DashboardError::Config(
                "weather thresholds must be positive".to_string(),
            ));
        }
        Ok(())
    }

    // ========================================================================
    // Derived settings
    // ========================================================================

    pub fn client_config(&self) -> ClientConfig {
        ClientConfig {
            base_url: self.api.base_url.clone(),
            timeout: Duration::from_secs(self.api.timeout_secs),
            auth_token: self.api.auth_token.clone(),
        }
    }

    pub fn map_options(&self) -> MapOptions {
        MapOptions {
            center: MapCoordinate::from_array(self.map.center),
            zoom: self.map.zoom,
        }
    }

    /// Initial filters, with an open end date resolved to `today`.
    pub fn initial_query(&self, today: NaiveDate) -> DashboardResult<AnalysisQuery> {
        let end = self.analysis.end_date.unwrap_or(today);
        Ok(AnalysisQuery {
            parameter: self.analysis.parameter,
            range: DateRange::new(self.analysis.start_date, end)?,
            cloud_cover: CloudCover::new(self.analysis.cloud_cover)?,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    #[test]
    fn test_defaults() {
        let config = DashboardConfig::default();
        assert!(config.validate().is_ok());
        assert_eq!(config.api.timeout_secs, 30);
        assert_eq!(config.map.zoom, 16.7);
        assert_eq!(config.analysis.parameter, Parameter::Chlorophyll);
        assert_eq!(config.analysis.mode, ImageMode::Composite);

        let query = config.initial_query(date(2025, 6, 1)).unwrap();
        assert_eq!(query.range.start, date(2025, 1, 1));
        assert_eq!(query.range.end, date(2025, 6, 1));
        assert_eq!(query.cloud_cover.percent(), 20);
    }

    #[test]
    fn test_partial_yaml_keeps_defaults() {
        let config = DashboardConfig::from_yaml(
            r#"
api:
  base_url: "http://backend:5000"
analysis:
  parameter: turbidity
  cloud_cover: 40
  mode: single
"#,
        )
        .unwrap();
        assert_eq!(config.api.base_url, "http://backend:5000");
        assert_eq!(config.api.timeout_secs, 30);
        assert_eq!(config.analysis.parameter, Parameter::Turbidity);
        assert_eq!(config.analysis.mode, ImageMode::Single);
        assert_eq!(config.map, MapConfig::default());
    }

    #[test]
    fn test_sample_config_matches_defaults() {
        let sample = include_str!("../config/dashboard.yaml");
        let config = DashboardConfig::from_yaml(sample).unwrap();
        assert_eq!(config, DashboardConfig::default());
    }

    #[test]
    fn test_invalid_cloud_cover_rejected() {
        let err = DashboardConfig::from_yaml("analysis:\n  cloud_cover: 25\n").unwrap_err();
        assert!(format!("{:#}", err).contains("cloud_cover"));
    }

    #[test]
    fn test_zoom_and_dates_validated() {
        let mut config = DashboardConfig::default();
        config.map.zoom = 30.0;
        assert!(config.validate().is_err());

        let mut config = DashboardConfig::default();
        config.analysis.end_date = Some(date(2024, 12, 31));
        assert!(matches!(config.validate(), Err(DashboardError::Config(_))));
    }

    #[test]
    fn test_overrides_ignore_blank_values() {
        let mut config = DashboardConfig::default();
        config.apply_overrides(Some("  ".to_string()), Some("secret".to_string()));
        assert_eq!(config.api.base_url, "http://localhost:5000");
        assert_eq!(config.client_config().auth_token.as_deref(), Some("secret"));
    }
}
