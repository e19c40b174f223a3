//! Next-day forecast summary and advisories for the weather panel.

use baysense_client::{ForecastEntry, WeatherResponse};
use chrono::{Duration, NaiveDateTime};
use serde::Serialize;

use crate::config::WeatherConfig;

/// Hours covered by the summary, counted from the first forecast step.
pub const SUMMARY_WINDOW_HOURS: i64 = 24;

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct WeatherSummary {
    pub location: Option<String>,
    pub from: NaiveDateTime,
    /// Forecast steps inside the window.
    pub steps: usize,
    /// °C
    pub max_temperature: Option<f64>,
    /// m/s
    pub max_gust: Option<f64>,
    /// mm, summed over the window
    pub total_rainfall: Option<f64>,
    /// %
    pub mean_humidity: Option<f64>,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Advisory {
    StrongGust { gust: f64 },
    HeavyRain { rainfall: f64 },
}

impl Advisory {
    pub fn message(&self) -> String {
        match self {
            Advisory::StrongGust { gust } => format!(
                "Wind gusts up to {:.1} m/s expected. Check cage moorings and nets.",
                gust
            ),
            Advisory::HeavyRain { rainfall } => format!(
                "{:.1} mm of rain expected in the next 24 hours. Runoff may raise turbidity.",
                rainfall
            ),
        }
    }
}

impl WeatherSummary {
    /// Summarise the first day of a forecast. `None` when no step has a
    /// readable timestamp.
    pub fn from_forecast(response: &WeatherResponse) -> Option<Self> {
        let mut timed: Vec<(NaiveDateTime, &ForecastEntry)> = response
            .forecast
            .iter()
            .filter_map(|entry| entry.timestamp().map(|t| (t, entry)))
            .collect();
        timed.sort_by_key(|(t, _)| *t);

        let from = timed.first()?.0;
        let until = from + Duration::hours(SUMMARY_WINDOW_HOURS);
        let window: Vec<&ForecastEntry> = timed
            .iter()
            .filter(|(t, _)| *t < until)
            .map(|(_, e)| *e)
            .collect();

        let values = |f: fn(&ForecastEntry) -> Option<f64>| -> Vec<f64> {
            window
                .iter()
                .filter_map(|e| f(*e))
                .filter(|v| v.is_finite())
                .collect()
        };
        let max = |v: Vec<f64>| v.into_iter().reduce(f64::max);

        let humidity = values(|e| e.humidity);
        let rainfall = values(|e| e.rainfall);

        Some(Self {
            location: response.location.clone(),
            from,
            steps: window.len(),
            max_temperature: max(values(|e| e.temperature)),
            max_gust: max(values(|e| e.gust_speed)),
            total_rainfall: (!rainfall.is_empty()).then(|| rainfall.iter().sum()),
            mean_humidity: (!humidity.is_empty())
                .then(|| humidity.iter().sum::<f64>() / humidity.len() as f64),
        })
    }

    /// Warnings for values strictly above the configured thresholds.
    pub fn advisories(&self, thresholds: &WeatherConfig) -> Vec<Advisory> {
        let mut out = Vec::new();
        if let Some(gust) = self.max_gust.filter(|g| *g > thresholds.gust_warning) {
            out.push(Advisory::StrongGust { gust });
        }
        if let Some(rainfall) = self.total_rainfall.filter(|r| *r > thresholds.rain_warning) {
            out.push(Advisory::HeavyRain { rainfall });
        }
        out
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use test_utils::assert_approx_eq;

    fn response() -> WeatherResponse {
        serde_json::from_value(test_utils::fixtures::weather()).unwrap()
    }

    #[test]
    fn test_summary_covers_first_day() {
        let summary = WeatherSummary::from_forecast(&response()).unwrap();
        assert_eq!(summary.location.as_deref(), Some("Talisay"));
        assert_eq!(summary.steps, 8);
        assert_eq!(summary.max_temperature, Some(32.0));
        assert_eq!(summary.max_gust, Some(16.0));
        assert_approx_eq!(summary.total_rainfall.unwrap(), 4.0, 1e-9);
        assert_approx_eq!(summary.mean_humidity.unwrap(), 73.125, 1e-9);
    }

    #[test]
    fn test_default_thresholds_flag_gusts_only() {
        let summary = WeatherSummary::from_forecast(&response()).unwrap();
        let advisories = summary.advisories(&WeatherConfig::default());
        assert_eq!(advisories, vec![Advisory::StrongGust { gust: 16.0 }]);
        assert!(advisories[0].message().contains("16.0 m/s"));

        let strict = WeatherConfig {
            rain_warning: 3.0,
            ..Default::default()
        };
        assert_eq!(summary.advisories(&strict).len(), 2);
    }

    #[test]
    fn test_missing_values_and_bad_timestamps() {
        let response: WeatherResponse = serde_json::from_value(serde_json::json!({
            "forecast": [
                {"datetime": "soon", "temperature": 40.0},
                {"datetime": "2025-03-01 03:00:00", "temperature": 25.0},
                {"datetime": "2025-03-01 00:00:00", "humidity": 90}
            ]
        }))
        .unwrap();
        let summary = WeatherSummary::from_forecast(&response).unwrap();
        assert_eq!(summary.steps, 2);
        assert_eq!(summary.from.to_string(), "2025-03-01 00:00:00");
        assert_eq!(summary.max_temperature, Some(25.0));
        assert_eq!(summary.max_gust, None);
        assert_eq!(summary.total_rainfall, None);
        assert!(summary.advisories(&WeatherConfig::default()).is_empty());
    }

    #[test]
    fn test_empty_forecast() {
        assert_eq!(WeatherSummary::from_forecast(&WeatherResponse::default()), None);
    }
}
