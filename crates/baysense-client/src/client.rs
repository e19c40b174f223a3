//! Async HTTP client for the backend REST API.

use std::time::Duration;

use baysense_common::feature::ingest_feature_collection;
use baysense_common::series::parse_series;
use baysense_common::time::format_api_date;
use baysense_common::{
    CloudCover, DashboardError, DashboardResult, FeatureIngest, Parameter, SeriesPoint,
};
use chrono::NaiveDate;
use reqwest::{header, Client, RequestBuilder, StatusCode};
use serde::de::DeserializeOwned;
use serde_json::{json, Value};
use tracing::{debug, info, instrument, warn};

use crate::types::{
    error_message, malformed, AnalysisQuery, AvailableDatesResponse, CageRecords, CageScope,
    FarmCagesResponse, ParameterValuesResponse, RgbTileResponse, TileResponse, WeatherResponse,
};

/// Connection settings for [`BackendClient`].
#[derive(Debug, Clone)]
pub struct ClientConfig {
    /// Backend base URL, e.g. `http://localhost:5000`.
    pub base_url: String,
    /// Whole-request timeout
    pub timeout: Duration,
    /// Sent as the `Authorization` header on cage endpoints.
    pub auth_token: Option<String>,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            base_url: "http://localhost:5000".to_string(),
            timeout: Duration::from_secs(30),
            auth_token: None,
        }
    }
}

/// How a 404 from an endpoint should be reported.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum NotFound {
    /// No imagery for the filters; not an error for the caller.
    Unavailable,
    Error,
}

#[derive(Debug, Clone)]
pub struct BackendClient {
    http: Client,
    base_url: String,
    auth_token: Option<String>,
}

impl BackendClient {
    pub fn new(config: ClientConfig) -> DashboardResult<Self> {
        let base_url = config.base_url.trim().trim_end_matches('/').to_string();
        if base_url.is_empty() {
            return Err(DashboardError::Config("backend base url is empty".to_string()));
        }
        let http = Client::builder()
            .timeout(config.timeout)
            .connect_timeout(Duration::from_secs(10))
            .pool_max_idle_per_host(4)
            .build()
            .map_err(|e| DashboardError::Config(format!("Failed to create HTTP client: {}", e)))?;

        info!(base_url = %base_url, timeout_secs = config.timeout.as_secs(), "Backend client ready");
        Ok(Self {
            http,
            base_url,
            auth_token: config.auth_token,
        })
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    fn get(&self, path: &str, query: &[(&str, String)]) -> RequestBuilder {
        self.http.get(self.url(path)).query(query)
    }

    fn with_auth(&self, request: RequestBuilder) -> RequestBuilder {
        match &self.auth_token {
            Some(token) => request.header(header::AUTHORIZATION, token),
            None => request,
        }
    }

    async fn send<T: DeserializeOwned>(
        &self,
        endpoint: &str,
        request: RequestBuilder,
        not_found: NotFound,
    ) -> DashboardResult<T> {
        let response = request
            .send()
            .await
            .map_err(|e| transport_error(endpoint, e))?;
        let status = response.status();
        let body = response
            .text()
            .await
            .map_err(|e| transport_error(endpoint, e))?;

        if !status.is_success() {
            let message = error_message(&body).unwrap_or_else(|| {
                status
                    .canonical_reason()
                    .unwrap_or("request failed")
                    .to_string()
            });
            if status == StatusCode::NOT_FOUND && not_found == NotFound::Unavailable {
                debug!(endpoint = endpoint, message = %message, "No imagery for filters");
                return Err(DashboardError::Unavailable(message));
            }
            warn!(endpoint = endpoint, status = status.as_u16(), message = %message, "Backend request failed");
            return Err(DashboardError::Http {
                endpoint: endpoint.to_string(),
                status: status.as_u16(),
                message,
            });
        }

        serde_json::from_str(&body).map_err(|e| malformed(endpoint, e))
    }

    // ========================================================================
    // Imagery
    // ========================================================================

    #[instrument(skip(self), level = "debug")]
    pub async fn available_dates(&self, query: &AnalysisQuery) -> DashboardResult<Vec<String>> {
        let endpoint = "/get_available_dates";
        let response: AvailableDatesResponse = self
            .send(endpoint, self.get(endpoint, &query.range_params()), NotFound::Error)
            .await?;
        debug!(count = response.available_dates.len(), "Fetched available dates");
        Ok(response.available_dates)
    }

    #[instrument(skip(self), level = "debug")]
    pub async fn composite_tile(&self, query: &AnalysisQuery) -> DashboardResult<TileResponse> {
        let endpoint = "/get_composite_tile";
        let mut params = vec![("parameter", query.parameter.key().to_string())];
        params.extend(query.range_params());
        self.send(endpoint, self.get(endpoint, &params), NotFound::Unavailable)
            .await
    }

    #[instrument(skip(self), level = "debug")]
    pub async fn specific_date_tile(
        &self,
        parameter: Parameter,
        date: NaiveDate,
        cloud_cover: CloudCover,
    ) -> DashboardResult<TileResponse> {
        let endpoint = "/get_specific_date_tile";
        let params = [
            ("parameter", parameter.key().to_string()),
            ("date", format_api_date(date)),
            ("cloud_cover", cloud_cover.percent().to_string()),
        ];
        self.send(endpoint, self.get(endpoint, &params), NotFound::Unavailable)
            .await
    }

    #[instrument(skip(self), level = "debug")]
    pub async fn composite_rgb_tile(&self, query: &AnalysisQuery) -> DashboardResult<RgbTileResponse> {
        let endpoint = "/get_composite_rgb_tile_for_polygons";
        self.send(
            endpoint,
            self.get(endpoint, &query.range_params()),
            NotFound::Unavailable,
        )
        .await
    }

    #[instrument(skip(self), level = "debug")]
    pub async fn specific_date_rgb_tile(
        &self,
        date: NaiveDate,
        cloud_cover: CloudCover,
    ) -> DashboardResult<RgbTileResponse> {
        let endpoint = "/get_specific_date_rgb_tile_for_polygons";
        let params = [
            ("date", format_api_date(date)),
            ("cloud_cover", cloud_cover.percent().to_string()),
        ];
        self.send(endpoint, self.get(endpoint, &params), NotFound::Unavailable)
            .await
    }

    // ========================================================================
    // Time series
    // ========================================================================

    /// Mean parameter value per available date over the whole bay.
    #[instrument(skip(self), level = "debug")]
    pub async fn parameter_values(&self, query: &AnalysisQuery) -> DashboardResult<Vec<SeriesPoint>> {
        let endpoint = "/get_parameter_values";
        let mut params = vec![("parameter", query.parameter.key().to_string())];
        params.extend(query.range_params());
        let response: ParameterValuesResponse = self
            .send(endpoint, self.get(endpoint, &params), NotFound::Error)
            .await?;
        Ok(parse_series(&response.values))
    }

    /// Parameter values sampled at one point.
    #[instrument(skip(self), level = "debug")]
    pub async fn point_parameter_values(
        &self,
        query: &AnalysisQuery,
        lat: f64,
        lng: f64,
    ) -> DashboardResult<Vec<SeriesPoint>> {
        let endpoint = "/get_point_parameter_values";
        let mut params = vec![
            ("parameter", query.parameter.key().to_string()),
            ("lat", lat.to_string()),
            ("lng", lng.to_string()),
        ];
        params.extend(query.range_params());
        let response: ParameterValuesResponse = self
            .send(endpoint, self.get(endpoint, &params), NotFound::Error)
            .await?;
        Ok(parse_series(&response.values))
    }

    // ========================================================================
    // Weather, features and cages
    // ========================================================================

    #[instrument(skip(self), level = "debug")]
    pub async fn weather(&self, lat: f64, lon: f64) -> DashboardResult<WeatherResponse> {
        let endpoint = "/get_weather";
        let params = [("lat", lat.to_string()), ("lon", lon.to_string())];
        self.send(endpoint, self.get(endpoint, &params), NotFound::Error)
            .await
    }

    /// Lease-area polygons. Malformed features are skipped, not fatal.
    #[instrument(skip(self), level = "debug")]
    pub async fn asset_features(&self) -> DashboardResult<FeatureIngest> {
        let endpoint = "/get_asset_features";
        let payload: Value = self
            .send(endpoint, self.get(endpoint, &[]), NotFound::Error)
            .await?;
        let ingest = ingest_feature_collection(&payload)?;
        info!(
            features = ingest.features.len(),
            skipped = ingest.errors.len(),
            "Fetched lease areas"
        );
        Ok(ingest)
    }

    #[instrument(skip(self), level = "debug")]
    pub async fn cages(&self, scope: &CageScope) -> DashboardResult<CageRecords> {
        let values: Vec<Value> = match scope {
            CageScope::Farms(ids) if !ids.is_empty() => {
                let endpoint = "/api/retrieve-filtered-cages";
                let farm_ids: Vec<Value> = ids.iter().map(|id| farm_id_value(id)).collect();
                let request = self
                    .http
                    .post(self.url(endpoint))
                    .json(&json!({ "farm_ids": farm_ids }));
                self.send(endpoint, self.with_auth(request), NotFound::Error)
                    .await?
            }
            CageScope::All | CageScope::Farms(_) => {
                let endpoint = "/api/retrieve-cages";
                let request = self.with_auth(self.get(endpoint, &[]));
                self.send(endpoint, request, NotFound::Error).await?
            }
            CageScope::Farm(id) => {
                let endpoint = format!("/api/retrieve-cages-by-farm/{}", id);
                let request = self.with_auth(self.get(&endpoint, &[]));
                let response: FarmCagesResponse =
                    self.send(&endpoint, request, NotFound::Error).await?;
                response.cages
            }
        };
        let records = CageRecords::decode(values);
        debug!(
            cages = records.records.len(),
            malformed = records.malformed.len(),
            "Fetched cages"
        );
        Ok(records)
    }
}

/// Farm ids are numeric on the backend; keep anything else as text.
fn farm_id_value(id: &str) -> Value {
    match id.trim().parse::<i64>() {
        Ok(n) => Value::from(n),
        Err(_) => Value::from(id),
    }
}

fn transport_error(endpoint: &str, e: reqwest::Error) -> DashboardError {
    if e.is_timeout() {
        DashboardError::Timeout(endpoint.to_string())
    } else if e.is_decode() {
        malformed(endpoint, e)
    } else {
        DashboardError::Network {
            endpoint: endpoint.to_string(),
            message: e.to_string(),
        }
    }
}
