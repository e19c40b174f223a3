//! Dashboard controller.
//!
//! Every backend round trip is split in three: `prepare_*` issues a
//! [`Ticket`] and captures the request from current state, the fetch runs
//! against a shared [`BackendClient`] without borrowing the controller, and
//! `apply_*` hands the result back. A result whose ticket is no longer the
//! newest of its kind is dropped, so overlapping requests resolve to the
//! last one issued. The `load_*` methods chain the three for callers that
//! do not overlap requests.

use baysense_client::{
    AnalysisQuery, BackendClient, CageRecords, CageScope, RequestKind, RequestSequencer,
    RgbTileResponse, Ticket, TileResponse, WeatherResponse,
};
use baysense_common::feature::search_features;
use baysense_common::series::ChartRow;
use baysense_common::{
    DashboardError, DashboardResult, FeatureId, FeatureIngest, MapCoordinate, Parameter, Pixel,
    SeriesPoint, SeriesStats,
};
use chrono::NaiveDate;
use map_layers::{
    DashboardMap, DateCaption, ErrorSlot, MapEvent, MapOutput, MapSnapshot, RenderTarget,
    SelectionKey, TileUpdate, VectorKind,
};
use serde::Serialize;
use tracing::{debug, info, warn};

use crate::chart::{ChartSource, ChartState, CsvExport};
use crate::config::{DashboardConfig, WeatherConfig};
use crate::panel::{AnalysisDraft, AnalysisPanel, AppliedQuery, PanelEvent};
use crate::weather::{Advisory, WeatherSummary};

// ============================================================================
// Requests
// ============================================================================

/// One tile round: composite when `date` is `None`, else a single scene.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TileRequest {
    pub query: AnalysisQuery,
    pub date: Option<NaiveDate>,
}

impl TileRequest {
    pub fn caption(&self) -> DateCaption {
        match self.date {
            Some(date) => DateCaption::Single { date },
            None => DateCaption::Composite(self.query.range),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct TileFetch {
    pub request: TileRequest,
    /// `None` when the backend has no imagery for the filters.
    pub parameter: Option<TileResponse>,
    pub true_color: Option<RgbTileResponse>,
}

/// Fetch parameter and true-colour tiles concurrently.
///
/// Missing parameter imagery is not an error. A failed true-colour request
/// only disables that overlay.
pub async fn fetch_tiles(client: &BackendClient, request: TileRequest) -> DashboardResult<TileFetch> {
    let query = &request.query;
    let (parameter, true_color) = match request.date {
        None => {
            futures::join!(client.composite_tile(query), client.composite_rgb_tile(query))
        }
        Some(date) => futures::join!(
            client.specific_date_tile(query.parameter, date, query.cloud_cover),
            client.specific_date_rgb_tile(date, query.cloud_cover)
        ),
    };

    let parameter = match parameter {
        Ok(tiles) => Some(tiles),
        Err(DashboardError::Unavailable(message)) => {
            debug!(message = %message, "No parameter imagery for filters");
            None
        }
        Err(e) => return Err(e),
    };
    let true_color = match true_color {
        Ok(rgb) => Some(rgb),
        Err(e) => {
            warn!(error = %e, "True-color tiles unavailable");
            None
        }
    };
    Ok(TileFetch {
        request,
        parameter,
        true_color,
    })
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ChartRequest {
    pub query: AnalysisQuery,
    pub source: ChartSource,
}

#[derive(Debug, Clone, PartialEq)]
pub struct ChartFetch {
    pub parameter: Parameter,
    pub points: Vec<SeriesPoint>,
}

pub async fn fetch_chart(client: &BackendClient, request: ChartRequest) -> DashboardResult<ChartFetch> {
    let points = match request.source {
        ChartSource::Bay => client.parameter_values(&request.query).await?,
        ChartSource::Point { at } => {
            client
                .point_parameter_values(&request.query, at.lat, at.lon)
                .await?
        }
    };
    Ok(ChartFetch {
        parameter: request.query.parameter,
        points,
    })
}

// ============================================================================
// Snapshot
// ============================================================================

#[derive(Debug, Clone, Serialize)]
pub struct ChartSnapshot {
    pub source: ChartSource,
    pub rows: Vec<ChartRow>,
    pub stats: Option<SeriesStats>,
    pub error: Option<String>,
}

/// Full dashboard state for a renderer or for logging.
#[derive(Debug, Clone, Serialize)]
pub struct DashboardSnapshot {
    pub map: MapSnapshot,
    pub draft: AnalysisDraft,
    pub applied: AppliedQuery,
    pub available_dates: Vec<String>,
    pub chart: ChartSnapshot,
    pub weather: Option<WeatherSummary>,
    pub advisories: Vec<Advisory>,
    pub weather_error: Option<String>,
    pub loading: bool,
}

// ============================================================================
// Controller
// ============================================================================

pub struct DashboardController {
    client: BackendClient,
    map: DashboardMap,
    panel: AnalysisPanel,
    sequencer: RequestSequencer,
    chart: ChartState,
    weather: Option<WeatherSummary>,
    weather_error: Option<String>,
    weather_config: WeatherConfig,
    weather_at: MapCoordinate,
    cage_scope: CageScope,
}

impl DashboardController {
    /// Build the controller and mount the map.
    pub fn new(config: &DashboardConfig, today: NaiveDate) -> DashboardResult<Self> {
        let client = BackendClient::new(config.client_config())?;
        let panel = AnalysisPanel::new(config.initial_query(today)?, config.analysis.mode);

        let mut map = DashboardMap::new(config.map_options());
        map.mount(RenderTarget::new("map", config.map.width, config.map.height));

        Ok(Self {
            client,
            map,
            panel,
            sequencer: RequestSequencer::new(),
            chart: ChartState::default(),
            weather: None,
            weather_error: None,
            weather_config: config.weather.clone(),
            weather_at: MapCoordinate::from_array(config.map.center),
            cage_scope: CageScope::All,
        })
    }

    pub fn client(&self) -> &BackendClient {
        &self.client
    }

    pub fn map(&self) -> &DashboardMap {
        &self.map
    }

    pub fn map_mut(&mut self) -> &mut DashboardMap {
        &mut self.map
    }

    pub fn panel(&self) -> &AnalysisPanel {
        &self.panel
    }

    pub fn chart(&self) -> &ChartState {
        &self.chart
    }

    pub fn weather(&self) -> Option<&WeatherSummary> {
        self.weather.as_ref()
    }

    pub fn weather_error(&self) -> Option<&str> {
        self.weather_error.as_deref()
    }

    pub fn advisories(&self) -> Vec<Advisory> {
        self.weather
            .as_ref()
            .map(|w| w.advisories(&self.weather_config))
            .unwrap_or_default()
    }

    pub fn is_loading(&self, kind: RequestKind) -> bool {
        self.sequencer.is_loading(kind)
    }

    /// Edit the analysis draft.
    pub fn edit(&mut self, event: PanelEvent) -> DashboardResult<()> {
        self.panel.reduce(event)
    }

    pub fn set_cage_scope(&mut self, scope: CageScope) {
        self.cage_scope = scope;
    }

    // ========================================================================
    // Analysis
    // ========================================================================

    /// Commit the draft, then refresh dates, tiles and chart in order.
    ///
    /// Only an invalid draft is returned as an error; request failures end
    /// up in the widgets' error state.
    pub async fn run_analysis(&mut self) -> DashboardResult<()> {
        self.panel.run()?;
        self.load_dates().await;
        self.load_tiles().await;
        self.load_chart().await;
        Ok(())
    }

    pub fn prepare_dates(&mut self) -> (Ticket, AnalysisQuery) {
        (
            self.sequencer.issue(RequestKind::AvailableDates),
            self.panel.applied().query,
        )
    }

    pub fn apply_dates(&mut self, ticket: Ticket, result: DashboardResult<Vec<String>>) -> bool {
        if !self.sequencer.complete(ticket) {
            return false;
        }
        match result {
            Ok(dates) => {
                info!(count = dates.len(), "Available dates loaded");
                self.panel.set_available_dates(dates);
                self.map.clear_error(ErrorSlot::Dates);
            }
            Err(e) => {
                warn!(error = %e, "Failed to load available dates");
                self.panel.set_available_dates(Vec::new());
                self.map.set_error(ErrorSlot::Dates, e.user_message());
            }
        }
        true
    }

    pub async fn load_dates(&mut self) -> bool {
        let (ticket, query) = self.prepare_dates();
        let result = self.client.available_dates(&query).await;
        self.apply_dates(ticket, result)
    }

    /// Issue a tile ticket. The request fails up front in single mode when
    /// no imagery date is available.
    pub fn prepare_tiles(&mut self) -> (Ticket, DashboardResult<TileRequest>) {
        let ticket = self.sequencer.issue(RequestKind::Tiles);
        let request = self.panel.resolve_overlay_date().map(|date| TileRequest {
            query: self.panel.applied().query,
            date,
        });
        (ticket, request)
    }

    pub fn apply_tiles(&mut self, ticket: Ticket, result: DashboardResult<TileFetch>) -> bool {
        if !self.sequencer.complete(ticket) {
            return false;
        }
        match result.and_then(tile_update) {
            Ok(update) => {
                if update.parameter_url.is_none() {
                    info!("No parameter imagery for the current filters");
                }
                self.map.apply_tiles(update);
            }
            Err(DashboardError::Unavailable(message)) => {
                info!(message = %message, "No imagery to show");
                self.map.clear_tiles();
                self.map.clear_error(ErrorSlot::Tiles);
            }
            Err(e) => {
                warn!(error = %e, "Tile request failed");
                self.map.clear_tiles();
                self.map.set_error(ErrorSlot::Tiles, e.user_message());
            }
        }
        true
    }

    pub async fn load_tiles(&mut self) -> bool {
        let (ticket, request) = self.prepare_tiles();
        let result = match request {
            Ok(request) => fetch_tiles(&self.client, request).await,
            Err(e) => Err(e),
        };
        self.apply_tiles(ticket, result)
    }

    // ========================================================================
    // Features and cages
    // ========================================================================

    pub fn prepare_features(&mut self) -> Ticket {
        self.sequencer.issue(RequestKind::Features)
    }

    pub fn apply_features(&mut self, ticket: Ticket, result: DashboardResult<FeatureIngest>) -> bool {
        if !self.sequencer.complete(ticket) {
            return false;
        }
        match result {
            Ok(ingest) => {
                self.map.set_features(ingest);
                self.sync_chart_source();
            }
            Err(e) => {
                warn!(error = %e, "Failed to load lease areas");
                self.map.set_error(ErrorSlot::Features, e.user_message());
            }
        }
        true
    }

    pub async fn load_features(&mut self) -> bool {
        let ticket = self.prepare_features();
        let result = self.client.asset_features().await;
        self.apply_features(ticket, result)
    }

    pub fn prepare_cages(&mut self) -> (Ticket, CageScope) {
        (
            self.sequencer.issue(RequestKind::Cages),
            self.cage_scope.clone(),
        )
    }

    pub fn apply_cages(&mut self, ticket: Ticket, result: DashboardResult<CageRecords>) -> bool {
        if !self.sequencer.complete(ticket) {
            return false;
        }
        match result {
            Ok(records) => {
                self.map.set_cages(records.into_ingest());
                self.sync_chart_source();
            }
            Err(e) => {
                warn!(error = %e, "Failed to load cages");
                self.map.set_error(ErrorSlot::Cages, e.user_message());
            }
        }
        true
    }

    pub async fn load_cages(&mut self) -> bool {
        let (ticket, scope) = self.prepare_cages();
        let result = self.client.cages(&scope).await;
        self.apply_cages(ticket, result)
    }

    // ========================================================================
    // Chart and weather
    // ========================================================================

    pub fn prepare_chart(&mut self) -> (Ticket, ChartRequest) {
        let request = ChartRequest {
            query: self.panel.applied().query,
            source: self.chart.source(),
        };
        (self.sequencer.issue(RequestKind::Chart), request)
    }

    pub fn apply_chart(&mut self, ticket: Ticket, result: DashboardResult<ChartFetch>) -> bool {
        if !self.sequencer.complete(ticket) {
            return false;
        }
        match result {
            Ok(fetch) => {
                debug!(points = fetch.points.len(), "Chart series loaded");
                self.chart.set_series(fetch.parameter, fetch.points);
            }
            Err(e) => {
                warn!(error = %e, "Failed to load chart series");
                self.chart.set_error(e.user_message());
            }
        }
        true
    }

    pub async fn load_chart(&mut self) -> bool {
        let (ticket, request) = self.prepare_chart();
        let result = fetch_chart(&self.client, request).await;
        self.apply_chart(ticket, result)
    }

    pub fn prepare_weather(&mut self) -> (Ticket, MapCoordinate) {
        (self.sequencer.issue(RequestKind::Weather), self.weather_at)
    }

    pub fn apply_weather(&mut self, ticket: Ticket, result: DashboardResult<WeatherResponse>) -> bool {
        if !self.sequencer.complete(ticket) {
            return false;
        }
        match result {
            Ok(response) => match WeatherSummary::from_forecast(&response) {
                Some(summary) => {
                    for advisory in summary.advisories(&self.weather_config) {
                        info!(advisory = %advisory.message(), "Weather advisory");
                    }
                    self.weather = Some(summary);
                    self.weather_error = None;
                }
                None => {
                    self.weather = None;
                    self.weather_error = Some(
                        DashboardError::MalformedData(String::new())
                            .user_message()
                            .to_string(),
                    );
                }
            },
            Err(e) => {
                warn!(error = %e, "Failed to load weather");
                self.weather = None;
                self.weather_error = Some(e.user_message().to_string());
            }
        }
        true
    }

    pub async fn load_weather(&mut self) -> bool {
        let (ticket, at) = self.prepare_weather();
        let result = self.client.weather(at.lat, at.lon).await;
        self.apply_weather(ticket, result)
    }

    /// Chart CSV download, if the chart has data.
    pub fn export_csv(&self) -> Option<CsvExport> {
        self.chart.export()
    }

    // ========================================================================
    // Map interaction
    // ========================================================================

    /// Route a pointer event through the map. Selection changes retarget
    /// the chart but do not reload it.
    pub fn dispatch(&mut self, event: MapEvent) -> MapOutput {
        let output = self.map.dispatch(event);
        if output.selection.is_some() {
            self.sync_chart_source();
        }
        output
    }

    /// Click at `pixel` and reload the chart if the selection moved it.
    pub async fn select_at_pixel(&mut self, pixel: Pixel) -> MapOutput {
        let output = self.map.dispatch(MapEvent::Click(pixel));
        if output.selection.is_some() && self.sync_chart_source() {
            self.load_chart().await;
        }
        output
    }

    /// Lease areas matching a search term, by id and name.
    pub fn search_leases(&self, term: &str) -> Vec<(FeatureId, String)> {
        search_features(self.map.leases().features(), term)
            .into_iter()
            .map(|f| (f.id.clone(), f.name().to_string()))
            .collect()
    }

    /// Center on a feature and select it, as picking a search result does.
    pub async fn focus_feature(&mut self, kind: VectorKind, id: FeatureId) -> bool {
        if !self.map.center_on_feature(kind, &id) {
            return false;
        }
        self.map.select(Some(SelectionKey::new(kind, id)));
        if self.sync_chart_source() {
            self.load_chart().await;
        }
        true
    }

    /// Point the chart at the selected feature, or the whole bay.
    fn sync_chart_source(&mut self) -> bool {
        let at = self.map.selection().and_then(|key| {
            let overlay = match key.overlay {
                VectorKind::Leases => self.map.leases(),
                VectorKind::Cages => self.map.cages(),
            };
            overlay.feature(&key.id).and_then(|f| f.geometry.midpoint())
        });
        let source = match at {
            Some((lon, lat)) => ChartSource::Point {
                at: MapCoordinate::new(lon, lat),
            },
            None => ChartSource::Bay,
        };
        self.chart.set_source(source)
    }

    pub fn snapshot(&self) -> DashboardSnapshot {
        DashboardSnapshot {
            map: self.map.snapshot(),
            draft: self.panel.draft().clone(),
            applied: *self.panel.applied(),
            available_dates: self.panel.available_dates().to_vec(),
            chart: ChartSnapshot {
                source: self.chart.source(),
                rows: self.chart.rows(),
                stats: self.chart.stats(),
                error: self.chart.error().map(str::to_string),
            },
            weather: self.weather.clone(),
            advisories: self.advisories(),
            weather_error: self.weather_error.clone(),
            loading: self.sequencer.any_loading(),
        }
    }
}

/// Validate tile templates and build the map update.
fn tile_update(fetch: TileFetch) -> DashboardResult<TileUpdate> {
    let caption = fetch.request.caption();
    let parameter = fetch.parameter.unwrap_or_default();
    let parameter_url = parameter.template()?;
    let true_color_url = match fetch.true_color.map(|rgb| rgb.template()).transpose() {
        Ok(url) => url.flatten(),
        Err(e) => {
            warn!(error = %e, "Ignoring malformed true-color tile URL");
            None
        }
    };
    Ok(TileUpdate {
        parameter: fetch.request.query.parameter,
        parameter_url,
        legend_min: parameter.legend_min,
        legend_max: parameter.legend_max,
        true_color_url,
        caption: Some(caption),
    })
}
