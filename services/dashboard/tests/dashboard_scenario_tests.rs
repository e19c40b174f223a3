//! End-to-end dashboard scenarios against an in-process stub backend.

use std::collections::HashMap;
use std::io::Write;

use axum::extract::Query;
use axum::http::{HeaderMap, StatusCode};
use axum::routing::get;
use axum::{Json, Router};
use baysense_client::RequestKind;
use baysense_common::{FeatureId, Pixel};
use chrono::NaiveDate;
use dashboard::{
    fetch_tiles, Advisory, ChartSource, DashboardConfig, DashboardController, ImageMode,
    PanelEvent, TileRequest,
};
use map_layers::{ControlId, ErrorSlot, RasterKind, SelectionChange, VectorKind};
use serde_json::{json, Value};
use test_utils::{fixtures, StubBackend};
use tokio_test::{assert_err, assert_ok};

// ============================================================================
// Helpers
// ============================================================================

type Params = Query<HashMap<String, String>>;
type Reply = (StatusCode, Json<Value>);

const TOKEN: &str = "token-abc";

fn date(y: i32, m: u32, d: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(y, m, d).unwrap()
}

fn ok(value: Value) -> Reply {
    (StatusCode::OK, Json(value))
}

fn error(status: StatusCode, message: &str) -> Reply {
    (status, Json(json!({ "error": message })))
}

fn config(base_url: &str, token: Option<&str>) -> DashboardConfig {
    let mut config = DashboardConfig::default();
    config.api.base_url = base_url.to_string();
    config.api.timeout_secs = 5;
    config.api.auth_token = token.map(str::to_string);
    config.analysis.end_date = Some(date(2025, 3, 31));
    config
}

fn controller(stub: &StubBackend, token: Option<&str>) -> DashboardController {
    DashboardController::new(&config(stub.base_url(), token), date(2025, 3, 31)).unwrap()
}

/// Stub behaviour switches; the default backend answers everything.
#[derive(Debug, Clone, Copy, Default)]
struct Backend {
    no_dates: bool,
    broken_dates: bool,
    broken_tiles: bool,
    broken_weather: bool,
}

fn backend_router(backend: Backend) -> Router {
    Router::new()
        .route(
            "/get_available_dates",
            get(move || async move {
                if backend.broken_dates {
                    return error(StatusCode::SERVICE_UNAVAILABLE, "Earth Engine unavailable");
                }
                if backend.no_dates {
                    return ok(json!({"available_dates": []}));
                }
                ok(serde_json::from_str(fixtures::AVAILABLE_DATES_RESPONSE).unwrap())
            }),
        )
        .route(
            "/get_composite_tile",
            get(move || async move {
                if backend.broken_tiles {
                    return error(StatusCode::INTERNAL_SERVER_ERROR, "Failed to generate tiles");
                }
                ok(fixtures::tile_response(fixtures::COMPOSITE_TILE_URL, 0.5, 24.5))
            }),
        )
        .route(
            "/get_composite_rgb_tile_for_polygons",
            get(|| async { ok(fixtures::rgb_tile_response(fixtures::COMPOSITE_RGB_TILE_URL)) }),
        )
        .route(
            "/get_specific_date_tile",
            get(|Query(q): Params| async move {
                match q.get("date").map(String::as_str) {
                    Some("2024-02-20") => {
                        ok(fixtures::tile_response(fixtures::SINGLE_TILE_URL, 1.0, 3.0))
                    }
                    _ => error(StatusCode::NOT_FOUND, "No imagery available for the specified date"),
                }
            }),
        )
        .route(
            "/get_specific_date_rgb_tile_for_polygons",
            get(|| async { ok(fixtures::rgb_tile_response(fixtures::SINGLE_RGB_TILE_URL)) }),
        )
        .route(
            "/get_parameter_values",
            get(|| async { ok(fixtures::parameter_values()) }),
        )
        .route(
            "/get_point_parameter_values",
            get(|Query(q): Params| async move {
                if !(q.contains_key("lat") && q.contains_key("lng")) {
                    return error(
                        StatusCode::BAD_REQUEST,
                        "Latitude and longitude parameters are required",
                    );
                }
                ok(json!({"values": [
                    {"date": "2024-01-05", "value": 0.8},
                    {"date": "2024-02-10", "value": 1.1}
                ]}))
            }),
        )
        .route(
            "/get_weather",
            get(move || async move {
                if backend.broken_weather {
                    return error(
                        StatusCode::INTERNAL_SERVER_ERROR,
                        "Missing OpenWeatherMap API key",
                    );
                }
                ok(fixtures::weather())
            }),
        )
        .route(
            "/get_asset_features",
            get(|| async { ok(fixtures::lease_collection()) }),
        )
        .route(
            "/api/retrieve-cages",
            get(|headers: HeaderMap| async move {
                if headers.get("authorization").and_then(|v| v.to_str().ok()) != Some(TOKEN) {
                    return error(StatusCode::UNAUTHORIZED, "Not authenticated.");
                }
                ok(fixtures::cages())
            }),
        )
}

async fn start(backend: Backend) -> StubBackend {
    StubBackend::start(backend_router(backend)).await
}

fn parameter_source(controller: &DashboardController) -> Option<String> {
    controller
        .map()
        .layer_stack()
        .into_iter()
        .find(|l| l.z_index == RasterKind::Parameter.z_index())
        .and_then(|l| l.source)
}

fn map_center(controller: &DashboardController) -> Pixel {
    let viewport = controller.map().surface().unwrap().viewport();
    viewport.coordinate_to_pixel(viewport.center)
}

// ============================================================================
// Analysis
// ============================================================================

#[tokio::test]
async fn test_composite_analysis() {
    let stub = start(Backend::default()).await;
    let mut controller = controller(&stub, None);

    assert_ok!(controller.run_analysis().await);

    assert_eq!(controller.panel().available_dates().len(), 3);
    assert_eq!(
        parameter_source(&controller).as_deref(),
        Some(fixtures::COMPOSITE_TILE_URL)
    );
    assert!(controller.map().raster(RasterKind::TrueColor).layer_id().is_some());

    let legend = controller.map().legend();
    assert_eq!(
        legend.spec().ticks,
        vec!["0.50", "6.50", "12.50", "18.50", "24.50"]
    );
    assert_eq!(
        legend.caption().map(|c| c.text()).as_deref(),
        Some("Composite: 2025-01-01 to 2025-03-31")
    );
    assert!(controller.map().error_banner().is_none());

    assert_eq!(controller.chart().source(), ChartSource::Bay);
    let export = controller.export_csv().unwrap();
    assert_eq!(export.file_name, "Chlorophyll-a_data.csv");
    assert_eq!(
        export.content,
        "Date,Value\n2024-01-05,1.2\n2024-02-10,3.5\n2024-02-20,2.25"
    );
    assert!(!controller.is_loading(RequestKind::Tiles));
}

#[tokio::test]
async fn test_switching_to_single_uses_latest_date() {
    let stub = start(Backend::default()).await;
    let mut controller = controller(&stub, None);
    controller.run_analysis().await.unwrap();

    controller
        .edit(PanelEvent::ModeChanged(ImageMode::Single))
        .unwrap();
    assert_eq!(controller.panel().draft().overlay_date, Some(date(2024, 2, 20)));
    // Nothing changes on the map until the draft is run.
    assert_eq!(
        parameter_source(&controller).as_deref(),
        Some(fixtures::COMPOSITE_TILE_URL)
    );

    controller.run_analysis().await.unwrap();
    assert_eq!(
        parameter_source(&controller).as_deref(),
        Some(fixtures::SINGLE_TILE_URL)
    );
    let legend = controller.map().legend();
    assert_eq!(
        legend.spec().ticks,
        vec!["1.00", "1.50", "2.00", "2.50", "3.00"]
    );
    assert_eq!(
        legend.caption().map(|c| c.text()).as_deref(),
        Some("Date: 2024-02-20")
    );
}

#[tokio::test]
async fn test_single_mode_without_imagery() {
    let stub = start(Backend {
        no_dates: true,
        ..Default::default()
    })
    .await;
    let mut controller = controller(&stub, None);

    controller
        .edit(PanelEvent::ModeChanged(ImageMode::Single))
        .unwrap();
    controller.run_analysis().await.unwrap();

    assert!(parameter_source(&controller).is_none());
    assert!(controller.map().legend().spec().no_data);
    assert!(!controller.map().controls().toggle(ControlId::WaterQuality).enabled);
    // Missing imagery is a state, not a failure.
    assert_eq!(controller.map().error_banner(), None);
}

#[tokio::test]
async fn test_dates_failure_stays_visible() {
    let stub = start(Backend {
        broken_dates: true,
        ..Default::default()
    })
    .await;
    let mut controller = controller(&stub, None);

    controller.run_analysis().await.unwrap();

    // Composite tiles still load without dates.
    assert_eq!(
        parameter_source(&controller).as_deref(),
        Some(fixtures::COMPOSITE_TILE_URL)
    );
    assert!(controller.panel().available_dates().is_empty());
    assert_eq!(controller.map().error(ErrorSlot::Tiles), None);
    assert_eq!(
        controller.map().error(ErrorSlot::Dates),
        Some("The server failed to process the request.")
    );
    assert_eq!(
        controller.map().error_banner(),
        Some("The server failed to process the request.")
    );
}

#[tokio::test]
async fn test_invalid_draft_is_rejected() {
    let stub = start(Backend::default()).await;
    let mut controller = controller(&stub, None);
    controller
        .edit(PanelEvent::EndDateChanged(date(2024, 12, 1)))
        .unwrap();
    assert_err!(controller.run_analysis().await);
    assert!(controller.panel().available_dates().is_empty());
}

#[tokio::test]
async fn test_overlapping_tile_requests_last_wins() {
    let stub = start(Backend::default()).await;
    let mut controller = controller(&stub, None);

    let (first, composite) = controller.prepare_tiles();
    let composite = composite.unwrap();
    let (second, _) = controller.prepare_tiles();
    let single = TileRequest {
        date: Some(date(2024, 2, 20)),
        ..composite
    };
    assert!(controller.is_loading(RequestKind::Tiles));

    let (old, new) = futures::join!(
        fetch_tiles(controller.client(), composite),
        fetch_tiles(controller.client(), single)
    );
    assert!(controller.apply_tiles(second, new));
    assert!(!controller.apply_tiles(first, old));

    assert_eq!(
        parameter_source(&controller).as_deref(),
        Some(fixtures::SINGLE_TILE_URL)
    );
    assert!(!controller.is_loading(RequestKind::Tiles));
}

// ============================================================================
// Features, selection and chart
// ============================================================================

#[tokio::test]
async fn test_features_and_selection_drive_chart() {
    let stub = start(Backend::default()).await;
    let mut controller = controller(&stub, None);
    controller.run_analysis().await.unwrap();

    assert!(controller.load_features().await);
    assert_eq!(controller.map().leases().features().len(), 3);
    assert_eq!(
        controller.map().error(ErrorSlot::Features),
        Some("2 lease areas could not be displayed.")
    );

    let found = controller.search_leases("caloocan");
    assert_eq!(
        found,
        vec![(
            FeatureId::new("FLA-003"),
            "Caloocan Fishcage Zone".to_string()
        )]
    );

    assert!(
        controller
            .focus_feature(VectorKind::Leases, FeatureId::new("FLA-003"))
            .await
    );
    assert!(matches!(
        controller.chart().source(),
        ChartSource::Point { .. }
    ));
    assert_eq!(controller.chart().points().len(), 2);

    // The view is centred on the lease, so clicking the middle toggles it off.
    let output = controller.select_at_pixel(map_center(&controller)).await;
    assert!(matches!(
        output.selection,
        Some(SelectionChange::Deselected(_))
    ));
    assert_eq!(controller.chart().source(), ChartSource::Bay);
    assert_eq!(controller.chart().points().len(), 3);
}

#[tokio::test]
async fn test_cages_need_token() {
    let stub = start(Backend::default()).await;

    let mut anonymous = controller(&stub, None);
    assert!(anonymous.load_cages().await);
    assert!(anonymous.map().cages().features().is_empty());
    assert_eq!(
        anonymous.map().error(ErrorSlot::Cages),
        Some("The request was rejected.")
    );

    let mut authorized = controller(&stub, Some(TOKEN));
    authorized.load_cages().await;
    assert_eq!(authorized.map().cages().features().len(), 3);
    assert_eq!(authorized.map().error(ErrorSlot::Cages), None);
}

// ============================================================================
// Weather and failures
// ============================================================================

#[tokio::test]
async fn test_weather_summary_and_advisory() {
    let stub = start(Backend::default()).await;
    let mut controller = controller(&stub, None);

    assert!(controller.load_weather().await);
    let weather = controller.weather().unwrap();
    assert_eq!(weather.location.as_deref(), Some("Talisay"));
    assert_eq!(weather.max_gust, Some(16.0));
    assert_eq!(
        controller.advisories(),
        vec![Advisory::StrongGust { gust: 16.0 }]
    );
}

#[tokio::test]
async fn test_failures_stay_in_their_widget() {
    let stub = start(Backend {
        broken_tiles: true,
        broken_weather: true,
        ..Default::default()
    })
    .await;
    let mut controller = controller(&stub, None);

    controller.run_analysis().await.unwrap();
    controller.load_weather().await;

    assert!(parameter_source(&controller).is_none());
    assert!(controller.map().raster(RasterKind::TrueColor).layer_id().is_none());
    assert_eq!(
        controller.map().error_banner(),
        Some("The server failed to process the request.")
    );
    // The chart is unaffected by the tile failure.
    assert_eq!(controller.chart().points().len(), 3);
    assert_eq!(
        controller.weather_error(),
        Some("The server failed to process the request.")
    );

    let snapshot = serde_json::to_value(controller.snapshot()).unwrap();
    assert_eq!(snapshot["loading"], json!(false));
    assert_eq!(snapshot["chart"]["rows"].as_array().map(Vec::len), Some(3));
}

// ============================================================================
// Configuration
// ============================================================================

#[test]
fn test_config_file_roundtrip() {
    let mut file = tempfile::NamedTempFile::new().unwrap();
    writeln!(
        file,
        "api:\n  base_url: http://backend:5000\nanalysis:\n  parameter: tss\n  cloud_cover: 30\n  start_date: 2024-06-01\n  end_date: 2024-09-30\nweather:\n  gust_warning: 13.0"
    )
    .unwrap();

    let config = DashboardConfig::load(file.path()).unwrap();
    assert_eq!(config.api.base_url, "http://backend:5000");
    assert_eq!(config.weather.gust_warning, 13.0);
    let query = config.initial_query(date(2025, 1, 1)).unwrap();
    assert_eq!(query.range.end, date(2024, 9, 30));
    assert_eq!(query.cloud_cover.percent(), 30);
}

#[test]
fn test_missing_config_file() {
    let dir = tempfile::tempdir().unwrap();
    let err = DashboardConfig::load(&dir.path().join("absent.yaml")).unwrap_err();
    assert!(err.to_string().contains("Failed to read config file"));
}
