//! BAYSENSE dashboard: the analysis panel, chart and weather widgets and
//! the controller that drives them and the map against the backend.

pub mod chart;
pub mod config;
pub mod controller;
pub mod panel;
pub mod weather;

pub use chart::{ChartSource, ChartState, CsvExport};
pub use config::DashboardConfig;
pub use controller::{
    fetch_chart, fetch_tiles, ChartFetch, ChartRequest, DashboardController, DashboardSnapshot,
    TileFetch, TileRequest,
};
pub use panel::{AnalysisDraft, AnalysisPanel, AppliedQuery, ImageMode, PanelEvent};
pub use weather::{Advisory, WeatherSummary};
