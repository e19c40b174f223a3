//! Client for the BAYSENSE backend.
//!
//! [`BackendClient`] wraps every REST endpoint the dashboard consumes and
//! maps failures onto [`baysense_common::DashboardError`]. The
//! [`RequestSequencer`] lets callers discard responses that were superseded
//! by a newer request of the same kind.

pub mod client;
pub mod sequencer;
pub mod types;

pub use client::{BackendClient, ClientConfig};
pub use sequencer::{RequestKind, RequestSequencer, Ticket};
pub use types::{
    AnalysisQuery, CageRecords, CageScope, ForecastEntry, RgbTileResponse, TileResponse,
    WeatherResponse,
};
