//! Common types and utilities shared across the BAYSENSE dashboard crates.

pub mod bbox;
pub mod dates;
pub mod error;
pub mod feature;
pub mod legend;
pub mod parameter;
pub mod projection;
pub mod series;
pub mod style;
pub mod tile;
pub mod time;

pub use bbox::BoundingBox;
pub use dates::{DateBuckets, DateEvent, DateNavigator};
pub use error::{DashboardError, DashboardResult, ErrorKind};
pub use feature::{
    CageRecord, CageStatus, Feature, FeatureGeometry, FeatureId, FeatureIngest, FeatureKind,
    FeatureProperties, LeaseStatus,
};
pub use legend::{legend, legend_for, LegendGradient, LegendSpec};
pub use parameter::Parameter;
pub use projection::{MapCoordinate, Pixel, Viewport};
pub use series::{SeriesPoint, SeriesStats};
pub use style::{FeatureStyle, InteractionState, Rgba};
pub use tile::{TileCoord, TileUrlTemplate};
pub use time::{CloudCover, DateRange};
