//! Layers drawn on the map surface and their fixed z-order.

use serde::Serialize;
use std::fmt;

/// z-index of the OpenStreetMap base layer.
pub const Z_BASE: i32 = 0;
/// z-index of the true-colour composite.
pub const Z_TRUE_COLOR: i32 = 1;
/// z-index of the lease-area polygons.
pub const Z_LEASES: i32 = 2;
/// z-index of the water-quality parameter raster.
pub const Z_PARAMETER: i32 = 3;
/// z-index of the cage pins.
pub const Z_CAGES: i32 = 4;

/// The two raster overlays the dashboard can show.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum RasterKind {
    /// Water-quality heat map.
    Parameter,
    /// True-colour (RGB) composite.
    TrueColor,
}

impl RasterKind {
    pub fn z_index(&self) -> i32 {
        match self {
            RasterKind::Parameter => Z_PARAMETER,
            RasterKind::TrueColor => Z_TRUE_COLOR,
        }
    }

    pub fn name(&self) -> &'static str {
        match self {
            RasterKind::Parameter => "parameter",
            RasterKind::TrueColor => "true-color",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum VectorKind {
    Leases,
    Cages,
}

impl VectorKind {
    pub fn z_index(&self) -> i32 {
        match self {
            VectorKind::Leases => Z_LEASES,
            VectorKind::Cages => Z_CAGES,
        }
    }

    pub fn name(&self) -> &'static str {
        match self {
            VectorKind::Leases => "leases",
            VectorKind::Cages => "cages",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(tag = "type", content = "kind", rename_all = "snake_case")]
pub enum LayerKind {
    Base,
    Raster(RasterKind),
    Vector(VectorKind),
}

/// Identity of one layer instance. A replaced layer gets a new id.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
pub struct LayerId(String);

impl LayerId {
    pub(crate) fn new(name: &str, seq: u64) -> Self {
        Self(format!("{}-{}", name, seq))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for LayerId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// A named, orderable, toggle-able unit drawn on the surface.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Layer {
    pub id: LayerId,
    pub kind: LayerKind,
    /// Tile URL template for tiled layers.
    pub source: Option<String>,
    pub visible: bool,
    pub z_index: i32,
}

impl Layer {
    pub fn kind_name(&self) -> &'static str {
        match self.kind {
            LayerKind::Base => "base",
            LayerKind::Raster(kind) => kind.name(),
            LayerKind::Vector(kind) => kind.name(),
        }
    }
}
