//! XYZ tile coordinates and tile URL templates.

use serde::{Deserialize, Serialize};
use std::fmt;

use crate::{BoundingBox, DashboardError};

/// A tile coordinate (z/x/y).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct TileCoord {
    /// Zoom level
    pub z: u32,
    /// Column (x)
    pub x: u32,
    /// Row (y)
    pub y: u32,
}

impl TileCoord {
    pub fn new(z: u32, x: u32, y: u32) -> Self {
        Self { z, x, y }
    }

    /// Get the parent tile (zoom - 1).
    pub fn parent(&self) -> Option<TileCoord> {
        if self.z == 0 {
            return None;
        }
        Some(TileCoord {
            z: self.z - 1,
            x: self.x / 2,
            y: self.y / 2,
        })
    }

    /// Whether x and y fall inside the tile grid at this zoom.
    pub fn is_valid(&self) -> bool {
        let n = 1u64 << self.z.min(31);
        (self.x as u64) < n && (self.y as u64) < n
    }
}

impl fmt::Display for TileCoord {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}/{}", self.z, self.x, self.y)
    }
}

/// Convert lon/lat to Web Mercator tile coordinates.
pub fn lonlat_to_tile(lon: f64, lat: f64, zoom: u32) -> TileCoord {
    let n = 2u32.pow(zoom) as f64;
    let max_index = n - 1.0;

    let x = ((lon + 180.0) / 360.0 * n).floor().clamp(0.0, max_index) as u32;
    let lat_rad = lat.to_radians();
    let y = ((1.0 - lat_rad.tan().asinh() / std::f64::consts::PI) / 2.0 * n)
        .floor()
        .clamp(0.0, max_index) as u32;

    TileCoord { z: zoom, x, y }
}

/// Convert Web Mercator tile coordinates to lon/lat bounds.
pub fn tile_to_lonlat_bounds(coord: &TileCoord) -> BoundingBox {
    let n = 2u32.pow(coord.z) as f64;

    let lon_min = coord.x as f64 / n * 360.0 - 180.0;
    let lon_max = (coord.x + 1) as f64 / n * 360.0 - 180.0;

    let lat_max = (std::f64::consts::PI * (1.0 - 2.0 * coord.y as f64 / n))
        .sinh()
        .atan()
        .to_degrees();
    let lat_min = (std::f64::consts::PI * (1.0 - 2.0 * (coord.y + 1) as f64 / n))
        .sinh()
        .atan()
        .to_degrees();

    BoundingBox::new(lon_min, lat_min, lon_max, lat_max)
}

/// A raster tile source URL with `{z}`, `{x}` and `{y}` placeholders.
///
/// The template is otherwise opaque; two templates are the same source only
/// if their strings are identical.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct TileUrlTemplate(String);

impl TileUrlTemplate {
    pub fn parse(template: impl Into<String>) -> Result<Self, DashboardError> {
        let template = template.into();
        let template = template.trim().to_string();
        if template.is_empty() {
            return Err(DashboardError::MalformedData(
                "empty tile url template".to_string(),
            ));
        }
        for placeholder in ["{z}", "{x}", "{y}"] {
            if !template.contains(placeholder) {
                return Err(DashboardError::MalformedData(format!(
                    "tile url template '{}' is missing {}",
                    template, placeholder
                )));
            }
        }
        Ok(Self(template))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// URL of one tile.
    pub fn expand(&self, coord: &TileCoord) -> String {
        self.0
            .replace("{z}", &coord.z.to_string())
            .replace("{x}", &coord.x.to_string())
            .replace("{y}", &coord.y.to_string())
    }
}

impl TryFrom<String> for TileUrlTemplate {
    type Error = DashboardError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::parse(value)
    }
}

impl From<TileUrlTemplate> for String {
    fn from(value: TileUrlTemplate) -> Self {
        value.0
    }
}

impl fmt::Display for TileUrlTemplate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// OpenStreetMap tile source used for the base layer.
pub const OSM_TILE_URL: &str = "https://tile.openstreetmap.org/{z}/{x}/{y}.png";

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_lonlat_to_tile() {
        assert_eq!(lonlat_to_tile(0.0, 0.0, 1), TileCoord::new(1, 1, 1));
        assert_eq!(lonlat_to_tile(-180.0, 85.0, 2), TileCoord::new(2, 0, 0));
        // Far east edge stays on the grid
        assert_eq!(lonlat_to_tile(180.0, 0.0, 2).x, 3);
    }

    #[test]
    fn test_tile_bounds_contain_source_point() {
        let coord = lonlat_to_tile(121.33, 14.078, 12);
        assert!(coord.is_valid());
        assert!(tile_to_lonlat_bounds(&coord).contains_point(121.33, 14.078));
    }

    #[test]
    fn test_template_expand() {
        let template =
            TileUrlTemplate::parse("https://tiles.example.com/maps/abc/tiles/{z}/{x}/{y}").unwrap();
        assert_eq!(
            template.expand(&TileCoord::new(12, 3421, 1873)),
            "https://tiles.example.com/maps/abc/tiles/12/3421/1873"
        );
    }

    #[test]
    fn test_template_rejects_missing_placeholder() {
        assert!(TileUrlTemplate::parse("https://example.com/{z}/{x}.png").is_err());
        assert!(TileUrlTemplate::parse("  ").is_err());
        assert!(serde_json::from_str::<TileUrlTemplate>("\"https://x/{z}/{x}/{y}\"").is_ok());
    }
}
