//! Web Mercator (EPSG:3857) projection and screen-space viewport math.

use serde::{Deserialize, Serialize};

/// Earth radius in meters used by EPSG:3857.
pub const EARTH_RADIUS: f64 = 6378137.0;

/// Half the width of the Web Mercator world in meters.
pub const MAX_EXTENT: f64 = 20037508.342789244;

/// Latitude limit of the square Web Mercator world.
pub const MAX_LATITUDE: f64 = 85.05112878;

/// Ground resolution (meters per pixel) at zoom 0 for 256 px tiles.
pub const RESOLUTION_ZOOM_0: f64 = 156543.03392804097;

/// A geographic position in degrees.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct MapCoordinate {
    pub lon: f64,
    pub lat: f64,
}

impl MapCoordinate {
    pub fn new(lon: f64, lat: f64) -> Self {
        Self { lon, lat }
    }

    /// `[lon, lat]` as used by configuration files.
    pub fn from_array(pair: [f64; 2]) -> Self {
        Self::new(pair[0], pair[1])
    }
}

/// A position in screen pixels, origin at the top-left of the map container.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Pixel {
    pub x: f64,
    pub y: f64,
}

impl Pixel {
    pub fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }

    pub fn distance(&self, other: &Pixel) -> f64 {
        (self.x - other.x).hypot(self.y - other.y)
    }
}

/// Convert longitude to Web Mercator X.
pub fn lon_to_mercator_x(lon: f64) -> f64 {
    lon.to_radians() * EARTH_RADIUS
}

/// Convert latitude to Web Mercator Y, clamping to the projection's limit.
pub fn lat_to_mercator_y(lat: f64) -> f64 {
    let lat_rad = lat.clamp(-MAX_LATITUDE, MAX_LATITUDE).to_radians();
    let y = ((std::f64::consts::PI / 4.0) + (lat_rad / 2.0)).tan().ln();
    y * EARTH_RADIUS
}

/// Convert Web Mercator Y coordinate to latitude.
pub fn mercator_y_to_lat(y: f64) -> f64 {
    let y_normalized = y / EARTH_RADIUS;
    (2.0 * y_normalized.exp().atan() - std::f64::consts::PI / 2.0).to_degrees()
}

pub fn lonlat_to_mercator(coord: MapCoordinate) -> (f64, f64) {
    (lon_to_mercator_x(coord.lon), lat_to_mercator_y(coord.lat))
}

pub fn mercator_to_lonlat(x: f64, y: f64) -> MapCoordinate {
    MapCoordinate::new((x / EARTH_RADIUS).to_degrees(), mercator_y_to_lat(y))
}

/// Meters per pixel at a (possibly fractional) zoom level.
pub fn resolution_at_zoom(zoom: f64) -> f64 {
    RESOLUTION_ZOOM_0 / 2f64.powf(zoom)
}

/// What part of the world the map container currently shows.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Viewport {
    pub center: MapCoordinate,
    pub zoom: f64,
    /// Container size in pixels.
    pub width: u32,
    pub height: u32,
}

impl Viewport {
    pub const MIN_ZOOM: f64 = 0.0;
    pub const MAX_ZOOM: f64 = 28.0;

    pub fn new(center: MapCoordinate, zoom: f64, width: u32, height: u32) -> Self {
        Self {
            center,
            zoom: zoom.clamp(Self::MIN_ZOOM, Self::MAX_ZOOM),
            width,
            height,
        }
    }

    pub fn resolution(&self) -> f64 {
        resolution_at_zoom(self.zoom)
    }

    pub fn pixel_to_coordinate(&self, pixel: Pixel) -> MapCoordinate {
        let (cx, cy) = lonlat_to_mercator(self.center);
        let res = self.resolution();
        let x = cx + (pixel.x - self.width as f64 / 2.0) * res;
        let y = cy - (pixel.y - self.height as f64 / 2.0) * res;
        mercator_to_lonlat(x, y)
    }

    pub fn coordinate_to_pixel(&self, coord: MapCoordinate) -> Pixel {
        let (cx, cy) = lonlat_to_mercator(self.center);
        let (x, y) = lonlat_to_mercator(coord);
        let res = self.resolution();
        Pixel::new(
            (x - cx) / res + self.width as f64 / 2.0,
            (cy - y) / res + self.height as f64 / 2.0,
        )
    }

    /// Visible extent in longitude/latitude degrees.
    pub fn extent(&self) -> crate::BoundingBox {
        let top_left = self.pixel_to_coordinate(Pixel::new(0.0, 0.0));
        let bottom_right =
            self.pixel_to_coordinate(Pixel::new(self.width as f64, self.height as f64));
        crate::BoundingBox::new(top_left.lon, bottom_right.lat, bottom_right.lon, top_left.lat)
    }
}
