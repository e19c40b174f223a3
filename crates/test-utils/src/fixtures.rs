//! Common test fixtures for dashboard tests.
//!
//! Payloads mirror what the backend returns so that parsing, layer and
//! controller tests all see the same data.

use serde_json::Value;

/// Map defaults used throughout the tests.
pub mod map {
    /// Default map center (lon, lat) over the bay.
    pub const CENTER: (f64, f64) = (121.3301436972315, 14.078182532529903);

    /// Default zoom level.
    pub const ZOOM: f64 = 16.7;

    /// Container size used by layer tests.
    pub const WIDTH: u32 = 800;
    pub const HEIGHT: u32 = 600;
}

/// Lease-area FeatureCollection with three valid polygons (valid, for
/// renewal, expired), one polygon whose ring is too short and one feature
/// without geometry.
pub const LEASE_COLLECTION: &str = r#"{
  "type": "FeatureCollection",
  "features": [
    {
      "type": "Feature",
      "geometry": {
        "type": "Polygon",
        "coordinates": [[[121.3290, 14.0775], [121.3300, 14.0775], [121.3300, 14.0785], [121.3290, 14.0785], [121.3290, 14.0775]]]
      },
      "properties": {
        "FLA Number": "FLA-001",
        "Name": "Sampaloc Fishpen A",
        "Status": "Valid",
        "Area": 1.5,
        "Date Apprv": "2020-03-15",
        "Date Exp": "2030-03-15",
        "Barangay": "Sampaloc",
        "Mun_Name": "Talisay",
        "Province": "Batangas"
      }
    },
    {
      "type": "Feature",
      "geometry": {
        "type": "Polygon",
        "coordinates": [[[121.3303, 14.0775], [121.3313, 14.0775], [121.3313, 14.0785], [121.3303, 14.0785], [121.3303, 14.0775]]]
      },
      "properties": {
        "FLA Number": "FLA-002",
        "Name": "Banga Fishpen B",
        "Status": "For Renewal",
        "Area": "2.25",
        "Date Apprv": "2018-07-01",
        "Date Exp": "2024-07-01",
        "Barangay": "Banga",
        "Mun_Name": "Talisay",
        "Province": "Batangas"
      }
    },
    {
      "type": "Feature",
      "geometry": {
        "type": "Polygon",
        "coordinates": [[[121.3290, 14.0760], [121.3313, 14.0760], [121.3313, 14.0770], [121.3290, 14.0770], [121.3290, 14.0760]]]
      },
      "properties": {
        "FLA Number": "FLA-003",
        "Name": "Caloocan Fishcage Zone",
        "Status": "EXPIRED",
        "Area": 4,
        "Date Apprv": "2010-01-10",
        "Date Exp": "2020-01-10",
        "Barangay": "Caloocan",
        "Mun_Name": "Tanauan",
        "Province": "Batangas"
      }
    },
    {
      "type": "Feature",
      "geometry": {
        "type": "Polygon",
        "coordinates": [[[121.3320, 14.0790], [121.3321, 14.0791]]]
      },
      "properties": {
        "FLA Number": "FLA-004",
        "Name": "Broken Ring"
      }
    },
    {
      "type": "Feature",
      "geometry": null,
      "properties": {
        "FLA Number": "FLA-005",
        "Name": "No Geometry"
      }
    }
  ]
}"#;

/// Number of usable features in [`LEASE_COLLECTION`].
pub const LEASE_COLLECTION_VALID: usize = 3;

/// Indices of the features in [`LEASE_COLLECTION`] that must be skipped.
pub const LEASE_COLLECTION_MALFORMED: [usize; 2] = [3, 4];

pub fn lease_collection() -> Value {
    parse(LEASE_COLLECTION)
}

/// Dates from the date-bucket examples.
pub const DATES: [&str; 3] = ["2024-01-05", "2024-02-10", "2024-02-20"];

pub fn dates() -> Vec<String> {
    DATES.iter().map(|d| d.to_string()).collect()
}

/// Unordered list with a duplicate, a timestamp and a garbage entry.
pub fn messy_dates() -> Vec<String> {
    [
        "2024-02-20",
        "2024-01-05",
        "garbage",
        "2024-02-10T02:30:00Z",
        "2024-01-05",
    ]
    .iter()
    .map(|d| d.to_string())
    .collect()
}

pub const AVAILABLE_DATES_RESPONSE: &str =
    r#"{"available_dates": ["2024-02-20", "2024-01-05", "2024-02-10"]}"#;

/// Three cages: two inside lease A, one inside lease B.
pub const CAGES: &str = r#"[
  {"cage_id": 1, "cage_name": "Cage Alpha", "lat": 14.0778, "lon": 121.3293, "status": "good", "fish_farmed": "Tilapia", "farm_id": 10},
  {"cage_id": 2, "cage_name": "Cage Beta", "lat": 14.0782, "lon": 121.3297, "status": "at risk", "fish_farmed": "Ayungin", "farm_id": 10},
  {"cage_id": "c-3", "cage_name": "Cage Gamma", "lat": 14.0780, "lon": 121.3308, "status": "good", "fish_farmed": null, "farm_id": 11}
]"#;

pub fn cages() -> Value {
    parse(CAGES)
}

pub fn cages_by_farm(farm_id: i64) -> Value {
    let cages: Vec<Value> = cages()
        .as_array()
        .map(|all| {
            all.iter()
                .filter(|c| c.get("farm_id").and_then(Value::as_i64) == Some(farm_id))
                .cloned()
                .collect()
        })
        .unwrap_or_default();
    serde_json::json!({ "cages": cages })
}

pub const COMPOSITE_TILE_URL: &str =
    "https://tiles.example.test/v1/maps/composite-chl/tiles/{z}/{x}/{y}";
pub const SINGLE_TILE_URL: &str =
    "https://tiles.example.test/v1/maps/single-chl/tiles/{z}/{x}/{y}";
pub const COMPOSITE_RGB_TILE_URL: &str =
    "https://tiles.example.test/v1/maps/composite-rgb/tiles/{z}/{x}/{y}";
pub const SINGLE_RGB_TILE_URL: &str =
    "https://tiles.example.test/v1/maps/single-rgb/tiles/{z}/{x}/{y}";

pub fn tile_response(url: &str, min: f64, max: f64) -> Value {
    serde_json::json!({ "tile_url": url, "legend_min": min, "legend_max": max })
}

pub fn rgb_tile_response(url: &str) -> Value {
    serde_json::json!({ "tile_url": url })
}

/// A tile response for filters that matched no imagery.
pub fn empty_tile_response() -> Value {
    serde_json::json!({ "tile_url": null, "legend_min": null, "legend_max": null })
}

pub const PARAMETER_VALUES: &str = r#"{"values": [
  {"date": "2024-01-05", "value": 1.2},
  {"date": "2024-02-10", "value": 3.5},
  {"date": "2024-02-20", "value": 2.25}
]}"#;

pub fn parameter_values() -> Value {
    parse(PARAMETER_VALUES)
}

/// Nine three-hourly forecast entries; the first eight fall within 24 hours.
pub const WEATHER: &str = r#"{
  "location": "Talisay",
  "forecast": [
    {"datetime": "2025-03-01 00:00:00", "temperature": 26.0, "humidity": 80, "rainfall": 0.0, "gust_speed": 3.5},
    {"datetime": "2025-03-01 03:00:00", "temperature": 25.5, "humidity": 84, "rainfall": 0.2, "gust_speed": 4.0},
    {"datetime": "2025-03-01 06:00:00", "temperature": 27.0, "humidity": 78, "rainfall": 0.0, "gust_speed": 5.5},
    {"datetime": "2025-03-01 09:00:00", "temperature": 30.5, "humidity": 65, "rainfall": 0.0, "gust_speed": 7.0},
    {"datetime": "2025-03-01 12:00:00", "temperature": 32.0, "humidity": 60, "rainfall": 1.3, "gust_speed": 9.5},
    {"datetime": "2025-03-01 15:00:00", "temperature": 31.0, "humidity": 62, "rainfall": 2.5, "gust_speed": 16.0},
    {"datetime": "2025-03-01 18:00:00", "temperature": 28.5, "humidity": 75, "rainfall": 0.0, "gust_speed": 6.0},
    {"datetime": "2025-03-01 21:00:00", "temperature": 27.0, "humidity": 81, "rainfall": 0.0, "gust_speed": 4.5},
    {"datetime": "2025-03-02 00:00:00", "temperature": 26.5, "humidity": 83, "rainfall": 8.0, "gust_speed": 3.0}
  ]
}"#;

pub fn weather() -> Value {
    parse(WEATHER)
}

fn parse(raw: &str) -> Value {
    match serde_json::from_str(raw) {
        Ok(value) => value,
        Err(e) => panic!("fixture is not valid JSON: {}", e),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_fixtures_parse() {
        assert_eq!(
            lease_collection()["features"].as_array().map(Vec::len),
            Some(5)
        );
        assert_eq!(cages().as_array().map(Vec::len), Some(3));
        assert_eq!(cages_by_farm(10)["cages"].as_array().map(Vec::len), Some(2));
        assert_eq!(weather()["forecast"].as_array().map(Vec::len), Some(9));
        assert!(empty_tile_response()["tile_url"].is_null());
    }
}
