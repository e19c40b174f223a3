//! Generators for synthetic dashboard data.
//!
//! These create predictable payloads for tests that need more features or
//! samples than the hand-written fixtures provide.

use serde_json::{json, Value};

/// Creates a FeatureCollection of `count` square lease polygons laid out in
/// a row eastwards from `origin` (lon, lat).
///
/// Each square is `size` degrees wide with a gap of `size / 2` between
/// neighbours. Feature `i` gets id `GEN-<i>` and cycles through the
/// statuses Valid, Expired and For Renewal.
///
/// # Example
///
/// ```
/// use test_utils::create_lease_grid;
///
/// let fc = create_lease_grid((121.0, 14.0), 4, 0.001);
/// assert_eq!(fc["features"].as_array().unwrap().len(), 4);
/// ```
pub fn create_lease_grid(origin: (f64, f64), count: usize, size: f64) -> Value {
    const STATUSES: [&str; 3] = ["Valid", "Expired", "For Renewal"];
    let features: Vec<Value> = (0..count)
        .map(|i| {
            let min_x = origin.0 + i as f64 * size * 1.5;
            let min_y = origin.1;
            let (max_x, max_y) = (min_x + size, min_y + size);
            json!({
                "type": "Feature",
                "geometry": {
                    "type": "Polygon",
                    "coordinates": [[
                        [min_x, min_y], [max_x, min_y], [max_x, max_y], [min_x, max_y], [min_x, min_y]
                    ]]
                },
                "properties": {
                    "FLA Number": format!("GEN-{}", i),
                    "Name": format!("Generated Lease {}", i),
                    "Status": STATUSES[i % STATUSES.len()],
                    "Area": 1.0 + i as f64
                }
            })
        })
        .collect();
    json!({ "type": "FeatureCollection", "features": features })
}

/// Centre (lon, lat) of square `index` from [`create_lease_grid`].
pub fn lease_grid_center(origin: (f64, f64), index: usize, size: f64) -> (f64, f64) {
    (
        origin.0 + index as f64 * size * 1.5 + size / 2.0,
        origin.1 + size / 2.0,
    )
}

/// Creates `count` consecutive ISO dates in January 2024, newest first.
pub fn create_date_list(count: usize) -> Vec<String> {
    (1..=count.min(31))
        .rev()
        .map(|day| format!("2024-01-{:02}", day))
        .collect()
}

/// Creates a `{values: [...]}` payload with a linear ramp `start + i * step`.
pub fn create_series_payload(dates: &[String], start: f64, step: f64) -> Value {
    let values: Vec<Value> = dates
        .iter()
        .enumerate()
        .map(|(i, date)| json!({ "date": date, "value": start + i as f64 * step }))
        .collect();
    json!({ "values": values })
}
