//! Vector features drawn on the map: lease-area polygons and fish cages.
//!
//! Features are ingested once from backend payloads. Identity and status are
//! resolved at ingestion so that later hover/selection logic only compares
//! [`FeatureId`]s and matches on [`LeaseStatus`].

use geo::{Geometry, MultiPolygon, Point, Polygon};
use serde::{Deserialize, Deserializer, Serialize};
use serde_json::{Map, Value};
use std::collections::HashSet;
use std::fmt;
use tracing::{debug, warn};

use crate::{BoundingBox, DashboardError};

/// Property key holding the lease number of a lease-area polygon.
pub const LEASE_ID_PROPERTY: &str = "FLA Number";

/// Stable identity of a feature across re-renders.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct FeatureId(pub String);

impl FeatureId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for FeatureId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FeatureKind {
    /// Fishery lease area polygon.
    Lease,
    /// Fish cage point.
    Cage,
}

/// Permit status of a lease area.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LeaseStatus {
    Valid,
    Expired,
    ForRenewal,
    #[default]
    Unknown,
}

impl LeaseStatus {
    /// Resolve the free-text status field of a lease record.
    pub fn from_text(text: Option<&str>) -> Self {
        let Some(text) = text else {
            return LeaseStatus::Unknown;
        };
        let text = text.to_lowercase();
        if text.contains("expired") {
            LeaseStatus::Expired
        } else if text.contains("for renewal") {
            LeaseStatus::ForRenewal
        } else if text.contains("valid") || text.contains("active") {
            LeaseStatus::Valid
        } else {
            LeaseStatus::Unknown
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            LeaseStatus::Valid => "Valid",
            LeaseStatus::Expired => "Expired",
            LeaseStatus::ForRenewal => "For Renewal",
            LeaseStatus::Unknown => "Unknown",
        }
    }
}

/// Health status reported for a fish cage.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CageStatus {
    Good,
    AtRisk,
    #[default]
    Other,
}

impl CageStatus {
    pub fn from_text(text: &str) -> Self {
        match text.trim().to_lowercase().as_str() {
            "good" => CageStatus::Good,
            "at risk" | "at_risk" | "at-risk" => CageStatus::AtRisk,
            _ => CageStatus::Other,
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            CageStatus::Good => "Good",
            CageStatus::AtRisk => "At Risk",
            CageStatus::Other => "Unknown",
        }
    }
}

/// Display name for a farmed species code.
pub fn species_display_name(farmed: Option<&str>) -> String {
    let Some(farmed) = farmed.filter(|f| !f.is_empty()) else {
        return "N/A".to_string();
    };
    match farmed {
        "Tilapia" => "Tilapia (Oreochromis)",
        "Catfish" => "Catfish (Siluriformes)",
        "Mudfish" => "Mudfish (Channa striata)",
        "Shrimp" => "Freshwater Prawn / Ulang (Macrobrachium rosenbergii)",
        "Ayungin" => "Silver Perch / Ayungin (Leiopotherapon plumbeus)",
        "Dulong" => "Goby Fry / Dulong (Gobiopterus lacustris)",
        "Snail" => "Golden Apple Snail (Pomacea canaliculata)",
        other => other,
    }
    .to_string()
}

/// Geometry of a feature in longitude/latitude degrees.
#[derive(Debug, Clone, PartialEq)]
pub enum FeatureGeometry {
    Point(Point<f64>),
    Polygon(Polygon<f64>),
    MultiPolygon(MultiPolygon<f64>),
}

impl FeatureGeometry {
    pub fn bbox(&self) -> Option<BoundingBox> {
        match self {
            FeatureGeometry::Point(p) => Some(BoundingBox::new(p.x(), p.y(), p.x(), p.y())),
            FeatureGeometry::Polygon(poly) => {
                BoundingBox::from_points(poly.exterior().0.iter().map(|c| (c.x, c.y)))
            }
            FeatureGeometry::MultiPolygon(mp) => BoundingBox::from_points(
                mp.0.iter()
                    .flat_map(|poly| poly.exterior().0.iter())
                    .map(|c| (c.x, c.y)),
            ),
        }
    }

    /// Representative point used to centre the map on a feature.
    ///
    /// For polygons this is the mean of the exterior ring vertices.
    pub fn midpoint(&self) -> Option<(f64, f64)> {
        match self {
            FeatureGeometry::Point(p) => Some((p.x(), p.y())),
            FeatureGeometry::Polygon(poly) => polygon_midpoint(poly),
            FeatureGeometry::MultiPolygon(mp) => mp.0.first().and_then(polygon_midpoint),
        }
    }

    fn validate(&self) -> Result<(), String> {
        let check = |x: f64, y: f64| -> Result<(), String> {
            if !x.is_finite() || !y.is_finite() || x.abs() > 180.0 || y.abs() > 90.0 {
                return Err(format!("coordinate ({}, {}) out of range", x, y));
            }
            Ok(())
        };
        let check_polygon = |poly: &Polygon<f64>| -> Result<(), String> {
            if poly.exterior().0.len() < 4 {
                return Err("polygon ring has fewer than 4 positions".to_string());
            }
            poly.exterior().0.iter().try_for_each(|c| check(c.x, c.y))
        };
        match self {
            FeatureGeometry::Point(p) => check(p.x(), p.y()),
            FeatureGeometry::Polygon(poly) => check_polygon(poly),
            FeatureGeometry::MultiPolygon(mp) => {
                if mp.0.is_empty() {
                    return Err("empty multipolygon".to_string());
                }
                mp.0.iter().try_for_each(check_polygon)
            }
        }
    }
}

pub fn polygon_midpoint(poly: &Polygon<f64>) -> Option<(f64, f64)> {
    let ring = &poly.exterior().0;
    if ring.is_empty() {
        return None;
    }
    let (sx, sy) = ring.iter().fold((0.0, 0.0), |(sx, sy), c| (sx + c.x, sy + c.y));
    let n = ring.len() as f64;
    Some((sx / n, sy / n))
}

/// Typed view over a feature's property bag.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct FeatureProperties {
    pub name: Option<String>,
    pub status_text: Option<String>,
    /// Area in hectares.
    pub area: Option<f64>,
    pub date_approved: Option<String>,
    pub date_expires: Option<String>,
    pub barangay: Option<String>,
    pub municipality: Option<String>,
    pub province: Option<String>,
    pub species: Option<String>,
    pub farm_id: Option<String>,
    pub cage_status: Option<CageStatus>,
    /// Every property as received.
    pub raw: Map<String, Value>,
}

impl FeatureProperties {
    pub fn from_lease_properties(raw: Map<String, Value>) -> Self {
        Self {
            name: string_prop(&raw, "Name"),
            status_text: string_prop(&raw, "Status"),
            area: number_prop(&raw, "Area"),
            date_approved: string_prop(&raw, "Date Apprv"),
            date_expires: string_prop(&raw, "Date Exp"),
            barangay: string_prop(&raw, "Barangay"),
            municipality: string_prop(&raw, "Mun_Name"),
            province: string_prop(&raw, "Province"),
            raw,
            ..Default::default()
        }
    }

    /// "Barangay, Municipality, Province" with "N/A" for missing parts.
    pub fn location(&self) -> String {
        [&self.barangay, &self.municipality, &self.province]
            .iter()
            .map(|part| part.as_deref().unwrap_or("N/A"))
            .collect::<Vec<_>>()
            .join(", ")
    }
}

fn string_prop(raw: &Map<String, Value>, key: &str) -> Option<String> {
    match raw.get(key)? {
        Value::String(s) if !s.trim().is_empty() => Some(s.trim().to_string()),
        Value::Number(n) => Some(n.to_string()),
        _ => None,
    }
}

fn number_prop(raw: &Map<String, Value>, key: &str) -> Option<f64> {
    match raw.get(key)? {
        Value::Number(n) => n.as_f64(),
        Value::String(s) => s.trim().parse().ok(),
        _ => None,
    }
}

/// One polygon or point drawn by a vector overlay.
#[derive(Debug, Clone, PartialEq)]
pub struct Feature {
    pub id: FeatureId,
    pub kind: FeatureKind,
    pub geometry: FeatureGeometry,
    pub status: LeaseStatus,
    pub properties: FeatureProperties,
}

impl Feature {
    pub fn name(&self) -> &str {
        self.properties.name.as_deref().unwrap_or("N/A")
    }

    /// Case-insensitive match on name, barangay, municipality or province.
    pub fn matches(&self, term: &str) -> bool {
        let term = term.trim().to_lowercase();
        if term.is_empty() {
            return false;
        }
        let p = &self.properties;
        [&p.name, &p.barangay, &p.municipality, &p.province]
            .iter()
            .filter_map(|v| v.as_deref())
            .any(|v| v.to_lowercase().contains(&term))
    }
}

/// Features matching a free-text search term, in collection order.
pub fn search_features<'a>(features: &'a [Feature], term: &str) -> Vec<&'a Feature> {
    features.iter().filter(|f| f.matches(term)).collect()
}

/// A feature that was dropped during ingestion.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FeatureParseError {
    /// Position in the source collection.
    pub index: usize,
    pub message: String,
}

/// Result of ingesting a feature collection: every usable feature plus a
/// record of the ones that were skipped.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct FeatureIngest {
    pub features: Vec<Feature>,
    pub errors: Vec<FeatureParseError>,
}

impl FeatureIngest {
    /// One-line error state for the map container, if anything was dropped.
    pub fn summary(&self) -> Option<String> {
        self.summary_as("lease area", "lease areas")
    }

    pub fn summary_as(&self, singular: &str, plural: &str) -> Option<String> {
        match self.errors.len() {
            0 => None,
            1 => Some(format!("1 {} could not be displayed.", singular)),
            n => Some(format!("{} {} could not be displayed.", n, plural)),
        }
    }
}

/// Ingest a GeoJSON FeatureCollection of lease-area polygons.
///
/// A payload that is not a FeatureCollection at all is an error; individual
/// features with malformed geometry are skipped and reported.
pub fn ingest_feature_collection(payload: &Value) -> Result<FeatureIngest, DashboardError> {
    let features = payload
        .get("features")
        .and_then(Value::as_array)
        .ok_or_else(|| {
            DashboardError::MalformedData("expected a FeatureCollection with features".to_string())
        })?;

    let mut ingest = FeatureIngest::default();
    let mut seen = HashSet::new();

    for (index, raw) in features.iter().enumerate() {
        match parse_lease_feature(index, raw) {
            Ok(mut feature) => {
                if !seen.insert(feature.id.clone()) {
                    let unique = FeatureId::new(format!("{}#{}", feature.id, index));
                    debug!(id = %feature.id, renamed = %unique, "Duplicate feature id");
                    feature.id = unique;
                    seen.insert(feature.id.clone());
                }
                ingest.features.push(feature);
            }
            Err(message) => {
                warn!(index = index, error = %message, "Skipping malformed feature");
                ingest.errors.push(FeatureParseError { index, message });
            }
        }
    }

    debug!(
        features = ingest.features.len(),
        skipped = ingest.errors.len(),
        "Ingested lease features"
    );
    Ok(ingest)
}

fn parse_lease_feature(index: usize, raw: &Value) -> Result<Feature, String> {
    let feature: geojson::Feature =
        serde_json::from_value(raw.clone()).map_err(|e| format!("invalid feature: {}", e))?;

    let geometry = feature
        .geometry
        .ok_or_else(|| "feature has no geometry".to_string())?;
    let geometry: Geometry<f64> = geometry
        .value
        .try_into()
        .map_err(|e: geojson::Error| format!("invalid geometry: {}", e))?;
    let geometry = match geometry {
        Geometry::Point(p) => FeatureGeometry::Point(p),
        Geometry::Polygon(p) => FeatureGeometry::Polygon(p),
        Geometry::MultiPolygon(mp) => FeatureGeometry::MultiPolygon(mp),
        _ => return Err("unsupported geometry type".to_string()),
    };
    geometry.validate()?;

    let raw_props = feature.properties.unwrap_or_default();
    let id = string_prop(&raw_props, LEASE_ID_PROPERTY)
        .or_else(|| {
            feature.id.map(|id| match id {
                geojson::feature::Id::String(s) => s,
                geojson::feature::Id::Number(n) => n.to_string(),
            })
        })
        .unwrap_or_else(|| format!("fla-{}", index));

    let properties = FeatureProperties::from_lease_properties(raw_props);
    Ok(Feature {
        id: FeatureId::new(id),
        kind: FeatureKind::Lease,
        status: LeaseStatus::from_text(properties.status_text.as_deref()),
        geometry,
        properties,
    })
}

/// A fish cage as returned by the cage endpoints.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CageRecord {
    #[serde(deserialize_with = "id_from_any")]
    pub cage_id: String,
    pub cage_name: String,
    pub lat: f64,
    pub lon: f64,
    #[serde(default)]
    pub status: String,
    #[serde(default)]
    pub fish_farmed: Option<String>,
    #[serde(default, deserialize_with = "opt_id_from_any")]
    pub farm_id: Option<String>,
}

fn id_from_any<'de, D: Deserializer<'de>>(d: D) -> Result<String, D::Error> {
    match Value::deserialize(d)? {
        Value::String(s) => Ok(s),
        Value::Number(n) => Ok(n.to_string()),
        other => Err(serde::de::Error::custom(format!(
            "expected string or number id, got {}",
            other
        ))),
    }
}

fn opt_id_from_any<'de, D: Deserializer<'de>>(d: D) -> Result<Option<String>, D::Error> {
    match Value::deserialize(d)? {
        Value::Null => Ok(None),
        Value::String(s) => Ok(Some(s)),
        Value::Number(n) => Ok(Some(n.to_string())),
        other => Err(serde::de::Error::custom(format!(
            "expected string or number id, got {}",
            other
        ))),
    }
}

impl CageRecord {
    /// Convert to a point feature; cages with impossible coordinates are
    /// rejected individually.
    pub fn to_feature(&self) -> Result<Feature, FeatureParseError> {
        let geometry = FeatureGeometry::Point(Point::new(self.lon, self.lat));
        geometry.validate().map_err(|message| FeatureParseError {
            index: 0,
            message,
        })?;
        let mut raw = Map::new();
        raw.insert("cage_name".to_string(), Value::String(self.cage_name.clone()));
        raw.insert("status".to_string(), Value::String(self.status.clone()));
        Ok(Feature {
            id: FeatureId::new(self.cage_id.clone()),
            kind: FeatureKind::Cage,
            geometry,
            status: LeaseStatus::Unknown,
            properties: FeatureProperties {
                name: Some(self.cage_name.clone()),
                species: self.fish_farmed.clone(),
                farm_id: self.farm_id.clone(),
                cage_status: Some(CageStatus::from_text(&self.status)),
                raw,
                ..Default::default()
            },
        })
    }
}

/// Convert cage records, skipping those that fail validation.
pub fn ingest_cages(records: &[CageRecord]) -> FeatureIngest {
    let mut ingest = FeatureIngest::default();
    for (index, record) in records.iter().enumerate() {
        match record.to_feature() {
            Ok(feature) => ingest.features.push(feature),
            Err(mut err) => {
                err.index = index;
                warn!(cage = %record.cage_id, error = %err.message, "Skipping cage");
                ingest.errors.push(err);
            }
        }
    }
    ingest
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_status_resolution() {
        assert_eq!(LeaseStatus::from_text(Some("EXPIRED")), LeaseStatus::Expired);
        assert_eq!(
            LeaseStatus::from_text(Some("For Renewal")),
            LeaseStatus::ForRenewal
        );
        assert_eq!(LeaseStatus::from_text(Some("Valid")), LeaseStatus::Valid);
        assert_eq!(LeaseStatus::from_text(Some("pending")), LeaseStatus::Unknown);
        assert_eq!(LeaseStatus::from_text(None), LeaseStatus::Unknown);
    }

    #[test]
    fn test_id_falls_back_to_feature_id_then_index() {
        let payload = json!({
            "type": "FeatureCollection",
            "features": [
                {
                    "type": "Feature",
                    "id": "lease-7",
                    "geometry": {"type": "Point", "coordinates": [121.33, 14.07]},
                    "properties": {"Name": "A"}
                },
                {
                    "type": "Feature",
                    "geometry": {"type": "Point", "coordinates": [121.34, 14.08]},
                    "properties": {"Name": "B"}
                }
            ]
        });
        let ingest = ingest_feature_collection(&payload).unwrap();
        assert_eq!(ingest.features[0].id.as_str(), "lease-7");
        assert_eq!(ingest.features[1].id.as_str(), "fla-1");
    }

    #[test]
    fn test_cage_ids_accept_numbers() {
        let cage: CageRecord = serde_json::from_value(json!({
            "cage_id": 12,
            "cage_name": "Cage 12",
            "lat": 14.07,
            "lon": 121.33,
            "status": "at risk",
            "fish_farmed": "Tilapia",
            "farm_id": 3
        }))
        .unwrap();
        let feature = cage.to_feature().unwrap();
        assert_eq!(feature.id.as_str(), "12");
        assert_eq!(feature.properties.farm_id.as_deref(), Some("3"));
        assert_eq!(feature.properties.cage_status, Some(CageStatus::AtRisk));
    }

    #[test]
    fn test_species_display() {
        assert_eq!(species_display_name(Some("Tilapia")), "Tilapia (Oreochromis)");
        assert_eq!(species_display_name(Some("Bangus")), "Bangus");
        assert_eq!(species_display_name(None), "N/A");
    }

    #[test]
    fn test_invalid_cage_is_skipped() {
        let records = vec![CageRecord {
            cage_id: "c1".to_string(),
            cage_name: "Broken".to_string(),
            lat: 95.0,
            lon: 121.0,
            status: "good".to_string(),
            fish_farmed: None,
            farm_id: None,
        }];
        let ingest = ingest_cages(&records);
        assert!(ingest.features.is_empty());
        assert_eq!(ingest.errors[0].index, 0);
    }
}
