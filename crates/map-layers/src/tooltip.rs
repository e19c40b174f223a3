//! Hover tooltip anchored at the pointer's map coordinate.

use baysense_common::feature::{species_display_name, Feature};
use baysense_common::time::format_long_date;
use baysense_common::{FeatureId, MapCoordinate};
use serde::Serialize;

/// Pixel offset of the tooltip from its anchor; it sits above the pointer.
pub const TOOLTIP_OFFSET: (i32, i32) = (0, -15);

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TooltipRow {
    pub label: String,
    pub value: String,
}

impl TooltipRow {
    fn new(label: &str, value: impl Into<String>) -> Self {
        Self {
            label: label.to_string(),
            value: value.into(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TooltipContent {
    pub title: String,
    pub rows: Vec<TooltipRow>,
    /// Status slug for styling, e.g. `for-renewal`.
    pub status_class: Option<String>,
}

impl TooltipContent {
    pub fn row(&self, label: &str) -> Option<&str> {
        self.rows
            .iter()
            .find(|r| r.label == label)
            .map(|r| r.value.as_str())
    }
}

/// Tooltip for a lease-area polygon.
pub fn lease_tooltip(feature: &Feature) -> TooltipContent {
    let p = &feature.properties;
    let area = p
        .area
        .map(|a| format!("{} ha", a))
        .unwrap_or_else(|| "N/A".to_string());
    let status = p.status_text.clone().unwrap_or_else(|| "N/A".to_string());
    TooltipContent {
        title: feature.name().to_string(),
        rows: vec![
            TooltipRow::new("Location", p.location()),
            TooltipRow::new("Area", area),
            TooltipRow::new("Approved", format_long_date(p.date_approved.as_deref())),
            TooltipRow::new("Expires", format_long_date(p.date_expires.as_deref())),
            TooltipRow::new("Status", status),
        ],
        status_class: Some(
            p.status_text
                .as_deref()
                .map(|s| s.to_lowercase().split_whitespace().collect::<Vec<_>>().join("-"))
                .unwrap_or_else(|| "unknown".to_string()),
        ),
    }
}

/// Tooltip for a cage pin: the cage name.
pub fn cage_tooltip(feature: &Feature) -> TooltipContent {
    TooltipContent {
        title: feature.name().to_string(),
        rows: Vec::new(),
        status_class: None,
    }
}

/// Extended cage details shown when a cage is selected.
pub fn cage_details(feature: &Feature) -> TooltipContent {
    let p = &feature.properties;
    let coords = feature
        .geometry
        .midpoint()
        .map(|(lon, lat)| format!("{:.6}, {:.6}", lat, lon))
        .unwrap_or_else(|| "N/A".to_string());
    TooltipContent {
        title: feature.name().to_string(),
        rows: vec![
            TooltipRow::new("Species", species_display_name(p.species.as_deref())),
            TooltipRow::new(
                "Status",
                p.cage_status.map(|s| s.label()).unwrap_or("Unknown"),
            ),
            TooltipRow::new("Coordinates", coords),
            TooltipRow::new("Farm", p.farm_id.clone().unwrap_or_else(|| "N/A".to_string())),
        ],
        status_class: None,
    }
}

/// Transient tooltip state, one per map surface.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct TooltipState {
    hovered: Option<FeatureId>,
    content: Option<TooltipContent>,
    anchor: Option<MapCoordinate>,
}

impl TooltipState {
    pub fn show(&mut self, hovered: FeatureId, content: TooltipContent, anchor: MapCoordinate) {
        self.hovered = Some(hovered);
        self.content = Some(content);
        self.anchor = Some(anchor);
    }

    pub fn hide(&mut self) {
        *self = Self::default();
    }

    pub fn is_visible(&self) -> bool {
        self.content.is_some()
    }

    pub fn hovered(&self) -> Option<&FeatureId> {
        self.hovered.as_ref()
    }

    pub fn content(&self) -> Option<&TooltipContent> {
        self.content.as_ref()
    }

    pub fn anchor(&self) -> Option<MapCoordinate> {
        self.anchor
    }
}
