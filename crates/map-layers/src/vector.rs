//! Vector overlays and the per-feature hover state machine.
//!
//! Feature styles are never stored on features. Each style pass evaluates
//! the style function for every feature from the current hover identity and
//! the selection passed in by the owner, and a pass only happens when one of
//! those inputs actually changes.

use baysense_common::style::{cage_style, lease_style};
use baysense_common::{
    Feature, FeatureGeometry, FeatureId, FeatureStyle, InteractionState, MapCoordinate, Pixel,
    Viewport,
};
use geo::{Coord, EuclideanDistance, MapCoords, Point};
use tracing::{debug, trace};

use crate::layer::{LayerId, LayerKind, VectorKind};
use crate::surface::{ListenerKey, ListenerType, MapSurface};

/// Pixel tolerance applied to clicks on polygons.
pub const CLICK_TOLERANCE_PX: f64 = 5.0;

/// Size of the cage pin icon at scale 1.0; the icon sits above its point.
pub const PIN_WIDTH_PX: f64 = 32.0;
pub const PIN_HEIGHT_PX: f64 = 42.0;

/// Result of a pointer move for one overlay.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum HoverChange {
    Unchanged,
    Changed {
        previous: Option<FeatureId>,
        current: Option<FeatureId>,
    },
}

impl HoverChange {
    pub fn is_changed(&self) -> bool {
        matches!(self, HoverChange::Changed { .. })
    }
}

#[derive(Debug, Clone)]
pub struct VectorOverlay {
    kind: VectorKind,
    features: Vec<Feature>,
    visible: bool,
    show_tooltips: bool,
    hovered: Option<FeatureId>,
    styles: Vec<(FeatureId, FeatureStyle)>,
    style_passes: u64,
    layer: Option<LayerId>,
    listeners: Vec<ListenerKey>,
}

impl VectorOverlay {
    pub fn new(kind: VectorKind) -> Self {
        Self {
            kind,
            features: Vec::new(),
            visible: true,
            show_tooltips: true,
            hovered: None,
            styles: Vec::new(),
            style_passes: 0,
            layer: None,
            listeners: Vec::new(),
        }
    }

    pub fn kind(&self) -> VectorKind {
        self.kind
    }

    pub fn features(&self) -> &[Feature] {
        &self.features
    }

    pub fn feature(&self, id: &FeatureId) -> Option<&Feature> {
        self.features.iter().find(|f| &f.id == id)
    }

    pub fn is_visible(&self) -> bool {
        self.visible
    }

    pub fn show_tooltips(&self) -> bool {
        self.show_tooltips
    }

    pub fn set_show_tooltips(&mut self, show: bool) {
        self.show_tooltips = show;
    }

    pub fn hovered(&self) -> Option<&FeatureId> {
        self.hovered.as_ref()
    }

    /// Number of style passes run so far.
    pub fn style_passes(&self) -> u64 {
        self.style_passes
    }

    /// Styles from the most recent pass.
    pub fn styles(&self) -> &[(FeatureId, FeatureStyle)] {
        &self.styles
    }

    pub fn layer_id(&self) -> Option<&LayerId> {
        self.layer.as_ref()
    }

    // ========================================================================
    // Surface attachment
    // ========================================================================

    /// Add the layer and register pointer listeners. Idempotent.
    pub fn attach(&mut self, surface: &mut MapSurface) {
        if self
            .layer
            .as_ref()
            .is_some_and(|id| surface.layer(id).is_some())
        {
            return;
        }
        let id = surface.add_layer(
            LayerKind::Vector(self.kind),
            None,
            self.visible,
            self.kind.z_index(),
        );
        self.layer = Some(id);
        self.listeners = vec![
            surface.on(ListenerType::PointerMove, self.kind.name()),
            surface.on(ListenerType::Click, self.kind.name()),
        ];
    }

    pub fn detach(&mut self, surface: &mut MapSurface) {
        for key in self.listeners.drain(..) {
            surface.un(key);
        }
        if let Some(id) = self.layer.take() {
            surface.remove_layer(&id);
        }
        self.hovered = None;
    }

    /// Replace the feature collection. The layer is recreated with the new
    /// features; hover survives only if the hovered feature still exists.
    pub fn set_features(
        &mut self,
        surface: Option<&mut MapSurface>,
        features: Vec<Feature>,
        selected: Option<&FeatureId>,
    ) {
        debug!(overlay = self.kind.name(), count = features.len(), "Replacing features");
        self.features = features;
        if self
            .hovered
            .as_ref()
            .is_some_and(|h| self.feature(h).is_none())
        {
            self.hovered = None;
        }
        if let Some(surface) = surface {
            if let Some(id) = self.layer.take() {
                surface.remove_layer(&id);
                self.layer = Some(surface.add_layer(
                    LayerKind::Vector(self.kind),
                    None,
                    self.visible,
                    self.kind.z_index(),
                ));
            }
        }
        self.restyle(selected);
    }

    /// Show or hide the overlay. Hiding clears hover.
    pub fn set_visible(
        &mut self,
        surface: Option<&mut MapSurface>,
        visible: bool,
        selected: Option<&FeatureId>,
    ) -> HoverChange {
        self.visible = visible;
        if let (Some(surface), Some(id)) = (surface, &self.layer) {
            surface.set_layer_visible(id, visible);
        }
        if !visible && self.hovered.is_some() {
            let previous = self.hovered.take();
            self.restyle(selected);
            return HoverChange::Changed {
                previous,
                current: None,
            };
        }
        HoverChange::Unchanged
    }

    // ========================================================================
    // Interaction
    // ========================================================================

    /// Hit-test this overlay's features under the pointer and update hover.
    ///
    /// Moves that stay on the same feature (or on empty space) do not run a
    /// style pass.
    pub fn handle_pointer_move(
        &mut self,
        viewport: &Viewport,
        pixel: Pixel,
        selected: Option<&FeatureId>,
    ) -> HoverChange {
        let hit = if self.visible {
            self.hit_test(viewport, pixel, 0.0, selected).map(|f| f.id.clone())
        } else {
            None
        };
        if hit == self.hovered {
            trace!(overlay = self.kind.name(), "Hover unchanged");
            return HoverChange::Unchanged;
        }
        let previous = std::mem::replace(&mut self.hovered, hit.clone());
        self.restyle(selected);
        debug!(
            overlay = self.kind.name(),
            previous = ?previous.as_ref().map(FeatureId::as_str),
            current = ?hit.as_ref().map(FeatureId::as_str),
            "Hover changed"
        );
        HoverChange::Changed {
            previous,
            current: hit,
        }
    }

    /// Feature under a click, with a small pixel tolerance.
    pub fn handle_click(
        &self,
        viewport: &Viewport,
        pixel: Pixel,
        selected: Option<&FeatureId>,
    ) -> Option<FeatureId> {
        if !self.visible {
            return None;
        }
        self.hit_test(viewport, pixel, CLICK_TOLERANCE_PX, selected)
            .map(|f| f.id.clone())
    }

    /// Topmost feature within `tolerance` pixels of `pixel`. Features later
    /// in the collection are drawn above earlier ones. Pins are tested at the
    /// size they are drawn for the current selection.
    pub fn hit_test(
        &self,
        viewport: &Viewport,
        pixel: Pixel,
        tolerance: f64,
        selected: Option<&FeatureId>,
    ) -> Option<&Feature> {
        let cursor = Point::new(pixel.x, pixel.y);
        self.features
            .iter()
            .rev()
            .find(|feature| match &feature.geometry {
                FeatureGeometry::Point(p) => {
                    let scale = cage_style(self.state_of(&feature.id, selected)).scale;
                    pin_contains(viewport, p.x(), p.y(), scale, pixel, tolerance)
                }
                FeatureGeometry::Polygon(poly) => {
                    cursor.euclidean_distance(&poly.map_coords(|c| to_screen(viewport, c)))
                        <= tolerance
                }
                FeatureGeometry::MultiPolygon(mp) => {
                    cursor.euclidean_distance(&mp.map_coords(|c| to_screen(viewport, c)))
                        <= tolerance
                }
            })
    }

    fn state_of(&self, id: &FeatureId, selected: Option<&FeatureId>) -> InteractionState {
        InteractionState::resolve(selected == Some(id), self.hovered.as_ref() == Some(id))
    }

    /// Style of every feature for the given selection.
    pub fn resolved_styles(&self, selected: Option<&FeatureId>) -> Vec<(FeatureId, FeatureStyle)> {
        self.features
            .iter()
            .map(|f| {
                let state = self.state_of(&f.id, selected);
                let style = match self.kind {
                    VectorKind::Leases => lease_style(f.status, state),
                    VectorKind::Cages => cage_style(state),
                };
                (f.id.clone(), style)
            })
            .collect()
    }

    /// Run one style pass.
    pub fn restyle(&mut self, selected: Option<&FeatureId>) {
        self.styles = self.resolved_styles(selected);
        self.style_passes += 1;
    }
}

fn to_screen(viewport: &Viewport, c: Coord<f64>) -> Coord<f64> {
    let p = viewport.coordinate_to_pixel(MapCoordinate::new(c.x, c.y));
    Coord { x: p.x, y: p.y }
}

/// The pin icon is anchored at its bottom centre.
fn pin_contains(
    viewport: &Viewport,
    lon: f64,
    lat: f64,
    scale: f64,
    pixel: Pixel,
    tolerance: f64,
) -> bool {
    let anchor = viewport.coordinate_to_pixel(MapCoordinate::new(lon, lat));
    let half_width = PIN_WIDTH_PX * scale / 2.0 + tolerance;
    let height = PIN_HEIGHT_PX * scale;
    let dx = (pixel.x - anchor.x).abs();
    let dy = anchor.y - pixel.y;
    dx <= half_width && dy >= -tolerance && dy <= height + tolerance
}

#[cfg(test)]
mod tests {
    use super::*;
    use baysense_common::feature::{ingest_cages, ingest_feature_collection};
    use baysense_common::CageRecord;
    use serde_json::json;

    fn viewport() -> Viewport {
        Viewport::new(MapCoordinate::new(121.33, 14.078), 16.7, 800, 600)
    }

    fn square(id: &str, lon: f64, lat: f64, size: f64) -> serde_json::Value {
        json!({
            "type": "Feature",
            "geometry": {"type": "Polygon", "coordinates": [[
                [lon, lat], [lon + size, lat], [lon + size, lat + size], [lon, lat + size], [lon, lat]
            ]]},
            "properties": {"FLA Number": id, "Status": "Valid"}
        })
    }

    fn overlay_with(features: Vec<serde_json::Value>) -> VectorOverlay {
        let fc = json!({"type": "FeatureCollection", "features": features});
        let ingest = ingest_feature_collection(&fc).unwrap();
        let mut overlay = VectorOverlay::new(VectorKind::Leases);
        overlay.set_features(None, ingest.features, None);
        overlay
    }

    #[test]
    fn test_overlapping_features_last_wins() {
        let overlay = overlay_with(vec![
            square("under", 121.3295, 14.0775, 0.001),
            square("over", 121.3295, 14.0775, 0.001),
        ]);
        let vp = viewport();
        let px = vp.coordinate_to_pixel(MapCoordinate::new(121.33, 14.078));
        assert_eq!(overlay.hit_test(&vp, px, 0.0, None).unwrap().id.as_str(), "over");
    }

    #[test]
    fn test_click_tolerance() {
        let overlay = overlay_with(vec![square("a", 121.3295, 14.0775, 0.001)]);
        let vp = viewport();
        let edge = vp.coordinate_to_pixel(MapCoordinate::new(121.3305, 14.078));
        let near = Pixel::new(edge.x + 3.0, edge.y);
        let far = Pixel::new(edge.x + 8.0, edge.y);
        assert_eq!(overlay.handle_click(&vp, near, None).map(|id| id.0), Some("a".to_string()));
        assert_eq!(overlay.handle_click(&vp, far, None), None);
    }

    #[test]
    fn test_selected_pin_hit_at_drawn_size() {
        let records: Vec<CageRecord> = serde_json::from_value(json!([
            {"cage_id": 7, "cage_name": "Cage 7", "lat": 14.078, "lon": 121.33, "status": "Good"}
        ]))
        .unwrap();
        let mut overlay = VectorOverlay::new(VectorKind::Cages);
        overlay.set_features(None, ingest_cages(&records).features, None);

        let vp = viewport();
        let anchor = vp.coordinate_to_pixel(MapCoordinate::new(121.33, 14.078));
        // Above an unselected pin, inside the top of a selected one.
        let top = Pixel::new(anchor.x, anchor.y - 55.0);
        let id = FeatureId::new("7");
        assert_eq!(overlay.handle_click(&vp, top, None), None);
        assert_eq!(overlay.handle_click(&vp, top, Some(&id)), Some(id.clone()));
    }

    #[test]
    fn test_set_features_drops_missing_hover() {
        let mut overlay = overlay_with(vec![square("a", 121.3295, 14.0775, 0.001)]);
        let vp = viewport();
        let px = vp.coordinate_to_pixel(MapCoordinate::new(121.33, 14.078));
        assert!(overlay.handle_pointer_move(&vp, px, None).is_changed());
        overlay.set_features(None, Vec::new(), None);
        assert!(overlay.hovered().is_none());
    }
}
