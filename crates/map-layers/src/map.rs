//! The composed dashboard map.
//!
//! [`DashboardMap`] owns the surface and every overlay drawn on it. Other
//! widgets never touch the surface; they hand it tile URLs and feature
//! collections and receive [`MapOutput`] back from pointer events.

use baysense_common::{
    FeatureId, FeatureIngest, FeatureStyle, LegendSpec, MapCoordinate, Parameter, Pixel,
    TileUrlTemplate,
};
use serde::Serialize;
use std::collections::BTreeMap;
use tracing::{debug, info, warn};

use crate::controls::{ControlId, LayerControls};
use crate::layer::{Layer, RasterKind, VectorKind};
use crate::legend_panel::{DateCaption, LegendPanel};
use crate::raster::{RasterOverlay, RasterSync};
use crate::selection::{Selection, SelectionChange, SelectionKey};
use crate::surface::{ListenerType, MapOptions, MapSurface, MapView, RenderTarget};
use crate::tooltip::{cage_tooltip, lease_tooltip, TooltipState};
use crate::vector::{HoverChange, VectorOverlay};

/// Input events routed from the renderer.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum MapEvent {
    PointerMove(Pixel),
    Click(Pixel),
    Resize { width: u32, height: u32 },
}

/// What an event changed.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct MapOutput {
    pub hover: Vec<(VectorKind, HoverChange)>,
    /// Feature-selection event for the rest of the dashboard.
    pub selection: Option<SelectionChange>,
    pub resized: bool,
}

impl MapOutput {
    pub fn hover_changed(&self) -> bool {
        self.hover.iter().any(|(_, change)| change.is_changed())
    }
}

/// Parts of the map that can carry a one-line error.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorSlot {
    Tiles,
    /// Imagery dates behind the single-date picker.
    Dates,
    Features,
    Cages,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Cursor {
    Default,
    Pointer,
}

/// New raster sources and legend range from one tile request round.
#[derive(Debug, Clone, PartialEq)]
pub struct TileUpdate {
    pub parameter: Parameter,
    pub parameter_url: Option<TileUrlTemplate>,
    pub legend_min: Option<f64>,
    pub legend_max: Option<f64>,
    pub true_color_url: Option<TileUrlTemplate>,
    pub caption: Option<DateCaption>,
}

/// Everything a renderer needs to draw the current frame.
#[derive(Debug, Clone, Serialize)]
pub struct MapSnapshot {
    pub mounted: bool,
    pub center: MapCoordinate,
    pub zoom: f64,
    /// Bottom first.
    pub layers: Vec<Layer>,
    pub lease_styles: Vec<(FeatureId, FeatureStyle)>,
    pub cage_styles: Vec<(FeatureId, FeatureStyle)>,
    pub selection: Option<SelectionKey>,
    pub tooltip: TooltipState,
    pub legend: LegendSpec,
    pub legend_caption: Option<String>,
    pub legend_visible: bool,
    pub controls: LayerControls,
    pub cursor: Cursor,
    pub error: Option<String>,
}

#[derive(Debug)]
pub struct DashboardMap {
    options: MapOptions,
    view: MapView,
    parameter_url: Option<TileUrlTemplate>,
    true_color_url: Option<TileUrlTemplate>,
    parameter: RasterOverlay,
    true_color: RasterOverlay,
    leases: VectorOverlay,
    cages: VectorOverlay,
    selection: Selection,
    tooltip: TooltipState,
    legend: LegendPanel,
    controls: LayerControls,
    errors: BTreeMap<ErrorSlot, String>,
}

impl DashboardMap {
    pub fn new(options: MapOptions) -> Self {
        let mut controls = LayerControls::default();
        // No tile sources until the first analysis completes.
        controls.set_enabled(ControlId::WaterQuality, false);
        controls.set_enabled(ControlId::TrueColor, false);
        Self {
            options,
            view: MapView::new(),
            parameter_url: None,
            true_color_url: None,
            parameter: RasterOverlay::new(RasterKind::Parameter),
            true_color: RasterOverlay::new(RasterKind::TrueColor),
            leases: VectorOverlay::new(VectorKind::Leases),
            cages: VectorOverlay::new(VectorKind::Cages),
            selection: Selection::default(),
            tooltip: TooltipState::default(),
            legend: LegendPanel::default(),
            controls,
            errors: BTreeMap::new(),
        }
    }

    // ========================================================================
    // Lifecycle
    // ========================================================================

    /// Construct the surface once and attach every overlay to it.
    pub fn mount(&mut self, target: RenderTarget) -> bool {
        let Self {
            options,
            view,
            parameter_url,
            true_color_url,
            parameter,
            true_color,
            leases,
            cages,
            controls,
            ..
        } = self;
        view.mount(target, options, |surface| {
            parameter.sync(
                surface,
                parameter_url.clone(),
                controls.toggle(ControlId::WaterQuality).on,
            );
            true_color.sync(
                surface,
                true_color_url.clone(),
                controls.toggle(ControlId::TrueColor).on,
            );
            leases.attach(surface);
            cages.attach(surface);
        })
    }

    /// Detach the surface. Overlays keep their data for a later remount.
    pub fn unmount(&mut self) -> bool {
        let Some(mut surface) = self.view.unmount() else {
            return false;
        };
        self.leases.detach(&mut surface);
        self.cages.detach(&mut surface);
        self.tooltip.hide();
        debug!(
            remaining_listeners = surface.listener_count(),
            "Map overlays detached"
        );
        true
    }

    pub fn is_mounted(&self) -> bool {
        self.view.is_mounted()
    }

    pub fn surface(&self) -> Option<&MapSurface> {
        self.view.surface()
    }

    // ========================================================================
    // Events
    // ========================================================================

    pub fn dispatch(&mut self, event: MapEvent) -> MapOutput {
        match event {
            MapEvent::PointerMove(pixel) => self.pointer_move(pixel),
            MapEvent::Click(pixel) => self.click(pixel),
            MapEvent::Resize { width, height } => MapOutput {
                resized: self
                    .view
                    .surface_mut()
                    .is_some_and(|s| s.observe_resize(width, height)),
                ..MapOutput::default()
            },
        }
    }

    fn pointer_move(&mut self, pixel: Pixel) -> MapOutput {
        let mut output = MapOutput::default();
        let Some(surface) = self.view.surface() else {
            return output;
        };
        let viewport = *surface.viewport();
        let listening = |kind: VectorKind| surface.has_listener(ListenerType::PointerMove, kind.name());
        let (cages_listening, leases_listening) =
            (listening(VectorKind::Cages), listening(VectorKind::Leases));

        if cages_listening {
            let selected = self.selection.selected_in(VectorKind::Cages);
            let change = self.cages.handle_pointer_move(&viewport, pixel, selected);
            output.hover.push((VectorKind::Cages, change));
        }
        if leases_listening {
            let selected = self.selection.selected_in(VectorKind::Leases);
            let change = self.leases.handle_pointer_move(&viewport, pixel, selected);
            output.hover.push((VectorKind::Leases, change));
        }
        self.refresh_tooltip(Some(viewport.pixel_to_coordinate(pixel)));
        output
    }

    fn click(&mut self, pixel: Pixel) -> MapOutput {
        let mut output = MapOutput::default();
        let Some(surface) = self.view.surface() else {
            return output;
        };
        let viewport = *surface.viewport();
        // Pins are drawn above the polygons.
        let hit = [&self.cages, &self.leases]
            .into_iter()
            .filter(|overlay| surface.has_listener(ListenerType::Click, overlay.kind().name()))
            .find_map(|overlay| {
                let selected = self.selection.selected_in(overlay.kind());
                overlay
                    .handle_click(&viewport, pixel, selected)
                    .map(|id| SelectionKey::new(overlay.kind(), id))
            });
        let change = self.selection.apply_click(hit);
        if change != SelectionChange::Unchanged {
            self.restyle_all();
        }
        output.selection = Some(change);
        output
    }

    /// Select programmatically, e.g. from a search result.
    pub fn select(&mut self, key: Option<SelectionKey>) -> SelectionChange {
        let change = self.selection.select(key);
        if change != SelectionChange::Unchanged {
            self.restyle_all();
        }
        change
    }

    fn restyle_all(&mut self) {
        self.leases
            .restyle(self.selection.selected_in(VectorKind::Leases));
        self.cages.restyle(self.selection.selected_in(VectorKind::Cages));
    }

    /// Show the tooltip for the topmost hovered feature of a visible overlay
    /// with tooltips enabled, or hide it.
    fn refresh_tooltip(&mut self, anchor: Option<MapCoordinate>) {
        let hovered = [&self.cages, &self.leases]
            .into_iter()
            .filter(|o| o.is_visible() && o.show_tooltips())
            .find_map(|o| o.hovered().and_then(|id| o.feature(id)).map(|f| (o.kind(), f)));
        let anchor = anchor.or(self.tooltip.anchor());
        match (hovered, anchor) {
            (Some((kind, feature)), Some(anchor)) => {
                let content = match kind {
                    VectorKind::Leases => lease_tooltip(feature),
                    VectorKind::Cages => cage_tooltip(feature),
                };
                self.tooltip.show(feature.id.clone(), content, anchor);
            }
            _ => self.tooltip.hide(),
        }
    }

    // ========================================================================
    // Data
    // ========================================================================

    /// Swap in new raster sources and recompute the legend.
    pub fn apply_tiles(&mut self, update: TileUpdate) -> (RasterSync, RasterSync) {
        info!(
            parameter = %update.parameter,
            has_parameter_tiles = update.parameter_url.is_some(),
            has_true_color_tiles = update.true_color_url.is_some(),
            "Applying tile update"
        );
        if update.parameter_url.is_some() {
            self.legend.update(
                update.parameter,
                update.legend_min,
                update.legend_max,
                update.caption,
            );
        } else {
            self.legend.reset();
        }
        self.parameter_url = update.parameter_url;
        self.true_color_url = update.true_color_url;
        self.clear_error(ErrorSlot::Tiles);
        self.sync_rasters()
    }

    /// Withdraw both raster sources, e.g. after a failed tile request.
    pub fn clear_tiles(&mut self) -> (RasterSync, RasterSync) {
        self.parameter_url = None;
        self.true_color_url = None;
        self.legend.reset();
        self.sync_rasters()
    }

    fn sync_rasters(&mut self) -> (RasterSync, RasterSync) {
        self.controls
            .set_enabled(ControlId::WaterQuality, self.parameter_url.is_some());
        self.controls
            .set_enabled(ControlId::TrueColor, self.true_color_url.is_some());
        let Some(surface) = self.view.surface_mut() else {
            return (RasterSync::Unchanged, RasterSync::Unchanged);
        };
        let parameter = self.parameter.sync(
            surface,
            self.parameter_url.clone(),
            self.controls.toggle(ControlId::WaterQuality).on,
        );
        let true_color = self.true_color.sync(
            surface,
            self.true_color_url.clone(),
            self.controls.toggle(ControlId::TrueColor).on,
        );
        (parameter, true_color)
    }

    /// Replace the lease polygons. Skipped features become the error line.
    pub fn set_features(&mut self, ingest: FeatureIngest) {
        self.replace_features(VectorKind::Leases, ingest, ErrorSlot::Features);
    }

    pub fn set_cages(&mut self, ingest: FeatureIngest) {
        self.replace_features(VectorKind::Cages, ingest, ErrorSlot::Cages);
    }

    fn replace_features(&mut self, kind: VectorKind, ingest: FeatureIngest, slot: ErrorSlot) {
        let summary = match kind {
            VectorKind::Leases => ingest.summary(),
            VectorKind::Cages => ingest.summary_as("cage", "cages"),
        };
        match summary {
            Some(summary) => {
                warn!(overlay = kind.name(), skipped = ingest.errors.len(), "Some features were skipped");
                self.set_error(slot, summary);
            }
            None => self.clear_error(slot),
        }
        let FeatureIngest { features, .. } = ingest;
        let stale = self
            .selection
            .selected_in(kind)
            .is_some_and(|selected| !features.iter().any(|f| &f.id == selected));
        if stale {
            self.selection.select(None);
        }
        let selected = self.selection.selected_in(kind).cloned();
        let overlay = match kind {
            VectorKind::Leases => &mut self.leases,
            VectorKind::Cages => &mut self.cages,
        };
        overlay.set_features(self.view.surface_mut(), features, selected.as_ref());
        self.refresh_tooltip(None);
    }

    // ========================================================================
    // Controls
    // ========================================================================

    /// Flip a layer toggle. Returns `None` when the control is disabled.
    pub fn toggle_control(&mut self, id: ControlId) -> Option<bool> {
        let on = self.controls.flip(id)?;
        match id {
            ControlId::WaterQuality | ControlId::TrueColor => {
                self.sync_rasters();
            }
            ControlId::LeaseAreas => self.set_vector_visible(VectorKind::Leases, on),
            ControlId::Cages => self.set_vector_visible(VectorKind::Cages, on),
        }
        Some(on)
    }

    fn set_vector_visible(&mut self, kind: VectorKind, visible: bool) {
        let selected = self.selection.selected_in(kind).cloned();
        let overlay = match kind {
            VectorKind::Leases => &mut self.leases,
            VectorKind::Cages => &mut self.cages,
        };
        overlay.set_visible(self.view.surface_mut(), visible, selected.as_ref());
        self.refresh_tooltip(None);
    }

    pub fn set_show_tooltips(&mut self, kind: VectorKind, show: bool) {
        match kind {
            VectorKind::Leases => self.leases.set_show_tooltips(show),
            VectorKind::Cages => self.cages.set_show_tooltips(show),
        }
        self.refresh_tooltip(None);
    }

    pub fn toggle_legend(&mut self) -> bool {
        self.legend.toggle_visible()
    }

    pub fn toggle_controls_open(&mut self) -> bool {
        self.controls.toggle_open()
    }

    /// Pan the view onto a feature's midpoint.
    pub fn center_on_feature(&mut self, kind: VectorKind, id: &FeatureId) -> bool {
        let overlay = match kind {
            VectorKind::Leases => &self.leases,
            VectorKind::Cages => &self.cages,
        };
        let Some((lon, lat)) = overlay.feature(id).and_then(|f| f.geometry.midpoint()) else {
            return false;
        };
        match self.view.surface_mut() {
            Some(surface) => {
                surface.set_center(MapCoordinate::new(lon, lat));
                true
            }
            None => false,
        }
    }

    // ========================================================================
    // Errors
    // ========================================================================

    pub fn set_error(&mut self, slot: ErrorSlot, message: impl Into<String>) {
        self.errors.insert(slot, message.into());
    }

    pub fn clear_error(&mut self, slot: ErrorSlot) {
        self.errors.remove(&slot);
    }

    pub fn error(&self, slot: ErrorSlot) -> Option<&str> {
        self.errors.get(&slot).map(String::as_str)
    }

    /// The one-line error shown over the map, if any.
    pub fn error_banner(&self) -> Option<&str> {
        self.errors.values().next().map(String::as_str)
    }

    // ========================================================================
    // State
    // ========================================================================

    pub fn leases(&self) -> &VectorOverlay {
        &self.leases
    }

    pub fn cages(&self) -> &VectorOverlay {
        &self.cages
    }

    pub fn raster(&self, kind: RasterKind) -> &RasterOverlay {
        match kind {
            RasterKind::Parameter => &self.parameter,
            RasterKind::TrueColor => &self.true_color,
        }
    }

    pub fn selection(&self) -> Option<&SelectionKey> {
        self.selection.current()
    }

    pub fn tooltip(&self) -> &TooltipState {
        &self.tooltip
    }

    pub fn legend(&self) -> &LegendPanel {
        &self.legend
    }

    pub fn controls(&self) -> &LayerControls {
        &self.controls
    }

    pub fn cursor(&self) -> Cursor {
        if self.cages.is_visible() && self.cages.hovered().is_some() {
            Cursor::Pointer
        } else {
            Cursor::Default
        }
    }

    /// Attached layers, bottom first.
    pub fn layer_stack(&self) -> Vec<Layer> {
        self.view
            .surface()
            .map(|s| s.layers_by_z().into_iter().cloned().collect())
            .unwrap_or_default()
    }

    pub fn snapshot(&self) -> MapSnapshot {
        let (center, zoom) = match self.view.surface() {
            Some(s) => (s.viewport().center, s.viewport().zoom),
            None => (self.options.center, self.options.zoom),
        };
        MapSnapshot {
            mounted: self.is_mounted(),
            center,
            zoom,
            layers: self.layer_stack(),
            lease_styles: self.leases.styles().to_vec(),
            cage_styles: self.cages.styles().to_vec(),
            selection: self.selection.current().cloned(),
            tooltip: self.tooltip.clone(),
            legend: self.legend.spec().clone(),
            legend_caption: self.legend.caption().map(DateCaption::text),
            legend_visible: self.legend.is_visible(),
            controls: self.controls.clone(),
            cursor: self.cursor(),
            error: self.error_banner().map(str::to_string),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::layer::LayerKind;

    fn url(name: &str) -> TileUrlTemplate {
        TileUrlTemplate::parse(format!("https://tiles.test/{}/{{z}}/{{x}}/{{y}}", name)).unwrap()
    }

    fn update(parameter: Option<&str>, rgb: Option<&str>) -> TileUpdate {
        TileUpdate {
            parameter: Parameter::Chlorophyll,
            parameter_url: parameter.map(url),
            legend_min: Some(0.0),
            legend_max: Some(2.0),
            true_color_url: rgb.map(url),
            caption: None,
        }
    }

    #[test]
    fn test_tiles_before_mount_attach_on_mount() {
        let mut map = DashboardMap::new(MapOptions::default());
        map.apply_tiles(update(Some("chl"), Some("rgb")));
        assert!(map.layer_stack().is_empty());

        assert!(map.mount(RenderTarget::new("map", 800, 600)));
        let kinds: Vec<LayerKind> = map.layer_stack().iter().map(|l| l.kind).collect();
        assert_eq!(
            kinds,
            vec![
                LayerKind::Base,
                LayerKind::Raster(RasterKind::TrueColor),
                LayerKind::Vector(VectorKind::Leases),
                LayerKind::Raster(RasterKind::Parameter),
                LayerKind::Vector(VectorKind::Cages),
            ]
        );
    }

    #[test]
    fn test_missing_parameter_tiles_show_no_data() {
        let mut map = DashboardMap::new(MapOptions::default());
        map.mount(RenderTarget::new("map", 800, 600));
        map.apply_tiles(update(None, Some("rgb")));
        assert!(map.legend().spec().no_data);
        assert!(!map.controls().toggle(ControlId::WaterQuality).enabled);
        assert!(map.controls().toggle(ControlId::TrueColor).enabled);
        assert_eq!(map.toggle_control(ControlId::WaterQuality), None);
    }

    #[test]
    fn test_error_banner_is_first_slot() {
        let mut map = DashboardMap::new(MapOptions::default());
        map.set_error(ErrorSlot::Cages, "Failed to load cages.");
        map.set_error(ErrorSlot::Tiles, "Failed to load map tiles.");
        assert_eq!(map.error_banner(), Some("Failed to load map tiles."));
        map.clear_error(ErrorSlot::Tiles);
        assert_eq!(map.error_banner(), Some("Failed to load cages."));
    }

    #[test]
    fn test_tile_update_keeps_dates_error() {
        let mut map = DashboardMap::new(MapOptions::default());
        map.mount(RenderTarget::new("map", 800, 600));
        map.set_error(ErrorSlot::Tiles, "Failed to load map tiles.");
        map.set_error(ErrorSlot::Dates, "The request timed out.");
        map.apply_tiles(update(Some("wq"), Some("rgb")));
        assert_eq!(map.error(ErrorSlot::Tiles), None);
        assert_eq!(map.error_banner(), Some("The request timed out."));
    }
}
