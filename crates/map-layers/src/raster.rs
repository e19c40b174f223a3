//! Raster tile overlays (parameter heat map, true-colour composite).
//!
//! Tile sources are never swapped in place: a new URL tears the old layer
//! down and attaches a fresh one at the same z-index.

use baysense_common::TileUrlTemplate;
use tracing::{debug, info};

use crate::layer::{LayerId, LayerKind, RasterKind};
use crate::surface::MapSurface;

/// What [`RasterOverlay::sync`] did to the surface.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RasterSync {
    Unchanged,
    Attached(LayerId),
    Replaced { old: LayerId, new: LayerId },
    VisibilityChanged(bool),
    Detached(LayerId),
}

#[derive(Debug, Clone)]
pub struct RasterOverlay {
    kind: RasterKind,
    url: Option<TileUrlTemplate>,
    visible: bool,
    layer: Option<LayerId>,
}

impl RasterOverlay {
    pub fn new(kind: RasterKind) -> Self {
        Self {
            kind,
            url: None,
            visible: true,
            layer: None,
        }
    }

    pub fn kind(&self) -> RasterKind {
        self.kind
    }

    pub fn url(&self) -> Option<&TileUrlTemplate> {
        self.url.as_ref()
    }

    pub fn layer_id(&self) -> Option<&LayerId> {
        self.layer.as_ref()
    }

    /// The toggle control is only usable while a tile source exists.
    pub fn toggle_enabled(&self) -> bool {
        self.url.is_some()
    }

    /// Drawn only when there is a source and the user wants it shown.
    pub fn is_effectively_visible(&self) -> bool {
        self.url.is_some() && self.visible
    }

    /// Bring the surface in line with the desired source and visibility.
    pub fn sync(
        &mut self,
        surface: &mut MapSurface,
        url: Option<TileUrlTemplate>,
        visible: bool,
    ) -> RasterSync {
        self.visible = visible;

        // A layer id whose layer is gone (e.g. after a remount) is stale.
        if let Some(id) = &self.layer {
            if surface.layer(id).is_none() {
                self.layer = None;
            }
        }

        let result = match (&url, self.layer.take()) {
            (None, None) => RasterSync::Unchanged,
            (None, Some(old)) => {
                surface.remove_layer(&old);
                info!(overlay = self.kind.name(), layer = %old, "Tile source withdrawn, layer detached");
                RasterSync::Detached(old)
            }
            (Some(template), None) => {
                let id = self.attach(surface, template, visible);
                RasterSync::Attached(id)
            }
            (Some(template), Some(old)) if Some(template) == self.url.as_ref() => {
                let was_visible = surface.layer(&old).map(|l| l.visible).unwrap_or(visible);
                surface.set_layer_visible(&old, visible);
                self.layer = Some(old);
                if was_visible != visible {
                    RasterSync::VisibilityChanged(visible)
                } else {
                    RasterSync::Unchanged
                }
            }
            (Some(template), Some(old)) => {
                surface.remove_layer(&old);
                let new = self.attach(surface, template, visible);
                info!(overlay = self.kind.name(), old = %old, new = %new, "Tile source changed, layer replaced");
                RasterSync::Replaced { old, new }
            }
        };
        self.url = url;
        result
    }

    /// Change visibility only, keeping the current source.
    pub fn set_visible(&mut self, surface: &mut MapSurface, visible: bool) -> RasterSync {
        let url = self.url.clone();
        self.sync(surface, url, visible)
    }

    fn attach(&mut self, surface: &mut MapSurface, template: &TileUrlTemplate, visible: bool) -> LayerId {
        let id = surface.add_layer(
            LayerKind::Raster(self.kind),
            Some(template.as_str().to_string()),
            visible,
            self.kind.z_index(),
        );
        debug!(overlay = self.kind.name(), layer = %id, "Raster layer attached");
        self.layer = Some(id.clone());
        id
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::surface::{MapOptions, MapView, RenderTarget};

    fn mounted() -> MapView {
        let mut view = MapView::new();
        view.mount(RenderTarget::new("map", 800, 600), &MapOptions::default(), |_| {});
        view
    }

    fn url(name: &str) -> TileUrlTemplate {
        TileUrlTemplate::parse(format!("https://tiles.test/{}/{{z}}/{{x}}/{{y}}", name)).unwrap()
    }

    #[test]
    fn test_attach_replace_detach() {
        let mut view = mounted();
        let surface = view.surface_mut().unwrap();
        let mut overlay = RasterOverlay::new(RasterKind::Parameter);

        let first = match overlay.sync(surface, Some(url("a")), true) {
            RasterSync::Attached(id) => id,
            other => panic!("expected attach, got {:?}", other),
        };
        assert_eq!(overlay.sync(surface, Some(url("a")), true), RasterSync::Unchanged);

        match overlay.sync(surface, Some(url("b")), true) {
            RasterSync::Replaced { old, new } => {
                assert_eq!(old, first);
                assert_ne!(new, first);
            }
            other => panic!("expected replace, got {:?}", other),
        }
        // Base plus exactly one raster layer
        assert_eq!(surface.layers().len(), 2);

        assert!(matches!(overlay.sync(surface, None, true), RasterSync::Detached(_)));
        assert_eq!(surface.layers().len(), 1);
        assert!(!overlay.toggle_enabled());
    }

    #[test]
    fn test_visibility_without_source_never_attaches() {
        let mut view = mounted();
        let surface = view.surface_mut().unwrap();
        let mut overlay = RasterOverlay::new(RasterKind::TrueColor);
        assert_eq!(overlay.set_visible(surface, true), RasterSync::Unchanged);
        assert!(!overlay.is_effectively_visible());
        assert_eq!(surface.layers().len(), 1);
    }

    #[test]
    fn test_hide_keeps_layer() {
        let mut view = mounted();
        let surface = view.surface_mut().unwrap();
        let mut overlay = RasterOverlay::new(RasterKind::TrueColor);
        overlay.sync(surface, Some(url("rgb")), true);
        assert_eq!(
            overlay.set_visible(surface, false),
            RasterSync::VisibilityChanged(false)
        );
        let id = overlay.layer_id().cloned().unwrap();
        assert!(!surface.layer(&id).unwrap().visible);
        assert_eq!(surface.layer(&id).unwrap().z_index, 1);
    }
}
