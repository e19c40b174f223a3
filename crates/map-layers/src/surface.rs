//! Map surface lifecycle.
//!
//! [`MapView`] owns at most one [`MapSurface`]. Mounting constructs it once
//! against a render target; unmounting detaches the target, drops every
//! registered listener and disconnects the resize observer so nothing keeps
//! rendering into a removed container.

use baysense_common::tile::OSM_TILE_URL;
use baysense_common::{MapCoordinate, Viewport};
use serde::Serialize;
use std::collections::BTreeMap;
use tracing::{debug, info, warn};

use crate::layer::{Layer, LayerId, LayerKind, Z_BASE};

/// The container the map renders into.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RenderTarget {
    pub id: String,
    pub width: u32,
    pub height: u32,
}

impl RenderTarget {
    pub fn new(id: impl Into<String>, width: u32, height: u32) -> Self {
        Self {
            id: id.into(),
            width,
            height,
        }
    }
}

/// Initial view of a freshly mounted map.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct MapOptions {
    pub center: MapCoordinate,
    pub zoom: f64,
}

impl Default for MapOptions {
    fn default() -> Self {
        Self {
            center: MapCoordinate::new(121.3301436972315, 14.078182532529903),
            zoom: 16.7,
        }
    }
}

/// Map controls drawn over the surface.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Control {
    Zoom,
    Rotate,
    Attribution { collapsible: bool },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ListenerType {
    PointerMove,
    Click,
}

/// Handle returned by [`MapSurface::on`], used to unregister.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ListenerKey(u64);

#[derive(Debug, Clone)]
struct Listener {
    kind: ListenerType,
    owner: String,
}

/// Tracks the container box and pushes size changes into the viewport.
#[derive(Debug, Clone, Default)]
struct ResizeObserver {
    observing: bool,
    last_box: Option<(u32, u32)>,
    size_updates: u64,
}

/// The rendering target state: viewport, layer stack and listeners.
#[derive(Debug)]
pub struct MapSurface {
    target: Option<RenderTarget>,
    viewport: Viewport,
    layers: Vec<Layer>,
    controls: Vec<Control>,
    listeners: BTreeMap<ListenerKey, Listener>,
    resize: ResizeObserver,
    next_listener: u64,
    next_layer: u64,
}

impl MapSurface {
    fn new(target: RenderTarget, options: &MapOptions) -> Self {
        let viewport = Viewport::new(options.center, options.zoom, target.width, target.height);
        let mut surface = Self {
            resize: ResizeObserver {
                observing: true,
                last_box: Some((target.width, target.height)),
                size_updates: 0,
            },
            target: Some(target),
            viewport,
            layers: Vec::new(),
            controls: vec![
                Control::Zoom,
                Control::Rotate,
                Control::Attribution { collapsible: true },
            ],
            listeners: BTreeMap::new(),
            next_listener: 0,
            next_layer: 0,
        };
        surface.add_layer(LayerKind::Base, Some(OSM_TILE_URL.to_string()), true, Z_BASE);
        surface
    }

    pub fn target(&self) -> Option<&RenderTarget> {
        self.target.as_ref()
    }

    /// Whether the surface is still bound to a container.
    pub fn is_rendering(&self) -> bool {
        self.target.is_some()
    }

    pub fn viewport(&self) -> &Viewport {
        &self.viewport
    }

    pub fn controls(&self) -> &[Control] {
        &self.controls
    }

    pub fn set_center(&mut self, center: MapCoordinate) {
        self.viewport.center = center;
    }

    pub fn set_zoom(&mut self, zoom: f64) {
        self.viewport.zoom = zoom.clamp(Viewport::MIN_ZOOM, Viewport::MAX_ZOOM);
    }

    // ========================================================================
    // Layers
    // ========================================================================

    pub fn add_layer(
        &mut self,
        kind: LayerKind,
        source: Option<String>,
        visible: bool,
        z_index: i32,
    ) -> LayerId {
        self.next_layer += 1;
        let name = match kind {
            LayerKind::Base => "base",
            LayerKind::Raster(k) => k.name(),
            LayerKind::Vector(k) => k.name(),
        };
        let id = LayerId::new(name, self.next_layer);
        debug!(layer = %id, z = z_index, visible = visible, "Adding layer");
        self.layers.push(Layer {
            id: id.clone(),
            kind,
            source,
            visible,
            z_index,
        });
        id
    }

    pub fn remove_layer(&mut self, id: &LayerId) -> Option<Layer> {
        let idx = self.layers.iter().position(|l| &l.id == id)?;
        debug!(layer = %id, "Removing layer");
        Some(self.layers.remove(idx))
    }

    /// Returns false if no such layer is attached.
    pub fn set_layer_visible(&mut self, id: &LayerId, visible: bool) -> bool {
        match self.layers.iter_mut().find(|l| &l.id == id) {
            Some(layer) => {
                layer.visible = visible;
                true
            }
            None => false,
        }
    }

    pub fn layer(&self, id: &LayerId) -> Option<&Layer> {
        self.layers.iter().find(|l| &l.id == id)
    }

    pub fn layers(&self) -> &[Layer] {
        &self.layers
    }

    /// Layers in draw order, bottom first. Equal z keeps insertion order.
    pub fn layers_by_z(&self) -> Vec<&Layer> {
        let mut sorted: Vec<&Layer> = self.layers.iter().collect();
        sorted.sort_by_key(|l| l.z_index);
        sorted
    }

    // ========================================================================
    // Listeners
    // ========================================================================

    pub fn on(&mut self, kind: ListenerType, owner: &str) -> ListenerKey {
        self.next_listener += 1;
        let key = ListenerKey(self.next_listener);
        self.listeners.insert(
            key,
            Listener {
                kind,
                owner: owner.to_string(),
            },
        );
        key
    }

    pub fn un(&mut self, key: ListenerKey) -> bool {
        self.listeners.remove(&key).is_some()
    }

    pub fn has_listener(&self, kind: ListenerType, owner: &str) -> bool {
        self.listeners
            .values()
            .any(|l| l.kind == kind && l.owner == owner)
    }

    pub fn listener_count(&self) -> usize {
        self.listeners.len()
    }

    // ========================================================================
    // Resize observation
    // ========================================================================

    /// Report the container's current box. Returns true when the viewport
    /// size was recalculated.
    pub fn observe_resize(&mut self, width: u32, height: u32) -> bool {
        if !self.resize.observing || self.resize.last_box == Some((width, height)) {
            return false;
        }
        self.resize.last_box = Some((width, height));
        self.resize.size_updates += 1;
        self.viewport.width = width;
        self.viewport.height = height;
        if let Some(target) = self.target.as_mut() {
            target.width = width;
            target.height = height;
        }
        debug!(width = width, height = height, "Map size updated");
        true
    }

    pub fn size_updates(&self) -> u64 {
        self.resize.size_updates
    }

    pub fn is_observing_resize(&self) -> bool {
        self.resize.observing
    }

    fn detach(&mut self) {
        self.target = None;
        self.listeners.clear();
        self.resize.observing = false;
    }
}

/// Owner of the map surface for one mounted dashboard view.
#[derive(Debug, Default)]
pub struct MapView {
    surface: Option<MapSurface>,
}

impl MapView {
    pub fn new() -> Self {
        Self::default()
    }

    /// Construct the surface once and hand it to `on_ready`.
    ///
    /// Returns false without doing anything when a surface already exists or
    /// the target has no area.
    pub fn mount<F>(&mut self, target: RenderTarget, options: &MapOptions, on_ready: F) -> bool
    where
        F: FnOnce(&mut MapSurface),
    {
        if self.surface.is_some() {
            debug!(target = %target.id, "Map already constructed, ignoring mount");
            return false;
        }
        if target.width == 0 || target.height == 0 {
            warn!(target = %target.id, "Cannot mount map into an empty container");
            return false;
        }
        info!(
            target = %target.id,
            width = target.width,
            height = target.height,
            zoom = options.zoom,
            "Constructing map"
        );
        let surface = self.surface.insert(MapSurface::new(target, options));
        on_ready(surface);
        true
    }

    /// Detach and drop the surface, returning it in its detached state.
    pub fn unmount(&mut self) -> Option<MapSurface> {
        let mut surface = self.surface.take()?;
        surface.detach();
        info!("Map unmounted");
        Some(surface)
    }

    pub fn is_mounted(&self) -> bool {
        self.surface.is_some()
    }

    pub fn surface(&self) -> Option<&MapSurface> {
        self.surface.as_ref()
    }

    pub fn surface_mut(&mut self) -> Option<&mut MapSurface> {
        self.surface.as_mut()
    }
}
