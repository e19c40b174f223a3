//! Interactive map and layer management for the BAYSENSE dashboard.
//!
//! The map is modelled headlessly: a [`MapSurface`] holds the viewport and
//! an ordered layer stack, overlays attach themselves to it, and pointer
//! events are hit-tested against feature geometry projected to screen
//! pixels. A renderer draws whatever [`DashboardMap::snapshot`] describes.

pub mod controls;
pub mod layer;
pub mod legend_panel;
pub mod map;
pub mod raster;
pub mod selection;
pub mod surface;
pub mod tooltip;
pub mod vector;

pub use controls::{ControlId, LayerControls};
pub use layer::{Layer, LayerId, LayerKind, RasterKind, VectorKind};
pub use legend_panel::{DateCaption, LegendPanel};
pub use map::{Cursor, DashboardMap, ErrorSlot, MapEvent, MapOutput, MapSnapshot, TileUpdate};
pub use raster::{RasterOverlay, RasterSync};
pub use selection::{Selection, SelectionChange, SelectionKey};
pub use surface::{Control, ListenerKey, ListenerType, MapOptions, MapSurface, MapView, RenderTarget};
pub use tooltip::{TooltipContent, TooltipRow, TooltipState};
pub use vector::{HoverChange, VectorOverlay};
