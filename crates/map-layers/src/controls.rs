//! The collapsible layer-toggle panel.

use serde::Serialize;
use tracing::debug;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ControlId {
    /// Water-quality parameter raster.
    WaterQuality,
    /// True-colour raster.
    TrueColor,
    LeaseAreas,
    Cages,
}

impl ControlId {
    pub const ALL: [ControlId; 4] = [
        ControlId::WaterQuality,
        ControlId::TrueColor,
        ControlId::LeaseAreas,
        ControlId::Cages,
    ];

    pub fn label(&self) -> &'static str {
        match self {
            ControlId::WaterQuality => "Water Quality",
            ControlId::TrueColor => "True Color",
            ControlId::LeaseAreas => "Lease Areas",
            ControlId::Cages => "Fish Cages",
        }
    }

    fn index(&self) -> usize {
        match self {
            ControlId::WaterQuality => 0,
            ControlId::TrueColor => 1,
            ControlId::LeaseAreas => 2,
            ControlId::Cages => 3,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct Toggle {
    pub on: bool,
    /// Disabled toggles cannot be flipped.
    pub enabled: bool,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct LayerControls {
    toggles: [Toggle; 4],
    open: bool,
}

impl Default for LayerControls {
    fn default() -> Self {
        let on = Toggle {
            on: true,
            enabled: true,
        };
        Self {
            toggles: [on; 4],
            open: false,
        }
    }
}

impl LayerControls {
    pub fn toggle(&self, id: ControlId) -> Toggle {
        self.toggles[id.index()]
    }

    /// Whether the layer should be drawn: switched on and usable.
    pub fn checked(&self, id: ControlId) -> bool {
        let t = self.toggle(id);
        t.on && t.enabled
    }

    /// Flip a toggle. Returns the new state, or `None` when disabled.
    pub fn flip(&mut self, id: ControlId) -> Option<bool> {
        let toggle = &mut self.toggles[id.index()];
        if !toggle.enabled {
            debug!(control = id.label(), "Ignoring toggle of disabled control");
            return None;
        }
        toggle.on = !toggle.on;
        Some(toggle.on)
    }

    pub fn set_on(&mut self, id: ControlId, on: bool) {
        self.toggles[id.index()].on = on;
    }

    pub fn set_enabled(&mut self, id: ControlId, enabled: bool) {
        self.toggles[id.index()].enabled = enabled;
    }

    pub fn is_open(&self) -> bool {
        self.open
    }

    pub fn toggle_open(&mut self) -> bool {
        self.open = !self.open;
        self.open
    }
}
