//! Feature styling for the vector overlays.
//!
//! Styles are a pure function of a feature's resolved status and its current
//! interaction state. Nothing here is cached per feature; overlays call
//! [`lease_style`] / [`cage_style`] for every feature on each style pass.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::{DashboardError, LeaseStatus};

/// An RGBA colour with a floating-point alpha in `0.0..=1.0`.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Rgba {
    pub r: u8,
    pub g: u8,
    pub b: u8,
    pub a: f64,
}

impl Rgba {
    pub const fn rgb(r: u8, g: u8, b: u8) -> Self {
        Self { r, g, b, a: 1.0 }
    }

    pub const fn rgba(r: u8, g: u8, b: u8, a: f64) -> Self {
        Self { r, g, b, a }
    }

    pub fn with_alpha(self, a: f64) -> Self {
        Self {
            a: a.clamp(0.0, 1.0),
            ..self
        }
    }

    /// Parse "#RRGGBB" or "#RRGGBBAA".
    pub fn from_hex(s: &str) -> Result<Self, DashboardError> {
        let hex = s.trim().trim_start_matches('#');
        let channel = |range: std::ops::Range<usize>| -> Result<u8, DashboardError> {
            hex.get(range)
                .and_then(|h| u8::from_str_radix(h, 16).ok())
                .ok_or_else(|| DashboardError::invalid("color", format!("bad hex colour '{}'", s)))
        };
        match hex.len() {
            6 => Ok(Self::rgb(channel(0..2)?, channel(2..4)?, channel(4..6)?)),
            8 => Ok(Self::rgba(
                channel(0..2)?,
                channel(2..4)?,
                channel(4..6)?,
                channel(6..8)? as f64 / 255.0,
            )),
            _ => Err(DashboardError::invalid(
                "color",
                format!("bad hex colour '{}'", s),
            )),
        }
    }

    pub fn to_hex(&self) -> String {
        format!("#{:02x}{:02x}{:02x}", self.r, self.g, self.b)
    }

    /// Linear interpolation between two colours.
    pub fn lerp(&self, other: &Rgba, t: f64) -> Rgba {
        let t = t.clamp(0.0, 1.0);
        let lerp_u8 = |a: u8, b: u8| -> u8 { ((a as f64) * (1.0 - t) + (b as f64) * t).round() as u8 };
        Rgba {
            r: lerp_u8(self.r, other.r),
            g: lerp_u8(self.g, other.g),
            b: lerp_u8(self.b, other.b),
            a: self.a * (1.0 - t) + other.a * t,
        }
    }
}

impl fmt::Display for Rgba {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.a >= 1.0 {
            write!(f, "rgb({}, {}, {})", self.r, self.g, self.b)
        } else {
            write!(f, "rgba({}, {}, {}, {})", self.r, self.g, self.b, self.a)
        }
    }
}

impl FromStr for Rgba {
    type Err = DashboardError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Rgba::from_hex(s)
    }
}

/// Interaction state of a single feature.
///
/// Ordered by priority: a selected feature is drawn as selected even while
/// hovered.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Default, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum InteractionState {
    #[default]
    Default,
    Hovered,
    Selected,
}

impl InteractionState {
    pub fn resolve(is_selected: bool, is_hovered: bool) -> Self {
        if is_selected {
            InteractionState::Selected
        } else if is_hovered {
            InteractionState::Hovered
        } else {
            InteractionState::Default
        }
    }
}

/// Fully resolved drawing style for one feature.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FeatureStyle {
    pub fill: Rgba,
    pub stroke: Rgba,
    pub stroke_width: f64,
    /// Dash pattern in pixels; empty for a solid line.
    pub line_dash: Vec<f64>,
    pub z_index: i32,
    /// Icon scale for point features; 1.0 for polygons.
    pub scale: f64,
}

pub const VALID_COLOR: Rgba = Rgba::rgb(52, 152, 219);
pub const EXPIRED_COLOR: Rgba = Rgba::rgb(231, 76, 60);
pub const FOR_RENEWAL_COLOR: Rgba = Rgba::rgb(230, 126, 34);
pub const UNKNOWN_COLOR: Rgba = Rgba::rgb(149, 165, 166);

pub const SELECTED_FILL: Rgba = Rgba::rgba(255, 255, 0, 0.5);
pub const SELECTED_STROKE: Rgba = Rgba::rgb(255, 215, 0);

pub const PIN_COLOR: Rgba = Rgba::rgb(0x6c, 0x2f, 0xa8);
pub const PIN_ACTIVE_COLOR: Rgba = Rgba::rgb(0x00, 0x7b, 0xff);

pub fn status_color(status: LeaseStatus) -> Rgba {
    match status {
        LeaseStatus::Valid => VALID_COLOR,
        LeaseStatus::Expired => EXPIRED_COLOR,
        LeaseStatus::ForRenewal => FOR_RENEWAL_COLOR,
        LeaseStatus::Unknown => UNKNOWN_COLOR,
    }
}

/// Style of a lease-area polygon.
pub fn lease_style(status: LeaseStatus, state: InteractionState) -> FeatureStyle {
    let base = status_color(status);
    match state {
        InteractionState::Selected => FeatureStyle {
            fill: SELECTED_FILL,
            stroke: SELECTED_STROKE,
            stroke_width: 4.0,
            line_dash: Vec::new(),
            z_index: 100,
            scale: 1.0,
        },
        InteractionState::Hovered => FeatureStyle {
            fill: base.with_alpha(0.4),
            stroke: base,
            stroke_width: 4.0,
            line_dash: Vec::new(),
            z_index: 1,
            scale: 1.0,
        },
        InteractionState::Default => FeatureStyle {
            fill: base.with_alpha(0.2),
            stroke: base,
            stroke_width: 2.0,
            line_dash: vec![5.0, 5.0],
            z_index: 0,
            scale: 1.0,
        },
    }
}

/// Style of a cage pin.
pub fn cage_style(state: InteractionState) -> FeatureStyle {
    let (color, scale, z_index) = match state {
        InteractionState::Selected => (PIN_ACTIVE_COLOR, 1.25, 100),
        InteractionState::Hovered => (PIN_ACTIVE_COLOR, 1.1, 1),
        InteractionState::Default => (PIN_COLOR, 0.9, 0),
    };
    FeatureStyle {
        fill: color,
        stroke: Rgba::rgb(255, 255, 255),
        stroke_width: 1.0,
        line_dash: Vec::new(),
        z_index,
        scale,
    }
}
