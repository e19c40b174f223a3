//! Gradient legend shown over the map for the parameter overlay.

use baysense_common::legend::{legend, legend_for, DEFAULT_TICKS};
use baysense_common::time::format_api_date;
use baysense_common::{DateRange, LegendGradient, LegendSpec, Parameter};
use chrono::NaiveDate;
use serde::Serialize;

/// Which imagery the legend describes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(tag = "mode", rename_all = "snake_case")]
pub enum DateCaption {
    Composite(DateRange),
    Single { date: NaiveDate },
}

impl DateCaption {
    pub fn text(&self) -> String {
        match self {
            DateCaption::Composite(range) => format!("Composite: {}", range.caption()),
            DateCaption::Single { date } => format!("Date: {}", format_api_date(*date)),
        }
    }
}

#[derive(Debug, Clone)]
pub struct LegendPanel {
    spec: LegendSpec,
    gradient: LegendGradient,
    caption: Option<DateCaption>,
    visible: bool,
}

impl Default for LegendPanel {
    fn default() -> Self {
        Self {
            spec: legend(None, None, DEFAULT_TICKS),
            gradient: LegendGradient::default(),
            caption: None,
            visible: true,
        }
    }
}

impl LegendPanel {
    /// Recompute the ticks for a new tile range.
    pub fn update(
        &mut self,
        parameter: Parameter,
        min: Option<f64>,
        max: Option<f64>,
        caption: Option<DateCaption>,
    ) {
        self.spec = legend_for(parameter, min, max);
        self.caption = caption;
    }

    /// Back to the "No Data" placeholder.
    pub fn reset(&mut self) {
        self.spec = legend(None, None, DEFAULT_TICKS);
        self.caption = None;
    }

    pub fn spec(&self) -> &LegendSpec {
        &self.spec
    }

    pub fn gradient(&self) -> &LegendGradient {
        &self.gradient
    }

    pub fn caption(&self) -> Option<&DateCaption> {
        self.caption.as_ref()
    }

    pub fn is_visible(&self) -> bool {
        self.visible
    }

    pub fn toggle_visible(&mut self) -> bool {
        self.visible = !self.visible;
        self.visible
    }

    /// Header line, e.g. "Chlorophyll-a (µg/L)".
    pub fn heading(&self) -> String {
        if self.spec.unit.is_empty() {
            self.spec.title.clone()
        } else {
            format!("{} ({})", self.spec.title, self.spec.unit)
        }
    }
}
