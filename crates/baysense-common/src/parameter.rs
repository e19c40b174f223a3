//! Water-quality parameters shown on the map and in the chart.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::DashboardError;

/// A monitored water-quality indicator.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Parameter {
    #[default]
    Chlorophyll,
    Turbidity,
    Tss,
}

impl Parameter {
    pub const ALL: [Parameter; 3] = [Parameter::Chlorophyll, Parameter::Turbidity, Parameter::Tss];

    /// Value sent to the backend in the `parameter` query field.
    pub fn key(&self) -> &'static str {
        match self {
            Parameter::Chlorophyll => "chlorophyll",
            Parameter::Turbidity => "turbidity",
            Parameter::Tss => "tss",
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            Parameter::Chlorophyll => "Chlorophyll-a",
            Parameter::Turbidity => "Turbidity",
            Parameter::Tss => "Suspended Sediments",
        }
    }

    pub fn unit(&self) -> &'static str {
        match self {
            Parameter::Chlorophyll => "µg/L",
            Parameter::Turbidity => "NTU",
            Parameter::Tss => "mg/L",
        }
    }
}

impl fmt::Display for Parameter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.key())
    }
}

impl FromStr for Parameter {
    type Err = DashboardError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "chlorophyll" | "chlorophyll-a" | "chl" => Ok(Parameter::Chlorophyll),
            "turbidity" => Ok(Parameter::Turbidity),
            "tss" | "suspended sediments" => Ok(Parameter::Tss),
            other => Err(DashboardError::invalid(
                "parameter",
                format!("unknown parameter '{}'", other),
            )),
        }
    }
}
