//! Gradient legend for raster overlays.
//!
//! [`legend`] is total over its input: any range that cannot be divided into
//! ticks yields the fixed "No Data" legend instead of an error.

use serde::Serialize;

use crate::{Parameter, Rgba};

/// Number of ticks drawn under the gradient bar.
pub const DEFAULT_TICKS: usize = 5;

/// Title shown when the overlay reported no usable range.
pub const NO_DATA_TITLE: &str = "No Data";

const FALLBACK_MIN: f64 = -1.0;
const FALLBACK_MAX: f64 = 1.0;

/// Everything needed to draw a gradient legend.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct LegendSpec {
    pub title: String,
    pub unit: String,
    /// Tick labels, ascending, two decimals.
    pub ticks: Vec<String>,
    /// Tick values the labels were formatted from.
    pub values: Vec<f64>,
    pub no_data: bool,
}

impl LegendSpec {
    pub fn min(&self) -> Option<f64> {
        self.values.first().copied()
    }

    pub fn max(&self) -> Option<f64> {
        self.values.last().copied()
    }
}

/// Compute evenly spaced legend ticks for `min..=max`.
///
/// The last tick is `max` itself rather than `min + (count - 1) * step`, so
/// rounding never drifts the top label.
pub fn legend(min: Option<f64>, max: Option<f64>, count: usize) -> LegendSpec {
    match valid_range(min, max) {
        Some((min, max)) => LegendSpec {
            title: "Value".to_string(),
            unit: String::new(),
            ..build_ticks(min, max, count.max(2))
        },
        None => no_data(),
    }
}

/// Legend for a parameter overlay, titled with the parameter's label and unit.
pub fn legend_for(parameter: Parameter, min: Option<f64>, max: Option<f64>) -> LegendSpec {
    match valid_range(min, max) {
        Some((min, max)) => LegendSpec {
            title: parameter.label().to_string(),
            unit: parameter.unit().to_string(),
            ..build_ticks(min, max, DEFAULT_TICKS)
        },
        None => no_data(),
    }
}

fn valid_range(min: Option<f64>, max: Option<f64>) -> Option<(f64, f64)> {
    let (min, max) = (min?, max?);
    if !min.is_finite() || !max.is_finite() || min >= max {
        return None;
    }
    Some((min, max))
}

fn no_data() -> LegendSpec {
    LegendSpec {
        title: NO_DATA_TITLE.to_string(),
        no_data: true,
        ..build_ticks(FALLBACK_MIN, FALLBACK_MAX, DEFAULT_TICKS)
    }
}

fn build_ticks(min: f64, max: f64, count: usize) -> LegendSpec {
    let n = (count - 1) as f64;
    let span = max - min;
    let values: Vec<f64> = (0..count)
        .map(|i| {
            if i == count - 1 {
                max
            } else if span.is_finite() {
                min + i as f64 * (span / n)
            } else {
                // span overflows f64; blend the endpoints instead
                let t = i as f64 / n;
                min * (1.0 - t) + max * t
            }
        })
        .collect();
    LegendSpec {
        title: String::new(),
        unit: String::new(),
        ticks: values.iter().map(|v| format_tick(*v)).collect(),
        values,
        no_data: false,
    }
}

/// Two-decimal tick label; negative zero prints as "0.00".
pub fn format_tick(value: f64) -> String {
    let label = format!("{:.2}", value);
    if label == "-0.00" {
        "0.00".to_string()
    } else {
        label
    }
}

/// Multi-stop colour ramp drawn as the legend bar.
#[derive(Debug, Clone, PartialEq)]
pub struct LegendGradient {
    /// `(position, colour)` pairs with positions ascending in `0.0..=1.0`.
    stops: Vec<(f64, Rgba)>,
}

impl Default for LegendGradient {
    /// Blue, green, yellow, red: the palette used by the backend tiles.
    fn default() -> Self {
        Self::evenly_spaced(&[
            Rgba::rgb(0, 0, 255),
            Rgba::rgb(0, 128, 0),
            Rgba::rgb(255, 255, 0),
            Rgba::rgb(255, 0, 0),
        ])
    }
}

impl LegendGradient {
    pub fn evenly_spaced(colors: &[Rgba]) -> Self {
        let last = colors.len().saturating_sub(1).max(1) as f64;
        Self {
            stops: colors
                .iter()
                .enumerate()
                .map(|(i, c)| (i as f64 / last, *c))
                .collect(),
        }
    }

    pub fn stops(&self) -> &[(f64, Rgba)] {
        &self.stops
    }

    /// Colour at relative position `t`, clamped to the ramp ends.
    pub fn color_at(&self, t: f64) -> Option<Rgba> {
        let (first, last) = (self.stops.first()?, self.stops.last()?);
        if t.is_nan() || t <= first.0 {
            return Some(first.1);
        }
        if t >= last.0 {
            return Some(last.1);
        }
        self.stops.windows(2).find_map(|pair| {
            let ((lo, c_lo), (hi, c_hi)) = (pair[0], pair[1]);
            (t <= hi).then(|| c_lo.lerp(&c_hi, (t - lo) / (hi - lo)))
        })
    }

    /// Colour for a data value on the legend's scale.
    pub fn color_for_value(&self, legend: &LegendSpec, value: f64) -> Option<Rgba> {
        let (min, max) = (legend.min()?, legend.max()?);
        self.color_at((value - min) / (max - min))
    }

    /// CSS-style description of the bar, for renderers that take one.
    pub fn css(&self) -> String {
        let stops: Vec<String> = self
            .stops
            .iter()
            .map(|(pos, c)| format!("{} {}%", c.to_hex(), (pos * 100.0).round()))
            .collect();
        format!("linear-gradient(to right, {})", stops.join(", "))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_basic_ticks() {
        let spec = legend(Some(0.0), Some(10.0), 5);
        assert_eq!(spec.ticks, vec!["0.00", "2.50", "5.00", "7.50", "10.00"]);
        assert!(!spec.no_data);
    }

    #[test]
    fn test_negative_zero_label() {
        let spec = legend(Some(-1.0), Some(1.0), 5);
        assert_eq!(spec.ticks[2], "0.00");
        assert_eq!(format_tick(-0.001), "0.00");
    }

    #[test]
    fn test_count_below_two_is_raised() {
        let spec = legend(Some(1.0), Some(2.0), 1);
        assert_eq!(spec.ticks, vec!["1.00", "2.00"]);
    }

    #[test]
    fn test_parameter_title() {
        let spec = legend_for(Parameter::Turbidity, Some(0.5), Some(4.5));
        assert_eq!(spec.title, "Turbidity");
        assert_eq!(spec.unit, "NTU");
        assert_eq!(spec.ticks.first().map(String::as_str), Some("0.50"));
        assert_eq!(spec.ticks.last().map(String::as_str), Some("4.50"));

        let empty = legend_for(Parameter::Turbidity, None, Some(4.5));
        assert_eq!(empty.title, NO_DATA_TITLE);
        assert!(empty.unit.is_empty());
    }

    #[test]
    fn test_gradient_ends_and_midpoint() {
        let gradient = LegendGradient::default();
        assert_eq!(gradient.color_at(-1.0), Some(Rgba::rgb(0, 0, 255)));
        assert_eq!(gradient.color_at(2.0), Some(Rgba::rgb(255, 0, 0)));
        assert_eq!(gradient.color_at(1.0 / 3.0), Some(Rgba::rgb(0, 128, 0)));
        assert!(gradient.css().starts_with("linear-gradient(to right, #0000ff 0%"));
    }
}
