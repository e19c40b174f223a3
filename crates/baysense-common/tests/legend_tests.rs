//! Tests for legend tick computation.

use baysense_common::legend::{format_tick, NO_DATA_TITLE};
use baysense_common::{legend, legend_for, LegendGradient, Parameter};

const FALLBACK: [&str; 5] = ["-1.00", "-0.50", "0.00", "0.50", "1.00"];

// ============================================================================
// Valid ranges
// ============================================================================

#[test]
fn test_ticks_ascending_first_and_last_exact() {
    let ranges = [
        (0.0, 1.0),
        (-3.2, 7.9),
        (0.013, 0.0271),
        (12.5, 980.125),
        (-100.0, -99.5),
        (1e-3, 2e-3),
    ];
    for (min, max) in ranges {
        let spec = legend(Some(min), Some(max), 5);
        assert_eq!(spec.ticks.len(), 5);
        assert_eq!(spec.ticks[0], format_tick(min));
        assert_eq!(spec.ticks[4], format_tick(max));
        assert!(
            spec.values.windows(2).all(|w| w[0] < w[1]),
            "values not ascending for {}..{}",
            min,
            max
        );
        assert!(!spec.no_data);
    }
}

#[test]
fn test_other_tick_counts() {
    let spec = legend(Some(0.0), Some(9.0), 4);
    assert_eq!(spec.ticks, vec!["0.00", "3.00", "6.00", "9.00"]);

    let spec = legend(Some(0.0), Some(1.0), 11);
    assert_eq!(spec.ticks.len(), 11);
    assert_eq!(spec.ticks[5], "0.50");
}

#[test]
fn test_range_wider_than_f64_span() {
    let spec = legend(Some(-f64::MAX), Some(f64::MAX), 5);
    assert!(!spec.no_data);
    assert!(spec.values.iter().all(|v| v.is_finite()));
    assert!(spec.values.windows(2).all(|w| w[0] < w[1]));
    assert_eq!(spec.ticks[0], format_tick(-f64::MAX));
    assert_eq!(spec.ticks[2], "0.00");
    assert_eq!(spec.ticks[4], format_tick(f64::MAX));

    let spec = legend(Some(-1e308), Some(1e308), 3);
    assert_eq!(spec.values, vec![-1e308, 0.0, 1e308]);
}

#[test]
fn test_chlorophyll_legend_uses_label_and_unit() {
    let spec = legend_for(Parameter::Chlorophyll, Some(0.5), Some(24.5));
    assert_eq!(spec.title, "Chlorophyll-a");
    assert_eq!(spec.unit, "µg/L");
    assert_eq!(spec.ticks, vec!["0.50", "6.50", "12.50", "18.50", "24.50"]);
}

// ============================================================================
// Invalid ranges fall back to "No Data"
// ============================================================================

#[test]
fn test_invalid_inputs_use_fallback() {
    let cases = [
        (None, Some(1.0)),
        (Some(1.0), None),
        (None, None),
        (Some(f64::NAN), Some(1.0)),
        (Some(0.0), Some(f64::NAN)),
        (Some(2.0), Some(2.0)),
        (Some(5.0), Some(1.0)),
        (Some(f64::NEG_INFINITY), Some(1.0)),
    ];
    for (min, max) in cases {
        let spec = legend(min, max, 5);
        assert_eq!(spec.ticks, FALLBACK, "case {:?}..{:?}", min, max);
        assert_eq!(spec.title, NO_DATA_TITLE);
        assert!(spec.no_data);
    }
}

#[test]
fn test_fallback_ignores_requested_count() {
    let spec = legend(None, None, 9);
    assert_eq!(spec.ticks.len(), 5);
}

// ============================================================================
// Gradient bar
// ============================================================================

#[test]
fn test_color_for_value_clamps_outside_range() {
    let gradient = LegendGradient::default();
    let spec = legend(Some(0.0), Some(10.0), 5);
    assert_eq!(
        gradient.color_for_value(&spec, -5.0),
        gradient.color_at(0.0)
    );
    assert_eq!(
        gradient.color_for_value(&spec, 50.0),
        gradient.color_at(1.0)
    );
}
