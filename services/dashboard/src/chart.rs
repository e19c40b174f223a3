//! Parameter chart state: which series is shown, its samples and export.

use baysense_common::series::{chart_rows, csv_file_name, to_csv, ChartRow};
use baysense_common::{MapCoordinate, Parameter, SeriesPoint, SeriesStats};
use serde::Serialize;

/// Where the plotted series is sampled.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize)]
#[serde(tag = "source", rename_all = "snake_case")]
pub enum ChartSource {
    /// Mean over the whole bay.
    #[default]
    Bay,
    /// Values at one point, e.g. the selected lease area's midpoint.
    Point { at: MapCoordinate },
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CsvExport {
    pub file_name: String,
    pub content: String,
}

#[derive(Debug, Clone, Default, Serialize)]
pub struct ChartState {
    source: ChartSource,
    parameter: Parameter,
    points: Vec<SeriesPoint>,
    error: Option<String>,
}

impl ChartState {
    pub fn source(&self) -> ChartSource {
        self.source
    }

    /// Returns true if the source changed and the series needs a reload.
    pub fn set_source(&mut self, source: ChartSource) -> bool {
        if self.source == source {
            return false;
        }
        self.source = source;
        true
    }

    pub fn set_series(&mut self, parameter: Parameter, points: Vec<SeriesPoint>) {
        self.parameter = parameter;
        self.points = points;
        self.error = None;
    }

    /// A failed load empties the chart.
    pub fn set_error(&mut self, message: impl Into<String>) {
        self.points.clear();
        self.error = Some(message.into());
    }

    pub fn error(&self) -> Option<&str> {
        self.error.as_deref()
    }

    pub fn points(&self) -> &[SeriesPoint] {
        &self.points
    }

    pub fn rows(&self) -> Vec<ChartRow> {
        chart_rows(&self.points)
    }

    pub fn stats(&self) -> Option<SeriesStats> {
        SeriesStats::compute(&self.points)
    }

    /// CSV download of the plotted series; `None` when there is nothing to
    /// export.
    pub fn export(&self) -> Option<CsvExport> {
        if self.points.is_empty() {
            return None;
        }
        Some(CsvExport {
            file_name: csv_file_name(self.parameter.label()),
            content: to_csv(&self.points),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_export() {
        let mut chart = ChartState::default();
        assert_eq!(chart.export(), None);

        chart.set_series(
            Parameter::Turbidity,
            vec![SeriesPoint::new("2024-01-05", 1.2), SeriesPoint::new("2024-02-10", 3.0)],
        );
        let export = chart.export().unwrap();
        assert_eq!(export.file_name, "Turbidity_data.csv");
        assert_eq!(export.content, "Date,Value\n2024-01-05,1.2\n2024-02-10,3");
        assert_eq!(chart.rows()[0].display_value, "1.20");
    }

    #[test]
    fn test_error_clears_series() {
        let mut chart = ChartState::default();
        chart.set_series(Parameter::Tss, vec![SeriesPoint::new("2024-01-05", 7.0)]);
        chart.set_error("Could not reach the server.");
        assert!(chart.points().is_empty());
        assert_eq!(chart.stats(), None);
        assert_eq!(chart.error(), Some("Could not reach the server."));
    }

    #[test]
    fn test_source_change() {
        let mut chart = ChartState::default();
        assert!(!chart.set_source(ChartSource::Bay));
        let at = MapCoordinate::new(121.33, 14.078);
        assert!(chart.set_source(ChartSource::Point { at }));
        assert!(!chart.set_source(ChartSource::Point { at }));
    }
}
