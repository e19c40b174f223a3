//! Analysis panel: filter draft versus the filters the map is showing.
//!
//! Edits only touch the draft. [`AnalysisPanel::run`] commits it, which is
//! what triggers new requests. The overlay-date picker is part of the
//! draft and only meaningful in [`ImageMode::Single`].

use baysense_client::AnalysisQuery;
use baysense_common::time::{is_date_available, latest_available_date};
use baysense_common::{
    CloudCover, DashboardError, DashboardResult, DateBuckets, DateEvent, DateRange, Parameter,
};
use chrono::NaiveDate;
use map_layers::DateCaption;
use serde::{Deserialize, Serialize};
use tracing::{debug, info};

/// Whether the parameter overlay is a median composite or one scene.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ImageMode {
    #[default]
    Composite,
    Single,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AnalysisDraft {
    pub parameter: Parameter,
    pub start_date: NaiveDate,
    pub end_date: NaiveDate,
    pub cloud_cover: CloudCover,
    pub mode: ImageMode,
    pub overlay_date: Option<NaiveDate>,
}

/// Filters committed by the last run.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct AppliedQuery {
    pub query: AnalysisQuery,
    pub mode: ImageMode,
    /// Scene date in single mode. `None` there means "latest available".
    pub overlay_date: Option<NaiveDate>,
}

impl AppliedQuery {
    pub fn caption(&self) -> DateCaption {
        match (self.mode, self.overlay_date) {
            (ImageMode::Single, Some(date)) => DateCaption::Single { date },
            _ => DateCaption::Composite(self.query.range),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum PanelEvent {
    ParameterChanged(Parameter),
    StartDateChanged(NaiveDate),
    EndDateChanged(NaiveDate),
    CloudCoverChanged(u8),
    ModeChanged(ImageMode),
    /// Available dates for the applied filters arrived.
    DatesLoaded(Vec<String>),
    /// Year/month/day pick or prev/next step in the overlay-date picker.
    Picker(DateEvent),
    /// "Update Map Overlay": take the composed picker date.
    CommitPicker,
}

#[derive(Debug, Clone)]
pub struct AnalysisPanel {
    draft: AnalysisDraft,
    applied: AppliedQuery,
    available_dates: Vec<String>,
    picker: DateBuckets,
}

impl AnalysisPanel {
    /// Start with `query` both drafted and applied.
    pub fn new(query: AnalysisQuery, mode: ImageMode) -> Self {
        Self {
            draft: AnalysisDraft {
                parameter: query.parameter,
                start_date: query.range.start,
                end_date: query.range.end,
                cloud_cover: query.cloud_cover,
                mode,
                overlay_date: None,
            },
            applied: AppliedQuery {
                query,
                mode,
                overlay_date: None,
            },
            available_dates: Vec::new(),
            picker: DateBuckets::default(),
        }
    }

    pub fn draft(&self) -> &AnalysisDraft {
        &self.draft
    }

    pub fn applied(&self) -> &AppliedQuery {
        &self.applied
    }

    pub fn available_dates(&self) -> &[String] {
        &self.available_dates
    }

    pub fn picker(&self) -> &DateBuckets {
        &self.picker
    }

    /// The picker is disabled in composite mode.
    pub fn picker_enabled(&self) -> bool {
        self.draft.mode == ImageMode::Single
    }

    /// Apply one edit. An invalid cloud cover leaves the draft untouched.
    pub fn reduce(&mut self, event: PanelEvent) -> DashboardResult<()> {
        match event {
            PanelEvent::ParameterChanged(parameter) => self.draft.parameter = parameter,
            PanelEvent::StartDateChanged(date) => self.draft.start_date = date,
            PanelEvent::EndDateChanged(date) => self.draft.end_date = date,
            PanelEvent::CloudCoverChanged(percent) => {
                self.draft.cloud_cover = CloudCover::new(percent)?;
            }
            PanelEvent::ModeChanged(mode) => {
                self.draft.mode = mode;
                match mode {
                    ImageMode::Composite => self.set_draft_date(None),
                    ImageMode::Single => self.ensure_draft_date(),
                }
            }
            PanelEvent::DatesLoaded(dates) => self.set_available_dates(dates),
            PanelEvent::Picker(event) => {
                if !self.picker_enabled() {
                    debug!("Ignoring picker event in composite mode");
                    return Ok(());
                }
                let moves_date = matches!(
                    event,
                    DateEvent::Next | DateEvent::Prev | DateEvent::OverlayDateChanged(_)
                );
                self.picker.reduce(event);
                if moves_date {
                    self.draft.overlay_date = self.picker.overlay_date();
                }
            }
            PanelEvent::CommitPicker => {
                if self.picker_enabled() && self.picker.commit().is_some() {
                    self.draft.overlay_date = self.picker.overlay_date();
                }
            }
        }
        Ok(())
    }

    /// Replace the available dates, re-validating the single-mode date.
    pub fn set_available_dates(&mut self, dates: Vec<String>) {
        self.picker.reduce(DateEvent::DatesLoaded(dates.clone()));
        self.available_dates = dates;
        if self.draft.mode == ImageMode::Single {
            self.ensure_draft_date();
        }
    }

    /// Keep the single-mode date on an available scene, else the latest.
    fn ensure_draft_date(&mut self) {
        let current = self
            .draft
            .overlay_date
            .filter(|d| is_date_available(*d, &self.available_dates));
        let date = current.or_else(|| latest_available_date(&self.available_dates));
        self.set_draft_date(date);
    }

    fn set_draft_date(&mut self, date: Option<NaiveDate>) {
        self.draft.overlay_date = date;
        self.picker.reduce(DateEvent::OverlayDateChanged(date));
    }

    /// Commit the draft. Fails without changing anything when the date
    /// range is inverted.
    pub fn run(&mut self) -> DashboardResult<AppliedQuery> {
        let range = DateRange::new(self.draft.start_date, self.draft.end_date)?;
        let overlay_date = match self.draft.mode {
            ImageMode::Composite => None,
            ImageMode::Single => self.draft.overlay_date,
        };
        self.applied = AppliedQuery {
            query: AnalysisQuery {
                parameter: self.draft.parameter,
                range,
                cloud_cover: self.draft.cloud_cover,
            },
            mode: self.draft.mode,
            overlay_date,
        };
        info!(
            parameter = %self.applied.query.parameter,
            range = %range.caption(),
            cloud_cover = self.applied.query.cloud_cover.percent(),
            mode = ?self.applied.mode,
            "Analysis filters applied"
        );
        Ok(self.applied)
    }

    /// Scene date to request for the applied filters.
    ///
    /// A stale or missing single-mode date falls back to the latest
    /// available one and is written back to the applied query.
    pub fn resolve_overlay_date(&mut self) -> DashboardResult<Option<NaiveDate>> {
        if self.applied.mode == ImageMode::Composite {
            return Ok(None);
        }
        let date = self
            .applied
            .overlay_date
            .filter(|d| is_date_available(*d, &self.available_dates))
            .or_else(|| latest_available_date(&self.available_dates))
            .ok_or_else(|| {
                DashboardError::Unavailable(
                    "no imagery dates match the selected filters".to_string(),
                )
            })?;
        self.applied.overlay_date = Some(date);
        Ok(Some(date))
    }

    /// Whether the draft differs from what was last applied.
    pub fn is_dirty(&self) -> bool {
        let a = &self.applied;
        let d = &self.draft;
        d.parameter != a.query.parameter
            || d.start_date != a.query.range.start
            || d.end_date != a.query.range.end
            || d.cloud_cover != a.query.cloud_cover
            || d.mode != a.mode
            || (d.mode == ImageMode::Single && d.overlay_date != a.overlay_date)
    }
}
