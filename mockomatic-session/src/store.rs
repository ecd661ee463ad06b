//! Owner of the mutable draft.
//!
//! Every user edit goes through [`DraftStore`]. Edits that change run length
//! are followed by a recalculation, so reads always see settled run times.
//! Network operations leave the draft unchanged when they fail.

use chrono::{FixedOffset, NaiveDate};
use tracing::{info, warn};
use uuid::Uuid;

use crate::api::{SessionApi, SessionRecord};
use crate::assemble::fetch_draft;
use crate::config::MockomaticConfig;
use crate::error::{DraftError, Result};
use crate::state::clock::ClockTime;
use crate::state::draft::ReorderInstruction;
use crate::state::interval::Interval;
use crate::state::schema::{Run, SessionDraft, Slot, Template};
use crate::state::template::{apply_template, find_template, TemplateDraft};
use crate::state::timeline::{self, RunField, RunPosition};
use crate::state::validation::{validate_draft, validate_stations, ValidationResult};
use crate::submit::{build_request, resolve_offset};

#[derive(Debug, Clone)]
pub struct DraftStore {
    draft: SessionDraft,
    templates: Vec<Template>,
    fetched_templates: bool,
    dirty: bool,
    first_run_start: ClockTime,
    default_station_duration: Interval,
    utc_offset: Option<FixedOffset>,
    organisation: Option<String>,
}

impl DraftStore {
    pub fn new(config: &MockomaticConfig) -> Self {
        Self::with_draft(SessionDraft::new(), config)
    }

    /// Wrap an existing draft. The store starts clean.
    pub fn with_draft(draft: SessionDraft, config: &MockomaticConfig) -> Self {
        DraftStore {
            draft,
            templates: Vec::new(),
            fetched_templates: false,
            dirty: false,
            first_run_start: config.first_run_start,
            default_station_duration: Interval::from_seconds(config.default_station_seconds),
            utc_offset: config.utc_offset(),
            organisation: config.organisation.clone(),
        }
    }

    pub fn draft(&self) -> &SessionDraft {
        &self.draft
    }

    pub fn into_draft(self) -> SessionDraft {
        self.draft
    }

    pub fn is_dirty(&self) -> bool {
        self.dirty
    }

    pub fn templates(&self) -> &[Template] {
        &self.templates
    }

    pub fn fetched_templates(&self) -> bool {
        self.fetched_templates
    }

    /// Discard the draft and start over.
    pub fn reset(&mut self) {
        self.draft = SessionDraft::new();
        self.dirty = false;
        info!("reset draft");
    }

    fn edit<T>(&mut self, f: impl FnOnce(&mut SessionDraft) -> Result<T>) -> Result<T> {
        let value = f(&mut self.draft)?;
        self.dirty = true;
        Ok(value)
    }

    fn edit_timing<T>(&mut self, f: impl FnOnce(&mut SessionDraft) -> Result<T>) -> Result<T> {
        let value = self.edit(f)?;
        timeline::recalculate_timings(&mut self.draft);
        Ok(value)
    }

    fn touch_timing(&mut self) {
        self.dirty = true;
        timeline::recalculate_timings(&mut self.draft);
    }

    /// Bring every run back to the canonical duration.
    pub fn recalculate(&mut self) -> usize {
        let corrected = timeline::recalculate_timings(&mut self.draft);
        if corrected > 0 {
            self.dirty = true;
        }
        corrected
    }

    pub fn validate(&self) -> ValidationResult {
        validate_draft(&self.draft)
    }

    // --- Settings ---

    pub fn set_location(&mut self, location: &str) {
        self.dirty = true;
        self.draft.session.location = location.to_string();
    }

    pub fn set_scheduled_date(&mut self, date: Option<NaiveDate>) {
        self.dirty = true;
        self.draft.session.scheduled_date = date;
    }

    pub fn set_intermission_duration(&mut self, duration: Interval) {
        self.draft.session.intermission_duration = duration;
        self.touch_timing();
    }

    pub fn set_feedback(&mut self, feedback: bool) {
        self.draft.session.feedback = feedback;
        self.touch_timing();
    }

    pub fn set_feedback_duration(&mut self, duration: Option<Interval>) {
        self.draft.session.feedback_duration = duration;
        self.touch_timing();
    }

    pub fn set_static_at_end(&mut self, static_at_end: bool) {
        self.draft.session.static_at_end = static_at_end;
        self.touch_timing();
    }

    // --- Stations ---

    /// Append a station, using the configured default duration when none is
    /// given.
    pub fn add_station(&mut self, title: &str, duration: Option<Interval>) -> usize {
        let duration = duration.unwrap_or(self.default_station_duration);
        let index = self.draft.add_station(title, duration);
        self.touch_timing();
        index
    }

    pub fn update_station_title(&mut self, index: usize, title: &str) -> Result<()> {
        self.edit(|d| d.update_station_title(index, title))
    }

    pub fn update_station_duration(&mut self, index: usize, duration: Interval) -> Result<()> {
        self.edit_timing(|d| d.update_station_duration(index, duration))
    }

    pub fn delete_stations(&mut self, indices: &[u32]) -> usize {
        let removed = self.draft.delete_stations(indices);
        if removed > 0 {
            self.touch_timing();
        }
        removed
    }

    pub fn reorder_station(
        &mut self,
        source: usize,
        target: usize,
        instruction: ReorderInstruction,
    ) -> Result<bool> {
        self.edit_timing(|d| d.reorder_station(source, target, instruction))
    }

    // --- Slots, runs, circuits ---

    pub fn add_slot(&mut self) -> Result<usize> {
        let first_start = self.first_run_start;
        self.edit(|d| d.add_slot(first_start))
    }

    pub fn remove_slot(&mut self, index: usize) -> Result<Slot> {
        self.edit(|d| d.remove_slot(index))
    }

    pub fn delete_slots(&mut self, keys: &[String]) -> usize {
        let removed = self.draft.delete_slots(keys);
        if removed > 0 {
            self.dirty = true;
        }
        removed
    }

    pub fn add_run(&mut self, slot: usize) -> Result<usize> {
        let first_start = self.first_run_start;
        self.edit(|d| d.add_run(slot, first_start))
    }

    pub fn delete_run(&mut self, slot: usize, run: usize) -> Result<Run> {
        self.edit(|d| d.delete_run(slot, run))
    }

    /// Edit a run's start or end and carry the delta forward.
    pub fn set_run_time(&mut self, pos: RunPosition, field: RunField, value: ClockTime) -> Result<i64> {
        self.edit(|d| timeline::on_run_time_changed(d, pos, field, value))
    }

    pub fn set_run_flip_allocation(&mut self, slot: usize, run: usize, flip: bool) -> Result<()> {
        self.edit(|d| d.set_run_flip_allocation(slot, run, flip))
    }

    pub fn add_circuit(&mut self, slot: usize) -> Result<usize> {
        self.edit(|d| d.add_circuit(slot))
    }

    pub fn delete_circuit(&mut self, slot: usize, circuit: usize) -> Result<()> {
        self.edit(|d| d.delete_circuit(slot, circuit))
    }

    pub fn set_circuit_female_only(
        &mut self,
        slot: usize,
        circuit: usize,
        female_only: bool,
    ) -> Result<()> {
        self.edit(|d| d.set_circuit_female_only(slot, circuit, female_only))
    }

    // --- Templates ---

    /// Overlay a template and bring run times in line with it.
    pub fn apply_template(&mut self, template: &Template) {
        apply_template(&mut self.draft, template);
        self.touch_timing();
    }

    /// Apply a fetched template chosen by id or name.
    pub fn apply_template_by(&mut self, id_or_name: &str) -> Result<()> {
        let template = find_template(&self.templates, id_or_name)
            .cloned()
            .ok_or_else(|| DraftError::TemplateNotFound(id_or_name.to_string()))?;
        self.apply_template(&template);
        Ok(())
    }

    /// Load the template list. On failure the list keeps its previous
    /// contents; either way the list counts as fetched.
    pub async fn fetch_templates(&mut self, api: &dyn SessionApi) -> Result<usize> {
        let result = api.get_templates().await;
        self.fetched_templates = true;
        match result {
            Ok(templates) => {
                self.templates = templates;
                Ok(self.templates.len())
            }
            Err(err) => {
                warn!(error = %err, "failed to fetch templates");
                Err(err)
            }
        }
    }

    /// Publish the draft's station setup as a new template.
    pub async fn create_template(&self, api: &dyn SessionApi, name: &str) -> Result<()> {
        validate_stations(&self.draft.session, &self.draft.stations)
            .map_err(DraftError::InvalidStations)?;
        let request = TemplateDraft::from_session(name, &self.draft).to_request();
        api.create_template(&request).await
    }

    // --- Session API ---

    /// Recalculate, validate and submit the draft.
    ///
    /// The draft is only updated (with the recalculated times) and marked
    /// clean once the server accepts it.
    pub async fn push(&mut self, api: &dyn SessionApi) -> Result<SessionRecord> {
        let mut candidate = self.draft.clone();
        timeline::recalculate_timings(&mut candidate);

        let validation = validate_draft(&candidate);
        if !validation.is_valid() {
            warn!(errors = validation.errors.len(), "refusing to push invalid draft");
            return Err(DraftError::InvalidDraft(validation.summary()));
        }
        for warning in &validation.warnings {
            warn!(%warning, "pushing draft with warning");
        }

        let date = candidate
            .session
            .scheduled_date
            .ok_or_else(|| DraftError::InvalidDraft("scheduled date is not set".to_string()))?;
        let organisation = self.organisation.as_deref().ok_or_else(|| {
            DraftError::InvalidDraft(
                "organisation is not configured (set MOCKOMATIC_ORGANISATION)".to_string(),
            )
        })?;
        let offset = resolve_offset(self.utc_offset, date);
        let request = build_request(&candidate, organisation, offset)?;

        let record = api.create_session(&request).await?;
        self.draft = candidate;
        self.dirty = false;
        info!(id = %record.id, "pushed session");
        Ok(record)
    }

    /// Replace the draft with a stored session.
    pub async fn load_session(&mut self, api: &dyn SessionApi, id: Uuid) -> Result<()> {
        let draft = fetch_draft(api, id, self.utc_offset).await?;
        self.draft = draft;
        self.dirty = false;
        Ok(())
    }
}
