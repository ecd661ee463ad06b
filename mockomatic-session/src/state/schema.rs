use std::fs;
use std::path::Path;

use anyhow::Context;
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::state::clock::ClockTime;
use crate::state::interval::Interval;

/// Session-level timing policy and logistics.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SessionSettings {
    #[serde(default)]
    pub scheduled_date: Option<NaiveDate>,
    #[serde(default)]
    pub location: String,
    #[serde(default)]
    pub intermission_duration: Interval,
    #[serde(default)]
    pub feedback: bool,
    /// Ignored by the engine while `feedback` is false.
    #[serde(default)]
    pub feedback_duration: Option<Interval>,
    /// The last station is a terminal stage exempt from the uniform duration.
    #[serde(default)]
    pub static_at_end: bool,
}

/// One fixed-duration activity. `index` always equals its position.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Station {
    pub title: String,
    pub index: u32,
    pub duration: Interval,
}

/// One scheduled pass through every station.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Run {
    pub scheduled_start: ClockTime,
    pub scheduled_end: ClockTime,
    #[serde(default)]
    pub flip_allocation: bool,
}

/// A parallel track of stations within a slot.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Circuit {
    #[serde(default)]
    pub female_only: bool,
}

/// A labeled block of runs. `key` is derived from position ("A", "B", ...).
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Slot {
    #[serde(default)]
    pub key: String,
    #[serde(default)]
    pub runs: Vec<Run>,
    #[serde(default)]
    pub circuits: Vec<Circuit>,
}

/// Morning or afternoon block, decided by the first run's start.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum SlotTime {
    AM,
    PM,
}

impl std::fmt::Display for SlotTime {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            SlotTime::AM => write!(f, "AM"),
            SlotTime::PM => write!(f, "PM"),
        }
    }
}

impl Slot {
    pub fn slot_time(&self) -> Option<SlotTime> {
        let first = self.runs.first()?;
        if first.scheduled_start < ClockTime::from_hm(12, 0) {
            Some(SlotTime::AM)
        } else {
            Some(SlotTime::PM)
        }
    }

    /// Start of the first run and end of the last run.
    pub fn span(&self) -> Option<(ClockTime, ClockTime)> {
        let first = self.runs.first()?;
        let last = self.runs.last()?;
        Some((first.scheduled_start, last.scheduled_end))
    }
}

/// The in-memory session being planned, handed to the API on push.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SessionDraft {
    #[serde(default)]
    pub session: SessionSettings,
    #[serde(default)]
    pub stations: Vec<Station>,
    #[serde(default)]
    pub slots: Vec<Slot>,
}

impl SessionDraft {
    pub fn new() -> Self {
        Self::default()
    }

    /// Load a draft from a JSON file.
    pub fn load(path: &Path) -> anyhow::Result<Self> {
        let content = fs::read_to_string(path)
            .with_context(|| format!("Failed to read draft: {}", path.display()))?;
        let mut draft: SessionDraft = serde_json::from_str(&content)
            .with_context(|| format!("Failed to parse draft JSON: {}", path.display()))?;
        draft.reindex();
        Ok(draft)
    }

    /// Save the draft to a JSON file.
    pub fn save(&self, path: &Path) -> anyhow::Result<()> {
        let content = serde_json::to_string_pretty(self)?;
        fs::write(path, content)
            .with_context(|| format!("Failed to write draft: {}", path.display()))?;
        Ok(())
    }
}

/// Station as stored in a template.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TemplateStation {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<Uuid>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub template_id: Option<Uuid>,
    pub title: String,
    pub index: u32,
    pub duration: Interval,
}

/// Reusable station and timing configuration.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Template {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<Uuid>,
    pub name: String,
    #[serde(default)]
    pub feedback: bool,
    #[serde(default)]
    pub feedback_duration: Option<Interval>,
    #[serde(default)]
    pub intermission_duration: Interval,
    #[serde(default)]
    pub static_at_end: bool,
    #[serde(default)]
    pub stations: Vec<TemplateStation>,
}
