//! Templates: applying a stored configuration to a draft, and authoring new
//! templates.

use serde::{Deserialize, Serialize};
use tracing::info;

use crate::error::Result;
use crate::state::draft::{reindex_stations, reorder_stations, ReorderInstruction};
use crate::state::interval::Interval;
use crate::state::schema::{SessionDraft, Station, Template};

/// Overlay a template's timing policy and stations onto a draft.
///
/// Prior stations are discarded. Location, date and slots are untouched, so
/// run times may be stale afterwards.
pub fn apply_template(draft: &mut SessionDraft, template: &Template) {
    let session = &mut draft.session;
    session.intermission_duration = template.intermission_duration;
    session.feedback = template.feedback;
    session.feedback_duration = template.feedback_duration;
    session.static_at_end = template.static_at_end;

    let mut stations: Vec<&_> = template.stations.iter().collect();
    stations.sort_by_key(|s| s.index);
    draft.stations = stations
        .into_iter()
        .map(|s| Station {
            title: s.title.clone(),
            index: s.index,
            duration: s.duration,
        })
        .collect();
    reindex_stations(&mut draft.stations);

    info!(
        template = %template.name,
        stations = draft.stations.len(),
        "applied template"
    );
}

/// Find a template by id (as text) or by case-insensitive name.
pub fn find_template<'a>(templates: &'a [Template], id_or_name: &str) -> Option<&'a Template> {
    templates
        .iter()
        .find(|t| t.id.map(|id| id.to_string()) == Some(id_or_name.to_string()))
        .or_else(|| {
            templates
                .iter()
                .find(|t| t.name.eq_ignore_ascii_case(id_or_name))
        })
}

/// Session-level half of a template submission.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct TemplateSettings {
    pub name: String,
    pub feedback: bool,
    pub feedback_duration: Option<Interval>,
    pub intermission_duration: Interval,
    pub static_at_end: bool,
}

/// A template being authored.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct TemplateDraft {
    pub settings: TemplateSettings,
    pub stations: Vec<Station>,
}

/// Body of `POST templates/create`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CreateTemplateRequest {
    pub template_session: TemplateSessionPayload,
    pub template_stations: Vec<Station>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TemplateSessionPayload {
    pub name: String,
    pub total_stations: u32,
    pub feedback: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub feedback_duration: Option<Interval>,
    pub intermission_duration: Interval,
    pub static_at_end: bool,
}

impl TemplateDraft {
    pub fn new(name: &str) -> Self {
        TemplateDraft {
            settings: TemplateSettings {
                name: name.to_string(),
                ..Default::default()
            },
            stations: Vec::new(),
        }
    }

    /// Capture a session draft's station setup as a template.
    pub fn from_session(name: &str, draft: &SessionDraft) -> Self {
        let session = &draft.session;
        TemplateDraft {
            settings: TemplateSettings {
                name: name.to_string(),
                feedback: session.feedback,
                feedback_duration: session.feedback_duration,
                intermission_duration: session.intermission_duration,
                static_at_end: session.static_at_end,
            },
            stations: draft.stations.clone(),
        }
    }

    pub fn add_station(&mut self, title: &str, duration: Interval) -> usize {
        self.stations.push(Station {
            title: title.to_string(),
            index: 0,
            duration,
        });
        reindex_stations(&mut self.stations);
        self.stations.len() - 1
    }

    pub fn delete_stations(&mut self, indices: &[u32]) -> usize {
        let before = self.stations.len();
        self.stations.retain(|s| !indices.contains(&s.index));
        reindex_stations(&mut self.stations);
        before - self.stations.len()
    }

    pub fn reorder_station(
        &mut self,
        source: usize,
        target: usize,
        instruction: ReorderInstruction,
    ) -> Result<bool> {
        reorder_stations(&mut self.stations, source, target, instruction)
    }

    /// Build the create request. A disabled feedback duration is dropped.
    pub fn to_request(&self) -> CreateTemplateRequest {
        let settings = &self.settings;
        CreateTemplateRequest {
            template_session: TemplateSessionPayload {
                name: settings.name.clone(),
                total_stations: self.stations.len() as u32,
                feedback: settings.feedback,
                feedback_duration: settings.feedback_duration.filter(|_| settings.feedback),
                intermission_duration: settings.intermission_duration,
                static_at_end: settings.static_at_end,
            },
            template_stations: self.stations.clone(),
        }
    }
}
