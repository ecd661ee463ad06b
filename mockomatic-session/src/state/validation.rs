//! Advisory validation for session drafts.
//!
//! Nothing here mutates the draft; findings are returned to the caller.

use crate::state::interval::to_minute_second_string;
use crate::state::schema::{SessionDraft, SessionSettings, Station};
use crate::state::timeline;

/// A validation error or warning.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ValidationIssue {
    /// Field or location within the draft
    pub field: String,
    /// Description of the issue
    pub message: String,
}

impl std::fmt::Display for ValidationIssue {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{} - {}", self.field, self.message)
    }
}

/// Result of validating a draft.
#[derive(Debug, Default)]
pub struct ValidationResult {
    /// Errors that block submission
    pub errors: Vec<ValidationIssue>,
    /// Warnings that indicate potential issues
    pub warnings: Vec<ValidationIssue>,
}

impl ValidationResult {
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns true if there are no errors.
    pub fn is_valid(&self) -> bool {
        self.errors.is_empty()
    }

    pub fn add_error(&mut self, field: &str, message: &str) {
        self.errors.push(ValidationIssue {
            field: field.to_string(),
            message: message.to_string(),
        });
    }

    pub fn add_warning(&mut self, field: &str, message: &str) {
        self.warnings.push(ValidationIssue {
            field: field.to_string(),
            message: message.to_string(),
        });
    }

    /// All errors joined on one line, for error messages.
    pub fn summary(&self) -> String {
        self.errors
            .iter()
            .map(|e| e.to_string())
            .collect::<Vec<_>>()
            .join("; ")
    }
}

/// Check the uniform-duration rule.
///
/// Every station must match the first station's duration, except the last
/// one when `static_at_end` is set.
pub fn validate_stations(session: &SessionSettings, stations: &[Station]) -> Result<(), String> {
    let Some(first) = stations.first() else {
        return Err("At least one station is required".to_string());
    };

    let last_position = stations.len() - 1;
    for (position, station) in stations.iter().enumerate() {
        if position == last_position && session.static_at_end {
            break;
        }
        if station.duration.total_micros() != first.duration.total_micros() {
            let name = if station.title.is_empty() {
                format!("Station {}", position + 1)
            } else {
                format!("'{}'", station.title)
            };
            let hint = if position == last_position {
                " (enable static-at-end to give the last station its own duration)"
            } else {
                ""
            };
            return Err(format!(
                "{} lasts {} but stations must all last {}{}",
                name,
                to_minute_second_string(&station.duration),
                to_minute_second_string(&first.duration),
                hint
            ));
        }
    }

    Ok(())
}

/// Validate a whole draft before it is pushed.
pub fn validate_draft(draft: &SessionDraft) -> ValidationResult {
    let mut result = ValidationResult::new();
    let session = &draft.session;

    if let Err(message) = validate_stations(session, &draft.stations) {
        result.add_error("stations", &message);
    }

    if session.location.trim().is_empty() {
        result.add_error("location", "Location is empty");
    }

    if session.scheduled_date.is_none() {
        result.add_error("scheduled_date", "Scheduled date is not set");
    }

    if session.feedback && session.feedback_duration.is_none() {
        result.add_error(
            "feedback_duration",
            "Feedback is enabled but feedback duration is missing",
        );
    }

    if !session.feedback && session.feedback_duration.is_some() {
        result.add_warning(
            "feedback_duration",
            "Feedback is disabled; the feedback duration will not be submitted",
        );
    }

    if draft.slots.is_empty() {
        result.add_error("slots", "At least one slot is required");
    }

    for slot in &draft.slots {
        if slot.runs.is_empty() {
            result.add_error(&format!("slots.{}.runs", slot.key), "Slot has no runs");
        }
        if slot.circuits.is_empty() {
            result.add_error(
                &format!("slots.{}.circuits", slot.key),
                "Slot has no circuits",
            );
        }
    }

    if !timeline::is_ordered(&draft.slots) {
        result.add_error("slots", "Runs overlap: a run starts before the previous one ends");
    }

    result
}
