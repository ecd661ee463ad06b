use thiserror::Error;

/// Error types for mockomatic-session operations.
///
/// Every rejected mutation returns one of these and leaves the draft untouched.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum DraftError {
    #[error("Slot {0} does not exist (total slots: {1})")]
    SlotNotFound(usize, usize),

    #[error("Run {run} does not exist in slot {slot}")]
    RunNotFound { slot: String, run: usize },

    #[error("Station {0} does not exist (total stations: {1})")]
    StationNotFound(usize, usize),

    #[error("Circuit {circuit} does not exist in slot {slot}")]
    CircuitNotFound { slot: String, circuit: usize },

    #[error("Slot {0} must keep at least one circuit")]
    LastCircuit(String),

    #[error("Run {run} in slot {slot} cannot start at {start}: previous run ends at {previous_end}")]
    RunOverlap {
        slot: String,
        run: usize,
        start: String,
        previous_end: String,
    },

    #[error("Run {run} in slot {slot} cannot end at {end}: it starts at {start}")]
    RunEndBeforeStart {
        slot: String,
        run: usize,
        start: String,
        end: String,
    },

    #[error("Invalid stations: {0}")]
    InvalidStations(String),

    #[error("Draft validation failed: {0}")]
    InvalidDraft(String),

    #[error("Template '{0}' not found")]
    TemplateNotFound(String),

    #[error("API error: {0}")]
    Api(String),

    #[error("Serialization error: {0}")]
    Serialization(String),
}

impl From<reqwest::Error> for DraftError {
    fn from(value: reqwest::Error) -> Self {
        DraftError::Api(value.to_string())
    }
}

impl From<serde_json::Error> for DraftError {
    fn from(value: serde_json::Error) -> Self {
        DraftError::Serialization(value.to_string())
    }
}

pub type Result<T> = std::result::Result<T, DraftError>;
