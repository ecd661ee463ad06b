//! Flat records returned by the read endpoints.
//!
//! Children point at their parents by id; `assemble` regroups them.

use chrono::{DateTime, FixedOffset, NaiveDate};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::state::interval::Interval;

/// Lifecycle of a stored session.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SessionStatus {
    New,
    Prep,
    Ready,
    Pending,
    Running,
    Completed,
}

impl std::fmt::Display for SessionStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            SessionStatus::New => "new",
            SessionStatus::Prep => "prep",
            SessionStatus::Ready => "ready",
            SessionStatus::Pending => "pending",
            SessionStatus::Running => "running",
            SessionStatus::Completed => "completed",
        };
        write!(f, "{}", s)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SessionRecord {
    pub id: Uuid,
    #[serde(default)]
    pub organiser_id: Option<Uuid>,
    #[serde(default)]
    pub organisation: Option<String>,
    pub scheduled_date: NaiveDate,
    pub location: String,
    #[serde(default)]
    pub total_stations: Option<i32>,
    pub feedback: bool,
    #[serde(default)]
    pub feedback_duration: Option<Interval>,
    #[serde(default)]
    pub intermission_duration: Interval,
    pub static_at_end: bool,
    #[serde(default)]
    pub status: Option<SessionStatus>,
    #[serde(default)]
    pub created_at: Option<DateTime<FixedOffset>>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StationRecord {
    pub id: Uuid,
    pub session_id: Uuid,
    pub title: String,
    pub index: i32,
    pub duration: Interval,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SlotRecord {
    pub id: Uuid,
    pub session_id: Uuid,
    /// "AM" or "PM".
    pub slot_time: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RunRecord {
    pub id: Uuid,
    pub slot_id: Uuid,
    #[serde(default)]
    pub flip_allocation: bool,
    pub scheduled_start: DateTime<FixedOffset>,
    pub scheduled_end: DateTime<FixedOffset>,
    #[serde(default)]
    pub timer_start: Option<DateTime<FixedOffset>>,
    #[serde(default)]
    pub timer_end: Option<DateTime<FixedOffset>>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CircuitRecord {
    pub id: Uuid,
    pub session_id: Uuid,
    pub slot_id: Uuid,
    pub key: String,
    #[serde(default)]
    pub female_only: bool,
    #[serde(default)]
    pub current_rotation: Option<i32>,
    #[serde(default)]
    pub status: Option<String>,
    #[serde(default)]
    pub intermission: bool,
}
