//! Conversion of a draft into the `sessions/create` body.
//!
//! Run times live in the draft as times of day. They become absolute
//! timestamps here, once, by pairing them with the scheduled date and a UTC
//! offset.

use chrono::{DateTime, FixedOffset, Local, NaiveDate, NaiveTime, Offset, TimeZone};
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::error::{DraftError, Result};
use crate::state::clock::ClockTime;
use crate::state::draft::reindex_stations;
use crate::state::interval::Interval;
use crate::state::keys::slot_key;
use crate::state::schema::{SessionDraft, Station};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CreateSessionRequest {
    pub session: SessionPayload,
    pub stations: Vec<Station>,
    pub slots: Vec<SlotPayload>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SessionPayload {
    pub organisation: String,
    pub scheduled_date: NaiveDate,
    pub location: String,
    pub feedback: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub feedback_duration: Option<Interval>,
    pub intermission_duration: Interval,
    pub static_at_end: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SlotPayload {
    pub key: String,
    pub slot_time: String,
    pub runs: Vec<RunPayload>,
    pub circuits: Vec<CircuitPayload>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RunPayload {
    pub flip_allocation: bool,
    pub scheduled_start: DateTime<FixedOffset>,
    pub scheduled_end: DateTime<FixedOffset>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CircuitPayload {
    pub key: String,
    pub female_only: bool,
}

/// Offset to submit with: the configured one, else the machine's local
/// offset at midnight of `date`.
pub fn resolve_offset(configured: Option<FixedOffset>, date: NaiveDate) -> FixedOffset {
    if let Some(offset) = configured {
        return offset;
    }
    let midnight = date.and_time(NaiveTime::MIN);
    Local
        .from_local_datetime(&midnight)
        .earliest()
        .map(|dt| dt.offset().fix())
        .unwrap_or_else(|| Local::now().offset().fix())
}

/// Combine a date and a time of day into an absolute timestamp.
pub fn to_timestamp(
    date: NaiveDate,
    time: ClockTime,
    offset: FixedOffset,
) -> Result<DateTime<FixedOffset>> {
    let local = date.and_time(time.to_naive_time());
    offset.from_local_datetime(&local).single().ok_or_else(|| {
        DraftError::InvalidDraft(format!("cannot place {} {} at offset {}", date, time, offset))
    })
}

/// Build the create request. The draft must have a scheduled date.
///
/// A feedback duration is only sent while feedback is enabled. Slot and
/// circuit keys are derived from position.
pub fn build_request(
    draft: &SessionDraft,
    organisation: &str,
    offset: FixedOffset,
) -> Result<CreateSessionRequest> {
    let settings = &draft.session;
    let date = settings
        .scheduled_date
        .ok_or_else(|| DraftError::InvalidDraft("scheduled date is not set".to_string()))?;

    let mut slots = Vec::with_capacity(draft.slots.len());
    for (slot_index, slot) in draft.slots.iter().enumerate() {
        let key = slot_key(slot_index);
        let slot_time = slot.slot_time().ok_or_else(|| {
            DraftError::InvalidDraft(format!("slot {} has no runs", key))
        })?;

        let runs = slot
            .runs
            .iter()
            .map(|run| {
                Ok(RunPayload {
                    flip_allocation: run.flip_allocation,
                    scheduled_start: to_timestamp(date, run.scheduled_start, offset)?,
                    scheduled_end: to_timestamp(date, run.scheduled_end, offset)?,
                })
            })
            .collect::<Result<Vec<_>>>()?;

        let circuits = slot
            .circuits
            .iter()
            .enumerate()
            .map(|(i, circuit)| CircuitPayload {
                key: slot_key(i),
                female_only: circuit.female_only,
            })
            .collect();

        slots.push(SlotPayload {
            key,
            slot_time: slot_time.to_string(),
            runs,
            circuits,
        });
    }

    let mut stations = draft.stations.clone();
    reindex_stations(&mut stations);

    debug!(
        date = %date,
        offset = %offset,
        stations = stations.len(),
        slots = slots.len(),
        "built session request"
    );

    Ok(CreateSessionRequest {
        session: SessionPayload {
            organisation: organisation.to_string(),
            scheduled_date: date,
            location: settings.location.clone(),
            feedback: settings.feedback,
            feedback_duration: settings.feedback_duration.filter(|_| settings.feedback),
            intermission_duration: settings.intermission_duration,
            static_at_end: settings.static_at_end,
        },
        stations,
        slots,
    })
}
