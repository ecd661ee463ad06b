//! Rebuild a [`SessionDraft`] from the flat per-entity read endpoints.

use chrono::{DateTime, FixedOffset};
use tracing::{debug, info};
use uuid::Uuid;

use crate::api::{CircuitRecord, RunRecord, SessionApi, SessionRecord, SlotRecord, StationRecord};
use crate::error::Result;
use crate::state::clock::ClockTime;
use crate::state::keys::key_index;
use crate::state::schema::{Circuit, Run, SessionDraft, SessionSettings, Slot, Station};

fn clock_time(ts: &DateTime<FixedOffset>, offset: Option<FixedOffset>) -> ClockTime {
    let time = match offset {
        Some(offset) => ts.with_timezone(&offset).time(),
        None => ts.time(),
    };
    ClockTime::from_naive_time(time)
}

/// Group flat records under `session` by their foreign keys.
///
/// Records belonging to other sessions or slots are ignored. Stations are
/// ordered by index, runs by start, circuits by key, and slots by their
/// first run. Timestamps are read in `offset`, or in their own offset when
/// none is given.
pub fn assemble_draft(
    session: &SessionRecord,
    stations: &[StationRecord],
    slots: &[SlotRecord],
    runs: &[RunRecord],
    circuits: &[CircuitRecord],
    offset: Option<FixedOffset>,
) -> SessionDraft {
    let mut station_records: Vec<&StationRecord> = stations
        .iter()
        .filter(|s| s.session_id == session.id)
        .collect();
    station_records.sort_by_key(|s| s.index);

    let mut grouped: Vec<(Option<DateTime<FixedOffset>>, &str, Slot)> = Vec::new();
    for slot in slots.iter().filter(|s| s.session_id == session.id) {
        let mut slot_runs: Vec<&RunRecord> = runs.iter().filter(|r| r.slot_id == slot.id).collect();
        slot_runs.sort_by_key(|r| r.scheduled_start);

        let mut slot_circuits: Vec<&CircuitRecord> = circuits
            .iter()
            .filter(|c| c.slot_id == slot.id)
            .collect();
        slot_circuits.sort_by_key(|c| key_index(&c.key).unwrap_or(usize::MAX));

        let first_start = slot_runs.first().map(|r| r.scheduled_start);
        grouped.push((
            first_start,
            slot.slot_time.as_str(),
            Slot {
                key: String::new(),
                runs: slot_runs
                    .iter()
                    .map(|r| Run {
                        scheduled_start: clock_time(&r.scheduled_start, offset),
                        scheduled_end: clock_time(&r.scheduled_end, offset),
                        flip_allocation: r.flip_allocation,
                    })
                    .collect(),
                circuits: slot_circuits
                    .iter()
                    .map(|c| Circuit {
                        female_only: c.female_only,
                    })
                    .collect(),
            },
        ));
    }
    // Slots without runs sort last; "AM" < "PM" breaks ties.
    grouped.sort_by(|a, b| match (a.0, b.0) {
        (Some(x), Some(y)) => x.cmp(&y).then_with(|| a.1.cmp(b.1)),
        (Some(_), None) => std::cmp::Ordering::Less,
        (None, Some(_)) => std::cmp::Ordering::Greater,
        (None, None) => a.1.cmp(b.1),
    });

    let mut draft = SessionDraft {
        session: SessionSettings {
            scheduled_date: Some(session.scheduled_date),
            location: session.location.clone(),
            intermission_duration: session.intermission_duration,
            feedback: session.feedback,
            feedback_duration: session.feedback_duration,
            static_at_end: session.static_at_end,
        },
        stations: station_records
            .iter()
            .map(|s| Station {
                title: s.title.clone(),
                index: 0,
                duration: s.duration,
            })
            .collect(),
        slots: grouped.into_iter().map(|(_, _, slot)| slot).collect(),
    };
    draft.reindex();

    debug!(
        session = %session.id,
        stations = draft.stations.len(),
        slots = draft.slots.len(),
        "assembled draft"
    );
    draft
}

/// Fetch every record of a session and assemble the draft.
pub async fn fetch_draft(
    api: &dyn SessionApi,
    id: Uuid,
    offset: Option<FixedOffset>,
) -> Result<SessionDraft> {
    let session = api.get_session(id).await?;
    let stations = api.get_stations(id).await?;
    let slots = api.get_slots(id).await?;

    let mut runs = Vec::new();
    let mut circuits = Vec::new();
    for slot in &slots {
        runs.extend(api.get_runs(slot.id).await?);
        circuits.extend(api.get_circuits(slot.id).await?);
    }

    info!(
        session = %id,
        stations = stations.len(),
        slots = slots.len(),
        runs = runs.len(),
        "fetched session"
    );
    Ok(assemble_draft(
        &session, &stations, &slots, &runs, &circuits, offset,
    ))
}
