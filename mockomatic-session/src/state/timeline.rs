//! Timing propagation across the session timeline.
//!
//! Runs in all slots form one chain: a run starts where the previous run in
//! timeline order ends, crossing slot boundaries and skipping empty slots.
//! Every edit is expressed as "add a signed delta to a suffix of the chain".

use tracing::{debug, info, warn};

use crate::error::{DraftError, Result};
use crate::state::clock::ClockTime;
use crate::state::interval::MICROS_PER_DAY;
use crate::state::schema::{Run, SessionDraft, Slot};
use crate::state::timing::calculate_run_duration;

/// Start of the first run when the session has none yet.
pub fn default_first_start() -> ClockTime {
    ClockTime::from_hm(8, 0)
}

/// Address of one run in the timeline.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub struct RunPosition {
    pub slot: usize,
    pub run: usize,
}

impl RunPosition {
    pub fn new(slot: usize, run: usize) -> Self {
        RunPosition { slot, run }
    }
}

/// Which end of a run was edited.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RunField {
    Start,
    End,
}

/// Every run position in timeline order.
pub fn positions(slots: &[Slot]) -> Vec<RunPosition> {
    slots
        .iter()
        .enumerate()
        .flat_map(|(si, slot)| (0..slot.runs.len()).map(move |ri| RunPosition::new(si, ri)))
        .collect()
}

/// End of the most recent run in any slot before `slot_index`.
pub fn last_end_before_slot(slots: &[Slot], slot_index: usize) -> Option<ClockTime> {
    slots[..slot_index.min(slots.len())]
        .iter()
        .rev()
        .find_map(|slot| slot.runs.last())
        .map(|run| run.scheduled_end)
}

/// End of the run immediately before `pos` in timeline order.
pub fn previous_run_end(slots: &[Slot], pos: RunPosition) -> Option<ClockTime> {
    if pos.run > 0 {
        slots
            .get(pos.slot)
            .and_then(|slot| slot.runs.get(pos.run - 1))
            .map(|run| run.scheduled_end)
    } else {
        last_end_before_slot(slots, pos.slot)
    }
}

/// The run after `pos` in timeline order.
pub fn next_position(slots: &[Slot], pos: RunPosition) -> Option<RunPosition> {
    if let Some(slot) = slots.get(pos.slot) {
        if pos.run + 1 < slot.runs.len() {
            return Some(RunPosition::new(pos.slot, pos.run + 1));
        }
    }
    slots
        .iter()
        .enumerate()
        .skip(pos.slot + 1)
        .find(|(_, slot)| !slot.runs.is_empty())
        .map(|(si, _)| RunPosition::new(si, 0))
}

/// Shift start and end of every run from `from` (inclusive) to the end of
/// the timeline by `delta` microseconds. Returns the number of runs moved.
pub fn shift_from(slots: &mut [Slot], from: RunPosition, delta: i64) -> usize {
    if delta == 0 {
        return 0;
    }
    let mut moved = 0;
    for (si, slot) in slots.iter_mut().enumerate().skip(from.slot) {
        let skip = if si == from.slot { from.run } else { 0 };
        for run in slot.runs.iter_mut().skip(skip) {
            run.scheduled_start = run.scheduled_start.add(delta);
            run.scheduled_end = run.scheduled_end.add(delta);
            moved += 1;
        }
    }
    debug!(slot = from.slot, run = from.run, delta_us = delta, moved, "shifted timeline suffix");
    moved
}

/// True when every run starts no earlier than its predecessor ends.
pub fn is_ordered(slots: &[Slot]) -> bool {
    let runs: Vec<&Run> = slots.iter().flat_map(|slot| slot.runs.iter()).collect();
    runs.windows(2)
        .all(|pair| pair[1].scheduled_start >= pair[0].scheduled_end)
}

fn slot_key(slots: &[Slot], slot_index: usize) -> String {
    slots
        .get(slot_index)
        .map(|slot| slot.key.clone())
        .unwrap_or_else(|| slot_index.to_string())
}

/// Append a run to a slot, chained to the latest run before it.
///
/// Runs in later slots move forward by the new run's duration so the chain
/// stays contiguous. Returns the new run's index within its slot.
pub fn add_run(draft: &mut SessionDraft, slot_index: usize, first_start: ClockTime) -> Result<usize> {
    let slot_count = draft.slots.len();
    let slot = draft
        .slots
        .get(slot_index)
        .ok_or(DraftError::SlotNotFound(slot_index, slot_count))?;

    let start = slot
        .runs
        .last()
        .map(|run| run.scheduled_end)
        .or_else(|| last_end_before_slot(&draft.slots, slot_index))
        .unwrap_or(first_start);

    let duration = calculate_run_duration(&draft.session, &draft.stations);
    let run = Run {
        scheduled_start: start,
        scheduled_end: start.add(duration),
        flip_allocation: false,
    };

    let runs = &mut draft.slots[slot_index].runs;
    runs.push(run);
    let run_index = runs.len() - 1;

    shift_from(&mut draft.slots, RunPosition::new(slot_index + 1, 0), duration);

    info!(
        slot = %draft.slots[slot_index].key,
        run = run_index,
        start = %run.scheduled_start,
        end = %run.scheduled_end,
        "added run"
    );
    Ok(run_index)
}

/// Apply an edited start or end time to a run and carry the change forward.
///
/// A start edit moves the run and everything after it by the difference; it
/// is rejected when the new start falls before the previous run's end. An end
/// edit moves only the end of this run plus every later run; it is rejected
/// when the new end falls before the run's own start. Returns the applied
/// delta in microseconds. On error the draft is unchanged.
pub fn on_run_time_changed(
    draft: &mut SessionDraft,
    pos: RunPosition,
    field: RunField,
    new_value: ClockTime,
) -> Result<i64> {
    let slots = &mut draft.slots;
    let slot_count = slots.len();
    let run = slots
        .get(pos.slot)
        .ok_or(DraftError::SlotNotFound(pos.slot, slot_count))?
        .runs
        .get(pos.run)
        .copied()
        .ok_or_else(|| DraftError::RunNotFound {
            slot: slot_key(slots, pos.slot),
            run: pos.run,
        })?;

    match field {
        RunField::Start => {
            if let Some(previous_end) = previous_run_end(slots, pos) {
                if new_value < previous_end {
                    warn!(
                        slot = %slot_key(slots, pos.slot),
                        run = pos.run,
                        start = %new_value,
                        previous_end = %previous_end,
                        "rejected overlapping start time"
                    );
                    return Err(DraftError::RunOverlap {
                        slot: slot_key(slots, pos.slot),
                        run: pos.run,
                        start: new_value.to_string(),
                        previous_end: previous_end.to_string(),
                    });
                }
            }
            let delta = new_value.subtract(run.scheduled_start);
            shift_from(slots, pos, delta);
            Ok(delta)
        }
        RunField::End => {
            if new_value < run.scheduled_start {
                warn!(
                    slot = %slot_key(slots, pos.slot),
                    run = pos.run,
                    end = %new_value,
                    "rejected end time before start"
                );
                return Err(DraftError::RunEndBeforeStart {
                    slot: slot_key(slots, pos.slot),
                    run: pos.run,
                    start: run.scheduled_start.to_string(),
                    end: new_value.to_string(),
                });
            }
            let delta = new_value.subtract(run.scheduled_end);
            slots[pos.slot].runs[pos.run].scheduled_end = new_value;
            if let Some(next) = next_position(slots, pos) {
                shift_from(slots, next, delta);
            }
            Ok(delta)
        }
    }
}

/// Bring every run back to the canonical run duration.
///
/// Walks the timeline once. Each run whose length differs has its end moved
/// by the difference, and the same difference is applied to every later run.
/// Returns the number of runs corrected; a second call returns 0.
pub fn recalculate_timings(draft: &mut SessionDraft) -> usize {
    let canonical = calculate_run_duration(&draft.session, &draft.stations);
    let order = positions(&draft.slots);
    let mut corrected = 0;

    for (i, pos) in order.iter().enumerate() {
        let run = &mut draft.slots[pos.slot].runs[pos.run];
        let current = run.scheduled_start.elapsed_until(run.scheduled_end);
        let diff = canonical.rem_euclid(MICROS_PER_DAY) - current;
        if diff == 0 {
            continue;
        }
        run.scheduled_end = run.scheduled_end.add(diff);
        if let Some(next) = order.get(i + 1) {
            shift_from(&mut draft.slots, *next, diff);
        }
        corrected += 1;
    }

    if corrected > 0 {
        info!(corrected, canonical_us = canonical, "recalculated run timings");
    }
    corrected
}
