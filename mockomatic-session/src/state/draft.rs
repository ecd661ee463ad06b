//! Ordered-collection mutations on a session draft.
//!
//! Stations, slots, runs and circuits are addressed by position. After every
//! structural change [`SessionDraft::reindex`] re-derives `station.index` and
//! `slot.key` so the denormalized fields always match positions.

use std::str::FromStr;

use tracing::{debug, info, warn};

use crate::error::{DraftError, Result};
use crate::state::clock::ClockTime;
use crate::state::interval::Interval;
use crate::state::keys::slot_key;
use crate::state::schema::{Circuit, Run, SessionDraft, Slot, Station};
use crate::state::timeline;
use crate::state::timing::calculate_run_duration;

/// Drag-and-drop placement relative to the target row.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReorderInstruction {
    Before,
    After,
}

impl std::fmt::Display for ReorderInstruction {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ReorderInstruction::Before => write!(f, "reorder-before"),
            ReorderInstruction::After => write!(f, "reorder-after"),
        }
    }
}

impl FromStr for ReorderInstruction {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "reorder-before" | "before" => Ok(ReorderInstruction::Before),
            "reorder-after" | "after" => Ok(ReorderInstruction::After),
            _ => Err(format!(
                "Invalid reorder instruction '{}'. Valid values: reorder-before, reorder-after",
                s
            )),
        }
    }
}

/// Rewrite `index` on every station to match its position.
pub fn reindex_stations(stations: &mut [Station]) {
    for (i, station) in stations.iter_mut().enumerate() {
        station.index = i as u32;
    }
}

/// Splice a station to its drag-and-drop destination and re-index.
pub fn reorder_stations(
    stations: &mut Vec<Station>,
    source: usize,
    target: usize,
    instruction: ReorderInstruction,
) -> Result<bool> {
    for index in [source, target] {
        if index >= stations.len() {
            return Err(DraftError::StationNotFound(index, stations.len()));
        }
    }
    if source == target {
        return Ok(false);
    }

    // The source is removed before reinsertion, so targets after it
    // shift down by one.
    let destination = match instruction {
        ReorderInstruction::Before if source > target => target,
        ReorderInstruction::Before if source + 1 == target => return Ok(false),
        ReorderInstruction::Before => target - 1,
        ReorderInstruction::After if source == target + 1 => return Ok(false),
        ReorderInstruction::After if source > target => target + 1,
        ReorderInstruction::After => target,
    };

    let station = stations.remove(source);
    stations.insert(destination, station);
    reindex_stations(stations);
    debug!(source, destination, %instruction, "reordered station");
    Ok(true)
}

impl SessionDraft {
    /// Re-derive every position-dependent field.
    pub fn reindex(&mut self) {
        reindex_stations(&mut self.stations);
        for (i, slot) in self.slots.iter_mut().enumerate() {
            slot.key = slot_key(i);
        }
    }

    /// Canonical run duration in microseconds.
    pub fn run_duration(&self) -> i64 {
        calculate_run_duration(&self.session, &self.stations)
    }

    fn check_station(&self, index: usize) -> Result<()> {
        if index < self.stations.len() {
            Ok(())
        } else {
            Err(DraftError::StationNotFound(index, self.stations.len()))
        }
    }

    fn slot_mut(&mut self, index: usize) -> Result<&mut Slot> {
        let count = self.slots.len();
        self.slots
            .get_mut(index)
            .ok_or(DraftError::SlotNotFound(index, count))
    }

    // --- Stations ---

    /// Append a station. Returns its index.
    pub fn add_station(&mut self, title: &str, duration: Interval) -> usize {
        self.stations.push(Station {
            title: title.to_string(),
            index: 0,
            duration,
        });
        self.reindex();
        debug!(title, count = self.stations.len(), "added station");
        self.stations.len() - 1
    }

    pub fn update_station_title(&mut self, index: usize, title: &str) -> Result<()> {
        self.check_station(index)?;
        self.stations[index].title = title.to_string();
        Ok(())
    }

    /// Replace a station's duration. Run times go stale until
    /// [`timeline::recalculate_timings`] runs.
    pub fn update_station_duration(&mut self, index: usize, duration: Interval) -> Result<()> {
        self.check_station(index)?;
        self.stations[index].duration = duration;
        Ok(())
    }

    /// Delete every station whose index is in `indices`.
    ///
    /// Indices refer to the snapshot the caller selected from, not to live
    /// positions after earlier deletions. Returns the number removed.
    pub fn delete_stations(&mut self, indices: &[u32]) -> usize {
        let before = self.stations.len();
        self.stations.retain(|station| !indices.contains(&station.index));
        self.reindex();
        let removed = before - self.stations.len();
        info!(removed, remaining = self.stations.len(), "deleted stations");
        removed
    }

    /// Move a station relative to a target row.
    ///
    /// Returns `Ok(false)` when the instruction would leave the order
    /// unchanged.
    pub fn reorder_station(
        &mut self,
        source: usize,
        target: usize,
        instruction: ReorderInstruction,
    ) -> Result<bool> {
        reorder_stations(&mut self.stations, source, target, instruction)
    }

    // --- Slots ---

    /// Append a slot with one circuit and one run. Returns its index.
    pub fn add_slot(&mut self, first_start: ClockTime) -> Result<usize> {
        self.slots.push(Slot {
            key: String::new(),
            runs: Vec::new(),
            circuits: vec![Circuit::default()],
        });
        self.reindex();
        let index = self.slots.len() - 1;
        timeline::add_run(self, index, first_start)?;
        info!(slot = %self.slots[index].key, "added slot");
        Ok(index)
    }

    /// Remove one slot by position. Later slots are re-keyed; run times are
    /// left as they are.
    pub fn remove_slot(&mut self, index: usize) -> Result<Slot> {
        let count = self.slots.len();
        if index >= count {
            return Err(DraftError::SlotNotFound(index, count));
        }
        let removed = self.slots.remove(index);
        self.reindex();
        info!(slot = %removed.key, remaining = self.slots.len(), "removed slot");
        Ok(removed)
    }

    /// Delete every slot whose key is in `keys`. Returns the number removed.
    pub fn delete_slots(&mut self, keys: &[String]) -> usize {
        let before = self.slots.len();
        self.slots.retain(|slot| !keys.contains(&slot.key));
        self.reindex();
        before - self.slots.len()
    }

    // --- Runs ---

    /// Append a run to a slot, chained onto the timeline.
    pub fn add_run(&mut self, slot: usize, first_start: ClockTime) -> Result<usize> {
        timeline::add_run(self, slot, first_start)
    }

    /// Remove one run. Later runs keep their times.
    pub fn delete_run(&mut self, slot: usize, run: usize) -> Result<Run> {
        let slot = self.slot_mut(slot)?;
        if run >= slot.runs.len() {
            return Err(DraftError::RunNotFound {
                slot: slot.key.clone(),
                run,
            });
        }
        Ok(slot.runs.remove(run))
    }

    pub fn set_run_flip_allocation(&mut self, slot: usize, run: usize, flip: bool) -> Result<()> {
        let slot = self.slot_mut(slot)?;
        let key = slot.key.clone();
        let run = slot
            .runs
            .get_mut(run)
            .ok_or(DraftError::RunNotFound { slot: key, run })?;
        run.flip_allocation = flip;
        Ok(())
    }

    // --- Circuits ---

    /// Append a circuit to a slot. Returns its index within the slot.
    pub fn add_circuit(&mut self, slot: usize) -> Result<usize> {
        let slot = self.slot_mut(slot)?;
        slot.circuits.push(Circuit::default());
        Ok(slot.circuits.len() - 1)
    }

    /// Remove a circuit, refusing to remove a slot's last one.
    pub fn delete_circuit(&mut self, slot: usize, circuit: usize) -> Result<()> {
        let slot = self.slot_mut(slot)?;
        if circuit >= slot.circuits.len() {
            return Err(DraftError::CircuitNotFound {
                slot: slot.key.clone(),
                circuit,
            });
        }
        if slot.circuits.len() <= 1 {
            warn!(slot = %slot.key, "refused to delete last circuit");
            return Err(DraftError::LastCircuit(slot.key.clone()));
        }
        slot.circuits.remove(circuit);
        Ok(())
    }

    pub fn set_circuit_female_only(
        &mut self,
        slot: usize,
        circuit: usize,
        female_only: bool,
    ) -> Result<()> {
        let slot = self.slot_mut(slot)?;
        let key = slot.key.clone();
        let circuit = slot
            .circuits
            .get_mut(circuit)
            .ok_or(DraftError::CircuitNotFound { slot: key, circuit })?;
        circuit.female_only = female_only;
        Ok(())
    }
}
