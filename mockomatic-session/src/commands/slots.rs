use mockomatic_session::state::interval::to_minute_second_string;
use mockomatic_session::state::interval::Interval;
use mockomatic_session::state::keys::{run_ordinal, slot_key};
use mockomatic_session::state::timeline::{RunField, RunPosition};

use super::{parse_clock, parse_key, parse_run, rejected, Context};

pub fn add_slot(ctx: &Context) -> anyhow::Result<u8> {
    let mut store = ctx.load_store()?;
    let index = match store.add_slot() {
        Ok(index) => index,
        Err(e) => return Ok(rejected(e)),
    };
    ctx.save(&store)?;

    let slot = &store.draft().slots[index];
    if let Some((start, end)) = slot.span() {
        println!("Added slot {} ({} - {})", slot.key, start, end);
    }
    Ok(0)
}

pub fn remove_slots(ctx: &Context, keys: &[String]) -> anyhow::Result<u8> {
    let keys: Vec<String> = keys.iter().map(|k| k.trim().to_uppercase()).collect();
    let mut store = ctx.load_store()?;
    let removed = store.delete_slots(&keys);
    if removed > 0 {
        ctx.save(&store)?;
    }
    println!(
        "Removed {} slot(s), {} remaining",
        removed,
        store.draft().slots.len()
    );
    Ok(0)
}

pub fn add_run(ctx: &Context, slot: &str) -> anyhow::Result<u8> {
    let slot = parse_key("slot", slot)?;
    let mut store = ctx.load_store()?;
    let run = match store.add_run(slot) {
        Ok(run) => run,
        Err(e) => return Ok(rejected(e)),
    };
    ctx.save(&store)?;

    let added = store.draft().slots[slot].runs[run];
    println!(
        "Added {} run to slot {} ({} - {})",
        run_ordinal(run + 1),
        slot_key(slot),
        added.scheduled_start,
        added.scheduled_end
    );
    Ok(0)
}

pub fn delete_run(ctx: &Context, slot: &str, run: usize) -> anyhow::Result<u8> {
    let slot = parse_key("slot", slot)?;
    let run = parse_run(run)?;
    let mut store = ctx.load_store()?;
    if let Err(e) = store.delete_run(slot, run) {
        return Ok(rejected(e));
    }
    ctx.save(&store)?;
    println!("Deleted {} run of slot {}", run_ordinal(run + 1), slot_key(slot));
    Ok(0)
}

pub fn set_run_time(
    ctx: &Context,
    slot: &str,
    run: usize,
    field: RunField,
    time: &str,
) -> anyhow::Result<u8> {
    let pos = RunPosition::new(parse_key("slot", slot)?, parse_run(run)?);
    let time = parse_clock(time)?;
    let mut store = ctx.load_store()?;
    let delta = match store.set_run_time(pos, field, time) {
        Ok(delta) => delta,
        Err(e) => return Ok(rejected(e)),
    };
    ctx.save(&store)?;

    let sign = if delta < 0 { "-" } else { "+" };
    println!(
        "Shifted by {}{}",
        sign,
        to_minute_second_string(&Interval::from_micros(delta.abs()))
    );
    Ok(0)
}

pub fn flip_run(ctx: &Context, slot: &str, run: usize, value: bool) -> anyhow::Result<u8> {
    let slot = parse_key("slot", slot)?;
    let run = parse_run(run)?;
    let mut store = ctx.load_store()?;
    if let Err(e) = store.set_run_flip_allocation(slot, run, value) {
        return Ok(rejected(e));
    }
    ctx.save(&store)?;
    Ok(0)
}

pub fn add_circuit(ctx: &Context, slot: &str) -> anyhow::Result<u8> {
    let slot = parse_key("slot", slot)?;
    let mut store = ctx.load_store()?;
    let circuit = match store.add_circuit(slot) {
        Ok(circuit) => circuit,
        Err(e) => return Ok(rejected(e)),
    };
    ctx.save(&store)?;
    println!("Added circuit {} to slot {}", slot_key(circuit), slot_key(slot));
    Ok(0)
}

pub fn delete_circuit(ctx: &Context, slot: &str, circuit: &str) -> anyhow::Result<u8> {
    let slot = parse_key("slot", slot)?;
    let circuit = parse_key("circuit", circuit)?;
    let mut store = ctx.load_store()?;
    if let Err(e) = store.delete_circuit(slot, circuit) {
        return Ok(rejected(e));
    }
    ctx.save(&store)?;
    Ok(0)
}

pub fn set_female_only(ctx: &Context, slot: &str, circuit: &str, value: bool) -> anyhow::Result<u8> {
    let slot = parse_key("slot", slot)?;
    let circuit = parse_key("circuit", circuit)?;
    let mut store = ctx.load_store()?;
    if let Err(e) = store.set_circuit_female_only(slot, circuit, value) {
        return Ok(rejected(e));
    }
    ctx.save(&store)?;
    Ok(0)
}
