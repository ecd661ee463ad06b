use mockomatic_session::state::draft::ReorderInstruction;
use mockomatic_session::state::interval::to_minute_second_string;

use super::{parse_duration, rejected, Context};

pub fn add(ctx: &Context, title: &str, duration: Option<&str>) -> anyhow::Result<u8> {
    let duration = duration.map(parse_duration).transpose()?;
    let mut store = ctx.load_store()?;
    let index = store.add_station(title, duration);
    ctx.save(&store)?;

    let station = &store.draft().stations[index];
    println!(
        "Added station {} '{}' ({})",
        station.index,
        station.title,
        to_minute_second_string(&station.duration)
    );
    Ok(0)
}

pub fn update(
    ctx: &Context,
    index: usize,
    title: Option<&str>,
    duration: Option<&str>,
) -> anyhow::Result<u8> {
    let duration = duration.map(parse_duration).transpose()?;
    let mut store = ctx.load_store()?;

    if let Some(title) = title {
        if let Err(e) = store.update_station_title(index, title) {
            return Ok(rejected(e));
        }
    }
    if let Some(duration) = duration {
        if let Err(e) = store.update_station_duration(index, duration) {
            return Ok(rejected(e));
        }
    }

    ctx.save(&store)?;
    println!("Updated station {}", index);
    Ok(0)
}

pub fn delete(ctx: &Context, indices: &[u32]) -> anyhow::Result<u8> {
    let mut store = ctx.load_store()?;
    let removed = store.delete_stations(indices);
    if removed > 0 {
        ctx.save(&store)?;
    }
    println!(
        "Deleted {} station(s), {} remaining",
        removed,
        store.draft().stations.len()
    );
    Ok(0)
}

pub fn reorder(ctx: &Context, source: usize, target: usize, instruction: &str) -> anyhow::Result<u8> {
    let instruction: ReorderInstruction = instruction.parse().map_err(|e: String| anyhow::anyhow!(e))?;
    let mut store = ctx.load_store()?;
    match store.reorder_station(source, target, instruction) {
        Ok(true) => {
            ctx.save(&store)?;
            let titles: Vec<&str> = store
                .draft()
                .stations
                .iter()
                .map(|s| s.title.as_str())
                .collect();
            println!("Order: {}", titles.join(", "));
            Ok(0)
        }
        Ok(false) => {
            println!("Order unchanged");
            Ok(0)
        }
        Err(e) => Ok(rejected(e)),
    }
}
