use anyhow::bail;
use chrono::NaiveDate;

use mockomatic_session::state::interval::{to_minute_second_string, Interval};
use mockomatic_session::state::keys::{run_ordinal, slot_key};
use mockomatic_session::state::schema::SessionDraft;
use mockomatic_session::store::DraftStore;

use super::{parse_duration, Context};
use crate::OutputFormat;

pub fn new(ctx: &Context, force: bool) -> anyhow::Result<u8> {
    if ctx.draft_path.exists() && !force {
        bail!(
            "Draft already exists at {}. Use --force to start over.",
            ctx.draft_path.display()
        );
    }
    let store = DraftStore::new(&ctx.config);
    ctx.save(&store)?;
    println!("Created empty draft at {}", ctx.draft_path.display());
    Ok(0)
}

fn on_off(value: bool) -> &'static str {
    if value {
        "on"
    } else {
        "off"
    }
}

fn render(draft: &SessionDraft) -> String {
    let session = &draft.session;
    let mut out = String::new();

    let date = session
        .scheduled_date
        .map(|d| d.to_string())
        .unwrap_or_else(|| "(no date)".to_string());
    let location = if session.location.is_empty() {
        "(no location)"
    } else {
        session.location.as_str()
    };
    out.push_str(&format!("Session: {} on {}\n", location, date));

    let feedback = match (session.feedback, session.feedback_duration) {
        (true, Some(d)) => format!("on ({})", to_minute_second_string(&d)),
        (true, None) => "on (no duration)".to_string(),
        (false, _) => "off".to_string(),
    };
    out.push_str(&format!(
        "Intermission: {}  Feedback: {}  Static at end: {}\n",
        to_minute_second_string(&session.intermission_duration),
        feedback,
        on_off(session.static_at_end)
    ));
    out.push_str(&format!(
        "Run duration: {}\n",
        to_minute_second_string(&Interval::from_micros(draft.run_duration()))
    ));

    out.push_str(&format!("\nStations ({})\n", draft.stations.len()));
    for station in &draft.stations {
        out.push_str(&format!(
            "  {:<4} {:<30} {}\n",
            station.index,
            station.title,
            to_minute_second_string(&station.duration)
        ));
    }

    out.push_str(&format!("\nSlots ({})\n", draft.slots.len()));
    for slot in &draft.slots {
        let time = slot
            .slot_time()
            .map(|t| t.to_string())
            .unwrap_or_else(|| "--".to_string());
        let span = slot
            .span()
            .map(|(start, end)| format!("{} - {}", start, end))
            .unwrap_or_else(|| "no runs".to_string());
        let circuits: Vec<String> = slot
            .circuits
            .iter()
            .enumerate()
            .map(|(i, c)| {
                if c.female_only {
                    format!("{} (female only)", slot_key(i))
                } else {
                    slot_key(i)
                }
            })
            .collect();
        out.push_str(&format!(
            "  {} [{}] {}  circuits: {}\n",
            slot.key,
            time,
            span,
            circuits.join(", ")
        ));
        for (i, run) in slot.runs.iter().enumerate() {
            let flip = if run.flip_allocation { "  flip" } else { "" };
            out.push_str(&format!(
                "    {:<5} {} - {}{}\n",
                run_ordinal(i + 1),
                run.scheduled_start,
                run.scheduled_end,
                flip
            ));
        }
    }
    out
}

pub fn show(ctx: &Context, format: OutputFormat) -> anyhow::Result<u8> {
    let store = ctx.load_store()?;
    match format {
        OutputFormat::Json => println!("{}", serde_json::to_string_pretty(store.draft())?),
        OutputFormat::Text => print!("{}", render(store.draft())),
    }
    Ok(0)
}

pub struct SettingsChange {
    pub location: Option<String>,
    pub date: Option<String>,
    pub intermission: Option<String>,
    pub feedback: Option<bool>,
    pub feedback_duration: Option<String>,
    pub static_at_end: Option<bool>,
}

fn is_none_value(raw: &str) -> bool {
    matches!(raw.trim().to_lowercase().as_str(), "none" | "")
}

pub fn settings(ctx: &Context, change: SettingsChange) -> anyhow::Result<u8> {
    let mut store = ctx.load_store()?;

    // Parse everything before touching the draft.
    let date = match change.date.as_deref() {
        Some(raw) if is_none_value(raw) => Some(None),
        Some(raw) => Some(Some(NaiveDate::parse_from_str(raw.trim(), "%Y-%m-%d").map_err(
            |_| anyhow::anyhow!("Invalid date '{}'. Expected YYYY-MM-DD", raw),
        )?)),
        None => None,
    };
    let intermission = change.intermission.as_deref().map(parse_duration).transpose()?;
    let feedback_duration = match change.feedback_duration.as_deref() {
        Some(raw) if is_none_value(raw) => Some(None),
        Some(raw) => Some(Some(parse_duration(raw)?)),
        None => None,
    };

    if let Some(location) = &change.location {
        store.set_location(location);
    }
    if let Some(date) = date {
        store.set_scheduled_date(date);
    }
    if let Some(intermission) = intermission {
        store.set_intermission_duration(intermission);
    }
    if let Some(feedback) = change.feedback {
        store.set_feedback(feedback);
    }
    if let Some(duration) = feedback_duration {
        store.set_feedback_duration(duration);
    }
    if let Some(static_at_end) = change.static_at_end {
        store.set_static_at_end(static_at_end);
    }

    if !store.is_dirty() {
        eprintln!("Nothing to change");
        return Ok(0);
    }
    ctx.save(&store)?;
    println!(
        "Run duration: {}",
        to_minute_second_string(&Interval::from_micros(store.draft().run_duration()))
    );
    Ok(0)
}

pub fn recalc(ctx: &Context) -> anyhow::Result<u8> {
    let mut store = ctx.load_store()?;
    let corrected = store.recalculate();
    if corrected > 0 {
        ctx.save(&store)?;
    }
    println!("Corrected {} run(s)", corrected);
    Ok(0)
}

pub fn validate(ctx: &Context) -> anyhow::Result<u8> {
    let store = ctx.load_store()?;
    let result = store.validate();

    for warning in &result.warnings {
        println!("warning: {}", warning);
    }
    for error in &result.errors {
        println!("error: {}", error);
    }

    if result.is_valid() {
        println!("Draft is valid");
        Ok(0)
    } else {
        Ok(1)
    }
}
