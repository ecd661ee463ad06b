use anyhow::Context as _;
use uuid::Uuid;

use mockomatic_session::api::SessionApi;
use mockomatic_session::store::DraftStore;

use super::{block_on, report, Context};
use crate::OutputFormat;

pub fn push(ctx: &Context) -> anyhow::Result<u8> {
    let api = ctx.api();
    let mut store = ctx.load_store()?;
    let record = match block_on(store.push(&api))? {
        Ok(record) => record,
        Err(e) => return report(e),
    };
    ctx.save(&store)?;
    println!("Created session {}", record.id);
    Ok(0)
}

pub fn fetch(ctx: &Context, id: &str) -> anyhow::Result<u8> {
    let id = Uuid::parse_str(id.trim()).with_context(|| format!("Invalid session id '{}'", id))?;
    let api = ctx.api();
    let mut store = DraftStore::new(&ctx.config);
    if let Err(e) = block_on(store.load_session(&api, id))? {
        return report(e);
    }
    ctx.save(&store)?;
    let draft = store.draft();
    println!(
        "Fetched session {} ({} stations, {} slots) into {}",
        id,
        draft.stations.len(),
        draft.slots.len(),
        ctx.draft_path.display()
    );
    Ok(0)
}

pub fn delete_sessions(ctx: &Context, ids: &[String]) -> anyhow::Result<u8> {
    let ids = ids
        .iter()
        .map(|id| {
            Uuid::parse_str(id.trim()).with_context(|| format!("Invalid session id '{}'", id))
        })
        .collect::<anyhow::Result<Vec<_>>>()?;
    let api = ctx.api();
    if let Err(e) = block_on(api.delete_sessions(&ids))? {
        return report(e);
    }
    println!("Deleted {} session(s)", ids.len());
    Ok(0)
}

pub fn list_sessions(ctx: &Context, format: OutputFormat) -> anyhow::Result<u8> {
    let api = ctx.api();
    let sessions = match block_on(api.list_sessions())? {
        Ok(sessions) => sessions,
        Err(e) => return report(e),
    };

    if format == OutputFormat::Json {
        println!("{}", serde_json::to_string_pretty(&sessions)?);
        return Ok(0);
    }

    if sessions.is_empty() {
        println!("No sessions.");
        return Ok(0);
    }
    println!("{:<38} {:<12} {:<30} {:<10}", "ID", "DATE", "LOCATION", "STATUS");
    println!("{}", "-".repeat(92));
    for session in sessions {
        let status = session
            .status
            .map(|s| s.to_string())
            .unwrap_or_else(|| "-".to_string());
        println!(
            "{:<38} {:<12} {:<30} {:<10}",
            session.id.to_string(),
            session.scheduled_date.to_string(),
            session.location,
            status
        );
    }
    Ok(0)
}
