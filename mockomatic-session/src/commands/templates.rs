use mockomatic_session::state::interval::to_minute_second_string;
use mockomatic_session::store::DraftStore;

use super::{block_on, rejected, report, Context};
use crate::OutputFormat;

pub fn list(ctx: &Context, format: OutputFormat) -> anyhow::Result<u8> {
    let api = ctx.api();
    let mut store = DraftStore::new(&ctx.config);
    if let Err(e) = block_on(store.fetch_templates(&api))? {
        return report(e);
    }

    let templates = store.templates();
    if format == OutputFormat::Json {
        println!("{}", serde_json::to_string_pretty(templates)?);
        return Ok(0);
    }

    if templates.is_empty() {
        println!("No templates.");
        return Ok(0);
    }
    println!("{:<38} {:<30} {:<9} {:<13}", "ID", "NAME", "STATIONS", "INTERMISSION");
    println!("{}", "-".repeat(92));
    for template in templates {
        let id = template.id.map(|id| id.to_string()).unwrap_or_default();
        println!(
            "{:<38} {:<30} {:<9} {:<13}",
            id,
            template.name,
            template.stations.len(),
            to_minute_second_string(&template.intermission_duration)
        );
    }
    Ok(0)
}

pub fn apply(ctx: &Context, template: &str) -> anyhow::Result<u8> {
    let api = ctx.api();
    let mut store = ctx.load_store()?;
    if let Err(e) = block_on(store.fetch_templates(&api))? {
        return report(e);
    }
    if let Err(e) = store.apply_template_by(template) {
        return Ok(rejected(e));
    }
    ctx.save(&store)?;
    println!(
        "Applied template '{}' ({} stations)",
        template,
        store.draft().stations.len()
    );
    Ok(0)
}

pub fn create(ctx: &Context, name: &str) -> anyhow::Result<u8> {
    let api = ctx.api();
    let store = ctx.load_store()?;
    if let Err(e) = block_on(store.create_template(&api, name))? {
        return report(e);
    }
    println!("Created template '{}'", name);
    Ok(0)
}
