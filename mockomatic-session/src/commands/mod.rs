pub mod draft;
pub mod remote;
pub mod slots;
pub mod stations;
pub mod templates;

use std::path::PathBuf;

use anyhow::{bail, Context as _};

use mockomatic_session::api::HttpSessionApi;
use mockomatic_session::config::MockomaticConfig;
use mockomatic_session::error::DraftError;
use mockomatic_session::state::clock::ClockTime;
use mockomatic_session::state::interval::{from_minute_second_string, normalize_minute_seconds, Interval};
use mockomatic_session::state::keys::key_index;
use mockomatic_session::state::schema::SessionDraft;
use mockomatic_session::store::DraftStore;

/// Everything a command needs: where the draft lives and how to reach the API.
pub struct Context {
    pub draft_path: PathBuf,
    pub config: MockomaticConfig,
}

impl Context {
    pub fn new(draft_path: PathBuf, config: MockomaticConfig) -> Self {
        Context { draft_path, config }
    }

    pub fn load_store(&self) -> anyhow::Result<DraftStore> {
        if !self.draft_path.exists() {
            bail!(
                "No draft at {}. Run 'mockomatic-session new' first.",
                self.draft_path.display()
            );
        }
        let draft = SessionDraft::load(&self.draft_path)?;
        Ok(DraftStore::with_draft(draft, &self.config))
    }

    pub fn save(&self, store: &DraftStore) -> anyhow::Result<()> {
        store.draft().save(&self.draft_path)
    }

    pub fn api(&self) -> HttpSessionApi {
        HttpSessionApi::from_config(&self.config)
    }
}

/// Report a refused edit. Nothing is saved.
pub fn rejected(err: DraftError) -> u8 {
    eprintln!("Rejected: {}", err);
    1
}

/// Map an API-backed operation's error to an exit code. Transport and
/// decoding failures are errors; anything else is a refusal.
pub fn report(err: DraftError) -> anyhow::Result<u8> {
    match err {
        DraftError::Api(_) | DraftError::Serialization(_) => Err(err.into()),
        other => Ok(rejected(other)),
    }
}

/// Run a network call to completion.
pub fn block_on<F: std::future::Future>(future: F) -> anyhow::Result<F::Output> {
    let rt = tokio::runtime::Runtime::new().context("failed to start async runtime")?;
    Ok(rt.block_on(future))
}

/// Parse a user-entered `MM:SS` duration.
pub fn parse_duration(raw: &str) -> anyhow::Result<Interval> {
    match normalize_minute_seconds(raw) {
        Some(normalized) => Ok(from_minute_second_string(&normalized)),
        None => bail!("Invalid duration '{}'. Expected MM:SS", raw),
    }
}

/// Parse a user-entered time of day. Out-of-range components are clamped
/// (`08:75` reads as `08:59`); input without any digits is refused.
pub fn parse_clock(raw: &str) -> anyhow::Result<ClockTime> {
    if !raw.chars().any(|c| c.is_ascii_digit()) {
        bail!("Invalid time '{}'. Expected HH:MM or HH:MM:SS", raw.trim());
    }
    Ok(ClockTime::parse_lenient(raw))
}

/// Slot or circuit position from its letter key.
pub fn parse_key(kind: &str, raw: &str) -> anyhow::Result<usize> {
    key_index(&raw.trim().to_uppercase())
        .ok_or_else(|| anyhow::anyhow!("Invalid {} key '{}'. Expected letters such as A or AB", kind, raw))
}

/// Zero-based run position from a one-based run number.
pub fn parse_run(number: usize) -> anyhow::Result<usize> {
    if number == 0 {
        bail!("Run numbers start at 1");
    }
    Ok(number - 1)
}
