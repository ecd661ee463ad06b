use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use chrono::FixedOffset;
use serde::Deserialize;

use crate::state::clock::ClockTime;
use crate::state::timeline::default_first_start;

pub const DEFAULT_API_BASE: &str = "http://localhost:8080/api/v1";
pub const DEFAULT_STATION_SECONDS: i64 = 60;

/// Mockomatic configuration read from `~/.config/mockomatic/config.toml`.
///
/// Environment variables override file values.
#[derive(Debug, Clone, PartialEq)]
pub struct MockomaticConfig {
    pub api_base: String,
    pub auth_token: Option<String>,
    pub csrf_token: Option<String>,
    /// Organisation name sent with every created session.
    pub organisation: Option<String>,
    /// Start of the very first run when the timeline is empty.
    pub first_run_start: ClockTime,
    pub default_station_seconds: i64,
    /// Offset used when converting run times to absolute timestamps.
    /// `None` means the machine's local offset on the scheduled date.
    pub utc_offset_minutes: Option<i32>,
}

impl Default for MockomaticConfig {
    fn default() -> Self {
        MockomaticConfig {
            api_base: DEFAULT_API_BASE.to_string(),
            auth_token: None,
            csrf_token: None,
            organisation: None,
            first_run_start: default_first_start(),
            default_station_seconds: DEFAULT_STATION_SECONDS,
            utc_offset_minutes: None,
        }
    }
}

/// Raw TOML file structure.
#[derive(Debug, Deserialize, Default)]
struct ConfigFile {
    api_base: Option<String>,
    auth_token: Option<String>,
    csrf_token: Option<String>,
    organisation: Option<String>,
    first_run_start: Option<String>,
    default_station_seconds: Option<i64>,
    utc_offset_minutes: Option<i32>,
}

pub fn config_path() -> Result<PathBuf> {
    let dir = dirs::config_dir().context("Could not determine config directory")?;
    Ok(dir.join("mockomatic").join("config.toml"))
}

impl MockomaticConfig {
    /// Load configuration from file and environment variables.
    ///
    /// A missing file yields defaults. `path` overrides the default location.
    pub fn load(path: Option<&Path>) -> Result<Self> {
        let path = match path {
            Some(p) => p.to_path_buf(),
            None => config_path()?,
        };

        let file_config = if path.exists() {
            let content = std::fs::read_to_string(&path)
                .with_context(|| format!("failed to read config: {}", path.display()))?;
            toml::from_str::<ConfigFile>(&content)
                .with_context(|| format!("failed to parse config: {}", path.display()))?
        } else {
            ConfigFile::default()
        };

        Self::from_file_and_env(file_config, |key| std::env::var(key).ok())
    }

    fn from_file_and_env(
        file_config: ConfigFile,
        env: impl Fn(&str) -> Option<String>,
    ) -> Result<Self> {
        let ConfigFile {
            api_base,
            auth_token,
            csrf_token,
            organisation,
            first_run_start,
            default_station_seconds,
            utc_offset_minutes,
        } = file_config;

        let api_base = env("MOCKOMATIC_API_BASE")
            .or(api_base)
            .filter(|url| !url.is_empty())
            .unwrap_or_else(|| DEFAULT_API_BASE.to_string());
        let auth_token = env("MOCKOMATIC_AUTH_TOKEN")
            .or(auth_token)
            .filter(|t| !t.is_empty());
        let csrf_token = env("MOCKOMATIC_CSRF_TOKEN")
            .or(csrf_token)
            .filter(|t| !t.is_empty());
        let organisation = env("MOCKOMATIC_ORGANISATION")
            .or(organisation)
            .map(|o| o.trim().to_string())
            .filter(|o| !o.is_empty());

        let utc_offset_minutes = match env("MOCKOMATIC_UTC_OFFSET") {
            Some(raw) => Some(raw.trim().parse::<i32>().with_context(|| {
                format!("MOCKOMATIC_UTC_OFFSET must be whole minutes, got '{}'", raw)
            })?),
            None => utc_offset_minutes,
        };
        if let Some(minutes) = utc_offset_minutes {
            if offset_from_minutes(minutes).is_none() {
                anyhow::bail!("utc_offset_minutes out of range: {}", minutes);
            }
        }

        let default_station_seconds = default_station_seconds.unwrap_or(DEFAULT_STATION_SECONDS);
        if default_station_seconds < 0 {
            anyhow::bail!(
                "default_station_seconds must not be negative, got {}",
                default_station_seconds
            );
        }

        Ok(MockomaticConfig {
            api_base: api_base.trim_end_matches('/').to_string(),
            auth_token,
            csrf_token,
            organisation,
            first_run_start: first_run_start
                .map(|s| ClockTime::parse_lenient(&s))
                .unwrap_or_else(default_first_start),
            default_station_seconds,
            utc_offset_minutes,
        })
    }

    /// The configured offset, if one was set.
    pub fn utc_offset(&self) -> Option<FixedOffset> {
        self.utc_offset_minutes.and_then(offset_from_minutes)
    }
}

fn offset_from_minutes(minutes: i32) -> Option<FixedOffset> {
    minutes.checked_mul(60).and_then(FixedOffset::east_opt)
}
