//! Process configuration loaded from the environment
//!
//! - **Version**: 1.0.0
//! - **Since**: 1.0.0

use anyhow::{anyhow, Context, Result};
use std::env;
use std::path::PathBuf;

pub const DEFAULT_BIRTHDAY_CONFIG_PATH: &str = "config/birthdays.yaml";
pub const DEFAULT_PERSON_INDEX_PATH: &str = "data/person_index.json";
pub const DEFAULT_REMINDER_STATE_PATH: &str = "data/reminder_state.json";

#[derive(Debug, Clone)]
pub struct Config {
    pub discord_token: String,
    /// Channel that receives reminder messages
    pub reminder_channel_id: u64,
    /// Only user allowed to run chat commands; none disables them
    pub allowed_user_id: Option<u64>,
    /// Channel chat commands are accepted in
    pub command_channel_id: u64,
    pub birthday_config_path: PathBuf,
    pub person_index_path: PathBuf,
    pub reminder_state_path: PathBuf,
    pub log_level: String,
}

impl Config {
    pub fn from_env() -> Result<Self> {
        let discord_token = required_env("DISCORD_TOKEN")?;
        let reminder_channel_id = required_env("REMINDER_CHANNEL_ID")?
            .parse::<u64>()
            .context("REMINDER_CHANNEL_ID must be a numeric Discord channel id")?;
        let allowed_user_id = optional_id_env("ALLOWED_USER_ID")?;
        let command_channel_id =
            optional_id_env("COMMAND_CHANNEL_ID")?.unwrap_or(reminder_channel_id);

        Ok(Config {
            discord_token,
            reminder_channel_id,
            allowed_user_id,
            command_channel_id,
            birthday_config_path: path_env("BIRTHDAY_CONFIG_PATH", DEFAULT_BIRTHDAY_CONFIG_PATH),
            person_index_path: path_env("PERSON_INDEX_PATH", DEFAULT_PERSON_INDEX_PATH),
            reminder_state_path: path_env("REMINDER_STATE_PATH", DEFAULT_REMINDER_STATE_PATH),
            log_level: env::var("LOG_LEVEL").unwrap_or_else(|_| "info".to_string()),
        })
    }

    /// Paths only, for tooling that never talks to Discord
    pub fn paths_from_env() -> (PathBuf, PathBuf) {
        (
            path_env("BIRTHDAY_CONFIG_PATH", DEFAULT_BIRTHDAY_CONFIG_PATH),
            path_env("PERSON_INDEX_PATH", DEFAULT_PERSON_INDEX_PATH),
        )
    }
}

fn required_env(name: &str) -> Result<String> {
    match env::var(name) {
        Ok(value) if !value.trim().is_empty() => Ok(value.trim().to_string()),
        _ => Err(anyhow!("Missing required environment variable: {name}")),
    }
}

fn optional_id_env(name: &str) -> Result<Option<u64>> {
    match env::var(name) {
        Ok(value) if !value.trim().is_empty() => value
            .trim()
            .parse::<u64>()
            .map(Some)
            .with_context(|| format!("{name} must be a numeric Discord id")),
        _ => Ok(None),
    }
}

fn path_env(name: &str, default: &str) -> PathBuf {
    env::var(name)
        .ok()
        .filter(|v| !v.trim().is_empty())
        .map(PathBuf::from)
        .unwrap_or_else(|| PathBuf::from(default))
}
