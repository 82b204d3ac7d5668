//! Application settings, read from `settings.toml`.
//!
//! See `settings.toml.example` for the available keys.
use config::{Config, ConfigError, File};
use serde::Deserialize;

#[derive(Debug, Deserialize)]
pub struct App {
    #[serde(default = "default_level")]
    pub level: String,
}

#[derive(Debug, Deserialize)]
pub struct Database {
    /// Path of the sqlite file. Omit it for an in-memory database.
    pub sqlite: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct Telegram {
    pub token: String,
    /// Telegram user ids allowed to talk to the bot. Empty means everyone.
    #[serde(default)]
    pub allowed_users: Vec<u64>,
    #[serde(default = "default_grace_seconds")]
    pub undo_grace_seconds: u64,
}

#[derive(Debug, Deserialize)]
pub struct Settings {
    pub app: App,
    pub database: Database,
    pub telegram: Telegram,
}

fn default_level() -> String {
    "info".to_string()
}

fn default_grace_seconds() -> u64 {
    telegram_bot::DEFAULT_GRACE_SECONDS
}

impl Settings {
    pub fn new() -> Result<Self, ConfigError> {
        let settings = Config::builder()
            .add_source(File::with_name("settings"))
            .build()?;

        settings.try_deserialize()
    }
}
