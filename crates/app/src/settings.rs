//! Handles settings for the host. Configuration is read from `evenly.toml`
//! in the working directory, when present; every key has a default so the
//! file is optional.
use config::{Config, ConfigError, File};
use serde::Deserialize;

#[derive(Debug, Deserialize)]
pub struct Settings {
    /// Path of the JSON snapshot file.
    pub state_path: String,
    /// Log level filter for the tracing subscriber.
    pub level: String,
    /// Display name used when a fresh snapshot is created.
    pub display_name: String,
}

impl Settings {
    pub fn new() -> Result<Self, ConfigError> {
        let settings = Config::builder()
            .set_default("state_path", "evenly.json")?
            .set_default("level", "info")?
            .set_default("display_name", "You")?
            .add_source(File::with_name("evenly").required(false))
            .build()?;

        settings.try_deserialize()
    }
}
