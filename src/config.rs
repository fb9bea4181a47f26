// config.rs

use crate::clock::{DEFAULT_RESOLUTION, DEFAULT_TEMPO};
use log::debug;
use serde::Deserialize;
use std::fmt;
use std::path::Path;
use std::time::Duration;

pub const DEFAULT_TICK_PERIOD_MS: u64 = 4;
pub const ENV_PREFIX: &str = "MIDILATCH";

#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct EngineConfig {
    /// Ticks per quarter note
    pub resolution: u32,
    /// Period of the background clock, in milliseconds
    pub tick_period_ms: u64,
    /// Tempo in effect until the first beat poll
    pub default_tempo: f64,
    /// Prefix for the client and port names registered with the MIDI subsystem
    pub client_name: String,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            resolution: DEFAULT_RESOLUTION,
            tick_period_ms: DEFAULT_TICK_PERIOD_MS,
            default_tempo: DEFAULT_TEMPO,
            client_name: "midilatch".to_string(),
        }
    }
}

#[derive(Debug)]
pub enum SettingsError {
    /// The file or environment could not be read or parsed
    Load(::config::ConfigError),
    /// A value is out of range
    Invalid(String),
}

impl fmt::Display for SettingsError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SettingsError::Load(e) => write!(f, "failed to load configuration: {}", e),
            SettingsError::Invalid(msg) => write!(f, "invalid configuration: {}", msg),
        }
    }
}

impl std::error::Error for SettingsError {}

impl From<::config::ConfigError> for SettingsError {
    fn from(err: ::config::ConfigError) -> Self {
        SettingsError::Load(err)
    }
}

impl EngineConfig {
    /// Layers built-in defaults, then the optional file, then `MIDILATCH_*`
    /// environment variables.
    pub fn load(path: Option<&Path>) -> Result<Self, SettingsError> {
        let defaults = Self::default();
        let mut builder = ::config::Config::builder()
            .set_default("resolution", i64::from(defaults.resolution))?
            .set_default("tick_period_ms", defaults.tick_period_ms as i64)?
            .set_default("default_tempo", defaults.default_tempo)?
            .set_default("client_name", defaults.client_name.as_str())?;

        if let Some(path) = path {
            debug!("Loading configuration from {}", path.display());
            builder = builder.add_source(::config::File::from(path).required(false));
        }

        let settings = builder
            .add_source(::config::Environment::with_prefix(ENV_PREFIX))
            .build()?;

        let config: EngineConfig = settings.try_deserialize()?;
        debug!("Loaded configuration: {:?}", config);
        config.validate()
    }

    pub fn validate(self) -> Result<Self, SettingsError> {
        if self.resolution == 0 {
            return Err(SettingsError::Invalid(
                "resolution must be at least 1 tick per beat".to_string(),
            ));
        }
        if self.tick_period_ms == 0 {
            return Err(SettingsError::Invalid(
                "tick_period_ms must be at least 1".to_string(),
            ));
        }
        if !(self.default_tempo.is_finite() && self.default_tempo > 0.0) {
            return Err(SettingsError::Invalid(format!(
                "default_tempo must be positive, got {}",
                self.default_tempo
            )));
        }
        Ok(self)
    }

    pub fn tick_period(&self) -> Duration {
        Duration::from_millis(self.tick_period_ms)
    }
}
