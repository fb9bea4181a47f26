use crate::config::EngineConfig;
use clap::Parser;
use std::path::PathBuf;

#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
pub struct Args {
    /// List available MIDI devices
    #[arg(long)]
    pub device_list: bool,

    /// Configuration file (TOML, YAML or JSON)
    #[arg(long, short = 'c')]
    pub config: Option<PathBuf>,

    /// Tempo in beats per minute
    #[arg(long, short = 'b')]
    pub tempo: Option<f64>,

    /// Ticks per quarter note
    #[arg(long)]
    pub resolution: Option<u32>,

    /// Background clock period in milliseconds
    #[arg(long)]
    pub tick_period_ms: Option<u64>,

    /// Send a test note on startup
    #[arg(long)]
    pub test_note: bool,

    /// Log to stderr (filtered by RUST_LOG) instead of the log file
    #[arg(long)]
    pub log_stderr: bool,
}

impl Args {
    /// Applies command-line overrides on top of file and environment settings.
    pub fn apply(&self, mut config: EngineConfig) -> EngineConfig {
        if let Some(tempo) = self.tempo {
            config.default_tempo = tempo;
        }
        if let Some(resolution) = self.resolution {
            config.resolution = resolution;
        }
        if let Some(period) = self.tick_period_ms {
            config.tick_period_ms = period;
        }
        config
    }
}

pub fn handle_device_list() -> Vec<String> {
    // Re-export from the crate root
    crate::handle_device_list()
}
