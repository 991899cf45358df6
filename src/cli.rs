//! Command-line arguments shared by `hostmon` and `hostmon-service`

use std::path::PathBuf;
use std::time::Duration;

use clap::Args;
use tracing_subscriber::{EnvFilter, FmtSubscriber};

use crate::core::config::{parse_duration, ConfigOverrides};

/// Agent settings; anything left unset falls back to env vars, the config
/// file and then the built-in defaults.
#[derive(Args, Debug, Clone, Default)]
pub struct AgentArgs {
    /// Seq server URL (env: SEQ_URL)
    #[arg(long)]
    pub seq_url: Option<String>,

    /// Seq API key (env: SEQ_API_KEY)
    #[arg(long)]
    pub seq_api_key: Option<String>,

    /// Sampling interval, e.g. 15s, 1m30s (env: INTERVAL)
    #[arg(long, value_parser = parse_duration)]
    pub interval: Option<Duration>,

    /// Print metrics to the console instead of sending them to Seq
    #[arg(short, long)]
    pub debug: bool,

    /// Windows service name
    #[arg(long)]
    pub service_name: Option<String>,

    /// Path whose filesystem is reported as the disk
    #[arg(long)]
    pub disk_path: Option<PathBuf>,

    /// Config file (default: <config dir>/hostmon/config.toml)
    #[arg(long)]
    pub config: Option<PathBuf>,
}

impl AgentArgs {
    pub fn overrides(&self) -> ConfigOverrides {
        ConfigOverrides {
            seq_url: self.seq_url.clone(),
            seq_api_key: self.seq_api_key.clone(),
            interval: self.interval,
            debug: self.debug,
            service_name: self.service_name.clone(),
            disk_path: self.disk_path.clone(),
        }
    }
}

/// Install the global `tracing` subscriber.
///
/// `RUST_LOG` wins when set; otherwise `info`, or `debug` with `--debug`.
pub fn init_logging(debug: bool) -> Result<(), tracing::subscriber::SetGlobalDefaultError> {
    let default_level = if debug { "debug" } else { "info" };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));

    let subscriber = FmtSubscriber::builder()
        .with_env_filter(filter)
        .with_target(false)
        .finish();
    tracing::subscriber::set_global_default(subscriber)
}
