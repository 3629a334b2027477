use std::{
    io::ErrorKind,
    path::{Path, PathBuf},
};

use anyhow::Context;
use clap::Parser;
use plugger_common::{LoopConfig, RunMode, SwitchSource};

#[derive(Debug, Parser)]
#[command(name = "plugger", author, version)]
#[command(about = "Keeps a smart plug on while solar panel output is at or above a threshold")]
#[command(
    long_about = "Samples the power output on a panel status page at a fixed interval and \
    switches a TP-Link Kasa plug ON at or above the threshold, OFF below it. Every completed \
    cycle is appended to a CSV log.\n\
    \nExamples:\n  \
    plugger --panel 192.168.1.161/meters.xml --switch 192.168.1.61 --threshold 0.7\n  \
    plugger --panel localhost:8000/meters.xml --simulated-switch --max-attempts 3"
)]
pub struct Cli {
    /// Panel status page, e.g. 192.168.1.161/meters.xml
    #[arg(long)]
    pub panel: Option<String>,

    /// Name of the numeric field in the panel payload
    #[arg(long)]
    pub field: Option<String>,

    /// Kasa plug address, host or host:port
    #[arg(long, conflicts_with = "simulated_switch")]
    pub switch: Option<String>,

    /// Drive an in-memory plug instead of real hardware
    #[arg(long)]
    pub simulated_switch: bool,

    /// Output at and above which the plug is switched on
    #[arg(long, allow_negative_numbers = true)]
    pub threshold: Option<f64>,

    /// Seconds between cycles
    #[arg(long)]
    pub interval: Option<u64>,

    /// Single-shot attempt budget; 0 runs continuously
    #[arg(long)]
    pub max_attempts: Option<u32>,

    /// CSV run log
    #[arg(long)]
    pub log_file: Option<PathBuf>,

    /// Network timeout in seconds for panel and plug calls
    #[arg(long)]
    pub timeout: Option<u64>,

    /// JSON file providing defaults for the options above (or PLUGGER_CONFIG)
    #[arg(long)]
    pub config: Option<PathBuf>,

    /// Append diagnostic logs to this file instead of stderr.
    ///
    /// The file is never rotated here; use logrotate or similar to cap its size.
    #[arg(long)]
    pub diagnostic_log: Option<PathBuf>,
}

impl Cli {
    /// Config file (if any) first, then explicit flags on top.
    pub async fn resolve(&self) -> anyhow::Result<LoopConfig> {
        let path = self
            .config
            .clone()
            .or_else(|| std::env::var("PLUGGER_CONFIG").ok().map(PathBuf::from));

        let base = match path {
            Some(path) => load_config_file(&path).await?,
            None => LoopConfig::default(),
        };
        Ok(self.apply(base))
    }

    fn apply(&self, mut config: LoopConfig) -> LoopConfig {
        if let Some(panel) = &self.panel {
            config.panel_source = panel.clone();
        }
        if let Some(field) = &self.field {
            config.panel_field = field.clone();
        }
        if let Some(address) = &self.switch {
            config.switch = Some(SwitchSource::Kasa {
                address: address.clone(),
            });
        } else if self.simulated_switch {
            config.switch = Some(SwitchSource::Simulated);
        }
        if let Some(threshold) = self.threshold {
            config.threshold = threshold;
        }
        if let Some(interval) = self.interval {
            config.interval_secs = interval;
        }
        if let Some(max_attempts) = self.max_attempts {
            config.mode = RunMode::from_max_attempts(max_attempts);
        }
        if let Some(log_file) = &self.log_file {
            config.log_path = log_file.clone();
        }
        if let Some(timeout) = self.timeout {
            config.timeout_secs = timeout;
        }
        config
    }
}

async fn load_config_file(path: &Path) -> anyhow::Result<LoopConfig> {
    let raw = match tokio::fs::read(path).await {
        Ok(raw) => raw,
        Err(err) if err.kind() == ErrorKind::NotFound => {
            anyhow::bail!("config file {} does not exist", path.display())
        }
        Err(err) => return Err(err.into()),
    };
    serde_json::from_slice(&raw)
        .with_context(|| format!("failed to parse config file {}", path.display()))
}
