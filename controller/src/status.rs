//! Operator-facing console output. Best-effort; diagnostic logging goes through tracing.

use chrono::{DateTime, Local};
use plugger_common::{Action, ControlError, LoopConfig, RunMode, TIMESTAMP_FORMAT};

use crate::switch::SwitchInfo;

const LABEL_WIDTH: usize = 35;
const VALUE_WIDTH: usize = 10;

pub fn banner(config: &LoopConfig, info: &SwitchInfo, initially_on: bool) -> String {
    let row = |label: &str, value: &str| format!("{label:<LABEL_WIDTH$} {value}\n");
    let switch = config
        .switch
        .as_ref()
        .map(|source| source.label().to_string())
        .unwrap_or_default();
    let max_attempts = config
        .mode
        .max_attempts()
        .map(|attempts| attempts.to_string())
        .unwrap_or_else(|| "n/a".to_string());
    let mode = match config.mode {
        RunMode::Continuous => "continuous",
        RunMode::SingleShot { .. } => "single shot",
    };

    let mut out = format!(
        "\n{stars} PLUGGER ENERGY MANAGEMENT SYSTEM {stars}\n\n",
        stars = "*".repeat(12)
    );
    out += &row("version", env!("CARGO_PKG_VERSION"));
    out += "\n";
    out += &row("Plug address:", &switch);
    out += &row("Plug name", &info.display_name);
    out += &row("Plug model", &info.model);
    out += &row("Initial plug state:", on_off(initially_on));
    out += "\n";
    out += &row("Panel address:", &config.panel_source);
    out += &row("Panel power output threshold:", &config.threshold.to_string());
    out += "\n";
    out += &row("Test interval:", &config.interval_by_min());
    out += &row("Testing mode:", mode);
    out += &row("Max attempts (if single shot):", &max_attempts);
    out += "\n";
    out += &"*".repeat(59);
    out += "\n";
    out
}

/// Leading `<timestamp> [n/max]` part shared by success and failure lines.
pub fn line_prefix(at: DateTime<Local>, mode: RunMode, attempt: u32) -> String {
    let stamp = at.format(TIMESTAMP_FORMAT);
    match mode.max_attempts() {
        Some(max) => format!("{stamp} {:<7}", format!("[{attempt}/{max}]")),
        None => stamp.to_string(),
    }
}

pub fn cycle_line(prefix: &str, panel_output: f64, action: Action) -> String {
    format!(
        "{prefix} panel reading: {:<VALUE_WIDTH$} {}",
        panel_output.to_string(),
        action.verdict()
    )
}

pub fn failure_line(prefix: &str, err: &ControlError) -> String {
    match err {
        ControlError::Transport { .. } | ControlError::BadStatus { .. } | ControlError::Parse { .. } => {
            format!("{prefix} failed to get panel output, error: {err}")
        }
        _ => format!("{prefix} {err}"),
    }
}

fn on_off(on: bool) -> &'static str {
    if on {
        "ON"
    } else {
        "OFF"
    }
}
