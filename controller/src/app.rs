use std::{fs::OpenOptions, path::Path, sync::Mutex, time::Duration};

use anyhow::Context;
use clap::Parser;
use tracing::info;
use tracing_subscriber::EnvFilter;

use crate::{
    cli::Cli,
    control_loop::{ControlLoop, LoopOutcome},
    panel::HttpPanel,
    run_log::RunLog,
    status,
    switch::build_switch,
};

pub async fn run() -> anyhow::Result<()> {
    let cli = Cli::parse();
    init_tracing(cli.diagnostic_log.as_deref())?;

    let config = cli.resolve().await?;
    let source = config.validate()?.clone();
    let timeout = Duration::from_secs(config.timeout_secs);

    let switch = build_switch(&source, timeout);
    let plug_info = switch
        .describe()
        .await
        .with_context(|| format!("could not find a plug at {}", source.label()))?;
    let initially_on = switch
        .current_state()
        .await
        .with_context(|| format!("could not read plug state at {}", source.label()))?;
    info!(
        "using plug {} ({}) at {}",
        plug_info.display_name,
        plug_info.model,
        source.label()
    );

    print!("{}", status::banner(&config, &plug_info, initially_on));

    let panel = HttpPanel::new(config.panel_url(), config.panel_field.clone(), timeout)
        .context("failed to build panel HTTP client")?;
    info!("reading {} from {}", config.panel_field, panel.url());

    let log = RunLog::new(config.log_path.clone());
    log.ensure_initialized()?;

    let control = ControlLoop::new(&config, &panel, switch.as_ref(), &log);

    tokio::select! {
        outcome = control.run() => match outcome? {
            LoopOutcome::Completed => info!("single shot completed"),
            LoopOutcome::AttemptsExhausted { attempts } => {
                println!("giving up after {attempts} failed attempts");
                info!("single shot exhausted {attempts} attempts");
            }
        },
        signal = tokio::signal::ctrl_c() => {
            signal.context("failed to listen for interrupt")?;
            info!("interrupted by operator");
        }
    }

    Ok(())
}

fn init_tracing(diagnostic_log: Option<&Path>) -> anyhow::Result<()> {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    let builder = tracing_subscriber::fmt().with_env_filter(filter);

    match diagnostic_log {
        Some(path) => {
            let file = OpenOptions::new()
                .create(true)
                .append(true)
                .open(path)
                .with_context(|| format!("failed to open diagnostic log {}", path.display()))?;
            builder.with_ansi(false).with_writer(Mutex::new(file)).init();
        }
        None => builder.with_writer(std::io::stderr).init(),
    }
    Ok(())
}
