use std::time::Duration;

use chrono::{DateTime, Local};
use plugger_common::{decide, Action, ControlError, CycleRecord, LoopConfig, RunMode};
use tracing::{debug, info, warn};

use crate::{panel::PanelSource, run_log::RunLog, status, switch::Switch};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LoopOutcome {
    /// Single shot logged its cycle.
    Completed,
    /// Single shot ran out of attempts without a logged cycle.
    AttemptsExhausted { attempts: u32 },
}

/// Sequential read, decide, act, log cycle on a fixed interval.
///
/// Read and device failures are retried after one interval: indefinitely in continuous
/// mode, up to `max_attempts` consecutive failures in single-shot mode. Run log failures
/// are returned to the caller.
pub struct ControlLoop<'a> {
    panel: &'a dyn PanelSource,
    switch: &'a dyn Switch,
    log: &'a RunLog,
    threshold: f64,
    interval: Duration,
    mode: RunMode,
}

impl<'a> ControlLoop<'a> {
    pub fn new(
        config: &LoopConfig,
        panel: &'a dyn PanelSource,
        switch: &'a dyn Switch,
        log: &'a RunLog,
    ) -> Self {
        Self {
            panel,
            switch,
            log,
            threshold: config.threshold,
            interval: Duration::from_secs(config.interval_secs),
            mode: config.mode,
        }
    }

    pub async fn run(&self) -> Result<LoopOutcome, ControlError> {
        let mut failures: u32 = 0;
        info!("entering control loop in {} mode", self.mode.as_str());

        loop {
            let started = Local::now();
            let prefix = status::line_prefix(started, self.mode, failures + 1);

            match self.run_cycle(started).await {
                Ok(record) => {
                    self.log.append(&record)?;
                    println!(
                        "{}",
                        status::cycle_line(&prefix, record.panel_output, record.action)
                    );
                    info!("cycle logged: {}", record.action.as_str());

                    if self.mode.is_single_shot() {
                        return Ok(LoopOutcome::Completed);
                    }
                    failures = 0;
                }
                Err(err) if err.is_fatal() => return Err(err),
                Err(err) => {
                    failures = failures.saturating_add(1);
                    println!("{}", status::failure_line(&prefix, &err));
                    warn!("cycle failed ({:?}): {err}", err.kind());

                    if let Some(max_attempts) = self.mode.max_attempts() {
                        if failures >= max_attempts {
                            info!("reached max attempts ({max_attempts}), exiting");
                            return Ok(LoopOutcome::AttemptsExhausted { attempts: failures });
                        }
                    }
                }
            }

            debug!("sleeping {:?}", self.interval);
            tokio::time::sleep(self.interval).await;
        }
    }

    /// One cycle up to (not including) logging. Any error discards the partial progress.
    async fn run_cycle(&self, started: DateTime<Local>) -> Result<CycleRecord, ControlError> {
        let panel_output = self.panel.read().await?;
        debug!("panel read: output={panel_output}");

        let state_before = self.switch.current_state().await?;
        debug!("switch state before: {state_before}");

        let action = decide(panel_output, self.threshold, state_before);
        match action {
            Action::Activate => {
                self.switch.set_on().await?;
                info!("*** turned switch ON ***");
            }
            Action::Deactivate => {
                self.switch.set_off().await?;
                info!("*** turned switch OFF ***");
            }
            Action::LeaveOn | Action::LeaveOff => debug!("{}", action.as_str()),
        }

        let state_after = self.switch.current_state().await?;
        debug!("switch state after: {state_after}");

        Ok(CycleRecord {
            timestamp: started,
            mode: self.mode,
            panel_output,
            state_before,
            action,
            state_after,
        })
    }
}
