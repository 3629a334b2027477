mod kasa;

use std::{
    sync::atomic::{AtomicBool, Ordering},
    time::Duration,
};

use async_trait::async_trait;
use plugger_common::{ControlError, SwitchSource};

pub use kasa::KasaSwitch;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SwitchInfo {
    pub display_name: String,
    pub model: String,
}

/// Binary remote switch. Every call is one best-effort remote operation.
#[async_trait]
pub trait Switch: Send + Sync {
    async fn current_state(&self) -> Result<bool, ControlError>;
    async fn set_on(&self) -> Result<(), ControlError>;
    async fn set_off(&self) -> Result<(), ControlError>;
    async fn describe(&self) -> Result<SwitchInfo, ControlError>;
}

pub fn build_switch(source: &SwitchSource, timeout: Duration) -> Box<dyn Switch> {
    match source.kasa_endpoint() {
        Some(endpoint) => Box::new(KasaSwitch::new(endpoint, timeout)),
        None => Box::new(SimulatedSwitch::default()),
    }
}

/// In-memory plug; starts OFF.
#[derive(Debug, Default)]
pub struct SimulatedSwitch {
    on: AtomicBool,
}

#[async_trait]
impl Switch for SimulatedSwitch {
    async fn current_state(&self) -> Result<bool, ControlError> {
        Ok(self.on.load(Ordering::Relaxed))
    }

    async fn set_on(&self) -> Result<(), ControlError> {
        self.on.store(true, Ordering::Relaxed);
        Ok(())
    }

    async fn set_off(&self) -> Result<(), ControlError> {
        self.on.store(false, Ordering::Relaxed);
        Ok(())
    }

    async fn describe(&self) -> Result<SwitchInfo, ControlError> {
        Ok(SwitchInfo {
            display_name: "Test Plug".to_string(),
            model: "Test Plug".to_string(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn simulated_starts_off() {
        let switch = SimulatedSwitch::default();
        assert!(!switch.current_state().await.unwrap());
    }

    #[tokio::test]
    async fn simulated_mutators_are_idempotent() {
        let switch = SimulatedSwitch::default();

        switch.set_on().await.unwrap();
        switch.set_on().await.unwrap();
        assert!(switch.current_state().await.unwrap());

        switch.set_off().await.unwrap();
        switch.set_off().await.unwrap();
        assert!(!switch.current_state().await.unwrap());
    }

    #[tokio::test]
    async fn simulated_source_builds_simulated_switch() {
        let switch = build_switch(&SwitchSource::Simulated, Duration::from_secs(1));
        let info = switch.describe().await.unwrap();
        assert_eq!(info.display_name, "Test Plug");
    }
}
