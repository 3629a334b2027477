use std::{
    net::{IpAddr, SocketAddr},
    path::PathBuf,
};

use serde::{Deserialize, Serialize};

use crate::{error::ControlError, types::RunMode};

pub const DEFAULT_KASA_PORT: u16 = 9999;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum SwitchSource {
    /// TP-Link Kasa plug, `host` or `host:port`.
    Kasa { address: String },
    /// In-memory plug for dry runs.
    Simulated,
}

impl SwitchSource {
    pub fn label(&self) -> &str {
        match self {
            Self::Kasa { address } => address,
            Self::Simulated => "simulated",
        }
    }

    /// Socket address for the Kasa protocol, defaulting the port.
    ///
    /// Bare IPv6 literals get bracketed; `[v6]:port` and `host:port` are kept as given.
    pub fn kasa_endpoint(&self) -> Option<String> {
        let Self::Kasa { address } = self else {
            return None;
        };
        let address = address.trim();

        if address.parse::<SocketAddr>().is_ok() {
            return Some(address.to_string());
        }
        if let Ok(ip) = address.parse::<IpAddr>() {
            return Some(SocketAddr::new(ip, DEFAULT_KASA_PORT).to_string());
        }
        let has_port = match address.rsplit_once(':') {
            Some((host, port)) => {
                !host.is_empty() && !host.contains(':') && port.parse::<u16>().is_ok()
            }
            None => false,
        };
        if has_port {
            Some(address.to_string())
        } else {
            Some(format!("{address}:{DEFAULT_KASA_PORT}"))
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LoopConfig {
    pub panel_source: String,
    pub panel_field: String,
    pub switch: Option<SwitchSource>,
    pub threshold: f64,
    pub interval_secs: u64,
    pub mode: RunMode,
    pub log_path: PathBuf,
    pub timeout_secs: u64,
}

impl Default for LoopConfig {
    fn default() -> Self {
        Self {
            panel_source: "192.168.1.161/meters.xml".to_string(),
            panel_field: "OutputPower".to_string(),
            switch: None,
            threshold: 0.7,
            interval_secs: 30,
            mode: RunMode::Continuous,
            log_path: PathBuf::from("log.csv"),
            timeout_secs: 10,
        }
    }
}

impl LoopConfig {
    /// Panel locator as a fetchable URL; bare `host/path` sources are served over http.
    pub fn panel_url(&self) -> String {
        let source = self.panel_source.trim();
        if source.starts_with("http://") || source.starts_with("https://") {
            source.to_string()
        } else {
            format!("http://{source}")
        }
    }

    pub fn validate(&self) -> Result<&SwitchSource, ControlError> {
        if !self.threshold.is_finite() {
            return Err(ControlError::Config(format!(
                "threshold must be a finite number, got {}",
                self.threshold
            )));
        }
        if self.panel_source.trim().is_empty() {
            return Err(ControlError::Config("panel source is empty".to_string()));
        }
        if self.panel_field.is_empty() {
            return Err(ControlError::Config("panel field name is empty".to_string()));
        }
        if self.mode == (RunMode::SingleShot { max_attempts: 0 }) {
            return Err(ControlError::Config(
                "single-shot mode needs at least one attempt".to_string(),
            ));
        }
        if self.timeout_secs == 0 {
            return Err(ControlError::Config(
                "network timeout must be at least one second".to_string(),
            ));
        }

        match &self.switch {
            Some(SwitchSource::Kasa { address }) if address.trim().is_empty() => Err(
                ControlError::Config("switch address is empty".to_string()),
            ),
            Some(source) => Ok(source),
            None => Err(ControlError::Config(
                "need either a switch address or the simulated switch".to_string(),
            )),
        }
    }

    /// Banner form of the interval, e.g. `5 min, 0 sec`.
    pub fn interval_by_min(&self) -> String {
        format!(
            "{} min, {} sec",
            self.interval_secs / 60,
            self.interval_secs % 60
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn simulated() -> LoopConfig {
        LoopConfig {
            switch: Some(SwitchSource::Simulated),
            ..LoopConfig::default()
        }
    }

    #[test]
    fn missing_switch_is_config_error() {
        let err = LoopConfig::default().validate().unwrap_err();
        assert!(matches!(err, ControlError::Config(_)));
    }

    #[test]
    fn non_finite_threshold_rejected() {
        let config = LoopConfig {
            threshold: f64::NAN,
            ..simulated()
        };
        assert!(config.validate().is_err());
    }

    #[test]
    fn zero_timeout_rejected() {
        let config = LoopConfig {
            timeout_secs: 0,
            ..simulated()
        };
        let err = config.validate().unwrap_err();
        assert!(matches!(err, ControlError::Config(_)));
        assert!(err.to_string().contains("timeout"));
    }

    #[test]
    fn simulated_switch_validates() {
        assert_eq!(simulated().validate().unwrap(), &SwitchSource::Simulated);
    }

    #[test]
    fn bare_panel_source_gets_http_scheme() {
        assert_eq!(simulated().panel_url(), "http://192.168.1.161/meters.xml");

        let config = LoopConfig {
            panel_source: "https://panel.local/meters.xml".to_string(),
            ..simulated()
        };
        assert_eq!(config.panel_url(), "https://panel.local/meters.xml");
    }

    #[test]
    fn kasa_port_defaults() {
        let plain = SwitchSource::Kasa {
            address: "192.168.1.61".to_string(),
        };
        assert_eq!(plain.kasa_endpoint().as_deref(), Some("192.168.1.61:9999"));

        let explicit = SwitchSource::Kasa {
            address: "plug.lan:10000".to_string(),
        };
        assert_eq!(explicit.kasa_endpoint().as_deref(), Some("plug.lan:10000"));
        assert_eq!(SwitchSource::Simulated.kasa_endpoint(), None);
    }

    #[test]
    fn kasa_port_defaults_for_ipv6() {
        let endpoint = |address: &str| {
            SwitchSource::Kasa {
                address: address.to_string(),
            }
            .kasa_endpoint()
        };

        assert_eq!(endpoint("fe80::1").as_deref(), Some("[fe80::1]:9999"));
        assert_eq!(endpoint("[fe80::1]").as_deref(), Some("[fe80::1]:9999"));
        assert_eq!(endpoint("[fe80::1]:10000").as_deref(), Some("[fe80::1]:10000"));
        assert_eq!(endpoint("10.0.0.5:10000").as_deref(), Some("10.0.0.5:10000"));
    }

    #[test]
    fn interval_formats_minutes_and_seconds() {
        let config = LoopConfig {
            interval_secs: 330,
            ..simulated()
        };
        assert_eq!(config.interval_by_min(), "5 min, 30 sec");
    }

    #[test]
    fn partial_json_keeps_defaults() {
        let config: LoopConfig = serde_json::from_str(
            r#"{"threshold": 1.5, "switch": {"kind": "kasa", "address": "10.0.0.5"}}"#,
        )
        .unwrap();

        assert_eq!(config.threshold, 1.5);
        assert_eq!(config.interval_secs, 30);
        assert_eq!(config.panel_field, "OutputPower");
        assert_eq!(
            config.switch,
            Some(SwitchSource::Kasa {
                address: "10.0.0.5".to_string()
            })
        );
    }
}
