use std::time::Duration;

use async_trait::async_trait;
use plugger_common::{extract_field, ControlError};
use reqwest::Client;
use tracing::{debug, warn};

/// Source of the panel's current power output.
#[async_trait]
pub trait PanelSource: Send + Sync {
    async fn read(&self) -> Result<f64, ControlError>;
}

/// Reads a named field from the panel's HTTP status page.
#[derive(Debug, Clone)]
pub struct HttpPanel {
    url: String,
    field: String,
    client: Client,
}

impl HttpPanel {
    pub fn new(
        url: impl Into<String>,
        field: impl Into<String>,
        timeout: Duration,
    ) -> anyhow::Result<Self> {
        let client = Client::builder().timeout(timeout).build()?;
        Ok(Self {
            url: url.into(),
            field: field.into(),
            client,
        })
    }

    pub fn url(&self) -> &str {
        &self.url
    }
}

#[async_trait]
impl PanelSource for HttpPanel {
    async fn read(&self) -> Result<f64, ControlError> {
        debug!("fetching panel page {}", self.url);

        let response = match self.client.get(&self.url).send().await {
            Ok(response) => response,
            Err(err) => {
                warn!("panel fetch failed: {err}");
                return Err(ControlError::Transport {
                    url: self.url.clone(),
                });
            }
        };

        let status = response.status();
        if !status.is_success() {
            return Err(ControlError::BadStatus {
                summary: format!("<Response [{}]> from {}", status.as_u16(), self.url),
            });
        }

        let body = response.text().await.map_err(|err| {
            warn!("panel body read failed: {err}");
            ControlError::Transport {
                url: self.url.clone(),
            }
        })?;

        let value = extract_field(&body, &self.field).ok_or_else(|| ControlError::Parse {
            field: self.field.clone(),
        })?;
        debug!("panel {} = {value}", self.field);
        Ok(value)
    }
}
