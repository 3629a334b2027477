//! TP-Link Kasa (HS1xx) smart plug over its local TCP protocol.
//!
//! Each request is a JSON document obfuscated with the autokey XOR cipher (initial key 171)
//! and framed by a 4-byte big-endian length. The plug answers with the same framing.

use std::time::Duration;

use async_trait::async_trait;
use plugger_common::ControlError;
use serde::Deserialize;
use tokio::{
    io::{AsyncReadExt, AsyncWriteExt},
    net::TcpStream,
};
use tracing::debug;

use super::{Switch, SwitchInfo};

const INITIAL_KEY: u8 = 171;
const MAX_REPLY_BYTES: u32 = 64 * 1024;

const GET_SYSINFO: &str = r#"{"system":{"get_sysinfo":{}}}"#;
const RELAY_ON: &str = r#"{"system":{"set_relay_state":{"state":1}}}"#;
const RELAY_OFF: &str = r#"{"system":{"set_relay_state":{"state":0}}}"#;

#[derive(Debug, Deserialize)]
struct Reply {
    system: SystemReply,
}

#[derive(Debug, Deserialize)]
struct SystemReply {
    #[serde(default)]
    get_sysinfo: Option<SysInfo>,
    #[serde(default)]
    set_relay_state: Option<Ack>,
}

#[derive(Debug, Deserialize)]
struct SysInfo {
    #[serde(default)]
    alias: String,
    #[serde(default)]
    model: String,
    relay_state: u8,
    #[serde(default)]
    err_code: i64,
}

#[derive(Debug, Deserialize)]
struct Ack {
    #[serde(default)]
    err_code: i64,
}

#[derive(Debug, Clone)]
pub struct KasaSwitch {
    endpoint: String,
    timeout: Duration,
}

impl KasaSwitch {
    pub fn new(endpoint: impl Into<String>, timeout: Duration) -> Self {
        Self {
            endpoint: endpoint.into(),
            timeout,
        }
    }

    async fn exchange(&self, operation: &'static str, request: &str) -> Result<Reply, ControlError> {
        debug!("kasa {operation} -> {}", self.endpoint);

        let round_trip = async {
            let mut stream = TcpStream::connect(&self.endpoint).await?;
            stream.write_all(&encrypt(request.as_bytes())).await?;

            let len = stream.read_u32().await?;
            if len > MAX_REPLY_BYTES {
                return Err(std::io::Error::new(
                    std::io::ErrorKind::InvalidData,
                    format!("reply of {len} bytes exceeds limit"),
                ));
            }
            let mut cipher = vec![0; len as usize];
            stream.read_exact(&mut cipher).await?;
            Ok::<_, std::io::Error>(decrypt(&cipher))
        };

        let plain = tokio::time::timeout(self.timeout, round_trip)
            .await
            .map_err(|_| ControlError::unreachable(operation, "timed out"))?
            .map_err(|err| ControlError::unreachable(operation, err))?;

        serde_json::from_slice(&plain)
            .map_err(|err| ControlError::unreachable(operation, format!("malformed reply: {err}")))
    }

    async fn sysinfo(&self, operation: &'static str) -> Result<SysInfo, ControlError> {
        let reply = self.exchange(operation, GET_SYSINFO).await?;
        let info = reply
            .system
            .get_sysinfo
            .ok_or_else(|| ControlError::unreachable(operation, "reply without sysinfo"))?;
        if info.err_code != 0 {
            return Err(ControlError::unreachable(
                operation,
                format!("plug error code {}", info.err_code),
            ));
        }
        Ok(info)
    }

    async fn set_relay(&self, operation: &'static str, request: &str) -> Result<(), ControlError> {
        let reply = self.exchange(operation, request).await?;
        match reply.system.set_relay_state {
            Some(Ack { err_code: 0 }) => Ok(()),
            Some(Ack { err_code }) => Err(ControlError::unreachable(
                operation,
                format!("plug error code {err_code}"),
            )),
            None => Err(ControlError::unreachable(operation, "reply without ack")),
        }
    }
}

#[async_trait]
impl Switch for KasaSwitch {
    async fn current_state(&self) -> Result<bool, ControlError> {
        Ok(self.sysinfo("current_state").await?.relay_state != 0)
    }

    async fn set_on(&self) -> Result<(), ControlError> {
        self.set_relay("set_on", RELAY_ON).await
    }

    async fn set_off(&self) -> Result<(), ControlError> {
        self.set_relay("set_off", RELAY_OFF).await
    }

    async fn describe(&self) -> Result<SwitchInfo, ControlError> {
        let info = self.sysinfo("describe").await?;
        Ok(SwitchInfo {
            display_name: info.alias,
            model: info.model,
        })
    }
}

fn encrypt(plain: &[u8]) -> Vec<u8> {
    let mut key = INITIAL_KEY;
    let mut framed = Vec::with_capacity(plain.len() + 4);
    framed.extend_from_slice(&(plain.len() as u32).to_be_bytes());
    for &byte in plain {
        key ^= byte;
        framed.push(key);
    }
    framed
}

fn decrypt(cipher: &[u8]) -> Vec<u8> {
    let mut key = INITIAL_KEY;
    cipher
        .iter()
        .map(|&byte| {
            let plain = key ^ byte;
            key = byte;
            plain
        })
        .collect()
}
