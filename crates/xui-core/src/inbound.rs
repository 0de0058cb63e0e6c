// Copyright (c) 2026 Roman Barinov <rbarinov@gmail.com>
// Licensed under the FSL-1.1-NC.

use crate::codec::{self, lenient};
use crate::protocol::{InboundClient, Protocol, ProtocolSettings};
use crate::stream::{Security, StreamSettings};
use crate::{Error, Result};
use rand::Rng;
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use tracing::warn;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SniffingSettings {
    #[serde(default = "default_true")]
    pub enabled: bool,
    #[serde(default = "default_dest_override")]
    pub dest_override: Vec<String>,
}

fn default_true() -> bool {
    true
}

fn default_dest_override() -> Vec<String> {
    vec!["http".to_string(), "tls".to_string()]
}

impl Default for SniffingSettings {
    fn default() -> Self {
        Self {
            enabled: true,
            dest_override: default_dest_override(),
        }
    }
}

/// Traffic counters of one client, as tracked by the panel.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ClientStat {
    #[serde(default, deserialize_with = "lenient::int")]
    pub id: i64,
    #[serde(default, deserialize_with = "lenient::int")]
    pub inbound_id: i64,
    #[serde(default = "default_true", deserialize_with = "lenient::boolean")]
    pub enable: bool,
    #[serde(default)]
    pub email: String,
    #[serde(default, deserialize_with = "lenient::int")]
    pub up: i64,
    #[serde(default, deserialize_with = "lenient::int")]
    pub down: i64,
    #[serde(default, deserialize_with = "lenient::int")]
    pub expiry_time: i64,
    #[serde(default, deserialize_with = "lenient::int")]
    pub total: i64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", try_from = "RawInbound")]
pub struct Inbound {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub id: Option<i64>,
    pub up: i64,
    pub down: i64,
    /// Traffic quota in bytes, 0 for unlimited.
    pub total: i64,
    pub remark: String,
    pub enable: bool,
    /// Milliseconds since the epoch, 0 for no expiry.
    pub expiry_time: i64,
    pub listen: String,
    pub port: u16,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub tag: Option<String>,
    #[serde(flatten)]
    pub settings: ProtocolSettings,
    pub stream_settings: Option<StreamSettings>,
    pub sniffing: Option<SniffingSettings>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub client_stats: Vec<ClientStat>,
}

/// Inbound as the panel sends it: settings blocks may be JSON text and
/// scalars may be quoted.
#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct RawInbound {
    #[serde(default, deserialize_with = "lenient::opt_int")]
    id: Option<i64>,
    #[serde(default, deserialize_with = "lenient::int")]
    up: i64,
    #[serde(default, deserialize_with = "lenient::int")]
    down: i64,
    #[serde(default, deserialize_with = "lenient::int")]
    total: i64,
    #[serde(default, deserialize_with = "lenient::string")]
    remark: String,
    #[serde(default = "default_true", deserialize_with = "lenient::boolean")]
    enable: bool,
    #[serde(default, deserialize_with = "lenient::int")]
    expiry_time: i64,
    #[serde(default, deserialize_with = "lenient::string")]
    listen: String,
    #[serde(default, deserialize_with = "lenient::port")]
    port: u16,
    #[serde(default)]
    tag: Option<String>,
    protocol: Protocol,
    #[serde(default)]
    settings: Value,
    #[serde(default)]
    stream_settings: Value,
    #[serde(default)]
    sniffing: Value,
    #[serde(default)]
    client_stats: Option<Vec<ClientStat>>,
}

impl TryFrom<RawInbound> for Inbound {
    type Error = Error;

    fn try_from(raw: RawInbound) -> Result<Self> {
        let settings = codec::embedded_value(raw.settings)?.unwrap_or_else(|| json!({}));
        let settings: ProtocolSettings = serde_json::from_value(json!({
            "protocol": raw.protocol,
            "settings": settings,
        }))?;

        let stream_settings = codec::embedded_value(raw.stream_settings)?
            .map(serde_json::from_value::<StreamSettings>)
            .transpose()?;

        // "{}" is how the panel stores "not configured"
        let sniffing = codec::embedded_value(raw.sniffing)?
            .filter(|value| value.as_object().map_or(true, |map| !map.is_empty()))
            .map(serde_json::from_value::<SniffingSettings>)
            .transpose()?;

        Ok(Inbound {
            id: raw.id,
            up: raw.up,
            down: raw.down,
            total: raw.total,
            remark: raw.remark,
            enable: raw.enable,
            expiry_time: raw.expiry_time,
            listen: raw.listen,
            port: raw.port,
            tag: raw.tag,
            settings,
            stream_settings,
            sniffing,
            client_stats: raw.client_stats.unwrap_or_default(),
        })
    }
}

/// Request body of the add/update inbound endpoints.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct InboundPayload {
    pub up: i64,
    pub down: i64,
    pub total: i64,
    pub remark: String,
    pub enable: bool,
    pub expiry_time: i64,
    pub listen: String,
    pub port: u16,
    pub protocol: Protocol,
    pub settings: String,
    pub stream_settings: String,
    pub sniffing: String,
}

impl Inbound {
    /// New enabled inbound with default settings for `protocol`.
    ///
    /// Protocols that run over a transport start on plain TCP with
    /// sniffing on. The port stays 0 until [`Inbound::assign_random_port`]
    /// or the caller sets one.
    pub fn new(protocol: Protocol, remark: impl Into<String>, port: u16) -> Self {
        let transported = matches!(
            protocol,
            Protocol::Vmess | Protocol::Vless | Protocol::Trojan | Protocol::Shadowsocks
        );

        Self {
            id: None,
            up: 0,
            down: 0,
            total: 0,
            remark: remark.into(),
            enable: true,
            expiry_time: 0,
            listen: String::new(),
            port,
            tag: None,
            settings: ProtocolSettings::default_for(protocol),
            stream_settings: transported.then(StreamSettings::tcp),
            sniffing: transported.then(SniffingSettings::default),
            client_stats: Vec::new(),
        }
    }

    pub fn protocol(&self) -> Protocol {
        self.settings.protocol()
    }

    pub fn clients(&self) -> Vec<InboundClient> {
        self.settings.clients()
    }

    pub fn validate(&self) -> Result<()> {
        if self.port == 0 {
            return Err(Error::InvalidConfiguration(
                "port must be set before sending the inbound".to_string(),
            ));
        }

        let Some(stream) = &self.stream_settings else {
            return Ok(());
        };

        match stream.security {
            Security::Tls | Security::Xtls if !stream.network.supports_tls() => {
                Err(Error::InvalidConfiguration(format!(
                    "{} transport does not support {}",
                    stream.network.as_str(),
                    stream.security.as_str()
                )))
            }
            Security::Xtls
                if matches!(self.protocol(), Protocol::Vmess | Protocol::Shadowsocks) =>
            {
                Err(Error::InvalidConfiguration(format!(
                    "xtls cannot be used with {}",
                    self.protocol()
                )))
            }
            _ => Ok(()),
        }
    }

    /// Picks a port in `10000..=65535` when none is set, or always when
    /// `force` is true. Returns the port in use.
    pub fn assign_random_port(&mut self, force: bool) -> u16 {
        if force || self.port == 0 {
            self.port = rand::thread_rng().gen_range(10000..=65535);
            warn!(
                port = self.port,
                remark = %self.remark,
                "Assigned random port to inbound, prefer an explicit one"
            );
        }
        self.port
    }

    pub fn to_payload(&self) -> Result<InboundPayload> {
        let settings = codec::encode_embedded(&self.settings.settings_value()?)?;
        let stream_settings = match &self.stream_settings {
            Some(stream) => codec::encode_embedded(stream)?,
            None => String::new(),
        };
        let sniffing = match &self.sniffing {
            Some(sniffing) => codec::encode_embedded(sniffing)?,
            None => "{}".to_string(),
        };

        Ok(InboundPayload {
            up: self.up,
            down: self.down,
            total: self.total,
            remark: self.remark.clone(),
            enable: self.enable,
            expiry_time: self.expiry_time,
            listen: self.listen.clone(),
            port: self.port,
            protocol: self.protocol(),
            settings,
            stream_settings,
            sniffing,
        })
    }
}
