// Copyright (c) 2026 Roman Barinov <rbarinov@gmail.com>
// Licensed under the FSL-1.1-NC.

use crate::codec::lenient;
use rand::{distributions::Alphanumeric, Rng};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use uuid::Uuid;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum Protocol {
    Vmess,
    Vless,
    Trojan,
    Shadowsocks,
    DokodemoDoor,
    Socks,
    Http,
}

impl Protocol {
    pub fn as_str(&self) -> &'static str {
        match self {
            Protocol::Vmess => "vmess",
            Protocol::Vless => "vless",
            Protocol::Trojan => "trojan",
            Protocol::Shadowsocks => "shadowsocks",
            Protocol::DokodemoDoor => "dokodemo-door",
            Protocol::Socks => "socks",
            Protocol::Http => "http",
        }
    }
}

impl fmt::Display for Protocol {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Generates the 10-character alphanumeric secret used for passwords and
/// account names the caller leaves out.
pub fn random_password() -> String {
    rand::thread_rng()
        .sample_iter(&Alphanumeric)
        .take(10)
        .map(char::from)
        .collect()
}

fn new_client_id() -> String {
    Uuid::new_v4().to_string()
}

/// Per-client limits. Every field is optional because older panels
/// reject clients that carry keys they do not know.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ClientLimits {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,
    #[serde(
        default,
        skip_serializing_if = "Option::is_none",
        deserialize_with = "lenient::opt_int"
    )]
    pub limit_ip: Option<i64>,
    #[serde(
        rename = "totalGB",
        default,
        skip_serializing_if = "Option::is_none",
        deserialize_with = "lenient::opt_int"
    )]
    pub total_gb: Option<i64>,
    /// Milliseconds since the epoch, 0 for no expiry.
    #[serde(
        default,
        skip_serializing_if = "Option::is_none",
        deserialize_with = "lenient::opt_int"
    )]
    pub expiry_time: Option<i64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub enable: Option<bool>,
    #[serde(
        default,
        skip_serializing_if = "Option::is_none",
        deserialize_with = "lenient::opt_string"
    )]
    pub tg_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sub_id: Option<String>,
}

impl ClientLimits {
    pub fn with_email(email: impl Into<String>) -> Self {
        Self {
            email: Some(email.into()),
            ..Default::default()
        }
    }

    /// Fills every missing limit with its neutral value. Panels that manage
    /// clients individually require the full set of keys.
    pub fn filled(&self) -> Self {
        Self {
            email: Some(self.email.clone().unwrap_or_default()),
            limit_ip: Some(self.limit_ip.unwrap_or(0)),
            total_gb: Some(self.total_gb.unwrap_or(0)),
            expiry_time: Some(self.expiry_time.unwrap_or(0)),
            enable: Some(self.enable.unwrap_or(true)),
            tg_id: Some(self.tg_id.clone().unwrap_or_default()),
            sub_id: Some(self.sub_id.clone().unwrap_or_default()),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct VmessClient {
    #[serde(default = "new_client_id")]
    pub id: String,
    #[serde(default, deserialize_with = "lenient::int")]
    pub alter_id: i64,
    #[serde(flatten)]
    pub limits: ClientLimits,
}

impl Default for VmessClient {
    fn default() -> Self {
        Self {
            id: new_client_id(),
            alter_id: 0,
            limits: ClientLimits::default(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct VlessClient {
    #[serde(default = "new_client_id")]
    pub id: String,
    /// `xtls-rprx-direct`, `xtls-rprx-origin` or empty.
    #[serde(default)]
    pub flow: String,
    #[serde(flatten)]
    pub limits: ClientLimits,
}

impl Default for VlessClient {
    fn default() -> Self {
        Self {
            id: new_client_id(),
            flow: String::new(),
            limits: ClientLimits::default(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TrojanClient {
    #[serde(default = "random_password")]
    pub password: String,
    #[serde(default)]
    pub flow: String,
    #[serde(flatten)]
    pub limits: ClientLimits,
}

impl Default for TrojanClient {
    fn default() -> Self {
        Self {
            password: random_password(),
            flow: String::new(),
            limits: ClientLimits::default(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ShadowsocksClient {
    #[serde(default = "random_password")]
    pub password: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub method: Option<String>,
    #[serde(flatten)]
    pub limits: ClientLimits,
}

impl Default for ShadowsocksClient {
    fn default() -> Self {
        Self {
            password: random_password(),
            method: None,
            limits: ClientLimits::default(),
        }
    }
}

/// A client of any protocol that supports per-client management.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum InboundClient {
    Vmess(VmessClient),
    Vless(VlessClient),
    Trojan(TrojanClient),
    Shadowsocks(ShadowsocksClient),
}

impl InboundClient {
    pub fn limits(&self) -> &ClientLimits {
        match self {
            InboundClient::Vmess(c) => &c.limits,
            InboundClient::Vless(c) => &c.limits,
            InboundClient::Trojan(c) => &c.limits,
            InboundClient::Shadowsocks(c) => &c.limits,
        }
    }

    pub fn limits_mut(&mut self) -> &mut ClientLimits {
        match self {
            InboundClient::Vmess(c) => &mut c.limits,
            InboundClient::Vless(c) => &mut c.limits,
            InboundClient::Trojan(c) => &mut c.limits,
            InboundClient::Shadowsocks(c) => &mut c.limits,
        }
    }

    pub fn email(&self) -> Option<&str> {
        self.limits().email.as_deref()
    }

    /// The key the panel uses to address this client in
    /// update/delete calls: the UUID for VMess and VLess, the password for
    /// Trojan and the email for Shadowsocks.
    pub fn key(&self) -> &str {
        match self {
            InboundClient::Vmess(c) => &c.id,
            InboundClient::Vless(c) => &c.id,
            InboundClient::Trojan(c) => &c.password,
            InboundClient::Shadowsocks(c) => c.limits.email.as_deref().unwrap_or_default(),
        }
    }

    /// Copy with every limit key present.
    pub fn filled(&self) -> Self {
        let mut client = self.clone();
        let limits = client.limits().filled();
        *client.limits_mut() = limits;
        client
    }
}

impl From<VmessClient> for InboundClient {
    fn from(client: VmessClient) -> Self {
        InboundClient::Vmess(client)
    }
}

impl From<VlessClient> for InboundClient {
    fn from(client: VlessClient) -> Self {
        InboundClient::Vless(client)
    }
}

impl From<TrojanClient> for InboundClient {
    fn from(client: TrojanClient) -> Self {
        InboundClient::Trojan(client)
    }
}

impl From<ShadowsocksClient> for InboundClient {
    fn from(client: ShadowsocksClient) -> Self {
        InboundClient::Shadowsocks(client)
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Fallback {
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub alpn: String,
    #[serde(default)]
    pub path: String,
    /// Port number or `host:port`; the panel stores both as text.
    #[serde(default, deserialize_with = "lenient::string")]
    pub dest: String,
    #[serde(default, deserialize_with = "lenient::int")]
    pub xver: i64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Account {
    pub user: String,
    pub pass: String,
}

impl Account {
    pub fn new(user: impl Into<String>, pass: impl Into<String>) -> Self {
        Self {
            user: user.into(),
            pass: pass.into(),
        }
    }

    pub fn random() -> Self {
        Self::new(random_password(), random_password())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub enum TransportNetwork {
    Tcp,
    Udp,
    #[default]
    TcpUdp,
}

impl TransportNetwork {
    pub fn as_str(&self) -> &'static str {
        match self {
            TransportNetwork::Tcp => "tcp",
            TransportNetwork::Udp => "udp",
            TransportNetwork::TcpUdp => "tcp,udp",
        }
    }
}

impl FromStr for TransportNetwork {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim() {
            "tcp" => Ok(TransportNetwork::Tcp),
            "udp" => Ok(TransportNetwork::Udp),
            "tcp,udp" | "tcp+udp" | "udp,tcp" => Ok(TransportNetwork::TcpUdp),
            other => Err(format!("unknown network {:?}", other)),
        }
    }
}

impl TryFrom<String> for TransportNetwork {
    type Error = String;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl From<TransportNetwork> for String {
    fn from(network: TransportNetwork) -> Self {
        network.as_str().to_string()
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct VmessSettings {
    #[serde(default)]
    pub clients: Vec<VmessClient>,
    #[serde(default)]
    pub disable_insecure_encryption: bool,
}

impl Default for VmessSettings {
    fn default() -> Self {
        Self {
            clients: vec![VmessClient::default()],
            disable_insecure_encryption: false,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct VlessSettings {
    #[serde(default)]
    pub clients: Vec<VlessClient>,
    #[serde(default = "default_decryption")]
    pub decryption: String,
    #[serde(default)]
    pub fallbacks: Vec<Fallback>,
}

fn default_decryption() -> String {
    "none".to_string()
}

impl Default for VlessSettings {
    fn default() -> Self {
        Self {
            clients: vec![VlessClient::default()],
            decryption: default_decryption(),
            fallbacks: Vec::new(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TrojanSettings {
    #[serde(default)]
    pub clients: Vec<TrojanClient>,
    #[serde(default)]
    pub fallbacks: Vec<Fallback>,
}

impl Default for TrojanSettings {
    fn default() -> Self {
        Self {
            clients: vec![TrojanClient::default()],
            fallbacks: Vec::new(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ShadowsocksSettings {
    /// `aes-128-gcm`, `aes-256-gcm` or `chacha20-poly1305`.
    #[serde(default = "default_cipher")]
    pub method: String,
    #[serde(default = "random_password")]
    pub password: String,
    #[serde(default)]
    pub network: TransportNetwork,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub clients: Option<Vec<ShadowsocksClient>>,
}

fn default_cipher() -> String {
    "aes-256-gcm".to_string()
}

impl Default for ShadowsocksSettings {
    fn default() -> Self {
        Self {
            method: default_cipher(),
            password: random_password(),
            network: TransportNetwork::default(),
            clients: None,
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DokodemoDoorSettings {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub address: Option<String>,
    #[serde(
        default,
        skip_serializing_if = "Option::is_none",
        deserialize_with = "lenient::opt_port"
    )]
    pub port: Option<u16>,
    #[serde(default)]
    pub network: TransportNetwork,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub follow_redirect: Option<bool>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SocksAuth {
    Password,
    #[default]
    Noauth,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SocksSettings {
    #[serde(default)]
    pub auth: SocksAuth,
    #[serde(default)]
    pub accounts: Vec<Account>,
    #[serde(default)]
    pub udp: bool,
    #[serde(default)]
    pub ip: String,
}

impl SocksSettings {
    pub fn with_account(account: Account) -> Self {
        Self {
            auth: SocksAuth::Password,
            accounts: vec![account],
            ..Default::default()
        }
    }
}

impl Default for SocksSettings {
    fn default() -> Self {
        Self {
            auth: SocksAuth::Noauth,
            accounts: Vec::new(),
            udp: false,
            ip: "127.0.0.1".to_string(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HttpSettings {
    #[serde(default)]
    pub accounts: Vec<Account>,
}

impl Default for HttpSettings {
    fn default() -> Self {
        Self {
            accounts: vec![Account::random()],
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "protocol", content = "settings", rename_all = "kebab-case")]
pub enum ProtocolSettings {
    Vmess(VmessSettings),
    Vless(VlessSettings),
    Trojan(TrojanSettings),
    Shadowsocks(ShadowsocksSettings),
    DokodemoDoor(DokodemoDoorSettings),
    Socks(SocksSettings),
    Http(HttpSettings),
}

impl ProtocolSettings {
    pub fn protocol(&self) -> Protocol {
        match self {
            ProtocolSettings::Vmess(_) => Protocol::Vmess,
            ProtocolSettings::Vless(_) => Protocol::Vless,
            ProtocolSettings::Trojan(_) => Protocol::Trojan,
            ProtocolSettings::Shadowsocks(_) => Protocol::Shadowsocks,
            ProtocolSettings::DokodemoDoor(_) => Protocol::DokodemoDoor,
            ProtocolSettings::Socks(_) => Protocol::Socks,
            ProtocolSettings::Http(_) => Protocol::Http,
        }
    }

    /// Default settings for `protocol`, with fresh client ids and passwords.
    pub fn default_for(protocol: Protocol) -> Self {
        match protocol {
            Protocol::Vmess => ProtocolSettings::Vmess(VmessSettings::default()),
            Protocol::Vless => ProtocolSettings::Vless(VlessSettings::default()),
            Protocol::Trojan => ProtocolSettings::Trojan(TrojanSettings::default()),
            Protocol::Shadowsocks => ProtocolSettings::Shadowsocks(ShadowsocksSettings::default()),
            Protocol::DokodemoDoor => ProtocolSettings::DokodemoDoor(DokodemoDoorSettings::default()),
            Protocol::Socks => ProtocolSettings::Socks(SocksSettings::default()),
            Protocol::Http => ProtocolSettings::Http(HttpSettings::default()),
        }
    }

    pub fn clients(&self) -> Vec<InboundClient> {
        match self {
            ProtocolSettings::Vmess(s) => s.clients.iter().cloned().map(Into::into).collect(),
            ProtocolSettings::Vless(s) => s.clients.iter().cloned().map(Into::into).collect(),
            ProtocolSettings::Trojan(s) => s.clients.iter().cloned().map(Into::into).collect(),
            ProtocolSettings::Shadowsocks(s) => s
                .clients
                .iter()
                .flatten()
                .cloned()
                .map(Into::into)
                .collect(),
            _ => Vec::new(),
        }
    }

    /// Serializes the bare settings object, without the protocol tag.
    pub fn settings_value(&self) -> serde_json::Result<serde_json::Value> {
        match self {
            ProtocolSettings::Vmess(s) => serde_json::to_value(s),
            ProtocolSettings::Vless(s) => serde_json::to_value(s),
            ProtocolSettings::Trojan(s) => serde_json::to_value(s),
            ProtocolSettings::Shadowsocks(s) => serde_json::to_value(s),
            ProtocolSettings::DokodemoDoor(s) => serde_json::to_value(s),
            ProtocolSettings::Socks(s) => serde_json::to_value(s),
            ProtocolSettings::Http(s) => serde_json::to_value(s),
        }
    }
}
