// Copyright (c) 2026 Roman Barinov <rbarinov@gmail.com>
// Licensed under the FSL-1.1-NC.

use crate::codec::lenient;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::collections::BTreeMap;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Network {
    #[default]
    Tcp,
    Kcp,
    Ws,
    Http,
    Quic,
    Grpc,
}

impl Network {
    pub fn as_str(&self) -> &'static str {
        match self {
            Network::Tcp => "tcp",
            Network::Kcp => "kcp",
            Network::Ws => "ws",
            Network::Http => "http",
            Network::Quic => "quic",
            Network::Grpc => "grpc",
        }
    }

    /// KCP carries its own obfuscation and cannot be wrapped in TLS.
    pub fn supports_tls(&self) -> bool {
        !matches!(self, Network::Kcp)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Security {
    #[default]
    None,
    Tls,
    Xtls,
    /// Decoded from newer panels; links are generated as if unsecured.
    Reality,
}

impl Security {
    pub fn as_str(&self) -> &'static str {
        match self {
            Security::None => "none",
            Security::Tls => "tls",
            Security::Xtls => "xtls",
            Security::Reality => "reality",
        }
    }
}

/// Packet camouflage for KCP and QUIC.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum HeaderType {
    #[default]
    None,
    Srtp,
    Utp,
    WechatVideo,
    Dtls,
    Wireguard,
}

impl HeaderType {
    pub fn as_str(&self) -> &'static str {
        match self {
            HeaderType::None => "none",
            HeaderType::Srtp => "srtp",
            HeaderType::Utp => "utp",
            HeaderType::WechatVideo => "wechat-video",
            HeaderType::Dtls => "dtls",
            HeaderType::Wireguard => "wireguard",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct CamouflageHeader {
    #[serde(rename = "type", default)]
    pub kind: HeaderType,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum QuicSecurity {
    #[default]
    #[serde(rename = "none")]
    None,
    #[serde(rename = "aes-128-gcm")]
    Aes128Gcm,
    #[serde(rename = "chacha20-poly1305")]
    Chacha20Poly1305,
}

impl QuicSecurity {
    pub fn as_str(&self) -> &'static str {
        match self {
            QuicSecurity::None => "none",
            QuicSecurity::Aes128Gcm => "aes-128-gcm",
            QuicSecurity::Chacha20Poly1305 => "chacha20-poly1305",
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TlsCertificate {
    #[serde(default)]
    pub certificate_file: String,
    #[serde(default)]
    pub key_file: String,
    /// Keys such as `ocspStapling` or inline `certificate` lines.
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

/// Client-side hints newer panels embed into the TLS block.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct TlsClientSettings {
    pub allow_insecure: bool,
    pub fingerprint: String,
    pub server_name: String,
    pub domains: Vec<String>,
}

/// Shared by the `tls` and `xtls` security modes.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TlsSettings {
    #[serde(default)]
    pub server_name: String,
    #[serde(default)]
    pub certificates: Vec<TlsCertificate>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub alpn: Option<Vec<String>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub min_version: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max_version: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub cipher_suites: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub reject_unknown_sni: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub settings: Option<TlsClientSettings>,
}

impl TlsSettings {
    pub fn new(
        server_name: impl Into<String>,
        certificate_file: impl Into<String>,
        key_file: impl Into<String>,
    ) -> Self {
        Self {
            server_name: server_name.into(),
            certificates: vec![TlsCertificate {
                certificate_file: certificate_file.into(),
                key_file: key_file.into(),
                ..Default::default()
            }],
            ..Default::default()
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct HttpRequestHeader {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub version: Option<String>,
    pub method: String,
    pub path: Vec<String>,
    pub headers: BTreeMap<String, Vec<String>>,
}

impl Default for HttpRequestHeader {
    fn default() -> Self {
        Self {
            version: None,
            method: "GET".to_string(),
            path: vec!["/".to_string()],
            headers: BTreeMap::new(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HttpResponseHeader {
    #[serde(default = "default_http_version")]
    pub version: String,
    #[serde(default = "default_http_status", deserialize_with = "lenient::string")]
    pub status: String,
    #[serde(default = "default_http_reason")]
    pub reason: String,
    #[serde(default)]
    pub headers: BTreeMap<String, Vec<String>>,
}

fn default_http_version() -> String {
    "1.1".to_string()
}

fn default_http_status() -> String {
    "200".to_string()
}

fn default_http_reason() -> String {
    "OK".to_string()
}

impl Default for HttpResponseHeader {
    fn default() -> Self {
        Self {
            version: default_http_version(),
            status: default_http_status(),
            reason: default_http_reason(),
            headers: BTreeMap::new(),
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum TcpHeader {
    #[default]
    None,
    Http {
        #[serde(default)]
        request: HttpRequestHeader,
        #[serde(default)]
        response: HttpResponseHeader,
    },
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TcpSettings {
    #[serde(default)]
    pub header: TcpHeader,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub accept_proxy_protocol: Option<bool>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct KcpSettings {
    pub mtu: u32,
    pub tti: u32,
    pub uplink_capacity: u32,
    pub downlink_capacity: u32,
    pub congestion: bool,
    pub read_buffer_size: u32,
    pub write_buffer_size: u32,
    pub header: CamouflageHeader,
    pub seed: String,
}

impl Default for KcpSettings {
    fn default() -> Self {
        Self {
            mtu: 1350,
            tti: 20,
            uplink_capacity: 5,
            downlink_capacity: 20,
            congestion: false,
            read_buffer_size: 2,
            write_buffer_size: 2,
            header: CamouflageHeader::default(),
            seed: String::new(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WsSettings {
    #[serde(default = "default_path")]
    pub path: String,
    #[serde(default)]
    pub headers: BTreeMap<String, String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub accept_proxy_protocol: Option<bool>,
}

impl Default for WsSettings {
    fn default() -> Self {
        Self {
            path: default_path(),
            headers: BTreeMap::new(),
            accept_proxy_protocol: None,
        }
    }
}

fn default_path() -> String {
    "/".to_string()
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Sockopt {
    #[serde(default)]
    pub accept_proxy_protocol: bool,
}

/// HTTP/2 transport settings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HttpStreamSettings {
    #[serde(default = "default_path")]
    pub path: String,
    #[serde(default)]
    pub host: Vec<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sockopt: Option<Sockopt>,
}

impl Default for HttpStreamSettings {
    fn default() -> Self {
        Self {
            path: default_path(),
            host: Vec::new(),
            sockopt: None,
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct QuicSettings {
    #[serde(default)]
    pub security: QuicSecurity,
    #[serde(default)]
    pub key: String,
    #[serde(default)]
    pub header: CamouflageHeader,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GrpcSettings {
    #[serde(default)]
    pub service_name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub multi_mode: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sockopt: Option<Sockopt>,
}

/// Transport and security block of an inbound.
///
/// Keys this crate does not model (`realitySettings`, `sockopt`, ...) are
/// kept in `extra` so an inbound survives a fetch/update round trip.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StreamSettings {
    #[serde(default)]
    pub network: Network,
    #[serde(default)]
    pub security: Security,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tls_settings: Option<TlsSettings>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub xtls_settings: Option<TlsSettings>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tcp_settings: Option<TcpSettings>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub kcp_settings: Option<KcpSettings>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub ws_settings: Option<WsSettings>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub http_settings: Option<HttpStreamSettings>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub quic_settings: Option<QuicSettings>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub grpc_settings: Option<GrpcSettings>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl StreamSettings {
    pub fn tcp() -> Self {
        Self {
            network: Network::Tcp,
            tcp_settings: Some(TcpSettings::default()),
            ..Default::default()
        }
    }

    /// TCP with HTTP/1.1 header obfuscation on `path`.
    pub fn tcp_http(path: impl Into<String>, host: Option<&str>) -> Self {
        let mut request = HttpRequestHeader {
            path: vec![path.into()],
            ..Default::default()
        };
        if let Some(host) = host {
            request
                .headers
                .insert("Host".to_string(), vec![host.to_string()]);
        }

        Self {
            network: Network::Tcp,
            tcp_settings: Some(TcpSettings {
                header: TcpHeader::Http {
                    request,
                    response: HttpResponseHeader::default(),
                },
                accept_proxy_protocol: None,
            }),
            ..Default::default()
        }
    }

    pub fn kcp(seed: impl Into<String>, header: HeaderType) -> Self {
        Self {
            network: Network::Kcp,
            kcp_settings: Some(KcpSettings {
                seed: seed.into(),
                header: CamouflageHeader { kind: header },
                ..Default::default()
            }),
            ..Default::default()
        }
    }

    pub fn ws(path: impl Into<String>, host: Option<&str>) -> Self {
        let mut settings = WsSettings {
            path: path.into(),
            ..Default::default()
        };
        if let Some(host) = host {
            settings
                .headers
                .insert("Host".to_string(), host.to_string());
        }

        Self {
            network: Network::Ws,
            ws_settings: Some(settings),
            ..Default::default()
        }
    }

    pub fn http(path: impl Into<String>, hosts: Vec<String>) -> Self {
        Self {
            network: Network::Http,
            http_settings: Some(HttpStreamSettings {
                path: path.into(),
                host: hosts,
                sockopt: None,
            }),
            ..Default::default()
        }
    }

    pub fn quic(security: QuicSecurity, key: impl Into<String>, header: HeaderType) -> Self {
        Self {
            network: Network::Quic,
            quic_settings: Some(QuicSettings {
                security,
                key: key.into(),
                header: CamouflageHeader { kind: header },
            }),
            ..Default::default()
        }
    }

    pub fn grpc(service_name: impl Into<String>, multi_mode: bool) -> Self {
        Self {
            network: Network::Grpc,
            grpc_settings: Some(GrpcSettings {
                service_name: service_name.into(),
                multi_mode: multi_mode.then_some(true),
                sockopt: None,
            }),
            ..Default::default()
        }
    }

    pub fn with_tls(mut self, tls: TlsSettings) -> Self {
        self.security = Security::Tls;
        self.tls_settings = Some(tls);
        self.xtls_settings = None;
        self
    }

    pub fn with_xtls(mut self, xtls: TlsSettings) -> Self {
        self.security = Security::Xtls;
        self.xtls_settings = Some(xtls);
        self.tls_settings = None;
        self
    }

    /// TLS block matching the active security mode.
    pub fn tls(&self) -> Option<&TlsSettings> {
        match self.security {
            Security::Tls => self.tls_settings.as_ref(),
            Security::Xtls => self.xtls_settings.as_ref(),
            Security::None | Security::Reality => None,
        }
    }
}

/// Looks up a header case-insensitively; panels write both `host` and `Host`.
pub(crate) fn find_header<'a, V>(headers: &'a BTreeMap<String, V>, name: &str) -> Option<&'a V> {
    headers
        .iter()
        .find(|(key, _)| key.eq_ignore_ascii_case(name))
        .map(|(_, value)| value)
}
