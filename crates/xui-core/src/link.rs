// Copyright (c) 2026 Roman Barinov <rbarinov@gmail.com>
// Licensed under the FSL-1.1-NC.

//! Shareable client links for inbounds.
//!
//! Formats follow the conventions of the common V2Ray clients:
//! `vmess://base64(json)`, `vless://id@host:port?query#remark`,
//! `trojan://password@host:port?query#remark`, `ss://base64url#remark`,
//! plus plain `socks5://` and `http://` URLs.

use crate::codec::{
    encode_base64, encode_base64_url, encode_fragment, encode_query, encode_userinfo,
};
use crate::inbound::Inbound;
use crate::protocol::{Account, ProtocolSettings};
use crate::stream::{find_header, Network, Security, StreamSettings, TcpHeader};
use crate::{Error, Result};
use serde::Serialize;

/// Version 2 of the VMess share format.
#[derive(Debug, Clone, Serialize)]
struct VmessLink<'a> {
    v: &'static str,
    ps: &'a str,
    add: &'a str,
    port: u16,
    id: &'a str,
    aid: i64,
    net: &'static str,
    #[serde(rename = "type")]
    header_type: &'a str,
    tls: &'static str,
    #[serde(skip_serializing_if = "Option::is_none")]
    path: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    host: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    seed: Option<&'a str>,
    #[serde(skip_serializing_if = "Option::is_none")]
    sni: Option<&'a str>,
    #[serde(skip_serializing_if = "Option::is_none")]
    fp: Option<&'a str>,
    #[serde(skip_serializing_if = "Option::is_none")]
    alpn: Option<String>,
    #[serde(rename = "allowInsecure", skip_serializing_if = "Option::is_none")]
    allow_insecure: Option<bool>,
}

impl Inbound {
    /// Builds the share link for client `client_index`.
    ///
    /// `remark` falls back to the client's email, then to the inbound remark.
    /// Dokodemo-door inbounds have no client side and yield
    /// [`Error::UnsupportedLink`].
    pub fn access_link(
        &self,
        address: &str,
        remark: Option<&str>,
        client_index: usize,
    ) -> Result<String> {
        let default_stream = StreamSettings::tcp();
        let stream = self.stream_settings.as_ref().unwrap_or(&default_stream);

        match &self.settings {
            ProtocolSettings::Vmess(settings) => {
                let client = pick(&settings.clients, client_index)?;
                let remark = self.link_remark(remark, client.limits.email.as_deref());
                vmess_link(self.port, stream, address, remark, &client.id, client.alter_id)
            }
            ProtocolSettings::Vless(settings) => {
                let client = pick(&settings.clients, client_index)?;
                let remark = self.link_remark(remark, client.limits.email.as_deref());
                let flow = (!client.flow.is_empty()).then_some(client.flow.as_str());
                let (host, query) = stream_query(stream, address, flow, true);
                Ok(format!(
                    "vless://{}@{}:{}?{}#{}",
                    client.id,
                    host,
                    self.port,
                    query,
                    encode_fragment(remark)
                ))
            }
            ProtocolSettings::Trojan(settings) => {
                let client = pick(&settings.clients, client_index)?;
                let remark = self.link_remark(remark, client.limits.email.as_deref());
                let flow = (!client.flow.is_empty()).then_some(client.flow.as_str());
                let (host, query) = stream_query(stream, address, flow, false);
                Ok(format!(
                    "trojan://{}@{}:{}?{}#{}",
                    client.password,
                    host,
                    self.port,
                    query,
                    encode_fragment(remark)
                ))
            }
            ProtocolSettings::Shadowsocks(settings) => {
                let remark = self.link_remark(remark, None);
                let host = stream
                    .tls()
                    .map(|tls| tls.server_name.as_str())
                    .filter(|name| !name.is_empty())
                    .unwrap_or(address);
                let user_info = format!(
                    "{}:{}@{}:{}",
                    settings.method, settings.password, host, self.port
                );
                Ok(format!(
                    "ss://{}#{}",
                    encode_base64_url(user_info.as_bytes()),
                    encode_fragment(remark)
                ))
            }
            ProtocolSettings::Socks(settings) => {
                Ok(proxy_url("socks5", settings.accounts.first(), address, self.port))
            }
            ProtocolSettings::Http(settings) => {
                Ok(proxy_url("http", settings.accounts.first(), address, self.port))
            }
            ProtocolSettings::DokodemoDoor(_) => Err(Error::UnsupportedLink(self.protocol())),
        }
    }

    fn link_remark<'a>(&'a self, remark: Option<&'a str>, email: Option<&'a str>) -> &'a str {
        remark
            .filter(|r| !r.is_empty())
            .or(email.filter(|e| !e.is_empty()))
            .unwrap_or(self.remark.as_str())
    }
}

fn pick<T>(clients: &[T], index: usize) -> Result<&T> {
    clients.get(index).ok_or(Error::ClientIndexOutOfRange {
        index,
        count: clients.len(),
    })
}

fn proxy_url(scheme: &str, account: Option<&Account>, address: &str, port: u16) -> String {
    match account {
        Some(account) if !account.user.is_empty() && !account.pass.is_empty() => format!(
            "{}://{}:{}@{}:{}",
            scheme,
            encode_userinfo(&account.user),
            encode_userinfo(&account.pass),
            address,
            port
        ),
        _ => format!("{}://{}:{}", scheme, address, port),
    }
}

fn join(values: &[String]) -> String {
    values.join(",")
}

fn vmess_link(
    port: u16,
    stream: &StreamSettings,
    address: &str,
    remark: &str,
    id: &str,
    alter_id: i64,
) -> Result<String> {
    let mut link = VmessLink {
        v: "2",
        ps: remark,
        add: address,
        port,
        id,
        aid: alter_id,
        net: stream.network.as_str(),
        header_type: "none",
        tls: stream.security.as_str(),
        path: None,
        host: None,
        seed: None,
        sni: None,
        fp: None,
        alpn: None,
        allow_insecure: None,
    };

    match stream.network {
        Network::Tcp => {
            if let Some(TcpHeader::Http { request, .. }) =
                stream.tcp_settings.as_ref().map(|tcp| &tcp.header)
            {
                link.header_type = "http";
                link.path = Some(join(&request.path));
                link.host = find_header(&request.headers, "host").map(|h| join(h));
            }
        }
        Network::Kcp => {
            if let Some(kcp) = &stream.kcp_settings {
                link.header_type = kcp.header.kind.as_str();
                link.seed = Some(kcp.seed.as_str());
            }
        }
        Network::Ws => {
            if let Some(ws) = &stream.ws_settings {
                link.path = Some(ws.path.clone());
                link.host = find_header(&ws.headers, "host").cloned();
            }
        }
        Network::Http => {
            link.net = "h2";
            if let Some(http) = &stream.http_settings {
                link.path = Some(http.path.clone());
                link.host = Some(join(&http.host));
            }
        }
        Network::Quic => {
            if let Some(quic) = &stream.quic_settings {
                link.header_type = quic.header.kind.as_str();
                link.host = Some(quic.security.as_str().to_string());
                link.path = Some(quic.key.clone());
            }
        }
        Network::Grpc => {
            if let Some(grpc) = &stream.grpc_settings {
                link.path = Some(grpc.service_name.clone());
                if grpc.multi_mode == Some(true) {
                    link.header_type = "multi";
                }
            }
        }
    }

    if let (Security::Tls, Some(tls)) = (stream.security, stream.tls_settings.as_ref()) {
        if !tls.server_name.is_empty() {
            link.add = tls.server_name.as_str();
        }
        if let Some(hints) = &tls.settings {
            link.sni = Some(hints.server_name.as_str()).filter(|s| !s.is_empty());
            link.fp = Some(hints.fingerprint.as_str()).filter(|s| !s.is_empty());
            link.allow_insecure = hints.allow_insecure.then_some(true);
        }
        link.alpn = tls
            .alpn
            .as_deref()
            .filter(|alpn| !alpn.is_empty())
            .map(join);
    }

    let json = serde_json::to_string_pretty(&link)?;
    Ok(format!("vmess://{}", encode_base64(json.as_bytes())))
}

/// Query string shared by VLess and Trojan links. Returns the host to put
/// in the authority and the encoded query.
///
/// With TLS the client flow is only advertised when `flow_with_tls` is set;
/// with XTLS it is always advertised. Flow applies to TCP only.
fn stream_query<'a>(
    stream: &'a StreamSettings,
    address: &'a str,
    flow: Option<&'a str>,
    flow_with_tls: bool,
) -> (&'a str, String) {
    let mut params: Vec<(&str, String)> = vec![("type", stream.network.as_str().to_string())];

    match stream.network {
        Network::Tcp => {
            if let Some(TcpHeader::Http { request, .. }) =
                stream.tcp_settings.as_ref().map(|tcp| &tcp.header)
            {
                params.push(("path", join(&request.path)));
                if let Some(host) = find_header(&request.headers, "host") {
                    params.push(("host", join(host)));
                }
                params.push(("headerType", "http".to_string()));
            }
        }
        Network::Kcp => {
            if let Some(kcp) = &stream.kcp_settings {
                params.push(("headerType", kcp.header.kind.as_str().to_string()));
                params.push(("seed", kcp.seed.clone()));
            }
        }
        Network::Ws => {
            if let Some(ws) = &stream.ws_settings {
                params.push(("path", ws.path.clone()));
                if let Some(host) = find_header(&ws.headers, "host") {
                    params.push(("host", host.clone()));
                }
            }
        }
        Network::Http => {
            if let Some(http) = &stream.http_settings {
                params.push(("path", http.path.clone()));
                params.push(("host", join(&http.host)));
            }
        }
        Network::Quic => {
            if let Some(quic) = &stream.quic_settings {
                params.push(("headerType", quic.header.kind.as_str().to_string()));
                params.push(("quicSecurity", quic.security.as_str().to_string()));
                params.push(("key", quic.key.clone()));
            }
        }
        Network::Grpc => {
            if let Some(grpc) = &stream.grpc_settings {
                params.push(("serviceName", grpc.service_name.clone()));
                if grpc.multi_mode == Some(true) {
                    params.push(("mode", "multi".to_string()));
                }
            }
        }
    }

    let mut host = address;
    match (stream.security, stream.tls()) {
        (security @ (Security::Tls | Security::Xtls), Some(tls)) => {
            params.push(("security", security.as_str().to_string()));

            if let Some(hints) = &tls.settings {
                if security == Security::Tls {
                    params.push(("fp", hints.fingerprint.clone()));
                }
                if hints.allow_insecure {
                    params.push(("allowInsecure", "1".to_string()));
                }
                if !hints.server_name.is_empty() {
                    params.push(("sni", hints.server_name.clone()));
                }
            }
            if let Some(alpn) = tls.alpn.as_deref().filter(|alpn| !alpn.is_empty()) {
                params.push(("alpn", join(alpn)));
            }
            if !tls.server_name.is_empty() {
                host = tls.server_name.as_str();
            }

            let advertise = security == Security::Xtls || flow_with_tls;
            if let (true, Network::Tcp, Some(flow)) = (advertise, stream.network, flow) {
                params.push(("flow", flow.to_string()));
            }
        }
        _ => params.push(("security", "none".to_string())),
    }

    (host, encode_query(&params))
}
