// Copyright (c) 2026 Roman Barinov <rbarinov@gmail.com>
// Licensed under the FSL-1.1-NC.

use crate::config::ClientConfig;
use crate::connection::Connection;
use crate::routes::{Endpoint, PanelFlavor, Route};
use serde::de::IgnoredAny;
use serde_json::{json, Value};
use tracing::{debug, info, warn};
use xui_core::codec;
use xui_core::{
    ClientStat, Error, Inbound, InboundClient, PanelSettings, Result, ServerStatus,
};

/// Client for one panel.
///
/// Calls other than [`PanelClient::login`] need a session cookie, either
/// from a login or loaded from the configured cookie file. A call made
/// without a valid session fails with [`Error::NotLoggedIn`].
pub struct PanelClient {
    connection: Connection,
    flavor: PanelFlavor,
}

impl PanelClient {
    pub fn new(config: ClientConfig) -> Result<Self> {
        let connection = Connection::new(&config)?;
        debug!(url = %connection.base_url(), flavor = %config.flavor, "Created panel client");

        Ok(Self {
            connection,
            flavor: config.flavor,
        })
    }

    pub fn is_logged_in(&self) -> bool {
        !self.connection.cookies().is_empty()
    }

    pub fn base_url(&self) -> &str {
        self.connection.base_url()
    }

    pub fn flavor(&self) -> PanelFlavor {
        self.flavor
    }

    fn route(&self, endpoint: Endpoint<'_>) -> Result<Route> {
        self.flavor.route(&endpoint).ok_or_else(|| {
            warn!(
                endpoint = endpoint.name(),
                flavor = %self.flavor,
                "Endpoint not available on this panel"
            );
            Error::Unsupported {
                endpoint: endpoint.name(),
                flavor: self.flavor.to_string(),
            }
        })
    }

    async fn call<T: serde::de::DeserializeOwned>(
        &self,
        endpoint: Endpoint<'_>,
        body: Option<Value>,
    ) -> Result<Option<T>> {
        let route = self.route(endpoint)?;
        self.connection.call(&route, body).await
    }

    async fn call_unit(&self, endpoint: Endpoint<'_>, body: Option<Value>) -> Result<()> {
        self.call::<IgnoredAny>(endpoint, body).await.map(|_| ())
    }

    async fn call_required<T: serde::de::DeserializeOwned>(
        &self,
        endpoint: Endpoint<'_>,
        body: Option<Value>,
    ) -> Result<T> {
        self.call(endpoint, body)
            .await?
            .ok_or_else(|| Error::MissingField("obj".to_string()))
    }

    /// Logs in and stores the session cookie. Does nothing when a cookie is
    /// already held.
    pub async fn login(&mut self, username: &str, password: &str) -> Result<()> {
        if self.is_logged_in() {
            debug!("Session cookie present, skipping login");
            return Ok(());
        }

        let route = self.route(Endpoint::Login)?;
        let body = json!({ "username": username, "password": password });
        let response = self.connection.execute(&route, Some(body)).await?;
        self.connection.store_cookies(&response);

        let accepted = Connection::decode::<IgnoredAny>(response)
            .await
            .and_then(|reply| reply.into_result());
        if let Err(e) = accepted {
            debug!(error = %e, "Login rejected");
            self.connection.clear_cookies();
            return Err(Error::AuthenticationFailed);
        }

        self.connection.persist_cookies()?;
        info!(username = %username, url = %self.base_url(), "Logged in to panel");
        Ok(())
    }

    /// Ends the session. The panel answers a successful logout with a
    /// redirect to its login page.
    pub async fn logout(&mut self) -> Result<()> {
        if !self.is_logged_in() {
            return Ok(());
        }

        let route = self.route(Endpoint::Logout)?;
        let response = self.connection.execute(&route, None).await?;
        if !response.status().is_redirection() {
            return Err(Error::LogoutFailed);
        }

        self.connection.clear_cookies();
        self.connection.persist_cookies()?;
        info!(url = %self.base_url(), "Logged out of panel");
        Ok(())
    }

    pub async fn server_status(&self) -> Result<ServerStatus> {
        self.call_required(Endpoint::ServerStatus, None).await
    }

    /// Last `limit` lines of the panel log.
    pub async fn server_log(&self, limit: usize) -> Result<Vec<String>> {
        Ok(self
            .call(Endpoint::ServerLog(limit), None)
            .await?
            .unwrap_or_default())
    }

    /// The xray configuration the panel generated.
    pub async fn server_config(&self) -> Result<Value> {
        self.call_required(Endpoint::ServerConfig, None).await
    }

    pub async fn settings(&self) -> Result<PanelSettings> {
        self.call_required(Endpoint::Settings, None).await
    }

    pub async fn restart_panel(&self) -> Result<()> {
        self.call_unit(Endpoint::RestartPanel, None).await
    }

    pub async fn list_inbounds(&self) -> Result<Vec<Inbound>> {
        Ok(self
            .call(Endpoint::ListInbounds, None)
            .await?
            .unwrap_or_default())
    }

    pub async fn get_inbound(&self, id: i64) -> Result<Inbound> {
        self.call_required(Endpoint::GetInbound(id), None).await
    }

    pub async fn add_inbound(&self, inbound: &Inbound) -> Result<()> {
        inbound.validate()?;
        let payload = serde_json::to_value(inbound.to_payload()?)?;
        self.call_unit(Endpoint::AddInbound, Some(payload)).await
    }

    pub async fn update_inbound(&self, id: i64, inbound: &Inbound) -> Result<()> {
        inbound.validate()?;
        let payload = serde_json::to_value(inbound.to_payload()?)?;
        self.call_unit(Endpoint::UpdateInbound(id), Some(payload))
            .await
    }

    pub async fn delete_inbound(&self, id: i64) -> Result<()> {
        self.call_unit(Endpoint::DeleteInbound(id), None).await
    }

    /// Traffic counters for `email`, `None` when the panel has no record.
    pub async fn client_traffics(&self, email: &str) -> Result<Option<ClientStat>> {
        self.call(Endpoint::ClientTraffics(email), None).await
    }

    /// IPs recently seen for `email`. Panels report "no record" as a plain
    /// message instead of a list, which yields an empty list here.
    pub async fn client_ips(&self, email: &str) -> Result<Vec<String>> {
        let obj: Option<Value> = self.call(Endpoint::ClientIps(email), None).await?;
        Ok(ip_list(obj))
    }

    pub async fn clear_client_ips(&self, email: &str) -> Result<()> {
        self.call_unit(Endpoint::ClearClientIps(email), None).await
    }

    /// Adds `clients` to inbound `id`. An empty slice sends nothing.
    pub async fn add_inbound_clients(&self, id: i64, clients: &[InboundClient]) -> Result<()> {
        if clients.is_empty() {
            return Ok(());
        }

        let body = clients_body(id, clients)?;
        self.call_unit(Endpoint::AddInboundClient, Some(body)).await
    }

    /// Removes the client addressed by `client_id`, see [`InboundClient::key`].
    pub async fn delete_inbound_client(&self, id: i64, client_id: &str) -> Result<()> {
        self.call_unit(Endpoint::DeleteInboundClient(id, client_id), None)
            .await
    }

    pub async fn update_inbound_client(
        &self,
        id: i64,
        client_id: &str,
        client: &InboundClient,
    ) -> Result<()> {
        let body = clients_body(id, std::slice::from_ref(client))?;
        self.call_unit(Endpoint::UpdateInboundClient(client_id), Some(body))
            .await
    }

    pub async fn reset_client_traffic(&self, id: i64, email: &str) -> Result<()> {
        self.call_unit(Endpoint::ResetClientTraffic(id, email), None)
            .await
    }

    pub async fn delete_depleted_clients(&self, id: i64) -> Result<()> {
        self.call_unit(Endpoint::DeleteDepletedClients(id), None)
            .await
    }
}

/// `{id, settings}` body of the client endpoints; `settings` is JSON text
/// holding the clients with every limit key present.
fn clients_body(id: i64, clients: &[InboundClient]) -> Result<Value> {
    let clients: Vec<InboundClient> = clients.iter().map(InboundClient::filled).collect();
    let settings = codec::encode_embedded(&json!({ "clients": clients }))?;
    Ok(json!({ "id": id, "settings": settings }))
}

fn ip_list(obj: Option<Value>) -> Vec<String> {
    let list = match obj {
        Some(Value::Array(items)) => items,
        // some panels return the list as JSON text
        Some(Value::String(text)) => serde_json::from_str(&text).unwrap_or_default(),
        _ => Vec::new(),
    };

    list.into_iter()
        .filter_map(|item| match item {
            Value::String(ip) => Some(ip),
            _ => None,
        })
        .collect()
}
