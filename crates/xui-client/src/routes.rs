// Copyright (c) 2026 Roman Barinov <rbarinov@gmail.com>
// Licensed under the FSL-1.1-NC.

use reqwest::Method;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Which fork of the panel is on the other end. Forks moved endpoints
/// around and newer ones added per-client management.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum PanelFlavor {
    Vaxilu,
    NidukaAkalanka,
    #[default]
    Mhsanaei,
    Alireza0,
}

impl PanelFlavor {
    pub fn as_str(&self) -> &'static str {
        match self {
            PanelFlavor::Vaxilu => "vaxilu",
            PanelFlavor::NidukaAkalanka => "niduka-akalanka",
            PanelFlavor::Mhsanaei => "mhsanaei",
            PanelFlavor::Alireza0 => "alireza0",
        }
    }

    fn is_modern(&self) -> bool {
        matches!(self, PanelFlavor::Mhsanaei | PanelFlavor::Alireza0)
    }

    fn setting_base(&self) -> &'static str {
        match self {
            PanelFlavor::Mhsanaei => "/panel/setting",
            _ => "/xui/setting",
        }
    }

    fn inbound_base(&self) -> &'static str {
        match self {
            PanelFlavor::Vaxilu | PanelFlavor::NidukaAkalanka => "/xui/inbound",
            PanelFlavor::Mhsanaei => "/panel/inbound",
            PanelFlavor::Alireza0 => "/xui/API/inbounds",
        }
    }

    fn api_base(&self) -> Option<&'static str> {
        match self {
            PanelFlavor::Vaxilu => None,
            PanelFlavor::NidukaAkalanka | PanelFlavor::Alireza0 => Some("/xui/API/inbounds"),
            PanelFlavor::Mhsanaei => Some("/panel/api/inbounds"),
        }
    }

    fn client_ip_base(&self) -> Option<&'static str> {
        match self {
            PanelFlavor::NidukaAkalanka => Some("/xui/inbound"),
            _ => self.api_base(),
        }
    }

    /// Resolves `endpoint` for this flavor; `None` when the panel lacks it.
    pub fn route(&self, endpoint: &Endpoint<'_>) -> Option<Route> {
        let modern_api = self.api_base().filter(|_| self.is_modern());

        match *endpoint {
            Endpoint::Login => Some(Route::post("/login")),
            Endpoint::Logout => Some(Route::get("/logout")),
            Endpoint::ServerStatus => Some(Route::post("/server/status")),
            Endpoint::ServerLog(limit) => self
                .is_modern()
                .then(|| Route::post(format!("/server/logs/{}", limit))),
            Endpoint::ServerConfig => self
                .is_modern()
                .then(|| Route::post("/server/getConfigJson")),
            Endpoint::Settings => Some(Route::post(format!("{}/all", self.setting_base()))),
            Endpoint::RestartPanel => Some(Route::post(format!(
                "{}/restartPanel",
                self.setting_base()
            ))),
            Endpoint::ListInbounds => Some(match self {
                PanelFlavor::Alireza0 => Route::get(format!("{}/", self.inbound_base())),
                _ => Route::post(format!("{}/list", self.inbound_base())),
            }),
            Endpoint::AddInbound => Some(Route::post(format!("{}/add", self.inbound_base()))),
            Endpoint::UpdateInbound(id) => Some(Route::post(format!(
                "{}/update/{}",
                self.inbound_base(),
                id
            ))),
            Endpoint::DeleteInbound(id) => Some(Route::post(format!(
                "{}/del/{}",
                self.inbound_base(),
                id
            ))),
            Endpoint::GetInbound(id) => self
                .api_base()
                .map(|base| Route::get(format!("{}/get/{}", base, id))),
            Endpoint::ClientIps(email) => self
                .client_ip_base()
                .map(|base| Route::post(format!("{}/clientIps/{}", base, email))),
            Endpoint::ClearClientIps(email) => self
                .client_ip_base()
                .map(|base| Route::post(format!("{}/clearClientIps/{}", base, email))),
            Endpoint::ClientTraffics(email) => modern_api
                .map(|base| Route::get(format!("{}/getClientTraffics/{}", base, email))),
            Endpoint::AddInboundClient => {
                modern_api.map(|base| Route::post(format!("{}/addClient", base)))
            }
            Endpoint::DeleteInboundClient(id, client_id) => modern_api
                .map(|base| Route::post(format!("{}/{}/delClient/{}", base, id, client_id))),
            Endpoint::UpdateInboundClient(client_id) => modern_api
                .map(|base| Route::post(format!("{}/updateClient/{}", base, client_id))),
            Endpoint::ResetClientTraffic(id, email) => modern_api.map(|base| {
                Route::post(format!("{}/{}/resetClientTraffic/{}", base, id, email))
            }),
            Endpoint::DeleteDepletedClients(id) => modern_api
                .map(|base| Route::post(format!("{}/delDepletedClients/{}", base, id))),
        }
    }
}

impl fmt::Display for PanelFlavor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for PanelFlavor {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "vaxilu" => Ok(PanelFlavor::Vaxilu),
            "niduka-akalanka" | "nidukaakalanka" => Ok(PanelFlavor::NidukaAkalanka),
            "mhsanaei" | "3x-ui" => Ok(PanelFlavor::Mhsanaei),
            "alireza0" => Ok(PanelFlavor::Alireza0),
            other => Err(format!("unknown panel flavor: {}", other)),
        }
    }
}

/// Every panel call this client knows, with its path arguments.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Endpoint<'a> {
    Login,
    Logout,
    ServerStatus,
    ServerLog(usize),
    ServerConfig,
    Settings,
    RestartPanel,
    ListInbounds,
    AddInbound,
    UpdateInbound(i64),
    DeleteInbound(i64),
    GetInbound(i64),
    ClientTraffics(&'a str),
    ClientIps(&'a str),
    ClearClientIps(&'a str),
    AddInboundClient,
    DeleteInboundClient(i64, &'a str),
    UpdateInboundClient(&'a str),
    ResetClientTraffic(i64, &'a str),
    DeleteDepletedClients(i64),
}

impl Endpoint<'_> {
    pub fn name(&self) -> &'static str {
        match self {
            Endpoint::Login => "login",
            Endpoint::Logout => "logout",
            Endpoint::ServerStatus => "server_status",
            Endpoint::ServerLog(_) => "server_log",
            Endpoint::ServerConfig => "server_config",
            Endpoint::Settings => "settings",
            Endpoint::RestartPanel => "restart_panel",
            Endpoint::ListInbounds => "list_inbounds",
            Endpoint::AddInbound => "add_inbound",
            Endpoint::UpdateInbound(_) => "update_inbound",
            Endpoint::DeleteInbound(_) => "delete_inbound",
            Endpoint::GetInbound(_) => "get_inbound",
            Endpoint::ClientTraffics(_) => "client_traffics",
            Endpoint::ClientIps(_) => "client_ips",
            Endpoint::ClearClientIps(_) => "clear_client_ips",
            Endpoint::AddInboundClient => "add_inbound_client",
            Endpoint::DeleteInboundClient(..) => "delete_inbound_client",
            Endpoint::UpdateInboundClient(_) => "update_inbound_client",
            Endpoint::ResetClientTraffic(..) => "reset_client_traffic",
            Endpoint::DeleteDepletedClients(_) => "delete_depleted_clients",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Route {
    pub method: Method,
    pub path: String,
}

impl Route {
    pub fn get(path: impl Into<String>) -> Self {
        Self {
            method: Method::GET,
            path: path.into(),
        }
    }

    pub fn post(path: impl Into<String>) -> Self {
        Self {
            method: Method::POST,
            path: path.into(),
        }
    }
}
