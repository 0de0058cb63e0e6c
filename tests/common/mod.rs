// Copyright (c) 2026 Roman Barinov <rbarinov@gmail.com>
// Licensed under the FSL-1.1-NC.

use axum::{
    extract::{Path, Request, State},
    http::{header, StatusCode},
    middleware::{self, Next},
    response::{IntoResponse, Redirect, Response},
    routing::{get, post},
    Json, Router,
};
use serde_json::{json, Value};
use std::collections::HashMap;
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::Mutex;
use tokio::task::JoinHandle;
use xui_client::{ClientConfig, PanelClient, PanelFlavor};

pub const USERNAME: &str = "admin";
pub const PASSWORD: &str = "s3cret";
pub const SESSION_COOKIE: &str = "3x-ui";
pub const SESSION_TOKEN: &str = "MTcwMDAwMDAwMHxEdi1CQkFFQ180SUFBUkFCRUFBQQ==";

pub const ALICE_ID: &str = "b831381d-6324-4d53-ad4f-8cda48b30811";

/// What the mock panel holds. Inbounds are kept in the panel's wire shape,
/// with `settings`, `streamSettings` and `sniffing` as JSON text.
#[derive(Debug, Default)]
pub struct PanelState {
    pub inbounds: Vec<Value>,
    pub next_id: i64,
    pub client_ips: HashMap<String, Vec<String>>,
    pub logins: usize,
    pub restarts: usize,
    pub last_body: Option<Value>,
    /// Applied to every route behind the session check.
    pub fault: Option<Fault>,
    /// `/logout` answers 200 with a JSON body instead of redirecting.
    pub logout_without_redirect: bool,
}

#[allow(dead_code)]
#[derive(Debug, Clone, Copy)]
pub enum Fault {
    /// Answer with this HTTP status and no envelope.
    Status(u16),
    /// Wait this long before handling the request.
    Stall(Duration),
}

type SharedState = Arc<Mutex<PanelState>>;

/// An MHSanaei panel on a random local port.
pub struct MockPanel {
    pub url: String,
    pub state: SharedState,
    _handle: JoinHandle<()>,
}

impl MockPanel {
    pub async fn start() -> Self {
        let _ = tracing_subscriber::fmt()
            .with_max_level(tracing::Level::DEBUG)
            .with_test_writer()
            .try_init();

        let state = Arc::new(Mutex::new(seed_state()));

        let listener = tokio::net::TcpListener::bind(SocketAddr::from(([127, 0, 0, 1], 0)))
            .await
            .unwrap();
        let port = listener.local_addr().unwrap().port();
        let app = router(state.clone());

        let handle = tokio::spawn(async move {
            axum::serve(listener, app).await.unwrap();
        });

        Self {
            url: format!("http://127.0.0.1:{}", port),
            state,
            _handle: handle,
        }
    }

    pub fn client_config(&self) -> ClientConfig {
        ClientConfig::new(self.url.clone(), PanelFlavor::Mhsanaei)
    }

    /// A client that has already logged in.
    pub async fn client(&self) -> PanelClient {
        let mut client = PanelClient::new(self.client_config()).unwrap();
        client.login(USERNAME, PASSWORD).await.unwrap();
        client
    }

    pub async fn inbound(&self, id: i64) -> Option<Value> {
        let state = self.state.lock().await;
        state.inbounds.iter().find(|i| i["id"] == id).cloned()
    }

    /// Decoded `settings` of inbound `id`.
    pub async fn inbound_settings(&self, id: i64) -> Value {
        let inbound = self.inbound(id).await.unwrap();
        serde_json::from_str(inbound["settings"].as_str().unwrap()).unwrap()
    }
}

fn seed_state() -> PanelState {
    let settings = json!({
        "clients": [{
            "id": ALICE_ID,
            "flow": "",
            "email": "alice",
            "limitIp": 2,
            "totalGB": 0,
            "expiryTime": 0,
            "enable": true,
            "tgId": "",
            "subId": "k2x9"
        }],
        "decryption": "none",
        "fallbacks": []
    });
    let stream = json!({
        "network": "ws",
        "security": "tls",
        "tlsSettings": {
            "serverName": "vpn.example",
            "certificates": [{"certificateFile": "/etc/x-ui/cert.pem", "keyFile": "/etc/x-ui/key.pem"}],
            "alpn": []
        },
        "wsSettings": {"path": "/ws", "headers": {"Host": "vpn.example"}}
    });

    let inbound = json!({
        "id": 1,
        "up": 5120,
        "down": 20480,
        "total": 0,
        "remark": "edge-ws",
        "enable": true,
        "expiryTime": 0,
        "clientStats": [
            {"id": 1, "inboundId": 1, "enable": true, "email": "alice", "up": 1024, "down": 4096, "expiryTime": 0, "total": 0}
        ],
        "listen": "",
        "port": 443,
        "protocol": "vless",
        "settings": settings.to_string(),
        "streamSettings": stream.to_string(),
        "tag": "inbound-443",
        "sniffing": "{\"enabled\":true,\"destOverride\":[\"http\",\"tls\"]}"
    });

    let mut client_ips = HashMap::new();
    client_ips.insert(
        "alice".to_string(),
        vec!["10.0.0.2".to_string(), "10.0.0.3".to_string()],
    );

    PanelState {
        inbounds: vec![inbound],
        next_id: 2,
        client_ips,
        ..Default::default()
    }
}

fn router(state: SharedState) -> Router {
    let protected = Router::new()
        .route("/server/status", post(server_status))
        .route("/server/logs/:limit", post(server_logs))
        .route("/server/getConfigJson", post(server_config))
        .route("/panel/setting/all", post(settings))
        .route("/panel/setting/restartPanel", post(restart_panel))
        .route("/panel/inbound/list", post(list_inbounds))
        .route("/panel/inbound/add", post(add_inbound))
        .route("/panel/inbound/update/:id", post(update_inbound))
        .route("/panel/inbound/del/:id", post(delete_inbound))
        .route("/panel/api/inbounds/get/:id", get(get_inbound))
        .route(
            "/panel/api/inbounds/getClientTraffics/:email",
            get(client_traffics),
        )
        .route("/panel/api/inbounds/clientIps/:email", post(client_ips))
        .route(
            "/panel/api/inbounds/clearClientIps/:email",
            post(clear_client_ips),
        )
        .route("/panel/api/inbounds/addClient", post(add_client))
        .route(
            "/panel/api/inbounds/updateClient/:client_id",
            post(update_client),
        )
        .route(
            "/panel/api/inbounds/:id/delClient/:client_id",
            post(delete_client),
        )
        .route(
            "/panel/api/inbounds/:id/resetClientTraffic/:email",
            post(reset_client_traffic),
        )
        .route(
            "/panel/api/inbounds/delDepletedClients/:id",
            post(delete_depleted_clients),
        )
        .route_layer(middleware::from_fn(require_session))
        .route_layer(middleware::from_fn_with_state(state.clone(), inject_fault));

    Router::new()
        .route("/login", post(login))
        .route("/logout", get(logout))
        .merge(protected)
        .with_state(state)
}

/// Unauthenticated requests are sent back to the login page.
async fn require_session(request: Request, next: Next) -> Response {
    let expected = format!("{}={}", SESSION_COOKIE, SESSION_TOKEN);
    let authorized = request
        .headers()
        .get(header::COOKIE)
        .and_then(|value| value.to_str().ok())
        .map_or(false, |cookies| {
            cookies.split(';').any(|pair| pair.trim() == expected)
        });

    if authorized {
        next.run(request).await
    } else {
        Redirect::temporary("/").into_response()
    }
}

async fn inject_fault(State(state): State<SharedState>, request: Request, next: Next) -> Response {
    let fault = state.lock().await.fault;
    match fault {
        Some(Fault::Status(code)) => StatusCode::from_u16(code)
            .unwrap_or(StatusCode::INTERNAL_SERVER_ERROR)
            .into_response(),
        Some(Fault::Stall(delay)) => {
            tokio::time::sleep(delay).await;
            next.run(request).await
        }
        None => next.run(request).await,
    }
}

fn ok(obj: Value) -> Json<Value> {
    Json(json!({"success": true, "msg": "", "obj": obj}))
}

fn fail(msg: &str) -> Json<Value> {
    Json(json!({"success": false, "msg": msg, "obj": null}))
}

async fn login(State(state): State<SharedState>, Json(body): Json<Value>) -> Response {
    if body["username"] != USERNAME || body["password"] != PASSWORD {
        return fail("Invalid username or password").into_response();
    }

    state.lock().await.logins += 1;
    let cookie = format!(
        "{}={}; Path=/; HttpOnly; SameSite=Lax",
        SESSION_COOKIE, SESSION_TOKEN
    );
    (
        [(header::SET_COOKIE, cookie)],
        Json(json!({"success": true, "msg": "Login Successfully", "obj": null})),
    )
        .into_response()
}

async fn logout(State(state): State<SharedState>) -> Response {
    if state.lock().await.logout_without_redirect {
        return ok(Value::Null).into_response();
    }
    Redirect::to("/").into_response()
}

async fn server_status() -> Json<Value> {
    ok(json!({
        "cpu": 3.5,
        "cpuCores": 2,
        "cpuSpeedMhz": 2399.998,
        "mem": {"current": 512000000, "total": 2048000000},
        "swap": {"current": 0, "total": 0},
        "disk": {"current": 7000000000u64, "total": 20000000000u64},
        "xray": {"state": "running", "errorMsg": "", "version": "1.8.4"},
        "uptime": 86400,
        "loads": [0.12, 0.08, 0.05],
        "tcpCount": 42,
        "udpCount": 7,
        "netIO": {"up": 1200, "down": 3400},
        "netTraffic": {"sent": 1000000, "recv": 2000000},
        "publicIP": {"ipv4": "203.0.113.7", "ipv6": "N/A"}
    }))
}

async fn server_logs(Path(limit): Path<usize>) -> Json<Value> {
    let lines: Vec<String> = (1..=250)
        .map(|n| format!("2026/10/16 12:00:00 INFO - line {}", n))
        .take(limit)
        .collect();
    ok(json!(lines))
}

async fn server_config() -> Json<Value> {
    ok(json!({
        "log": {"loglevel": "warning"},
        "inbounds": [{"tag": "api", "port": 62789, "protocol": "dokodemo-door"}],
        "outbounds": [{"protocol": "freedom"}, {"protocol": "blackhole", "tag": "blocked"}]
    }))
}

async fn settings() -> Json<Value> {
    ok(json!({
        "webListen": "",
        "webDomain": "",
        "webPort": 2053,
        "webCertFile": "",
        "webKeyFile": "",
        "webBasePath": "/",
        "sessionMaxAge": 0,
        "expireDiff": 0,
        "trafficDiff": 0,
        "timeLocation": "Asia/Tehran",
        "tgBotEnable": false,
        "tgBotToken": "",
        "tgBotChatId": "",
        "tgRunTime": "@daily",
        "tgBotBackup": false,
        "tgBotLoginNotify": true,
        "tgCpu": 80,
        "tgLang": "en-US",
        "secretEnable": false,
        "subEnable": true,
        "subListen": "",
        "subPort": 2096,
        "subPath": "/sub/",
        "subDomain": "",
        "subCertFile": "",
        "subKeyFile": "",
        "subUpdates": 12
    }))
}

async fn restart_panel(State(state): State<SharedState>) -> Json<Value> {
    state.lock().await.restarts += 1;
    ok(Value::Null)
}

async fn list_inbounds(State(state): State<SharedState>) -> Json<Value> {
    let state = state.lock().await;
    ok(json!(state.inbounds))
}

async fn get_inbound(State(state): State<SharedState>, Path(id): Path<i64>) -> Json<Value> {
    let state = state.lock().await;
    match state.inbounds.iter().find(|i| i["id"] == id) {
        Some(inbound) => ok(inbound.clone()),
        None => fail("record not found"),
    }
}

async fn add_inbound(State(state): State<SharedState>, Json(body): Json<Value>) -> Json<Value> {
    let mut state = state.lock().await;
    state.last_body = Some(body.clone());

    if state.inbounds.iter().any(|i| i["port"] == body["port"]) {
        return fail(&format!("Port already exists: {}", body["port"]));
    }

    let id = state.next_id;
    state.next_id += 1;

    let mut inbound = body;
    inbound["id"] = json!(id);
    inbound["tag"] = json!(format!("inbound-{}", inbound["port"]));
    inbound["clientStats"] = json!([]);
    state.inbounds.push(inbound.clone());
    ok(inbound)
}

async fn update_inbound(
    State(state): State<SharedState>,
    Path(id): Path<i64>,
    Json(body): Json<Value>,
) -> Json<Value> {
    let mut state = state.lock().await;
    state.last_body = Some(body.clone());

    let Some(inbound) = state.inbounds.iter_mut().find(|i| i["id"] == id) else {
        return fail("record not found");
    };
    let stats = inbound["clientStats"].clone();
    *inbound = body;
    inbound["id"] = json!(id);
    inbound["tag"] = json!(format!("inbound-{}", inbound["port"]));
    inbound["clientStats"] = stats;
    ok(inbound.clone())
}

async fn delete_inbound(State(state): State<SharedState>, Path(id): Path<i64>) -> Json<Value> {
    let mut state = state.lock().await;
    let before = state.inbounds.len();
    state.inbounds.retain(|i| i["id"] != id);
    if state.inbounds.len() == before {
        return fail("record not found");
    }
    ok(json!(id))
}

async fn client_traffics(
    State(state): State<SharedState>,
    Path(email): Path<String>,
) -> Json<Value> {
    let state = state.lock().await;
    let stat = state
        .inbounds
        .iter()
        .filter_map(|i| i["clientStats"].as_array())
        .flatten()
        .find(|stat| stat["email"] == email.as_str())
        .cloned();
    ok(stat.unwrap_or(Value::Null))
}

async fn client_ips(State(state): State<SharedState>, Path(email): Path<String>) -> Json<Value> {
    let state = state.lock().await;
    match state.client_ips.get(&email) {
        Some(ips) => ok(json!(ips)),
        None => ok(json!("No IP Record")),
    }
}

async fn clear_client_ips(
    State(state): State<SharedState>,
    Path(email): Path<String>,
) -> Json<Value> {
    state.lock().await.client_ips.remove(&email);
    ok(Value::Null)
}

fn client_key(client: &Value) -> Option<&str> {
    ["id", "password", "email"]
        .iter()
        .find_map(|key| client[*key].as_str().filter(|v| !v.is_empty()))
}

fn decode_settings(inbound: &Value) -> Value {
    inbound["settings"]
        .as_str()
        .and_then(|text| serde_json::from_str(text).ok())
        .unwrap_or_else(|| json!({}))
}

fn decode_clients(body: &Value) -> Option<Vec<Value>> {
    let settings: Value = serde_json::from_str(body["settings"].as_str()?).ok()?;
    settings["clients"].as_array().cloned()
}

async fn add_client(State(state): State<SharedState>, Json(body): Json<Value>) -> Json<Value> {
    let mut state = state.lock().await;
    state.last_body = Some(body.clone());

    let Some(new_clients) = decode_clients(&body) else {
        return fail("invalid settings");
    };
    let Some(inbound) = state.inbounds.iter_mut().find(|i| i["id"] == body["id"]) else {
        return fail("record not found");
    };

    let mut settings = decode_settings(inbound);
    let mut clients = settings["clients"].as_array().cloned().unwrap_or_default();
    for client in &new_clients {
        if clients.iter().any(|c| c["email"] == client["email"]) {
            return fail(&format!("Duplicate email: {}", client["email"]));
        }
    }

    let inbound_id = inbound["id"].clone();
    let mut stats = inbound["clientStats"].as_array().cloned().unwrap_or_default();
    for client in new_clients {
        stats.push(json!({
            "id": stats.len() + 1,
            "inboundId": inbound_id,
            "enable": client["enable"],
            "email": client["email"],
            "up": 0,
            "down": 0,
            "expiryTime": client["expiryTime"],
            "total": client["totalGB"]
        }));
        clients.push(client);
    }

    settings["clients"] = json!(clients);
    inbound["settings"] = json!(settings.to_string());
    inbound["clientStats"] = json!(stats);
    ok(Value::Null)
}

async fn update_client(
    State(state): State<SharedState>,
    Path(client_id): Path<String>,
    Json(body): Json<Value>,
) -> Json<Value> {
    let mut state = state.lock().await;
    state.last_body = Some(body.clone());

    let Some(replacement) = decode_clients(&body).and_then(|c| c.into_iter().next()) else {
        return fail("invalid settings");
    };
    let Some(inbound) = state.inbounds.iter_mut().find(|i| i["id"] == body["id"]) else {
        return fail("record not found");
    };

    let mut settings = decode_settings(inbound);
    let Some(clients) = settings["clients"].as_array_mut() else {
        return fail("inbound has no clients");
    };
    let Some(slot) = clients
        .iter_mut()
        .find(|c| client_key(c) == Some(client_id.as_str()))
    else {
        return fail("Client Not Found");
    };
    *slot = replacement;

    inbound["settings"] = json!(settings.to_string());
    ok(Value::Null)
}

async fn delete_client(
    State(state): State<SharedState>,
    Path((id, client_id)): Path<(i64, String)>,
) -> Json<Value> {
    let mut state = state.lock().await;
    let Some(inbound) = state.inbounds.iter_mut().find(|i| i["id"] == id) else {
        return fail("record not found");
    };

    let mut settings = decode_settings(inbound);
    let Some(clients) = settings["clients"].as_array_mut() else {
        return fail("inbound has no clients");
    };
    let Some(position) = clients
        .iter()
        .position(|c| client_key(c) == Some(client_id.as_str()))
    else {
        return fail("Client Not Found");
    };
    let removed = clients.remove(position);

    if let Some(stats) = inbound["clientStats"].as_array_mut() {
        stats.retain(|stat| stat["email"] != removed["email"]);
    }
    inbound["settings"] = json!(settings.to_string());
    ok(Value::Null)
}

async fn reset_client_traffic(
    State(state): State<SharedState>,
    Path((id, email)): Path<(i64, String)>,
) -> Json<Value> {
    let mut state = state.lock().await;
    let stat = state
        .inbounds
        .iter_mut()
        .filter(|i| i["id"] == id)
        .filter_map(|i| i["clientStats"].as_array_mut())
        .flatten()
        .find(|stat| stat["email"] == email.as_str());

    match stat {
        Some(stat) => {
            stat["up"] = json!(0);
            stat["down"] = json!(0);
            ok(Value::Null)
        }
        None => fail("Client Not Found"),
    }
}

/// Drops clients whose quota is used up.
async fn delete_depleted_clients(
    State(state): State<SharedState>,
    Path(id): Path<i64>,
) -> Json<Value> {
    let mut state = state.lock().await;
    let Some(inbound) = state.inbounds.iter_mut().find(|i| i["id"] == id) else {
        return fail("record not found");
    };

    let stats = inbound["clientStats"].as_array().cloned().unwrap_or_default();
    let depleted: Vec<Value> = stats
        .iter()
        .filter(|stat| {
            let total = stat["total"].as_i64().unwrap_or(0);
            let used = stat["up"].as_i64().unwrap_or(0) + stat["down"].as_i64().unwrap_or(0);
            total > 0 && used >= total
        })
        .map(|stat| stat["email"].clone())
        .collect();

    let mut settings = decode_settings(inbound);
    if let Some(clients) = settings["clients"].as_array_mut() {
        clients.retain(|c| !depleted.contains(&c["email"]));
    }
    inbound["settings"] = json!(settings.to_string());
    inbound["clientStats"] = json!(stats
        .into_iter()
        .filter(|stat| !depleted.contains(&stat["email"]))
        .collect::<Vec<_>>());
    ok(Value::Null)
}
