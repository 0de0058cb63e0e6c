// Copyright (c) 2026 Roman Barinov <rbarinov@gmail.com>
// Licensed under the FSL-1.1-NC.

use crate::codec::lenient;
use crate::{Error, Result};
use serde::{Deserialize, Serialize};

/// Envelope wrapping every panel reply.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ApiResponse<T> {
    #[serde(default)]
    pub success: bool,
    #[serde(default)]
    pub msg: String,
    #[serde(default = "Option::default")]
    pub obj: Option<T>,
}

impl<T> ApiResponse<T> {
    /// `success: false` becomes [`Error::Panel`] carrying the trimmed message.
    pub fn into_result(self) -> Result<Option<T>> {
        if self.success {
            Ok(self.obj)
        } else {
            Err(Error::Panel(self.msg.trim().to_string()))
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct Usage {
    #[serde(default)]
    pub current: u64,
    #[serde(default)]
    pub total: u64,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct XrayState {
    #[serde(default)]
    pub state: String,
    #[serde(default)]
    pub error_msg: String,
    #[serde(default)]
    pub version: String,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct NetIo {
    #[serde(default)]
    pub up: u64,
    #[serde(default)]
    pub down: u64,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct NetTraffic {
    #[serde(default)]
    pub sent: u64,
    #[serde(default)]
    pub recv: u64,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct PublicIp {
    #[serde(default)]
    pub ipv4: String,
    #[serde(default)]
    pub ipv6: String,
}

/// Host metrics reported by `/server/status`.
///
/// `cpu_cores`, `cpu_speed_mhz` and `public_ip` are only sent by newer
/// panels and default to zero values.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ServerStatus {
    #[serde(default)]
    pub cpu: f64,
    #[serde(default)]
    pub cpu_cores: u32,
    #[serde(default)]
    pub cpu_speed_mhz: f64,
    #[serde(default)]
    pub mem: Usage,
    #[serde(default)]
    pub swap: Usage,
    #[serde(default)]
    pub disk: Usage,
    #[serde(default)]
    pub xray: XrayState,
    #[serde(default)]
    pub uptime: u64,
    #[serde(default)]
    pub loads: Vec<f64>,
    #[serde(default)]
    pub tcp_count: u64,
    #[serde(default)]
    pub udp_count: u64,
    #[serde(default, rename = "netIO")]
    pub net_io: NetIo,
    #[serde(default)]
    pub net_traffic: NetTraffic,
    #[serde(default, rename = "publicIP")]
    pub public_ip: PublicIp,
}

/// Panel configuration from the `setting/all` endpoint.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PanelSettings {
    #[serde(default, deserialize_with = "lenient::int")]
    pub web_port: i64,
    #[serde(default)]
    pub web_listen: String,
    #[serde(default)]
    pub web_domain: String,
    #[serde(default)]
    pub web_cert_file: String,
    #[serde(default)]
    pub web_key_file: String,
    #[serde(default = "default_web_base_path")]
    pub web_base_path: String,
    #[serde(default, deserialize_with = "lenient::int")]
    pub session_max_age: i64,
    #[serde(default, deserialize_with = "lenient::int")]
    pub expire_diff: i64,
    #[serde(default, deserialize_with = "lenient::int")]
    pub traffic_diff: i64,
    #[serde(default)]
    pub time_location: String,
    #[serde(default)]
    pub xray_template_config: String,
    #[serde(default, deserialize_with = "lenient::boolean")]
    pub tg_bot_enable: bool,
    #[serde(default)]
    pub tg_bot_token: String,
    /// Numeric on some panels, comma separated ids on others.
    #[serde(default, deserialize_with = "lenient::string")]
    pub tg_bot_chat_id: String,
    /// Hour of day on older panels, cron expression on newer ones.
    #[serde(default, deserialize_with = "lenient::string")]
    pub tg_run_time: String,
    #[serde(default, deserialize_with = "lenient::boolean")]
    pub tg_bot_backup: bool,
    #[serde(default, deserialize_with = "lenient::boolean")]
    pub tg_bot_login_notify: bool,
    #[serde(default, deserialize_with = "lenient::int")]
    pub tg_cpu: i64,
    #[serde(default = "default_tg_lang")]
    pub tg_lang: String,
    #[serde(default, deserialize_with = "lenient::boolean")]
    pub secret_enable: bool,
    #[serde(default, deserialize_with = "lenient::boolean")]
    pub sub_enable: bool,
    #[serde(default)]
    pub sub_listen: String,
    #[serde(default, deserialize_with = "lenient::int")]
    pub sub_port: i64,
    #[serde(default = "default_sub_path")]
    pub sub_path: String,
    #[serde(default)]
    pub sub_domain: String,
    #[serde(default)]
    pub sub_cert_file: String,
    #[serde(default)]
    pub sub_key_file: String,
    #[serde(default = "default_sub_updates", deserialize_with = "lenient::int")]
    pub sub_updates: i64,
}

fn default_web_base_path() -> String {
    "/".to_string()
}

fn default_tg_lang() -> String {
    "en-US".to_string()
}

fn default_sub_path() -> String {
    "/sub/".to_string()
}

fn default_sub_updates() -> i64 {
    12
}
