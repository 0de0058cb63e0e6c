// Copyright (c) 2026 Roman Barinov <rbarinov@gmail.com>
// Licensed under the FSL-1.1-NC.

use crate::routes::PanelFlavor;
use serde::{Deserialize, Serialize};
use std::env;
use std::path::PathBuf;
use std::time::Duration;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    pub panel: PanelConfig,
    #[serde(default)]
    pub auth: AuthConfig,
    #[serde(default)]
    pub session: SessionConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PanelConfig {
    pub url: String,
    #[serde(default)]
    pub flavor: PanelFlavor,
    /// Request timeout in seconds.
    #[serde(default = "default_timeout")]
    pub timeout: u64,
    #[serde(default = "default_accept_invalid_certs")]
    pub accept_invalid_certs: bool,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AuthConfig {
    #[serde(default)]
    pub username: String,
    #[serde(default)]
    pub password: String,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct SessionConfig {
    #[serde(default)]
    pub cookie_path: Option<PathBuf>,
}

fn default_timeout() -> u64 {
    20
}

fn default_accept_invalid_certs() -> bool {
    true
}

impl Config {
    pub fn load(config_path: Option<PathBuf>) -> anyhow::Result<Self> {
        let mut config = if let Some(path) = config_path {
            let content = std::fs::read_to_string(path)?;
            toml::from_str(&content)?
        } else {
            Self::default()
        };

        config.apply_env_overrides()?;
        config.validate()?;
        Ok(config)
    }

    fn apply_env_overrides(&mut self) -> anyhow::Result<()> {
        if let Ok(val) = env::var("PANEL_URL") {
            self.panel.url = val;
        }
        if let Ok(val) = env::var("PANEL_FLAVOR") {
            self.panel.flavor = val.parse().map_err(anyhow::Error::msg)?;
        }
        if let Ok(val) = env::var("PANEL_TIMEOUT") {
            if let Ok(timeout) = val.parse() {
                self.panel.timeout = timeout;
            }
        }
        if let Ok(val) = env::var("PANEL_ACCEPT_INVALID_CERTS") {
            if let Ok(accept) = val.parse() {
                self.panel.accept_invalid_certs = accept;
            }
        }
        if let Ok(val) = env::var("AUTH_USERNAME") {
            self.auth.username = val;
        }
        if let Ok(val) = env::var("AUTH_PASSWORD") {
            self.auth.password = val;
        }
        if let Ok(val) = env::var("SESSION_COOKIE_PATH") {
            self.session.cookie_path = Some(PathBuf::from(val));
        }
        Ok(())
    }

    fn validate(&self) -> anyhow::Result<()> {
        if self.panel.url.is_empty() {
            anyhow::bail!("PANEL_URL is required");
        }
        let url = url::Url::parse(self.panel.url.trim())?;
        if !matches!(url.scheme(), "http" | "https") {
            anyhow::bail!("PANEL_URL must use http or https, got {}", url.scheme());
        }
        if url.host_str().is_none() {
            anyhow::bail!("PANEL_URL has no host");
        }
        if self.panel.timeout == 0 {
            anyhow::bail!("PANEL_TIMEOUT must be greater than zero");
        }
        if self.auth.username.is_empty() {
            anyhow::bail!("AUTH_USERNAME is required");
        }
        if self.auth.password.is_empty() {
            anyhow::bail!("AUTH_PASSWORD is required");
        }
        Ok(())
    }

    pub fn client_config(&self) -> ClientConfig {
        ClientConfig {
            url: self.panel.url.clone(),
            flavor: self.panel.flavor,
            timeout: Duration::from_secs(self.panel.timeout),
            accept_invalid_certs: self.panel.accept_invalid_certs,
            cookie_path: self.session.cookie_path.clone(),
        }
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            panel: PanelConfig {
                url: String::new(),
                flavor: PanelFlavor::default(),
                timeout: default_timeout(),
                accept_invalid_certs: default_accept_invalid_certs(),
            },
            auth: AuthConfig::default(),
            session: SessionConfig::default(),
        }
    }
}

/// Connection settings for a [`crate::PanelClient`].
#[derive(Debug, Clone)]
pub struct ClientConfig {
    pub url: String,
    pub flavor: PanelFlavor,
    pub timeout: Duration,
    pub accept_invalid_certs: bool,
    pub cookie_path: Option<PathBuf>,
}

impl ClientConfig {
    pub fn new(url: impl Into<String>, flavor: PanelFlavor) -> Self {
        Self {
            url: url.into(),
            flavor,
            timeout: Duration::from_secs(default_timeout()),
            accept_invalid_certs: default_accept_invalid_certs(),
            cookie_path: None,
        }
    }

    pub fn with_cookie_path(mut self, path: impl Into<PathBuf>) -> Self {
        self.cookie_path = Some(path.into());
        self
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }
}
