// Copyright (c) 2026 Roman Barinov <rbarinov@gmail.com>
// Licensed under the FSL-1.1-NC.

use crate::config::ClientConfig;
use crate::cookies::CookieJar;
use crate::routes::Route;
use reqwest::{header, redirect, Response};
use serde::de::DeserializeOwned;
use serde_json::Value;
use std::path::PathBuf;
use tracing::debug;
use xui_core::{ApiResponse, Error, Result};

/// HTTP session against one panel.
pub struct Connection {
    http: reqwest::Client,
    base_url: String,
    cookies: CookieJar,
    cookie_path: Option<PathBuf>,
}

impl Connection {
    pub fn new(config: &ClientConfig) -> Result<Self> {
        let base_url = normalize_base_url(&config.url)?;

        // the panel answers unauthenticated calls with a redirect to its
        // login page, which has to be seen rather than followed
        let http = reqwest::Client::builder()
            .timeout(config.timeout)
            .redirect(redirect::Policy::none())
            .danger_accept_invalid_certs(config.accept_invalid_certs)
            .build()
            .map_err(|e| Error::Connection(e.to_string()))?;

        let cookies = match &config.cookie_path {
            Some(path) => CookieJar::load(path)?,
            None => CookieJar::new(),
        };

        Ok(Self {
            http,
            base_url,
            cookies,
            cookie_path: config.cookie_path.clone(),
        })
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    pub fn cookies(&self) -> &CookieJar {
        &self.cookies
    }

    pub async fn execute(&self, route: &Route, body: Option<Value>) -> Result<Response> {
        let url = format!("{}{}", self.base_url, route.path);
        debug!(method = %route.method, path = %route.path, "Sending panel request");

        let mut request = self.http.request(route.method.clone(), &url);
        if let Some(cookie) = self.cookies.header_value() {
            request = request.header(header::COOKIE, cookie);
        }
        if let Some(body) = body {
            request = request.json(&body);
        }

        let response = request.send().await.map_err(transport_error)?;
        let status = response.status();
        debug!(status = status.as_u16(), path = %route.path, "Panel responded");

        if status.is_client_error() || status.is_server_error() {
            return Err(Error::UnexpectedStatus(status.as_u16()));
        }
        Ok(response)
    }

    /// Sends the request and unwraps the `{success, msg, obj}` envelope.
    pub async fn call<T: DeserializeOwned>(
        &self,
        route: &Route,
        body: Option<Value>,
    ) -> Result<Option<T>> {
        let response = self.execute(route, body).await?;
        if response.status().is_redirection() {
            return Err(Error::NotLoggedIn);
        }

        Self::decode::<T>(response).await?.into_result()
    }

    pub async fn decode<T: DeserializeOwned>(response: Response) -> Result<ApiResponse<T>> {
        let bytes = response.bytes().await.map_err(transport_error)?;
        Ok(serde_json::from_slice(&bytes)?)
    }

    /// Replaces the jar with the cookies set by `response`.
    pub fn store_cookies(&mut self, response: &Response) {
        self.cookies.clear();
        for cookie in response.cookies() {
            self.cookies.insert(cookie.name(), cookie.value());
        }
    }

    pub fn clear_cookies(&mut self) {
        self.cookies.clear();
    }

    /// Writes the jar to the configured cookie file, if any.
    pub fn persist_cookies(&self) -> Result<()> {
        match &self.cookie_path {
            Some(path) => self.cookies.save(path),
            None => Ok(()),
        }
    }
}

fn transport_error(e: reqwest::Error) -> Error {
    if e.is_timeout() {
        Error::RequestTimeout
    } else {
        Error::Connection(e.to_string())
    }
}

/// Validates the panel URL and strips trailing slashes. A base path such as
/// `https://host:2053/secret` is kept.
pub fn normalize_base_url(raw: &str) -> Result<String> {
    let trimmed = raw.trim();
    let url = url::Url::parse(trimmed).map_err(|e| Error::InvalidUrl(format!("{}: {}", trimmed, e)))?;

    if !matches!(url.scheme(), "http" | "https") {
        return Err(Error::InvalidUrl(format!(
            "{}: only http and https are supported",
            trimmed
        )));
    }
    if url.host_str().is_none() {
        return Err(Error::InvalidUrl(format!("{}: no host", trimmed)));
    }
    if !url.username().is_empty() || url.password().is_some() {
        tracing::warn!("Credentials in the panel URL are ignored, use the auth settings");
    }

    Ok(trimmed.trim_end_matches('/').to_string())
}
