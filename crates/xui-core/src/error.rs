// Copyright (c) 2026 Roman Barinov <rbarinov@gmail.com>
// Licensed under the FSL-1.1-NC.

use crate::protocol::Protocol;
use thiserror::Error;

pub type Result<T> = std::result::Result<T, Error>;

#[derive(Error, Debug)]
pub enum Error {
    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("missing required field: {0}")]
    MissingField(String),

    #[error("invalid inbound configuration: {0}")]
    InvalidConfiguration(String),

    #[error("client index {index} out of range ({count} clients)")]
    ClientIndexOutOfRange { index: usize, count: usize },

    #[error("access links are not available for {0} inbounds")]
    UnsupportedLink(Protocol),

    #[error("authentication failed - check username and password")]
    AuthenticationFailed,

    #[error("not logged in")]
    NotLoggedIn,

    #[error("logout failed")]
    LogoutFailed,

    #[error("panel error: {0}")]
    Panel(String),

    #[error("{endpoint} is not supported by {flavor} panels")]
    Unsupported {
        endpoint: &'static str,
        flavor: String,
    },

    #[error("unexpected HTTP status: {0}")]
    UnexpectedStatus(u16),

    #[error("request timeout")]
    RequestTimeout,

    #[error("invalid panel url: {0}")]
    InvalidUrl(String),

    #[error("connection error: {0}")]
    Connection(String),

    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
}

impl Error {
    /// True when the panel rejected the session and a fresh login is needed.
    pub fn is_session_error(&self) -> bool {
        matches!(self, Error::NotLoggedIn | Error::AuthenticationFailed)
    }
}
