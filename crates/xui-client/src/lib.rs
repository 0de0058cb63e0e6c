// Copyright (c) 2026 Roman Barinov <rbarinov@gmail.com>
// Licensed under the FSL-1.1-NC.

pub mod client;
pub mod config;
pub mod connection;
pub mod cookies;
pub mod routes;

pub use client::PanelClient;
pub use config::{ClientConfig, Config};
pub use routes::{Endpoint, PanelFlavor, Route};
