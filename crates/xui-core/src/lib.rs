// Copyright (c) 2026 Roman Barinov <rbarinov@gmail.com>
// Licensed under the FSL-1.1-NC.

pub mod codec;
pub mod error;
pub mod inbound;
pub mod link;
pub mod protocol;
pub mod status;
pub mod stream;

pub use error::{Error, Result};
pub use inbound::{ClientStat, Inbound, InboundPayload, SniffingSettings};
pub use protocol::*;
pub use status::{ApiResponse, PanelSettings, ServerStatus};
pub use stream::*;
