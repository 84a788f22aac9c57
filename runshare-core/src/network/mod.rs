// SPDX-FileCopyrightText: 2026 Mattia Egloff <mattia.egloff@pm.me>
//
// SPDX-License-Identifier: GPL-3.0-or-later

//! Network Module
//!
//! Live location sharing over a relay.
//!
//! # Architecture
//!
//! - **RelayMessage**: JSON wire messages (`auth`, `subscribe`, `location`, `offline`)
//! - **Connector**: transport seam; WebSocket in production, mock in tests
//! - **SharingClient**: connection lifecycle, reconnect policy, peer table
//! - **link**: relay URL derivation, share links, data links
//!
//! # Example
//!
//! ```ignore
//! use runshare_core::network::{SharingClient, SharingConfig, WebSocketConnector};
//!
//! let client = SharingClient::new(WebSocketConnector::new(), SharingConfig::default(), cache)?;
//! client.configure("https://relay.example", "my-id", "Ana");
//! client.subscribe("friend-id");
//! client.start_sharing()?;
//! ```

mod error;
pub mod link;
mod message;
pub mod mock;
mod peers;
pub mod protocol;
mod sharing;
mod transport;
mod websocket;

pub use error::NetworkError;
pub use link::{new_session_id, relay_url, share_link, ShareData, ShareKind, ShareLinkError};
pub use message::{PeerSnapshot, RelayMessage};
pub use mock::{MockConnector, MockLinkHandle};
pub use peers::PeerTable;
pub use protocol::{decode_message, encode_message, MAX_FRAME_SIZE};
pub use sharing::{PublishOutcome, SharingClient, SharingConfig, SharingEvent};
pub use transport::{
    CloseKind, ConnectionState, Connector, LinkEvent, RelayLink, TransportConfig,
    TransportResult,
};
pub use websocket::WebSocketConnector;
