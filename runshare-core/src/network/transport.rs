//! Transport Trait
//!
//! Platform-agnostic abstraction for the relay connection. A [`Connector`]
//! opens a [`RelayLink`]: a pair of channels carrying text frames out and
//! [`LinkEvent`]s in. Dropping the outbound sender closes the link normally.

use std::future::Future;
use std::time::Duration;

use serde::{Deserialize, Serialize};
use tokio::sync::mpsc;

use super::error::NetworkError;

/// Result type for transport operations.
pub type TransportResult<T> = Result<T, NetworkError>;

/// Connection state.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ConnectionState {
    /// Not connected to any relay.
    #[default]
    Disconnected,
    /// Connection in progress.
    Connecting,
    /// Connected and authenticated.
    Connected,
}

/// Transport configuration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TransportConfig {
    /// Connection timeout.
    pub connect_timeout: Duration,
}

impl Default for TransportConfig {
    fn default() -> Self {
        TransportConfig {
            connect_timeout: Duration::from_secs(10),
        }
    }
}

/// How a link ended.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CloseKind {
    /// The relay closed with a normal close code.
    Normal,
    /// Failure, abnormal close code, or the stream simply ended.
    Abnormal(String),
}

/// Events delivered from an open link.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LinkEvent {
    /// One inbound text frame.
    Frame(String),
    /// The link closed; no further events follow.
    Closed(CloseKind),
}

/// An open relay connection.
///
/// If the inbound channel ends without a [`LinkEvent::Closed`] the link is
/// treated as abnormally closed.
#[derive(Debug)]
pub struct RelayLink {
    /// Outbound text frames. Unbounded: publishes never wait, and a slow
    /// relay lets the queue grow without limit.
    pub outbound: mpsc::UnboundedSender<String>,
    /// Inbound events.
    pub inbound: mpsc::UnboundedReceiver<LinkEvent>,
}

/// Opens relay links.
pub trait Connector: Send + Sync + 'static {
    /// Opens a link to `url`.
    fn connect(
        &self,
        url: &str,
        config: &TransportConfig,
    ) -> impl Future<Output = TransportResult<RelayLink>> + Send;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_transport_config_default() {
        assert_eq!(
            TransportConfig::default().connect_timeout,
            Duration::from_secs(10)
        );
    }

    #[test]
    fn test_connection_state_default_is_disconnected() {
        assert_eq!(ConnectionState::default(), ConnectionState::Disconnected);
    }
}
