// SPDX-FileCopyrightText: 2026 Mattia Egloff <mattia.egloff@pm.me>
//
// SPDX-License-Identifier: GPL-3.0-or-later

//! WebSocket Transport
//!
//! [`Connector`] backed by tokio-tungstenite. Each link runs a writer task
//! and a reader task bridged to the link's channels.

use futures_util::{SinkExt, StreamExt};
use tokio::sync::mpsc;
use tokio_tungstenite::tungstenite::protocol::frame::coding::CloseCode;
use tokio_tungstenite::tungstenite::protocol::CloseFrame;
use tokio_tungstenite::tungstenite::Message;
use tracing::{debug, warn};

use super::error::NetworkError;
use super::transport::{
    CloseKind, Connector, LinkEvent, RelayLink, TransportConfig, TransportResult,
};

/// Reason sent in the close frame when the client ends a link.
const CLIENT_CLOSE_REASON: &str = "User stopped sharing";

/// WebSocket-based relay connector.
#[derive(Debug, Clone, Copy, Default)]
pub struct WebSocketConnector;

impl WebSocketConnector {
    pub fn new() -> Self {
        WebSocketConnector
    }
}

impl Connector for WebSocketConnector {
    async fn connect(&self, url: &str, config: &TransportConfig) -> TransportResult<RelayLink> {
        let (stream, _response) =
            tokio::time::timeout(config.connect_timeout, tokio_tungstenite::connect_async(url))
                .await
                .map_err(|_| NetworkError::Timeout)?
                .map_err(|e| NetworkError::ConnectionFailed(e.to_string()))?;

        let (mut sink, mut source) = stream.split();
        let (outbound_tx, mut outbound_rx) = mpsc::unbounded_channel::<String>();
        let (inbound_tx, inbound_rx) = mpsc::unbounded_channel();

        tokio::spawn(async move {
            while let Some(text) = outbound_rx.recv().await {
                if let Err(e) = sink.send(Message::Text(text)).await {
                    warn!(error = %e, "websocket send failed");
                    return;
                }
            }
            let close = Message::Close(Some(CloseFrame {
                code: CloseCode::Normal,
                reason: CLIENT_CLOSE_REASON.into(),
            }));
            if let Err(e) = sink.send(close).await {
                debug!(error = %e, "websocket close frame not sent");
            }
        });

        tokio::spawn(async move {
            while let Some(message) = source.next().await {
                let event = match message {
                    Ok(Message::Text(text)) => LinkEvent::Frame(text),
                    Ok(Message::Close(frame)) => {
                        let _ = inbound_tx.send(LinkEvent::Closed(close_kind(frame.as_ref())));
                        return;
                    }
                    Ok(_) => continue,
                    Err(e) => {
                        let _ = inbound_tx.send(LinkEvent::Closed(CloseKind::Abnormal(e.to_string())));
                        return;
                    }
                };
                if inbound_tx.send(event).is_err() {
                    return;
                }
            }
            let _ = inbound_tx.send(LinkEvent::Closed(CloseKind::Abnormal(
                "stream ended".to_string(),
            )));
        });

        Ok(RelayLink {
            outbound: outbound_tx,
            inbound: inbound_rx,
        })
    }
}

/// Classifies a received close frame.
fn close_kind(frame: Option<&CloseFrame<'_>>) -> CloseKind {
    match frame {
        None => CloseKind::Normal,
        Some(frame) if frame.code == CloseCode::Normal => CloseKind::Normal,
        Some(frame) => CloseKind::Abnormal(format!(
            "close code {}: {}",
            u16::from(frame.code),
            frame.reason
        )),
    }
}
