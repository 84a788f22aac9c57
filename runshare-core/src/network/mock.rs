//! Mock Transport
//!
//! In-memory [`Connector`] for tests. Every successful connect hands a
//! [`MockLinkHandle`] to the test, which plays the relay's side of the link.

use std::sync::Arc;
use std::time::Duration;

use parking_lot::Mutex;
use tokio::sync::mpsc;

use super::error::NetworkError;
use super::message::RelayMessage;
use super::protocol::{decode_message, encode_message};
use super::transport::{
    CloseKind, Connector, LinkEvent, RelayLink, TransportConfig, TransportResult,
};

#[derive(Default)]
struct MockState {
    urls: Vec<String>,
    failures_remaining: usize,
}

/// Mock connector for testing.
#[derive(Clone)]
pub struct MockConnector {
    state: Arc<Mutex<MockState>>,
    links_tx: mpsc::UnboundedSender<MockLinkHandle>,
    links_rx: Arc<tokio::sync::Mutex<mpsc::UnboundedReceiver<MockLinkHandle>>>,
}

impl MockConnector {
    pub fn new() -> Self {
        let (links_tx, links_rx) = mpsc::unbounded_channel();
        MockConnector {
            state: Arc::new(Mutex::new(MockState::default())),
            links_tx,
            links_rx: Arc::new(tokio::sync::Mutex::new(links_rx)),
        }
    }

    /// Makes the next `count` connection attempts fail.
    pub fn fail_next(&self, count: usize) {
        self.state.lock().failures_remaining = count;
    }

    /// Number of connection attempts so far, failed ones included.
    pub fn attempts(&self) -> usize {
        self.state.lock().urls.len()
    }

    /// URLs of all connection attempts, oldest first.
    pub fn urls(&self) -> Vec<String> {
        self.state.lock().urls.clone()
    }

    /// Waits for the next successfully opened link.
    pub async fn next_link(&self) -> Option<MockLinkHandle> {
        self.links_rx.lock().await.recv().await
    }

    /// Returns an already opened link, if any.
    pub fn try_next_link(&self) -> Option<MockLinkHandle> {
        self.links_rx.try_lock().ok()?.try_recv().ok()
    }
}

impl Default for MockConnector {
    fn default() -> Self {
        Self::new()
    }
}

impl Connector for MockConnector {
    async fn connect(&self, url: &str, _config: &TransportConfig) -> TransportResult<RelayLink> {
        {
            let mut state = self.state.lock();
            state.urls.push(url.to_string());
            if state.failures_remaining > 0 {
                state.failures_remaining -= 1;
                return Err(NetworkError::ConnectionFailed(
                    "Mock connection failure".into(),
                ));
            }
        }

        let (outbound_tx, outbound_rx) = mpsc::unbounded_channel();
        let (inbound_tx, inbound_rx) = mpsc::unbounded_channel();
        let handle = MockLinkHandle {
            sent: outbound_rx,
            events: Some(inbound_tx),
        };
        self.links_tx
            .send(handle)
            .map_err(|_| NetworkError::ConnectionFailed("mock connector dropped".into()))?;

        Ok(RelayLink {
            outbound: outbound_tx,
            inbound: inbound_rx,
        })
    }
}

/// The relay's side of a mock link.
pub struct MockLinkHandle {
    sent: mpsc::UnboundedReceiver<String>,
    events: Option<mpsc::UnboundedSender<LinkEvent>>,
}

impl MockLinkHandle {
    /// Delivers a raw text frame to the client.
    pub fn push_frame(&self, frame: impl Into<String>) {
        if let Some(events) = &self.events {
            let _ = events.send(LinkEvent::Frame(frame.into()));
        }
    }

    /// Delivers an encoded message to the client.
    pub fn push_message(&self, message: &RelayMessage) {
        if let Ok(frame) = encode_message(message) {
            self.push_frame(frame);
        }
    }

    /// Closes the link from the relay side.
    pub fn close(&mut self, kind: CloseKind) {
        if let Some(events) = self.events.take() {
            let _ = events.send(LinkEvent::Closed(kind));
        }
    }

    /// Drops the link without a close event.
    pub fn sever(&mut self) {
        self.events = None;
    }

    /// Drains every frame the client has sent so far.
    pub fn sent_frames(&mut self) -> Vec<String> {
        let mut frames = Vec::new();
        while let Ok(frame) = self.sent.try_recv() {
            frames.push(frame);
        }
        frames
    }

    /// Drains and decodes every frame the client has sent so far.
    pub fn sent_messages(&mut self) -> Vec<RelayMessage> {
        self.sent_frames()
            .iter()
            .filter_map(|frame| decode_message(frame).ok())
            .collect()
    }

    /// Waits up to `timeout` for the client's next message.
    pub async fn next_sent(&mut self, timeout: Duration) -> Option<RelayMessage> {
        let frame = tokio::time::timeout(timeout, self.sent.recv())
            .await
            .ok()??;
        decode_message(&frame).ok()
    }

    /// True once the client has released its end of the link.
    pub fn is_closed_by_client(&self) -> bool {
        self.sent.is_closed()
    }
}
