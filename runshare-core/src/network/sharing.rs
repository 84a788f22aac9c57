// SPDX-FileCopyrightText: 2026 Mattia Egloff <mattia.egloff@pm.me>
//
// SPDX-License-Identifier: GPL-3.0-or-later

//! Sharing Client
//!
//! Relays the local session to a location relay and merges peer updates.
//!
//! The client keeps two independent flags: the connection state and the
//! intent to share. While sharing is enabled a driver task owns the link:
//! it connects, authenticates, re-asserts every subscription, processes
//! inbound frames and, after a failure or abnormal close, waits a fixed
//! delay before one new attempt. The driver is scoped to a cancellation
//! token that `stop_sharing` and `Drop` cancel, so no reconnect can fire
//! after either.
//!
//! Outbound frames go through an unbounded channel with no send-queue bound.
//! A slow relay therefore grows memory rather than slowing the caller.

use std::collections::BTreeSet;
use std::sync::Arc;
use std::time::Duration;

use parking_lot::Mutex;
use tokio::runtime::Handle;
use tokio::sync::{mpsc, watch};
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use super::error::NetworkError;
use super::link::{relay_url, share_link};
use super::message::{PeerSnapshot, RelayMessage};
use super::peers::PeerTable;
use super::protocol::{decode_message, encode_message};
use super::transport::{
    CloseKind, ConnectionState, Connector, LinkEvent, RelayLink, TransportConfig,
};
use crate::storage::{CachedLocation, OfflineCache};
use crate::tracking::now_millis;

/// Sharing client configuration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SharingConfig {
    /// Transport settings for each connection attempt.
    pub transport: TransportConfig,
    /// Wait between a lost connection and the next attempt.
    pub reconnect_delay: Duration,
}

impl Default for SharingConfig {
    fn default() -> Self {
        SharingConfig {
            transport: TransportConfig::default(),
            reconnect_delay: Duration::from_secs(5),
        }
    }
}

/// Where a published snapshot went.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PublishOutcome {
    /// Queued on the live relay link.
    Sent,
    /// Written to the offline cache.
    CachedOffline,
    /// Sharing is disabled; nothing was done.
    NotSharing,
}

/// Changes reported to [`SharingClient::subscribe_events`] receivers.
#[derive(Debug, Clone, PartialEq)]
pub enum SharingEvent {
    ConnectionChanged(ConnectionState),
    PeerUpdated(String),
    PeerRemoved(String),
    PublishedOffline,
}

#[derive(Default)]
struct ClientState {
    endpoint: Option<String>,
    local_id: String,
    display_name: String,
    sharing_enabled: bool,
    subscriptions: BTreeSet<String>,
    link: Option<mpsc::UnboundedSender<String>>,
    session: Option<CancellationToken>,
    driver: Option<JoinHandle<()>>,
}

struct Shared<C> {
    connector: C,
    config: SharingConfig,
    cache: Arc<dyn OfflineCache>,
    state: Mutex<ClientState>,
    connection: watch::Sender<ConnectionState>,
    peers: watch::Sender<PeerTable>,
    listeners: Mutex<Vec<mpsc::UnboundedSender<SharingEvent>>>,
}

/// Live location sharing client.
///
/// Must be created inside a tokio runtime; the driver task is spawned on it.
pub struct SharingClient<C: Connector> {
    shared: Arc<Shared<C>>,
    runtime: Handle,
}

impl<C: Connector> SharingClient<C> {
    /// Creates a client. Fails outside a tokio runtime.
    pub fn new(
        connector: C,
        config: SharingConfig,
        cache: Arc<dyn OfflineCache>,
    ) -> Result<Self, NetworkError> {
        let runtime = Handle::try_current().map_err(|_| NetworkError::NoRuntime)?;
        let (connection, _) = watch::channel(ConnectionState::Disconnected);
        let (peers, _) = watch::channel(PeerTable::new());

        Ok(SharingClient {
            shared: Arc::new(Shared {
                connector,
                config,
                cache,
                state: Mutex::new(ClientState::default()),
                connection,
                peers,
                listeners: Mutex::new(Vec::new()),
            }),
            runtime,
        })
    }

    /// Sets relay endpoint and identity. Takes effect on the next connect.
    ///
    /// An empty endpoint means offline mode.
    pub fn configure(
        &self,
        endpoint: impl Into<String>,
        local_id: impl Into<String>,
        display_name: impl Into<String>,
    ) {
        let endpoint = endpoint.into();
        let mut state = self.shared.state.lock();
        state.endpoint = Some(endpoint.trim().to_string()).filter(|e| !e.is_empty());
        state.local_id = local_id.into();
        state.display_name = display_name.into();
    }

    /// Enables sharing and, when an endpoint is configured, starts connecting.
    ///
    /// No-op if already sharing. Fails without enabling sharing when the
    /// endpoint cannot be turned into a relay URL.
    pub fn start_sharing(&self) -> Result<(), NetworkError> {
        let mut state = self.shared.state.lock();
        if state.sharing_enabled {
            return Ok(());
        }

        let url = state.endpoint.as_deref().map(relay_url).transpose()?;
        state.sharing_enabled = true;

        let Some(url) = url else {
            info!("sharing enabled without relay endpoint, staying offline");
            return Ok(());
        };

        info!(%url, "sharing enabled");
        let token = CancellationToken::new();
        let driver = self
            .runtime
            .spawn(drive(Arc::clone(&self.shared), token.clone()));
        state.session = Some(token);
        state.driver = Some(driver);
        Ok(())
    }

    /// Disables sharing, closes the link and cancels any pending reconnect.
    pub fn stop_sharing(&self) {
        let mut state = self.shared.state.lock();
        if !state.sharing_enabled {
            return;
        }
        state.sharing_enabled = false;
        self.shared.teardown(&mut state);
        info!("sharing disabled");
    }

    /// Disables sharing and waits up to `grace` for queued frames to reach
    /// the relay.
    ///
    /// Unlike [`stop_sharing`](Self::stop_sharing) the driver is not aborted:
    /// dropping the outbound side lets the transport flush and send its close
    /// frame, and the driver returns once the relay acknowledges the close.
    pub async fn shutdown(&self, grace: Duration) {
        let driver = {
            let mut state = self.shared.state.lock();
            if !state.sharing_enabled {
                return;
            }
            state.sharing_enabled = false;
            if let Some(token) = state.session.take() {
                token.cancel();
            }
            state.link = None;
            state.driver.take()
        };

        if let Some(mut driver) = driver {
            if tokio::time::timeout(grace, &mut driver).await.is_err() {
                warn!(?grace, "relay link did not close in time");
                driver.abort();
            }
        }

        let _state = self.shared.state.lock();
        self.shared.set_connection(ConnectionState::Disconnected);
        info!("sharing disabled");
    }

    /// Publishes the local snapshot, or caches it when not connected.
    pub fn publish(&self, snapshot: &PeerSnapshot) -> PublishOutcome {
        {
            let state = self.shared.state.lock();
            if !state.sharing_enabled {
                return PublishOutcome::NotSharing;
            }
            if let Some(link) = &state.link {
                match encode_message(&RelayMessage::Location {
                    data: snapshot.clone(),
                }) {
                    Ok(frame) => {
                        if link.send(frame).is_ok() {
                            return PublishOutcome::Sent;
                        }
                    }
                    Err(e) => warn!(error = %e, "failed to encode location"),
                }
            }
        }

        if let Err(e) = self.shared.cache.store_last_location(snapshot, now_millis()) {
            warn!(error = %e, "failed to write offline location cache");
        }
        self.shared.emit(SharingEvent::PublishedOffline);
        PublishOutcome::CachedOffline
    }

    /// Adds a peer to the subscription set.
    pub fn subscribe(&self, peer_id: impl Into<String>) {
        let peer_id = peer_id.into();
        let mut state = self.shared.state.lock();
        if !state.subscriptions.insert(peer_id.clone()) {
            return;
        }
        if let Some(link) = &state.link {
            send_on(link, &RelayMessage::Subscribe { friend_id: peer_id });
        }
    }

    /// Removes a peer from the subscription set and drops its snapshot.
    pub fn unsubscribe(&self, peer_id: &str) {
        let mut state = self.shared.state.lock();
        if !state.subscriptions.remove(peer_id) {
            return;
        }
        if let Some(link) = &state.link {
            send_on(
                link,
                &RelayMessage::Unsubscribe {
                    friend_id: peer_id.to_string(),
                },
            );
        }
        let mut removed = false;
        self.shared.peers.send_if_modified(|peers| {
            removed = peers.remove(peer_id).is_some();
            removed
        });
        drop(state);
        if removed {
            self.shared.emit(SharingEvent::PeerRemoved(peer_id.to_string()));
        }
    }

    /// Identifier announced to the relay.
    pub fn local_id(&self) -> String {
        self.shared.state.lock().local_id.clone()
    }

    /// Name announced to the relay.
    pub fn display_name(&self) -> String {
        self.shared.state.lock().display_name.clone()
    }

    /// Link others can use to follow this participant.
    pub fn generate_share_link(&self) -> String {
        let state = self.shared.state.lock();
        share_link(state.endpoint.as_deref(), &state.local_id)
    }

    pub fn is_connected(&self) -> bool {
        self.connection_state() == ConnectionState::Connected
    }

    pub fn connection_state(&self) -> ConnectionState {
        *self.shared.connection.borrow()
    }

    /// Receiver notified on every connection state change.
    pub fn watch_connection(&self) -> watch::Receiver<ConnectionState> {
        self.shared.connection.subscribe()
    }

    pub fn is_sharing_enabled(&self) -> bool {
        self.shared.state.lock().sharing_enabled
    }

    /// Current subscriptions in id order.
    pub fn subscriptions(&self) -> Vec<String> {
        self.shared.state.lock().subscriptions.iter().cloned().collect()
    }

    /// Copy of the current peer table.
    pub fn peers(&self) -> PeerTable {
        self.shared.peers.borrow().clone()
    }

    pub fn peer(&self, peer_id: &str) -> Option<PeerSnapshot> {
        self.shared.peers.borrow().get(peer_id).cloned()
    }

    /// Receiver notified whenever the peer table changes.
    pub fn watch_peers(&self) -> watch::Receiver<PeerTable> {
        self.shared.peers.subscribe()
    }

    /// Every change from now on, in order, without coalescing.
    pub fn subscribe_events(&self) -> mpsc::UnboundedReceiver<SharingEvent> {
        let (tx, rx) = mpsc::unbounded_channel();
        self.shared.listeners.lock().push(tx);
        rx
    }

    /// Snapshot most recently written to the offline cache.
    pub fn last_offline_snapshot(&self) -> Option<CachedLocation> {
        match self.shared.cache.load_last_location() {
            Ok(cached) => cached,
            Err(e) => {
                warn!(error = %e, "failed to read offline location cache");
                None
            }
        }
    }
}

impl<C: Connector> Drop for SharingClient<C> {
    fn drop(&mut self) {
        let mut state = self.shared.state.lock();
        self.shared.teardown(&mut state);
    }
}

impl<C: Connector> Shared<C> {
    /// Cancels the driver and releases the link. Caller holds the state lock.
    fn teardown(&self, state: &mut ClientState) {
        if let Some(token) = state.session.take() {
            token.cancel();
        }
        if let Some(driver) = state.driver.take() {
            driver.abort();
        }
        state.link = None;
        self.set_connection(ConnectionState::Disconnected);
    }

    fn set_connection(&self, next: ConnectionState) {
        let changed = self.connection.send_if_modified(|current| {
            if *current == next {
                return false;
            }
            *current = next;
            true
        });
        if changed {
            self.emit(SharingEvent::ConnectionChanged(next));
        }
    }

    fn emit(&self, event: SharingEvent) {
        self.listeners
            .lock()
            .retain(|listener| listener.send(event.clone()).is_ok());
    }

    /// Updates connection state unless `token` has been cancelled.
    fn set_connection_for(&self, token: &CancellationToken, next: ConnectionState) -> bool {
        let _state = self.state.lock();
        if token.is_cancelled() {
            return false;
        }
        self.set_connection(next);
        true
    }

    /// Installs a fresh link: auth first, then every subscription.
    fn install_link(&self, token: &CancellationToken, outbound: mpsc::UnboundedSender<String>) -> bool {
        let mut state = self.state.lock();
        if token.is_cancelled() {
            return false;
        }

        send_on(
            &outbound,
            &RelayMessage::Auth {
                user_id: state.local_id.clone(),
                username: state.display_name.clone(),
            },
        );
        for friend_id in &state.subscriptions {
            send_on(
                &outbound,
                &RelayMessage::Subscribe {
                    friend_id: friend_id.clone(),
                },
            );
        }
        state.link = Some(outbound);
        self.set_connection(ConnectionState::Connected);
        true
    }

    fn release_link(&self, token: &CancellationToken) {
        let mut state = self.state.lock();
        if token.is_cancelled() {
            return;
        }
        state.link = None;
        self.set_connection(ConnectionState::Disconnected);
    }

    fn handle_frame(&self, frame: &str) {
        let message = match decode_message(frame) {
            Ok(message) => message,
            Err(e) => {
                warn!(error = %e, "dropping malformed relay frame");
                return;
            }
        };

        match message {
            RelayMessage::Location { data } => {
                let peer_id = data.peer_id.clone();
                {
                    let state = self.state.lock();
                    if !state.subscriptions.contains(&peer_id) {
                        debug!(%peer_id, "ignoring update for unsubscribed peer");
                        return;
                    }
                    self.peers.send_modify(|peers| peers.upsert(data));
                }
                self.emit(SharingEvent::PeerUpdated(peer_id));
            }
            RelayMessage::Offline { user_id } => {
                let removed = self
                    .peers
                    .send_if_modified(|peers| peers.remove(&user_id).is_some());
                if removed {
                    info!(peer_id = %user_id, "peer went offline");
                    self.emit(SharingEvent::PeerRemoved(user_id));
                }
            }
            other => debug!(kind = other.kind(), "ignoring relay message"),
        }
    }

    fn sharing_enabled(&self) -> bool {
        self.state.lock().sharing_enabled
    }

    /// Relay URL for the next attempt, from the current configuration.
    fn relay_target(&self) -> Option<String> {
        let state = self.state.lock();
        relay_url(state.endpoint.as_deref()?).ok()
    }
}

fn send_on(link: &mpsc::UnboundedSender<String>, message: &RelayMessage) {
    match encode_message(message) {
        Ok(frame) => {
            if link.send(frame).is_err() {
                debug!(kind = message.kind(), "relay link gone, message dropped");
            }
        }
        Err(e) => warn!(error = %e, kind = message.kind(), "failed to encode relay message"),
    }
}

/// Connection loop for one sharing activation.
async fn drive<C: Connector>(shared: Arc<Shared<C>>, token: CancellationToken) {
    loop {
        let Some(url) = shared.relay_target() else {
            info!("relay endpoint no longer usable, staying offline");
            shared.release_link(&token);
            return;
        };
        if !shared.set_connection_for(&token, ConnectionState::Connecting) {
            return;
        }

        let attempt = tokio::select! {
            _ = token.cancelled() => return,
            attempt = shared.connector.connect(&url, &shared.config.transport) => attempt,
        };

        let reconnect = match attempt {
            Ok(link) => run_link(&shared, link, &token).await,
            Err(e) => {
                warn!(error = %e, %url, "relay connection failed");
                true
            }
        };
        shared.release_link(&token);

        if !reconnect || token.is_cancelled() || !shared.sharing_enabled() {
            return;
        }

        info!(delay = ?shared.config.reconnect_delay, "scheduling relay reconnect");
        tokio::select! {
            _ = token.cancelled() => return,
            _ = tokio::time::sleep(shared.config.reconnect_delay) => {}
        }

        if !shared.sharing_enabled() {
            return;
        }
    }
}

/// Runs one open link. Returns whether the loss warrants a reconnect.
async fn run_link<C: Connector>(
    shared: &Shared<C>,
    link: RelayLink,
    token: &CancellationToken,
) -> bool {
    let RelayLink {
        outbound,
        mut inbound,
    } = link;

    if !shared.install_link(token, outbound) {
        return false;
    }
    info!("connected to relay");

    loop {
        let event = tokio::select! {
            _ = token.cancelled() => {
                await_close(&mut inbound).await;
                return false;
            }
            event = inbound.recv() => event,
        };

        match event {
            Some(LinkEvent::Frame(frame)) => shared.handle_frame(&frame),
            Some(LinkEvent::Closed(CloseKind::Normal)) => {
                info!("relay closed the connection");
                return false;
            }
            Some(LinkEvent::Closed(CloseKind::Abnormal(reason))) => {
                warn!(%reason, "relay connection lost");
                return true;
            }
            None => {
                warn!("relay link ended without close");
                return true;
            }
        }
    }
}

/// Waits for the transport to report the link closed, ignoring late frames.
async fn await_close(inbound: &mut mpsc::UnboundedReceiver<LinkEvent>) {
    while let Some(event) = inbound.recv().await {
        if let LinkEvent::Closed(kind) = event {
            debug!(?kind, "relay link closed after stop");
            return;
        }
    }
}
