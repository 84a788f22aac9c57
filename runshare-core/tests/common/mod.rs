// SPDX-FileCopyrightText: 2026 Mattia Egloff <mattia.egloff@pm.me>
//
// SPDX-License-Identifier: GPL-3.0-or-later

//! Common Test Utilities
//!
//! Shared fixtures and helpers used across test modules.

#![allow(dead_code)]

pub mod strategies;

use std::sync::Arc;
use std::time::Duration;

use runshare_core::network::{
    MockConnector, PeerSnapshot, SharingClient, SharingConfig, TransportConfig,
};
use runshare_core::storage::MemoryOfflineCache;
use runshare_core::tracking::{Fix, SessionState, TrackingConfig, TrackingSession};

/// A fix with good accuracy.
pub fn fix(latitude: f64, longitude: f64, timestamp: u64) -> Fix {
    Fix::new(latitude, longitude, timestamp).with_accuracy(5.0)
}

/// Running session started at `start`.
pub fn running_session(start: u64) -> TrackingSession {
    let mut session = TrackingSession::new(TrackingConfig::default());
    assert!(session.start(start));
    assert_eq!(session.state(), SessionState::Running);
    session
}

/// Peer snapshot with a single fix.
pub fn peer(peer_id: &str, timestamp: u64) -> PeerSnapshot {
    PeerSnapshot {
        peer_id: peer_id.to_string(),
        display_name: format!("Runner {peer_id}"),
        last_fix: fix(46.52, 6.63, timestamp),
        is_active: true,
        distance_meters: 1_250.0,
        duration_ms: 420_000,
    }
}

/// Sharing config with the default 5 s reconnect delay and a short timeout.
pub fn sharing_config() -> SharingConfig {
    SharingConfig {
        transport: TransportConfig {
            connect_timeout: Duration::from_secs(1),
        },
        reconnect_delay: Duration::from_secs(5),
    }
}

/// Client over a mock connector with an in-memory offline cache.
pub fn mock_client() -> (SharingClient<MockConnector>, MockConnector) {
    let connector = MockConnector::new();
    let client = SharingClient::new(
        connector.clone(),
        sharing_config(),
        Arc::new(MemoryOfflineCache::new()),
    )
    .expect("inside runtime");
    (client, connector)
}

/// Lets spawned tasks run until they block.
pub async fn settle() {
    for _ in 0..16 {
        tokio::task::yield_now().await;
    }
}

/// Waits until the client reports `state`.
pub async fn wait_for_connection(
    client: &SharingClient<MockConnector>,
    state: runshare_core::network::ConnectionState,
) {
    let mut rx = client.watch_connection();
    tokio::time::timeout(Duration::from_secs(60), rx.wait_for(|s| *s == state))
        .await
        .expect("timed out waiting for connection state")
        .expect("connection channel closed");
}

/// Waits until the peer table satisfies `predicate`.
pub async fn wait_for_peers(
    client: &SharingClient<MockConnector>,
    predicate: impl FnMut(&runshare_core::network::PeerTable) -> bool,
) {
    let mut rx = client.watch_peers();
    tokio::time::timeout(Duration::from_secs(60), rx.wait_for(predicate))
        .await
        .expect("timed out waiting for peers")
        .expect("peer channel closed");
}
