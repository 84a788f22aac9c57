// SPDX-FileCopyrightText: 2026 Mattia Egloff <mattia.egloff@pm.me>
//
// SPDX-License-Identifier: GPL-3.0-or-later

//! Proptest Strategies
//!
//! Reusable proptest strategies for property-based testing.

use proptest::prelude::*;
use runshare_core::network::PeerSnapshot;
use runshare_core::tracking::Fix;

/// Latitude inside the valid range.
pub fn latitude_strategy() -> impl Strategy<Value = f64> {
    -89.0..89.0f64
}

/// Longitude inside the valid range.
pub fn longitude_strategy() -> impl Strategy<Value = f64> {
    -179.0..179.0f64
}

/// A well-formed fix at `timestamp`.
pub fn fix_strategy(timestamp: u64) -> impl Strategy<Value = Fix> {
    (
        latitude_strategy(),
        longitude_strategy(),
        0.0..49.0f64,
        -100.0..4_000.0f64,
        0.0..15.0f64,
    )
        .prop_map(move |(lat, lon, accuracy, altitude, speed)| {
            Fix::new(lat, lon, timestamp)
                .with_accuracy(accuracy)
                .with_altitude(altitude)
                .with_speed(speed)
        })
}

/// A route of small steps with increasing timestamps.
///
/// Steps are up to roughly 30 m latitude and 1-20 s apart, with an
/// occasional large jump mixed in.
pub fn route_strategy(max_len: usize) -> impl Strategy<Value = Vec<Fix>> {
    (
        latitude_strategy(),
        longitude_strategy(),
        prop::collection::vec(
            (
                -0.0003..0.0003f64,
                -0.0003..0.0003f64,
                1_000u64..20_000,
                prop::bool::weighted(0.1),
            ),
            1..max_len,
        ),
    )
        .prop_map(|(lat0, lon0, steps)| {
            let mut route = vec![Fix::new(lat0, lon0, 0).with_accuracy(5.0)];
            let (mut lat, mut lon, mut ts) = (lat0, lon0, 0u64);
            for (dlat, dlon, dt, jump) in steps {
                let scale = if jump { 300.0 } else { 1.0 };
                lat = (lat + dlat * scale).clamp(-89.9, 89.9);
                lon = (lon + dlon * scale).clamp(-179.9, 179.9);
                ts += dt;
                route.push(Fix::new(lat, lon, ts).with_accuracy(5.0));
            }
            route
        })
}

/// Arbitrary peer identifiers.
pub fn peer_id_strategy() -> impl Strategy<Value = String> {
    "[a-zA-Z0-9_-]{1,36}"
}

/// Arbitrary peer snapshots.
pub fn peer_snapshot_strategy() -> impl Strategy<Value = PeerSnapshot> {
    (
        peer_id_strategy(),
        ".{0,40}",
        fix_strategy(1_700_000_000_000),
        any::<bool>(),
        0.0..100_000.0f64,
        0u64..86_400_000,
    )
        .prop_map(
            |(peer_id, display_name, last_fix, is_active, distance_meters, duration_ms)| {
                PeerSnapshot {
                    peer_id,
                    display_name,
                    last_fix,
                    is_active,
                    distance_meters,
                    duration_ms,
                }
            },
        )
}
