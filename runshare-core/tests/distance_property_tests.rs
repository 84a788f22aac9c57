// SPDX-FileCopyrightText: 2026 Mattia Egloff <mattia.egloff@pm.me>
//
// SPDX-License-Identifier: GPL-3.0-or-later

//! Distance Property Tests
//!
//! The running total equals the sum of haversine deltas over the segments
//! whose implied speed stays under the ceiling. Every fix stays in the route.

mod common;

use common::strategies::{fix_strategy, route_strategy};
use proptest::prelude::*;
use runshare_core::tracking::{
    haversine_meters, total_distance, DistanceEngine, FixFilter, TrackingConfig, TrackingSession,
    DEFAULT_MAX_SPEED_MPS,
};

proptest! {
    #![proptest_config(ProptestConfig::with_cases(200))]

    #[test]
    fn prop_session_distance_sums_plausible_segments(route in route_strategy(40)) {
        let mut session = TrackingSession::new(TrackingConfig::default());
        session.start(0);
        for fix in &route {
            session.ingest(*fix, fix.timestamp);
        }

        let expected: f64 = route
            .windows(2)
            .map(|pair| {
                let meters = haversine_meters(&pair[0], &pair[1]);
                let dt = (pair[1].timestamp - pair[0].timestamp) as f64 / 1000.0;
                if dt > 0.0 && meters / dt < DEFAULT_MAX_SPEED_MPS { meters } else { 0.0 }
            })
            .sum();

        prop_assert_eq!(session.route().len(), route.len());
        prop_assert!((session.distance_meters() - expected).abs() < 1e-6);
    }

    #[test]
    fn prop_engine_total_bounded_by_raw_total(route in route_strategy(40)) {
        let mut engine = DistanceEngine::default();
        for fix in &route {
            engine.accumulate(fix);
        }

        prop_assert!(engine.total_meters() >= 0.0);
        prop_assert!(engine.total_meters() <= total_distance(&route) + 1e-6);
        prop_assert_eq!(engine.reference(), route.last());
    }

    #[test]
    fn prop_haversine_symmetric_and_non_negative(
        a in fix_strategy(0),
        b in fix_strategy(0),
    ) {
        let ab = haversine_meters(&a, &b);
        let ba = haversine_meters(&b, &a);
        prop_assert!(ab >= 0.0);
        prop_assert!((ab - ba).abs() < 1e-6);
        prop_assert!(haversine_meters(&a, &a).abs() < 1e-9);
    }

    #[test]
    fn prop_filter_accepts_exactly_in_range_accurate_fixes(
        latitude in -120.0..120.0f64,
        longitude in -200.0..200.0f64,
        accuracy in 0.0..100.0f64,
    ) {
        let fix = runshare_core::tracking::Fix::new(latitude, longitude, 0).with_accuracy(accuracy);
        let expected = accuracy < 50.0
            && (-90.0..=90.0).contains(&latitude)
            && (-180.0..=180.0).contains(&longitude);
        prop_assert_eq!(FixFilter::default().accepts(&fix), expected);
    }
}
