// SPDX-FileCopyrightText: 2026 Mattia Egloff <mattia.egloff@pm.me>
//
// SPDX-License-Identifier: GPL-3.0-or-later

//! Session Tracking
//!
//! Turns a stream of noisy positional fixes into distance, duration and pace.
//!
//! # Architecture
//!
//! - **Fix**: one positional reading from the device
//! - **FixFilter**: stateless accuracy/range check; failures are dropped
//! - **DistanceEngine**: haversine accumulation with speed-outlier rejection
//! - **TrackingSession**: IDLE/RUNNING/PAUSED/STOPPED state machine
//! - **SessionTracker**: serialized writer publishing versioned snapshots
//!
//! # Example
//!
//! ```ignore
//! use runshare_core::tracking::{Fix, SessionTracker};
//!
//! let tracker = SessionTracker::default();
//! tracker.start();
//! tracker.ingest(Fix::new(40.0, -75.0, now).with_accuracy(5.0));
//! println!("{} m", tracker.snapshot().distance_meters);
//! ```

mod distance;
mod filter;
mod fix;
pub mod format;
mod run;
mod session;
mod tracker;

pub use distance::{
    haversine_meters, total_distance, DistanceEngine, Segment, DEFAULT_MAX_SPEED_MPS,
    EARTH_RADIUS_M,
};
pub use filter::{FixFilter, FixRejection, DEFAULT_MAX_ACCURACY_METERS};
pub use fix::Fix;
pub use format::{format_distance, format_duration, format_pace, notification_text};
pub use run::FinishedRun;
pub use session::{
    pace_min_per_km, FixOutcome, SessionSnapshot, SessionState, TrackingConfig, TrackingSession,
};
pub use tracker::{SessionCommand, SessionTracker, StateChange};

/// Current Unix time in milliseconds.
pub fn now_millis() -> u64 {
    std::time::SystemTime::now()
        .duration_since(std::time::UNIX_EPOCH)
        .map(|d| d.as_millis() as u64)
        .unwrap_or_default()
}
