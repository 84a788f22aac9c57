// SPDX-FileCopyrightText: 2026 Mattia Egloff <mattia.egloff@pm.me>
//
// SPDX-License-Identifier: GPL-3.0-or-later

//! Tracking Session
//!
//! State machine owning timing, accumulated distance and the route of one
//! outdoor session.
//!
//! ```text
//!          start          pause
//!   IDLE ─────────▶ RUNNING ─────────▶ PAUSED
//!    ▲                 │  ◀─────────      │
//!    │ reset           │     resume       │
//!    │                 ▼ stop             │ stop
//!   STOPPED ◀──────────┴──────────────────┘
//! ```
//!
//! Every other command is a no-op. All timestamps are Unix milliseconds and
//! are passed in by the caller, so the machine itself never reads a clock.

use std::sync::Arc;

use serde::{Deserialize, Serialize};
use tracing::debug;

use super::distance::{DistanceEngine, Segment, DEFAULT_MAX_SPEED_MPS};
use super::filter::{FixFilter, FixRejection, DEFAULT_MAX_ACCURACY_METERS};
use super::fix::Fix;

/// Tuning knobs for fix acceptance.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TrackingConfig {
    /// Fixes with an accuracy radius at or above this are dropped.
    pub max_accuracy_meters: f64,
    /// Segments implying this speed or more are excluded from distance.
    pub max_speed_mps: f64,
}

impl Default for TrackingConfig {
    fn default() -> Self {
        TrackingConfig {
            max_accuracy_meters: DEFAULT_MAX_ACCURACY_METERS,
            max_speed_mps: DEFAULT_MAX_SPEED_MPS,
        }
    }
}

/// Lifecycle state of a session.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum SessionState {
    Idle,
    Running,
    Paused,
    Stopped,
}

impl SessionState {
    /// Returns true while fixes are being accumulated.
    pub fn is_active(&self) -> bool {
        matches!(self, SessionState::Running)
    }
}

/// What happened to an ingested fix.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum FixOutcome {
    /// Failed the filter; dropped entirely.
    Rejected(FixRejection),
    /// Session is stopped; the fix was ignored.
    Ignored,
    /// Session is not running; the fix only updated the current position.
    PositionOnly,
    /// Fix was appended to the route.
    Appended(Segment),
}

impl FixOutcome {
    /// Returns true if the fix changed any observable session field.
    pub fn changed_session(&self) -> bool {
        matches!(self, FixOutcome::PositionOnly | FixOutcome::Appended(_))
    }
}

/// Pace in minutes per kilometer, or `None` when unavailable.
pub fn pace_min_per_km(distance_meters: f64, duration_ms: u64) -> Option<f64> {
    if distance_meters == 0.0 {
        return None;
    }
    let pace = (duration_ms as f64 / 60_000.0) / (distance_meters / 1000.0);
    pace.is_finite().then_some(pace)
}

/// Immutable view of a session at one instant.
///
/// Published as a whole; readers never observe a half-applied update.
#[derive(Debug, Clone, PartialEq)]
pub struct SessionSnapshot {
    /// Monotonic publication counter (0 for the initial empty snapshot).
    pub version: u64,
    pub state: SessionState,
    /// Accepted fixes in arrival order.
    pub route: Arc<Vec<Fix>>,
    /// Last filter-passing fix, for display.
    pub current_position: Option<Fix>,
    pub distance_meters: f64,
    pub duration_ms: u64,
    pub start_timestamp: u64,
    pub paused_accumulated_ms: u64,
    /// Set once the session has been stopped.
    pub end_timestamp: Option<u64>,
}

impl SessionSnapshot {
    /// Snapshot of a fresh, idle session.
    pub fn empty() -> Self {
        SessionSnapshot {
            version: 0,
            state: SessionState::Idle,
            route: Arc::new(Vec::new()),
            current_position: None,
            distance_meters: 0.0,
            duration_ms: 0,
            start_timestamp: 0,
            paused_accumulated_ms: 0,
            end_timestamp: None,
        }
    }

    /// Derived pace for this snapshot.
    pub fn pace_min_per_km(&self) -> Option<f64> {
        pace_min_per_km(self.distance_meters, self.duration_ms)
    }

    /// Most recent route point, falling back to the display position.
    pub fn last_fix(&self) -> Option<&Fix> {
        self.route.last().or(self.current_position.as_ref())
    }
}

/// One tracking session.
///
/// Single-writer: callers that share it across threads wrap it in
/// [`super::SessionTracker`].
#[derive(Debug, Clone)]
pub struct TrackingSession {
    filter: FixFilter,
    engine: DistanceEngine,
    state: SessionState,
    route: Arc<Vec<Fix>>,
    current_position: Option<Fix>,
    start_timestamp: u64,
    paused_accumulated_ms: u64,
    pause_started_timestamp: Option<u64>,
    end_timestamp: Option<u64>,
    duration_ms: u64,
}

impl Default for TrackingSession {
    fn default() -> Self {
        Self::new(TrackingConfig::default())
    }
}

impl TrackingSession {
    /// Creates an idle session.
    pub fn new(config: TrackingConfig) -> Self {
        TrackingSession {
            filter: FixFilter::new(config.max_accuracy_meters),
            engine: DistanceEngine::new(config.max_speed_mps),
            state: SessionState::Idle,
            route: Arc::new(Vec::new()),
            current_position: None,
            start_timestamp: 0,
            paused_accumulated_ms: 0,
            pause_started_timestamp: None,
            end_timestamp: None,
            duration_ms: 0,
        }
    }

    pub fn state(&self) -> SessionState {
        self.state
    }

    pub fn route(&self) -> &[Fix] {
        &self.route
    }

    pub fn current_position(&self) -> Option<&Fix> {
        self.current_position.as_ref()
    }

    pub fn distance_meters(&self) -> f64 {
        self.engine.total_meters()
    }

    pub fn start_timestamp(&self) -> u64 {
        self.start_timestamp
    }

    pub fn paused_accumulated_ms(&self) -> u64 {
        self.paused_accumulated_ms
    }

    pub fn end_timestamp(&self) -> Option<u64> {
        self.end_timestamp
    }

    /// Duration as of the last fix or transition.
    pub fn duration_ms(&self) -> u64 {
        self.duration_ms
    }

    /// Elapsed active time at `now`, excluding pauses.
    ///
    /// Frozen while paused and after stop.
    pub fn duration_ms_at(&self, now: u64) -> u64 {
        match self.state {
            SessionState::Idle => 0,
            SessionState::Running => self.active_ms_until(now),
            SessionState::Paused => self
                .pause_started_timestamp
                .map_or(self.duration_ms, |paused_at| self.active_ms_until(paused_at)),
            SessionState::Stopped => self.duration_ms,
        }
    }

    /// Pace at `now`.
    pub fn pace_min_per_km_at(&self, now: u64) -> Option<f64> {
        pace_min_per_km(self.distance_meters(), self.duration_ms_at(now))
    }

    /// IDLE → RUNNING. Clears route, distance and pause time.
    pub fn start(&mut self, now: u64) -> bool {
        if self.state != SessionState::Idle {
            return false;
        }
        self.clear_accumulated();
        self.start_timestamp = now;
        self.state = SessionState::Running;
        true
    }

    /// RUNNING → PAUSED.
    pub fn pause(&mut self, now: u64) -> bool {
        if self.state != SessionState::Running {
            return false;
        }
        self.duration_ms = self.active_ms_until(now);
        self.pause_started_timestamp = Some(now);
        self.state = SessionState::Paused;
        true
    }

    /// PAUSED → RUNNING. The pause interval is excluded from duration.
    pub fn resume(&mut self, now: u64) -> bool {
        if self.state != SessionState::Paused {
            return false;
        }
        self.close_pause(now);
        self.state = SessionState::Running;
        true
    }

    /// RUNNING or PAUSED → STOPPED. Freezes duration at `now`.
    pub fn stop(&mut self, now: u64) -> bool {
        match self.state {
            SessionState::Running | SessionState::Paused => {
                self.close_pause(now);
                self.duration_ms = self.active_ms_until(now);
                self.end_timestamp = Some(now);
                self.state = SessionState::Stopped;
                true
            }
            SessionState::Idle | SessionState::Stopped => false,
        }
    }

    /// STOPPED → IDLE, clearing everything. No-op in any other state.
    pub fn reset(&mut self) -> bool {
        if self.state != SessionState::Stopped {
            return false;
        }
        self.clear_accumulated();
        self.current_position = None;
        self.state = SessionState::Idle;
        true
    }

    /// Ingests one fix.
    ///
    /// Filter failures drop the fix entirely. While running, a passing fix is
    /// appended to the route even when its segment is a speed outlier; only
    /// the distance total skips the outlier.
    pub fn ingest(&mut self, fix: Fix, now: u64) -> FixOutcome {
        if let Err(rejection) = self.filter.check(&fix) {
            debug!(%rejection, timestamp = fix.timestamp, "dropping fix");
            return FixOutcome::Rejected(rejection);
        }
        let fix = fix.sanitized();

        match self.state {
            SessionState::Stopped => FixOutcome::Ignored,
            SessionState::Idle | SessionState::Paused => {
                self.current_position = Some(fix);
                FixOutcome::PositionOnly
            }
            SessionState::Running => {
                let segment = self.engine.accumulate(&fix);
                if let Segment::Jump {
                    meters,
                    implied_speed,
                } = segment
                {
                    debug!(meters, implied_speed, "excluding GPS jump from distance");
                }
                Arc::make_mut(&mut self.route).push(fix);
                self.current_position = Some(fix);
                self.duration_ms = self.active_ms_until(now);
                FixOutcome::Appended(segment)
            }
        }
    }

    /// Builds a snapshot tagged with `version`, with duration evaluated at `now`.
    pub fn snapshot(&self, version: u64, now: u64) -> SessionSnapshot {
        SessionSnapshot {
            version,
            state: self.state,
            route: Arc::clone(&self.route),
            current_position: self.current_position,
            distance_meters: self.distance_meters(),
            duration_ms: self.duration_ms_at(now),
            start_timestamp: self.start_timestamp,
            paused_accumulated_ms: self.paused_accumulated_ms,
            end_timestamp: self.end_timestamp,
        }
    }

    fn active_ms_until(&self, now: u64) -> u64 {
        now.saturating_sub(self.start_timestamp)
            .saturating_sub(self.paused_accumulated_ms)
    }

    fn close_pause(&mut self, now: u64) {
        if let Some(paused_at) = self.pause_started_timestamp.take() {
            self.paused_accumulated_ms += now.saturating_sub(paused_at);
        }
    }

    fn clear_accumulated(&mut self) {
        self.engine.reset();
        self.route = Arc::new(Vec::new());
        self.start_timestamp = 0;
        self.paused_accumulated_ms = 0;
        self.pause_started_timestamp = None;
        self.end_timestamp = None;
        self.duration_ms = 0;
    }
}
