//! Finished run records handed to persistence.

use serde::{Deserialize, Serialize};

use super::fix::Fix;
use super::session::{pace_min_per_km, SessionSnapshot, SessionState, TrackingSession};

/// A stopped session in the shape it is stored.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FinishedRun {
    /// Storage id; `None` until saved.
    pub id: Option<i64>,
    pub title: Option<String>,
    pub start_time: u64,
    pub end_time: u64,
    pub distance_meters: f64,
    pub duration_ms: u64,
    pub avg_pace_min_per_km: Option<f64>,
    pub route: Vec<Fix>,
    pub created_at: u64,
}

impl FinishedRun {
    /// Title for display, falling back to the start time.
    pub fn display_title(&self) -> String {
        match &self.title {
            Some(title) if !title.trim().is_empty() => title.clone(),
            _ => format!("Run at {}", self.start_time),
        }
    }
}

impl SessionSnapshot {
    /// Record for a stopped session; `None` in any other state.
    pub fn to_finished_run(&self, created_at: u64) -> Option<FinishedRun> {
        if self.state != SessionState::Stopped {
            return None;
        }
        let end_time = self.end_timestamp?;
        Some(FinishedRun {
            id: None,
            title: None,
            start_time: self.start_timestamp,
            end_time,
            distance_meters: self.distance_meters,
            duration_ms: self.duration_ms,
            avg_pace_min_per_km: pace_min_per_km(self.distance_meters, self.duration_ms),
            route: self.route.as_ref().clone(),
            created_at,
        })
    }
}

impl TrackingSession {
    /// Record for this session if it has been stopped.
    pub fn finish(&self, now: u64) -> Option<FinishedRun> {
        self.snapshot(0, now).to_finished_run(now)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tracking::TrackingConfig;

    #[test]
    fn test_finish_requires_stopped_session() {
        let mut session = TrackingSession::new(TrackingConfig::default());
        assert!(session.finish(0).is_none());

        session.start(1_000);
        session.ingest(Fix::new(40.0, -75.0, 1_000).with_accuracy(5.0), 1_000);
        session.ingest(Fix::new(40.0009, -75.0, 11_000).with_accuracy(5.0), 11_000);
        assert!(session.finish(11_000).is_none());

        session.stop(11_000);
        let run = session.finish(20_000).unwrap();

        assert_eq!(run.id, None);
        assert_eq!(run.start_time, 1_000);
        assert_eq!(run.end_time, 11_000);
        assert_eq!(run.duration_ms, 10_000);
        assert_eq!(run.route.len(), 2);
        assert_eq!(run.created_at, 20_000);
        assert!((run.distance_meters - 100.08).abs() < 0.1);
        assert!(run.avg_pace_min_per_km.is_some());
    }

    #[test]
    fn test_display_title_fallback() {
        let mut session = TrackingSession::new(TrackingConfig::default());
        session.start(5);
        session.stop(9);
        let mut run = session.finish(9).unwrap();

        assert_eq!(run.display_title(), "Run at 5");
        run.title = Some("Morning".into());
        assert_eq!(run.display_title(), "Morning");
    }
}
