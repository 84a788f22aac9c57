// SPDX-FileCopyrightText: 2026 Mattia Egloff <mattia.egloff@pm.me>
//
// SPDX-License-Identifier: GPL-3.0-or-later

//! Session Tracker
//!
//! Thread-safe owner of a [`TrackingSession`]. Fix ingestion and control
//! commands are serialized behind one lock, and every change is published as a
//! fresh [`SessionSnapshot`] through a watch channel. Publication is a single
//! `Arc` swap, so readers see either the old or the new snapshot, never a mix.

use std::sync::Arc;

use parking_lot::Mutex;
use tokio::sync::watch;
use tracing::info;

use super::fix::Fix;
use super::now_millis;
use super::run::FinishedRun;
use super::session::{FixOutcome, SessionSnapshot, SessionState, TrackingConfig, TrackingSession};

/// Control commands accepted by [`SessionTracker::apply_at`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionCommand {
    Start,
    Pause,
    Resume,
    Stop,
    Reset,
}

/// A state transition caused by a command.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StateChange {
    pub from: SessionState,
    pub to: SessionState,
}

struct Guarded {
    session: TrackingSession,
    version: u64,
}

/// Serialized writer plus snapshot publisher for one session.
pub struct SessionTracker {
    inner: Mutex<Guarded>,
    snapshots: watch::Sender<Arc<SessionSnapshot>>,
}

impl Default for SessionTracker {
    fn default() -> Self {
        Self::new(TrackingConfig::default())
    }
}

impl SessionTracker {
    /// Creates a tracker around an idle session.
    pub fn new(config: TrackingConfig) -> Self {
        let (snapshots, _) = watch::channel(Arc::new(SessionSnapshot::empty()));
        SessionTracker {
            inner: Mutex::new(Guarded {
                session: TrackingSession::new(config),
                version: 0,
            }),
            snapshots,
        }
    }

    /// Latest published snapshot.
    pub fn snapshot(&self) -> Arc<SessionSnapshot> {
        self.snapshots.borrow().clone()
    }

    /// Receiver that is notified on every publication.
    pub fn watch(&self) -> watch::Receiver<Arc<SessionSnapshot>> {
        self.snapshots.subscribe()
    }

    /// Current state without waiting for a publication.
    pub fn state(&self) -> SessionState {
        self.inner.lock().session.state()
    }

    pub fn start(&self) -> bool {
        self.start_at(now_millis())
    }

    pub fn pause(&self) -> bool {
        self.pause_at(now_millis())
    }

    pub fn resume(&self) -> bool {
        self.resume_at(now_millis())
    }

    pub fn stop(&self) -> bool {
        self.stop_at(now_millis())
    }

    pub fn reset(&self) -> bool {
        self.apply_at(SessionCommand::Reset, now_millis()).is_some()
    }

    /// Ingests a fix stamped with the current wall clock.
    pub fn ingest(&self, fix: Fix) -> FixOutcome {
        self.ingest_at(fix, now_millis())
    }

    pub fn start_at(&self, now: u64) -> bool {
        self.apply_at(SessionCommand::Start, now).is_some()
    }

    pub fn pause_at(&self, now: u64) -> bool {
        self.apply_at(SessionCommand::Pause, now).is_some()
    }

    pub fn resume_at(&self, now: u64) -> bool {
        self.apply_at(SessionCommand::Resume, now).is_some()
    }

    pub fn stop_at(&self, now: u64) -> bool {
        self.apply_at(SessionCommand::Stop, now).is_some()
    }

    /// Applies a control command at `now`.
    ///
    /// Returns the transition, or `None` when the command was a no-op in the
    /// current state.
    pub fn apply_at(&self, command: SessionCommand, now: u64) -> Option<StateChange> {
        let mut guard = self.inner.lock();
        self.apply_locked(&mut guard, command, now)
    }

    /// Stops the session and builds its record in the same critical section.
    ///
    /// A concurrent reset cannot slip in between the two. Returns `None` when
    /// the session was not active.
    pub fn finish_at(&self, now: u64) -> Option<(StateChange, FinishedRun)> {
        let mut guard = self.inner.lock();
        let change = self.apply_locked(&mut guard, SessionCommand::Stop, now)?;
        let run = guard.session.finish(now)?;
        Some((change, run))
    }

    fn apply_locked(
        &self,
        guard: &mut Guarded,
        command: SessionCommand,
        now: u64,
    ) -> Option<StateChange> {
        let from = guard.session.state();
        let session = &mut guard.session;
        let changed = match command {
            SessionCommand::Start => session.start(now),
            SessionCommand::Pause => session.pause(now),
            SessionCommand::Resume => session.resume(now),
            SessionCommand::Stop => session.stop(now),
            SessionCommand::Reset => session.reset(),
        };
        if !changed {
            return None;
        }
        let to = guard.session.state();
        info!(?command, ?from, ?to, "session state changed");
        self.publish(guard, now);
        Some(StateChange { from, to })
    }

    /// Ingests a fix, using `now` for the duration update.
    pub fn ingest_at(&self, fix: Fix, now: u64) -> FixOutcome {
        let mut guard = self.inner.lock();
        let outcome = guard.session.ingest(fix, now);
        if outcome.changed_session() {
            self.publish(&mut guard, now);
        }
        outcome
    }

    // Called with the lock held so publication order matches mutation order.
    fn publish(&self, guard: &mut Guarded, now: u64) {
        guard.version += 1;
        let snapshot = guard.session.snapshot(guard.version, now);
        self.snapshots.send_replace(Arc::new(snapshot));
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_apply_reports_transition() {
        let tracker = SessionTracker::default();

        assert_eq!(
            tracker.apply_at(SessionCommand::Start, 0),
            Some(StateChange {
                from: SessionState::Idle,
                to: SessionState::Running,
            })
        );
        assert_eq!(tracker.apply_at(SessionCommand::Start, 5), None);
        tracker.pause_at(10);
        assert_eq!(
            tracker.apply_at(SessionCommand::Stop, 20),
            Some(StateChange {
                from: SessionState::Paused,
                to: SessionState::Stopped,
            })
        );
        assert!(tracker.apply_at(SessionCommand::Reset, 30).is_some());
        assert_eq!(tracker.state(), SessionState::Idle);
    }

    #[test]
    fn test_noop_commands_do_not_publish() {
        let tracker = SessionTracker::default();

        assert!(!tracker.pause_at(10));
        assert!(!tracker.resume_at(10));
        assert!(!tracker.stop_at(10));
        assert_eq!(tracker.snapshot().version, 0);
    }

    #[test]
    fn test_versions_increase_per_change() {
        let tracker = SessionTracker::default();

        tracker.start_at(0);
        tracker.ingest_at(Fix::new(1.0, 1.0, 0).with_accuracy(3.0), 0);
        tracker.ingest_at(Fix::new(1.0, 1.0, 0).with_accuracy(99.0), 0);
        tracker.pause_at(100);

        let snap = tracker.snapshot();
        assert_eq!(snap.version, 3);
        assert_eq!(snap.state, SessionState::Paused);
        assert_eq!(snap.route.len(), 1);
    }

    #[test]
    fn test_finish_returns_run_of_stopped_session() {
        let tracker = SessionTracker::default();
        assert!(tracker.finish_at(0).is_none());

        tracker.start_at(1_000);
        tracker.ingest_at(Fix::new(40.0, -75.0, 1_000).with_accuracy(5.0), 1_000);
        let (change, run) = tracker.finish_at(31_000).unwrap();

        assert_eq!(change.to, SessionState::Stopped);
        assert_eq!(run.duration_ms, 30_000);
        assert_eq!(run.route.len(), 1);
        assert!(tracker.finish_at(40_000).is_none());
    }

    #[test]
    fn test_concurrent_ingest_and_commands_publish_whole_snapshots() {
        use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
        use std::thread;

        use crate::tracking::total_distance;

        let tracker = Arc::new(SessionTracker::default());
        let clock = Arc::new(AtomicU64::new(1));
        let done = Arc::new(AtomicBool::new(false));
        tracker.start_at(0);

        let reader = {
            let tracker = Arc::clone(&tracker);
            let done = Arc::clone(&done);
            thread::spawn(move || {
                let mut last = tracker.snapshot();
                while !done.load(Ordering::Acquire) {
                    let snap = tracker.snapshot();
                    if Arc::ptr_eq(&snap, &last) {
                        continue;
                    }
                    assert!(snap.version > last.version);
                    assert!(snap.route.len() >= last.route.len());
                    assert!(snap.distance_meters >= last.distance_meters);
                    assert!(snap.distance_meters <= total_distance(&snap.route) + 1e-6);
                    last = snap;
                }
            })
        };

        let writers: Vec<_> = (0..2)
            .map(|lane| {
                let tracker = Arc::clone(&tracker);
                let clock = Arc::clone(&clock);
                thread::spawn(move || {
                    for step in 0..500u32 {
                        let now = clock.fetch_add(1, Ordering::SeqCst);
                        let lat = 40.0 + f64::from(step) * 1e-7 + f64::from(lane) * 1e-8;
                        let fix = Fix::new(lat, -75.0, now).with_accuracy(5.0);
                        tracker.ingest_at(fix, now);
                    }
                })
            })
            .collect();

        let toggler = {
            let tracker = Arc::clone(&tracker);
            let clock = Arc::clone(&clock);
            thread::spawn(move || {
                for _ in 0..200 {
                    tracker.pause_at(clock.fetch_add(1, Ordering::SeqCst));
                    tracker.resume_at(clock.fetch_add(1, Ordering::SeqCst));
                }
            })
        };

        for writer in writers {
            writer.join().unwrap();
        }
        toggler.join().unwrap();
        done.store(true, Ordering::Release);
        reader.join().unwrap();

        let last = tracker.snapshot();
        assert_eq!(last.state, SessionState::Running);
        assert!(last.route.len() <= 1_000);
        assert!(last.version >= 400);
    }

    #[tokio::test]
    async fn test_watchers_see_terminal_state() {
        let tracker = SessionTracker::default();
        let mut rx = tracker.watch();

        tracker.start_at(0);
        tracker.stop_at(1_000);

        rx.changed().await.unwrap();
        assert_eq!(rx.borrow_and_update().state, SessionState::Stopped);
    }
}
