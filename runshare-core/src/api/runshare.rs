// SPDX-FileCopyrightText: 2026 Mattia Egloff <mattia.egloff@pm.me>
//
// SPDX-License-Identifier: GPL-3.0-or-later

//! RunShare Orchestrator
//!
//! Owns the session tracker, the sharing client, optional storage and the
//! event dispatcher. Callers construct it explicitly and keep it for as long
//! as tracking and sharing should run.

use std::sync::Arc;
use std::time::Duration;

use tokio::sync::watch;
use tokio::task::JoinHandle;
use tracing::{debug, info};

use super::config::{RunShareConfig, StorageLocation};
use super::error::{RunShareError, RunShareResult};
use super::events::{EventDispatcher, EventHandler, RunShareEvent};
use crate::network::{
    ConnectionState, Connector, PeerSnapshot, PeerTable, PublishOutcome, ShareData,
    SharingClient, SharingEvent, WebSocketConnector,
};
use crate::storage::{
    day_start, CachedLocation, CheckIn, CheckInOutcome, Group, LeaderboardOrder,
    MemoryOfflineCache, OfflineCache, RunTotals, Storage, StorageError, UserProfile,
};
use crate::tracking::{
    now_millis, FinishedRun, Fix, FixOutcome, SessionCommand, SessionSnapshot, SessionState,
    SessionTracker, StateChange,
};

impl From<SharingEvent> for RunShareEvent {
    fn from(event: SharingEvent) -> Self {
        match event {
            SharingEvent::ConnectionChanged(state) => {
                RunShareEvent::ConnectionStateChanged { state }
            }
            SharingEvent::PeerUpdated(peer_id) => RunShareEvent::PeerUpdated { peer_id },
            SharingEvent::PeerRemoved(peer_id) => RunShareEvent::PeerRemoved { peer_id },
            SharingEvent::PublishedOffline => RunShareEvent::PublishedOffline,
        }
    }
}

/// Run tracking with live sharing.
///
/// Must be created inside a tokio runtime.
pub struct RunShare<C: Connector = WebSocketConnector> {
    config: RunShareConfig,
    tracker: SessionTracker,
    sharing: SharingClient<C>,
    storage: Option<Arc<Storage>>,
    events: Arc<EventDispatcher>,
    forwarder: JoinHandle<()>,
}

impl RunShare<WebSocketConnector> {
    /// Creates an instance that shares over WebSocket.
    pub fn new(config: RunShareConfig) -> RunShareResult<Self> {
        Self::with_connector(config, WebSocketConnector::new())
    }
}

impl<C: Connector> RunShare<C> {
    /// Creates an instance using the given relay connector.
    pub fn with_connector(config: RunShareConfig, connector: C) -> RunShareResult<Self> {
        let storage = match &config.storage {
            StorageLocation::Disabled => None,
            StorageLocation::InMemory => Some(Arc::new(Storage::in_memory()?)),
            StorageLocation::File(path) => Some(Arc::new(Storage::open(path)?)),
        };
        let cache: Arc<dyn OfflineCache> = match &storage {
            Some(storage) => Arc::clone(storage) as Arc<dyn OfflineCache>,
            None => Arc::new(MemoryOfflineCache::new()),
        };

        let sharing = SharingClient::new(connector, config.sharing.clone(), cache)?;
        sharing.configure(
            config.endpoint.clone(),
            config.local_id.clone(),
            config.display_name.clone(),
        );

        let events = Arc::new(EventDispatcher::new());
        let mut sharing_events = sharing.subscribe_events();
        let dispatcher = Arc::clone(&events);
        let forwarder = tokio::spawn(async move {
            while let Some(event) = sharing_events.recv().await {
                dispatcher.dispatch(event.into());
            }
        });

        Ok(RunShare {
            tracker: SessionTracker::new(config.tracking),
            config,
            sharing,
            storage,
            events,
            forwarder,
        })
    }

    // === Session ===

    pub fn start(&self) -> bool {
        self.start_at(now_millis())
    }

    pub fn pause(&self) -> bool {
        self.pause_at(now_millis())
    }

    pub fn resume(&self) -> bool {
        self.resume_at(now_millis())
    }

    /// Stops the session and saves it when storage is configured.
    ///
    /// Returns the finished run, or `None` if the session was not active.
    pub fn stop(&self) -> RunShareResult<Option<FinishedRun>> {
        self.stop_at(now_millis())
    }

    pub fn reset(&self) -> bool {
        self.apply(SessionCommand::Reset, now_millis()).is_some()
    }

    pub fn start_at(&self, now: u64) -> bool {
        self.apply(SessionCommand::Start, now).is_some()
    }

    pub fn pause_at(&self, now: u64) -> bool {
        self.apply(SessionCommand::Pause, now).is_some()
    }

    pub fn resume_at(&self, now: u64) -> bool {
        self.apply(SessionCommand::Resume, now).is_some()
    }

    pub fn stop_at(&self, now: u64) -> RunShareResult<Option<FinishedRun>> {
        let Some((change, mut run)) = self.tracker.finish_at(now) else {
            return Ok(None);
        };
        self.state_changed(change);

        if let Some(storage) = &self.storage {
            let run_id = storage.save_run(&run)?;
            run.id = Some(run_id);
            info!(run_id, distance = run.distance_meters, "run saved");
            let local_id = self.sharing.local_id();
            if !storage.record_run_stats(&local_id, &run)? {
                debug!(%local_id, "no profile, run not counted");
            }
            self.events.dispatch(RunShareEvent::SessionFinished { run_id });
        }
        Ok(Some(run))
    }

    /// Feeds one positioning fix into the session.
    pub fn on_fix(&self, fix: Fix) -> FixOutcome {
        self.on_fix_at(fix, now_millis())
    }

    /// Feeds a fix, publishing the new snapshot when sharing.
    pub fn on_fix_at(&self, fix: Fix, now: u64) -> FixOutcome {
        let outcome = self.tracker.ingest_at(fix, now);
        if outcome.changed_session() {
            self.publish_current();
        }
        outcome
    }

    pub fn snapshot(&self) -> Arc<SessionSnapshot> {
        self.tracker.snapshot()
    }

    pub fn state(&self) -> SessionState {
        self.tracker.state()
    }

    pub fn watch_session(&self) -> watch::Receiver<Arc<SessionSnapshot>> {
        self.tracker.watch()
    }

    fn apply(&self, command: SessionCommand, now: u64) -> Option<StateChange> {
        let change = self.tracker.apply_at(command, now)?;
        self.state_changed(change);
        Some(change)
    }

    fn state_changed(&self, change: StateChange) {
        self.events.dispatch(RunShareEvent::SessionStateChanged {
            from: change.from,
            to: change.to,
        });
        self.publish_current();
    }

    /// Publishes the local snapshot if sharing is enabled and a position is known.
    pub fn publish_current(&self) -> Option<PublishOutcome> {
        if !self.sharing.is_sharing_enabled() {
            return None;
        }
        let snapshot = PeerSnapshot::from_session(
            self.sharing.local_id(),
            self.sharing.display_name(),
            &self.tracker.snapshot(),
        )?;
        Some(self.sharing.publish(&snapshot))
    }

    // === Sharing ===

    pub fn configure_sharing(
        &self,
        endpoint: impl Into<String>,
        local_id: impl Into<String>,
        display_name: impl Into<String>,
    ) {
        self.sharing.configure(endpoint, local_id, display_name);
    }

    pub fn start_sharing(&self) -> RunShareResult<()> {
        self.sharing.start_sharing()?;
        self.publish_current();
        Ok(())
    }

    pub fn stop_sharing(&self) {
        self.sharing.stop_sharing();
    }

    /// Stops sharing after queued updates have been handed to the relay, or
    /// after `grace` at the latest.
    pub async fn shutdown_sharing(&self, grace: Duration) {
        self.sharing.shutdown(grace).await;
    }

    pub fn subscribe(&self, peer_id: impl Into<String>) {
        self.sharing.subscribe(peer_id);
    }

    pub fn unsubscribe(&self, peer_id: &str) {
        self.sharing.unsubscribe(peer_id);
    }

    pub fn share_link(&self) -> String {
        self.sharing.generate_share_link()
    }

    pub fn is_connected(&self) -> bool {
        self.sharing.is_connected()
    }

    pub fn is_sharing(&self) -> bool {
        self.sharing.is_sharing_enabled()
    }

    pub fn connection_state(&self) -> ConnectionState {
        self.sharing.connection_state()
    }

    pub fn peers(&self) -> PeerTable {
        self.sharing.peers()
    }

    pub fn watch_peers(&self) -> watch::Receiver<PeerTable> {
        self.sharing.watch_peers()
    }

    pub fn last_offline_snapshot(&self) -> Option<CachedLocation> {
        self.sharing.last_offline_snapshot()
    }

    // === History ===

    pub fn runs(&self) -> RunShareResult<Vec<FinishedRun>> {
        Ok(self.require_storage()?.list_runs()?)
    }

    pub fn run(&self, id: i64) -> RunShareResult<FinishedRun> {
        self.require_storage()?
            .load_run(id)?
            .ok_or(RunShareError::RunNotFound(id))
    }

    pub fn delete_run(&self, id: i64) -> RunShareResult<bool> {
        Ok(self.require_storage()?.delete_run(id)?)
    }

    pub fn rename_run(&self, id: i64, title: Option<&str>) -> RunShareResult<()> {
        Ok(self.require_storage()?.update_run_title(id, title)?)
    }

    pub fn run_totals(&self) -> RunShareResult<RunTotals> {
        Ok(self.require_storage()?.run_totals()?)
    }

    /// Self-contained link carrying a stored run.
    pub fn run_share_link(&self, id: i64) -> RunShareResult<String> {
        let run = self.run(id)?;
        let data = ShareData::history(id, run.route, run.distance_meters, run.duration_ms);
        Ok(data.to_link()?)
    }

    // === Social ===

    /// The local runner's profile, created or renamed to match the
    /// configured identity.
    pub fn profile(&self) -> RunShareResult<UserProfile> {
        self.profile_at(now_millis())
    }

    pub fn profile_at(&self, now: u64) -> RunShareResult<UserProfile> {
        let storage = self.require_storage()?;
        Ok(storage.upsert_user(
            &self.sharing.local_id(),
            &self.sharing.display_name(),
            now,
        )?)
    }

    /// Checks in for today, linking today's latest run if there is one.
    pub fn check_in(&self, note: &str) -> RunShareResult<CheckInOutcome> {
        self.check_in_at(now_millis(), note)
    }

    pub fn check_in_at(&self, now: u64, note: &str) -> RunShareResult<CheckInOutcome> {
        let profile = self.profile_at(now)?;
        let storage = self.require_storage()?;
        let run_id = storage.latest_run_since(day_start(now))?;
        Ok(storage.check_in(&profile.id, now, run_id, note)?)
    }

    pub fn check_ins(&self) -> RunShareResult<Vec<CheckIn>> {
        Ok(self
            .require_storage()?
            .check_ins(&self.sharing.local_id())?)
    }

    pub fn create_group(&self, name: &str, description: &str) -> RunShareResult<Group> {
        let now = now_millis();
        let profile = self.profile_at(now)?;
        Ok(self
            .require_storage()?
            .create_group(&profile.id, name, description, now)?)
    }

    pub fn join_group(&self, invite_code: &str) -> RunShareResult<Group> {
        let profile = self.profile()?;
        match self.require_storage()?.join_group(&profile.id, invite_code) {
            Err(StorageError::NotFound(_)) => Err(RunShareError::InvalidInviteCode(
                invite_code.trim().to_string(),
            )),
            result => Ok(result?),
        }
    }

    /// Leaves the current group and returns it.
    pub fn leave_group(&self) -> RunShareResult<Group> {
        let profile = self.profile()?;
        let storage = self.require_storage()?;
        let group_id = storage
            .leave_group(&profile.id)?
            .ok_or(RunShareError::NotInGroup)?;
        storage.group(&group_id)?.ok_or(RunShareError::NotInGroup)
    }

    /// The local runner's group and its members, farthest first.
    pub fn my_group(&self) -> RunShareResult<Option<(Group, Vec<UserProfile>)>> {
        let profile = self.profile()?;
        let storage = self.require_storage()?;
        let Some(group) = profile
            .group_id
            .as_deref()
            .map(|id| storage.group(id))
            .transpose()?
            .flatten()
        else {
            return Ok(None);
        };
        let members = storage.group_members(&group.id)?;
        Ok(Some((group, members)))
    }

    pub fn leaderboard(
        &self,
        order: LeaderboardOrder,
        limit: usize,
    ) -> RunShareResult<Vec<UserProfile>> {
        Ok(self.require_storage()?.leaderboard(order, limit)?)
    }

    pub fn group_leaderboard(&self, limit: usize) -> RunShareResult<Vec<Group>> {
        Ok(self.require_storage()?.group_leaderboard(limit)?)
    }

    fn require_storage(&self) -> RunShareResult<&Storage> {
        self.storage
            .as_deref()
            .ok_or(RunShareError::StorageUnavailable)
    }

    // === Events & Accessors ===

    pub fn add_event_handler(&self, handler: Arc<dyn EventHandler>) {
        self.events.add_handler(handler);
    }

    pub fn events(&self) -> &Arc<EventDispatcher> {
        &self.events
    }

    pub fn config(&self) -> &RunShareConfig {
        &self.config
    }

    pub fn tracker(&self) -> &SessionTracker {
        &self.tracker
    }

    pub fn sharing(&self) -> &SharingClient<C> {
        &self.sharing
    }

    pub fn storage(&self) -> Option<&Storage> {
        self.storage.as_deref()
    }
}

impl<C: Connector> Drop for RunShare<C> {
    fn drop(&mut self) {
        self.forwarder.abort();
    }
}
