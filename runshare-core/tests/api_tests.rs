// SPDX-FileCopyrightText: 2026 Mattia Egloff <mattia.egloff@pm.me>
//
// SPDX-License-Identifier: GPL-3.0-or-later

//! API Tests
//!
//! The RunShare facade: session control, persistence, sharing and events.

mod common;

use std::sync::Arc;
use std::time::Duration;

use common::{fix, peer};
use parking_lot::Mutex;
use runshare_core::api::{CallbackHandler, RunShare, RunShareConfig, RunShareError, RunShareEvent};
use runshare_core::network::{
    ConnectionState, MockConnector, PublishOutcome, RelayMessage, ShareData, ShareKind,
};
use runshare_core::tracking::SessionState;
use tokio::sync::mpsc;

fn app(config: RunShareConfig) -> (RunShare<MockConnector>, MockConnector) {
    let connector = MockConnector::new();
    let app = RunShare::with_connector(config.with_identity("me", "Me"), connector.clone()).unwrap();
    (app, connector)
}

fn recorded(app: &RunShare<MockConnector>) -> Arc<Mutex<Vec<RunShareEvent>>> {
    let events = Arc::new(Mutex::new(Vec::new()));
    let sink = Arc::clone(&events);
    app.add_event_handler(Arc::new(CallbackHandler::new(move |event| {
        sink.lock().push(event);
    })));
    events
}

fn streamed(app: &RunShare<MockConnector>) -> mpsc::UnboundedReceiver<RunShareEvent> {
    let (tx, rx) = mpsc::unbounded_channel();
    app.add_event_handler(Arc::new(CallbackHandler::new(move |event| {
        let _ = tx.send(event);
    })));
    rx
}

async fn next_matching(
    rx: &mut mpsc::UnboundedReceiver<RunShareEvent>,
    wanted: impl Fn(&RunShareEvent) -> bool,
) -> RunShareEvent {
    loop {
        let event = tokio::time::timeout(Duration::from_secs(5), rx.recv())
            .await
            .expect("timed out waiting for event")
            .expect("event stream ended");
        if wanted(&event) {
            return event;
        }
    }
}

async fn wait_connected(app: &RunShare<MockConnector>) {
    let mut rx = app.sharing().watch_connection();
    tokio::time::timeout(
        Duration::from_secs(5),
        rx.wait_for(|s| *s == ConnectionState::Connected),
    )
    .await
    .unwrap()
    .unwrap();
}

#[tokio::test]
async fn test_stop_persists_run_and_dispatches_in_order() {
    let (app, _) = app(RunShareConfig::in_memory());
    let events = recorded(&app);

    assert!(app.start_at(0));
    app.on_fix_at(fix(40.0, -75.0, 0), 0);
    app.on_fix_at(fix(40.0009, -75.0, 10_000), 10_000);
    let run = app.stop_at(10_000).unwrap().unwrap();

    let run_id = run.id.unwrap();
    assert_eq!(app.run(run_id).unwrap().route.len(), 2);
    assert_eq!(app.state(), SessionState::Stopped);
    assert_eq!(
        *events.lock(),
        vec![
            RunShareEvent::SessionStateChanged {
                from: SessionState::Idle,
                to: SessionState::Running,
            },
            RunShareEvent::SessionStateChanged {
                from: SessionState::Running,
                to: SessionState::Stopped,
            },
            RunShareEvent::SessionFinished { run_id },
        ]
    );
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn test_stop_racing_reset_never_loses_the_run() {
    use std::sync::atomic::{AtomicBool, Ordering};

    let (app, _) = app(RunShareConfig::in_memory());
    let rounds = 50;

    for round in 0..rounds {
        let base = round * 100_000;
        assert!(app.start_at(base));
        app.on_fix_at(fix(40.0, -75.0, base), base);

        let stopping = AtomicBool::new(true);
        let finished = std::thread::scope(|scope| {
            scope.spawn(|| {
                while stopping.load(Ordering::Acquire) {
                    app.reset();
                }
            });
            let finished = app.stop_at(base + 60_000);
            stopping.store(false, Ordering::Release);
            finished
        });

        let run = finished.unwrap().expect("stop of a running session yields a run");
        assert_eq!(run.start_time, base);
        assert!(app.run(run.id.unwrap()).is_ok());
        app.reset();
    }

    assert_eq!(app.runs().unwrap().len(), rounds as usize);
}

#[tokio::test]
async fn test_noop_stop_returns_none() {
    let (app, _) = app(RunShareConfig::in_memory());
    assert!(app.stop_at(5).unwrap().is_none());
    assert!(app.runs().unwrap().is_empty());
}

#[tokio::test]
async fn test_history_requires_storage() {
    let (app, _) = app(RunShareConfig::default());

    app.start_at(0);
    let run = app.stop_at(1_000).unwrap().unwrap();

    assert_eq!(run.id, None);
    assert!(matches!(app.runs(), Err(RunShareError::StorageUnavailable)));
    assert!(matches!(app.run_totals(), Err(RunShareError::StorageUnavailable)));
}

#[tokio::test]
async fn test_history_management() {
    let (app, _) = app(RunShareConfig::in_memory());
    app.start_at(0);
    app.on_fix_at(fix(1.0, 1.0, 0), 0);
    app.on_fix_at(fix(1.0005, 1.0, 30_000), 30_000);
    let id = app.stop_at(30_000).unwrap().unwrap().id.unwrap();

    app.rename_run(id, Some("Hills")).unwrap();
    assert_eq!(app.run(id).unwrap().display_title(), "Hills");
    assert_eq!(app.run_totals().unwrap().run_count, 1);

    let link = app.run_share_link(id).unwrap();
    let data = ShareData::from_link(&link).unwrap();
    assert_eq!(data.kind, ShareKind::History);
    assert_eq!(data.run_id, Some(id));
    assert_eq!(data.points.unwrap().len(), 2);
    assert_eq!(data.duration, Some(30_000));

    assert!(app.delete_run(id).unwrap());
    assert!(matches!(app.run(id), Err(RunShareError::RunNotFound(_))));
}

#[tokio::test]
async fn test_fixes_publish_to_relay_while_sharing() {
    let (app, connector) = app(RunShareConfig::in_memory().with_endpoint("https://relay.test"));
    app.start_sharing().unwrap();
    let mut link = connector.next_link().await.unwrap();
    wait_connected(&app).await;
    link.sent_frames();

    app.start_at(0);
    app.on_fix_at(fix(40.0, -75.0, 0), 0);
    app.on_fix_at(fix(40.0, -75.0, 0).with_accuracy(500.0), 0);

    let sent = link.sent_messages();
    assert_eq!(sent.len(), 1);
    let RelayMessage::Location { data } = &sent[0] else {
        panic!("expected location, got {:?}", sent[0]);
    };
    assert_eq!(data.peer_id, "me");
    assert_eq!(data.display_name, "Me");
    assert!(data.is_active);
    assert_eq!(data.last_fix.latitude, 40.0);
}

#[tokio::test]
async fn test_offline_sharing_caches_latest_position() {
    let (app, connector) = app(RunShareConfig::in_memory());
    let mut events = streamed(&app);
    app.start_sharing().unwrap();

    app.start_at(0);
    app.on_fix_at(fix(40.0, -75.0, 0), 0);
    app.on_fix_at(fix(40.0009, -75.0, 10_000), 10_000);

    next_matching(&mut events, |e| *e == RunShareEvent::PublishedOffline).await;
    let cached = app.last_offline_snapshot().unwrap();
    assert_eq!(cached.snapshot.peer_id, "me");
    assert_eq!(cached.snapshot.last_fix.latitude, 40.0009);
    assert_eq!(connector.attempts(), 0);
    assert_eq!(app.share_link(), "runshare://location/me");
    assert_eq!(app.publish_current(), Some(PublishOutcome::CachedOffline));
}

#[tokio::test]
async fn test_peer_and_connection_events_forwarded() {
    let (app, connector) = app(RunShareConfig::default().with_endpoint("http://relay.test"));
    let mut events = streamed(&app);
    app.subscribe("bob");
    app.start_sharing().unwrap();
    let link = connector.next_link().await.unwrap();

    next_matching(&mut events, |e| {
        *e == RunShareEvent::ConnectionStateChanged {
            state: ConnectionState::Connected,
        }
    })
    .await;

    link.push_message(&RelayMessage::Location { data: peer("bob", 1) });
    next_matching(&mut events, |e| {
        *e == RunShareEvent::PeerUpdated {
            peer_id: "bob".into(),
        }
    })
    .await;
    assert!(app.peers().contains("bob"));

    app.unsubscribe("bob");
    next_matching(&mut events, |e| {
        *e == RunShareEvent::PeerRemoved {
            peer_id: "bob".into(),
        }
    })
    .await;
    assert!(app.peers().is_empty());
}
