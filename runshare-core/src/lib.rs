//! RunShare Core Library
//!
//! Run tracking from noisy positional fixes, with live location sharing
//! through a relay and a local run history.

pub mod api;
pub mod network;
pub mod storage;
pub mod tracking;

pub use api::{
    CallbackHandler, EventHandler, RunShare, RunShareConfig, RunShareError, RunShareEvent,
    RunShareResult,
};
pub use network::{
    ConnectionState, Connector, MockConnector, NetworkError, PeerSnapshot, PeerTable,
    RelayMessage, SharingClient, SharingConfig, WebSocketConnector,
};
pub use storage::{
    CachedLocation, CheckInOutcome, Group, LeaderboardOrder, OfflineCache, Storage, StorageError,
    UserProfile,
};
pub use tracking::{
    DistanceEngine, FinishedRun, Fix, FixFilter, SessionSnapshot, SessionState, SessionTracker,
    TrackingConfig, TrackingSession,
};
