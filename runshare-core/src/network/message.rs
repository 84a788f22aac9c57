// SPDX-FileCopyrightText: 2026 Mattia Egloff <mattia.egloff@pm.me>
//
// SPDX-License-Identifier: GPL-3.0-or-later

//! Relay Message Types
//!
//! Wire protocol for the location relay. Every frame is one JSON object with
//! a `type` discriminator.

use serde::{Deserialize, Serialize};

use crate::tracking::{Fix, SessionSnapshot};

/// Last known state of one sharing participant.
///
/// Serialized as the `data` object of a `location` message.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PeerSnapshot {
    /// Participant identifier.
    #[serde(rename = "userId")]
    pub peer_id: String,
    /// Human-readable name.
    #[serde(rename = "username", default)]
    pub display_name: String,
    /// Most recent position.
    #[serde(rename = "location")]
    pub last_fix: Fix,
    /// True while the participant's session is running.
    #[serde(rename = "isRunning", default)]
    pub is_active: bool,
    /// Session distance in meters.
    #[serde(rename = "distance", default)]
    pub distance_meters: f64,
    /// Session duration in milliseconds.
    #[serde(rename = "duration", default)]
    pub duration_ms: u64,
}

impl PeerSnapshot {
    /// Builds the local participant's snapshot from a session snapshot.
    ///
    /// Returns `None` until the session has a position to report.
    pub fn from_session(
        peer_id: impl Into<String>,
        display_name: impl Into<String>,
        session: &SessionSnapshot,
    ) -> Option<Self> {
        let last_fix = *session.last_fix()?;
        Some(PeerSnapshot {
            peer_id: peer_id.into(),
            display_name: display_name.into(),
            last_fix,
            is_active: session.state.is_active(),
            distance_meters: session.distance_meters,
            duration_ms: session.duration_ms,
        })
    }
}

/// Messages exchanged with the relay.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum RelayMessage {
    /// Identifies the client; sent once per connection, first.
    Auth {
        #[serde(rename = "userId")]
        user_id: String,
        username: String,
    },
    /// Registers interest in a peer's updates.
    Subscribe {
        #[serde(rename = "friendId")]
        friend_id: String,
    },
    /// Withdraws interest in a peer's updates.
    Unsubscribe {
        #[serde(rename = "friendId")]
        friend_id: String,
    },
    /// A participant's snapshot (sent for ourselves, received for peers).
    Location { data: PeerSnapshot },
    /// A peer went offline.
    Offline {
        #[serde(rename = "userId")]
        user_id: String,
    },
    /// Any type this client does not understand.
    #[serde(other)]
    Unknown,
}

impl RelayMessage {
    /// Short name of the message kind, for logging.
    pub fn kind(&self) -> &'static str {
        match self {
            RelayMessage::Auth { .. } => "auth",
            RelayMessage::Subscribe { .. } => "subscribe",
            RelayMessage::Unsubscribe { .. } => "unsubscribe",
            RelayMessage::Location { .. } => "location",
            RelayMessage::Offline { .. } => "offline",
            RelayMessage::Unknown => "unknown",
        }
    }
}
