// SPDX-FileCopyrightText: 2026 Mattia Egloff <mattia.egloff@pm.me>
//
// SPDX-License-Identifier: GPL-3.0-or-later

//! Links
//!
//! Relay URL derivation, human-shareable links and self-contained data
//! links carrying a run as URL-safe base64 JSON.

use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use base64::Engine;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use super::error::NetworkError;
use crate::tracking::Fix;

/// Scheme used for links that need no server.
pub const LINK_SCHEME: &str = "runshare";

const DATA_LINK_PREFIX: &str = "runshare://share?data=";

/// Derives the websocket URL of the relay from its HTTP endpoint.
///
/// `http` maps to `ws`, `https` to `wss`; `/ws` is appended.
pub fn relay_url(endpoint: &str) -> Result<String, NetworkError> {
    let endpoint = endpoint.trim().trim_end_matches('/');
    let rest = |scheme: &str| endpoint.strip_prefix(scheme).filter(|r| !r.is_empty());

    let url = if let Some(host) = rest("https://") {
        format!("wss://{host}/ws")
    } else if let Some(host) = rest("http://") {
        format!("ws://{host}/ws")
    } else if rest("wss://").is_some() || rest("ws://").is_some() {
        format!("{endpoint}/ws")
    } else {
        return Err(NetworkError::InvalidEndpoint(endpoint.to_string()));
    };
    Ok(url)
}

/// Builds the link others can open to follow `local_id`.
pub fn share_link(endpoint: Option<&str>, local_id: &str) -> String {
    match endpoint {
        Some(endpoint) => format!("{}/share/{local_id}", endpoint.trim_end_matches('/')),
        None => format!("{LINK_SCHEME}://location/{local_id}"),
    }
}

/// Generates a short random session identifier.
pub fn new_session_id() -> String {
    uuid::Uuid::new_v4().simple().to_string()[..12].to_string()
}

/// Kind of content a data link carries.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ShareKind {
    Live,
    History,
}

/// Payload of a data link.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ShareData {
    #[serde(rename = "type")]
    pub kind: ShareKind,
    pub session_id: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub run_id: Option<i64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub points: Option<Vec<Fix>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub distance: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub duration: Option<u64>,
}

impl ShareData {
    /// Data for following a live session.
    pub fn live() -> Self {
        ShareData {
            kind: ShareKind::Live,
            session_id: new_session_id(),
            run_id: None,
            points: None,
            distance: None,
            duration: None,
        }
    }

    /// Data carrying a finished run.
    pub fn history(run_id: i64, points: Vec<Fix>, distance: f64, duration: u64) -> Self {
        ShareData {
            kind: ShareKind::History,
            session_id: new_session_id(),
            run_id: Some(run_id),
            points: Some(points),
            distance: Some(distance),
            duration: Some(duration),
        }
    }

    /// Encodes this payload as a data link.
    pub fn to_link(&self) -> Result<String, ShareLinkError> {
        let json = serde_json::to_vec(self)?;
        Ok(format!("{DATA_LINK_PREFIX}{}", URL_SAFE_NO_PAD.encode(json)))
    }

    /// Parses a data link. Padded and unpadded payloads are accepted.
    pub fn from_link(link: &str) -> Result<Self, ShareLinkError> {
        let payload = link
            .trim()
            .strip_prefix(DATA_LINK_PREFIX)
            .ok_or(ShareLinkError::NotADataLink)?;
        let payload = payload.split('&').next().unwrap_or_default();
        if payload.is_empty() {
            return Err(ShareLinkError::MissingData);
        }
        let json = URL_SAFE_NO_PAD.decode(payload.trim_end_matches('='))?;
        Ok(serde_json::from_slice(&json)?)
    }
}

/// Data link errors.
#[derive(Error, Debug)]
pub enum ShareLinkError {
    #[error("Not a {LINK_SCHEME} data link")]
    NotADataLink,

    #[error("Data link has no payload")]
    MissingData,

    #[error("Invalid link encoding: {0}")]
    Encoding(#[from] base64::DecodeError),

    #[error("Invalid link payload: {0}")]
    Payload(#[from] serde_json::Error),
}
