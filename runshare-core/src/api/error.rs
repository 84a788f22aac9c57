// SPDX-FileCopyrightText: 2026 Mattia Egloff <mattia.egloff@pm.me>
//
// SPDX-License-Identifier: GPL-3.0-or-later

//! API Error Types
//!
//! Unified error type for the RunShare API layer.

use thiserror::Error;

use crate::network::{NetworkError, ShareLinkError};
use crate::storage::StorageError;

/// Unified error type for RunShare operations.
#[derive(Error, Debug)]
pub enum RunShareError {
    /// Storage operation failed.
    #[error("storage error: {0}")]
    Storage(#[from] StorageError),

    /// Network operation failed.
    #[error("network error: {0}")]
    Network(#[from] NetworkError),

    /// Share link could not be built or parsed.
    #[error("share link error: {0}")]
    ShareLink(#[from] ShareLinkError),

    /// The instance was configured without storage.
    #[error("storage not configured")]
    StorageUnavailable,

    /// Run not found.
    #[error("run not found: {0}")]
    RunNotFound(i64),

    /// No group uses this invite code.
    #[error("invalid invite code: {0}")]
    InvalidInviteCode(String),

    /// The local runner belongs to no group.
    #[error("not in a group")]
    NotInGroup,
}

/// Result type for RunShare operations.
pub type RunShareResult<T> = Result<T, RunShareError>;
