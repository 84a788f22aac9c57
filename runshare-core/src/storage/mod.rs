// SPDX-FileCopyrightText: 2026 Mattia Egloff <mattia.egloff@pm.me>
//
// SPDX-License-Identifier: GPL-3.0-or-later

//! Persistent Storage Module
//!
//! SQLite storage for finished runs, the offline "last known location"
//! cache used when sharing without a relay connection, and the social
//! layer (profiles, check-ins, groups, leaderboards).

mod cache;
mod error;
pub mod migration;
mod runs;
mod social;

pub use cache::{CachedLocation, MemoryOfflineCache, OfflineCache};
pub use error::StorageError;
pub use runs::RunTotals;
pub use social::{
    day_start, normalize_invite_code, CheckIn, CheckInOutcome, Group, LeaderboardOrder,
    UserProfile, DAY_MS,
};

use std::path::Path;

use parking_lot::{Mutex, MutexGuard};
use rusqlite::Connection;

/// SQLite-based storage implementation.
///
/// The connection sits behind a mutex so one `Storage` can be shared
/// between the session owner and the sharing client.
pub struct Storage {
    conn: Mutex<Connection>,
}

impl Storage {
    /// Opens or creates a storage database at the given path.
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self, StorageError> {
        Self::from_connection(Connection::open(path)?)
    }

    /// Creates an in-memory storage (for testing).
    pub fn in_memory() -> Result<Self, StorageError> {
        Self::from_connection(Connection::open_in_memory()?)
    }

    fn from_connection(conn: Connection) -> Result<Self, StorageError> {
        migration::MigrationRunner::run(&conn, &migration::all_migrations())?;
        Ok(Storage {
            conn: Mutex::new(conn),
        })
    }

    /// Returns the current schema version.
    pub fn schema_version(&self) -> Result<u32, StorageError> {
        migration::MigrationRunner::current_version(&self.conn())
    }

    fn conn(&self) -> MutexGuard<'_, Connection> {
        self.conn.lock()
    }
}

impl std::fmt::Debug for Storage {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Storage").finish_non_exhaustive()
    }
}
