//! Offline location cache.
//!
//! When a publish finds no relay connection, the snapshot lands here so it
//! can be shared out of band later. Only the latest snapshot is kept.

use parking_lot::Mutex;
use rusqlite::{params, OptionalExtension};

use super::{Storage, StorageError};
use crate::network::PeerSnapshot;

const LAST_LOCATION_KEY: &str = "last_location";

/// A cached snapshot and when it was written.
#[derive(Debug, Clone, PartialEq)]
pub struct CachedLocation {
    pub snapshot: PeerSnapshot,
    pub updated_at: u64,
}

/// Single-slot store for the last known local location.
pub trait OfflineCache: Send + Sync {
    /// Replaces the cached snapshot.
    fn store_last_location(&self, snapshot: &PeerSnapshot, now: u64) -> Result<(), StorageError>;

    /// Returns the cached snapshot, if any.
    fn load_last_location(&self) -> Result<Option<CachedLocation>, StorageError>;
}

/// In-memory cache for tests and storage-less setups.
#[derive(Debug, Default)]
pub struct MemoryOfflineCache {
    slot: Mutex<Option<CachedLocation>>,
}

impl MemoryOfflineCache {
    pub fn new() -> Self {
        Self::default()
    }
}

impl OfflineCache for MemoryOfflineCache {
    fn store_last_location(&self, snapshot: &PeerSnapshot, now: u64) -> Result<(), StorageError> {
        *self.slot.lock() = Some(CachedLocation {
            snapshot: snapshot.clone(),
            updated_at: now,
        });
        Ok(())
    }

    fn load_last_location(&self) -> Result<Option<CachedLocation>, StorageError> {
        Ok(self.slot.lock().clone())
    }
}

impl OfflineCache for Storage {
    fn store_last_location(&self, snapshot: &PeerSnapshot, now: u64) -> Result<(), StorageError> {
        let json = serde_json::to_string(snapshot)?;
        self.conn().execute(
            "INSERT OR REPLACE INTO share_cache (key, snapshot_json, updated_at) VALUES (?1, ?2, ?3)",
            params![LAST_LOCATION_KEY, json, now as i64],
        )?;
        Ok(())
    }

    fn load_last_location(&self) -> Result<Option<CachedLocation>, StorageError> {
        let row: Option<(String, i64)> = self
            .conn()
            .query_row(
                "SELECT snapshot_json, updated_at FROM share_cache WHERE key = ?1",
                params![LAST_LOCATION_KEY],
                |row| Ok((row.get(0)?, row.get(1)?)),
            )
            .optional()?;

        row.map(|(json, updated_at)| -> Result<CachedLocation, StorageError> {
            Ok(CachedLocation {
                snapshot: serde_json::from_str(&json)?,
                updated_at: updated_at as u64,
            })
        })
        .transpose()
    }
}
