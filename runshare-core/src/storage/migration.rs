// SPDX-FileCopyrightText: 2026 Mattia Egloff <mattia.egloff@pm.me>
//
// SPDX-License-Identifier: GPL-3.0-or-later

//! Database Schema Migrations
//!
//! Versioned SQL migrations. Applied versions are tracked in a
//! `schema_version` table and pending ones run in order inside a single
//! transaction.

use rusqlite::Connection;

use super::StorageError;
use crate::tracking::now_millis;

/// A single schema migration step.
pub struct Migration {
    /// Monotonically increasing version number (starting at 1).
    pub version: u32,
    /// Human-readable name for this migration.
    pub name: &'static str,
    pub sql: &'static str,
}

/// Runs schema migrations against a database connection.
pub struct MigrationRunner;

impl MigrationRunner {
    /// Applies every migration newer than the current schema version.
    ///
    /// If any step fails, all pending steps are rolled back.
    pub fn run(conn: &Connection, migrations: &[Migration]) -> Result<(), StorageError> {
        conn.execute_batch(
            "CREATE TABLE IF NOT EXISTS schema_version (
                version INTEGER PRIMARY KEY,
                applied_at INTEGER NOT NULL
            );",
        )?;

        let current_version = Self::current_version(conn)?;
        let pending: Vec<&Migration> = migrations
            .iter()
            .filter(|m| m.version > current_version)
            .collect();

        if pending.is_empty() {
            return Ok(());
        }

        for window in pending.windows(2) {
            if window[0].version >= window[1].version {
                return Err(StorageError::Migration(format!(
                    "Migrations are not in order: v{} before v{}",
                    window[0].version, window[1].version
                )));
            }
        }

        conn.execute_batch("BEGIN EXCLUSIVE TRANSACTION;")?;

        for migration in &pending {
            if let Err(e) = conn.execute_batch(migration.sql) {
                conn.execute_batch("ROLLBACK;")?;
                return Err(StorageError::Migration(format!(
                    "Migration v{} '{}' failed: {}",
                    migration.version, migration.name, e
                )));
            }

            let applied_at = (now_millis() / 1000) as i64;
            if let Err(e) = conn.execute(
                "INSERT INTO schema_version (version, applied_at) VALUES (?1, ?2)",
                rusqlite::params![migration.version, applied_at],
            ) {
                conn.execute_batch("ROLLBACK;")?;
                return Err(StorageError::Migration(format!(
                    "Failed to record migration v{}: {}",
                    migration.version, e
                )));
            }
        }

        conn.execute_batch("COMMIT;")?;
        Ok(())
    }

    /// Current schema version, or 0 if no migrations have been applied.
    pub fn current_version(conn: &Connection) -> Result<u32, StorageError> {
        let table_exists: bool = conn.query_row(
            "SELECT COUNT(*) > 0 FROM sqlite_master WHERE type='table' AND name='schema_version'",
            [],
            |row| row.get(0),
        )?;

        if !table_exists {
            return Ok(0);
        }

        let version: Option<u32> =
            conn.query_row("SELECT MAX(version) FROM schema_version", [], |row| {
                row.get(0)
            })?;

        Ok(version.unwrap_or(0))
    }
}

/// All migrations in version order. New migrations are appended.
pub fn all_migrations() -> Vec<Migration> {
    vec![
        Migration {
            version: 1,
            name: "runs",
            sql: "CREATE TABLE runs (
                    id INTEGER PRIMARY KEY AUTOINCREMENT,
                    title TEXT,
                    start_time INTEGER NOT NULL,
                    end_time INTEGER NOT NULL,
                    distance_meters REAL NOT NULL,
                    duration_ms INTEGER NOT NULL,
                    avg_pace REAL,
                    route_json TEXT NOT NULL,
                    created_at INTEGER NOT NULL
                );
                CREATE INDEX idx_runs_start_time ON runs(start_time DESC);",
        },
        Migration {
            version: 2,
            name: "share_cache",
            sql: "CREATE TABLE share_cache (
                    key TEXT PRIMARY KEY,
                    snapshot_json TEXT NOT NULL,
                    updated_at INTEGER NOT NULL
                );",
        },
        Migration {
            version: 3,
            name: "social",
            sql: "CREATE TABLE users (
                    id TEXT PRIMARY KEY,
                    username TEXT NOT NULL,
                    total_distance_meters REAL NOT NULL DEFAULT 0,
                    total_runs INTEGER NOT NULL DEFAULT 0,
                    total_duration_ms INTEGER NOT NULL DEFAULT 0,
                    check_in_days INTEGER NOT NULL DEFAULT 0,
                    last_check_in INTEGER,
                    group_id TEXT,
                    created_at INTEGER NOT NULL
                );
                CREATE TABLE check_ins (
                    id INTEGER PRIMARY KEY AUTOINCREMENT,
                    user_id TEXT NOT NULL,
                    day_start INTEGER NOT NULL,
                    run_id INTEGER,
                    note TEXT NOT NULL DEFAULT '',
                    UNIQUE (user_id, day_start)
                );
                CREATE TABLE run_groups (
                    id TEXT PRIMARY KEY,
                    name TEXT NOT NULL,
                    description TEXT NOT NULL DEFAULT '',
                    creator_id TEXT NOT NULL,
                    member_count INTEGER NOT NULL DEFAULT 0,
                    total_distance_meters REAL NOT NULL DEFAULT 0,
                    invite_code TEXT NOT NULL UNIQUE,
                    created_at INTEGER NOT NULL
                );
                CREATE INDEX idx_users_group ON users(group_id);",
        },
    ]
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_fresh_database_reaches_latest_version() {
        let conn = Connection::open_in_memory().unwrap();
        assert_eq!(MigrationRunner::current_version(&conn).unwrap(), 0);

        let migrations = all_migrations();
        MigrationRunner::run(&conn, &migrations).unwrap();

        let latest = migrations.last().unwrap().version;
        assert_eq!(MigrationRunner::current_version(&conn).unwrap(), latest);
    }

    #[test]
    fn test_rerun_is_noop() {
        let conn = Connection::open_in_memory().unwrap();
        MigrationRunner::run(&conn, &all_migrations()).unwrap();
        MigrationRunner::run(&conn, &all_migrations()).unwrap();

        let rows: u32 = conn
            .query_row("SELECT COUNT(*) FROM schema_version", [], |row| row.get(0))
            .unwrap();
        assert_eq!(rows, all_migrations().len() as u32);
    }

    #[test]
    fn test_failed_migration_rolls_back() {
        let conn = Connection::open_in_memory().unwrap();
        let migrations = vec![
            Migration {
                version: 1,
                name: "ok",
                sql: "CREATE TABLE a (x INTEGER);",
            },
            Migration {
                version: 2,
                name: "broken",
                sql: "CREATE TABLE b (;",
            },
        ];

        let err = MigrationRunner::run(&conn, &migrations).unwrap_err();
        assert!(matches!(err, StorageError::Migration(_)));
        assert_eq!(MigrationRunner::current_version(&conn).unwrap(), 0);

        let a_exists: bool = conn
            .query_row(
                "SELECT COUNT(*) > 0 FROM sqlite_master WHERE type='table' AND name='a'",
                [],
                |row| row.get(0),
            )
            .unwrap();
        assert!(!a_exists);
    }

    #[test]
    fn test_out_of_order_rejected() {
        let conn = Connection::open_in_memory().unwrap();
        let migrations = vec![
            Migration {
                version: 2,
                name: "second",
                sql: "SELECT 1;",
            },
            Migration {
                version: 1,
                name: "first",
                sql: "SELECT 1;",
            },
        ];
        assert!(MigrationRunner::run(&conn, &migrations).is_err());
    }
}
