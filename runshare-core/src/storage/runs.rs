// SPDX-FileCopyrightText: 2026 Mattia Egloff <mattia.egloff@pm.me>
//
// SPDX-License-Identifier: GPL-3.0-or-later

//! Run history storage operations.

use rusqlite::{params, OptionalExtension, Row};
use tracing::warn;

use super::{Storage, StorageError};
use crate::tracking::{FinishedRun, Fix};

/// Aggregates over all stored runs.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct RunTotals {
    pub run_count: u64,
    pub total_distance_meters: f64,
    pub total_duration_ms: u64,
}

const RUN_COLUMNS: &str = "id, title, start_time, end_time, distance_meters, duration_ms, avg_pace, route_json, created_at";

fn run_from_row(row: &Row<'_>) -> rusqlite::Result<(FinishedRun, String)> {
    let run = FinishedRun {
        id: Some(row.get(0)?),
        title: row.get(1)?,
        start_time: row.get::<_, i64>(2)? as u64,
        end_time: row.get::<_, i64>(3)? as u64,
        distance_meters: row.get(4)?,
        duration_ms: row.get::<_, i64>(5)? as u64,
        avg_pace_min_per_km: row.get(6)?,
        route: Vec::new(),
        created_at: row.get::<_, i64>(8)? as u64,
    };
    Ok((run, row.get(7)?))
}

fn with_route((mut run, route_json): (FinishedRun, String)) -> Result<FinishedRun, StorageError> {
    run.route = serde_json::from_str::<Vec<Fix>>(&route_json)?;
    Ok(run)
}

impl Storage {
    // === Run History Operations ===

    /// Saves a run and returns its id.
    ///
    /// A run that already has an id replaces the stored row.
    pub fn save_run(&self, run: &FinishedRun) -> Result<i64, StorageError> {
        let route_json = serde_json::to_string(&run.route)?;
        let conn = self.conn();
        conn.execute(
            "INSERT OR REPLACE INTO runs
             (id, title, start_time, end_time, distance_meters, duration_ms, avg_pace, route_json, created_at)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9)",
            params![
                run.id,
                run.title,
                run.start_time as i64,
                run.end_time as i64,
                run.distance_meters,
                run.duration_ms as i64,
                run.avg_pace_min_per_km,
                route_json,
                run.created_at as i64,
            ],
        )?;
        Ok(run.id.unwrap_or_else(|| conn.last_insert_rowid()))
    }

    /// Loads a run by id.
    pub fn load_run(&self, id: i64) -> Result<Option<FinishedRun>, StorageError> {
        let row = self
            .conn()
            .query_row(
                &format!("SELECT {RUN_COLUMNS} FROM runs WHERE id = ?1"),
                params![id],
                run_from_row,
            )
            .optional()?;
        row.map(with_route).transpose()
    }

    /// Lists all runs, newest start first.
    ///
    /// Rows whose route cannot be decoded are skipped.
    pub fn list_runs(&self) -> Result<Vec<FinishedRun>, StorageError> {
        let conn = self.conn();
        let mut stmt = conn.prepare(&format!(
            "SELECT {RUN_COLUMNS} FROM runs ORDER BY start_time DESC, id DESC"
        ))?;
        let rows = stmt.query_map([], run_from_row)?;

        let mut runs = Vec::new();
        for row in rows {
            let (run, route_json) = row?;
            let id = run.id;
            match with_route((run, route_json)) {
                Ok(run) => runs.push(run),
                Err(e) => warn!(?id, error = %e, "skipping unreadable run"),
            }
        }
        Ok(runs)
    }

    /// Deletes a run. Returns whether it existed.
    pub fn delete_run(&self, id: i64) -> Result<bool, StorageError> {
        let deleted = self
            .conn()
            .execute("DELETE FROM runs WHERE id = ?1", params![id])?;
        Ok(deleted > 0)
    }

    /// Sets or clears a run's title.
    pub fn update_run_title(&self, id: i64, title: Option<&str>) -> Result<(), StorageError> {
        let updated = self.conn().execute(
            "UPDATE runs SET title = ?1 WHERE id = ?2",
            params![title, id],
        )?;
        if updated == 0 {
            return Err(StorageError::NotFound(format!("run {id}")));
        }
        Ok(())
    }

    /// Count, distance and duration summed over every run.
    pub fn run_totals(&self) -> Result<RunTotals, StorageError> {
        let totals = self.conn().query_row(
            "SELECT COUNT(*), COALESCE(SUM(distance_meters), 0.0), COALESCE(SUM(duration_ms), 0) FROM runs",
            [],
            |row| {
                Ok(RunTotals {
                    run_count: row.get::<_, i64>(0)? as u64,
                    total_distance_meters: row.get(1)?,
                    total_duration_ms: row.get::<_, i64>(2)? as u64,
                })
            },
        )?;
        Ok(totals)
    }
}
