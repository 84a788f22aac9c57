// SPDX-FileCopyrightText: 2026 Mattia Egloff <mattia.egloff@pm.me>
//
// SPDX-License-Identifier: GPL-3.0-or-later

//! Social storage operations.
//!
//! Runner profiles with aggregate stats, daily check-ins with a streak
//! counter, running groups joined by invite code, and leaderboards over
//! both. Days are UTC days.

use rusqlite::{params, Connection, OptionalExtension, Row};
use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use super::{Storage, StorageError};
use crate::tracking::FinishedRun;

/// Milliseconds in a day.
pub const DAY_MS: u64 = 86_400_000;

/// Invite code alphabet. Skips I, O, 0 and 1.
const INVITE_ALPHABET: &[u8] = b"ABCDEFGHJKLMNPQRSTUVWXYZ23456789";
const INVITE_CODE_LEN: usize = 6;
const GROUP_ID_LEN: usize = 8;
const MAX_CODE_ATTEMPTS: usize = 8;

/// Start of the UTC day containing `timestamp`.
pub fn day_start(timestamp: u64) -> u64 {
    timestamp - timestamp % DAY_MS
}

fn new_invite_code() -> String {
    // 32 symbols divide 256, so every symbol is equally likely.
    uuid::Uuid::new_v4().as_bytes()[..INVITE_CODE_LEN]
        .iter()
        .map(|b| INVITE_ALPHABET[*b as usize % INVITE_ALPHABET.len()] as char)
        .collect()
}

fn new_group_id() -> String {
    uuid::Uuid::new_v4().simple().to_string()[..GROUP_ID_LEN].to_string()
}

/// A runner and their running totals.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UserProfile {
    pub id: String,
    pub username: String,
    pub total_distance_meters: f64,
    pub total_runs: u64,
    pub total_duration_ms: u64,
    /// Consecutive days checked in, as of the last check-in.
    pub check_in_days: u32,
    /// Day start of the last check-in.
    pub last_check_in: Option<u64>,
    pub group_id: Option<String>,
    pub created_at: u64,
}

/// One daily check-in.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CheckIn {
    pub id: i64,
    pub user_id: String,
    pub day_start: u64,
    /// Run finished that day, if any.
    pub run_id: Option<i64>,
    pub note: String,
}

/// A running group.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Group {
    pub id: String,
    pub name: String,
    pub description: String,
    pub creator_id: String,
    pub member_count: u32,
    /// Distance run by members while they belonged to the group.
    pub total_distance_meters: f64,
    pub invite_code: String,
    pub created_at: u64,
}

/// Result of a check-in.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CheckInOutcome {
    /// A new check-in was recorded.
    CheckedIn { streak: u32 },
    /// The runner had already checked in today.
    AlreadyCheckedIn { streak: u32 },
}

impl CheckInOutcome {
    pub fn streak(&self) -> u32 {
        match self {
            CheckInOutcome::CheckedIn { streak } | CheckInOutcome::AlreadyCheckedIn { streak } => {
                *streak
            }
        }
    }
}

/// Leaderboard ranking key. Ties fall back to distance, then id.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LeaderboardOrder {
    #[default]
    Distance,
    Runs,
    Streak,
}

impl LeaderboardOrder {
    fn order_by(self) -> &'static str {
        match self {
            LeaderboardOrder::Distance => "total_distance_meters DESC, total_runs DESC, id",
            LeaderboardOrder::Runs => "total_runs DESC, total_distance_meters DESC, id",
            LeaderboardOrder::Streak => "check_in_days DESC, total_distance_meters DESC, id",
        }
    }
}

const USER_COLUMNS: &str = "id, username, total_distance_meters, total_runs, total_duration_ms, check_in_days, last_check_in, group_id, created_at";
const GROUP_COLUMNS: &str =
    "id, name, description, creator_id, member_count, total_distance_meters, invite_code, created_at";

fn user_from_row(row: &Row<'_>) -> rusqlite::Result<UserProfile> {
    Ok(UserProfile {
        id: row.get(0)?,
        username: row.get(1)?,
        total_distance_meters: row.get(2)?,
        total_runs: row.get::<_, i64>(3)? as u64,
        total_duration_ms: row.get::<_, i64>(4)? as u64,
        check_in_days: row.get(5)?,
        last_check_in: row.get::<_, Option<i64>>(6)?.map(|t| t as u64),
        group_id: row.get(7)?,
        created_at: row.get::<_, i64>(8)? as u64,
    })
}

fn group_from_row(row: &Row<'_>) -> rusqlite::Result<Group> {
    Ok(Group {
        id: row.get(0)?,
        name: row.get(1)?,
        description: row.get(2)?,
        creator_id: row.get(3)?,
        member_count: row.get(4)?,
        total_distance_meters: row.get(5)?,
        invite_code: row.get(6)?,
        created_at: row.get::<_, i64>(7)? as u64,
    })
}

fn find_user(conn: &Connection, id: &str) -> Result<Option<UserProfile>, StorageError> {
    Ok(conn
        .query_row(
            &format!("SELECT {USER_COLUMNS} FROM users WHERE id = ?1"),
            params![id],
            user_from_row,
        )
        .optional()?)
}

fn require_user(conn: &Connection, id: &str) -> Result<UserProfile, StorageError> {
    find_user(conn, id)?.ok_or_else(|| StorageError::NotFound(format!("user {id}")))
}

fn find_group(conn: &Connection, id: &str) -> Result<Option<Group>, StorageError> {
    Ok(conn
        .query_row(
            &format!("SELECT {GROUP_COLUMNS} FROM run_groups WHERE id = ?1"),
            params![id],
            group_from_row,
        )
        .optional()?)
}

fn require_group(conn: &Connection, id: &str) -> Result<Group, StorageError> {
    find_group(conn, id)?.ok_or_else(|| StorageError::NotFound(format!("group {id}")))
}

/// Drops the user from their group. Returns the group left, if any.
fn detach_from_group(conn: &Connection, user: &UserProfile) -> Result<Option<String>, StorageError> {
    let Some(group_id) = &user.group_id else {
        return Ok(None);
    };
    conn.execute(
        "UPDATE run_groups SET member_count = MAX(member_count - 1, 0) WHERE id = ?1",
        params![group_id],
    )?;
    conn.execute(
        "UPDATE users SET group_id = NULL WHERE id = ?1",
        params![user.id],
    )?;
    Ok(Some(group_id.clone()))
}

fn attach_to_group(conn: &Connection, user_id: &str, group_id: &str) -> Result<(), StorageError> {
    conn.execute(
        "UPDATE run_groups SET member_count = member_count + 1 WHERE id = ?1",
        params![group_id],
    )?;
    conn.execute(
        "UPDATE users SET group_id = ?1 WHERE id = ?2",
        params![group_id, user_id],
    )?;
    Ok(())
}

fn unused_invite_code(conn: &Connection) -> Result<String, StorageError> {
    for _ in 0..MAX_CODE_ATTEMPTS {
        let code = new_invite_code();
        let taken: bool = conn.query_row(
            "SELECT COUNT(*) > 0 FROM run_groups WHERE invite_code = ?1",
            params![code],
            |row| row.get(0),
        )?;
        if !taken {
            return Ok(code);
        }
    }
    Err(StorageError::InvalidInput(
        "could not allocate an invite code".to_string(),
    ))
}

/// Normalizes a typed invite code: surrounding space dropped, upper case.
pub fn normalize_invite_code(code: &str) -> String {
    code.trim().to_uppercase()
}

impl Storage {
    // === Profiles ===

    /// Creates the profile or updates its username.
    pub fn upsert_user(&self, id: &str, username: &str, now: u64) -> Result<UserProfile, StorageError> {
        let conn = self.conn();
        conn.execute(
            "INSERT INTO users (id, username, created_at) VALUES (?1, ?2, ?3)
             ON CONFLICT(id) DO UPDATE SET username = excluded.username",
            params![id, username, now as i64],
        )?;
        require_user(&conn, id)
    }

    pub fn user(&self, id: &str) -> Result<Option<UserProfile>, StorageError> {
        find_user(&self.conn(), id)
    }

    /// Adds a finished run to the user's totals and to their group's
    /// distance. Returns false when the user has no profile.
    pub fn record_run_stats(&self, user_id: &str, run: &FinishedRun) -> Result<bool, StorageError> {
        let mut conn = self.conn();
        let tx = conn.transaction()?;
        let updated = tx.execute(
            "UPDATE users SET
                total_distance_meters = total_distance_meters + ?1,
                total_runs = total_runs + 1,
                total_duration_ms = total_duration_ms + ?2
             WHERE id = ?3",
            params![run.distance_meters, run.duration_ms as i64, user_id],
        )?;
        if updated == 0 {
            return Ok(false);
        }
        tx.execute(
            "UPDATE run_groups SET total_distance_meters = total_distance_meters + ?1
             WHERE id = (SELECT group_id FROM users WHERE id = ?2)",
            params![run.distance_meters, user_id],
        )?;
        tx.commit()?;
        Ok(true)
    }

    // === Check-ins ===

    /// Checks the user in for the day containing `now`.
    ///
    /// The streak grows when the previous check-in was yesterday and
    /// restarts at 1 otherwise. A second check-in on the same day changes
    /// nothing.
    pub fn check_in(
        &self,
        user_id: &str,
        now: u64,
        run_id: Option<i64>,
        note: &str,
    ) -> Result<CheckInOutcome, StorageError> {
        let today = day_start(now);
        let mut conn = self.conn();
        let tx = conn.transaction()?;
        let user = require_user(&tx, user_id)?;

        // A clock that moved backwards counts as already checked in.
        if user.last_check_in.is_some_and(|last| last >= today) {
            return Ok(CheckInOutcome::AlreadyCheckedIn {
                streak: user.check_in_days,
            });
        }

        let streak = match user.last_check_in {
            Some(last) if last + DAY_MS >= today => user.check_in_days + 1,
            _ => 1,
        };
        tx.execute(
            "INSERT INTO check_ins (user_id, day_start, run_id, note) VALUES (?1, ?2, ?3, ?4)",
            params![user_id, today as i64, run_id, note],
        )?;
        tx.execute(
            "UPDATE users SET check_in_days = ?1, last_check_in = ?2 WHERE id = ?3",
            params![streak, today as i64, user_id],
        )?;
        tx.commit()?;
        debug!(user_id, streak, "checked in");
        Ok(CheckInOutcome::CheckedIn { streak })
    }

    /// The user's check-ins, newest first.
    pub fn check_ins(&self, user_id: &str) -> Result<Vec<CheckIn>, StorageError> {
        let conn = self.conn();
        let mut stmt = conn.prepare(
            "SELECT id, user_id, day_start, run_id, note FROM check_ins
             WHERE user_id = ?1 ORDER BY day_start DESC",
        )?;
        let rows = stmt.query_map(params![user_id], |row| {
            Ok(CheckIn {
                id: row.get(0)?,
                user_id: row.get(1)?,
                day_start: row.get::<_, i64>(2)? as u64,
                run_id: row.get(3)?,
                note: row.get(4)?,
            })
        })?;
        Ok(rows.collect::<Result<_, _>>()?)
    }

    /// Id of the most recent run that ended at or after `since`.
    pub fn latest_run_since(&self, since: u64) -> Result<Option<i64>, StorageError> {
        Ok(self
            .conn()
            .query_row(
                "SELECT id FROM runs WHERE end_time >= ?1 ORDER BY end_time DESC, id DESC LIMIT 1",
                params![since as i64],
                |row| row.get(0),
            )
            .optional()?)
    }

    // === Groups ===

    /// Creates a group with the user as its only member.
    ///
    /// A user already in another group leaves it first.
    pub fn create_group(
        &self,
        creator_id: &str,
        name: &str,
        description: &str,
        now: u64,
    ) -> Result<Group, StorageError> {
        let name = name.trim();
        if name.is_empty() {
            return Err(StorageError::InvalidInput("group name is empty".to_string()));
        }

        let mut conn = self.conn();
        let tx = conn.transaction()?;
        let creator = require_user(&tx, creator_id)?;
        detach_from_group(&tx, &creator)?;

        let group = Group {
            id: new_group_id(),
            name: name.to_string(),
            description: description.trim().to_string(),
            creator_id: creator_id.to_string(),
            member_count: 0,
            total_distance_meters: 0.0,
            invite_code: unused_invite_code(&tx)?,
            created_at: now,
        };
        tx.execute(
            &format!("INSERT INTO run_groups ({GROUP_COLUMNS}) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8)"),
            params![
                group.id,
                group.name,
                group.description,
                group.creator_id,
                group.member_count,
                group.total_distance_meters,
                group.invite_code,
                group.created_at as i64,
            ],
        )?;
        attach_to_group(&tx, creator_id, &group.id)?;
        let group = require_group(&tx, &group.id)?;
        tx.commit()?;

        info!(group_id = %group.id, "group created");
        Ok(group)
    }

    /// Joins the group with the given invite code.
    ///
    /// The code is matched case-insensitively. Joining the current group
    /// again changes nothing; joining another one leaves the current one.
    pub fn join_group(&self, user_id: &str, invite_code: &str) -> Result<Group, StorageError> {
        let code = normalize_invite_code(invite_code);
        let mut conn = self.conn();
        let tx = conn.transaction()?;
        let user = require_user(&tx, user_id)?;
        let group = tx
            .query_row(
                &format!("SELECT {GROUP_COLUMNS} FROM run_groups WHERE invite_code = ?1"),
                params![code],
                group_from_row,
            )
            .optional()?
            .ok_or_else(|| StorageError::NotFound(format!("invite code {code}")))?;

        if user.group_id.as_deref() == Some(group.id.as_str()) {
            return Ok(group);
        }

        detach_from_group(&tx, &user)?;
        attach_to_group(&tx, user_id, &group.id)?;
        let group = require_group(&tx, &group.id)?;
        tx.commit()?;

        info!(group_id = %group.id, "joined group");
        Ok(group)
    }

    /// Leaves the current group. Returns the id of the group left.
    pub fn leave_group(&self, user_id: &str) -> Result<Option<String>, StorageError> {
        let mut conn = self.conn();
        let tx = conn.transaction()?;
        let user = require_user(&tx, user_id)?;
        let left = detach_from_group(&tx, &user)?;
        tx.commit()?;
        Ok(left)
    }

    pub fn group(&self, id: &str) -> Result<Option<Group>, StorageError> {
        find_group(&self.conn(), id)
    }

    /// Members of a group, farthest first.
    pub fn group_members(&self, group_id: &str) -> Result<Vec<UserProfile>, StorageError> {
        let conn = self.conn();
        let mut stmt = conn.prepare(&format!(
            "SELECT {USER_COLUMNS} FROM users WHERE group_id = ?1 ORDER BY {}",
            LeaderboardOrder::Distance.order_by()
        ))?;
        let rows = stmt.query_map(params![group_id], user_from_row)?;
        Ok(rows.collect::<Result<_, _>>()?)
    }

    // === Leaderboards ===

    /// Top `limit` runners by the given key.
    pub fn leaderboard(
        &self,
        order: LeaderboardOrder,
        limit: usize,
    ) -> Result<Vec<UserProfile>, StorageError> {
        let conn = self.conn();
        let mut stmt = conn.prepare(&format!(
            "SELECT {USER_COLUMNS} FROM users ORDER BY {} LIMIT ?1",
            order.order_by()
        ))?;
        let rows = stmt.query_map(params![limit as i64], user_from_row)?;
        Ok(rows.collect::<Result<_, _>>()?)
    }

    /// Top `limit` groups by total distance.
    pub fn group_leaderboard(&self, limit: usize) -> Result<Vec<Group>, StorageError> {
        let conn = self.conn();
        let mut stmt = conn.prepare(&format!(
            "SELECT {GROUP_COLUMNS} FROM run_groups
             ORDER BY total_distance_meters DESC, member_count DESC, id LIMIT ?1"
        ))?;
        let rows = stmt.query_map(params![limit as i64], group_from_row)?;
        Ok(rows.collect::<Result<_, _>>()?)
    }
}
