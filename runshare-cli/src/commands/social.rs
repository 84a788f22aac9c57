//! Social Commands
//!
//! Daily check-in, running groups and leaderboards.

use anyhow::Result;
use runshare_core::storage::{CheckInOutcome, LeaderboardOrder};

use super::open_sharing;
use crate::config::CliConfig;
use crate::display;

/// Checks in for today.
pub fn check_in(config: &CliConfig, note: &str) -> Result<()> {
    let rs = open_sharing(config)?;
    match rs.check_in(note)? {
        CheckInOutcome::CheckedIn { streak } => {
            display::success(&format!("Checked in. Streak: {}", days(streak)))
        }
        CheckInOutcome::AlreadyCheckedIn { streak } => {
            display::info(&format!("Already checked in today. Streak: {}", days(streak)))
        }
    }
    Ok(())
}

fn days(n: u32) -> String {
    if n == 1 {
        "1 day".to_string()
    } else {
        format!("{} days", n)
    }
}

/// Creates a group and prints its invite code.
pub fn create_group(config: &CliConfig, name: &str, description: &str) -> Result<()> {
    let rs = open_sharing(config)?;
    let group = rs.create_group(name, description)?;

    display::success(&format!("Group created: {}", group.name));
    println!();
    println!("  Invite code:  {}", group.invite_code);
    println!();
    display::info("Friends join with: runshare group join <code>");
    Ok(())
}

pub fn join_group(config: &CliConfig, code: &str) -> Result<()> {
    let rs = open_sharing(config)?;
    let group = rs.join_group(code)?;
    display::success(&format!(
        "Joined {} ({} members)",
        group.name, group.member_count
    ));
    Ok(())
}

pub fn leave_group(config: &CliConfig) -> Result<()> {
    let rs = open_sharing(config)?;
    let group = rs.leave_group()?;
    display::success(&format!("Left {}", group.name));
    Ok(())
}

/// Shows the current group and its members.
pub fn show_group(config: &CliConfig) -> Result<()> {
    let rs = open_sharing(config)?;
    let Some((group, members)) = rs.my_group()? else {
        display::info("Not in a group. Create one with:");
        println!("  runshare group create <name>");
        return Ok(());
    };

    println!();
    display::display_group(&group);
    println!();
    display::display_leaderboard(&members, LeaderboardOrder::Distance);
    println!();
    Ok(())
}

/// Prints the runner or group leaderboard.
pub fn leaderboard(
    config: &CliConfig,
    order: LeaderboardOrder,
    groups: bool,
    limit: usize,
) -> Result<()> {
    let rs = open_sharing(config)?;
    rs.profile()?;

    println!();
    if groups {
        let groups = rs.group_leaderboard(limit)?;
        if groups.is_empty() {
            display::info("No groups yet.");
        } else {
            display::display_group_leaderboard(&groups);
        }
    } else {
        display::display_leaderboard(&rs.leaderboard(order, limit)?, order);
    }
    println!();
    Ok(())
}
