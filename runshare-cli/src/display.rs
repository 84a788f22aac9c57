//! Display Helpers
//!
//! Styled terminal output and tables.

use console::style;
use runshare_core::tracking::{format_distance, format_duration, format_pace};
use runshare_core::storage::{Group, LeaderboardOrder, UserProfile};
use runshare_core::{FinishedRun, PeerSnapshot};
use tabled::settings::Style;
use tabled::{Table, Tabled};

pub fn success(msg: &str) {
    println!("{} {}", style("✓").green().bold(), msg);
}

pub fn info(msg: &str) {
    println!("{} {}", style("→").cyan(), msg);
}

pub fn warning(msg: &str) {
    eprintln!("{} {}", style("!").yellow().bold(), msg);
}

pub fn error(msg: &str) {
    eprintln!("{} {}", style("✗").red().bold(), msg);
}

#[derive(Tabled)]
struct RunRow {
    #[tabled(rename = "ID")]
    id: String,
    #[tabled(rename = "Title")]
    title: String,
    #[tabled(rename = "Distance")]
    distance: String,
    #[tabled(rename = "Duration")]
    duration: String,
    #[tabled(rename = "Pace")]
    pace: String,
}

/// Prints stored runs as a table.
pub fn display_runs_table(runs: &[FinishedRun]) {
    let rows = runs.iter().map(|run| RunRow {
        id: run.id.map(|id| id.to_string()).unwrap_or_default(),
        title: run.display_title(),
        distance: format_distance(run.distance_meters),
        duration: format_duration(run.duration_ms),
        pace: format_pace(run.avg_pace_min_per_km),
    });
    let mut table = Table::new(rows);
    table.with(Style::rounded());
    println!("{}", table);
}

/// Prints the summary of a single run.
pub fn display_run_details(run: &FinishedRun) {
    println!("{}", style(run.display_title()).bold());
    if let Some(id) = run.id {
        println!("  ID:        {}", id);
    }
    println!("  Distance:  {}", format_distance(run.distance_meters));
    println!("  Duration:  {}", format_duration(run.duration_ms));
    println!("  Pace:      {}", format_pace(run.avg_pace_min_per_km));
    println!("  Points:    {}", run.route.len());
}

/// One line per peer update.
pub fn display_peer(peer: &PeerSnapshot) {
    let status = if peer.is_active {
        style("running").green()
    } else {
        style("idle").dim()
    };
    println!(
        "{} [{}] {:.5}, {:.5}  {}  {}",
        style(&peer.display_name).bold(),
        status,
        peer.last_fix.latitude,
        peer.last_fix.longitude,
        format_distance(peer.distance_meters),
        format_duration(peer.duration_ms),
    );
}

#[derive(Tabled)]
struct RankRow {
    #[tabled(rename = "#")]
    rank: usize,
    #[tabled(rename = "Runner")]
    name: String,
    #[tabled(rename = "Distance")]
    distance: String,
    #[tabled(rename = "Runs")]
    runs: u64,
    #[tabled(rename = "Streak")]
    streak: u32,
}

/// Prints runners ranked by `order`, highlighting the ranking column.
pub fn display_leaderboard(profiles: &[UserProfile], order: LeaderboardOrder) {
    let rows = profiles.iter().enumerate().map(|(i, p)| RankRow {
        rank: i + 1,
        name: p.username.clone(),
        distance: format_distance(p.total_distance_meters),
        runs: p.total_runs,
        streak: p.check_in_days,
    });
    let mut table = Table::new(rows);
    table.with(Style::rounded());
    let key = match order {
        LeaderboardOrder::Distance => "distance",
        LeaderboardOrder::Runs => "runs",
        LeaderboardOrder::Streak => "streak",
    };
    println!("{} {}", style("Ranked by").dim(), style(key).bold());
    println!("{}", table);
}

#[derive(Tabled)]
struct GroupRow {
    #[tabled(rename = "#")]
    rank: usize,
    #[tabled(rename = "Group")]
    name: String,
    #[tabled(rename = "Members")]
    members: u32,
    #[tabled(rename = "Distance")]
    distance: String,
}

pub fn display_group_leaderboard(groups: &[Group]) {
    let rows = groups.iter().enumerate().map(|(i, g)| GroupRow {
        rank: i + 1,
        name: g.name.clone(),
        members: g.member_count,
        distance: format_distance(g.total_distance_meters),
    });
    let mut table = Table::new(rows);
    table.with(Style::rounded());
    println!("{}", table);
}

/// Prints a group's summary.
pub fn display_group(group: &Group) {
    println!("{}", style(&group.name).bold());
    if !group.description.is_empty() {
        println!("  {}", group.description);
    }
    println!("  Invite code:  {}", group.invite_code);
    println!("  Members:      {}", group.member_count);
    println!("  Distance:     {}", format_distance(group.total_distance_meters));
}
