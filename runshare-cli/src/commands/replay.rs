//! Replay Command
//!
//! Feeds a recorded list of fixes through a tracking session and stores the
//! resulting run.

use std::fs;
use std::path::Path;
use std::time::Duration;

use anyhow::{bail, Context, Result};
use runshare_core::tracking::{format_distance, format_duration, format_pace, FixOutcome};
use runshare_core::Fix;
use tracing::debug;

use super::{open_runshare, open_sharing, wait_for_connection};
use crate::config::CliConfig;
use crate::display;

/// Longest wait for the relay to take the final updates before exiting.
const FLUSH_GRACE: Duration = Duration::from_secs(5);

/// Reads a JSON array of fixes.
pub fn load_fixes(path: &Path) -> Result<Vec<Fix>> {
    let data = fs::read(path).with_context(|| format!("reading {:?}", path))?;
    let fixes: Vec<Fix> =
        serde_json::from_slice(&data).with_context(|| format!("parsing {:?}", path))?;
    Ok(fixes)
}

/// Replays a fix file as a run.
pub async fn run(
    config: &CliConfig,
    file: &Path,
    share: bool,
    title: Option<&str>,
) -> Result<()> {
    let fixes = load_fixes(file)?;
    let (Some(first), Some(last)) = (fixes.first(), fixes.last()) else {
        bail!("No fixes in {:?}", file);
    };
    let (start_time, end_time) = (first.timestamp, last.timestamp.max(first.timestamp));

    let rs = if share {
        open_sharing(config)?
    } else {
        open_runshare(config)?
    };
    if share {
        rs.start_sharing()?;
        if config.endpoint.trim().is_empty() {
            display::warning("No endpoint configured, updates will be cached offline");
        } else if wait_for_connection(&rs).await {
            display::info("Connected to relay");
        } else {
            display::warning("Relay unreachable, updates will be cached offline");
        }
    }

    rs.start_at(start_time);
    let mut rejected = 0usize;
    for fix in &fixes {
        if let FixOutcome::Rejected(reason) = rs.on_fix_at(*fix, fix.timestamp) {
            debug!(?reason, timestamp = fix.timestamp, "fix rejected");
            rejected += 1;
        }
    }

    let Some(mut finished) = rs.stop_at(end_time)? else {
        bail!("Session did not produce a run");
    };
    if let (Some(id), Some(title)) = (finished.id, title) {
        rs.rename_run(id, Some(title))?;
        finished.title = Some(title.to_string());
    }
    if share {
        rs.shutdown_sharing(FLUSH_GRACE).await;
    }

    display::success(&format!("Run saved: {}", finished.display_title()));
    println!();
    println!("  Distance:  {}", format_distance(finished.distance_meters));
    println!("  Duration:  {}", format_duration(finished.duration_ms));
    println!("  Pace:      {}", format_pace(finished.avg_pace_min_per_km));
    println!("  Points:    {} ({} rejected)", finished.route.len(), rejected);
    println!();

    Ok(())
}
