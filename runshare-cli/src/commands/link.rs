//! Share Link Commands

use anyhow::Result;
use runshare_core::network::ShareData;
use runshare_core::tracking::{format_distance, format_duration};

use super::{open_runshare, open_sharing};
use crate::config::CliConfig;
use crate::display;

/// Prints the live tracking link for this runner.
pub fn live(config: &CliConfig) -> Result<()> {
    let rs = open_sharing(config)?;
    println!("{}", rs.share_link());
    Ok(())
}

/// Prints a self-contained link for a stored run.
pub fn run(config: &CliConfig, id: i64) -> Result<()> {
    let rs = open_runshare(config)?;
    println!("{}", rs.run_share_link(id)?);
    Ok(())
}

/// Decodes a `runshare://share` link and summarizes its payload.
pub fn inspect(link: &str) -> Result<()> {
    let data = ShareData::from_link(link)?;

    println!();
    println!("  Kind:      {:?}", data.kind);
    println!("  Session:   {}", data.session_id);
    if let Some(run_id) = data.run_id {
        println!("  Run:       {}", run_id);
    }
    if let Some(distance) = data.distance {
        println!("  Distance:  {}", format_distance(distance));
    }
    if let Some(duration) = data.duration {
        println!("  Duration:  {}", format_duration(duration));
    }
    match &data.points {
        Some(points) => println!("  Points:    {}", points.len()),
        None => display::info("Live session link, no route attached."),
    }
    println!();
    Ok(())
}

/// Shows the snapshot last published while offline.
pub fn last_location(config: &CliConfig) -> Result<()> {
    let rs = open_runshare(config)?;
    match rs.last_offline_snapshot() {
        Some(cached) => {
            println!();
            display::display_peer(&cached.snapshot);
            println!("  Cached at: {}", cached.updated_at);
            println!();
        }
        None => display::info("No location cached offline."),
    }
    Ok(())
}
