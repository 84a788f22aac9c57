//! History Commands
//!
//! List, view, rename and delete stored runs.

use anyhow::{bail, Result};
use runshare_core::tracking::{format_distance, format_duration};

use super::open_runshare;
use crate::config::CliConfig;
use crate::display;

/// Lists stored runs, newest first.
pub fn list(config: &CliConfig) -> Result<()> {
    let rs = open_runshare(config)?;
    let runs = rs.runs()?;

    if runs.is_empty() {
        display::info("No runs yet. Record one with:");
        println!("  runshare replay <fixes.json>");
        return Ok(());
    }

    println!();
    println!("Runs ({}):", runs.len());
    println!();
    display::display_runs_table(&runs);
    println!();

    Ok(())
}

/// Shows a single run.
pub fn show(config: &CliConfig, id: i64) -> Result<()> {
    let rs = open_runshare(config)?;
    let run = rs.run(id)?;

    println!();
    display::display_run_details(&run);
    println!();

    Ok(())
}

/// Sets or clears a run title.
pub fn rename(config: &CliConfig, id: i64, title: Option<&str>) -> Result<()> {
    let rs = open_runshare(config)?;
    rs.rename_run(id, title)?;

    match title {
        Some(title) => display::success(&format!("Run {} renamed to {}", id, title)),
        None => display::success(&format!("Title cleared for run {}", id)),
    }
    Ok(())
}

/// Deletes a run.
pub fn delete(config: &CliConfig, id: i64) -> Result<()> {
    let rs = open_runshare(config)?;
    if !rs.delete_run(id)? {
        bail!("Run {} not found", id);
    }
    display::success(&format!("Run {} deleted", id));
    Ok(())
}

/// Prints totals over all stored runs.
pub fn stats(config: &CliConfig) -> Result<()> {
    let rs = open_runshare(config)?;
    let totals = rs.run_totals()?;

    println!();
    println!("  Runs:      {}", totals.run_count);
    println!("  Distance:  {}", format_distance(totals.total_distance_meters));
    println!("  Time:      {}", format_duration(totals.total_duration_ms));
    println!();

    Ok(())
}
