//! Init Command
//!
//! Creates the local runner identity.

use anyhow::Result;

use super::open_runshare;
use crate::config::CliConfig;
use crate::display;

/// Creates a new identity and its runner profile.
pub fn run(name: &str, config: &CliConfig) -> Result<()> {
    let identity = config.create_identity(name)?;
    open_runshare(config)?.profile()?;

    display::success(&format!("Identity created: {}", identity.name));
    println!();
    println!("  User ID:   {}", identity.user_id);
    println!("  Data dir:  {:?}", config.data_dir);
    println!();
    display::info("Record a run with: runshare replay <fixes.json>");

    Ok(())
}
