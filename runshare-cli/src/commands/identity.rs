//! Identity Commands

use anyhow::Result;

use super::open_runshare;
use crate::config::CliConfig;
use crate::display;

/// Shows the local identity.
pub fn show(config: &CliConfig) -> Result<()> {
    let identity = config.resolve_identity()?;

    println!();
    println!("  Name:      {}", identity.name);
    println!("  User ID:   {}", identity.user_id);
    println!("  Endpoint:  {}", config.endpoint);
    println!();

    Ok(())
}

/// Changes the display name peers see.
pub fn rename(config: &CliConfig, name: &str) -> Result<()> {
    let identity = config.rename_identity(name)?;
    open_runshare(config)?.profile()?;
    display::success(&format!("Display name set to {}", identity.name));
    Ok(())
}
