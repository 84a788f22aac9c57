//! CLI Commands

pub mod history;
pub mod identity;
pub mod init;
pub mod link;
pub mod replay;
pub mod social;
pub mod watch;

use std::time::Duration;

use anyhow::Result;
use runshare_core::network::ConnectionState;
use runshare_core::{RunShare, RunShareConfig};
use tokio::time::timeout;

use crate::config::{CliConfig, Identity};

/// How long sharing commands wait for the relay before continuing offline.
const CONNECT_WAIT: Duration = Duration::from_secs(10);

/// Opens RunShare on the CLI data directory for local work.
///
/// Does not create an identity; history and cache access need none.
pub(crate) fn open_runshare(config: &CliConfig) -> Result<RunShare> {
    let mut rs_config = base_config(config)?;
    if config.is_initialized() {
        let Identity { user_id, name } = config.resolve_identity()?;
        rs_config = rs_config.with_identity(user_id, name);
    }
    Ok(RunShare::new(rs_config)?)
}

/// Opens RunShare with a stable identity, creating one on first use.
pub(crate) fn open_sharing(config: &CliConfig) -> Result<RunShare> {
    let Identity { user_id, name } = config.resolve_identity()?;
    let rs_config = base_config(config)?.with_identity(user_id, name);
    Ok(RunShare::new(rs_config)?)
}

fn base_config(config: &CliConfig) -> Result<RunShareConfig> {
    std::fs::create_dir_all(&config.data_dir)?;
    Ok(RunShareConfig::with_storage_path(config.storage_path()).with_endpoint(&config.endpoint))
}

/// Waits until the relay connection is up. Returns false on timeout.
pub(crate) async fn wait_for_connection(rs: &RunShare) -> bool {
    let mut state = rs.sharing().watch_connection();
    let connected = matches!(
        timeout(
            CONNECT_WAIT,
            state.wait_for(|state| *state == ConnectionState::Connected),
        )
        .await,
        Ok(Ok(_))
    );
    connected
}
