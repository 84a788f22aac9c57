//! Watch Command
//!
//! Follows friends' live locations until interrupted.

use anyhow::{bail, Result};
use runshare_core::network::ConnectionState;
use runshare_core::PeerSnapshot;

use super::open_sharing;
use crate::config::CliConfig;
use crate::display;

/// Subscribes to the given peers and prints their updates until Ctrl-C.
pub async fn run(config: &CliConfig, peers: &[String]) -> Result<()> {
    if peers.is_empty() {
        bail!("Name at least one friend ID to watch");
    }

    if config.endpoint.trim().is_empty() {
        bail!("No relay endpoint configured. Use --endpoint or RUNSHARE_ENDPOINT.");
    }

    let rs = open_sharing(config)?;
    for peer in peers {
        rs.subscribe(peer.as_str());
    }
    rs.start_sharing()?;
    display::info(&format!("Watching {} friend(s). Press Ctrl-C to stop.", peers.len()));

    let mut table = rs.watch_peers();
    let mut connection = rs.sharing().watch_connection();
    let ctrl_c = tokio::signal::ctrl_c();
    tokio::pin!(ctrl_c);
    loop {
        tokio::select! {
            _ = &mut ctrl_c => break,
            changed = connection.changed() => {
                if changed.is_err() {
                    break;
                }
                match *connection.borrow_and_update() {
                    ConnectionState::Connected => display::success("Connected to relay"),
                    ConnectionState::Connecting => display::info("Connecting..."),
                    ConnectionState::Disconnected => display::warning("Disconnected"),
                }
            }
            changed = table.changed() => {
                if changed.is_err() {
                    break;
                }
                let peers: Vec<PeerSnapshot> =
                    table.borrow_and_update().sorted().into_iter().cloned().collect();
                for peer in &peers {
                    display::display_peer(peer);
                }
            }
        }
    }

    rs.stop_sharing();
    println!();
    display::info("Stopped watching");
    Ok(())
}
