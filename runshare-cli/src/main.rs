//! RunShare CLI
//!
//! Command-line interface for RunShare - run tracking with live location
//! sharing.

mod commands;
mod config;
mod display;

use std::path::PathBuf;

use anyhow::Result;
use clap::{Parser, Subcommand, ValueEnum};
use runshare_core::storage::LeaderboardOrder;
use tracing_subscriber::EnvFilter;

use config::CliConfig;

#[derive(Parser)]
#[command(name = "runshare")]
#[command(version, about = "Run tracking with live location sharing")]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Data directory (default: ~/.runshare)
    #[arg(long, global = true)]
    data_dir: Option<PathBuf>,

    /// Relay endpoint; leave empty to stay offline
    #[arg(long, global = true, env = "RUNSHARE_ENDPOINT", default_value = "")]
    endpoint: String,

    /// User ID announced to the relay (default: stored identity)
    #[arg(long, global = true, env = "RUNSHARE_USER_ID")]
    user_id: Option<String>,

    /// Display name announced to the relay (default: stored identity)
    #[arg(long, global = true, env = "RUNSHARE_USERNAME")]
    name: Option<String>,
}

#[derive(Subcommand)]
enum Commands {
    /// Create the local runner identity
    Init {
        /// Your display name
        name: String,
    },

    /// Show or change the local identity
    #[command(subcommand)]
    Identity(IdentityCommands),

    /// Replay a recorded fix file as a run
    Replay {
        /// JSON array of fixes
        file: PathBuf,

        /// Publish the session to the relay while replaying
        #[arg(long)]
        share: bool,

        /// Title for the saved run
        #[arg(long)]
        title: Option<String>,
    },

    /// Browse stored runs
    #[command(subcommand)]
    History(HistoryCommands),

    /// Print share links
    Link {
        #[command(subcommand)]
        command: Option<LinkCommands>,
    },

    /// Show the location cached while offline
    LastLocation,

    /// Follow friends' live locations
    Watch {
        /// Friend user IDs
        #[arg(required = true)]
        peers: Vec<String>,
    },

    /// Check in for today
    Checkin {
        /// Optional note
        #[arg(long, default_value = "")]
        note: String,
    },

    /// Manage your running group
    Group {
        #[command(subcommand)]
        command: Option<GroupCommands>,
    },

    /// Rank runners or groups
    Leaderboard {
        /// Ranking key
        #[arg(long, value_enum, default_value_t = RankBy::Distance)]
        by: RankBy,

        /// Rank groups by distance instead of runners
        #[arg(long)]
        groups: bool,

        /// Maximum rows
        #[arg(long, default_value_t = 50)]
        limit: usize,
    },
}

#[derive(Subcommand)]
enum GroupCommands {
    /// Show your group (default)
    Show,

    /// Create a group and join it
    Create {
        /// Group name
        name: String,
        /// Short description
        #[arg(long, default_value = "")]
        description: String,
    },

    /// Join a group by invite code
    Join {
        /// Six-character invite code
        code: String,
    },

    /// Leave your group
    Leave,
}

#[derive(Clone, Copy, ValueEnum)]
enum RankBy {
    Distance,
    Runs,
    Streak,
}

impl From<RankBy> for LeaderboardOrder {
    fn from(by: RankBy) -> Self {
        match by {
            RankBy::Distance => LeaderboardOrder::Distance,
            RankBy::Runs => LeaderboardOrder::Runs,
            RankBy::Streak => LeaderboardOrder::Streak,
        }
    }
}

#[derive(Subcommand)]
enum IdentityCommands {
    /// Show name and user ID
    Show,

    /// Change the display name
    Rename {
        /// New display name
        name: String,
    },
}

#[derive(Subcommand)]
enum HistoryCommands {
    /// List stored runs
    List,

    /// Show one run
    Show {
        /// Run ID
        id: i64,
    },

    /// Set or clear a run title
    Rename {
        /// Run ID
        id: i64,
        /// New title (omit to clear)
        title: Option<String>,
    },

    /// Delete a run
    Delete {
        /// Run ID
        id: i64,
    },

    /// Totals over all runs
    Stats,
}

#[derive(Subcommand)]
enum LinkCommands {
    /// Live tracking link (default)
    Live,

    /// Self-contained link for a stored run
    Run {
        /// Run ID
        id: i64,
    },

    /// Decode a runshare://share link
    Inspect {
        /// Link to decode
        link: String,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("runshare=info"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();

    // Resolve data directory
    let data_dir = cli.data_dir.unwrap_or_else(|| {
        dirs::home_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join(".runshare")
    });

    let config = CliConfig {
        data_dir,
        endpoint: cli.endpoint,
        user_id: cli.user_id,
        name: cli.name,
    };

    let result = match cli.command {
        Commands::Init { name } => commands::init::run(&name, &config),
        Commands::Identity(cmd) => match cmd {
            IdentityCommands::Show => commands::identity::show(&config),
            IdentityCommands::Rename { name } => commands::identity::rename(&config, &name),
        },
        Commands::Replay { file, share, title } => {
            commands::replay::run(&config, &file, share, title.as_deref()).await
        }
        Commands::History(cmd) => match cmd {
            HistoryCommands::List => commands::history::list(&config),
            HistoryCommands::Show { id } => commands::history::show(&config, id),
            HistoryCommands::Rename { id, title } => {
                commands::history::rename(&config, id, title.as_deref())
            }
            HistoryCommands::Delete { id } => commands::history::delete(&config, id),
            HistoryCommands::Stats => commands::history::stats(&config),
        },
        Commands::Link { command } => match command.unwrap_or(LinkCommands::Live) {
            LinkCommands::Live => commands::link::live(&config),
            LinkCommands::Run { id } => commands::link::run(&config, id),
            LinkCommands::Inspect { link } => commands::link::inspect(&link),
        },
        Commands::LastLocation => commands::link::last_location(&config),
        Commands::Watch { peers } => commands::watch::run(&config, &peers).await,
        Commands::Checkin { note } => commands::social::check_in(&config, &note),
        Commands::Group { command } => match command.unwrap_or(GroupCommands::Show) {
            GroupCommands::Show => commands::social::show_group(&config),
            GroupCommands::Create { name, description } => {
                commands::social::create_group(&config, &name, &description)
            }
            GroupCommands::Join { code } => commands::social::join_group(&config, &code),
            GroupCommands::Leave => commands::social::leave_group(&config),
        },
        Commands::Leaderboard { by, groups, limit } => {
            commands::social::leaderboard(&config, by.into(), groups, limit)
        }
    };

    if let Err(err) = result {
        display::error(&format!("{:#}", err));
        std::process::exit(1);
    }
    Ok(())
}
