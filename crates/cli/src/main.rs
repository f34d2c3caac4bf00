//! pairsync: two-host directory mirroring
//!
//! Watches one directory tree and mirrors whole-file content changes to a
//! single peer over a persistent TCP connection, in both directions. One
//! side listens, the other dials; after the handshake the connection is
//! fully symmetric.

use std::path::PathBuf;

use clap::builder::styling::{AnsiColor, Effects};
use clap::{builder::Styles, Parser, Subcommand};
use color_eyre::Result;
use tracing::info;

use pairsync_core::Config;
use pairsync_engine::SyncSession;
use pairsync_transport::net;

const STYLES: Styles = Styles::styled()
    .header(AnsiColor::Green.on_default().effects(Effects::BOLD))
    .usage(AnsiColor::Green.on_default().effects(Effects::BOLD))
    .literal(AnsiColor::Cyan.on_default().effects(Effects::BOLD))
    .placeholder(AnsiColor::Cyan.on_default())
    .valid(AnsiColor::Green.on_default())
    .invalid(AnsiColor::Red.on_default());

#[derive(Parser)]
#[command(name = "pairsync")]
#[command(version)]
#[command(styles = STYLES)]
#[command(about = "Mirror one directory between two hosts over a single TCP connection")]
#[command(long_about = r#"
pairsync keeps one directory tree identical on two hosts.

One side listens, the other dials; after that the connection is symmetric:
every local content change is pushed to the peer as a whole-file snapshot,
and incoming snapshots that match local content are suppressed so edits
never bounce.

Examples:
  pairsync listen ./project --port 7070        Wait for one peer
  pairsync connect ./project build-box:7070    Dial the listener
"#)]
struct Cli {
    /// Enable verbose logging
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Listen for one peer, then mirror the directory
    Listen {
        /// Directory to mirror
        root: PathBuf,

        /// Port to listen on
        #[arg(short, long, default_value = "7070")]
        port: u16,
    },

    /// Connect to a listening peer, then mirror the directory
    Connect {
        /// Directory to mirror
        root: PathBuf,

        /// Peer address (host:port)
        peer: String,
    },
}

fn main() -> Result<()> {
    color_eyre::install()?;

    let cli = Cli::parse();

    let filter = if cli.verbose { "debug" } else { "info" };
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .init();

    let (root, stream) = match cli.command {
        Commands::Listen { root, port } => (root, net::listen(port)?),
        Commands::Connect { root, peer } => (root, net::dial(&peer)?),
    };

    std::fs::create_dir_all(&root)?;
    let config = Config::load(&root)?;

    let session = SyncSession::start(&root, stream, &config)?;
    info!("Mirroring {}", root.display());

    session.wait();
    info!("Peer disconnected, shutting down");
    session.shutdown();
    Ok(())
}
