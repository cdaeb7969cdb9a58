use std::path::PathBuf;

use clap::Parser;

/// Connection details shared by every client subcommand.
#[derive(Parser, Debug)]
pub struct ClientArgs {
    /// Daemon address, e.g. `127.0.0.1:2222`.
    #[arg(long)]
    pub addr: String,

    /// Private key identifying this client to the daemon.
    #[arg(long)]
    pub identity: PathBuf,
}
