use anyhow::Result;
use clap::{Parser, Subcommand};

mod common;
mod env;
mod export;
mod keygen;
mod register;
mod serve;
mod unset;

pub use env::EnvCommand;
pub use export::ExportCommand;
pub use keygen::KeygenCommand;
pub use register::RegisterCommand;
pub use serve::ServeCommand;
pub use unset::UnsetCommand;

#[derive(Parser, Debug)]
#[command(name = "envgate")]
#[command(about = "Encrypted, grouped environment-variable distribution over SSH")]
pub struct Args {
    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Run the daemon.
    Serve(ServeCommand),
    /// Generate a fresh encryption key file.
    Keygen(KeygenCommand),
    /// Bootstrap a host-bound reader key (register role).
    Register(RegisterCommand),
    /// Set a variable (writer role).
    Export(ExportCommand),
    /// Remove a variable (writer role).
    Unset(UnsetCommand),
    /// Print a group's variables (reader role).
    Env(EnvCommand),
}

impl Args {
    pub async fn run(self) -> Result<()> {
        match self.command {
            Command::Serve(cmd) => cmd.run().await,
            Command::Keygen(cmd) => cmd.run().await,
            Command::Register(cmd) => cmd.run().await,
            Command::Export(cmd) => cmd.run().await,
            Command::Unset(cmd) => cmd.run().await,
            Command::Env(cmd) => cmd.run().await,
        }
    }
}
