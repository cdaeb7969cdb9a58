use anyhow::Result;
use clap::Parser;

use super::common::ClientArgs;
use crate::client;

/// Print every variable in a group as `NAME=value` lines, as the reader
/// role. This is the piece the `exec` process-launch wrapper (out of
/// scope for this crate's core) would parse to populate a child
/// process's environment.
#[derive(Parser, Debug)]
pub struct EnvCommand {
    #[command(flatten)]
    pub client: ClientArgs,

    /// Group to read variables from.
    #[arg(long)]
    pub group: String,
}

impl EnvCommand {
    pub async fn run(self) -> Result<()> {
        let env = [("GROUP", self.group.as_str())];
        let outcome = client::run(&self.client.addr, "r", &self.client.identity, &env, "env").await?;
        print!("{}", String::from_utf8_lossy(&outcome.stdout));
        if !outcome.success {
            std::process::exit(1);
        }
        Ok(())
    }
}
