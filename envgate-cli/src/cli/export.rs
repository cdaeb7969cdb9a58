use anyhow::{Result, bail};
use clap::Parser;

use super::common::ClientArgs;
use crate::client;

/// Set a variable: `export NAME=VALUE`, or `export NAME` to take the
/// value from this process's own environment.
#[derive(Parser, Debug)]
pub struct ExportCommand {
    #[command(flatten)]
    pub client: ClientArgs,

    /// Group the variable belongs to.
    #[arg(long)]
    pub group: String,

    /// `NAME=VALUE`, or bare `NAME`.
    pub assignment: String,
}

impl ExportCommand {
    pub async fn run(self) -> Result<()> {
        let mut env = vec![("GROUP", self.group.as_str())];

        // Bare `NAME` pulls its value from this process's environment, so
        // the channel needs that value present under the same name for
        // the daemon's "value drawn from channel env" fallback to find it.
        let local_value = std::env::var(&self.assignment).unwrap_or_default();
        if !self.assignment.contains('=') {
            env.push((self.assignment.as_str(), local_value.as_str()));
        }

        let command_line = format!("export {}", self.assignment);
        let outcome = client::run(&self.client.addr, "w", &self.client.identity, &env, &command_line).await?;
        if !outcome.success {
            bail!("export failed");
        }
        Ok(())
    }
}
