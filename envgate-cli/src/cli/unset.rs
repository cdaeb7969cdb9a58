use anyhow::{Result, bail};
use clap::Parser;

use super::common::ClientArgs;
use crate::client;

/// Remove a variable from a group.
#[derive(Parser, Debug)]
pub struct UnsetCommand {
    #[command(flatten)]
    pub client: ClientArgs,

    /// Group the variable belongs to.
    #[arg(long)]
    pub group: String,

    /// Name of the variable to remove.
    pub name: String,
}

impl UnsetCommand {
    pub async fn run(self) -> Result<()> {
        let command_line = format!("unset {}", self.name);
        let env = [("GROUP", self.group.as_str())];
        let outcome = client::run(&self.client.addr, "w", &self.client.identity, &env, &command_line).await?;
        if !outcome.success {
            bail!("unset failed");
        }
        Ok(())
    }
}
