use anyhow::{Result, bail};
use clap::Parser;

use super::common::ClientArgs;
use crate::client;

/// Bootstrap a host-bound reader key: connects as the register role and
/// prints the freshly issued PEM private key to standard output.
#[derive(Parser, Debug)]
pub struct RegisterCommand {
    #[command(flatten)]
    pub client: ClientArgs,
}

impl RegisterCommand {
    pub async fn run(self) -> Result<()> {
        let outcome = client::run(&self.client.addr, "x", &self.client.identity, &[], "register").await?;
        if !outcome.success {
            bail!("register command failed");
        }
        print!("{}", String::from_utf8_lossy(&outcome.stdout));
        Ok(())
    }
}
