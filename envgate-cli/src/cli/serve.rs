use std::net::SocketAddr;
use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{Context, Result};
use clap::Parser;
use tokio::signal;
use tracing::info;

use envgate_auth::AuthRegistry;
use envgate_crypto::{Cryptor, Key};
use envgate_server::{EnvgateServer, load_host_key};
use envgate_store::RedisStore;

/// Run the daemon: bootstrap authorization, bind the SSH listener, and
/// serve until interrupted.
#[derive(Parser, Debug)]
pub struct ServeCommand {
    /// Address to bind the SSH listener on.
    #[arg(long, default_value = "0.0.0.0:2222")]
    pub listen: SocketAddr,

    /// OpenSSH-formatted host private key.
    #[arg(long)]
    pub host_key: PathBuf,

    /// Base64-encoded 160-octet encryption key file (mode 0600 or 0400).
    #[arg(long)]
    pub key_file: PathBuf,

    /// Redis connection string backing the variable store.
    #[arg(long)]
    pub store_url: String,

    /// URL returning the JSON array of writer authorized-keys lines.
    #[arg(long)]
    pub writers_url: String,

    /// URL returning the JSON array of register-role authorized-keys lines.
    #[arg(long)]
    pub register_url: String,
}

impl ServeCommand {
    pub async fn run(self) -> Result<()> {
        let host_key = load_host_key(&self.host_key)
            .with_context(|| format!("loading host key {}", self.host_key.display()))?;

        let key = Key::from_file(&self.key_file)
            .with_context(|| format!("loading encryption key {}", self.key_file.display()))?;
        let cryptor = Arc::new(Cryptor::new(key));

        let store = Arc::new(
            RedisStore::connect(&self.store_url)
                .await
                .context("connecting to the variable store")?,
        );

        let auth = Arc::new(
            AuthRegistry::new(store.clone(), cryptor.clone())
                .await
                .context("loading the persisted reader map")?,
        );
        auth.load_writers_from_url(&self.writers_url)
            .await
            .context("bootstrapping writer keys")?;
        auth.load_register_from_url(&self.register_url)
            .await
            .context("bootstrapping register keys")?;

        let server = EnvgateServer::new(host_key, store, cryptor, auth);
        server
            .listen(self.listen)
            .await
            .context("binding the ssh listener")?;
        info!(addr = %self.listen, "envgate server ready");

        signal::ctrl_c().await.context("waiting for ctrl-c")?;
        info!("shutting down");
        server.stop().await;

        Ok(())
    }
}
