use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::Parser;
use envgate_crypto::Key;
use tracing::info;

/// Generate a fresh 160-octet encryption key and write it, base64-encoded
/// with mode 0600, to a file — the out-of-band bootstrap step the server
/// expects before its first run.
#[derive(Parser, Debug)]
pub struct KeygenCommand {
    /// Where to write the new key file.
    #[arg(long)]
    pub out: PathBuf,
}

impl KeygenCommand {
    pub async fn run(self) -> Result<()> {
        let key = Key::generate();
        key.to_file(&self.out)
            .with_context(|| format!("writing key file {}", self.out.display()))?;
        info!(path = %self.out.display(), "wrote encryption key");
        Ok(())
    }
}
