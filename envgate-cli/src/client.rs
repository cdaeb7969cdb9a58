use std::path::Path;
use std::sync::Arc;

use anyhow::{Context, Result, bail};
use russh::ChannelMsg;
use russh::client;
use russh_keys::key::PublicKey;

/**
    The companion client's `russh::client::Handler`. Its only job is host
    key verification; this tool trusts whatever key the daemon presents,
    since it is a hands-on operator utility rather than an unattended
    agent — a deployment that needs host-key pinning should wrap this in
    its own `known_hosts` check before calling [`run`].
*/
struct TrustingHandler;

impl client::Handler for TrustingHandler {
    type Error = russh::Error;

    async fn check_server_key(&mut self, _server_public_key: &PublicKey) -> Result<bool, Self::Error> {
        Ok(true)
    }
}

/// What came back over the `exec` channel: whatever the command wrote to
/// standard output, and whether the exit-status request reported success.
pub struct ClientOutcome {
    pub stdout: Vec<u8>,
    pub success: bool,
}

/**
    Connect as `user` using the private key at `identity_path`, send one
    `env` request per `(name, value)` pair in `env`, then `exec` one
    command line and collect its output and exit status. Mirrors, from
    the client side, exactly the wire shape the session engine
    (`envgate-server`) expects: a public-key-authenticated session
    channel, zero or more `env` requests, then a single `exec`.
*/
pub async fn run(
    addr: &str,
    user: &str,
    identity_path: &Path,
    env: &[(&str, &str)],
    command_line: &str,
) -> Result<ClientOutcome> {
    let key_pair = russh_keys::load_secret_key(identity_path, None)
        .with_context(|| format!("loading identity key {}", identity_path.display()))?;

    let config = Arc::new(client::Config::default());
    let mut session = client::connect(config, addr, TrustingHandler)
        .await
        .with_context(|| format!("connecting to {addr}"))?;

    let authenticated = session
        .authenticate_publickey(user, Arc::new(key_pair))
        .await
        .context("ssh public-key authentication")?;
    if !authenticated {
        bail!("authentication rejected for user {user:?} at {addr}");
    }

    let mut channel = session.channel_open_session().await?;

    for (name, value) in env {
        channel.set_env(true, name, value).await?;
    }

    channel.exec(true, command_line.as_bytes()).await?;

    let mut stdout = Vec::new();
    let mut success = false;

    while let Some(msg) = channel.wait().await {
        match msg {
            ChannelMsg::Data { data } => stdout.extend_from_slice(&data),
            ChannelMsg::ExitStatus { exit_status } => success = exit_status == 0,
            ChannelMsg::Eof | ChannelMsg::Close => break,
            _ => {}
        }
    }

    let _ = session
        .disconnect(russh::Disconnect::ByApplication, "", "en")
        .await;

    Ok(ClientOutcome { stdout, success })
}
