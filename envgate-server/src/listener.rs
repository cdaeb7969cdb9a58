use std::borrow::Cow;
use std::net::SocketAddr;
use std::path::Path;
use std::sync::Arc;

use russh::MethodSet;
use russh::server::Config as RusshConfig;
use russh_keys::key::KeyPair;
use tokio::net::TcpListener;
use tokio::sync::{Mutex, watch};
use tracing::{info, warn};

use envgate_auth::AuthRegistry;
use envgate_crypto::Cryptor;
use envgate_store::VariableStore;

use crate::error::{ServerError, ServerResult};
use crate::handler::{ConnectionHandler, Shared};

/// Advertised SSH transport algorithms, restricted to `aes256-ctr`/
/// `hmac-sha1` to match the deployed service's observable wire contract.
/// A modern deployment SHOULD broaden this list.
fn restricted_preference() -> russh::Preferred {
    russh::Preferred {
        cipher: Cow::Borrowed(&[russh::cipher::AES_256_CTR]),
        mac: Cow::Borrowed(&[russh::mac::HMAC_SHA1]),
        ..Default::default()
    }
}

/// Load the single OpenSSH-formatted host private key the server signs
/// the handshake with.
pub fn load_host_key(path: impl AsRef<Path>) -> ServerResult<KeyPair> {
    russh_keys::load_secret_key(path, None)
        .map_err(|e| ServerError::HostKey(e.to_string()))
}

/**
    The SSH session engine (C5): owns the `russh` server configuration and
    the set of currently bound listeners. Every accepted connection gets
    its own [`ConnectionHandler`]; every accepted channel on that
    connection gets its own task once `exec` is dispatched.
*/
pub struct EnvgateServer<S: VariableStore> {
    config: Arc<RusshConfig>,
    shared: Arc<Shared<S>>,
    listeners: Mutex<Vec<tokio::task::JoinHandle<()>>>,
    shutdown_tx: watch::Sender<bool>,
    shutdown_rx: watch::Receiver<bool>,
}

impl<S: VariableStore + 'static> EnvgateServer<S> {
    pub fn new(
        host_key: KeyPair,
        store: Arc<S>,
        cryptor: Arc<Cryptor>,
        auth: Arc<AuthRegistry<S>>,
    ) -> Self {
        let (shutdown_tx, shutdown_rx) = watch::channel(false);

        let config = RusshConfig {
            keys: vec![host_key],
            methods: MethodSet::PUBLICKEY,
            preferred: restricted_preference(),
            ..Default::default()
        };

        Self {
            config: Arc::new(config),
            shared: Arc::new(Shared { store, cryptor, auth }),
            listeners: Mutex::new(Vec::new()),
            shutdown_tx,
            shutdown_rx,
        }
    }

    /**
        Bind `addr` and start accepting connections. May be called more
        than once to listen on several addresses; each bound listener is
        tracked so [`Self::stop`] can close all of them. Returns the
        locally bound address, useful when `addr`'s port is `0`.
    */
    pub async fn listen(&self, addr: SocketAddr) -> ServerResult<SocketAddr> {
        let listener = TcpListener::bind(addr).await?;
        let bound_addr = listener.local_addr()?;
        info!(%bound_addr, "listening for ssh connections");

        let config = self.config.clone();
        let shared = self.shared.clone();
        let shutdown_rx = self.shutdown_rx.clone();

        let handle = tokio::spawn(accept_loop(listener, config, shared, shutdown_rx));
        self.listeners.lock().await.push(handle);
        Ok(bound_addr)
    }

    /**
        Close every active listener and wait for their accept loops to
        exit. In-flight sessions are untouched and complete on their own.
    */
    pub async fn stop(&self) {
        let _ = self.shutdown_tx.send(true);

        let mut listeners = self.listeners.lock().await;
        for handle in listeners.drain(..) {
            let _ = handle.await;
        }
        info!("stopped accepting new connections");
    }
}

async fn accept_loop<S: VariableStore + 'static>(
    listener: TcpListener,
    config: Arc<RusshConfig>,
    shared: Arc<Shared<S>>,
    mut shutdown_rx: watch::Receiver<bool>,
) {
    while !*shutdown_rx.borrow_and_update() {
        tokio::select! {
            changed = shutdown_rx.changed() => {
                if changed.is_err() {
                    break;
                }
            }
            accepted = listener.accept() => {
                let (socket, remote_addr) = match accepted {
                    Ok(pair) => pair,
                    Err(err) => {
                        warn!(%err, "accept failed");
                        continue;
                    }
                };

                let config = config.clone();
                let handler = ConnectionHandler::new(shared.clone(), remote_addr);

                tokio::spawn(async move {
                    if let Err(err) = russh::server::run_stream(config, socket, handler).await {
                        warn!(%err, %remote_addr, "ssh session ended with an error");
                    }
                });
            }
        }
    }
}
