use std::collections::HashMap;
use std::net::SocketAddr;
use std::sync::Arc;

use russh::server::{Auth, Handler, Msg, Session};
use russh::{Channel, ChannelId, CryptoVec};
use russh_keys::PublicKeyBase64;
use russh_keys::key::PublicKey;
use tracing::{info, warn};

use envgate_auth::AuthRegistry;
use envgate_crypto::Cryptor;
use envgate_store::VariableStore;

use crate::commands::{self, CommandContext};
use crate::error::ServerError;
use crate::session::{ChannelPhase, ChannelState, Role};

/// Everything a connection handler needs, shared immutably across every
/// accepted connection and channel.
pub struct Shared<S: VariableStore> {
    pub store: Arc<S>,
    pub cryptor: Arc<Cryptor>,
    pub auth: Arc<AuthRegistry<S>>,
}

/**
    One [`Handler`] instance per accepted TCP connection. Carries the role
    decided at authentication and the per-channel state for every session
    channel opened on this connection. `russh` drives all of its callbacks
    from a single task per connection, so `channels` needs no lock; the
    work a callback hands off (command dispatch) is spawned onto its own
    task so every channel gets independent concurrency.

    Certificate-based authentication has no separate denial callback here:
    `russh`'s public-key layer only parses bare OpenSSH public keys, never
    certificates, so there is no "is this an authority" hook to answer
    `false` from — the denial is structural.
*/
pub struct ConnectionHandler<S: VariableStore> {
    shared: Arc<Shared<S>>,
    remote_addr: SocketAddr,
    role: Option<Role>,
    channels: HashMap<ChannelId, ChannelState>,
}

impl<S: VariableStore> ConnectionHandler<S> {
    pub fn new(shared: Arc<Shared<S>>, remote_addr: SocketAddr) -> Self {
        Self {
            shared,
            remote_addr,
            role: None,
            channels: HashMap::new(),
        }
    }

    /// The IP portion of the remote address, used both for reader-map
    /// lookup at authentication and as the host key for `register`.
    fn remote_host(&self) -> String {
        self.remote_addr.ip().to_string()
    }
}

impl<S: VariableStore + 'static> Handler for ConnectionHandler<S> {
    type Error = ServerError;

    /// First phase of public-key auth: always offer to let the client try,
    /// so the real check happens once a signature is presented.
    async fn auth_publickey_offered(
        &mut self,
        _user: &str,
        _public_key: &PublicKey,
    ) -> Result<Auth, Self::Error> {
        Ok(Auth::Accept)
    }

    /// Second phase: the client has proven possession of `public_key`.
    /// Map the SSH user name to a role and check membership in the
    /// relevant authorization set.
    async fn auth_publickey(
        &mut self,
        user: &str,
        public_key: &PublicKey,
    ) -> Result<Auth, Self::Error> {
        let wire = public_key.public_key_bytes();
        let host = self.remote_host();

        let role = match Role::from_user(user) {
            Some(Role::Writer) if self.shared.auth.match_writer(&wire) => Some(Role::Writer),
            Some(Role::Register) if self.shared.auth.match_register(&wire) => Some(Role::Register),
            Some(Role::Reader) if self.shared.auth.match_reader_for_host(&host, &wire).await => {
                Some(Role::Reader)
            }
            _ => None,
        };

        match role {
            Some(role) => {
                info!(user, host, ?role, "authenticated");
                self.role = Some(role);
                Ok(Auth::Accept)
            }
            None => {
                warn!(user, host, "public key not authorized");
                Ok(Auth::reject())
            }
        }
    }

    /// Only `session` channels carry the `env`/`exec` protocol; every other
    /// channel-open type falls back to the trait's default (reject).
    async fn channel_open_session(
        &mut self,
        channel: Channel<Msg>,
        _session: &mut Session,
    ) -> Result<bool, Self::Error> {
        self.channels.insert(channel.id(), ChannelState::new());
        Ok(true)
    }

    /// `env NAME VALUE` — one request per pair, any number accepted before
    /// `exec`; later values for the same name override earlier ones.
    async fn env_request(
        &mut self,
        channel: ChannelId,
        variable_name: &str,
        variable_value: &str,
        session: &mut Session,
    ) -> Result<(), Self::Error> {
        let state = self.channels.entry(channel).or_insert_with(ChannelState::new);

        if state.phase == ChannelPhase::Executing {
            session.channel_failure(channel)?;
            return Ok(());
        }

        state.set_env(variable_name.to_string(), variable_value.to_string());
        session.channel_success(channel)?;
        Ok(())
    }

    /// `exec <command line>` — at most once per channel. Acknowledges the
    /// SSH request immediately, then runs the command on its own task so
    /// a slow store/crypto call on one channel never blocks another.
    async fn exec_request(
        &mut self,
        channel: ChannelId,
        data: &[u8],
        session: &mut Session,
    ) -> Result<(), Self::Error> {
        let state = self.channels.entry(channel).or_insert_with(ChannelState::new);

        if state.phase == ChannelPhase::Executing {
            session.channel_failure(channel)?;
            return Ok(());
        }

        let Ok(command_line) = std::str::from_utf8(data) else {
            session.channel_failure(channel)?;
            session.close(channel)?;
            return Ok(());
        };
        let command_line = command_line.to_string();

        let role = self.role.expect("exec_request is unreachable before successful auth");
        let env = state.env.clone();
        state.phase = ChannelPhase::Executing;

        session.channel_success(channel)?;

        let remote_host = self.remote_host();
        let shared = self.shared.clone();
        let handle = session.handle();

        tokio::spawn(async move {
            let ctx = CommandContext {
                store: shared.store.as_ref(),
                cryptor: shared.cryptor.as_ref(),
                auth: shared.auth.as_ref(),
                role,
                remote_host: &remote_host,
                env: &env,
            };
            let outcome = commands::dispatch(&command_line, ctx).await;

            if !outcome.stdout.is_empty() {
                let _ = handle.data(channel, CryptoVec::from(outcome.stdout)).await;
            }
            let status: u32 = if outcome.success { 0 } else { 1 };
            let _ = handle.exit_status_request(channel, status).await;
            let _ = handle.close(channel).await;
        });

        Ok(())
    }
}
