use std::collections::HashMap;
use std::sync::Arc;

use rsa::RsaPrivateKey;
use rsa::pkcs1::{EncodeRsaPrivateKey, LineEnding};
use rsa::rand_core::OsRng;
use tracing::warn;

use envgate_auth::AuthRegistry;
use envgate_crypto::Cryptor;
use envgate_store::VariableStore;

use crate::rsa_wire::rsa_public_key_wire;
use crate::session::Role;

/// RSA modulus size used for freshly minted reader keys for the register command.
const REGISTER_KEY_BITS: usize = 4096;

/// What a dispatched command wrote to the channel, and whether it succeeded.
pub struct CommandOutcome {
    pub stdout: Vec<u8>,
    pub success: bool,
}

impl CommandOutcome {
    fn ok(stdout: Vec<u8>) -> Self {
        Self { stdout, success: true }
    }

    fn failed() -> Self {
        Self { stdout: Vec::new(), success: false }
    }
}

/// Everything a command needs to run, borrowed for the duration of one `exec`.
pub struct CommandContext<'a, S: VariableStore> {
    pub store: &'a S,
    pub cryptor: &'a Cryptor,
    pub auth: &'a AuthRegistry<S>,
    pub role: Role,
    pub remote_host: &'a str,
    pub env: &'a HashMap<String, String>,
}

/// Split `command line` on the first space into (head, tail).
fn split_command(line: &str) -> (&str, &str) {
    match line.split_once(' ') {
        Some((head, tail)) => (head, tail),
        None => (line, ""),
    }
}

pub async fn dispatch<S: VariableStore>(line: &str, ctx: CommandContext<'_, S>) -> CommandOutcome {
    let (head, tail) = split_command(line.trim_end_matches('\n'));
    match head {
        "env" => run_env(ctx).await,
        "export" => run_export(tail, ctx).await,
        "unset" => run_unset(tail, ctx).await,
        "register" => run_register(ctx).await,
        other => {
            warn!(command = other, "unrecognized exec command");
            CommandOutcome::failed()
        }
    }
}

async fn run_env<S: VariableStore>(ctx: CommandContext<'_, S>) -> CommandOutcome {
    let group = ctx.env.get("GROUP").cloned().unwrap_or_default();
    let variables = match ctx.store.get_group(&group).await {
        Ok(variables) => variables,
        Err(err) => {
            warn!(%err, %group, "env: store read failed");
            return CommandOutcome::failed();
        }
    };

    // Sorted for reproducible test output; the wire format carries no
    // ordering guarantee.
    let mut names: Vec<&String> = variables.keys().collect();
    names.sort();

    let mut stdout = Vec::new();
    for name in names {
        let ciphertext = &variables[name];
        let plaintext = match ctx.cryptor.decrypt_string(ciphertext) {
            Ok(plaintext) => plaintext,
            Err(err) => {
                warn!(%err, %group, %name, "env: decrypt failed");
                return CommandOutcome { stdout, success: false };
            }
        };
        stdout.extend_from_slice(name.as_bytes());
        stdout.push(b'=');
        stdout.extend_from_slice(plaintext.as_bytes());
        stdout.push(b'\n');
    }

    CommandOutcome::ok(stdout)
}

async fn run_export<S: VariableStore>(arg: &str, ctx: CommandContext<'_, S>) -> CommandOutcome {
    if !ctx.role.can_write() {
        return CommandOutcome::failed();
    }

    let group = ctx.env.get("GROUP").cloned().unwrap_or_default();
    let (name, value) = match arg.split_once('=') {
        Some((name, value)) => (name.to_string(), value.to_string()),
        None => {
            let value = ctx.env.get(arg).cloned().unwrap_or_default();
            (arg.to_string(), value)
        }
    };

    let ciphertext = match ctx.cryptor.encrypt_string(&value) {
        Ok(ciphertext) => ciphertext,
        Err(err) => {
            warn!(%err, "export: encrypt failed");
            return CommandOutcome::failed();
        }
    };

    match ctx.store.set_variable(&group, &name, ciphertext).await {
        Ok(()) => CommandOutcome::ok(Vec::new()),
        Err(err) => {
            warn!(%err, %group, %name, "export: store write failed");
            CommandOutcome::failed()
        }
    }
}

async fn run_unset<S: VariableStore>(arg: &str, ctx: CommandContext<'_, S>) -> CommandOutcome {
    if !ctx.role.can_write() {
        return CommandOutcome::failed();
    }

    let group = ctx.env.get("GROUP").cloned().unwrap_or_default();
    match ctx.store.remove_variable(&group, arg).await {
        Ok(()) => CommandOutcome::ok(Vec::new()),
        Err(err) => {
            warn!(%err, %group, name = arg, "unset: store remove failed");
            CommandOutcome::failed()
        }
    }
}

async fn run_register<S: VariableStore>(ctx: CommandContext<'_, S>) -> CommandOutcome {
    if ctx.role != Role::Register {
        return CommandOutcome::failed();
    }

    let private_key = match RsaPrivateKey::new(&mut OsRng, REGISTER_KEY_BITS) {
        Ok(key) => key,
        Err(err) => {
            warn!(%err, "register: RSA key generation failed");
            return CommandOutcome::failed();
        }
    };
    let public_wire = rsa_public_key_wire(&private_key.to_public_key());

    if let Err(err) = ctx
        .auth
        .add_reader_for_host(ctx.remote_host.to_string(), public_wire)
        .await
    {
        warn!(%err, host = ctx.remote_host, "register: reader-map persistence failed");
        return CommandOutcome::failed();
    }

    let pem = match private_key.to_pkcs1_pem(LineEnding::LF) {
        Ok(pem) => pem,
        Err(err) => {
            warn!(%err, "register: PEM encoding failed");
            return CommandOutcome::failed();
        }
    };

    CommandOutcome::ok(pem.as_bytes().to_vec())
}

#[allow(dead_code)]
fn _assert_send<T: Send>() {}

pub type SharedAuth<S> = Arc<AuthRegistry<S>>;
