//! End-to-end coverage of the SSH session engine: a real loopback `russh`
//! client drives each role against a server backed by `MemoryStore`.

use std::net::SocketAddr;
use std::sync::Arc;

use russh::ChannelMsg;
use russh::client;
use russh_keys::key::{KeyPair, PublicKey};

use envgate_auth::AuthRegistry;
use envgate_crypto::{Cryptor, Key};
use envgate_server::EnvgateServer;
use envgate_store::MemoryStore;

struct TrustingHandler;

impl client::Handler for TrustingHandler {
    type Error = russh::Error;

    async fn check_server_key(&mut self, _server_public_key: &PublicKey) -> Result<bool, Self::Error> {
        Ok(true)
    }
}

struct Outcome {
    stdout: Vec<u8>,
    success: bool,
}

async fn exec(
    addr: SocketAddr,
    user: &str,
    key: &KeyPair,
    env: &[(&str, &str)],
    command_line: &str,
) -> Result<Outcome, russh::Error> {
    let config = Arc::new(client::Config::default());
    let mut session = client::connect(config, addr, TrustingHandler).await?;

    let authenticated = session.authenticate_publickey(user, Arc::new(key.clone())).await?;
    if !authenticated {
        return Ok(Outcome { stdout: Vec::new(), success: false });
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

    let _ = session.disconnect(russh::Disconnect::ByApplication, "", "en").await;
    Ok(Outcome { stdout, success })
}

/// Wires up a server with an empty writer/register/reader registry, bound
/// on an ephemeral loopback port, and returns it alongside its address.
async fn spawn_server() -> (
    SocketAddr,
    EnvgateServer<MemoryStore>,
    Arc<AuthRegistry<MemoryStore>>,
    Arc<MemoryStore>,
) {
    let store = Arc::new(MemoryStore::new());
    let cryptor = Arc::new(Cryptor::new(Key::generate()));
    let auth = Arc::new(AuthRegistry::new(store.clone(), cryptor.clone()).await.unwrap());
    let host_key = KeyPair::generate_ed25519().expect("ed25519 key generation");

    let server = EnvgateServer::new(host_key, store.clone(), cryptor, auth.clone());
    let addr: SocketAddr = "127.0.0.1:0".parse().unwrap();
    let bound = server.listen(addr).await.unwrap();

    (bound, server, auth, store)
}

fn public_key_wire(key: &KeyPair) -> Vec<u8> {
    use russh_keys::PublicKeyBase64;
    key.clone_public_key().unwrap().public_key_bytes()
}

#[tokio::test]
async fn writer_round_trips_a_value_through_a_reader() {
    let (addr, server, auth, _store) = spawn_server().await;

    let writer_key = KeyPair::generate_ed25519().unwrap();
    auth.add_writer(public_key_wire(&writer_key));

    let outcome = exec(addr, "w", &writer_key, &[("GROUP", "g1")], "export A=hello").await.unwrap();
    assert!(outcome.success, "export should succeed for an authorized writer");

    // Bootstrap a reader key for this loopback host via the register role.
    let register_key = KeyPair::generate_ed25519().unwrap();
    auth.add_register(public_key_wire(&register_key));
    let register_outcome = exec(addr, "x", &register_key, &[], "register").await.unwrap();
    assert!(register_outcome.success);
    let pem = String::from_utf8(register_outcome.stdout).unwrap();
    assert!(pem.contains("BEGIN RSA PRIVATE KEY"));

    let reader_key = russh_keys::decode_secret_key(&pem, None).unwrap();
    let env_outcome = exec(addr, "r", &reader_key, &[("GROUP", "g1")], "env").await.unwrap();
    assert!(env_outcome.success);
    assert_eq!(env_outcome.stdout, b"A=hello\n");

    server.stop().await;
}

#[tokio::test]
async fn writer_role_is_denied_a_key_that_was_never_authorized() {
    let (addr, server, _auth, _store) = spawn_server().await;

    let unauthorized = KeyPair::generate_ed25519().unwrap();
    let outcome = exec(addr, "w", &unauthorized, &[("GROUP", "g1")], "export A=1").await.unwrap();
    assert!(!outcome.success, "an unregistered key must not authenticate at all");

    server.stop().await;
}

#[tokio::test]
async fn register_then_reader_key_supersedes_on_re_register() {
    let (addr, server, auth, _store) = spawn_server().await;

    let register_key = KeyPair::generate_ed25519().unwrap();
    auth.add_register(public_key_wire(&register_key));

    let first = exec(addr, "x", &register_key, &[], "register").await.unwrap();
    assert!(first.success);
    let first_pem = String::from_utf8(first.stdout).unwrap();
    let first_reader = russh_keys::decode_secret_key(&first_pem, None).unwrap();

    let second = exec(addr, "x", &register_key, &[], "register").await.unwrap();
    assert!(second.success);
    let second_pem = String::from_utf8(second.stdout).unwrap();
    let second_reader = russh_keys::decode_secret_key(&second_pem, None).unwrap();

    let stale = exec(addr, "r", &first_reader, &[("GROUP", "g1")], "env").await.unwrap();
    assert!(!stale.success, "superseded reader key must be rejected");

    let fresh = exec(addr, "r", &second_reader, &[("GROUP", "g1")], "env").await.unwrap();
    assert!(fresh.success);

    server.stop().await;
}

#[tokio::test]
async fn register_role_cannot_export_or_read() {
    let (addr, server, auth, _store) = spawn_server().await;

    let register_key = KeyPair::generate_ed25519().unwrap();
    auth.add_register(public_key_wire(&register_key));

    let outcome = exec(addr, "w", &register_key, &[("GROUP", "g1")], "export A=1").await.unwrap();
    assert!(!outcome.success, "a register-role key must not authenticate as writer");

    let outcome = exec(addr, "r", &register_key, &[("GROUP", "g1")], "env").await.unwrap();
    assert!(!outcome.success, "a register-role key must not authenticate as reader without a host registration");

    server.stop().await;
}

#[tokio::test]
async fn writer_key_is_denied_under_the_reader_user_name() {
    let (addr, server, auth, _store) = spawn_server().await;

    let writer_key = KeyPair::generate_ed25519().unwrap();
    auth.add_writer(public_key_wire(&writer_key));

    let outcome = exec(addr, "w", &writer_key, &[("GROUP", "g1")], "export A=1").await.unwrap();
    assert!(outcome.success, "the writer key should authenticate fine under its own role");

    let outcome = exec(addr, "r", &writer_key, &[("GROUP", "g1")], "env").await.unwrap();
    assert!(!outcome.success, "a writer's key must not authenticate as reader");

    server.stop().await;
}

#[tokio::test]
async fn tampered_ciphertext_is_surfaced_as_a_failed_env_command() {
    use envgate_store::VariableStore;

    let (addr, server, auth, store) = spawn_server().await;

    let writer_key = KeyPair::generate_ed25519().unwrap();
    auth.add_writer(public_key_wire(&writer_key));
    exec(addr, "w", &writer_key, &[("GROUP", "g1")], "export B=secret").await.unwrap();

    let group = store.get_group("g1").await.unwrap();
    let ciphertext = group.get("B").unwrap();
    let mut tampered = ciphertext.clone().into_bytes();
    tampered[0] = if tampered[0] == b'A' { b'B' } else { b'A' };
    store
        .set_variable("g1", "B", String::from_utf8(tampered).unwrap())
        .await
        .unwrap();

    let register_key = KeyPair::generate_ed25519().unwrap();
    auth.add_register(public_key_wire(&register_key));
    let register_outcome = exec(addr, "x", &register_key, &[], "register").await.unwrap();
    let pem = String::from_utf8(register_outcome.stdout).unwrap();
    let reader_key = russh_keys::decode_secret_key(&pem, None).unwrap();

    let outcome = exec(addr, "r", &reader_key, &[("GROUP", "g1")], "env").await.unwrap();
    assert!(!outcome.success, "a tampered value must fail the whole env command");
    assert!(!String::from_utf8_lossy(&outcome.stdout).contains('B'));

    server.stop().await;
}

#[tokio::test]
async fn writer_can_unset_a_variable_it_previously_exported() {
    let (addr, server, auth, _store) = spawn_server().await;

    let writer_key = KeyPair::generate_ed25519().unwrap();
    auth.add_writer(public_key_wire(&writer_key));
    exec(addr, "w", &writer_key, &[("GROUP", "g1")], "export A=1").await.unwrap();
    let outcome = exec(addr, "w", &writer_key, &[("GROUP", "g1")], "unset A").await.unwrap();
    assert!(outcome.success);

    let register_key = KeyPair::generate_ed25519().unwrap();
    auth.add_register(public_key_wire(&register_key));
    let register_outcome = exec(addr, "x", &register_key, &[], "register").await.unwrap();
    let pem = String::from_utf8(register_outcome.stdout).unwrap();
    let reader_key = russh_keys::decode_secret_key(&pem, None).unwrap();

    let env_outcome = exec(addr, "r", &reader_key, &[("GROUP", "g1")], "env").await.unwrap();
    assert_eq!(env_outcome.stdout, Vec::<u8>::new());

    server.stop().await;
}

#[tokio::test]
async fn unrecognized_ssh_user_name_never_authenticates() {
    let (addr, server, _auth, _store) = spawn_server().await;
    let key = KeyPair::generate_ed25519().unwrap();
    let outcome = exec(addr, "root", &key, &[], "env").await.unwrap();
    assert!(!outcome.success);
    server.stop().await;
}

/// N writers issuing `export X=i` concurrently under the same group: the
/// store's per-key atomicity means exactly one value survives, and a
/// subsequent `env` read returns exactly one line for X carrying one of
/// the submitted values.
#[tokio::test]
async fn concurrent_exports_to_the_same_variable_leave_exactly_one_value() {
    const WRITERS: usize = 8;

    let (addr, server, auth, _store) = spawn_server().await;

    let writer_key = KeyPair::generate_ed25519().unwrap();
    auth.add_writer(public_key_wire(&writer_key));

    let tasks: Vec<_> = (0..WRITERS)
        .map(|i| {
            let writer_key = writer_key.clone();
            let addr = addr;
            tokio::spawn(async move {
                exec(addr, "w", &writer_key, &[("GROUP", "g1")], &format!("export X={i}")).await
            })
        })
        .collect();

    let mut submitted = Vec::with_capacity(WRITERS);
    for task in tasks {
        let outcome = task.await.unwrap().unwrap();
        assert!(outcome.success, "every concurrent export should succeed");
    }
    for i in 0..WRITERS {
        submitted.push(format!("X={i}\n"));
    }

    let register_key = KeyPair::generate_ed25519().unwrap();
    auth.add_register(public_key_wire(&register_key));
    let register_outcome = exec(addr, "x", &register_key, &[], "register").await.unwrap();
    let pem = String::from_utf8(register_outcome.stdout).unwrap();
    let reader_key = russh_keys::decode_secret_key(&pem, None).unwrap();

    let env_outcome = exec(addr, "r", &reader_key, &[("GROUP", "g1")], "env").await.unwrap();
    assert!(env_outcome.success);

    let stdout = String::from_utf8(env_outcome.stdout).unwrap();
    let lines: Vec<&str> = stdout.lines().collect();
    assert_eq!(lines.len(), 1, "exactly one value for X must survive");
    assert!(
        submitted.iter().any(|candidate| candidate.trim_end() == lines[0]),
        "surviving value {:?} must be one of the submitted values",
        lines[0]
    );

    server.stop().await;
}
