use std::collections::HashMap;

use data_encoding::BASE64;
use serde::{Deserialize, Serialize};

use envgate_crypto::Cryptor;
use envgate_store::VariableStore;

use crate::error::AuthResult;

/// Fixed group/variable under which the host→reader-key map is persisted.
pub const READERS_GROUP: &str = "_ssh";
pub const READERS_VARIABLE: &str = "readers";

#[derive(Serialize, Deserialize, Default)]
struct ReaderMapWire(HashMap<String, String>);

/**
    Decode and decrypt the host→reader-key map, returning an empty map if
    it has never been written.
*/
pub async fn load<S: VariableStore>(store: &S, cryptor: &Cryptor) -> AuthResult<HashMap<String, Vec<u8>>> {
    let Some(ciphertext) = store.get_variable(READERS_GROUP, READERS_VARIABLE).await? else {
        return Ok(HashMap::new());
    };

    let plain = cryptor.decrypt_string(&ciphertext)?;
    let wire: ReaderMapWire = serde_json::from_str(&plain).unwrap_or_default();

    let mut map = HashMap::with_capacity(wire.0.len());
    for (host, encoded) in wire.0 {
        if let Ok(bytes) = BASE64.decode(encoded.as_bytes()) {
            map.insert(host, bytes);
        }
    }
    Ok(map)
}

/**
    Re-encode, re-encrypt, and persist the host→reader-key map. Called
    under the reader map's write lock so the in-memory state and the
    persisted ciphertext are updated atomically with respect to other
    `register` callers.
*/
pub async fn save<S: VariableStore>(
    store: &S,
    cryptor: &Cryptor,
    map: &HashMap<String, Vec<u8>>,
) -> AuthResult<()> {
    let wire = ReaderMapWire(
        map.iter()
            .map(|(host, bytes)| (host.clone(), BASE64.encode(bytes)))
            .collect(),
    );
    let plain = serde_json::to_string(&wire).expect("map of strings always serializes");
    let ciphertext = cryptor.encrypt_string(&plain)?;
    store
        .set_variable(READERS_GROUP, READERS_VARIABLE, ciphertext)
        .await?;
    Ok(())
}
