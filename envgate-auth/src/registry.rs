use std::collections::{HashMap, HashSet};
use std::sync::{Arc, RwLock as StdRwLock};

use tokio::sync::RwLock as TokioRwLock;
use tracing::info;

use envgate_crypto::Cryptor;
use envgate_store::VariableStore;

use crate::bootstrap::fetch_public_keys;
use crate::error::AuthResult;
use crate::readers;

/**
    The authorization registry: writer and register public-key sets,
    bootstrapped once at startup and append-only thereafter, plus the
    host→reader-key map, persisted encrypted in the variable store and
    mutated only by the `register` command.

    The writer/register sets use a plain [`std::sync::RwLock`] since every
    hold is a short, synchronous membership check or insert with no
    `.await` in between. The reader map uses a [`tokio::sync::RwLock`]
    because `register` holds it across the encrypt-and-persist round trip.
*/
pub struct AuthRegistry<S: VariableStore> {
    writers: StdRwLock<HashSet<Vec<u8>>>,
    register: StdRwLock<HashSet<Vec<u8>>>,
    readers: TokioRwLock<HashMap<String, Vec<u8>>>,
    store: Arc<S>,
    cryptor: Arc<Cryptor>,
}

impl<S: VariableStore> AuthRegistry<S> {
    /**
        Build an empty registry and load the persisted reader map. Callers
        still need to populate the writer/register sets via
        [`Self::load_writers_from_url`] / [`Self::load_register_from_url`].
    */
    pub async fn new(store: Arc<S>, cryptor: Arc<Cryptor>) -> AuthResult<Self> {
        let readers = readers::load(store.as_ref(), cryptor.as_ref()).await?;
        Ok(Self {
            writers: StdRwLock::new(HashSet::new()),
            register: StdRwLock::new(HashSet::new()),
            readers: TokioRwLock::new(readers),
            store,
            cryptor,
        })
    }

    /// Append a wire-encoded public key to the writer set.
    pub fn add_writer(&self, key: Vec<u8>) {
        self.writers.write().expect("writer lock poisoned").insert(key);
    }

    /// Append a wire-encoded public key to the register set.
    pub fn add_register(&self, key: Vec<u8>) {
        self.register
            .write()
            .expect("register lock poisoned")
            .insert(key);
    }

    /// Fetch writer public keys from a trusted URL and add them all.
    pub async fn load_writers_from_url(&self, url: &str) -> AuthResult<()> {
        let keys = fetch_public_keys(url).await?;
        info!(count = keys.len(), %url, "loaded writer keys");
        for key in keys {
            self.add_writer(key);
        }
        Ok(())
    }

    /// Fetch register-role public keys from a trusted URL and add them all.
    pub async fn load_register_from_url(&self, url: &str) -> AuthResult<()> {
        let keys = fetch_public_keys(url).await?;
        info!(count = keys.len(), %url, "loaded register keys");
        for key in keys {
            self.add_register(key);
        }
        Ok(())
    }

    /// True iff `key` is a recognized writer key.
    pub fn match_writer(&self, key: &[u8]) -> bool {
        self.writers.read().expect("writer lock poisoned").contains(key)
    }

    /// True iff `key` is a recognized register key.
    pub fn match_register(&self, key: &[u8]) -> bool {
        self.register
            .read()
            .expect("register lock poisoned")
            .contains(key)
    }

    /// True iff `key` equals the reader key currently registered for `host`.
    pub async fn match_reader_for_host(&self, host: &str, key: &[u8]) -> bool {
        self.readers
            .read()
            .await
            .get(host)
            .is_some_and(|stored| stored.as_slice() == key)
    }

    /**
        Replace the reader key for `host` and persist the updated map before
        returning. On a persistence failure the in-memory change is rolled
        back and the error is returned, so callers never observe a state
        where the map and its ciphertext disagree.
    */
    pub async fn add_reader_for_host(&self, host: String, key: Vec<u8>) -> AuthResult<()> {
        let mut readers = self.readers.write().await;
        let previous = readers.insert(host.clone(), key);

        if let Err(err) = readers::save(self.store.as_ref(), self.cryptor.as_ref(), &readers).await
        {
            match previous {
                Some(prev) => {
                    readers.insert(host, prev);
                }
                None => {
                    readers.remove(&host);
                }
            }
            return Err(err);
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use envgate_crypto::Key;
    use envgate_store::MemoryStore;

    async fn registry() -> AuthRegistry<MemoryStore> {
        AuthRegistry::new(Arc::new(MemoryStore::new()), Arc::new(Cryptor::new(Key::generate())))
            .await
            .unwrap()
    }

    #[tokio::test]
    async fn writer_matches_after_add() {
        let reg = registry().await;
        reg.add_writer(vec![1, 2, 3]);
        assert!(reg.match_writer(&[1, 2, 3]));
        assert!(!reg.match_writer(&[4, 5, 6]));
    }

    #[tokio::test]
    async fn register_set_is_independent_of_writer_set() {
        let reg = registry().await;
        reg.add_register(vec![9, 9, 9]);
        assert!(reg.match_register(&[9, 9, 9]));
        assert!(!reg.match_writer(&[9, 9, 9]));
    }

    #[tokio::test]
    async fn reader_key_for_host_round_trips() {
        let reg = registry().await;
        reg.add_reader_for_host("10.0.0.5".to_string(), vec![7, 7]).await.unwrap();
        assert!(reg.match_reader_for_host("10.0.0.5", &[7, 7]).await);
        assert!(!reg.match_reader_for_host("10.0.0.5", &[8, 8]).await);
        assert!(!reg.match_reader_for_host("10.0.0.6", &[7, 7]).await);
    }

    #[tokio::test]
    async fn re_register_supersedes_previous_key() {
        let reg = registry().await;
        reg.add_reader_for_host("host".to_string(), vec![1]).await.unwrap();
        reg.add_reader_for_host("host".to_string(), vec![2]).await.unwrap();
        assert!(!reg.match_reader_for_host("host", &[1]).await);
        assert!(reg.match_reader_for_host("host", &[2]).await);
    }

    #[tokio::test]
    async fn reader_map_persists_across_registries_sharing_a_store() {
        let store = Arc::new(MemoryStore::new());
        let cryptor = Arc::new(Cryptor::new(Key::generate()));

        let first = AuthRegistry::new(store.clone(), cryptor.clone()).await.unwrap();
        first
            .add_reader_for_host("h".to_string(), vec![42])
            .await
            .unwrap();

        let second = AuthRegistry::new(store, cryptor).await.unwrap();
        assert!(second.match_reader_for_host("h", &[42]).await);
    }
}
