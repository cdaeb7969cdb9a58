/*!
    The grouped key/value backend consumed by the session engine. Values
    are opaque ciphertext text (base64, C1's text-record encoding); this
    crate never encrypts or decrypts, it only persists and retrieves
    strings by `(group, name)`.
*/

mod error;
mod memory;
mod redis_store;

use std::collections::HashMap;

pub use error::{StoreError, StoreResult};
pub use memory::MemoryStore;
pub use redis_store::RedisStore;

/**
    Compose a backend-local key from a group and variable name, mirroring
    the slash-joined namespacing of the original key/value store.
*/
pub fn compose_key(group: &str, name: &str) -> String {
    format!("{group}/{name}")
}

/**
    The grouped key/value contract the session engine persists encrypted
    variables through. Implementations must tolerate concurrent calls.
*/
pub trait VariableStore: Send + Sync {
    /// Fetch one variable's ciphertext text, or `None` if it has never been set.
    async fn get_variable(&self, group: &str, name: &str) -> StoreResult<Option<String>>;

    /// Store or overwrite one variable's ciphertext text.
    async fn set_variable(&self, group: &str, name: &str, value: String) -> StoreResult<()>;

    /// Remove one variable. Removing an absent variable is not an error.
    async fn remove_variable(&self, group: &str, name: &str) -> StoreResult<()>;

    /// Fetch every variable in a group, keyed by name.
    async fn get_group(&self, group: &str) -> StoreResult<HashMap<String, String>>;

    /// Remove an entire group and all variables in it.
    async fn remove_group(&self, group: &str) -> StoreResult<()>;
}

/**
    Sum type over the concrete backends, so the session engine and the
    authorization registry can hold a single store value without making
    [`VariableStore`] object-safe (its methods are native `async fn`s, so
    it cannot be boxed as `dyn VariableStore`).
*/
pub enum AnyStore {
    Memory(MemoryStore),
    Redis(RedisStore),
}

impl VariableStore for AnyStore {
    async fn get_variable(&self, group: &str, name: &str) -> StoreResult<Option<String>> {
        match self {
            AnyStore::Memory(s) => s.get_variable(group, name).await,
            AnyStore::Redis(s) => s.get_variable(group, name).await,
        }
    }

    async fn set_variable(&self, group: &str, name: &str, value: String) -> StoreResult<()> {
        match self {
            AnyStore::Memory(s) => s.set_variable(group, name, value).await,
            AnyStore::Redis(s) => s.set_variable(group, name, value).await,
        }
    }

    async fn remove_variable(&self, group: &str, name: &str) -> StoreResult<()> {
        match self {
            AnyStore::Memory(s) => s.remove_variable(group, name).await,
            AnyStore::Redis(s) => s.remove_variable(group, name).await,
        }
    }

    async fn get_group(&self, group: &str) -> StoreResult<HashMap<String, String>> {
        match self {
            AnyStore::Memory(s) => s.get_group(group).await,
            AnyStore::Redis(s) => s.get_group(group).await,
        }
    }

    async fn remove_group(&self, group: &str) -> StoreResult<()> {
        match self {
            AnyStore::Memory(s) => s.remove_group(group).await,
            AnyStore::Redis(s) => s.remove_group(group).await,
        }
    }
}
