use std::collections::HashMap;

use tokio::sync::RwLock;

use crate::{StoreResult, VariableStore};

/**
    In-memory backend used by tests and the in-process client/server
    integration tests in `envgate-server`. Mirrors the grouping semantics
    of [`crate::RedisStore`] without any network dependency.
*/
#[derive(Default)]
pub struct MemoryStore {
    groups: RwLock<HashMap<String, HashMap<String, String>>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

impl VariableStore for MemoryStore {
    async fn get_variable(&self, group: &str, name: &str) -> StoreResult<Option<String>> {
        let groups = self.groups.read().await;
        Ok(groups.get(group).and_then(|vars| vars.get(name)).cloned())
    }

    async fn set_variable(&self, group: &str, name: &str, value: String) -> StoreResult<()> {
        let mut groups = self.groups.write().await;
        groups
            .entry(group.to_string())
            .or_default()
            .insert(name.to_string(), value);
        Ok(())
    }

    async fn remove_variable(&self, group: &str, name: &str) -> StoreResult<()> {
        let mut groups = self.groups.write().await;
        if let Some(vars) = groups.get_mut(group) {
            vars.remove(name);
        }
        Ok(())
    }

    async fn get_group(&self, group: &str) -> StoreResult<HashMap<String, String>> {
        let groups = self.groups.read().await;
        Ok(groups.get(group).cloned().unwrap_or_default())
    }

    async fn remove_group(&self, group: &str) -> StoreResult<()> {
        let mut groups = self.groups.write().await;
        groups.remove(group);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn set_then_get_round_trips() {
        let store = MemoryStore::new();
        store.set_variable("g1", "A", "cipher".to_string()).await.unwrap();
        assert_eq!(
            store.get_variable("g1", "A").await.unwrap(),
            Some("cipher".to_string())
        );
    }

    #[tokio::test]
    async fn missing_variable_is_none() {
        let store = MemoryStore::new();
        assert_eq!(store.get_variable("g1", "A").await.unwrap(), None);
    }

    #[tokio::test]
    async fn remove_variable_then_get_is_none() {
        let store = MemoryStore::new();
        store.set_variable("g1", "A", "x".to_string()).await.unwrap();
        store.remove_variable("g1", "A").await.unwrap();
        assert_eq!(store.get_variable("g1", "A").await.unwrap(), None);
    }

    #[tokio::test]
    async fn get_group_returns_all_members() {
        let store = MemoryStore::new();
        store.set_variable("g1", "A", "1".to_string()).await.unwrap();
        store.set_variable("g1", "B", "2".to_string()).await.unwrap();
        store.set_variable("g2", "C", "3".to_string()).await.unwrap();

        let group = store.get_group("g1").await.unwrap();
        assert_eq!(group.len(), 2);
        assert_eq!(group.get("A"), Some(&"1".to_string()));
    }

    #[tokio::test]
    async fn remove_group_drops_everything_in_it() {
        let store = MemoryStore::new();
        store.set_variable("g1", "A", "1".to_string()).await.unwrap();
        store.remove_group("g1").await.unwrap();
        assert!(store.get_group("g1").await.unwrap().is_empty());
    }
}
