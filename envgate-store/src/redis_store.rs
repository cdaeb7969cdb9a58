use std::collections::HashMap;

use redis::AsyncCommands;
use redis::aio::ConnectionManager;

use crate::{StoreResult, VariableStore, compose_key};

/**
    Redis-backed [`VariableStore`]. Each group is a Redis hash keyed by
    variable name; `compose_key` namespaces the hash key itself so that
    groups never collide with other keys an operator's Redis instance
    might hold.
*/
pub struct RedisStore {
    connection: ConnectionManager,
}

impl RedisStore {
    /**
        Connect to Redis at `url` (e.g. `redis://127.0.0.1:6379`), using a
        `ConnectionManager` that reconnects transparently on dropped
        connections, matching the backend's expectation of a long-lived
        process-scoped connection pool.
    */
    pub async fn connect(url: &str) -> StoreResult<Self> {
        let client = redis::Client::open(url)?;
        let connection = client.get_connection_manager().await?;
        Ok(Self { connection })
    }

    fn group_key(group: &str) -> String {
        compose_key("envgate:group", group)
    }
}

impl VariableStore for RedisStore {
    async fn get_variable(&self, group: &str, name: &str) -> StoreResult<Option<String>> {
        let mut conn = self.connection.clone();
        let value: Option<String> = conn.hget(Self::group_key(group), name).await?;
        Ok(value)
    }

    async fn set_variable(&self, group: &str, name: &str, value: String) -> StoreResult<()> {
        let mut conn = self.connection.clone();
        conn.hset::<_, _, _, ()>(Self::group_key(group), name, value)
            .await?;
        Ok(())
    }

    async fn remove_variable(&self, group: &str, name: &str) -> StoreResult<()> {
        let mut conn = self.connection.clone();
        conn.hdel::<_, _, ()>(Self::group_key(group), name).await?;
        Ok(())
    }

    async fn get_group(&self, group: &str) -> StoreResult<HashMap<String, String>> {
        let mut conn = self.connection.clone();
        let members: HashMap<String, String> = conn.hgetall(Self::group_key(group)).await?;
        Ok(members)
    }

    async fn remove_group(&self, group: &str) -> StoreResult<()> {
        let mut conn = self.connection.clone();
        conn.del::<_, ()>(Self::group_key(group)).await?;
        Ok(())
    }
}
