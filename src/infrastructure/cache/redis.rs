//! Redis backing store implementation

use std::fmt;
use std::time::Duration;

use async_trait::async_trait;
use redis::aio::{ConnectionManager, ConnectionManagerConfig};
use redis::{AsyncCommands, Client};

use crate::domain::cache::FieldStore;
use crate::domain::DomainError;

/// Configuration for the Redis backing store
#[derive(Debug, Clone)]
pub struct RedisFieldStoreConfig {
    /// Redis connection URL (e.g., "redis://127.0.0.1:6379")
    pub url: String,
    /// Prefix applied to every namespace key
    pub key_prefix: Option<String>,
    /// Connection timeout
    pub connection_timeout: Duration,
    /// Per-command response timeout
    pub response_timeout: Duration,
}

impl Default for RedisFieldStoreConfig {
    fn default() -> Self {
        Self {
            url: "redis://127.0.0.1:6379".to_string(),
            key_prefix: None,
            connection_timeout: Duration::from_secs(5),
            response_timeout: Duration::from_secs(5),
        }
    }
}

impl RedisFieldStoreConfig {
    /// Creates a new configuration with the given URL
    pub fn new(url: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            ..Default::default()
        }
    }

    /// Sets the key prefix
    pub fn with_key_prefix(mut self, prefix: impl Into<String>) -> Self {
        self.key_prefix = Some(prefix.into());
        self
    }

    /// Sets the connection timeout
    pub fn with_connection_timeout(mut self, timeout: Duration) -> Self {
        self.connection_timeout = timeout;
        self
    }

    /// Sets the response timeout
    pub fn with_response_timeout(mut self, timeout: Duration) -> Self {
        self.response_timeout = timeout;
        self
    }
}

/// Redis backing store
///
/// Each namespace is one Redis hash: query keys are hash fields, serialized
/// results are the values. Per-field expiry uses HEXPIRE (Redis >= 7.4), so
/// the store itself retires stale entries; namespace invalidation is a single
/// DEL.
#[derive(Clone)]
pub struct RedisFieldStore {
    connection: ConnectionManager,
    config: RedisFieldStoreConfig,
}

impl fmt::Debug for RedisFieldStore {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RedisFieldStore")
            .field("config", &self.config)
            .field("connection", &"<ConnectionManager>")
            .finish()
    }
}

impl RedisFieldStore {
    /// Creates a new Redis backing store connection
    pub async fn new(config: RedisFieldStoreConfig) -> Result<Self, DomainError> {
        let client = Client::open(config.url.as_str())
            .map_err(|e| DomainError::store(format!("Failed to create Redis client: {}", e)))?;

        let manager_config = ConnectionManagerConfig::new()
            .set_connection_timeout(config.connection_timeout)
            .set_response_timeout(config.response_timeout);

        let connection = ConnectionManager::new_with_config(client, manager_config)
            .await
            .map_err(|e| DomainError::store(format!("Failed to connect to Redis: {}", e)))?;

        Ok(Self { connection, config })
    }

    /// Creates a Redis backing store with default configuration
    pub async fn with_url(url: impl Into<String>) -> Result<Self, DomainError> {
        Self::new(RedisFieldStoreConfig::new(url)).await
    }

    fn prefix_key(&self, namespace_key: &str) -> String {
        match &self.config.key_prefix {
            Some(prefix) => format!("{}:{}", prefix, namespace_key),
            None => namespace_key.to_string(),
        }
    }
}

#[async_trait]
impl FieldStore for RedisFieldStore {
    async fn get_field(
        &self,
        namespace_key: &str,
        field_key: &str,
    ) -> Result<Option<String>, DomainError> {
        let prefixed = self.prefix_key(namespace_key);
        let mut conn = self.connection.clone();

        let value: Option<String> = conn.hget(&prefixed, field_key).await.map_err(|e| {
            DomainError::store(format!(
                "Failed to look up field under '{}': {}",
                namespace_key, e
            ))
        })?;

        Ok(value)
    }

    async fn set_field(
        &self,
        namespace_key: &str,
        field_key: &str,
        value: &str,
        ttl: Duration,
    ) -> Result<(), DomainError> {
        let prefixed = self.prefix_key(namespace_key);
        let mut conn = self.connection.clone();

        let ttl_secs = ttl.as_secs().max(1) as i64;

        let _: () = conn.hset(&prefixed, field_key, value).await.map_err(|e| {
            DomainError::store(format!(
                "Failed to store field under '{}': {}",
                namespace_key, e
            ))
        })?;

        // HEXPIRE needs Redis 7.4
        let _: Vec<i64> = redis::cmd("HEXPIRE")
            .arg(&prefixed)
            .arg(ttl_secs)
            .arg("FIELDS")
            .arg(1)
            .arg(field_key)
            .query_async(&mut conn)
            .await
            .map_err(|e| {
                DomainError::store(format!(
                    "Failed to set field TTL under '{}': {}",
                    namespace_key, e
                ))
            })?;

        Ok(())
    }

    async fn delete_namespace(&self, namespace_key: &str) -> Result<bool, DomainError> {
        let prefixed = self.prefix_key(namespace_key);
        let mut conn = self.connection.clone();

        let deleted: i64 = conn.del(&prefixed).await.map_err(|e| {
            DomainError::store(format!(
                "Failed to delete namespace '{}': {}",
                namespace_key, e
            ))
        })?;

        Ok(deleted > 0)
    }
}
