//! In-memory backing store implementation using moka

use std::collections::HashMap;
use std::sync::Arc;
use std::time::{Duration, Instant};

use async_trait::async_trait;
use moka::future::Cache as MokaCache;
use tokio::sync::RwLock;

use crate::domain::cache::FieldStore;
use crate::domain::DomainError;

/// Configuration for the in-memory backing store
#[derive(Debug, Clone)]
pub struct InMemoryFieldStoreConfig {
    /// Maximum number of namespaces held at once
    pub max_namespaces: u64,
    /// Namespaces not touched for this duration are evicted wholesale
    pub time_to_idle: Option<Duration>,
}

impl Default for InMemoryFieldStoreConfig {
    fn default() -> Self {
        Self {
            max_namespaces: 10_000,
            time_to_idle: None,
        }
    }
}

impl InMemoryFieldStoreConfig {
    /// Sets the maximum namespace capacity
    pub fn with_max_namespaces(mut self, capacity: u64) -> Self {
        self.max_namespaces = capacity;
        self
    }

    /// Sets the namespace time-to-idle
    pub fn with_time_to_idle(mut self, tti: Duration) -> Self {
        self.time_to_idle = Some(tti);
        self
    }
}

#[derive(Debug, Clone)]
struct FieldEntry {
    data: String,
    expires_at: Instant,
}

type NamespaceSlot = Arc<RwLock<HashMap<String, FieldEntry>>>;

/// In-memory backing store
///
/// One moka slot per namespace, each holding a field map with per-field
/// expiry. Expired fields behave as absent and are removed lazily on lookup.
/// Suitable for tests and single-process deployments; the Redis store is the
/// shared-store option.
#[derive(Debug)]
pub struct InMemoryFieldStore {
    namespaces: MokaCache<String, NamespaceSlot>,
}

impl InMemoryFieldStore {
    /// Creates an in-memory backing store with default configuration
    pub fn new() -> Self {
        Self::with_config(InMemoryFieldStoreConfig::default())
    }

    /// Creates an in-memory backing store with the given configuration
    pub fn with_config(config: InMemoryFieldStoreConfig) -> Self {
        let mut builder = MokaCache::builder().max_capacity(config.max_namespaces);

        if let Some(tti) = config.time_to_idle {
            builder = builder.time_to_idle(tti);
        }

        Self {
            namespaces: builder.build(),
        }
    }
}

impl Default for InMemoryFieldStore {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl FieldStore for InMemoryFieldStore {
    async fn get_field(
        &self,
        namespace_key: &str,
        field_key: &str,
    ) -> Result<Option<String>, DomainError> {
        let Some(slot) = self.namespaces.get(namespace_key).await else {
            return Ok(None);
        };

        let fields = slot.read().await;
        match fields.get(field_key) {
            Some(entry) if entry.expires_at > Instant::now() => Ok(Some(entry.data.clone())),
            Some(_) => {
                drop(fields);
                slot.write().await.remove(field_key);
                Ok(None)
            }
            None => Ok(None),
        }
    }

    async fn set_field(
        &self,
        namespace_key: &str,
        field_key: &str,
        value: &str,
        ttl: Duration,
    ) -> Result<(), DomainError> {
        let slot = self
            .namespaces
            .get_with(namespace_key.to_string(), async {
                Arc::new(RwLock::new(HashMap::new()))
            })
            .await;

        slot.write().await.insert(
            field_key.to_string(),
            FieldEntry {
                data: value.to_string(),
                expires_at: Instant::now() + ttl,
            },
        );

        Ok(())
    }

    async fn delete_namespace(&self, namespace_key: &str) -> Result<bool, DomainError> {
        Ok(self.namespaces.remove(namespace_key).await.is_some())
    }
}
