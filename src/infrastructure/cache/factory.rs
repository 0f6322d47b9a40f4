//! Backing store factory for runtime selection

use std::sync::Arc;

use crate::config::CacheSettings;
use crate::domain::cache::FieldStore;
use crate::domain::DomainError;

use super::in_memory::{InMemoryFieldStore, InMemoryFieldStoreConfig};
use super::redis::{RedisFieldStore, RedisFieldStoreConfig};

/// Supported backing store kinds
#[derive(Debug, Clone, Default, PartialEq)]
pub enum FieldStoreKind {
    /// In-memory store using moka
    #[default]
    InMemory,
    /// Redis store
    Redis,
}

impl std::fmt::Display for FieldStoreKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            FieldStoreKind::InMemory => write!(f, "in_memory"),
            FieldStoreKind::Redis => write!(f, "redis"),
        }
    }
}

impl std::str::FromStr for FieldStoreKind {
    type Err = DomainError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "in_memory" | "inmemory" | "memory" => Ok(FieldStoreKind::InMemory),
            "redis" => Ok(FieldStoreKind::Redis),
            _ => Err(DomainError::configuration(format!(
                "Unknown backing store kind: {}. Valid kinds: in_memory, redis",
                s
            ))),
        }
    }
}

/// Configuration for the backing store factory
#[derive(Debug, Clone, Default)]
pub struct FieldStoreConfig {
    /// Kind of store to create
    pub kind: FieldStoreKind,
    /// Redis URL (required for the Redis kind)
    pub redis_url: Option<String>,
    /// Prefix applied to every namespace key
    pub key_prefix: Option<String>,
    /// Maximum namespace capacity (in-memory only)
    pub max_namespaces: Option<u64>,
}

impl FieldStoreConfig {
    /// Creates a configuration for the in-memory store
    pub fn in_memory() -> Self {
        Self::default()
    }

    /// Creates a configuration for the Redis store
    pub fn redis(url: impl Into<String>) -> Self {
        Self {
            kind: FieldStoreKind::Redis,
            redis_url: Some(url.into()),
            ..Default::default()
        }
    }

    /// Sets the key prefix
    pub fn with_key_prefix(mut self, prefix: impl Into<String>) -> Self {
        self.key_prefix = Some(prefix.into());
        self
    }

    /// Sets the maximum namespace capacity (in-memory only)
    pub fn with_max_namespaces(mut self, capacity: u64) -> Self {
        self.max_namespaces = Some(capacity);
        self
    }

    /// Builds factory configuration from application settings
    pub fn from_settings(settings: &CacheSettings) -> Result<Self, DomainError> {
        Ok(Self {
            kind: settings.backend.parse()?,
            redis_url: settings.redis_url.clone(),
            key_prefix: settings.key_prefix.clone(),
            max_namespaces: None,
        })
    }
}

/// Factory for creating backing store instances
#[derive(Debug, Default)]
pub struct FieldStoreFactory;

impl FieldStoreFactory {
    /// Creates a backing store from the given configuration
    pub async fn create(config: &FieldStoreConfig) -> Result<Arc<dyn FieldStore>, DomainError> {
        match config.kind {
            FieldStoreKind::InMemory => {
                let mut store_config = InMemoryFieldStoreConfig::default();
                if let Some(capacity) = config.max_namespaces {
                    store_config = store_config.with_max_namespaces(capacity);
                }

                tracing::info!("Creating in-memory backing store");
                Ok(Arc::new(InMemoryFieldStore::with_config(store_config)))
            }
            FieldStoreKind::Redis => {
                let url = config.redis_url.as_ref().ok_or_else(|| {
                    DomainError::configuration("Redis backing store requires a redis_url")
                })?;

                let mut store_config = RedisFieldStoreConfig::new(url);
                if let Some(prefix) = &config.key_prefix {
                    store_config = store_config.with_key_prefix(prefix.clone());
                }

                tracing::info!(url = %url, "Creating Redis backing store");
                let store = RedisFieldStore::new(store_config).await?;
                Ok(Arc::new(store))
            }
        }
    }
}
