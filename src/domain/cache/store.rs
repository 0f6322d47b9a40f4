//! Backing store trait definition

use std::fmt::Debug;
use std::time::Duration;

use async_trait::async_trait;

use crate::domain::DomainError;

/// The backing key-value store, as seen by the caching layer
///
/// A two-level mapping: each namespace key holds a sub-mapping of query keys
/// to serialized results. The three operations here are everything the layer
/// needs; expiry of stored fields is the store's responsibility.
#[async_trait]
pub trait FieldStore: Send + Sync + Debug {
    /// Looks up one serialized result under (namespace, field)
    async fn get_field(
        &self,
        namespace_key: &str,
        field_key: &str,
    ) -> Result<Option<String>, DomainError>;

    /// Stores one serialized result under (namespace, field) with a TTL
    async fn set_field(
        &self,
        namespace_key: &str,
        field_key: &str,
        value: &str,
        ttl: Duration,
    ) -> Result<(), DomainError>;

    /// Drops an entire namespace in one operation
    ///
    /// Returns `Ok(false)` when the namespace held nothing; deleting an empty
    /// namespace is not an error.
    async fn delete_namespace(&self, namespace_key: &str) -> Result<bool, DomainError>;
}
