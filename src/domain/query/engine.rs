//! Query engine trait - the document store's execution seam

use async_trait::async_trait;

#[cfg(test)]
use mockall::automock;

use crate::domain::DomainError;

use super::{QueryResult, ReadQuery};

/// Executes read queries against the underlying document store
///
/// The store's own query machinery is an external collaborator; the caching
/// layer only needs a way to obtain the authoritative result for a query.
#[cfg_attr(test, automock)]
#[async_trait]
pub trait QueryEngine: Send + Sync {
    /// Executes the query and returns the authoritative result
    async fn execute(&self, query: &ReadQuery) -> Result<QueryResult, DomainError>;
}
