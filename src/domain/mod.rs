//! Domain layer - Core types and collaborator seams

pub mod cache;
pub mod error;
pub mod query;

pub use cache::{namespace_key, query_key, FieldStore, DEFAULT_NAMESPACE};
pub use error::DomainError;
pub use query::{
    CachePolicy, Criteria, CriteriaValue, Document, Namespace, QueryEngine, QueryMode, QueryResult,
    ReadQuery,
};
