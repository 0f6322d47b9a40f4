//! Docucache
//!
//! A transparent query-result caching layer for document stores. Read queries
//! opted into caching are memoized per namespace in a backing key-value store
//! (Redis or in-memory) and served from cache until their TTL elapses or the
//! namespace is invalidated after a write.
//!
//! ```no_run
//! use std::sync::Arc;
//!
//! use docucache::{
//!     CachedQueryExecutor, Criteria, FieldStoreConfig, FieldStoreFactory, Namespace, ReadQuery,
//! };
//!
//! # async fn example(engine: Arc<dyn docucache::QueryEngine>) -> Result<(), docucache::DomainError> {
//! let store = FieldStoreFactory::create(&FieldStoreConfig::in_memory()).await?;
//! let executor = CachedQueryExecutor::new(engine, store);
//!
//! // Reads opted into caching are memoized per user
//! let query = ReadQuery::find("Blog", Criteria::new().with("_user", 42)).cached_under(42i64);
//! let blogs = executor.execute(&query).await?;
//!
//! // After a write, drop everything cached for that user
//! executor.invalidate_namespace(&Namespace::from(42i64)).await?;
//! # let _ = blogs;
//! # Ok(())
//! # }
//! ```

pub mod config;
pub mod domain;
pub mod infrastructure;

pub use config::{AppConfig, CacheSettings, LogFormat, LoggingSettings};
pub use domain::{
    namespace_key, query_key, CachePolicy, Criteria, CriteriaValue, Document, DomainError,
    FieldStore, Namespace, QueryEngine, QueryMode, QueryResult, ReadQuery, DEFAULT_NAMESPACE,
};
pub use infrastructure::cache::{
    FieldStoreConfig, FieldStoreFactory, FieldStoreKind, InMemoryFieldStore,
    InMemoryFieldStoreConfig, RedisFieldStore, RedisFieldStoreConfig,
};
pub use infrastructure::logging::init_logging;
pub use infrastructure::services::{CachedQueryExecutor, QueryCacheConfig};
