//! Infrastructure services

mod query_cache;

pub use query_cache::{CachedQueryExecutor, QueryCacheConfig};
