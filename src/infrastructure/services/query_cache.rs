//! Query-result caching service
//!
//! Wraps a query engine so cache-opted reads are memoized in the backing
//! store under (namespace key, query key) and invalidated namespace-wide
//! after writes.

use std::fmt;
use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use tracing::{debug, warn};

use crate::config::CacheSettings;
use crate::domain::cache::{self, FieldStore};
use crate::domain::query::{Namespace, QueryEngine, QueryResult, ReadQuery};
use crate::domain::DomainError;

/// Configuration for the caching executor
#[derive(Debug, Clone)]
pub struct QueryCacheConfig {
    /// TTL applied to every populated entry
    pub default_ttl: Duration,
}

impl Default for QueryCacheConfig {
    fn default() -> Self {
        Self {
            // 1 day
            default_ttl: Duration::from_secs(86_400),
        }
    }
}

impl QueryCacheConfig {
    /// Sets the default TTL
    pub fn with_default_ttl(mut self, ttl: Duration) -> Self {
        self.default_ttl = ttl;
        self
    }
}

impl From<&CacheSettings> for QueryCacheConfig {
    fn from(settings: &CacheSettings) -> Self {
        Self {
            default_ttl: settings.default_ttl(),
        }
    }
}

/// Cache-aware query executor
///
/// A decorator over the real engine: unopted queries pass straight through;
/// opted queries are looked up in the backing store first, and populated on a
/// miss. Lookup and populate failures degrade to plain execution, so a
/// backing store outage costs cache benefit, never correctness.
///
/// Invalidation is namespace-wide only. A populate racing a concurrent
/// invalidation may reinstate a stale entry until its TTL elapses or the next
/// invalidation lands; repeat reads are idempotent, so this window is
/// tolerated rather than locked away.
pub struct CachedQueryExecutor {
    engine: Arc<dyn QueryEngine>,
    store: Arc<dyn FieldStore>,
    config: QueryCacheConfig,
}

impl fmt::Debug for CachedQueryExecutor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CachedQueryExecutor")
            .field("store", &self.store)
            .field("config", &self.config)
            .finish()
    }
}

impl CachedQueryExecutor {
    /// Creates an executor with the default configuration
    pub fn new(engine: Arc<dyn QueryEngine>, store: Arc<dyn FieldStore>) -> Self {
        Self::with_config(engine, store, QueryCacheConfig::default())
    }

    /// Creates an executor with a custom configuration
    pub fn with_config(
        engine: Arc<dyn QueryEngine>,
        store: Arc<dyn FieldStore>,
        config: QueryCacheConfig,
    ) -> Self {
        Self {
            engine,
            store,
            config,
        }
    }

    /// Executes a read query, serving it from cache when possible
    ///
    /// Key-derivation failures surface as `Serialization` errors; nothing is
    /// cached under a degenerate key. Engine failures surface as-is.
    pub async fn execute(&self, query: &ReadQuery) -> Result<QueryResult, DomainError> {
        let Some(policy) = &query.cache else {
            return self.engine.execute(query).await;
        };

        let namespace_key = cache::namespace_key(policy.namespace.as_ref());
        let field_key = cache::query_key(&query.criteria, &query.collection)?;

        if let Some(result) = self.lookup(&namespace_key, &field_key).await {
            debug!(collection = %query.collection, "cache hit");
            return Ok(result);
        }

        debug!(collection = %query.collection, "cache miss");
        let result = self.engine.execute(query).await?;

        let payload = serde_json::to_string(&result).map_err(|e| {
            DomainError::serialization(format!("failed to encode result for caching: {}", e))
        })?;

        // A failed cache write never fails a successful read.
        if let Err(err) = self
            .store
            .set_field(&namespace_key, &field_key, &payload, self.config.default_ttl)
            .await
        {
            warn!(error = %err, "failed to populate cache");
        }

        Ok(result)
    }

    /// Drops every cached query under the namespace
    ///
    /// Idempotent: returns `Ok(false)` when nothing was cached. Store
    /// failures surface to the caller, since silently keeping stale entries
    /// would go unnoticed until their TTL.
    pub async fn invalidate_namespace(&self, namespace: &Namespace) -> Result<bool, DomainError> {
        let namespace_key = cache::namespace_key(Some(namespace));
        let deleted = self.store.delete_namespace(&namespace_key).await?;
        debug!(namespace = %namespace_key, deleted, "namespace invalidated");
        Ok(deleted)
    }

    /// Runs a write operation, then invalidates the namespace it touched
    ///
    /// The write's own failure is returned untouched and skips invalidation;
    /// an invalidation failure after a successful write surfaces so the
    /// caller can retry or warn.
    pub async fn invalidate_after<T, F>(
        &self,
        namespace: &Namespace,
        write: F,
    ) -> Result<T, DomainError>
    where
        F: Future<Output = Result<T, DomainError>> + Send,
        T: Send,
    {
        let outcome = write.await?;
        self.invalidate_namespace(namespace).await?;
        Ok(outcome)
    }

    async fn lookup(&self, namespace_key: &str, field_key: &str) -> Option<QueryResult> {
        let payload = match self.store.get_field(namespace_key, field_key).await {
            Ok(Some(payload)) => payload,
            Ok(None) => return None,
            Err(err) => {
                warn!(error = %err, "cache lookup failed, falling back to engine");
                return None;
            }
        };

        match serde_json::from_str(&payload) {
            Ok(result) => Some(result),
            Err(err) => {
                // Malformed entry: treat as a miss and let repopulation
                // overwrite it.
                warn!(error = %err, "cached payload malformed, treating as miss");
                None
            }
        }
    }
}

// The executor is itself an engine, so call sites can layer caching over the
// real engine without changing their signatures.
#[async_trait]
impl QueryEngine for CachedQueryExecutor {
    async fn execute(&self, query: &ReadQuery) -> Result<QueryResult, DomainError> {
        CachedQueryExecutor::execute(self, query).await
    }
}

#[cfg(test)]
mod tests {
    use serde::{Deserialize, Serialize};

    use crate::domain::cache::MockFieldStore;
    use crate::domain::query::{Criteria, Document, MockQueryEngine};

    use super::*;

    #[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
    struct Blog {
        _id: i64,
        _user: i64,
        title: String,
    }

    fn blog(id: i64) -> Blog {
        Blog {
            _id: id,
            _user: 42,
            title: format!("post {}", id),
        }
    }

    fn one_blog(id: i64) -> QueryResult {
        QueryResult::One(Document::from_model(&blog(id)).unwrap())
    }

    fn blog_list() -> QueryResult {
        QueryResult::Many(
            (1..=3)
                .map(|id| Document::from_model(&blog(id)).unwrap())
                .collect(),
        )
    }

    fn single_query() -> ReadQuery {
        ReadQuery::find_one("Blog", Criteria::new().with("_user", 42).with("_id", 7))
            .cached_under("42")
    }

    fn list_query() -> ReadQuery {
        ReadQuery::find("Blog", Criteria::new().with("_user", 42)).cached_under("42")
    }

    fn executor_with(
        engine: MockQueryEngine,
        store: MockFieldStore,
    ) -> (CachedQueryExecutor, Arc<MockFieldStore>) {
        let store = Arc::new(store);
        let executor = CachedQueryExecutor::new(Arc::new(engine), store.clone());
        (executor, store)
    }

    #[tokio::test]
    async fn test_unopted_query_passes_through() {
        let mut engine = MockQueryEngine::new();
        engine
            .expect_execute()
            .times(1)
            .returning(|_| Ok(one_blog(7)));

        let (executor, store) = executor_with(engine, MockFieldStore::new());
        let query = ReadQuery::find_one("Blog", Criteria::new().with("_id", 7));

        let result = executor.execute(&query).await.unwrap();
        assert_eq!(result, one_blog(7));
        // Nothing was written to the store
        assert_eq!(store.field_count(r#""42""#), 0);
        assert_eq!(store.field_count(r#""cache""#), 0);
    }

    #[tokio::test]
    async fn test_first_execution_misses_and_populates() {
        let mut engine = MockQueryEngine::new();
        engine
            .expect_execute()
            .times(1)
            .returning(|_| Ok(one_blog(7)));

        let (executor, store) = executor_with(engine, MockFieldStore::new());

        let result = executor.execute(&single_query()).await.unwrap();
        assert_eq!(result, one_blog(7));
        assert_eq!(store.field_count(r#""42""#), 1);

        let field_key = r#"{"_id":7,"_user":42,"collection":"Blog"}"#;
        let payload = store.field(r#""42""#, field_key).expect("populated entry");
        let cached: QueryResult = serde_json::from_str(&payload).unwrap();
        assert_eq!(cached, one_blog(7));
    }

    #[tokio::test]
    async fn test_second_execution_hits_without_engine() {
        let mut engine = MockQueryEngine::new();
        engine
            .expect_execute()
            .times(1)
            .returning(|_| Ok(one_blog(7)));

        let (executor, _store) = executor_with(engine, MockFieldStore::new());

        let first = executor.execute(&single_query()).await.unwrap();
        let second = executor.execute(&single_query()).await.unwrap();

        // times(1) on the engine proves the hit short-circuited execution
        assert_eq!(first, second);
        assert_eq!(second.decode_one::<Blog>().unwrap(), Some(blog(7)));
    }

    #[tokio::test]
    async fn test_default_namespace_when_none_supplied() {
        let mut engine = MockQueryEngine::new();
        engine
            .expect_execute()
            .times(1)
            .returning(|_| Ok(one_blog(7)));

        let (executor, store) = executor_with(engine, MockFieldStore::new());
        let query = ReadQuery::find_one("Blog", Criteria::new().with("_id", 7)).cached();

        executor.execute(&query).await.unwrap();
        assert_eq!(store.field_count(r#""cache""#), 1);
    }

    #[tokio::test]
    async fn test_invalidation_clears_every_query_in_namespace() {
        let mut engine = MockQueryEngine::new();
        // Two distinct queries, each executed twice: 2 initial misses plus 2
        // re-executions after invalidation.
        engine.expect_execute().times(4).returning(|query| {
            if query.mode == crate::domain::query::QueryMode::One {
                Ok(one_blog(7))
            } else {
                Ok(blog_list())
            }
        });

        let (executor, store) = executor_with(engine, MockFieldStore::new());

        executor.execute(&single_query()).await.unwrap();
        executor.execute(&list_query()).await.unwrap();
        assert_eq!(store.field_count(r#""42""#), 2);

        let deleted = executor
            .invalidate_namespace(&Namespace::from("42"))
            .await
            .unwrap();
        assert!(deleted);
        assert_eq!(store.field_count(r#""42""#), 0);

        // Both queries miss again
        executor.execute(&single_query()).await.unwrap();
        executor.execute(&list_query()).await.unwrap();
    }

    #[tokio::test]
    async fn test_invalidation_is_idempotent() {
        let engine = MockQueryEngine::new();
        let (executor, _store) = executor_with(engine, MockFieldStore::new());

        let deleted = executor
            .invalidate_namespace(&Namespace::from("42"))
            .await
            .unwrap();
        assert!(!deleted);
    }

    #[tokio::test]
    async fn test_invalidation_does_not_cross_namespaces() {
        let mut engine = MockQueryEngine::new();
        engine
            .expect_execute()
            .times(2)
            .returning(|_| Ok(one_blog(7)));

        let (executor, store) = executor_with(engine, MockFieldStore::new());

        let theirs = ReadQuery::find_one("Blog", Criteria::new().with("_id", 7)).cached_under("41");
        executor.execute(&single_query()).await.unwrap();
        executor.execute(&theirs).await.unwrap();

        executor
            .invalidate_namespace(&Namespace::from("42"))
            .await
            .unwrap();

        assert_eq!(store.field_count(r#""42""#), 0);
        assert_eq!(store.field_count(r#""41""#), 1);
    }

    #[tokio::test]
    async fn test_lookup_outage_degrades_to_miss() {
        let mut engine = MockQueryEngine::new();
        engine
            .expect_execute()
            .times(1)
            .returning(|_| Ok(blog_list()));

        let store = MockFieldStore::new().with_get_error("connection refused");
        let (executor, _store) = executor_with(engine, store);

        // The read succeeds with the authoritative result; no error surfaces
        let result = executor.execute(&list_query()).await.unwrap();
        assert_eq!(result, blog_list());
    }

    #[tokio::test]
    async fn test_populate_outage_never_fails_the_read() {
        let mut engine = MockQueryEngine::new();
        engine
            .expect_execute()
            .times(1)
            .returning(|_| Ok(one_blog(7)));

        let store = MockFieldStore::new().with_set_error("connection refused");
        let (executor, _store) = executor_with(engine, store);

        let result = executor.execute(&single_query()).await.unwrap();
        assert_eq!(result, one_blog(7));
    }

    #[tokio::test]
    async fn test_invalidation_outage_surfaces() {
        let engine = MockQueryEngine::new();
        let store = MockFieldStore::new().with_delete_error("connection refused");
        let (executor, _store) = executor_with(engine, store);

        let err = executor
            .invalidate_namespace(&Namespace::from("42"))
            .await
            .unwrap_err();
        assert!(matches!(err, DomainError::Store { .. }));
    }

    #[tokio::test]
    async fn test_corrupt_cached_payload_is_a_miss() {
        let mut engine = MockQueryEngine::new();
        engine
            .expect_execute()
            .times(1)
            .returning(|_| Ok(one_blog(7)));

        let field_key = r#"{"_id":7,"_user":42,"collection":"Blog"}"#;
        let store = MockFieldStore::new().with_field(r#""42""#, field_key, "{not json");
        let (executor, store) = executor_with(engine, store);

        let result = executor.execute(&single_query()).await.unwrap();
        assert_eq!(result, one_blog(7));

        // Repopulation overwrote the corrupt entry
        let payload = store.field(r#""42""#, field_key).unwrap();
        assert!(serde_json::from_str::<QueryResult>(&payload).is_ok());
    }

    #[tokio::test]
    async fn test_key_derivation_failure_surfaces_and_skips_engine() {
        let engine = MockQueryEngine::new();
        let (executor, store) = executor_with(engine, MockFieldStore::new());

        let query = ReadQuery::find("Blog", Criteria::new().with("score", f64::NAN))
            .cached_under("42");

        let err = executor.execute(&query).await.unwrap_err();
        assert!(matches!(err, DomainError::Serialization { .. }));
        assert_eq!(store.field_count(r#""42""#), 0);
    }

    #[tokio::test]
    async fn test_engine_failure_surfaces_and_populates_nothing() {
        let mut engine = MockQueryEngine::new();
        engine
            .expect_execute()
            .times(1)
            .returning(|_| Err(DomainError::engine("collection missing")));

        let (executor, store) = executor_with(engine, MockFieldStore::new());

        let err = executor.execute(&single_query()).await.unwrap_err();
        assert!(matches!(err, DomainError::Engine { .. }));
        assert_eq!(store.field_count(r#""42""#), 0);
    }

    #[tokio::test]
    async fn test_empty_result_is_cached_too() {
        let mut engine = MockQueryEngine::new();
        engine
            .expect_execute()
            .times(1)
            .returning(|_| Ok(QueryResult::None));

        let (executor, _store) = executor_with(engine, MockFieldStore::new());

        let first = executor.execute(&single_query()).await.unwrap();
        let second = executor.execute(&single_query()).await.unwrap();
        assert_eq!(first, QueryResult::None);
        assert_eq!(second, QueryResult::None);
    }

    #[tokio::test]
    async fn test_list_round_trip_through_cache() {
        let mut engine = MockQueryEngine::new();
        engine
            .expect_execute()
            .times(1)
            .returning(|_| Ok(blog_list()));

        let (executor, _store) = executor_with(engine, MockFieldStore::new());

        executor.execute(&list_query()).await.unwrap();
        let cached = executor.execute(&list_query()).await.unwrap();

        let blogs: Vec<Blog> = cached.decode_many().unwrap();
        assert_eq!(blogs, vec![blog(1), blog(2), blog(3)]);
    }

    #[tokio::test]
    async fn test_invalidate_after_runs_write_then_invalidates() {
        let mut engine = MockQueryEngine::new();
        engine
            .expect_execute()
            .times(2)
            .returning(|_| Ok(one_blog(7)));

        let (executor, store) = executor_with(engine, MockFieldStore::new());

        executor.execute(&single_query()).await.unwrap();
        assert_eq!(store.field_count(r#""42""#), 1);

        let saved = executor
            .invalidate_after(&Namespace::from("42"), async { Ok(blog(8)) })
            .await
            .unwrap();
        assert_eq!(saved, blog(8));
        assert_eq!(store.field_count(r#""42""#), 0);

        // The next identical read misses again
        executor.execute(&single_query()).await.unwrap();
    }

    #[tokio::test]
    async fn test_invalidate_after_propagates_write_failure() {
        let engine = MockQueryEngine::new();
        let store = MockFieldStore::new().with_field(r#""42""#, "q", "null");
        let (executor, store) = executor_with(engine, store);

        let err = executor
            .invalidate_after::<Blog, _>(&Namespace::from("42"), async {
                Err(DomainError::engine("write rejected"))
            })
            .await
            .unwrap_err();

        assert!(matches!(err, DomainError::Engine { .. }));
        // A failed write invalidates nothing
        assert_eq!(store.field_count(r#""42""#), 1);
    }

    #[tokio::test]
    async fn test_executor_works_through_the_engine_trait() {
        let mut engine = MockQueryEngine::new();
        engine
            .expect_execute()
            .times(1)
            .returning(|_| Ok(one_blog(7)));

        let (executor, _store) = executor_with(engine, MockFieldStore::new());
        let layered: Arc<dyn QueryEngine> = Arc::new(executor);

        let result = layered.execute(&single_query()).await.unwrap();
        assert_eq!(result, one_blog(7));
    }

    #[tokio::test]
    async fn test_ttl_expired_entry_behaves_as_miss() {
        use crate::infrastructure::cache::InMemoryFieldStore;

        let mut engine = MockQueryEngine::new();
        engine
            .expect_execute()
            .times(2)
            .returning(|_| Ok(one_blog(7)));

        let store = Arc::new(InMemoryFieldStore::new());
        let executor = CachedQueryExecutor::with_config(
            Arc::new(engine),
            store,
            QueryCacheConfig::default().with_default_ttl(Duration::from_millis(20)),
        );

        executor.execute(&single_query()).await.unwrap();
        tokio::time::sleep(Duration::from_millis(50)).await;

        // times(2) on the engine proves the expired entry was not served
        executor.execute(&single_query()).await.unwrap();
    }
}
