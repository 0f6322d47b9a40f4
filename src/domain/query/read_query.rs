//! Read query description and caching annotation

use serde_json::Value;

use super::Criteria;

/// Shape of the result a read query produces
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum QueryMode {
    /// At most one document (`find_one`)
    One,
    /// An ordered sequence of documents (`find`)
    Many,
}

/// Namespace identifier scoping a group of cached queries
///
/// Kept as an opaque JSON value so callers can scope by numeric or string
/// principal IDs alike; canonicalized to a stable string at key-derivation
/// time.
#[derive(Debug, Clone, PartialEq)]
pub struct Namespace(Value);

impl Namespace {
    pub(crate) fn as_value(&self) -> &Value {
        &self.0
    }
}

impl From<&str> for Namespace {
    fn from(s: &str) -> Self {
        Self(Value::String(s.to_string()))
    }
}

impl From<String> for Namespace {
    fn from(s: String) -> Self {
        Self(Value::String(s))
    }
}

impl From<i64> for Namespace {
    fn from(n: i64) -> Self {
        Self(Value::from(n))
    }
}

impl From<u64> for Namespace {
    fn from(n: u64) -> Self {
        Self(Value::from(n))
    }
}

impl From<Value> for Namespace {
    fn from(value: Value) -> Self {
        Self(value)
    }
}

/// Caching annotation attached to an individual read query
///
/// A query without a policy is never cached; a policy without a namespace
/// falls back to the shared default namespace.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct CachePolicy {
    pub namespace: Option<Namespace>,
}

/// A read query against a document collection
#[derive(Debug, Clone)]
pub struct ReadQuery {
    /// Target collection name
    pub collection: String,
    /// Filter criteria
    pub criteria: Criteria,
    /// Expected result shape
    pub mode: QueryMode,
    /// Caching annotation; `None` means pass-through execution
    pub cache: Option<CachePolicy>,
}

impl ReadQuery {
    /// A query for a single document
    pub fn find_one(collection: impl Into<String>, criteria: Criteria) -> Self {
        Self {
            collection: collection.into(),
            criteria,
            mode: QueryMode::One,
            cache: None,
        }
    }

    /// A query for an ordered sequence of documents
    pub fn find(collection: impl Into<String>, criteria: Criteria) -> Self {
        Self {
            collection: collection.into(),
            criteria,
            mode: QueryMode::Many,
            cache: None,
        }
    }

    /// Opts the query into caching under the default namespace
    pub fn cached(mut self) -> Self {
        self.cache = Some(CachePolicy::default());
        self
    }

    /// Opts the query into caching under the given namespace
    pub fn cached_under(mut self, namespace: impl Into<Namespace>) -> Self {
        self.cache = Some(CachePolicy {
            namespace: Some(namespace.into()),
        });
        self
    }

    /// Whether this query carries a caching annotation
    pub fn is_cache_opted(&self) -> bool {
        self.cache.is_some()
    }
}
