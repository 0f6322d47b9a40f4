//! Cache key derivation
//!
//! Two-level keys: a namespace key groups every cached query belonging to one
//! logical owner, and a query key identifies one query within the namespace.
//! Both are canonical JSON strings, so derivation is deterministic.

use serde_json::Value;

use crate::domain::query::{Criteria, Namespace};
use crate::domain::DomainError;

/// Namespace used when a cache-opted query supplies none
pub const DEFAULT_NAMESPACE: &str = "cache";

/// Canonicalizes a namespace identifier into a stable string
///
/// The identifier is rendered as compact JSON, so `42` and `"42"` derive
/// distinct keys and the same input always derives the same output.
pub fn namespace_key(namespace: Option<&Namespace>) -> String {
    match namespace {
        Some(ns) => ns.as_value().to_string(),
        None => Value::String(DEFAULT_NAMESPACE.to_string()).to_string(),
    }
}

/// Derives the query key from filter criteria and the target collection
///
/// The criteria fields are merged with the collection name into a single
/// object and rendered as compact JSON with sorted keys. Identical criteria
/// against the same collection always derive the same key, regardless of the
/// order the criteria were built in.
pub fn query_key(criteria: &Criteria, collection: &str) -> Result<String, DomainError> {
    criteria.ensure_canonical()?;

    let value = serde_json::to_value(criteria)
        .map_err(|e| DomainError::serialization(format!("failed to encode criteria: {}", e)))?;

    let Value::Object(mut merged) = value else {
        return Err(DomainError::serialization(
            "criteria did not encode to an object",
        ));
    };

    merged.insert(
        "collection".to_string(),
        Value::String(collection.to_string()),
    );

    Ok(Value::Object(merged).to_string())
}
