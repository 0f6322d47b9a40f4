//! Filter criteria for read queries

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::domain::DomainError;

/// A single criterion value
///
/// Values serialize untagged, so criteria round-trip as plain JSON. Nested
/// maps cover operator objects such as `{"$gt": 5}`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum CriteriaValue {
    /// String value
    String(String),
    /// Integer value
    Integer(i64),
    /// Float value
    Float(f64),
    /// Boolean value
    Boolean(bool),
    /// List of values
    List(Vec<CriteriaValue>),
    /// Nested criteria object (e.g. comparison operators)
    Map(BTreeMap<String, CriteriaValue>),
    /// Null value
    Null,
}

impl CriteriaValue {
    /// Checks that the value has a canonical JSON form.
    ///
    /// JSON cannot represent non-finite floats; encoders silently degrade
    /// them, which would produce a degenerate cache key.
    pub(crate) fn ensure_canonical(&self) -> Result<(), DomainError> {
        match self {
            Self::Float(f) if !f.is_finite() => Err(DomainError::serialization(format!(
                "non-finite float '{}' cannot be canonically serialized",
                f
            ))),
            Self::List(items) => items.iter().try_for_each(Self::ensure_canonical),
            Self::Map(entries) => entries.values().try_for_each(Self::ensure_canonical),
            _ => Ok(()),
        }
    }
}

impl From<&str> for CriteriaValue {
    fn from(s: &str) -> Self {
        Self::String(s.to_string())
    }
}

impl From<String> for CriteriaValue {
    fn from(s: String) -> Self {
        Self::String(s)
    }
}

impl From<i64> for CriteriaValue {
    fn from(n: i64) -> Self {
        Self::Integer(n)
    }
}

impl From<i32> for CriteriaValue {
    fn from(n: i32) -> Self {
        Self::Integer(n as i64)
    }
}

impl From<f64> for CriteriaValue {
    fn from(n: f64) -> Self {
        Self::Float(n)
    }
}

impl From<bool> for CriteriaValue {
    fn from(b: bool) -> Self {
        Self::Boolean(b)
    }
}

impl<T: Into<CriteriaValue>> From<Vec<T>> for CriteriaValue {
    fn from(list: Vec<T>) -> Self {
        Self::List(list.into_iter().map(|v| v.into()).collect())
    }
}

impl From<Criteria> for CriteriaValue {
    fn from(criteria: Criteria) -> Self {
        Self::Map(criteria.0)
    }
}

/// The filter criteria of a read query
///
/// Fields are kept sorted by name, so two criteria built with the same
/// key-value pairs in different insertion order are indistinguishable.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Criteria(BTreeMap<String, CriteriaValue>);

impl Criteria {
    /// Creates empty criteria (matches everything)
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds a field criterion
    pub fn with(mut self, field: impl Into<String>, value: impl Into<CriteriaValue>) -> Self {
        self.0.insert(field.into(), value.into());
        self
    }

    /// Returns true if no criteria are set
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Number of field criteria
    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub(crate) fn ensure_canonical(&self) -> Result<(), DomainError> {
        self.0.values().try_for_each(CriteriaValue::ensure_canonical)
    }
}
