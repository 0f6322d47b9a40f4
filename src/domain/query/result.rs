//! Query results and document reconstruction

use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::domain::DomainError;

/// A document as a plain structured value
///
/// The raw form every collection entry takes on the wire and in the cache.
/// Typed domain objects are reconstructed from it via [`Document::to_model`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Document(serde_json::Map<String, Value>);

impl Document {
    /// Builds a document from any serializable domain object
    pub fn from_model<M: Serialize>(model: &M) -> Result<Self, DomainError> {
        let value = serde_json::to_value(model).map_err(|e| {
            DomainError::serialization(format!("failed to encode document: {}", e))
        })?;

        match value {
            Value::Object(fields) => Ok(Self(fields)),
            other => Err(DomainError::serialization(format!(
                "expected an object-shaped document, got {}",
                other
            ))),
        }
    }

    /// Reconstructs a typed domain object from the document
    pub fn to_model<M: DeserializeOwned>(&self) -> Result<M, DomainError> {
        serde_json::from_value(Value::Object(self.0.clone())).map_err(|e| {
            DomainError::serialization(format!("failed to reconstruct document: {}", e))
        })
    }

    /// Raw field access
    pub fn get(&self, field: &str) -> Option<&Value> {
        self.0.get(field)
    }
}

/// The result of executing a read query
///
/// Serialized untagged: an array payload round-trips as an ordered sequence,
/// an object payload as a single document, and `null` as an empty result.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum QueryResult {
    /// An ordered sequence of documents
    Many(Vec<Document>),
    /// A single document
    One(Document),
    /// No matching document
    None,
}

impl QueryResult {
    /// Reconstructs the single document as a typed domain object
    ///
    /// Returns `Ok(None)` for an empty result and an error for a sequence.
    pub fn decode_one<M: DeserializeOwned>(&self) -> Result<Option<M>, DomainError> {
        match self {
            Self::One(doc) => Ok(Some(doc.to_model()?)),
            Self::None => Ok(None),
            Self::Many(_) => Err(DomainError::serialization(
                "expected a single document, got a sequence",
            )),
        }
    }

    /// Reconstructs the sequence as typed domain objects
    ///
    /// Returns an empty vector for an empty result and an error for a single
    /// document.
    pub fn decode_many<M: DeserializeOwned>(&self) -> Result<Vec<M>, DomainError> {
        match self {
            Self::Many(docs) => docs.iter().map(Document::to_model).collect(),
            Self::None => Ok(Vec::new()),
            Self::One(_) => Err(DomainError::serialization(
                "expected a sequence, got a single document",
            )),
        }
    }

    /// Whether the result holds no documents at all
    pub fn is_empty(&self) -> bool {
        match self {
            Self::Many(docs) => docs.is_empty(),
            Self::One(_) => false,
            Self::None => true,
        }
    }
}
