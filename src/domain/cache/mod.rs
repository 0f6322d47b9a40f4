//! Cache domain - key derivation and the backing store seam

mod key;
mod store;

pub use key::{namespace_key, query_key, DEFAULT_NAMESPACE};
pub use store::FieldStore;

#[cfg(test)]
pub use store::mock::MockFieldStore;
