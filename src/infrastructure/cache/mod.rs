//! Cache infrastructure - Backing store implementations

mod factory;
mod in_memory;
mod redis;

pub use factory::{FieldStoreConfig, FieldStoreFactory, FieldStoreKind};
pub use in_memory::{InMemoryFieldStore, InMemoryFieldStoreConfig};
pub use redis::{RedisFieldStore, RedisFieldStoreConfig};
