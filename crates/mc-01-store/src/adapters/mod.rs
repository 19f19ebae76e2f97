//! # Adapters
//!
//! - `memory`: ordered in-memory partitions and version storage.
//! - `rocksdb_adapter`: durable version storage (feature `rocksdb`).

pub mod memory;

#[cfg(feature = "rocksdb")]
pub mod rocksdb_adapter;

pub use memory::{InMemoryVersionStore, MemKvStore};

#[cfg(feature = "rocksdb")]
pub use rocksdb_adapter::{RocksDbConfig, RocksDbVersionStore, CF_METADATA, CF_VERSIONS};
