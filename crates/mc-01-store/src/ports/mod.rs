//! # Ports
//!
//! - [`KvStore`]: ordered byte-store a keeper sees for one partition.
//! - [`MultiStoreRead`]: read side of a stack of branches, down to the root.
//! - [`VersionStore`]: durable storage for committed versions (driven port,
//!   implemented in-memory for tests and by RocksDB in production).

pub mod kv;
pub mod versions;

pub use kv::{KvStore, MultiStoreRead};
pub use versions::{CommittedVersion, VersionStore};
