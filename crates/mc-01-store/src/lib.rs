//! # mc-01-store
//!
//! Store Partition Registry and the reference store engine.
//!
//! ## Role in System
//!
//! - **Registry**: issues one opaque, globally unique [`StoreKey`] per
//!   (name, kind). A key is the only way to reach a partition.
//! - **Engine**: [`CommitMultiStore`] mounts one isolated region per issued
//!   key, versions persistent regions by block height and restores any
//!   retained height.
//! - **Branching**: [`CacheMultiStore`] is a copy-on-write branch used for the
//!   in-progress block (and nested per transaction). Dropping it discards
//!   every write, which is what makes a failed block leave no trace.
//!
//! ```text
//! StoreRegistry ──allocate──→ StoreKey ──mount──→ CommitMultiStore
//!                                │                     ▲
//!                                │                     │ write + commit
//!                         Keeper │                     │
//!                                ▼                     │
//!                     Partition<'_> ←── CacheMultiStore (block branch)
//! ```
//!
//! ## Partition kinds
//!
//! - **Persistent**: versioned, hashed into the app hash.
//! - **Transient**: cleared at every commit.
//! - **Memory**: survives commits, never persisted, cleared on reload.

pub mod adapters;
pub mod domain;
pub mod multistore;
pub mod ports;

pub use adapters::*;
pub use domain::*;
pub use multistore::*;
pub use ports::*;
