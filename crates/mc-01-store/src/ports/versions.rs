use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use shared_types::Hash;

use crate::domain::StoreError;

/// Full contents of every persistent partition as of one committed height.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CommittedVersion {
    pub height: u64,
    pub app_hash: Hash,
    /// Partition name -> ordered contents.
    pub partitions: BTreeMap<String, BTreeMap<Vec<u8>, Vec<u8>>>,
}

/// Durable storage for committed versions.
///
/// Production: `RocksDbVersionStore` (feature `rocksdb`)
/// Testing: `InMemoryVersionStore`
pub trait VersionStore: Send + Sync {
    /// Persist a committed version.
    ///
    /// Any retained version at or above its height is dropped first: a new
    /// commit at `h` supersedes the history that followed an earlier `h`.
    fn save_version(&self, version: &CommittedVersion) -> Result<(), StoreError>;

    /// Load the version committed at `height`, if retained.
    fn load_version(&self, height: u64) -> Result<Option<CommittedVersion>, StoreError>;

    /// Highest retained height.
    fn latest_height(&self) -> Result<Option<u64>, StoreError>;

    /// Highest height removed by pruning.
    fn pruned_through(&self) -> Result<Option<u64>, StoreError>;

    /// Remove every version strictly below `keep_from`. Returns how many were removed.
    fn prune_below(&self, keep_from: u64) -> Result<u64, StoreError>;
}
