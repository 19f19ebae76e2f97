use std::collections::BTreeMap;

use parking_lot::RwLock;

use crate::domain::StoreError;
use crate::ports::{CommittedVersion, KvStore, VersionStore};

/// Ordered in-memory partition backed by a `BTreeMap`.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct MemKvStore {
    data: BTreeMap<Vec<u8>, Vec<u8>>,
}

impl MemKvStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Build from existing ordered contents.
    pub fn from_map(data: BTreeMap<Vec<u8>, Vec<u8>>) -> Self {
        Self { data }
    }

    /// Ordered view of the contents.
    pub fn as_map(&self) -> &BTreeMap<Vec<u8>, Vec<u8>> {
        &self.data
    }

    /// Apply a branch's pending writes (`None` deletes).
    pub fn apply(&mut self, writes: BTreeMap<Vec<u8>, Option<Vec<u8>>>) {
        for (key, value) in writes {
            match value {
                Some(value) => {
                    self.data.insert(key, value);
                }
                None => {
                    self.data.remove(&key);
                }
            }
        }
    }

    pub fn clear(&mut self) {
        self.data.clear();
    }

    pub fn len(&self) -> usize {
        self.data.len()
    }

    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }
}

impl KvStore for MemKvStore {
    fn get(&self, key: &[u8]) -> Result<Option<Vec<u8>>, StoreError> {
        Ok(self.data.get(key).cloned())
    }

    fn set(&mut self, key: &[u8], value: &[u8]) -> Result<(), StoreError> {
        self.data.insert(key.to_vec(), value.to_vec());
        Ok(())
    }

    fn delete(&mut self, key: &[u8]) -> Result<(), StoreError> {
        self.data.remove(key);
        Ok(())
    }

    fn iter_prefix(&self, prefix: &[u8]) -> Result<Vec<(Vec<u8>, Vec<u8>)>, StoreError> {
        Ok(self
            .data
            .range(prefix.to_vec()..)
            .take_while(|(k, _)| k.starts_with(prefix))
            .map(|(k, v)| (k.clone(), v.clone()))
            .collect())
    }
}

/// In-memory implementation of [`VersionStore`] for testing and devnets.
#[derive(Default)]
pub struct InMemoryVersionStore {
    versions: RwLock<BTreeMap<u64, CommittedVersion>>,
    pruned_through: RwLock<Option<u64>>,
}

impl InMemoryVersionStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Retained heights, ascending.
    pub fn heights(&self) -> Vec<u64> {
        self.versions.read().keys().copied().collect()
    }
}

impl VersionStore for InMemoryVersionStore {
    fn save_version(&self, version: &CommittedVersion) -> Result<(), StoreError> {
        let mut versions = self.versions.write();
        versions.retain(|height, _| *height < version.height);
        versions.insert(version.height, version.clone());
        Ok(())
    }

    fn load_version(&self, height: u64) -> Result<Option<CommittedVersion>, StoreError> {
        Ok(self.versions.read().get(&height).cloned())
    }

    fn latest_height(&self) -> Result<Option<u64>, StoreError> {
        Ok(self.versions.read().keys().next_back().copied())
    }

    fn pruned_through(&self) -> Result<Option<u64>, StoreError> {
        Ok(*self.pruned_through.read())
    }

    fn prune_below(&self, keep_from: u64) -> Result<u64, StoreError> {
        let mut versions = self.versions.write();
        let doomed: Vec<u64> = versions.range(..keep_from).map(|(h, _)| *h).collect();
        for height in &doomed {
            versions.remove(height);
        }

        if let Some(highest) = doomed.last() {
            let mut pruned = self.pruned_through.write();
            *pruned = Some(pruned.map_or(*highest, |p| p.max(*highest)));
        }

        Ok(doomed.len() as u64)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn version(height: u64) -> CommittedVersion {
        CommittedVersion {
            height,
            app_hash: [height as u8; 32],
            partitions: BTreeMap::new(),
        }
    }

    #[test]
    fn test_prefix_iteration_is_ordered_and_bounded() {
        let mut kv = MemKvStore::new();
        kv.set(b"b/2", b"x").unwrap();
        kv.set(b"a/1", b"y").unwrap();
        kv.set(b"b/1", b"z").unwrap();
        kv.set(b"c", b"w").unwrap();

        let keys: Vec<_> = kv
            .iter_prefix(b"b/")
            .unwrap()
            .into_iter()
            .map(|(k, _)| k)
            .collect();
        assert_eq!(keys, vec![b"b/1".to_vec(), b"b/2".to_vec()]);
    }

    #[test]
    fn test_kv_delete() {
        let mut kv = MemKvStore::new();
        kv.set(b"k", b"v").unwrap();
        assert!(kv.has(b"k").unwrap());
        kv.delete(b"k").unwrap();
        assert_eq!(kv.get(b"k").unwrap(), None);
    }

    #[test]
    fn test_version_store_prune() {
        let store = InMemoryVersionStore::new();
        for h in 1..=5 {
            store.save_version(&version(h)).unwrap();
        }
        assert_eq!(store.latest_height().unwrap(), Some(5));

        assert_eq!(store.prune_below(3).unwrap(), 2);
        assert_eq!(store.pruned_through().unwrap(), Some(2));
        assert_eq!(store.load_version(2).unwrap(), None);
        assert!(store.load_version(3).unwrap().is_some());
        assert_eq!(store.heights(), vec![3, 4, 5]);
    }

    #[test]
    fn test_saving_replaces_versions_at_and_above_height() {
        let store = InMemoryVersionStore::new();
        for h in 1..=4 {
            store.save_version(&version(h)).unwrap();
        }

        let mut rewritten = version(2);
        rewritten.app_hash = [0xEE; 32];
        store.save_version(&rewritten).unwrap();

        assert_eq!(store.heights(), vec![1, 2]);
        assert_eq!(store.load_version(2).unwrap(), Some(rewritten));
        assert_eq!(store.latest_height().unwrap(), Some(2));
    }
}
