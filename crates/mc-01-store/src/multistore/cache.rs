//! # Copy-on-Write Branches
//!
//! A [`CacheMultiStore`] records writes for every partition in a local
//! write-set and falls through to its parent for reads. Branches nest: a
//! transaction branch sits on top of the block branch, which sits on top of
//! the committed root. Nothing reaches the parent until the owner explicitly
//! hands the [`ChangeSet`] down; dropping a branch discards it.

use std::collections::BTreeMap;

use crate::domain::{PartitionId, StoreError, StoreKey};
use crate::ports::{KvStore, MultiStoreRead};

/// Pending writes per partition. `None` marks a delete.
pub type ChangeSet = BTreeMap<PartitionId, BTreeMap<Vec<u8>, Option<Vec<u8>>>>;

/// Copy-on-write branch over a parent multi-store.
pub struct CacheMultiStore<'p> {
    parent: &'p dyn MultiStoreRead,
    writes: ChangeSet,
}

impl<'p> CacheMultiStore<'p> {
    /// Open an empty branch.
    pub fn new(parent: &'p dyn MultiStoreRead) -> Self {
        Self {
            parent,
            writes: ChangeSet::new(),
        }
    }

    /// Re-open a branch with writes captured by an earlier [`Self::into_changes`].
    pub fn resume(parent: &'p dyn MultiStoreRead, writes: ChangeSet) -> Self {
        Self { parent, writes }
    }

    /// Access one partition through its key.
    pub fn partition(&mut self, key: &StoreKey) -> Result<Partition<'_, 'p>, StoreError> {
        let id = self.parent.resolve(key)?;
        Ok(Partition { id, cache: self })
    }

    /// Fold a child branch's writes into this branch.
    pub fn absorb(&mut self, child: ChangeSet) {
        for (partition, writes) in child {
            self.writes.entry(partition).or_default().extend(writes);
        }
    }

    /// Consume the branch, returning its writes.
    pub fn into_changes(self) -> ChangeSet {
        self.writes
    }

    /// Whether no write has been recorded.
    pub fn is_empty(&self) -> bool {
        self.writes.values().all(BTreeMap::is_empty)
    }

    fn read_through(&self, partition: &PartitionId, key: &[u8]) -> Result<Option<Vec<u8>>, StoreError> {
        if let Some(value) = self.writes.get(partition).and_then(|w| w.get(key)) {
            return Ok(value.clone());
        }
        self.parent.read(partition, key)
    }

    fn scan_through(
        &self,
        partition: &PartitionId,
        prefix: &[u8],
    ) -> Result<Vec<(Vec<u8>, Vec<u8>)>, StoreError> {
        let mut merged: BTreeMap<Vec<u8>, Vec<u8>> =
            self.parent.scan(partition, prefix)?.into_iter().collect();

        if let Some(writes) = self.writes.get(partition) {
            for (key, value) in writes.range(prefix.to_vec()..) {
                if !key.starts_with(prefix) {
                    break;
                }
                match value {
                    Some(value) => {
                        merged.insert(key.clone(), value.clone());
                    }
                    None => {
                        merged.remove(key);
                    }
                }
            }
        }

        Ok(merged.into_iter().collect())
    }
}

impl MultiStoreRead for CacheMultiStore<'_> {
    fn resolve(&self, key: &StoreKey) -> Result<PartitionId, StoreError> {
        self.parent.resolve(key)
    }

    fn read(&self, partition: &PartitionId, key: &[u8]) -> Result<Option<Vec<u8>>, StoreError> {
        self.read_through(partition, key)
    }

    fn scan(
        &self,
        partition: &PartitionId,
        prefix: &[u8],
    ) -> Result<Vec<(Vec<u8>, Vec<u8>)>, StoreError> {
        self.scan_through(partition, prefix)
    }
}

/// One partition of a branch, as seen by the keeper holding its key.
pub struct Partition<'b, 'p> {
    id: PartitionId,
    cache: &'b mut CacheMultiStore<'p>,
}

impl Partition<'_, '_> {
    /// Which partition this is.
    pub fn id(&self) -> &PartitionId {
        &self.id
    }
}

impl KvStore for Partition<'_, '_> {
    fn get(&self, key: &[u8]) -> Result<Option<Vec<u8>>, StoreError> {
        self.cache.read_through(&self.id, key)
    }

    fn set(&mut self, key: &[u8], value: &[u8]) -> Result<(), StoreError> {
        self.cache
            .writes
            .entry(self.id.clone())
            .or_default()
            .insert(key.to_vec(), Some(value.to_vec()));
        Ok(())
    }

    fn delete(&mut self, key: &[u8]) -> Result<(), StoreError> {
        self.cache
            .writes
            .entry(self.id.clone())
            .or_default()
            .insert(key.to_vec(), None);
        Ok(())
    }

    fn iter_prefix(&self, prefix: &[u8]) -> Result<Vec<(Vec<u8>, Vec<u8>)>, StoreError> {
        self.cache.scan_through(&self.id, prefix)
    }
}

/// Namespaces every key of an inner store under a fixed prefix.
pub struct PrefixStore<S> {
    inner: S,
    prefix: Vec<u8>,
}

impl<S: KvStore> PrefixStore<S> {
    pub fn new(inner: S, prefix: impl Into<Vec<u8>>) -> Self {
        Self {
            inner,
            prefix: prefix.into(),
        }
    }

    fn full_key(&self, key: &[u8]) -> Vec<u8> {
        let mut full = Vec::with_capacity(self.prefix.len() + key.len());
        full.extend_from_slice(&self.prefix);
        full.extend_from_slice(key);
        full
    }
}

impl<S: KvStore> KvStore for PrefixStore<S> {
    fn get(&self, key: &[u8]) -> Result<Option<Vec<u8>>, StoreError> {
        self.inner.get(&self.full_key(key))
    }

    fn set(&mut self, key: &[u8], value: &[u8]) -> Result<(), StoreError> {
        let full = self.full_key(key);
        self.inner.set(&full, value)
    }

    fn delete(&mut self, key: &[u8]) -> Result<(), StoreError> {
        let full = self.full_key(key);
        self.inner.delete(&full)
    }

    fn iter_prefix(&self, prefix: &[u8]) -> Result<Vec<(Vec<u8>, Vec<u8>)>, StoreError> {
        let strip = self.prefix.len();
        Ok(self
            .inner
            .iter_prefix(&self.full_key(prefix))?
            .into_iter()
            .map(|(k, v)| (k[strip..].to_vec(), v))
            .collect())
    }
}
