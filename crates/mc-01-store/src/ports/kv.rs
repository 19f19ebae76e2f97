use crate::domain::{PartitionId, StoreError, StoreKey};

/// Ordered key/value access to a single partition.
pub trait KvStore {
    /// Get a value by key.
    fn get(&self, key: &[u8]) -> Result<Option<Vec<u8>>, StoreError>;

    /// Check if a key exists.
    fn has(&self, key: &[u8]) -> Result<bool, StoreError> {
        Ok(self.get(key)?.is_some())
    }

    /// Put a single key-value pair.
    fn set(&mut self, key: &[u8], value: &[u8]) -> Result<(), StoreError>;

    /// Delete a key.
    fn delete(&mut self, key: &[u8]) -> Result<(), StoreError>;

    /// All pairs whose key starts with `prefix`, in ascending key order.
    fn iter_prefix(&self, prefix: &[u8]) -> Result<Vec<(Vec<u8>, Vec<u8>)>, StoreError>;
}

/// Read access to a (possibly branched) multi-store.
///
/// Every access first resolves the caller's [`StoreKey`]; an unmounted or
/// foreign key never reaches a partition.
pub trait MultiStoreRead {
    /// Map a key to the partition it was mounted as.
    fn resolve(&self, key: &StoreKey) -> Result<PartitionId, StoreError>;

    /// Read one value from a resolved partition.
    fn read(&self, partition: &PartitionId, key: &[u8]) -> Result<Option<Vec<u8>>, StoreError>;

    /// Ordered prefix scan of a resolved partition.
    fn scan(
        &self,
        partition: &PartitionId,
        prefix: &[u8],
    ) -> Result<Vec<(Vec<u8>, Vec<u8>)>, StoreError>;
}
