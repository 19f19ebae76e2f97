//! # RocksDB Version Storage
//!
//! Durable implementation of [`VersionStore`].
//!
//! ## Column Families
//!
//! - `versions` - height (big-endian) -> bincode-encoded [`CommittedVersion`]
//! - `metadata` - bookkeeping (`pruned_through`)
//!
//! Big-endian height keys keep RocksDB's byte order equal to height order,
//! so the latest version is the last key of `versions`.

use rocksdb::{ColumnFamily, ColumnFamilyDescriptor, IteratorMode, Options, WriteBatch, DB};
use tracing::info;

use crate::domain::StoreError;
use crate::ports::{CommittedVersion, VersionStore};

pub const CF_VERSIONS: &str = "versions";
pub const CF_METADATA: &str = "metadata";

const COLUMN_FAMILIES: &[&str] = &[CF_VERSIONS, CF_METADATA];
const PRUNED_THROUGH_KEY: &[u8] = b"pruned_through";

/// RocksDB configuration.
#[derive(Debug, Clone)]
pub struct RocksDbConfig {
    /// Path to the database directory
    pub path: String,
    /// Block cache size in bytes (default: 64MB)
    pub block_cache_size: usize,
    /// Write buffer size in bytes (default: 32MB)
    pub write_buffer_size: usize,
    /// Enable fsync after each write (default: true for durability)
    pub sync_writes: bool,
}

impl Default for RocksDbConfig {
    fn default() -> Self {
        Self {
            path: "./data/versions".to_string(),
            block_cache_size: 64 * 1024 * 1024,
            write_buffer_size: 32 * 1024 * 1024,
            sync_writes: true,
        }
    }
}

impl RocksDbConfig {
    /// Create config for testing (smaller buffers, no sync)
    pub fn for_testing(path: impl Into<String>) -> Self {
        Self {
            path: path.into(),
            block_cache_size: 8 * 1024 * 1024,
            write_buffer_size: 4 * 1024 * 1024,
            sync_writes: false,
        }
    }
}

/// RocksDB-backed committed version storage.
pub struct RocksDbVersionStore {
    db: DB,
    config: RocksDbConfig,
}

impl RocksDbVersionStore {
    /// Open or create the database.
    pub fn open(config: RocksDbConfig) -> Result<Self, StoreError> {
        let mut opts = Options::default();
        opts.create_if_missing(true);
        opts.create_missing_column_families(true);
        opts.set_write_buffer_size(config.write_buffer_size);
        opts.set_compression_type(rocksdb::DBCompressionType::Snappy);

        let mut block_opts = rocksdb::BlockBasedOptions::default();
        block_opts.set_bloom_filter(10.0, false);
        block_opts.set_block_cache(&rocksdb::Cache::new_lru_cache(config.block_cache_size));
        opts.set_block_based_table_factory(&block_opts);

        let cf_descriptors: Vec<ColumnFamilyDescriptor> = COLUMN_FAMILIES
            .iter()
            .map(|name| {
                let mut cf_opts = Options::default();
                cf_opts.set_compression_type(rocksdb::DBCompressionType::Snappy);
                ColumnFamilyDescriptor::new(*name, cf_opts)
            })
            .collect();

        let db = DB::open_cf_descriptors(&opts, &config.path, cf_descriptors)
            .map_err(|e| StoreError::Backend(format!("Failed to open RocksDB: {}", e)))?;

        info!("[Store] Opened RocksDB version store at {}", config.path);
        Ok(Self { db, config })
    }

    fn cf(&self, name: &str) -> Result<&ColumnFamily, StoreError> {
        self.db
            .cf_handle(name)
            .ok_or_else(|| StoreError::Backend(format!("missing column family {}", name)))
    }

    fn write_opts(&self) -> rocksdb::WriteOptions {
        let mut write_opts = rocksdb::WriteOptions::default();
        write_opts.set_sync(self.config.sync_writes);
        write_opts
    }

    fn heights(&self) -> Result<Vec<u64>, StoreError> {
        let cf = self.cf(CF_VERSIONS)?;
        let mut heights = Vec::new();
        for item in self.db.iterator_cf(cf, IteratorMode::Start) {
            let (key, _) = item.map_err(|e| StoreError::Backend(format!("RocksDB scan failed: {}", e)))?;
            heights.push(decode_height(&key)?);
        }
        Ok(heights)
    }

    fn delete_heights(&self, heights: &[u64]) -> Result<(), StoreError> {
        let cf = self.cf(CF_VERSIONS)?;
        let mut batch = WriteBatch::default();
        for height in heights {
            batch.delete_cf(cf, height.to_be_bytes());
        }
        self.db
            .write_opt(batch, &self.write_opts())
            .map_err(|e| StoreError::Backend(format!("RocksDB batch delete failed: {}", e)))
    }
}

fn decode_height(key: &[u8]) -> Result<u64, StoreError> {
    let raw: [u8; 8] = key
        .try_into()
        .map_err(|_| StoreError::Serialization(format!("bad version key length {}", key.len())))?;
    Ok(u64::from_be_bytes(raw))
}

impl VersionStore for RocksDbVersionStore {
    fn save_version(&self, version: &CommittedVersion) -> Result<(), StoreError> {
        let bytes =
            bincode::serialize(version).map_err(|e| StoreError::Serialization(e.to_string()))?;
        let superseded: Vec<u64> = self
            .heights()?
            .into_iter()
            .filter(|h| *h > version.height)
            .collect();

        // Superseded heights and the new version land in one atomic batch.
        let cf = self.cf(CF_VERSIONS)?;
        let mut batch = WriteBatch::default();
        for height in &superseded {
            batch.delete_cf(cf, height.to_be_bytes());
        }
        batch.put_cf(cf, version.height.to_be_bytes(), bytes);
        self.db
            .write_opt(batch, &self.write_opts())
            .map_err(|e| StoreError::Backend(format!("RocksDB batch write failed: {}", e)))?;

        if !superseded.is_empty() {
            info!(
                "[Store] Version {} superseded {} later versions",
                version.height,
                superseded.len()
            );
        }
        Ok(())
    }

    fn load_version(&self, height: u64) -> Result<Option<CommittedVersion>, StoreError> {
        let cf = self.cf(CF_VERSIONS)?;
        let Some(bytes) = self
            .db
            .get_cf(cf, height.to_be_bytes())
            .map_err(|e| StoreError::Backend(format!("RocksDB get failed: {}", e)))?
        else {
            return Ok(None);
        };
        bincode::deserialize(&bytes)
            .map(Some)
            .map_err(|e| StoreError::Serialization(e.to_string()))
    }

    fn latest_height(&self) -> Result<Option<u64>, StoreError> {
        let cf = self.cf(CF_VERSIONS)?;
        match self.db.iterator_cf(cf, IteratorMode::End).next() {
            Some(item) => {
                let (key, _) =
                    item.map_err(|e| StoreError::Backend(format!("RocksDB scan failed: {}", e)))?;
                decode_height(&key).map(Some)
            }
            None => Ok(None),
        }
    }

    fn pruned_through(&self) -> Result<Option<u64>, StoreError> {
        let cf = self.cf(CF_METADATA)?;
        self.db
            .get_cf(cf, PRUNED_THROUGH_KEY)
            .map_err(|e| StoreError::Backend(format!("RocksDB get failed: {}", e)))?
            .map(|bytes| decode_height(&bytes))
            .transpose()
    }

    fn prune_below(&self, keep_from: u64) -> Result<u64, StoreError> {
        let doomed: Vec<u64> = self
            .heights()?
            .into_iter()
            .filter(|h| *h < keep_from)
            .collect();
        let Some(highest) = doomed.last().copied() else {
            return Ok(0);
        };

        self.delete_heights(&doomed)?;

        let pruned_through = self.pruned_through()?.map_or(highest, |p| p.max(highest));
        let cf = self.cf(CF_METADATA)?;
        self.db
            .put_cf_opt(cf, PRUNED_THROUGH_KEY, pruned_through.to_be_bytes(), &self.write_opts())
            .map_err(|e| StoreError::Backend(format!("RocksDB put failed: {}", e)))?;

        Ok(doomed.len() as u64)
    }
}
