//! # Commit Multi-Store
//!
//! The root of every branch. Holds one [`MemKvStore`] per mounted key,
//! versions persistent partitions by height through a [`VersionStore`], and
//! restores any retained height.
//!
//! ## Lifecycle
//!
//! ```text
//! new ──mount*──→ load_latest / load_version ──→ commit(changes)*
//!                       │
//!                       └── sealed: mount is refused from here on
//! ```

use std::collections::BTreeMap;
use std::sync::Arc;

use sha3::{Digest, Keccak256};
use shared_types::Hash;
use tracing::{debug, info, warn};
use uuid::Uuid;

use super::cache::ChangeSet;
use crate::adapters::MemKvStore;
use crate::domain::{PartitionId, StoreError, StoreKey, StoreKind};
use crate::ports::{CommittedVersion, KvStore, MultiStoreRead, VersionStore};

/// How many committed versions to retain.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct PruningOptions {
    /// Versions to keep, counting the latest. `0` keeps everything.
    pub keep_recent: u64,
}

impl PruningOptions {
    pub fn nothing() -> Self {
        Self { keep_recent: 0 }
    }

    pub fn keep_recent(keep_recent: u64) -> Self {
        Self { keep_recent }
    }
}

/// Height and app hash of a commit.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct CommitId {
    pub version: u64,
    pub app_hash: Hash,
}

/// Versioned root store.
pub struct CommitMultiStore {
    mounts: BTreeMap<Uuid, PartitionId>,
    partitions: BTreeMap<PartitionId, MemKvStore>,
    versions: Arc<dyn VersionStore>,
    pruning: PruningOptions,
    last_commit: CommitId,
    initial_version: u64,
    sealed: bool,
}

impl CommitMultiStore {
    pub fn new(versions: Arc<dyn VersionStore>, pruning: PruningOptions) -> Self {
        Self {
            mounts: BTreeMap::new(),
            partitions: BTreeMap::new(),
            versions,
            pruning,
            last_commit: CommitId::default(),
            initial_version: 1,
            sealed: false,
        }
    }

    /// Mount one region for `key`.
    pub fn mount(&mut self, key: &StoreKey) -> Result<(), StoreError> {
        if self.sealed {
            return Err(StoreError::MountAfterLoad {
                name: key.name().to_string(),
            });
        }

        let partition = key.partition_id();
        if self.partitions.contains_key(&partition) {
            return Err(StoreError::DuplicatePartition {
                name: partition.name,
                kind: partition.kind,
            });
        }

        debug!("[Store] Mounted {}", partition);
        self.mounts.insert(key.id(), partition.clone());
        self.partitions.insert(partition, MemKvStore::new());
        Ok(())
    }

    /// Whether `load_latest` / `load_version` has run.
    pub fn is_loaded(&self) -> bool {
        self.sealed
    }

    /// Restore the highest retained version, or start empty if none exists.
    pub fn load_latest(&mut self) -> Result<CommitId, StoreError> {
        match self.versions.latest_height()? {
            Some(height) => self.load_version(height),
            None => {
                for store in self.partitions.values_mut() {
                    store.clear();
                }
                self.last_commit = CommitId::default();
                self.sealed = true;
                info!("[Store] No committed versions, starting empty");
                Ok(self.last_commit)
            }
        }
    }

    /// Restore persistent partitions exactly as committed at `height`.
    ///
    /// Nothing is deleted: versions above `height` stay loadable until the
    /// next commit, at `height + 1`, replaces them. Transient and memory
    /// partitions come back empty.
    pub fn load_version(&mut self, height: u64) -> Result<CommitId, StoreError> {
        let Some(version) = self.versions.load_version(height)? else {
            return Err(match self.versions.pruned_through()? {
                Some(pruned_through) if height > 0 && height <= pruned_through => {
                    StoreError::VersionPruned {
                        height,
                        pruned_through,
                    }
                }
                _ => StoreError::VersionNotFound { height },
            });
        };

        let mut contents = version.partitions;
        for (partition, store) in self.partitions.iter_mut() {
            *store = match partition.kind {
                StoreKind::Persistent => contents
                    .remove(&partition.name)
                    .map(MemKvStore::from_map)
                    .unwrap_or_default(),
                StoreKind::Transient | StoreKind::Memory => MemKvStore::new(),
            };
        }
        for orphan in contents.keys() {
            warn!("[Store] Version {} holds unmounted partition {:?}", height, orphan);
        }

        self.last_commit = CommitId {
            version: height,
            app_hash: version.app_hash,
        };
        self.sealed = true;
        info!(
            "[Store] Loaded version {} (app hash {})",
            height,
            hex_prefix(&version.app_hash)
        );
        Ok(self.last_commit)
    }

    /// Height the first commit will carry. Only valid before the first commit.
    pub fn set_initial_version(&mut self, version: u64) -> Result<(), StoreError> {
        if self.last_commit.version != 0 {
            return Err(StoreError::AlreadyCommitted {
                version: self.last_commit.version,
            });
        }
        self.initial_version = version.max(1);
        Ok(())
    }

    /// Version the working state with a block's `changes` applied.
    ///
    /// The next snapshot is computed aside and the working state is only
    /// touched once the version store has accepted it, so a failed save
    /// leaves every partition as it was. Pruning runs after the save and
    /// its failure is logged, not returned: the version is already durable.
    pub fn commit(&mut self, changes: ChangeSet) -> Result<CommitId, StoreError> {
        if !self.sealed {
            return Err(StoreError::NotLoaded);
        }
        if let Some(partition) = changes.keys().find(|p| !self.partitions.contains_key(*p)) {
            return Err(StoreError::UnmountedKey {
                name: partition.name.clone(),
                kind: partition.kind,
            });
        }

        let version = if self.last_commit.version == 0 {
            self.initial_version
        } else {
            self.last_commit.version + 1
        };

        let mut partitions: BTreeMap<String, BTreeMap<Vec<u8>, Vec<u8>>> = self
            .partitions
            .iter()
            .filter(|(id, _)| id.kind == StoreKind::Persistent)
            .map(|(id, store)| (id.name.clone(), store.as_map().clone()))
            .collect();
        for (partition, writes) in &changes {
            if partition.kind != StoreKind::Persistent {
                continue;
            }
            let contents = partitions.entry(partition.name.clone()).or_default();
            for (key, value) in writes {
                match value {
                    Some(value) => {
                        contents.insert(key.clone(), value.clone());
                    }
                    None => {
                        contents.remove(key);
                    }
                }
            }
        }
        let snapshot = CommittedVersion {
            height: version,
            app_hash: app_hash(&partitions),
            partitions,
        };

        self.versions.save_version(&snapshot)?;

        let CommittedVersion {
            app_hash,
            partitions: mut committed,
            ..
        } = snapshot;
        for (id, store) in self.partitions.iter_mut() {
            match id.kind {
                StoreKind::Persistent => {
                    *store = committed
                        .remove(&id.name)
                        .map(MemKvStore::from_map)
                        .unwrap_or_default();
                }
                StoreKind::Transient => store.clear(),
                StoreKind::Memory => {}
            }
        }
        for (partition, writes) in changes {
            if partition.kind != StoreKind::Memory {
                continue;
            }
            if let Some(store) = self.partitions.get_mut(&partition) {
                store.apply(writes);
            }
        }

        self.last_commit = CommitId { version, app_hash };
        info!("[Store] Committed version {} (app hash {})", version, hex_prefix(&app_hash));

        if let Some(keep_from) = self.retain_height() {
            match self.versions.prune_below(keep_from) {
                Ok(0) => {}
                Ok(pruned) => debug!("[Store] Pruned {} versions below {}", pruned, keep_from),
                Err(e) => warn!("[Store] Pruning below {} failed: {}", keep_from, e),
            }
        }

        Ok(self.last_commit)
    }

    /// Oldest height the pruning policy keeps, if it prunes at all.
    pub fn retain_height(&self) -> Option<u64> {
        let keep = self.pruning.keep_recent;
        let latest = self.last_commit.version;
        if keep == 0 || latest < keep {
            return None;
        }
        Some(latest - keep + 1)
    }

    pub fn last_commit(&self) -> CommitId {
        self.last_commit
    }

    pub fn pruning(&self) -> PruningOptions {
        self.pruning
    }

    fn partition_store(&self, partition: &PartitionId) -> Result<&MemKvStore, StoreError> {
        if !self.sealed {
            return Err(StoreError::NotLoaded);
        }
        self.partitions
            .get(partition)
            .ok_or_else(|| StoreError::UnmountedKey {
                name: partition.name.clone(),
                kind: partition.kind,
            })
    }
}

impl MultiStoreRead for CommitMultiStore {
    fn resolve(&self, key: &StoreKey) -> Result<PartitionId, StoreError> {
        self.mounts
            .get(&key.id())
            .cloned()
            .ok_or_else(|| StoreError::UnmountedKey {
                name: key.name().to_string(),
                kind: key.kind(),
            })
    }

    fn read(&self, partition: &PartitionId, key: &[u8]) -> Result<Option<Vec<u8>>, StoreError> {
        self.partition_store(partition)?.get(key)
    }

    fn scan(
        &self,
        partition: &PartitionId,
        prefix: &[u8],
    ) -> Result<Vec<(Vec<u8>, Vec<u8>)>, StoreError> {
        self.partition_store(partition)?.iter_prefix(prefix)
    }
}

/// Keccak-256 over every persistent partition, length-prefixed so that
/// distinct layouts never hash alike.
fn app_hash(partitions: &BTreeMap<String, BTreeMap<Vec<u8>, Vec<u8>>>) -> Hash {
    let mut hasher = Keccak256::new();
    for (name, contents) in partitions {
        hasher.update((name.len() as u64).to_be_bytes());
        hasher.update(name.as_bytes());
        hasher.update((contents.len() as u64).to_be_bytes());
        for (key, value) in contents {
            hasher.update((key.len() as u64).to_be_bytes());
            hasher.update(key);
            hasher.update((value.len() as u64).to_be_bytes());
            hasher.update(value);
        }
    }
    hasher.finalize().into()
}

fn hex_prefix(hash: &Hash) -> String {
    hash[..4].iter().map(|b| format!("{:02x}", b)).collect()
}

#[cfg(test)]
mod tests {
    use std::sync::atomic::{AtomicBool, Ordering};

    use super::*;
    use crate::adapters::InMemoryVersionStore;
    use crate::domain::StoreRegistry;
    use crate::multistore::CacheMultiStore;

    struct Fixture {
        root: CommitMultiStore,
        versions: Arc<InMemoryVersionStore>,
        bank: StoreKey,
        params_t: StoreKey,
        cap_mem: StoreKey,
    }

    fn fixture_over(
        versions: Arc<dyn VersionStore>,
        keep_recent: u64,
    ) -> (CommitMultiStore, [StoreKey; 3]) {
        let mut registry = StoreRegistry::new();
        let persistent = registry
            .allocate(["bank", "params"], StoreKind::Persistent)
            .unwrap();
        let transient = registry.allocate(["params"], StoreKind::Transient).unwrap();
        let memory = registry.allocate(["capability"], StoreKind::Memory).unwrap();

        let mut root = CommitMultiStore::new(versions, PruningOptions::keep_recent(keep_recent));
        registry.mount_all(&mut root).unwrap();
        root.load_latest().unwrap();
        let keys = [
            persistent["bank"].clone(),
            transient["params"].clone(),
            memory["capability"].clone(),
        ];
        (root, keys)
    }

    fn fixture(keep_recent: u64) -> Fixture {
        let versions = Arc::new(InMemoryVersionStore::new());
        let (root, [bank, params_t, cap_mem]) = fixture_over(versions.clone(), keep_recent);
        Fixture {
            root,
            versions,
            bank,
            params_t,
            cap_mem,
        }
    }

    /// Writes staged in a fresh branch over `root`.
    fn stage(root: &CommitMultiStore, writes: &[(&StoreKey, &str, &str)]) -> ChangeSet {
        let mut branch = CacheMultiStore::new(root);
        for (key, k, v) in writes {
            branch.partition(key).unwrap().set(k.as_bytes(), v.as_bytes()).unwrap();
        }
        branch.into_changes()
    }

    fn get(root: &CommitMultiStore, key: &StoreKey, k: &[u8]) -> Option<Vec<u8>> {
        let partition = root.resolve(key).unwrap();
        root.read(&partition, k).unwrap()
    }

    /// Version store whose save or prune can be switched to fail.
    #[derive(Default)]
    struct Flaky {
        inner: InMemoryVersionStore,
        fail_save: AtomicBool,
        fail_prune: AtomicBool,
    }

    impl VersionStore for Flaky {
        fn save_version(&self, version: &CommittedVersion) -> Result<(), StoreError> {
            if self.fail_save.load(Ordering::SeqCst) {
                return Err(StoreError::Backend("disk full".into()));
            }
            self.inner.save_version(version)
        }

        fn load_version(&self, height: u64) -> Result<Option<CommittedVersion>, StoreError> {
            self.inner.load_version(height)
        }

        fn latest_height(&self) -> Result<Option<u64>, StoreError> {
            self.inner.latest_height()
        }

        fn pruned_through(&self) -> Result<Option<u64>, StoreError> {
            self.inner.pruned_through()
        }

        fn prune_below(&self, keep_from: u64) -> Result<u64, StoreError> {
            if self.fail_prune.load(Ordering::SeqCst) {
                return Err(StoreError::Backend("prune interrupted".into()));
            }
            self.inner.prune_below(keep_from)
        }
    }

    #[test]
    fn test_mount_after_load_is_refused() {
        let mut f = fixture(0);
        let late = StoreRegistry::new()
            .allocate(["late"], StoreKind::Persistent)
            .unwrap();
        let err = f.root.mount(&late["late"]).unwrap_err();
        assert_eq!(err, StoreError::MountAfterLoad { name: "late".into() });
    }

    #[test]
    fn test_duplicate_partition_is_refused() {
        let versions = Arc::new(InMemoryVersionStore::new());
        let mut root = CommitMultiStore::new(versions, PruningOptions::nothing());
        let a = StoreRegistry::new().allocate(["bank"], StoreKind::Persistent).unwrap();
        let b = StoreRegistry::new().allocate(["bank"], StoreKind::Persistent).unwrap();
        root.mount(&a["bank"]).unwrap();
        assert!(matches!(
            root.mount(&b["bank"]),
            Err(StoreError::DuplicatePartition { .. })
        ));
    }

    #[test]
    fn test_commit_before_load_is_refused() {
        let versions = Arc::new(InMemoryVersionStore::new());
        let mut root = CommitMultiStore::new(versions, PruningOptions::nothing());
        assert_eq!(root.commit(ChangeSet::new()).unwrap_err(), StoreError::NotLoaded);
    }

    #[test]
    fn test_commit_bumps_version_and_clears_transient() {
        let mut f = fixture(0);
        let changes = stage(
            &f.root,
            &[
                (&f.bank, "alice", "10"),
                (&f.params_t, "changed", "1"),
                (&f.cap_mem, "index", "1"),
            ],
        );

        let first = f.root.commit(changes).unwrap();
        assert_eq!(first.version, 1);
        assert_eq!(get(&f.root, &f.bank, b"alice"), Some(b"10".to_vec()));
        assert_eq!(get(&f.root, &f.params_t, b"changed"), None);
        assert_eq!(get(&f.root, &f.cap_mem, b"index"), Some(b"1".to_vec()));

        let second = f.root.commit(ChangeSet::new()).unwrap();
        assert_eq!(second.version, 2);
        assert_eq!(first.app_hash, second.app_hash);
    }

    #[test]
    fn test_app_hash_depends_on_contents() {
        let mut f = fixture(0);
        let empty = f.root.commit(ChangeSet::new()).unwrap();
        let changes = stage(&f.root, &[(&f.bank, "alice", "10")]);
        let filled = f.root.commit(changes).unwrap();
        assert_ne!(empty.app_hash, filled.app_hash);
    }

    #[test]
    fn test_initial_version() {
        let mut f = fixture(0);
        f.root.set_initial_version(100).unwrap();
        assert_eq!(f.root.commit(ChangeSet::new()).unwrap().version, 100);
        assert_eq!(f.root.commit(ChangeSet::new()).unwrap().version, 101);
        assert_eq!(
            f.root.set_initial_version(5).unwrap_err(),
            StoreError::AlreadyCommitted { version: 101 }
        );
    }

    #[test]
    fn test_load_version_restores_exact_state() {
        let mut f = fixture(0);
        let changes = stage(&f.root, &[(&f.bank, "alice", "10")]);
        let one = f.root.commit(changes).unwrap();
        let changes = stage(
            &f.root,
            &[(&f.bank, "alice", "20"), (&f.cap_mem, "index", "1")],
        );
        let two = f.root.commit(changes).unwrap();

        let loaded = f.root.load_version(1).unwrap();
        assert_eq!(loaded, one);
        assert_eq!(get(&f.root, &f.bank, b"alice"), Some(b"10".to_vec()));
        assert_eq!(get(&f.root, &f.cap_mem, b"index"), None);

        // Later history is still there until something replaces it.
        assert_eq!(f.versions.heights(), vec![1, 2]);
        assert_eq!(f.root.load_version(2).unwrap(), two);
        assert_eq!(get(&f.root, &f.bank, b"alice"), Some(b"20".to_vec()));
    }

    #[test]
    fn test_loading_back_and_forth_keeps_history() {
        let mut f = fixture(0);
        let mut ids = Vec::new();
        for value in ["1", "2", "3"] {
            let changes = stage(&f.root, &[(&f.bank, "alice", value)]);
            ids.push(f.root.commit(changes).unwrap());
        }

        assert_eq!(f.root.load_version(1).unwrap(), ids[0]);
        assert_eq!(f.root.load_version(3).unwrap(), ids[2]);
        assert_eq!(f.root.load_version(2).unwrap(), ids[1]);
        assert_eq!(f.versions.heights(), vec![1, 2, 3]);
    }

    #[test]
    fn test_commit_after_load_replaces_later_versions() {
        let mut f = fixture(0);
        for value in ["1", "2", "3"] {
            let changes = stage(&f.root, &[(&f.bank, "alice", value)]);
            f.root.commit(changes).unwrap();
        }

        f.root.load_version(1).unwrap();
        let changes = stage(&f.root, &[(&f.bank, "alice", "other")]);
        let replaced = f.root.commit(changes).unwrap();

        assert_eq!(replaced.version, 2);
        assert_eq!(f.versions.heights(), vec![1, 2]);
        assert_eq!(
            f.root.load_version(3).unwrap_err(),
            StoreError::VersionNotFound { height: 3 }
        );
        assert_eq!(f.root.load_version(2).unwrap(), replaced);
        assert_eq!(get(&f.root, &f.bank, b"alice"), Some(b"other".to_vec()));
    }

    #[test]
    fn test_failed_save_leaves_working_state_untouched() {
        let flaky = Arc::new(Flaky::default());
        let (mut root, [bank, params_t, cap_mem]) = fixture_over(flaky.clone(), 0);
        let changes = stage(&root, &[(&bank, "alice", "10")]);
        let first = root.commit(changes).unwrap();

        flaky.fail_save.store(true, Ordering::SeqCst);
        let changes = stage(
            &root,
            &[
                (&bank, "alice", "99"),
                (&params_t, "changed", "1"),
                (&cap_mem, "index", "1"),
            ],
        );
        assert!(matches!(root.commit(changes), Err(StoreError::Backend(_))));

        assert_eq!(root.last_commit(), first);
        assert_eq!(get(&root, &bank, b"alice"), Some(b"10".to_vec()));
        assert_eq!(get(&root, &params_t, b"changed"), None);
        assert_eq!(get(&root, &cap_mem, b"index"), None);
    }

    #[test]
    fn test_pruning_failure_does_not_fail_commit() {
        let flaky = Arc::new(Flaky::default());
        let (mut root, [bank, _, _]) = fixture_over(flaky.clone(), 1);
        root.commit(ChangeSet::new()).unwrap();

        flaky.fail_prune.store(true, Ordering::SeqCst);
        let changes = stage(&root, &[(&bank, "alice", "10")]);
        let second = root.commit(changes).unwrap();

        assert_eq!(second.version, 2);
        assert_eq!(flaky.inner.heights(), vec![1, 2]);
        assert_eq!(get(&root, &bank, b"alice"), Some(b"10".to_vec()));
    }

    #[test]
    fn test_unmounted_partition_in_changes_is_refused() {
        let mut f = fixture(0);
        let mut other = StoreRegistry::new();
        let stray = other.allocate(["stray"], StoreKind::Persistent).unwrap();
        let mut changes = stage(&f.root, &[(&f.bank, "alice", "10")]);
        changes
            .entry(stray["stray"].partition_id())
            .or_default()
            .insert(b"k".to_vec(), Some(b"v".to_vec()));

        assert!(matches!(
            f.root.commit(changes),
            Err(StoreError::UnmountedKey { .. })
        ));
        assert_eq!(get(&f.root, &f.bank, b"alice"), None);
        assert_eq!(f.root.last_commit().version, 0);
    }

    #[test]
    fn test_load_unknown_version_fails() {
        let mut f = fixture(0);
        f.root.commit(ChangeSet::new()).unwrap();
        assert_eq!(
            f.root.load_version(7).unwrap_err(),
            StoreError::VersionNotFound { height: 7 }
        );
        assert_eq!(
            f.root.load_version(0).unwrap_err(),
            StoreError::VersionNotFound { height: 0 }
        );
    }

    #[test]
    fn test_pruning_keeps_recent_versions() {
        let mut f = fixture(2);
        for _ in 0..5 {
            f.root.commit(ChangeSet::new()).unwrap();
        }
        assert_eq!(f.versions.heights(), vec![4, 5]);
        assert_eq!(f.root.retain_height(), Some(4));
        assert_eq!(
            f.root.load_version(2).unwrap_err(),
            StoreError::VersionPruned {
                height: 2,
                pruned_through: 3
            }
        );
    }

    #[test]
    fn test_load_latest_resumes_from_shared_version_store() {
        let mut f = fixture(0);
        let changes = stage(&f.root, &[(&f.bank, "alice", "10")]);
        f.root.commit(changes).unwrap();

        // A restarted process remounts the same partitions with fresh keys.
        let mut registry = StoreRegistry::new();
        let keys = registry.allocate(["bank"], StoreKind::Persistent).unwrap();
        let mut restarted = CommitMultiStore::new(f.versions.clone(), PruningOptions::nothing());
        registry.mount_all(&mut restarted).unwrap();
        let id = restarted.load_latest().unwrap();

        assert_eq!(id.version, 1);
        assert_eq!(get(&restarted, &keys["bank"], b"alice"), Some(b"10".to_vec()));
    }
}
