//! # Store Keys and the Partition Registry
//!
//! A [`StoreKey`] is an opaque capability: it can only be obtained from
//! [`StoreRegistry::allocate`], it carries a fresh UUID, and the engine only
//! honours keys it mounted. Holding a key is what grants a keeper access to a
//! partition; nothing else does.

use std::collections::BTreeMap;
use std::fmt;

use serde::{Deserialize, Serialize};
use tracing::{debug, info};
use uuid::Uuid;

use super::errors::StoreError;
use crate::multistore::CommitMultiStore;

/// The three partition flavours.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum StoreKind {
    /// Versioned and committed.
    Persistent,
    /// Reset at every commit.
    Transient,
    /// Process-lifetime cache, never persisted.
    Memory,
}

impl fmt::Display for StoreKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Persistent => write!(f, "persistent"),
            Self::Transient => write!(f, "transient"),
            Self::Memory => write!(f, "memory"),
        }
    }
}

/// Stable identity of a partition: its name and kind.
///
/// Unlike [`StoreKey`], this survives restarts and is what version storage is
/// keyed by.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct PartitionId {
    pub kind: StoreKind,
    pub name: String,
}

impl fmt::Display for PartitionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.kind, self.name)
    }
}

/// Opaque handle identifying exactly one storage partition.
///
/// Equality is identity: two keys with the same name issued by different
/// registries are different keys.
#[derive(Debug, Clone)]
pub struct StoreKey {
    id: Uuid,
    name: String,
    kind: StoreKind,
}

impl StoreKey {
    fn issue(name: String, kind: StoreKind) -> Self {
        Self {
            id: Uuid::new_v4(),
            name,
            kind,
        }
    }

    /// Partition name.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Partition kind.
    pub fn kind(&self) -> StoreKind {
        self.kind
    }

    /// Unique identity of this key.
    pub fn id(&self) -> Uuid {
        self.id
    }

    /// Stable partition identity.
    pub fn partition_id(&self) -> PartitionId {
        PartitionId {
            kind: self.kind,
            name: self.name.clone(),
        }
    }
}

impl PartialEq for StoreKey {
    fn eq(&self, other: &Self) -> bool {
        self.id == other.id
    }
}

impl Eq for StoreKey {}

impl fmt::Display for StoreKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.kind, self.name)
    }
}

/// Allocates named, mutually isolated partitions.
///
/// Key-to-partition mapping is immutable once issued: keys are never
/// revoked or re-issued.
#[derive(Debug, Default)]
pub struct StoreRegistry {
    issued: BTreeMap<PartitionId, StoreKey>,
}

impl StoreRegistry {
    /// Create an empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// Issue one fresh key per name for `kind`.
    ///
    /// All-or-nothing: if any name is already issued for this kind, or
    /// appears twice in `names`, no key is issued.
    pub fn allocate<I, S>(
        &mut self,
        names: I,
        kind: StoreKind,
    ) -> Result<BTreeMap<String, StoreKey>, StoreError>
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let names: Vec<String> = names.into_iter().map(Into::into).collect();

        let mut requested = BTreeMap::new();
        for name in &names {
            let partition = PartitionId {
                kind,
                name: name.clone(),
            };
            if self.issued.contains_key(&partition) || requested.contains_key(name) {
                return Err(StoreError::DuplicateStoreKey {
                    name: name.clone(),
                    kind,
                });
            }
            requested.insert(name.clone(), partition);
        }

        let mut keys = BTreeMap::new();
        for (name, partition) in requested {
            let key = StoreKey::issue(name.clone(), kind);
            debug!("[Store] Issued key {} ({})", key, key.id());
            self.issued.insert(partition, key.clone());
            keys.insert(name, key);
        }

        Ok(keys)
    }

    /// Every key issued so far, ordered by partition identity.
    pub fn issued(&self) -> impl Iterator<Item = &StoreKey> {
        self.issued.values()
    }

    /// Number of issued keys.
    pub fn len(&self) -> usize {
        self.issued.len()
    }

    /// Whether nothing has been issued.
    pub fn is_empty(&self) -> bool {
        self.issued.is_empty()
    }

    /// Instruct the engine to mount one region per issued key.
    pub fn mount_all(&self, store: &mut CommitMultiStore) -> Result<(), StoreError> {
        for key in self.issued() {
            store.mount(key)?;
        }
        info!("[Store] Mounted {} partitions", self.issued.len());
        Ok(())
    }
}
