//! # Domain Errors
//!
//! Registry and engine failures. Registry and mount errors are configuration
//! errors: the application cannot be assembled.

use thiserror::Error;

use super::keys::StoreKind;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum StoreError {
    #[error("store key {name:?} requested twice for kind {kind}")]
    DuplicateStoreKey { name: String, kind: StoreKind },

    #[error("partition {name:?} ({kind}) is already mounted")]
    DuplicatePartition { name: String, kind: StoreKind },

    #[error("store key {name:?} ({kind}) was never mounted")]
    UnmountedKey { name: String, kind: StoreKind },

    #[error("cannot mount {name:?}: store already loaded")]
    MountAfterLoad { name: String },

    #[error("store has not been loaded")]
    NotLoaded,

    #[error("initial version cannot change after version {version} was committed")]
    AlreadyCommitted { version: u64 },

    #[error("version {height} was never committed")]
    VersionNotFound { height: u64 },

    #[error("version {height} has been pruned (pruned through {pruned_through})")]
    VersionPruned { height: u64, pruned_through: u64 },

    #[error("storage backend error: {0}")]
    Backend(String),

    #[error("serialization error: {0}")]
    Serialization(String),
}

impl StoreError {
    /// Whether this error can only come from a wiring mistake.
    pub fn is_configuration(&self) -> bool {
        matches!(
            self,
            Self::DuplicateStoreKey { .. }
                | Self::DuplicatePartition { .. }
                | Self::UnmountedKey { .. }
                | Self::MountAfterLoad { .. }
        )
    }
}
