//! # Errors
//!
//! [`HookError`] is what a hook returns. [`ManagerError`] is what the
//! manager returns: configuration faults found at assembly time, and hook
//! failures tagged with the module and phase they came from.

use std::error::Error as StdError;

use mc_01_store::StoreError;
use shared_types::{CodecError, ModuleName};
use thiserror::Error;

use super::ordering::Phase;

/// Failure raised inside a hook.
#[derive(Debug, Error)]
pub enum HookError {
    #[error("store: {0}")]
    Store(#[from] StoreError),

    #[error("codec: {0}")]
    Codec(#[from] CodecError),

    #[error("invalid genesis state: {0}")]
    InvalidGenesis(String),

    #[error("invariant broken: {0}")]
    Invariant(String),

    #[error(transparent)]
    Module(Box<dyn StdError + Send + Sync>),
}

impl HookError {
    /// Wrap a module-specific error.
    pub fn module<E>(err: E) -> Self
    where
        E: StdError + Send + Sync + 'static,
    {
        Self::Module(Box::new(err))
    }

    pub fn invalid_genesis(message: impl Into<String>) -> Self {
        Self::InvalidGenesis(message.into())
    }
}

/// Module Manager errors.
#[derive(Debug, Error)]
pub enum ManagerError {
    #[error("module {0} is already registered")]
    DuplicateModule(ModuleName),

    #[error("store key {key} of {second} is already owned by {first}")]
    SharedStoreKey {
        key: String,
        first: ModuleName,
        second: ModuleName,
    },

    #[error("{phase} order names unregistered module {name}")]
    UnknownModule { phase: Phase, name: ModuleName },

    #[error("{phase} order lists module {name} more than once")]
    DuplicateInOrder { phase: Phase, name: ModuleName },

    #[error("module {module} depends on unregistered module {dependency}")]
    UnknownDependency {
        module: ModuleName,
        dependency: ModuleName,
    },

    #[error("keeper dependency cycle: {}", format_cycle(.path))]
    DependencyCycle { path: Vec<ModuleName> },

    #[error("genesis state names unregistered module {0}")]
    UnknownGenesisModule(ModuleName),

    #[error("{phase} hook of {module} failed: {source}")]
    Hook {
        module: ModuleName,
        phase: Phase,
        #[source]
        source: HookError,
    },

    #[error("genesis export of {module} failed: {source}")]
    Export {
        module: ModuleName,
        #[source]
        source: HookError,
    },

    #[error("{phase}: both {first} and {second} returned validator updates")]
    DuplicateValidatorUpdates {
        phase: Phase,
        first: ModuleName,
        second: ModuleName,
    },
}

impl ManagerError {
    /// Whether this error can only come from a wiring mistake.
    pub fn is_configuration(&self) -> bool {
        matches!(
            self,
            Self::DuplicateModule(_)
                | Self::SharedStoreKey { .. }
                | Self::UnknownModule { .. }
                | Self::DuplicateInOrder { .. }
                | Self::UnknownDependency { .. }
                | Self::DependencyCycle { .. }
                | Self::DuplicateValidatorUpdates { .. }
        )
    }

    /// Module the failure is attributed to, if any.
    pub fn module(&self) -> Option<&ModuleName> {
        match self {
            Self::DuplicateModule(name) | Self::UnknownGenesisModule(name) => Some(name),
            Self::UnknownModule { name, .. } | Self::DuplicateInOrder { name, .. } => Some(name),
            Self::UnknownDependency { module, .. }
            | Self::Hook { module, .. }
            | Self::Export { module, .. } => Some(module),
            Self::SharedStoreKey { second, .. }
            | Self::DuplicateValidatorUpdates { second, .. } => Some(second),
            Self::DependencyCycle { path } => path.first(),
        }
    }
}

fn format_cycle(path: &[ModuleName]) -> String {
    path.iter()
        .map(ModuleName::as_str)
        .collect::<Vec<_>>()
        .join(" -> ")
}
