use mc_01_store::StoreError;
use mc_02_module_manager::HookError;
use shared_types::{Address, CodecError};
use thiserror::Error;

use crate::types::Permission;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum AuthError {
    #[error(transparent)]
    Store(#[from] StoreError),

    #[error(transparent)]
    Codec(#[from] CodecError),

    #[error("account {0} already exists")]
    AccountExists(Address),

    #[error("account {0} does not exist")]
    UnknownAccount(Address),

    #[error("no module account registered for {0:?}")]
    UnknownModuleAccount(String),

    #[error("module account {module:?} lacks {permission:?} permission")]
    MissingPermission {
        module: String,
        permission: Permission,
    },

    #[error("duplicate account number {0} in genesis")]
    DuplicateAccountNumber(u64),
}

impl From<AuthError> for HookError {
    fn from(err: AuthError) -> Self {
        match err {
            AuthError::Store(e) => HookError::Store(e),
            AuthError::Codec(e) => HookError::Codec(e),
            AuthError::DuplicateAccountNumber(_) | AuthError::AccountExists(_) => {
                HookError::InvalidGenesis(err.to_string())
            }
            other => HookError::module(other),
        }
    }
}
