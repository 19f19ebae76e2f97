use mc_01_store::StoreError;
use mc_02_module_manager::HookError;
use mc_04_auth::AuthError;
use mc_05_bank::BankError;
use mc_06_capability::CapabilityError;
use shared_types::{Address, CodecError};
use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum AssetError {
    #[error(transparent)]
    Store(#[from] StoreError),

    #[error(transparent)]
    Codec(#[from] CodecError),

    #[error(transparent)]
    Auth(#[from] AuthError),

    #[error(transparent)]
    Bank(#[from] BankError),

    #[error(transparent)]
    Capability(#[from] CapabilityError),

    #[error("asset {0} already registered")]
    AssetExists(String),

    #[error("asset {0} is not registered")]
    UnknownAsset(String),

    #[error("invalid asset: {0}")]
    InvalidAsset(String),

    #[error("{sender} is not the issuer of {denom}")]
    Unauthorized { denom: String, sender: Address },

    #[error("module does not hold the issue capability for {0}")]
    MissingCapability(String),
}

impl From<AssetError> for HookError {
    fn from(err: AssetError) -> Self {
        match err {
            AssetError::Store(e) => HookError::Store(e),
            AssetError::Codec(e) => HookError::Codec(e),
            AssetError::Auth(e) => e.into(),
            AssetError::Bank(e) => e.into(),
            AssetError::Capability(e) => e.into(),
            AssetError::AssetExists(_) | AssetError::InvalidAsset(_) => {
                HookError::InvalidGenesis(err.to_string())
            }
            other => HookError::module(other),
        }
    }
}
