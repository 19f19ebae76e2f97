use mc_01_store::StoreError;
use mc_02_module_manager::HookError;
use mc_03_params::ParamsError;
use mc_04_auth::AuthError;
use mc_05_bank::BankError;
use shared_types::{Address, CodecError};
use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum StakingError {
    #[error(transparent)]
    Store(#[from] StoreError),

    #[error(transparent)]
    Codec(#[from] CodecError),

    #[error(transparent)]
    Auth(#[from] AuthError),

    #[error(transparent)]
    Bank(#[from] BankError),

    #[error(transparent)]
    Params(#[from] ParamsError),

    #[error("validator {0} already exists")]
    ValidatorExists(Address),

    #[error("validator {0} does not exist")]
    UnknownValidator(Address),

    #[error("bond denom is {expected}, got {got}")]
    WrongDenom { expected: String, got: String },

    #[error("self-bond must be positive")]
    ZeroStake,

    #[error("bonded pool holds {pool}, validators hold {expected}")]
    BondedPoolMismatch { pool: u128, expected: u128 },
}

impl From<StakingError> for HookError {
    fn from(err: StakingError) -> Self {
        match err {
            StakingError::Store(e) => HookError::Store(e),
            StakingError::Codec(e) => HookError::Codec(e),
            StakingError::Auth(e) => e.into(),
            StakingError::Bank(e) => e.into(),
            StakingError::Params(e) => e.into(),
            StakingError::BondedPoolMismatch { .. } | StakingError::ValidatorExists(_) => {
                HookError::InvalidGenesis(err.to_string())
            }
            other => HookError::module(other),
        }
    }
}
