use mc_01_store::StoreError;
use mc_02_module_manager::HookError;
use mc_03_params::ParamsError;
use mc_04_auth::AuthError;
use shared_types::{Address, CodecError};
use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum BankError {
    #[error(transparent)]
    Store(#[from] StoreError),

    #[error(transparent)]
    Codec(#[from] CodecError),

    #[error(transparent)]
    Auth(#[from] AuthError),

    #[error(transparent)]
    Params(#[from] ParamsError),

    #[error("{address} has {available}{denom}, needs {required}{denom}")]
    InsufficientFunds {
        address: Address,
        denom: String,
        available: u128,
        required: u128,
    },

    #[error("transfers are disabled")]
    SendDisabled,

    #[error("invalid coin: {0}")]
    InvalidCoin(String),

    #[error("{denom} amount overflows")]
    Overflow { denom: String },

    #[error("genesis supply of {denom} is {declared}, balances sum to {actual}")]
    SupplyMismatch {
        denom: String,
        declared: u128,
        actual: u128,
    },
}

impl From<BankError> for HookError {
    fn from(err: BankError) -> Self {
        match err {
            BankError::Store(e) => HookError::Store(e),
            BankError::Codec(e) => HookError::Codec(e),
            BankError::Auth(e) => e.into(),
            BankError::Params(e) => e.into(),
            BankError::SupplyMismatch { .. } => HookError::InvalidGenesis(err.to_string()),
            other => HookError::module(other),
        }
    }
}
