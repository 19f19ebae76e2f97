use mc_01_store::StoreError;
use mc_02_module_manager::HookError;
use shared_types::CodecError;
use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ParamsError {
    #[error(transparent)]
    Store(#[from] StoreError),

    #[error(transparent)]
    Codec(#[from] CodecError),

    #[error("subspace {0:?} already handed out")]
    DuplicateSubspace(String),

    #[error("invalid {subspace} params: {reason}")]
    InvalidParams { subspace: String, reason: String },
}

impl From<ParamsError> for HookError {
    fn from(err: ParamsError) -> Self {
        match err {
            ParamsError::Store(e) => HookError::Store(e),
            ParamsError::Codec(e) => HookError::Codec(e),
            ParamsError::InvalidParams { .. } => HookError::InvalidGenesis(err.to_string()),
            other => HookError::module(other),
        }
    }
}
