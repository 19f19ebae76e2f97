use mc_01_store::StoreError;
use mc_02_module_manager::HookError;
use shared_types::CodecError;
use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CapabilityError {
    #[error(transparent)]
    Store(#[from] StoreError),

    #[error(transparent)]
    Codec(#[from] CodecError),

    #[error("capability keeper is sealed, no new scopes can be created")]
    Sealed,

    #[error("module {0} already has a scoped capability keeper")]
    DuplicateScope(String),

    #[error("invalid capability name {0:?}")]
    InvalidName(String),

    #[error("module {module} already owns a capability named {name}")]
    CapabilityTaken { module: String, name: String },

    #[error("capability {index} is not owned by {module}/{name}")]
    NotOwner {
        index: u64,
        module: String,
        name: String,
    },

    #[error("capability {0} does not exist")]
    UnknownCapability(u64),

    #[error("invalid capability genesis: {0}")]
    InvalidGenesis(String),
}

impl From<CapabilityError> for HookError {
    fn from(err: CapabilityError) -> Self {
        match err {
            CapabilityError::Store(e) => HookError::Store(e),
            CapabilityError::Codec(e) => HookError::Codec(e),
            CapabilityError::InvalidGenesis(reason) => HookError::InvalidGenesis(reason),
            other => HookError::module(other),
        }
    }
}
