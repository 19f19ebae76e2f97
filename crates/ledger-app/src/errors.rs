use mc_01_store::StoreError;
use mc_02_module_manager::ManagerError;
use mc_03_params::ParamsError;
use mc_06_capability::CapabilityError;
use shared_types::CodecError;
use thiserror::Error;

use crate::abci::WireError;
use crate::app::BlockPhase;
use crate::config::ConfigError;

/// Errors surfaced by the application root.
#[derive(Debug, Error)]
pub enum AppError {
    #[error("configuration: {0}")]
    Config(#[from] ConfigError),

    #[error("store: {0}")]
    Store(#[from] StoreError),

    /// Assembly-time wiring fault.
    #[error("module wiring: {0}")]
    Manager(#[from] ManagerError),

    #[error("params wiring: {0}")]
    Params(#[from] ParamsError),

    #[error("capability wiring: {0}")]
    Capability(#[from] CapabilityError),

    #[error("codec: {0}")]
    Codec(#[from] CodecError),

    #[error("malformed request: {0}")]
    InvalidRequest(#[from] WireError),

    #[error("genesis document: {0}")]
    Genesis(String),

    #[error("chain id mismatch: configured {expected}, got {got}")]
    ChainIdMismatch { expected: String, got: String },

    #[error("expected block {expected}, got {got}")]
    UnexpectedHeight { expected: u64, got: u64 },

    #[error("chain has not been initialised")]
    NotInitialized,

    #[error("chain already initialised at version {version}")]
    AlreadyInitialized { version: u64 },

    #[error("{call} not allowed in phase {phase:?}")]
    InvalidPhase { call: &'static str, phase: BlockPhase },

    /// A genesis, begin-block, end-block or commit failure. The block is
    /// discarded and the application halts.
    #[error("fatal failure at height {height}: {source}")]
    Fatal {
        height: u64,
        #[source]
        source: FatalCause,
    },

    /// Every call after a fatal failure or the configured halt height.
    #[error("application halted at height {height}")]
    Halted { height: u64 },
}

/// What brought a block down.
#[derive(Debug, Error)]
pub enum FatalCause {
    #[error(transparent)]
    Phase(#[from] ManagerError),

    #[error(transparent)]
    Store(#[from] StoreError),
}

impl AppError {
    /// Whether consensus must stop driving this application.
    pub fn is_halt(&self) -> bool {
        matches!(self, AppError::Fatal { .. } | AppError::Halted { .. })
    }
}
