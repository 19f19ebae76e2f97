//! # Hook Ports
//!
//! One trait per lifecycle hook. A module implements any subset; the
//! descriptor records which ones as optional fields, so the drivers never
//! check capabilities at runtime.

use shared_types::ValidatorUpdate;

use crate::domain::{Context, HookError};

/// Initialise module state from the module's own slice of genesis.
pub trait GenesisInit: Send + Sync {
    /// `raw` is the module's blob exactly as it appeared in the genesis
    /// envelope. A non-empty return is the initial validator set.
    fn init_genesis(
        &self,
        ctx: &mut Context<'_>,
        raw: &[u8],
    ) -> Result<Vec<ValidatorUpdate>, HookError>;
}

/// Serialise module state back into a genesis blob.
pub trait GenesisExport: Send + Sync {
    fn export_genesis(&self, ctx: &mut Context<'_>) -> Result<Vec<u8>, HookError>;
}

/// Runs at the start of every block, before any transaction.
pub trait BeginBlockHook: Send + Sync {
    fn begin_block(&self, ctx: &mut Context<'_>) -> Result<(), HookError>;
}

/// Runs at the end of every block, after every transaction.
pub trait EndBlockHook: Send + Sync {
    /// A non-empty return is a validator-set delta for consensus.
    fn end_block(&self, ctx: &mut Context<'_>) -> Result<Vec<ValidatorUpdate>, HookError>;
}
