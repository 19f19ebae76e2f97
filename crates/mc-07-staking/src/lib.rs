//! # mc-07-staking
//!
//! Validator set keeper. Owns the `staking` partition; moves bonded tokens
//! through an injected [`BankKeeper`](mc_05_bank::BankKeeper) into the
//! `bonded_tokens_pool` module account.
//!
//! ## Store layout
//!
//! | Key | Value |
//! |-----|-------|
//! | `0x11 ‖ address` | last power reported to consensus (`u64`) |
//! | `0x21 ‖ address` | [`Validator`] |
//! | `0x50 ‖ height` | [`HistoricalInfo`] |
//!
//! ## Hooks
//!
//! - **Genesis**: validators, bonded pool check, initial validator set.
//! - **BeginBlock**: historical info for the block, evidence handling
//!   (slash and jail).
//! - **EndBlock**: validator-set deltas against the last reported powers.
//! - **Export**: params and validators.

pub mod errors;
pub mod keeper;
pub mod module;
pub mod types;

pub use errors::StakingError;
pub use keeper::StakingKeeper;
pub use module::{descriptor, StakingModule};
pub use types::{HistoricalInfo, StakingGenesis, StakingParams, Validator};

pub const MODULE_NAME: &str = "staking";
/// Persistent partition name.
pub const STORE_KEY: &str = "staking";
/// Module account holding every bonded token.
pub const BONDED_POOL: &str = "bonded_tokens_pool";
/// Tokens per unit of consensus power.
pub const POWER_REDUCTION: u128 = 1_000_000;
