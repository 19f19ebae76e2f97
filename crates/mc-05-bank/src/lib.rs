//! # mc-05-bank
//!
//! Balance keeper. Owns the `bank` partition and reads accounts through an
//! injected [`AccountKeeper`](mc_04_auth::AccountKeeper); parameters come
//! from the `bank` params subspace.
//!
//! ## Store layout
//!
//! | Key | Value |
//! |-----|-------|
//! | `0x01 ‖ address ‖ denom` | balance (`u128`) |
//! | `0x02 ‖ denom` | total supply (`u128`) |
//!
//! Zero balances are deleted rather than stored.
//!
//! ## Hooks
//!
//! - **Genesis**: params, balances, and a supply check.
//! - **BeginBlock**: mints `block_reward` and credits it to the proposer.
//! - **Export**: params, every balance, total supply.

pub mod errors;
pub mod keeper;
pub mod module;
pub mod types;

pub use errors::BankError;
pub use keeper::BankKeeper;
pub use module::{descriptor, BankModule};
pub use types::{Balance, BankGenesis, BankParams};

/// Module name (also the module account minting block rewards).
pub const MODULE_NAME: &str = "bank";
/// Persistent partition name.
pub const STORE_KEY: &str = "bank";
