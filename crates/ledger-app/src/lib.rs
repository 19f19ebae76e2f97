//! # Ledger Application
//!
//! Assembles the module crates into one deterministic state machine and
//! exposes the entry points a consensus engine drives.
//!
//! ## Modules
//!
//! | Module | Stores | Hooks |
//! |--------|--------|-------|
//! | params | persistent + transient | none |
//! | auth | persistent | genesis, export |
//! | bank | persistent | genesis, begin, export |
//! | capability | persistent + memory | genesis, begin, export |
//! | staking | persistent | genesis, begin, end, export |
//! | asset | persistent | genesis, begin, end, export |
//!
//! ## Keeper wiring
//!
//! ```text
//! params ──subspace──→ bank, staking
//! auth ──────────────→ bank, asset
//! bank ──────────────→ staking, asset
//! capability ─scope──→ asset
//! ```
//!
//! ## Failure model
//!
//! Configuration faults fail [`App::new`]. A failing genesis, begin-block,
//! end-block or commit returns [`AppError::Fatal`], discards the block and
//! halts the application: every later entry point returns
//! [`AppError::Halted`].

pub mod abci;
pub mod app;
pub mod config;
pub mod errors;
pub mod genesis;

pub use app::{App, BlockPhase, Keepers, TxResult, BEGIN_BLOCK_ORDER, END_BLOCK_ORDER, GENESIS_ORDER};
pub use config::{AppConfig, ConfigError, StorageBackend};
pub use errors::{AppError, FatalCause};
pub use genesis::{GenesisDocument, DEVNET_OPERATOR};
