//! # mc-04-auth
//!
//! Account keeper. Owns the `acc` partition.
//!
//! ## Store layout
//!
//! | Key | Value |
//! |-----|-------|
//! | `0x01 ‖ address` | [`Account`] |
//! | `0x02` | next account number (`u64`) |
//!
//! Module accounts are ordinary accounts at [`Address::for_module`] that
//! carry the permissions the application granted the module at assembly.
//!
//! [`Address::for_module`]: shared_types::Address::for_module

pub mod errors;
pub mod keeper;
pub mod module;
pub mod types;

pub use errors::AuthError;
pub use keeper::AccountKeeper;
pub use module::{descriptor, AuthModule};
pub use types::{Account, AuthGenesis, ModuleAccountInfo, Permission};

/// Module name.
pub const MODULE_NAME: &str = "auth";
/// Persistent partition name.
pub const STORE_KEY: &str = "acc";
