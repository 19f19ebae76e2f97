//! # mc-03-params
//!
//! Parameter storage shared by every module.
//!
//! A [`ParamsKeeper`] owns the persistent `params` partition and the
//! transient `params` partition. Modules never see those keys: at assembly
//! time the application hands each of them a [`Subspace`], which namespaces
//! every parameter under the module's name and records in the transient
//! partition which parameters changed during the current block.
//!
//! The module registers no hooks.

pub mod errors;
pub mod keeper;
pub mod module;

pub use errors::ParamsError;
pub use keeper::{ParamSet, ParamsKeeper, Subspace};
pub use module::descriptor;

/// Module name.
pub const MODULE_NAME: &str = "params";
/// Persistent partition name.
pub const STORE_KEY: &str = "params";
/// Transient partition name.
pub const TSTORE_KEY: &str = "params";
