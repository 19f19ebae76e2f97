//! # mc-08-asset
//!
//! Collateral-backed custom assets. Each asset has an issuer, a collateral
//! denom held by the issuer in the bank, and a minimum collateral ratio.
//!
//! Issuing requires the `issue/<denom>` capability, minted for this module
//! when the asset is registered. Balances and supply are read and moved only
//! through the injected [`BankKeeper`](mc_05_bank::BankKeeper).
//!
//! ## Store layout
//!
//! | Key | Value |
//! |-----|-------|
//! | `0x01 ‖ denom` | [`Asset`] |
//! | `0x02 ‖ denom` | [`CollateralSnapshot`] taken at begin-block |
//!
//! ## Hooks
//!
//! - **Genesis**: registers assets, reusing capabilities restored by the
//!   capability module.
//! - **BeginBlock**: snapshots issuer collateral and asset supply.
//! - **EndBlock**: emits `asset_undercollateralized` for every snapshot under
//!   its ratio. Never returns validator updates.

pub mod errors;
pub mod keeper;
pub mod module;
pub mod types;

pub use errors::AssetError;
pub use keeper::AssetKeeper;
pub use module::{descriptor, AssetModule};
pub use types::{Asset, AssetGenesis, CollateralSnapshot};

/// Module name (also the module account that mints assets).
pub const MODULE_NAME: &str = "asset";
/// Persistent partition name.
pub const STORE_KEY: &str = "asset";
