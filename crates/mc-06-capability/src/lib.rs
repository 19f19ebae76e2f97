//! # mc-06-capability
//!
//! Object-capability keeper. A capability is an unforgeable index; modules
//! receive a [`ScopedKeeper`] bound to their own name and can only reach the
//! capabilities they created or claimed.
//!
//! ## Partitions
//!
//! - **Persistent** `capability`: the next index and the owner set of every
//!   live capability.
//! - **Memory** `capability`: a per-module lookup index (`module/rev/name` to
//!   index, `module/fwd/index` to name). It is never persisted, so it is
//!   rebuilt from the owner sets on the first block after start or reload.
//!
//! Scoped keepers must all be handed out before [`CapabilityKeeper::seal`]
//! is called during application assembly.

pub mod errors;
pub mod keeper;
pub mod module;
pub mod types;

pub use errors::CapabilityError;
pub use keeper::{CapabilityKeeper, ScopedKeeper};
pub use module::{descriptor, CapabilityModule};
pub use types::{Capability, CapabilityGenesis, CapabilityOwners, GenesisOwners, Owner};

pub const MODULE_NAME: &str = "capability";
/// Persistent partition name.
pub const STORE_KEY: &str = "capability";
/// Memory partition name.
pub const MEM_STORE_KEY: &str = "capability";
