//! # mc-02-module-manager
//!
//! Module descriptors and the phase drivers that run them.
//!
//! ## Role in System
//!
//! - **Descriptor**: a module's name, the store keys it owns, the peers it
//!   was wired to and an optional implementation of each hook.
//! - **Manager**: registry of descriptors plus one [`OrderingList`] per
//!   [`Phase`]. Registration order never decides execution order.
//! - **Drivers**: [`Manager::run_genesis`], [`Manager::run_begin_block`] and
//!   [`Manager::run_end_block`] walk the ordering list, call each present
//!   hook with a shared [`Context`] and stop at the first failure.
//!
//! ```text
//!  App ──run_begin_block(ctx)──→ Manager
//!                                  │ for name in begin order
//!                                  ▼
//!                        descriptor.begin_block?  ──→ hook(ctx)
//!                                  │                     │
//!                                  │ ←──── events ───────┘
//!                                  ▼
//!                           Err → stop, propagate
//! ```
//!
//! ## Failure model
//!
//! A hook error is never retried or skipped. The driver wraps it in
//! [`ManagerError::Hook`] with the module and phase and returns immediately.
//! Because hooks only ever write into the caller's branch, the caller
//! discards every partial write by dropping that branch.

pub mod domain;
pub mod ports;
pub mod service;

#[cfg(test)]
pub(crate) mod test_utils;

pub use domain::*;
pub use ports::*;
pub use service::{EndBlockOutcome, GenesisState, Manager};
