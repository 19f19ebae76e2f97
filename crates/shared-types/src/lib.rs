//! # Shared Types Crate
//!
//! Types shared by the store engine, the module manager, every module and the
//! application root.
//!
//! ## Design Principles
//!
//! - **Single Source of Truth**: the block header, events and validator
//!   updates handed to hooks are defined once, here.
//! - **Injected Codec**: stored values go through [`Codec`], selected by the
//!   application root at construction time. Modules never pick an encoding.
//! - **Opaque Names**: a [`ModuleName`] is both a partition namespace and an
//!   ordering-list element.

pub mod codec;
pub mod entities;
pub mod errors;
pub mod events;
pub mod header;

pub use codec::{Codec, CodecKind};
pub use entities::*;
pub use errors::*;
pub use events::{Event, EventAttribute, ValidatorUpdate};
pub use header::{BlockHeader, Evidence, EvidenceKind};
