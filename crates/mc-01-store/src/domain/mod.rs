pub mod errors;
pub mod keys;

pub use errors::StoreError;
pub use keys::{PartitionId, StoreKey, StoreKind, StoreRegistry};
