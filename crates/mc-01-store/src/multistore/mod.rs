pub mod cache;
pub mod commit;

pub use cache::{CacheMultiStore, ChangeSet, Partition, PrefixStore};
pub use commit::{CommitId, CommitMultiStore, PruningOptions};
