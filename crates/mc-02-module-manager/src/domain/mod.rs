pub mod context;
pub mod descriptor;
pub mod errors;
pub mod ordering;

pub use context::{Context, EventManager};
pub use descriptor::ModuleDescriptor;
pub use errors::{HookError, ManagerError};
pub use ordering::{OrderingList, Phase};
