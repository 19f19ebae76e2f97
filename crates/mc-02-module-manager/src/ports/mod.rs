pub mod hooks;

pub use hooks::{BeginBlockHook, EndBlockHook, GenesisExport, GenesisInit};
