use std::fmt;
use std::sync::Arc;

use mc_01_store::StoreKey;
use shared_types::ModuleName;

use crate::ports::{BeginBlockHook, EndBlockHook, GenesisExport, GenesisInit};

/// A module as the manager sees it.
///
/// Built once during application assembly and immutable afterwards. Each
/// hook is an optional field; an absent hook is simply not called.
#[derive(Clone)]
pub struct ModuleDescriptor {
    name: ModuleName,
    store_keys: Vec<StoreKey>,
    depends_on: Vec<ModuleName>,
    genesis: Option<Arc<dyn GenesisInit>>,
    export: Option<Arc<dyn GenesisExport>>,
    begin_block: Option<Arc<dyn BeginBlockHook>>,
    end_block: Option<Arc<dyn EndBlockHook>>,
}

impl ModuleDescriptor {
    pub fn new(name: impl Into<ModuleName>) -> Self {
        Self {
            name: name.into(),
            store_keys: Vec::new(),
            depends_on: Vec::new(),
            genesis: None,
            export: None,
            begin_block: None,
            end_block: None,
        }
    }

    /// Partitions the module owns.
    pub fn with_store_keys(mut self, keys: impl IntoIterator<Item = StoreKey>) -> Self {
        self.store_keys.extend(keys);
        self
    }

    /// Peers whose keepers were injected into this module's keeper.
    pub fn depends_on<I, N>(mut self, peers: I) -> Self
    where
        I: IntoIterator<Item = N>,
        N: Into<ModuleName>,
    {
        self.depends_on.extend(peers.into_iter().map(Into::into));
        self
    }

    pub fn with_genesis(mut self, hook: Arc<dyn GenesisInit>) -> Self {
        self.genesis = Some(hook);
        self
    }

    pub fn with_export(mut self, hook: Arc<dyn GenesisExport>) -> Self {
        self.export = Some(hook);
        self
    }

    pub fn with_begin_block(mut self, hook: Arc<dyn BeginBlockHook>) -> Self {
        self.begin_block = Some(hook);
        self
    }

    pub fn with_end_block(mut self, hook: Arc<dyn EndBlockHook>) -> Self {
        self.end_block = Some(hook);
        self
    }

    pub fn name(&self) -> &ModuleName {
        &self.name
    }

    pub fn store_keys(&self) -> &[StoreKey] {
        &self.store_keys
    }

    pub fn dependencies(&self) -> &[ModuleName] {
        &self.depends_on
    }

    pub fn genesis(&self) -> Option<&Arc<dyn GenesisInit>> {
        self.genesis.as_ref()
    }

    pub fn export(&self) -> Option<&Arc<dyn GenesisExport>> {
        self.export.as_ref()
    }

    pub fn begin_block(&self) -> Option<&Arc<dyn BeginBlockHook>> {
        self.begin_block.as_ref()
    }

    pub fn end_block(&self) -> Option<&Arc<dyn EndBlockHook>> {
        self.end_block.as_ref()
    }
}

impl fmt::Debug for ModuleDescriptor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ModuleDescriptor")
            .field("name", &self.name)
            .field("store_keys", &self.store_keys)
            .field("depends_on", &self.depends_on)
            .field("genesis", &self.genesis.is_some())
            .field("export", &self.export.is_some())
            .field("begin_block", &self.begin_block.is_some())
            .field("end_block", &self.end_block.is_some())
            .finish()
    }
}
