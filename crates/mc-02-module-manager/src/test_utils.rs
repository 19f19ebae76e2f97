//! Mock modules and a loaded root store for driver tests.

use std::collections::BTreeMap;
use std::sync::Arc;

use chrono::{TimeZone, Utc};
use mc_01_store::{
    CommitMultiStore, InMemoryVersionStore, KvStore, PruningOptions, StoreKey, StoreKind,
    StoreRegistry,
};
use shared_types::{Address, BlockHeader, Event, ValidatorUpdate};

use crate::domain::{Context, HookError, ModuleDescriptor};
use crate::ports::{BeginBlockHook, EndBlockHook, GenesisExport, GenesisInit};
use crate::service::Manager;

pub struct Fixture {
    pub root: CommitMultiStore,
    pub keys: BTreeMap<String, StoreKey>,
    pub manager: Manager,
}

impl Fixture {
    /// One persistent partition per name, mounted and loaded.
    pub fn new(names: &[&str]) -> Self {
        let mut registry = StoreRegistry::new();
        let keys = registry
            .allocate(names.iter().copied(), StoreKind::Persistent)
            .unwrap();
        let mut root = CommitMultiStore::new(
            Arc::new(InMemoryVersionStore::new()),
            PruningOptions::nothing(),
        );
        registry.mount_all(&mut root).unwrap();
        root.load_latest().unwrap();
        Self {
            root,
            keys,
            manager: Manager::new(),
        }
    }

    pub fn key(&self, name: &str) -> StoreKey {
        self.keys[name].clone()
    }
}

pub fn header(height: u64) -> BlockHeader {
    BlockHeader {
        chain_id: "test-chain".into(),
        height,
        time: Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap(),
        proposer: Address::for_module("proposer"),
        evidence: Vec::new(),
    }
}

/// Begin-block hook that only records that it ran.
pub struct Recorder(pub &'static str);

impl BeginBlockHook for Recorder {
    fn begin_block(&self, ctx: &mut Context<'_>) -> Result<(), HookError> {
        ctx.emit(Event::new("hook").attr("module", self.0));
        Ok(())
    }
}

pub fn recorder(name: &'static str) -> ModuleDescriptor {
    ModuleDescriptor::new(name).with_begin_block(Arc::new(Recorder(name)))
}

pub struct Noop;

impl EndBlockHook for Noop {
    fn end_block(&self, _ctx: &mut Context<'_>) -> Result<Vec<ValidatorUpdate>, HookError> {
        Ok(Vec::new())
    }
}

pub struct Failing;

impl BeginBlockHook for Failing {
    fn begin_block(&self, _ctx: &mut Context<'_>) -> Result<(), HookError> {
        Err(HookError::Invariant("boom".into()))
    }
}

pub struct WriteOnBegin {
    pub key: StoreKey,
}

impl BeginBlockHook for WriteOnBegin {
    fn begin_block(&self, ctx: &mut Context<'_>) -> Result<(), HookError> {
        ctx.kv_store(&self.key)?.set(b"balance", b"credited")?;
        Ok(())
    }
}

pub struct ReadPeerOnBegin {
    pub own: StoreKey,
    pub peer: StoreKey,
}

impl BeginBlockHook for ReadPeerOnBegin {
    fn begin_block(&self, ctx: &mut Context<'_>) -> Result<(), HookError> {
        let seen = ctx.kv_store(&self.peer)?.get(b"balance")?.unwrap_or_default();
        ctx.kv_store(&self.own)?.set(b"seen", &seen)?;
        Ok(())
    }
}

/// Stores its genesis blob verbatim and exports it back.
pub struct StoreBlob {
    pub key: StoreKey,
}

impl GenesisInit for StoreBlob {
    fn init_genesis(
        &self,
        ctx: &mut Context<'_>,
        raw: &[u8],
    ) -> Result<Vec<ValidatorUpdate>, HookError> {
        ctx.kv_store(&self.key)?.set(b"genesis", raw)?;
        Ok(Vec::new())
    }
}

impl GenesisExport for StoreBlob {
    fn export_genesis(&self, ctx: &mut Context<'_>) -> Result<Vec<u8>, HookError> {
        Ok(ctx.kv_store(&self.key)?.get(b"genesis")?.unwrap_or_default())
    }
}

pub struct Updates(pub Vec<ValidatorUpdate>);

impl EndBlockHook for Updates {
    fn end_block(&self, _ctx: &mut Context<'_>) -> Result<Vec<ValidatorUpdate>, HookError> {
        Ok(self.0.clone())
    }
}
