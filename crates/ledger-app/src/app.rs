//! # Application Root
//!
//! Owns the store registry, the commit store, every keeper and the module
//! manager, and exposes the entry points the consensus engine calls.
//!
//! ## Block lifecycle
//!
//! ```text
//!            init_chain (genesis writes held for block 1)
//!                 │
//!                 ▼
//! Idle ──begin_block──→ TxProcessing ──end_block──→ EndBlock ──commit──→ Committed
//!   ▲                     │  ▲                                              │
//!   │                     └──┘ deliver                                      │
//!   └──────────────────────────────── begin_block ◀─────────────────────────┘
//!
//! any genesis / begin / end / commit failure ──→ Aborted (halted for good)
//! ```
//!
//! Every phase of a block writes into one branch of the commit store. The
//! branch reaches the store only in [`App::commit`]; a failure anywhere
//! before that drops it, so no partition keeps partial writes.

use std::collections::{BTreeMap, BTreeSet};
use std::fmt::Display;
use std::sync::Arc;

use chrono::{DateTime, Utc};
use mc_01_store::{
    CacheMultiStore, ChangeSet, CommitId, CommitMultiStore, InMemoryVersionStore, StoreError,
    StoreKey, StoreKind, StoreRegistry, VersionStore,
};
use mc_02_module_manager::{Context, Manager, Phase};
use mc_03_params::ParamsKeeper;
use mc_04_auth::{AccountKeeper, Permission};
use mc_05_bank::BankKeeper;
use mc_06_capability::CapabilityKeeper;
use mc_07_staking::{StakingKeeper, BONDED_POOL};
use mc_08_asset::AssetKeeper;
use shared_types::{Address, BlockHeader, Codec, Event};
use tracing::{debug, error, info, instrument, warn};

use crate::abci::{
    RequestBeginBlock, RequestEndBlock, RequestInitChain, ResponseBeginBlock, ResponseCommit,
    ResponseEndBlock, ResponseInitChain,
};
use crate::config::{AppConfig, StorageBackend};
use crate::errors::{AppError, FatalCause};
use crate::genesis::{encode_app_state, parse_app_state};

/// Genesis order. Capability comes first so scoped modules find their
/// capabilities in place.
pub const GENESIS_ORDER: [&str; 5] = [
    mc_06_capability::MODULE_NAME,
    mc_04_auth::MODULE_NAME,
    mc_05_bank::MODULE_NAME,
    mc_07_staking::MODULE_NAME,
    mc_08_asset::MODULE_NAME,
];

/// Begin-block order. Bank pays the proposer before asset snapshots
/// collateral.
pub const BEGIN_BLOCK_ORDER: [&str; 5] = [
    mc_06_capability::MODULE_NAME,
    mc_04_auth::MODULE_NAME,
    mc_05_bank::MODULE_NAME,
    mc_07_staking::MODULE_NAME,
    mc_08_asset::MODULE_NAME,
];

pub const END_BLOCK_ORDER: [&str; 2] = [mc_07_staking::MODULE_NAME, mc_08_asset::MODULE_NAME];

/// Where a block stands.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BlockPhase {
    /// No block in flight.
    Idle,
    /// Begin-block hooks are running.
    BeginBlock,
    /// Begin-block finished; deliveries are accepted.
    TxProcessing,
    /// End-block finished; waiting for commit.
    EndBlock,
    Committed,
    /// A fatal failure discarded the block.
    Aborted,
}

/// Every keeper the application wired, for query routers and deliveries.
#[derive(Debug, Clone)]
pub struct Keepers {
    pub params: ParamsKeeper,
    pub accounts: AccountKeeper,
    pub bank: BankKeeper,
    pub capability: CapabilityKeeper,
    pub staking: StakingKeeper,
    pub asset: AssetKeeper,
}

/// Outcome of one delivery. A failed delivery leaves no writes and no
/// events behind.
#[derive(Debug)]
pub struct TxResult<T, E> {
    pub result: Result<T, E>,
    pub events: Vec<Event>,
}

/// The block in flight: its header and everything written so far.
struct PendingBlock {
    header: BlockHeader,
    changes: ChangeSet,
}

/// The assembled application.
pub struct App {
    config: AppConfig,
    registry: StoreRegistry,
    store: CommitMultiStore,
    manager: Manager,
    keepers: Keepers,
    warnings: Vec<String>,

    // =========================================================================
    // BLOCK STATE
    // =========================================================================
    phase: BlockPhase,
    pending: Option<PendingBlock>,
    /// Genesis writes, carried into the first block's branch.
    genesis_changes: Option<ChangeSet>,
    initial_height: u64,
    /// Set by a fatal failure or the halt height. Never cleared.
    halted: Option<u64>,
    /// Header handed to read-only contexts over committed state.
    query_header: BlockHeader,
}

impl App {
    /// Assemble the application over `versions`.
    ///
    /// ## Assembly order
    ///
    /// 1. Allocate one partition per store key
    /// 2. Build keepers, each bound to its keys and injected peers
    /// 3. Register descriptors, declare the three orders
    /// 4. Validate peer wiring and report hooks left out of an order
    /// 5. Mount every partition and optionally restore the latest version
    #[instrument(name = "assemble", skip_all, fields(chain_id = %config.chain_id))]
    pub fn new(config: AppConfig, versions: Arc<dyn VersionStore>) -> Result<Self, AppError> {
        config.validate()?;
        let codec = Codec::new(config.codec);

        let mut registry = StoreRegistry::new();
        let mut keys = registry.allocate(
            [
                mc_04_auth::STORE_KEY,
                mc_05_bank::STORE_KEY,
                mc_07_staking::STORE_KEY,
                mc_03_params::STORE_KEY,
                mc_06_capability::STORE_KEY,
                mc_08_asset::STORE_KEY,
            ],
            StoreKind::Persistent,
        )?;
        let mut tkeys = registry.allocate([mc_03_params::TSTORE_KEY], StoreKind::Transient)?;
        let mut mkeys = registry.allocate([mc_06_capability::MEM_STORE_KEY], StoreKind::Memory)?;

        let mut params = ParamsKeeper::new(
            codec,
            take_key(&mut keys, mc_03_params::STORE_KEY, StoreKind::Persistent)?,
            take_key(&mut tkeys, mc_03_params::TSTORE_KEY, StoreKind::Transient)?,
        );
        let mut capability = CapabilityKeeper::new(
            codec,
            take_key(&mut keys, mc_06_capability::STORE_KEY, StoreKind::Persistent)?,
            take_key(&mut mkeys, mc_06_capability::MEM_STORE_KEY, StoreKind::Memory)?,
        );
        let asset_capabilities = capability.scope_to_module(mc_08_asset::MODULE_NAME)?;
        capability.seal();

        let accounts = AccountKeeper::new(
            codec,
            take_key(&mut keys, mc_04_auth::STORE_KEY, StoreKind::Persistent)?,
            module_permissions(),
        );
        let bank = BankKeeper::new(
            codec,
            take_key(&mut keys, mc_05_bank::STORE_KEY, StoreKind::Persistent)?,
            accounts.clone(),
            params.subspace(mc_05_bank::MODULE_NAME)?,
        );
        let staking = StakingKeeper::new(
            codec,
            take_key(&mut keys, mc_07_staking::STORE_KEY, StoreKind::Persistent)?,
            bank.clone(),
            params.subspace(mc_07_staking::MODULE_NAME)?,
        );
        let asset = AssetKeeper::new(
            codec,
            take_key(&mut keys, mc_08_asset::STORE_KEY, StoreKind::Persistent)?,
            accounts.clone(),
            bank.clone(),
            asset_capabilities,
        );

        let mut manager = Manager::new();
        manager.register(mc_04_auth::descriptor(&accounts))?;
        manager.register(mc_05_bank::descriptor(&bank))?;
        manager.register(mc_06_capability::descriptor(&capability))?;
        manager.register(mc_07_staking::descriptor(&staking))?;
        manager.register(mc_03_params::descriptor(&params))?;
        manager.register(mc_08_asset::descriptor(&asset))?;

        manager.set_order(Phase::Genesis, GENESIS_ORDER)?;
        manager.set_order(Phase::BeginBlock, BEGIN_BLOCK_ORDER)?;
        manager.set_order(Phase::EndBlock, END_BLOCK_ORDER)?;
        manager.validate_dependencies()?;
        let warnings = manager.audit();

        let mut store = CommitMultiStore::new(versions, config.pruning.options());
        registry.mount_all(&mut store)?;
        if config.load_latest {
            store.load_latest()?;
        }

        let last = store.last_commit();
        info!(
            "[App] Assembled {} modules over {} partitions, last height {}",
            manager.len(),
            registry.len(),
            last.version
        );

        let query_header = BlockHeader::genesis(config.chain_id.clone(), Default::default(), last.version);
        Ok(Self {
            config,
            registry,
            store,
            manager,
            keepers: Keepers {
                params,
                accounts,
                bank,
                capability,
                staking,
                asset,
            },
            warnings,
            phase: BlockPhase::Idle,
            pending: None,
            genesis_changes: None,
            initial_height: 1,
            halted: None,
            query_header,
        })
    }

    /// Assemble over the configured storage backend.
    pub fn open(config: AppConfig) -> Result<Self, AppError> {
        config.validate()?;
        let versions: Arc<dyn VersionStore> = match config.storage.backend {
            StorageBackend::Memory => Arc::new(InMemoryVersionStore::new()),
            #[cfg(feature = "rocksdb")]
            StorageBackend::RocksDb => {
                let db_config = mc_01_store::RocksDbConfig {
                    path: config.storage.data_dir.display().to_string(),
                    ..Default::default()
                };
                Arc::new(mc_01_store::RocksDbVersionStore::open(db_config)?)
            }
            #[cfg(not(feature = "rocksdb"))]
            StorageBackend::RocksDb => {
                return Err(crate::config::ConfigError::BackendUnavailable(StorageBackend::RocksDb).into())
            }
        };
        Self::new(config, versions)
    }

    // =========================================================================
    // CONSENSUS ENTRY POINTS
    // =========================================================================

    /// Run every genesis hook over the envelope in `req`.
    ///
    /// Genesis writes are not committed here: they open the branch of the
    /// first block. Any hook failure halts the application.
    pub fn init_chain(&mut self, req: RequestInitChain) -> Result<ResponseInitChain, AppError> {
        self.ensure_running()?;
        self.ensure_loaded()?;
        let version = self.store.last_commit().version;
        if version != 0 || self.genesis_changes.is_some() {
            return Err(AppError::AlreadyInitialized { version });
        }
        if self.phase != BlockPhase::Idle {
            return Err(AppError::InvalidPhase {
                call: "init_chain",
                phase: self.phase,
            });
        }
        if req.chain_id != self.config.chain_id {
            return Err(AppError::ChainIdMismatch {
                expected: self.config.chain_id.clone(),
                got: req.chain_id,
            });
        }

        let initial_height = req.first_height()?;
        let time: DateTime<Utc> = req.time.try_into()?;
        let state = parse_app_state(&req.app_state_bytes)?;
        self.store.set_initial_version(initial_height)?;
        info!(
            "[App] InitChain {} at height {} with {} module states",
            req.chain_id,
            initial_height,
            state.len()
        );

        let header = BlockHeader::genesis(req.chain_id, time, initial_height);
        let outcome = {
            let mut ctx = Context::new(&header, CacheMultiStore::new(&self.store));
            self.manager
                .run_genesis(&mut ctx, &state)
                .map(|updates| (updates, ctx.into_parts().0))
        };
        match outcome {
            Ok((validators, changes)) => {
                self.genesis_changes = Some(changes);
                self.initial_height = initial_height;
                info!("[App] Genesis produced {} validators", validators.len());
                Ok(ResponseInitChain::new(&validators))
            }
            Err(err) => Err(self.abort(initial_height, err.into())),
        }
    }

    /// Open a block and run every begin-block hook.
    pub fn begin_block(&mut self, req: RequestBeginBlock) -> Result<ResponseBeginBlock, AppError> {
        self.ensure_running()?;
        self.ensure_loaded()?;
        if !matches!(self.phase, BlockPhase::Idle | BlockPhase::Committed) {
            return Err(AppError::InvalidPhase {
                call: "begin_block",
                phase: self.phase,
            });
        }

        let header = req.to_header()?;
        if header.chain_id != self.config.chain_id {
            return Err(AppError::ChainIdMismatch {
                expected: self.config.chain_id.clone(),
                got: header.chain_id,
            });
        }
        let last = self.store.last_commit().version;
        if last == 0 && self.genesis_changes.is_none() {
            return Err(AppError::NotInitialized);
        }
        let expected = if last == 0 { self.initial_height } else { last + 1 };
        if header.height != expected {
            return Err(AppError::UnexpectedHeight {
                expected,
                got: header.height,
            });
        }
        if let Some(halt) = self.config.halt_height {
            if header.height >= halt {
                warn!("[App] Reached halt height {}, refusing block {}", halt, header.height);
                self.halted = Some(header.height);
                return Err(AppError::Halted {
                    height: header.height,
                });
            }
        }

        self.phase = BlockPhase::BeginBlock;
        let height = header.height;
        let base = self.genesis_changes.take().unwrap_or_default();
        let outcome = {
            let mut ctx = Context::new(&header, CacheMultiStore::resume(&self.store, base));
            self.manager
                .run_begin_block(&mut ctx)
                .map(|events| (events, ctx.into_parts().0))
        };
        match outcome {
            Ok((events, changes)) => {
                debug!("[App] BeginBlock {} emitted {} events", height, events.len());
                self.pending = Some(PendingBlock { header, changes });
                self.phase = BlockPhase::TxProcessing;
                Ok(ResponseBeginBlock { events })
            }
            Err(err) => Err(self.abort(height, err.into())),
        }
    }

    /// Run one state transition in a nested branch of the current block.
    ///
    /// On `Ok` the branch folds into the block; on `Err` it is dropped and
    /// the block continues.
    pub fn deliver<T, E, F>(&mut self, f: F) -> Result<TxResult<T, E>, AppError>
    where
        F: FnOnce(&mut Context<'_>, &Keepers) -> Result<T, E>,
        E: Display,
    {
        let PendingBlock { header, changes } = self.take_pending("deliver", BlockPhase::TxProcessing)?;

        let (result, events, changes) = {
            let mut block = Context::new(&header, CacheMultiStore::resume(&self.store, changes));
            let mut tx = block.branch();
            let result = f(&mut tx, &self.keepers);
            let events = match &result {
                Ok(_) => {
                    let (tx_changes, events) = tx.into_parts();
                    block.absorb(tx_changes, Vec::new());
                    events
                }
                Err(err) => {
                    drop(tx);
                    warn!("[App] Delivery failed at {}: {}", header.height, err);
                    Vec::new()
                }
            };
            (result, events, block.into_parts().0)
        };

        self.pending = Some(PendingBlock { header, changes });
        Ok(TxResult { result, events })
    }

    /// Run every end-block hook and return the validator-set delta.
    pub fn end_block(&mut self, req: RequestEndBlock) -> Result<ResponseEndBlock, AppError> {
        let PendingBlock { header, changes } = self.take_pending("end_block", BlockPhase::TxProcessing)?;
        let height = header.height;
        if u64::try_from(req.height).ok() != Some(height) {
            let got = u64::try_from(req.height).unwrap_or(0);
            self.pending = Some(PendingBlock { header, changes });
            return Err(AppError::UnexpectedHeight { expected: height, got });
        }

        let outcome = {
            let mut ctx = Context::new(&header, CacheMultiStore::resume(&self.store, changes));
            self.manager
                .run_end_block(&mut ctx)
                .map(|outcome| (outcome, ctx.into_parts().0))
        };
        match outcome {
            Ok((outcome, changes)) => {
                if !outcome.validator_updates.is_empty() {
                    info!(
                        "[App] EndBlock {} changes {} validators",
                        height,
                        outcome.validator_updates.len()
                    );
                }
                self.pending = Some(PendingBlock { header, changes });
                self.phase = BlockPhase::EndBlock;
                Ok(ResponseEndBlock::new(&outcome.validator_updates, outcome.events))
            }
            Err(err) => Err(self.abort(height, err.into())),
        }
    }

    /// Version the block's branch.
    ///
    /// The store only applies the branch once the version is saved, so a
    /// failed commit halts with the last committed state still in place.
    pub fn commit(&mut self) -> Result<ResponseCommit, AppError> {
        let PendingBlock { header, changes } = self.take_pending("commit", BlockPhase::EndBlock)?;
        let height = header.height;

        let id = match self.store.commit(changes) {
            Ok(id) => id,
            Err(err) => return Err(self.abort(height, err.into())),
        };

        self.query_header = header;
        self.phase = BlockPhase::Committed;
        Ok(ResponseCommit {
            height: i64::try_from(id.version).unwrap_or(i64::MAX),
            app_hash: id.app_hash.to_vec(),
        })
    }

    /// Restore state as committed at `height`, discarding any block in
    /// flight. Later heights stay loadable until block `height + 1` is
    /// committed again.
    pub fn load_height(&mut self, height: u64) -> Result<CommitId, AppError> {
        self.ensure_running()?;
        let id = self.store.load_version(height)?;
        if let Some(pending) = self.pending.take() {
            warn!(
                "[App] Discarded block {} in flight while loading {}",
                pending.header.height, height
            );
        }
        self.genesis_changes = None;
        self.phase = BlockPhase::Idle;
        self.query_header = BlockHeader::genesis(
            self.config.chain_id.clone(),
            self.query_header.time,
            id.version,
        );
        info!("[App] Restored height {}", id.version);
        Ok(id)
    }

    // =========================================================================
    // QUERIES
    // =========================================================================

    /// Context over the last committed state. Its writes are never applied.
    pub fn query_context(&self) -> Context<'_> {
        Context::new(&self.query_header, CacheMultiStore::new(&self.store))
    }

    /// Genesis envelope reproducing the last committed state.
    pub fn export_app_state(&self) -> Result<Vec<u8>, AppError> {
        let mut ctx = self.query_context();
        let state = self.manager.run_export_genesis(&mut ctx)?;
        info!(
            "[App] Exported {} module states at height {}",
            state.len(),
            self.store.last_commit().version
        );
        encode_app_state(state)
    }

    pub fn keepers(&self) -> &Keepers {
        &self.keepers
    }

    pub fn manager(&self) -> &Manager {
        &self.manager
    }

    pub fn config(&self) -> &AppConfig {
        &self.config
    }

    /// Addresses of the module accounts, derived from the permission table.
    pub fn module_account_addrs(&self) -> BTreeSet<Address> {
        module_permissions()
            .into_keys()
            .map(|name| Address::for_module(&name))
            .collect()
    }

    /// Every key issued at assembly.
    pub fn store_keys(&self) -> impl Iterator<Item = &StoreKey> {
        self.registry.issued()
    }

    /// Hooks left out of their phase's order, found at assembly.
    pub fn audit_warnings(&self) -> &[String] {
        &self.warnings
    }

    pub fn phase(&self) -> BlockPhase {
        self.phase
    }

    pub fn last_commit(&self) -> CommitId {
        self.store.last_commit()
    }

    /// Height the application halted at, if it did.
    pub fn halted_at(&self) -> Option<u64> {
        self.halted
    }

    // =========================================================================
    // INTERNALS
    // =========================================================================

    fn ensure_running(&self) -> Result<(), AppError> {
        match self.halted {
            Some(height) => Err(AppError::Halted { height }),
            None => Ok(()),
        }
    }

    fn ensure_loaded(&self) -> Result<(), AppError> {
        if self.store.is_loaded() {
            Ok(())
        } else {
            Err(StoreError::NotLoaded.into())
        }
    }

    fn take_pending(&mut self, call: &'static str, phase: BlockPhase) -> Result<PendingBlock, AppError> {
        self.ensure_running()?;
        if self.phase != phase {
            return Err(AppError::InvalidPhase {
                call,
                phase: self.phase,
            });
        }
        self.pending.take().ok_or(AppError::InvalidPhase {
            call,
            phase: self.phase,
        })
    }

    /// Drop the block in flight and halt.
    fn abort(&mut self, height: u64, cause: FatalCause) -> AppError {
        error!("[App] Fatal failure at height {}: {}", height, cause);
        self.pending = None;
        self.genesis_changes = None;
        self.phase = BlockPhase::Aborted;
        self.halted = Some(height);
        AppError::Fatal {
            height,
            source: cause,
        }
    }
}

fn take_key(
    keys: &mut BTreeMap<String, StoreKey>,
    name: &str,
    kind: StoreKind,
) -> Result<StoreKey, StoreError> {
    keys.remove(name).ok_or_else(|| StoreError::UnmountedKey {
        name: name.to_string(),
        kind,
    })
}

/// Accounts allowed to mint, burn or bond.
fn module_permissions() -> BTreeMap<String, Vec<Permission>> {
    BTreeMap::from([
        (mc_05_bank::MODULE_NAME.to_string(), vec![Permission::Minter]),
        (BONDED_POOL.to_string(), vec![Permission::Burner, Permission::Staking]),
        (
            mc_08_asset::MODULE_NAME.to_string(),
            vec![Permission::Minter, Permission::Burner],
        ),
    ])
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::abci::{WireHeader, WireTimestamp};
    use crate::genesis::GenesisDocument;
    use chrono::{TimeZone, Utc};

    fn app() -> App {
        App::new(AppConfig::default(), Arc::new(InMemoryVersionStore::new())).unwrap()
    }

    fn begin(height: i64) -> RequestBeginBlock {
        RequestBeginBlock {
            header: WireHeader {
                chain_id: AppConfig::default().chain_id,
                height,
                time: WireTimestamp {
                    seconds: 1_700_000_000 + height,
                    nanos: 0,
                },
                proposer_address: Vec::new(),
            },
            byzantine_validators: Vec::new(),
        }
    }

    fn genesis() -> RequestInitChain {
        let time = Utc.timestamp_opt(1_700_000_000, 0).unwrap();
        GenesisDocument::devnet(AppConfig::default().chain_id, time)
            .unwrap()
            .init_chain_request()
            .unwrap()
    }

    #[test]
    fn test_assembly_wires_every_module() {
        let app = app();
        assert_eq!(app.manager().len(), 6);
        assert_eq!(app.store_keys().count(), 8);
        assert!(app.audit_warnings().is_empty());
        assert_eq!(app.phase(), BlockPhase::Idle);
        assert!(app.keepers().capability.is_sealed());
    }

    #[test]
    fn test_module_accounts_follow_permissions() {
        let addrs = app().module_account_addrs();
        assert_eq!(addrs.len(), 3);
        assert!(addrs.contains(&Address::for_module(mc_05_bank::MODULE_NAME)));
        assert!(addrs.contains(&Address::for_module(BONDED_POOL)));
        assert!(addrs.contains(&Address::for_module(mc_08_asset::MODULE_NAME)));
        assert!(!addrs.contains(&Address::for_module(mc_04_auth::MODULE_NAME)));
    }

    #[test]
    fn test_declared_dependencies_are_registered() {
        let app = app();
        for module in app.manager().modules() {
            for peer in module.dependencies() {
                assert!(
                    app.manager().module(peer.as_str()).is_some(),
                    "{} depends on unregistered {}",
                    module.name().as_str(),
                    peer.as_str()
                );
            }
        }
        let asset: Vec<_> = app
            .manager()
            .module(mc_08_asset::MODULE_NAME)
            .unwrap()
            .dependencies()
            .iter()
            .map(|n| n.as_str())
            .collect();
        assert_eq!(
            asset,
            [
                mc_04_auth::MODULE_NAME,
                mc_05_bank::MODULE_NAME,
                mc_06_capability::MODULE_NAME
            ]
        );
    }

    #[test]
    fn test_begin_before_genesis_is_refused() {
        let mut app = app();
        assert!(matches!(app.begin_block(begin(1)), Err(AppError::NotInitialized)));
        assert_eq!(app.halted_at(), None);
    }

    #[test]
    fn test_height_and_chain_checks() {
        let mut app = app();
        app.init_chain(genesis()).unwrap();
        assert!(matches!(
            app.begin_block(begin(2)),
            Err(AppError::UnexpectedHeight { expected: 1, got: 2 })
        ));

        let mut other = begin(1);
        other.header.chain_id = "elsewhere".into();
        assert!(matches!(app.begin_block(other), Err(AppError::ChainIdMismatch { .. })));
        assert!(app.begin_block(begin(1)).is_ok());
    }

    #[test]
    fn test_init_chain_twice_is_refused() {
        let mut app = app();
        app.init_chain(genesis()).unwrap();
        assert!(matches!(
            app.init_chain(genesis()),
            Err(AppError::AlreadyInitialized { version: 0 })
        ));
    }

    #[test]
    fn test_full_block_cycle() {
        let mut app = app();
        let response = app.init_chain(genesis()).unwrap();
        assert_eq!(response.validators.len(), 1);
        assert_eq!(response.validators[0].power, 10);

        app.begin_block(begin(1)).unwrap();
        assert_eq!(app.phase(), BlockPhase::TxProcessing);
        let end = app.end_block(RequestEndBlock { height: 1 }).unwrap();
        assert!(end.validator_updates.is_empty());
        assert_eq!(app.phase(), BlockPhase::EndBlock);
        let commit = app.commit().unwrap();
        assert_eq!(commit.height, 1);
        assert_eq!(commit.app_hash.len(), 32);
        assert_eq!(app.phase(), BlockPhase::Committed);
        assert_eq!(app.last_commit().version, 1);
    }
}
