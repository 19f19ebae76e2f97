//! # Module Manager
//!
//! Registry of [`ModuleDescriptor`]s plus the genesis, begin-block and
//! end-block ordering lists, and the drivers that walk them.
//!
//! ## Invariants
//!
//! - A name is registered at most once.
//! - A store key belongs to at most one registered module.
//! - Every name in an ordering list is registered and appears once.
//! - A rejected `set_order` leaves the previous list in place.
//! - Hooks run strictly one after another in list order; the first error
//!   stops the phase.
//! - Within one phase at most one module may return validator updates.

use std::collections::{BTreeMap, BTreeSet};

use shared_types::{Event, ModuleName, ValidatorUpdate};
use tracing::{debug, error, info, instrument, warn};

use crate::domain::{Context, ManagerError, ModuleDescriptor, OrderingList, Phase};

/// Per-module genesis blobs, passed through untouched.
pub type GenesisState = BTreeMap<ModuleName, Vec<u8>>;

/// What the end-block phase hands back to consensus.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct EndBlockOutcome {
    pub events: Vec<Event>,
    pub validator_updates: Vec<ValidatorUpdate>,
}

/// Holds the module set and drives every phase.
#[derive(Debug, Default)]
pub struct Manager {
    modules: BTreeMap<ModuleName, ModuleDescriptor>,
    registration: Vec<ModuleName>,
    genesis_order: OrderingList,
    begin_order: OrderingList,
    end_order: OrderingList,
}

impl Manager {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a module. Registration implies no ordering.
    pub fn register(&mut self, descriptor: ModuleDescriptor) -> Result<(), ManagerError> {
        let name = descriptor.name().clone();
        if self.modules.contains_key(&name) {
            return Err(ManagerError::DuplicateModule(name));
        }
        for key in descriptor.store_keys() {
            if let Some(owner) = self
                .modules
                .values()
                .find(|other| other.store_keys().contains(key))
            {
                return Err(ManagerError::SharedStoreKey {
                    key: key.to_string(),
                    first: owner.name().clone(),
                    second: name.clone(),
                });
            }
        }

        info!(
            "[Manager] Registered module {} (genesis: {}, begin: {}, end: {})",
            name,
            descriptor.genesis().is_some(),
            descriptor.begin_block().is_some(),
            descriptor.end_block().is_some()
        );
        self.registration.push(name.clone());
        self.modules.insert(name, descriptor);
        Ok(())
    }

    /// Declare the execution order of one phase.
    ///
    /// All-or-nothing: on error the previous order is kept.
    #[instrument(skip(self, names), fields(phase = %phase))]
    pub fn set_order<I, N>(&mut self, phase: Phase, names: I) -> Result<(), ManagerError>
    where
        I: IntoIterator<Item = N>,
        N: Into<ModuleName>,
    {
        let list = OrderingList::new(phase, names)?;
        if let Some(unknown) = list.iter().find(|n| !self.modules.contains_key(*n)) {
            return Err(ManagerError::UnknownModule {
                phase,
                name: unknown.clone(),
            });
        }

        info!("[Manager] {} order: {:?}", phase, list.as_slice());
        *self.order_mut(phase) = list;
        Ok(())
    }

    pub fn order(&self, phase: Phase) -> &OrderingList {
        match phase {
            Phase::Genesis => &self.genesis_order,
            Phase::BeginBlock => &self.begin_order,
            Phase::EndBlock => &self.end_order,
        }
    }

    fn order_mut(&mut self, phase: Phase) -> &mut OrderingList {
        match phase {
            Phase::Genesis => &mut self.genesis_order,
            Phase::BeginBlock => &mut self.begin_order,
            Phase::EndBlock => &mut self.end_order,
        }
    }

    pub fn module(&self, name: &str) -> Option<&ModuleDescriptor> {
        self.modules.get(name)
    }

    /// Registered modules in registration order.
    pub fn modules(&self) -> impl Iterator<Item = &ModuleDescriptor> {
        self.registration.iter().filter_map(|n| self.modules.get(n))
    }

    pub fn len(&self) -> usize {
        self.modules.len()
    }

    pub fn is_empty(&self) -> bool {
        self.modules.is_empty()
    }

    /// Reject peer wiring that names an unknown module or forms a cycle.
    #[instrument(skip(self))]
    pub fn validate_dependencies(&self) -> Result<(), ManagerError> {
        for descriptor in self.modules.values() {
            for dependency in descriptor.dependencies() {
                if !self.modules.contains_key(dependency) {
                    return Err(ManagerError::UnknownDependency {
                        module: descriptor.name().clone(),
                        dependency: dependency.clone(),
                    });
                }
            }
        }

        let mut done = BTreeSet::new();
        for name in self.modules.keys() {
            let mut stack = Vec::new();
            self.visit(name, &mut stack, &mut done)?;
        }

        debug!("[Manager] Dependency graph of {} modules is acyclic", self.modules.len());
        Ok(())
    }

    fn visit(
        &self,
        name: &ModuleName,
        stack: &mut Vec<ModuleName>,
        done: &mut BTreeSet<ModuleName>,
    ) -> Result<(), ManagerError> {
        if done.contains(name) {
            return Ok(());
        }
        if let Some(start) = stack.iter().position(|n| n == name) {
            let mut path = stack[start..].to_vec();
            path.push(name.clone());
            return Err(ManagerError::DependencyCycle { path });
        }

        stack.push(name.clone());
        if let Some(descriptor) = self.modules.get(name) {
            for dependency in descriptor.dependencies() {
                self.visit(dependency, stack, done)?;
            }
        }
        stack.pop();
        done.insert(name.clone());
        Ok(())
    }

    /// Warn about hooks that can never run because their module is missing
    /// from that phase's order. Returns the warnings.
    pub fn audit(&self) -> Vec<String> {
        let mut warnings = Vec::new();
        for descriptor in self.modules() {
            let name = descriptor.name();
            let missing = [
                (Phase::Genesis, descriptor.genesis().is_some()),
                (Phase::BeginBlock, descriptor.begin_block().is_some()),
                (Phase::EndBlock, descriptor.end_block().is_some()),
            ];
            for (phase, has_hook) in missing {
                if has_hook && !self.order(phase).contains(name) {
                    let warning = format!("{} implements {} but is not in its order", name, phase);
                    warn!("[Manager] {}", warning);
                    warnings.push(warning);
                }
            }
        }
        warnings
    }

    /// Run every genesis hook in order.
    ///
    /// A module without a blob is skipped. A blob for an unregistered module
    /// is an error. Returns the initial validator set, if a module produced
    /// one.
    pub fn run_genesis(
        &self,
        ctx: &mut Context<'_>,
        state: &GenesisState,
    ) -> Result<Vec<ValidatorUpdate>, ManagerError> {
        for name in state.keys() {
            let Some(descriptor) = self.modules.get(name) else {
                return Err(ManagerError::UnknownGenesisModule(name.clone()));
            };
            if !self.genesis_order.contains(name) {
                warn!("[Manager] Genesis state for {} ignored: not in genesis order", name);
            } else if descriptor.genesis().is_none() {
                warn!("[Manager] Genesis state for {} ignored: no genesis hook", name);
            }
        }

        let mut updates = UpdateSource::new(Phase::Genesis);
        for name in self.genesis_order.iter() {
            let Some(hook) = self.modules.get(name).and_then(ModuleDescriptor::genesis) else {
                continue;
            };
            let Some(raw) = state.get(name) else {
                debug!("[Manager] {} has no genesis state, skipping", name);
                continue;
            };

            debug!("[Manager] genesis -> {}", name);
            let returned = hook
                .init_genesis(ctx, raw)
                .map_err(|source| fatal(name, Phase::Genesis, source))?;
            updates.record(name, returned)?;
        }

        info!("[Manager] Genesis complete at height {}", ctx.block_height());
        Ok(updates.into_updates())
    }

    /// Run every begin-block hook in order. Returns the phase's events.
    pub fn run_begin_block(&self, ctx: &mut Context<'_>) -> Result<Vec<Event>, ManagerError> {
        for name in self.begin_order.iter() {
            let Some(hook) = self.modules.get(name).and_then(ModuleDescriptor::begin_block) else {
                continue;
            };
            debug!("[Manager] begin-block {} -> {}", ctx.block_height(), name);
            hook.begin_block(ctx)
                .map_err(|source| fatal(name, Phase::BeginBlock, source))?;
        }
        Ok(ctx.take_events())
    }

    /// Run every end-block hook in order.
    pub fn run_end_block(&self, ctx: &mut Context<'_>) -> Result<EndBlockOutcome, ManagerError> {
        let mut updates = UpdateSource::new(Phase::EndBlock);
        for name in self.end_order.iter() {
            let Some(hook) = self.modules.get(name).and_then(ModuleDescriptor::end_block) else {
                continue;
            };
            debug!("[Manager] end-block {} -> {}", ctx.block_height(), name);
            let returned = hook
                .end_block(ctx)
                .map_err(|source| fatal(name, Phase::EndBlock, source))?;
            updates.record(name, returned)?;
        }
        Ok(EndBlockOutcome {
            events: ctx.take_events(),
            validator_updates: updates.into_updates(),
        })
    }

    /// Collect a genesis blob from every module with an export hook, in
    /// genesis order.
    pub fn run_export_genesis(&self, ctx: &mut Context<'_>) -> Result<GenesisState, ManagerError> {
        let mut exported = GenesisState::new();
        for name in self.genesis_order.iter() {
            let Some(hook) = self.modules.get(name).and_then(ModuleDescriptor::export) else {
                continue;
            };
            let blob = hook
                .export_genesis(ctx)
                .map_err(|source| ManagerError::Export {
                    module: name.clone(),
                    source,
                })?;
            exported.insert(name.clone(), blob);
        }
        Ok(exported)
    }
}

fn fatal(name: &ModuleName, phase: Phase, source: crate::domain::HookError) -> ManagerError {
    error!("[Manager] {} hook of {} failed: {}", phase, name, source);
    ManagerError::Hook {
        module: name.clone(),
        phase,
        source,
    }
}

/// Tracks which module supplied validator updates in one phase.
struct UpdateSource {
    phase: Phase,
    source: Option<ModuleName>,
    updates: Vec<ValidatorUpdate>,
}

impl UpdateSource {
    fn new(phase: Phase) -> Self {
        Self {
            phase,
            source: None,
            updates: Vec::new(),
        }
    }

    fn record(&mut self, name: &ModuleName, updates: Vec<ValidatorUpdate>) -> Result<(), ManagerError> {
        if updates.is_empty() {
            return Ok(());
        }
        if let Some(first) = &self.source {
            return Err(ManagerError::DuplicateValidatorUpdates {
                phase: self.phase,
                first: first.clone(),
                second: name.clone(),
            });
        }
        self.source = Some(name.clone());
        self.updates = updates;
        Ok(())
    }

    fn into_updates(self) -> Vec<ValidatorUpdate> {
        self.updates
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::HookError;
    use crate::test_utils::*;
    use mc_01_store::{CacheMultiStore, KvStore};
    use shared_types::Address;
    use std::sync::Arc;

    #[test]
    fn test_register_rejects_duplicate_name() {
        let mut manager = Manager::new();
        manager.register(ModuleDescriptor::new("bank")).unwrap();
        let err = manager.register(ModuleDescriptor::new("bank")).unwrap_err();
        assert!(matches!(err, ManagerError::DuplicateModule(ref n) if n.as_str() == "bank"));
        assert!(err.is_configuration());
        assert_eq!(manager.len(), 1);
    }

    #[test]
    fn test_register_rejects_key_owned_by_another_module() {
        let fx = Fixture::new(&["bank", "asset"]);
        let mut manager = Manager::new();
        manager
            .register(ModuleDescriptor::new("bank").with_store_keys([fx.key("bank")]))
            .unwrap();

        let err = manager
            .register(
                ModuleDescriptor::new("asset").with_store_keys([fx.key("asset"), fx.key("bank")]),
            )
            .unwrap_err();
        match &err {
            ManagerError::SharedStoreKey { first, second, .. } => {
                assert_eq!(first.as_str(), "bank");
                assert_eq!(second.as_str(), "asset");
            }
            other => panic!("unexpected error: {other:?}"),
        }
        assert!(err.is_configuration());
        assert!(manager.module("asset").is_none());

        manager
            .register(ModuleDescriptor::new("asset").with_store_keys([fx.key("asset")]))
            .unwrap();
        assert_eq!(manager.len(), 2);
    }

    #[test]
    fn test_unknown_name_leaves_prior_order_unchanged() {
        let mut manager = Manager::new();
        manager.register(ModuleDescriptor::new("auth")).unwrap();
        manager.register(ModuleDescriptor::new("bank")).unwrap();
        manager.set_order(Phase::BeginBlock, ["auth", "bank"]).unwrap();

        let err = manager
            .set_order(Phase::BeginBlock, ["bank", "doesnotexist", "auth"])
            .unwrap_err();
        assert!(matches!(
            err,
            ManagerError::UnknownModule { phase: Phase::BeginBlock, ref name } if name.as_str() == "doesnotexist"
        ));
        let names: Vec<&str> = manager
            .order(Phase::BeginBlock)
            .iter()
            .map(ModuleName::as_str)
            .collect();
        assert_eq!(names, vec!["auth", "bank"]);
    }

    #[test]
    fn test_duplicate_in_order_is_rejected() {
        let mut manager = Manager::new();
        manager.register(ModuleDescriptor::new("auth")).unwrap();
        let err = manager.set_order(Phase::Genesis, ["auth", "auth"]).unwrap_err();
        assert!(matches!(err, ManagerError::DuplicateInOrder { .. }));
        assert!(manager.order(Phase::Genesis).is_empty());
    }

    #[test]
    fn test_dependency_validation() {
        let mut manager = Manager::new();
        manager.register(ModuleDescriptor::new("auth")).unwrap();
        manager
            .register(ModuleDescriptor::new("bank").depends_on(["auth"]))
            .unwrap();
        manager
            .register(ModuleDescriptor::new("asset").depends_on(["bank", "auth"]))
            .unwrap();
        manager.validate_dependencies().unwrap();

        manager
            .register(ModuleDescriptor::new("oracle").depends_on(["pricefeed"]))
            .unwrap();
        assert!(matches!(
            manager.validate_dependencies(),
            Err(ManagerError::UnknownDependency { .. })
        ));
    }

    #[test]
    fn test_dependency_cycle_is_rejected() {
        let mut manager = Manager::new();
        manager
            .register(ModuleDescriptor::new("a").depends_on(["b"]))
            .unwrap();
        manager
            .register(ModuleDescriptor::new("b").depends_on(["c"]))
            .unwrap();
        manager
            .register(ModuleDescriptor::new("c").depends_on(["a"]))
            .unwrap();

        let path = match manager.validate_dependencies().unwrap_err() {
            ManagerError::DependencyCycle { path } => path,
            other => panic!("expected cycle, got {other:?}"),
        };
        let names: Vec<&str> = path.iter().map(ModuleName::as_str).collect();
        assert_eq!(names, vec!["a", "b", "c", "a"]);
    }

    #[test]
    fn test_audit_warns_for_unordered_hooks() {
        let mut fx = Fixture::new(&["bank", "asset"]);
        fx.manager
            .register(recorder("bank").with_end_block(Arc::new(Noop)))
            .unwrap();
        fx.manager.register(recorder("asset")).unwrap();
        fx.manager.set_order(Phase::BeginBlock, ["bank", "asset"]).unwrap();
        fx.manager.set_order(Phase::Genesis, ["bank", "asset"]).unwrap();

        let warnings = fx.manager.audit();
        assert_eq!(warnings.len(), 1);
        assert!(warnings[0].contains("bank"));
        assert!(warnings[0].contains("end-block"));
    }

    #[test]
    fn test_begin_block_runs_in_declared_order() {
        let mut fx = Fixture::new(&["m1", "m2", "m3"]);
        for name in ["m1", "m2", "m3"] {
            fx.manager.register(recorder(name)).unwrap();
        }
        // Registration order differs from execution order.
        fx.manager.set_order(Phase::BeginBlock, ["m3", "m1", "m2"]).unwrap();

        let header = header(5);
        let mut ctx = Context::new(&header, CacheMultiStore::new(&fx.root));
        let events = fx.manager.run_begin_block(&mut ctx).unwrap();

        let order: Vec<_> = events.iter().filter_map(|e| e.attribute("module")).collect();
        assert_eq!(order, vec!["m3", "m1", "m2"]);
    }

    #[test]
    fn test_begin_block_is_deterministic() {
        let mut fx = Fixture::new(&["m1", "m2", "m3"]);
        for name in ["m1", "m2", "m3"] {
            fx.manager.register(recorder(name)).unwrap();
        }
        fx.manager.set_order(Phase::BeginBlock, ["m1", "m2", "m3"]).unwrap();

        let header = header(9);
        let run = |fx: &Fixture| {
            let mut ctx = Context::new(&header, CacheMultiStore::new(&fx.root));
            fx.manager.run_begin_block(&mut ctx).unwrap()
        };
        assert_eq!(run(&fx), run(&fx));
    }

    #[test]
    fn test_failing_hook_stops_the_phase() {
        let mut fx = Fixture::new(&["m1", "m2", "m3"]);
        fx.manager.register(recorder("m1")).unwrap();
        fx.manager
            .register(ModuleDescriptor::new("m2").with_begin_block(Arc::new(Failing)))
            .unwrap();
        fx.manager.register(recorder("m3")).unwrap();
        fx.manager.set_order(Phase::BeginBlock, ["m1", "m2", "m3"]).unwrap();

        let header = header(3);
        let mut ctx = Context::new(&header, CacheMultiStore::new(&fx.root));
        let err = fx.manager.run_begin_block(&mut ctx).unwrap_err();

        assert!(matches!(
            err,
            ManagerError::Hook { phase: Phase::BeginBlock, ref module, .. } if module.as_str() == "m2"
        ));
        // m3 never ran.
        let ran: Vec<_> = ctx.events().iter().filter_map(|e| e.attribute("module")).collect();
        assert_eq!(ran, vec!["m1"]);
    }

    #[test]
    fn test_later_hook_observes_earlier_write() {
        let mut fx = Fixture::new(&["bank", "asset"]);
        let bank_key = fx.key("bank");
        let asset_key = fx.key("asset");
        fx.manager
            .register(
                ModuleDescriptor::new("bank")
                    .with_begin_block(Arc::new(WriteOnBegin { key: bank_key.clone() })),
            )
            .unwrap();
        fx.manager
            .register(ModuleDescriptor::new("asset").with_begin_block(Arc::new(ReadPeerOnBegin {
                own: asset_key.clone(),
                peer: bank_key,
            })))
            .unwrap();
        fx.manager.set_order(Phase::BeginBlock, ["bank", "asset"]).unwrap();

        let header = header(2);
        let mut ctx = Context::new(&header, CacheMultiStore::new(&fx.root));
        fx.manager.run_begin_block(&mut ctx).unwrap();

        let seen = ctx.kv_store(&asset_key).unwrap().get(b"seen").unwrap();
        assert_eq!(seen, Some(b"credited".to_vec()));
    }

    #[test]
    fn test_genesis_skips_modules_without_blob() {
        let mut fx = Fixture::new(&["auth", "bank", "staking", "asset"]);
        for name in ["auth", "bank", "staking", "asset"] {
            let key = fx.key(name);
            fx.manager
                .register(ModuleDescriptor::new(name).with_genesis(Arc::new(StoreBlob { key })))
                .unwrap();
        }
        fx.manager
            .set_order(Phase::Genesis, ["auth", "bank", "staking", "asset"])
            .unwrap();

        let mut state = GenesisState::new();
        state.insert("auth".into(), br#"{"accounts":[]}"#.to_vec());
        state.insert("bank".into(), br#"{"balances":[]}"#.to_vec());

        let header = header(1);
        let mut ctx = Context::new(&header, CacheMultiStore::new(&fx.root));
        fx.manager.run_genesis(&mut ctx, &state).unwrap();

        let auth = fx.key("auth");
        let staking = fx.key("staking");
        assert_eq!(
            ctx.kv_store(&auth).unwrap().get(b"genesis").unwrap(),
            Some(br#"{"accounts":[]}"#.to_vec())
        );
        assert!(ctx.kv_store(&staking).unwrap().iter_prefix(b"").unwrap().is_empty());
    }

    #[test]
    fn test_genesis_blob_for_unregistered_module_fails() {
        let mut fx = Fixture::new(&["auth"]);
        fx.manager.register(recorder("auth")).unwrap();
        fx.manager.set_order(Phase::Genesis, ["auth"]).unwrap();

        let mut state = GenesisState::new();
        state.insert("ghost".into(), b"{}".to_vec());

        let header = header(1);
        let mut ctx = Context::new(&header, CacheMultiStore::new(&fx.root));
        assert!(matches!(
            fx.manager.run_genesis(&mut ctx, &state),
            Err(ManagerError::UnknownGenesisModule(_))
        ));
    }

    #[test]
    fn test_second_validator_source_is_rejected() {
        let mut fx = Fixture::new(&["staking", "rogue"]);
        let validator = ValidatorUpdate::new(Address::for_module("val"), 10);
        for name in ["staking", "rogue"] {
            fx.manager
                .register(
                    ModuleDescriptor::new(name)
                        .with_end_block(Arc::new(Updates(vec![validator.clone()]))),
                )
                .unwrap();
        }
        fx.manager.set_order(Phase::EndBlock, ["staking", "rogue"]).unwrap();

        let header = header(4);
        let mut ctx = Context::new(&header, CacheMultiStore::new(&fx.root));
        let err = fx.manager.run_end_block(&mut ctx).unwrap_err();
        assert!(matches!(
            err,
            ManagerError::DuplicateValidatorUpdates { phase: Phase::EndBlock, .. }
        ));
    }

    #[test]
    fn test_end_block_returns_updates_and_events() {
        let mut fx = Fixture::new(&["staking", "asset"]);
        let validator = ValidatorUpdate::new(Address::for_module("val"), 10);
        fx.manager
            .register(
                ModuleDescriptor::new("staking")
                    .with_end_block(Arc::new(Updates(vec![validator.clone()]))),
            )
            .unwrap();
        fx.manager
            .register(recorder("asset").with_end_block(Arc::new(Updates(Vec::new()))))
            .unwrap();
        fx.manager.set_order(Phase::EndBlock, ["staking", "asset"]).unwrap();

        let header = header(4);
        let mut ctx = Context::new(&header, CacheMultiStore::new(&fx.root));
        let outcome = fx.manager.run_end_block(&mut ctx).unwrap();
        assert_eq!(outcome.validator_updates, vec![validator]);
    }

    #[test]
    fn test_export_follows_genesis_order() {
        let mut fx = Fixture::new(&["auth", "bank"]);
        for name in ["auth", "bank"] {
            let key = fx.key(name);
            fx.manager
                .register(
                    ModuleDescriptor::new(name)
                        .with_genesis(Arc::new(StoreBlob { key: key.clone() }))
                        .with_export(Arc::new(StoreBlob { key })),
                )
                .unwrap();
        }
        fx.manager.set_order(Phase::Genesis, ["bank", "auth"]).unwrap();

        let mut state = GenesisState::new();
        state.insert("auth".into(), b"A".to_vec());
        state.insert("bank".into(), b"B".to_vec());

        let header = header(1);
        let mut ctx = Context::new(&header, CacheMultiStore::new(&fx.root));
        fx.manager.run_genesis(&mut ctx, &state).unwrap();
        let exported = fx.manager.run_export_genesis(&mut ctx).unwrap();
        assert_eq!(exported, state);
    }

    #[test]
    fn test_hook_error_keeps_source() {
        let err = fatal(
            &ModuleName::new("bank"),
            Phase::Genesis,
            HookError::invalid_genesis("supply mismatch"),
        );
        assert!(err.to_string().contains("supply mismatch"));
        assert_eq!(err.module().map(ModuleName::as_str), Some("bank"));
        assert!(!err.is_configuration());
    }
}
