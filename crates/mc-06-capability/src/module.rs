use std::sync::Arc;

use mc_02_module_manager::{
    BeginBlockHook, Context, GenesisExport, GenesisInit, HookError, ModuleDescriptor,
};
use shared_types::codec::{marshal_json, unmarshal_json};
use shared_types::ValidatorUpdate;
use tracing::info;

use crate::errors::CapabilityError;
use crate::keeper::CapabilityKeeper;
use crate::types::{CapabilityGenesis, CapabilityOwners};
use crate::MODULE_NAME;

/// Hook implementations for the capability module.
pub struct CapabilityModule {
    keeper: CapabilityKeeper,
}

impl CapabilityModule {
    pub fn new(keeper: CapabilityKeeper) -> Self {
        Self { keeper }
    }
}

impl GenesisInit for CapabilityModule {
    fn init_genesis(
        &self,
        ctx: &mut Context<'_>,
        raw: &[u8],
    ) -> Result<Vec<ValidatorUpdate>, HookError> {
        let genesis: CapabilityGenesis = unmarshal_json(raw)?;
        genesis.validate().map_err(CapabilityError::InvalidGenesis)?;

        self.keeper.set_next_index(ctx, genesis.index)?;
        for entry in &genesis.owners {
            let owners = CapabilityOwners {
                owners: entry.owners.iter().cloned().collect(),
            };
            self.keeper.set_owners(ctx, entry.index, &owners)?;
        }
        self.keeper.initialize_memory(ctx)?;

        info!(
            "[capability] Genesis loaded {} capabilities, next index {}",
            genesis.owners.len(),
            genesis.index
        );
        Ok(Vec::new())
    }
}

impl BeginBlockHook for CapabilityModule {
    fn begin_block(&self, ctx: &mut Context<'_>) -> Result<(), HookError> {
        self.keeper.initialize_memory(ctx)?;
        Ok(())
    }
}

impl GenesisExport for CapabilityModule {
    fn export_genesis(&self, ctx: &mut Context<'_>) -> Result<Vec<u8>, HookError> {
        let genesis = CapabilityGenesis {
            index: self.keeper.next_index(ctx)?,
            owners: self.keeper.owner_sets(ctx)?,
        };
        Ok(marshal_json(&genesis)?)
    }
}

/// Descriptor for the capability module. Owns both the persistent and the
/// memory partition.
pub fn descriptor(keeper: &CapabilityKeeper) -> ModuleDescriptor {
    let module = Arc::new(CapabilityModule::new(keeper.clone()));
    ModuleDescriptor::new(MODULE_NAME)
        .with_store_keys([keeper.store_key().clone(), keeper.mem_store_key().clone()])
        .with_genesis(module.clone())
        .with_export(module.clone())
        .with_begin_block(module)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::keeper::tests::setup;
    use crate::types::{GenesisOwners, Owner};
    use mc_01_store::CacheMultiStore;

    #[test]
    fn test_genesis_restores_owners_and_index() {
        let (root, mut keeper, header) = setup();
        let asset = keeper.scope_to_module("asset").unwrap();
        let module = CapabilityModule::new(keeper.clone());
        let mut ctx = Context::new(&header, CacheMultiStore::new(&root));

        let raw = br#"{"index":4,"owners":[{"index":2,"owners":[{"module":"asset","name":"issue/btc"}]}]}"#;
        module.init_genesis(&mut ctx, raw).unwrap();

        assert_eq!(
            asset.get_capability(&mut ctx, "issue/btc").unwrap().map(|c| c.index()),
            Some(2)
        );
        assert_eq!(asset.new_capability(&mut ctx, "issue/eth").unwrap().index(), 4);
    }

    #[test]
    fn test_genesis_rejects_index_below_owners() {
        let (root, keeper, header) = setup();
        let module = CapabilityModule::new(keeper);
        let mut ctx = Context::new(&header, CacheMultiStore::new(&root));
        let raw = br#"{"index":1,"owners":[{"index":3,"owners":[{"module":"asset","name":"x"}]}]}"#;
        assert!(matches!(
            module.init_genesis(&mut ctx, raw),
            Err(HookError::InvalidGenesis(_))
        ));
    }

    #[test]
    fn test_begin_block_initializes_memory_once() {
        let (root, keeper, header) = setup();
        let module = CapabilityModule::new(keeper.clone());
        let mut ctx = Context::new(&header, CacheMultiStore::new(&root));

        module.begin_block(&mut ctx).unwrap();
        assert!(keeper.is_memory_initialized(&mut ctx).unwrap());
        let (changes, _) = ctx.into_parts();

        let mut ctx = Context::new(&header, CacheMultiStore::resume(&root, changes));
        module.begin_block(&mut ctx).unwrap();
        assert!(!keeper.initialize_memory(&mut ctx).unwrap());
    }

    #[test]
    fn test_export_round_trips() {
        let (root, mut keeper, header) = setup();
        let asset = keeper.scope_to_module("asset").unwrap();
        let module = CapabilityModule::new(keeper.clone());
        let mut ctx = Context::new(&header, CacheMultiStore::new(&root));
        asset.new_capability(&mut ctx, "issue/btc").unwrap();

        let exported: CapabilityGenesis =
            unmarshal_json(&module.export_genesis(&mut ctx).unwrap()).unwrap();
        assert_eq!(
            exported,
            CapabilityGenesis {
                index: 2,
                owners: vec![GenesisOwners {
                    index: 1,
                    owners: vec![Owner::new("asset", "issue/btc")],
                }],
            }
        );
    }
}
