use std::collections::BTreeSet;
use std::sync::Arc;

use mc_02_module_manager::{
    BeginBlockHook, Context, EndBlockHook, GenesisExport, GenesisInit, HookError, ModuleDescriptor,
};
use shared_types::codec::{marshal_json, unmarshal_json};
use shared_types::{Event, ValidatorUpdate};
use tracing::{info, warn};

use crate::errors::AssetError;
use crate::keeper::AssetKeeper;
use crate::types::AssetGenesis;
use crate::MODULE_NAME;

/// Hook implementations for the asset module.
pub struct AssetModule {
    keeper: AssetKeeper,
}

impl AssetModule {
    pub fn new(keeper: AssetKeeper) -> Self {
        Self { keeper }
    }
}

impl GenesisInit for AssetModule {
    fn init_genesis(
        &self,
        ctx: &mut Context<'_>,
        raw: &[u8],
    ) -> Result<Vec<ValidatorUpdate>, HookError> {
        let genesis: AssetGenesis = unmarshal_json(raw)?;
        let mut seen = BTreeSet::new();
        for asset in &genesis.assets {
            if !seen.insert(asset.denom.as_str()) {
                return Err(AssetError::AssetExists(asset.denom.clone()).into());
            }
            self.keeper.register_asset(ctx, asset)?;
        }
        info!("[asset] Genesis loaded {} assets", genesis.assets.len());
        Ok(Vec::new())
    }
}

impl BeginBlockHook for AssetModule {
    fn begin_block(&self, ctx: &mut Context<'_>) -> Result<(), HookError> {
        self.keeper.snapshot_collateral(ctx)?;
        Ok(())
    }
}

impl EndBlockHook for AssetModule {
    fn end_block(&self, ctx: &mut Context<'_>) -> Result<Vec<ValidatorUpdate>, HookError> {
        for asset in self.keeper.assets(ctx)? {
            let Some(snapshot) = self.keeper.get_snapshot(ctx, &asset.denom)? else {
                continue;
            };
            if snapshot.is_undercollateralized(asset.min_collateral_ratio_bps) {
                warn!(
                    "[asset] {} under collateralized: {} backing {}",
                    asset.denom, snapshot.collateral, snapshot.supply
                );
                ctx.emit(
                    Event::new("asset_undercollateralized")
                        .attr("denom", &asset.denom)
                        .attr("collateral", snapshot.collateral)
                        .attr("supply", snapshot.supply)
                        .attr("min_ratio_bps", asset.min_collateral_ratio_bps),
                );
            }
        }
        Ok(Vec::new())
    }
}

impl GenesisExport for AssetModule {
    fn export_genesis(&self, ctx: &mut Context<'_>) -> Result<Vec<u8>, HookError> {
        let genesis = AssetGenesis {
            assets: self.keeper.assets(ctx)?,
        };
        Ok(marshal_json(&genesis)?)
    }
}

/// Descriptor for the asset module.
pub fn descriptor(keeper: &AssetKeeper) -> ModuleDescriptor {
    let module = Arc::new(AssetModule::new(keeper.clone()));
    ModuleDescriptor::new(MODULE_NAME)
        .with_store_keys([keeper.store_key().clone()])
        .depends_on([
            mc_04_auth::MODULE_NAME,
            mc_05_bank::MODULE_NAME,
            mc_06_capability::MODULE_NAME,
        ])
        .with_genesis(module.clone())
        .with_export(module.clone())
        .with_begin_block(module.clone())
        .with_end_block(module)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::keeper::tests::{fund, setup, ubtc, ISSUER};
    use mc_01_store::CacheMultiStore;
    use shared_types::Coin;

    #[test]
    fn test_genesis_registers_assets() {
        let s = setup();
        let module = AssetModule::new(s.asset.clone());
        let mut ctx = Context::new(&s.header, CacheMultiStore::new(&s.root));
        fund(&s.bank, &mut ctx, ISSUER, Coin::new("stake", 1));

        let raw = marshal_json(&AssetGenesis { assets: vec![ubtc()] }).unwrap();
        module.init_genesis(&mut ctx, &raw).unwrap();
        assert_eq!(s.asset.assets(&mut ctx).unwrap(), vec![ubtc()]);

        let twice = marshal_json(&AssetGenesis { assets: vec![ubtc(), ubtc()] }).unwrap();
        let mut fresh = Context::new(&s.header, CacheMultiStore::new(&s.root));
        fund(&s.bank, &mut fresh, ISSUER, Coin::new("stake", 1));
        assert!(matches!(
            module.init_genesis(&mut fresh, &twice),
            Err(HookError::InvalidGenesis(_))
        ));
    }

    #[test]
    fn test_end_block_flags_undercollateralized() {
        let s = setup();
        let module = AssetModule::new(s.asset.clone());
        let mut ctx = Context::new(&s.header, CacheMultiStore::new(&s.root));
        fund(&s.bank, &mut ctx, ISSUER, Coin::new("stake", 100));
        s.asset.register_asset(&mut ctx, &ubtc()).unwrap();
        s.asset.issue(&mut ctx, &ISSUER, "ubtc", 80).unwrap();

        module.begin_block(&mut ctx).unwrap();
        let updates = module.end_block(&mut ctx).unwrap();

        assert!(updates.is_empty());
        let flagged: Vec<_> = ctx
            .events()
            .iter()
            .filter(|e| e.kind == "asset_undercollateralized")
            .collect();
        assert_eq!(flagged.len(), 1);
        assert_eq!(flagged[0].attribute("denom"), Some("ubtc"));
    }

    #[test]
    fn test_end_block_without_snapshot_is_quiet() {
        let s = setup();
        let module = AssetModule::new(s.asset.clone());
        let mut ctx = Context::new(&s.header, CacheMultiStore::new(&s.root));
        fund(&s.bank, &mut ctx, ISSUER, Coin::new("stake", 1));
        s.asset.register_asset(&mut ctx, &ubtc()).unwrap();
        ctx.take_events();

        module.end_block(&mut ctx).unwrap();
        assert!(ctx.events().is_empty());
    }

    #[test]
    fn test_genesis_reuses_restored_capability() {
        let s = setup();
        let module = AssetModule::new(s.asset.clone());
        let mut ctx = Context::new(&s.header, CacheMultiStore::new(&s.root));
        fund(&s.bank, &mut ctx, ISSUER, Coin::new("stake", 1));

        let cap_genesis = br#"{"index":8,"owners":[{"index":7,"owners":[{"module":"asset","name":"issue/ubtc"}]}]}"#;
        mc_06_capability::CapabilityModule::new(s.capability.clone())
            .init_genesis(&mut ctx, cap_genesis)
            .unwrap();
        let raw = marshal_json(&AssetGenesis { assets: vec![ubtc()] }).unwrap();
        module.init_genesis(&mut ctx, &raw).unwrap();

        assert_eq!(s.capability.next_index(&mut ctx).unwrap(), 8);
        s.asset.issue(&mut ctx, &ISSUER, "ubtc", 1).unwrap();
    }
}
