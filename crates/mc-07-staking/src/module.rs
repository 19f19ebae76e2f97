use std::collections::BTreeSet;
use std::sync::Arc;

use mc_02_module_manager::{
    BeginBlockHook, Context, EndBlockHook, GenesisExport, GenesisInit, HookError, ModuleDescriptor,
};
use shared_types::codec::{marshal_json, unmarshal_json};
use shared_types::{Event, ValidatorUpdate};
use tracing::{info, warn};

use crate::errors::StakingError;
use crate::keeper::StakingKeeper;
use crate::types::StakingGenesis;
use crate::MODULE_NAME;

/// Hook implementations for the staking module.
pub struct StakingModule {
    keeper: StakingKeeper,
}

impl StakingModule {
    pub fn new(keeper: StakingKeeper) -> Self {
        Self { keeper }
    }

    fn handle_evidence(&self, ctx: &mut Context<'_>) -> Result<(), StakingError> {
        let evidence = ctx.header().evidence.clone();
        if evidence.is_empty() {
            return Ok(());
        }
        let fraction = self.keeper.params(ctx)?.slash_fraction_double_sign_bps;

        for ev in evidence {
            let Some(validator) = self.keeper.get_validator(ctx, &ev.validator)? else {
                warn!("[staking] Ignoring evidence against unknown validator {}", ev.validator);
                continue;
            };
            if validator.jailed {
                continue;
            }
            let burned = self.keeper.slash(ctx, &ev.validator, fraction)?;
            self.keeper.jail(ctx, &ev.validator)?;
            warn!(
                "[staking] Slashed {} by {} for {:?} at height {}",
                ev.validator, burned, ev.kind, ev.height
            );
            ctx.emit(
                Event::new("slash")
                    .attr("validator", ev.validator)
                    .attr("reason", format!("{:?}", ev.kind))
                    .attr("power", ev.power)
                    .attr("burned", burned)
                    .attr("infraction_height", ev.height),
            );
        }
        Ok(())
    }
}

impl GenesisInit for StakingModule {
    fn init_genesis(
        &self,
        ctx: &mut Context<'_>,
        raw: &[u8],
    ) -> Result<Vec<ValidatorUpdate>, HookError> {
        let genesis: StakingGenesis = unmarshal_json(raw)?;
        self.keeper.set_params(ctx, &genesis.params)?;

        let mut seen = BTreeSet::new();
        let mut bonded: u128 = 0;
        for validator in &genesis.validators {
            if !seen.insert(validator.operator) {
                return Err(StakingError::ValidatorExists(validator.operator).into());
            }
            bonded = bonded.saturating_add(validator.tokens);
            self.keeper.set_validator(ctx, validator)?;
        }

        let pool = self.keeper.bonded_pool_balance(ctx)?;
        if pool != bonded {
            return Err(StakingError::BondedPoolMismatch {
                pool,
                expected: bonded,
            }
            .into());
        }

        let updates = self.keeper.apply_validator_set_updates(ctx)?;
        info!(
            "[staking] Genesis loaded {} validators, {} active",
            genesis.validators.len(),
            updates.len()
        );
        Ok(updates)
    }
}

impl BeginBlockHook for StakingModule {
    fn begin_block(&self, ctx: &mut Context<'_>) -> Result<(), HookError> {
        self.keeper.track_historical_info(ctx)?;
        self.handle_evidence(ctx)?;
        Ok(())
    }
}

impl EndBlockHook for StakingModule {
    fn end_block(&self, ctx: &mut Context<'_>) -> Result<Vec<ValidatorUpdate>, HookError> {
        Ok(self.keeper.apply_validator_set_updates(ctx)?)
    }
}

impl GenesisExport for StakingModule {
    fn export_genesis(&self, ctx: &mut Context<'_>) -> Result<Vec<u8>, HookError> {
        let genesis = StakingGenesis {
            params: self.keeper.params(ctx)?,
            validators: self.keeper.validators(ctx)?,
        };
        Ok(marshal_json(&genesis)?)
    }
}

/// Descriptor for the staking module.
pub fn descriptor(keeper: &StakingKeeper) -> ModuleDescriptor {
    let module = Arc::new(StakingModule::new(keeper.clone()));
    ModuleDescriptor::new(MODULE_NAME)
        .with_store_keys([keeper.store_key().clone()])
        .depends_on([
            mc_04_auth::MODULE_NAME,
            mc_05_bank::MODULE_NAME,
            mc_03_params::MODULE_NAME,
        ])
        .with_genesis(module.clone())
        .with_export(module.clone())
        .with_begin_block(module.clone())
        .with_end_block(module)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::keeper::tests::{fund, setup};
    use crate::BONDED_POOL;
    use chrono::Utc;
    use mc_01_store::CacheMultiStore;
    use shared_types::{Address, Coin, Evidence, EvidenceKind};

    #[test]
    fn test_genesis_returns_initial_set() {
        let s = setup();
        let module = StakingModule::new(s.staking.clone());
        let mut ctx = Context::new(&s.header, CacheMultiStore::new(&s.root));
        let pool = s.bank.accounts().module_address(BONDED_POOL);
        fund(&s.bank, &mut ctx, pool, 7_000_000);

        let raw = format!(
            r#"{{"validators":[
                {{"operator":"{}","tokens":"4000000"}},
                {{"operator":"{}","tokens":"3000000","moniker":"b"}}
            ]}}"#,
            Address([1; 20]),
            Address([2; 20])
        );
        let updates = module.init_genesis(&mut ctx, raw.as_bytes()).unwrap();
        assert_eq!(
            updates,
            vec![
                ValidatorUpdate::new(Address([1; 20]), 4),
                ValidatorUpdate::new(Address([2; 20]), 3)
            ]
        );
        assert!(module.end_block(&mut ctx).unwrap().is_empty());
    }

    #[test]
    fn test_genesis_rejects_unfunded_pool() {
        let s = setup();
        let module = StakingModule::new(s.staking.clone());
        let mut ctx = Context::new(&s.header, CacheMultiStore::new(&s.root));
        let raw = format!(
            r#"{{"validators":[{{"operator":"{}","tokens":"1000000"}}]}}"#,
            Address([1; 20])
        );
        assert!(matches!(
            module.init_genesis(&mut ctx, raw.as_bytes()),
            Err(HookError::InvalidGenesis(_))
        ));
    }

    #[test]
    fn test_evidence_slashes_and_jails() {
        let s = setup();
        let module = StakingModule::new(s.staking.clone());
        let op = Address([1; 20]);
        let changes = {
            let mut ctx = Context::new(&s.header, CacheMultiStore::new(&s.root));
            fund(&s.bank, &mut ctx, op, 2_000_000);
            s.staking.create_validator(&mut ctx, op, Coin::new("stake", 2_000_000), "a").unwrap();
            s.staking.apply_validator_set_updates(&mut ctx).unwrap();
            ctx.into_parts().0
        };

        let mut header = s.header.clone();
        header.height = 2;
        header.evidence.push(Evidence {
            kind: EvidenceKind::DuplicateVote,
            validator: op,
            power: 2,
            height: 1,
            time: Utc::now(),
        });
        let mut ctx = Context::new(&header, CacheMultiStore::resume(&s.root, changes));
        module.begin_block(&mut ctx).unwrap();

        let slash = ctx.events().iter().find(|e| e.kind == "slash").unwrap();
        assert_eq!(slash.attribute("burned"), Some("100000"));
        assert!(s.staking.get_validator(&mut ctx, &op).unwrap().unwrap().jailed);
        assert!(s.staking.get_historical_info(&mut ctx, 2).unwrap().is_some());
        assert_eq!(
            module.end_block(&mut ctx).unwrap(),
            vec![ValidatorUpdate::new(op, 0)]
        );
    }

    #[test]
    fn test_evidence_for_unknown_validator_is_ignored() {
        let s = setup();
        let module = StakingModule::new(s.staking.clone());
        let mut header = s.header.clone();
        header.evidence.push(Evidence {
            kind: EvidenceKind::LightClientAttack,
            validator: Address([8; 20]),
            power: 1,
            height: 1,
            time: Utc::now(),
        });
        let mut ctx = Context::new(&header, CacheMultiStore::new(&s.root));
        module.begin_block(&mut ctx).unwrap();
        assert!(ctx.events().iter().all(|e| e.kind != "slash"));
    }
}
