use std::collections::BTreeMap;
use std::sync::Arc;

use mc_02_module_manager::{
    BeginBlockHook, Context, GenesisExport, GenesisInit, HookError, ModuleDescriptor,
};
use shared_types::codec::{marshal_json, unmarshal_json};
use shared_types::{Address, Coin, Event, ValidatorUpdate};
use tracing::{debug, info};

use crate::errors::BankError;
use crate::keeper::BankKeeper;
use crate::types::BankGenesis;
use crate::MODULE_NAME;

/// Hook implementations for the bank module.
pub struct BankModule {
    keeper: BankKeeper,
}

impl BankModule {
    pub fn new(keeper: BankKeeper) -> Self {
        Self { keeper }
    }
}

impl GenesisInit for BankModule {
    fn init_genesis(
        &self,
        ctx: &mut Context<'_>,
        raw: &[u8],
    ) -> Result<Vec<ValidatorUpdate>, HookError> {
        let genesis: BankGenesis = unmarshal_json(raw)?;
        self.keeper.set_params(ctx, &genesis.params)?;

        let mut actual: BTreeMap<String, u128> = BTreeMap::new();
        for balance in &genesis.balances {
            self.keeper.init_balance(ctx, balance)?;
            for coin in &balance.coins {
                let total = actual.entry(coin.denom.clone()).or_default();
                *total = total.checked_add(coin.amount).ok_or_else(|| BankError::Overflow {
                    denom: coin.denom.clone(),
                })?;
            }
        }

        if !genesis.supply.is_empty() {
            let declared: BTreeMap<&str, u128> = genesis
                .supply
                .iter()
                .map(|coin| (coin.denom.as_str(), coin.amount))
                .collect();
            let denoms = declared.keys().map(|d| d.to_string()).chain(actual.keys().cloned());
            for denom in denoms {
                let want = declared.get(denom.as_str()).copied().unwrap_or(0);
                let have = actual.get(&denom).copied().unwrap_or(0);
                if want != have {
                    return Err(BankError::SupplyMismatch {
                        denom,
                        declared: want,
                        actual: have,
                    }
                    .into());
                }
            }
        }

        for (denom, amount) in &actual {
            self.keeper.set_supply(ctx, &Coin::new(denom.clone(), *amount))?;
        }

        info!(
            "[bank] Genesis loaded {} balances across {} denoms",
            genesis.balances.len(),
            actual.len()
        );
        Ok(Vec::new())
    }
}

impl BeginBlockHook for BankModule {
    fn begin_block(&self, ctx: &mut Context<'_>) -> Result<(), HookError> {
        let reward = match self.keeper.params(ctx)?.block_reward {
            Some(reward) if !reward.is_zero() => reward,
            _ => return Ok(()),
        };
        let proposer = ctx.header().proposer;
        if proposer == Address::default() {
            return Ok(());
        }

        let coins = [reward];
        self.keeper.mint_coins(ctx, MODULE_NAME, &coins)?;
        self.keeper
            .send_coins_from_module_to_account(ctx, MODULE_NAME, &proposer, &coins)?;
        debug!("[bank] Paid {} to proposer {}", coins[0], proposer);
        ctx.emit(
            Event::new("block_reward")
                .attr("proposer", proposer)
                .attr("amount", &coins[0])
                .attr("height", ctx.block_height()),
        );
        Ok(())
    }
}

impl GenesisExport for BankModule {
    fn export_genesis(&self, ctx: &mut Context<'_>) -> Result<Vec<u8>, HookError> {
        let genesis = BankGenesis {
            params: self.keeper.params(ctx)?,
            balances: self.keeper.balances(ctx)?,
            supply: self.keeper.total_supply(ctx)?,
        };
        Ok(marshal_json(&genesis)?)
    }
}

/// Descriptor for the bank module.
pub fn descriptor(keeper: &BankKeeper) -> ModuleDescriptor {
    let module = Arc::new(BankModule::new(keeper.clone()));
    ModuleDescriptor::new(MODULE_NAME)
        .with_store_keys([keeper.store_key().clone()])
        .depends_on([mc_04_auth::MODULE_NAME, mc_03_params::MODULE_NAME])
        .with_genesis(module.clone())
        .with_export(module.clone())
        .with_begin_block(module)
}
