use std::collections::BTreeMap;

use mc_01_store::StoreKey;
use mc_02_module_manager::Context;
use mc_03_params::Subspace;
use mc_04_auth::Permission;
use mc_05_bank::BankKeeper;
use shared_types::{Address, Codec, Coin, Event, ValidatorUpdate, ADDRESS_LEN};
use tracing::{debug, info};

use crate::errors::StakingError;
use crate::types::{HistoricalInfo, StakingParams, Validator};
use crate::BONDED_POOL;

const LAST_POWER_PREFIX: u8 = 0x11;
const VALIDATOR_PREFIX: u8 = 0x21;
const HISTORICAL_PREFIX: u8 = 0x50;

fn address_key(prefix: u8, address: &Address) -> Vec<u8> {
    let mut key = Vec::with_capacity(1 + ADDRESS_LEN);
    key.push(prefix);
    key.extend_from_slice(address.as_bytes());
    key
}

fn historical_key(height: u64) -> Vec<u8> {
    let mut key = vec![HISTORICAL_PREFIX];
    key.extend_from_slice(&height.to_be_bytes());
    key
}

/// Validators, their bonded tokens and the set last reported to consensus.
#[derive(Debug, Clone)]
pub struct StakingKeeper {
    key: StoreKey,
    codec: Codec,
    bank: BankKeeper,
    params: Subspace,
}

impl StakingKeeper {
    pub fn new(codec: Codec, key: StoreKey, bank: BankKeeper, params: Subspace) -> Self {
        Self {
            key,
            codec,
            bank,
            params,
        }
    }

    pub fn store_key(&self) -> &StoreKey {
        &self.key
    }

    pub fn params(&self, ctx: &mut Context<'_>) -> Result<StakingParams, StakingError> {
        Ok(self.params.get_params(ctx)?)
    }

    pub fn set_params(&self, ctx: &mut Context<'_>, params: &StakingParams) -> Result<(), StakingError> {
        Ok(self.params.set_params(ctx, params)?)
    }

    pub fn get_validator(&self, ctx: &mut Context<'_>, operator: &Address) -> Result<Option<Validator>, StakingError> {
        ctx.load(&self.key, self.codec, &address_key(VALIDATOR_PREFIX, operator))
    }

    pub fn set_validator(&self, ctx: &mut Context<'_>, validator: &Validator) -> Result<(), StakingError> {
        ctx.save(
            &self.key,
            self.codec,
            &address_key(VALIDATOR_PREFIX, &validator.operator),
            validator,
        )
    }

    /// Every validator, ordered by operator address.
    pub fn validators(&self, ctx: &mut Context<'_>) -> Result<Vec<Validator>, StakingError> {
        let entries = ctx.load_prefix::<Validator, StakingError>(&self.key, self.codec, &[VALIDATOR_PREFIX])?;
        Ok(entries.into_iter().map(|(_, v)| v).collect())
    }

    /// Bond `amount` from `operator` into the pool and register a validator.
    pub fn create_validator(
        &self,
        ctx: &mut Context<'_>,
        operator: Address,
        amount: Coin,
        moniker: &str,
    ) -> Result<Validator, StakingError> {
        let params = self.params(ctx)?;
        if amount.denom != params.bond_denom {
            return Err(StakingError::WrongDenom {
                expected: params.bond_denom,
                got: amount.denom,
            });
        }
        if amount.is_zero() {
            return Err(StakingError::ZeroStake);
        }
        if self.get_validator(ctx, &operator)?.is_some() {
            return Err(StakingError::ValidatorExists(operator));
        }

        self.bank.accounts().require_permission(BONDED_POOL, Permission::Staking)?;
        self.bank
            .send_coins_from_account_to_module(ctx, &operator, BONDED_POOL, std::slice::from_ref(&amount))?;

        let validator = Validator {
            operator,
            tokens: amount.amount,
            jailed: false,
            moniker: moniker.to_string(),
        };
        self.set_validator(ctx, &validator)?;
        info!("[staking] Created validator {} with {}", operator, amount);
        ctx.emit(
            Event::new("create_validator")
                .attr("validator", operator)
                .attr("amount", &amount),
        );
        Ok(validator)
    }

    /// Remove `operator` from the active set until unjailed.
    pub fn jail(&self, ctx: &mut Context<'_>, operator: &Address) -> Result<(), StakingError> {
        let mut validator = self
            .get_validator(ctx, operator)?
            .ok_or(StakingError::UnknownValidator(*operator))?;
        validator.jailed = true;
        self.set_validator(ctx, &validator)
    }

    pub fn unjail(&self, ctx: &mut Context<'_>, operator: &Address) -> Result<(), StakingError> {
        let mut validator = self
            .get_validator(ctx, operator)?
            .ok_or(StakingError::UnknownValidator(*operator))?;
        validator.jailed = false;
        self.set_validator(ctx, &validator)
    }

    /// Burn `fraction_bps` of the validator's tokens from the bonded pool.
    /// Returns the amount burned.
    pub fn slash(
        &self,
        ctx: &mut Context<'_>,
        operator: &Address,
        fraction_bps: u32,
    ) -> Result<u128, StakingError> {
        let mut validator = self
            .get_validator(ctx, operator)?
            .ok_or(StakingError::UnknownValidator(*operator))?;
        let burned = validator.tokens / 10_000 * u128::from(fraction_bps)
            + validator.tokens % 10_000 * u128::from(fraction_bps) / 10_000;
        if burned == 0 {
            return Ok(0);
        }
        let denom = self.params(ctx)?.bond_denom;
        self.bank.burn_coins(ctx, BONDED_POOL, &[Coin::new(denom, burned)])?;
        validator.tokens -= burned;
        self.set_validator(ctx, &validator)?;
        Ok(burned)
    }

    /// The active set: unjailed validators with power, highest power first,
    /// capped at `max_validators`.
    pub fn bonded_validators(&self, ctx: &mut Context<'_>) -> Result<Vec<Validator>, StakingError> {
        let max = self.params(ctx)?.max_validators as usize;
        let mut active: Vec<Validator> = self
            .validators(ctx)?
            .into_iter()
            .filter(|v| v.power() > 0)
            .collect();
        active.sort_by(|a, b| b.power().cmp(&a.power()).then(a.operator.cmp(&b.operator)));
        active.truncate(max);
        Ok(active)
    }

    /// Powers last reported to consensus.
    pub fn last_powers(&self, ctx: &mut Context<'_>) -> Result<BTreeMap<Address, u64>, StakingError> {
        let entries = ctx.load_prefix::<u64, StakingError>(&self.key, self.codec, &[LAST_POWER_PREFIX])?;
        let mut powers = BTreeMap::new();
        for (key, power) in entries {
            let address = Address::from_slice(&key[1..]).map_err(|e| shared_types::CodecError::Decode {
                codec: self.codec.kind().name(),
                message: e.to_string(),
            })?;
            powers.insert(address, power);
        }
        Ok(powers)
    }

    /// Diff the active set against the last reported powers, record the new
    /// powers and return the changes. Removed validators get power 0.
    pub fn apply_validator_set_updates(&self, ctx: &mut Context<'_>) -> Result<Vec<ValidatorUpdate>, StakingError> {
        let last = self.last_powers(ctx)?;
        let next: BTreeMap<Address, u64> = self
            .bonded_validators(ctx)?
            .into_iter()
            .map(|v| (v.operator, v.power()))
            .collect();

        let mut updates = Vec::new();
        for (address, power) in &next {
            if last.get(address) != Some(power) {
                updates.push(ValidatorUpdate::new(*address, *power));
                ctx.save::<_, StakingError>(
                    &self.key,
                    self.codec,
                    &address_key(LAST_POWER_PREFIX, address),
                    power,
                )?;
            }
        }
        for address in last.keys().filter(|a| !next.contains_key(*a)) {
            updates.push(ValidatorUpdate::new(*address, 0));
            ctx.remove(&self.key, &address_key(LAST_POWER_PREFIX, address))?;
        }

        if !updates.is_empty() {
            debug!("[staking] {} validator updates at {}", updates.len(), ctx.block_height());
        }
        Ok(updates)
    }

    /// Record the current active set under the block height and drop entries
    /// older than `historical_entries`.
    pub fn track_historical_info(&self, ctx: &mut Context<'_>) -> Result<(), StakingError> {
        let entries = u64::from(self.params(ctx)?.historical_entries);
        let height = ctx.block_height();

        let stale = ctx.load_prefix::<HistoricalInfo, StakingError>(&self.key, self.codec, &[HISTORICAL_PREFIX])?;
        for (key, info) in stale {
            if entries == 0 || info.height + entries <= height {
                ctx.remove(&self.key, &key)?;
            }
        }
        if entries == 0 {
            return Ok(());
        }

        let info = HistoricalInfo {
            height,
            time: ctx.block_time(),
            valset: self
                .bonded_validators(ctx)?
                .into_iter()
                .map(|v| ValidatorUpdate::new(v.operator, v.power()))
                .collect(),
        };
        ctx.save(&self.key, self.codec, &historical_key(height), &info)
    }

    pub fn get_historical_info(&self, ctx: &mut Context<'_>, height: u64) -> Result<Option<HistoricalInfo>, StakingError> {
        ctx.load(&self.key, self.codec, &historical_key(height))
    }

    /// Tokens of `bond_denom` held by the bonded pool.
    pub fn bonded_pool_balance(&self, ctx: &mut Context<'_>) -> Result<u128, StakingError> {
        let denom = self.params(ctx)?.bond_denom;
        let pool = self.bank.accounts().module_address(BONDED_POOL);
        Ok(self.bank.get_balance(ctx, &pool, &denom)?.amount)
    }
}
