use std::collections::BTreeMap;

use mc_01_store::StoreKey;
use mc_02_module_manager::Context;
use mc_03_params::Subspace;
use mc_04_auth::{AccountKeeper, Permission};
use shared_types::{coins_to_string, Address, Codec, CodecError, Coin, Event, ADDRESS_LEN};
use tracing::debug;

use crate::errors::BankError;
use crate::types::{Balance, BankParams};

const BALANCE_PREFIX: u8 = 0x01;
const SUPPLY_PREFIX: u8 = 0x02;

fn account_prefix(address: &Address) -> Vec<u8> {
    let mut key = Vec::with_capacity(1 + ADDRESS_LEN);
    key.push(BALANCE_PREFIX);
    key.extend_from_slice(address.as_bytes());
    key
}

fn balance_key(address: &Address, denom: &str) -> Vec<u8> {
    let mut key = account_prefix(address);
    key.extend_from_slice(denom.as_bytes());
    key
}

fn supply_key(denom: &str) -> Vec<u8> {
    let mut key = vec![SUPPLY_PREFIX];
    key.extend_from_slice(denom.as_bytes());
    key
}

fn validate_coins(coins: &[Coin]) -> Result<(), BankError> {
    for coin in coins {
        if coin.denom.is_empty() {
            return Err(BankError::InvalidCoin(format!("{} has no denom", coin)));
        }
        if coin.is_zero() {
            return Err(BankError::InvalidCoin(format!("zero amount of {}", coin.denom)));
        }
    }
    Ok(())
}

/// Balances and supply, reached by other modules only through this keeper.
#[derive(Debug, Clone)]
pub struct BankKeeper {
    key: StoreKey,
    codec: Codec,
    accounts: AccountKeeper,
    params: Subspace,
}

impl BankKeeper {
    pub fn new(codec: Codec, key: StoreKey, accounts: AccountKeeper, params: Subspace) -> Self {
        Self {
            key,
            codec,
            accounts,
            params,
        }
    }

    pub fn store_key(&self) -> &StoreKey {
        &self.key
    }

    pub fn accounts(&self) -> &AccountKeeper {
        &self.accounts
    }

    pub fn params(&self, ctx: &mut Context<'_>) -> Result<BankParams, BankError> {
        Ok(self.params.get_params(ctx)?)
    }

    pub fn set_params(&self, ctx: &mut Context<'_>, params: &BankParams) -> Result<(), BankError> {
        Ok(self.params.set_params(ctx, params)?)
    }

    pub fn get_balance(&self, ctx: &mut Context<'_>, address: &Address, denom: &str) -> Result<Coin, BankError> {
        let amount = ctx
            .load::<u128, BankError>(&self.key, self.codec, &balance_key(address, denom))?
            .unwrap_or(0);
        Ok(Coin::new(denom, amount))
    }

    /// Every non-zero balance of `address`, ordered by denom.
    pub fn get_all_balances(&self, ctx: &mut Context<'_>, address: &Address) -> Result<Vec<Coin>, BankError> {
        let prefix = account_prefix(address);
        let entries = ctx.load_prefix::<u128, BankError>(&self.key, self.codec, &prefix)?;
        Ok(entries
            .into_iter()
            .map(|(key, amount)| Coin::new(String::from_utf8_lossy(&key[prefix.len()..]), amount))
            .collect())
    }

    /// Every balance in the store, grouped by address.
    pub fn balances(&self, ctx: &mut Context<'_>) -> Result<Vec<Balance>, BankError> {
        let entries = ctx.load_prefix::<u128, BankError>(&self.key, self.codec, &[BALANCE_PREFIX])?;
        let mut grouped: BTreeMap<Address, Vec<Coin>> = BTreeMap::new();
        for (key, amount) in entries {
            let address = Address::from_slice(&key[1..1 + ADDRESS_LEN])
                .map_err(|e| CodecError::Decode {
                    codec: self.codec.kind().name(),
                    message: e.to_string(),
                })?;
            let denom = String::from_utf8_lossy(&key[1 + ADDRESS_LEN..]).into_owned();
            grouped.entry(address).or_default().push(Coin::new(denom, amount));
        }
        Ok(grouped
            .into_iter()
            .map(|(address, coins)| Balance { address, coins })
            .collect())
    }

    fn set_balance(&self, ctx: &mut Context<'_>, address: &Address, coin: &Coin) -> Result<(), BankError> {
        let key = balance_key(address, &coin.denom);
        if coin.is_zero() {
            ctx.remove(&self.key, &key)?;
            return Ok(());
        }
        ctx.save(&self.key, self.codec, &key, &coin.amount)
    }

    fn add_coins(&self, ctx: &mut Context<'_>, address: &Address, coins: &[Coin]) -> Result<(), BankError> {
        for coin in coins {
            let current = self.get_balance(ctx, address, &coin.denom)?;
            let amount = current.amount.checked_add(coin.amount).ok_or_else(|| BankError::Overflow {
                denom: coin.denom.clone(),
            })?;
            self.set_balance(ctx, address, &Coin::new(coin.denom.clone(), amount))?;
        }
        Ok(())
    }

    fn sub_coins(&self, ctx: &mut Context<'_>, address: &Address, coins: &[Coin]) -> Result<(), BankError> {
        for coin in coins {
            let current = self.get_balance(ctx, address, &coin.denom)?;
            let amount = current
                .amount
                .checked_sub(coin.amount)
                .ok_or_else(|| BankError::InsufficientFunds {
                    address: *address,
                    denom: coin.denom.clone(),
                    available: current.amount,
                    required: coin.amount,
                })?;
            self.set_balance(ctx, address, &Coin::new(coin.denom.clone(), amount))?;
        }
        Ok(())
    }

    fn transfer(&self, ctx: &mut Context<'_>, from: &Address, to: &Address, coins: &[Coin]) -> Result<(), BankError> {
        validate_coins(coins)?;
        self.sub_coins(ctx, from, coins)?;
        self.accounts.ensure_account(ctx, *to)?;
        self.add_coins(ctx, to, coins)?;
        ctx.emit(
            Event::new("transfer")
                .attr("sender", from)
                .attr("recipient", to)
                .attr("amount", coins_to_string(coins)),
        );
        Ok(())
    }

    /// Move coins between two accounts.
    pub fn send_coins(&self, ctx: &mut Context<'_>, from: &Address, to: &Address, coins: &[Coin]) -> Result<(), BankError> {
        if !self.params(ctx)?.send_enabled {
            return Err(BankError::SendDisabled);
        }
        self.transfer(ctx, from, to, coins)
    }

    pub fn send_coins_from_module_to_account(
        &self,
        ctx: &mut Context<'_>,
        module: &str,
        to: &Address,
        coins: &[Coin],
    ) -> Result<(), BankError> {
        let from = self.accounts.get_module_account(ctx, module)?.address;
        self.transfer(ctx, &from, to, coins)
    }

    pub fn send_coins_from_account_to_module(
        &self,
        ctx: &mut Context<'_>,
        from: &Address,
        module: &str,
        coins: &[Coin],
    ) -> Result<(), BankError> {
        let to = self.accounts.get_module_account(ctx, module)?.address;
        self.transfer(ctx, from, &to, coins)
    }

    /// Create coins in `module`'s account. Requires the minter permission.
    pub fn mint_coins(&self, ctx: &mut Context<'_>, module: &str, coins: &[Coin]) -> Result<(), BankError> {
        validate_coins(coins)?;
        self.accounts.require_permission(module, Permission::Minter)?;
        let account = self.accounts.get_module_account(ctx, module)?;
        self.add_coins(ctx, &account.address, coins)?;
        for coin in coins {
            let supply = self.get_supply(ctx, &coin.denom)?;
            let total = supply.amount.checked_add(coin.amount).ok_or_else(|| BankError::Overflow {
                denom: coin.denom.clone(),
            })?;
            self.set_supply(ctx, &Coin::new(coin.denom.clone(), total))?;
        }
        debug!("[bank] {} minted {}", module, coins_to_string(coins));
        ctx.emit(
            Event::new("mint")
                .attr("module", module)
                .attr("amount", coins_to_string(coins)),
        );
        Ok(())
    }

    /// Destroy coins held by `module`. Requires the burner permission.
    pub fn burn_coins(&self, ctx: &mut Context<'_>, module: &str, coins: &[Coin]) -> Result<(), BankError> {
        validate_coins(coins)?;
        self.accounts.require_permission(module, Permission::Burner)?;
        let account = self.accounts.get_module_account(ctx, module)?;
        self.sub_coins(ctx, &account.address, coins)?;
        for coin in coins {
            let supply = self.get_supply(ctx, &coin.denom)?;
            self.set_supply(ctx, &Coin::new(coin.denom.clone(), supply.amount.saturating_sub(coin.amount)))?;
        }
        ctx.emit(
            Event::new("burn")
                .attr("module", module)
                .attr("amount", coins_to_string(coins)),
        );
        Ok(())
    }

    pub fn get_supply(&self, ctx: &mut Context<'_>, denom: &str) -> Result<Coin, BankError> {
        let amount = ctx
            .load::<u128, BankError>(&self.key, self.codec, &supply_key(denom))?
            .unwrap_or(0);
        Ok(Coin::new(denom, amount))
    }

    pub(crate) fn set_supply(&self, ctx: &mut Context<'_>, coin: &Coin) -> Result<(), BankError> {
        let key = supply_key(&coin.denom);
        if coin.is_zero() {
            ctx.remove(&self.key, &key)?;
            return Ok(());
        }
        ctx.save(&self.key, self.codec, &key, &coin.amount)
    }

    /// Supply of every denom, ordered by denom.
    pub fn total_supply(&self, ctx: &mut Context<'_>) -> Result<Vec<Coin>, BankError> {
        let entries = ctx.load_prefix::<u128, BankError>(&self.key, self.codec, &[SUPPLY_PREFIX])?;
        Ok(entries
            .into_iter()
            .map(|(key, amount)| Coin::new(String::from_utf8_lossy(&key[1..]), amount))
            .collect())
    }

    /// Credit genesis balances without touching supply.
    pub(crate) fn init_balance(&self, ctx: &mut Context<'_>, balance: &Balance) -> Result<(), BankError> {
        self.accounts.ensure_account(ctx, balance.address)?;
        self.add_coins(ctx, &balance.address, &balance.coins)
    }
}
