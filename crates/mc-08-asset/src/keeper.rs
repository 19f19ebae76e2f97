use mc_01_store::StoreKey;
use mc_02_module_manager::Context;
use mc_04_auth::{AccountKeeper, AuthError};
use mc_05_bank::BankKeeper;
use mc_06_capability::ScopedKeeper;
use shared_types::{Address, Codec, Coin, Event};
use tracing::{debug, info};

use crate::errors::AssetError;
use crate::types::{issue_capability, Asset, CollateralSnapshot};
use crate::MODULE_NAME;

const ASSET_PREFIX: u8 = 0x01;
const SNAPSHOT_PREFIX: u8 = 0x02;

fn denom_key(prefix: u8, denom: &str) -> Vec<u8> {
    let mut key = vec![prefix];
    key.extend_from_slice(denom.as_bytes());
    key
}

#[derive(Debug, Clone)]
pub struct AssetKeeper {
    key: StoreKey,
    codec: Codec,
    accounts: AccountKeeper,
    bank: BankKeeper,
    capabilities: ScopedKeeper,
}

impl AssetKeeper {
    pub fn new(
        codec: Codec,
        key: StoreKey,
        accounts: AccountKeeper,
        bank: BankKeeper,
        capabilities: ScopedKeeper,
    ) -> Self {
        Self {
            key,
            codec,
            accounts,
            bank,
            capabilities,
        }
    }

    pub fn store_key(&self) -> &StoreKey {
        &self.key
    }

    pub fn get_asset(&self, ctx: &mut Context<'_>, denom: &str) -> Result<Option<Asset>, AssetError> {
        ctx.load(&self.key, self.codec, &denom_key(ASSET_PREFIX, denom))
    }

    /// Every registered asset, ordered by denom.
    pub fn assets(&self, ctx: &mut Context<'_>) -> Result<Vec<Asset>, AssetError> {
        let entries = ctx.load_prefix::<Asset, AssetError>(&self.key, self.codec, &[ASSET_PREFIX])?;
        Ok(entries.into_iter().map(|(_, asset)| asset).collect())
    }

    /// Register `asset` and take the capability to issue it. An existing
    /// capability under the same name is reused.
    pub fn register_asset(&self, ctx: &mut Context<'_>, asset: &Asset) -> Result<(), AssetError> {
        asset.validate().map_err(AssetError::InvalidAsset)?;
        if self.get_asset(ctx, &asset.denom)?.is_some() {
            return Err(AssetError::AssetExists(asset.denom.clone()));
        }
        if !self.accounts.has_account(ctx, &asset.issuer)? {
            return Err(AuthError::UnknownAccount(asset.issuer).into());
        }

        let name = asset.capability_name();
        if self.capabilities.get_capability(ctx, &name)?.is_none() {
            self.capabilities.new_capability(ctx, &name)?;
        }
        ctx.save::<_, AssetError>(&self.key, self.codec, &denom_key(ASSET_PREFIX, &asset.denom), asset)?;

        info!("[asset] Registered {} issued by {}", asset.denom, asset.issuer);
        ctx.emit(
            Event::new("register_asset")
                .attr("denom", &asset.denom)
                .attr("issuer", asset.issuer)
                .attr("collateral_denom", &asset.collateral_denom),
        );
        Ok(())
    }

    /// Mint `amount` of `denom` to its issuer.
    pub fn issue(
        &self,
        ctx: &mut Context<'_>,
        sender: &Address,
        denom: &str,
        amount: u128,
    ) -> Result<(), AssetError> {
        let asset = self
            .get_asset(ctx, denom)?
            .ok_or_else(|| AssetError::UnknownAsset(denom.to_string()))?;
        if asset.issuer != *sender {
            return Err(AssetError::Unauthorized {
                denom: denom.to_string(),
                sender: *sender,
            });
        }
        let name = issue_capability(denom);
        let authorized = match self.capabilities.get_capability(ctx, &name)? {
            Some(cap) => self.capabilities.authenticate(ctx, &cap, &name)?,
            None => false,
        };
        if !authorized {
            return Err(AssetError::MissingCapability(denom.to_string()));
        }

        let coins = [Coin::new(denom, amount)];
        self.bank.mint_coins(ctx, MODULE_NAME, &coins)?;
        self.bank
            .send_coins_from_module_to_account(ctx, MODULE_NAME, sender, &coins)?;
        debug!("[asset] Issued {} to {}", coins[0], sender);
        ctx.emit(
            Event::new("issue")
                .attr("denom", denom)
                .attr("amount", amount)
                .attr("issuer", sender),
        );
        Ok(())
    }

    /// Take `amount` of `denom` from `holder` and burn it.
    pub fn redeem(
        &self,
        ctx: &mut Context<'_>,
        holder: &Address,
        denom: &str,
        amount: u128,
    ) -> Result<(), AssetError> {
        if self.get_asset(ctx, denom)?.is_none() {
            return Err(AssetError::UnknownAsset(denom.to_string()));
        }
        let coins = [Coin::new(denom, amount)];
        self.bank
            .send_coins_from_account_to_module(ctx, holder, MODULE_NAME, &coins)?;
        self.bank.burn_coins(ctx, MODULE_NAME, &coins)?;
        ctx.emit(
            Event::new("redeem")
                .attr("denom", denom)
                .attr("amount", amount)
                .attr("holder", holder),
        );
        Ok(())
    }

    pub fn get_snapshot(&self, ctx: &mut Context<'_>, denom: &str) -> Result<Option<CollateralSnapshot>, AssetError> {
        ctx.load(&self.key, self.codec, &denom_key(SNAPSHOT_PREFIX, denom))
    }

    /// Record issuer collateral and supply for every asset, as the bank
    /// reports them right now.
    pub fn snapshot_collateral(&self, ctx: &mut Context<'_>) -> Result<Vec<(Asset, CollateralSnapshot)>, AssetError> {
        let height = ctx.block_height();
        let mut taken = Vec::new();
        for asset in self.assets(ctx)? {
            let snapshot = CollateralSnapshot {
                height,
                collateral: self
                    .bank
                    .get_balance(ctx, &asset.issuer, &asset.collateral_denom)?
                    .amount,
                supply: self.bank.get_supply(ctx, &asset.denom)?.amount,
            };
            ctx.save::<_, AssetError>(
                &self.key,
                self.codec,
                &denom_key(SNAPSHOT_PREFIX, &asset.denom),
                &snapshot,
            )?;
            ctx.emit(
                Event::new("asset_collateral")
                    .attr("denom", &asset.denom)
                    .attr("collateral", snapshot.collateral)
                    .attr("supply", snapshot.supply)
                    .attr("height", height),
            );
            taken.push((asset, snapshot));
        }
        Ok(taken)
    }
}
