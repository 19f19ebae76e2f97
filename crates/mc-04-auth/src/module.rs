use std::collections::BTreeSet;
use std::sync::Arc;

use mc_02_module_manager::{Context, GenesisExport, GenesisInit, HookError, ModuleDescriptor};
use shared_types::codec::{marshal_json, unmarshal_json};
use shared_types::ValidatorUpdate;
use tracing::info;

use crate::errors::AuthError;
use crate::keeper::AccountKeeper;
use crate::types::AuthGenesis;
use crate::MODULE_NAME;

/// Hook implementations for the account module.
pub struct AuthModule {
    keeper: AccountKeeper,
}

impl AuthModule {
    pub fn new(keeper: AccountKeeper) -> Self {
        Self { keeper }
    }
}

impl GenesisInit for AuthModule {
    fn init_genesis(
        &self,
        ctx: &mut Context<'_>,
        raw: &[u8],
    ) -> Result<Vec<ValidatorUpdate>, HookError> {
        let genesis: AuthGenesis = unmarshal_json(raw)?;

        let mut numbers = BTreeSet::new();
        for account in &genesis.accounts {
            if !numbers.insert(account.account_number) {
                return Err(AuthError::DuplicateAccountNumber(account.account_number).into());
            }
            if self.keeper.has_account(ctx, &account.address)? {
                return Err(AuthError::AccountExists(account.address).into());
            }
            self.keeper.set_account(ctx, account)?;
        }

        let next = numbers.last().map_or(0, |n| n + 1);
        self.keeper.set_next_account_number(ctx, next)?;

        info!("[auth] Genesis loaded {} accounts", genesis.accounts.len());
        Ok(Vec::new())
    }
}

impl GenesisExport for AuthModule {
    fn export_genesis(&self, ctx: &mut Context<'_>) -> Result<Vec<u8>, HookError> {
        let genesis = AuthGenesis {
            accounts: self.keeper.accounts(ctx)?,
        };
        Ok(marshal_json(&genesis)?)
    }
}

/// Descriptor for the account module.
pub fn descriptor(keeper: &AccountKeeper) -> ModuleDescriptor {
    let module = Arc::new(AuthModule::new(keeper.clone()));
    ModuleDescriptor::new(MODULE_NAME)
        .with_store_keys([keeper.store_key().clone()])
        .with_genesis(module.clone())
        .with_export(module)
}
