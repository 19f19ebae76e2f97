use std::collections::BTreeMap;
use std::sync::Arc;

use mc_01_store::StoreKey;
use mc_02_module_manager::Context;
use shared_types::{Address, Codec};
use tracing::debug;

use crate::errors::AuthError;
use crate::types::{Account, ModuleAccountInfo, Permission};

const ACCOUNT_PREFIX: u8 = 0x01;
const NEXT_NUMBER_KEY: &[u8] = &[0x02];

fn account_key(address: &Address) -> Vec<u8> {
    let mut key = Vec::with_capacity(1 + address.as_bytes().len());
    key.push(ACCOUNT_PREFIX);
    key.extend_from_slice(address.as_bytes());
    key
}

/// Reads and writes accounts in the `acc` partition.
#[derive(Debug, Clone)]
pub struct AccountKeeper {
    key: StoreKey,
    codec: Codec,
    module_perms: Arc<BTreeMap<String, Vec<Permission>>>,
}

impl AccountKeeper {
    /// `module_perms` lists every module allowed a module account.
    pub fn new(codec: Codec, key: StoreKey, module_perms: BTreeMap<String, Vec<Permission>>) -> Self {
        Self {
            key,
            codec,
            module_perms: Arc::new(module_perms),
        }
    }

    pub fn store_key(&self) -> &StoreKey {
        &self.key
    }

    pub fn get_account(
        &self,
        ctx: &mut Context<'_>,
        address: &Address,
    ) -> Result<Option<Account>, AuthError> {
        ctx.load(&self.key, self.codec, &account_key(address))
    }

    pub fn has_account(&self, ctx: &mut Context<'_>, address: &Address) -> Result<bool, AuthError> {
        Ok(self.get_account(ctx, address)?.is_some())
    }

    pub fn set_account(&self, ctx: &mut Context<'_>, account: &Account) -> Result<(), AuthError> {
        ctx.save(&self.key, self.codec, &account_key(&account.address), account)
    }

    /// Create a fresh account with the next account number.
    pub fn new_account(&self, ctx: &mut Context<'_>, address: Address) -> Result<Account, AuthError> {
        if self.has_account(ctx, &address)? {
            return Err(AuthError::AccountExists(address));
        }
        let account = Account {
            address,
            account_number: self.next_account_number(ctx)?,
            sequence: 0,
            module: None,
        };
        self.set_account(ctx, &account)?;
        debug!("[auth] New account {} (#{})", address, account.account_number);
        Ok(account)
    }

    /// Fetch `address`, creating it on first use.
    pub fn ensure_account(&self, ctx: &mut Context<'_>, address: Address) -> Result<Account, AuthError> {
        match self.get_account(ctx, &address)? {
            Some(account) => Ok(account),
            None => self.new_account(ctx, address),
        }
    }

    /// Bump the sequence, returning the value before the bump.
    pub fn increment_sequence(&self, ctx: &mut Context<'_>, address: &Address) -> Result<u64, AuthError> {
        let mut account = self
            .get_account(ctx, address)?
            .ok_or(AuthError::UnknownAccount(*address))?;
        let used = account.sequence;
        account.sequence += 1;
        self.set_account(ctx, &account)?;
        Ok(used)
    }

    /// Hand out the next account number and advance the counter.
    pub fn next_account_number(&self, ctx: &mut Context<'_>) -> Result<u64, AuthError> {
        let next = ctx
            .load::<u64, AuthError>(&self.key, self.codec, NEXT_NUMBER_KEY)?
            .unwrap_or(0);
        ctx.save::<_, AuthError>(&self.key, self.codec, NEXT_NUMBER_KEY, &(next + 1))?;
        Ok(next)
    }

    pub(crate) fn set_next_account_number(&self, ctx: &mut Context<'_>, next: u64) -> Result<(), AuthError> {
        ctx.save(&self.key, self.codec, NEXT_NUMBER_KEY, &next)
    }

    /// Address of the module account for `module`.
    pub fn module_address(&self, module: &str) -> Address {
        Address::for_module(module)
    }

    /// The module account for `module`, created on first use.
    pub fn get_module_account(&self, ctx: &mut Context<'_>, module: &str) -> Result<Account, AuthError> {
        let permissions = self
            .module_perms
            .get(module)
            .ok_or_else(|| AuthError::UnknownModuleAccount(module.to_string()))?;

        let address = self.module_address(module);
        if let Some(account) = self.get_account(ctx, &address)? {
            return Ok(account);
        }

        let account = Account {
            address,
            account_number: self.next_account_number(ctx)?,
            sequence: 0,
            module: Some(ModuleAccountInfo {
                name: module.to_string(),
                permissions: permissions.clone(),
            }),
        };
        self.set_account(ctx, &account)?;
        debug!("[auth] Created module account {} at {}", module, address);
        Ok(account)
    }

    /// Fail unless `module` was granted `permission`.
    pub fn require_permission(&self, module: &str, permission: Permission) -> Result<(), AuthError> {
        let granted = self
            .module_perms
            .get(module)
            .ok_or_else(|| AuthError::UnknownModuleAccount(module.to_string()))?;
        if granted.contains(&permission) {
            Ok(())
        } else {
            Err(AuthError::MissingPermission {
                module: module.to_string(),
                permission,
            })
        }
    }

    /// Every account, ordered by address.
    pub fn accounts(&self, ctx: &mut Context<'_>) -> Result<Vec<Account>, AuthError> {
        let entries =
            ctx.load_prefix::<Account, AuthError>(&self.key, self.codec, &[ACCOUNT_PREFIX])?;
        Ok(entries.into_iter().map(|(_, account)| account).collect())
    }
}
