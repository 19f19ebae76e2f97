use std::collections::BTreeSet;

use mc_01_store::{KvStore, StoreKey};
use mc_02_module_manager::Context;
use shared_types::{Codec, CodecError};
use tracing::{debug, info};

use crate::errors::CapabilityError;
use crate::types::{Capability, CapabilityOwners, GenesisOwners, Owner};

const INDEX_KEY: &[u8] = &[0x01];
const OWNERS_PREFIX: u8 = 0x02;
const MEM_INITIALIZED_KEY: &[u8] = &[0x00];

fn owners_key(index: u64) -> Vec<u8> {
    let mut key = vec![OWNERS_PREFIX];
    key.extend_from_slice(&index.to_be_bytes());
    key
}

fn rev_key(module: &str, name: &str) -> Vec<u8> {
    format!("{}/rev/{}", module, name).into_bytes()
}

fn fwd_key(module: &str, index: u64) -> Vec<u8> {
    let mut key = format!("{}/fwd/", module).into_bytes();
    key.extend_from_slice(&index.to_be_bytes());
    key
}

fn validate_name(name: &str) -> Result<(), CapabilityError> {
    if name.trim().is_empty() {
        return Err(CapabilityError::InvalidName(name.to_string()));
    }
    Ok(())
}

/// Both partitions plus the codec, shared by the keeper and its scopes.
#[derive(Debug, Clone)]
struct Stores {
    key: StoreKey,
    mem_key: StoreKey,
    codec: Codec,
}

impl Stores {
    fn next_index(&self, ctx: &mut Context<'_>) -> Result<u64, CapabilityError> {
        Ok(ctx
            .load::<u64, CapabilityError>(&self.key, self.codec, INDEX_KEY)?
            .unwrap_or(1))
    }

    fn set_next_index(&self, ctx: &mut Context<'_>, index: u64) -> Result<(), CapabilityError> {
        ctx.save(&self.key, self.codec, INDEX_KEY, &index)
    }

    fn owners(&self, ctx: &mut Context<'_>, index: u64) -> Result<Option<CapabilityOwners>, CapabilityError> {
        ctx.load(&self.key, self.codec, &owners_key(index))
    }

    fn set_owners(
        &self,
        ctx: &mut Context<'_>,
        index: u64,
        owners: &CapabilityOwners,
    ) -> Result<(), CapabilityError> {
        if owners.owners.is_empty() {
            ctx.remove(&self.key, &owners_key(index))?;
            return Ok(());
        }
        ctx.save(&self.key, self.codec, &owners_key(index), owners)
    }

    fn index_owner(&self, ctx: &mut Context<'_>, owner: &Owner, index: u64) -> Result<(), CapabilityError> {
        ctx.save::<_, CapabilityError>(&self.mem_key, self.codec, &rev_key(&owner.module, &owner.name), &index)?;
        ctx.save(&self.mem_key, self.codec, &fwd_key(&owner.module, index), &owner.name)
    }

    fn unindex_owner(&self, ctx: &mut Context<'_>, owner: &Owner, index: u64) -> Result<(), CapabilityError> {
        ctx.remove(&self.mem_key, &rev_key(&owner.module, &owner.name))?;
        ctx.remove(&self.mem_key, &fwd_key(&owner.module, index))?;
        Ok(())
    }
}

/// Owner of the capability partitions. Hands out one [`ScopedKeeper`] per
/// module until sealed.
#[derive(Debug, Clone)]
pub struct CapabilityKeeper {
    stores: Stores,
    scopes: BTreeSet<String>,
    sealed: bool,
}

impl CapabilityKeeper {
    pub fn new(codec: Codec, key: StoreKey, mem_key: StoreKey) -> Self {
        Self {
            stores: Stores { key, mem_key, codec },
            scopes: BTreeSet::new(),
            sealed: false,
        }
    }

    pub fn store_key(&self) -> &StoreKey {
        &self.stores.key
    }

    pub fn mem_store_key(&self) -> &StoreKey {
        &self.stores.mem_key
    }

    /// Create the keeper `module` uses for every capability operation.
    pub fn scope_to_module(&mut self, module: &str) -> Result<ScopedKeeper, CapabilityError> {
        if self.sealed {
            return Err(CapabilityError::Sealed);
        }
        if module.trim().is_empty() || module.contains('/') {
            return Err(CapabilityError::InvalidName(module.to_string()));
        }
        if !self.scopes.insert(module.to_string()) {
            return Err(CapabilityError::DuplicateScope(module.to_string()));
        }
        debug!("[capability] Scoped keeper for {}", module);
        Ok(ScopedKeeper {
            module: module.to_string(),
            stores: self.stores.clone(),
        })
    }

    /// Refuse further scopes. Called once assembly is done.
    pub fn seal(&mut self) {
        self.sealed = true;
    }

    pub fn is_sealed(&self) -> bool {
        self.sealed
    }

    /// Modules holding a scoped keeper.
    pub fn scopes(&self) -> impl Iterator<Item = &str> {
        self.scopes.iter().map(String::as_str)
    }

    /// Whether the memory index has been built since the last start or reload.
    pub fn is_memory_initialized(&self, ctx: &mut Context<'_>) -> Result<bool, CapabilityError> {
        Ok(ctx.kv_store(&self.stores.mem_key)?.has(MEM_INITIALIZED_KEY)?)
    }

    /// Rebuild the memory index from the persisted owner sets. Runs once per
    /// process lifetime (or reload); returns whether anything was done.
    pub fn initialize_memory(&self, ctx: &mut Context<'_>) -> Result<bool, CapabilityError> {
        if self.is_memory_initialized(ctx)? {
            return Ok(false);
        }
        let entries = self.owner_sets(ctx)?;
        for entry in &entries {
            for owner in &entry.owners {
                self.stores.index_owner(ctx, owner, entry.index)?;
            }
        }
        ctx.kv_store(&self.stores.mem_key)?.set(MEM_INITIALIZED_KEY, &[1])?;
        info!("[capability] Memory index rebuilt for {} capabilities", entries.len());
        Ok(true)
    }

    pub fn next_index(&self, ctx: &mut Context<'_>) -> Result<u64, CapabilityError> {
        self.stores.next_index(ctx)
    }

    pub(crate) fn set_next_index(&self, ctx: &mut Context<'_>, index: u64) -> Result<(), CapabilityError> {
        self.stores.set_next_index(ctx, index)
    }

    pub(crate) fn set_owners(
        &self,
        ctx: &mut Context<'_>,
        index: u64,
        owners: &CapabilityOwners,
    ) -> Result<(), CapabilityError> {
        self.stores.set_owners(ctx, index, owners)
    }

    /// Every live capability with its owners, ordered by index.
    pub fn owner_sets(&self, ctx: &mut Context<'_>) -> Result<Vec<GenesisOwners>, CapabilityError> {
        let entries = ctx.load_prefix::<CapabilityOwners, CapabilityError>(
            &self.stores.key,
            self.stores.codec,
            &[OWNERS_PREFIX],
        )?;
        entries
            .into_iter()
            .map(|(key, set)| -> Result<GenesisOwners, CapabilityError> {
                let raw: [u8; 8] = key[1..].try_into().map_err(|_| CodecError::Decode {
                    codec: self.stores.codec.kind().name(),
                    message: format!("malformed owners key {:?}", key),
                })?;
                Ok(GenesisOwners {
                    index: u64::from_be_bytes(raw),
                    owners: set.owners.into_iter().collect(),
                })
            })
            .collect()
    }
}

/// A module's handle on the capability keeper. Every lookup is confined to
/// the names this module registered.
#[derive(Debug, Clone)]
pub struct ScopedKeeper {
    module: String,
    stores: Stores,
}

impl ScopedKeeper {
    pub fn module(&self) -> &str {
        &self.module
    }

    fn owner(&self, name: &str) -> Owner {
        Owner::new(self.module.clone(), name)
    }

    /// Mint a fresh capability owned by this module under `name`.
    pub fn new_capability(&self, ctx: &mut Context<'_>, name: &str) -> Result<Capability, CapabilityError> {
        validate_name(name)?;
        if self.get_capability(ctx, name)?.is_some() {
            return Err(CapabilityError::CapabilityTaken {
                module: self.module.clone(),
                name: name.to_string(),
            });
        }

        let index = self.stores.next_index(ctx)?;
        self.stores.set_next_index(ctx, index + 1)?;

        let owner = self.owner(name);
        let mut owners = CapabilityOwners::default();
        owners.owners.insert(owner.clone());
        self.stores.set_owners(ctx, index, &owners)?;
        self.stores.index_owner(ctx, &owner, index)?;

        debug!("[capability] {} created {} as #{}", self.module, name, index);
        Ok(Capability::new(index))
    }

    /// The capability this module holds under `name`.
    pub fn get_capability(&self, ctx: &mut Context<'_>, name: &str) -> Result<Option<Capability>, CapabilityError> {
        let index = ctx.load::<u64, CapabilityError>(
            &self.stores.mem_key,
            self.stores.codec,
            &rev_key(&self.module, name),
        )?;
        Ok(index.map(Capability::new))
    }

    /// Whether `cap` is the capability this module holds under `name`.
    pub fn authenticate(&self, ctx: &mut Context<'_>, cap: &Capability, name: &str) -> Result<bool, CapabilityError> {
        Ok(self.get_capability(ctx, name)? == Some(*cap))
    }

    /// Take co-ownership of a capability another module handed over.
    pub fn claim_capability(
        &self,
        ctx: &mut Context<'_>,
        cap: &Capability,
        name: &str,
    ) -> Result<(), CapabilityError> {
        validate_name(name)?;
        if self.get_capability(ctx, name)?.is_some() {
            return Err(CapabilityError::CapabilityTaken {
                module: self.module.clone(),
                name: name.to_string(),
            });
        }
        let mut owners = self
            .stores
            .owners(ctx, cap.index())?
            .ok_or(CapabilityError::UnknownCapability(cap.index()))?;

        let owner = self.owner(name);
        owners.owners.insert(owner.clone());
        self.stores.set_owners(ctx, cap.index(), &owners)?;
        self.stores.index_owner(ctx, &owner, cap.index())?;
        debug!("[capability] {} claimed #{} as {}", self.module, cap.index(), name);
        Ok(())
    }

    /// Give up this module's ownership. The capability is deleted once no
    /// owner remains.
    pub fn release_capability(
        &self,
        ctx: &mut Context<'_>,
        cap: &Capability,
        name: &str,
    ) -> Result<(), CapabilityError> {
        if !self.authenticate(ctx, cap, name)? {
            return Err(CapabilityError::NotOwner {
                index: cap.index(),
                module: self.module.clone(),
                name: name.to_string(),
            });
        }
        let owner = self.owner(name);
        let mut owners = self.stores.owners(ctx, cap.index())?.unwrap_or_default();
        owners.owners.remove(&owner);
        self.stores.set_owners(ctx, cap.index(), &owners)?;
        self.stores.unindex_owner(ctx, &owner, cap.index())
    }

    pub fn get_owners(&self, ctx: &mut Context<'_>, cap: &Capability) -> Result<CapabilityOwners, CapabilityError> {
        self.stores
            .owners(ctx, cap.index())?
            .ok_or(CapabilityError::UnknownCapability(cap.index()))
    }

    /// Modules sharing the capability this module holds under `name`.
    pub fn lookup_modules(
        &self,
        ctx: &mut Context<'_>,
        name: &str,
    ) -> Result<Option<(Capability, Vec<String>)>, CapabilityError> {
        let Some(cap) = self.get_capability(ctx, name)? else {
            return Ok(None);
        };
        let owners = self.get_owners(ctx, &cap)?;
        let modules: BTreeSet<String> = owners.owners.into_iter().map(|o| o.module).collect();
        Ok(Some((cap, modules.into_iter().collect())))
    }
}
