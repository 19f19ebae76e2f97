use std::collections::BTreeSet;

use mc_01_store::{KvStore, StoreKey};
use mc_02_module_manager::Context;
use serde::de::DeserializeOwned;
use serde::Serialize;
use shared_types::Codec;
use tracing::debug;

use crate::errors::ParamsError;

/// Parameter key under which a whole [`ParamSet`] is stored.
const PARAM_SET_KEY: &str = "params";

/// A module's complete parameter struct.
pub trait ParamSet: Serialize + DeserializeOwned + Default + Clone {
    /// Reject values the module cannot run with.
    fn validate(&self) -> Result<(), String>;
}

/// Owner of the params partitions.
#[derive(Debug, Clone)]
pub struct ParamsKeeper {
    key: StoreKey,
    tkey: StoreKey,
    codec: Codec,
    spaces: BTreeSet<String>,
}

impl ParamsKeeper {
    pub fn new(codec: Codec, key: StoreKey, tkey: StoreKey) -> Self {
        Self {
            key,
            tkey,
            codec,
            spaces: BTreeSet::new(),
        }
    }

    /// Hand out the subspace for `name`. Each name is handed out once.
    pub fn subspace(&mut self, name: &str) -> Result<Subspace, ParamsError> {
        if !self.spaces.insert(name.to_string()) {
            return Err(ParamsError::DuplicateSubspace(name.to_string()));
        }
        debug!("[params] Created subspace {}", name);
        Ok(Subspace {
            name: name.to_string(),
            key: self.key.clone(),
            tkey: self.tkey.clone(),
            codec: self.codec,
        })
    }

    /// Subspaces handed out so far.
    pub fn subspaces(&self) -> impl Iterator<Item = &str> {
        self.spaces.iter().map(String::as_str)
    }

    pub fn store_key(&self) -> &StoreKey {
        &self.key
    }

    pub fn transient_key(&self) -> &StoreKey {
        &self.tkey
    }
}

/// One module's view of the params partitions.
#[derive(Debug, Clone)]
pub struct Subspace {
    name: String,
    key: StoreKey,
    tkey: StoreKey,
    codec: Codec,
}

impl Subspace {
    pub fn name(&self) -> &str {
        &self.name
    }

    fn param_key(&self, param: &str) -> Vec<u8> {
        format!("{}/{}", self.name, param).into_bytes()
    }

    pub fn get<T: DeserializeOwned>(
        &self,
        ctx: &mut Context<'_>,
        param: &str,
    ) -> Result<Option<T>, ParamsError> {
        ctx.load(&self.key, self.codec, &self.param_key(param))
    }

    /// Store `value` and mark `param` as changed for the rest of the block.
    pub fn set<T: Serialize>(
        &self,
        ctx: &mut Context<'_>,
        param: &str,
        value: &T,
    ) -> Result<(), ParamsError> {
        let key = self.param_key(param);
        ctx.save::<_, ParamsError>(&self.key, self.codec, &key, value)?;
        ctx.kv_store(&self.tkey)?.set(&key, &[1])?;
        Ok(())
    }

    /// Whether `param` was set during the current block.
    pub fn modified(&self, ctx: &mut Context<'_>, param: &str) -> Result<bool, ParamsError> {
        Ok(ctx.kv_store(&self.tkey)?.has(&self.param_key(param))?)
    }

    /// The module's parameter set, or its default if never stored.
    pub fn get_params<P: ParamSet>(&self, ctx: &mut Context<'_>) -> Result<P, ParamsError> {
        Ok(self.get(ctx, PARAM_SET_KEY)?.unwrap_or_default())
    }

    pub fn set_params<P: ParamSet>(&self, ctx: &mut Context<'_>, params: &P) -> Result<(), ParamsError> {
        params.validate().map_err(|reason| ParamsError::InvalidParams {
            subspace: self.name.clone(),
            reason,
        })?;
        self.set(ctx, PARAM_SET_KEY, params)
    }
}
