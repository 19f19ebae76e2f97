use std::collections::BTreeSet;

use serde::{Deserialize, Serialize};

/// An unforgeable handle. Only the keeper mints these.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct Capability {
    index: u64,
}

impl Capability {
    pub(crate) fn new(index: u64) -> Self {
        Self { index }
    }

    pub fn index(&self) -> u64 {
        self.index
    }
}

/// A module holding a capability under a module-local name.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct Owner {
    pub module: String,
    pub name: String,
}

impl Owner {
    pub fn new(module: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            module: module.into(),
            name: name.into(),
        }
    }
}

/// Every owner of one capability, ordered.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CapabilityOwners {
    pub owners: BTreeSet<Owner>,
}

/// Owners of one capability as carried in genesis.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GenesisOwners {
    pub index: u64,
    pub owners: Vec<Owner>,
}

/// The `capability` slice of the genesis document.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CapabilityGenesis {
    /// Index the next new capability receives.
    #[serde(default = "first_index")]
    pub index: u64,
    #[serde(default)]
    pub owners: Vec<GenesisOwners>,
}

fn first_index() -> u64 {
    1
}

impl Default for CapabilityGenesis {
    fn default() -> Self {
        Self {
            index: first_index(),
            owners: Vec::new(),
        }
    }
}

impl CapabilityGenesis {
    pub fn validate(&self) -> Result<(), String> {
        if self.index == 0 {
            return Err("next index must be positive".into());
        }
        let mut seen = BTreeSet::new();
        for entry in &self.owners {
            if entry.index == 0 || entry.index >= self.index {
                return Err(format!(
                    "owner index {} outside [1, {})",
                    entry.index, self.index
                ));
            }
            if !seen.insert(entry.index) {
                return Err(format!("owners of {} listed twice", entry.index));
            }
            if entry.owners.is_empty() {
                return Err(format!("capability {} has no owners", entry.index));
            }
            for owner in &entry.owners {
                if owner.module.is_empty() || owner.name.is_empty() {
                    return Err(format!("capability {} has a blank owner", entry.index));
                }
            }
        }
        Ok(())
    }
}
