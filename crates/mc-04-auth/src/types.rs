use serde::{Deserialize, Serialize};
use shared_types::Address;

/// What a module account may do with coins.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Permission {
    Minter,
    Burner,
    Staking,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ModuleAccountInfo {
    pub name: String,
    pub permissions: Vec<Permission>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Account {
    pub address: Address,
    pub account_number: u64,
    #[serde(default)]
    pub sequence: u64,
    #[serde(default)]
    pub module: Option<ModuleAccountInfo>,
}

impl Account {
    pub fn is_module_account(&self) -> bool {
        self.module.is_some()
    }
}

/// The `auth` slice of the genesis document.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct AuthGenesis {
    #[serde(default)]
    pub accounts: Vec<Account>,
}
