use mc_03_params::ParamSet;
use serde::{Deserialize, Serialize};
use shared_types::{Address, Coin};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BankParams {
    /// Whether account-to-account transfers are allowed.
    pub send_enabled: bool,
    /// Minted and paid to the proposer at the start of every block.
    #[serde(default)]
    pub block_reward: Option<Coin>,
}

impl Default for BankParams {
    fn default() -> Self {
        Self {
            send_enabled: true,
            block_reward: None,
        }
    }
}

impl ParamSet for BankParams {
    fn validate(&self) -> Result<(), String> {
        match &self.block_reward {
            Some(reward) if reward.denom.is_empty() => Err("block reward has no denom".into()),
            _ => Ok(()),
        }
    }
}

/// Coins held by one address.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Balance {
    pub address: Address,
    pub coins: Vec<Coin>,
}

/// The `bank` slice of the genesis document.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct BankGenesis {
    #[serde(default)]
    pub params: BankParams,
    #[serde(default)]
    pub balances: Vec<Balance>,
    /// Declared total supply. Empty means "whatever the balances add up to".
    #[serde(default)]
    pub supply: Vec<Coin>,
}
