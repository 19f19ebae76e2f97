use chrono::{DateTime, Utc};
use mc_03_params::ParamSet;
use serde::{Deserialize, Serialize};
use serde_with::{serde_as, DisplayFromStr};
use shared_types::{Address, ValidatorUpdate};

use crate::POWER_REDUCTION;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StakingParams {
    pub bond_denom: String,
    /// Size cap of the active set.
    pub max_validators: u32,
    /// How many [`HistoricalInfo`] entries to keep. `0` keeps none.
    pub historical_entries: u32,
    /// Share of tokens burned on double-sign evidence, in basis points.
    pub slash_fraction_double_sign_bps: u32,
}

impl Default for StakingParams {
    fn default() -> Self {
        Self {
            bond_denom: "stake".into(),
            max_validators: 100,
            historical_entries: 100,
            slash_fraction_double_sign_bps: 500,
        }
    }
}

impl ParamSet for StakingParams {
    fn validate(&self) -> Result<(), String> {
        if self.bond_denom.is_empty() {
            return Err("bond denom cannot be blank".into());
        }
        if self.max_validators == 0 {
            return Err("max validators must be positive".into());
        }
        if self.slash_fraction_double_sign_bps > 10_000 {
            return Err("slash fraction above 100%".into());
        }
        Ok(())
    }
}

#[serde_as]
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Validator {
    pub operator: Address,
    /// Bonded tokens, all held by the bonded pool.
    #[serde_as(as = "DisplayFromStr")]
    pub tokens: u128,
    #[serde(default)]
    pub jailed: bool,
    #[serde(default)]
    pub moniker: String,
}

impl Validator {
    /// Consensus power. Jailed validators have none.
    pub fn power(&self) -> u64 {
        if self.jailed {
            return 0;
        }
        u64::try_from(self.tokens / POWER_REDUCTION).unwrap_or(u64::MAX)
    }
}

/// Validator set and header time recorded at the start of a block.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HistoricalInfo {
    pub height: u64,
    pub time: DateTime<Utc>,
    pub valset: Vec<ValidatorUpdate>,
}

/// The `staking` slice of the genesis document.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct StakingGenesis {
    #[serde(default)]
    pub params: StakingParams,
    #[serde(default)]
    pub validators: Vec<Validator>,
}
