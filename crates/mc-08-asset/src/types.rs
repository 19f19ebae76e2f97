use serde::{Deserialize, Serialize};
use shared_types::Address;

/// A custom asset definition.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Asset {
    pub denom: String,
    /// The only account allowed to issue, and the holder of the collateral.
    pub issuer: Address,
    pub collateral_denom: String,
    /// Required collateral per unit of supply, in basis points.
    pub min_collateral_ratio_bps: u32,
}

impl Asset {
    pub fn validate(&self) -> Result<(), String> {
        if self.denom.is_empty() || self.collateral_denom.is_empty() {
            return Err("denoms cannot be blank".into());
        }
        if self.denom == self.collateral_denom {
            return Err(format!("{} cannot back itself", self.denom));
        }
        if self.min_collateral_ratio_bps == 0 {
            return Err(format!("{} needs a positive collateral ratio", self.denom));
        }
        Ok(())
    }

    /// Capability name guarding issuance of this asset.
    pub fn capability_name(&self) -> String {
        issue_capability(&self.denom)
    }
}

pub(crate) fn issue_capability(denom: &str) -> String {
    format!("issue/{}", denom)
}

/// Issuer collateral and asset supply observed at the start of a block.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CollateralSnapshot {
    pub height: u64,
    pub collateral: u128,
    pub supply: u128,
}

impl CollateralSnapshot {
    /// Whether `collateral / supply` is below `ratio_bps / 10000`.
    pub fn is_undercollateralized(&self, ratio_bps: u32) -> bool {
        if self.supply == 0 {
            return false;
        }
        let required = self.supply.saturating_mul(u128::from(ratio_bps));
        self.collateral.saturating_mul(10_000) < required
    }
}

/// The `asset` slice of the genesis document.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct AssetGenesis {
    #[serde(default)]
    pub assets: Vec<Asset>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_collateral_ratio() {
        let snapshot = CollateralSnapshot {
            height: 1,
            collateral: 150,
            supply: 100,
        };
        assert!(!snapshot.is_undercollateralized(15_000));
        assert!(snapshot.is_undercollateralized(15_001));
        let empty = CollateralSnapshot {
            height: 1,
            collateral: 0,
            supply: 0,
        };
        assert!(!empty.is_undercollateralized(20_000));
    }

    #[test]
    fn test_asset_cannot_back_itself() {
        let asset = Asset {
            denom: "ubtc".into(),
            issuer: Address([1; 20]),
            collateral_denom: "ubtc".into(),
            min_collateral_ratio_bps: 10_000,
        };
        assert!(asset.validate().is_err());
    }
}
