//! # Genesis Document
//!
//! `{ chain_id, genesis_time, initial_height, app_state }` where `app_state`
//! maps each module name to that module's genesis blob. Blobs are kept as raw
//! JSON so each module receives its slice byte for byte.

use std::collections::BTreeMap;
use std::path::Path;

use chrono::{DateTime, Utc};
use mc_02_module_manager::GenesisState;
use mc_04_auth::{Account, AuthGenesis};
use mc_05_bank::{Balance, BankGenesis, BankParams};
use mc_07_staking::{StakingGenesis, StakingParams, Validator, BONDED_POOL};
use mc_08_asset::{Asset, AssetGenesis};
use serde::{Deserialize, Serialize};
use serde_json::value::RawValue;
use shared_types::{Address, Coin, ModuleName};

use crate::abci::RequestInitChain;
use crate::errors::AppError;

/// Per-module genesis blobs as they appear in the document.
pub type AppState = BTreeMap<String, Box<RawValue>>;

/// Operator of the devnet validator and issuer of the devnet asset.
pub const DEVNET_OPERATOR: Address = Address([0xA1; 20]);

const DEVNET_DENOM: &str = "stake";
const DEVNET_SELF_BOND: u128 = 10_000_000;
const DEVNET_OPERATOR_FUNDS: u128 = 1_000_000_000;
const DEVNET_BLOCK_REWARD: u128 = 1_000;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GenesisDocument {
    pub chain_id: String,
    pub genesis_time: DateTime<Utc>,
    #[serde(default = "default_initial_height")]
    pub initial_height: u64,
    #[serde(default)]
    pub app_state: AppState,
}

fn default_initial_height() -> u64 {
    1
}

impl GenesisDocument {
    pub fn from_json(bytes: &[u8]) -> Result<Self, AppError> {
        let doc: Self = serde_json::from_slice(bytes).map_err(genesis_error)?;
        if doc.initial_height == 0 {
            return Err(AppError::Genesis("initial height must be positive".into()));
        }
        Ok(doc)
    }

    pub fn from_file(path: &Path) -> Result<Self, AppError> {
        let bytes = std::fs::read(path)
            .map_err(|e| AppError::Genesis(format!("{}: {}", path.display(), e)))?;
        Self::from_json(&bytes)
    }

    pub fn to_json(&self) -> Result<Vec<u8>, AppError> {
        serde_json::to_vec_pretty(self).map_err(genesis_error)
    }

    /// The `app_state` envelope as sent over the wire.
    pub fn app_state_bytes(&self) -> Result<Vec<u8>, AppError> {
        serde_json::to_vec(&self.app_state).map_err(genesis_error)
    }

    pub fn init_chain_request(&self) -> Result<RequestInitChain, AppError> {
        Ok(RequestInitChain {
            time: self.genesis_time.into(),
            chain_id: self.chain_id.clone(),
            initial_height: i64::try_from(self.initial_height)
                .map_err(|_| AppError::Genesis("initial height out of range".into()))?,
            app_state_bytes: self.app_state_bytes()?,
        })
    }

    /// Single-validator chain: one funded operator bonded to itself, a
    /// block reward and one collateralised asset.
    pub fn devnet(chain_id: impl Into<String>, genesis_time: DateTime<Utc>) -> Result<Self, AppError> {
        let auth = AuthGenesis {
            accounts: vec![Account {
                address: DEVNET_OPERATOR,
                account_number: 0,
                sequence: 0,
                module: None,
            }],
        };
        let bank = BankGenesis {
            params: BankParams {
                send_enabled: true,
                block_reward: Some(Coin::new(DEVNET_DENOM, DEVNET_BLOCK_REWARD)),
            },
            balances: vec![
                Balance {
                    address: DEVNET_OPERATOR,
                    coins: vec![Coin::new(DEVNET_DENOM, DEVNET_OPERATOR_FUNDS)],
                },
                Balance {
                    address: Address::for_module(BONDED_POOL),
                    coins: vec![Coin::new(DEVNET_DENOM, DEVNET_SELF_BOND)],
                },
            ],
            supply: vec![Coin::new(DEVNET_DENOM, DEVNET_OPERATOR_FUNDS + DEVNET_SELF_BOND)],
        };
        let staking = StakingGenesis {
            params: StakingParams::default(),
            validators: vec![Validator {
                operator: DEVNET_OPERATOR,
                tokens: DEVNET_SELF_BOND,
                jailed: false,
                moniker: "devnet-0".into(),
            }],
        };
        let asset = AssetGenesis {
            assets: vec![Asset {
                denom: "ubtc".into(),
                issuer: DEVNET_OPERATOR,
                collateral_denom: DEVNET_DENOM.into(),
                min_collateral_ratio_bps: 15_000,
            }],
        };

        let mut app_state = AppState::new();
        app_state.insert(mc_04_auth::MODULE_NAME.into(), raw(&auth)?);
        app_state.insert(mc_05_bank::MODULE_NAME.into(), raw(&bank)?);
        app_state.insert(mc_07_staking::MODULE_NAME.into(), raw(&staking)?);
        app_state.insert(mc_08_asset::MODULE_NAME.into(), raw(&asset)?);

        Ok(Self {
            chain_id: chain_id.into(),
            genesis_time,
            initial_height: 1,
            app_state,
        })
    }
}

fn raw<T: Serialize>(value: &T) -> Result<Box<RawValue>, AppError> {
    serde_json::value::to_raw_value(value).map_err(genesis_error)
}

fn genesis_error(err: serde_json::Error) -> AppError {
    AppError::Genesis(err.to_string())
}

/// Split a wire envelope into per-module blobs. Empty bytes mean no state.
pub(crate) fn parse_app_state(bytes: &[u8]) -> Result<GenesisState, AppError> {
    if bytes.iter().all(u8::is_ascii_whitespace) {
        return Ok(GenesisState::new());
    }
    let envelope: AppState = serde_json::from_slice(bytes).map_err(genesis_error)?;
    Ok(envelope
        .into_iter()
        .map(|(name, blob)| (ModuleName::new(name), blob.get().as_bytes().to_vec()))
        .collect())
}

/// Inverse of [`parse_app_state`].
pub(crate) fn encode_app_state(state: GenesisState) -> Result<Vec<u8>, AppError> {
    let mut envelope = AppState::new();
    for (name, blob) in state {
        let json = String::from_utf8(blob)
            .map_err(|e| AppError::Genesis(format!("{} export is not JSON: {}", name, e)))?;
        let value = RawValue::from_string(json).map_err(genesis_error)?;
        envelope.insert(name.as_str().to_string(), value);
    }
    serde_json::to_vec(&envelope).map_err(genesis_error)
}
