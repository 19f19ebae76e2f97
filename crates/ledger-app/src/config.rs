//! # Application Configuration
//!
//! Defaults suit a local devnet; every field can be overridden from `MC_*`
//! environment variables through [`AppConfig::from_env`].
//!
//! | Variable | Field |
//! |----------|-------|
//! | `MC_CHAIN_ID` | `chain_id` |
//! | `MC_CODEC` | `codec` (`json` or `bincode`) |
//! | `MC_PRUNING_KEEP_RECENT` | `pruning.keep_recent` |
//! | `MC_HALT_HEIGHT` | `halt_height` |
//! | `MC_LOAD_LATEST` | `load_latest` |
//! | `MC_STORAGE_BACKEND` | `storage.backend` (`memory` or `rocksdb`) |
//! | `MC_DATA_DIR` | `storage.data_dir` |
//! | `MC_GENESIS_FILE` | `genesis_file` |
//! | `MC_BLOCK_INTERVAL_MS` | `driver.block_interval_ms` |

use std::path::PathBuf;

use mc_01_store::PruningOptions;
use shared_types::CodecKind;
use thiserror::Error;

/// Complete application configuration.
#[derive(Debug, Clone)]
pub struct AppConfig {
    /// Chain the application serves. Genesis must carry the same id.
    pub chain_id: String,
    /// Encoding for stored values.
    pub codec: CodecKind,
    pub pruning: PruningConfig,
    /// Refuse to begin the block at this height.
    pub halt_height: Option<u64>,
    /// Restore the latest committed version at assembly.
    pub load_latest: bool,
    pub storage: StorageConfig,
    /// Genesis document. The binary falls back to a devnet genesis if unset.
    pub genesis_file: Option<PathBuf>,
    pub driver: DriverConfig,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            chain_id: "modchain-devnet".to_string(),
            codec: CodecKind::Json,
            pruning: PruningConfig::default(),
            halt_height: None,
            load_latest: true,
            storage: StorageConfig::default(),
            genesis_file: None,
            driver: DriverConfig::default(),
        }
    }
}

/// Version pruning.
#[derive(Debug, Clone, Default)]
pub struct PruningConfig {
    /// Versions to keep. `0` keeps everything.
    pub keep_recent: u64,
}

impl PruningConfig {
    pub fn options(&self) -> PruningOptions {
        PruningOptions::keep_recent(self.keep_recent)
    }
}

/// Where committed versions live.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum StorageBackend {
    #[default]
    Memory,
    RocksDb,
}

impl StorageBackend {
    pub fn parse(s: &str) -> Option<Self> {
        match s.to_ascii_lowercase().as_str() {
            "memory" | "mem" => Some(Self::Memory),
            "rocksdb" => Some(Self::RocksDb),
            _ => None,
        }
    }
}

#[derive(Debug, Clone)]
pub struct StorageConfig {
    pub backend: StorageBackend,
    /// Database directory for the RocksDB backend.
    pub data_dir: PathBuf,
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            backend: StorageBackend::Memory,
            data_dir: PathBuf::from("./data/modchain"),
        }
    }
}

/// Devnet block driver used by the binary.
#[derive(Debug, Clone)]
pub struct DriverConfig {
    pub block_interval_ms: u64,
}

impl Default for DriverConfig {
    fn default() -> Self {
        Self {
            block_interval_ms: 1_000,
        }
    }
}

/// Configuration errors.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ConfigError {
    #[error("chain id cannot be empty")]
    EmptyChainId,

    #[error("halt height must be positive")]
    ZeroHaltHeight,

    #[error("block interval must be positive")]
    ZeroBlockInterval,

    #[error("storage backend {0:?} is not compiled in")]
    BackendUnavailable(StorageBackend),

    #[error("invalid value {value:?} for {var}")]
    InvalidVar { var: &'static str, value: String },
}

impl AppConfig {
    /// Defaults overridden by any `MC_*` variable that is set.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|var| std::env::var(var).ok())
    }

    /// Same as [`AppConfig::from_env`] with an explicit variable source.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let mut config = Self::default();

        if let Some(chain_id) = lookup("MC_CHAIN_ID") {
            config.chain_id = chain_id;
        }
        if let Some(value) = lookup("MC_CODEC") {
            config.codec = CodecKind::parse(&value).ok_or(ConfigError::InvalidVar {
                var: "MC_CODEC",
                value,
            })?;
        }
        if let Some(value) = lookup("MC_PRUNING_KEEP_RECENT") {
            config.pruning.keep_recent = parse_var("MC_PRUNING_KEEP_RECENT", value)?;
        }
        if let Some(value) = lookup("MC_HALT_HEIGHT") {
            config.halt_height = Some(parse_var("MC_HALT_HEIGHT", value)?);
        }
        if let Some(value) = lookup("MC_LOAD_LATEST") {
            config.load_latest = match value.to_ascii_lowercase().as_str() {
                "1" | "true" | "yes" => true,
                "0" | "false" | "no" => false,
                _ => {
                    return Err(ConfigError::InvalidVar {
                        var: "MC_LOAD_LATEST",
                        value,
                    })
                }
            };
        }
        if let Some(value) = lookup("MC_STORAGE_BACKEND") {
            config.storage.backend = StorageBackend::parse(&value).ok_or(ConfigError::InvalidVar {
                var: "MC_STORAGE_BACKEND",
                value,
            })?;
        }
        if let Some(dir) = lookup("MC_DATA_DIR") {
            config.storage.data_dir = PathBuf::from(dir);
        }
        if let Some(path) = lookup("MC_GENESIS_FILE") {
            config.genesis_file = Some(PathBuf::from(path));
        }
        if let Some(value) = lookup("MC_BLOCK_INTERVAL_MS") {
            config.driver.block_interval_ms = parse_var("MC_BLOCK_INTERVAL_MS", value)?;
        }

        Ok(config)
    }

    /// Reject settings the application cannot start with.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.chain_id.trim().is_empty() {
            return Err(ConfigError::EmptyChainId);
        }
        if self.halt_height == Some(0) {
            return Err(ConfigError::ZeroHaltHeight);
        }
        if self.driver.block_interval_ms == 0 {
            return Err(ConfigError::ZeroBlockInterval);
        }
        if self.storage.backend == StorageBackend::RocksDb && !cfg!(feature = "rocksdb") {
            return Err(ConfigError::BackendUnavailable(StorageBackend::RocksDb));
        }
        Ok(())
    }
}

fn parse_var<T: std::str::FromStr>(var: &'static str, value: String) -> Result<T, ConfigError> {
    value
        .trim()
        .parse()
        .map_err(|_| ConfigError::InvalidVar { var, value })
}
