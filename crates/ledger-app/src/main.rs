//! # modchaind
//!
//! Devnet node: assembles the application, runs genesis if the store is
//! empty and then produces empty blocks on a fixed interval until Ctrl+C.
//!
//! ## Startup Sequence
//!
//! 1. Load configuration from `MC_*` variables
//! 2. Assemble the application over the configured backend
//! 3. Load the genesis file (or the built-in devnet genesis) and run
//!    InitChain when nothing has been committed
//! 4. Drive begin / end / commit every `MC_BLOCK_INTERVAL_MS`

use std::time::Duration;

use anyhow::{Context, Result};
use chrono::Utc;
use ledger_app::abci::{RequestBeginBlock, RequestEndBlock, WireHeader};
use ledger_app::{App, AppConfig, GenesisDocument, DEVNET_OPERATOR};
use tracing::{error, info, warn};
use tracing_subscriber::{EnvFilter, FmtSubscriber};

#[tokio::main]
async fn main() -> Result<()> {
    let subscriber = FmtSubscriber::builder()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .with_target(false)
        .finish();
    tracing::subscriber::set_global_default(subscriber).context("Failed to set tracing subscriber")?;

    let config = AppConfig::from_env().context("Invalid configuration")?;
    let interval = Duration::from_millis(config.driver.block_interval_ms);

    info!("===========================================");
    info!("  modchaind v{}", env!("CARGO_PKG_VERSION"));
    info!("  Chain: {}", config.chain_id);
    info!("  Storage: {:?}", config.storage.backend);
    info!("===========================================");

    let genesis = match &config.genesis_file {
        Some(path) => GenesisDocument::from_file(path)
            .with_context(|| format!("Failed to load genesis from {}", path.display()))?,
        None => {
            warn!("No genesis file configured, using devnet genesis");
            GenesisDocument::devnet(config.chain_id.clone(), Utc::now())?
        }
    };

    let mut app = App::open(config).context("Failed to assemble application")?;
    let mut next_height = app.last_commit().version + 1;
    if app.last_commit().version == 0 {
        let response = app
            .init_chain(genesis.init_chain_request()?)
            .context("InitChain failed")?;
        info!("Genesis complete with {} validators", response.validators.len());
        next_height = genesis.initial_height;
    } else {
        info!("Resuming after height {}", app.last_commit().version);
    }

    let mut ticker = tokio::time::interval(interval);
    loop {
        tokio::select! {
            _ = ticker.tick() => {
                if let Err(err) = produce_block(&mut app, next_height) {
                    error!("Block {} failed: {:#}", next_height, err);
                    break;
                }
                next_height += 1;
            }
            _ = tokio::signal::ctrl_c() => {
                info!("Shutdown signal received");
                break;
            }
        }
    }

    info!("Stopped at height {}", app.last_commit().version);
    Ok(())
}

/// One empty block proposed by the devnet operator.
fn produce_block(app: &mut App, height: u64) -> Result<()> {
    let request = RequestBeginBlock {
        header: WireHeader {
            chain_id: app.config().chain_id.clone(),
            height: i64::try_from(height)?,
            time: Utc::now().into(),
            proposer_address: DEVNET_OPERATOR.as_bytes().to_vec(),
        },
        byzantine_validators: Vec::new(),
    };

    let begin = app.begin_block(request)?;
    let end = app.end_block(RequestEndBlock {
        height: i64::try_from(height)?,
    })?;
    let commit = app.commit()?;

    info!(
        "Block {} committed: {} events, {} validator updates, app hash {}",
        commit.height,
        begin.events.len() + end.events.len(),
        end.validator_updates.len(),
        hex::encode(commit.app_hash.get(..8).unwrap_or(&commit.app_hash[..]))
    );
    Ok(())
}
