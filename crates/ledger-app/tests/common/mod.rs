//! Shared fixtures for the application integration tests.

#![allow(dead_code)]

use std::sync::Arc;

use chrono::{DateTime, TimeZone, Utc};
use ledger_app::abci::{
    RequestBeginBlock, RequestEndBlock, ResponseCommit, WireHeader, WireMisbehavior, WireTimestamp,
};
use ledger_app::{App, AppConfig, GenesisDocument};
use mc_01_store::{InMemoryVersionStore, VersionStore};
use shared_types::{Address, Event};

pub const CHAIN_ID: &str = "modchain-devnet";

pub fn genesis_time() -> DateTime<Utc> {
    Utc.timestamp_opt(1_700_000_000, 0).unwrap()
}

pub fn devnet() -> GenesisDocument {
    GenesisDocument::devnet(CHAIN_ID, genesis_time()).unwrap()
}

pub fn new_app() -> App {
    App::new(AppConfig::default(), Arc::new(InMemoryVersionStore::new())).unwrap()
}

pub fn app_over(config: AppConfig, versions: Arc<dyn VersionStore>) -> App {
    App::new(config, versions).unwrap()
}

/// Devnet application with genesis applied but nothing committed.
pub fn devnet_app() -> App {
    let mut app = new_app();
    app.init_chain(devnet().init_chain_request().unwrap()).unwrap();
    app
}

/// Begin request whose time is derived from the height, so replays match.
pub fn begin_request(height: u64, proposer: Option<Address>) -> RequestBeginBlock {
    RequestBeginBlock {
        header: WireHeader {
            chain_id: CHAIN_ID.to_string(),
            height: height as i64,
            time: WireTimestamp {
                seconds: genesis_time().timestamp() + height as i64 * 5,
                nanos: 0,
            },
            proposer_address: proposer.map(|a| a.as_bytes().to_vec()).unwrap_or_default(),
        },
        byzantine_validators: Vec::new(),
    }
}

pub fn double_sign(validator: Address, height: u64) -> WireMisbehavior {
    WireMisbehavior {
        kind: ledger_app::abci::EVIDENCE_DUPLICATE_VOTE,
        validator_address: validator.as_bytes().to_vec(),
        power: 10,
        height: height as i64,
        time: WireTimestamp {
            seconds: genesis_time().timestamp(),
            nanos: 0,
        },
    }
}

/// Begin, end and commit one empty block. Returns every event in order.
pub fn run_request(app: &mut App, request: RequestBeginBlock) -> (Vec<Event>, ResponseCommit) {
    let height = request.header.height;
    let mut events = app.begin_block(request).unwrap().events;
    events.extend(app.end_block(RequestEndBlock { height }).unwrap().events);
    let commit = app.commit().unwrap();
    (events, commit)
}

pub fn run_block(app: &mut App, height: u64, proposer: Option<Address>) -> (Vec<Event>, ResponseCommit) {
    run_request(app, begin_request(height, proposer))
}

pub fn kinds(events: &[Event]) -> Vec<&str> {
    events.iter().map(|e| e.kind.as_str()).collect()
}
