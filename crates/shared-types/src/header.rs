//! # Block Header
//!
//! The internal header handed, unmodified, to every begin-block and end-block
//! hook. The application root translates the consensus wire format into this
//! type before any hook runs.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::entities::Address;

/// Metadata describing the block currently being processed.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BlockHeader {
    /// Chain identifier the block belongs to.
    pub chain_id: String,
    /// Block height (first block is the genesis `initial_height`).
    pub height: u64,
    /// Block time as agreed by consensus.
    pub time: DateTime<Utc>,
    /// Address of the validator that proposed the block.
    pub proposer: Address,
    /// Misbehaviour reported by consensus for this block.
    pub evidence: Vec<Evidence>,
}

impl BlockHeader {
    /// Header used while genesis hooks run.
    ///
    /// Genesis executes "at" the initial height with no proposer and no
    /// evidence.
    pub fn genesis(chain_id: impl Into<String>, time: DateTime<Utc>, initial_height: u64) -> Self {
        Self {
            chain_id: chain_id.into(),
            height: initial_height,
            time,
            proposer: Address::default(),
            evidence: Vec::new(),
        }
    }
}

/// Category of reported misbehaviour.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum EvidenceKind {
    /// Validator signed two conflicting votes at the same height.
    DuplicateVote,
    /// Validator took part in a light-client attack.
    LightClientAttack,
}

/// One piece of misbehaviour evidence.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Evidence {
    /// What kind of misbehaviour.
    pub kind: EvidenceKind,
    /// Offending validator.
    pub validator: Address,
    /// Voting power of the validator at `height`.
    pub power: u64,
    /// Height at which the misbehaviour occurred.
    pub height: u64,
    /// Time at which the misbehaviour occurred.
    pub time: DateTime<Utc>,
}
