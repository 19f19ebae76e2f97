//! # Consensus Wire Types
//!
//! Requests and responses exchanged with the consensus engine, in the shape
//! the engine speaks: signed heights, seconds-and-nanos timestamps, raw
//! address bytes, numeric evidence kinds. Everything is translated into
//! [`BlockHeader`] before any hook sees it, and back on the way out.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use shared_types::{
    Address, AddressError, BlockHeader, Event, Evidence, EvidenceKind, ValidatorUpdate,
};
use thiserror::Error;

/// Translation failures for wire requests.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum WireError {
    #[error("negative {field}: {value}")]
    Negative { field: &'static str, value: i64 },

    #[error("timestamp {seconds}s {nanos}ns out of range")]
    InvalidTime { seconds: i64, nanos: i32 },

    #[error("address: {0}")]
    Address(#[from] AddressError),

    #[error("unknown evidence type {0}")]
    UnknownEvidenceKind(i32),
}

fn unsigned(field: &'static str, value: i64) -> Result<u64, WireError> {
    u64::try_from(value).map_err(|_| WireError::Negative { field, value })
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct WireTimestamp {
    pub seconds: i64,
    pub nanos: i32,
}

impl From<DateTime<Utc>> for WireTimestamp {
    fn from(time: DateTime<Utc>) -> Self {
        Self {
            seconds: time.timestamp(),
            nanos: time.timestamp_subsec_nanos() as i32,
        }
    }
}

impl TryFrom<WireTimestamp> for DateTime<Utc> {
    type Error = WireError;

    fn try_from(ts: WireTimestamp) -> Result<Self, Self::Error> {
        let invalid = WireError::InvalidTime {
            seconds: ts.seconds,
            nanos: ts.nanos,
        };
        let nanos = u32::try_from(ts.nanos).map_err(|_| invalid.clone())?;
        DateTime::from_timestamp(ts.seconds, nanos).ok_or(invalid)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WireHeader {
    pub chain_id: String,
    pub height: i64,
    pub time: WireTimestamp,
    pub proposer_address: Vec<u8>,
}

/// Evidence type codes used on the wire.
pub const EVIDENCE_DUPLICATE_VOTE: i32 = 1;
pub const EVIDENCE_LIGHT_CLIENT_ATTACK: i32 = 2;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WireMisbehavior {
    pub kind: i32,
    pub validator_address: Vec<u8>,
    pub power: i64,
    pub height: i64,
    pub time: WireTimestamp,
}

impl TryFrom<WireMisbehavior> for Evidence {
    type Error = WireError;

    fn try_from(wire: WireMisbehavior) -> Result<Self, Self::Error> {
        let kind = match wire.kind {
            EVIDENCE_DUPLICATE_VOTE => EvidenceKind::DuplicateVote,
            EVIDENCE_LIGHT_CLIENT_ATTACK => EvidenceKind::LightClientAttack,
            other => return Err(WireError::UnknownEvidenceKind(other)),
        };
        Ok(Evidence {
            kind,
            validator: Address::from_slice(&wire.validator_address)?,
            power: unsigned("evidence power", wire.power)?,
            height: unsigned("evidence height", wire.height)?,
            time: wire.time.try_into()?,
        })
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WireValidatorUpdate {
    pub address: Vec<u8>,
    pub power: i64,
}

impl From<&ValidatorUpdate> for WireValidatorUpdate {
    fn from(update: &ValidatorUpdate) -> Self {
        Self {
            address: update.address.as_bytes().to_vec(),
            power: i64::try_from(update.power).unwrap_or(i64::MAX),
        }
    }
}

fn wire_updates(updates: &[ValidatorUpdate]) -> Vec<WireValidatorUpdate> {
    updates.iter().map(WireValidatorUpdate::from).collect()
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RequestInitChain {
    pub time: WireTimestamp,
    pub chain_id: String,
    pub initial_height: i64,
    /// JSON envelope mapping module name to that module's genesis blob.
    pub app_state_bytes: Vec<u8>,
}

impl RequestInitChain {
    /// Height of the first block. `0` on the wire means "unset" and maps to 1.
    pub fn first_height(&self) -> Result<u64, WireError> {
        Ok(unsigned("initial_height", self.initial_height)?.max(1))
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct ResponseInitChain {
    /// Initial validator set. Empty leaves the engine's own set in place.
    pub validators: Vec<WireValidatorUpdate>,
}

impl ResponseInitChain {
    pub(crate) fn new(validators: &[ValidatorUpdate]) -> Self {
        Self {
            validators: wire_updates(validators),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RequestBeginBlock {
    pub header: WireHeader,
    #[serde(default)]
    pub byzantine_validators: Vec<WireMisbehavior>,
}

impl RequestBeginBlock {
    /// The internal header hooks receive. An empty proposer maps to the
    /// zero address.
    pub fn to_header(&self) -> Result<BlockHeader, WireError> {
        let proposer = if self.header.proposer_address.is_empty() {
            Address::default()
        } else {
            Address::from_slice(&self.header.proposer_address)?
        };
        Ok(BlockHeader {
            chain_id: self.header.chain_id.clone(),
            height: unsigned("height", self.header.height)?,
            time: self.header.time.try_into()?,
            proposer,
            evidence: self
                .byzantine_validators
                .iter()
                .cloned()
                .map(Evidence::try_from)
                .collect::<Result<_, _>>()?,
        })
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct ResponseBeginBlock {
    pub events: Vec<Event>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RequestEndBlock {
    pub height: i64,
}

#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct ResponseEndBlock {
    pub validator_updates: Vec<WireValidatorUpdate>,
    pub events: Vec<Event>,
}

impl ResponseEndBlock {
    pub(crate) fn new(updates: &[ValidatorUpdate], events: Vec<Event>) -> Self {
        Self {
            validator_updates: wire_updates(updates),
            events,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct ResponseCommit {
    pub height: i64,
    pub app_hash: Vec<u8>,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn request(height: i64) -> RequestBeginBlock {
        RequestBeginBlock {
            header: WireHeader {
                chain_id: "test".into(),
                height,
                time: WireTimestamp {
                    seconds: 1_700_000_000,
                    nanos: 5,
                },
                proposer_address: vec![7; 20],
            },
            byzantine_validators: vec![WireMisbehavior {
                kind: EVIDENCE_DUPLICATE_VOTE,
                validator_address: vec![3; 20],
                power: 10,
                height: height - 1,
                time: WireTimestamp::default(),
            }],
        }
    }

    #[test]
    fn test_header_translation() {
        let header = request(5).to_header().unwrap();
        assert_eq!(header.height, 5);
        assert_eq!(header.proposer, Address([7; 20]));
        assert_eq!(header.time.timestamp(), 1_700_000_000);
        assert_eq!(header.time.timestamp_subsec_nanos(), 5);
        assert_eq!(header.evidence.len(), 1);
        assert_eq!(header.evidence[0].kind, EvidenceKind::DuplicateVote);
        assert_eq!(header.evidence[0].height, 4);
    }

    #[test]
    fn test_header_rejects_bad_fields() {
        assert!(matches!(
            request(-1).to_header(),
            Err(WireError::Negative { field: "height", .. })
        ));

        let mut short = request(2);
        short.header.proposer_address = vec![1, 2, 3];
        assert!(matches!(short.to_header(), Err(WireError::Address(_))));

        let mut unknown = request(2);
        unknown.byzantine_validators[0].kind = 9;
        assert_eq!(unknown.to_header(), Err(WireError::UnknownEvidenceKind(9)));
    }

    #[test]
    fn test_empty_proposer_is_zero_address() {
        let mut req = request(2);
        req.header.proposer_address.clear();
        assert_eq!(req.to_header().unwrap().proposer, Address::default());
    }

    #[test]
    fn test_init_chain_first_height() {
        let mut req = RequestInitChain {
            time: WireTimestamp::default(),
            chain_id: "test".into(),
            initial_height: 0,
            app_state_bytes: Vec::new(),
        };
        assert_eq!(req.first_height(), Ok(1));

        req.initial_height = 12;
        assert_eq!(req.first_height(), Ok(12));

        req.initial_height = -3;
        assert_eq!(
            req.first_height(),
            Err(WireError::Negative {
                field: "initial_height",
                value: -3
            })
        );
    }
}
