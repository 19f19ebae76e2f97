//! # Error Types
//!
//! Errors shared across crates.

use thiserror::Error;

/// Marshal / unmarshal failures from the injected [`crate::Codec`].
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CodecError {
    /// Value could not be encoded.
    #[error("encode failed ({codec}): {message}")]
    Encode { codec: &'static str, message: String },

    /// Bytes could not be decoded into the requested type.
    #[error("decode failed ({codec}): {message}")]
    Decode { codec: &'static str, message: String },
}

/// Address parsing errors.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum AddressError {
    /// Wrong number of bytes.
    #[error("invalid address length: expected 20 bytes, got {0}")]
    InvalidLength(usize),

    /// Not valid hex.
    #[error("invalid address hex: {0}")]
    InvalidHex(String),
}
