//! # Injected Codec
//!
//! The marshal/unmarshal capability handed to every keeper at construction.
//! The encoding is chosen once by the application root; keepers only ever
//! call [`Codec::marshal`] and [`Codec::unmarshal`].

use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};

use crate::errors::CodecError;

/// Available encodings for stored values.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CodecKind {
    /// `serde_json`; human readable, default.
    #[default]
    Json,
    /// `bincode`; compact, used for production stores.
    Bincode,
}

impl CodecKind {
    /// Short name used in logs and errors.
    pub fn name(&self) -> &'static str {
        match self {
            Self::Json => "json",
            Self::Bincode => "bincode",
        }
    }

    /// Parse from configuration text.
    pub fn parse(s: &str) -> Option<Self> {
        match s.to_ascii_lowercase().as_str() {
            "json" => Some(Self::Json),
            "bincode" | "binary" => Some(Self::Bincode),
            _ => None,
        }
    }
}

/// Marshal / unmarshal capability.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Codec {
    kind: CodecKind,
}

impl Codec {
    /// Create a codec of the given kind.
    pub fn new(kind: CodecKind) -> Self {
        Self { kind }
    }

    /// The encoding in use.
    pub fn kind(&self) -> CodecKind {
        self.kind
    }

    /// Encode a value.
    pub fn marshal<T: Serialize>(&self, value: &T) -> Result<Vec<u8>, CodecError> {
        let encoded = match self.kind {
            CodecKind::Json => serde_json::to_vec(value).map_err(|e| e.to_string()),
            CodecKind::Bincode => bincode::serialize(value).map_err(|e| e.to_string()),
        };
        encoded.map_err(|message| CodecError::Encode {
            codec: self.kind.name(),
            message,
        })
    }

    /// Decode a value.
    pub fn unmarshal<T: DeserializeOwned>(&self, bytes: &[u8]) -> Result<T, CodecError> {
        let decoded = match self.kind {
            CodecKind::Json => serde_json::from_slice(bytes).map_err(|e| e.to_string()),
            CodecKind::Bincode => bincode::deserialize(bytes).map_err(|e| e.to_string()),
        };
        decoded.map_err(|message| CodecError::Decode {
            codec: self.kind.name(),
            message,
        })
    }
}

/// Decode a JSON genesis blob. Genesis documents are always JSON,
/// independently of the store codec.
pub fn unmarshal_json<T: DeserializeOwned>(bytes: &[u8]) -> Result<T, CodecError> {
    serde_json::from_slice(bytes).map_err(|e| CodecError::Decode {
        codec: "json",
        message: e.to_string(),
    })
}

/// Encode a JSON genesis blob.
pub fn marshal_json<T: Serialize>(value: &T) -> Result<Vec<u8>, CodecError> {
    serde_json::to_vec(value).map_err(|e| CodecError::Encode {
        codec: "json",
        message: e.to_string(),
    })
}
