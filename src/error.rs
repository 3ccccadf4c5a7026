//! Error types for amber-client.

use thiserror::Error;

/// Main error type for all client operations.
#[derive(Debug, Error)]
pub enum AmberError {
    /// I/O error during socket creation, send or receive.
    #[error("Transport error: {0}")]
    Transport(#[from] std::io::Error),

    /// The socket was closed by `terminate` (or an explicit transport close).
    #[error("Transport closed")]
    TransportClosed,

    /// The mediator hostname did not resolve to any address.
    #[error("Address resolution failed for {0}")]
    AddressResolution(String),

    /// A record failed to serialize.
    #[error("Serialization error: {0}")]
    Serialization(#[from] prost::EncodeError),

    /// A record is too long to fit behind a 2-byte length prefix.
    #[error("Record of {len} bytes exceeds maximum {max}")]
    RecordTooLarge {
        /// Serialized record length.
        len: usize,
        /// Largest length a prefix can describe.
        max: usize,
    },

    /// A received datagram could not be decoded.
    #[error("Malformed packet: {0}")]
    MalformedPacket(String),

    /// Invalid client configuration.
    #[error("Configuration error: {0}")]
    Config(String),
}

impl From<prost::DecodeError> for AmberError {
    fn from(e: prost::DecodeError) -> Self {
        AmberError::MalformedPacket(e.to_string())
    }
}

impl From<serde_json::Error> for AmberError {
    fn from(e: serde_json::Error) -> Self {
        AmberError::Config(e.to_string())
    }
}

/// Result type alias using AmberError.
pub type Result<T> = std::result::Result<T, AmberError>;
