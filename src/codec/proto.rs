//! Protobuf codec using `prost`.
//!
//! Records are proto2 messages. Encoding checks that the result fits behind
//! the 2-byte length prefix used on the wire, so a record accepted here can
//! always be framed into a datagram.

use bytes::Bytes;
use prost::Message;

use crate::error::{AmberError, Result};
use crate::protocol::MAX_RECORD_SIZE;

/// Protobuf codec for single records.
pub struct ProtoCodec;

impl ProtoCodec {
    /// Encode a record to protobuf bytes.
    ///
    /// # Errors
    ///
    /// Returns [`AmberError::RecordTooLarge`] if the record cannot be
    /// length-prefixed.
    #[inline]
    pub fn encode<M: Message>(value: &M) -> Result<Bytes> {
        let len = value.encoded_len();
        if len > MAX_RECORD_SIZE {
            return Err(AmberError::RecordTooLarge {
                len,
                max: MAX_RECORD_SIZE,
            });
        }
        Ok(Bytes::from(value.encode_to_vec()))
    }

    /// Decode protobuf bytes to a record.
    ///
    /// # Errors
    ///
    /// Returns [`AmberError::MalformedPacket`] if the bytes are not a valid
    /// encoding of `M`.
    #[inline]
    pub fn decode<M: Message + Default>(bytes: &[u8]) -> Result<M> {
        Ok(M::decode(bytes)?)
    }
}
