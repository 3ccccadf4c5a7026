//! Datagram wire format encoding and decoding.
//!
//! Every datagram carries two length-prefixed protobuf records:
//! ```text
//! ┌───────────┬──────────────┬───────────┬───────────────┐
//! │ Hdr len   │ DriverHdr    │ Msg len   │ DriverMsg     │
//! │ uint16 BE │ len bytes    │ uint16 BE │ len bytes     │
//! └───────────┴──────────────┴───────────┴───────────────┘
//! ```
//!
//! Bytes after the message region are ignored.

use bytes::{BufMut, Bytes, BytesMut};
use prost::Message;

use super::messages::{has_msg_type, DriverHdr, DriverMsg};
use super::packet::Packet;
use crate::codec::ProtoCodec;
use crate::error::{AmberError, Result};

/// Size of each length prefix in bytes.
pub const LENGTH_PREFIX_SIZE: usize = 2;

/// Largest record a length prefix can describe.
pub const MAX_RECORD_SIZE: usize = u16::MAX as usize;

/// Default mediator port.
pub const DEFAULT_PORT: u16 = 26233;

/// Default receive buffer size.
pub const DEFAULT_RECV_BUFFER_SIZE: usize = 4096;

/// Encode a header and message into one datagram.
///
/// The message is generic so device proxies can send their own message
/// types carrying extension fields.
///
/// # Example
///
/// ```
/// use amber_client::protocol::{encode_packet, DriverHdr, DriverMsg};
///
/// let datagram = encode_packet(&DriverHdr::for_device(5, 2), &DriverMsg::ping(1)).unwrap();
/// assert_eq!(&datagram[..2], &[0x00, 0x04]);
/// ```
pub fn encode_packet<M: Message>(header: &DriverHdr, message: &M) -> Result<Bytes> {
    let header_bytes = ProtoCodec::encode(header)?;
    let message_bytes = ProtoCodec::encode(message)?;

    let mut buf = BytesMut::with_capacity(
        LENGTH_PREFIX_SIZE * 2 + header_bytes.len() + message_bytes.len(),
    );
    put_record(&mut buf, &header_bytes);
    put_record(&mut buf, &message_bytes);

    Ok(buf.freeze())
}

/// Write one record behind its length prefix.
///
/// `ProtoCodec::encode` bounds every record to `MAX_RECORD_SIZE`, so the
/// length always fits the prefix.
fn put_record(buf: &mut BytesMut, record: &[u8]) {
    buf.put_u16(record.len() as u16);
    buf.put_slice(record);
}

/// Decode a datagram into a [`Packet`].
///
/// Returns [`AmberError::MalformedPacket`] when a length prefix is missing,
/// a declared length runs past the end of the buffer, or a record fails to
/// parse, including a message record without its required `type` field.
/// Never reads outside the declared bounds.
pub fn decode_packet(datagram: &[u8]) -> Result<Packet> {
    let (header_bytes, rest) = split_record(datagram, "header")?;
    let (message_bytes, _trailing) = split_record(rest, "message")?;

    let header = DriverHdr::decode(header_bytes)
        .map_err(|e| AmberError::MalformedPacket(format!("invalid header record: {}", e)))?;
    let message = DriverMsg::decode(message_bytes)
        .map_err(|e| AmberError::MalformedPacket(format!("invalid message record: {}", e)))?;
    if !has_msg_type(message_bytes)
        .map_err(|e| AmberError::MalformedPacket(format!("invalid message record: {}", e)))?
    {
        return Err(AmberError::MalformedPacket(
            "invalid message record: missing required field type".to_string(),
        ));
    }

    Ok(Packet::from_parts(
        header,
        message,
        Bytes::copy_from_slice(message_bytes),
    ))
}

/// Split one length-prefixed record off the front of `buf`.
fn split_record<'a>(buf: &'a [u8], what: &str) -> Result<(&'a [u8], &'a [u8])> {
    let prefix = buf.get(..LENGTH_PREFIX_SIZE).ok_or_else(|| {
        AmberError::MalformedPacket(format!(
            "{} length prefix truncated: {} bytes available",
            what,
            buf.len()
        ))
    })?;
    let len = u16::from_be_bytes([prefix[0], prefix[1]]) as usize;

    let body = &buf[LENGTH_PREFIX_SIZE..];
    if len > body.len() {
        return Err(AmberError::MalformedPacket(format!(
            "{} length {} exceeds remaining {} bytes",
            what,
            len,
            body.len()
        )));
    }

    Ok(body.split_at(len))
}
