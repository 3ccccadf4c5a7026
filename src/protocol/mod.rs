//! Protocol module - records, wire format, and decoded packets.
//!
//! This module implements the mediator datagram protocol:
//! - `DriverHdr` / `DriverMsg` protobuf records
//! - Two-record length-prefixed datagram encoding/decoding
//! - `Packet` with the client/device addressing rule

mod messages;
mod packet;
mod wire_format;

pub use messages::{DriverHdr, DriverMsg, MsgType};
pub use packet::{DeviceKey, Packet, Target};
pub use wire_format::{
    decode_packet, encode_packet, DEFAULT_PORT, DEFAULT_RECV_BUFFER_SIZE, LENGTH_PREFIX_SIZE,
    MAX_RECORD_SIZE,
};
