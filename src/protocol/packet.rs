//! Decoded datagram with addressing helpers.
//!
//! # Example
//!
//! ```
//! use amber_client::protocol::{DriverHdr, DriverMsg, Packet, Target, DeviceKey};
//!
//! let packet = Packet::new(DriverHdr::for_device(5, 2), DriverMsg::ping(1));
//! assert_eq!(packet.target(), Target::Device(DeviceKey::new(5, 2)));
//!
//! let packet = Packet::new(DriverHdr::for_mediator(), DriverMsg::ping(1));
//! assert_eq!(packet.target(), Target::Client);
//! ```

use std::fmt;

use bytes::Bytes;
use prost::Message;

use super::messages::{DriverHdr, DriverMsg, MsgType};
use crate::codec::ProtoCodec;
use crate::error::Result;

/// Registry key identifying one device: `(device_type, device_id)`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct DeviceKey {
    pub device_type: u32,
    pub device_id: u32,
}

impl DeviceKey {
    pub fn new(device_type: u32, device_id: u32) -> Self {
        Self {
            device_type,
            device_id,
        }
    }
}

impl fmt::Display for DeviceKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "({}: {})", self.device_type, self.device_id)
    }
}

/// Where an inbound datagram should be routed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Target {
    /// Addressed to the client/mediator itself.
    Client,
    /// Addressed to a registered device proxy.
    Device(DeviceKey),
}

/// A decoded datagram.
#[derive(Debug, Clone)]
pub struct Packet {
    /// Decoded header record.
    pub header: DriverHdr,
    /// Decoded message record.
    pub message: DriverMsg,
    /// Message region exactly as received (zero-copy via `bytes::Bytes`).
    message_bytes: Bytes,
}

impl Packet {
    /// Create a packet from records, encoding the message bytes.
    pub fn new(header: DriverHdr, message: DriverMsg) -> Self {
        let message_bytes = Bytes::from(message.encode_to_vec());
        Self {
            header,
            message,
            message_bytes,
        }
    }

    /// Create a packet from records and the raw message region they came from.
    pub fn from_parts(header: DriverHdr, message: DriverMsg, message_bytes: Bytes) -> Self {
        Self {
            header,
            message,
            message_bytes,
        }
    }

    /// Raw message record bytes.
    ///
    /// Device proxies decode their extension fields from these, since
    /// [`DriverMsg`] drops fields it does not know.
    #[inline]
    pub fn message_bytes(&self) -> &Bytes {
        &self.message_bytes
    }

    /// Decode the message region as a device-specific record.
    ///
    /// Use this for message types that extend [`DriverMsg`] with payload fields.
    pub fn decode_message<M: Message + Default>(&self) -> Result<M> {
        ProtoCodec::decode(&self.message_bytes)
    }

    /// Decoded message type, `None` for unknown discriminants.
    #[inline]
    pub fn msg_type(&self) -> Option<MsgType> {
        self.message.msg_type()
    }

    /// Apply the addressing rule.
    ///
    /// A header without `device_type`, without `device_id`, or with
    /// `device_type == 0` is addressed to the client.
    pub fn target(&self) -> Target {
        match (self.header.device_type, self.header.device_id) {
            (Some(device_type), Some(device_id)) if device_type != 0 => {
                Target::Device(DeviceKey::new(device_type, device_id))
            }
            _ => Target::Client,
        }
    }

    /// Check if this packet is addressed to the client.
    #[inline]
    pub fn is_client_directed(&self) -> bool {
        self.target() == Target::Client
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn header(device_type: Option<u32>, device_id: Option<u32>) -> DriverHdr {
        DriverHdr {
            device_type,
            device_id,
            client_ids: Vec::new(),
        }
    }

    #[test]
    fn test_both_fields_route_to_device() {
        let packet = Packet::new(header(Some(5), Some(2)), DriverMsg::data(None));
        assert_eq!(packet.target(), Target::Device(DeviceKey::new(5, 2)));
        assert!(!packet.is_client_directed());
    }

    #[test]
    fn test_missing_device_type_routes_to_client() {
        let packet = Packet::new(header(None, Some(2)), DriverMsg::data(None));
        assert_eq!(packet.target(), Target::Client);
    }

    #[test]
    fn test_missing_device_id_routes_to_client() {
        let packet = Packet::new(header(Some(5), None), DriverMsg::ping(1));
        assert_eq!(packet.target(), Target::Client);
    }

    #[test]
    fn test_zero_device_type_routes_to_client() {
        let packet = Packet::new(header(Some(0), Some(2)), DriverMsg::pong(1));
        assert_eq!(packet.target(), Target::Client);
    }

    #[test]
    fn test_zero_device_id_is_a_device() {
        let packet = Packet::new(header(Some(1), Some(0)), DriverMsg::pong(1));
        assert_eq!(packet.target(), Target::Device(DeviceKey::new(1, 0)));
    }

    #[test]
    fn test_addressing_independent_of_message_type() {
        for msg_type in [
            MsgType::Data,
            MsgType::Ping,
            MsgType::Pong,
            MsgType::DriverDied,
            MsgType::Subscribe,
        ] {
            let packet = Packet::new(header(None, None), DriverMsg::new(msg_type));
            assert!(packet.is_client_directed(), "{} misrouted", msg_type);
        }
    }

    #[test]
    fn test_message_bytes_match_record() {
        let packet = Packet::new(DriverHdr::for_device(1, 1), DriverMsg::ping(9));
        let decoded = DriverMsg::decode(packet.message_bytes().as_ref()).unwrap();
        assert_eq!(decoded, packet.message);
    }

    #[test]
    fn test_decode_message_typed() {
        let packet = Packet::new(DriverHdr::for_device(1, 1), DriverMsg::ping(9));
        let same: DriverMsg = packet.decode_message().unwrap();
        assert_eq!(same.syn_num, Some(9));
    }

    #[test]
    fn test_device_key_display() {
        assert_eq!(DeviceKey::new(5, 2).to_string(), "(5: 2)");
    }
}
