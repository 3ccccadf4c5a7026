//! Driver header and message records.
//!
//! These mirror the mediator's `drivermsg.proto` (proto2) schema:
//!
//! ```text
//! message DriverHdr {
//!     optional int32 deviceType = 1;
//!     optional int32 deviceID = 2;
//!     repeated int32 clientIDs = 3;
//! }
//!
//! message DriverMsg {
//!     required MsgType type = 2;
//!     optional uint32 synNum = 3;
//!     optional uint32 ackNum = 4;
//!     optional uint32 listenerNum = 5;
//!     extensions 10 to max;
//! }
//! ```
//!
//! The structs are written by hand with `prost` derives instead of being
//! generated by a build script, so no `protoc` is needed to build the crate.
//! Device identifiers are non-negative on the wire, which makes the `uint32`
//! varint encoding byte-identical to the mediator's `int32`.

use std::fmt;

/// Header record: which device a datagram is addressed to.
#[derive(Clone, PartialEq, prost::Message)]
pub struct DriverHdr {
    /// Device type, absent for mediator-level traffic.
    #[prost(uint32, optional, tag = "1")]
    pub device_type: Option<u32>,
    /// Device instance within its type.
    #[prost(uint32, optional, tag = "2")]
    pub device_id: Option<u32>,
    /// Clients the mediator routes this message to or from.
    #[prost(uint32, repeated, packed = "false", tag = "3")]
    pub client_ids: Vec<u32>,
}

impl DriverHdr {
    /// Header addressed to a specific device.
    pub fn for_device(device_type: u32, device_id: u32) -> Self {
        Self {
            device_type: Some(device_type),
            device_id: Some(device_id),
            client_ids: Vec::new(),
        }
    }

    /// Header addressed to the mediator itself (no device fields).
    pub fn for_mediator() -> Self {
        Self::default()
    }
}

/// Message record: type discriminant plus sequencing numbers.
///
/// Device-specific payloads travel as protobuf extensions (tags 10 and up).
/// They are not modelled here; proxies decode them from
/// [`Packet::message_bytes`](super::Packet::message_bytes).
#[derive(Clone, PartialEq, prost::Message)]
pub struct DriverMsg {
    /// Raw [`MsgType`] value. Kept as `i32` so unknown values survive decoding.
    #[prost(enumeration = "MsgType", required, tag = "2")]
    pub r#type: i32,
    /// Sequence number of a request.
    #[prost(uint32, optional, tag = "3")]
    pub syn_num: Option<u32>,
    /// Sequence number being acknowledged.
    #[prost(uint32, optional, tag = "4")]
    pub ack_num: Option<u32>,
    /// Listener subscription number.
    #[prost(uint32, optional, tag = "5")]
    pub listener_num: Option<u32>,
}

impl DriverMsg {
    /// Message of the given type with no sequencing fields.
    pub fn new(msg_type: MsgType) -> Self {
        Self {
            r#type: msg_type as i32,
            ..Default::default()
        }
    }

    /// DATA message carrying an optional request number.
    pub fn data(syn_num: Option<u32>) -> Self {
        Self {
            syn_num,
            ..Self::new(MsgType::Data)
        }
    }

    /// PING with the sequence number the PONG should acknowledge.
    pub fn ping(syn_num: u32) -> Self {
        Self {
            syn_num: Some(syn_num),
            ..Self::new(MsgType::Ping)
        }
    }

    /// PONG acknowledging a PING.
    pub fn pong(ack_num: u32) -> Self {
        Self {
            ack_num: Some(ack_num),
            ..Self::new(MsgType::Pong)
        }
    }

    /// Decoded message type, `None` when the discriminant is not a known variant.
    #[inline]
    pub fn msg_type(&self) -> Option<MsgType> {
        MsgType::try_from(self.r#type).ok()
    }
}

/// Presence view of the `type` field.
///
/// prost fills a missing proto2 `required` field with its default, so
/// presence is read separately through an `optional` field on the same tag.
#[derive(Clone, PartialEq, prost::Message)]
struct TypePresence {
    #[prost(int32, optional, tag = "2")]
    r#type: Option<i32>,
}

/// Check that an encoded `DriverMsg` carries its required `type` field.
pub(crate) fn has_msg_type(bytes: &[u8]) -> Result<bool, prost::DecodeError> {
    use prost::Message;

    Ok(TypePresence::decode(bytes)?.r#type.is_some())
}

/// Message type discriminant.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, prost::Enumeration)]
#[repr(i32)]
pub enum MsgType {
    Data = 1,
    Ping = 2,
    Pong = 3,
    ClientDied = 4,
    DriverDied = 5,
    Subscribe = 6,
    Unsubscribe = 7,
}

impl MsgType {
    /// Protocol name of the variant.
    pub fn as_str(&self) -> &'static str {
        match self {
            MsgType::Data => "DATA",
            MsgType::Ping => "PING",
            MsgType::Pong => "PONG",
            MsgType::ClientDied => "CLIENT_DIED",
            MsgType::DriverDied => "DRIVER_DIED",
            MsgType::Subscribe => "SUBSCRIBE",
            MsgType::Unsubscribe => "UNSUBSCRIBE",
        }
    }
}

impl fmt::Display for MsgType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use prost::Message;

    #[test]
    fn test_for_device_sets_both_fields() {
        let header = DriverHdr::for_device(5, 2);
        assert_eq!(header.device_type, Some(5));
        assert_eq!(header.device_id, Some(2));
        assert!(header.client_ids.is_empty());
    }

    #[test]
    fn test_for_mediator_is_empty() {
        let header = DriverHdr::for_mediator();
        assert_eq!(header.device_type, None);
        assert_eq!(header.device_id, None);
        assert_eq!(header.encoded_len(), 0);
    }

    #[test]
    fn test_header_field_tags() {
        // deviceType=5 (tag 1, varint), deviceID=2 (tag 2, varint)
        let bytes = DriverHdr::for_device(5, 2).encode_to_vec();
        assert_eq!(bytes, vec![0x08, 0x05, 0x10, 0x02]);
    }

    #[test]
    fn test_client_ids_are_unpacked() {
        let header = DriverHdr {
            client_ids: vec![7, 9],
            ..Default::default()
        };
        assert_eq!(header.encode_to_vec(), vec![0x18, 0x07, 0x18, 0x09]);
    }

    #[test]
    fn test_message_type_tag() {
        // type=PING (tag 2, varint 2), synNum=1 (tag 3)
        let bytes = DriverMsg::ping(1).encode_to_vec();
        assert_eq!(bytes, vec![0x10, 0x02, 0x18, 0x01]);
    }

    #[test]
    fn test_constructors() {
        assert_eq!(DriverMsg::data(None).msg_type(), Some(MsgType::Data));
        assert_eq!(DriverMsg::ping(3).syn_num, Some(3));
        assert_eq!(DriverMsg::pong(3).ack_num, Some(3));
        assert_eq!(
            DriverMsg::new(MsgType::DriverDied).msg_type(),
            Some(MsgType::DriverDied)
        );
    }

    #[test]
    fn test_unknown_type_preserved() {
        let msg = DriverMsg {
            r#type: 42,
            ..Default::default()
        };
        let decoded = DriverMsg::decode(msg.encode_to_vec().as_slice()).unwrap();
        assert_eq!(decoded.r#type, 42);
        assert_eq!(decoded.msg_type(), None);
    }

    #[test]
    fn test_type_presence() {
        assert!(has_msg_type(&DriverMsg::ping(1).encode_to_vec()).unwrap());
        assert!(!has_msg_type(&[]).unwrap());
        // synNum only
        assert!(!has_msg_type(&[0x18, 0x01]).unwrap());
    }

    #[test]
    fn test_display_names() {
        assert_eq!(MsgType::DriverDied.to_string(), "DRIVER_DIED");
        assert_eq!(MsgType::Ping.to_string(), "PING");
    }
}
