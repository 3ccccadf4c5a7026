//! Integration tests for amber-client.
//!
//! These tests verify the integration between the codec, wire format and
//! packet addressing without a socket.

use amber_client::codec::ProtoCodec;
use amber_client::protocol::{
    decode_packet, encode_packet, DeviceKey, DriverHdr, DriverMsg, MsgType, Target,
    LENGTH_PREFIX_SIZE,
};
use amber_client::AmberError;

/// Test a hand-assembled datagram decodes to the expected packet.
#[test]
fn test_decode_hand_built_datagram() {
    let datagram: &[u8] = &[
        0x00, 0x04, // header length
        0x08, 0x05, 0x10, 0x02, // device_type=5, device_id=2
        0x00, 0x04, // message length
        0x10, 0x03, 0x20, 0x09, // type=PONG, ack_num=9
    ];

    let packet = decode_packet(datagram).unwrap();

    assert_eq!(packet.header, DriverHdr::for_device(5, 2));
    assert_eq!(packet.msg_type(), Some(MsgType::Pong));
    assert_eq!(packet.message.ack_num, Some(9));
    assert_eq!(packet.target(), Target::Device(DeviceKey::new(5, 2)));
    assert_eq!(packet.message_bytes().as_ref(), &datagram[8..]);
}

/// Test encode output is byte-compatible with independently encoded records.
#[test]
fn test_encode_matches_record_codec() {
    let header = DriverHdr {
        client_ids: vec![1, 300],
        ..DriverHdr::for_device(12, 4)
    };
    let message = DriverMsg::data(Some(77));

    let datagram = encode_packet(&header, &message).unwrap();

    let header_bytes = ProtoCodec::encode(&header).unwrap();
    let message_bytes = ProtoCodec::encode(&message).unwrap();

    let mut expected = Vec::new();
    expected.extend((header_bytes.len() as u16).to_be_bytes());
    expected.extend_from_slice(&header_bytes);
    expected.extend((message_bytes.len() as u16).to_be_bytes());
    expected.extend_from_slice(&message_bytes);

    assert_eq!(datagram.as_ref(), expected.as_slice());
    assert_eq!(
        datagram.len(),
        LENGTH_PREFIX_SIZE * 2 + header_bytes.len() + message_bytes.len()
    );
}

/// Test a device extension message survives the datagram and decodes from the packet.
#[test]
fn test_extension_message_through_datagram() {
    #[derive(Clone, PartialEq, prost::Message)]
    struct ArmMsg {
        #[prost(enumeration = "MsgType", required, tag = "2")]
        r#type: i32,
        #[prost(sint32, repeated, packed = "false", tag = "10")]
        joints: Vec<i32>,
    }

    let arm = ArmMsg {
        r#type: MsgType::Data as i32,
        joints: vec![-90, 0, 45],
    };
    let datagram = encode_packet(&DriverHdr::for_device(5, 0), &arm).unwrap();

    let packet = decode_packet(&datagram).unwrap();
    assert_eq!(packet.msg_type(), Some(MsgType::Data));

    let decoded: ArmMsg = packet.decode_message().unwrap();
    assert_eq!(decoded, arm);
}

/// Test addressing over decoded datagrams rather than in-memory headers.
#[test]
fn test_addressing_after_decode() {
    let cases = [
        (DriverHdr::for_mediator(), Target::Client),
        (DriverHdr::for_device(0, 9), Target::Client),
        (
            DriverHdr {
                device_type: Some(4),
                ..Default::default()
            },
            Target::Client,
        ),
        (
            DriverHdr::for_device(4, 0),
            Target::Device(DeviceKey::new(4, 0)),
        ),
    ];

    for (header, expected) in cases {
        let datagram = encode_packet(&header, &DriverMsg::ping(1)).unwrap();
        let packet = decode_packet(&datagram).unwrap();
        assert_eq!(packet.target(), expected, "header {:?}", header);
    }
}

/// Test an empty header record decodes as client-directed.
#[test]
fn test_empty_header_record() {
    let datagram: &[u8] = &[0x00, 0x00, 0x00, 0x04, 0x10, 0x02, 0x18, 0x01];

    let packet = decode_packet(datagram).unwrap();
    assert_eq!(packet.header, DriverHdr::for_mediator());
    assert_eq!(packet.target(), Target::Client);
    assert_eq!(packet.msg_type(), Some(MsgType::Ping));
    assert_eq!(packet.message.syn_num, Some(1));
}

/// Test a record body that is not valid protobuf is rejected.
#[test]
fn test_garbage_record_rejected() {
    let datagram: &[u8] = &[0x00, 0x02, 0xFF, 0xFF, 0x00, 0x00];

    let err = decode_packet(datagram).unwrap_err();
    assert!(matches!(err, AmberError::MalformedPacket(_)));
}
