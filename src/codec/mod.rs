//! Codec module - serialization/deserialization for single records.
//!
//! - [`ProtoCodec`] - protobuf records using `prost`
//!
//! # Design
//!
//! The codec is a marker struct with static methods rather than a trait object,
//! matching how records are selected at compile time by their Rust type.
//!
//! # Example
//!
//! ```
//! use amber_client::codec::ProtoCodec;
//! use amber_client::protocol::DriverMsg;
//!
//! let encoded = ProtoCodec::encode(&DriverMsg::ping(7)).unwrap();
//! let decoded: DriverMsg = ProtoCodec::decode(&encoded).unwrap();
//! assert_eq!(decoded.syn_num, Some(7));
//! ```

mod proto;

pub use proto::ProtoCodec;
