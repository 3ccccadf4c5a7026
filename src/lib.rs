//! # amber-client
//!
//! Rust client for the Amber mediator datagram protocol.
//!
//! A control program talks to a robot's mediator over UDP. Every datagram
//! carries two length-prefixed protobuf records, a `DriverHdr` naming the
//! target device and a `DriverMsg` with the payload.
//!
//! ## Architecture
//!
//! - **Send path**: caller → [`AmberClient::send`] → wire encoding → one datagram
//! - **Receive path**: one background task reads datagrams, decodes them and
//!   routes each to client-level handling or to the registered
//!   [`DeviceProxy`](handler::DeviceProxy) for `(device_type, device_id)`
//!
//! ## Example
//!
//! ```ignore
//! use amber_client::AmberClient;
//! use amber_client::protocol::{DriverHdr, DriverMsg};
//!
//! #[tokio::main]
//! async fn main() {
//!     let client = AmberClient::connect("127.0.0.1", 26233).await.unwrap();
//!
//!     client.register_proxy(my_proxy);
//!     client
//!         .send(&DriverHdr::for_device(5, 2), &DriverMsg::ping(1))
//!         .await
//!         .unwrap();
//!
//!     client.terminate().await;
//! }
//! ```

pub mod codec;
pub mod config;
pub mod error;
pub mod handler;
pub mod protocol;
pub mod transport;

mod client;
mod stats;

pub use client::{AmberClient, ClientBuilder};
pub use config::ClientConfig;
pub use error::{AmberError, Result};
pub use handler::DeviceProxy;
pub use stats::ClientStats;
