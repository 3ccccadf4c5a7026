//! Transport module - datagram socket handling.
//!
//! Provides a connectionless UDP transport whose close doubles as the
//! cancellation signal for a pending receive.

mod udp;

pub use udp::{resolve_remote, unspecified_bind_addr, DatagramTransport};
