//! Handler module - device proxies and packet dispatch.
//!
//! Provides:
//! - [`DeviceProxy`] - capability interface every device handler implements
//! - [`ProxyRegistry`] - maps `(device_type, device_id)` to proxies
//! - [`dispatch_packet`] - the client/device routing rule
//!
//! # Example
//!
//! ```ignore
//! use amber_client::handler::{dispatch_packet, ProxyRegistry};
//!
//! let registry = ProxyRegistry::new();
//! registry.register(5, 2, Arc::new(arm_proxy));
//!
//! let packet = decode_packet(&datagram)?;
//! dispatch_packet(&registry, &packet);
//! ```

mod dispatch;
mod proxy;
mod registry;

pub use dispatch::{dispatch_packet, dispatch_to_proxy, handle_client_message, DispatchOutcome};
pub use proxy::DeviceProxy;
pub use registry::ProxyRegistry;
