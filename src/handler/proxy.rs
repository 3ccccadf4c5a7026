//! Device proxy capability interface.
//!
//! A proxy is the client-side handle of one remote device. The client never
//! looks inside a proxy; it only calls the methods below from its receive
//! loop, and [`DeviceProxy::terminate_proxy`] once during termination.
//!
//! # Example
//!
//! ```
//! use amber_client::handler::DeviceProxy;
//! use amber_client::protocol::Packet;
//!
//! struct Lamp;
//!
//! impl DeviceProxy for Lamp {
//!     fn device_type(&self) -> u32 { 7 }
//!     fn device_id(&self) -> u32 { 0 }
//!
//!     fn handle_data(&self, packet: &Packet) {
//!         println!("lamp data: {:?}", packet.message);
//!     }
//! }
//! ```

use crate::protocol::{DeviceKey, Packet};

/// Handler for messages addressed to one device.
///
/// Methods run on the receive loop task and should return quickly; a proxy
/// that needs to do real work should hand the packet off to its own task.
pub trait DeviceProxy: Send + Sync + 'static {
    /// Device type this proxy serves.
    fn device_type(&self) -> u32;

    /// Device instance this proxy serves.
    fn device_id(&self) -> u32;

    /// Handle a `DATA` message.
    fn handle_data(&self, packet: &Packet);

    /// Handle a `PING` message.
    fn handle_ping(&self, packet: &Packet) {
        tracing::debug!(
            "PING for {} ignored by proxy (syn={:?})",
            self.device_key(),
            packet.message.syn_num
        );
    }

    /// Handle a `PONG` message.
    fn handle_pong(&self, packet: &Packet) {
        tracing::debug!(
            "PONG for {} ignored by proxy (ack={:?})",
            self.device_key(),
            packet.message.ack_num
        );
    }

    /// Handle a `DRIVER_DIED` message.
    fn handle_driver_died(&self, _packet: &Packet) {
        tracing::debug!("DRIVER_DIED for {} ignored by proxy", self.device_key());
    }

    /// Called once when the owning client terminates.
    fn terminate_proxy(&self) {}

    /// Registry key for this proxy.
    fn device_key(&self) -> DeviceKey {
        DeviceKey::new(self.device_type(), self.device_id())
    }
}
