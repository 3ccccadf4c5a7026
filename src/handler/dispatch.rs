//! Packet dispatch: client-level handling and proxy routing.
//!
//! The receive loop decodes a datagram and hands the [`Packet`] to
//! [`dispatch_packet`], which applies the addressing rule:
//!
//! ```text
//! no device_type / no device_id / device_type == 0
//!     └─► client-level handling
//!           DATA         ignored (logged)
//!           PING, PONG   handled (logged, no reply)
//!           DRIVER_DIED  ignored (logged)
//!           other        unexpected (logged)
//! otherwise
//!     └─► registry lookup (device_type, device_id)
//!           found        proxy.handle_data / handle_ping / handle_pong / handle_driver_died
//!           not found    dropped with a warning
//! ```

use super::{DeviceProxy, ProxyRegistry};
use crate::protocol::{MsgType, Packet, Target};

/// What happened to one inbound packet.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DispatchOutcome {
    /// Client-level PING or PONG, handled internally.
    ClientHandled,
    /// Client-level DATA or DRIVER_DIED, ignored.
    ClientIgnored,
    /// Delivered to a proxy capability method.
    Dispatched,
    /// No proxy registered for the addressed device; dropped.
    Unregistered,
    /// Message type without a handler; ignored.
    UnexpectedType,
}

/// Route a packet to client-level handling or to its registered proxy.
pub fn dispatch_packet(registry: &ProxyRegistry, packet: &Packet) -> DispatchOutcome {
    match packet.target() {
        Target::Client => handle_client_message(packet),
        Target::Device(key) => match registry.get(key) {
            Some(proxy) => dispatch_to_proxy(proxy.as_ref(), packet),
            None => {
                tracing::warn!(
                    "Cannot find client proxy for device type {} and device ID {}",
                    key.device_type,
                    key.device_id
                );
                DispatchOutcome::Unregistered
            }
        },
    }
}

/// Handle a packet addressed to the client itself.
pub fn handle_client_message(packet: &Packet) -> DispatchOutcome {
    match packet.msg_type() {
        Some(MsgType::Data) => {
            tracing::info!("DATA message came, but device details not set, ignoring");
            DispatchOutcome::ClientIgnored
        }
        Some(MsgType::Ping) => {
            tracing::info!("PING message came, handling");
            tracing::info!(
                "Handle PING message from ({:?}: {:?}), nothing to do",
                packet.header.device_type,
                packet.header.device_id
            );
            DispatchOutcome::ClientHandled
        }
        Some(MsgType::Pong) => {
            tracing::info!("PONG message came, handling");
            tracing::info!(
                "Handle PONG message from ({:?}: {:?}), nothing to do",
                packet.header.device_type,
                packet.header.device_id
            );
            DispatchOutcome::ClientHandled
        }
        Some(MsgType::DriverDied) => {
            tracing::info!("DRIVER_DIED message came, but device details not set, ignoring");
            DispatchOutcome::ClientIgnored
        }
        _ => {
            tracing::info!(
                "Unexpected message came: {}, ignoring",
                packet.message.r#type
            );
            DispatchOutcome::UnexpectedType
        }
    }
}

/// Call the proxy capability method matching the message type.
pub fn dispatch_to_proxy(proxy: &dyn DeviceProxy, packet: &Packet) -> DispatchOutcome {
    let key = proxy.device_key();

    match packet.msg_type() {
        Some(MsgType::Data) => {
            tracing::debug!("DATA message came for {}", key);
            proxy.handle_data(packet);
        }
        Some(MsgType::Ping) => {
            tracing::debug!("PING message came for {}", key);
            proxy.handle_ping(packet);
        }
        Some(MsgType::Pong) => {
            tracing::debug!("PONG message came for {}", key);
            proxy.handle_pong(packet);
        }
        Some(MsgType::DriverDied) => {
            tracing::info!("DRIVER_DIED message came for {}", key);
            proxy.handle_driver_died(packet);
        }
        _ => {
            tracing::info!(
                "Unexpected message came {} for {}, ignoring",
                packet.message.r#type,
                key
            );
            return DispatchOutcome::UnexpectedType;
        }
    }

    DispatchOutcome::Dispatched
}
