//! Dummy device client - pings and subscribes to the mediator's dummy driver.
//!
//! This example demonstrates:
//! - Connecting a client with the builder
//! - Registering a device proxy
//! - Sending PING and SUBSCRIBE/UNSUBSCRIBE messages
//! - Terminating the client on Ctrl-C
//!
//! # Running
//!
//! ```text
//! RUST_LOG=info cargo run --example dummy -- 192.168.1.10
//! ```

use std::sync::atomic::{AtomicU32, Ordering};
use std::sync::Arc;
use std::time::Duration;

use amber_client::protocol::{DriverHdr, DriverMsg, MsgType, Packet};
use amber_client::{AmberClient, DeviceProxy};
use tracing_subscriber::EnvFilter;

/// Device type of the mediator's dummy driver.
const DUMMY_DEVICE_TYPE: u32 = 1;

/// Proxy that logs everything the dummy driver sends.
struct DummyProxy {
    device_id: u32,
    pongs: AtomicU32,
}

impl DeviceProxy for DummyProxy {
    fn device_type(&self) -> u32 {
        DUMMY_DEVICE_TYPE
    }

    fn device_id(&self) -> u32 {
        self.device_id
    }

    fn handle_data(&self, packet: &Packet) {
        tracing::info!(
            "Dummy data: {:?} ({} raw bytes)",
            packet.message,
            packet.message_bytes().len()
        );
    }

    fn handle_pong(&self, packet: &Packet) {
        let count = self.pongs.fetch_add(1, Ordering::Relaxed) + 1;
        tracing::info!("Dummy PONG #{} (ack={:?})", count, packet.message.ack_num);
    }

    fn handle_driver_died(&self, _packet: &Packet) {
        tracing::warn!("Dummy driver died");
    }

    fn terminate_proxy(&self) {
        tracing::info!(
            "Dummy proxy terminated after {} PONGs",
            self.pongs.load(Ordering::Relaxed)
        );
    }
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let hostname = std::env::args()
        .nth(1)
        .unwrap_or_else(|| "127.0.0.1".to_string());

    let client = AmberClient::builder(hostname).connect().await?;
    client.register_proxy(Arc::new(DummyProxy {
        device_id: 0,
        pongs: AtomicU32::new(0),
    }));

    let header = DriverHdr::for_device(DUMMY_DEVICE_TYPE, 0);
    client.send(&header, &DriverMsg::ping(1)).await?;
    client
        .send(&header, &DriverMsg::new(MsgType::Subscribe))
        .await?;

    tokio::select! {
        _ = tokio::signal::ctrl_c() => tracing::info!("Interrupted"),
        _ = tokio::time::sleep(Duration::from_secs(6)) => {
            client
                .send(&header, &DriverMsg::new(MsgType::Unsubscribe))
                .await?;
            tokio::time::sleep(Duration::from_secs(3)).await;
        }
        _ = client.wait_for_shutdown() => tracing::warn!("Receive loop exited"),
    }

    client.terminate().await;
    tracing::info!("Stats: {:?}", client.stats());

    Ok(())
}
