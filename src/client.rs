//! Client builder and receive loop.
//!
//! The [`ClientBuilder`] collects configuration and connects. The
//! [`AmberClient`] manages the lifecycle:
//! 1. Resolve the mediator address and bind a UDP socket
//! 2. Spawn the receive loop
//! 3. Decode datagrams and dispatch them to proxies
//! 4. On `terminate`, notify proxies, close the socket and join the loop
//!
//! There is no process-wide shutdown hook. The caller owns the client and
//! calls [`AmberClient::terminate`]; `AmberClient` is cheaply cloneable so a
//! handle can be moved into whatever drives the program's shutdown.
//!
//! # Example
//!
//! ```ignore
//! use amber_client::{AmberClient, protocol::{DriverHdr, DriverMsg}};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let client = AmberClient::builder("192.168.1.10")
//!         .port(26233)
//!         .connect()
//!         .await?;
//!
//!     client.register_device(5, 2, arm_proxy.clone());
//!     client.send(&DriverHdr::for_device(5, 2), &DriverMsg::ping(1)).await?;
//!
//!     tokio::signal::ctrl_c().await?;
//!     client.terminate().await;
//!     Ok(())
//! }
//! ```

use std::any::Any;
use std::net::SocketAddr;
use std::panic::{self, AssertUnwindSafe};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex, PoisonError};
use std::time::Duration;

use prost::Message;
use tokio::sync::watch;
use tokio::task::JoinHandle;

use crate::config::ClientConfig;
use crate::error::{AmberError, Result};
use crate::handler::{dispatch_packet, DeviceProxy, ProxyRegistry};
use crate::protocol::{decode_packet, encode_packet, DriverHdr};
use crate::stats::{ClientStats, StatsCounters};
use crate::transport::{resolve_remote, unspecified_bind_addr, DatagramTransport};

/// Builder for configuring and connecting an [`AmberClient`].
pub struct ClientBuilder {
    config: ClientConfig,
}

impl ClientBuilder {
    /// Create a builder for a mediator at `hostname` on the default port.
    pub fn new(hostname: impl Into<String>) -> Self {
        Self {
            config: ClientConfig::new(hostname),
        }
    }

    /// Create a builder from an existing configuration.
    pub fn from_config(config: ClientConfig) -> Self {
        Self { config }
    }

    /// Set the mediator port.
    ///
    /// Default: 26233
    pub fn port(mut self, port: u16) -> Self {
        self.config.port = port;
        self
    }

    /// Set the local bind address.
    ///
    /// Default: wildcard address of the mediator's family, ephemeral port.
    pub fn bind_addr(mut self, addr: SocketAddr) -> Self {
        self.config.bind_addr = Some(addr);
        self
    }

    /// Set the receive buffer size.
    ///
    /// Default: 4096
    pub fn recv_buffer_size(mut self, size: usize) -> Self {
        self.config.recv_buffer_size = size;
        self
    }

    /// Set how long `terminate` waits for the receive loop to exit.
    ///
    /// Default: 1 second
    pub fn terminate_timeout(mut self, timeout: Duration) -> Self {
        self.config.terminate_timeout_ms = u64::try_from(timeout.as_millis()).unwrap_or(u64::MAX);
        self
    }

    /// Open the socket and start the receive loop.
    ///
    /// No handshake is performed; the returned client is ready to send.
    pub async fn connect(self) -> Result<AmberClient> {
        AmberClient::start(self.config).await
    }
}

/// State shared between the client handles and the receive loop.
struct Shared {
    registry: ProxyRegistry,
    stats: StatsCounters,
    /// Receive loop should keep running.
    alive: AtomicBool,
    /// Flipped to `true` when the receive loop has exited.
    exited: watch::Sender<bool>,
}

impl Shared {
    fn new() -> Self {
        let (exited, _) = watch::channel(false);
        Self {
            registry: ProxyRegistry::new(),
            stats: StatsCounters::default(),
            alive: AtomicBool::new(true),
            exited,
        }
    }
}

/// Marks the receive loop as exited when dropped, whichever way it ends.
struct LoopExit<'a>(&'a Shared);

impl Drop for LoopExit<'_> {
    fn drop(&mut self) {
        self.0.alive.store(false, Ordering::Release);
        self.0.exited.send_replace(true);
    }
}

struct ClientInner {
    transport: Arc<DatagramTransport>,
    shared: Arc<Shared>,
    terminated: AtomicBool,
    terminate_timeout: Duration,
    receiver: Mutex<Option<JoinHandle<()>>>,
}

impl Drop for ClientInner {
    fn drop(&mut self) {
        // Last handle gone without terminate: stop the loop, skip proxy teardown.
        if !self.terminated.load(Ordering::Acquire) {
            self.shared.alive.store(false, Ordering::Release);
            self.transport.close();
        }
    }
}

/// A connected mediator client.
///
/// Cloning yields another handle to the same client.
#[derive(Clone)]
pub struct AmberClient {
    inner: Arc<ClientInner>,
}

impl AmberClient {
    /// Create a builder for a mediator at `hostname`.
    pub fn builder(hostname: impl Into<String>) -> ClientBuilder {
        ClientBuilder::new(hostname)
    }

    /// Connect to `(hostname, port)` with default settings.
    pub async fn connect(hostname: impl Into<String>, port: u16) -> Result<Self> {
        ClientBuilder::new(hostname).port(port).connect().await
    }

    async fn start(config: ClientConfig) -> Result<Self> {
        config.validate()?;

        let remote = resolve_remote(&config.hostname, config.port).await?;
        let bind_addr = config
            .bind_addr
            .unwrap_or_else(|| unspecified_bind_addr(&remote));
        let transport = Arc::new(DatagramTransport::bind(remote, bind_addr).await?);

        let shared = Arc::new(Shared::new());

        let receiver = tokio::spawn(receive_loop(
            transport.clone(),
            shared.clone(),
            config.recv_buffer_size,
        ));

        tracing::info!(
            "Client connected to mediator {} from {}",
            remote,
            transport.local_addr()
        );

        Ok(AmberClient {
            inner: Arc::new(ClientInner {
                transport,
                shared,
                terminated: AtomicBool::new(false),
                terminate_timeout: config.terminate_timeout(),
                receiver: Mutex::new(Some(receiver)),
            }),
        })
    }

    /// Register a proxy for `(device_type, device_id)`.
    ///
    /// Replaces any proxy already registered for the key. Packets for a key
    /// that has no proxy are dropped with a warning.
    pub fn register_device(&self, device_type: u32, device_id: u32, proxy: Arc<dyn DeviceProxy>) {
        let replaced = self
            .inner
            .shared
            .registry
            .register(device_type, device_id, proxy);

        if replaced.is_some() {
            tracing::debug!(
                "Replaced proxy for device type {} and device ID {}",
                device_type,
                device_id
            );
        }
    }

    /// Register a proxy under its own `device_type`/`device_id`.
    pub fn register_proxy(&self, proxy: Arc<dyn DeviceProxy>) {
        let key = proxy.device_key();
        self.register_device(key.device_type, key.device_id, proxy);
    }

    /// Remove the proxy for `(device_type, device_id)`.
    ///
    /// The client never calls this itself; it is for proxies that retire.
    pub fn unregister_device(
        &self,
        device_type: u32,
        device_id: u32,
    ) -> Option<Arc<dyn DeviceProxy>> {
        self.inner.shared.registry.unregister(device_type, device_id)
    }

    /// Send one datagram carrying `header` and `message` to the mediator.
    ///
    /// Fire-and-forget: there is no delivery or ordering guarantee. The
    /// message type is generic so proxies can send records that extend
    /// `DriverMsg` with their own payload fields.
    pub async fn send<M: Message>(&self, header: &DriverHdr, message: &M) -> Result<()> {
        tracing::info!(
            "Sending message for ({:?}: {:?}): header={:?}, message={:?}",
            header.device_type,
            header.device_id,
            header,
            message
        );

        if self.inner.terminated.load(Ordering::Acquire) {
            return Err(AmberError::TransportClosed);
        }

        let datagram = encode_packet(header, message)?;
        self.inner.transport.send(&datagram).await?;
        self.inner.shared.stats.record_sent();

        Ok(())
    }

    /// Terminate the client.
    ///
    /// The first call notifies every registered proxy, stops and closes the
    /// socket, and waits up to the configured timeout for the receive loop to
    /// exit. Later or overlapping calls return immediately.
    pub async fn terminate(&self) {
        if self.inner.terminated.swap(true, Ordering::AcqRel) {
            return;
        }

        tracing::info!("Terminate client");

        for proxy in self.inner.shared.registry.proxies() {
            tracing::debug!("Terminating proxy {}", proxy.device_key());
            proxy.terminate_proxy();
        }

        self.inner.shared.alive.store(false, Ordering::Release);
        self.inner.transport.close();

        let receiver = self
            .inner
            .receiver
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .take();

        if let Some(receiver) = receiver {
            match tokio::time::timeout(self.inner.terminate_timeout, receiver).await {
                Ok(Ok(())) => tracing::debug!("Receive loop joined"),
                Ok(Err(e)) => tracing::warn!("Receive loop task failed: {}", e),
                Err(_) => tracing::warn!(
                    "Receive loop did not exit within {:?}, continuing",
                    self.inner.terminate_timeout
                ),
            }
        }
    }

    /// Check if `terminate` has been called.
    pub fn is_terminated(&self) -> bool {
        self.inner.terminated.load(Ordering::Acquire)
    }

    /// Check if the receive loop is still running.
    ///
    /// Becomes `false` after `terminate`, or when an unexpected socket error
    /// ends the loop and the client stops receiving.
    pub fn is_alive(&self) -> bool {
        self.inner.shared.alive.load(Ordering::Acquire) && !*self.inner.shared.exited.borrow()
    }

    /// Wait until the receive loop has exited.
    pub async fn wait_for_shutdown(&self) {
        let mut exited = self.inner.shared.exited.subscribe();
        let _ = exited.wait_for(|done| *done).await;
    }

    /// Snapshot of send and receive counters.
    pub fn stats(&self) -> ClientStats {
        self.inner.shared.stats.snapshot()
    }

    /// Mediator address datagrams are sent to.
    pub fn remote_addr(&self) -> SocketAddr {
        self.inner.transport.remote_addr()
    }

    /// Local address of the client socket.
    pub fn local_addr(&self) -> SocketAddr {
        self.inner.transport.local_addr()
    }

    /// Number of registered proxies.
    pub fn proxy_count(&self) -> usize {
        self.inner.shared.registry.len()
    }
}

/// Main receive loop - reads datagrams, decodes and dispatches them.
///
/// Malformed or misaddressed datagrams are logged and skipped, and a
/// panicking proxy costs only the datagram it was handling. The loop ends
/// when the transport is closed or on any other receive error.
async fn receive_loop(transport: Arc<DatagramTransport>, shared: Arc<Shared>, buffer_size: usize) {
    let _exit = LoopExit(&*shared);
    let mut buf = vec![0u8; buffer_size];

    while shared.alive.load(Ordering::Acquire) {
        tracing::debug!("Waiting for message from mediator");

        let (n, from) = match transport.recv(&mut buf).await {
            Ok(received) => received,
            Err(AmberError::TransportClosed) => {
                tracing::debug!("Receive loop stopped by shutdown");
                break;
            }
            Err(e) => {
                tracing::error!("Receive loop error: {}", e);
                break;
            }
        };
        shared.stats.record_received();

        let packet = match decode_packet(&buf[..n]) {
            Ok(packet) => packet,
            Err(e) => {
                tracing::warn!("Dropping datagram of {} bytes from {}: {}", n, from, e);
                shared.stats.record_malformed();
                continue;
            }
        };

        tracing::debug!(
            "Received from {}: header={:?}, message={:?}",
            from,
            packet.header,
            packet.message
        );

        match panic::catch_unwind(AssertUnwindSafe(|| {
            dispatch_packet(&shared.registry, &packet)
        })) {
            Ok(outcome) => shared.stats.record_outcome(outcome),
            Err(payload) => {
                tracing::error!(
                    "Handler for {:?} panicked: {}",
                    packet.target(),
                    panic_message(payload.as_ref())
                );
                shared.stats.record_handler_panic();
            }
        }
    }
}

fn panic_message(payload: &(dyn Any + Send)) -> &str {
    if let Some(message) = payload.downcast_ref::<&str>() {
        *message
    } else if let Some(message) = payload.downcast_ref::<String>() {
        message.as_str()
    } else {
        "non-string panic payload"
    }
}
