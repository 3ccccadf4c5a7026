//! Connectionless UDP transport with explicit close.
//!
//! Closing the transport is the cancellation signal for a pending receive:
//! [`DatagramTransport::close`] takes the socket out of the transport, sets
//! the closed flag and wakes every task blocked in
//! [`DatagramTransport::recv`], which then returns
//! [`AmberError::TransportClosed`]. The descriptor is released once the last
//! in-flight operation drops its handle.
//!
//! # Example
//!
//! ```ignore
//! use amber_client::transport::DatagramTransport;
//!
//! let transport = DatagramTransport::bind(remote, bind_addr).await?;
//! transport.send(&datagram).await?;
//! let (n, from) = transport.recv(&mut buf).await?;
//! transport.close();
//! ```

use std::net::{IpAddr, Ipv4Addr, Ipv6Addr, SocketAddr};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, PoisonError, RwLock};

use tokio::net::{lookup_host, UdpSocket};
use tokio::sync::Notify;

use crate::error::{AmberError, Result};

/// Resolve `(host, port)` to the first socket address.
pub async fn resolve_remote(host: &str, port: u16) -> Result<SocketAddr> {
    lookup_host((host, port))
        .await?
        .next()
        .ok_or_else(|| AmberError::AddressResolution(format!("{}:{}", host, port)))
}

/// Wildcard bind address in the same family as `remote`, ephemeral port.
pub fn unspecified_bind_addr(remote: &SocketAddr) -> SocketAddr {
    let ip = match remote {
        SocketAddr::V4(_) => IpAddr::V4(Ipv4Addr::UNSPECIFIED),
        SocketAddr::V6(_) => IpAddr::V6(Ipv6Addr::UNSPECIFIED),
    };
    SocketAddr::new(ip, 0)
}

/// A UDP socket bound locally and aimed at one remote endpoint.
pub struct DatagramTransport {
    /// Socket, `None` once closed.
    socket: RwLock<Option<Arc<UdpSocket>>>,
    /// Destination for every send.
    remote: SocketAddr,
    /// Address the socket is bound to.
    local: SocketAddr,
    /// Set exactly once by `close`.
    closed: AtomicBool,
    /// Wakes receivers blocked when `close` runs.
    shutdown: Notify,
}

impl DatagramTransport {
    /// Bind a socket on `bind_addr` that sends to `remote`.
    ///
    /// No handshake takes place; the transport is usable immediately.
    pub async fn bind(remote: SocketAddr, bind_addr: SocketAddr) -> Result<Self> {
        let socket = UdpSocket::bind(bind_addr).await?;
        let local = socket.local_addr()?;

        tracing::debug!("UDP socket bound to {} for mediator {}", local, remote);

        Ok(Self {
            socket: RwLock::new(Some(Arc::new(socket))),
            remote,
            local,
            closed: AtomicBool::new(false),
            shutdown: Notify::new(),
        })
    }

    /// Remote endpoint datagrams are sent to.
    #[inline]
    pub fn remote_addr(&self) -> SocketAddr {
        self.remote
    }

    /// Local address the socket is bound to.
    #[inline]
    pub fn local_addr(&self) -> SocketAddr {
        self.local
    }

    /// Check if the transport has been closed.
    #[inline]
    pub fn is_closed(&self) -> bool {
        self.closed.load(Ordering::Acquire)
    }

    fn socket(&self) -> Result<Arc<UdpSocket>> {
        self.socket
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
            .ok_or(AmberError::TransportClosed)
    }

    /// Send one datagram to the remote endpoint.
    pub async fn send(&self, datagram: &[u8]) -> Result<usize> {
        let socket = self.socket()?;
        Ok(socket.send_to(datagram, self.remote).await?)
    }

    /// Receive one datagram into `buf`.
    ///
    /// Blocks until a datagram arrives or the transport is closed. A datagram
    /// larger than `buf` is truncated by the OS.
    ///
    /// # Errors
    ///
    /// - [`AmberError::TransportClosed`] if the transport was closed before
    ///   or during the receive.
    /// - [`AmberError::Transport`] for any other socket failure.
    pub async fn recv(&self, buf: &mut [u8]) -> Result<(usize, SocketAddr)> {
        let notified = self.shutdown.notified();
        tokio::pin!(notified);
        // Register interest before checking the flag so a concurrent close
        // cannot slip between the check and the wait.
        notified.as_mut().enable();

        if self.is_closed() {
            return Err(AmberError::TransportClosed);
        }
        let socket = self.socket()?;

        tokio::select! {
            biased;
            _ = &mut notified => Err(AmberError::TransportClosed),
            result = socket.recv_from(buf) => match result {
                Ok(received) => Ok(received),
                Err(_) if self.is_closed() => Err(AmberError::TransportClosed),
                Err(e) => Err(AmberError::Transport(e)),
            },
        }
    }

    /// Close the transport, cancelling any pending receive.
    ///
    /// Returns `true` on the call that actually closed it; later calls are
    /// no-ops returning `false`.
    pub fn close(&self) -> bool {
        if self.closed.swap(true, Ordering::AcqRel) {
            return false;
        }

        let socket = self
            .socket
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .take();
        drop(socket);

        self.shutdown.notify_waiters();
        tracing::debug!("UDP socket {} closed", self.local);
        true
    }
}

impl Drop for DatagramTransport {
    fn drop(&mut self) {
        self.close();
    }
}
