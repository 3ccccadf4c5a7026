//! Receive-loop and send counters.
//!
//! Counters are plain atomics updated by the receive loop and by `send`;
//! [`ClientStats`] is a point-in-time copy.

use std::sync::atomic::{AtomicU64, Ordering};

use crate::handler::DispatchOutcome;

/// Snapshot of client counters.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ClientStats {
    /// Datagrams sent.
    pub sent: u64,
    /// Datagrams received, including malformed ones.
    pub received: u64,
    /// Datagrams that failed to decode.
    pub malformed: u64,
    /// Client-level PING/PONG handled internally.
    pub client_handled: u64,
    /// Client-level DATA/DRIVER_DIED ignored.
    pub client_ignored: u64,
    /// Packets delivered to a proxy.
    pub dispatched: u64,
    /// Packets dropped because no proxy was registered.
    pub unregistered: u64,
    /// Packets with a message type nothing handles.
    pub unexpected: u64,
    /// Packets whose handler panicked.
    pub handler_panics: u64,
}

#[derive(Debug, Default)]
pub(crate) struct StatsCounters {
    sent: AtomicU64,
    received: AtomicU64,
    malformed: AtomicU64,
    client_handled: AtomicU64,
    client_ignored: AtomicU64,
    dispatched: AtomicU64,
    unregistered: AtomicU64,
    unexpected: AtomicU64,
    handler_panics: AtomicU64,
}

impl StatsCounters {
    #[inline]
    pub(crate) fn record_sent(&self) {
        self.sent.fetch_add(1, Ordering::Relaxed);
    }

    #[inline]
    pub(crate) fn record_received(&self) {
        self.received.fetch_add(1, Ordering::Relaxed);
    }

    #[inline]
    pub(crate) fn record_malformed(&self) {
        self.malformed.fetch_add(1, Ordering::Relaxed);
    }

    #[inline]
    pub(crate) fn record_handler_panic(&self) {
        self.handler_panics.fetch_add(1, Ordering::Relaxed);
    }

    pub(crate) fn record_outcome(&self, outcome: DispatchOutcome) {
        let counter = match outcome {
            DispatchOutcome::ClientHandled => &self.client_handled,
            DispatchOutcome::ClientIgnored => &self.client_ignored,
            DispatchOutcome::Dispatched => &self.dispatched,
            DispatchOutcome::Unregistered => &self.unregistered,
            DispatchOutcome::UnexpectedType => &self.unexpected,
        };
        counter.fetch_add(1, Ordering::Relaxed);
    }

    pub(crate) fn snapshot(&self) -> ClientStats {
        ClientStats {
            sent: self.sent.load(Ordering::Relaxed),
            received: self.received.load(Ordering::Relaxed),
            malformed: self.malformed.load(Ordering::Relaxed),
            client_handled: self.client_handled.load(Ordering::Relaxed),
            client_ignored: self.client_ignored.load(Ordering::Relaxed),
            dispatched: self.dispatched.load(Ordering::Relaxed),
            unregistered: self.unregistered.load(Ordering::Relaxed),
            unexpected: self.unexpected.load(Ordering::Relaxed),
            handler_panics: self.handler_panics.load(Ordering::Relaxed),
        }
    }
}
