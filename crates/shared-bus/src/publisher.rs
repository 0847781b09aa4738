//! # Event Publisher
//!
//! Defines the publishing side of the bus: the `Broker` maps each
//! `EventKind` to the sinks registered for it and delivers every published
//! signal to all of them.

use crate::events::{EventKind, Signal};
use crate::subscriber::BusError;
use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use tracing::{debug, warn};

/// Destination for published signals.
#[async_trait]
pub trait SignalSink: Send + Sync {
    /// Hand one signal to the sink.
    ///
    /// May wait for queue space; must not drop the signal silently.
    async fn deliver(&self, signal: Signal) -> Result<(), BusError>;
}

/// Trait for publishing signals to the bus.
#[async_trait]
pub trait EventPublisher: Send + Sync {
    /// Publish a signal to every sink registered for its kind.
    ///
    /// # Returns
    ///
    /// The number of sinks that accepted the signal.
    async fn publish(&self, signal: Signal) -> usize;

    /// Get the total number of signals published.
    fn signals_published(&self) -> u64;
}

/// Dispatches signals to sinks by kind.
///
/// Registration takes `&mut self`, so it can only happen while the broker
/// is still exclusively owned, i.e. before it is shared with producers.
#[derive(Default)]
pub struct Broker {
    /// Sinks per kind, in registration order.
    sinks: HashMap<EventKind, Vec<Arc<dyn SignalSink>>>,

    /// Total signals published.
    signals_published: AtomicU64,
}

impl Broker {
    /// Create a broker with no registrations.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Bind `sink` to `kind`.
    pub fn register(&mut self, kind: EventKind, sink: Arc<dyn SignalSink>) {
        self.sinks.entry(kind).or_default().push(sink);
    }

    /// Number of sinks registered for `kind`.
    #[must_use]
    pub fn sink_count(&self, kind: EventKind) -> usize {
        self.sinks.get(&kind).map_or(0, Vec::len)
    }
}

#[async_trait]
impl EventPublisher for Broker {
    async fn publish(&self, signal: Signal) -> usize {
        let kind = signal.kind();

        // Always increment counter (signal was attempted)
        self.signals_published.fetch_add(1, Ordering::Relaxed);

        let Some(sinks) = self.sinks.get(&kind) else {
            warn!(kind = %kind, "Signal dropped (no sink registered)");
            return 0;
        };

        let mut delivered = 0;
        for sink in sinks {
            match sink.deliver(signal.clone()).await {
                Ok(()) => delivered += 1,
                Err(e) => warn!(kind = %kind, error = %e, "Signal delivery failed"),
            }
        }

        debug!(kind = %kind, origin = ?signal.origin(), sinks = delivered, "Signal published");
        delivered
    }

    fn signals_published(&self) -> u64 {
        self.signals_published.load(Ordering::Relaxed)
    }
}
