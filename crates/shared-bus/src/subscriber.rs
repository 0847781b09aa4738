//! # Event Subscriber
//!
//! The subscriber is the default sink: it merges every registered kind into
//! one bounded FIFO queue and relays it to a consumer channel.

use crate::events::Signal;
use crate::publisher::SignalSink;
use async_trait::async_trait;
use thiserror::Error;
use tokio::sync::{mpsc, Mutex};
use tokio_util::sync::CancellationToken;
use tracing::debug;

/// Errors from bus operations.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum BusError {
    /// The subscriber queue was closed.
    #[error("Event bus closed")]
    Closed,
}

/// Merged, bounded queue of signals for all kinds.
pub struct Subscriber {
    /// Producer side of the queue.
    sender: mpsc::Sender<Signal>,

    /// Consumer side, shared by competing `listen` loops.
    receiver: Mutex<mpsc::Receiver<Signal>>,

    /// Queue capacity.
    capacity: usize,
}

impl Subscriber {
    /// Create a subscriber whose queue holds `capacity` signals.
    ///
    /// A zero capacity is raised to one.
    #[must_use]
    pub fn new(capacity: usize) -> Self {
        let capacity = capacity.max(1);
        let (sender, receiver) = mpsc::channel(capacity);
        Self {
            sender,
            receiver: Mutex::new(receiver),
            capacity,
        }
    }

    /// Queue capacity.
    #[must_use]
    pub fn capacity(&self) -> usize {
        self.capacity
    }

    /// Signals currently waiting in the queue.
    #[must_use]
    pub fn pending(&self) -> usize {
        self.capacity - self.sender.capacity()
    }

    /// Relay queued signals to `out` until `cancel` fires.
    ///
    /// Cancellation does not drain the queue: buffered signals are never
    /// forwarded by this call, and a signal already taken from the queue but
    /// not yet handed to `out` is dropped. The loop also ends when `out` is
    /// closed.
    pub async fn listen(&self, cancel: CancellationToken, out: mpsc::Sender<Signal>) {
        debug!("Subscriber listen loop started");
        loop {
            let next = tokio::select! {
                biased;
                _ = cancel.cancelled() => break,
                signal = async { self.receiver.lock().await.recv().await } => signal,
            };

            let Some(signal) = next else {
                break;
            };

            tokio::select! {
                biased;
                _ = cancel.cancelled() => break,
                sent = out.send(signal) => {
                    if sent.is_err() {
                        debug!("Consumer channel closed");
                        break;
                    }
                }
            }
        }
        debug!("Subscriber listen loop stopped");
    }
}

#[async_trait]
impl SignalSink for Subscriber {
    async fn deliver(&self, signal: Signal) -> Result<(), BusError> {
        self.sender.send(signal).await.map_err(|_| BusError::Closed)
    }
}
