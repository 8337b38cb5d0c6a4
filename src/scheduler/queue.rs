//! Bounded observation queue between producers and the filter thread.
//!
//! Producers never block: a push against a full queue drops the
//! observation and reports the overflow, on the grounds that a filter
//! falling behind is better served by fresh data later than by a
//! growing backlog of stale samples.

use crossbeam_channel::{bounded, Receiver, TrySendError};
use thiserror::Error;

use crate::core::types::Observation;

/// Why a push did not enqueue.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum PushError {
    /// The queue is at capacity; the observation was dropped.
    #[error("observation queue full, observation dropped")]
    QueueFull,

    /// The filter thread has shut down.
    #[error("observation queue disconnected")]
    Disconnected,
}

/// Producer handle for the observation queue. Cloneable; every sensor
/// pipeline can hold its own.
#[derive(Debug, Clone)]
pub struct ObservationSender {
    tx: crossbeam_channel::Sender<Observation>,
}

impl ObservationSender {
    /// Enqueue an observation without blocking.
    ///
    /// On overflow the observation is dropped and the overflow logged;
    /// the caller may also react to the returned error (e.g. count
    /// drops), but is free to ignore it.
    pub fn push(&self, observation: Observation) -> Result<(), PushError> {
        match self.tx.try_send(observation) {
            Ok(()) => Ok(()),
            Err(TrySendError::Full(obs)) => {
                log::warn!("observation queue full, dropping {} observation", obs.kind());
                Err(PushError::QueueFull)
            }
            Err(TrySendError::Disconnected(_)) => {
                log::error!("observation queue disconnected");
                Err(PushError::Disconnected)
            }
        }
    }

    /// Number of observations currently queued.
    pub fn len(&self) -> usize {
        self.tx.len()
    }

    /// True when nothing is queued.
    pub fn is_empty(&self) -> bool {
        self.tx.is_empty()
    }
}

/// Create a bounded observation channel of the given capacity.
pub fn observation_channel(capacity: usize) -> (ObservationSender, Receiver<Observation>) {
    let (tx, rx) = bounded(capacity);
    (ObservationSender { tx }, rx)
}
