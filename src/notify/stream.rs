use std::sync::Weak;
use std::time::Duration;

use crossbeam_channel::{Receiver, RecvTimeoutError};
use thiserror::Error;

use super::events::{ChangeEvent, SubscriptionId};
use super::listeners::Listeners;

/// Errors returned by blocking stream receives.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum StreamError {
    /// The store backing the stream was dropped.
    #[error("change stream disconnected")]
    Disconnected,

    /// No event arrived in time.
    #[error("no change event within {duration_ms}ms")]
    Timeout {
        /// The timeout that elapsed.
        duration_ms: u64,
    },
}

/// A channel of change events for one store.
///
/// Events are pushed during the store's synchronous notification pass with a
/// non-blocking send; when the buffer is full the event is dropped and
/// counted on the store. Dropping this stream unregisters it.
#[derive(Debug)]
pub struct ChangeStream {
    subscription_id: SubscriptionId,
    rx: Receiver<ChangeEvent>,
    listeners: Weak<Listeners>,
}

impl ChangeStream {
    pub(crate) fn new(
        subscription_id: SubscriptionId,
        rx: Receiver<ChangeEvent>,
        listeners: Weak<Listeners>,
    ) -> Self {
        Self {
            subscription_id,
            rx,
            listeners,
        }
    }

    /// The subscription id backing this stream.
    #[must_use]
    pub const fn subscription_id(&self) -> SubscriptionId {
        self.subscription_id
    }

    /// Next buffered event, if any.
    #[must_use]
    pub fn try_recv(&self) -> Option<ChangeEvent> {
        self.rx.try_recv().ok()
    }

    /// Receive the next event (blocking).
    pub fn recv(&self) -> Result<ChangeEvent, StreamError> {
        self.rx.recv().map_err(|_| StreamError::Disconnected)
    }

    /// Receive the next event with a timeout.
    pub fn recv_timeout(&self, timeout: Duration) -> Result<ChangeEvent, StreamError> {
        self.rx.recv_timeout(timeout).map_err(|err| match err {
            RecvTimeoutError::Timeout => StreamError::Timeout {
                duration_ms: u64::try_from(timeout.as_millis()).unwrap_or(u64::MAX),
            },
            RecvTimeoutError::Disconnected => StreamError::Disconnected,
        })
    }

    /// Drain every buffered event.
    pub fn drain(&self) -> Vec<ChangeEvent> {
        self.rx.try_iter().collect()
    }
}

impl Drop for ChangeStream {
    fn drop(&mut self) {
        if let Some(listeners) = self.listeners.upgrade() {
            listeners.remove_stream(self.subscription_id);
        }
    }
}
