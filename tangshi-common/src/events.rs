//! Event types and event bus
//!
//! Events are broadcast on a tokio broadcast channel and serialize to
//! tagged JSON so a UI layer can forward them unchanged.

use crate::lifecycle::{ActionKind, ActionState};
use serde::{Deserialize, Serialize};
use tokio::sync::broadcast;

/// Tangshi event types
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(tag = "type")]
pub enum TangshiEvent {
    /// An action moved to a new lifecycle state
    ActionStateChanged {
        /// Action whose state changed
        action: ActionKind,
        /// State before change
        old_state: ActionState,
        /// State after change
        new_state: ActionState,
        /// Attempt generation the change belongs to
        generation: u64,
        /// Failure message when `new_state` is Failed
        error: Option<String>,
        /// When state changed
        timestamp: chrono::DateTime<chrono::Utc>,
    },

    /// A speech payload was decoded and handed to playback
    SpeechDecoded {
        /// Frames in the decoded buffer (before resampling)
        frame_count: usize,
        /// Nominal sample rate of the payload
        sample_rate: u32,
        /// Channel count of the payload
        channels: u16,
        /// Duration in milliseconds
        duration_ms: u64,
        /// When decoding finished
        timestamp: chrono::DateTime<chrono::Utc>,
    },
}

/// Central event distribution bus
///
/// Wraps `tokio::sync::broadcast`: publishing never blocks, slow
/// subscribers see `RecvError::Lagged`, and dropping a receiver
/// unsubscribes it.
///
/// # Examples
///
/// ```
/// use tangshi_common::events::{EventBus, TangshiEvent};
///
/// let bus = EventBus::new(16);
/// let mut rx = bus.subscribe();
///
/// bus.emit_lossy(TangshiEvent::SpeechDecoded {
///     frame_count: 24000,
///     sample_rate: 24000,
///     channels: 1,
///     duration_ms: 1000,
///     timestamp: chrono::Utc::now(),
/// });
///
/// assert!(matches!(rx.try_recv(), Ok(TangshiEvent::SpeechDecoded { .. })));
/// ```
#[derive(Clone)]
pub struct EventBus {
    tx: broadcast::Sender<TangshiEvent>,
    capacity: usize,
}

impl EventBus {
    /// Creates a new EventBus buffering up to `capacity` events
    pub fn new(capacity: usize) -> Self {
        let (tx, _) = broadcast::channel(capacity);
        Self { tx, capacity }
    }

    /// Subscribe to all future events
    pub fn subscribe(&self) -> broadcast::Receiver<TangshiEvent> {
        self.tx.subscribe()
    }

    /// Emit an event to all subscribers
    ///
    /// Returns `Err` if no subscribers are listening.
    #[allow(clippy::result_large_err)]
    pub fn emit(
        &self,
        event: TangshiEvent,
    ) -> Result<usize, broadcast::error::SendError<TangshiEvent>> {
        self.tx.send(event)
    }

    /// Emit an event, ignoring if no subscribers are listening
    pub fn emit_lossy(&self, event: TangshiEvent) {
        let _ = self.tx.send(event);
    }

    pub fn subscriber_count(&self) -> usize {
        self.tx.receiver_count()
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }
}
