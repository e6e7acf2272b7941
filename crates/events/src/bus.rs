//! Ordered publish/subscribe bus.
//!
//! The playback controller and the progress aggregator each own one
//! [`EventBus`] per output stream. Everything runs on a single logical
//! thread, so publication order is acceptance order; each subscriber
//! gets its own unbounded channel and therefore never lags or drops.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tokio::sync::mpsc;

// ---------------------------------------------------------------------------
// Envelope
// ---------------------------------------------------------------------------

/// A published value plus delivery metadata.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Envelope<E> {
    /// Monotonic per-bus sequence number, starting at 1.
    pub sequence: u64,

    /// When the value was published (UTC).
    pub published_at: DateTime<Utc>,

    /// The published value.
    pub payload: E,
}

/// Receiving side handed out by [`EventBus::subscribe`].
///
/// Dropping it unsubscribes; the bus prunes the dead channel on its next
/// publish.
pub type Subscription<E> = mpsc::UnboundedReceiver<Envelope<E>>;

// ---------------------------------------------------------------------------
// EventBus
// ---------------------------------------------------------------------------

/// Fan-out bus delivering every published value to every subscriber in
/// publication order.
///
/// # Usage
///
/// ```rust
/// use learnpath_events::EventBus;
///
/// let mut bus = EventBus::new("lesson");
/// let mut rx = bus.subscribe();
///
/// bus.publish("completed");
/// assert_eq!(rx.try_recv().unwrap().payload, "completed");
/// ```
pub struct EventBus<E> {
    name: &'static str,
    subscribers: Vec<mpsc::UnboundedSender<Envelope<E>>>,
    sequence: u64,
}

impl<E: Clone> EventBus<E> {
    /// Create an empty bus. `name` only appears in log output.
    pub fn new(name: &'static str) -> Self {
        Self {
            name,
            subscribers: Vec::new(),
            sequence: 0,
        }
    }

    /// Subscribe to every value published from now on.
    pub fn subscribe(&mut self) -> Subscription<E> {
        let (tx, rx) = mpsc::unbounded_channel();
        self.subscribers.push(tx);
        rx
    }

    /// Publish a value to all live subscribers and return its sequence
    /// number.
    ///
    /// With no subscribers the value is dropped, but the sequence number
    /// still advances.
    pub fn publish(&mut self, payload: E) -> u64 {
        self.sequence += 1;
        let envelope = Envelope {
            sequence: self.sequence,
            published_at: Utc::now(),
            payload,
        };

        let before = self.subscribers.len();
        self.subscribers
            .retain(|tx| tx.send(envelope.clone()).is_ok());

        let dropped = before - self.subscribers.len();
        if dropped > 0 {
            tracing::debug!(bus = self.name, dropped, "Pruned closed subscribers");
        }

        self.sequence
    }

    /// Number of subscribers still attached as of the last publish.
    pub fn subscriber_count(&self) -> usize {
        self.subscribers.len()
    }

    /// Sequence number of the most recent publication (0 before any).
    pub fn last_sequence(&self) -> u64 {
        self.sequence
    }
}

impl<E> std::fmt::Debug for EventBus<E> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("EventBus")
            .field("name", &self.name)
            .field("subscribers", &self.subscribers.len())
            .field("sequence", &self.sequence)
            .finish()
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
