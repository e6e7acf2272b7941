//! In-process event plumbing for `learnpath`.
//!
//! - [`EventBus`]: ordered fan-out of published values to every live
//!   subscriber, backed by one unbounded `tokio::sync::mpsc` channel per
//!   subscriber.
//! - [`Envelope`]: a published value stamped with its sequence number and
//!   publication time.

pub mod bus;

pub use bus::{Envelope, EventBus, Subscription};
