//! Media playback controller for lesson videos.
//!
//! A [`PlaybackController`] wraps one [`MediaResource`] and runs a
//! finite state machine over its lifecycle signals and the user's
//! commands. Observers subscribe to ordered snapshot, time-update and
//! event streams; the progress aggregator listens to the latter two.

pub mod config;
pub mod controller;
pub mod error;
pub mod resource;
pub mod signal;
pub mod state;

mod session;

pub use config::{PlaybackConfig, Preload, PLAYBACK_RATES};
pub use controller::{Dispatch, PlaybackController};
pub use error::{CapabilityError, MediaErrorKind, MediaLoadError};
pub use resource::{MediaCommand, MediaResource, SimulatedMedia};
pub use signal::MediaSignal;
pub use state::{PlaybackEvent, PlaybackEventKind, PlaybackSnapshot, PlaybackState, TimeUpdate};
