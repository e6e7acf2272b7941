//! Lifecycle signals reported by the media resource.

use serde::{Deserialize, Serialize};

use learnpath_core::types::Seconds;

use crate::error::MediaErrorKind;

/// One lifecycle notification from the underlying media resource.
///
/// Signals are delivered at least once and may repeat; a signal that
/// would not change the session is ignored by the controller.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case", tag = "signal")]
pub enum MediaSignal {
    /// The resource started fetching the source.
    LoadStart,
    /// Duration is known.
    LoadedMetadata { duration: Seconds },
    /// Duration changed (e.g. a live source settled).
    DurationChange { duration: Seconds },
    /// The first frame is available.
    LoadedData,
    /// Enough data to start playing.
    CanPlay,
    /// Enough data to play to the end without stalling.
    CanPlayThrough,
    /// Playback stalled waiting for data.
    Waiting,
    /// The resource started a seek.
    Seeking,
    /// The resource finished a seek.
    Seeked,
    /// Position tick at the resource's native cadence.
    TimeUpdate { current_time: Seconds },
    /// Playback reached the end of the media.
    Ended,
    /// Loading or decoding failed.
    Error {
        kind: MediaErrorKind,
        #[serde(default)]
        message: Option<String>,
    },
}

impl MediaSignal {
    /// Signal name used in logs.
    pub fn name(&self) -> &'static str {
        match self {
            Self::LoadStart => "load_start",
            Self::LoadedMetadata { .. } => "loaded_metadata",
            Self::DurationChange { .. } => "duration_change",
            Self::LoadedData => "loaded_data",
            Self::CanPlay => "can_play",
            Self::CanPlayThrough => "can_play_through",
            Self::Waiting => "waiting",
            Self::Seeking => "seeking",
            Self::Seeked => "seeked",
            Self::TimeUpdate { .. } => "time_update",
            Self::Ended => "ended",
            Self::Error { .. } => "error",
        }
    }
}
