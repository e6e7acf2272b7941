//! Controller states and the immutable views published to observers.

use serde::{Deserialize, Serialize};

use learnpath_core::types::{LessonId, Seconds, SessionId};

use crate::error::{MediaErrorKind, MediaLoadError};

/// State of a playback session.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PlaybackState {
    /// Session opened, resource has not started loading.
    Idle,
    Loading,
    /// Playable, never started.
    Ready,
    Playing,
    Paused,
    /// Stalled waiting for data; `is_playing` keeps the user's intent.
    Buffering,
    Seeking,
    Ended,
    /// Load failed; only `retry` is honoured.
    Error,
}

impl PlaybackState {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Idle => "idle",
            Self::Loading => "loading",
            Self::Ready => "ready",
            Self::Playing => "playing",
            Self::Paused => "paused",
            Self::Buffering => "buffering",
            Self::Seeking => "seeking",
            Self::Ended => "ended",
            Self::Error => "error",
        }
    }
}

/// Point-in-time view of a playback session.
///
/// One is published for every accepted transition.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PlaybackSnapshot {
    pub session_id: SessionId,
    pub lesson_id: LessonId,
    pub state: PlaybackState,
    pub current_time: Seconds,
    pub duration: Seconds,
    pub volume: f64,
    pub playback_rate: f64,
    pub is_playing: bool,
    pub is_muted: bool,
    pub is_loading: bool,
    pub has_error: bool,
    pub error_kind: Option<MediaErrorKind>,
    pub error_message: Option<String>,
}

impl PlaybackSnapshot {
    /// `current_time / duration * 100`, or 0 while the duration is unknown.
    pub fn progress_percentage(&self) -> f64 {
        if self.duration > 0.0 {
            self.current_time / self.duration * 100.0
        } else {
            0.0
        }
    }

    /// The recorded load failure, if any.
    pub fn error(&self) -> Option<MediaLoadError> {
        match (self.error_kind, &self.error_message) {
            (Some(kind), Some(message)) => Some(MediaLoadError {
                kind,
                message: message.clone(),
            }),
            _ => None,
        }
    }
}

/// Raw position tick, forwarded at the resource's own cadence.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TimeUpdate {
    pub session_id: SessionId,
    pub lesson_id: LessonId,
    pub current_time: Seconds,
    pub duration: Seconds,
}

/// Discrete playback notifications.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case", tag = "event")]
pub enum PlaybackEventKind {
    Play,
    Pause,
    /// The media reached its end; `position` is the full duration.
    Ended { position: Seconds },
    Error { error: MediaLoadError },
}

/// A discrete notification tagged with the session it came from.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PlaybackEvent {
    pub session_id: SessionId,
    pub lesson_id: LessonId,
    #[serde(flatten)]
    pub kind: PlaybackEventKind,
}
