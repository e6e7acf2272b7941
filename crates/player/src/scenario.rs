//! Scenario files: a catalog plus a scripted list of steps.
//!
//! ```json
//! {
//!   "catalog": { "courses": [...], "paths": [...] },
//!   "steps": [
//!     { "step": "open", "lesson_id": "L1", "config": { "source": "l1.mp4" } },
//!     { "step": "signal", "signal": "load_start" },
//!     { "step": "signal", "signal": "loaded_metadata", "duration": 600 },
//!     { "step": "signal", "signal": "can_play" },
//!     { "step": "play" },
//!     { "step": "watch", "until": "5:00" },
//!     { "step": "seek", "to": 30 },
//!     { "step": "signal", "signal": "ended" }
//!   ]
//! }
//! ```

use serde::{Deserialize, Serialize};

use learnpath_core::time_format::parse_timestamp;
use learnpath_core::types::{CourseId, EntityRef, LessonId, PathId, Seconds};
use learnpath_core::CoreError;
use learnpath_playback::{MediaSignal, PlaybackConfig};
use learnpath_progress::Catalog;

/// Interval between generated position ticks in a `watch` step.
pub const DEFAULT_TICK_INTERVAL: Seconds = 15.0;

/// Upper bound on the ticks a single `watch` step may generate.
pub const MAX_WATCH_TICKS: usize = 100_000;

/// A media position written either as seconds or as `m:ss` / `h:mm:ss`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum TimeSpec {
    Seconds(Seconds),
    Clock(String),
}

impl TimeSpec {
    pub fn resolve(&self) -> Result<Seconds, CoreError> {
        match self {
            Self::Seconds(secs) => Ok(*secs),
            Self::Clock(text) => parse_timestamp(text),
        }
    }
}

impl From<Seconds> for TimeSpec {
    fn from(secs: Seconds) -> Self {
        Self::Seconds(secs)
    }
}

/// One scripted action.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case", tag = "step")]
pub enum Step {
    // -- Playback session --
    /// Open a lesson. With `resume`, playback starts from the stored
    /// watch position unless the config names a start time.
    Open {
        lesson_id: LessonId,
        config: PlaybackConfig,
        #[serde(default)]
        resume: bool,
    },
    Close,
    /// Deliver a resource signal to the open session.
    Signal(MediaSignal),
    /// Emit position ticks from the current position up to `until`.
    Watch {
        until: TimeSpec,
        #[serde(default)]
        interval: Option<Seconds>,
    },

    // -- Commands --
    Play,
    Pause,
    Seek {
        to: TimeSpec,
    },
    SetVolume {
        volume: f64,
    },
    ToggleMute,
    SetPlaybackRate {
        rate: f64,
    },
    Retry,
    Fullscreen,
    PictureInPicture,

    // -- Progress --
    CompleteLesson {
        lesson_id: LessonId,
    },
    CompleteCourse {
        course_id: CourseId,
    },
    SetProgress {
        entity: EntityRef,
        value: f64,
    },
    SetRecommendation {
        path_id: PathId,
        eligible: bool,
    },
    Bookmark {
        lesson_id: LessonId,
        at: TimeSpec,
        #[serde(default)]
        label: String,
    },
    Note {
        lesson_id: LessonId,
        at: TimeSpec,
        text: String,
    },
}

impl Step {
    pub fn name(&self) -> &'static str {
        match self {
            Self::Open { .. } => "open",
            Self::Close => "close",
            Self::Signal(_) => "signal",
            Self::Watch { .. } => "watch",
            Self::Play => "play",
            Self::Pause => "pause",
            Self::Seek { .. } => "seek",
            Self::SetVolume { .. } => "set_volume",
            Self::ToggleMute => "toggle_mute",
            Self::SetPlaybackRate { .. } => "set_playback_rate",
            Self::Retry => "retry",
            Self::Fullscreen => "fullscreen",
            Self::PictureInPicture => "picture_in_picture",
            Self::CompleteLesson { .. } => "complete_lesson",
            Self::CompleteCourse { .. } => "complete_course",
            Self::SetProgress { .. } => "set_progress",
            Self::SetRecommendation { .. } => "set_recommendation",
            Self::Bookmark { .. } => "bookmark",
            Self::Note { .. } => "note",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Scenario {
    pub catalog: Catalog,
    #[serde(default)]
    pub steps: Vec<Step>,
}

impl Scenario {
    pub fn from_json(raw: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(raw)
    }
}
