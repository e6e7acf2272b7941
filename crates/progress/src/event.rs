//! Notifications published by the aggregator after each mutation.

use serde::{Deserialize, Serialize};

use learnpath_core::types::{CourseId, LessonId, PathId, Percent, Seconds};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case", tag = "event")]
pub enum ProgressEvent {
    LessonProgressed {
        lesson_id: LessonId,
        progress: Percent,
        watch_position: Seconds,
    },
    LessonCompleted {
        lesson_id: LessonId,
        course_id: CourseId,
    },
    CourseProgressChanged {
        course_id: CourseId,
        progress: Percent,
        is_completed: bool,
    },
    PathProgressChanged {
        path_id: PathId,
        progress: Percent,
        is_completed: bool,
    },
    RecommendationChanged {
        path_id: PathId,
        eligible: bool,
    },
}
