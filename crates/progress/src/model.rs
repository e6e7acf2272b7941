//! Content hierarchy entities and the read-only views handed out for them.
//!
//! The entity structs are private to the crate; every mutation goes
//! through [`ProgressAggregator`](crate::ProgressAggregator). Callers only
//! ever see the cloned views ([`LessonState`], [`CourseProgress`],
//! [`PathProgress`]).

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use learnpath_core::types::{BookmarkId, CourseId, LessonId, NoteId, PathId, Percent, Seconds};

// ---------------------------------------------------------------------------
// Annotations
// ---------------------------------------------------------------------------

/// A labelled position inside a lesson.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Bookmark {
    pub id: BookmarkId,
    pub timestamp: Seconds,
    pub label: String,
    pub created_at: DateTime<Utc>,
}

/// Free-text note pinned to a position inside a lesson.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Note {
    pub id: NoteId,
    pub timestamp: Seconds,
    pub text: String,
    pub created_at: DateTime<Utc>,
}

// ---------------------------------------------------------------------------
// Entities
// ---------------------------------------------------------------------------

#[derive(Debug, Clone)]
pub(crate) struct Lesson {
    pub id: LessonId,
    pub course_id: CourseId,
    pub title: String,
    pub order: u32,
    pub duration: Seconds,
    pub watch_position: Seconds,
    pub progress: Percent,
    pub is_completed: bool,
    pub bookmarks: Vec<Bookmark>,
    pub notes: Vec<Note>,
}

impl Lesson {
    pub fn state(&self) -> LessonState {
        LessonState {
            lesson_id: self.id.clone(),
            course_id: self.course_id.clone(),
            title: self.title.clone(),
            order: self.order,
            duration: self.duration,
            watch_position: self.watch_position,
            progress: self.progress,
            is_completed: self.is_completed,
            bookmarks: self.bookmarks.clone(),
            notes: self.notes.clone(),
        }
    }

    /// Clamp an annotation timestamp into the lesson.
    pub fn clamp_timestamp(&self, timestamp: Seconds) -> Seconds {
        if !timestamp.is_finite() {
            return 0.0;
        }
        timestamp.clamp(0.0, self.duration.max(0.0))
    }
}

#[derive(Debug, Clone)]
pub(crate) struct Course {
    pub id: CourseId,
    pub title: String,
    /// Lesson ids sorted by their `order`.
    pub lessons: Vec<LessonId>,
    pub progress: Percent,
    pub is_completed: bool,
}

#[derive(Debug, Clone)]
pub(crate) struct Path {
    pub id: PathId,
    pub title: String,
    pub courses: Vec<CourseId>,
    pub progress: Percent,
    pub is_completed: bool,
    pub recommendation_eligible: bool,
}

// ---------------------------------------------------------------------------
// Views
// ---------------------------------------------------------------------------

/// Immutable view of one lesson.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LessonState {
    pub lesson_id: LessonId,
    pub course_id: CourseId,
    pub title: String,
    pub order: u32,
    pub duration: Seconds,
    pub watch_position: Seconds,
    pub progress: Percent,
    pub is_completed: bool,
    pub bookmarks: Vec<Bookmark>,
    pub notes: Vec<Note>,
}

/// Immutable view of a course's aggregate progress.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CourseProgress {
    pub course_id: CourseId,
    pub title: String,
    pub progress: Percent,
    pub is_completed: bool,
    pub completed_lessons: usize,
    pub total_lessons: usize,
}

/// Immutable view of a learning path's aggregate progress.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PathProgress {
    pub path_id: PathId,
    pub title: String,
    pub progress: Percent,
    pub is_completed: bool,
    pub completed_courses: usize,
    pub total_courses: usize,
    /// Set by the external recommendation collaborator.
    pub recommendation_eligible: bool,
}
