//! Hierarchical progress aggregation: Lesson → Course → Path.
//!
//! [`ProgressAggregator`] is the single owner of the content tree. It is
//! an arena of entities keyed by id, and every change goes through one
//! of its operations. A leaf change always recomputes the owning course,
//! and a course whose result changed recomputes every path containing
//! it. Recomputation reads only current child state, so re-running it is
//! always safe.

use std::collections::HashMap;

use chrono::Utc;

use learnpath_core::ratio::{clamp_percent, floor_percent, rounded_percent};
use learnpath_core::types::{
    BookmarkId, CourseId, EntityRef, LessonId, NoteId, PathId, Seconds,
};
use learnpath_core::CoreError;
use learnpath_events::{EventBus, Subscription};

use crate::catalog::Catalog;
use crate::event::ProgressEvent;
use crate::model::{
    Bookmark, Course, CourseProgress, Lesson, LessonState, Note, Path, PathProgress,
};

pub struct ProgressAggregator {
    lessons: HashMap<LessonId, Lesson>,
    courses: HashMap<CourseId, Course>,
    paths: HashMap<PathId, Path>,
    /// Paths containing each course.
    course_paths: HashMap<CourseId, Vec<PathId>>,
    /// Catalog order, for stable listings.
    course_order: Vec<CourseId>,
    path_order: Vec<PathId>,
    bus: EventBus<ProgressEvent>,
}

impl ProgressAggregator {
    /// Build the entity arena from an authored catalog.
    ///
    /// Seeded completion and watch positions are honoured, and every
    /// aggregate is computed before the aggregator is returned.
    pub fn from_catalog(catalog: Catalog) -> Result<Self, CoreError> {
        catalog.validate()?;

        let mut aggregator = Self {
            lessons: HashMap::new(),
            courses: HashMap::new(),
            paths: HashMap::new(),
            course_paths: HashMap::new(),
            course_order: Vec::new(),
            path_order: Vec::new(),
            bus: EventBus::new("progress"),
        };

        for def in catalog.courses {
            let mut lessons = def.lessons;
            lessons.sort_by_key(|l| l.order);

            let lesson_ids = lessons.iter().map(|l| l.id.clone()).collect();
            for lesson in lessons {
                let (watch_position, progress) = if lesson.completed {
                    (lesson.duration, 100)
                } else {
                    let position = lesson.watch_position.min(lesson.duration);
                    (position, floor_percent(position, lesson.duration))
                };
                aggregator.lessons.insert(
                    lesson.id.clone(),
                    Lesson {
                        id: lesson.id,
                        course_id: def.id.clone(),
                        title: lesson.title,
                        order: lesson.order,
                        duration: lesson.duration,
                        watch_position,
                        progress,
                        is_completed: lesson.completed,
                        bookmarks: Vec::new(),
                        notes: Vec::new(),
                    },
                );
            }

            aggregator.course_order.push(def.id.clone());
            aggregator.courses.insert(
                def.id.clone(),
                Course {
                    id: def.id,
                    title: def.title,
                    lessons: lesson_ids,
                    progress: 0,
                    is_completed: false,
                },
            );
        }

        for def in catalog.paths {
            for course_id in &def.courses {
                aggregator
                    .course_paths
                    .entry(course_id.clone())
                    .or_default()
                    .push(def.id.clone());
            }
            aggregator.path_order.push(def.id.clone());
            aggregator.paths.insert(
                def.id.clone(),
                Path {
                    id: def.id,
                    title: def.title,
                    courses: def.courses,
                    progress: 0,
                    is_completed: false,
                    recommendation_eligible: def.recommendation_eligible,
                },
            );
        }

        // Seeding publishes nothing: there are no subscribers yet.
        for course_id in aggregator.course_order.clone() {
            aggregator.recompute_course(&course_id)?;
        }
        for path_id in aggregator.path_order.clone() {
            aggregator.recompute_path(&path_id)?;
        }

        tracing::debug!(
            lessons = aggregator.lessons.len(),
            courses = aggregator.courses.len(),
            paths = aggregator.paths.len(),
            "Progress aggregator built",
        );

        Ok(aggregator)
    }

    /// Receive every [`ProgressEvent`] published from now on.
    pub fn subscribe(&mut self) -> Subscription<ProgressEvent> {
        self.bus.subscribe()
    }

    // -----------------------------------------------------------------------
    // Queries
    // -----------------------------------------------------------------------

    pub fn lesson_state(&self, lesson_id: &LessonId) -> Result<LessonState, CoreError> {
        self.lesson(lesson_id).map(Lesson::state)
    }

    /// Current roll-up of a course.
    ///
    /// `progress` is the stored value, normally the rounded share of
    /// completed lessons. After [`set_progress`](Self::set_progress) with
    /// a value below 100 it holds that override instead, so it may
    /// disagree with `completed_lessons / total_lessons` until the course
    /// is next recomputed.
    pub fn course_progress(&self, course_id: &CourseId) -> Result<CourseProgress, CoreError> {
        let course = self.course(course_id)?;
        let completed = self.completed_lessons(course);
        Ok(CourseProgress {
            course_id: course.id.clone(),
            title: course.title.clone(),
            progress: course.progress,
            is_completed: course.is_completed,
            completed_lessons: completed,
            total_lessons: course.lessons.len(),
        })
    }

    /// Current roll-up of a path.
    ///
    /// As with [`course_progress`](Self::course_progress), `progress` may
    /// be a [`set_progress`](Self::set_progress) override until one of
    /// the path's courses changes and the path is recomputed.
    pub fn path_progress(&self, path_id: &PathId) -> Result<PathProgress, CoreError> {
        let path = self.path(path_id)?;
        let completed = self.completed_courses(path);
        Ok(PathProgress {
            path_id: path.id.clone(),
            title: path.title.clone(),
            progress: path.progress,
            is_completed: path.is_completed,
            completed_courses: completed,
            total_courses: path.courses.len(),
            recommendation_eligible: path.recommendation_eligible,
        })
    }

    /// The course's lessons in order.
    pub fn course_lessons(&self, course_id: &CourseId) -> Result<Vec<LessonState>, CoreError> {
        let course = self.course(course_id)?;
        course
            .lessons
            .iter()
            .map(|id| self.lesson_state(id))
            .collect()
    }

    /// All courses in catalog order.
    pub fn courses(&self) -> Vec<CourseProgress> {
        self.course_order
            .iter()
            .filter_map(|id| self.course_progress(id).ok())
            .collect()
    }

    /// All paths in catalog order.
    pub fn paths(&self) -> Vec<PathProgress> {
        self.path_order
            .iter()
            .filter_map(|id| self.path_progress(id).ok())
            .collect()
    }

    /// Where playback should start when the lesson is reopened.
    ///
    /// Completed lessons start over from the beginning.
    pub fn resume_position(&self, lesson_id: &LessonId) -> Result<Seconds, CoreError> {
        let lesson = self.lesson(lesson_id)?;
        Ok(if lesson.is_completed {
            0.0
        } else {
            lesson.watch_position
        })
    }

    /// First lesson of the course, by order, that is not yet complete.
    pub fn next_incomplete_lesson(
        &self,
        course_id: &CourseId,
    ) -> Result<Option<LessonId>, CoreError> {
        let course = self.course(course_id)?;
        Ok(course
            .lessons
            .iter()
            .find(|id| self.lessons.get(*id).is_some_and(|l| !l.is_completed))
            .cloned())
    }

    // -----------------------------------------------------------------------
    // Lesson mutations
    // -----------------------------------------------------------------------

    /// Record how far the lesson has been watched.
    ///
    /// The stored position only moves forward, so out-of-order ticks and
    /// rewinds never lower progress. Completed lessons are left alone.
    pub fn record_lesson_progress(
        &mut self,
        lesson_id: &LessonId,
        watched: Seconds,
    ) -> Result<LessonState, CoreError> {
        let lesson = self.lesson_mut(lesson_id)?;
        if lesson.is_completed || !watched.is_finite() {
            return Ok(lesson.state());
        }

        let position = watched.clamp(0.0, lesson.duration);
        if position <= lesson.watch_position {
            return Ok(lesson.state());
        }

        lesson.watch_position = position;
        let progress = floor_percent(position, lesson.duration).max(lesson.progress);
        let progressed = progress != lesson.progress;
        lesson.progress = progress;
        let state = lesson.state();

        if progressed {
            tracing::debug!(lesson_id = %lesson_id, progress, "Lesson progress recorded");
            self.bus.publish(ProgressEvent::LessonProgressed {
                lesson_id: lesson_id.clone(),
                progress,
                watch_position: position,
            });
        }
        Ok(state)
    }

    /// Mark the lesson finished and cascade to its course and paths.
    ///
    /// Idempotent: completing a completed lesson changes nothing.
    pub fn complete_lesson(&mut self, lesson_id: &LessonId) -> Result<LessonState, CoreError> {
        let lesson = self.lesson_mut(lesson_id)?;
        if lesson.is_completed {
            return Ok(lesson.state());
        }

        lesson.is_completed = true;
        lesson.progress = 100;
        lesson.watch_position = lesson.duration;
        let course_id = lesson.course_id.clone();
        let state = lesson.state();

        tracing::info!(lesson_id = %lesson_id, course_id = %course_id, "Lesson completed");
        self.bus.publish(ProgressEvent::LessonCompleted {
            lesson_id: lesson_id.clone(),
            course_id: course_id.clone(),
        });

        self.recompute_course(&course_id)?;
        Ok(state)
    }

    // -----------------------------------------------------------------------
    // Recomputation
    // -----------------------------------------------------------------------

    /// Recompute a course from its lessons; recompute its paths if the
    /// result changed.
    pub fn recompute_course(&mut self, course_id: &CourseId) -> Result<CourseProgress, CoreError> {
        let course = self.course(course_id)?;
        let total = course.lessons.len();
        let completed = self.completed_lessons(course);
        let progress = rounded_percent(completed, total);
        let is_completed = total > 0 && completed == total;

        let course = self.course_mut(course_id)?;
        let changed = course.progress != progress || course.is_completed != is_completed;
        course.progress = progress;
        course.is_completed = is_completed;

        if changed {
            if is_completed {
                tracing::info!(course_id = %course_id, "Course completed");
            }
            self.bus.publish(ProgressEvent::CourseProgressChanged {
                course_id: course_id.clone(),
                progress,
                is_completed,
            });

            let paths = self.course_paths.get(course_id).cloned().unwrap_or_default();
            for path_id in paths {
                self.recompute_path(&path_id)?;
            }
        }

        self.course_progress(course_id)
    }

    /// Recompute a path from its courses.
    pub fn recompute_path(&mut self, path_id: &PathId) -> Result<PathProgress, CoreError> {
        let path = self.path(path_id)?;
        let total = path.courses.len();
        let completed = self.completed_courses(path);
        let progress = rounded_percent(completed, total);
        let is_completed = total > 0 && completed == total;

        let path = self.path_mut(path_id)?;
        let changed = path.progress != progress || path.is_completed != is_completed;
        path.progress = progress;
        path.is_completed = is_completed;

        if changed {
            if is_completed {
                tracing::info!(path_id = %path_id, "Learning path completed");
            }
            self.bus.publish(ProgressEvent::PathProgressChanged {
                path_id: path_id.clone(),
                progress,
                is_completed,
            });
        }

        self.path_progress(path_id)
    }

    // -----------------------------------------------------------------------
    // Overrides
    // -----------------------------------------------------------------------

    /// Finish every lesson in the course.
    pub fn complete_course(&mut self, course_id: &CourseId) -> Result<CourseProgress, CoreError> {
        let lessons = self.course(course_id)?.lessons.clone();
        for lesson_id in &lessons {
            self.complete_lesson(lesson_id)?;
        }
        // Covers the empty course, which no lesson completion reaches.
        self.recompute_course(course_id)
    }

    /// Finish every course in the path.
    pub fn complete_path(&mut self, path_id: &PathId) -> Result<PathProgress, CoreError> {
        let courses = self.path(path_id)?.courses.clone();
        for course_id in &courses {
            self.complete_course(course_id)?;
        }
        self.recompute_path(path_id)
    }

    /// Manually set an entity's progress.
    ///
    /// The value is clamped to `[0, 100]`. Reaching 100 completes the
    /// entity (and cascades). Lower values are stored as-is on incomplete
    /// entities until the next recomputation of that entity; completed
    /// entities are left untouched, since completion is one-way.
    pub fn set_progress(&mut self, entity: &EntityRef, value: f64) -> Result<(), CoreError> {
        let value = clamp_percent(value);

        if value == 100 {
            match entity {
                EntityRef::Lesson(id) => self.complete_lesson(id).map(|_| ()),
                EntityRef::Course(id) => self.complete_course(id).map(|_| ()),
                EntityRef::Path(id) => self.complete_path(id).map(|_| ()),
            }?;
            return Ok(());
        }

        let skipped = match entity {
            EntityRef::Lesson(id) => {
                let lesson = self.lesson_mut(id)?;
                let skip = lesson.is_completed;
                if !skip {
                    lesson.progress = value;
                }
                skip
            }
            EntityRef::Course(id) => {
                let course = self.course_mut(id)?;
                let skip = course.is_completed;
                if !skip {
                    course.progress = value;
                }
                skip
            }
            EntityRef::Path(id) => {
                let path = self.path_mut(id)?;
                let skip = path.is_completed;
                if !skip {
                    path.progress = value;
                }
                skip
            }
        };

        if skipped {
            tracing::debug!(entity = %entity, value, "Ignoring progress override on completed entity");
        } else {
            tracing::debug!(entity = %entity, value, "Progress overridden");
        }
        Ok(())
    }

    /// Record the recommendation collaborator's verdict for a path.
    pub fn set_recommendation_eligible(
        &mut self,
        path_id: &PathId,
        eligible: bool,
    ) -> Result<PathProgress, CoreError> {
        let path = self.path_mut(path_id)?;
        if path.recommendation_eligible != eligible {
            path.recommendation_eligible = eligible;
            self.bus.publish(ProgressEvent::RecommendationChanged {
                path_id: path_id.clone(),
                eligible,
            });
        }
        self.path_progress(path_id)
    }

    // -----------------------------------------------------------------------
    // Bookmarks and notes
    // -----------------------------------------------------------------------

    /// Pin a bookmark at `timestamp` (clamped into the lesson).
    pub fn add_bookmark(
        &mut self,
        lesson_id: &LessonId,
        timestamp: Seconds,
        label: impl Into<String>,
    ) -> Result<BookmarkId, CoreError> {
        let lesson = self.lesson_mut(lesson_id)?;
        let bookmark = Bookmark {
            id: BookmarkId::generate(),
            timestamp: lesson.clamp_timestamp(timestamp),
            label: label.into(),
            created_at: Utc::now(),
        };
        let id = bookmark.id;
        lesson.bookmarks.push(bookmark);
        Ok(id)
    }

    pub fn remove_bookmark(
        &mut self,
        lesson_id: &LessonId,
        bookmark_id: BookmarkId,
    ) -> Result<Bookmark, CoreError> {
        let lesson = self.lesson_mut(lesson_id)?;
        let index = lesson
            .bookmarks
            .iter()
            .position(|b| b.id == bookmark_id)
            .ok_or_else(|| CoreError::not_found("bookmark", bookmark_id))?;
        Ok(lesson.bookmarks.swap_remove(index))
    }

    /// Pin a note at `timestamp` (clamped into the lesson). Blank notes
    /// are rejected.
    pub fn add_note(
        &mut self,
        lesson_id: &LessonId,
        timestamp: Seconds,
        text: impl Into<String>,
    ) -> Result<NoteId, CoreError> {
        let text = text.into();
        if text.trim().is_empty() {
            return Err(CoreError::Validation("Note text must not be empty".to_string()));
        }

        let lesson = self.lesson_mut(lesson_id)?;
        let note = Note {
            id: NoteId::generate(),
            timestamp: lesson.clamp_timestamp(timestamp),
            text,
            created_at: Utc::now(),
        };
        let id = note.id;
        lesson.notes.push(note);
        Ok(id)
    }

    pub fn remove_note(&mut self, lesson_id: &LessonId, note_id: NoteId) -> Result<Note, CoreError> {
        let lesson = self.lesson_mut(lesson_id)?;
        let index = lesson
            .notes
            .iter()
            .position(|n| n.id == note_id)
            .ok_or_else(|| CoreError::not_found("note", note_id))?;
        Ok(lesson.notes.swap_remove(index))
    }

    // -----------------------------------------------------------------------
    // Internals
    // -----------------------------------------------------------------------

    fn lesson(&self, id: &LessonId) -> Result<&Lesson, CoreError> {
        self.lessons
            .get(id)
            .ok_or_else(|| CoreError::not_found("lesson", id))
    }

    fn lesson_mut(&mut self, id: &LessonId) -> Result<&mut Lesson, CoreError> {
        self.lessons
            .get_mut(id)
            .ok_or_else(|| CoreError::not_found("lesson", id))
    }

    fn course(&self, id: &CourseId) -> Result<&Course, CoreError> {
        self.courses
            .get(id)
            .ok_or_else(|| CoreError::not_found("course", id))
    }

    fn course_mut(&mut self, id: &CourseId) -> Result<&mut Course, CoreError> {
        self.courses
            .get_mut(id)
            .ok_or_else(|| CoreError::not_found("course", id))
    }

    fn path(&self, id: &PathId) -> Result<&Path, CoreError> {
        self.paths
            .get(id)
            .ok_or_else(|| CoreError::not_found("path", id))
    }

    fn path_mut(&mut self, id: &PathId) -> Result<&mut Path, CoreError> {
        self.paths
            .get_mut(id)
            .ok_or_else(|| CoreError::not_found("path", id))
    }

    fn completed_lessons(&self, course: &Course) -> usize {
        course
            .lessons
            .iter()
            .filter(|id| self.lessons.get(*id).is_some_and(|l| l.is_completed))
            .count()
    }

    fn completed_courses(&self, path: &Path) -> usize {
        path.courses
            .iter()
            .filter(|id| self.courses.get(*id).is_some_and(|c| c.is_completed))
            .count()
    }
}

impl std::fmt::Debug for ProgressAggregator {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ProgressAggregator")
            .field("lessons", &self.lessons.len())
            .field("courses", &self.courses.len())
            .field("paths", &self.paths.len())
            .finish()
    }
}
