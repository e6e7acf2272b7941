//! Authored content hierarchy, as handed over by the catalog collaborator.
//!
//! A [`Catalog`] is plain data (usually deserialized from JSON). It is
//! validated once, when the aggregator is built from it.

use std::collections::HashSet;

use serde::{Deserialize, Serialize};

use learnpath_core::types::{CourseId, LessonId, PathId, Seconds};
use learnpath_core::CoreError;

/// One lesson as authored.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LessonDef {
    pub id: LessonId,
    #[serde(default)]
    pub title: String,
    /// Position within the course; unique per course.
    pub order: u32,
    /// Estimated length in seconds.
    pub duration: Seconds,
    /// Seed the lesson as already finished.
    #[serde(default)]
    pub completed: bool,
    /// Seed a previously watched position.
    #[serde(default)]
    pub watch_position: Seconds,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CourseDef {
    pub id: CourseId,
    #[serde(default)]
    pub title: String,
    #[serde(default)]
    pub lessons: Vec<LessonDef>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PathDef {
    pub id: PathId,
    #[serde(default)]
    pub title: String,
    /// Course ids in curriculum order.
    #[serde(default)]
    pub courses: Vec<CourseId>,
    #[serde(default)]
    pub recommendation_eligible: bool,
}

/// The full content hierarchy.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Catalog {
    #[serde(default)]
    pub courses: Vec<CourseDef>,
    #[serde(default)]
    pub paths: Vec<PathDef>,
}

impl Catalog {
    /// Check ids, orders, durations and cross references.
    pub fn validate(&self) -> Result<(), CoreError> {
        let mut course_ids: HashSet<&CourseId> = HashSet::new();
        let mut lesson_ids: HashSet<&LessonId> = HashSet::new();

        for course in &self.courses {
            if !course_ids.insert(&course.id) {
                return Err(CoreError::Conflict(format!(
                    "Duplicate course id '{}'",
                    course.id
                )));
            }

            let mut orders: HashSet<u32> = HashSet::new();
            for lesson in &course.lessons {
                if !lesson_ids.insert(&lesson.id) {
                    return Err(CoreError::Conflict(format!(
                        "Duplicate lesson id '{}'",
                        lesson.id
                    )));
                }
                if !orders.insert(lesson.order) {
                    return Err(CoreError::Validation(format!(
                        "Lesson order {} is used twice in course '{}'",
                        lesson.order, course.id
                    )));
                }
                validate_seconds("duration", &lesson.id, lesson.duration)?;
                validate_seconds("watch position", &lesson.id, lesson.watch_position)?;
            }
        }

        let mut path_ids: HashSet<&PathId> = HashSet::new();
        for path in &self.paths {
            if !path_ids.insert(&path.id) {
                return Err(CoreError::Conflict(format!("Duplicate path id '{}'", path.id)));
            }

            let mut seen: HashSet<&CourseId> = HashSet::new();
            for course_id in &path.courses {
                if !course_ids.contains(course_id) {
                    return Err(CoreError::not_found("course", course_id));
                }
                if !seen.insert(course_id) {
                    return Err(CoreError::Validation(format!(
                        "Course '{course_id}' appears twice in path '{}'",
                        path.id
                    )));
                }
            }
        }

        Ok(())
    }
}

fn validate_seconds(field: &str, lesson_id: &LessonId, value: Seconds) -> Result<(), CoreError> {
    if value.is_finite() && value >= 0.0 {
        Ok(())
    } else {
        Err(CoreError::Validation(format!(
            "Lesson '{lesson_id}' has an invalid {field}: {value}"
        )))
    }
}
