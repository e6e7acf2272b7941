//! Identifier types shared across the workspace.
//!
//! Content ids (lessons, courses, paths) are authored externally and are
//! plain strings; annotation ids are generated locally.

use std::fmt;

use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Seconds of media time. Fractional, since media resources report
/// sub-second positions.
pub type Seconds = f64;

/// Integer percentage in `0..=100`.
pub type Percent = u8;

macro_rules! define_content_id {
    ($(#[$meta:meta])* $name:ident) => {
        $(#[$meta])*
        #[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
        #[serde(transparent)]
        pub struct $name(String);

        impl $name {
            pub fn new(id: impl Into<String>) -> Self {
                Self(id.into())
            }

            pub fn as_str(&self) -> &str {
                &self.0
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str(&self.0)
            }
        }

        impl From<&str> for $name {
            fn from(id: &str) -> Self {
                Self(id.to_string())
            }
        }

        impl From<String> for $name {
            fn from(id: String) -> Self {
                Self(id)
            }
        }
    };
}

define_content_id!(
    /// Identity of a single playable lesson.
    LessonId
);
define_content_id!(
    /// Identity of a course (an ordered list of lessons).
    CourseId
);
define_content_id!(
    /// Identity of a learning path (an ordered list of courses).
    PathId
);

macro_rules! define_local_id {
    ($(#[$meta:meta])* $name:ident) => {
        $(#[$meta])*
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
        #[serde(transparent)]
        pub struct $name(Uuid);

        impl $name {
            pub fn generate() -> Self {
                Self(Uuid::new_v4())
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                self.0.fmt(f)
            }
        }
    };
}

define_local_id!(
    /// Identity of a bookmark attached to a lesson.
    BookmarkId
);
define_local_id!(
    /// Identity of a note attached to a lesson.
    NoteId
);
define_local_id!(
    /// Identity of one playback session. A new one is issued every time a
    /// lesson is opened, so signals from a superseded session can be told
    /// apart from current ones.
    SessionId
);

/// Reference to any node of the content hierarchy.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case", tag = "kind", content = "id")]
pub enum EntityRef {
    Lesson(LessonId),
    Course(CourseId),
    Path(PathId),
}

impl EntityRef {
    /// Entity kind name used in error messages and logs.
    pub fn kind(&self) -> &'static str {
        match self {
            Self::Lesson(_) => "lesson",
            Self::Course(_) => "course",
            Self::Path(_) => "path",
        }
    }
}

impl fmt::Display for EntityRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Lesson(id) => write!(f, "lesson:{id}"),
            Self::Course(id) => write!(f, "course:{id}"),
            Self::Path(id) => write!(f, "path:{id}"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn content_ids_serialize_as_bare_strings() {
        let id = LessonId::new("intro-1");
        assert_eq!(serde_json::to_string(&id).unwrap(), "\"intro-1\"");
        let back: LessonId = serde_json::from_str("\"intro-1\"").unwrap();
        assert_eq!(back, id);
    }

    #[test]
    fn entity_ref_is_tagged_by_kind() {
        let entity = EntityRef::Course(CourseId::new("rust-101"));
        let json = serde_json::to_value(&entity).unwrap();
        assert_eq!(json["kind"], "course");
        assert_eq!(json["id"], "rust-101");
        assert_eq!(entity.to_string(), "course:rust-101");
    }

    #[test]
    fn generated_session_ids_are_distinct() {
        assert_ne!(SessionId::generate(), SessionId::generate());
    }
}
