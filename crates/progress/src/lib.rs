//! Learner progress across the Lesson → Course → Path hierarchy.
//!
//! The [`ProgressAggregator`] owns the content tree built from a
//! [`Catalog`], rolls lesson completion up into courses and paths, and
//! publishes a [`ProgressEvent`] for every change. [`PlaybackSync`] wires
//! a playback controller's output into it.

pub mod aggregator;
pub mod catalog;
pub mod event;
pub mod model;
pub mod sync;

pub use aggregator::ProgressAggregator;
pub use catalog::{Catalog, CourseDef, LessonDef, PathDef};
pub use event::ProgressEvent;
pub use model::{Bookmark, CourseProgress, LessonState, Note, PathProgress};
pub use sync::{PlaybackSync, SyncReport};
