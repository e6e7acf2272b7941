//! Shared building blocks for the `learnpath` workspace.
//!
//! - [`error::CoreError`]: the domain error every crate returns.
//! - [`types`]: content, annotation and session identifiers.
//! - [`time_format`]: `m:ss` / `h:mm:ss` rendering and parsing.
//! - [`ratio`]: the percentage arithmetic behind progress aggregation.

pub mod error;
pub mod ratio;
pub mod time_format;
pub mod types;

pub use error::CoreError;
