//! `learnpath-player` library crate.
//!
//! Scenario parsing and replay, exposed for integration testing. The
//! binary entrypoint lives in `main.rs`.

pub mod config;
pub mod replay;
pub mod scenario;
