//! Append-only record of harvest runs.

pub mod logger;

pub use logger::{RunEvent, RunLog};
