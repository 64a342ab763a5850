//! Lessons: units, loading, running and reporting
//!
//! - [`unit`]: [`LessonUnit`] and its [`Expectation`]
//! - [`loader`]: reads `*.lesson` pages and `playground.toml` manifests
//! - [`runner`]: runs each unit in a fresh interpreter and judges the result
//! - [`report`]: the plain-text report printed by `primer run`

pub mod loader;
pub mod report;
pub mod runner;
pub mod unit;

pub use loader::{LoadError, Playground};
pub use runner::{ErrorDescriptor, ExecutionResult, LessonRunner, RunnerConfig, Verdict};
pub use unit::{Expectation, LessonUnit};
