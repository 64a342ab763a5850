//! Lesson units and what their author expects of them

use crate::interpreter::errors::ErrorKind;
use std::path::PathBuf;

/// What a unit's annotations say should happen when it runs
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Expectation {
    /// Expected output lines from `//>` annotations; `None` leaves output unchecked
    pub output: Option<Vec<String>>,
    /// Error kind from `//!` (or the kind an exercise line should raise)
    pub error: Option<ErrorKind>,
}

impl Expectation {
    pub fn is_empty(&self) -> bool {
        self.output.is_none() && self.error.is_none()
    }
}

/// One named, self-contained teaching fragment
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LessonUnit {
    pub name: String,
    /// Executable source. Line numbers match the page it came from.
    pub source: String,
    /// Page file, relative to the playground root
    pub page: PathBuf,
    /// Derived from a `//~` line rather than being the page itself
    pub is_exercise: bool,
    pub expectation: Expectation,
}

impl LessonUnit {
    /// A unit with no annotations, e.g. for running a bare snippet
    pub fn new(name: impl Into<String>, source: impl Into<String>) -> Self {
        LessonUnit {
            name: name.into(),
            source: source.into(),
            page: PathBuf::new(),
            is_exercise: false,
            expectation: Expectation::default(),
        }
    }

    pub fn expecting_output<I, S>(mut self, lines: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.expectation.output = Some(lines.into_iter().map(Into::into).collect());
        self
    }

    pub fn expecting_error(mut self, kind: ErrorKind) -> Self {
        self.expectation.error = Some(kind);
        self
    }
}
