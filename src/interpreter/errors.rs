//! Runtime error types for the lesson interpreter
//!
//! This module defines [`RuntimeError`], which represents all errors that can occur
//! while a unit executes (as opposed to parse errors or I/O errors), and
//! [`ErrorKind`], the coarse taxonomy lessons annotate their expected failures with.
//!
//! All runtime errors are fatal for the unit that raised them: execution stops at
//! the failing statement and the error is reported.

use crate::parser::ast::SourceLocation;
use std::fmt;
use std::str::FromStr;

/// Error categories a lesson can expect with `//! Kind` or `//~ Kind: code`
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorKind {
    TypeMismatch,
    ImmutableAssignment,
    IndexOutOfBounds,
    MissingKey,
    ScopeViolation,
    UndefinedName,
    ArgumentMismatch,
    DivisionByZero,
    Overflow,
    RecursionLimit,
    StepLimit,
    Syntax,
}

impl ErrorKind {
    pub const ALL: [ErrorKind; 12] = [
        ErrorKind::TypeMismatch,
        ErrorKind::ImmutableAssignment,
        ErrorKind::IndexOutOfBounds,
        ErrorKind::MissingKey,
        ErrorKind::ScopeViolation,
        ErrorKind::UndefinedName,
        ErrorKind::ArgumentMismatch,
        ErrorKind::DivisionByZero,
        ErrorKind::Overflow,
        ErrorKind::RecursionLimit,
        ErrorKind::StepLimit,
        ErrorKind::Syntax,
    ];

    pub fn name(&self) -> &'static str {
        match self {
            ErrorKind::TypeMismatch => "TypeMismatch",
            ErrorKind::ImmutableAssignment => "ImmutableAssignment",
            ErrorKind::IndexOutOfBounds => "IndexOutOfBounds",
            ErrorKind::MissingKey => "MissingKey",
            ErrorKind::ScopeViolation => "ScopeViolation",
            ErrorKind::UndefinedName => "UndefinedName",
            ErrorKind::ArgumentMismatch => "ArgumentMismatch",
            ErrorKind::DivisionByZero => "DivisionByZero",
            ErrorKind::Overflow => "Overflow",
            ErrorKind::RecursionLimit => "RecursionLimit",
            ErrorKind::StepLimit => "StepLimit",
            ErrorKind::Syntax => "Syntax",
        }
    }
}

impl fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.name())
    }
}

impl FromStr for ErrorKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let s = s.trim();
        ErrorKind::ALL
            .iter()
            .copied()
            .find(|kind| kind.name() == s)
            .ok_or_else(|| format!("unknown error kind '{}'", s))
    }
}

/// Runtime errors that can occur during execution
#[derive(Debug, Clone, PartialEq)]
pub enum RuntimeError {
    /// Value of the wrong type for its context
    TypeMismatch {
        message: String,
        location: SourceLocation,
    },

    /// Write through a `let` binding, `let` property, parameter or temporary
    ImmutableAssignment {
        target: String,
        reason: String,
        location: SourceLocation,
    },

    /// Array index outside `0..count`
    IndexOutOfBounds {
        index: i64,
        count: usize,
        location: SourceLocation,
    },

    /// `first`/`last`/`removeLast` on an empty array
    EmptyCollection {
        member: String,
        location: SourceLocation,
    },

    /// Range whose upper bound is below its lower bound
    InvalidRange {
        start: i64,
        end: i64,
        location: SourceLocation,
    },

    /// Dictionary lookup of an absent key
    MissingKey {
        key: String,
        location: SourceLocation,
    },

    /// Reference to a name whose enclosing block has ended
    ScopeViolation {
        name: String,
        location: SourceLocation,
    },

    /// Second declaration of a name in the same scope
    Redeclaration {
        name: String,
        location: SourceLocation,
    },

    /// Reference to a name that was never declared
    UndefinedName {
        name: String,
        location: SourceLocation,
    },

    /// Property or method that the value's type does not have
    UnknownMember {
        type_name: String,
        member: String,
        location: SourceLocation,
    },

    /// Wrong argument count or argument label
    ArgumentMismatch {
        function: String,
        message: String,
        location: SourceLocation,
    },

    /// Integer division or remainder by zero
    DivisionByZero { location: SourceLocation },

    /// Integer arithmetic overflow
    Overflow {
        operation: String,
        location: SourceLocation,
    },

    /// Call depth exceeded the configured limit
    RecursionLimit {
        limit: usize,
        location: SourceLocation,
    },

    /// Statements and expressions nested past the evaluation depth limit
    NestingLimit {
        limit: usize,
        location: SourceLocation,
    },

    /// Statement budget exhausted
    StepLimit {
        limit: usize,
        location: SourceLocation,
    },
}

impl RuntimeError {
    pub fn location(&self) -> SourceLocation {
        match self {
            RuntimeError::TypeMismatch { location, .. }
            | RuntimeError::ImmutableAssignment { location, .. }
            | RuntimeError::IndexOutOfBounds { location, .. }
            | RuntimeError::EmptyCollection { location, .. }
            | RuntimeError::InvalidRange { location, .. }
            | RuntimeError::MissingKey { location, .. }
            | RuntimeError::ScopeViolation { location, .. }
            | RuntimeError::Redeclaration { location, .. }
            | RuntimeError::UndefinedName { location, .. }
            | RuntimeError::UnknownMember { location, .. }
            | RuntimeError::ArgumentMismatch { location, .. }
            | RuntimeError::DivisionByZero { location }
            | RuntimeError::Overflow { location, .. }
            | RuntimeError::RecursionLimit { location, .. }
            | RuntimeError::NestingLimit { location, .. }
            | RuntimeError::StepLimit { location, .. } => *location,
        }
    }

    /// The lesson-level category of this error
    pub fn kind(&self) -> ErrorKind {
        match self {
            RuntimeError::TypeMismatch { .. } => ErrorKind::TypeMismatch,
            RuntimeError::ImmutableAssignment { .. } => ErrorKind::ImmutableAssignment,
            RuntimeError::IndexOutOfBounds { .. }
            | RuntimeError::EmptyCollection { .. }
            | RuntimeError::InvalidRange { .. } => ErrorKind::IndexOutOfBounds,
            RuntimeError::MissingKey { .. } => ErrorKind::MissingKey,
            RuntimeError::ScopeViolation { .. } | RuntimeError::Redeclaration { .. } => {
                ErrorKind::ScopeViolation
            }
            RuntimeError::UndefinedName { .. } | RuntimeError::UnknownMember { .. } => {
                ErrorKind::UndefinedName
            }
            RuntimeError::ArgumentMismatch { .. } => ErrorKind::ArgumentMismatch,
            RuntimeError::DivisionByZero { .. } => ErrorKind::DivisionByZero,
            RuntimeError::Overflow { .. } => ErrorKind::Overflow,
            RuntimeError::RecursionLimit { .. } | RuntimeError::NestingLimit { .. } => {
                ErrorKind::RecursionLimit
            }
            RuntimeError::StepLimit { .. } => ErrorKind::StepLimit,
        }
    }

    /// Whether a `??` fallback may recover from this error
    pub fn is_failed_lookup(&self) -> bool {
        matches!(
            self,
            RuntimeError::MissingKey { .. }
                | RuntimeError::IndexOutOfBounds { .. }
                | RuntimeError::EmptyCollection { .. }
        )
    }

    pub(crate) fn type_mismatch(message: impl Into<String>, location: SourceLocation) -> Self {
        RuntimeError::TypeMismatch {
            message: message.into(),
            location,
        }
    }
}

impl fmt::Display for RuntimeError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RuntimeError::TypeMismatch { message, .. } => write!(f, "{}", message),
            RuntimeError::ImmutableAssignment { target, reason, .. } => {
                write!(f, "cannot assign to '{}': {}", target, reason)
            }
            RuntimeError::IndexOutOfBounds { index, count, .. } => {
                write!(
                    f,
                    "index {} out of range for array of {} element{}",
                    index,
                    count,
                    if *count == 1 { "" } else { "s" }
                )
            }
            RuntimeError::EmptyCollection { member, .. } => {
                write!(f, "'{}' of an empty array", member)
            }
            RuntimeError::InvalidRange { start, end, .. } => {
                write!(
                    f,
                    "range requires lower bound <= upper bound, got {} and {}",
                    start, end
                )
            }
            RuntimeError::MissingKey { key, .. } => {
                write!(f, "key {} not found in dictionary", key)
            }
            RuntimeError::ScopeViolation { name, .. } => {
                write!(f, "'{}' is out of scope: its enclosing block has ended", name)
            }
            RuntimeError::Redeclaration { name, .. } => {
                write!(f, "invalid redeclaration of '{}'", name)
            }
            RuntimeError::UndefinedName { name, .. } => {
                write!(f, "cannot find '{}' in scope", name)
            }
            RuntimeError::UnknownMember {
                type_name, member, ..
            } => {
                write!(f, "value of type '{}' has no member '{}'", type_name, member)
            }
            RuntimeError::ArgumentMismatch {
                function, message, ..
            } => {
                write!(f, "call to '{}': {}", function, message)
            }
            RuntimeError::DivisionByZero { .. } => write!(f, "division by zero"),
            RuntimeError::Overflow { operation, .. } => {
                write!(f, "arithmetic overflow in {}", operation)
            }
            RuntimeError::RecursionLimit { limit, .. } => {
                write!(f, "call depth exceeded the limit of {}", limit)
            }
            RuntimeError::NestingLimit { limit, .. } => {
                write!(f, "evaluation nested deeper than {} levels", limit)
            }
            RuntimeError::StepLimit { limit, .. } => {
                write!(f, "execution exceeded the limit of {} steps", limit)
            }
        }
    }
}

impl std::error::Error for RuntimeError {}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_kind_round_trips_through_names() {
        for kind in ErrorKind::ALL {
            assert_eq!(kind.name().parse::<ErrorKind>(), Ok(kind));
        }
        assert!("NotAKind".parse::<ErrorKind>().is_err());
        assert_eq!(" MissingKey ".parse::<ErrorKind>(), Ok(ErrorKind::MissingKey));
    }

    #[test]
    fn test_kind_mapping() {
        let location = SourceLocation::new(3, 1);
        let err = RuntimeError::EmptyCollection {
            member: "first".to_string(),
            location,
        };
        assert_eq!(err.kind(), ErrorKind::IndexOutOfBounds);
        assert!(err.is_failed_lookup());
        assert_eq!(err.location().line, 3);

        let err = RuntimeError::Redeclaration {
            name: "x".to_string(),
            location,
        };
        assert_eq!(err.kind(), ErrorKind::ScopeViolation);
        assert!(!err.is_failed_lookup());
    }

    #[test]
    fn test_display() {
        let err = RuntimeError::ImmutableAssignment {
            target: "apple".to_string(),
            reason: "it is a 'let' constant".to_string(),
            location: SourceLocation::default(),
        };
        assert_eq!(
            err.to_string(),
            "cannot assign to 'apple': it is a 'let' constant"
        );
    }
}
