//! Plain-text report of a run
//!
//! ```text
//! == Constants and Variables
//!    | 42
//!    ok
//! == Constants and Variables (exercise 1)
//!    error[ImmutableAssignment] line 7: cannot assign to 'apple': it is a 'let' constant
//!    ok (expected ImmutableAssignment)
//!
//! 1 passed, 0 failed
//! ```
//!
//! Exercise blocks leave out the page output, which their checks ignore.

use crate::lesson::runner::{ExecutionResult, Verdict};
use std::fmt::{self, Write};

const INDENT: &str = "   ";

/// Pass and fail counts of a run
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Summary {
    pub passed: usize,
    pub failed: usize,
}

impl Summary {
    pub fn of(results: &[ExecutionResult]) -> Self {
        let passed = results.iter().filter(|r| r.passed()).count();
        Summary {
            passed,
            failed: results.len() - passed,
        }
    }

    pub fn all_passed(&self) -> bool {
        self.failed == 0
    }
}

impl fmt::Display for Summary {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} passed, {} failed", self.passed, self.failed)
    }
}

/// Render every result followed by the summary line. With `quiet`, passing
/// units are left out.
pub fn render_report(results: &[ExecutionResult], quiet: bool) -> String {
    let mut out = String::new();
    for result in results.iter().filter(|r| !quiet || !r.passed()) {
        // Writing to a String cannot fail
        let _ = render_result(&mut out, result);
    }
    if !out.is_empty() {
        out.push('\n');
    }
    let _ = writeln!(out, "{}", Summary::of(results));
    out
}

fn render_result(out: &mut String, result: &ExecutionResult) -> fmt::Result {
    writeln!(out, "== {}", result.unit)?;
    if !result.is_exercise {
        for line in &result.output {
            writeln!(out, "{}| {}", INDENT, line)?;
        }
    }
    if let Some(error) = &result.error {
        writeln!(out, "{}{}", INDENT, error)?;
    }
    match &result.verdict {
        Verdict::Pass => match result.expected_error {
            Some(kind) => writeln!(out, "{}ok (expected {})", INDENT, kind),
            None => writeln!(out, "{}ok", INDENT),
        },
        Verdict::Fail { reasons } => {
            for reason in reasons {
                writeln!(out, "{}FAIL {}", INDENT, reason)?;
            }
            Ok(())
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::interpreter::errors::ErrorKind;
    use crate::lesson::runner::ErrorDescriptor;

    fn result(unit: &str, output: &[&str], verdict: Verdict) -> ExecutionResult {
        ExecutionResult {
            unit: unit.to_string(),
            is_exercise: false,
            output: output.iter().map(|s| s.to_string()).collect(),
            error: None,
            expected_error: None,
            verdict,
            steps: 1,
            trace: Vec::new(),
            trace_truncated: false,
        }
    }

    fn sample() -> Vec<ExecutionResult> {
        let mut exercise = result("Constants (exercise 1)", &["42"], Verdict::Pass);
        exercise.is_exercise = true;
        exercise.error = Some(ErrorDescriptor {
            kind: ErrorKind::ImmutableAssignment,
            message: "cannot assign to 'apple': it is a 'let' constant".to_string(),
            line: Some(7),
        });
        exercise.expected_error = Some(ErrorKind::ImmutableAssignment);

        vec![
            result("Constants", &["42"], Verdict::Pass),
            exercise,
            result(
                "Collections",
                &["4", "5"],
                Verdict::Fail {
                    reasons: vec!["expected output line 2 to be \"4\", got \"5\"".to_string()],
                },
            ),
        ]
    }

    #[test]
    fn test_full_report() {
        let expected = "\
== Constants
   | 42
   ok
== Constants (exercise 1)
   error[ImmutableAssignment] line 7: cannot assign to 'apple': it is a 'let' constant
   ok (expected ImmutableAssignment)
== Collections
   | 4
   | 5
   FAIL expected output line 2 to be \"4\", got \"5\"

2 passed, 1 failed
";
        assert_eq!(render_report(&sample(), false), expected);
    }

    #[test]
    fn test_quiet_report() {
        let report = render_report(&sample(), true);
        assert!(report.starts_with("== Collections\n"));
        assert!(!report.contains("== Constants"));
        assert!(report.ends_with("2 passed, 1 failed\n"));

        let all_pass = vec![result("Constants", &["42"], Verdict::Pass)];
        assert_eq!(render_report(&all_pass, true), "1 passed, 0 failed\n");
    }

    #[test]
    fn test_summary() {
        let summary = Summary::of(&sample());
        assert_eq!(summary, Summary { passed: 2, failed: 1 });
        assert!(!summary.all_passed());
        assert!(Summary::default().all_passed());
    }
}
