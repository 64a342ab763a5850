//! Running lesson units in isolation
//!
//! Every unit gets a fresh [`Interpreter`], so no state crosses unit
//! boundaries. A failing statement stops its own unit only; later units
//! still run.
//!
//! Units are parsed and run on a worker thread with a stack of
//! [`UNIT_STACK_SIZE`], which the parser's and interpreter's nesting limits
//! are sized against.

use crate::interpreter::engine::{ExecutionLimits, Interpreter, UNIT_STACK_SIZE};
use crate::interpreter::errors::{ErrorKind, RuntimeError};
use crate::lesson::loader::RunnerSettings;
use crate::lesson::unit::LessonUnit;
use crate::parser::parse::{ParseError, Parser};
use crate::snapshot::Snapshot;
use std::fmt;
use std::thread;

/// Runner settings: defaults, then manifest `[runner]` values, then CLI flags
#[derive(Debug, Clone, PartialEq)]
pub struct RunnerConfig {
    pub max_steps: usize,
    pub max_call_depth: usize,
    /// Run the units derived from `//~` exercise lines
    pub exercises: bool,
    /// Keep a per-statement trace for the viewer
    pub record_trace: bool,
    pub snapshot_limit: usize,
    /// Case-insensitive substring a unit name must contain
    pub filter: Option<String>,
}

impl Default for RunnerConfig {
    fn default() -> Self {
        let limits = ExecutionLimits::default();
        RunnerConfig {
            max_steps: limits.max_steps,
            max_call_depth: limits.max_call_depth,
            exercises: true,
            record_trace: false,
            snapshot_limit: limits.snapshot_limit,
            filter: None,
        }
    }
}

impl RunnerConfig {
    /// Layer a manifest's `[runner]` table over this config
    pub fn apply_settings(&mut self, settings: &RunnerSettings) {
        if let Some(max_steps) = settings.max_steps {
            self.max_steps = max_steps;
        }
        if let Some(max_call_depth) = settings.max_call_depth {
            self.max_call_depth = max_call_depth;
        }
        if let Some(exercises) = settings.exercises {
            self.exercises = exercises;
        }
    }

    fn limits(&self) -> ExecutionLimits {
        ExecutionLimits {
            max_steps: self.max_steps,
            max_call_depth: self.max_call_depth,
            record_trace: self.record_trace,
            snapshot_limit: self.snapshot_limit,
        }
    }
}

/// What went wrong in a unit
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ErrorDescriptor {
    pub kind: ErrorKind,
    pub message: String,
    pub line: Option<usize>,
}

impl From<&RuntimeError> for ErrorDescriptor {
    fn from(err: &RuntimeError) -> Self {
        ErrorDescriptor {
            kind: err.kind(),
            message: err.to_string(),
            line: Some(err.location().line),
        }
    }
}

impl From<&ParseError> for ErrorDescriptor {
    fn from(err: &ParseError) -> Self {
        ErrorDescriptor {
            kind: ErrorKind::Syntax,
            message: err.message.clone(),
            line: Some(err.location.line),
        }
    }
}

impl fmt::Display for ErrorDescriptor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.line {
            Some(line) => write!(f, "error[{}] line {}: {}", self.kind, line, self.message),
            None => write!(f, "error[{}]: {}", self.kind, self.message),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Verdict {
    Pass,
    Fail { reasons: Vec<String> },
}

impl Verdict {
    pub fn is_pass(&self) -> bool {
        matches!(self, Verdict::Pass)
    }
}

/// The outcome of running one unit
#[derive(Debug, Clone, PartialEq)]
pub struct ExecutionResult {
    pub unit: String,
    /// Derived from a `//~` line; only the error kind is checked
    pub is_exercise: bool,
    pub output: Vec<String>,
    pub error: Option<ErrorDescriptor>,
    /// The error kind the unit was annotated to raise
    pub expected_error: Option<ErrorKind>,
    pub verdict: Verdict,
    pub steps: usize,
    /// Per-statement snapshots; empty unless tracing was on
    pub trace: Vec<Snapshot>,
    pub trace_truncated: bool,
}

impl ExecutionResult {
    pub fn passed(&self) -> bool {
        self.verdict.is_pass()
    }
}

pub struct LessonRunner {
    config: RunnerConfig,
}

impl LessonRunner {
    pub fn new(config: RunnerConfig) -> Self {
        LessonRunner { config }
    }

    /// The units this runner's filter and exercise setting keep, in order
    pub fn select(&self, units: &[LessonUnit]) -> Vec<LessonUnit> {
        let filter = self.config.filter.as_ref().map(|f| f.to_lowercase());
        units
            .iter()
            .filter(|unit| self.config.exercises || !unit.is_exercise)
            .filter(|unit| {
                filter
                    .as_ref()
                    .map_or(true, |f| unit.name.to_lowercase().contains(f.as_str()))
            })
            .cloned()
            .collect()
    }

    /// Run every unit in order, one result per unit
    pub fn run_all(&self, units: &[LessonUnit]) -> Vec<ExecutionResult> {
        units.iter().map(|unit| self.run_unit(unit)).collect()
    }

    /// Run one unit with a fresh interpreter
    pub fn run_unit(&self, unit: &LessonUnit) -> ExecutionResult {
        log::debug!("running '{}'", unit.name);

        let UnitRun {
            output,
            error,
            steps,
            trace,
            trace_truncated,
        } = self.execute_on_worker(unit);

        log::debug!(
            "finished '{}' after {} steps with {} output lines",
            unit.name,
            steps,
            output.len()
        );

        let verdict = judge(unit, &output, error.as_ref());
        match &verdict {
            Verdict::Pass => log::info!("'{}' passed", unit.name),
            Verdict::Fail { reasons } => log::info!("'{}' failed: {}", unit.name, reasons.join("; ")),
        }

        ExecutionResult {
            unit: unit.name.clone(),
            is_exercise: unit.is_exercise,
            output,
            error,
            expected_error: unit.expectation.error,
            verdict,
            steps,
            trace,
            trace_truncated,
        }
    }

    /// Execute on a thread with a [`UNIT_STACK_SIZE`] stack, falling back to
    /// the current thread if one cannot be spawned
    fn execute_on_worker(&self, unit: &LessonUnit) -> UnitRun {
        let limits = self.config.limits();
        let source = unit.source.as_str();
        thread::scope(|scope| {
            let spawned = thread::Builder::new()
                .name(format!("unit: {}", unit.name))
                .stack_size(UNIT_STACK_SIZE)
                .spawn_scoped(scope, || execute(source, limits.clone()));
            match spawned {
                Ok(handle) => handle
                    .join()
                    .unwrap_or_else(|panic| std::panic::resume_unwind(panic)),
                Err(err) => {
                    log::warn!("could not spawn a thread for '{}': {}", unit.name, err);
                    execute(source, limits.clone())
                }
            }
        })
    }
}

/// What one unit produced before it finished or failed
struct UnitRun {
    output: Vec<String>,
    error: Option<ErrorDescriptor>,
    steps: usize,
    trace: Vec<Snapshot>,
    trace_truncated: bool,
}

/// Parse and run `source` with a fresh interpreter
fn execute(source: &str, limits: ExecutionLimits) -> UnitRun {
    let program = match Parser::new(source).and_then(|mut parser| parser.parse_program()) {
        Ok(program) => program,
        Err(err) => {
            return UnitRun {
                output: Vec::new(),
                error: Some(ErrorDescriptor::from(&err)),
                steps: 0,
                trace: Vec::new(),
                trace_truncated: false,
            }
        }
    };

    let mut interpreter = Interpreter::new(program, limits);
    let error = interpreter.run().err().map(|err| ErrorDescriptor::from(&err));
    let steps = interpreter.steps();
    let (output, trace, trace_truncated) = interpreter.into_parts();
    UnitRun {
        output,
        error,
        steps,
        trace,
        trace_truncated,
    }
}

/// Compare what happened with what the unit's annotations expect
fn judge(unit: &LessonUnit, output: &[String], error: Option<&ErrorDescriptor>) -> Verdict {
    let mut reasons = Vec::new();

    match (unit.expectation.error, error) {
        (Some(expected), Some(actual)) if actual.kind != expected => reasons.push(format!(
            "expected {}, got {}: {}",
            expected, actual.kind, actual.message
        )),
        (Some(expected), None) => reasons.push(format!("expected {}, but the unit ran without error", expected)),
        (None, Some(actual)) => reasons.push(format!("unexpected {}", actual)),
        _ => {}
    }

    if let Some(expected) = &unit.expectation.output {
        if let Some(reason) = compare_output(expected, output) {
            reasons.push(reason);
        }
    }

    if reasons.is_empty() {
        Verdict::Pass
    } else {
        Verdict::Fail { reasons }
    }
}

/// Describe the first difference between expected and actual output lines
fn compare_output(expected: &[String], actual: &[String]) -> Option<String> {
    for (i, want) in expected.iter().enumerate() {
        match actual.get(i) {
            Some(got) if got == want => {}
            Some(got) => {
                return Some(format!(
                    "expected output line {} to be {:?}, got {:?}",
                    i + 1,
                    want,
                    got
                ))
            }
            None => {
                return Some(format!(
                    "expected output line {} to be {:?}, got nothing",
                    i + 1,
                    want
                ))
            }
        }
    }
    actual
        .get(expected.len())
        .map(|extra| format!("unexpected output line {}: {:?}", expected.len() + 1, extra))
}
