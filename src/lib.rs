//! # Introduction
//!
//! primer runs annotated lesson pages written in a small teaching language
//! (constants and variables, basic types, collections, structs, control flow
//! and functions). Each page and each of its exercise lines is a *unit* that
//! runs in isolation and is judged against the output and errors its author
//! annotated. Results can be printed as a report or stepped through in a
//! terminal UI built with [ratatui](https://docs.rs/ratatui).
//!
//! ## Execution pipeline
//!
//! ```text
//! Page → Loader → Units → Lexer → Parser → AST → Interpreter → Result (+ Snapshots) → Report / TUI
//! ```
//!
//! 1. [`lesson`]: loads pages and manifests, runs units, judges and reports.
//! 2. [`parser`]: tokenises a unit and builds its AST.
//! 3. [`interpreter`]: walks the AST with scoped bindings, capturing output and,
//!    when asked, a [`snapshot::Snapshot`] after each statement.
//! 4. [`memory`]: values and the binding stack.
//! 5. [`snapshot`]: bounded trace and the [`snapshot::MockTerminal`] that
//!    records `print` output.
//! 6. [`ui`]: ratatui viewer; not part of the stable library API.
//!
//! ## Example
//!
//! ```
//! use primer::lesson::{LessonRunner, LessonUnit, RunnerConfig};
//!
//! let unit = LessonUnit::new("sum", "var total = 0\nfor n in [1, 2, 3, 4, 5] {\n    total += n\n}\nprint(total)")
//!     .expecting_output(["15"]);
//! let result = LessonRunner::new(RunnerConfig::default()).run_unit(&unit);
//! assert!(result.passed());
//! ```

pub mod interpreter;
pub mod lesson;
pub mod memory;
pub mod parser;
pub mod snapshot;
pub mod ui;
