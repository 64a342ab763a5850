//! Lesson interpreter execution engine
//!
//! This module provides the core execution logic:
//! - [`engine`]: Main interpreter with statement dispatch and snapshots
//! - [`errors`]: Runtime error types and the lesson-level error taxonomy
//!
//! # Execution Model
//!
//! The interpreter walks the AST and executes statements one at a time.
//! After each statement, a snapshot can be taken so the viewer can step
//! through the run afterwards. The first runtime error stops the unit.
//!
//! # Built-in Functions
//!
//! Built-in functions (`print`, conversions, `min`/`max`/`abs`) and built-in
//! collection members live in [`builtins`] and [`ops`] as further
//! `impl Interpreter` blocks.

pub mod engine;
pub mod errors;

mod builtins;
mod expressions;
mod loops;
mod ops;
mod statements;
