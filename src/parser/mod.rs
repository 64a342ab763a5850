//! Lesson source parser
//!
//! This module transforms lesson source text into an Abstract Syntax Tree (AST):
//! - [`lexer`]: Tokenization (source text → tokens)
//! - [`parse`]: Parsing (tokens → AST)
//! - [`ast`]: AST node definitions
//!
//! # Supported Language
//!
//! The parser accepts the small Swift-flavoured teaching language used by lessons:
//! - Types: `Int`, `UInt`, `Double`/`Float`, `String`, `Bool`, `[T]`, `[K: V]`, structs
//! - Statements: `let`/`var`, assignments, `if`, `while`, `repeat`, `for-in`, `func`, `struct`
//! - Expressions: arithmetic, comparison, logical, ranges, `??`, ternary, calls,
//!   methods, subscripts and string interpolation
//! - No closures, optionals, enums, classes, protocols or generics
//!
//! # Parser Implementation
//!
//! Hand-written recursive descent parser with one method per precedence level.
//! No external parser generator dependencies.

pub mod ast;
pub mod lexer;
pub mod parse;

mod declarations;
mod expressions;
mod statements;
