//! Operators and place access, as further `impl Interpreter` blocks
//!
//! - [`binary`]: arithmetic, comparison, logical and range operators, plus unary `-` and `!`
//! - [`access`]: subscripts, properties and non-mutating built-in methods
//! - [`assign`]: assignment to places and mutating collection methods

pub mod access;
pub mod assign;
pub mod binary;
