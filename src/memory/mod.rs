//! Memory model for the lesson interpreter
//!
//! This module provides the core runtime abstractions:
//! - [`value`]: Runtime value representation and rendering
//! - [`stack`]: Call stack with frames, block scopes and bindings
//!
//! There is no heap: arrays, dictionaries and structs are values, and every
//! assignment copies them.

pub mod stack;
pub mod value;
