//! Call stack and block scopes
//!
//! This module provides name resolution for the interpreter:
//! - [`Stack`]: the call stack, whose bottom frame holds the unit's globals
//! - [`StackFrame`]: a single function's activation record with nested block scopes
//! - [`Binding`]: a named value with its declared type and mutability
//!
//! # Scope Tracking
//!
//! Every `{ }` block pushes a scope. When a scope (or a whole frame) ends, the
//! names it declared are remembered as *expired*, so that a later reference can
//! be reported as a scope violation instead of an unknown name.
//!
//! Function bodies see their own scopes plus the unit's global scope. Blocks of
//! the caller are not visible.

use super::value::Value;
use crate::parser::ast::{SourceLocation, Type};
use rustc_hash::{FxHashMap, FxHashSet};

/// A named value visible in some scope
#[derive(Debug, Clone)]
pub struct Binding {
    pub value: Value,
    pub declared_type: Type,
    pub is_mutable: bool,
    pub location: SourceLocation,
}

impl Binding {
    pub fn new(value: Value, declared_type: Type, is_mutable: bool, location: SourceLocation) -> Self {
        Binding {
            value,
            declared_type,
            is_mutable,
            location,
        }
    }
}

#[derive(Debug, Clone, Default)]
struct Scope {
    bindings: FxHashMap<String, Binding>,
    insertion_order: Vec<String>,
}

/// Stack frame for a function call (or the unit's top level)
#[derive(Debug, Clone)]
pub struct StackFrame {
    pub function_name: String,
    scopes: Vec<Scope>,
}

impl StackFrame {
    pub fn new(function_name: String) -> Self {
        StackFrame {
            function_name,
            scopes: vec![Scope::default()],
        }
    }

    fn find(&self, name: &str) -> Option<usize> {
        self.scopes
            .iter()
            .rposition(|scope| scope.bindings.contains_key(name))
    }
}

/// The call stack
#[derive(Debug, Clone)]
pub struct Stack {
    frames: Vec<StackFrame>,
    expired: FxHashSet<String>,
}

impl Stack {
    /// A stack holding only the global frame
    pub fn new() -> Self {
        Stack {
            frames: vec![StackFrame::new("<top level>".to_string())],
            expired: FxHashSet::default(),
        }
    }

    fn current_frame(&self) -> &StackFrame {
        // The global frame is never popped
        &self.frames[self.frames.len() - 1]
    }

    fn current_frame_mut(&mut self) -> &mut StackFrame {
        let top = self.frames.len() - 1;
        &mut self.frames[top]
    }

    /// Number of active function calls
    pub fn call_depth(&self) -> usize {
        self.frames.len() - 1
    }

    /// Name of the innermost function, or `None` at the top level
    pub fn current_function(&self) -> Option<&str> {
        if self.frames.len() > 1 {
            Some(&self.current_frame().function_name)
        } else {
            None
        }
    }

    /// Enter a new block scope
    pub fn push_scope(&mut self) {
        self.current_frame_mut().scopes.push(Scope::default());
    }

    /// Exit the current block scope
    pub fn pop_scope(&mut self) {
        let frame = self.current_frame_mut();
        if frame.scopes.len() <= 1 {
            return;
        }
        if let Some(scope) = frame.scopes.pop() {
            self.expired.extend(scope.insertion_order);
        }
    }

    /// Push a new stack frame
    pub fn push_frame(&mut self, function_name: String) {
        self.frames.push(StackFrame::new(function_name));
    }

    /// Pop the top stack frame; the global frame stays
    pub fn pop_frame(&mut self) {
        if self.frames.len() <= 1 {
            return;
        }
        if let Some(frame) = self.frames.pop() {
            for scope in frame.scopes {
                self.expired.extend(scope.insertion_order);
            }
        }
    }

    /// Declare a binding in the innermost scope
    pub fn declare(&mut self, name: String, binding: Binding) -> Result<(), String> {
        let scope = self
            .current_frame_mut()
            .scopes
            .last_mut()
            .ok_or_else(|| "no active scope".to_string())?;

        if scope.bindings.contains_key(&name) {
            return Err(format!("invalid redeclaration of '{}'", name));
        }
        scope.insertion_order.push(name.clone());
        scope.bindings.insert(name, binding);
        Ok(())
    }

    /// Resolve a name: innermost scope of the current frame first, then globals
    pub fn get(&self, name: &str) -> Option<&Binding> {
        let frame = self.current_frame();
        if let Some(index) = frame.find(name) {
            return frame.scopes[index].bindings.get(name);
        }
        if self.frames.len() > 1 {
            return self.frames[0].scopes[0].bindings.get(name);
        }
        None
    }

    /// Resolve a name in the current frame only, ignoring globals
    pub fn get_local(&self, name: &str) -> Option<&Binding> {
        let frame = self.current_frame();
        frame
            .find(name)
            .and_then(|index| frame.scopes[index].bindings.get(name))
    }

    /// Mutable variant of [`Stack::get`]
    pub fn get_mut(&mut self, name: &str) -> Option<&mut Binding> {
        let top = self.frames.len() - 1;
        if let Some(index) = self.frames[top].find(name) {
            return self.frames[top].scopes[index].bindings.get_mut(name);
        }
        if top > 0 {
            return self.frames[0].scopes[0].bindings.get_mut(name);
        }
        None
    }

    /// Whether `name` was declared in a scope that has already ended
    pub fn is_expired(&self, name: &str) -> bool {
        self.expired.contains(name)
    }

    /// Bindings visible from the current position, outermost first. Globals
    /// come first inside a function; shadowed names are listed once.
    pub fn visible_bindings(&self) -> Vec<(&str, &Binding)> {
        let mut visible: Vec<(&str, &Binding)> = Vec::new();
        let frame = self.current_frame();

        let mut scopes: Vec<&Scope> = Vec::new();
        if self.frames.len() > 1 {
            scopes.push(&self.frames[0].scopes[0]);
        }
        scopes.extend(frame.scopes.iter());

        for scope in scopes {
            for name in &scope.insertion_order {
                if let Some(binding) = scope.bindings.get(name) {
                    if let Some(slot) = visible.iter_mut().find(|(n, _)| *n == name.as_str()) {
                        *slot = (name.as_str(), binding);
                    } else {
                        visible.push((name.as_str(), binding));
                    }
                }
            }
        }

        visible
    }
}

impl Default for Stack {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn binding(n: i64, is_mutable: bool) -> Binding {
        Binding::new(Value::Int(n), Type::Int, is_mutable, SourceLocation::default())
    }

    #[test]
    fn test_block_scope_expires_names() {
        let mut stack = Stack::new();
        stack.push_scope();
        stack.declare("inner".into(), binding(1, false)).unwrap();
        assert!(stack.get("inner").is_some());
        stack.pop_scope();

        assert!(stack.get("inner").is_none());
        assert!(stack.is_expired("inner"));
        assert!(!stack.is_expired("never"));
    }

    #[test]
    fn test_redeclaration_in_same_scope() {
        let mut stack = Stack::new();
        stack.declare("x".into(), binding(1, false)).unwrap();
        assert!(stack.declare("x".into(), binding(2, false)).is_err());

        // Shadowing in a nested block is fine
        stack.push_scope();
        stack.declare("x".into(), binding(3, true)).unwrap();
        assert_eq!(stack.get("x").unwrap().value, Value::Int(3));
        stack.pop_scope();
        assert_eq!(stack.get("x").unwrap().value, Value::Int(1));
    }

    #[test]
    fn test_function_frame_sees_globals_only() {
        let mut stack = Stack::new();
        stack.declare("global".into(), binding(1, true)).unwrap();
        stack.push_scope();
        stack.declare("block".into(), binding(2, true)).unwrap();

        stack.push_frame("f".into());
        assert_eq!(stack.call_depth(), 1);
        assert_eq!(stack.current_function(), Some("f"));
        assert!(stack.get("global").is_some());
        assert!(stack.get("block").is_none());

        stack.get_mut("global").unwrap().value = Value::Int(10);
        stack.pop_frame();
        assert_eq!(stack.get("global").unwrap().value, Value::Int(10));
    }

    #[test]
    fn test_visible_bindings_order_and_shadowing() {
        let mut stack = Stack::new();
        stack.declare("a".into(), binding(1, false)).unwrap();
        stack.declare("b".into(), binding(2, false)).unwrap();
        stack.push_scope();
        stack.declare("a".into(), binding(3, false)).unwrap();

        let visible = stack.visible_bindings();
        let names: Vec<&str> = visible.iter().map(|(n, _)| *n).collect();
        assert_eq!(names, vec!["a", "b"]);
        assert_eq!(visible[0].1.value, Value::Int(3));
    }
}
