// Execution engine for the lesson interpreter

use crate::interpreter::errors::RuntimeError;
use crate::memory::{
    stack::{Binding, Stack},
    value::Value,
};
use crate::parser::ast::*;
use crate::snapshot::{BindingView, MockTerminal, Snapshot, SnapshotManager};
use rustc_hash::FxHashMap;
use std::rc::Rc;

/// Non-local control flow raised by `break`, `continue` and `return`
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum ControlFlow {
    Normal,
    Break,
    Continue,
    Return,
}

/// Deepest nesting of statements and expression evaluations in one unit,
/// counted across function calls
pub const MAX_EVALUATION_DEPTH: usize = 8192;

/// Native stack a unit runs on. Leaves 128 KiB per level of
/// [`MAX_EVALUATION_DEPTH`], enough for unoptimised builds.
pub const UNIT_STACK_SIZE: usize = 1024 * 1024 * 1024;

/// Resource bounds and tracing options for one run
#[derive(Debug, Clone, PartialEq)]
pub struct ExecutionLimits {
    /// Statements (and loop iterations) a unit may execute
    pub max_steps: usize,
    /// Maximum number of nested function calls. The default leaves each call
    /// 32 levels of [`MAX_EVALUATION_DEPTH`].
    pub max_call_depth: usize,
    /// Take a snapshot after every executed statement
    pub record_trace: bool,
    /// Estimated bytes the snapshot trace may use
    pub snapshot_limit: usize,
}

impl Default for ExecutionLimits {
    fn default() -> Self {
        ExecutionLimits {
            max_steps: 1_000_000,
            max_call_depth: 256,
            record_trace: false,
            snapshot_limit: 64 * 1024 * 1024,
        }
    }
}

/// The interpreter that executes one lesson unit
pub struct Interpreter {
    /// Parsed unit
    program: Rc<Program>,

    /// Call stack with block scopes
    pub(crate) stack: Stack,

    /// Mock terminal for `print` output
    pub(crate) terminal: MockTerminal,

    /// Current source location being executed
    pub(crate) current_location: SourceLocation,

    /// Per-statement trace for the viewer
    snapshot_manager: SnapshotManager,

    /// Struct definitions (name -> StructDef)
    pub(crate) struct_defs: FxHashMap<String, Rc<StructDef>>,

    /// Function definitions (name -> FunctionDef)
    pub(crate) function_defs: FxHashMap<String, Rc<FunctionDef>>,

    /// Pending `break`/`continue`/`return`
    pub(crate) control_flow: ControlFlow,

    /// Value carried by a pending `return`
    pub(crate) return_value: Option<Value>,

    /// Declared return types of the active calls, innermost last
    pub(crate) return_types: Vec<Type>,

    pub(crate) limits: ExecutionLimits,

    /// Statements executed so far
    steps: usize,

    /// Sidebar text of the statement that just ran
    pub(crate) pending_result: Option<String>,

    /// Current statement and expression nesting
    evaluation_depth: usize,
}

impl Interpreter {
    /// Create a new interpreter for a parsed unit
    pub fn new(program: Program, limits: ExecutionLimits) -> Self {
        Interpreter {
            program: Rc::new(program),
            stack: Stack::new(),
            terminal: MockTerminal::new(),
            current_location: SourceLocation::new(1, 1),
            snapshot_manager: SnapshotManager::new(limits.snapshot_limit),
            struct_defs: FxHashMap::default(),
            function_defs: FxHashMap::default(),
            control_flow: ControlFlow::Normal,
            return_value: None,
            return_types: Vec::new(),
            limits,
            steps: 0,
            pending_result: None,
            evaluation_depth: 0,
        }
    }

    /// Run the unit from start to finish, stopping at the first error
    pub fn run(&mut self) -> Result<(), RuntimeError> {
        let program = Rc::clone(&self.program);
        self.hoist_declarations(&program.nodes)?;
        self.execute_statements(&program.nodes)
    }

    /// Register top-level functions and structs so they can be used before
    /// the line that declares them
    fn hoist_declarations(&mut self, nodes: &[AstNode]) -> Result<(), RuntimeError> {
        for node in nodes {
            match node {
                AstNode::FunctionDecl(def) => self.register_function(def)?,
                AstNode::StructDecl(def) => self.register_struct(def)?,
                _ => {}
            }
        }
        Ok(())
    }

    pub(crate) fn register_function(&mut self, def: &Rc<FunctionDef>) -> Result<(), RuntimeError> {
        match self.function_defs.get(&def.name) {
            Some(existing) if Rc::ptr_eq(existing, def) => return Ok(()),
            Some(_) => {
                return Err(RuntimeError::Redeclaration {
                    name: def.name.clone(),
                    location: def.location,
                })
            }
            None => {}
        }
        if self.struct_defs.contains_key(&def.name) {
            return Err(RuntimeError::Redeclaration {
                name: def.name.clone(),
                location: def.location,
            });
        }
        self.function_defs.insert(def.name.clone(), Rc::clone(def));
        Ok(())
    }

    pub(crate) fn register_struct(&mut self, def: &Rc<StructDef>) -> Result<(), RuntimeError> {
        match self.struct_defs.get(&def.name) {
            Some(existing) if Rc::ptr_eq(existing, def) => return Ok(()),
            Some(_) => {
                return Err(RuntimeError::Redeclaration {
                    name: def.name.clone(),
                    location: def.location,
                })
            }
            None => {}
        }
        if self.function_defs.contains_key(&def.name) {
            return Err(RuntimeError::Redeclaration {
                name: def.name.clone(),
                location: def.location,
            });
        }
        self.struct_defs.insert(def.name.clone(), Rc::clone(def));
        Ok(())
    }

    /// Execute statements in order until one raises control flow
    pub(crate) fn execute_statements(&mut self, stmts: &[AstNode]) -> Result<(), RuntimeError> {
        for stmt in stmts {
            let needs_snapshot = self.execute_statement(stmt)?;
            if needs_snapshot {
                self.take_snapshot();
            }
            if self.control_flow != ControlFlow::Normal {
                break;
            }
        }
        Ok(())
    }

    /// Execute statements inside a fresh block scope
    pub(crate) fn execute_block(&mut self, stmts: &[AstNode]) -> Result<(), RuntimeError> {
        self.enter_scope();
        self.execute_statements(stmts)?;
        self.exit_scope();
        Ok(())
    }

    /// Execute a single statement
    /// Returns true if a snapshot should be taken after this statement
    pub(crate) fn execute_statement(&mut self, stmt: &AstNode) -> Result<bool, RuntimeError> {
        self.descend(stmt.location())?;
        let needs_snapshot = self.dispatch_statement(stmt);
        self.ascend();
        needs_snapshot
    }

    fn dispatch_statement(&mut self, stmt: &AstNode) -> Result<bool, RuntimeError> {
        let location = stmt.location();
        self.current_location = location;
        self.tick(location)?;
        self.pending_result = None;

        let needs_snapshot = match stmt {
            AstNode::VarDecl {
                name,
                is_mutable,
                var_type,
                init,
                location,
            } => {
                self.execute_var_decl(name, *is_mutable, var_type.as_ref(), init, *location)?;
                true
            }

            AstNode::Assignment {
                target,
                value,
                location,
            } => {
                self.execute_assignment(target, value, *location)?;
                true
            }

            AstNode::CompoundAssignment {
                target,
                op,
                value,
                location,
            } => {
                self.execute_compound_assignment(target, *op, value, *location)?;
                true
            }

            AstNode::Return { expr, location } => {
                self.execute_return(expr.as_deref(), *location)?;
                true
            }

            AstNode::If {
                condition,
                then_branch,
                else_branch,
                location,
            } => {
                self.execute_if(condition, then_branch, else_branch.as_deref(), *location)?;
                false
            }

            AstNode::While {
                condition,
                body,
                location,
            } => {
                self.execute_while(condition, body, *location)?;
                true
            }

            AstNode::RepeatWhile {
                body,
                condition,
                location,
            } => {
                self.execute_repeat_while(body, condition, *location)?;
                true
            }

            AstNode::ForIn {
                pattern,
                iterable,
                body,
                location,
            } => {
                self.execute_for_in(pattern, iterable, body, *location)?;
                true
            }

            AstNode::Break { .. } => {
                self.control_flow = ControlFlow::Break;
                false
            }

            AstNode::Continue { .. } => {
                self.control_flow = ControlFlow::Continue;
                false
            }

            AstNode::FunctionDecl(def) => {
                self.register_function(def)?;
                false
            }

            AstNode::StructDecl(def) => {
                self.register_struct(def)?;
                false
            }

            AstNode::ExpressionStatement { expr, .. } => {
                self.execute_expression_statement(expr)?;
                true
            }

            other => {
                self.execute_expression_statement(other)?;
                true
            }
        };

        // Compound statements leave the location on their last inner statement
        self.current_location = location;
        Ok(needs_snapshot)
    }

    /// Count one unit of work against the step budget
    pub(crate) fn tick(&mut self, location: SourceLocation) -> Result<(), RuntimeError> {
        self.steps += 1;
        if self.steps > self.limits.max_steps {
            return Err(RuntimeError::StepLimit {
                limit: self.limits.max_steps,
                location,
            });
        }
        Ok(())
    }

    /// Record the state after the statement that just ran
    pub(crate) fn take_snapshot(&mut self) {
        let result = self.pending_result.take();
        if !self.limits.record_trace || self.snapshot_manager.is_truncated() {
            return;
        }

        let snapshot = Snapshot {
            source_location: self.current_location,
            output_len: self.terminal.len(),
            bindings: BindingView::collect(&self.stack),
            result,
            function: self.stack.current_function().map(str::to_string),
            call_depth: self.stack.call_depth(),
        };

        if let Err(message) = self.snapshot_manager.push(snapshot) {
            log::warn!(
                "{}; trace truncated at line {}",
                message,
                self.current_location.line
            );
        }
    }

    /// Go one evaluation level deeper. Fails with a recursion error before
    /// the native stack of [`UNIT_STACK_SIZE`] can run out.
    pub(crate) fn descend(&mut self, location: SourceLocation) -> Result<(), RuntimeError> {
        if self.evaluation_depth >= MAX_EVALUATION_DEPTH {
            return Err(RuntimeError::NestingLimit {
                limit: MAX_EVALUATION_DEPTH,
                location,
            });
        }
        self.evaluation_depth += 1;
        Ok(())
    }

    pub(crate) fn ascend(&mut self) {
        self.evaluation_depth -= 1;
    }

    pub(crate) fn enter_scope(&mut self) {
        self.stack.push_scope();
    }

    pub(crate) fn exit_scope(&mut self) {
        self.stack.pop_scope();
    }

    /// Declare a binding in the innermost scope
    pub(crate) fn declare_binding(
        &mut self,
        name: &str,
        value: Value,
        declared_type: Type,
        is_mutable: bool,
        location: SourceLocation,
    ) -> Result<(), RuntimeError> {
        let binding = Binding::new(value, declared_type, is_mutable, location);
        self.stack
            .declare(name.to_string(), binding)
            .map_err(|_| RuntimeError::Redeclaration {
                name: name.to_string(),
                location,
            })
    }

    // ========== Getter methods for the runner and UI ==========

    /// Get a reference to the terminal output
    pub fn terminal(&self) -> &MockTerminal {
        &self.terminal
    }

    /// Statements executed so far
    pub fn steps(&self) -> usize {
        self.steps
    }

    /// Get the total number of snapshots
    pub fn total_snapshots(&self) -> usize {
        self.snapshot_manager.len()
    }

    /// Whether the snapshot trace hit its memory limit
    pub fn trace_truncated(&self) -> bool {
        self.snapshot_manager.is_truncated()
    }

    /// Consume the interpreter, keeping its output and trace
    pub fn into_parts(self) -> (Vec<String>, Vec<Snapshot>, bool) {
        let truncated = self.snapshot_manager.is_truncated();
        (
            self.terminal.get_output(),
            self.snapshot_manager.into_snapshots(),
            truncated,
        )
    }

    /// Check a value against a declared type. `context` names the declaration
    /// in the error, e.g. "specified type" or "return type".
    pub(crate) fn check_type(
        value: Value,
        ty: &Type,
        context: &str,
        location: SourceLocation,
    ) -> Result<Value, RuntimeError> {
        if value.conforms_to(ty) {
            return Ok(value);
        }
        let found = value.type_of();
        let message = if *ty == Type::UInt && found == Type::Int {
            format!("negative value {} cannot be stored as 'UInt'", value)
        } else {
            format!(
                "cannot convert value of type '{}' to {} '{}'",
                found, context, ty
            )
        };
        Err(RuntimeError::type_mismatch(message, location))
    }

    /// Convert a value to a boolean (for conditionals)
    pub(crate) fn value_to_bool(val: &Value, location: SourceLocation) -> Result<bool, RuntimeError> {
        val.as_bool().ok_or_else(|| {
            RuntimeError::type_mismatch(
                format!("type '{}' cannot be used as a boolean", val.type_of()),
                location,
            )
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::interpreter::errors::ErrorKind;
    use crate::parser::parse::Parser;

    fn run(source: &str) -> (Interpreter, Result<(), RuntimeError>) {
        let program = Parser::new(source)
            .and_then(|mut p| p.parse_program())
            .expect("Parsing failed");
        let mut interp = Interpreter::new(
            program,
            ExecutionLimits {
                record_trace: true,
                ..ExecutionLimits::default()
            },
        );
        let result = interp.run();
        (interp, result)
    }

    #[test]
    fn test_hoisted_function() {
        let (interp, result) = run("print(square(4))\nfunc square(_ n: Int) -> Int {\n  return n * n\n}");
        assert!(result.is_ok());
        assert_eq!(interp.terminal().get_output(), vec!["16"]);
    }

    #[test]
    fn test_duplicate_function_is_redeclaration() {
        let (_, result) = run("func f() {\n}\nfunc f() {\n}");
        assert_eq!(result.unwrap_err().kind(), ErrorKind::ScopeViolation);
    }

    #[test]
    fn test_trace_records_sidebar_results() {
        let (interp, result) = run("var n = 1\nn += 2\nprint(\"n is \\(n)\")");
        assert!(result.is_ok());
        assert_eq!(interp.total_snapshots(), 3);
        let (output, trace, truncated) = interp.into_parts();
        assert_eq!(output, vec!["n is 3"]);
        assert!(!truncated);
        let results: Vec<Option<String>> = trace.iter().map(|s| s.result.clone()).collect();
        assert_eq!(
            results,
            vec![
                Some("1".to_string()),
                Some("3".to_string()),
                Some("n is 3".to_string())
            ]
        );
        assert_eq!(trace[2].output_len, 1);
        assert_eq!(trace[1].bindings[0].name, "n");
    }

    #[test]
    fn test_trace_names_active_function() {
        let (interp, result) = run("func double(_ n: Int) -> Int {\n  return n * 2\n}\nlet x = double(4)");
        assert!(result.is_ok());
        let (_, trace, _) = interp.into_parts();
        assert_eq!(trace[0].function.as_deref(), Some("double"));
        assert_eq!(trace[0].call_depth, 1);
        assert_eq!(trace[1].function, None);
    }

    #[test]
    fn test_step_limit() {
        let program = Parser::new("while true {\n}")
            .and_then(|mut p| p.parse_program())
            .expect("Parsing failed");
        let mut interp = Interpreter::new(
            program,
            ExecutionLimits {
                max_steps: 100,
                ..ExecutionLimits::default()
            },
        );
        let err = interp.run().unwrap_err();
        assert_eq!(err.kind(), ErrorKind::StepLimit);
        assert_eq!(err.location().line, 1);
    }

    #[test]
    fn test_trace_truncation_keeps_running() {
        let program = Parser::new("var i = 0\nwhile i < 50 {\n  i += 1\n}\nprint(i)")
            .and_then(|mut p| p.parse_program())
            .expect("Parsing failed");
        let mut interp = Interpreter::new(
            program,
            ExecutionLimits {
                record_trace: true,
                snapshot_limit: 1024,
                ..ExecutionLimits::default()
            },
        );
        assert!(interp.run().is_ok());
        assert!(interp.trace_truncated());
        assert_eq!(interp.terminal().get_output(), vec!["50"]);
    }
}
