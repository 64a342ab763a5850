//! Loop statement execution (`while`, `repeat-while`, `for-in`).
//!
//! Adds `impl Interpreter` methods for the three loop forms. `break` and
//! `continue` are propagated via `LoopBodyResult` so the loop driver can react
//! without inspecting `control_flow` directly.
//!
//! `return` inside a loop body is handled by returning `LoopBodyResult::Exit`,
//! which unwinds the loop and lets the enclosing call see the pending return.
//!
//! Every iteration counts against the step budget, so an empty
//! `while true { }` still stops with a step limit error.

use crate::interpreter::engine::{ControlFlow, Interpreter};
use crate::interpreter::errors::RuntimeError;
use crate::memory::value::Value;
use crate::parser::ast::{AstNode, ForPattern, SourceLocation};

/// Result returned by [`Interpreter::execute_loop_body`] to signal how the body ended.
pub(crate) enum LoopBodyResult {
    /// Body completed normally or via `continue`; the loop should iterate again.
    Continue,
    /// `break` was encountered; the loop should exit cleanly.
    Break,
    /// `return` was triggered; the loop driver should unwind.
    Exit,
}

impl Interpreter {
    /// Executes `body` inside a fresh scope holding the loop variables.
    pub(crate) fn execute_loop_body(
        &mut self,
        body: &[AstNode],
        bindings: Vec<(String, Value)>,
        location: SourceLocation,
    ) -> Result<LoopBodyResult, RuntimeError> {
        self.enter_scope();
        for (name, value) in bindings {
            let ty = value.type_of();
            self.declare_binding(&name, value, ty, false, location)?;
        }

        self.execute_statements(body)?;
        self.exit_scope();

        let result = match self.control_flow {
            ControlFlow::Normal => LoopBodyResult::Continue,
            ControlFlow::Continue => {
                self.control_flow = ControlFlow::Normal;
                LoopBodyResult::Continue
            }
            ControlFlow::Break => {
                self.control_flow = ControlFlow::Normal;
                LoopBodyResult::Break
            }
            ControlFlow::Return => LoopBodyResult::Exit,
        };
        Ok(result)
    }

    pub(crate) fn execute_while(
        &mut self,
        condition: &AstNode,
        body: &[AstNode],
        location: SourceLocation,
    ) -> Result<(), RuntimeError> {
        let mut iterations = 0usize;
        loop {
            let cond_val = self.evaluate_expr(condition)?;
            if !Self::value_to_bool(&cond_val, location)? {
                break;
            }
            self.tick(location)?;
            iterations += 1;
            match self.execute_loop_body(body, Vec::new(), location)? {
                LoopBodyResult::Continue => {}
                LoopBodyResult::Break => break,
                LoopBodyResult::Exit => return Ok(()),
            }
        }
        self.finish_loop(iterations, location);
        Ok(())
    }

    pub(crate) fn execute_repeat_while(
        &mut self,
        body: &[AstNode],
        condition: &AstNode,
        location: SourceLocation,
    ) -> Result<(), RuntimeError> {
        let mut iterations = 0usize;
        loop {
            self.tick(location)?;
            iterations += 1;
            match self.execute_loop_body(body, Vec::new(), location)? {
                LoopBodyResult::Continue => {}
                LoopBodyResult::Break => break,
                LoopBodyResult::Exit => return Ok(()),
            }
            let cond_val = self.evaluate_expr(condition)?;
            if !Self::value_to_bool(&cond_val, condition.location())? {
                break;
            }
        }
        self.finish_loop(iterations, location);
        Ok(())
    }

    pub(crate) fn execute_for_in(
        &mut self,
        pattern: &ForPattern,
        iterable: &AstNode,
        body: &[AstNode],
        location: SourceLocation,
    ) -> Result<(), RuntimeError> {
        let sequence = self.evaluate_expr(iterable)?;

        // Dictionaries need a `(key, value)` pattern and nothing else does
        match (&sequence, pattern) {
            (Value::Dict { .. }, ForPattern::Single(_)) => {
                return Err(RuntimeError::type_mismatch(
                    "iterating a dictionary needs a '(key, value)' pattern",
                    location,
                ))
            }
            (Value::Dict { .. }, ForPattern::Pair(..)) => {}
            (other, ForPattern::Pair(..)) => {
                return Err(RuntimeError::type_mismatch(
                    format!(
                        "a '(key, value)' pattern cannot match elements of '{}'",
                        other.type_of()
                    ),
                    location,
                ))
            }
            _ => {}
        }

        let mut iterations = 0usize;
        macro_rules! run_body {
            ($bindings:expr) => {{
                self.tick(location)?;
                iterations += 1;
                match self.execute_loop_body(body, $bindings, location)? {
                    LoopBodyResult::Continue => {}
                    LoopBodyResult::Break => break,
                    LoopBodyResult::Exit => return Ok(()),
                }
            }};
        }

        match sequence {
            Value::Range {
                start,
                end,
                inclusive,
            } => {
                let last = if inclusive { Some(end) } else { end.checked_sub(1) };
                if let Some(last) = last {
                    for current in start..=last {
                        run_body!(Self::loop_bindings(pattern, Value::Int(current), None));
                    }
                }
            }
            Value::Array { items, .. } => {
                for item in items {
                    run_body!(Self::loop_bindings(pattern, item, None));
                }
            }
            Value::Dict { entries, .. } => {
                for (key, value) in entries {
                    run_body!(Self::loop_bindings(pattern, key, Some(value)));
                }
            }
            Value::Str(text) => {
                for ch in text.chars() {
                    run_body!(Self::loop_bindings(pattern, Value::Str(ch.to_string()), None));
                }
            }
            other => {
                return Err(RuntimeError::type_mismatch(
                    format!("value of type '{}' is not a sequence", other.type_of()),
                    iterable.location(),
                ))
            }
        }

        self.finish_loop(iterations, location);
        Ok(())
    }

    /// Names bound for one iteration; `_` binds nothing
    fn loop_bindings(
        pattern: &ForPattern,
        first: Value,
        second: Option<Value>,
    ) -> Vec<(String, Value)> {
        let mut bindings = Vec::new();
        match pattern {
            ForPattern::Single(name) => {
                if let Some(name) = name {
                    bindings.push((name.clone(), first));
                }
            }
            ForPattern::Pair(key_name, value_name) => {
                if let Some(name) = key_name {
                    bindings.push((name.clone(), first));
                }
                if let (Some(name), Some(value)) = (value_name, second) {
                    bindings.push((name.clone(), value));
                }
            }
        }
        bindings
    }

    /// Sidebar result for a loop: how many times its body ran
    fn finish_loop(&mut self, iterations: usize, location: SourceLocation) {
        self.current_location = location;
        self.pending_result = Some(format!(
            "({} time{})",
            iterations,
            if iterations == 1 { "" } else { "s" }
        ));
    }
}

#[cfg(test)]
mod tests {
    use crate::interpreter::engine::{ExecutionLimits, Interpreter};
    use crate::interpreter::errors::{ErrorKind, RuntimeError};
    use crate::parser::parse::Parser;

    fn run(source: &str) -> (Vec<String>, Result<(), RuntimeError>) {
        let program = Parser::new(source)
            .and_then(|mut p| p.parse_program())
            .expect("Parsing failed");
        let mut interp = Interpreter::new(program, ExecutionLimits::default());
        let result = interp.run();
        (interp.terminal().get_output(), result)
    }

    #[test]
    fn test_sum_array() {
        let source = "let numbers = [1, 2, 3, 4, 5]\nvar sum = 0\nfor n in numbers {\n  sum += n\n}\nprint(sum)";
        let (output, result) = run(source);
        assert!(result.is_ok());
        assert_eq!(output, vec!["15"]);
    }

    #[test]
    fn test_ranges() {
        let source = "var total = 0\nfor i in 0..<4 {\n  total += i\n}\nfor _ in 1...3 {\n  total += 10\n}\nprint(total)";
        let (output, result) = run(source);
        assert!(result.is_ok());
        assert_eq!(output, vec!["36"]);
    }

    #[test]
    fn test_dictionary_iteration_in_insertion_order() {
        let source = "let ages = [\"Tim\": 22, \"Ana\": 31]\nfor (name, age) in ages {\n  print(name, age)\n}";
        let (output, result) = run(source);
        assert!(result.is_ok());
        assert_eq!(output, vec!["Tim 22", "Ana 31"]);
    }

    #[test]
    fn test_dictionary_needs_pair_pattern() {
        let (_, result) = run("let d = [1: 2]\nfor x in d {\n}");
        assert_eq!(result.unwrap_err().kind(), ErrorKind::TypeMismatch);
    }

    #[test]
    fn test_break_and_continue() {
        let source = "var i = 0\nwhile true {\n  i += 1\n  if i == 2 {\n    continue\n  }\n  if i > 4 {\n    break\n  }\n  print(i)\n}";
        let (output, result) = run(source);
        assert!(result.is_ok());
        assert_eq!(output, vec!["1", "3", "4"]);
    }

    #[test]
    fn test_repeat_runs_at_least_once() {
        let source = "var n = 10\nrepeat {\n  print(n)\n  n += 1\n} while n < 5";
        let (output, result) = run(source);
        assert!(result.is_ok());
        assert_eq!(output, vec!["10"]);
    }

    #[test]
    fn test_loop_variable_is_immutable() {
        let (_, result) = run("for i in 0..<3 {\n  i = 5\n}");
        assert_eq!(result.unwrap_err().kind(), ErrorKind::ImmutableAssignment);
    }

    #[test]
    fn test_return_from_inside_loop() {
        let source = "func firstEven(_ xs: [Int]) -> Int {\n  for x in xs {\n    if x % 2 == 0 {\n      return x\n    }\n  }\n  return -1\n}\nprint(firstEven([3, 5, 8, 10]))";
        let (output, result) = run(source);
        assert!(result.is_ok());
        assert_eq!(output, vec!["8"]);
    }

    #[test]
    fn test_iterating_characters() {
        let (output, result) = run("for c in \"hey\" {\n  print(c)\n}");
        assert!(result.is_ok());
        assert_eq!(output, vec!["h", "e", "y"]);
    }
}
