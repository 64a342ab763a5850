//! Statement execution implementation
//!
//! This module handles the execution of the lesson language's simple statements:
//!
//! - `let`/`var` declarations, with optional type annotations
//! - Assignments and compound assignments (the place logic lives in `ops::assign`)
//! - Expression statements, whose value feeds the sidebar result
//! - `if`/`else` and `return`
//!
//! Loops live in [`loops`](super::loops).
//!
//! # Sidebar results
//!
//! Each statement that produces something worth showing sets
//! `pending_result`, which the next snapshot picks up: the bound value for a
//! declaration, the stored value for an assignment, the expression's value, or
//! the line a `print` just wrote.

use crate::interpreter::engine::{ControlFlow, Interpreter};
use crate::interpreter::errors::RuntimeError;
use crate::memory::value::Value;
use crate::parser::ast::*;

impl Interpreter {
    pub(crate) fn execute_var_decl(
        &mut self,
        name: &str,
        is_mutable: bool,
        var_type: Option<&Type>,
        init: &AstNode,
        location: SourceLocation,
    ) -> Result<(), RuntimeError> {
        let value = self.evaluate_with_expected(init, var_type)?;

        let (value, declared_type) = match var_type {
            Some(ty) => (
                Self::check_type(value, ty, "specified type", init.location())?,
                ty.clone(),
            ),
            None => {
                if value == Value::Void {
                    return Err(RuntimeError::type_mismatch(
                        format!("'{}' would have type 'Void'", name),
                        location,
                    ));
                }
                let ty = value.type_of();
                (value, ty)
            }
        };

        self.pending_result = Some(value.render_nested());
        self.declare_binding(name, value, declared_type, is_mutable, location)
    }

    pub(crate) fn execute_expression_statement(
        &mut self,
        expr: &AstNode,
    ) -> Result<(), RuntimeError> {
        let printed_before = self.terminal.len();
        let value = self.evaluate_expr(expr)?;

        self.pending_result = if value != Value::Void {
            Some(value.render_nested())
        } else if self.terminal.len() > printed_before {
            self.terminal.lines.last().map(|line| line.text.clone())
        } else {
            None
        };
        Ok(())
    }

    pub(crate) fn execute_if(
        &mut self,
        condition: &AstNode,
        then_branch: &[AstNode],
        else_branch: Option<&[AstNode]>,
        location: SourceLocation,
    ) -> Result<(), RuntimeError> {
        let cond_val = self.evaluate_expr(condition)?;
        if Self::value_to_bool(&cond_val, location)? {
            self.execute_block(then_branch)
        } else if let Some(else_stmts) = else_branch {
            self.execute_block(else_stmts)
        } else {
            Ok(())
        }
    }

    pub(crate) fn execute_return(
        &mut self,
        expr: Option<&AstNode>,
        location: SourceLocation,
    ) -> Result<(), RuntimeError> {
        let return_type = self.return_types.last().cloned().unwrap_or(Type::Void);

        let value = match (expr, &return_type) {
            (None, Type::Void) => Value::Void,
            (None, ty) => {
                return Err(RuntimeError::type_mismatch(
                    format!("non-void function should return a value of type '{}'", ty),
                    location,
                ))
            }
            (Some(e), Type::Void) => {
                let value = self.evaluate_expr(e)?;
                if value != Value::Void {
                    return Err(RuntimeError::type_mismatch(
                        "unexpected non-void return value in void function",
                        e.location(),
                    ));
                }
                value
            }
            (Some(e), ty) => {
                let value = self.evaluate_with_expected(e, Some(ty))?;
                Self::check_type(value, ty, "return type", e.location())?
            }
        };

        if value != Value::Void {
            self.pending_result = Some(value.render_nested());
        }
        self.return_value = Some(value);
        self.control_flow = ControlFlow::Return;
        Ok(())
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
    fn test_let_is_immutable() {
        let (output, result) = run("let x = 1\nprint(x)\nx = 2\nprint(x)");
        let err = result.unwrap_err();
        assert_eq!(err.kind(), ErrorKind::ImmutableAssignment);
        assert_eq!(err.location().line, 3);
        assert_eq!(output, vec!["1"]);
    }

    #[test]
    fn test_annotation_mismatch() {
        let (_, result) = run("let name: String = 42");
        let err = result.unwrap_err();
        assert_eq!(err.kind(), ErrorKind::TypeMismatch);
        assert_eq!(
            err.to_string(),
            "cannot convert value of type 'Int' to specified type 'String'"
        );
    }

    #[test]
    fn test_integer_literal_widens_to_double() {
        let (output, result) = run("let explicitDouble: Double = 70\nprint(explicitDouble)");
        assert!(result.is_ok());
        assert_eq!(output, vec!["70.0"]);
    }

    #[test]
    fn test_int_variable_does_not_widen() {
        let (_, result) = run("let n = 70\nlet d: Double = n");
        assert_eq!(result.unwrap_err().kind(), ErrorKind::TypeMismatch);
    }

    #[test]
    fn test_negative_uint() {
        let (_, result) = run("let u: UInt = -1");
        assert_eq!(result.unwrap_err().kind(), ErrorKind::TypeMismatch);
    }

    #[test]
    fn test_block_scope_violation() {
        let (output, result) = run("if true {\n  let inner = 5\n  print(inner)\n}\nprint(inner)");
        let err = result.unwrap_err();
        assert_eq!(err.kind(), ErrorKind::ScopeViolation);
        assert_eq!(err.location().line, 5);
        assert_eq!(output, vec!["5"]);
    }

    #[test]
    fn test_else_if_chain() {
        let source = "let score = 75\nif score > 90 {\n  print(\"A\")\n} else if score > 70 {\n  print(\"B\")\n} else {\n  print(\"C\")\n}";
        let (output, result) = run(source);
        assert!(result.is_ok());
        assert_eq!(output, vec!["B"]);
    }

    #[test]
    fn test_condition_must_be_bool() {
        let (_, result) = run("let n = 1\nif n {\n}");
        assert_eq!(result.unwrap_err().kind(), ErrorKind::TypeMismatch);
    }

    #[test]
    fn test_missing_return_value() {
        let (_, result) = run("func f() -> Int {\n  return\n}\nprint(f())");
        assert_eq!(result.unwrap_err().kind(), ErrorKind::TypeMismatch);
    }

    #[test]
    fn test_return_converts_integer_literal() {
        let (output, result) = run("func half() -> Double {\n  return 1\n}\nprint(half())");
        assert!(result.is_ok());
        assert_eq!(output, vec!["1.0"]);
    }
}
