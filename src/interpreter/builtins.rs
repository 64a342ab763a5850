//! Built-in function implementations
//!
//! This module provides the free functions that are handled by the interpreter
//! rather than being defined in lesson code.
//!
//! # Supported Built-ins
//!
//! - `print(items..., separator:, terminator:)`: output to the terminal
//! - `Int(x)`, `UInt(x)`, `Double(x)` / `Float(x)`, `String(x)`, `Bool(x)`: conversions
//! - `abs(x)`, `min(a, b, ...)`, `max(a, b, ...)`
//!
//! # Implementation Notes
//!
//! - Conversions from `String` that fail to parse are type mismatches, since
//!   optionals are not modelled
//! - `Int(x)` of a Double truncates toward zero; NaN, infinities and values
//!   outside the Int range overflow
//! - All built-ins are implemented as methods on the [`Interpreter`] struct

use crate::interpreter::engine::Interpreter;
use crate::interpreter::errors::RuntimeError;
use crate::memory::value::{format_double, Value};
use crate::parser::ast::{Arg, SourceLocation};
use std::cmp::Ordering;

impl Interpreter {
    /// Call a built-in function. Returns `Ok(None)` if `name` is not a built-in.
    pub(crate) fn call_builtin(
        &mut self,
        name: &str,
        args: &[Arg],
        location: SourceLocation,
    ) -> Result<Option<Value>, RuntimeError> {
        let value = match name {
            "print" => self.builtin_print(args, location)?,
            "Int" => {
                let value = self.single_argument(name, args, None, location)?;
                Value::Int(Self::convert_to_int(name, value, location)?)
            }
            "UInt" => {
                let value = self.single_argument(name, args, None, location)?;
                let n = Self::convert_to_int(name, value, location)?;
                if n < 0 {
                    return Err(RuntimeError::Overflow {
                        operation: format!("UInt({})", n),
                        location,
                    });
                }
                Value::Int(n)
            }
            "Double" | "Float" => {
                let value = self.single_argument(name, args, None, location)?;
                Self::convert_to_double(name, value, location)?
            }
            "String" => {
                let value = self.single_argument(name, args, Some("describing"), location)?;
                Value::Str(value.to_string())
            }
            "Bool" => {
                let value = self.single_argument(name, args, None, location)?;
                match value {
                    Value::Bool(b) => Value::Bool(b),
                    Value::Str(s) if s == "true" || s == "false" => Value::Bool(s == "true"),
                    other => return Err(Self::conversion_error(name, &other, location)),
                }
            }
            "abs" => {
                let value = self.single_argument(name, args, None, location)?;
                match value {
                    Value::Int(n) => Value::Int(n.checked_abs().ok_or_else(|| {
                        RuntimeError::Overflow {
                            operation: format!("abs({})", n),
                            location,
                        }
                    })?),
                    Value::Double(d) => Value::Double(d.abs()),
                    other => return Err(Self::conversion_error(name, &other, location)),
                }
            }
            "min" | "max" => self.builtin_min_max(name, args, location)?,
            _ => return Ok(None),
        };
        Ok(Some(value))
    }

    fn builtin_print(&mut self, args: &[Arg], location: SourceLocation) -> Result<Value, RuntimeError> {
        let mut separator = " ".to_string();
        let mut terminator = "\n".to_string();
        let mut parts = Vec::with_capacity(args.len());

        for arg in args {
            match arg.label.as_deref() {
                None => parts.push(self.evaluate_expr(&arg.value)?.to_string()),
                Some(label @ ("separator" | "terminator")) => {
                    let text = match self.evaluate_expr(&arg.value)? {
                        Value::Str(s) => s,
                        other => {
                            return Err(RuntimeError::type_mismatch(
                                format!(
                                    "'{}:' expects a 'String', got '{}'",
                                    label,
                                    other.type_of()
                                ),
                                arg.value.location(),
                            ))
                        }
                    };
                    if label == "separator" {
                        separator = text;
                    } else {
                        terminator = text;
                    }
                }
                Some(other) => {
                    return Err(RuntimeError::ArgumentMismatch {
                        function: "print".to_string(),
                        message: format!("extraneous argument label '{}:'", other),
                        location: arg.value.location(),
                    })
                }
            }
        }

        let mut text = parts.join(&separator);
        text.push_str(&terminator);
        self.terminal.print(&text, location);
        Ok(Value::Void)
    }

    /// `min(a, b, ...)` / `max(a, b, ...)` over two or more comparable values
    fn builtin_min_max(
        &mut self,
        name: &str,
        args: &[Arg],
        location: SourceLocation,
    ) -> Result<Value, RuntimeError> {
        if args.len() < 2 {
            return Err(RuntimeError::ArgumentMismatch {
                function: name.to_string(),
                message: format!("expected at least 2 arguments, got {}", args.len()),
                location,
            });
        }

        let mut values = Vec::with_capacity(args.len());
        for arg in args {
            if let Some(label) = &arg.label {
                return Err(RuntimeError::ArgumentMismatch {
                    function: name.to_string(),
                    message: format!("extraneous argument label '{}:'", label),
                    location: arg.value.location(),
                });
            }
            values.push(self.evaluate_expr(&arg.value)?);
        }

        // Integer literals join a Double comparison
        if values.iter().any(|v| matches!(v, Value::Double(_))) {
            for (value, arg) in values.iter_mut().zip(args) {
                if let Value::Int(n) = *value {
                    if arg.value.is_integer_literal() {
                        *value = Value::Double(n as f64);
                    }
                }
            }
        }

        let mut best = values.remove(0);
        for value in values {
            let comparable = value.type_of() == best.type_of()
                && matches!(value, Value::Int(_) | Value::Double(_) | Value::Str(_));
            if !comparable {
                return Err(RuntimeError::type_mismatch(
                    format!(
                        "'{}' cannot compare values of type '{}' and '{}'",
                        name,
                        best.type_of(),
                        value.type_of()
                    ),
                    location,
                ));
            }
            // NaN never replaces the current pick
            let ordering = value.compare(&best).unwrap_or(Ordering::Equal);
            let replace = if name == "min" {
                ordering.is_lt()
            } else {
                ordering.is_gt()
            };
            if replace {
                best = value;
            }
        }
        Ok(best)
    }

    /// Evaluate the one argument of a conversion; `label` is the only label allowed
    fn single_argument(
        &mut self,
        name: &str,
        args: &[Arg],
        label: Option<&str>,
        location: SourceLocation,
    ) -> Result<Value, RuntimeError> {
        let [arg] = args else {
            return Err(RuntimeError::ArgumentMismatch {
                function: name.to_string(),
                message: Self::arity_message(1, args.len()),
                location,
            });
        };
        if let Some(given) = &arg.label {
            if Some(given.as_str()) != label {
                return Err(RuntimeError::ArgumentMismatch {
                    function: name.to_string(),
                    message: format!("extraneous argument label '{}:'", given),
                    location: arg.value.location(),
                });
            }
        }
        self.evaluate_expr(&arg.value)
    }

    fn convert_to_int(name: &str, value: Value, location: SourceLocation) -> Result<i64, RuntimeError> {
        match value {
            Value::Int(n) => Ok(n),
            Value::Double(d) => {
                // 2^63, the first Double past i64::MAX
                const LIMIT: f64 = 9_223_372_036_854_775_808.0;
                let truncated = d.trunc();
                if d.is_finite() && truncated >= -LIMIT && truncated < LIMIT {
                    Ok(truncated as i64)
                } else {
                    Err(RuntimeError::Overflow {
                        operation: format!("{}({})", name, format_double(d)),
                        location,
                    })
                }
            }
            Value::Str(s) => s
                .parse::<i64>()
                .map_err(|_| Self::conversion_error(name, &Value::Str(s.clone()), location)),
            other => Err(Self::conversion_error(name, &other, location)),
        }
    }

    fn convert_to_double(name: &str, value: Value, location: SourceLocation) -> Result<Value, RuntimeError> {
        match value {
            Value::Int(n) => Ok(Value::Double(n as f64)),
            Value::Double(d) => Ok(Value::Double(d)),
            Value::Str(s) => match s.parse::<f64>() {
                Ok(d) => Ok(Value::Double(d)),
                Err(_) => Err(Self::conversion_error(name, &Value::Str(s), location)),
            },
            other => Err(Self::conversion_error(name, &other, location)),
        }
    }

    fn conversion_error(name: &str, value: &Value, location: SourceLocation) -> RuntimeError {
        let message = match value {
            Value::Str(_) => format!("cannot convert {} to '{}'", value.render_nested(), name),
            other => format!(
                "no '{}' conversion from a value of type '{}'",
                name,
                other.type_of()
            ),
        };
        RuntimeError::type_mismatch(message, location)
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
    fn test_print_separator_and_terminator() {
        let (output, result) = run("print(1, 2, 3, separator: \"-\")\nprint(\"a\", terminator: \"\")\nprint(\"b\")");
        assert!(result.is_ok());
        assert_eq!(output, vec!["1-2-3", "ab"]);
    }

    #[test]
    fn test_conversions() {
        let source = "let label = \"The width is \"\nlet width = 94\nprint(label + String(width))\nprint(Int(\"12\")! + 1, Double(3), Int(2.9), Int(-2.9))";
        let (output, result) = run(source);
        assert!(result.is_ok(), "{:?}", result);
        assert_eq!(output, vec!["The width is 94", "13 3.0 2 -2"]);
    }

    #[test]
    fn test_unparsable_string() {
        let (_, result) = run("let n = Int(\"abc\")");
        let err = result.unwrap_err();
        assert_eq!(err.kind(), ErrorKind::TypeMismatch);
        assert_eq!(err.to_string(), "cannot convert \"abc\" to 'Int'");
    }

    #[test]
    fn test_uint_of_negative_overflows() {
        let (_, result) = run("let u = UInt(-3)");
        assert_eq!(result.unwrap_err().kind(), ErrorKind::Overflow);
    }

    #[test]
    fn test_min_max_abs() {
        let (output, result) = run("print(min(3, 1, 2), max(1.5, 2), abs(-4))");
        assert!(result.is_ok());
        assert_eq!(output, vec!["1 2.0 4"]);
    }

    #[test]
    fn test_min_of_mixed_types() {
        let (_, result) = run("print(min(1, \"a\"))");
        assert_eq!(result.unwrap_err().kind(), ErrorKind::TypeMismatch);
    }

    #[test]
    fn test_conversion_arity() {
        let (_, result) = run("print(Int(1, 2))");
        assert_eq!(result.unwrap_err().kind(), ErrorKind::ArgumentMismatch);
    }
}
