use crate::interpreter::engine::Interpreter;
use crate::interpreter::errors::RuntimeError;
use crate::memory::value::Value;
use crate::parser::ast::{AstNode, BinOp, SourceLocation, Type, UnOp};

impl Interpreter {
    pub(crate) fn evaluate_binary(
        &mut self,
        op: BinOp,
        left: &AstNode,
        right: &AstNode,
        expected: Option<&Type>,
        location: SourceLocation,
    ) -> Result<Value, RuntimeError> {
        match op {
            BinOp::And | BinOp::Or => return self.evaluate_logical(op, left, right, location),
            BinOp::NilCoalesce => return self.evaluate_nil_coalesce(left, right, expected),
            _ => {}
        }

        let arithmetic = matches!(
            op,
            BinOp::Add | BinOp::Sub | BinOp::Mul | BinOp::Div | BinOp::Mod
        );
        let hint = match expected {
            Some(ty) if arithmetic && *ty == Type::Double => Some(ty),
            _ => None,
        };

        let l = self.evaluate_with_expected(left, hint)?;
        let r = self.evaluate_with_expected(right, hint)?;
        let l = Self::promote_literal(l, left, &r);
        let r = Self::promote_literal(r, right, &l);
        Self::apply_binary(op, l, r, location)
    }

    /// `&&` and `||` short-circuit
    fn evaluate_logical(
        &mut self,
        op: BinOp,
        left: &AstNode,
        right: &AstNode,
        location: SourceLocation,
    ) -> Result<Value, RuntimeError> {
        let l = self.evaluate_expr(left)?;
        let l = Self::logical_operand(op, &l, location)?;
        match (op, l) {
            (BinOp::And, false) => return Ok(Value::Bool(false)),
            (BinOp::Or, true) => return Ok(Value::Bool(true)),
            _ => {}
        }
        let r = self.evaluate_expr(right)?;
        Ok(Value::Bool(Self::logical_operand(op, &r, location)?))
    }

    fn logical_operand(op: BinOp, value: &Value, location: SourceLocation) -> Result<bool, RuntimeError> {
        value.as_bool().ok_or_else(|| {
            RuntimeError::type_mismatch(
                format!(
                    "operator '{}' requires 'Bool' operands, got '{}'",
                    op.symbol(),
                    value.type_of()
                ),
                location,
            )
        })
    }

    /// An integer literal next to a Double is read as a Double
    fn promote_literal(value: Value, node: &AstNode, other: &Value) -> Value {
        match (value, other) {
            (Value::Int(n), Value::Double(_)) if node.is_integer_literal() => Value::Double(n as f64),
            (value, _) => value,
        }
    }

    /// Apply a binary operator to two evaluated operands
    pub(crate) fn apply_binary(
        op: BinOp,
        left: Value,
        right: Value,
        location: SourceLocation,
    ) -> Result<Value, RuntimeError> {
        match op {
            BinOp::Add | BinOp::Sub | BinOp::Mul | BinOp::Div | BinOp::Mod => {
                Self::apply_arithmetic(op, left, right, location)
            }

            BinOp::Eq | BinOp::Ne => {
                if left.type_of() != right.type_of() {
                    return Err(Self::operand_mismatch(op, &left, &right, location));
                }
                let equal = left.equals(&right);
                Ok(Value::Bool(if op == BinOp::Eq { equal } else { !equal }))
            }

            BinOp::Lt | BinOp::Le | BinOp::Gt | BinOp::Ge => {
                if left.type_of() != right.type_of() {
                    return Err(Self::operand_mismatch(op, &left, &right, location));
                }
                match left.compare(&right) {
                    Some(ordering) => Ok(Value::Bool(match op {
                        BinOp::Lt => ordering.is_lt(),
                        BinOp::Le => ordering.is_le(),
                        BinOp::Gt => ordering.is_gt(),
                        _ => ordering.is_ge(),
                    })),
                    // NaN compares false with everything
                    None if matches!(left, Value::Double(_)) => Ok(Value::Bool(false)),
                    None => Err(RuntimeError::type_mismatch(
                        format!("values of type '{}' cannot be ordered", left.type_of()),
                        location,
                    )),
                }
            }

            BinOp::And | BinOp::Or => {
                let l = Self::logical_operand(op, &left, location)?;
                let r = Self::logical_operand(op, &right, location)?;
                Ok(Value::Bool(if op == BinOp::And { l && r } else { l || r }))
            }

            BinOp::ClosedRange | BinOp::HalfOpenRange => match (&left, &right) {
                (Value::Int(start), Value::Int(end)) => {
                    if start > end {
                        return Err(RuntimeError::InvalidRange {
                            start: *start,
                            end: *end,
                            location,
                        });
                    }
                    Ok(Value::Range {
                        start: *start,
                        end: *end,
                        inclusive: op == BinOp::ClosedRange,
                    })
                }
                _ => Err(Self::operand_mismatch(op, &left, &right, location)),
            },

            BinOp::NilCoalesce => Ok(left),
        }
    }

    fn apply_arithmetic(
        op: BinOp,
        left: Value,
        right: Value,
        location: SourceLocation,
    ) -> Result<Value, RuntimeError> {
        match (left, right) {
            (Value::Int(a), Value::Int(b)) => {
                if b == 0 && matches!(op, BinOp::Div | BinOp::Mod) {
                    return Err(RuntimeError::DivisionByZero { location });
                }
                let result = match op {
                    BinOp::Add => a.checked_add(b),
                    BinOp::Sub => a.checked_sub(b),
                    BinOp::Mul => a.checked_mul(b),
                    BinOp::Div => a.checked_div(b),
                    _ => a.checked_rem(b),
                };
                result.map(Value::Int).ok_or_else(|| RuntimeError::Overflow {
                    operation: format!("{} {} {}", a, op.symbol(), b),
                    location,
                })
            }

            (Value::Double(a), Value::Double(b)) => match op {
                BinOp::Add => Ok(Value::Double(a + b)),
                BinOp::Sub => Ok(Value::Double(a - b)),
                BinOp::Mul => Ok(Value::Double(a * b)),
                BinOp::Div => Ok(Value::Double(a / b)),
                _ => Err(RuntimeError::type_mismatch(
                    "'%' is unavailable for 'Double' operands",
                    location,
                )),
            },

            (Value::Str(mut a), Value::Str(b)) if op == BinOp::Add => {
                a.push_str(&b);
                Ok(Value::Str(a))
            }

            (
                Value::Array {
                    elem,
                    items: mut a,
                },
                Value::Array {
                    elem: other_elem,
                    items: b,
                },
            ) if op == BinOp::Add && elem == other_elem => {
                a.extend(b);
                Ok(Value::Array { elem, items: a })
            }

            (l, r) => Err(Self::operand_mismatch(op, &l, &r, location)),
        }
    }

    fn operand_mismatch(op: BinOp, left: &Value, right: &Value, location: SourceLocation) -> RuntimeError {
        RuntimeError::type_mismatch(
            format!(
                "binary operator '{}' cannot be applied to operands of type '{}' and '{}'",
                op.symbol(),
                left.type_of(),
                right.type_of()
            ),
            location,
        )
    }

    pub(crate) fn evaluate_unary(
        &mut self,
        op: UnOp,
        operand: &AstNode,
        expected: Option<&Type>,
        location: SourceLocation,
    ) -> Result<Value, RuntimeError> {
        match op {
            UnOp::Neg => match self.evaluate_with_expected(operand, expected)? {
                Value::Int(n) => n.checked_neg().map(Value::Int).ok_or_else(|| {
                    RuntimeError::Overflow {
                        operation: format!("-({})", n),
                        location,
                    }
                }),
                Value::Double(d) => Ok(Value::Double(-d)),
                other => Err(RuntimeError::type_mismatch(
                    format!(
                        "unary operator '-' cannot be applied to an operand of type '{}'",
                        other.type_of()
                    ),
                    location,
                )),
            },
            UnOp::Not => {
                let value = self.evaluate_expr(operand)?;
                match value {
                    Value::Bool(b) => Ok(Value::Bool(!b)),
                    other => Err(RuntimeError::type_mismatch(
                        format!(
                            "unary operator '!' cannot be applied to an operand of type '{}'",
                            other.type_of()
                        ),
                        location,
                    )),
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::interpreter::errors::ErrorKind;

    fn loc() -> SourceLocation {
        SourceLocation::new(1, 1)
    }

    #[test]
    fn test_checked_integer_arithmetic() {
        let result = Interpreter::apply_binary(BinOp::Add, Value::Int(i64::MAX), Value::Int(1), loc());
        assert_eq!(result.unwrap_err().kind(), ErrorKind::Overflow);

        let result = Interpreter::apply_binary(BinOp::Mod, Value::Int(7), Value::Int(0), loc());
        assert_eq!(result.unwrap_err().kind(), ErrorKind::DivisionByZero);

        let result = Interpreter::apply_binary(BinOp::Div, Value::Int(-7), Value::Int(2), loc());
        assert_eq!(result, Ok(Value::Int(-3)));
    }

    #[test]
    fn test_no_implicit_numeric_conversion() {
        let result = Interpreter::apply_binary(BinOp::Add, Value::Int(1), Value::Double(2.0), loc());
        let err = result.unwrap_err();
        assert_eq!(err.kind(), ErrorKind::TypeMismatch);
        assert_eq!(
            err.to_string(),
            "binary operator '+' cannot be applied to operands of type 'Int' and 'Double'"
        );
    }

    #[test]
    fn test_double_division_by_zero_is_infinite() {
        let result = Interpreter::apply_binary(BinOp::Div, Value::Double(1.0), Value::Double(0.0), loc());
        assert_eq!(result, Ok(Value::Double(f64::INFINITY)));
    }

    #[test]
    fn test_string_and_array_concatenation() {
        let result = Interpreter::apply_binary(
            BinOp::Add,
            Value::Str("The width is ".into()),
            Value::Str("94".into()),
            loc(),
        );
        assert_eq!(result, Ok(Value::Str("The width is 94".into())));

        let xs = |items: Vec<i64>| Value::Array {
            elem: Type::Int,
            items: items.into_iter().map(Value::Int).collect(),
        };
        let result = Interpreter::apply_binary(BinOp::Add, xs(vec![1]), xs(vec![2, 3]), loc());
        assert_eq!(result, Ok(xs(vec![1, 2, 3])));
    }

    #[test]
    fn test_comparisons() {
        let lt = Interpreter::apply_binary(BinOp::Lt, Value::Str("a".into()), Value::Str("b".into()), loc());
        assert_eq!(lt, Ok(Value::Bool(true)));

        let nan = Interpreter::apply_binary(BinOp::Ge, Value::Double(f64::NAN), Value::Double(0.0), loc());
        assert_eq!(nan, Ok(Value::Bool(false)));

        let mixed = Interpreter::apply_binary(BinOp::Eq, Value::Int(1), Value::Str("1".into()), loc());
        assert_eq!(mixed.unwrap_err().kind(), ErrorKind::TypeMismatch);
    }

    #[test]
    fn test_ranges() {
        let range = Interpreter::apply_binary(BinOp::HalfOpenRange, Value::Int(0), Value::Int(4), loc());
        assert_eq!(
            range,
            Ok(Value::Range {
                start: 0,
                end: 4,
                inclusive: false
            })
        );

        let invalid = Interpreter::apply_binary(BinOp::ClosedRange, Value::Int(5), Value::Int(1), loc());
        assert_eq!(invalid.unwrap_err().kind(), ErrorKind::IndexOutOfBounds);
    }
}
