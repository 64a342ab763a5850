use crate::interpreter::engine::Interpreter;
use crate::interpreter::errors::RuntimeError;
use crate::memory::value::{dict_lookup, Value};
use crate::parser::ast::{SourceLocation, Type};
use std::cmp::Ordering;

/// Bounds-check an array index
pub(crate) fn checked_index(
    index: i64,
    count: usize,
    location: SourceLocation,
) -> Result<usize, RuntimeError> {
    match usize::try_from(index) {
        Ok(i) if i < count => Ok(i),
        _ => Err(RuntimeError::IndexOutOfBounds {
            index,
            count,
            location,
        }),
    }
}

/// Check arity and labels of a built-in method call and return the values.
/// A missing label is accepted; a wrong one is not.
pub(crate) fn expect_arguments(
    method: &str,
    args: Vec<(Option<String>, Value)>,
    labels: &[Option<&str>],
    location: SourceLocation,
) -> Result<Vec<Value>, RuntimeError> {
    if args.len() != labels.len() {
        return Err(RuntimeError::ArgumentMismatch {
            function: method.to_string(),
            message: Interpreter::arity_message(labels.len(), args.len()),
            location,
        });
    }
    let mut values = Vec::with_capacity(args.len());
    for ((label, value), expected) in args.into_iter().zip(labels) {
        if let Some(label) = label {
            if Some(label.as_str()) != *expected {
                return Err(RuntimeError::ArgumentMismatch {
                    function: method.to_string(),
                    message: format!("extraneous argument label '{}:'", label),
                    location,
                });
            }
        }
        values.push(value);
    }
    Ok(values)
}

fn expect_element(elem: &Type, value: &Value, location: SourceLocation) -> Result<(), RuntimeError> {
    if value.conforms_to(elem) {
        Ok(())
    } else {
        Err(RuntimeError::type_mismatch(
            format!(
                "cannot convert value of type '{}' to expected element type '{}'",
                value.type_of(),
                elem
            ),
            location,
        ))
    }
}

fn expect_string(method: &str, value: Value, location: SourceLocation) -> Result<String, RuntimeError> {
    match value {
        Value::Str(s) => Ok(s),
        other => Err(RuntimeError::type_mismatch(
            format!(
                "'{}' expects a 'String' argument, got '{}'",
                method,
                other.type_of()
            ),
            location,
        )),
    }
}

impl Interpreter {
    /// `object[index]`
    pub(crate) fn subscript_value(
        object: Value,
        index: &Value,
        location: SourceLocation,
    ) -> Result<Value, RuntimeError> {
        match (object, index) {
            (Value::Array { items, .. }, Value::Int(i)) => {
                let i = checked_index(*i, items.len(), location)?;
                Ok(items[i].clone())
            }

            (Value::Array { elem, items }, Value::Range { start, end, inclusive }) => {
                let (lower, upper) = Self::slice_bounds(*start, *end, *inclusive, items.len(), location)?;
                Ok(Value::Array {
                    elem,
                    items: items[lower..upper].to_vec(),
                })
            }

            (Value::Array { .. }, other) => Err(RuntimeError::type_mismatch(
                format!("array index must be 'Int', not '{}'", other.type_of()),
                location,
            )),

            (Value::Dict { key, value, entries }, k) => {
                if !k.conforms_to(&key) {
                    return Err(RuntimeError::type_mismatch(
                        format!(
                            "cannot subscript '{}' with a key of type '{}'",
                            Type::dictionary_of(key, value),
                            k.type_of()
                        ),
                        location,
                    ));
                }
                dict_lookup(&entries, k)
                    .cloned()
                    .ok_or_else(|| RuntimeError::MissingKey {
                        key: k.render_nested(),
                        location,
                    })
            }

            (Value::Str(_), _) => Err(RuntimeError::type_mismatch(
                "strings cannot be subscripted by position; iterate with 'for-in' instead",
                location,
            )),

            (other, _) => Err(RuntimeError::type_mismatch(
                format!("value of type '{}' has no subscripts", other.type_of()),
                location,
            )),
        }
    }

    /// Half-open index bounds of a range subscript into `count` elements
    pub(crate) fn slice_bounds(
        start: i64,
        end: i64,
        inclusive: bool,
        count: usize,
        location: SourceLocation,
    ) -> Result<(usize, usize), RuntimeError> {
        let lower = usize::try_from(start).ok().filter(|&l| l <= count).ok_or(
            RuntimeError::IndexOutOfBounds {
                index: start,
                count,
                location,
            },
        )?;
        let upper_index = if inclusive { end.checked_add(1) } else { Some(end) };
        let upper = upper_index
            .and_then(|u| usize::try_from(u).ok())
            .filter(|&u| u <= count)
            .ok_or(RuntimeError::IndexOutOfBounds {
                index: end,
                count,
                location,
            })?;
        Ok((lower, upper))
    }

    /// `object.member` for properties
    pub(crate) fn member_value(
        &self,
        object: Value,
        member: &str,
        location: SourceLocation,
    ) -> Result<Value, RuntimeError> {
        let unknown = |type_name: String| RuntimeError::UnknownMember {
            type_name,
            member: member.to_string(),
            location,
        };

        match object {
            Value::Struct { name, fields } => {
                if let Some((_, value)) = fields.into_iter().find(|(field, _)| field == member) {
                    return Ok(value);
                }
                let is_method = self
                    .struct_defs
                    .get(&name)
                    .is_some_and(|def| def.method(member).is_some());
                if is_method {
                    return Err(RuntimeError::type_mismatch(
                        format!("method '{}' must be called with '()'", member),
                        location,
                    ));
                }
                Err(unknown(name))
            }

            Value::Array { elem, mut items } => match member {
                "count" => Ok(Value::Int(items.len() as i64)),
                "isEmpty" => Ok(Value::Bool(items.is_empty())),
                "first" | "last" => {
                    let item = if member == "first" {
                        (!items.is_empty()).then(|| items.swap_remove(0))
                    } else {
                        items.pop()
                    };
                    item.ok_or_else(|| RuntimeError::EmptyCollection {
                        member: member.to_string(),
                        location,
                    })
                }
                _ => Err(unknown(Type::array_of(elem).to_string())),
            },

            Value::Dict {
                key,
                value,
                entries,
            } => match member {
                "count" => Ok(Value::Int(entries.len() as i64)),
                "isEmpty" => Ok(Value::Bool(entries.is_empty())),
                "keys" => Ok(Value::Array {
                    elem: key,
                    items: entries.into_iter().map(|(k, _)| k).collect(),
                }),
                "values" => Ok(Value::Array {
                    elem: value,
                    items: entries.into_iter().map(|(_, v)| v).collect(),
                }),
                _ => Err(unknown(Type::dictionary_of(key, value).to_string())),
            },

            Value::Str(s) => match member {
                "count" => Ok(Value::Int(s.chars().count() as i64)),
                "isEmpty" => Ok(Value::Bool(s.is_empty())),
                _ => Err(unknown("String".to_string())),
            },

            Value::Range {
                start,
                end,
                inclusive,
            } => match member {
                "count" => Ok(Value::Int(end - start + i64::from(inclusive))),
                "lowerBound" => Ok(Value::Int(start)),
                "upperBound" => Ok(Value::Int(end)),
                _ => Err(unknown("Range".to_string())),
            },

            other => Err(unknown(other.type_of().to_string())),
        }
    }

    /// Non-mutating built-in methods of arrays and strings
    pub(crate) fn call_value_method(
        receiver: Value,
        method: &str,
        args: Vec<(Option<String>, Value)>,
        location: SourceLocation,
    ) -> Result<Value, RuntimeError> {
        match receiver {
            Value::Array { elem, mut items } => match method {
                "contains" => {
                    let needle = expect_arguments(method, args, &[None], location)?.remove(0);
                    expect_element(&elem, &needle, location)?;
                    Ok(Value::Bool(items.iter().any(|item| item.equals(&needle))))
                }
                "reversed" => {
                    expect_arguments(method, args, &[], location)?;
                    items.reverse();
                    Ok(Value::Array { elem, items })
                }
                "sorted" => {
                    expect_arguments(method, args, &[], location)?;
                    Self::expect_ordered(&elem, location)?;
                    items.sort_by(|a, b| a.compare(b).unwrap_or(Ordering::Equal));
                    Ok(Value::Array { elem, items })
                }
                "min" | "max" => {
                    expect_arguments(method, args, &[], location)?;
                    Self::expect_ordered(&elem, location)?;
                    let pick = |a: Value, b: Value| {
                        let ordering = b.compare(&a).unwrap_or(Ordering::Equal);
                        let replace = if method == "min" {
                            ordering.is_lt()
                        } else {
                            ordering.is_gt()
                        };
                        if replace {
                            b
                        } else {
                            a
                        }
                    };
                    items
                        .into_iter()
                        .reduce(pick)
                        .ok_or_else(|| RuntimeError::EmptyCollection {
                            member: method.to_string(),
                            location,
                        })
                }
                "joined" => {
                    let separator = match args.len() {
                        0 => String::new(),
                        _ => {
                            let value =
                                expect_arguments(method, args, &[Some("separator")], location)?
                                    .remove(0);
                            expect_string(method, value, location)?
                        }
                    };
                    let mut parts = Vec::with_capacity(items.len());
                    for item in items {
                        parts.push(expect_string(method, item, location)?);
                    }
                    Ok(Value::Str(parts.join(&separator)))
                }
                _ => Err(RuntimeError::UnknownMember {
                    type_name: Type::array_of(elem).to_string(),
                    member: method.to_string(),
                    location,
                }),
            },

            Value::Str(s) => match method {
                "uppercased" => {
                    expect_arguments(method, args, &[], location)?;
                    Ok(Value::Str(s.to_uppercase()))
                }
                "lowercased" => {
                    expect_arguments(method, args, &[], location)?;
                    Ok(Value::Str(s.to_lowercase()))
                }
                "hasPrefix" | "hasSuffix" | "contains" => {
                    let other = expect_arguments(method, args, &[None], location)?.remove(0);
                    let other = expect_string(method, other, location)?;
                    Ok(Value::Bool(match method {
                        "hasPrefix" => s.starts_with(&other),
                        "hasSuffix" => s.ends_with(&other),
                        _ => s.contains(&other),
                    }))
                }
                _ => Err(RuntimeError::UnknownMember {
                    type_name: "String".to_string(),
                    member: method.to_string(),
                    location,
                }),
            },

            other => Err(RuntimeError::UnknownMember {
                type_name: other.type_of().to_string(),
                member: method.to_string(),
                location,
            }),
        }
    }

    fn expect_ordered(elem: &Type, location: SourceLocation) -> Result<(), RuntimeError> {
        match elem {
            Type::Int | Type::UInt | Type::Double | Type::String => Ok(()),
            other => Err(RuntimeError::type_mismatch(
                format!("elements of type '{}' cannot be ordered", other),
                location,
            )),
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

    fn ints(items: &[i64]) -> Value {
        Value::Array {
            elem: Type::Int,
            items: items.iter().copied().map(Value::Int).collect(),
        }
    }

    #[test]
    fn test_array_subscript_bounds() {
        assert_eq!(
            Interpreter::subscript_value(ints(&[1, 2, 3]), &Value::Int(2), loc()),
            Ok(Value::Int(3))
        );
        let err = Interpreter::subscript_value(ints(&[1, 2, 3]), &Value::Int(3), loc()).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::IndexOutOfBounds);
        assert_eq!(err.to_string(), "index 3 out of range for array of 3 elements");

        let err = Interpreter::subscript_value(ints(&[1]), &Value::Int(-1), loc()).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::IndexOutOfBounds);
    }

    #[test]
    fn test_range_subscript() {
        let range = Value::Range {
            start: 1,
            end: 2,
            inclusive: true,
        };
        assert_eq!(
            Interpreter::subscript_value(ints(&[1, 2, 3, 4]), &range, loc()),
            Ok(ints(&[2, 3]))
        );

        let too_far = Value::Range {
            start: 2,
            end: 9,
            inclusive: false,
        };
        let err = Interpreter::subscript_value(ints(&[1, 2, 3]), &too_far, loc()).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::IndexOutOfBounds);
    }

    #[test]
    fn test_dictionary_subscript() {
        let ages = Value::Dict {
            key: Type::String,
            value: Type::Int,
            entries: vec![(Value::Str("Tim".into()), Value::Int(22))],
        };
        assert_eq!(
            Interpreter::subscript_value(ages.clone(), &Value::Str("Tim".into()), loc()),
            Ok(Value::Int(22))
        );

        let err = Interpreter::subscript_value(ages.clone(), &Value::Str("Ana".into()), loc()).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::MissingKey);
        assert_eq!(err.to_string(), "key \"Ana\" not found in dictionary");

        let err = Interpreter::subscript_value(ages, &Value::Int(1), loc()).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::TypeMismatch);
    }

    #[test]
    fn test_value_methods() {
        let sorted = Interpreter::call_value_method(ints(&[3, 1, 2]), "sorted", vec![], loc());
        assert_eq!(sorted, Ok(ints(&[1, 2, 3])));

        let max = Interpreter::call_value_method(ints(&[3, 9, 2]), "max", vec![], loc());
        assert_eq!(max, Ok(Value::Int(9)));

        let contains = Interpreter::call_value_method(
            ints(&[3, 1, 2]),
            "contains",
            vec![(None, Value::Int(2))],
            loc(),
        );
        assert_eq!(contains, Ok(Value::Bool(true)));

        let prefix = Interpreter::call_value_method(
            Value::Str("Hello".into()),
            "hasPrefix",
            vec![(None, Value::Str("He".into()))],
            loc(),
        );
        assert_eq!(prefix, Ok(Value::Bool(true)));

        let err = Interpreter::call_value_method(ints(&[1]), "shuffle", vec![], loc()).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::UndefinedName);
    }

    #[test]
    fn test_wrong_argument_label() {
        let err = Interpreter::call_value_method(
            ints(&[1]),
            "contains",
            vec![(Some("where".into()), Value::Int(1))],
            loc(),
        )
        .unwrap_err();
        assert_eq!(err.kind(), ErrorKind::ArgumentMismatch);
    }
}
