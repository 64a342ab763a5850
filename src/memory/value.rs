//! Runtime value representation
//!
//! This module defines the [`Value`] enum, which represents all possible runtime values
//! in the lesson interpreter. Values are tagged and own their contents: copying a
//! binding copies the collection or struct, matching value semantics of the language.
//!
//! # Value Types
//!
//! - [`Value::Int`]: 64-bit signed integer (also carries `UInt` values)
//! - [`Value::Double`]: 64-bit float
//! - [`Value::Bool`], [`Value::Str`]
//! - [`Value::Array`]: element type plus items
//! - [`Value::Dict`]: key/value types plus entries in insertion order
//! - [`Value::Range`]: integer range produced by `...` / `..<`
//! - [`Value::Struct`]: struct instance with fields in declaration order
//! - [`Value::Void`]: result of a function without a return value
//!
//! # Rendering
//!
//! [`Value`]'s `Display` is what `print` shows. Strings are bare at the top level
//! and quoted when nested inside a collection or struct.

use crate::parser::ast::Type;
use std::cmp::Ordering;
use std::fmt;

/// Runtime values in the interpreter
#[derive(Debug, Clone, PartialEq, Default)]
pub enum Value {
    Int(i64),
    Double(f64),
    Bool(bool),
    Str(String),
    Array {
        elem: Type,
        items: Vec<Value>,
    },
    Dict {
        key: Type,
        value: Type,
        entries: Vec<(Value, Value)>,
    },
    Range {
        start: i64,
        end: i64,
        inclusive: bool,
    },
    Struct {
        name: String,
        fields: Vec<(String, Value)>,
    },
    #[default]
    Void,
}

impl Value {
    /// The static type this value belongs to
    pub fn type_of(&self) -> Type {
        match self {
            Value::Int(_) => Type::Int,
            Value::Double(_) => Type::Double,
            Value::Bool(_) => Type::Bool,
            Value::Str(_) => Type::String,
            Value::Array { elem, .. } => Type::array_of(elem.clone()),
            Value::Dict { key, value, .. } => Type::dictionary_of(key.clone(), value.clone()),
            Value::Range { .. } => Type::Range,
            Value::Struct { name, .. } => Type::Struct(name.clone()),
            Value::Void => Type::Void,
        }
    }

    /// Whether this value may be stored in a binding declared with `ty`.
    /// `UInt` accepts non-negative integers.
    pub fn conforms_to(&self, ty: &Type) -> bool {
        match (self, ty) {
            (Value::Int(n), Type::UInt) => *n >= 0,
            _ => self.type_of() == *ty,
        }
    }

    pub fn as_int(&self) -> Option<i64> {
        match self {
            Value::Int(n) => Some(*n),
            _ => None,
        }
    }

    pub fn as_bool(&self) -> Option<bool> {
        match self {
            Value::Bool(b) => Some(*b),
            _ => None,
        }
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            Value::Str(s) => Some(s),
            _ => None,
        }
    }

    /// Language-level equality. Dictionaries compare as unordered maps.
    pub fn equals(&self, other: &Value) -> bool {
        match (self, other) {
            (Value::Array { items: a, .. }, Value::Array { items: b, .. }) => {
                a.len() == b.len() && a.iter().zip(b).all(|(x, y)| x.equals(y))
            }
            (Value::Dict { entries: a, .. }, Value::Dict { entries: b, .. }) => {
                a.len() == b.len()
                    && a.iter().all(|(k, v)| {
                        dict_lookup(b, k).is_some_and(|other_v| other_v.equals(v))
                    })
            }
            (Value::Struct { name: n1, fields: f1 }, Value::Struct { name: n2, fields: f2 }) => {
                n1 == n2
                    && f1.len() == f2.len()
                    && f1
                        .iter()
                        .zip(f2)
                        .all(|((a, x), (b, y))| a == b && x.equals(y))
            }
            _ => self == other,
        }
    }

    /// Ordering for `<`, `>`, `sorted()`, `min` and `max`. `None` if the
    /// values are not comparable.
    pub fn compare(&self, other: &Value) -> Option<Ordering> {
        match (self, other) {
            (Value::Int(a), Value::Int(b)) => Some(a.cmp(b)),
            (Value::Double(a), Value::Double(b)) => a.partial_cmp(b),
            (Value::Str(a), Value::Str(b)) => Some(a.cmp(b)),
            _ => None,
        }
    }

    /// Rough heap footprint, used to bound the snapshot trace
    pub fn estimated_size(&self) -> usize {
        let base = std::mem::size_of::<Value>();
        match self {
            Value::Str(s) => base + s.len(),
            Value::Array { items, .. } => {
                base + items.iter().map(Value::estimated_size).sum::<usize>()
            }
            Value::Dict { entries, .. } => {
                base + entries
                    .iter()
                    .map(|(k, v)| k.estimated_size() + v.estimated_size())
                    .sum::<usize>()
            }
            Value::Struct { fields, .. } => {
                base + fields
                    .iter()
                    .map(|(name, v)| name.len() + v.estimated_size())
                    .sum::<usize>()
            }
            _ => base,
        }
    }

    /// Rendering used inside collections: strings are quoted
    pub fn render_nested(&self) -> String {
        match self {
            Value::Str(s) => format!("{:?}", s),
            other => other.to_string(),
        }
    }
}

/// Find the value stored under `key`
pub fn dict_lookup<'a>(entries: &'a [(Value, Value)], key: &Value) -> Option<&'a Value> {
    entries.iter().find(|(k, _)| k.equals(key)).map(|(_, v)| v)
}

/// Position of `key` among the entries
pub fn dict_position(entries: &[(Value, Value)], key: &Value) -> Option<usize> {
    entries.iter().position(|(k, _)| k.equals(key))
}

/// Format a double the way the language prints it: always with a fraction
pub fn format_double(n: f64) -> String {
    if n.is_nan() {
        "nan".to_string()
    } else if n.is_infinite() {
        let sign = if n > 0.0 { "" } else { "-" };
        format!("{}inf", sign)
    } else if n.fract() == 0.0 && n.abs() < 1e16 {
        format!("{:.1}", n)
    } else {
        format!("{}", n)
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Int(n) => write!(f, "{}", n),
            Value::Double(n) => write!(f, "{}", format_double(*n)),
            Value::Bool(b) => write!(f, "{}", b),
            Value::Str(s) => write!(f, "{}", s),
            Value::Array { items, .. } => {
                let parts: Vec<String> = items.iter().map(Value::render_nested).collect();
                write!(f, "[{}]", parts.join(", "))
            }
            Value::Dict { entries, .. } => {
                if entries.is_empty() {
                    return write!(f, "[:]");
                }
                let parts: Vec<String> = entries
                    .iter()
                    .map(|(k, v)| format!("{}: {}", k.render_nested(), v.render_nested()))
                    .collect();
                write!(f, "[{}]", parts.join(", "))
            }
            Value::Range {
                start,
                end,
                inclusive,
            } => {
                let op = if *inclusive { "..." } else { "..<" };
                write!(f, "{}{}{}", start, op, end)
            }
            Value::Struct { name, fields } => {
                let parts: Vec<String> = fields
                    .iter()
                    .map(|(field, v)| format!("{}: {}", field, v.render_nested()))
                    .collect();
                write!(f, "{}({})", name, parts.join(", "))
            }
            Value::Void => write!(f, "()"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn strings(items: &[&str]) -> Value {
        Value::Array {
            elem: Type::String,
            items: items.iter().map(|s| Value::Str(s.to_string())).collect(),
        }
    }

    #[test]
    fn test_double_always_shows_fraction() {
        assert_eq!(Value::Double(3.0).to_string(), "3.0");
        assert_eq!(Value::Double(-0.5).to_string(), "-0.5");
        assert_eq!(Value::Double(0.1 + 0.2).to_string(), "0.30000000000000004");
    }

    #[test]
    fn test_strings_quoted_only_when_nested() {
        assert_eq!(Value::Str("Apple".into()).to_string(), "Apple");
        assert_eq!(strings(&["Apple", "Pie"]).to_string(), "[\"Apple\", \"Pie\"]");
    }

    #[test]
    fn test_dictionary_rendering() {
        let empty = Value::Dict {
            key: Type::String,
            value: Type::Int,
            entries: vec![],
        };
        assert_eq!(empty.to_string(), "[:]");

        let ages = Value::Dict {
            key: Type::String,
            value: Type::Int,
            entries: vec![(Value::Str("Tim".into()), Value::Int(22))],
        };
        assert_eq!(ages.to_string(), "[\"Tim\": 22]");
    }

    #[test]
    fn test_struct_and_range_rendering() {
        let person = Value::Struct {
            name: "Person".into(),
            fields: vec![
                ("firstName".into(), Value::Str("Peter".into())),
                ("age".into(), Value::Int(3)),
            ],
        };
        assert_eq!(person.to_string(), "Person(firstName: \"Peter\", age: 3)");

        let range = Value::Range {
            start: 0,
            end: 5,
            inclusive: false,
        };
        assert_eq!(range.to_string(), "0..<5");
    }

    #[test]
    fn test_uint_conformance() {
        assert!(Value::Int(4).conforms_to(&Type::UInt));
        assert!(!Value::Int(-4).conforms_to(&Type::UInt));
        assert!(!Value::Int(4).conforms_to(&Type::Double));
    }

    #[test]
    fn test_dictionary_equality_ignores_order() {
        let a = Value::Dict {
            key: Type::Int,
            value: Type::String,
            entries: vec![
                (Value::Int(1), Value::Str("One".into())),
                (Value::Int(2), Value::Str("Two".into())),
            ],
        };
        let b = Value::Dict {
            key: Type::Int,
            value: Type::String,
            entries: vec![
                (Value::Int(2), Value::Str("Two".into())),
                (Value::Int(1), Value::Str("One".into())),
            ],
        };
        assert!(a.equals(&b));
        assert_ne!(a, b);
    }
}
