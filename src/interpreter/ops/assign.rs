//! Assignment to places and in-place collection mutation
//!
//! A *place* is a binding followed by `.field` and `[index]` segments, e.g.
//! `people[0].name`. Values have copy semantics, so writing to a place means
//! walking into the root binding's value and replacing one part of it.
//! Every segment on the way is checked: the root must be a `var`, each field a
//! `var` property, and each index in bounds.

use crate::interpreter::engine::Interpreter;
use crate::interpreter::errors::RuntimeError;
use crate::interpreter::expressions::describe_expression;
use crate::interpreter::ops::access::{checked_index, expect_arguments};
use crate::memory::value::{dict_position, Value};
use crate::parser::ast::{Arg, AstNode, BinOp, SourceLocation, StructDef, Type};
use rustc_hash::FxHashMap;
use std::rc::Rc;

type StructDefs = FxHashMap<String, Rc<StructDef>>;

/// Built-in methods that modify their receiver
const MUTATING_METHODS: &[&str] = &[
    "append",
    "insert",
    "remove",
    "removeAtIndex",
    "removeFirst",
    "removeLast",
    "removeAll",
    "removeValue",
];

#[derive(Debug, Clone)]
pub(crate) enum PlaceSegment {
    Field(String),
    Index(Value),
}

/// A resolved assignment target
#[derive(Debug, Clone)]
pub(crate) struct Place {
    root: String,
    segments: Vec<PlaceSegment>,
    /// Source-like rendering for error messages
    path: String,
    location: SourceLocation,
}

impl Interpreter {
    pub(crate) fn execute_assignment(
        &mut self,
        target: &AstNode,
        value: &AstNode,
        location: SourceLocation,
    ) -> Result<(), RuntimeError> {
        // `_ = expr` evaluates and discards
        if let AstNode::Variable(name, _) = target {
            if name == "_" {
                let discarded = self.evaluate_expr(value)?;
                self.pending_result = Some(discarded.render_nested());
                return Ok(());
            }
        }

        let place = self.resolve_place(target)?;
        self.ensure_mutable(&place)?;
        let expected = self.place_type(&place);
        let new_value = self.evaluate_with_expected(value, expected.as_ref())?;

        self.pending_result = Some(new_value.render_nested());
        self.store(&place, new_value, location)
    }

    pub(crate) fn execute_compound_assignment(
        &mut self,
        target: &AstNode,
        op: BinOp,
        value: &AstNode,
        location: SourceLocation,
    ) -> Result<(), RuntimeError> {
        let place = self.resolve_place(target)?;
        self.ensure_mutable(&place)?;

        let current = self.read_place(&place)?;
        let hint = current.type_of();
        let rhs = self.evaluate_with_expected(value, Some(&hint))?;
        let result = Self::apply_binary(op, current, rhs, location)?;

        self.pending_result = Some(result.render_nested());
        self.store(&place, result, location)
    }

    /// Turn an assignment target into a place, evaluating its indices
    pub(crate) fn resolve_place(&mut self, target: &AstNode) -> Result<Place, RuntimeError> {
        match target {
            AstNode::Variable(name, location) => {
                // Inside a method, a bare field name refers to `self.field`
                if self.stack.get_local(name).is_none() && self.self_field(name).is_some() {
                    return Ok(Place {
                        root: "self".to_string(),
                        segments: vec![PlaceSegment::Field(name.clone())],
                        path: name.clone(),
                        location: *location,
                    });
                }
                Ok(Place {
                    root: name.clone(),
                    segments: Vec::new(),
                    path: name.clone(),
                    location: *location,
                })
            }

            AstNode::Member { object, member, .. } => {
                let mut place = self.resolve_place(object)?;
                place.segments.push(PlaceSegment::Field(member.clone()));
                place.path = format!("{}.{}", place.path, member);
                Ok(place)
            }

            AstNode::Subscript { object, index, .. } => {
                let mut place = self.resolve_place(object)?;
                let container = self.place_type(&place).unwrap_or(Type::Void);
                let idx = self.evaluate_index(&container, index)?;
                place.path = format!("{}[{}]", place.path, idx.render_nested());
                place.segments.push(PlaceSegment::Index(idx));
                Ok(place)
            }

            AstNode::ForceUnwrap { expr, .. } => self.resolve_place(expr),

            other => Err(RuntimeError::ImmutableAssignment {
                target: describe_expression(other),
                reason: "it is a temporary value".to_string(),
                location: other.location(),
            }),
        }
    }

    /// The root binding must exist and be a `var`
    fn ensure_mutable(&self, place: &Place) -> Result<(), RuntimeError> {
        let binding = self.stack.get(&place.root).ok_or_else(|| {
            if self.stack.is_expired(&place.root) {
                RuntimeError::ScopeViolation {
                    name: place.root.clone(),
                    location: place.location,
                }
            } else {
                RuntimeError::UndefinedName {
                    name: place.root.clone(),
                    location: place.location,
                }
            }
        })?;

        if binding.is_mutable {
            return Ok(());
        }
        let (target, reason) = if place.root == "self" {
            (place.path.clone(), "'self' is immutable".to_string())
        } else {
            (place.root.clone(), "it is a 'let' constant".to_string())
        };
        Err(RuntimeError::ImmutableAssignment {
            target,
            reason,
            location: place.location,
        })
    }

    /// Declared type of the value stored at `place`, when it can be known
    pub(crate) fn place_type(&self, place: &Place) -> Option<Type> {
        let mut ty = self.stack.get(&place.root)?.declared_type.clone();
        for segment in &place.segments {
            ty = match (ty, segment) {
                (Type::Struct(name), PlaceSegment::Field(field)) => {
                    self.struct_defs.get(&name)?.field(field)?.field_type.clone()
                }
                (Type::Array(elem), PlaceSegment::Index(Value::Int(_))) => *elem,
                (ty @ Type::Array(_), PlaceSegment::Index(Value::Range { .. })) => ty,
                (Type::Dictionary(_, value), PlaceSegment::Index(_)) => *value,
                _ => return None,
            };
        }
        Some(ty)
    }

    /// Current value at `place`
    pub(crate) fn read_place(&self, place: &Place) -> Result<Value, RuntimeError> {
        let mut value = self
            .stack
            .get(&place.root)
            .map(|b| b.value.clone())
            .ok_or_else(|| RuntimeError::UndefinedName {
                name: place.root.clone(),
                location: place.location,
            })?;
        for segment in &place.segments {
            value = match segment {
                PlaceSegment::Field(field) => self.member_value(value, field, place.location)?,
                PlaceSegment::Index(index) => Self::subscript_value(value, index, place.location)?,
            };
        }
        Ok(value)
    }

    /// Write `value` to `place`, checking every segment on the way
    pub(crate) fn store(
        &mut self,
        place: &Place,
        value: Value,
        location: SourceLocation,
    ) -> Result<(), RuntimeError> {
        self.ensure_mutable(place)?;

        let struct_defs = &self.struct_defs;
        let binding = self.stack.get_mut(&place.root).ok_or_else(|| RuntimeError::UndefinedName {
            name: place.root.clone(),
            location,
        })?;

        let Some((last, parents)) = place.segments.split_last() else {
            let value = Self::check_type(value, &binding.declared_type, "type", location)?;
            binding.value = value;
            return Ok(());
        };

        let mut current = &mut binding.value;
        for segment in parents {
            current = Self::navigate_mut(struct_defs, current, segment, location)?;
        }
        Self::assign_segment(struct_defs, current, last, value, location)
    }

    /// Step into one segment of a value for writing
    fn navigate_mut<'a>(
        struct_defs: &StructDefs,
        value: &'a mut Value,
        segment: &PlaceSegment,
        location: SourceLocation,
    ) -> Result<&'a mut Value, RuntimeError> {
        match (value, segment) {
            (Value::Struct { name, fields }, PlaceSegment::Field(field)) => {
                Self::check_field_mutable(struct_defs, name, field, location)?;
                fields
                    .iter_mut()
                    .find(|(n, _)| n == field)
                    .map(|(_, v)| v)
                    .ok_or_else(|| RuntimeError::UnknownMember {
                        type_name: name.clone(),
                        member: field.clone(),
                        location,
                    })
            }
            (Value::Array { items, .. }, PlaceSegment::Index(Value::Int(i))) => {
                let i = checked_index(*i, items.len(), location)?;
                Ok(&mut items[i])
            }
            (Value::Dict { entries, .. }, PlaceSegment::Index(key)) => {
                let pos = dict_position(entries, key).ok_or_else(|| RuntimeError::MissingKey {
                    key: key.render_nested(),
                    location,
                })?;
                Ok(&mut entries[pos].1)
            }
            (other, segment) => Err(Self::unassignable(other, segment, location)),
        }
    }

    /// Replace the part of `container` named by `segment`
    fn assign_segment(
        struct_defs: &StructDefs,
        container: &mut Value,
        segment: &PlaceSegment,
        value: Value,
        location: SourceLocation,
    ) -> Result<(), RuntimeError> {
        match (container, segment) {
            (Value::Struct { name, fields }, PlaceSegment::Field(field)) => {
                let field_type = Self::check_field_mutable(struct_defs, name, field, location)?;
                let value = Self::check_type(value, &field_type, "property type", location)?;
                match fields.iter_mut().find(|(n, _)| n == field) {
                    Some((_, slot)) => {
                        *slot = value;
                        Ok(())
                    }
                    None => Err(RuntimeError::UnknownMember {
                        type_name: name.clone(),
                        member: field.clone(),
                        location,
                    }),
                }
            }

            (Value::Array { elem, items }, PlaceSegment::Index(Value::Int(i))) => {
                let i = checked_index(*i, items.len(), location)?;
                items[i] = Self::check_type(value, elem, "element type", location)?;
                Ok(())
            }

            (
                Value::Array { elem, items },
                PlaceSegment::Index(Value::Range {
                    start,
                    end,
                    inclusive,
                }),
            ) => {
                let (lower, upper) = Self::slice_bounds(*start, *end, *inclusive, items.len(), location)?;
                let array_type = Type::array_of(elem.clone());
                match Self::check_type(value, &array_type, "type", location)? {
                    Value::Array {
                        items: replacement, ..
                    } => {
                        items.splice(lower..upper, replacement);
                        Ok(())
                    }
                    other => Err(RuntimeError::type_mismatch(
                        format!("cannot replace a slice with '{}'", other.type_of()),
                        location,
                    )),
                }
            }

            (
                Value::Dict {
                    key,
                    value: value_type,
                    entries,
                },
                PlaceSegment::Index(k),
            ) => {
                if !k.conforms_to(key) {
                    return Err(RuntimeError::type_mismatch(
                        format!(
                            "cannot convert value of type '{}' to expected key type '{}'",
                            k.type_of(),
                            key
                        ),
                        location,
                    ));
                }
                let value = Self::check_type(value, value_type, "value type", location)?;
                match dict_position(entries, k) {
                    Some(pos) => entries[pos].1 = value,
                    None => entries.push((k.clone(), value)),
                }
                Ok(())
            }

            (other, segment) => Err(Self::unassignable(other, segment, location)),
        }
    }

    /// A `let` property cannot be written; returns the field's type otherwise
    fn check_field_mutable(
        struct_defs: &StructDefs,
        struct_name: &str,
        field: &str,
        location: SourceLocation,
    ) -> Result<Type, RuntimeError> {
        let def = struct_defs
            .get(struct_name)
            .and_then(|def| def.field(field))
            .ok_or_else(|| RuntimeError::UnknownMember {
                type_name: struct_name.to_string(),
                member: field.to_string(),
                location,
            })?;
        if !def.is_mutable {
            return Err(RuntimeError::ImmutableAssignment {
                target: field.to_string(),
                reason: format!("'{}' is a 'let' property of '{}'", field, struct_name),
                location,
            });
        }
        Ok(def.field_type.clone())
    }

    fn unassignable(container: &Value, segment: &PlaceSegment, location: SourceLocation) -> RuntimeError {
        match (container, segment) {
            (Value::Array { .. } | Value::Dict { .. } | Value::Str(_) | Value::Range { .. }, PlaceSegment::Field(field)) => {
                RuntimeError::ImmutableAssignment {
                    target: field.clone(),
                    reason: format!("'{}' is a get-only property", field),
                    location,
                }
            }
            (other, PlaceSegment::Field(field)) => RuntimeError::UnknownMember {
                type_name: other.type_of().to_string(),
                member: field.clone(),
                location,
            },
            (Value::Array { .. }, PlaceSegment::Index(index)) => RuntimeError::type_mismatch(
                format!("array index must be 'Int', not '{}'", index.type_of()),
                location,
            ),
            (other, PlaceSegment::Index(_)) => RuntimeError::type_mismatch(
                format!("value of type '{}' has no subscripts", other.type_of()),
                location,
            ),
        }
    }

    pub(crate) fn is_mutating_method(method: &str) -> bool {
        MUTATING_METHODS.contains(&method)
    }

    /// `place.append(x)` and friends: read the collection, change it, store
    /// it back. Struct receivers go to their own methods.
    pub(crate) fn call_mutating_method(
        &mut self,
        object: &AstNode,
        method: &str,
        args: &[Arg],
        location: SourceLocation,
    ) -> Result<Value, RuntimeError> {
        let place = self.resolve_place(object)?;
        let mut container = self.read_place(&place)?;
        if !matches!(container, Value::Array { .. } | Value::Dict { .. }) {
            return self.call_method_on(container, method, args, location);
        }

        self.ensure_mutable(&place)?;
        let values = self.evaluate_arguments(&container.type_of(), args)?;
        let result = Self::apply_mutation(&mut container, method, values, location)?;
        self.store(&place, container, location)?;
        Ok(result)
    }

    fn apply_mutation(
        container: &mut Value,
        method: &str,
        args: Vec<(Option<String>, Value)>,
        location: SourceLocation,
    ) -> Result<Value, RuntimeError> {
        match container {
            Value::Array { elem, items } => match method {
                "append" => {
                    let contents_of = matches!(args.first(), Some((Some(label), _)) if label == "contentsOf");
                    if contents_of {
                        let other = expect_arguments(method, args, &[Some("contentsOf")], location)?
                            .remove(0);
                        let array_type = Type::array_of(elem.clone());
                        if let Value::Array { items: more, .. } =
                            Self::check_type(other, &array_type, "type", location)?
                        {
                            items.extend(more);
                        }
                    } else {
                        let item = expect_arguments(method, args, &[None], location)?.remove(0);
                        items.push(Self::check_type(item, elem, "element type", location)?);
                    }
                    Ok(Value::Void)
                }
                "insert" => {
                    let mut values = expect_arguments(method, args, &[None, Some("at")], location)?;
                    let at = values.pop().unwrap_or_default();
                    let item = values.pop().unwrap_or_default();
                    let index = Self::index_argument(method, at, location)?;
                    if index < 0 || index as usize > items.len() {
                        return Err(RuntimeError::IndexOutOfBounds {
                            index,
                            count: items.len(),
                            location,
                        });
                    }
                    let item = Self::check_type(item, elem, "element type", location)?;
                    items.insert(index as usize, item);
                    Ok(Value::Void)
                }
                "remove" | "removeAtIndex" => {
                    let label = if method == "remove" { Some("at") } else { None };
                    let at = expect_arguments(method, args, &[label], location)?.remove(0);
                    let index = Self::index_argument(method, at, location)?;
                    let i = checked_index(index, items.len(), location)?;
                    Ok(items.remove(i))
                }
                "removeFirst" | "removeLast" => {
                    expect_arguments(method, args, &[], location)?;
                    if items.is_empty() {
                        return Err(RuntimeError::EmptyCollection {
                            member: method.to_string(),
                            location,
                        });
                    }
                    if method == "removeFirst" {
                        Ok(items.remove(0))
                    } else {
                        Ok(items.pop().unwrap_or_default())
                    }
                }
                "removeAll" => {
                    expect_arguments(method, args, &[], location)?;
                    items.clear();
                    Ok(Value::Void)
                }
                _ => Err(RuntimeError::UnknownMember {
                    type_name: Type::array_of(elem.clone()).to_string(),
                    member: method.to_string(),
                    location,
                }),
            },

            Value::Dict {
                key,
                value,
                entries,
            } => match method {
                "removeValue" => {
                    let k = expect_arguments(method, args, &[Some("forKey")], location)?.remove(0);
                    if !k.conforms_to(key) {
                        return Err(RuntimeError::type_mismatch(
                            format!(
                                "cannot convert value of type '{}' to expected key type '{}'",
                                k.type_of(),
                                key
                            ),
                            location,
                        ));
                    }
                    // Removing an absent key is not an error
                    Ok(match dict_position(entries, &k) {
                        Some(pos) => entries.remove(pos).1,
                        None => Value::Void,
                    })
                }
                "removeAll" => {
                    expect_arguments(method, args, &[], location)?;
                    entries.clear();
                    Ok(Value::Void)
                }
                _ => Err(RuntimeError::UnknownMember {
                    type_name: Type::dictionary_of(key.clone(), value.clone()).to_string(),
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

    fn index_argument(method: &str, value: Value, location: SourceLocation) -> Result<i64, RuntimeError> {
        value.as_int().ok_or_else(|| {
            RuntimeError::type_mismatch(
                format!(
                    "'{}' expects an 'Int' position, got '{}'",
                    method,
                    value.type_of()
                ),
                location,
            )
        })
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
    fn test_array_mutation() {
        let source = "var list = [\"catfish\", \"water\"]\nlist[1] = \"bottle of water\"\nlist.append(\"tulips\")\nlist.insert(\"eggs\", at: 0)\nlet removed = list.remove(at: 1)\nprint(removed, list.count)\nprint(list)";
        let (output, result) = run(source);
        assert!(result.is_ok(), "{:?}", result);
        assert_eq!(
            output,
            vec![
                "catfish 3",
                "[\"eggs\", \"bottle of water\", \"tulips\"]"
            ]
        );
    }

    #[test]
    fn test_let_collection_cannot_be_mutated() {
        let (output, result) = run("let fixed = [1, 2]\nfixed.append(3)\nprint(fixed)");
        let err = result.unwrap_err();
        assert_eq!(err.kind(), ErrorKind::ImmutableAssignment);
        assert_eq!(err.location().line, 2);
        assert!(output.is_empty());
    }

    #[test]
    fn test_subscript_store_out_of_bounds() {
        let (_, result) = run("var xs = [1, 2, 3]\nxs[3] = 4");
        assert_eq!(result.unwrap_err().kind(), ErrorKind::IndexOutOfBounds);
    }

    #[test]
    fn test_element_type_checked_on_store() {
        let (_, result) = run("var xs = [1, 2, 3]\nxs[0] = \"one\"");
        assert_eq!(result.unwrap_err().kind(), ErrorKind::TypeMismatch);

        let (_, result) = run("var xs = [1, 2, 3]\nxs.append(2.5)");
        assert_eq!(result.unwrap_err().kind(), ErrorKind::TypeMismatch);
    }

    #[test]
    fn test_range_replacement() {
        let (output, result) = run("var xs = [1, 2, 3, 4, 5]\nxs[1...3] = [0]\nprint(xs)");
        assert!(result.is_ok(), "{:?}", result);
        assert_eq!(output, vec!["[1, 0, 5]"]);
    }

    #[test]
    fn test_dictionary_insert_update_remove() {
        let source = "var occupations = [\"Malcolm\": \"Captain\"]\noccupations[\"Jayne\"] = \"Public Relations\"\noccupations[\"Malcolm\"] = \"Boss\"\noccupations.removeValue(forKey: \"Nobody\")\nprint(occupations)\nprint(occupations.count)";
        let (output, result) = run(source);
        assert!(result.is_ok(), "{:?}", result);
        assert_eq!(
            output,
            vec![
                "[\"Malcolm\": \"Boss\", \"Jayne\": \"Public Relations\"]",
                "2"
            ]
        );
    }

    #[test]
    fn test_struct_fields() {
        let source = "struct Person {\n  let name: String\n  var age: Int\n}\nvar p = Person(name: \"Ana\", age: 30)\np.age += 1\nprint(p.age)\np.name = \"Bo\"";
        let (output, result) = run(source);
        assert_eq!(output, vec!["31"]);
        let err = result.unwrap_err();
        assert_eq!(err.kind(), ErrorKind::ImmutableAssignment);
        assert_eq!(err.location().line, 8);
    }

    #[test]
    fn test_let_struct_is_immutable() {
        let source = "struct Counter {\n  var value: Int\n}\nlet c = Counter(value: 0)\nc.value = 1";
        let (_, result) = run(source);
        let err = result.unwrap_err();
        assert_eq!(err.kind(), ErrorKind::ImmutableAssignment);
        assert_eq!(err.to_string(), "cannot assign to 'c': it is a 'let' constant");
    }

    #[test]
    fn test_self_is_immutable_in_methods() {
        let source = "struct Counter {\n  var value: Int\n  func bump() {\n    value += 1\n  }\n}\nvar c = Counter(value: 0)\nc.bump()";
        let (_, result) = run(source);
        let err = result.unwrap_err();
        assert_eq!(err.kind(), ErrorKind::ImmutableAssignment);
        assert_eq!(err.location().line, 4);
    }

    #[test]
    fn test_get_only_property() {
        let (_, result) = run("var xs = [1]\nxs.count = 4");
        assert_eq!(result.unwrap_err().kind(), ErrorKind::ImmutableAssignment);
    }

    #[test]
    fn test_compound_assignment_on_double() {
        let (output, result) = run("var total = 0.5\ntotal += 2\ntotal *= 2\nprint(total)");
        assert!(result.is_ok());
        assert_eq!(output, vec!["5.0"]);
    }

    #[test]
    fn test_nested_place() {
        let source = "var grid = [[1, 2], [3, 4]]\ngrid[1][0] = 9\nprint(grid)";
        let (output, result) = run(source);
        assert!(result.is_ok());
        assert_eq!(output, vec!["[[1, 2], [9, 4]]"]);
    }
}
