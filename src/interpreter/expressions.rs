//! Expression evaluation implementation
//!
//! This module handles evaluation of all lesson language expressions, including:
//!
//! - Literals, including string interpolation and collection literals
//! - Variables (with implicit `self` field access inside methods)
//! - Ternaries and the `??` fallback
//! - Function calls, struct initialisers and method calls
//!
//! Operators, subscripts, members and assignments are in [`ops`](super::ops),
//! built-in functions in [`builtins`](super::builtins).
//!
//! # Expected types
//!
//! [`Interpreter::evaluate_with_expected`] threads the type a context expects
//! down into the expression. That is how an integer literal becomes a Double
//! in `let d: Double = 3`, and how `[]` and `[:]` learn their element types.

use crate::interpreter::engine::{ControlFlow, Interpreter};
use crate::interpreter::errors::RuntimeError;
use crate::memory::value::{dict_position, Value};
use crate::parser::ast::*;
use std::rc::Rc;

impl Interpreter {
    /// Evaluate an expression and return its value
    pub(crate) fn evaluate_expr(&mut self, expr: &AstNode) -> Result<Value, RuntimeError> {
        self.evaluate_with_expected(expr, None)
    }

    /// Evaluate an expression in a context that expects `expected`
    pub(crate) fn evaluate_with_expected(
        &mut self,
        expr: &AstNode,
        expected: Option<&Type>,
    ) -> Result<Value, RuntimeError> {
        self.descend(expr.location())?;
        let value = self.evaluate_node(expr, expected);
        self.ascend();
        value
    }

    fn evaluate_node(&mut self, expr: &AstNode, expected: Option<&Type>) -> Result<Value, RuntimeError> {
        match expr {
            AstNode::IntLiteral(n, _) => match expected {
                Some(Type::Double) => Ok(Value::Double(*n as f64)),
                _ => Ok(Value::Int(*n)),
            },

            AstNode::DoubleLiteral(n, _) => Ok(Value::Double(*n)),

            AstNode::BoolLiteral(b, _) => Ok(Value::Bool(*b)),

            AstNode::StringLiteral(parts, _) => {
                let mut text = String::new();
                for part in parts {
                    match part {
                        StringPart::Text(s) => text.push_str(s),
                        StringPart::Interpolation(inner) => {
                            let value = self.evaluate_expr(inner)?;
                            text.push_str(&value.to_string());
                        }
                    }
                }
                Ok(Value::Str(text))
            }

            AstNode::ArrayLiteral(items, location) => {
                self.evaluate_array_literal(items, expected, *location)
            }

            AstNode::DictLiteral(entries, location) => {
                self.evaluate_dict_literal(entries, expected, *location)
            }

            AstNode::Variable(name, location) => self.lookup_variable(name, *location),

            AstNode::BinaryOp {
                op,
                left,
                right,
                location,
            } => self.evaluate_binary(*op, left, right, expected, *location),

            AstNode::UnaryOp {
                op,
                operand,
                location,
            } => self.evaluate_unary(*op, operand, expected, *location),

            AstNode::Ternary {
                condition,
                then_expr,
                else_expr,
                location,
            } => {
                let cond_val = self.evaluate_expr(condition)?;
                if Self::value_to_bool(&cond_val, *location)? {
                    self.evaluate_with_expected(then_expr, expected)
                } else {
                    self.evaluate_with_expected(else_expr, expected)
                }
            }

            AstNode::Call {
                callee,
                args,
                location,
            } => self.evaluate_call(callee, args, *location),

            AstNode::MethodCall {
                object,
                method,
                args,
                location,
            } => self.evaluate_method_call(object, method, args, *location),

            AstNode::Member {
                object,
                member,
                location,
            } => {
                let obj = self.evaluate_expr(object)?;
                self.member_value(obj, member, *location)
            }

            AstNode::Subscript {
                object,
                index,
                location,
            } => {
                let obj = self.evaluate_expr(object)?;
                let idx = self.evaluate_index(&obj.type_of(), index)?;
                Self::subscript_value(obj, &idx, *location)
            }

            // Optionals are not modelled; `x!` is just `x`
            AstNode::ForceUnwrap { expr, .. } => self.evaluate_with_expected(expr, expected),

            other => Err(RuntimeError::type_mismatch(
                "statement used where a value is expected",
                other.location(),
            )),
        }
    }

    /// Resolve a name: locals, then fields of `self`, then globals
    fn lookup_variable(&self, name: &str, location: SourceLocation) -> Result<Value, RuntimeError> {
        if let Some(binding) = self.stack.get_local(name) {
            return Ok(binding.value.clone());
        }
        if let Some(value) = self.self_field(name) {
            return Ok(value.clone());
        }
        if let Some(binding) = self.stack.get(name) {
            return Ok(binding.value.clone());
        }
        if self.function_defs.contains_key(name) || self.struct_defs.contains_key(name) {
            return Err(RuntimeError::type_mismatch(
                format!("'{}' must be called with '()'", name),
                location,
            ));
        }
        Err(self.unresolved_name(name, location))
    }

    /// Field `name` of the current method's `self`, if any
    pub(crate) fn self_field(&self, name: &str) -> Option<&Value> {
        match self.stack.get_local("self").map(|b| &b.value) {
            Some(Value::Struct { fields, .. }) => fields
                .iter()
                .find(|(field, _)| field == name)
                .map(|(_, value)| value),
            _ => None,
        }
    }

    /// Error for a name that is neither a binding nor callable
    fn unresolved_name(&self, name: &str, location: SourceLocation) -> RuntimeError {
        if self.stack.is_expired(name) {
            RuntimeError::ScopeViolation {
                name: name.to_string(),
                location,
            }
        } else {
            RuntimeError::UndefinedName {
                name: name.to_string(),
                location,
            }
        }
    }

    fn evaluate_array_literal(
        &mut self,
        items: &[AstNode],
        expected: Option<&Type>,
        location: SourceLocation,
    ) -> Result<Value, RuntimeError> {
        if let Some(Type::Array(elem)) = expected {
            let elem = (**elem).clone();
            let mut values = Vec::with_capacity(items.len());
            for item in items {
                let value = self.evaluate_with_expected(item, Some(&elem))?;
                values.push(Self::check_type(value, &elem, "element type", item.location())?);
            }
            return Ok(Value::Array {
                elem,
                items: values,
            });
        }

        if items.is_empty() {
            return Err(RuntimeError::type_mismatch(
                "empty collection literal requires an explicit type",
                location,
            ));
        }

        let mut values = Vec::with_capacity(items.len());
        for item in items {
            values.push(self.evaluate_expr(item)?);
        }
        let nodes: Vec<&AstNode> = items.iter().collect();
        let (elem, items) = Self::unify_literal_values(values, &nodes, location)?;
        Ok(Value::Array { elem, items })
    }

    fn evaluate_dict_literal(
        &mut self,
        entries: &[(AstNode, AstNode)],
        expected: Option<&Type>,
        location: SourceLocation,
    ) -> Result<Value, RuntimeError> {
        let (key_type, value_type) = match expected {
            Some(Type::Dictionary(key, value)) => {
                (Some((**key).clone()), Some((**value).clone()))
            }
            _ => (None, None),
        };

        if entries.is_empty() {
            return match (key_type, value_type) {
                (Some(key), Some(value)) => Ok(Value::Dict {
                    key,
                    value,
                    entries: Vec::new(),
                }),
                _ => Err(RuntimeError::type_mismatch(
                    "empty collection literal requires an explicit type",
                    location,
                )),
            };
        }

        let mut keys = Vec::with_capacity(entries.len());
        let mut values = Vec::with_capacity(entries.len());
        for (key_node, value_node) in entries {
            let key = self.evaluate_with_expected(key_node, key_type.as_ref())?;
            keys.push(match &key_type {
                Some(ty) => Self::check_type(key, ty, "key type", key_node.location())?,
                None => key,
            });
            let value = self.evaluate_with_expected(value_node, value_type.as_ref())?;
            values.push(match &value_type {
                Some(ty) => Self::check_type(value, ty, "value type", value_node.location())?,
                None => value,
            });
        }

        let (key, keys) = match key_type {
            Some(ty) => (ty, keys),
            None => {
                let nodes: Vec<&AstNode> = entries.iter().map(|(k, _)| k).collect();
                Self::unify_literal_values(keys, &nodes, location)?
            }
        };
        let (value, values) = match value_type {
            Some(ty) => (ty, values),
            None => {
                let nodes: Vec<&AstNode> = entries.iter().map(|(_, v)| v).collect();
                Self::unify_literal_values(values, &nodes, location)?
            }
        };

        if !key.is_hashable() {
            return Err(RuntimeError::type_mismatch(
                format!("type '{}' cannot be used as a dictionary key", key),
                location,
            ));
        }

        // Later duplicates overwrite earlier ones
        let mut dict_entries: Vec<(Value, Value)> = Vec::with_capacity(keys.len());
        for (k, v) in keys.into_iter().zip(values) {
            match dict_position(&dict_entries, &k) {
                Some(pos) => dict_entries[pos].1 = v,
                None => dict_entries.push((k, v)),
            }
        }

        Ok(Value::Dict {
            key,
            value,
            entries: dict_entries,
        })
    }

    /// Infer the element type of a literal. Integer literals mixed with
    /// Doubles become Doubles; any other mix is a type mismatch.
    fn unify_literal_values(
        values: Vec<Value>,
        nodes: &[&AstNode],
        location: SourceLocation,
    ) -> Result<(Type, Vec<Value>), RuntimeError> {
        let types: Vec<Type> = values.iter().map(Value::type_of).collect();
        let first = types[0].clone();

        if first == Type::Void {
            return Err(RuntimeError::type_mismatch(
                "collection elements cannot have type 'Void'",
                location,
            ));
        }
        if types.iter().all(|ty| *ty == first) {
            return Ok((first, values));
        }

        let widens = types.iter().any(|ty| *ty == Type::Double)
            && types
                .iter()
                .zip(nodes)
                .all(|(ty, node)| *ty == Type::Double || node.is_integer_literal());
        if widens {
            let values = values
                .into_iter()
                .map(|value| match value {
                    Value::Int(n) => Value::Double(n as f64),
                    other => other,
                })
                .collect();
            return Ok((Type::Double, values));
        }

        let mismatch = types.iter().find(|ty| **ty != first).unwrap_or(&first);
        Err(RuntimeError::type_mismatch(
            format!(
                "heterogeneous collection literal mixes '{}' and '{}'",
                first, mismatch
            ),
            location,
        ))
    }

    /// Evaluate a subscript index, expecting the key type for dictionaries
    pub(crate) fn evaluate_index(
        &mut self,
        container: &Type,
        index: &AstNode,
    ) -> Result<Value, RuntimeError> {
        match container {
            Type::Dictionary(key, _) => self.evaluate_with_expected(index, Some(key)),
            _ => self.evaluate_expr(index),
        }
    }

    /// `lookup ?? fallback`: recovers from a failed lookup, but only when the
    /// outermost subscript or member raised it
    pub(crate) fn evaluate_nil_coalesce(
        &mut self,
        left: &AstNode,
        right: &AstNode,
        expected: Option<&Type>,
    ) -> Result<Value, RuntimeError> {
        let mut lookup = left;
        while let AstNode::ForceUnwrap { expr, .. } = lookup {
            lookup = expr;
        }

        let (attempt, element_type) = match lookup {
            AstNode::Subscript {
                object,
                index,
                location,
            } => {
                let obj = self.evaluate_expr(object)?;
                let element_type = Self::element_type(&obj);
                let idx = self.evaluate_index(&obj.type_of(), index)?;
                (Self::subscript_value(obj, &idx, *location), element_type)
            }
            AstNode::Member {
                object,
                member,
                location,
            } => {
                let obj = self.evaluate_expr(object)?;
                let element_type = Self::element_type(&obj);
                (self.member_value(obj, member, *location), element_type)
            }
            other => return self.evaluate_with_expected(other, expected),
        };

        match attempt {
            Err(err) if err.is_failed_lookup() => {
                log::trace!("'??' recovered from: {}", err);
                let hint = element_type.as_ref().or(expected);
                let fallback = self.evaluate_with_expected(right, hint)?;
                match element_type {
                    Some(ty) => Self::check_type(fallback, &ty, "element type", right.location()),
                    None => Ok(fallback),
                }
            }
            other => other,
        }
    }

    /// Type of the values a lookup into `container` yields
    fn element_type(container: &Value) -> Option<Type> {
        match container {
            Value::Array { elem, .. } => Some(elem.clone()),
            Value::Dict { value, .. } => Some(value.clone()),
            _ => None,
        }
    }

    /// Free-function call: implicit `self` method, user function, struct
    /// initialiser, then built-in
    pub(crate) fn evaluate_call(
        &mut self,
        callee: &str,
        args: &[Arg],
        location: SourceLocation,
    ) -> Result<Value, RuntimeError> {
        if let Some(receiver) = self.stack.get_local("self").map(|b| b.value.clone()) {
            let method = match &receiver {
                Value::Struct { name, .. } => self
                    .struct_defs
                    .get(name)
                    .and_then(|def| def.method(callee))
                    .cloned(),
                _ => None,
            };
            if let Some(method) = method {
                return self.call_user_function(&method, args, Some(receiver), location);
            }
        }

        if let Some(def) = self.function_defs.get(callee).cloned() {
            return self.call_user_function(&def, args, None, location);
        }

        if let Some(def) = self.struct_defs.get(callee).cloned() {
            return self.construct_struct(&def, args, location);
        }

        if let Some(value) = self.call_builtin(callee, args, location)? {
            return Ok(value);
        }

        if let Some(binding) = self.stack.get(callee) {
            return Err(RuntimeError::type_mismatch(
                format!(
                    "cannot call value of non-function type '{}'",
                    binding.declared_type
                ),
                location,
            ));
        }

        Err(self.unresolved_name(callee, location))
    }

    /// Call a user-defined function or method. `receiver` becomes `self`.
    pub(crate) fn call_user_function(
        &mut self,
        def: &Rc<FunctionDef>,
        args: &[Arg],
        receiver: Option<Value>,
        location: SourceLocation,
    ) -> Result<Value, RuntimeError> {
        let display_name = match &receiver {
            Some(Value::Struct { name, .. }) => format!("{}.{}", name, def.name),
            _ => def.name.clone(),
        };

        if args.len() != def.params.len() {
            return Err(RuntimeError::ArgumentMismatch {
                function: display_name,
                message: Self::arity_message(def.params.len(), args.len()),
                location,
            });
        }

        let mut values = Vec::with_capacity(args.len());
        for (param, arg) in def.params.iter().zip(args) {
            if let Some(label) = &arg.label {
                if param.label.as_ref() != Some(label) {
                    let message = match &param.label {
                        Some(expected) => format!(
                            "incorrect argument label: expected '{}:', got '{}:'",
                            expected, label
                        ),
                        None => format!("extraneous argument label '{}:'", label),
                    };
                    return Err(RuntimeError::ArgumentMismatch {
                        function: display_name,
                        message,
                        location: arg.value.location(),
                    });
                }
            }
            let value = self.evaluate_with_expected(&arg.value, Some(&param.param_type))?;
            values.push(Self::check_type(
                value,
                &param.param_type,
                "parameter type",
                arg.value.location(),
            )?);
        }

        if self.stack.call_depth() >= self.limits.max_call_depth {
            return Err(RuntimeError::RecursionLimit {
                limit: self.limits.max_call_depth,
                location,
            });
        }

        log::trace!("call {} at line {}", display_name, location.line);
        self.stack.push_frame(display_name);
        self.return_types.push(def.return_type.clone());

        if let Some(receiver) = receiver {
            let ty = receiver.type_of();
            self.declare_binding("self", receiver, ty, false, def.location)?;
        }
        for (param, value) in def.params.iter().zip(values) {
            self.declare_binding(&param.name, value, param.param_type.clone(), false, def.location)?;
        }

        self.execute_statements(&def.body)?;

        self.return_types.pop();
        self.stack.pop_frame();
        let returned = self.return_value.take();
        if self.control_flow == ControlFlow::Return {
            self.control_flow = ControlFlow::Normal;
        }
        self.current_location = location;

        match returned {
            Some(value) => Ok(value),
            None if def.return_type == Type::Void => Ok(Value::Void),
            None => Err(RuntimeError::type_mismatch(
                format!(
                    "missing return in function '{}' expected to return '{}'",
                    def.name, def.return_type
                ),
                def.location,
            )),
        }
    }

    /// Memberwise initialiser: one labelled argument per property, in order
    fn construct_struct(
        &mut self,
        def: &Rc<StructDef>,
        args: &[Arg],
        location: SourceLocation,
    ) -> Result<Value, RuntimeError> {
        if args.len() != def.fields.len() {
            return Err(RuntimeError::ArgumentMismatch {
                function: def.name.clone(),
                message: Self::arity_message(def.fields.len(), args.len()),
                location,
            });
        }

        let mut fields = Vec::with_capacity(def.fields.len());
        for (field, arg) in def.fields.iter().zip(args) {
            if arg.label.as_deref() != Some(field.name.as_str()) {
                let message = match &arg.label {
                    Some(label) => format!(
                        "incorrect argument label: expected '{}:', got '{}:'",
                        field.name, label
                    ),
                    None => format!("missing argument label '{}:'", field.name),
                };
                return Err(RuntimeError::ArgumentMismatch {
                    function: def.name.clone(),
                    message,
                    location: arg.value.location(),
                });
            }
            let value = self.evaluate_with_expected(&arg.value, Some(&field.field_type))?;
            let value =
                Self::check_type(value, &field.field_type, "property type", arg.value.location())?;
            fields.push((field.name.clone(), value));
        }

        Ok(Value::Struct {
            name: def.name.clone(),
            fields,
        })
    }

    pub(crate) fn evaluate_method_call(
        &mut self,
        object: &AstNode,
        method: &str,
        args: &[Arg],
        location: SourceLocation,
    ) -> Result<Value, RuntimeError> {
        if Self::is_mutating_method(method) && object.is_place() {
            return self.call_mutating_method(object, method, args, location);
        }

        let receiver = self.evaluate_expr(object)?;
        if Self::is_mutating_method(method)
            && matches!(receiver, Value::Array { .. } | Value::Dict { .. })
        {
            return Err(RuntimeError::ImmutableAssignment {
                target: describe_expression(object),
                reason: format!("cannot use mutating member '{}' on a temporary value", method),
                location,
            });
        }
        self.call_method_on(receiver, method, args, location)
    }

    /// Call `method` on an already evaluated receiver
    pub(crate) fn call_method_on(
        &mut self,
        receiver: Value,
        method: &str,
        args: &[Arg],
        location: SourceLocation,
    ) -> Result<Value, RuntimeError> {
        if let Value::Struct { name, .. } = &receiver {
            let def = self.struct_defs.get(name).cloned();
            let Some(def) = def else {
                return Err(self.unresolved_name(name, location));
            };
            if let Some(method_def) = def.method(method).cloned() {
                return self.call_user_function(&method_def, args, Some(receiver), location);
            }
            if let Some(field) = def.field(method) {
                return Err(RuntimeError::type_mismatch(
                    format!(
                        "cannot call value of non-function type '{}'",
                        field.field_type
                    ),
                    location,
                ));
            }
            return Err(RuntimeError::UnknownMember {
                type_name: def.name.clone(),
                member: method.to_string(),
                location,
            });
        }

        let container = receiver.type_of();
        let values = self.evaluate_arguments(&container, args)?;
        Self::call_value_method(receiver, method, values, location)
    }

    /// Evaluate labelled arguments of a built-in method on `container`
    pub(crate) fn evaluate_arguments(
        &mut self,
        container: &Type,
        args: &[Arg],
    ) -> Result<Vec<(Option<String>, Value)>, RuntimeError> {
        let mut values = Vec::with_capacity(args.len());
        for arg in args {
            let hint = argument_hint(container, arg.label.as_deref());
            let value = self.evaluate_with_expected(&arg.value, hint.as_ref())?;
            values.push((arg.label.clone(), value));
        }
        Ok(values)
    }

    pub(crate) fn arity_message(expected: usize, got: usize) -> String {
        format!(
            "expected {} argument{}, got {}",
            expected,
            if expected == 1 { "" } else { "s" },
            got
        )
    }
}

/// Expected type of a method argument, from the receiver's type
fn argument_hint(container: &Type, label: Option<&str>) -> Option<Type> {
    match (container, label) {
        (Type::Array(elem), None) => Some((**elem).clone()),
        (Type::Array(_), Some("contentsOf")) => Some(container.clone()),
        (Type::Dictionary(key, _), Some("forKey")) => Some((**key).clone()),
        _ => None,
    }
}

/// Short source-like rendering of an expression for error messages
pub(crate) fn describe_expression(node: &AstNode) -> String {
    match node {
        AstNode::Variable(name, _) => name.clone(),
        AstNode::Member { object, member, .. } => {
            format!("{}.{}", describe_expression(object), member)
        }
        AstNode::Subscript { object, .. } => format!("{}[...]", describe_expression(object)),
        AstNode::ForceUnwrap { expr, .. } => describe_expression(expr),
        AstNode::Call { callee, .. } => format!("{}(...)", callee),
        AstNode::MethodCall { object, method, .. } => {
            format!("{}.{}(...)", describe_expression(object), method)
        }
        AstNode::ArrayLiteral(..) | AstNode::DictLiteral(..) => "literal".to_string(),
        _ => "expression".to_string(),
    }
}

#[cfg(test)]
mod tests {
    use crate::interpreter::engine::{ExecutionLimits, Interpreter};
    use crate::interpreter::errors::{ErrorKind, RuntimeError};
    use crate::parser::parse::Parser;

    fn run_with(source: &str, limits: ExecutionLimits) -> (Vec<String>, Result<(), RuntimeError>) {
        let program = Parser::new(source)
            .and_then(|mut p| p.parse_program())
            .expect("Parsing failed");
        let mut interp = Interpreter::new(program, limits);
        let result = interp.run();
        (interp.terminal().get_output(), result)
    }

    fn run(source: &str) -> (Vec<String>, Result<(), RuntimeError>) {
        run_with(source, ExecutionLimits::default())
    }

    #[test]
    fn test_string_interpolation() {
        let source = "let apples = 3\nlet oranges = 5\nprint(\"I have \\(apples + oranges) pieces of fruit.\")";
        let (output, result) = run(source);
        assert!(result.is_ok());
        assert_eq!(output, vec!["I have 8 pieces of fruit."]);
    }

    #[test]
    fn test_mixed_numeric_literal_widens() {
        let (output, result) = run("let xs = [1, 2.5, 3]\nprint(xs)");
        assert!(result.is_ok());
        assert_eq!(output, vec!["[1.0, 2.5, 3.0]"]);
    }

    #[test]
    fn test_heterogeneous_literal() {
        let (_, result) = run("let xs = [1, \"two\"]");
        assert_eq!(result.unwrap_err().kind(), ErrorKind::TypeMismatch);
    }

    #[test]
    fn test_empty_literal_needs_annotation() {
        let (_, result) = run("let xs = []");
        assert_eq!(result.unwrap_err().kind(), ErrorKind::TypeMismatch);

        let (output, result) = run("let names: [String] = []\nlet ages: [String: Int] = [:]\nprint(names, ages)");
        assert!(result.is_ok());
        assert_eq!(output, vec!["[] [:]"]);
    }

    #[test]
    fn test_missing_key_and_fallback() {
        let source = "let ages = [\"Tim\": 22]\nprint(ages[\"Ana\"] ?? 0)\nprint(ages[\"Ana\"]!)";
        let (output, result) = run(source);
        let err = result.unwrap_err();
        assert_eq!(err.kind(), ErrorKind::MissingKey);
        assert_eq!(err.location().line, 3);
        assert_eq!(output, vec!["0"]);
    }

    #[test]
    fn test_fallback_only_covers_outermost_lookup() {
        let source = "let xs = [1, 2]\nlet d = [1: \"one\"]\nprint(d[xs[5]] ?? \"none\")";
        let (_, result) = run(source);
        assert_eq!(result.unwrap_err().kind(), ErrorKind::IndexOutOfBounds);
    }

    #[test]
    fn test_first_of_empty_array_with_fallback() {
        let (output, result) = run("let xs: [Int] = []\nprint(xs.first ?? -1)\nprint(xs.first)");
        assert_eq!(result.unwrap_err().kind(), ErrorKind::IndexOutOfBounds);
        assert_eq!(output, vec!["-1"]);
    }

    #[test]
    fn test_argument_labels() {
        let source = "func greet(person: String, from hometown: String) -> String {\n  return \"Hello \\(person) from \\(hometown)!\"\n}\nprint(greet(person: \"Bill\", from: \"Cupertino\"))\nprint(greet(person: \"Bill\", to: \"Cupertino\"))";
        let (output, result) = run(source);
        assert_eq!(output, vec!["Hello Bill from Cupertino!"]);
        let err = result.unwrap_err();
        assert_eq!(err.kind(), ErrorKind::ArgumentMismatch);
        assert_eq!(err.location().line, 5);
    }

    #[test]
    fn test_wrong_argument_type() {
        let source = "func double(_ n: Int) -> Int {\n  return n * 2\n}\nprint(double(\"four\"))";
        let (_, result) = run(source);
        assert_eq!(result.unwrap_err().kind(), ErrorKind::TypeMismatch);
    }

    #[test]
    fn test_parameters_are_immutable() {
        let source = "func bump(_ n: Int) {\n  n += 1\n}\nbump(1)";
        let (_, result) = run(source);
        assert_eq!(result.unwrap_err().kind(), ErrorKind::ImmutableAssignment);
    }

    #[test]
    fn test_function_sees_globals_not_caller_locals() {
        let source = "let base = 10\nfunc addBase(_ n: Int) -> Int {\n  return n + base\n}\nprint(addBase(5))";
        let (output, result) = run(source);
        assert!(result.is_ok());
        assert_eq!(output, vec!["15"]);
    }

    #[test]
    fn test_recursion() {
        let source = "func fib(_ n: Int) -> Int {\n  return n < 2 ? n : fib(n - 1) + fib(n - 2)\n}\nprint(fib(10))";
        let (output, result) = run(source);
        assert!(result.is_ok());
        assert_eq!(output, vec!["55"]);
    }

    #[test]
    fn test_recursion_limit() {
        let source = "func down(_ n: Int) -> Int {\n  return down(n + 1)\n}\nprint(down(0))";
        let limits = ExecutionLimits {
            max_call_depth: 16,
            ..ExecutionLimits::default()
        };
        let (_, result) = run_with(source, limits);
        assert_eq!(result.unwrap_err().kind(), ErrorKind::RecursionLimit);
    }

    #[test]
    fn test_struct_init_and_methods() {
        let source = "struct Point {\n  var x: Double\n  var y: Double\n  func sum() -> Double {\n    return x + y\n  }\n  func scaled(by factor: Double) -> Point {\n    return Point(x: x * factor, y: self.y * factor)\n  }\n}\nlet p = Point(x: 1, y: 2)\nprint(p)\nprint(p.scaled(by: 2).sum())";
        let (output, result) = run(source);
        assert!(result.is_ok(), "{:?}", result);
        assert_eq!(output, vec!["Point(x: 1.0, y: 2.0)", "6.0"]);
    }

    #[test]
    fn test_struct_init_labels_in_order() {
        let source = "struct Pair {\n  let a: Int\n  let b: Int\n}\nlet p = Pair(b: 1, a: 2)";
        let (_, result) = run(source);
        assert_eq!(result.unwrap_err().kind(), ErrorKind::ArgumentMismatch);
    }

    #[test]
    fn test_undefined_name() {
        let (_, result) = run("print(nothing)");
        let err = result.unwrap_err();
        assert_eq!(err.kind(), ErrorKind::UndefinedName);
        assert_eq!(err.to_string(), "cannot find 'nothing' in scope");
    }
}
