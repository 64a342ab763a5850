//! Declaration parsing implementation
//!
//! Handles `let`/`var` bindings, `func` definitions, `struct` definitions and
//! the type annotations they carry:
//!
//! ```text
//! let name[: Type] = expr
//! func name(param: Type, ...) [-> Type] { body }
//! struct Name { let|var field: Type ... func method(...) { } }
//! Type := Ident | [Type] | [Type: Type]
//! ```

use crate::parser::ast::*;
use crate::parser::lexer::Token;
use crate::parser::parse::{ParseError, Parser};
use std::rc::Rc;

impl Parser {
    /// Parse `let|var name[: Type] = expr`
    pub(crate) fn parse_var_declaration(&mut self) -> Result<AstNode, ParseError> {
        let location = self.current_location();
        let is_mutable = if self.match_token(&Token::Var(location)) {
            true
        } else {
            self.expect_token(&Token::Let(location), "Expected 'let' or 'var'")?;
            false
        };

        let name = self.expect_identifier()?;

        let var_type = if self.match_token(&Token::Colon(self.current_location())) {
            Some(self.parse_type()?)
        } else {
            None
        };

        if !self.match_token(&Token::Eq(self.current_location())) {
            let keyword = if is_mutable { "var" } else { "let" };
            return Err(self.error_here(&format!(
                "Expected '=' after '{} {}': declarations need an initial value",
                keyword, name
            )));
        }

        let init = Box::new(self.parse_expression()?);

        Ok(AstNode::VarDecl {
            name,
            is_mutable,
            var_type,
            init,
            location,
        })
    }

    /// Parse a type annotation: `Int`, `[String]`, `[String: Int]`, `Person`
    pub(crate) fn parse_type(&mut self) -> Result<Type, ParseError> {
        if self.match_token(&Token::LBracket(self.current_location())) {
            let first = self.parse_type()?;
            let ty = if self.match_token(&Token::Colon(self.current_location())) {
                let value = self.parse_type()?;
                if !first.is_hashable() {
                    return Err(ParseError {
                        message: format!("Type '{}' cannot be used as a dictionary key", first),
                        location: self.previous_location(),
                    });
                }
                Type::dictionary_of(first, value)
            } else {
                Type::array_of(first)
            };
            self.expect_token(
                &Token::RBracket(self.current_location()),
                "Expected ']' to close collection type",
            )?;
            return Ok(ty);
        }

        match self.peek() {
            Token::Ident(name, _) => {
                let ty = Type::from_name(name);
                self.advance();
                Ok(ty)
            }
            _ => Err(self.error_here("Expected type")),
        }
    }

    /// Parse `func name(params) [-> Type] { body }`
    pub(crate) fn parse_function_declaration(&mut self) -> Result<FunctionDef, ParseError> {
        let location = self.current_location();
        self.expect_token(&Token::Func(location), "Expected 'func'")?;
        let name = self.expect_identifier()?;

        self.expect_lparen("after function name")?;
        let params = self.parse_parameter_list()?;
        self.expect_rparen("after parameters")?;

        let return_type = if self.match_token(&Token::Arrow(self.current_location())) {
            self.parse_type()?
        } else {
            Type::Void
        };

        // A function body starts a fresh loop context
        let saved_loop_depth = std::mem::replace(&mut self.loop_depth, 0);
        self.function_depth += 1;
        let body = self.parse_block("before function body");
        self.function_depth -= 1;
        self.loop_depth = saved_loop_depth;

        Ok(FunctionDef {
            name,
            params,
            return_type,
            body: body?,
            location,
        })
    }

    /// Parse parameter list: `name: Type, _ name: Type, to name: Type, ...`
    fn parse_parameter_list(&mut self) -> Result<Vec<Param>, ParseError> {
        let mut params: Vec<Param> = Vec::new();

        if self.check(&Token::RParen(self.current_location())) {
            return Ok(params);
        }

        loop {
            // `label name: Type`, `_ name: Type` or `name: Type`
            let first = self.expect_identifier()?;
            let (label, name) = if matches!(self.peek(), Token::Ident(..)) {
                let name = self.expect_identifier()?;
                let label = if first == "_" { None } else { Some(first) };
                (label, name)
            } else if first == "_" {
                return Err(self.error_here("Expected parameter name after '_'"));
            } else {
                (Some(first.clone()), first)
            };
            self.expect_colon("after parameter name")?;
            let param_type = self.parse_type()?;

            if params.iter().any(|p| p.name == name) {
                return Err(ParseError {
                    message: format!("Duplicate parameter name '{}'", name),
                    location: self.previous_location(),
                });
            }
            params.push(Param {
                label,
                name,
                param_type,
            });

            if !self.match_token(&Token::Comma(self.current_location())) {
                break;
            }
        }

        Ok(params)
    }

    /// Parse `struct Name { properties and methods }`
    pub(crate) fn parse_struct_declaration(&mut self) -> Result<StructDef, ParseError> {
        let location = self.current_location();
        self.expect_token(&Token::Struct(location), "Expected 'struct'")?;
        let name = self.expect_identifier()?;
        self.expect_lbrace("after struct name")?;

        let mut fields: Vec<Field> = Vec::new();
        let mut methods: Vec<Rc<FunctionDef>> = Vec::new();

        loop {
            while self.match_token(&Token::Semicolon(self.current_location())) {}
            if self.check(&Token::RBrace(self.current_location())) || self.is_at_end() {
                break;
            }

            if self.check(&Token::Func(self.current_location())) {
                let method = self.parse_function_declaration()?;
                if methods.iter().any(|m| m.name == method.name) {
                    return Err(ParseError {
                        message: format!("Invalid redeclaration of method '{}'", method.name),
                        location: method.location,
                    });
                }
                methods.push(Rc::new(method));
                continue;
            }

            let is_mutable = if self.match_token(&Token::Var(self.current_location())) {
                true
            } else if self.match_token(&Token::Let(self.current_location())) {
                false
            } else {
                return Err(self.error_here("Expected 'let', 'var' or 'func' in struct body"));
            };

            let field_name = self.expect_identifier()?;
            self.expect_colon("after property name")?;
            let field_type = self.parse_type()?;

            if fields.iter().any(|f| f.name == field_name) {
                return Err(ParseError {
                    message: format!("Invalid redeclaration of property '{}'", field_name),
                    location: self.previous_location(),
                });
            }
            fields.push(Field {
                name: field_name,
                field_type,
                is_mutable,
            });
            self.end_statement()?;
        }

        self.expect_rbrace("after struct body")?;

        Ok(StructDef {
            name,
            fields,
            methods,
            location,
        })
    }
}

#[cfg(test)]
mod tests {
    use crate::parser::ast::*;
    use crate::parser::parse::Parser;

    fn parse_one(source: &str) -> AstNode {
        let mut parser = Parser::new(source).unwrap();
        let mut program = parser.parse_program().unwrap();
        assert_eq!(program.nodes.len(), 1);
        program.nodes.remove(0)
    }

    #[test]
    fn test_function_signature() {
        match parse_one("func f(x: Int, y: Int) -> Int {\n    return x*x + 2*x*y + y*y\n}") {
            AstNode::FunctionDecl(def) => {
                assert_eq!(def.name, "f");
                assert_eq!(def.params.len(), 2);
                assert_eq!(def.params[1].name, "y");
                assert_eq!(def.return_type, Type::Int);
                assert_eq!(def.body.len(), 1);
            }
            other => panic!("Expected function, got {:?}", other),
        }
    }

    #[test]
    fn test_function_without_return_type() {
        match parse_one("func hello(_ name: String) {\n    print(name)\n}") {
            AstNode::FunctionDecl(def) => {
                assert_eq!(def.params[0].name, "name");
                assert_eq!(def.return_type, Type::Void);
            }
            other => panic!("Expected function, got {:?}", other),
        }
    }

    #[test]
    fn test_argument_labels() {
        match parse_one("func greet(to name: String, _ times: Int, loud: Bool) {\n}") {
            AstNode::FunctionDecl(def) => {
                assert_eq!(def.params[0].label.as_deref(), Some("to"));
                assert_eq!(def.params[0].name, "name");
                assert_eq!(def.params[1].label, None);
                assert_eq!(def.params[2].label.as_deref(), Some("loud"));
            }
            other => panic!("Expected function, got {:?}", other),
        }
    }

    #[test]
    fn test_nested_collection_types() {
        match parse_one("let grid: [[Int]] = [[1], [2, 3]]") {
            AstNode::VarDecl { var_type, .. } => {
                assert_eq!(var_type, Some(Type::array_of(Type::array_of(Type::Int))));
            }
            other => panic!("Expected declaration, got {:?}", other),
        }
    }

    #[test]
    fn test_missing_initializer() {
        let mut parser = Parser::new("let quote: String").unwrap();
        let err = parser.parse_program().unwrap_err();
        assert!(err.message.contains("need an initial value"));
    }

    #[test]
    fn test_unhashable_dictionary_key() {
        let mut parser = Parser::new("let d: [[Int]: Int] = [:]").unwrap();
        assert!(parser.parse_program().is_err());
    }
}
