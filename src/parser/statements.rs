//! Statement parsing implementation
//!
//! This module handles parsing of every statement form of the lesson language:
//!
//! - Declarations: `let`, `var`, `func`, `struct`
//! - Control flow: `if`/`else if`/`else`, `while`, `repeat { } while`, `for-in`
//! - Jump statements: `return`, `break`, `continue`
//! - Expression statements: calls, assignments and compound assignments
//!
//! # Grammar
//!
//! ```text
//! statement ::= var_decl | func_decl | struct_decl | if_stmt | while_stmt
//!             | repeat_stmt | for_stmt | return_stmt | break_stmt
//!             | continue_stmt | expr_stmt
//! for_stmt  ::= "for" pattern "in" expr block
//! pattern   ::= ident | "_" | "(" ident "," ident ")"
//! ```
//!
//! All parsing methods are implemented as `pub(crate)` methods on the [`Parser`] struct.

use crate::parser::ast::*;
use crate::parser::lexer::Token;
use crate::parser::parse::{ParseError, Parser};
use std::rc::Rc;

impl Parser {
    /// Parse `{ statements }`
    pub(crate) fn parse_block(&mut self, ctx: &str) -> Result<Vec<AstNode>, ParseError> {
        self.expect_lbrace(ctx)?;
        self.enter_nesting()?;
        let mut statements = Vec::new();

        loop {
            while self.match_token(&Token::Semicolon(self.current_location())) {}
            if self.check(&Token::RBrace(self.current_location())) || self.is_at_end() {
                break;
            }
            statements.push(self.parse_statement()?);
        }

        self.expect_rbrace("to close block")?;
        self.leave_nesting(1);
        Ok(statements)
    }

    /// Parse a statement
    pub(crate) fn parse_statement(&mut self) -> Result<AstNode, ParseError> {
        let loc = self.current_location();

        if self.check(&Token::Let(loc)) || self.check(&Token::Var(loc)) {
            let decl = self.parse_var_declaration()?;
            self.end_statement()?;
            return Ok(decl);
        }

        if self.check(&Token::Func(loc)) {
            let def = self.parse_function_declaration()?;
            return Ok(AstNode::FunctionDecl(Rc::new(def)));
        }

        if self.check(&Token::Struct(loc)) {
            let def = self.parse_struct_declaration()?;
            return Ok(AstNode::StructDecl(Rc::new(def)));
        }

        if self.match_token(&Token::If(loc)) {
            return self.parse_if_statement(loc);
        }

        if self.match_token(&Token::While(loc)) {
            return self.parse_while_statement(loc);
        }

        if self.match_token(&Token::Repeat(loc)) {
            return self.parse_repeat_statement(loc);
        }

        if self.match_token(&Token::For(loc)) {
            return self.parse_for_statement(loc);
        }

        if self.match_token(&Token::Return(loc)) {
            return self.parse_return_statement(loc);
        }

        if self.match_token(&Token::Break(loc)) {
            if self.loop_depth == 0 {
                return Err(ParseError {
                    message: "'break' is only allowed inside a loop".to_string(),
                    location: loc,
                });
            }
            self.end_statement()?;
            return Ok(AstNode::Break { location: loc });
        }

        if self.match_token(&Token::Continue(loc)) {
            if self.loop_depth == 0 {
                return Err(ParseError {
                    message: "'continue' is only allowed inside a loop".to_string(),
                    location: loc,
                });
            }
            self.end_statement()?;
            return Ok(AstNode::Continue { location: loc });
        }

        if self.check(&Token::Else(loc)) {
            return Err(self.error_here("'else' without a matching 'if'"));
        }

        self.parse_expression_statement()
    }

    fn parse_if_statement(&mut self, location: SourceLocation) -> Result<AstNode, ParseError> {
        let condition = Box::new(self.parse_expression()?);
        let then_branch = self.parse_block("after 'if' condition")?;

        let else_branch = if self.match_token(&Token::Else(self.current_location())) {
            let else_loc = self.current_location();
            if self.match_token(&Token::If(else_loc)) {
                // `else if` chains nest as a single-statement else branch
                self.enter_nesting()?;
                let chained = self.parse_if_statement(else_loc)?;
                self.leave_nesting(1);
                Some(vec![chained])
            } else {
                Some(self.parse_block("after 'else'")?)
            }
        } else {
            None
        };

        Ok(AstNode::If {
            condition,
            then_branch,
            else_branch,
            location,
        })
    }

    fn parse_while_statement(&mut self, location: SourceLocation) -> Result<AstNode, ParseError> {
        let condition = Box::new(self.parse_expression()?);
        let body = self.parse_loop_body("after 'while' condition")?;

        Ok(AstNode::While {
            condition,
            body,
            location,
        })
    }

    fn parse_repeat_statement(&mut self, location: SourceLocation) -> Result<AstNode, ParseError> {
        let body = self.parse_loop_body("after 'repeat'")?;
        self.expect_token(
            &Token::While(self.current_location()),
            "Expected 'while' after 'repeat' body",
        )?;
        let condition = Box::new(self.parse_expression()?);
        self.end_statement()?;

        Ok(AstNode::RepeatWhile {
            body,
            condition,
            location,
        })
    }

    fn parse_for_statement(&mut self, location: SourceLocation) -> Result<AstNode, ParseError> {
        let pattern = if self.match_token(&Token::LParen(self.current_location())) {
            let first = self.parse_pattern_name()?;
            self.expect_token(
                &Token::Comma(self.current_location()),
                "Expected ',' in tuple pattern",
            )?;
            let second = self.parse_pattern_name()?;
            self.expect_rparen("to close tuple pattern")?;
            ForPattern::Pair(first, second)
        } else {
            ForPattern::Single(self.parse_pattern_name()?)
        };

        self.expect_token(
            &Token::In(self.current_location()),
            "Expected 'in' after loop variable",
        )?;
        let iterable = Box::new(self.parse_expression()?);
        let body = self.parse_loop_body("after 'for-in' sequence")?;

        Ok(AstNode::ForIn {
            pattern,
            iterable,
            body,
            location,
        })
    }

    /// Loop variable name; `_` binds nothing
    fn parse_pattern_name(&mut self) -> Result<Option<String>, ParseError> {
        let name = self.expect_identifier()?;
        Ok(if name == "_" { None } else { Some(name) })
    }

    fn parse_loop_body(&mut self, ctx: &str) -> Result<Vec<AstNode>, ParseError> {
        self.loop_depth += 1;
        let body = self.parse_block(ctx);
        self.loop_depth -= 1;
        body
    }

    fn parse_return_statement(&mut self, location: SourceLocation) -> Result<AstNode, ParseError> {
        if self.function_depth == 0 {
            return Err(ParseError {
                message: "'return' is only allowed inside a function".to_string(),
                location,
            });
        }

        let has_value = self.next_on_same_line()
            && !self.is_at_end()
            && !self.check(&Token::RBrace(self.current_location()))
            && !self.check(&Token::Semicolon(self.current_location()));

        let expr = if has_value {
            Some(Box::new(self.parse_expression()?))
        } else {
            None
        };
        self.end_statement()?;

        Ok(AstNode::Return { expr, location })
    }

    /// Expression statement, assignment or compound assignment
    fn parse_expression_statement(&mut self) -> Result<AstNode, ParseError> {
        let location = self.current_location();
        let expr = self.parse_expression()?;

        let compound = match self.peek() {
            Token::PlusEq(_) => Some(BinOp::Add),
            Token::MinusEq(_) => Some(BinOp::Sub),
            Token::StarEq(_) => Some(BinOp::Mul),
            Token::SlashEq(_) => Some(BinOp::Div),
            Token::PercentEq(_) => Some(BinOp::Mod),
            _ => None,
        };

        let node = if let Some(op) = compound {
            self.advance();
            self.check_assignment_target(&expr)?;
            let value = Box::new(self.parse_expression()?);
            AstNode::CompoundAssignment {
                target: Box::new(expr),
                op,
                value,
                location,
            }
        } else if self.match_token(&Token::Eq(self.current_location())) {
            self.check_assignment_target(&expr)?;
            let value = Box::new(self.parse_expression()?);
            AstNode::Assignment {
                target: Box::new(expr),
                value,
                location,
            }
        } else {
            AstNode::ExpressionStatement {
                expr: Box::new(expr),
                location,
            }
        };

        self.end_statement()?;
        Ok(node)
    }

    /// Only names, properties and subscripts can be assigned. Whether the
    /// place is actually mutable is decided at run time.
    fn check_assignment_target(&self, target: &AstNode) -> Result<(), ParseError> {
        match target {
            AstNode::Variable(..)
            | AstNode::Member { .. }
            | AstNode::Subscript { .. }
            | AstNode::ForceUnwrap { .. } => Ok(()),
            other => Err(ParseError {
                message: "Cannot assign to this expression".to_string(),
                location: other.location(),
            }),
        }
    }
}

#[cfg(test)]
mod tests {
    use crate::parser::ast::*;
    use crate::parser::parse::Parser;

    fn parse(source: &str) -> Program {
        Parser::new(source)
            .and_then(|mut p| p.parse_program())
            .expect("Parsing failed")
    }

    #[test]
    fn test_else_if_chain() {
        let program = parse("if x < 0 {\n  print(1)\n} else if x == 0 {\n  print(2)\n} else {\n  print(3)\n}");
        match &program.nodes[0] {
            AstNode::If {
                else_branch: Some(branch),
                ..
            } => {
                assert_eq!(branch.len(), 1);
                assert!(matches!(
                    &branch[0],
                    AstNode::If {
                        else_branch: Some(_),
                        ..
                    }
                ));
            }
            other => panic!("Expected if statement, got {:?}", other),
        }
    }

    #[test]
    fn test_for_in_patterns() {
        let program = parse("for i in 1...5 { }\nfor (k, v) in d { }\nfor _ in 0..<3 { }");
        let patterns: Vec<&ForPattern> = program
            .nodes
            .iter()
            .map(|n| match n {
                AstNode::ForIn { pattern, .. } => pattern,
                other => panic!("Expected for-in, got {:?}", other),
            })
            .collect();
        assert_eq!(*patterns[0], ForPattern::Single(Some("i".to_string())));
        assert_eq!(
            *patterns[1],
            ForPattern::Pair(Some("k".to_string()), Some("v".to_string()))
        );
        assert_eq!(*patterns[2], ForPattern::Single(None));
    }

    #[test]
    fn test_repeat_while() {
        let program = parse("var n = 0\nrepeat {\n  n += 1\n} while n < 3");
        assert!(matches!(&program.nodes[1], AstNode::RepeatWhile { body, .. } if body.len() == 1));
    }

    #[test]
    fn test_compound_assignment() {
        let program = parse("total += scores[\"a\"]");
        assert!(matches!(
            &program.nodes[0],
            AstNode::CompoundAssignment { op: BinOp::Add, .. }
        ));
    }

    #[test]
    fn test_return_placement() {
        let mut parser = Parser::new("return 1").unwrap();
        let err = parser.parse_program().unwrap_err();
        assert!(err.message.contains("inside a function"));

        let program = parse("func f() {\n  return\n}");
        match &program.nodes[0] {
            AstNode::FunctionDecl(def) => {
                assert!(matches!(&def.body[0], AstNode::Return { expr: None, .. }));
            }
            other => panic!("Expected function, got {:?}", other),
        }
    }

    #[test]
    fn test_break_inside_function_inside_loop() {
        let mut parser = Parser::new("while true {\n  func f() {\n    break\n  }\n}").unwrap();
        assert!(parser.parse_program().is_err());
    }

    #[test]
    fn test_invalid_assignment_target() {
        let mut parser = Parser::new("1 + 2 = 3").unwrap();
        let err = parser.parse_program().unwrap_err();
        assert!(err.message.contains("Cannot assign"));
    }
}
