//! Main parser coordinator
//!
//! This module provides the [`Parser`] struct and core parsing infrastructure,
//! including error types, helper methods, and the main parse entry point.
//!
//! # Parser Architecture
//!
//! The Parser uses a recursive descent approach with the following organization:
//! - This module: Parser struct, helper methods, and coordination
//! - `declarations`: `let`/`var`, `func` and `struct` declarations, type annotations
//! - `statements`: statements (if, while, repeat, for-in, assignments, ...)
//! - `expressions`: expressions with one method per precedence level
//!
//! # Statement Separation
//!
//! Newlines end statements. Two statements on the same line must be separated
//! by `;`. A postfix `(` or `[` only continues an expression when it sits on
//! the same line as the token before it, so a line starting with an array
//! literal is never read as a subscript of the previous line.

use crate::parser::ast::*;
use crate::parser::lexer::{LexError, Lexer, Token};
use std::fmt;

/// Parser error type
#[derive(Debug)]
pub struct ParseError {
    pub message: String,
    pub location: SourceLocation,
}

impl fmt::Display for ParseError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "Parse error at line {}, column {}: {}",
            self.location.line, self.location.column, self.message
        )
    }
}

impl std::error::Error for ParseError {}

impl From<LexError> for ParseError {
    fn from(err: LexError) -> Self {
        ParseError {
            message: err.message,
            location: err.location,
        }
    }
}

/// Deepest nesting of blocks and subexpressions a unit may use
pub const MAX_NESTING: usize = 256;

/// Recursive descent parser for the lesson language
pub struct Parser {
    pub(crate) tokens: Vec<Token>,
    pub(crate) position: usize,
    /// Number of enclosing loops, for validating `break`/`continue`
    pub(crate) loop_depth: usize,
    /// Number of enclosing functions, for validating `return`
    pub(crate) function_depth: usize,
    /// Current block and subexpression depth, bounded by [`MAX_NESTING`]
    pub(crate) nesting: usize,
}

impl Parser {
    pub fn new(source: &str) -> Result<Self, ParseError> {
        Self::from_lexer(Lexer::new(source))
    }

    /// Parser for a fragment that starts at `origin` in the enclosing source
    pub(crate) fn with_origin(source: &str, origin: SourceLocation) -> Result<Self, ParseError> {
        Self::from_lexer(Lexer::with_origin(source, origin))
    }

    fn from_lexer(mut lexer: Lexer) -> Result<Self, ParseError> {
        let tokens = lexer.tokenize()?;
        Ok(Self {
            tokens,
            position: 0,
            loop_depth: 0,
            function_depth: 0,
            nesting: 0,
        })
    }

    /// Parse the entire unit (top-level statements)
    pub fn parse_program(&mut self) -> Result<Program, ParseError> {
        let mut program = Program::new();

        loop {
            while self.match_token(&Token::Semicolon(self.current_location())) {}
            if self.is_at_end() {
                break;
            }
            if self.check(&Token::RBrace(self.current_location())) {
                return Err(ParseError {
                    message: "Unexpected '}' with no matching '{'".to_string(),
                    location: self.current_location(),
                });
            }
            program.nodes.push(self.parse_statement()?);
        }

        Ok(program)
    }

    // ===== Helper methods =====

    pub(crate) fn match_token(&mut self, token: &Token) -> bool {
        if self.check(token) {
            self.advance();
            true
        } else {
            false
        }
    }

    pub(crate) fn check(&self, token: &Token) -> bool {
        std::mem::discriminant(self.peek()) == std::mem::discriminant(token)
    }

    pub(crate) fn advance(&mut self) -> &Token {
        if !self.is_at_end() {
            self.position += 1;
        }
        self.previous()
    }

    pub(crate) fn is_at_end(&self) -> bool {
        matches!(self.peek(), Token::Eof(_))
    }

    pub(crate) fn peek(&self) -> &Token {
        &self.tokens[self.position]
    }

    pub(crate) fn peek_ahead(&self, n: usize) -> Option<&Token> {
        self.tokens.get(self.position + n)
    }

    pub(crate) fn previous(&self) -> &Token {
        &self.tokens[self.position.saturating_sub(1)]
    }

    pub(crate) fn previous_location(&self) -> SourceLocation {
        self.previous().location()
    }

    pub(crate) fn current_location(&self) -> SourceLocation {
        self.peek().location()
    }

    /// Whether the next token sits on the same line as the one just consumed
    pub(crate) fn next_on_same_line(&self) -> bool {
        self.position > 0 && self.current_location().line == self.previous_location().line
    }

    pub(crate) fn expect_token(&mut self, token: &Token, message: &str) -> Result<(), ParseError> {
        if self.check(token) {
            self.advance();
            Ok(())
        } else {
            Err(self.error_here(message))
        }
    }

    /// Build an error at the current token, naming what was found
    pub(crate) fn error_here(&self, message: &str) -> ParseError {
        ParseError {
            message: format!("{}, found {}", message, self.peek()),
            location: self.current_location(),
        }
    }

    /// Go one level deeper, failing once [`MAX_NESTING`] is passed
    pub(crate) fn enter_nesting(&mut self) -> Result<(), ParseError> {
        if self.nesting >= MAX_NESTING {
            return Err(self.error_here(&format!(
                "Code is nested more than {} levels deep",
                MAX_NESTING
            )));
        }
        self.nesting += 1;
        Ok(())
    }

    pub(crate) fn leave_nesting(&mut self, levels: usize) {
        self.nesting -= levels;
    }

    pub(crate) fn expect_lparen(&mut self, ctx: &str) -> Result<(), ParseError> {
        self.expect_token(
            &Token::LParen(self.current_location()),
            &format!("Expected '(' {ctx}"),
        )
    }

    pub(crate) fn expect_rparen(&mut self, ctx: &str) -> Result<(), ParseError> {
        self.expect_token(
            &Token::RParen(self.current_location()),
            &format!("Expected ')' {ctx}"),
        )
    }

    pub(crate) fn expect_lbrace(&mut self, ctx: &str) -> Result<(), ParseError> {
        self.expect_token(
            &Token::LBrace(self.current_location()),
            &format!("Expected '{{' {ctx}"),
        )
    }

    pub(crate) fn expect_rbrace(&mut self, ctx: &str) -> Result<(), ParseError> {
        self.expect_token(
            &Token::RBrace(self.current_location()),
            &format!("Expected '}}' {ctx}"),
        )
    }

    pub(crate) fn expect_colon(&mut self, ctx: &str) -> Result<(), ParseError> {
        self.expect_token(
            &Token::Colon(self.current_location()),
            &format!("Expected ':' {ctx}"),
        )
    }

    pub(crate) fn expect_identifier(&mut self) -> Result<String, ParseError> {
        if let Token::Ident(name, _) = self.peek() {
            let name = name.clone();
            self.advance();
            Ok(name)
        } else {
            Err(self.error_here("Expected identifier"))
        }
    }

    /// Finish a simple statement: `;`, a closing brace, end of file, or a newline
    pub(crate) fn end_statement(&mut self) -> Result<(), ParseError> {
        if self.match_token(&Token::Semicolon(self.current_location())) {
            return Ok(());
        }
        if self.is_at_end()
            || self.check(&Token::RBrace(self.current_location()))
            || !self.next_on_same_line()
        {
            return Ok(());
        }
        Err(self.error_here("Consecutive statements on a line must be separated by ';'"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_declarations() {
        let source = "var answer: Int = 0\nanswer = 42\nlet name = \"Peter\"";
        let mut parser = Parser::new(source).unwrap();
        let program = parser.parse_program().unwrap();

        assert_eq!(program.nodes.len(), 3);
        match &program.nodes[0] {
            AstNode::VarDecl {
                name,
                is_mutable,
                var_type,
                ..
            } => {
                assert_eq!(name, "answer");
                assert!(*is_mutable);
                assert_eq!(var_type.as_ref(), Some(&Type::Int));
            }
            other => panic!("Expected variable declaration, got {:?}", other),
        }
        assert!(matches!(program.nodes[1], AstNode::Assignment { .. }));
        assert!(matches!(
            program.nodes[2],
            AstNode::VarDecl {
                is_mutable: false,
                ..
            }
        ));
    }

    #[test]
    fn test_parse_precedence() {
        let mut parser = Parser::new("1 + 2 * 3").unwrap();
        let program = parser.parse_program().unwrap();

        match &program.nodes[0] {
            AstNode::ExpressionStatement { expr, .. } => match &**expr {
                AstNode::BinaryOp { op, right, .. } => {
                    assert_eq!(*op, BinOp::Add);
                    assert!(matches!(
                        &**right,
                        AstNode::BinaryOp { op: BinOp::Mul, .. }
                    ));
                }
                other => panic!("Expected binary op, got {:?}", other),
            },
            other => panic!("Expected expression statement, got {:?}", other),
        }
    }

    #[test]
    fn test_parse_struct() {
        let source = r#"
            struct Person {
                let firstName: String
                var age: Int

                func greeting() -> String {
                    return "Hi, \(firstName)"
                }
            }
        "#;
        let mut parser = Parser::new(source).unwrap();
        let program = parser.parse_program().unwrap();

        assert_eq!(program.nodes.len(), 1);
        match &program.nodes[0] {
            AstNode::StructDecl(def) => {
                assert_eq!(def.name, "Person");
                assert_eq!(def.fields.len(), 2);
                assert!(!def.fields[0].is_mutable);
                assert!(def.fields[1].is_mutable);
                assert_eq!(def.methods.len(), 1);
                assert_eq!(def.methods[0].return_type, Type::String);
            }
            other => panic!("Expected struct declaration, got {:?}", other),
        }
    }

    #[test]
    fn test_newline_separates_subscript() {
        let source = "let a = 1\n[1, 2, 3]";
        let mut parser = Parser::new(source).unwrap();
        let program = parser.parse_program().unwrap();

        assert_eq!(program.nodes.len(), 2);
        assert!(matches!(
            &program.nodes[1],
            AstNode::ExpressionStatement { expr, .. } if matches!(&**expr, AstNode::ArrayLiteral(..))
        ));
    }

    #[test]
    fn test_same_line_statements_need_semicolon() {
        let mut parser = Parser::new("let x = 1 let y = 2").unwrap();
        let err = parser.parse_program().unwrap_err();
        assert!(err.message.contains("separated by ';'"));

        let mut parser = Parser::new("let x = 1; let y = 2").unwrap();
        assert_eq!(parser.parse_program().unwrap().nodes.len(), 2);
    }

    #[test]
    fn test_long_operator_chain_is_bounded() {
        let sum = |terms: usize| format!("print({})", vec!["1"; terms].join(" + "));

        let mut parser = Parser::new(&sum(200)).unwrap();
        assert!(parser.parse_program().is_ok());

        let mut parser = Parser::new(&sum(5000)).unwrap();
        let err = parser.parse_program().unwrap_err();
        assert!(err.message.contains("nested more than 256 levels"), "{}", err);
        assert_eq!(err.location.line, 1);
    }

    #[test]
    fn test_break_outside_loop() {
        let mut parser = Parser::new("break").unwrap();
        let err = parser.parse_program().unwrap_err();
        assert!(err.message.contains("inside a loop"));
    }

    #[test]
    fn test_dictionary_and_empty_literals() {
        let source = "let d: [Int: String] = [1: \"One\", 2: \"Two\",]\nlet e: [String: String] = [:]\nlet a: [Double] = []";
        let mut parser = Parser::new(source).unwrap();
        let program = parser.parse_program().unwrap();

        match &program.nodes[0] {
            AstNode::VarDecl { var_type, init, .. } => {
                assert_eq!(
                    var_type.as_ref(),
                    Some(&Type::dictionary_of(Type::Int, Type::String))
                );
                assert!(matches!(&**init, AstNode::DictLiteral(entries, _) if entries.len() == 2));
            }
            other => panic!("Expected declaration, got {:?}", other),
        }
        assert!(matches!(
            &program.nodes[1],
            AstNode::VarDecl { init, .. } if matches!(&**init, AstNode::DictLiteral(e, _) if e.is_empty())
        ));
        assert!(matches!(
            &program.nodes[2],
            AstNode::VarDecl { init, .. } if matches!(&**init, AstNode::ArrayLiteral(e, _) if e.is_empty())
        ));
    }
}
