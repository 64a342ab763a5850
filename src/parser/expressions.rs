//! Expression parsing implementation
//!
//! This module handles parsing of expressions with one method per precedence
//! level, from loosest to tightest:
//!
//! | Level          | Operators              | Associativity |
//! |----------------|------------------------|---------------|
//! | ternary        | `? :`                  | right         |
//! | logical or     | `\|\|`                 | left          |
//! | logical and    | `&&`                   | left          |
//! | comparison     | `== != < <= > >=`      | none          |
//! | nil-coalescing | `??`                   | right         |
//! | range          | `...` `..<`            | none          |
//! | additive       | `+ -`                  | left          |
//! | multiplicative | `* / %`                | left          |
//! | prefix         | `-` `!`                |               |
//! | postfix        | `()` `[]` `.` `!`      | left          |
//!
//! All parsing methods are implemented as `pub(crate)` methods on the [`Parser`] struct.

use crate::parser::ast::*;
use crate::parser::lexer::{StringSegment, Token};
use crate::parser::parse::{ParseError, Parser};

impl Parser {
    /// Parse expression (top-level entry point)
    pub(crate) fn parse_expression(&mut self) -> Result<AstNode, ParseError> {
        self.parse_ternary()
    }

    /// Parse ternary: condition ? then_expr : else_expr
    fn parse_ternary(&mut self) -> Result<AstNode, ParseError> {
        let expr = self.parse_logical_or()?;

        if self.match_token(&Token::Question(self.current_location())) {
            let location = self.previous_location();
            let then_expr = Box::new(self.parse_expression()?);
            self.expect_token(
                &Token::Colon(self.current_location()),
                "Expected ':' in ternary expression",
            )?;
            self.enter_nesting()?;
            let else_expr = Box::new(self.parse_ternary()?);
            self.leave_nesting(1);

            return Ok(AstNode::Ternary {
                condition: Box::new(expr),
                then_expr,
                else_expr,
                location,
            });
        }

        Ok(expr)
    }

    /// Parse logical OR (||)
    fn parse_logical_or(&mut self) -> Result<AstNode, ParseError> {
        let mut left = self.parse_logical_and()?;

        let mut folds = 0;
        while self.match_token(&Token::OrOr(self.current_location())) {
            self.enter_nesting()?;
            folds += 1;
            let location = self.previous_location();
            let right = Box::new(self.parse_logical_and()?);
            left = AstNode::BinaryOp {
                op: BinOp::Or,
                left: Box::new(left),
                right,
                location,
            };
        }
        self.leave_nesting(folds);

        Ok(left)
    }

    /// Parse logical AND (&&)
    fn parse_logical_and(&mut self) -> Result<AstNode, ParseError> {
        let mut left = self.parse_comparison()?;

        let mut folds = 0;
        while self.match_token(&Token::AndAnd(self.current_location())) {
            self.enter_nesting()?;
            folds += 1;
            let location = self.previous_location();
            let right = Box::new(self.parse_comparison()?);
            left = AstNode::BinaryOp {
                op: BinOp::And,
                left: Box::new(left),
                right,
                location,
            };
        }
        self.leave_nesting(folds);

        Ok(left)
    }

    fn comparison_op(&self) -> Option<BinOp> {
        match self.peek() {
            Token::EqEq(_) => Some(BinOp::Eq),
            Token::NotEq(_) => Some(BinOp::Ne),
            Token::Lt(_) => Some(BinOp::Lt),
            Token::Le(_) => Some(BinOp::Le),
            Token::Gt(_) => Some(BinOp::Gt),
            Token::Ge(_) => Some(BinOp::Ge),
            _ => None,
        }
    }

    /// Parse comparison. `a < b < c` is rejected rather than chained.
    fn parse_comparison(&mut self) -> Result<AstNode, ParseError> {
        let left = self.parse_nil_coalescing()?;

        let Some(op) = self.comparison_op() else {
            return Ok(left);
        };
        let location = self.advance().location();
        let right = self.parse_nil_coalescing()?;

        if self.comparison_op().is_some() {
            return Err(ParseError {
                message: "Adjacent comparison operators are non-associative".to_string(),
                location: self.current_location(),
            });
        }

        Ok(AstNode::BinaryOp {
            op,
            left: Box::new(left),
            right: Box::new(right),
            location,
        })
    }

    /// Parse `??` (right-associative)
    fn parse_nil_coalescing(&mut self) -> Result<AstNode, ParseError> {
        let left = self.parse_range()?;

        if self.match_token(&Token::QuestionQuestion(self.current_location())) {
            let location = self.previous_location();
            self.enter_nesting()?;
            let right = self.parse_nil_coalescing()?;
            self.leave_nesting(1);
            return Ok(AstNode::BinaryOp {
                op: BinOp::NilCoalesce,
                left: Box::new(left),
                right: Box::new(right),
                location,
            });
        }

        Ok(left)
    }

    /// Parse `a...b` and `a..<b`
    fn parse_range(&mut self) -> Result<AstNode, ParseError> {
        let left = self.parse_additive()?;

        let op = match self.peek() {
            Token::ClosedRange(_) => BinOp::ClosedRange,
            Token::HalfOpenRange(_) => BinOp::HalfOpenRange,
            _ => return Ok(left),
        };
        let location = self.advance().location();
        let right = self.parse_additive()?;

        Ok(AstNode::BinaryOp {
            op,
            left: Box::new(left),
            right: Box::new(right),
            location,
        })
    }

    /// Parse additive (+, -)
    fn parse_additive(&mut self) -> Result<AstNode, ParseError> {
        let mut left = self.parse_multiplicative()?;
        let mut folds = 0;

        loop {
            let op = match self.peek() {
                Token::Plus(_) => BinOp::Add,
                // A `-` opening a new line starts a new statement
                Token::Minus(_) if self.next_on_same_line() => BinOp::Sub,
                _ => break,
            };
            self.enter_nesting()?;
            folds += 1;
            let location = self.advance().location();
            let right = self.parse_multiplicative()?;
            left = AstNode::BinaryOp {
                op,
                left: Box::new(left),
                right: Box::new(right),
                location,
            };
        }
        self.leave_nesting(folds);

        Ok(left)
    }

    /// Parse multiplicative (*, /, %)
    fn parse_multiplicative(&mut self) -> Result<AstNode, ParseError> {
        let mut left = self.parse_unary()?;
        let mut folds = 0;

        loop {
            let op = match self.peek() {
                Token::Star(_) => BinOp::Mul,
                Token::Slash(_) => BinOp::Div,
                Token::Percent(_) => BinOp::Mod,
                _ => break,
            };
            self.enter_nesting()?;
            folds += 1;
            let location = self.advance().location();
            let right = self.parse_unary()?;
            left = AstNode::BinaryOp {
                op,
                left: Box::new(left),
                right: Box::new(right),
                location,
            };
        }
        self.leave_nesting(folds);

        Ok(left)
    }

    /// Parse prefix `-` and `!`
    fn parse_unary(&mut self) -> Result<AstNode, ParseError> {
        self.enter_nesting()?;
        let expr = self.parse_prefixed();
        self.leave_nesting(1);
        expr
    }

    fn parse_prefixed(&mut self) -> Result<AstNode, ParseError> {
        let location = self.current_location();

        if self.match_token(&Token::Minus(location)) {
            // A negated integer literal is read whole, so `Int.min` can be written
            if let Token::IntLiteral(magnitude, _) = *self.peek() {
                if !self.literal_has_postfix() {
                    self.advance();
                    let value = 0i64.checked_sub_unsigned(magnitude).ok_or_else(|| ParseError {
                        message: format!("Integer literal '-{}' overflows Int", magnitude),
                        location,
                    })?;
                    return Ok(AstNode::IntLiteral(value, location));
                }
            }

            let operand = self.parse_unary()?;
            // Fold negative literals so `-5` stays a literal
            return Ok(match operand {
                AstNode::IntLiteral(n, _) if n != i64::MIN => AstNode::IntLiteral(-n, location),
                AstNode::DoubleLiteral(n, _) => AstNode::DoubleLiteral(-n, location),
                other => AstNode::UnaryOp {
                    op: UnOp::Neg,
                    operand: Box::new(other),
                    location,
                },
            });
        }

        if self.match_token(&Token::Bang(location)) {
            let operand = Box::new(self.parse_unary()?);
            return Ok(AstNode::UnaryOp {
                op: UnOp::Not,
                operand,
                location,
            });
        }

        self.parse_postfix()
    }

    /// Parse postfix operators: calls, subscripts, member access, force unwrap.
    /// `(`, `[` and `!` only apply when on the same line as the expression.
    fn parse_postfix(&mut self) -> Result<AstNode, ParseError> {
        let mut expr = self.parse_primary()?;
        let mut folds = 0;

        loop {
            let location = self.current_location();

            if self.next_on_same_line() && self.check(&Token::LParen(location)) {
                self.advance();
                let args = self.parse_arguments()?;
                expr = match expr {
                    AstNode::Variable(callee, callee_loc) => AstNode::Call {
                        callee,
                        args,
                        location: callee_loc,
                    },
                    AstNode::Member {
                        object,
                        member,
                        location,
                    } => AstNode::MethodCall {
                        object,
                        method: member,
                        args,
                        location,
                    },
                    other => {
                        return Err(ParseError {
                            message: "Cannot call a value that is not a function".to_string(),
                            location: other.location(),
                        })
                    }
                };
            } else if self.next_on_same_line() && self.check(&Token::LBracket(location)) {
                self.advance();
                let index = Box::new(self.parse_expression()?);
                self.expect_token(
                    &Token::RBracket(self.current_location()),
                    "Expected ']' after subscript",
                )?;
                expr = AstNode::Subscript {
                    object: Box::new(expr),
                    index,
                    location,
                };
            } else if self.match_token(&Token::Dot(location)) {
                let member = self.expect_identifier()?;
                expr = AstNode::Member {
                    object: Box::new(expr),
                    member,
                    location,
                };
            } else if self.next_on_same_line() && self.check(&Token::Bang(location)) {
                self.advance();
                expr = AstNode::ForceUnwrap {
                    expr: Box::new(expr),
                    location,
                };
            } else {
                break;
            }
            // Each postfix wraps the expression so far one level deeper
            self.enter_nesting()?;
            folds += 1;
        }
        self.leave_nesting(folds);

        Ok(expr)
    }

    /// Whether the integer literal at the current token is followed by a
    /// postfix operator, which binds tighter than a prefix `-`
    fn literal_has_postfix(&self) -> bool {
        let line = self.peek().location().line;
        match self.peek_ahead(1) {
            Some(Token::Dot(_)) => true,
            Some(next @ (Token::LParen(_) | Token::LBracket(_) | Token::Bang(_))) => {
                next.location().line == line
            }
            _ => false,
        }
    }

    /// Parse call arguments after `(`, including the closing `)`
    fn parse_arguments(&mut self) -> Result<Vec<Arg>, ParseError> {
        let mut args = Vec::new();

        if self.match_token(&Token::RParen(self.current_location())) {
            return Ok(args);
        }

        loop {
            let label = match (self.peek(), self.peek_ahead(1)) {
                (Token::Ident(name, _), Some(Token::Colon(_))) => {
                    let name = name.clone();
                    self.advance();
                    self.advance();
                    Some(name)
                }
                _ => None,
            };
            let value = self.parse_expression()?;
            args.push(Arg { label, value });

            if !self.match_token(&Token::Comma(self.current_location())) {
                break;
            }
        }

        self.expect_rparen("after arguments")?;
        Ok(args)
    }

    /// Parse primary expressions (literals, names, parentheses, collection literals)
    fn parse_primary(&mut self) -> Result<AstNode, ParseError> {
        let location = self.current_location();

        match self.peek() {
            Token::IntLiteral(magnitude, _) => {
                let magnitude = *magnitude;
                let n = i64::try_from(magnitude).map_err(|_| ParseError {
                    message: format!("Integer literal '{}' overflows Int", magnitude),
                    location,
                })?;
                self.advance();
                Ok(AstNode::IntLiteral(n, location))
            }
            Token::DoubleLiteral(n, _) => {
                let n = *n;
                self.advance();
                Ok(AstNode::DoubleLiteral(n, location))
            }
            Token::True(_) => {
                self.advance();
                Ok(AstNode::BoolLiteral(true, location))
            }
            Token::False(_) => {
                self.advance();
                Ok(AstNode::BoolLiteral(false, location))
            }
            Token::StringLiteral(segments, _) => {
                let segments = segments.clone();
                self.advance();
                let parts = segments
                    .into_iter()
                    .map(|segment| match segment {
                        StringSegment::Text(text) => Ok(StringPart::Text(text)),
                        StringSegment::Code(code, origin) => {
                            parse_interpolation(&code, origin, self.nesting)
                                .map(StringPart::Interpolation)
                        }
                    })
                    .collect::<Result<Vec<_>, _>>()?;
                Ok(AstNode::StringLiteral(parts, location))
            }
            Token::Ident(name, _) => {
                let name = name.clone();
                self.advance();
                Ok(AstNode::Variable(name, location))
            }
            Token::LParen(_) => {
                self.advance();
                let expr = self.parse_expression()?;
                self.expect_rparen("after expression")?;
                Ok(expr)
            }
            Token::LBracket(_) => {
                self.advance();
                self.parse_collection_literal(location)
            }
            _ => Err(self.error_here("Expected expression")),
        }
    }

    /// Parse the rest of `[a, b]`, `[k: v, ...]`, `[]` or `[:]` after `[`
    fn parse_collection_literal(&mut self, location: SourceLocation) -> Result<AstNode, ParseError> {
        if self.match_token(&Token::RBracket(self.current_location())) {
            return Ok(AstNode::ArrayLiteral(Vec::new(), location));
        }

        if self.match_token(&Token::Colon(self.current_location())) {
            self.expect_token(
                &Token::RBracket(self.current_location()),
                "Expected ']' in empty dictionary literal",
            )?;
            return Ok(AstNode::DictLiteral(Vec::new(), location));
        }

        let first = self.parse_expression()?;

        if self.match_token(&Token::Colon(self.current_location())) {
            let value = self.parse_expression()?;
            let mut entries = vec![(first, value)];

            while self.match_token(&Token::Comma(self.current_location())) {
                if self.check(&Token::RBracket(self.current_location())) {
                    break;
                }
                let key = self.parse_expression()?;
                self.expect_colon("between dictionary key and value")?;
                let value = self.parse_expression()?;
                entries.push((key, value));
            }

            self.expect_token(
                &Token::RBracket(self.current_location()),
                "Expected ']' after dictionary literal",
            )?;
            return Ok(AstNode::DictLiteral(entries, location));
        }

        let mut elements = vec![first];
        while self.match_token(&Token::Comma(self.current_location())) {
            if self.check(&Token::RBracket(self.current_location())) {
                break;
            }
            elements.push(self.parse_expression()?);
        }

        self.expect_token(
            &Token::RBracket(self.current_location()),
            "Expected ']' after array literal",
        )?;
        Ok(AstNode::ArrayLiteral(elements, location))
    }
}

/// Parse the source of a `\( ... )` segment as a single expression
fn parse_interpolation(
    code: &str,
    origin: SourceLocation,
    nesting: usize,
) -> Result<Box<AstNode>, ParseError> {
    let mut parser = Parser::with_origin(code, origin)?;
    parser.nesting = nesting;
    let expr = parser.parse_expression()?;
    if !parser.is_at_end() {
        return Err(parser.error_here("Expected a single expression in string interpolation"));
    }
    Ok(Box::new(expr))
}

#[cfg(test)]
mod tests {
    use crate::parser::ast::*;
    use crate::parser::parse::Parser;

    fn expr(source: &str) -> AstNode {
        let mut parser = Parser::new(source).expect("Lexing failed");
        let mut program = parser.parse_program().expect("Parsing failed");
        match program.nodes.remove(0) {
            AstNode::ExpressionStatement { expr, .. } => *expr,
            other => panic!("Expected expression statement, got {:?}", other),
        }
    }

    #[test]
    fn test_nil_coalescing_binds_tighter_than_comparison() {
        match expr("scores[\"x\"] ?? 0 == 0") {
            AstNode::BinaryOp { op, left, .. } => {
                assert_eq!(op, BinOp::Eq);
                assert!(matches!(
                    *left,
                    AstNode::BinaryOp {
                        op: BinOp::NilCoalesce,
                        ..
                    }
                ));
            }
            other => panic!("Expected comparison, got {:?}", other),
        }
    }

    #[test]
    fn test_range_operands() {
        match expr("0..<n - 1") {
            AstNode::BinaryOp { op, right, .. } => {
                assert_eq!(op, BinOp::HalfOpenRange);
                assert!(matches!(*right, AstNode::BinaryOp { op: BinOp::Sub, .. }));
            }
            other => panic!("Expected range, got {:?}", other),
        }
    }

    #[test]
    fn test_negative_literal_folds() {
        assert!(matches!(expr("-5"), AstNode::IntLiteral(-5, _)));
        assert!(matches!(expr("-x"), AstNode::UnaryOp { op: UnOp::Neg, .. }));
    }

    #[test]
    fn test_smallest_int_literal() {
        assert!(matches!(expr("-9223372036854775808"), AstNode::IntLiteral(i64::MIN, _)));
        assert!(matches!(expr("-(9)"), AstNode::IntLiteral(-9, _)));

        for source in ["9223372036854775808", "-9223372036854775809"] {
            let mut parser = Parser::new(source).expect("Lexing failed");
            let err = parser.parse_program().unwrap_err();
            assert!(err.message.contains("overflows Int"), "{}", err);
        }
    }

    #[test]
    fn test_method_call_with_labels() {
        match expr("names.insert(\"Zoe\", at: 0)") {
            AstNode::MethodCall { method, args, .. } => {
                assert_eq!(method, "insert");
                assert_eq!(args.len(), 2);
                assert_eq!(args[0].label, None);
                assert_eq!(args[1].label.as_deref(), Some("at"));
            }
            other => panic!("Expected method call, got {:?}", other),
        }
    }

    #[test]
    fn test_member_chain_and_subscript() {
        match expr("people[0].name.count") {
            AstNode::Member { member, object, .. } => {
                assert_eq!(member, "count");
                assert!(matches!(*object, AstNode::Member { .. }));
            }
            other => panic!("Expected member access, got {:?}", other),
        }
    }

    #[test]
    fn test_interpolation_is_parsed() {
        match expr("\"Total: \\(a + b)\"") {
            AstNode::StringLiteral(parts, _) => {
                assert_eq!(parts.len(), 2);
                match &parts[1] {
                    StringPart::Interpolation(inner) => {
                        assert!(matches!(**inner, AstNode::BinaryOp { op: BinOp::Add, .. }));
                        assert_eq!(inner.location().line, 1);
                    }
                    other => panic!("Expected interpolation, got {:?}", other),
                }
            }
            other => panic!("Expected string literal, got {:?}", other),
        }
    }

    #[test]
    fn test_chained_comparison_rejected() {
        let mut parser = Parser::new("1 < 2 < 3").unwrap();
        assert!(parser.parse_program().is_err());
    }

    #[test]
    fn test_ternary() {
        assert!(matches!(expr("a > b ? a : b"), AstNode::Ternary { .. }));
    }

    #[test]
    fn test_force_unwrap() {
        assert!(matches!(expr("ages[\"Tim\"]!"), AstNode::ForceUnwrap { .. }));
    }
}
