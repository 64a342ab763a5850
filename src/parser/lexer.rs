//! Lexer (tokenizer) for lesson source code
//!
//! Converts raw source text into a flat [`Token`] stream consumed by the parser.
//! Comments of every flavour (including the `//:` prose and `//>` annotation
//! lines read by the lesson loader) are skipped here. String interpolation
//! segments are captured as raw source and parsed later by the parser.

use super::ast::SourceLocation;
use std::fmt;

/// Segment of a string literal as seen by the lexer
#[derive(Debug, Clone, PartialEq)]
pub enum StringSegment {
    Text(String),
    /// Source of an interpolated `\( ... )` expression and where it starts
    Code(String, SourceLocation),
}

/// All token variants produced by the lexer.
///
/// Every variant carries a [`SourceLocation`] so that parse errors can report
/// an accurate line and column without a separate token→location table.
#[derive(Debug, Clone, PartialEq)]
pub enum Token {
    // Literals
    /// Magnitude only; a leading `-` is folded in by the parser
    IntLiteral(u64, SourceLocation),
    DoubleLiteral(f64, SourceLocation),
    StringLiteral(Vec<StringSegment>, SourceLocation),

    // Identifiers
    Ident(String, SourceLocation),

    // Keywords
    Let(SourceLocation),
    Var(SourceLocation),
    Func(SourceLocation),
    Struct(SourceLocation),
    If(SourceLocation),
    Else(SourceLocation),
    While(SourceLocation),
    Repeat(SourceLocation),
    For(SourceLocation),
    In(SourceLocation),
    Break(SourceLocation),
    Continue(SourceLocation),
    Return(SourceLocation),
    True(SourceLocation),
    False(SourceLocation),

    // Arithmetic
    Plus(SourceLocation),    // +
    Minus(SourceLocation),   // -
    Star(SourceLocation),    // *
    Slash(SourceLocation),   // /
    Percent(SourceLocation), // %

    // Comparison
    EqEq(SourceLocation),  // ==
    NotEq(SourceLocation), // !=
    Lt(SourceLocation),    // <
    Le(SourceLocation),    // <=
    Gt(SourceLocation),    // >
    Ge(SourceLocation),    // >=

    // Logical
    AndAnd(SourceLocation), // &&
    OrOr(SourceLocation),   // ||
    Bang(SourceLocation),   // !

    // Assignment
    Eq(SourceLocation),        // =
    PlusEq(SourceLocation),    // +=
    MinusEq(SourceLocation),   // -=
    StarEq(SourceLocation),    // *=
    SlashEq(SourceLocation),   // /=
    PercentEq(SourceLocation), // %=

    // Ranges and fallbacks
    ClosedRange(SourceLocation),    // ...
    HalfOpenRange(SourceLocation),  // ..<
    QuestionQuestion(SourceLocation), // ??

    // Punctuation
    Arrow(SourceLocation),     // ->
    Dot(SourceLocation),       // .
    Question(SourceLocation),  // ?
    Colon(SourceLocation),     // :
    LParen(SourceLocation),    // (
    RParen(SourceLocation),    // )
    LBrace(SourceLocation),    // {
    RBrace(SourceLocation),    // }
    LBracket(SourceLocation),  // [
    RBracket(SourceLocation),  // ]
    Semicolon(SourceLocation), // ;
    Comma(SourceLocation),     // ,

    // End of file
    Eof(SourceLocation),
}

impl Token {
    /// Returns the source location where this token appears.
    pub fn location(&self) -> SourceLocation {
        match self {
            Token::IntLiteral(_, loc)
            | Token::DoubleLiteral(_, loc)
            | Token::StringLiteral(_, loc)
            | Token::Ident(_, loc)
            | Token::Let(loc)
            | Token::Var(loc)
            | Token::Func(loc)
            | Token::Struct(loc)
            | Token::If(loc)
            | Token::Else(loc)
            | Token::While(loc)
            | Token::Repeat(loc)
            | Token::For(loc)
            | Token::In(loc)
            | Token::Break(loc)
            | Token::Continue(loc)
            | Token::Return(loc)
            | Token::True(loc)
            | Token::False(loc)
            | Token::Plus(loc)
            | Token::Minus(loc)
            | Token::Star(loc)
            | Token::Slash(loc)
            | Token::Percent(loc)
            | Token::EqEq(loc)
            | Token::NotEq(loc)
            | Token::Lt(loc)
            | Token::Le(loc)
            | Token::Gt(loc)
            | Token::Ge(loc)
            | Token::AndAnd(loc)
            | Token::OrOr(loc)
            | Token::Bang(loc)
            | Token::Eq(loc)
            | Token::PlusEq(loc)
            | Token::MinusEq(loc)
            | Token::StarEq(loc)
            | Token::SlashEq(loc)
            | Token::PercentEq(loc)
            | Token::ClosedRange(loc)
            | Token::HalfOpenRange(loc)
            | Token::QuestionQuestion(loc)
            | Token::Arrow(loc)
            | Token::Dot(loc)
            | Token::Question(loc)
            | Token::Colon(loc)
            | Token::LParen(loc)
            | Token::RParen(loc)
            | Token::LBrace(loc)
            | Token::RBrace(loc)
            | Token::LBracket(loc)
            | Token::RBracket(loc)
            | Token::Semicolon(loc)
            | Token::Comma(loc)
            | Token::Eof(loc) => *loc,
        }
    }
}

impl fmt::Display for Token {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Token::IntLiteral(n, _) => write!(f, "integer literal {}", n),
            Token::DoubleLiteral(n, _) => write!(f, "floating-point literal {}", n),
            Token::StringLiteral(_, _) => write!(f, "string literal"),
            Token::Ident(s, _) => write!(f, "identifier '{}'", s),
            Token::Let(_) => write!(f, "'let'"),
            Token::Var(_) => write!(f, "'var'"),
            Token::Func(_) => write!(f, "'func'"),
            Token::Struct(_) => write!(f, "'struct'"),
            Token::If(_) => write!(f, "'if'"),
            Token::Else(_) => write!(f, "'else'"),
            Token::While(_) => write!(f, "'while'"),
            Token::Repeat(_) => write!(f, "'repeat'"),
            Token::For(_) => write!(f, "'for'"),
            Token::In(_) => write!(f, "'in'"),
            Token::Break(_) => write!(f, "'break'"),
            Token::Continue(_) => write!(f, "'continue'"),
            Token::Return(_) => write!(f, "'return'"),
            Token::True(_) => write!(f, "'true'"),
            Token::False(_) => write!(f, "'false'"),
            Token::Plus(_) => write!(f, "'+'"),
            Token::Minus(_) => write!(f, "'-'"),
            Token::Star(_) => write!(f, "'*'"),
            Token::Slash(_) => write!(f, "'/'"),
            Token::Percent(_) => write!(f, "'%'"),
            Token::EqEq(_) => write!(f, "'=='"),
            Token::NotEq(_) => write!(f, "'!='"),
            Token::Lt(_) => write!(f, "'<'"),
            Token::Le(_) => write!(f, "'<='"),
            Token::Gt(_) => write!(f, "'>'"),
            Token::Ge(_) => write!(f, "'>='"),
            Token::AndAnd(_) => write!(f, "'&&'"),
            Token::OrOr(_) => write!(f, "'||'"),
            Token::Bang(_) => write!(f, "'!'"),
            Token::Eq(_) => write!(f, "'='"),
            Token::PlusEq(_) => write!(f, "'+='"),
            Token::MinusEq(_) => write!(f, "'-='"),
            Token::StarEq(_) => write!(f, "'*='"),
            Token::SlashEq(_) => write!(f, "'/='"),
            Token::PercentEq(_) => write!(f, "'%='"),
            Token::ClosedRange(_) => write!(f, "'...'"),
            Token::HalfOpenRange(_) => write!(f, "'..<'"),
            Token::QuestionQuestion(_) => write!(f, "'??'"),
            Token::Arrow(_) => write!(f, "'->'"),
            Token::Dot(_) => write!(f, "'.'"),
            Token::Question(_) => write!(f, "'?'"),
            Token::Colon(_) => write!(f, "':'"),
            Token::LParen(_) => write!(f, "'('"),
            Token::RParen(_) => write!(f, "')'"),
            Token::LBrace(_) => write!(f, "'{{'"),
            Token::RBrace(_) => write!(f, "'}}'"),
            Token::LBracket(_) => write!(f, "'['"),
            Token::RBracket(_) => write!(f, "']'"),
            Token::Semicolon(_) => write!(f, "';'"),
            Token::Comma(_) => write!(f, "','"),
            Token::Eof(_) => write!(f, "end of file"),
        }
    }
}

/// Lexer error type
#[derive(Debug)]
pub struct LexError {
    pub message: String,
    pub location: SourceLocation,
}

impl fmt::Display for LexError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "Lexer error at line {}, column {}: {}",
            self.location.line, self.location.column, self.message
        )
    }
}

impl std::error::Error for LexError {}

/// Identifiers may use any non-ASCII symbol, so lessons can name things `🍎`
fn is_ident_start(ch: char) -> bool {
    ch.is_alphabetic() || ch == '_' || (!ch.is_ascii() && !ch.is_whitespace())
}

fn is_ident_continue(ch: char) -> bool {
    is_ident_start(ch) || ch.is_ascii_digit()
}

/// Lexer for lesson source code
pub struct Lexer {
    input: Vec<char>,
    position: usize,
    line: usize,
    column: usize,
}

impl Lexer {
    /// Create a new lexer for the given source string.
    pub fn new(input: &str) -> Self {
        Self::with_origin(input, SourceLocation::new(1, 1))
    }

    /// Create a lexer whose locations start at `origin` instead of 1:1,
    /// used for the source of interpolated segments.
    pub fn with_origin(input: &str, origin: SourceLocation) -> Self {
        Self {
            input: input.chars().collect(),
            position: 0,
            line: origin.line,
            column: origin.column,
        }
    }

    /// Tokenize the entire input
    pub fn tokenize(&mut self) -> Result<Vec<Token>, LexError> {
        let mut tokens = Vec::new();

        loop {
            self.skip_whitespace_and_comments()?;

            if self.is_at_end() {
                tokens.push(Token::Eof(self.current_location()));
                break;
            }

            tokens.push(self.next_token()?);
        }

        Ok(tokens)
    }

    /// Get next token
    fn next_token(&mut self) -> Result<Token, LexError> {
        let loc = self.current_location();
        let ch = self.advance().ok_or_else(|| LexError {
            message: "Unexpected end of file".to_string(),
            location: loc,
        })?;

        match ch {
            '"' => self.string_literal(loc),
            '0'..='9' => self.number_literal(ch, loc),
            c if is_ident_start(c) => Ok(self.identifier_or_keyword(c, loc)),

            '+' => Ok(self.with_eq(Token::PlusEq(loc), Token::Plus(loc))),
            '*' => Ok(self.with_eq(Token::StarEq(loc), Token::Star(loc))),
            '/' => Ok(self.with_eq(Token::SlashEq(loc), Token::Slash(loc))),
            '%' => Ok(self.with_eq(Token::PercentEq(loc), Token::Percent(loc))),
            '=' => Ok(self.with_eq(Token::EqEq(loc), Token::Eq(loc))),
            '!' => Ok(self.with_eq(Token::NotEq(loc), Token::Bang(loc))),
            '<' => Ok(self.with_eq(Token::Le(loc), Token::Lt(loc))),
            '>' => Ok(self.with_eq(Token::Ge(loc), Token::Gt(loc))),
            '-' => {
                if self.peek() == Some('>') {
                    self.advance();
                    Ok(Token::Arrow(loc))
                } else {
                    Ok(self.with_eq(Token::MinusEq(loc), Token::Minus(loc)))
                }
            }
            '&' => {
                if self.peek() == Some('&') {
                    self.advance();
                    Ok(Token::AndAnd(loc))
                } else {
                    Err(LexError {
                        message: "Unexpected character: '&' (did you mean '&&'?)".to_string(),
                        location: loc,
                    })
                }
            }
            '|' => {
                if self.peek() == Some('|') {
                    self.advance();
                    Ok(Token::OrOr(loc))
                } else {
                    Err(LexError {
                        message: "Unexpected character: '|' (did you mean '||'?)".to_string(),
                        location: loc,
                    })
                }
            }
            '?' => {
                if self.peek() == Some('?') {
                    self.advance();
                    Ok(Token::QuestionQuestion(loc))
                } else {
                    Ok(Token::Question(loc))
                }
            }
            '.' => {
                if self.peek() == Some('.') && self.peek_ahead(1) == Some('.') {
                    self.advance();
                    self.advance();
                    Ok(Token::ClosedRange(loc))
                } else if self.peek() == Some('.') && self.peek_ahead(1) == Some('<') {
                    self.advance();
                    self.advance();
                    Ok(Token::HalfOpenRange(loc))
                } else {
                    Ok(Token::Dot(loc))
                }
            }
            ':' => Ok(Token::Colon(loc)),
            '(' => Ok(Token::LParen(loc)),
            ')' => Ok(Token::RParen(loc)),
            '{' => Ok(Token::LBrace(loc)),
            '}' => Ok(Token::RBrace(loc)),
            '[' => Ok(Token::LBracket(loc)),
            ']' => Ok(Token::RBracket(loc)),
            ';' => Ok(Token::Semicolon(loc)),
            ',' => Ok(Token::Comma(loc)),

            _ => Err(LexError {
                message: format!("Unexpected character: '{}'", ch),
                location: loc,
            }),
        }
    }

    /// Consume a trailing `=` and return `compound`, or return `plain`
    fn with_eq(&mut self, compound: Token, plain: Token) -> Token {
        if self.peek() == Some('=') {
            self.advance();
            compound
        } else {
            plain
        }
    }

    /// Parse string literal, splitting out `\( ... )` interpolations
    fn string_literal(&mut self, loc: SourceLocation) -> Result<Token, LexError> {
        let mut segments = Vec::new();
        let mut text = String::new();

        while let Some(ch) = self.peek() {
            match ch {
                '"' => {
                    self.advance(); // consume closing quote
                    if !text.is_empty() || segments.is_empty() {
                        segments.push(StringSegment::Text(text));
                    }
                    return Ok(Token::StringLiteral(segments, loc));
                }
                '\n' => break,
                '\\' => {
                    self.advance();
                    let escape_loc = self.current_location();
                    let escaped = self.advance().ok_or_else(|| LexError {
                        message: "Unexpected end of file in string literal".to_string(),
                        location: escape_loc,
                    })?;

                    match escaped {
                        'n' => text.push('\n'),
                        't' => text.push('\t'),
                        'r' => text.push('\r'),
                        '\\' => text.push('\\'),
                        '"' => text.push('"'),
                        '\'' => text.push('\''),
                        '0' => text.push('\0'),
                        '(' => {
                            if !text.is_empty() {
                                segments.push(StringSegment::Text(std::mem::take(&mut text)));
                            }
                            let code_loc = self.current_location();
                            let code = self.interpolation_source(code_loc)?;
                            segments.push(StringSegment::Code(code, code_loc));
                        }
                        _ => {
                            return Err(LexError {
                                message: format!("Unknown escape sequence: \\{}", escaped),
                                location: escape_loc,
                            });
                        }
                    }
                }
                _ => {
                    text.push(ch);
                    self.advance();
                }
            }
        }

        Err(LexError {
            message: "Unterminated string literal".to_string(),
            location: loc,
        })
    }

    /// Collect the raw source of an interpolation up to its matching `)`
    fn interpolation_source(&mut self, start: SourceLocation) -> Result<String, LexError> {
        let mut code = String::new();
        let mut depth = 0usize;
        let mut in_string = false;

        while let Some(ch) = self.advance() {
            match ch {
                '\n' => break,
                '"' => in_string = !in_string,
                '\\' if in_string => {
                    code.push(ch);
                    if let Some(next) = self.advance() {
                        code.push(next);
                    }
                    continue;
                }
                '(' if !in_string => depth += 1,
                ')' if !in_string => {
                    if depth == 0 {
                        if code.trim().is_empty() {
                            return Err(LexError {
                                message: "Empty string interpolation".to_string(),
                                location: start,
                            });
                        }
                        return Ok(code);
                    }
                    depth -= 1;
                }
                _ => {}
            }
            code.push(ch);
        }

        Err(LexError {
            message: "Unterminated string interpolation".to_string(),
            location: start,
        })
    }

    /// Parse numeric literal (integers with optional `_` separators, or doubles)
    fn number_literal(&mut self, first_digit: char, loc: SourceLocation) -> Result<Token, LexError> {
        let mut num_str = String::new();
        num_str.push(first_digit);
        let mut is_double = false;

        while let Some(ch) = self.peek() {
            if ch.is_ascii_digit() {
                num_str.push(ch);
                self.advance();
            } else if ch == '_' {
                self.advance();
            } else if ch == '.'
                && !is_double
                && self.peek_ahead(1).is_some_and(|c| c.is_ascii_digit())
            {
                is_double = true;
                num_str.push(ch);
                self.advance();
            } else {
                break;
            }
        }

        if is_double {
            let value = num_str.parse::<f64>().map_err(|_| LexError {
                message: format!("Invalid floating-point literal: {}", num_str),
                location: loc,
            })?;
            Ok(Token::DoubleLiteral(value, loc))
        } else {
            let value = num_str.parse::<u64>().map_err(|_| LexError {
                message: format!("Integer literal '{}' overflows Int", num_str),
                location: loc,
            })?;
            Ok(Token::IntLiteral(value, loc))
        }
    }

    /// Parse identifier or keyword
    fn identifier_or_keyword(&mut self, first_char: char, loc: SourceLocation) -> Token {
        let mut ident = String::new();
        ident.push(first_char);

        while let Some(ch) = self.peek() {
            if is_ident_continue(ch) {
                ident.push(ch);
                self.advance();
            } else {
                break;
            }
        }

        match ident.as_str() {
            "let" => Token::Let(loc),
            "var" => Token::Var(loc),
            "func" => Token::Func(loc),
            "struct" => Token::Struct(loc),
            "if" => Token::If(loc),
            "else" => Token::Else(loc),
            "while" => Token::While(loc),
            "repeat" => Token::Repeat(loc),
            "for" => Token::For(loc),
            "in" => Token::In(loc),
            "break" => Token::Break(loc),
            "continue" => Token::Continue(loc),
            "return" => Token::Return(loc),
            "true" => Token::True(loc),
            "false" => Token::False(loc),
            _ => Token::Ident(ident, loc),
        }
    }

    /// Skip whitespace and comments
    fn skip_whitespace_and_comments(&mut self) -> Result<(), LexError> {
        loop {
            match self.peek() {
                Some(c) if c.is_whitespace() => {
                    self.advance();
                }
                Some('/') => {
                    if self.peek_ahead(1) == Some('/') {
                        self.skip_line_comment();
                    } else if self.peek_ahead(1) == Some('*') {
                        self.skip_block_comment()?;
                    } else {
                        break;
                    }
                }
                _ => break,
            }
        }
        Ok(())
    }

    /// Skip single-line comment (// ...)
    fn skip_line_comment(&mut self) {
        while let Some(ch) = self.peek() {
            if ch == '\n' {
                break;
            }
            self.advance();
        }
    }

    /// Skip multi-line comment (/* ... */), which may nest
    fn skip_block_comment(&mut self) -> Result<(), LexError> {
        let start_loc = self.current_location();
        self.advance(); // skip '/'
        self.advance(); // skip '*'
        let mut depth = 1usize;

        while !self.is_at_end() {
            if self.peek() == Some('*') && self.peek_ahead(1) == Some('/') {
                self.advance();
                self.advance();
                depth -= 1;
                if depth == 0 {
                    return Ok(());
                }
            } else if self.peek() == Some('/') && self.peek_ahead(1) == Some('*') {
                self.advance();
                self.advance();
                depth += 1;
            } else {
                self.advance();
            }
        }

        Err(LexError {
            message: "Unterminated block comment".to_string(),
            location: start_loc,
        })
    }

    /// Peek at current character without consuming
    fn peek(&self) -> Option<char> {
        self.input.get(self.position).copied()
    }

    /// Peek ahead n characters
    fn peek_ahead(&self, n: usize) -> Option<char> {
        self.input.get(self.position + n).copied()
    }

    /// Advance to next character
    fn advance(&mut self) -> Option<char> {
        let ch = *self.input.get(self.position)?;
        self.position += 1;

        if ch == '\n' {
            self.line += 1;
            self.column = 1;
        } else {
            self.column += 1;
        }

        Some(ch)
    }

    /// Check if at end of input
    fn is_at_end(&self) -> bool {
        self.position >= self.input.len()
    }

    /// Get current source location
    fn current_location(&self) -> SourceLocation {
        SourceLocation::new(self.line, self.column)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_declaration_tokens() {
        let mut lexer = Lexer::new("var answer: Int = 42");
        let tokens = lexer.tokenize().unwrap();

        assert!(matches!(tokens[0], Token::Var(_)));
        assert!(matches!(tokens[1], Token::Ident(ref s, _) if s == "answer"));
        assert!(matches!(tokens[2], Token::Colon(_)));
        assert!(matches!(tokens[3], Token::Ident(ref s, _) if s == "Int"));
        assert!(matches!(tokens[4], Token::Eq(_)));
        assert!(matches!(tokens[5], Token::IntLiteral(42, _)));
        assert!(matches!(tokens[6], Token::Eof(_)));
    }

    #[test]
    fn test_operators() {
        let mut lexer = Lexer::new("+= -= == != && || ... ..< ?? -> !");
        let tokens = lexer.tokenize().unwrap();

        assert!(matches!(tokens[0], Token::PlusEq(_)));
        assert!(matches!(tokens[1], Token::MinusEq(_)));
        assert!(matches!(tokens[2], Token::EqEq(_)));
        assert!(matches!(tokens[3], Token::NotEq(_)));
        assert!(matches!(tokens[4], Token::AndAnd(_)));
        assert!(matches!(tokens[5], Token::OrOr(_)));
        assert!(matches!(tokens[6], Token::ClosedRange(_)));
        assert!(matches!(tokens[7], Token::HalfOpenRange(_)));
        assert!(matches!(tokens[8], Token::QuestionQuestion(_)));
        assert!(matches!(tokens[9], Token::Arrow(_)));
        assert!(matches!(tokens[10], Token::Bang(_)));
    }

    #[test]
    fn test_range_is_not_a_double() {
        let mut lexer = Lexer::new("0...5 0..<5 3.25");
        let tokens = lexer.tokenize().unwrap();

        assert!(matches!(tokens[0], Token::IntLiteral(0, _)));
        assert!(matches!(tokens[1], Token::ClosedRange(_)));
        assert!(matches!(tokens[2], Token::IntLiteral(5, _)));
        assert!(matches!(tokens[3], Token::IntLiteral(0, _)));
        assert!(matches!(tokens[4], Token::HalfOpenRange(_)));
        assert!(matches!(tokens[5], Token::IntLiteral(5, _)));
        assert!(matches!(tokens[6], Token::DoubleLiteral(v, _) if v == 3.25));
    }

    #[test]
    fn test_comments_and_prose() {
        let mut lexer = Lexer::new("//: # Title\nlet x = 1 // note\n/* outer /* inner */ */ let y = 2");
        let tokens = lexer.tokenize().unwrap();

        assert!(matches!(tokens[0], Token::Let(_)));
        assert!(matches!(tokens[1], Token::Ident(ref s, _) if s == "x"));
        assert!(matches!(tokens[4], Token::Let(_)));
        assert!(matches!(tokens[5], Token::Ident(ref s, _) if s == "y"));
        assert_eq!(tokens[0].location().line, 2);
    }

    #[test]
    fn test_unicode_identifiers() {
        let mut lexer = Lexer::new("let 🍎 = \"Apple\"\nvar せん = 1000");
        let tokens = lexer.tokenize().unwrap();

        assert!(matches!(tokens[1], Token::Ident(ref s, _) if s == "🍎"));
        assert!(matches!(tokens[5], Token::Ident(ref s, _) if s == "せん"));
    }

    #[test]
    fn test_string_interpolation_segments() {
        let mut lexer = Lexer::new(r#""Hi, \(person["firstName"]) \(n + 1)!""#);
        let tokens = lexer.tokenize().unwrap();

        match &tokens[0] {
            Token::StringLiteral(segments, _) => {
                assert_eq!(segments.len(), 5);
                assert!(matches!(&segments[0], StringSegment::Text(t) if t == "Hi, "));
                assert!(
                    matches!(&segments[1], StringSegment::Code(c, _) if c == "person[\"firstName\"]")
                );
                assert!(matches!(&segments[2], StringSegment::Text(t) if t == " "));
                assert!(matches!(&segments[3], StringSegment::Code(c, _) if c == "n + 1"));
                assert!(matches!(&segments[4], StringSegment::Text(t) if t == "!"));
            }
            other => panic!("Expected string literal, got {:?}", other),
        }
    }

    #[test]
    fn test_unterminated_string() {
        let mut lexer = Lexer::new("let s = \"oops\nlet t = 1");
        let err = lexer.tokenize().unwrap_err();
        assert!(err.message.contains("Unterminated string"));
        assert_eq!(err.location.line, 1);
    }
}
