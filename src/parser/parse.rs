//! Parser entry point and token cursor
//!
//! Holds the [`Parser`] state, the [`ParseError`] type and the small cursor
//! helpers shared by the grammar modules:
//! - `statements`: statement lines and indented blocks
//! - `expressions`: flat operand/operator sequences
//!
//! Both grammar modules add `impl Parser` blocks, so they share one cursor
//! over the token list produced by the lexer.

use crate::parser::lexer::{LexError, Lexer, Token};
use crate::tree::ast::{SourceLocation, Statement};
use crate::tree::MAX_NESTING;

/// Errors produced while reading source text.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum ParseError {
    /// Text that is not valid in the accepted language
    #[error("Syntax error at {location}: {message}")]
    Syntax {
        message: String,
        location: SourceLocation,
    },

    /// Valid Python the program model has no place for
    #[error("Unsupported at {location}: {feature}")]
    Unsupported {
        feature: String,
        location: SourceLocation,
    },
}

impl ParseError {
    pub fn syntax(message: impl Into<String>, location: SourceLocation) -> Self {
        ParseError::Syntax {
            message: message.into(),
            location,
        }
    }

    pub fn unsupported(feature: impl Into<String>, location: SourceLocation) -> Self {
        ParseError::Unsupported {
            feature: feature.into(),
            location,
        }
    }

    pub fn location(&self) -> SourceLocation {
        match self {
            ParseError::Syntax { location, .. } | ParseError::Unsupported { location, .. } => *location,
        }
    }
}

impl From<LexError> for ParseError {
    fn from(err: LexError) -> Self {
        ParseError::Syntax {
            message: err.message,
            location: err.location,
        }
    }
}

/// Recursive descent parser for the Python subset
pub struct Parser {
    pub(crate) tokens: Vec<Token>,
    pub(crate) position: usize,
    /// Current expression nesting
    pub(crate) depth: usize,
}

impl Parser {
    pub fn new(source: &str) -> Result<Self, ParseError> {
        let mut lexer = Lexer::new(source);
        let tokens = lexer.tokenize()?;
        Ok(Self {
            tokens,
            position: 0,
            depth: 0,
        })
    }

    /// Parse the whole file into its top-level statements
    pub fn parse_program(&mut self) -> Result<Vec<Statement>, ParseError> {
        let mut body = Vec::new();

        while !self.is_at_end() {
            if let Token::Indent(loc) = self.peek() {
                return Err(ParseError::syntax("Unexpected indent", *loc));
            }
            if let Some(statement) = self.parse_statement()? {
                body.push(statement);
            }
        }

        tracing::debug!(statements = body.len(), "parsed source");
        Ok(body)
    }

    // ===== Cursor =====

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
        // The token list always ends with Eof and the cursor never passes it
        &self.tokens[self.position.min(self.tokens.len() - 1)]
    }

    pub(crate) fn peek_ahead(&self, n: usize) -> Option<&Token> {
        self.tokens.get(self.position + n)
    }

    pub(crate) fn previous(&self) -> &Token {
        &self.tokens[self.position.saturating_sub(1)]
    }

    pub(crate) fn current_location(&self) -> SourceLocation {
        self.peek().location()
    }

    /// Syntax error pointing at the current token.
    pub(crate) fn unexpected(&self, expected: &str) -> ParseError {
        ParseError::syntax(format!("Expected {}, found {}", expected, self.peek()), self.current_location())
    }

    /// True when the current token is of the given kind.
    pub(crate) fn at(&self, kind: fn(SourceLocation) -> Token) -> bool {
        self.check(&kind(self.current_location()))
    }

    /// Consume the current token if it is of the given kind.
    pub(crate) fn eat(&mut self, kind: fn(SourceLocation) -> Token) -> bool {
        let token = kind(self.current_location());
        self.match_token(&token)
    }

    pub(crate) fn expect(&mut self, kind: fn(SourceLocation) -> Token, expected: &str) -> Result<(), ParseError> {
        if self.eat(kind) {
            Ok(())
        } else {
            Err(self.unexpected(expected))
        }
    }

    pub(crate) fn expect_newline(&mut self) -> Result<(), ParseError> {
        if let Token::Semicolon(loc) = self.peek() {
            return Err(ParseError::syntax("Only one statement per line is supported", *loc));
        }
        self.expect(Token::Newline, "end of line")
    }

    /// Step one expression level deeper. Callers restore `depth` when the
    /// nested construct ends.
    pub(crate) fn nest(&mut self) -> Result<(), ParseError> {
        if self.depth > MAX_NESTING {
            return Err(ParseError::syntax("Too many nested parentheses", self.current_location()));
        }
        self.depth += 1;
        Ok(())
    }

    pub(crate) fn expect_identifier(&mut self) -> Result<String, ParseError> {
        if let Token::Ident(name, _) = self.peek() {
            let name = name.clone();
            self.advance();
            Ok(name)
        } else {
            Err(self.unexpected("identifier"))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tree::ast::{Expression, Number, Token as Tok};

    fn parse(source: &str) -> Vec<Statement> {
        Parser::new(source).unwrap().parse_program().unwrap()
    }

    #[test]
    fn test_parse_simple_function() {
        let body = parse("def main():\n    return 0\n");

        assert_eq!(body.len(), 1);
        match &body[0] {
            Statement::FunctionDeclaration(func) => {
                assert_eq!(func.name, "main");
                assert_eq!(func.id.as_deref(), Some("main"));
                assert!(func.params.is_empty());
                assert_eq!(
                    func.body,
                    vec![Statement::Return(Expression::new(vec![Tok::Number(Number::Int(0))]))]
                );
            }
            other => panic!("Expected function definition, got {:?}", other),
        }
    }

    #[test]
    fn test_blank_lines_and_pass_are_dropped() {
        let body = parse("x = 1\n\n\npass\ny = 2\n");
        assert_eq!(body.len(), 2);
    }

    #[test]
    fn test_unexpected_indent() {
        let err = Parser::new("x = 1\n    y = 2\n").unwrap().parse_program().unwrap_err();
        assert!(matches!(err, ParseError::Syntax { .. }));
        assert_eq!(err.location().line, 2);
    }

    #[test]
    fn test_error_display() {
        let err = ParseError::unsupported("augmented assignment", SourceLocation::new(3, 5));
        assert_eq!(err.to_string(), "Unsupported at line 3, column 5: augmented assignment");
    }
}
