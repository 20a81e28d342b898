//! Lexical analysis for Python source text.
//!
//! Besides ordinary tokens the lexer produces the layout tokens the statement
//! reader relies on: [`Token::Newline`] at the end of every logical line and
//! [`Token::Indent`] / [`Token::Dedent`] when the indentation changes. Line
//! breaks inside brackets or after a trailing backslash do not end the
//! logical line.
//!
//! A comment on a line of its own becomes a [`Token::Comment`] followed by a
//! newline, so it survives as a statement. Comments after code are dropped.

use crate::tree::ast::SourceLocation;
use crate::tree::MAX_BLOCK_NESTING;
use std::fmt;

/// Token type with source location
#[derive(Debug, Clone, PartialEq)]
pub enum Token {
    // Literals
    IntLiteral(i64, SourceLocation),
    FloatLiteral(f64, SourceLocation),
    StringLiteral(String, SourceLocation),
    Ident(String, SourceLocation),

    // Keywords
    Def(SourceLocation),
    Return(SourceLocation),
    If(SourceLocation),
    Elif(SourceLocation),
    Else(SourceLocation),
    While(SourceLocation),
    For(SourceLocation),
    In(SourceLocation),
    Break(SourceLocation),
    Continue(SourceLocation),
    Pass(SourceLocation),
    Import(SourceLocation),
    From(SourceLocation),
    As(SourceLocation),
    And(SourceLocation),
    Or(SourceLocation),
    Not(SourceLocation),
    Is(SourceLocation),
    True(SourceLocation),
    False(SourceLocation),
    None(SourceLocation),
    /// Python keyword the reader does not handle (`class`, `lambda`, ...)
    Reserved(&'static str, SourceLocation),

    /// Arithmetic, bitwise or comparison operator symbol
    Operator(&'static str, SourceLocation),
    /// Augmented assignment such as `+=`
    AugAssign(&'static str, SourceLocation),
    Eq(SourceLocation),
    Arrow(SourceLocation),
    Dot(SourceLocation),
    Colon(SourceLocation),
    Comma(SourceLocation),
    Semicolon(SourceLocation),
    LParen(SourceLocation),
    RParen(SourceLocation),
    LBracket(SourceLocation),
    RBracket(SourceLocation),
    LBrace(SourceLocation),
    RBrace(SourceLocation),

    // Layout
    Comment(String, SourceLocation),
    Newline(SourceLocation),
    Indent(SourceLocation),
    Dedent(SourceLocation),
    Eof(SourceLocation),
}

static RESERVED: &[&str] = &[
    "class", "lambda", "try", "except", "finally", "raise", "with", "yield", "global", "nonlocal", "del",
    "assert", "async", "await",
];

/// Operator symbols, longest first so the scan is maximal munch.
static OPERATORS: &[&str] = &[
    "**", "//", "<<", ">>", "==", "!=", "<=", ">=", "+", "-", "*", "/", "%", "@", "|", "^", "&", "~", "<", ">",
];

static AUGMENTED: &[&str] = &[
    "**=", "//=", "<<=", ">>=", "+=", "-=", "*=", "/=", "%=", "@=", "|=", "^=", "&=",
];

impl Token {
    pub fn location(&self) -> SourceLocation {
        match self {
            Token::IntLiteral(_, loc)
            | Token::FloatLiteral(_, loc)
            | Token::StringLiteral(_, loc)
            | Token::Ident(_, loc)
            | Token::Reserved(_, loc)
            | Token::Operator(_, loc)
            | Token::AugAssign(_, loc)
            | Token::Comment(_, loc) => *loc,
            Token::Def(loc)
            | Token::Return(loc)
            | Token::If(loc)
            | Token::Elif(loc)
            | Token::Else(loc)
            | Token::While(loc)
            | Token::For(loc)
            | Token::In(loc)
            | Token::Break(loc)
            | Token::Continue(loc)
            | Token::Pass(loc)
            | Token::Import(loc)
            | Token::From(loc)
            | Token::As(loc)
            | Token::And(loc)
            | Token::Or(loc)
            | Token::Not(loc)
            | Token::Is(loc)
            | Token::True(loc)
            | Token::False(loc)
            | Token::None(loc)
            | Token::Eq(loc)
            | Token::Arrow(loc)
            | Token::Dot(loc)
            | Token::Colon(loc)
            | Token::Comma(loc)
            | Token::Semicolon(loc)
            | Token::LParen(loc)
            | Token::RParen(loc)
            | Token::LBracket(loc)
            | Token::RBracket(loc)
            | Token::LBrace(loc)
            | Token::RBrace(loc)
            | Token::Newline(loc)
            | Token::Indent(loc)
            | Token::Dedent(loc)
            | Token::Eof(loc) => *loc,
        }
    }
}

impl fmt::Display for Token {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Token::IntLiteral(n, _) => write!(f, "int literal {}", n),
            Token::FloatLiteral(n, _) => write!(f, "float literal {}", n),
            Token::StringLiteral(s, _) => write!(f, "string literal {:?}", s),
            Token::Ident(s, _) => write!(f, "identifier '{}'", s),
            Token::Def(_) => write!(f, "'def'"),
            Token::Return(_) => write!(f, "'return'"),
            Token::If(_) => write!(f, "'if'"),
            Token::Elif(_) => write!(f, "'elif'"),
            Token::Else(_) => write!(f, "'else'"),
            Token::While(_) => write!(f, "'while'"),
            Token::For(_) => write!(f, "'for'"),
            Token::In(_) => write!(f, "'in'"),
            Token::Break(_) => write!(f, "'break'"),
            Token::Continue(_) => write!(f, "'continue'"),
            Token::Pass(_) => write!(f, "'pass'"),
            Token::Import(_) => write!(f, "'import'"),
            Token::From(_) => write!(f, "'from'"),
            Token::As(_) => write!(f, "'as'"),
            Token::And(_) => write!(f, "'and'"),
            Token::Or(_) => write!(f, "'or'"),
            Token::Not(_) => write!(f, "'not'"),
            Token::Is(_) => write!(f, "'is'"),
            Token::True(_) => write!(f, "'True'"),
            Token::False(_) => write!(f, "'False'"),
            Token::None(_) => write!(f, "'None'"),
            Token::Reserved(keyword, _) => write!(f, "'{}'", keyword),
            Token::Operator(op, _) | Token::AugAssign(op, _) => write!(f, "'{}'", op),
            Token::Eq(_) => write!(f, "'='"),
            Token::Arrow(_) => write!(f, "'->'"),
            Token::Dot(_) => write!(f, "'.'"),
            Token::Colon(_) => write!(f, "':'"),
            Token::Comma(_) => write!(f, "','"),
            Token::Semicolon(_) => write!(f, "';'"),
            Token::LParen(_) => write!(f, "'('"),
            Token::RParen(_) => write!(f, "')'"),
            Token::LBracket(_) => write!(f, "'['"),
            Token::RBracket(_) => write!(f, "']'"),
            Token::LBrace(_) => write!(f, "'{{'"),
            Token::RBrace(_) => write!(f, "'}}'"),
            Token::Comment(_, _) => write!(f, "comment"),
            Token::Newline(_) => write!(f, "end of line"),
            Token::Indent(_) => write!(f, "indent"),
            Token::Dedent(_) => write!(f, "dedent"),
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
        write!(f, "Lexer error at {}: {}", self.location, self.message)
    }
}

impl std::error::Error for LexError {}

/// Lexer for Python source code
pub struct Lexer {
    input: Vec<char>,
    position: usize,
    line: usize,
    column: usize,
    /// Open indentation widths, innermost last; never empty
    indents: Vec<usize>,
    /// Bracket nesting depth; line breaks inside brackets are ignored
    depth: usize,
    tokens: Vec<Token>,
}

impl Lexer {
    /// Create a new lexer for the given source string.
    pub fn new(input: &str) -> Self {
        Self {
            input: input.chars().collect(),
            position: 0,
            line: 1,
            column: 1,
            indents: vec![0],
            depth: 0,
            tokens: Vec::new(),
        }
    }

    /// Tokenize the entire input
    pub fn tokenize(&mut self) -> Result<Vec<Token>, LexError> {
        let mut at_line_start = true;

        loop {
            if at_line_start {
                at_line_start = false;
                let width = self.indentation();
                match self.peek() {
                    None => break,
                    Some('\n') | Some('\r') => {
                        self.advance();
                        at_line_start = true;
                        continue;
                    }
                    Some('#') => {
                        self.comment_line(width)?;
                        at_line_start = true;
                        continue;
                    }
                    Some(_) => self.indent_to(width, true)?,
                }
            }

            while matches!(self.peek(), Some(' ') | Some('\t') | Some('\r') | Some('\x0c')) {
                self.advance();
            }

            match self.peek() {
                None => break,
                Some('\n') => {
                    let loc = self.current_location();
                    self.advance();
                    if self.depth == 0 {
                        self.tokens.push(Token::Newline(loc));
                        at_line_start = true;
                    }
                }
                Some('#') => self.skip_to_line_end(),
                Some('\\') if self.peek_ahead(1) == Some('\n') => {
                    self.advance();
                    self.advance();
                }
                Some(_) => {
                    let token = self.next_token()?;
                    self.tokens.push(token);
                }
            }
        }

        let end = self.current_location();
        if self.depth > 0 {
            return Err(LexError {
                message: "Unexpected end of file inside brackets".to_string(),
                location: end,
            });
        }
        if !matches!(self.tokens.last(), None | Some(Token::Newline(_))) {
            self.tokens.push(Token::Newline(end));
        }
        while self.indents.len() > 1 {
            self.indents.pop();
            self.tokens.push(Token::Dedent(end));
        }
        self.tokens.push(Token::Eof(end));

        Ok(std::mem::take(&mut self.tokens))
    }

    /// Consume leading whitespace and return its width (tabs stop every 8 columns).
    fn indentation(&mut self) -> usize {
        let mut width = 0;
        loop {
            match self.peek() {
                Some(' ') => width += 1,
                Some('\t') => width = (width / 8 + 1) * 8,
                Some('\x0c') => {}
                _ => return width,
            }
            self.advance();
        }
    }

    /// Emit indent or dedent tokens for a line starting at `width`.
    ///
    /// With `strict`, a dedent must land exactly on an enclosing level.
    fn indent_to(&mut self, width: usize, strict: bool) -> Result<(), LexError> {
        let loc = self.current_location();
        let current = self.current_indent();
        if width > current {
            if self.indents.len() > MAX_BLOCK_NESTING {
                return Err(LexError {
                    message: "Too many levels of indentation".to_string(),
                    location: loc,
                });
            }
            self.indents.push(width);
            self.tokens.push(Token::Indent(loc));
            return Ok(());
        }
        while width < self.current_indent() {
            self.indents.pop();
            self.tokens.push(Token::Dedent(loc));
        }
        if strict && width != self.current_indent() {
            return Err(LexError {
                message: "Unindent does not match any outer indentation level".to_string(),
                location: loc,
            });
        }
        Ok(())
    }

    fn current_indent(&self) -> usize {
        self.indents.last().copied().unwrap_or(0)
    }

    /// A comment on its own line. It only opens a block right after a `:`
    /// line; deeper indentation elsewhere keeps it in the current block.
    fn comment_line(&mut self, width: usize) -> Result<(), LexError> {
        let loc = self.current_location();
        let opens_block = matches!(
            self.tokens.as_slice(),
            [.., Token::Colon(_), Token::Newline(_)]
        );
        if width <= self.current_indent() || opens_block {
            self.indent_to(width, false)?;
        }

        self.advance(); // skip '#'
        let mut text = String::new();
        while let Some(ch) = self.peek() {
            if ch == '\n' {
                break;
            }
            text.push(ch);
            self.advance();
        }
        let text = text.trim_end();
        let text = text.strip_prefix(' ').unwrap_or(text);
        self.tokens.push(Token::Comment(text.to_string(), loc));
        self.tokens.push(Token::Newline(self.current_location()));
        self.advance(); // skip '\n'
        Ok(())
    }

    fn skip_to_line_end(&mut self) {
        while let Some(ch) = self.peek() {
            if ch == '\n' {
                break;
            }
            self.advance();
        }
    }

    /// Get next token
    fn next_token(&mut self) -> Result<Token, LexError> {
        let loc = self.current_location();
        let ch = self.peek().ok_or_else(|| LexError {
            message: "Unexpected end of file".to_string(),
            location: loc,
        })?;

        match ch {
            '"' | '\'' => self.string_literal(loc, false),
            '0'..='9' => self.number_literal(loc),
            '.' if self.peek_ahead(1).is_some_and(|c| c.is_ascii_digit()) => self.number_literal(loc),
            c if c.is_alphabetic() || c == '_' => self.identifier_or_keyword(loc),
            _ => self.punctuation(loc),
        }
    }

    fn punctuation(&mut self, loc: SourceLocation) -> Result<Token, LexError> {
        if let Some(op) = AUGMENTED.iter().copied().find(|op| self.matches_at(op)) {
            self.skip(op.len());
            return Ok(Token::AugAssign(op, loc));
        }
        if self.matches_at("->") {
            self.skip(2);
            return Ok(Token::Arrow(loc));
        }
        if let Some(op) = OPERATORS.iter().copied().find(|op| self.matches_at(op)) {
            self.skip(op.len());
            return Ok(Token::Operator(op, loc));
        }

        let ch = self.advance().ok_or_else(|| LexError {
            message: "Unexpected end of file".to_string(),
            location: loc,
        })?;
        let token = match ch {
            '=' => Token::Eq(loc),
            '.' => Token::Dot(loc),
            ':' => Token::Colon(loc),
            ',' => Token::Comma(loc),
            ';' => Token::Semicolon(loc),
            '(' | '[' | '{' => {
                self.depth += 1;
                match ch {
                    '(' => Token::LParen(loc),
                    '[' => Token::LBracket(loc),
                    _ => Token::LBrace(loc),
                }
            }
            ')' | ']' | '}' => {
                self.depth = self.depth.saturating_sub(1);
                match ch {
                    ')' => Token::RParen(loc),
                    ']' => Token::RBracket(loc),
                    _ => Token::RBrace(loc),
                }
            }
            _ => {
                return Err(LexError {
                    message: format!("Unexpected character: '{}'", ch),
                    location: loc,
                })
            }
        };
        Ok(token)
    }

    /// Parse a quoted string; the opening quote is the current character.
    fn string_literal(&mut self, loc: SourceLocation, raw: bool) -> Result<Token, LexError> {
        let quote = self.advance().unwrap_or('\'');
        let triple = self.peek() == Some(quote) && self.peek_ahead(1) == Some(quote);
        if triple {
            self.skip(2);
        }

        let mut string = String::new();
        loop {
            let ch = match self.peek() {
                Some('\n') if !triple => None,
                other => other,
            }
            .ok_or_else(|| LexError {
                message: "Unterminated string literal".to_string(),
                location: loc,
            })?;

            if ch == quote {
                if !triple {
                    self.advance();
                    break;
                }
                if self.peek_ahead(1) == Some(quote) && self.peek_ahead(2) == Some(quote) {
                    self.skip(3);
                    break;
                }
            }

            self.advance();
            if ch == '\\' {
                let escaped = self.advance().ok_or_else(|| LexError {
                    message: "Unexpected end of file in string literal".to_string(),
                    location: self.current_location(),
                })?;
                if raw {
                    string.push('\\');
                    string.push(escaped);
                } else {
                    self.unescape(escaped, &mut string)?;
                }
            } else {
                string.push(ch);
            }
        }

        Ok(Token::StringLiteral(string, loc))
    }

    fn unescape(&mut self, escaped: char, out: &mut String) -> Result<(), LexError> {
        let ch = match escaped {
            '\n' => return Ok(()),
            'n' => '\n',
            't' => '\t',
            'r' => '\r',
            '0' => '\0',
            'a' => '\x07',
            'b' => '\x08',
            'f' => '\x0c',
            'v' => '\x0b',
            '\\' | '\'' | '"' => escaped,
            'x' => self.hex_escape(2)?,
            'u' => self.hex_escape(4)?,
            'U' => self.hex_escape(8)?,
            other => {
                out.push('\\');
                other
            }
        };
        out.push(ch);
        Ok(())
    }

    fn hex_escape(&mut self, digits: usize) -> Result<char, LexError> {
        let loc = self.current_location();
        let mut hex = String::new();
        for _ in 0..digits {
            match self.peek() {
                Some(c) if c.is_ascii_hexdigit() => {
                    hex.push(c);
                    self.advance();
                }
                _ => break,
            }
        }
        u32::from_str_radix(&hex, 16)
            .ok()
            .filter(|_| hex.len() == digits)
            .and_then(char::from_u32)
            .ok_or_else(|| LexError {
                message: format!("Invalid escape sequence: \\{}", hex),
                location: loc,
            })
    }

    /// Parse an int or float literal
    fn number_literal(&mut self, loc: SourceLocation) -> Result<Token, LexError> {
        if self.peek() == Some('0') {
            let radix = match self.peek_ahead(1) {
                Some('x') | Some('X') => Some(16),
                Some('o') | Some('O') => Some(8),
                Some('b') | Some('B') => Some(2),
                _ => None,
            };
            if let Some(radix) = radix {
                self.skip(2);
                let digits = self.take_while(|c| c.is_ascii_alphanumeric() || c == '_');
                let value = i64::from_str_radix(&digits.replace('_', ""), radix).map_err(|_| LexError {
                    message: format!("Invalid integer literal: {}", digits),
                    location: loc,
                })?;
                return Ok(Token::IntLiteral(value, loc));
            }
        }

        let mut text = self.take_while(|c| c.is_ascii_digit() || c == '_');
        let mut is_float = false;
        if self.peek() == Some('.') {
            is_float = true;
            self.advance();
            text.push('.');
            text.push_str(&self.take_while(|c| c.is_ascii_digit() || c == '_'));
        }
        if matches!(self.peek(), Some('e') | Some('E')) {
            let signed = matches!(self.peek_ahead(1), Some('+') | Some('-'));
            let digit_at = if signed { 2 } else { 1 };
            if self.peek_ahead(digit_at).is_some_and(|c| c.is_ascii_digit()) {
                is_float = true;
                text.push('e');
                self.skip(digit_at);
                if signed {
                    text.push(self.input[self.position - 1]);
                }
                text.push_str(&self.take_while(|c| c.is_ascii_digit() || c == '_'));
            }
        }

        if self.peek().is_some_and(|c| c.is_alphanumeric() || c == '_') {
            return Err(LexError {
                message: format!("Invalid decimal literal: {}{}", text, self.peek().unwrap_or(' ')),
                location: loc,
            });
        }

        let clean = text.replace('_', "");
        if is_float {
            let value = clean.parse::<f64>().map_err(|_| LexError {
                message: format!("Invalid float literal: {}", text),
                location: loc,
            })?;
            Ok(Token::FloatLiteral(value, loc))
        } else {
            let value = clean.parse::<i64>().map_err(|_| LexError {
                message: format!("Integer literal too large: {}", text),
                location: loc,
            })?;
            Ok(Token::IntLiteral(value, loc))
        }
    }

    /// Parse identifier or keyword
    fn identifier_or_keyword(&mut self, loc: SourceLocation) -> Result<Token, LexError> {
        let ident = self.take_while(|c| c.is_alphanumeric() || c == '_');

        if matches!(self.peek(), Some('"') | Some('\'')) {
            match ident.to_ascii_lowercase().as_str() {
                "r" => return self.string_literal(loc, true),
                "u" => return self.string_literal(loc, false),
                "f" | "b" | "rb" | "br" | "fr" | "rf" => {
                    return Err(LexError {
                        message: format!("String prefix '{}' is not supported", ident),
                        location: loc,
                    })
                }
                _ => {}
            }
        }

        let token = match ident.as_str() {
            "def" => Token::Def(loc),
            "return" => Token::Return(loc),
            "if" => Token::If(loc),
            "elif" => Token::Elif(loc),
            "else" => Token::Else(loc),
            "while" => Token::While(loc),
            "for" => Token::For(loc),
            "in" => Token::In(loc),
            "break" => Token::Break(loc),
            "continue" => Token::Continue(loc),
            "pass" => Token::Pass(loc),
            "import" => Token::Import(loc),
            "from" => Token::From(loc),
            "as" => Token::As(loc),
            "and" => Token::And(loc),
            "or" => Token::Or(loc),
            "not" => Token::Not(loc),
            "is" => Token::Is(loc),
            "True" => Token::True(loc),
            "False" => Token::False(loc),
            "None" => Token::None(loc),
            other => match RESERVED.iter().copied().find(|keyword| *keyword == other) {
                Some(keyword) => Token::Reserved(keyword, loc),
                None => Token::Ident(ident, loc),
            },
        };

        Ok(token)
    }

    fn take_while(&mut self, accept: impl Fn(char) -> bool) -> String {
        let mut text = String::new();
        while let Some(ch) = self.peek() {
            if !accept(ch) {
                break;
            }
            text.push(ch);
            self.advance();
        }
        text
    }

    fn matches_at(&self, symbol: &str) -> bool {
        symbol
            .chars()
            .enumerate()
            .all(|(i, c)| self.peek_ahead(i) == Some(c))
    }

    fn skip(&mut self, count: usize) {
        for _ in 0..count {
            self.advance();
        }
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
        let ch = self.peek()?;
        self.position += 1;

        if ch == '\n' {
            self.line += 1;
            self.column = 1;
        } else {
            self.column += 1;
        }

        Some(ch)
    }

    /// Get current source location
    fn current_location(&self) -> SourceLocation {
        SourceLocation::new(self.line, self.column)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn lex(source: &str) -> Vec<Token> {
        Lexer::new(source).tokenize().unwrap()
    }

    #[test]
    fn test_simple_tokens() {
        let tokens = lex("x = foo(1, 2.5)\n");

        assert!(matches!(tokens[0], Token::Ident(ref s, _) if s == "x"));
        assert!(matches!(tokens[1], Token::Eq(_)));
        assert!(matches!(tokens[2], Token::Ident(ref s, _) if s == "foo"));
        assert!(matches!(tokens[3], Token::LParen(_)));
        assert!(matches!(tokens[4], Token::IntLiteral(1, _)));
        assert!(matches!(tokens[5], Token::Comma(_)));
        assert!(matches!(tokens[6], Token::FloatLiteral(f, _) if f == 2.5));
        assert!(matches!(tokens[7], Token::RParen(_)));
        assert!(matches!(tokens[8], Token::Newline(_)));
        assert!(matches!(tokens[9], Token::Eof(_)));
    }

    #[test]
    fn test_operators() {
        let tokens = lex("a ** b // c != d += e -> f");

        assert!(matches!(tokens[1], Token::Operator("**", _)));
        assert!(matches!(tokens[3], Token::Operator("//", _)));
        assert!(matches!(tokens[5], Token::Operator("!=", _)));
        assert!(matches!(tokens[7], Token::AugAssign("+=", _)));
        assert!(matches!(tokens[9], Token::Arrow(_)));
    }

    #[test]
    fn test_indentation() {
        let tokens = lex("if x:\n    y\n\n    z\nw\n");
        let kinds: Vec<String> = tokens.iter().map(|t| t.to_string()).collect();
        assert_eq!(
            kinds,
            vec![
                "'if'",
                "identifier 'x'",
                "':'",
                "end of line",
                "indent",
                "identifier 'y'",
                "end of line",
                "identifier 'z'",
                "end of line",
                "dedent",
                "identifier 'w'",
                "end of line",
                "end of file",
            ]
        );
    }

    #[test]
    fn test_bad_dedent() {
        let err = Lexer::new("if x:\n    y\n  z\n").tokenize().unwrap_err();
        assert_eq!(err.location.line, 3);
    }

    #[test]
    fn test_indentation_depth_is_limited() {
        let nested = |levels: usize| {
            let mut source = String::new();
            for level in 0..levels {
                source.push_str(&" ".repeat(level));
                source.push_str("if x:\n");
            }
            source.push_str(&" ".repeat(levels));
            source.push_str("y\n");
            source
        };

        assert!(Lexer::new(&nested(MAX_BLOCK_NESTING)).tokenize().is_ok());
        let err = Lexer::new(&nested(MAX_BLOCK_NESTING + 1)).tokenize().unwrap_err();
        assert_eq!(err.message, "Too many levels of indentation");
        assert_eq!(err.location.line, MAX_BLOCK_NESTING + 2);
    }

    #[test]
    fn test_brackets_join_lines() {
        let tokens = lex("x = [1,\n  2]\n");
        assert!(!tokens[..7].iter().any(|t| matches!(t, Token::Newline(_) | Token::Indent(_))));
        assert_eq!(tokens.len(), 9);
    }

    #[test]
    fn test_comments() {
        let tokens = lex("# heading\nx = 1  # trailing\n");

        assert!(matches!(tokens[0], Token::Comment(ref s, _) if s == "heading"));
        assert!(matches!(tokens[1], Token::Newline(_)));
        assert!(matches!(tokens[2], Token::Ident(ref s, _) if s == "x"));
        assert!(matches!(tokens[5], Token::Newline(_)));
        assert!(matches!(tokens[6], Token::Eof(_)));
    }

    #[test]
    fn test_string_literals() {
        let tokens = lex(r#"'it\'s' "a\tb" r'\n' '\x41'"#);
        let strings: Vec<&str> = tokens
            .iter()
            .filter_map(|t| match t {
                Token::StringLiteral(s, _) => Some(s.as_str()),
                _ => None,
            })
            .collect();
        assert_eq!(strings, vec!["it's", "a\tb", "\\n", "A"]);
    }

    #[test]
    fn test_numbers() {
        let tokens = lex("10 0x1f 1_000 .5 1e3 2.5e-3");
        assert!(matches!(tokens[0], Token::IntLiteral(10, _)));
        assert!(matches!(tokens[1], Token::IntLiteral(31, _)));
        assert!(matches!(tokens[2], Token::IntLiteral(1000, _)));
        assert!(matches!(tokens[3], Token::FloatLiteral(f, _) if f == 0.5));
        assert!(matches!(tokens[4], Token::FloatLiteral(f, _) if f == 1000.0));
        assert!(matches!(tokens[5], Token::FloatLiteral(f, _) if f == 0.0025));
    }

    #[test]
    fn test_keywords() {
        let tokens = lex("not in is None class");
        assert!(matches!(tokens[0], Token::Not(_)));
        assert!(matches!(tokens[1], Token::In(_)));
        assert!(matches!(tokens[2], Token::Is(_)));
        assert!(matches!(tokens[3], Token::None(_)));
        assert!(matches!(tokens[4], Token::Reserved("class", _)));
    }

    #[test]
    fn test_unterminated_string() {
        assert!(Lexer::new("'abc\n").tokenize().is_err());
    }
}
