//! Expression reading
//!
//! Expressions are not resolved into trees here. They are read into the flat
//! form the editor stores: operand tokens alternating with operator markers,
//! with any prefix markers in front of their operand. Operator precedence is
//! applied later by the compiler.
//!
//! `is not` and `not in` are read as single two-word markers.

use crate::parser::lexer::Token;
use crate::parser::parse::{ParseError, Parser};
use crate::tree::ast::{self, Argument, Expression, Number, SourceLocation};

impl Parser {
    /// Comma-separated expressions; more than one, or a trailing comma, forms a tuple.
    pub(crate) fn parse_expression_list(&mut self) -> Result<Expression, ParseError> {
        let first = self.parse_expression()?;
        if !self.at(Token::Comma) {
            return Ok(first);
        }

        let mut elements = vec![first];
        while self.eat(Token::Comma) {
            if self.ends_expression_list() {
                break;
            }
            elements.push(self.parse_expression()?);
        }
        Ok(Expression::new(vec![ast::Token::Tuple(elements)]))
    }

    fn ends_expression_list(&self) -> bool {
        matches!(
            self.peek(),
            Token::Newline(_) | Token::Eof(_) | Token::Eq(_) | Token::Colon(_) | Token::Semicolon(_)
        )
    }

    /// One expression as a flat sequence of operands and operator markers.
    pub(crate) fn parse_expression(&mut self) -> Result<Expression, ParseError> {
        let outer = self.depth;
        self.nest()?;
        let expression = self.parse_flat_expression();
        self.depth = outer;
        expression
    }

    fn parse_flat_expression(&mut self) -> Result<Expression, ParseError> {
        let mut tokens = Vec::new();
        loop {
            while let Some(symbol) = self.unary_marker() {
                self.advance();
                tokens.push(ast::Token::Operator(symbol.to_string()));
            }
            tokens.push(self.parse_operand()?);

            let Some((symbol, width)) = self.binary_marker() else {
                break;
            };
            for _ in 0..width {
                self.advance();
            }
            tokens.push(ast::Token::Operator(symbol.to_string()));
        }

        match self.peek() {
            Token::If(loc) => Err(ParseError::syntax("Conditional expressions are not supported", *loc)),
            Token::For(loc) => Err(ParseError::syntax("Comprehensions are not supported", *loc)),
            _ => Ok(Expression::new(tokens)),
        }
    }

    fn unary_marker(&self) -> Option<&'static str> {
        match self.peek() {
            Token::Operator(op @ ("-" | "+" | "~"), _) => Some(*op),
            Token::Not(_) => Some("not"),
            _ => None,
        }
    }

    /// Binary operator at the cursor and the number of tokens it spans.
    fn binary_marker(&self) -> Option<(&'static str, usize)> {
        let next_is = |test: fn(&Token) -> bool| self.peek_ahead(1).is_some_and(test);
        match self.peek() {
            Token::Operator("~", _) => None,
            Token::Operator(op, _) => Some((*op, 1)),
            Token::And(_) => Some(("and", 1)),
            Token::Or(_) => Some(("or", 1)),
            Token::In(_) => Some(("in", 1)),
            Token::Is(_) if next_is(|t| matches!(t, Token::Not(_))) => Some(("is not", 2)),
            Token::Is(_) => Some(("is", 1)),
            Token::Not(_) if next_is(|t| matches!(t, Token::In(_))) => Some(("not in", 2)),
            _ => None,
        }
    }

    /// A literal, name, call or display, with any trailing member accesses,
    /// method calls and subscripts.
    pub(crate) fn parse_operand(&mut self) -> Result<ast::Token, ParseError> {
        let token = self.peek().clone();
        let atom = match token {
            Token::IntLiteral(n, _) => {
                self.advance();
                ast::Token::Number(Number::Int(n))
            }
            Token::FloatLiteral(f, _) => {
                self.advance();
                ast::Token::Number(Number::Float(f))
            }
            Token::StringLiteral(mut text, _) => {
                self.advance();
                // Adjacent literals concatenate
                while let Token::StringLiteral(next, _) = self.peek() {
                    text.push_str(next);
                    self.advance();
                }
                ast::Token::Str(text)
            }
            Token::True(_) => {
                self.advance();
                ast::Token::Bool(true)
            }
            Token::False(_) => {
                self.advance();
                ast::Token::Bool(false)
            }
            Token::None(_) => {
                self.advance();
                ast::Token::None
            }
            Token::Ident(name, _) => {
                self.advance();
                if self.eat(Token::LParen) {
                    let args = self.parse_arguments()?;
                    ast::Token::CallVariable { name, args }
                } else {
                    ast::Token::Identifier(name)
                }
            }
            Token::LParen(_) => self.parse_parenthesized()?,
            Token::LBracket(_) => {
                self.advance();
                ast::Token::List(self.parse_elements(Token::RBracket, "',' or ']'")?)
            }
            Token::LBrace(_) => self.parse_braces()?,
            Token::Reserved(keyword, loc) => {
                return Err(ParseError::syntax(format!("'{}' is not supported", keyword), loc))
            }
            _ => return Err(self.unexpected("an expression")),
        };

        let outer = self.depth;
        let operand = self.parse_postfix(atom);
        self.depth = outer;
        operand
    }

    fn parse_postfix(&mut self, mut current: ast::Token) -> Result<ast::Token, ParseError> {
        loop {
            match self.peek() {
                Token::Dot(_) => {
                    self.nest()?;
                    self.advance();
                    let member = self.expect_identifier()?;
                    let object = Box::new(current);
                    current = if self.eat(Token::LParen) {
                        let args = self.parse_arguments()?;
                        ast::Token::CallMember { object, member, args }
                    } else {
                        ast::Token::Member { object, member }
                    };
                }
                Token::LBracket(_) => {
                    self.nest()?;
                    self.advance();
                    current = self.parse_subscript(current)?;
                }
                Token::LParen(loc) => {
                    return Err(ParseError::syntax("Only names and attributes can be called", *loc));
                }
                _ => return Ok(current),
            }
        }
    }

    /// `target[key]` or `target[start:end]`, after the opening bracket.
    fn parse_subscript(&mut self, target: ast::Token) -> Result<ast::Token, ParseError> {
        let start = if self.at(Token::Colon) {
            Expression::default()
        } else {
            self.parse_expression()?
        };

        if self.eat(Token::Colon) {
            let end = if self.at(Token::Colon) || self.at(Token::RBracket) {
                Expression::default()
            } else {
                self.parse_expression()?
            };
            if let Token::Colon(loc) = self.peek() {
                return Err(ParseError::unsupported("slice steps", *loc));
            }
            self.expect(Token::RBracket, "']'")?;
            return Ok(ast::Token::Slice {
                target: Box::new(target),
                start,
                end,
            });
        }

        let key = if self.at(Token::Comma) {
            let mut elements = vec![start];
            while self.eat(Token::Comma) {
                if self.at(Token::RBracket) {
                    break;
                }
                elements.push(self.parse_expression()?);
            }
            Expression::new(vec![ast::Token::Tuple(elements)])
        } else {
            start
        };
        self.expect(Token::RBracket, "']'")?;
        Ok(ast::Token::Subscript {
            target: Box::new(target),
            key,
        })
    }

    /// Call arguments, after the opening parenthesis.
    fn parse_arguments(&mut self) -> Result<Vec<Argument>, ParseError> {
        let mut args = Vec::new();
        let mut seen_keyword = false;

        while !self.eat(Token::RParen) {
            let loc = self.current_location();
            if let Token::Operator("*" | "**", _) = self.peek() {
                return Err(ParseError::syntax("Argument unpacking is not supported", loc));
            }

            let is_keyword = matches!(self.peek(), Token::Ident(..)) && matches!(self.peek_ahead(1), Some(Token::Eq(_)));
            if is_keyword {
                let name = self.expect_identifier()?;
                self.advance(); // '='
                let value = self.parse_expression()?;
                args.push(Argument::Keyword { name, value });
                seen_keyword = true;
            } else if seen_keyword {
                return Err(ParseError::syntax("Positional argument follows keyword argument", loc));
            } else {
                args.push(Argument::Positional(self.parse_expression()?));
            }

            if !self.eat(Token::Comma) {
                self.expect(Token::RParen, "',' or ')'")?;
                break;
            }
        }
        Ok(args)
    }

    /// Comma-separated elements up to `closing`, after the opening bracket.
    fn parse_elements(
        &mut self,
        closing: fn(SourceLocation) -> Token,
        expected: &str,
    ) -> Result<Vec<Expression>, ParseError> {
        let mut elements = Vec::new();
        while !self.eat(closing) {
            elements.push(self.parse_expression()?);
            if !self.eat(Token::Comma) {
                self.expect(closing, expected)?;
                break;
            }
        }
        Ok(elements)
    }

    /// `()`, `(expr)` or a parenthesized tuple.
    fn parse_parenthesized(&mut self) -> Result<ast::Token, ParseError> {
        self.advance(); // '('
        if self.eat(Token::RParen) {
            return Ok(ast::Token::Tuple(Vec::new()));
        }

        let first = self.parse_expression()?;
        if self.eat(Token::RParen) {
            return Ok(ast::Token::Bracket(first));
        }
        if !self.at(Token::Comma) {
            return Err(self.unexpected("',' or ')'"));
        }

        let mut elements = vec![first];
        while self.eat(Token::Comma) {
            if self.at(Token::RParen) {
                break;
            }
            elements.push(self.parse_expression()?);
        }
        self.expect(Token::RParen, "')'")?;
        Ok(ast::Token::Tuple(elements))
    }

    /// A dict or set display.
    fn parse_braces(&mut self) -> Result<ast::Token, ParseError> {
        self.advance(); // '{'
        if self.eat(Token::RBrace) {
            return Ok(ast::Token::Dict(Vec::new()));
        }

        let first = self.parse_expression()?;
        if !self.eat(Token::Colon) {
            let mut elements = vec![first];
            while self.eat(Token::Comma) {
                if self.at(Token::RBrace) {
                    break;
                }
                elements.push(self.parse_expression()?);
            }
            self.expect(Token::RBrace, "',' or '}'")?;
            return Ok(ast::Token::Set(elements));
        }

        let mut pairs = vec![(first, self.parse_expression()?)];
        while self.eat(Token::Comma) {
            if self.at(Token::RBrace) {
                break;
            }
            let key = self.parse_expression()?;
            self.expect(Token::Colon, "':'")?;
            pairs.push((key, self.parse_expression()?));
        }
        self.expect(Token::RBrace, "',' or '}'")?;
        Ok(ast::Token::Dict(pairs))
    }
}
