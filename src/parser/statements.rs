//! Statement parsing
//!
//! Compound statements (`def`, `if`, `while`, `for`) read a header and an
//! indented block; simple statements end at the line break. `pass` and blank
//! lines leave no statement behind.

use crate::parser::lexer::Token;
use crate::parser::parse::{ParseError, Parser};
use crate::tree::ast::{self, ElseBlock, Expression, FunctionDeclaration, Statement};

impl Parser {
    /// Parse one statement; `None` for statements that leave nothing behind.
    pub(crate) fn parse_statement(&mut self) -> Result<Option<Statement>, ParseError> {
        let loc = self.current_location();
        let statement = match self.peek() {
            Token::Comment(text, _) => {
                let text = text.clone();
                self.advance();
                self.expect_newline()?;
                Statement::Comment(text)
            }
            Token::Def(_) => self.parse_function()?,
            Token::If(_) => self.parse_if()?,
            Token::While(_) => self.parse_while()?,
            Token::For(_) => self.parse_for()?,
            Token::Elif(_) | Token::Else(_) => {
                return Err(ParseError::syntax(format!("{} without a matching 'if'", self.peek()), loc))
            }
            Token::Indent(_) => return Err(ParseError::syntax("Unexpected indent", loc)),
            Token::Reserved(keyword, _) => {
                return Err(ParseError::syntax(format!("'{}' is not supported", keyword), loc))
            }
            _ => return self.parse_simple_statement(),
        };
        Ok(Some(statement))
    }

    /// A statement that fits on one line, including its line break.
    fn parse_simple_statement(&mut self) -> Result<Option<Statement>, ParseError> {
        let statement = match self.peek() {
            Token::Pass(_) => {
                self.advance();
                None
            }
            Token::Break(_) => {
                self.advance();
                Some(Statement::Break)
            }
            Token::Continue(_) => {
                self.advance();
                Some(Statement::Continue)
            }
            Token::Return(_) => {
                self.advance();
                let value = if self.at(Token::Newline) {
                    Expression::default()
                } else {
                    self.parse_expression_list()?
                };
                Some(Statement::Return(value))
            }
            Token::Import(_) => Some(self.parse_import()?),
            Token::From(_) => Some(self.parse_from_import()?),
            _ => Some(self.parse_expression_statement()?),
        };
        self.expect_newline()?;
        Ok(statement)
    }

    /// `:` followed by an indented block, or by one simple statement on the same line.
    pub(crate) fn parse_block(&mut self) -> Result<Vec<Statement>, ParseError> {
        self.expect(Token::Colon, "':'")?;
        if !self.eat(Token::Newline) {
            return Ok(self.parse_simple_statement()?.into_iter().collect());
        }
        if !self.eat(Token::Indent) {
            return Err(ParseError::syntax("Expected an indented block", self.current_location()));
        }

        let mut body = Vec::new();
        while !self.eat(Token::Dedent) {
            if self.is_at_end() {
                return Err(self.unexpected("dedent"));
            }
            if let Some(statement) = self.parse_statement()? {
                body.push(statement);
            }
        }
        Ok(body)
    }

    fn parse_function(&mut self) -> Result<Statement, ParseError> {
        self.advance(); // 'def'
        let name = self.expect_identifier()?;
        self.expect(Token::LParen, "'(' after the function name")?;

        let mut params: Vec<String> = Vec::new();
        while !self.eat(Token::RParen) {
            let loc = self.current_location();
            match self.peek() {
                Token::Operator("*", _) | Token::Operator("**", _) => {
                    let bare = matches!(self.peek_ahead(1), Some(Token::Comma(_)) | Some(Token::RParen(_)));
                    let feature = if bare {
                        "keyword-only parameters"
                    } else {
                        "*args and **kwargs parameters"
                    };
                    return Err(ParseError::unsupported(feature, loc));
                }
                Token::Operator("/", _) => {
                    return Err(ParseError::unsupported("position-only parameters", loc));
                }
                _ => {}
            }

            let param = self.expect_identifier()?;
            if self.at(Token::Eq) {
                return Err(ParseError::unsupported("default parameter values", self.current_location()));
            }
            if self.at(Token::Colon) {
                return Err(ParseError::unsupported("parameter annotations", self.current_location()));
            }
            if params.contains(&param) {
                return Err(ParseError::syntax(
                    format!("Duplicate argument '{}' in function definition", param),
                    loc,
                ));
            }
            params.push(param);

            if !self.eat(Token::Comma) {
                self.expect(Token::RParen, "',' or ')'")?;
                break;
            }
        }
        if self.at(Token::Arrow) {
            return Err(ParseError::unsupported("return annotations", self.current_location()));
        }

        let body = self.parse_block()?;
        Ok(Statement::FunctionDeclaration(FunctionDeclaration {
            id: Some(name.clone()),
            name,
            params,
            body,
        }))
    }

    fn parse_if(&mut self) -> Result<Statement, ParseError> {
        self.advance(); // 'if'
        let condition = self.parse_expression()?;
        let body = self.parse_block()?;

        let mut else_blocks = Vec::new();
        loop {
            match self.peek() {
                Token::Elif(_) => {
                    self.advance();
                    let condition = self.parse_expression()?;
                    let body = self.parse_block()?;
                    else_blocks.push(ElseBlock::Elif { condition, body });
                }
                Token::Else(_) => {
                    self.advance();
                    let body = self.parse_block()?;
                    else_blocks.push(ElseBlock::Else { body });
                    break;
                }
                _ => break,
            }
        }

        Ok(Statement::If {
            condition,
            body,
            else_blocks,
        })
    }

    fn parse_while(&mut self) -> Result<Statement, ParseError> {
        self.advance(); // 'while'
        let condition = self.parse_expression()?;
        let body = self.parse_block()?;
        self.reject_loop_else()?;
        Ok(Statement::While { condition, body })
    }

    fn parse_for(&mut self) -> Result<Statement, ParseError> {
        self.advance(); // 'for'
        let targets = self.parse_targets()?;
        self.expect(Token::In, "'in'")?;
        let iterable = self.parse_expression_list()?;
        let body = self.parse_block()?;
        self.reject_loop_else()?;
        Ok(Statement::For {
            targets,
            iterable,
            body,
        })
    }

    fn reject_loop_else(&self) -> Result<(), ParseError> {
        match self.peek() {
            Token::Else(loc) => Err(ParseError::unsupported("else clauses on loops", *loc)),
            _ => Ok(()),
        }
    }

    fn parse_import(&mut self) -> Result<Statement, ParseError> {
        self.advance(); // 'import'
        let mut modules = vec![self.parse_dotted_name()?];
        while self.eat(Token::Comma) {
            modules.push(self.parse_dotted_name()?);
        }
        Ok(Statement::Import(modules))
    }

    fn parse_from_import(&mut self) -> Result<Statement, ParseError> {
        self.advance(); // 'from'
        let module = self.parse_dotted_name()?;
        self.expect(Token::Import, "'import'")?;

        let parenthesized = self.eat(Token::LParen);
        let mut names = Vec::new();
        loop {
            if let Token::Operator("*", loc) = self.peek() {
                return Err(ParseError::syntax("Wildcard imports are not supported", *loc));
            }
            names.push(self.expect_identifier()?);
            self.reject_alias()?;
            if !self.eat(Token::Comma) {
                break;
            }
            if parenthesized && self.at(Token::RParen) {
                break;
            }
        }
        if parenthesized {
            self.expect(Token::RParen, "')'")?;
        }

        Ok(Statement::FromImport { module, names })
    }

    fn parse_dotted_name(&mut self) -> Result<String, ParseError> {
        let mut name = self.expect_identifier()?;
        while self.eat(Token::Dot) {
            name.push('.');
            name.push_str(&self.expect_identifier()?);
        }
        self.reject_alias()?;
        Ok(name)
    }

    fn reject_alias(&self) -> Result<(), ParseError> {
        match self.peek() {
            Token::As(loc) => Err(ParseError::unsupported("import aliases", *loc)),
            _ => Ok(()),
        }
    }

    /// An expression statement, or an assignment when the line holds a
    /// top-level `=`.
    fn parse_expression_statement(&mut self) -> Result<Statement, ParseError> {
        if !self.line_has_assignment()? {
            return Ok(Statement::Expression(self.parse_expression_list()?));
        }

        let targets = self.parse_targets()?;
        self.expect(Token::Eq, "'='")?;
        let value = self.parse_expression_list()?;
        Ok(Statement::Assignment { targets, value })
    }

    /// Scan the rest of the logical line for assignment operators outside brackets.
    fn line_has_assignment(&self) -> Result<bool, ParseError> {
        let mut depth = 0usize;
        let mut found = false;
        for token in &self.tokens[self.position..] {
            match token {
                Token::LParen(_) | Token::LBracket(_) | Token::LBrace(_) => depth += 1,
                Token::RParen(_) | Token::RBracket(_) | Token::RBrace(_) => depth = depth.saturating_sub(1),
                Token::Newline(_) | Token::Semicolon(_) | Token::Eof(_) => break,
                Token::Eq(loc) if depth == 0 => {
                    if found {
                        return Err(ParseError::unsupported("chained assignment", *loc));
                    }
                    found = true;
                }
                Token::AugAssign(_, loc) if depth == 0 => {
                    return Err(ParseError::unsupported("augmented assignment", *loc));
                }
                _ => {}
            }
        }
        Ok(found)
    }

    /// Comma-separated assignment targets (`x`, `a, b`, `items[i]`).
    pub(crate) fn parse_targets(&mut self) -> Result<Vec<ast::Token>, ParseError> {
        let mut targets = vec![self.parse_target()?];
        while self.eat(Token::Comma) {
            if self.at(Token::Eq) || self.at(Token::In) {
                break;
            }
            targets.push(self.parse_target()?);
        }
        Ok(targets)
    }

    fn parse_target(&mut self) -> Result<ast::Token, ParseError> {
        let loc = self.current_location();
        let target = self.parse_operand()?;
        match target {
            ast::Token::Identifier(_) | ast::Token::Subscript { .. } => Ok(target),
            ast::Token::Slice { .. } => Err(ParseError::unsupported("slice assignment", loc)),
            ast::Token::Member { .. } => Err(ParseError::syntax("Cannot assign to an attribute", loc)),
            _ => Err(ParseError::syntax("Cannot assign to this expression", loc)),
        }
    }
}

#[cfg(test)]
mod tests {
    use crate::parser::parse::{ParseError, Parser};
    use crate::tree::ast::{ElseBlock, Expression, Number, Statement, Token};

    fn parse(source: &str) -> Vec<Statement> {
        Parser::new(source).unwrap().parse_program().unwrap()
    }

    fn parse_err(source: &str) -> ParseError {
        Parser::new(source).unwrap().parse_program().unwrap_err()
    }

    fn name(s: &str) -> Token {
        Token::Identifier(s.to_string())
    }

    fn int(n: i64) -> Token {
        Token::Number(Number::Int(n))
    }

    #[test]
    fn test_assignment_forms() {
        let body = parse("x = 1\na, b = b, a\nitems[0] = x\n");
        assert_eq!(
            body[0],
            Statement::Assignment {
                targets: vec![name("x")],
                value: Expression::new(vec![int(1)]),
            }
        );
        assert_eq!(
            body[1],
            Statement::Assignment {
                targets: vec![name("a"), name("b")],
                value: Expression::new(vec![Token::Tuple(vec![
                    Expression::new(vec![name("b")]),
                    Expression::new(vec![name("a")]),
                ])]),
            }
        );
        assert!(matches!(&body[2], Statement::Assignment { targets, .. } if matches!(targets[0], Token::Subscript { .. })));
    }

    #[test]
    fn test_if_chain() {
        let body = parse("if x:\n    a\nelif y:\n    b\nelse:\n    c\n");
        match &body[0] {
            Statement::If { else_blocks, .. } => {
                assert_eq!(else_blocks.len(), 2);
                assert!(matches!(else_blocks[0], ElseBlock::Elif { .. }));
                assert!(matches!(else_blocks[1], ElseBlock::Else { .. }));
            }
            other => panic!("Expected if statement, got {:?}", other),
        }
    }

    #[test]
    fn test_for_loop_with_two_targets() {
        let body = parse("for i, ch in enumerate(s):\n    print(i)\n");
        match &body[0] {
            Statement::For { targets, body, .. } => {
                assert_eq!(targets, &vec![name("i"), name("ch")]);
                assert_eq!(body.len(), 1);
            }
            other => panic!("Expected for loop, got {:?}", other),
        }
    }

    #[test]
    fn test_single_line_block_and_pass() {
        let body = parse("while x: x = 0\nif y:\n    pass\n");
        assert!(matches!(&body[0], Statement::While { body, .. } if body.len() == 1));
        assert!(matches!(&body[1], Statement::If { body, .. } if body.is_empty()));
    }

    #[test]
    fn test_imports() {
        let body = parse("import math, os.path\nfrom string import (digits, ascii_letters,)\n");
        assert_eq!(body[0], Statement::Import(vec!["math".to_string(), "os.path".to_string()]));
        assert_eq!(
            body[1],
            Statement::FromImport {
                module: "string".to_string(),
                names: vec!["digits".to_string(), "ascii_letters".to_string()],
            }
        );
    }

    #[test]
    fn test_comment_statements() {
        let body = parse("def f():\n    # inside\n    return\n# outside\n");
        match &body[0] {
            Statement::FunctionDeclaration(func) => {
                assert_eq!(func.body[0], Statement::Comment("inside".to_string()));
                assert_eq!(func.body[1], Statement::Return(Expression::default()));
            }
            other => panic!("Expected function, got {:?}", other),
        }
        assert_eq!(body[1], Statement::Comment("outside".to_string()));
    }

    #[test]
    fn test_unsupported_constructs() {
        let cases = [
            ("def f(x=1):\n    pass\n", "default parameter values"),
            ("def f(*args):\n    pass\n", "*args and **kwargs parameters"),
            ("def f(a, *, b):\n    pass\n", "keyword-only parameters"),
            ("def f() -> int:\n    pass\n", "return annotations"),
            ("def f(x: int):\n    pass\n", "parameter annotations"),
            ("a = b = 1\n", "chained assignment"),
            ("x += 1\n", "augmented assignment"),
            ("x[1:2] = y\n", "slice assignment"),
            ("y = x[::2]\n", "slice steps"),
            ("import math as m\n", "import aliases"),
            ("while x:\n    pass\nelse:\n    pass\n", "else clauses on loops"),
        ];
        for (source, expected) in cases {
            match parse_err(source) {
                ParseError::Unsupported { feature, .. } => assert_eq!(feature, expected, "{}", source),
                other => panic!("{}: expected unsupported error, got {:?}", source, other),
            }
        }
    }

    #[test]
    fn test_syntax_errors() {
        for source in ["class A:\n    pass\n", "x = (1\n", "else:\n    pass\n", "1 = x\n", "x = 1; y = 2\n"] {
            let err = Parser::new(source).and_then(|mut p| p.parse_program()).unwrap_err();
            assert!(matches!(err, ParseError::Syntax { .. }), "{}: {:?}", source, err);
        }
    }
}
