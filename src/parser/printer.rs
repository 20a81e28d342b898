//! Source text generation
//!
//! Prints the typed program model as Python with four-space indentation. The
//! layout is the one statement line numbers refer to: one line per statement
//! or block header, and a `pass` line for every empty block.

use crate::memory::value::{float_repr, str_repr};
use crate::tree::ast::{Argument, ElseBlock, Expression, Number, Statement, Token};

const INDENT: &str = "    ";

/// Render top-level statements as source text.
pub fn generate_source(body: &[Statement]) -> String {
    let mut printer = Printer {
        out: String::new(),
        depth: 0,
    };
    for statement in body {
        printer.statement(statement);
    }
    printer.out
}

struct Printer {
    out: String,
    depth: usize,
}

impl Printer {
    fn line(&mut self, text: &str) {
        if !text.is_empty() {
            for _ in 0..self.depth {
                self.out.push_str(INDENT);
            }
            self.out.push_str(text);
        }
        self.out.push('\n');
    }

    fn block(&mut self, header: String, body: &[Statement]) {
        self.line(&header);
        self.depth += 1;
        if body.is_empty() {
            self.line("pass");
        }
        for statement in body {
            self.statement(statement);
        }
        self.depth -= 1;
    }

    fn statement(&mut self, statement: &Statement) {
        match statement {
            Statement::Blank => self.line(""),
            Statement::Comment(text) if text.is_empty() => self.line("#"),
            Statement::Comment(text) => self.line(&format!("# {}", text)),
            Statement::Expression(expr) => self.line(&expression(expr)),
            Statement::Assignment { targets, value } => {
                self.line(&format!("{} = {}", join(targets.iter().map(token)), expression(value)))
            }
            Statement::If {
                condition,
                body,
                else_blocks,
            } => {
                self.block(format!("if {}:", expression(condition)), body);
                for else_block in else_blocks {
                    match else_block {
                        ElseBlock::Elif { condition, body } => {
                            self.block(format!("elif {}:", expression(condition)), body)
                        }
                        ElseBlock::Else { body } => self.block("else:".to_string(), body),
                    }
                }
            }
            Statement::While { condition, body } => self.block(format!("while {}:", expression(condition)), body),
            Statement::For {
                targets,
                iterable,
                body,
            } => self.block(
                format!("for {} in {}:", join(targets.iter().map(token)), expression(iterable)),
                body,
            ),
            Statement::FunctionDeclaration(func) => {
                self.block(format!("def {}({}):", func.name, func.params.join(", ")), &func.body)
            }
            Statement::Return(value) if value.is_empty() => self.line("return"),
            Statement::Return(value) => self.line(&format!("return {}", expression(value))),
            Statement::Break => self.line("break"),
            Statement::Continue => self.line("continue"),
            Statement::Import(modules) => self.line(&format!("import {}", modules.join(", "))),
            Statement::FromImport { module, names } => {
                self.line(&format!("from {} import {}", module, names.join(", ")))
            }
        }
    }
}

/// Render a flat token sequence. A marker right after an operand is binary
/// and spaced; anywhere else it is a prefix and hugs what follows.
pub fn expression(expr: &Expression) -> String {
    let mut out = String::new();
    let mut after_operand = false;
    for item in &expr.tokens {
        match item {
            Token::Operator(symbol) if after_operand => {
                out.push(' ');
                out.push_str(symbol);
                out.push(' ');
                after_operand = false;
            }
            Token::Operator(symbol) => {
                out.push_str(symbol);
                if symbol.chars().all(char::is_alphabetic) {
                    out.push(' ');
                }
            }
            operand => {
                out.push_str(&token(operand));
                after_operand = true;
            }
        }
    }
    out
}

fn token(item: &Token) -> String {
    match item {
        Token::Operator(symbol) => symbol.clone(),
        Token::Number(Number::Int(i)) => i.to_string(),
        Token::Number(Number::Float(f)) if f.is_finite() => float_repr(*f),
        Token::Number(Number::Float(f)) => format!("float('{}')", float_repr(*f)),
        Token::Number(Number::Text(text)) => text.clone(),
        Token::Str(s) => str_repr(s),
        Token::Bool(true) => "True".to_string(),
        Token::Bool(false) => "False".to_string(),
        Token::None => "None".to_string(),
        Token::Identifier(name) => name.clone(),
        Token::CallVariable { name, args } => format!("{}({})", name, arguments(args)),
        Token::CallMember { object, member, args } => {
            format!("{}.{}({})", token(object), member, arguments(args))
        }
        Token::Member { object, member } => format!("{}.{}", token(object), member),
        Token::List(elements) => format!("[{}]", join(elements.iter().map(expression))),
        Token::Tuple(elements) if elements.len() == 1 => format!("({},)", expression(&elements[0])),
        Token::Tuple(elements) => format!("({})", join(elements.iter().map(expression))),
        Token::Set(elements) if elements.is_empty() => "set()".to_string(),
        Token::Set(elements) => format!("{{{}}}", join(elements.iter().map(expression))),
        Token::Dict(pairs) => format!(
            "{{{}}}",
            join(pairs
                .iter()
                .map(|(key, value)| format!("{}: {}", expression(key), expression(value))))
        ),
        Token::Subscript { target, key } => format!("{}[{}]", token(target), expression(key)),
        Token::Slice { target, start, end } => {
            format!("{}[{}:{}]", token(target), expression(start), expression(end))
        }
        Token::Bracket(inner) => format!("({})", expression(inner)),
    }
}

fn arguments(args: &[Argument]) -> String {
    join(args.iter().map(|arg| match arg {
        Argument::Positional(value) => expression(value),
        Argument::Keyword { name, value } => format!("{}={}", name, expression(value)),
    }))
}

fn join(items: impl Iterator<Item = String>) -> String {
    items.collect::<Vec<_>>().join(", ")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tree::ast::FunctionDeclaration;

    fn op(symbol: &str) -> Token {
        Token::Operator(symbol.to_string())
    }

    fn name(s: &str) -> Token {
        Token::Identifier(s.to_string())
    }

    fn expr(tokens: Vec<Token>) -> Expression {
        Expression::new(tokens)
    }

    #[test]
    fn test_operator_spacing() {
        let e = expr(vec![
            op("-"),
            name("a"),
            op("*"),
            op("not"),
            name("b"),
            op("is not"),
            Token::None,
        ]);
        assert_eq!(expression(&e), "-a * not b is not None");
    }

    #[test]
    fn test_literals() {
        let e = expr(vec![Token::Tuple(vec![
            expr(vec![Token::Number(Number::Float(1.0))]),
            expr(vec![Token::Str("it's".to_string())]),
            expr(vec![Token::Tuple(vec![expr(vec![Token::Bool(true)])])]),
            expr(vec![Token::Set(vec![])]),
        ])]);
        assert_eq!(expression(&e), "(1.0, \"it's\", (True,), set())");
    }

    #[test]
    fn test_blocks_and_empty_bodies() {
        let body = vec![
            Statement::FunctionDeclaration(FunctionDeclaration {
                name: "f".to_string(),
                id: Some("f".to_string()),
                params: vec!["a".to_string(), "b".to_string()],
                body: vec![Statement::While {
                    condition: expr(vec![name("a")]),
                    body: vec![],
                }],
            }),
            Statement::Blank,
            Statement::Comment("done".to_string()),
            Statement::Return(Expression::default()),
        ];
        assert_eq!(
            generate_source(&body),
            "def f(a, b):\n    while a:\n        pass\n\n# done\nreturn\n"
        );
    }
}
