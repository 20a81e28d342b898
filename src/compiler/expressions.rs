//! Expression parsing by precedence climbing
//!
//! An editor expression is a flat token list in which operand tokens alternate
//! with operator markers. [`parse_expression`] resolves it into an [`Expr`]
//! tree using the precedence table in [`super::operators`]:
//!
//! 1. A leaf is either an operand token or a unary marker followed by a leaf;
//!    the unary operand is extended with any binary operators that bind
//!    tighter than the unary operator itself.
//! 2. While the next marker binds at least as tightly as the current minimum,
//!    consume it and a right-hand leaf, then keep extending the right-hand side
//!    while the following marker binds strictly tighter (or equally, for the
//!    right-associative `**`).
//! 3. Combine into a boolean op, a (possibly chained) comparison, or a binary op.
//!
//! Equal-precedence runs are therefore left-associative: `a - b - c` is
//! `(a - b) - c`.
//!
//! Unary chains, `**` chains and nested operand tokens recurse; their combined
//! depth is capped at [`MAX_EXPRESSION_DEPTH`].

use super::errors::CompileError;
use super::ir::{Constant, Expr};
use super::operators::{Operator, UnaryOp};
use crate::tree::ast::{Argument, Expression, Number, Token};
use std::sync::Arc;

pub const MAX_EXPRESSION_DEPTH: usize = 1000;

/// Parse an expression; an empty token list has no value.
pub fn parse_expression(expression: &Expression) -> Result<Option<Expr>, CompileError> {
    parse_nested(expression, 0)
}

/// Parse an expression that must produce a value.
pub fn parse_required(
    expression: &Expression,
    tag: &str,
    child_set: &'static str,
) -> Result<Expr, CompileError> {
    required_at(expression, tag, child_set, 0)
}

/// Convert a single operand token.
pub fn token_expr(token: &Token) -> Result<Expr, CompileError> {
    token_at(token, 0)
}

fn enter(depth: usize) -> Result<usize, CompileError> {
    if depth >= MAX_EXPRESSION_DEPTH {
        return Err(CompileError::TooDeep {
            what: "Expressions",
            limit: MAX_EXPRESSION_DEPTH,
        });
    }
    Ok(depth + 1)
}

fn parse_nested(expression: &Expression, depth: usize) -> Result<Option<Expr>, CompileError> {
    if expression.is_empty() {
        return Ok(None);
    }
    let mut parser = ExpressionParser {
        tokens: &expression.tokens,
        position: 0,
        depth: enter(depth)?,
    };
    let lhs = parser.parse_leaf()?;
    let expr = parser.climb(lhs, 0)?;
    if let Some(extra) = parser.tokens.get(parser.position) {
        return Err(CompileError::malformed(format!(
            "unexpected {} after a complete expression",
            describe(extra)
        )));
    }
    Ok(Some(expr))
}

fn required_at(
    expression: &Expression,
    tag: &str,
    child_set: &'static str,
    depth: usize,
) -> Result<Expr, CompileError> {
    parse_nested(expression, depth)?.ok_or_else(|| CompileError::MissingExpression {
        tag: tag.to_string(),
        child_set,
    })
}

struct ExpressionParser<'t> {
    tokens: &'t [Token],
    position: usize,
    depth: usize,
}

impl ExpressionParser<'_> {
    fn parse_leaf(&mut self) -> Result<Expr, CompileError> {
        let token = self
            .tokens
            .get(self.position)
            .ok_or_else(|| CompileError::malformed("expected an operand after the last operator"))?;
        self.position += 1;

        if let Token::Operator(symbol) = token {
            let op = UnaryOp::from_symbol(symbol).ok_or_else(|| {
                if Operator::from_symbol(symbol).is_some() {
                    CompileError::malformed(format!("operator '{}' cannot start an operand", symbol))
                } else {
                    CompileError::UnknownOperator {
                        symbol: symbol.clone(),
                    }
                }
            })?;
            let outer = self.depth;
            self.depth = enter(outer)?;
            let operand = self.parse_leaf()?;
            let operand = self.climb(operand, op.precedence())?;
            self.depth = outer;
            return Ok(Expr::Unary {
                op,
                operand: Box::new(operand),
            });
        }

        token_at(token, self.depth)
    }

    /// Binary operator at the current position, if the next token is one.
    fn peek_operator(&self) -> Result<Option<Operator>, CompileError> {
        match self.tokens.get(self.position) {
            Some(Token::Operator(symbol)) => match Operator::from_symbol(symbol) {
                Some(op) => Ok(Some(op)),
                None if UnaryOp::from_symbol(symbol).is_some() => Err(CompileError::malformed(format!(
                    "'{}' is not a binary operator",
                    symbol
                ))),
                None => Err(CompileError::UnknownOperator {
                    symbol: symbol.clone(),
                }),
            },
            _ => Ok(None),
        }
    }

    fn climb(&mut self, mut lhs: Expr, min_precedence: u8) -> Result<Expr, CompileError> {
        // Set while `lhs` is a comparison built at this level and may be extended
        let mut chainable = false;

        while let Some(op) = self.peek_operator()? {
            if op.precedence() < min_precedence {
                break;
            }
            self.position += 1;
            let mut rhs = self.parse_leaf()?;

            while let Some(next) = self.peek_operator()? {
                let binds_tighter = next.precedence() > op.precedence()
                    || (next.precedence() == op.precedence() && next.is_right_associative());
                if !binds_tighter {
                    break;
                }
                let outer = self.depth;
                self.depth = enter(outer)?;
                rhs = self.climb(rhs, next.precedence())?;
                self.depth = outer;
            }

            lhs = match op {
                Operator::Bool(bool_op) => {
                    chainable = false;
                    Expr::Bool {
                        op: bool_op,
                        left: Box::new(lhs),
                        right: Box::new(rhs),
                    }
                }
                Operator::Compare(cmp_op) => match lhs {
                    Expr::Compare {
                        left,
                        mut ops,
                        mut comparators,
                    } if chainable => {
                        ops.push(cmp_op);
                        comparators.push(rhs);
                        Expr::Compare {
                            left,
                            ops,
                            comparators,
                        }
                    }
                    other => {
                        chainable = true;
                        Expr::Compare {
                            left: Box::new(other),
                            ops: vec![cmp_op],
                            comparators: vec![rhs],
                        }
                    }
                },
                Operator::Binary(bin_op) => {
                    chainable = false;
                    Expr::Binary {
                        op: bin_op,
                        left: Box::new(lhs),
                        right: Box::new(rhs),
                    }
                }
            };
        }

        Ok(lhs)
    }
}

fn describe(token: &Token) -> String {
    match token {
        Token::Operator(symbol) => format!("operator '{}'", symbol),
        Token::Identifier(name) => format!("identifier '{}'", name),
        _ => "operand".to_string(),
    }
}

fn token_at(token: &Token, depth: usize) -> Result<Expr, CompileError> {
    let depth = enter(depth)?;
    Ok(match token {
        Token::Operator(symbol) => {
            return Err(CompileError::malformed(format!(
                "operator '{}' where an operand was expected",
                symbol
            )))
        }
        Token::Number(number) => Expr::Const(number_constant(number)?),
        Token::Str(s) => Expr::Const(Constant::Str(Arc::from(s.as_str()))),
        Token::Bool(b) => Expr::Const(Constant::Bool(*b)),
        Token::None => Expr::Const(Constant::None),
        Token::Identifier(name) => Expr::Name(name.clone()),
        Token::CallVariable { name, args } => {
            let (args, keywords) = call_arguments(args, depth)?;
            Expr::Call {
                func: Box::new(Expr::Name(name.clone())),
                args,
                keywords,
            }
        }
        Token::CallMember { object, member, args } => {
            let (args, keywords) = call_arguments(args, depth)?;
            Expr::Call {
                func: Box::new(Expr::Attribute {
                    value: Box::new(token_at(object, depth)?),
                    attr: member.clone(),
                }),
                args,
                keywords,
            }
        }
        Token::Member { object, member } => Expr::Attribute {
            value: Box::new(token_at(object, depth)?),
            attr: member.clone(),
        },
        Token::List(elements) => Expr::List(element_exprs(elements, depth)?),
        Token::Tuple(elements) => Expr::Tuple(element_exprs(elements, depth)?),
        Token::Set(elements) => Expr::Set(element_exprs(elements, depth)?),
        Token::Dict(pairs) => Expr::Dict(
            pairs
                .iter()
                .map(|(key, value)| {
                    Ok((
                        required_at(key, "PY_KEYVALUE", "key", depth)?,
                        required_at(value, "PY_KEYVALUE", "value", depth)?,
                    ))
                })
                .collect::<Result<Vec<_>, CompileError>>()?,
        ),
        Token::Subscript { target, key } => Expr::Subscript {
            value: Box::new(token_at(target, depth)?),
            index: Box::new(required_at(key, "PYTHON_SUBSCRIPT", "key", depth)?),
        },
        Token::Slice { target, start, end } => Expr::Slice {
            value: Box::new(token_at(target, depth)?),
            lower: parse_nested(start, depth)?.map(Box::new),
            upper: parse_nested(end, depth)?.map(Box::new),
        },
        Token::Bracket(inner) => required_at(inner, "PY_BRACKET", "expr", depth)?,
    })
}

fn number_constant(number: &Number) -> Result<Constant, CompileError> {
    match number {
        Number::Int(i) => Ok(Constant::Int(*i)),
        Number::Float(f) => Ok(Constant::Float(*f)),
        Number::Text(text) => {
            let trimmed = text.trim();
            if let Ok(i) = trimmed.parse::<i64>() {
                Ok(Constant::Int(i))
            } else if let Ok(f) = trimmed.parse::<f64>() {
                Ok(Constant::Float(f))
            } else {
                Err(CompileError::InvalidProperty {
                    tag: "NUMERIC_LITERAL".to_string(),
                    property: "value",
                    value: text.clone(),
                })
            }
        }
    }
}

fn element_exprs(elements: &[Expression], depth: usize) -> Result<Vec<Expr>, CompileError> {
    let mut exprs = Vec::with_capacity(elements.len());
    for element in elements {
        if let Some(expr) = parse_nested(element, depth)? {
            exprs.push(expr);
        }
    }
    Ok(exprs)
}

type CallArguments = (Vec<Expr>, Vec<(String, Expr)>);

fn call_arguments(args: &[Argument], depth: usize) -> Result<CallArguments, CompileError> {
    let mut positional = Vec::new();
    let mut keywords = Vec::new();
    for arg in args {
        match arg {
            Argument::Positional(expr) => {
                if let Some(expr) = parse_nested(expr, depth)? {
                    positional.push(expr);
                }
            }
            Argument::Keyword { name, value } => {
                keywords.push((name.clone(), required_at(value, "PY_KWARG", "value", depth)?));
            }
        }
    }
    Ok((positional, keywords))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::compiler::operators::{BinOp, BoolOp, CmpOp};

    fn op(symbol: &str) -> Token {
        Token::Operator(symbol.to_string())
    }

    fn int(i: i64) -> Token {
        Token::Number(Number::Int(i))
    }

    fn name(n: &str) -> Token {
        Token::Identifier(n.to_string())
    }

    fn parse(tokens: Vec<Token>) -> Expr {
        parse_expression(&Expression::new(tokens)).unwrap().unwrap()
    }

    /// Render a tree fully parenthesized so grouping is easy to assert.
    fn render(expr: &Expr) -> String {
        match expr {
            Expr::Const(Constant::Int(i)) => i.to_string(),
            Expr::Const(Constant::Bool(b)) => if *b { "True" } else { "False" }.to_string(),
            Expr::Name(n) => n.clone(),
            Expr::Unary { op, operand } => format!("({} {})", op.symbol(), render(operand)),
            Expr::Binary { op, left, right } => {
                format!("({} {} {})", render(left), op.symbol(), render(right))
            }
            Expr::Bool { op, left, right } => {
                let symbol = match op {
                    BoolOp::And => "and",
                    BoolOp::Or => "or",
                };
                format!("({} {} {})", render(left), symbol, render(right))
            }
            Expr::Compare { left, ops, comparators } => {
                let mut out = format!("({}", render(left));
                for (op, c) in ops.iter().zip(comparators) {
                    out.push_str(&format!(" {} {}", op.symbol(), render(c)));
                }
                out.push(')');
                out
            }
            other => format!("{:?}", other),
        }
    }

    #[test]
    fn test_empty_expression_has_no_value() {
        assert!(parse_expression(&Expression::default()).unwrap().is_none());
    }

    #[test]
    fn test_multiplication_binds_tighter_than_addition() {
        let expr = parse(vec![int(1), op("+"), int(2), op("*"), int(3)]);
        assert_eq!(render(&expr), "(1 + (2 * 3))");
    }

    #[test]
    fn test_equal_precedence_groups_left() {
        let expr = parse(vec![name("a"), op("-"), name("b"), op("-"), name("c")]);
        assert_eq!(render(&expr), "((a - b) - c)");

        let expr = parse(vec![name("a"), op("/"), name("b"), op("*"), name("c"), op("%"), name("d")]);
        assert_eq!(render(&expr), "(((a / b) * c) % d)");
    }

    #[test]
    fn test_power_groups_right() {
        let expr = parse(vec![int(2), op("**"), int(3), op("**"), int(2)]);
        assert_eq!(render(&expr), "(2 ** (3 ** 2))");
    }

    #[test]
    fn test_mixed_chain_resumes_at_lower_precedence() {
        // 1 * 2 + 3 * 4 - 5
        let expr = parse(vec![
            int(1),
            op("*"),
            int(2),
            op("+"),
            int(3),
            op("*"),
            int(4),
            op("-"),
            int(5),
        ]);
        assert_eq!(render(&expr), "(((1 * 2) + (3 * 4)) - 5)");
    }

    #[test]
    fn test_and_binds_tighter_than_or() {
        let expr = parse(vec![
            Token::Bool(true),
            op("or"),
            Token::Bool(true),
            op("and"),
            Token::Bool(false),
        ]);
        assert_eq!(render(&expr), "(True or (True and False))");
    }

    #[test]
    fn test_comparison_between_boolean_operators() {
        let expr = parse(vec![
            name("a"),
            op("=="),
            int(1),
            op("and"),
            name("b"),
            op("+"),
            int(1),
            op(">"),
            int(2),
        ]);
        assert_eq!(render(&expr), "((a == 1) and ((b + 1) > 2))");
    }

    #[test]
    fn test_comparisons_chain() {
        let expr = parse(vec![name("a"), op("<"), name("b"), op("<="), name("c")]);
        match &expr {
            Expr::Compare { ops, comparators, .. } => {
                assert_eq!(ops, &vec![CmpOp::Lt, CmpOp::LtE]);
                assert_eq!(comparators.len(), 2);
            }
            other => panic!("Expected chained compare, got {:?}", other),
        }
    }

    #[test]
    fn test_bracketed_comparison_is_not_extended() {
        let inner = Expression::new(vec![name("a"), op("<"), name("b")]);
        let expr = parse(vec![Token::Bracket(inner), op("<"), name("c")]);
        assert_eq!(render(&expr), "((a < b) < c)");
    }

    #[test]
    fn test_unary_minus_and_power() {
        let expr = parse(vec![op("-"), int(2), op("**"), int(2)]);
        assert_eq!(render(&expr), "(- (2 ** 2))");

        let expr = parse(vec![op("-"), name("a"), op("+"), name("b")]);
        assert_eq!(render(&expr), "((- a) + b)");
    }

    #[test]
    fn test_not_covers_comparison() {
        let expr = parse(vec![op("not"), name("a"), op("=="), name("b"), op("and"), name("c")]);
        assert_eq!(render(&expr), "((not (a == b)) and c)");
    }

    #[test]
    fn test_membership_operators() {
        let expr = parse(vec![name("x"), op("not in"), name("xs")]);
        assert_eq!(render(&expr), "(x not in xs)");
        let expr = parse(vec![name("x"), op("is not"), Token::None]);
        assert!(matches!(expr, Expr::Compare { ref ops, .. } if ops == &vec![CmpOp::IsNot]));
    }

    #[test]
    fn test_binary_operator_in_leaf_position_is_malformed() {
        let err = parse_expression(&Expression::new(vec![op("*"), int(1)])).unwrap_err();
        assert!(matches!(err, CompileError::MalformedExpression { .. }));
    }

    #[test]
    fn test_trailing_operator_is_malformed() {
        let err = parse_expression(&Expression::new(vec![int(1), op("+")])).unwrap_err();
        assert!(matches!(err, CompileError::MalformedExpression { .. }));
    }

    #[test]
    fn test_adjacent_operands_are_malformed() {
        let err = parse_expression(&Expression::new(vec![int(1), int(2)])).unwrap_err();
        assert!(matches!(err, CompileError::MalformedExpression { .. }));
    }

    #[test]
    fn test_recursion_depth_is_limited() {
        let worker = std::thread::Builder::new().stack_size(64 * 1024 * 1024).spawn(|| {
            let too_deep = CompileError::TooDeep {
                what: "Expressions",
                limit: MAX_EXPRESSION_DEPTH,
            };

            let negations = |count: usize| {
                let mut tokens = vec![op("-"); count];
                tokens.push(int(1));
                parse_expression(&Expression::new(tokens))
            };
            assert!(negations(MAX_EXPRESSION_DEPTH - 10).is_ok());
            assert_eq!(negations(MAX_EXPRESSION_DEPTH).unwrap_err(), too_deep);

            let mut powers = vec![int(2)];
            for _ in 0..MAX_EXPRESSION_DEPTH {
                powers.extend([op("**"), int(2)]);
            }
            assert_eq!(parse_expression(&Expression::new(powers)).unwrap_err(), too_deep);

            let mut bracketed = Expression::new(vec![int(1)]);
            for _ in 0..MAX_EXPRESSION_DEPTH {
                bracketed = Expression::new(vec![Token::Bracket(bracketed)]);
            }
            assert_eq!(parse_expression(&bracketed).unwrap_err(), too_deep);
        });
        worker.unwrap().join().unwrap();
    }

    #[test]
    fn test_unknown_operator() {
        let err = parse_expression(&Expression::new(vec![int(1), op("<>"), int(2)])).unwrap_err();
        assert_eq!(
            err,
            CompileError::UnknownOperator {
                symbol: "<>".to_string()
            }
        );
    }

    #[test]
    fn test_call_member_builds_attribute_call() {
        let token = Token::CallMember {
            object: Box::new(name("xs")),
            member: "append".to_string(),
            args: vec![Argument::Positional(Expression::new(vec![int(1)]))],
        };
        match parse(vec![token]) {
            Expr::Call { func, args, keywords } => {
                assert!(matches!(*func, Expr::Attribute { ref attr, .. } if attr == "append"));
                assert_eq!(args.len(), 1);
                assert!(keywords.is_empty());
            }
            other => panic!("Expected call, got {:?}", other),
        }
    }

    #[test]
    fn test_binop_variants() {
        let expr = parse(vec![int(1), op("<<"), int(2), op("|"), int(1)]);
        assert!(matches!(expr, Expr::Binary { op: BinOp::BitOr, .. }));
    }
}
