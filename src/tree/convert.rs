//! Conversion between editor [`Node`]s and the typed model in [`super::ast`].
//!
//! Decoding is the only place that dispatches on tag strings. Anything outside
//! the vocabulary is rejected with [`CompileError::UnrecognizedNode`], so every
//! later stage works on closed enums.
//!
//! Decoding recurses once per nested block and once per nested expression
//! token, bounded by [`MAX_BLOCK_NESTING`] and [`MAX_TREE_NESTING`].
//!
//! Encoding produces the canonical tree shape: every statement wrapped in
//! `PYTHON_STATEMENT`, every call argument wrapped in `PY_ARG`, and no
//! placeholder slots.

use super::ast::*;
use super::{tags, Node, MAX_BLOCK_NESTING, MAX_TREE_NESTING};
use crate::compiler::errors::CompileError;
use serde_json::Value as JsonValue;

// ===== Decoding =====

/// Decode a `PYTHON_FILE` root into its body statements.
pub fn decode_file(node: &Node) -> Result<Vec<Statement>, CompileError> {
    if node.node_type != tags::PYTHON_FILE {
        return Err(CompileError::NotAFile {
            tag: node.node_type.clone(),
        });
    }
    block_at(optional_children(node, "body"), 0)
}

pub fn decode_block(nodes: &[Node]) -> Result<Vec<Statement>, CompileError> {
    block_at(nodes, 0)
}

pub fn decode_statement(node: &Node) -> Result<Statement, CompileError> {
    statement_at(node, 0)
}

/// Decode a `PYTHON_EXPRESSION` node into its flat token sequence.
pub fn decode_expression(node: &Node) -> Result<Expression, CompileError> {
    expression_at(node, 0)
}

pub fn decode_token(node: &Node) -> Result<Token, CompileError> {
    token_at(node, 0)
}

fn block_at(nodes: &[Node], blocks: usize) -> Result<Vec<Statement>, CompileError> {
    if blocks > MAX_BLOCK_NESTING {
        return Err(CompileError::TooDeep {
            what: "Statement blocks",
            limit: MAX_BLOCK_NESTING,
        });
    }
    nodes.iter().map(|node| statement_at(node, blocks)).collect()
}

/// `blocks` is the nesting of the block holding `node`.
fn statement_at(node: &Node, blocks: usize) -> Result<Statement, CompileError> {
    let mut node = node;
    while node.node_type == tags::PYTHON_STATEMENT {
        match optional_children(node, "statement").first() {
            Some(inner) => node = inner,
            None => return Ok(Statement::Blank),
        }
    }

    let inner = blocks + 1;
    match node.node_type.as_str() {
        tags::PY_COMMENT => Ok(Statement::Comment(
            optional_string(node, "value").unwrap_or_default(),
        )),
        tags::PYTHON_EXPRESSION => Ok(Statement::Expression(expression_at(node, 0)?)),
        tags::PYTHON_ASSIGNMENT => {
            let targets = tokens_at(required_children(node, "left")?, 0)?;
            let value = expression_at(single_child(node, "right")?, 0)?;
            Ok(Statement::Assignment { targets, value })
        }
        tags::PYTHON_IF_STATEMENT => {
            let condition = expression_at(single_child(node, "condition")?, 0)?;
            let body = block_at(optional_children(node, "trueblock"), inner)?;
            let else_blocks = optional_children(node, "elseblocks")
                .iter()
                .map(|block| else_block_at(block, inner))
                .collect::<Result<Vec<_>, _>>()?;
            Ok(Statement::If {
                condition,
                body,
                else_blocks,
            })
        }
        tags::PYTHON_WHILE_LOOP => Ok(Statement::While {
            condition: expression_at(single_child(node, "condition")?, 0)?,
            body: block_at(optional_children(node, "block"), inner)?,
        }),
        tags::PYTHON_FOR_LOOP => Ok(Statement::For {
            targets: tokens_at(required_children(node, "target")?, 0)?,
            iterable: expression_at(single_child(node, "iterable")?, 0)?,
            body: block_at(optional_children(node, "block"), inner)?,
        }),
        tags::PYTHON_FUNCTION_DECLARATION => {
            let identifier = single_child(node, "identifier")?;
            let name = identifier_name(identifier)?;
            let params = optional_children(node, "params")
                .iter()
                .map(identifier_name)
                .collect::<Result<Vec<_>, _>>()?;
            let id = match node.property("id") {
                None | Some(JsonValue::Null) => None,
                Some(JsonValue::String(s)) => Some(s.clone()),
                Some(other) => Some(other.to_string()),
            };
            Ok(Statement::FunctionDeclaration(FunctionDeclaration {
                name,
                id,
                params,
                body: block_at(optional_children(node, "body"), inner)?,
            }))
        }
        tags::PYTHON_RETURN => {
            let value = match optional_children(node, "value").first() {
                Some(expr) => expression_at(expr, 0)?,
                None => Expression::default(),
            };
            Ok(Statement::Return(value))
        }
        tags::PY_BREAK => Ok(Statement::Break),
        tags::PY_CONTINUE => Ok(Statement::Continue),
        tags::PYTHON_IMPORT => {
            let modules = optional_children(node, "modules")
                .iter()
                .map(|m| required_string(m, "identifier"))
                .collect::<Result<Vec<_>, _>>()?;
            Ok(Statement::Import(modules))
        }
        tags::PYTHON_FROM_IMPORT => {
            let module = required_string(single_child(node, "module")?, "identifier")?;
            let names = optional_children(node, "attrs")
                .iter()
                .map(|a| required_string(a, "identifier"))
                .collect::<Result<Vec<_>, _>>()?;
            Ok(Statement::FromImport { module, names })
        }
        other => Err(CompileError::UnrecognizedNode {
            tag: other.to_string(),
            context: "statement",
        }),
    }
}

/// `blocks` is the nesting of the bodies below the `elif` or `else`.
fn else_block_at(node: &Node, blocks: usize) -> Result<ElseBlock, CompileError> {
    match node.node_type.as_str() {
        tags::PYTHON_ELIF_STATEMENT => Ok(ElseBlock::Elif {
            condition: expression_at(single_child(node, "condition")?, 0)?,
            body: block_at(optional_children(node, "block"), blocks)?,
        }),
        tags::PYTHON_ELSE_STATEMENT => Ok(ElseBlock::Else {
            body: block_at(optional_children(node, "block"), blocks)?,
        }),
        other => Err(CompileError::UnrecognizedNode {
            tag: other.to_string(),
            context: "else block",
        }),
    }
}

fn expression_at(node: &Node, depth: usize) -> Result<Expression, CompileError> {
    check_depth(depth)?;
    if node.node_type != tags::PYTHON_EXPRESSION {
        return Err(CompileError::UnrecognizedNode {
            tag: node.node_type.clone(),
            context: "expression",
        });
    }
    Ok(Expression::new(tokens_at(optional_children(node, "tokens"), depth + 1)?))
}

fn tokens_at(nodes: &[Node], depth: usize) -> Result<Vec<Token>, CompileError> {
    nodes.iter().map(|node| token_at(node, depth)).collect()
}

fn check_depth(depth: usize) -> Result<(), CompileError> {
    if depth > MAX_TREE_NESTING {
        return Err(CompileError::TooDeep {
            what: "Expressions",
            limit: MAX_TREE_NESTING,
        });
    }
    Ok(())
}

fn token_at(node: &Node, depth: usize) -> Result<Token, CompileError> {
    check_depth(depth)?;
    let inner = depth + 1;
    let tag = node.node_type.as_str();
    match tag {
        tags::PYTHON_BINARY_OPERATOR => Ok(Token::Operator(required_string(node, "operator")?)),
        tags::NUMERIC_LITERAL => decode_number(node).map(Token::Number),
        tags::STRING_LITERAL => Ok(Token::Str(required_string(node, "value")?)),
        tags::PYTHON_BOOL => match node.property("value") {
            Some(JsonValue::Bool(b)) => Ok(Token::Bool(*b)),
            Some(other) => Err(invalid_property(node, "value", other)),
            None => Err(missing_property(node, "value")),
        },
        tags::PYTHON_NONE => Ok(Token::None),
        tags::PY_IDENTIFIER => Ok(Token::Identifier(required_string(node, "identifier")?)),
        tags::PYTHON_CALL_VARIABLE => Ok(Token::CallVariable {
            name: required_string(node, "identifier")?,
            args: arguments_at(node, inner)?,
        }),
        tags::PYTHON_CALL_MEMBER => Ok(Token::CallMember {
            object: Box::new(token_at(single_child(node, "object")?, inner)?),
            member: required_string(node, "member")?,
            args: arguments_at(node, inner)?,
        }),
        tags::PYTHON_MEMBER => Ok(Token::Member {
            object: Box::new(token_at(single_child(node, "object")?, inner)?),
            member: required_string(node, "member")?,
        }),
        tags::PYTHON_LIST => Ok(Token::List(elements_at(node, inner)?)),
        tags::PY_TUPLE => Ok(Token::Tuple(elements_at(node, inner)?)),
        tags::PY_SET => Ok(Token::Set(elements_at(node, inner)?)),
        tags::PY_DICT => {
            let pairs = optional_children(node, "elements")
                .iter()
                .map(|pair| {
                    if pair.node_type != tags::PY_KEYVALUE {
                        return Err(CompileError::UnrecognizedNode {
                            tag: pair.node_type.clone(),
                            context: "dictionary element",
                        });
                    }
                    Ok((
                        expression_at(single_child(pair, "key")?, inner)?,
                        expression_at(single_child(pair, "value")?, inner)?,
                    ))
                })
                .collect::<Result<Vec<_>, _>>()?;
            Ok(Token::Dict(pairs))
        }
        tags::PYTHON_SUBSCRIPT => Ok(Token::Subscript {
            target: Box::new(token_at(single_child(node, "target")?, inner)?),
            key: expression_at(single_child(node, "key")?, inner)?,
        }),
        tags::PY_SLICE => {
            let range = single_child(node, "slicerange")?;
            let bound = |slot: &str| -> Result<Expression, CompileError> {
                match optional_children(range, slot).first() {
                    Some(expr) => expression_at(expr, inner),
                    None => Ok(Expression::default()),
                }
            };
            Ok(Token::Slice {
                target: Box::new(token_at(single_child(node, "target")?, inner)?),
                start: bound("start")?,
                end: bound("end")?,
            })
        }
        tags::PY_BRACKET => Ok(Token::Bracket(expression_at(single_child(node, "expr")?, inner)?)),
        other => Err(CompileError::UnrecognizedNode {
            tag: other.to_string(),
            context: "expression token",
        }),
    }
}

fn decode_number(node: &Node) -> Result<Number, CompileError> {
    match node.property("value") {
        Some(JsonValue::Number(n)) => {
            if let Some(i) = n.as_i64() {
                Ok(Number::Int(i))
            } else if let Some(f) = n.as_f64() {
                Ok(Number::Float(f))
            } else {
                Err(invalid_property(node, "value", &JsonValue::Number(n.clone())))
            }
        }
        Some(JsonValue::String(s)) => Ok(Number::Text(s.clone())),
        Some(other) => Err(invalid_property(node, "value", other)),
        None => Err(missing_property(node, "value")),
    }
}

/// Elements of a list, tuple or set; empty expressions are editor placeholders.
fn elements_at(node: &Node, depth: usize) -> Result<Vec<Expression>, CompileError> {
    let mut elements = Vec::new();
    for child in optional_children(node, "elements") {
        let expr = expression_at(child, depth)?;
        if !expr.is_empty() {
            elements.push(expr);
        }
    }
    Ok(elements)
}

fn arguments_at(node: &Node, depth: usize) -> Result<Vec<Argument>, CompileError> {
    let mut args = Vec::new();
    for arg in optional_children(node, "arguments") {
        let value = match arg.node_type.as_str() {
            tags::PY_ARG => match optional_children(arg, "argument").first() {
                Some(value) => value,
                None => continue,
            },
            _ => arg,
        };
        match value.node_type.as_str() {
            tags::PYTHON_EXPRESSION => {
                let expr = expression_at(value, depth)?;
                if !expr.is_empty() {
                    args.push(Argument::Positional(expr));
                }
            }
            tags::PY_KWARG => args.push(Argument::Keyword {
                name: required_string(value, "name")?,
                value: expression_at(single_child(value, "value")?, depth)?,
            }),
            other => {
                return Err(CompileError::UnrecognizedNode {
                    tag: other.to_string(),
                    context: "call argument",
                })
            }
        }
    }
    Ok(args)
}

fn identifier_name(node: &Node) -> Result<String, CompileError> {
    if node.node_type != tags::PY_IDENTIFIER {
        return Err(CompileError::UnrecognizedNode {
            tag: node.node_type.clone(),
            context: "identifier",
        });
    }
    required_string(node, "identifier")
}

// ===== Node access helpers =====

fn optional_children<'n>(node: &'n Node, slot: &str) -> &'n [Node] {
    node.child_set(slot).unwrap_or(&[])
}

fn required_children<'n>(node: &'n Node, slot: &'static str) -> Result<&'n [Node], CompileError> {
    match node.child_set(slot) {
        Some(children) if !children.is_empty() => Ok(children),
        _ => Err(CompileError::MissingChildSet {
            tag: node.node_type.clone(),
            child_set: slot,
        }),
    }
}

fn single_child<'n>(node: &'n Node, slot: &'static str) -> Result<&'n Node, CompileError> {
    required_children(node, slot).map(|children| &children[0])
}

fn optional_string(node: &Node, key: &str) -> Option<String> {
    node.property(key).and_then(JsonValue::as_str).map(str::to_string)
}

fn required_string(node: &Node, key: &'static str) -> Result<String, CompileError> {
    match node.property(key) {
        Some(JsonValue::String(s)) => Ok(s.clone()),
        Some(other) => Err(invalid_property(node, key, other)),
        None => Err(missing_property(node, key)),
    }
}

fn missing_property(node: &Node, property: &'static str) -> CompileError {
    CompileError::MissingProperty {
        tag: node.node_type.clone(),
        property,
    }
}

fn invalid_property(node: &Node, property: &'static str, value: &JsonValue) -> CompileError {
    CompileError::InvalidProperty {
        tag: node.node_type.clone(),
        property,
        value: value.to_string(),
    }
}

// ===== Encoding =====

/// Build a canonical `PYTHON_FILE` node from body statements.
pub fn encode_file(body: &[Statement]) -> Node {
    Node::new(tags::PYTHON_FILE).with_child_set("body", encode_block(body))
}

pub fn encode_block(body: &[Statement]) -> Vec<Node> {
    body.iter()
        .map(|stmt| {
            let inner = match stmt {
                Statement::Blank => Vec::new(),
                other => vec![encode_statement(other)],
            };
            Node::new(tags::PYTHON_STATEMENT).with_child_set("statement", inner)
        })
        .collect()
}

fn encode_statement(stmt: &Statement) -> Node {
    match stmt {
        Statement::Blank => Node::new(tags::PYTHON_STATEMENT).with_child_set("statement", Vec::new()),
        Statement::Comment(text) => Node::new(tags::PY_COMMENT).with_property("value", text.as_str()),
        Statement::Expression(expr) => encode_expression(expr),
        Statement::Assignment { targets, value } => Node::new(tags::PYTHON_ASSIGNMENT)
            .with_child_set("left", targets.iter().map(encode_token).collect())
            .with_child_set("right", vec![encode_expression(value)]),
        Statement::If {
            condition,
            body,
            else_blocks,
        } => Node::new(tags::PYTHON_IF_STATEMENT)
            .with_child_set("condition", vec![encode_expression(condition)])
            .with_child_set("trueblock", encode_block(body))
            .with_child_set(
                "elseblocks",
                else_blocks
                    .iter()
                    .map(|block| match block {
                        ElseBlock::Elif { condition, body } => Node::new(tags::PYTHON_ELIF_STATEMENT)
                            .with_child_set("condition", vec![encode_expression(condition)])
                            .with_child_set("block", encode_block(body)),
                        ElseBlock::Else { body } => Node::new(tags::PYTHON_ELSE_STATEMENT)
                            .with_child_set("block", encode_block(body)),
                    })
                    .collect(),
            ),
        Statement::While { condition, body } => Node::new(tags::PYTHON_WHILE_LOOP)
            .with_child_set("condition", vec![encode_expression(condition)])
            .with_child_set("block", encode_block(body)),
        Statement::For {
            targets,
            iterable,
            body,
        } => Node::new(tags::PYTHON_FOR_LOOP)
            .with_child_set("target", targets.iter().map(encode_token).collect())
            .with_child_set("iterable", vec![encode_expression(iterable)])
            .with_child_set("block", encode_block(body)),
        Statement::FunctionDeclaration(func) => {
            let id = match &func.id {
                Some(id) => JsonValue::String(id.clone()),
                None => JsonValue::Null,
            };
            Node::new(tags::PYTHON_FUNCTION_DECLARATION)
                .with_child_set("identifier", vec![identifier_node(&func.name)])
                .with_child_set("params", func.params.iter().map(|p| identifier_node(p)).collect())
                .with_child_set("body", encode_block(&func.body))
                .with_property("id", id)
        }
        Statement::Return(value) => {
            let slot = if value.is_empty() {
                Vec::new()
            } else {
                vec![encode_expression(value)]
            };
            Node::new(tags::PYTHON_RETURN).with_child_set("value", slot)
        }
        Statement::Break => Node::new(tags::PY_BREAK),
        Statement::Continue => Node::new(tags::PY_CONTINUE),
        Statement::Import(modules) => Node::new(tags::PYTHON_IMPORT).with_child_set(
            "modules",
            modules
                .iter()
                .map(|m| Node::new(tags::PYTHON_MODULE_IDENTIFIER).with_property("identifier", m.as_str()))
                .collect(),
        ),
        Statement::FromImport { module, names } => Node::new(tags::PYTHON_FROM_IMPORT)
            .with_child_set(
                "module",
                vec![Node::new(tags::PYTHON_MODULE_IDENTIFIER).with_property("identifier", module.as_str())],
            )
            .with_child_set(
                "attrs",
                names
                    .iter()
                    .map(|n| Node::new(tags::PYTHON_MODULE_ATTRIBUTE).with_property("identifier", n.as_str()))
                    .collect(),
            ),
    }
}

pub fn encode_expression(expr: &Expression) -> Node {
    Node::new(tags::PYTHON_EXPRESSION).with_child_set("tokens", expr.tokens.iter().map(encode_token).collect())
}

fn identifier_node(name: &str) -> Node {
    Node::new(tags::PY_IDENTIFIER).with_property("identifier", name)
}

pub fn encode_token(token: &Token) -> Node {
    match token {
        Token::Operator(op) => Node::new(tags::PYTHON_BINARY_OPERATOR).with_property("operator", op.as_str()),
        Token::Number(number) => {
            let value = match number {
                Number::Int(i) => JsonValue::from(*i),
                Number::Float(f) => JsonValue::from(*f),
                Number::Text(s) => JsonValue::from(s.as_str()),
            };
            Node::new(tags::NUMERIC_LITERAL).with_property("value", value)
        }
        Token::Str(s) => Node::new(tags::STRING_LITERAL).with_property("value", s.as_str()),
        Token::Bool(b) => Node::new(tags::PYTHON_BOOL).with_property("value", *b),
        Token::None => Node::new(tags::PYTHON_NONE),
        Token::Identifier(name) => identifier_node(name),
        Token::CallVariable { name, args } => Node::new(tags::PYTHON_CALL_VARIABLE)
            .with_child_set("arguments", encode_arguments(args))
            .with_property("identifier", name.as_str()),
        Token::CallMember { object, member, args } => Node::new(tags::PYTHON_CALL_MEMBER)
            .with_child_set("object", vec![encode_token(object)])
            .with_child_set("arguments", encode_arguments(args))
            .with_property("member", member.as_str()),
        Token::Member { object, member } => Node::new(tags::PYTHON_MEMBER)
            .with_child_set("object", vec![encode_token(object)])
            .with_property("member", member.as_str()),
        Token::List(elements) => Node::new(tags::PYTHON_LIST).with_child_set("elements", encode_elements(elements)),
        Token::Tuple(elements) => Node::new(tags::PY_TUPLE).with_child_set("elements", encode_elements(elements)),
        Token::Set(elements) => Node::new(tags::PY_SET).with_child_set("elements", encode_elements(elements)),
        Token::Dict(pairs) => Node::new(tags::PY_DICT).with_child_set(
            "elements",
            pairs
                .iter()
                .map(|(key, value)| {
                    Node::new(tags::PY_KEYVALUE)
                        .with_child_set("key", vec![encode_expression(key)])
                        .with_child_set("value", vec![encode_expression(value)])
                })
                .collect(),
        ),
        Token::Subscript { target, key } => Node::new(tags::PYTHON_SUBSCRIPT)
            .with_child_set("target", vec![encode_token(target)])
            .with_child_set("key", vec![encode_expression(key)]),
        Token::Slice { target, start, end } => Node::new(tags::PY_SLICE)
            .with_child_set("target", vec![encode_token(target)])
            .with_child_set(
                "slicerange",
                vec![Node::new(tags::PY_SLICE_RANGE)
                    .with_child_set("start", vec![encode_expression(start)])
                    .with_child_set("end", vec![encode_expression(end)])],
            ),
        Token::Bracket(inner) => Node::new(tags::PY_BRACKET).with_child_set("expr", vec![encode_expression(inner)]),
    }
}

fn encode_elements(elements: &[Expression]) -> Vec<Node> {
    elements.iter().map(encode_expression).collect()
}

fn encode_arguments(args: &[Argument]) -> Vec<Node> {
    args.iter()
        .map(|arg| {
            let value = match arg {
                Argument::Positional(expr) => encode_expression(expr),
                Argument::Keyword { name, value } => Node::new(tags::PY_KWARG)
                    .with_child_set("value", vec![encode_expression(value)])
                    .with_property("name", name.as_str()),
            };
            Node::new(tags::PY_ARG).with_child_set("argument", vec![value])
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn expression(tokens: Vec<Node>) -> Node {
        Node::new(tags::PYTHON_EXPRESSION).with_child_set("tokens", tokens)
    }

    fn nested_brackets(levels: usize) -> Node {
        let mut expr = expression(vec![Node::new(tags::NUMERIC_LITERAL).with_property("value", 1)]);
        for _ in 0..levels {
            expr = expression(vec![Node::new(tags::PY_BRACKET).with_child_set("expr", vec![expr])]);
        }
        expr
    }

    fn nested_ifs(levels: usize) -> Node {
        let mut statement = Node::new(tags::PY_BREAK);
        for _ in 0..levels {
            let condition = expression(vec![Node::new(tags::PYTHON_BOOL).with_property("value", true)]);
            statement = Node::new(tags::PYTHON_IF_STATEMENT)
                .with_child_set("condition", vec![condition])
                .with_child_set("trueblock", vec![statement]);
        }
        Node::new(tags::PYTHON_FILE).with_child_set("body", vec![statement])
    }

    #[test]
    fn test_nesting_depth_is_limited() {
        let worker = std::thread::Builder::new().stack_size(64 * 1024 * 1024).spawn(|| {
            // A bracket costs two levels: the token and its inner expression
            assert!(decode_expression(&nested_brackets(MAX_TREE_NESTING / 2 - 1)).is_ok());
            assert_eq!(
                decode_expression(&nested_brackets(MAX_TREE_NESTING)).unwrap_err(),
                CompileError::TooDeep {
                    what: "Expressions",
                    limit: MAX_TREE_NESTING
                }
            );

            assert!(decode_file(&nested_ifs(MAX_BLOCK_NESTING)).is_ok());
            assert_eq!(
                decode_file(&nested_ifs(MAX_BLOCK_NESTING + 1)).unwrap_err(),
                CompileError::TooDeep {
                    what: "Statement blocks",
                    limit: MAX_BLOCK_NESTING
                }
            );
        });
        worker.unwrap().join().unwrap();
    }

    #[test]
    fn test_unknown_statement_tag_is_rejected() {
        let file = Node::new(tags::PYTHON_FILE).with_child_set("body", vec![Node::new("PYTHON_WITH")]);
        let err = decode_file(&file).unwrap_err();
        assert_eq!(
            err,
            CompileError::UnrecognizedNode {
                tag: "PYTHON_WITH".to_string(),
                context: "statement"
            }
        );
    }

    #[test]
    fn test_unknown_token_tag_is_rejected() {
        let expr = expression(vec![Node::new("PYTHON_LAMBDA")]);
        let err = decode_expression(&expr).unwrap_err();
        assert!(err.to_string().contains("PYTHON_LAMBDA"));
    }

    #[test]
    fn test_root_must_be_a_file() {
        let err = decode_file(&Node::new(tags::PY_BREAK)).unwrap_err();
        assert!(matches!(err, CompileError::NotAFile { .. }));
    }

    #[test]
    fn test_empty_call_arguments_are_placeholders() {
        let call = Node::new(tags::PYTHON_CALL_VARIABLE)
            .with_property("identifier", "print")
            .with_child_set("arguments", vec![expression(vec![])]);
        let token = decode_token(&call).unwrap();
        assert_eq!(
            token,
            Token::CallVariable {
                name: "print".to_string(),
                args: vec![]
            }
        );
    }

    #[test]
    fn test_keyword_arguments_decode() {
        let kwarg = Node::new(tags::PY_KWARG)
            .with_property("name", "end")
            .with_child_set(
                "value",
                vec![expression(vec![Node::new(tags::STRING_LITERAL).with_property("value", "")])],
            );
        let call = Node::new(tags::PYTHON_CALL_VARIABLE)
            .with_property("identifier", "print")
            .with_child_set("arguments", vec![Node::new(tags::PY_ARG).with_child_set("argument", vec![kwarg])]);
        match decode_token(&call).unwrap() {
            Token::CallVariable { args, .. } => {
                assert!(matches!(&args[0], Argument::Keyword { name, .. } if name == "end"));
            }
            other => panic!("Expected call, got {:?}", other),
        }
    }

    #[test]
    fn test_numeric_literal_accepts_text() {
        let node = Node::new(tags::NUMERIC_LITERAL).with_property("value", "3.5");
        assert_eq!(decode_token(&node).unwrap(), Token::Number(Number::Text("3.5".to_string())));
    }

    #[test]
    fn test_missing_condition_reports_slot() {
        let node = Node::new(tags::PYTHON_WHILE_LOOP);
        let err = decode_statement(&node).unwrap_err();
        assert_eq!(
            err,
            CompileError::MissingChildSet {
                tag: tags::PYTHON_WHILE_LOOP.to_string(),
                child_set: "condition"
            }
        );
    }

    #[test]
    fn test_encode_then_decode_preserves_statements() {
        let body = vec![
            Statement::Assignment {
                targets: vec![Token::Identifier("x".to_string())],
                value: Expression::new(vec![Token::Number(Number::Int(1))]),
            },
            Statement::While {
                condition: Expression::new(vec![Token::Bool(true)]),
                body: vec![Statement::Break],
            },
        ];
        let node = encode_file(&body);
        assert_eq!(decode_file(&node).unwrap(), body);
    }
}
