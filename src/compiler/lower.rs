//! Tree lowering
//!
//! Turns the typed statement model into [`super::ir`] statements. Every block is
//! lowered in one of two modes:
//!
//! - **traced**: trace instructions are woven around the program's own
//!   statements so the interpreter reports every result, branch and
//!   iteration to the capture engine
//! - **plain**: the same program without any trace instructions
//!
//! The module body is always traced. Function bodies are lowered in both modes
//! and the interpreter picks one per call.
//!
//! # Traced shapes
//!
//! ```text
//! x = e                 Assign(x, Log(ASSIGNMENT, e))
//! if c: A elif d: B     If(LogAndStartFrame(IF, "condition", c),
//!                          [StartChildSet("trueblock"), A],
//!                          [StartChildSet("elseblocks"),
//!                           If(LogAndStartFrame(ELIF, "condition", d),
//!                              [StartChildSet("block"), B, EndFrame],
//!                              [EndFrame])])
//!                       EndFrame
//! while c: A            StartFrame(WHILE_LOOP, "frames")
//!                       While(LogAndStartFrame(WHILE_LOOP_ITERATION, "condition", c),
//!                             [StartChildSet("block"), A, EndFrame])
//!                       EndLoop; EndFrame
//! for t in e: A         StartFrame(FOR_LOOP, "frames")
//!                       For(t, TraceEach(FOR_LOOP_ITERATION, "iterable", e),
//!                           [StartChildSet("block"), A, EndFrame])
//!                       EndFrame
//! break / continue      EndLoop; Break / Continue
//! return e              Return(LogAndEndFrames(RETURN, FUNCTION_CALL, e))
//! ```
//!
//! # Line numbers
//!
//! Statements are numbered by the line they occupy in the generated text.
//! Numbering restarts inside each function, whose `def` line is line 1.

use super::errors::CompileError;
use super::expressions::{parse_expression, parse_required, token_expr};
use super::ir::{Constant, Expr, FunctionCode, Program, Stmt, StmtKind, Target};
use crate::capture::TraceKind;
use crate::tree::ast::{ElseBlock, Expression, FunctionDeclaration, Statement, Token};
use crate::tree::tags;
use rustc_hash::FxHashSet;
use std::sync::Arc;

/// Lower a module body. The result is traced.
pub fn lower_module(body: &[Statement]) -> Result<Program, CompileError> {
    let mut lowering = Lowering::new();
    let body = lowering.lower_block(body, true)?;
    Ok(Program { body })
}

struct Lowering {
    next_line: u32,
    loop_depth: usize,
    in_function: bool,
}

impl Lowering {
    fn new() -> Self {
        Lowering {
            next_line: 1,
            loop_depth: 0,
            in_function: false,
        }
    }

    fn take_line(&mut self) -> u32 {
        let line = self.next_line;
        self.next_line += 1;
        line
    }

    /// Lower the statements of an indented block. An empty block still
    /// occupies the line of its `pass`.
    fn lower_suite(&mut self, body: &[Statement], traced: bool) -> Result<Vec<Stmt>, CompileError> {
        if body.is_empty() {
            self.take_line();
            return Ok(Vec::new());
        }
        self.lower_block(body, traced)
    }

    fn lower_block(&mut self, body: &[Statement], traced: bool) -> Result<Vec<Stmt>, CompileError> {
        let mut out = Vec::with_capacity(body.len());
        for statement in body {
            self.lower_statement(statement, traced, &mut out)?;
        }
        Ok(out)
    }

    fn lower_statement(
        &mut self,
        statement: &Statement,
        traced: bool,
        out: &mut Vec<Stmt>,
    ) -> Result<(), CompileError> {
        let line = self.take_line();
        let stmt = move |kind: StmtKind| Stmt::new(line, kind);

        match statement {
            Statement::Blank | Statement::Comment(_) => {}

            Statement::Expression(expression) => {
                if let Some(expr) = parse_expression(expression)? {
                    let expr = if traced {
                        log(TraceKind::Expression, expr)
                    } else {
                        expr
                    };
                    out.push(stmt(StmtKind::Expr(expr)));
                }
            }

            Statement::Assignment { targets, value } => {
                let target = lower_targets(targets)?;
                let value = parse_required(value, tags::PYTHON_ASSIGNMENT, "right")?;
                let value = if traced {
                    log(TraceKind::Assignment, value)
                } else {
                    value
                };
                out.push(stmt(StmtKind::Assign { target, value }));
            }

            Statement::If {
                condition,
                body,
                else_blocks,
            } => {
                let condition = parse_required(condition, tags::PYTHON_IF_STATEMENT, "condition")?;
                if traced {
                    let mut body_stmts = vec![stmt(StmtKind::StartChildSet("trueblock"))];
                    body_stmts.extend(self.lower_suite(body, true)?);
                    let mut orelse = Vec::new();
                    if !else_blocks.is_empty() {
                        orelse.push(stmt(StmtKind::StartChildSet("elseblocks")));
                        orelse.extend(self.lower_traced_else_chain(else_blocks)?);
                    }
                    out.push(stmt(StmtKind::If {
                        condition: Expr::LogAndStartFrame {
                            kind: TraceKind::If,
                            child_set: "condition",
                            value: Box::new(condition),
                        },
                        body: body_stmts,
                        orelse,
                    }));
                    out.push(stmt(StmtKind::EndFrame));
                } else {
                    let body = self.lower_suite(body, false)?;
                    let orelse = self.lower_plain_else_chain(else_blocks)?;
                    out.push(stmt(StmtKind::If {
                        condition,
                        body,
                        orelse,
                    }));
                }
            }

            Statement::While { condition, body } => {
                let condition = parse_required(condition, tags::PYTHON_WHILE_LOOP, "condition")?;
                self.loop_depth += 1;
                let lowered = self.lower_suite(body, traced);
                self.loop_depth -= 1;
                let lowered = lowered?;

                if traced {
                    out.push(stmt(StmtKind::StartFrame {
                        kind: TraceKind::WhileLoop,
                        child_set: "frames",
                    }));
                    out.push(stmt(StmtKind::While {
                        condition: Expr::LogAndStartFrame {
                            kind: TraceKind::WhileIteration,
                            child_set: "condition",
                            value: Box::new(condition),
                        },
                        body: iteration_body(line, lowered),
                    }));
                    // closes the final, false iteration
                    out.push(stmt(StmtKind::EndLoop));
                    out.push(stmt(StmtKind::EndFrame));
                } else {
                    out.push(stmt(StmtKind::While {
                        condition,
                        body: lowered,
                    }));
                }
            }

            Statement::For {
                targets,
                iterable,
                body,
            } => {
                let target = lower_targets(targets)?;
                let iterable = parse_required(iterable, tags::PYTHON_FOR_LOOP, "iterable")?;
                self.loop_depth += 1;
                let lowered = self.lower_suite(body, traced);
                self.loop_depth -= 1;
                let lowered = lowered?;

                if traced {
                    out.push(stmt(StmtKind::StartFrame {
                        kind: TraceKind::ForLoop,
                        child_set: "frames",
                    }));
                    out.push(stmt(StmtKind::For {
                        target,
                        iterable: Expr::TraceEach {
                            kind: TraceKind::ForIteration,
                            child_set: "iterable",
                            iterable: Box::new(iterable),
                        },
                        body: iteration_body(line, lowered),
                    }));
                    out.push(stmt(StmtKind::EndFrame));
                } else {
                    out.push(stmt(StmtKind::For {
                        target,
                        iterable,
                        body: lowered,
                    }));
                }
            }

            Statement::FunctionDeclaration(declaration) => {
                let code = self.lower_function(declaration)?;
                out.push(stmt(StmtKind::FunctionDef(Arc::new(code))));
            }

            Statement::Return(value) => {
                if !self.in_function {
                    return Err(CompileError::InvalidStructure {
                        message: "'return' outside function".to_string(),
                    });
                }
                let value = parse_expression(value)?.unwrap_or(Expr::Const(Constant::None));
                let value = if traced {
                    Expr::LogAndEndFrames {
                        kind: TraceKind::Return,
                        until: TraceKind::FunctionCall,
                        value: Box::new(value),
                    }
                } else {
                    value
                };
                out.push(stmt(StmtKind::Return(value)));
            }

            Statement::Break | Statement::Continue => {
                let is_break = matches!(statement, Statement::Break);
                if self.loop_depth == 0 {
                    let keyword = if is_break { "break" } else { "continue" };
                    return Err(CompileError::InvalidStructure {
                        message: format!("'{}' outside loop", keyword),
                    });
                }
                if traced {
                    out.push(stmt(StmtKind::EndLoop));
                }
                out.push(stmt(if is_break {
                    StmtKind::Break
                } else {
                    StmtKind::Continue
                }));
            }

            Statement::Import(modules) => {
                let import = stmt(StmtKind::Import(modules.clone()));
                self.push_bracketed(traced, TraceKind::Import, line, import, out);
            }

            Statement::FromImport { module, names } => {
                let import = stmt(StmtKind::FromImport {
                    module: module.clone(),
                    names: names.clone(),
                });
                self.push_bracketed(traced, TraceKind::FromImport, line, import, out);
            }
        }
        Ok(())
    }

    fn push_bracketed(&self, traced: bool, kind: TraceKind, line: u32, inner: Stmt, out: &mut Vec<Stmt>) {
        if traced {
            out.push(Stmt::new(
                line,
                StmtKind::StartFrame {
                    kind,
                    child_set: "import",
                },
            ));
            out.push(inner);
            out.push(Stmt::new(line, StmtKind::EndFrame));
        } else {
            out.push(inner);
        }
    }

    /// Elif/else links of a traced if-chain. Each elif opens its own frame
    /// inside the if frame's `elseblocks`.
    fn lower_traced_else_chain(&mut self, chain: &[ElseBlock]) -> Result<Vec<Stmt>, CompileError> {
        let Some((first, rest)) = chain.split_first() else {
            return Ok(Vec::new());
        };
        let line = self.take_line();
        match first {
            ElseBlock::Elif { condition, body } => {
                let condition = parse_required(condition, tags::PYTHON_ELIF_STATEMENT, "condition")?;
                let mut body_stmts = vec![Stmt::new(line, StmtKind::StartChildSet("block"))];
                body_stmts.extend(self.lower_suite(body, true)?);
                body_stmts.push(Stmt::new(line, StmtKind::EndFrame));

                let mut orelse = vec![Stmt::new(line, StmtKind::EndFrame)];
                orelse.extend(self.lower_traced_else_chain(rest)?);

                Ok(vec![Stmt::new(
                    line,
                    StmtKind::If {
                        condition: Expr::LogAndStartFrame {
                            kind: TraceKind::Elif,
                            child_set: "condition",
                            value: Box::new(condition),
                        },
                        body: body_stmts,
                        orelse,
                    },
                )])
            }
            ElseBlock::Else { body } => {
                if !rest.is_empty() {
                    return Err(misplaced_else());
                }
                let mut stmts = vec![Stmt::new(
                    line,
                    StmtKind::StartFrame {
                        kind: TraceKind::Else,
                        child_set: "block",
                    },
                )];
                stmts.extend(self.lower_suite(body, true)?);
                stmts.push(Stmt::new(line, StmtKind::EndFrame));
                Ok(stmts)
            }
        }
    }

    fn lower_plain_else_chain(&mut self, chain: &[ElseBlock]) -> Result<Vec<Stmt>, CompileError> {
        let Some((first, rest)) = chain.split_first() else {
            return Ok(Vec::new());
        };
        let line = self.take_line();
        match first {
            ElseBlock::Elif { condition, body } => {
                let condition = parse_required(condition, tags::PYTHON_ELIF_STATEMENT, "condition")?;
                let body = self.lower_suite(body, false)?;
                let orelse = self.lower_plain_else_chain(rest)?;
                Ok(vec![Stmt::new(
                    line,
                    StmtKind::If {
                        condition,
                        body,
                        orelse,
                    },
                )])
            }
            ElseBlock::Else { body } => {
                if !rest.is_empty() {
                    return Err(misplaced_else());
                }
                self.lower_suite(body, false)
            }
        }
    }

    /// Lower a declaration's body twice, numbering both from the `def` line.
    fn lower_function(&mut self, declaration: &FunctionDeclaration) -> Result<FunctionCode, CompileError> {
        let saved_line = self.next_line;
        let saved_loop_depth = self.loop_depth;
        let saved_in_function = self.in_function;
        self.loop_depth = 0;
        self.in_function = true;

        let result = self.lower_function_bodies(&declaration.body);

        self.loop_depth = saved_loop_depth;
        self.in_function = saved_in_function;
        let (traced, plain, body_lines) = result?;
        self.next_line = saved_line + body_lines;

        let mut locals: FxHashSet<String> = declaration.params.iter().cloned().collect();
        collect_bound_names(&declaration.body, &mut locals);

        tracing::debug!(
            function = %declaration.name,
            id = declaration.capture_id(),
            locals = locals.len(),
            "lowered function"
        );

        Ok(FunctionCode {
            name: declaration.name.clone(),
            id: declaration.capture_id().to_string(),
            params: declaration.params.clone(),
            locals,
            traced,
            plain,
        })
    }

    /// Traced and plain bodies, plus the number of lines the body occupies.
    fn lower_function_bodies(&mut self, body: &[Statement]) -> Result<(Vec<Stmt>, Vec<Stmt>, u32), CompileError> {
        self.next_line = 2;
        let mut traced = self.lower_suite(body, true)?;
        traced.push(Stmt::new(1, StmtKind::EndFrame));
        let body_lines = self.next_line - 2;

        self.next_line = 2;
        let plain = self.lower_suite(body, false)?;
        Ok((traced, plain, body_lines))
    }
}

fn log(kind: TraceKind, value: Expr) -> Expr {
    Expr::Log {
        kind: Some(kind),
        value: Box::new(value),
    }
}

/// Body of a traced loop iteration: runs under `block` and closes the
/// iteration frame when it completes.
fn iteration_body(line: u32, lowered: Vec<Stmt>) -> Vec<Stmt> {
    let mut body = Vec::with_capacity(lowered.len() + 2);
    body.push(Stmt::new(line, StmtKind::StartChildSet("block")));
    body.extend(lowered);
    body.push(Stmt::new(line, StmtKind::EndFrame));
    body
}

fn misplaced_else() -> CompileError {
    CompileError::InvalidStructure {
        message: "'else' must be the last block of an if statement".to_string(),
    }
}

/// Assignment or loop targets; several tokens form a tuple target.
fn lower_targets(targets: &[Token]) -> Result<Target, CompileError> {
    match targets {
        [] => Err(CompileError::MissingChildSet {
            tag: tags::PYTHON_ASSIGNMENT.to_string(),
            child_set: "left",
        }),
        [single] => lower_target(single),
        many => Ok(Target::Tuple(
            many.iter().map(lower_target).collect::<Result<Vec<_>, _>>()?,
        )),
    }
}

fn lower_target(token: &Token) -> Result<Target, CompileError> {
    match token {
        Token::Identifier(name) => Ok(Target::Name(name.clone())),
        Token::Subscript { target, key } => Ok(Target::Subscript {
            value: token_expr(target)?,
            index: parse_required(key, tags::PYTHON_SUBSCRIPT, "key")?,
        }),
        Token::Tuple(elements) | Token::List(elements) => Ok(Target::Tuple(
            elements
                .iter()
                .filter(|e| !e.is_empty())
                .map(element_target)
                .collect::<Result<Vec<_>, _>>()?,
        )),
        Token::Bracket(inner) => element_target(inner),
        Token::Slice { .. } => Err(CompileError::unsupported("slice assignment")),
        other => Err(CompileError::UnrecognizedNode {
            tag: other.tag().to_string(),
            context: "assignable",
        }),
    }
}

fn element_target(expression: &Expression) -> Result<Target, CompileError> {
    match expression.tokens.as_slice() {
        [single] => lower_target(single),
        _ => Err(CompileError::unsupported("assignment to an expression")),
    }
}

/// Names a function body binds: assignment and loop targets, nested function
/// names and imports. Nested function bodies are their own scope.
fn collect_bound_names(body: &[Statement], names: &mut FxHashSet<String>) {
    for statement in body {
        match statement {
            Statement::Assignment { targets, .. } => collect_target_names(targets, names),
            Statement::For { targets, body, .. } => {
                collect_target_names(targets, names);
                collect_bound_names(body, names);
            }
            Statement::While { body, .. } => collect_bound_names(body, names),
            Statement::If {
                body, else_blocks, ..
            } => {
                collect_bound_names(body, names);
                for block in else_blocks {
                    match block {
                        ElseBlock::Elif { body, .. } | ElseBlock::Else { body } => {
                            collect_bound_names(body, names)
                        }
                    }
                }
            }
            Statement::FunctionDeclaration(declaration) => {
                names.insert(declaration.name.clone());
            }
            Statement::Import(modules) => names.extend(modules.iter().cloned()),
            Statement::FromImport { names: imported, .. } => names.extend(imported.iter().cloned()),
            Statement::Blank
            | Statement::Comment(_)
            | Statement::Expression(_)
            | Statement::Return(_)
            | Statement::Break
            | Statement::Continue => {}
        }
    }
}

fn collect_target_names(targets: &[Token], names: &mut FxHashSet<String>) {
    for target in targets {
        match target {
            Token::Identifier(name) => {
                names.insert(name.clone());
            }
            Token::Tuple(elements) | Token::List(elements) => {
                for element in elements {
                    collect_target_names(&element.tokens, names);
                }
            }
            Token::Bracket(inner) => collect_target_names(&inner.tokens, names),
            _ => {}
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tree::ast::{Argument, Number};

    fn ident(name: &str) -> Token {
        Token::Identifier(name.to_string())
    }

    fn expr(tokens: Vec<Token>) -> Expression {
        Expression::new(tokens)
    }

    fn int(i: i64) -> Token {
        Token::Number(Number::Int(i))
    }

    fn print_call(arg: Token) -> Statement {
        Statement::Expression(expr(vec![Token::CallVariable {
            name: "print".to_string(),
            args: vec![Argument::Positional(expr(vec![arg]))],
        }]))
    }

    fn kinds(body: &[Stmt]) -> Vec<String> {
        body.iter()
            .map(|s| match &s.kind {
                StmtKind::StartFrame { kind, child_set } => format!("start {} {}", kind.as_str(), child_set),
                StmtKind::StartChildSet(name) => format!("childset {}", name),
                StmtKind::EndFrame => "end".to_string(),
                StmtKind::EndLoop => "endloop".to_string(),
                StmtKind::Expr(_) => "expr".to_string(),
                StmtKind::Assign { .. } => "assign".to_string(),
                StmtKind::If { .. } => "if".to_string(),
                StmtKind::While { .. } => "while".to_string(),
                StmtKind::For { .. } => "for".to_string(),
                StmtKind::FunctionDef(_) => "def".to_string(),
                StmtKind::Return(_) => "return".to_string(),
                StmtKind::Break => "break".to_string(),
                StmtKind::Continue => "continue".to_string(),
                StmtKind::Import(_) => "import".to_string(),
                StmtKind::FromImport { .. } => "from".to_string(),
            })
            .collect()
    }

    #[test]
    fn test_expression_statement_is_logged() {
        let program = lower_module(&[print_call(int(1))]).unwrap();
        assert_eq!(program.body.len(), 1);
        assert!(matches!(
            &program.body[0].kind,
            StmtKind::Expr(Expr::Log { kind: Some(TraceKind::Expression), .. })
        ));
    }

    #[test]
    fn test_empty_expression_statement_is_skipped() {
        let program = lower_module(&[Statement::Expression(Expression::default()), Statement::Blank]).unwrap();
        assert!(program.body.is_empty());
    }

    #[test]
    fn test_while_loop_shape() {
        let program = lower_module(&[Statement::While {
            condition: expr(vec![Token::Bool(false)]),
            body: vec![print_call(int(1))],
        }])
        .unwrap();
        assert_eq!(
            kinds(&program.body),
            vec!["start PYTHON_WHILE_LOOP frames", "while", "endloop", "end"]
        );
        match &program.body[1].kind {
            StmtKind::While { condition, body } => {
                assert!(matches!(
                    condition,
                    Expr::LogAndStartFrame { kind: TraceKind::WhileIteration, child_set: "condition", .. }
                ));
                assert_eq!(kinds(body), vec!["childset block", "expr", "end"]);
            }
            other => panic!("Expected while, got {:?}", other),
        }
    }

    #[test]
    fn test_if_chain_shape() {
        let program = lower_module(&[Statement::If {
            condition: expr(vec![Token::Bool(true)]),
            body: vec![print_call(int(1))],
            else_blocks: vec![
                ElseBlock::Elif {
                    condition: expr(vec![Token::Bool(false)]),
                    body: vec![print_call(int(2))],
                },
                ElseBlock::Else {
                    body: vec![print_call(int(3))],
                },
            ],
        }])
        .unwrap();
        assert_eq!(kinds(&program.body), vec!["if", "end"]);
        let StmtKind::If { body, orelse, .. } = &program.body[0].kind else {
            panic!("Expected if");
        };
        assert_eq!(kinds(body), vec!["childset trueblock", "expr"]);
        assert_eq!(kinds(orelse), vec!["childset elseblocks", "if"]);
        let StmtKind::If { body, orelse, .. } = &orelse[1].kind else {
            panic!("Expected elif");
        };
        assert_eq!(kinds(body), vec!["childset block", "expr", "end"]);
        assert_eq!(
            kinds(orelse),
            vec!["end", "start PYTHON_ELSE_STATEMENT block", "expr", "end"]
        );
    }

    #[test]
    fn test_if_without_else_has_no_elseblocks() {
        let program = lower_module(&[Statement::If {
            condition: expr(vec![Token::Bool(true)]),
            body: vec![],
            else_blocks: vec![],
        }])
        .unwrap();
        let StmtKind::If { orelse, .. } = &program.body[0].kind else {
            panic!("Expected if");
        };
        assert!(orelse.is_empty());
    }

    #[test]
    fn test_else_must_be_last() {
        let err = lower_module(&[Statement::If {
            condition: expr(vec![Token::Bool(true)]),
            body: vec![],
            else_blocks: vec![
                ElseBlock::Else { body: vec![] },
                ElseBlock::Elif {
                    condition: expr(vec![Token::Bool(true)]),
                    body: vec![],
                },
            ],
        }])
        .unwrap_err();
        assert!(matches!(err, CompileError::InvalidStructure { .. }));
    }

    #[test]
    fn test_break_unwinds_to_loop() {
        let program = lower_module(&[Statement::For {
            targets: vec![ident("i")],
            iterable: expr(vec![ident("xs")]),
            body: vec![Statement::Break],
        }])
        .unwrap();
        assert_eq!(kinds(&program.body), vec!["start PYTHON_FOR_LOOP frames", "for", "end"]);
        let StmtKind::For { body, iterable, .. } = &program.body[1].kind else {
            panic!("Expected for");
        };
        assert!(matches!(iterable, Expr::TraceEach { kind: TraceKind::ForIteration, .. }));
        assert_eq!(kinds(body), vec!["childset block", "endloop", "break", "end"]);
    }

    #[test]
    fn test_structure_errors() {
        assert!(matches!(
            lower_module(&[Statement::Break]).unwrap_err(),
            CompileError::InvalidStructure { .. }
        ));
        assert!(matches!(
            lower_module(&[Statement::Return(Expression::default())]).unwrap_err(),
            CompileError::InvalidStructure { .. }
        ));
        // loop depth does not leak into a nested def
        let err = lower_module(&[Statement::While {
            condition: expr(vec![Token::Bool(true)]),
            body: vec![Statement::FunctionDeclaration(FunctionDeclaration {
                name: "f".to_string(),
                id: None,
                params: vec![],
                body: vec![Statement::Continue],
            })],
        }])
        .unwrap_err();
        assert!(matches!(err, CompileError::InvalidStructure { .. }));
    }

    #[test]
    fn test_slice_target_is_unsupported() {
        let err = lower_module(&[Statement::Assignment {
            targets: vec![Token::Slice {
                target: Box::new(ident("xs")),
                start: Expression::default(),
                end: Expression::default(),
            }],
            value: expr(vec![ident("ys")]),
        }])
        .unwrap_err();
        assert!(matches!(err, CompileError::Unsupported { .. }));
    }

    #[test]
    fn test_assignment_needs_value() {
        let err = lower_module(&[Statement::Assignment {
            targets: vec![ident("x")],
            value: Expression::default(),
        }])
        .unwrap_err();
        assert!(matches!(err, CompileError::MissingExpression { .. }));
    }

    #[test]
    fn test_function_lines_and_locals() {
        // def recurse(num):           1
        //     if num == 200:          2
        //         print(200)          3
        //         print('Hello' + 4)  4
        //     recurse(num + 1)        5
        let body = vec![
            Statement::If {
                condition: expr(vec![ident("num"), Token::Operator("==".to_string()), int(200)]),
                body: vec![
                    print_call(int(200)),
                    print_call(int(4)),
                ],
                else_blocks: vec![],
            },
            Statement::Expression(expr(vec![Token::CallVariable {
                name: "recurse".to_string(),
                args: vec![],
            }])),
        ];
        let declaration = FunctionDeclaration {
            name: "recurse".to_string(),
            id: None,
            params: vec!["num".to_string()],
            body,
        };
        let program = lower_module(&[
            Statement::FunctionDeclaration(declaration),
            Statement::Assignment {
                targets: vec![ident("x")],
                value: expr(vec![int(1)]),
            },
        ])
        .unwrap();

        let StmtKind::FunctionDef(code) = &program.body[0].kind else {
            panic!("Expected def");
        };
        assert_eq!(code.id, "recurse");
        assert!(code.locals.contains("num"));
        assert_eq!(code.locals.len(), 1);

        let StmtKind::If { body, .. } = &code.plain[0].kind else {
            panic!("Expected if");
        };
        assert_eq!(code.plain[0].line, 2);
        assert_eq!(body[1].line, 4);
        assert_eq!(code.plain[1].line, 5);
        assert!(matches!(code.traced.last().map(|s| &s.kind), Some(StmtKind::EndFrame)));

        // the module continues after the function's lines
        assert_eq!(program.body[1].line, 6);
    }

    #[test]
    fn test_locals_include_every_binding() {
        let mut names = FxHashSet::default();
        collect_bound_names(
            &[
                Statement::For {
                    targets: vec![ident("a"), ident("b")],
                    iterable: expr(vec![ident("pairs")]),
                    body: vec![Statement::Assignment {
                        targets: vec![ident("total")],
                        value: expr(vec![int(0)]),
                    }],
                },
                Statement::Import(vec!["math".to_string()]),
                Statement::Assignment {
                    targets: vec![Token::Subscript {
                        target: Box::new(ident("board")),
                        key: expr(vec![int(0)]),
                    }],
                    value: expr(vec![int(1)]),
                },
            ],
            &mut names,
        );
        let mut sorted: Vec<_> = names.into_iter().collect();
        sorted.sort();
        assert_eq!(sorted, vec!["a", "b", "math", "total"]);
    }
}
