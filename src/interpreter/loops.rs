//! Loop statement execution (`while`, `for`).
//!
//! Adds `impl Interpreter` methods for the two loop forms. `break` and
//! `continue` are turned into a [`LoopBodyResult`] so the loop driver can react
//! without inspecting the [`Flow`] of each statement.
//!
//! `return` inside a loop body yields `LoopBodyResult::Exit`, which causes
//! the loop to stop immediately and hand the returned value to the caller.
//!
//! A traced `for` loop iterates a [`Expr::TraceEach`] iterable: every element
//! opens an iteration frame and is recorded as that frame's first entry
//! before it is bound to the loop target.

use crate::capture::TraceKind;
use crate::compiler::ir::{Expr, Stmt, Target};
use crate::interpreter::engine::{Flow, Interpreter};
use crate::interpreter::errors::RuntimeError;
use crate::memory::value::Value;

/// Result returned by [`Interpreter::execute_loop_body`] to signal how the body ended.
pub(crate) enum LoopBodyResult {
    /// Body completed normally or via `continue`; the loop should iterate again.
    Continue,
    /// `break` was encountered; the loop should exit cleanly.
    Break,
    /// `return` was executed; the loop driver hands the flow to its caller.
    Exit(Flow),
}

impl Interpreter<'_> {
    pub(crate) fn execute_loop_body(&mut self, body: &[Stmt]) -> Result<LoopBodyResult, RuntimeError> {
        Ok(match self.execute_block(body)? {
            Flow::Normal | Flow::Continue => LoopBodyResult::Continue,
            Flow::Break => LoopBodyResult::Break,
            flow @ Flow::Return(_) => LoopBodyResult::Exit(flow),
        })
    }

    /// Executes a `while condition: body` loop.
    ///
    /// The condition is evaluated before each iteration; in traced code it
    /// also opens the iteration frame.
    pub(crate) fn execute_while(&mut self, condition: &Expr, body: &[Stmt]) -> Result<Flow, RuntimeError> {
        while self.evaluate_expr(condition)?.is_truthy() {
            match self.execute_loop_body(body)? {
                LoopBodyResult::Continue => {}
                LoopBodyResult::Break => break,
                LoopBodyResult::Exit(flow) => return Ok(flow),
            }
        }
        Ok(Flow::Normal)
    }

    /// Executes a `for target in iterable: body` loop.
    ///
    /// The iterable is evaluated once and its elements are snapshotted, so
    /// mutating a list while iterating over it does not change the iteration.
    pub(crate) fn execute_for(
        &mut self,
        target: &Target,
        iterable: &Expr,
        body: &[Stmt],
    ) -> Result<Flow, RuntimeError> {
        let (trace, iterable) = match iterable {
            Expr::TraceEach {
                kind,
                child_set,
                iterable,
            } => (Some((*kind, *child_set)), &**iterable),
            other => (None, other),
        };

        let items = self.evaluate_expr(iterable)?.iterate()?;
        for item in items {
            if let Some((kind, child_set)) = trace {
                self.start_iteration(kind, child_set, &item)?;
            }
            self.assign_target(target, item)?;
            match self.execute_loop_body(body)? {
                LoopBodyResult::Continue => {}
                LoopBodyResult::Break => break,
                LoopBodyResult::Exit(flow) => return Ok(flow),
            }
        }
        Ok(Flow::Normal)
    }

    fn start_iteration(
        &mut self,
        kind: TraceKind,
        child_set: &'static str,
        item: &Value,
    ) -> Result<(), RuntimeError> {
        self.capture.start_frame(kind, child_set)?;
        self.capture.log_expression_result(None, item);
        Ok(())
    }
}
