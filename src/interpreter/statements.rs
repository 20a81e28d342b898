//! Statement execution implementation
//!
//! This module handles the execution of every lowered statement kind:
//!
//! - Expression statements and assignments
//! - Conditionals (loops live in [`super::loops`])
//! - Function definitions, returns, `break` and `continue`
//! - Imports of the built-in modules
//! - Trace instructions, which are forwarded to the capture engine
//!
//! # Control Flow
//!
//! `break`, `continue` and `return` are reported as [`Flow`] values and
//! bubble up through [`Interpreter::execute_block`] until a loop or call
//! consumes them. Runtime errors use `Err` and bubble up the same way.

use crate::compiler::ir::{Stmt, StmtKind};
use crate::interpreter::engine::{Flow, Interpreter};
use crate::interpreter::errors::{ExceptionType, RuntimeError};
use crate::interpreter::modules;
use crate::memory::value::Value;

impl Interpreter<'_> {
    pub(crate) fn execute_statement(&mut self, stmt: &Stmt) -> Result<Flow, RuntimeError> {
        if let Some(frame) = self.stack.current_frame_mut() {
            frame.line = stmt.line;
        }

        match &stmt.kind {
            StmtKind::Expr(expr) => {
                self.evaluate_expr(expr)?;
                Ok(Flow::Normal)
            }

            StmtKind::Assign { target, value } => {
                let value = self.evaluate_expr(value)?;
                self.assign_target(target, value)?;
                Ok(Flow::Normal)
            }

            StmtKind::If {
                condition,
                body,
                orelse,
            } => {
                if self.evaluate_expr(condition)?.is_truthy() {
                    self.execute_block(body)
                } else {
                    self.execute_block(orelse)
                }
            }

            StmtKind::While { condition, body } => self.execute_while(condition, body),

            StmtKind::For {
                target,
                iterable,
                body,
            } => self.execute_for(target, iterable, body),

            StmtKind::FunctionDef(code) => {
                self.store_name(&code.name, Value::Function(code.clone()));
                Ok(Flow::Normal)
            }

            StmtKind::Return(value) => {
                let value = self.evaluate_expr(value)?;
                Ok(Flow::Return(value))
            }

            StmtKind::Break => Ok(Flow::Break),
            StmtKind::Continue => Ok(Flow::Continue),

            StmtKind::Import(names) => {
                for name in names {
                    let module = modules::load(name)?;
                    self.store_name(name, Value::Module(module));
                }
                Ok(Flow::Normal)
            }

            StmtKind::FromImport { module, names } => {
                let loaded = modules::load(module)?;
                for name in names {
                    let value = loaded.attribute(name).ok_or_else(|| {
                        RuntimeError::new(
                            ExceptionType::ImportError,
                            format!("cannot import name '{}' from '{}'", name, module),
                        )
                    })?;
                    self.store_name(name, value);
                }
                Ok(Flow::Normal)
            }

            StmtKind::StartFrame { kind, child_set } => {
                self.capture.start_frame(*kind, *child_set)?;
                Ok(Flow::Normal)
            }

            StmtKind::StartChildSet(child_set) => {
                self.capture.start_child_set(*child_set);
                Ok(Flow::Normal)
            }

            StmtKind::EndFrame => {
                self.capture.end_frame();
                Ok(Flow::Normal)
            }

            StmtKind::EndLoop => {
                self.capture.end_loop();
                Ok(Flow::Normal)
            }
        }
    }
}
