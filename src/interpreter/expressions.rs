//! Expression evaluation implementation
//!
//! This module handles evaluation of every lowered expression kind:
//!
//! - Constants and names
//! - Unary, binary and comparison operators (see [`super::ops`])
//! - Short-circuit `and`/`or`, which yield the deciding operand
//! - Calls, attribute access, subscripts and slices
//! - List, tuple, set and dict displays
//! - Trace wrappers, which record the inner value before yielding it
//!
//! # Evaluation Order
//!
//! Operands are evaluated left to right. A call evaluates the callee first,
//! then positional arguments, then keyword arguments.

use crate::compiler::ir::Expr;
use crate::compiler::operators::BoolOp;
use crate::interpreter::engine::Interpreter;
use crate::interpreter::errors::RuntimeError;
use crate::memory::value::Value;

impl Interpreter<'_> {
    /// Evaluate an expression and return its value
    pub(crate) fn evaluate_expr(&mut self, expr: &Expr) -> Result<Value, RuntimeError> {
        match expr {
            Expr::Const(constant) => Ok(Value::from(constant)),

            Expr::Name(name) => self.load_name(name),

            Expr::Unary { op, operand } => self.evaluate_unary_op(*op, operand),

            Expr::Binary { op, left, right } => self.evaluate_binary_op(*op, left, right),

            Expr::Bool { op, left, right } => {
                let left = self.evaluate_expr(left)?;
                let decided = match op {
                    BoolOp::And => !left.is_truthy(),
                    BoolOp::Or => left.is_truthy(),
                };
                if decided {
                    Ok(left)
                } else {
                    self.evaluate_expr(right)
                }
            }

            Expr::Compare {
                left,
                ops,
                comparators,
            } => self.evaluate_compare(left, ops, comparators),

            Expr::Call {
                func,
                args,
                keywords,
            } => {
                let callee = self.evaluate_expr(func)?;
                let args = self.evaluate_all(args)?;
                let mut kwargs = Vec::with_capacity(keywords.len());
                for (name, value) in keywords {
                    kwargs.push((name.clone(), self.evaluate_expr(value)?));
                }
                self.call_value(&callee, args, kwargs)
            }

            Expr::Attribute { value, attr } => self.evaluate_attribute(value, attr),

            Expr::Subscript { value, index } => self.evaluate_subscript(value, index),

            Expr::Slice {
                value,
                lower,
                upper,
            } => self.evaluate_slice(value, lower.as_deref(), upper.as_deref()),

            Expr::List(elements) => Ok(Value::list(self.evaluate_all(elements)?)),

            Expr::Tuple(elements) => Ok(Value::tuple(self.evaluate_all(elements)?)),

            Expr::Set(elements) => Value::set(self.evaluate_all(elements)?),

            Expr::Dict(entries) => {
                let mut pairs = Vec::with_capacity(entries.len());
                for (key, value) in entries {
                    let key = self.evaluate_expr(key)?;
                    let value = self.evaluate_expr(value)?;
                    pairs.push((key, value));
                }
                Value::dict(pairs)
            }

            Expr::Log { kind, value } => {
                let value = self.evaluate_expr(value)?;
                self.capture.log_expression_result(*kind, &value);
                Ok(value)
            }

            Expr::LogAndStartFrame {
                kind,
                child_set,
                value,
            } => {
                let value = self.evaluate_expr(value)?;
                self.capture
                    .log_expression_result_and_start_frame(*kind, *child_set, &value)?;
                Ok(value)
            }

            Expr::LogAndEndFrames { kind, until, value } => {
                let value = self.evaluate_expr(value)?;
                self.capture
                    .log_expression_result_and_end_frames(*kind, *until, &value);
                Ok(value)
            }

            // Per-element tracing is driven by the enclosing `for`
            Expr::TraceEach { iterable, .. } => self.evaluate_expr(iterable),
        }
    }

    fn evaluate_all(&mut self, exprs: &[Expr]) -> Result<Vec<Value>, RuntimeError> {
        exprs.iter().map(|expr| self.evaluate_expr(expr)).collect()
    }
}
