//! Unary operator evaluation

use crate::compiler::ir::Expr;
use crate::compiler::operators::UnaryOp;
use crate::interpreter::engine::Interpreter;
use crate::interpreter::errors::RuntimeError;
use crate::memory::value::{Number, Value};

impl Interpreter<'_> {
    pub(crate) fn evaluate_unary_op(
        &mut self,
        op: UnaryOp,
        operand: &Expr,
    ) -> Result<Value, RuntimeError> {
        let value = self.evaluate_expr(operand)?;
        unary_op(op, &value)
    }
}

pub fn unary_op(op: UnaryOp, value: &Value) -> Result<Value, RuntimeError> {
    let bad_operand = || {
        RuntimeError::type_error(format!(
            "bad operand type for unary {}: '{}'",
            op.symbol(),
            value.type_name()
        ))
    };

    match op {
        UnaryOp::Not => Ok(Value::Bool(!value.is_truthy())),
        UnaryOp::Plus => match value.as_number() {
            Some(Number::Int(i)) => Ok(Value::Int(i)),
            Some(Number::Float(f)) => Ok(Value::Float(f)),
            None => Err(bad_operand()),
        },
        UnaryOp::Minus => match value.as_number() {
            Some(Number::Int(i)) => i
                .checked_neg()
                .map(Value::Int)
                .ok_or_else(|| RuntimeError::overflow("unary -")),
            Some(Number::Float(f)) => Ok(Value::Float(-f)),
            None => Err(bad_operand()),
        },
        UnaryOp::Invert => match value {
            Value::Int(_) | Value::Bool(_) => Ok(Value::Int(!value.as_index()?)),
            _ => Err(bad_operand()),
        },
    }
}
