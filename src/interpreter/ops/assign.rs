//! Assignment to targets
//!
//! A target is a name, a subscript, or a tuple of targets. Tuple targets
//! unpack any iterable and require the element count to match exactly.

use crate::compiler::ir::Target;
use crate::interpreter::engine::Interpreter;
use crate::interpreter::errors::RuntimeError;
use crate::interpreter::ops::access::set_item;
use crate::memory::value::Value;

impl Interpreter<'_> {
    pub(crate) fn assign_target(&mut self, target: &Target, value: Value) -> Result<(), RuntimeError> {
        match target {
            Target::Name(name) => {
                self.store_name(name, value);
                Ok(())
            }
            Target::Subscript {
                value: container,
                index,
            } => {
                let container = self.evaluate_expr(container)?;
                let index = self.evaluate_expr(index)?;
                set_item(&container, &index, value)
            }
            Target::Tuple(targets) => {
                let values = unpack(&value, targets.len())?;
                for (target, value) in targets.iter().zip(values) {
                    self.assign_target(target, value)?;
                }
                Ok(())
            }
        }
    }
}

fn unpack(value: &Value, expected: usize) -> Result<Vec<Value>, RuntimeError> {
    let values = value.to_vec().map_err(|_| {
        RuntimeError::type_error(format!(
            "cannot unpack non-iterable {} object",
            value.type_name()
        ))
    })?;
    if values.len() < expected {
        return Err(RuntimeError::value_error(format!(
            "not enough values to unpack (expected {}, got {})",
            expected,
            values.len()
        )));
    }
    if values.len() > expected {
        return Err(RuntimeError::value_error(format!(
            "too many values to unpack (expected {})",
            expected
        )));
    }
    Ok(values)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_unpack_counts() {
        let pair = Value::tuple(vec![Value::Int(1), Value::Int(2)]);
        assert_eq!(unpack(&pair, 2).unwrap().len(), 2);
        assert_eq!(
            unpack(&pair, 3).unwrap_err().message,
            "not enough values to unpack (expected 3, got 2)"
        );
        assert_eq!(
            unpack(&pair, 1).unwrap_err().message,
            "too many values to unpack (expected 1)"
        );
        assert_eq!(
            unpack(&Value::Int(5), 2).unwrap_err().message,
            "cannot unpack non-iterable int object"
        );
    }

    #[test]
    fn test_unpack_string() {
        let chars = unpack(&Value::str("ab"), 2).unwrap();
        assert_eq!(chars[1].py_str(), "b");
    }
}
