//! Subscript, slice and attribute access

use crate::compiler::ir::Expr;
use crate::interpreter::engine::Interpreter;
use crate::interpreter::errors::RuntimeError;
use crate::interpreter::methods::has_method;
use crate::memory::value::{range_len, Value};

impl Interpreter<'_> {
    pub(crate) fn evaluate_subscript(
        &mut self,
        value: &Expr,
        index: &Expr,
    ) -> Result<Value, RuntimeError> {
        let container = self.evaluate_expr(value)?;
        let index = self.evaluate_expr(index)?;
        get_item(&container, &index)
    }

    pub(crate) fn evaluate_slice(
        &mut self,
        value: &Expr,
        lower: Option<&Expr>,
        upper: Option<&Expr>,
    ) -> Result<Value, RuntimeError> {
        let container = self.evaluate_expr(value)?;
        let lower = match lower {
            Some(expr) => slice_bound(&self.evaluate_expr(expr)?)?,
            None => None,
        };
        let upper = match upper {
            Some(expr) => slice_bound(&self.evaluate_expr(expr)?)?,
            None => None,
        };
        slice(&container, lower, upper)
    }

    /// `value.attr` outside a call: module attributes and bound methods.
    pub(crate) fn evaluate_attribute(&mut self, value: &Expr, attr: &str) -> Result<Value, RuntimeError> {
        let receiver = self.evaluate_expr(value)?;
        get_attribute(receiver, attr)
    }
}

pub fn get_attribute(receiver: Value, attr: &str) -> Result<Value, RuntimeError> {
    if let Value::Module(module) = &receiver {
        return module.attribute(attr).ok_or_else(|| {
            RuntimeError::attribute_error(format!(
                "module '{}' has no attribute '{}'",
                module.name, attr
            ))
        });
    }
    if has_method(&receiver, attr) {
        return Ok(Value::BoundMethod {
            receiver: Box::new(receiver),
            name: attr.into(),
        });
    }
    Err(RuntimeError::attribute_error(format!(
        "'{}' object has no attribute '{}'",
        receiver.type_name(),
        attr
    )))
}

/// `None` bounds stay open; anything else must be an integer.
fn slice_bound(value: &Value) -> Result<Option<i64>, RuntimeError> {
    match value {
        Value::None => Ok(None),
        Value::Int(_) | Value::Bool(_) => Ok(Some(value.as_index()?)),
        _ => Err(RuntimeError::type_error(
            "slice indices must be integers or None",
        )),
    }
}

/// Resolve a possibly negative index against `len`.
pub fn normalize_index(index: i64, len: usize) -> Option<usize> {
    let len = i64::try_from(len).ok()?;
    let resolved = if index < 0 { index + len } else { index };
    if (0..len).contains(&resolved) {
        usize::try_from(resolved).ok()
    } else {
        None
    }
}

/// Clamp slice bounds to `0..=len`, Python style.
fn slice_range(lower: Option<i64>, upper: Option<i64>, len: usize) -> (usize, usize) {
    let len_i = i64::try_from(len).unwrap_or(i64::MAX);
    let clamp = |bound: i64| {
        let resolved = if bound < 0 { bound + len_i } else { bound };
        usize::try_from(resolved.clamp(0, len_i)).unwrap_or(0)
    };
    let start = lower.map_or(0, clamp);
    let stop = upper.map_or(len, clamp);
    (start, stop.max(start))
}

fn list_index(container: &Value, index: &Value) -> Result<i64, RuntimeError> {
    match index {
        Value::Int(_) | Value::Bool(_) => index.as_index(),
        other => Err(RuntimeError::type_error(format!(
            "{} indices must be integers or slices, not {}",
            container.type_name(),
            other.type_name()
        ))),
    }
}

pub fn get_item(container: &Value, index: &Value) -> Result<Value, RuntimeError> {
    let out_of_range = || RuntimeError::index_error(format!("{} index out of range", container.type_name()));
    match container {
        Value::List(items) => {
            let items = items.borrow();
            let i = list_index(container, index)?;
            normalize_index(i, items.len())
                .map(|i| items[i].clone())
                .ok_or_else(out_of_range)
        }
        Value::Tuple(items) => {
            let i = list_index(container, index)?;
            normalize_index(i, items.len())
                .map(|i| items[i].clone())
                .ok_or_else(out_of_range)
        }
        Value::Str(s) => {
            let i = match index {
                Value::Int(_) | Value::Bool(_) => index.as_index()?,
                other => {
                    return Err(RuntimeError::type_error(format!(
                        "string indices must be integers, not '{}'",
                        other.type_name()
                    )))
                }
            };
            let chars: Vec<char> = s.chars().collect();
            normalize_index(i, chars.len())
                .map(|i| Value::str(&chars[i].to_string()))
                .ok_or_else(|| RuntimeError::index_error("string index out of range"))
        }
        Value::Range { start, stop, step } => {
            let i = list_index(container, index)?;
            let len = usize::try_from(range_len(*start, *stop, *step)).unwrap_or(0);
            let position = normalize_index(i, len)
                .ok_or_else(|| RuntimeError::index_error("range object index out of range"))?;
            Ok(Value::Int(start.saturating_add(step.saturating_mul(position as i64))))
        }
        Value::Dict(map) => {
            let key = index.hash_key()?;
            map.borrow()
                .get(&key)
                .map(|(_, value)| value.clone())
                .ok_or_else(|| RuntimeError::key_error(index.repr()))
        }
        other => Err(RuntimeError::type_error(format!(
            "'{}' object is not subscriptable",
            other.type_name()
        ))),
    }
}

pub fn slice(container: &Value, lower: Option<i64>, upper: Option<i64>) -> Result<Value, RuntimeError> {
    match container {
        Value::List(items) => {
            let items = items.borrow();
            let (start, stop) = slice_range(lower, upper, items.len());
            Ok(Value::list(items[start..stop].to_vec()))
        }
        Value::Tuple(items) => {
            let (start, stop) = slice_range(lower, upper, items.len());
            Ok(Value::tuple(items[start..stop].to_vec()))
        }
        Value::Str(s) => {
            let chars: Vec<char> = s.chars().collect();
            let (start, stop) = slice_range(lower, upper, chars.len());
            Ok(Value::str(&chars[start..stop].iter().collect::<String>()))
        }
        Value::Range { start, stop, step } => {
            let len = usize::try_from(range_len(*start, *stop, *step)).unwrap_or(0);
            let (from, to) = slice_range(lower, upper, len);
            Ok(Value::Range {
                start: start.saturating_add(step.saturating_mul(from as i64)),
                stop: start.saturating_add(step.saturating_mul(to as i64)),
                step: *step,
            })
        }
        other => Err(RuntimeError::type_error(format!(
            "'{}' object is not subscriptable",
            other.type_name()
        ))),
    }
}

/// `container[index] = value`
pub fn set_item(container: &Value, index: &Value, value: Value) -> Result<(), RuntimeError> {
    match container {
        Value::List(items) => {
            let i = list_index(container, index)?;
            let mut items = items.borrow_mut();
            let position = normalize_index(i, items.len())
                .ok_or_else(|| RuntimeError::index_error("list assignment index out of range"))?;
            items[position] = value;
            Ok(())
        }
        Value::Dict(map) => {
            let key = index.hash_key()?;
            map.borrow_mut().insert(key, (index.clone(), value));
            Ok(())
        }
        other => Err(RuntimeError::type_error(format!(
            "'{}' object does not support item assignment",
            other.type_name()
        ))),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample() -> Value {
        Value::list(vec![Value::Int(10), Value::Int(20), Value::Int(30)])
    }

    #[test]
    fn test_negative_indices() {
        assert!(get_item(&sample(), &Value::Int(-1)).unwrap().py_eq(&Value::Int(30)));
        let err = get_item(&sample(), &Value::Int(3)).unwrap_err();
        assert_eq!(err.to_string(), "IndexError: list index out of range");
        assert_eq!(
            get_item(&Value::str("abc"), &Value::Int(-3)).unwrap().py_str(),
            "a"
        );
    }

    #[test]
    fn test_slices_clamp() {
        assert_eq!(slice(&sample(), Some(1), None).unwrap().repr(), "[20, 30]");
        assert_eq!(slice(&sample(), Some(-5), Some(100)).unwrap().repr(), "[10, 20, 30]");
        assert_eq!(slice(&sample(), Some(2), Some(1)).unwrap().repr(), "[]");
        assert_eq!(slice(&Value::str("hello"), None, Some(-1)).unwrap().py_str(), "hell");
        let range = Value::Range { start: 0, stop: 10, step: 2 };
        assert_eq!(slice(&range, Some(1), Some(3)).unwrap().repr(), "range(2, 6, 2)");
    }

    #[test]
    fn test_dict_items() {
        let dict = Value::dict(vec![]).unwrap();
        set_item(&dict, &Value::str("k"), Value::Int(1)).unwrap();
        assert!(get_item(&dict, &Value::str("k")).unwrap().py_eq(&Value::Int(1)));
        let err = get_item(&dict, &Value::str("missing")).unwrap_err();
        assert_eq!(err.to_string(), "KeyError: 'missing'");
    }

    #[test]
    fn test_immutable_assignment() {
        let tuple = Value::tuple(vec![Value::Int(1)]);
        let err = set_item(&tuple, &Value::Int(0), Value::None).unwrap_err();
        assert_eq!(err.message, "'tuple' object does not support item assignment");
        let err = get_item(&Value::Int(1), &Value::Int(0)).unwrap_err();
        assert_eq!(err.message, "'int' object is not subscriptable");
    }
}
