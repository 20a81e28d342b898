//! Binary and comparison operator evaluation
//!
//! Arithmetic on `int` is checked: results outside 64 bits raise
//! `OverflowError` instead of wrapping. Mixed `int`/`float` operands promote to
//! `float`, and `bool` counts as `int`.

use crate::compiler::ir::Expr;
use crate::compiler::operators::{BinOp, CmpOp};
use crate::interpreter::engine::Interpreter;
use crate::interpreter::errors::RuntimeError;
use crate::memory::value::{range_len, Number, Value};
use std::cmp::Ordering;
use std::rc::Rc;

impl Interpreter<'_> {
    pub(crate) fn evaluate_binary_op(
        &mut self,
        op: BinOp,
        left: &Expr,
        right: &Expr,
    ) -> Result<Value, RuntimeError> {
        let left = self.evaluate_expr(left)?;
        let right = self.evaluate_expr(right)?;
        binary_op(op, &left, &right)
    }

    /// `left op0 c0 op1 c1 ...`: each comparator is evaluated only if every
    /// previous pair held.
    pub(crate) fn evaluate_compare(
        &mut self,
        left: &Expr,
        ops: &[CmpOp],
        comparators: &[Expr],
    ) -> Result<Value, RuntimeError> {
        let mut current = self.evaluate_expr(left)?;
        for (op, comparator) in ops.iter().zip(comparators) {
            let next = self.evaluate_expr(comparator)?;
            if !compare_op(*op, &current, &next)? {
                return Ok(Value::Bool(false));
            }
            current = next;
        }
        Ok(Value::Bool(true))
    }
}

pub fn binary_op(op: BinOp, left: &Value, right: &Value) -> Result<Value, RuntimeError> {
    match op {
        BinOp::Add => add(left, right),
        BinOp::Sub => sub(left, right),
        BinOp::Mult => mult(left, right),
        BinOp::Div => div(left, right),
        BinOp::FloorDiv => floor_div(left, right),
        BinOp::Mod => modulo(left, right),
        BinOp::Pow => pow(left, right),
        BinOp::BitOr | BinOp::BitXor | BinOp::BitAnd => bitwise(op, left, right),
        BinOp::LShift | BinOp::RShift => shift(op, left, right),
        BinOp::MatMult => Err(unsupported(op.symbol(), left, right)),
    }
}

fn unsupported(symbol: &str, left: &Value, right: &Value) -> RuntimeError {
    RuntimeError::type_error(format!(
        "unsupported operand type(s) for {}: '{}' and '{}'",
        symbol,
        left.type_name(),
        right.type_name()
    ))
}

fn checked(result: Option<i64>, symbol: &str) -> Result<Value, RuntimeError> {
    result
        .map(Value::Int)
        .ok_or_else(|| RuntimeError::overflow(symbol))
}

/// Apply an arithmetic operator to two numeric operands, if both are numbers.
fn numeric(
    left: &Value,
    right: &Value,
    int_op: impl Fn(i64, i64) -> Result<Value, RuntimeError>,
    float_op: impl Fn(f64, f64) -> Result<Value, RuntimeError>,
) -> Option<Result<Value, RuntimeError>> {
    match (left.as_number()?, right.as_number()?) {
        (Number::Int(a), Number::Int(b)) => Some(int_op(a, b)),
        (a, b) => Some(float_op(a.as_f64(), b.as_f64())),
    }
}

fn add(left: &Value, right: &Value) -> Result<Value, RuntimeError> {
    if let Some(result) = numeric(
        left,
        right,
        |a, b| checked(a.checked_add(b), "+"),
        |a, b| Ok(Value::Float(a + b)),
    ) {
        return result;
    }
    match (left, right) {
        (Value::Str(a), Value::Str(b)) => Ok(Value::str(&format!("{}{}", a, b))),
        (Value::List(a), Value::List(b)) => {
            let mut items = a.borrow().clone();
            items.extend(b.borrow().iter().cloned());
            Ok(Value::list(items))
        }
        (Value::Tuple(a), Value::Tuple(b)) => {
            Ok(Value::tuple(a.iter().chain(b.iter()).cloned().collect()))
        }
        (Value::Str(_) | Value::List(_) | Value::Tuple(_), other) => {
            Err(RuntimeError::type_error(format!(
                "can only concatenate {} (not \"{}\") to {}",
                left.type_name(),
                other.type_name(),
                left.type_name()
            )))
        }
        _ => Err(unsupported("+", left, right)),
    }
}

fn sub(left: &Value, right: &Value) -> Result<Value, RuntimeError> {
    if let Some(result) = numeric(
        left,
        right,
        |a, b| checked(a.checked_sub(b), "-"),
        |a, b| Ok(Value::Float(a - b)),
    ) {
        return result;
    }
    match (left, right) {
        (Value::Set(a), Value::Set(b)) => {
            let b = b.borrow();
            let items = a
                .borrow()
                .iter()
                .filter(|(key, _)| !b.contains_key(*key))
                .map(|(_, value)| value.clone())
                .collect();
            Value::set(items)
        }
        _ => Err(unsupported("-", left, right)),
    }
}

fn repeat(items: &[Value], times: i64) -> Result<Vec<Value>, RuntimeError> {
    let times = usize::try_from(times.max(0)).map_err(|_| RuntimeError::overflow("*"))?;
    if items.len().checked_mul(times).is_none() {
        return Err(RuntimeError::overflow("*"));
    }
    let mut out = Vec::with_capacity(items.len() * times);
    for _ in 0..times {
        out.extend(items.iter().cloned());
    }
    Ok(out)
}

fn mult(left: &Value, right: &Value) -> Result<Value, RuntimeError> {
    if let Some(result) = numeric(
        left,
        right,
        |a, b| checked(a.checked_mul(b), "*"),
        |a, b| Ok(Value::Float(a * b)),
    ) {
        return result;
    }
    let (sequence, count) = match (left, right) {
        (Value::Str(_) | Value::List(_) | Value::Tuple(_), count) => (left, count),
        (count, Value::Str(_) | Value::List(_) | Value::Tuple(_)) => (right, count),
        _ => return Err(unsupported("*", left, right)),
    };
    let times = match count {
        Value::Int(_) | Value::Bool(_) => count.as_index()?,
        other => {
            return Err(RuntimeError::type_error(format!(
                "can't multiply sequence by non-int of type '{}'",
                other.type_name()
            )))
        }
    };
    match sequence {
        Value::Str(s) => {
            let times = usize::try_from(times.max(0)).map_err(|_| RuntimeError::overflow("*"))?;
            if s.len().checked_mul(times).is_none() {
                return Err(RuntimeError::overflow("*"));
            }
            Ok(Value::str(&s.repeat(times)))
        }
        Value::List(items) => Ok(Value::list(repeat(&items.borrow(), times)?)),
        Value::Tuple(items) => Ok(Value::tuple(repeat(items, times)?)),
        _ => Err(unsupported("*", left, right)),
    }
}

fn div(left: &Value, right: &Value) -> Result<Value, RuntimeError> {
    let float_div = |a: f64, b: f64| {
        if b == 0.0 {
            Err(RuntimeError::zero_division("division by zero"))
        } else {
            Ok(Value::Float(a / b))
        }
    };
    numeric(left, right, |a, b| float_div(a as f64, b as f64), float_div)
        .unwrap_or_else(|| Err(unsupported("/", left, right)))
}

fn floor_div(left: &Value, right: &Value) -> Result<Value, RuntimeError> {
    numeric(
        left,
        right,
        |a, b| {
            if b == 0 {
                return Err(RuntimeError::zero_division(
                    "integer division or modulo by zero",
                ));
            }
            checked(a.checked_div(b).map(|_| floor_div_int(a, b)), "//")
        },
        |a, b| {
            if b == 0.0 {
                Err(RuntimeError::zero_division("float floor division by zero"))
            } else {
                Ok(Value::Float((a / b).floor()))
            }
        },
    )
    .unwrap_or_else(|| Err(unsupported("//", left, right)))
}

/// Integer division rounding toward negative infinity. `b` is non-zero and
/// the quotient is known to fit.
fn floor_div_int(a: i64, b: i64) -> i64 {
    let quotient = a / b;
    if (a % b != 0) && ((a < 0) != (b < 0)) {
        quotient - 1
    } else {
        quotient
    }
}

fn modulo(left: &Value, right: &Value) -> Result<Value, RuntimeError> {
    numeric(
        left,
        right,
        |a, b| {
            if b == 0 {
                return Err(RuntimeError::zero_division("integer modulo by zero"));
            }
            let remainder = a.checked_rem(b).unwrap_or(0);
            if remainder != 0 && ((remainder < 0) != (b < 0)) {
                Ok(Value::Int(remainder + b))
            } else {
                Ok(Value::Int(remainder))
            }
        },
        |a, b| {
            if b == 0.0 {
                return Err(RuntimeError::zero_division("float modulo by zero"));
            }
            let remainder = a % b;
            if remainder != 0.0 && ((remainder < 0.0) != (b < 0.0)) {
                Ok(Value::Float(remainder + b))
            } else {
                Ok(Value::Float(remainder))
            }
        },
    )
    .unwrap_or_else(|| Err(unsupported("%", left, right)))
}

fn pow(left: &Value, right: &Value) -> Result<Value, RuntimeError> {
    let float_pow = |a: f64, b: f64| {
        if a == 0.0 && b < 0.0 {
            return Err(RuntimeError::zero_division(
                "0.0 cannot be raised to a negative power",
            ));
        }
        let result = a.powf(b);
        if result.is_nan() && !a.is_nan() && !b.is_nan() {
            return Err(RuntimeError::value_error("math domain error"));
        }
        Ok(Value::Float(result))
    };
    numeric(
        left,
        right,
        |a, b| {
            if b < 0 {
                return float_pow(a as f64, b as f64);
            }
            let exponent = match (a, u32::try_from(b)) {
                (_, Ok(exponent)) => exponent,
                // Bases 0, 1 and -1 stay in range for any exponent
                (0 | 1, Err(_)) => return Ok(Value::Int(a)),
                (-1, Err(_)) => return Ok(Value::Int(if b % 2 == 0 { 1 } else { -1 })),
                (_, Err(_)) => return Err(RuntimeError::overflow("**")),
            };
            checked(a.checked_pow(exponent), "**")
        },
        float_pow,
    )
    .unwrap_or_else(|| Err(unsupported("**", left, right)))
}

fn bitwise(op: BinOp, left: &Value, right: &Value) -> Result<Value, RuntimeError> {
    match (left, right) {
        (Value::Bool(a), Value::Bool(b)) => Ok(Value::Bool(match op {
            BinOp::BitOr => a | b,
            BinOp::BitXor => a ^ b,
            _ => a & b,
        })),
        (Value::Int(_) | Value::Bool(_), Value::Int(_) | Value::Bool(_)) => {
            let (a, b) = (left.as_index()?, right.as_index()?);
            Ok(Value::Int(match op {
                BinOp::BitOr => a | b,
                BinOp::BitXor => a ^ b,
                _ => a & b,
            }))
        }
        (Value::Set(a), Value::Set(b)) => {
            let (a, b) = (a.borrow(), b.borrow());
            let items: Vec<Value> = match op {
                BinOp::BitOr => a.values().chain(b.values()).cloned().collect(),
                BinOp::BitAnd => a
                    .iter()
                    .filter(|(key, _)| b.contains_key(*key))
                    .map(|(_, value)| value.clone())
                    .collect(),
                _ => a
                    .iter()
                    .filter(|(key, _)| !b.contains_key(*key))
                    .chain(b.iter().filter(|(key, _)| !a.contains_key(*key)))
                    .map(|(_, value)| value.clone())
                    .collect(),
            };
            Value::set(items)
        }
        (Value::Dict(a), Value::Dict(b)) if op == BinOp::BitOr => {
            let mut merged = a.borrow().clone();
            for (key, entry) in b.borrow().iter() {
                merged.insert(key.clone(), entry.clone());
            }
            Ok(Value::Dict(Rc::new(std::cell::RefCell::new(merged))))
        }
        _ => Err(unsupported(op.symbol(), left, right)),
    }
}

fn shift(op: BinOp, left: &Value, right: &Value) -> Result<Value, RuntimeError> {
    let (a, b) = match (left, right) {
        (Value::Int(_) | Value::Bool(_), Value::Int(_) | Value::Bool(_)) => {
            (left.as_index()?, right.as_index()?)
        }
        _ => return Err(unsupported(op.symbol(), left, right)),
    };
    if b < 0 {
        return Err(RuntimeError::value_error("negative shift count"));
    }
    if op == BinOp::RShift {
        return Ok(Value::Int(if b >= 64 {
            if a < 0 {
                -1
            } else {
                0
            }
        } else {
            a >> b
        }));
    }
    if a == 0 {
        return Ok(Value::Int(0));
    }
    if b >= 64 {
        return Err(RuntimeError::overflow("<<"));
    }
    let shifted = a << b;
    if shifted >> b != a {
        return Err(RuntimeError::overflow("<<"));
    }
    Ok(Value::Int(shifted))
}

/// Evaluate one comparison pair.
pub fn compare_op(op: CmpOp, left: &Value, right: &Value) -> Result<bool, RuntimeError> {
    Ok(match op {
        CmpOp::Eq => left.py_eq(right),
        CmpOp::NotEq => !left.py_eq(right),
        CmpOp::Is => left.is_same(right),
        CmpOp::IsNot => !left.is_same(right),
        CmpOp::In => contains(right, left)?,
        CmpOp::NotIn => !contains(right, left)?,
        CmpOp::Lt => order(left, right, "<")? == Some(Ordering::Less),
        CmpOp::LtE => matches!(
            order(left, right, "<=")?,
            Some(Ordering::Less | Ordering::Equal)
        ),
        CmpOp::Gt => order(left, right, ">")? == Some(Ordering::Greater),
        CmpOp::GtE => matches!(
            order(left, right, ">=")?,
            Some(Ordering::Greater | Ordering::Equal)
        ),
    })
}

/// `item in container`
pub fn contains(container: &Value, item: &Value) -> Result<bool, RuntimeError> {
    match container {
        Value::Str(haystack) => match item {
            Value::Str(needle) => Ok(haystack.contains(&**needle)),
            other => Err(RuntimeError::type_error(format!(
                "'in <string>' requires string as left operand, not {}",
                other.type_name()
            ))),
        },
        Value::List(items) => Ok(items.borrow().iter().any(|v| v.py_eq(item))),
        Value::Tuple(items) => Ok(items.iter().any(|v| v.py_eq(item))),
        Value::Dict(map) => Ok(map.borrow().contains_key(&item.hash_key()?)),
        Value::Set(map) => Ok(map.borrow().contains_key(&item.hash_key()?)),
        Value::Range { start, stop, step } => {
            let n = match item.as_number() {
                Some(Number::Int(n)) => n,
                Some(Number::Float(f)) if f.fract() == 0.0 => f as i64,
                _ => return Ok(false),
            };
            let len = range_len(*start, *stop, *step);
            if len == 0 {
                return Ok(false);
            }
            let offset = i128::from(n) - i128::from(*start);
            let step = i128::from(*step);
            Ok(offset % step == 0 && (0..i128::from(len)).contains(&(offset / step)))
        }
        other => Err(RuntimeError::type_error(format!(
            "argument of type '{}' is not iterable",
            other.type_name()
        ))),
    }
}

/// Ordering for `<`, `<=`, `>`, `>=`. `None` means unordered (NaN).
///
/// For sets the ordering is by inclusion, so two sets that are not subsets
/// of each other are also unordered.
pub fn order(left: &Value, right: &Value, symbol: &str) -> Result<Option<Ordering>, RuntimeError> {
    if let (Some(a), Some(b)) = (left.as_number(), right.as_number()) {
        return Ok(match (a, b) {
            (Number::Int(a), Number::Int(b)) => Some(a.cmp(&b)),
            (a, b) => a.as_f64().partial_cmp(&b.as_f64()),
        });
    }
    match (left, right) {
        (Value::Str(a), Value::Str(b)) => Ok(Some(a.cmp(b))),
        (Value::List(a), Value::List(b)) => sequence_order(&a.borrow(), &b.borrow(), symbol),
        (Value::Tuple(a), Value::Tuple(b)) => sequence_order(a, b, symbol),
        (Value::Set(a), Value::Set(b)) => {
            let (a, b) = (a.borrow(), b.borrow());
            let a_in_b = a.keys().all(|key| b.contains_key(key));
            let b_in_a = b.keys().all(|key| a.contains_key(key));
            Ok(match (a_in_b, b_in_a) {
                (true, true) => Some(Ordering::Equal),
                (true, false) => Some(Ordering::Less),
                (false, true) => Some(Ordering::Greater),
                (false, false) => None,
            })
        }
        _ => Err(RuntimeError::type_error(format!(
            "'{}' not supported between instances of '{}' and '{}'",
            symbol,
            left.type_name(),
            right.type_name()
        ))),
    }
}

fn sequence_order(a: &[Value], b: &[Value], symbol: &str) -> Result<Option<Ordering>, RuntimeError> {
    for (x, y) in a.iter().zip(b) {
        if !x.py_eq(y) {
            return order(x, y, symbol);
        }
    }
    Ok(Some(a.len().cmp(&b.len())))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn int(i: i64) -> Value {
        Value::Int(i)
    }

    #[test]
    fn test_python_division_semantics() {
        assert!(binary_op(BinOp::FloorDiv, &int(-7), &int(2)).unwrap().py_eq(&int(-4)));
        assert!(binary_op(BinOp::Mod, &int(-7), &int(2)).unwrap().py_eq(&int(1)));
        assert!(binary_op(BinOp::Mod, &int(7), &int(-2)).unwrap().py_eq(&int(-1)));
        assert!(binary_op(BinOp::Div, &int(7), &int(2))
            .unwrap()
            .py_eq(&Value::Float(3.5)));

        let err = binary_op(BinOp::Div, &int(1), &int(0)).unwrap_err();
        assert_eq!(err.to_string(), "ZeroDivisionError: division by zero");
        let err = binary_op(BinOp::FloorDiv, &int(1), &int(0)).unwrap_err();
        assert_eq!(err.message, "integer division or modulo by zero");
    }

    #[test]
    fn test_checked_integer_arithmetic() {
        let err = binary_op(BinOp::Add, &int(i64::MAX), &int(1)).unwrap_err();
        assert_eq!(err.type_name(), "OverflowError");
        assert!(binary_op(BinOp::Pow, &int(2), &int(10)).unwrap().py_eq(&int(1024)));
        assert!(binary_op(BinOp::Pow, &int(2), &int(-1))
            .unwrap()
            .py_eq(&Value::Float(0.5)));
        assert!(binary_op(BinOp::FloorDiv, &int(i64::MIN), &int(-1)).is_err());
    }

    #[test]
    fn test_huge_exponents_of_unit_bases() {
        let huge = int(10_000_000_000);
        assert!(binary_op(BinOp::Pow, &int(1), &huge).unwrap().py_eq(&int(1)));
        assert!(binary_op(BinOp::Pow, &int(0), &huge).unwrap().py_eq(&int(0)));
        assert!(binary_op(BinOp::Pow, &int(-1), &huge).unwrap().py_eq(&int(1)));
        assert!(binary_op(BinOp::Pow, &int(-1), &int(10_000_000_001))
            .unwrap()
            .py_eq(&int(-1)));

        let err = binary_op(BinOp::Pow, &int(2), &huge).unwrap_err();
        assert_eq!(err.type_name(), "OverflowError");
        let err = binary_op(BinOp::Pow, &int(0), &int(-1)).unwrap_err();
        assert_eq!(err.type_name(), "ZeroDivisionError");
    }

    #[test]
    fn test_sequence_operators() {
        let joined = binary_op(BinOp::Add, &Value::str("ab"), &Value::str("c")).unwrap();
        assert_eq!(joined.py_str(), "abc");
        let repeated = binary_op(BinOp::Mult, &int(3), &Value::str("ab")).unwrap();
        assert_eq!(repeated.py_str(), "ababab");
        let list = binary_op(BinOp::Mult, &Value::list(vec![int(0)]), &int(2)).unwrap();
        assert_eq!(list.repr(), "[0, 0]");

        let err = binary_op(BinOp::Add, &Value::str("a"), &int(1)).unwrap_err();
        assert_eq!(err.message, "can only concatenate str (not \"int\") to str");
        let err = binary_op(BinOp::Sub, &Value::str("a"), &int(1)).unwrap_err();
        assert_eq!(
            err.message,
            "unsupported operand type(s) for -: 'str' and 'int'"
        );
    }

    #[test]
    fn test_comparisons() {
        assert!(compare_op(CmpOp::Lt, &int(1), &Value::Float(1.5)).unwrap());
        assert!(compare_op(CmpOp::Lt, &Value::str("abc"), &Value::str("abd")).unwrap());
        let a = Value::list(vec![int(1), int(2)]);
        let b = Value::list(vec![int(1), int(3)]);
        assert!(compare_op(CmpOp::Lt, &a, &b).unwrap());
        assert!(compare_op(CmpOp::In, &int(2), &a).unwrap());
        assert!(compare_op(CmpOp::NotIn, &Value::str("z"), &Value::str("abc")).unwrap());
        assert!(compare_op(CmpOp::In, &int(4), &Value::Range { start: 0, stop: 10, step: 2 }).unwrap());
        assert!(!compare_op(CmpOp::In, &int(5), &Value::Range { start: 0, stop: 10, step: 2 }).unwrap());

        let err = compare_op(CmpOp::Lt, &int(1), &Value::str("a")).unwrap_err();
        assert_eq!(
            err.message,
            "'<' not supported between instances of 'int' and 'str'"
        );
    }

    #[test]
    fn test_shifts_and_bits() {
        assert!(binary_op(BinOp::LShift, &int(1), &int(4)).unwrap().py_eq(&int(16)));
        assert!(binary_op(BinOp::RShift, &int(-16), &int(2)).unwrap().py_eq(&int(-4)));
        assert_eq!(
            binary_op(BinOp::LShift, &int(1), &int(-1)).unwrap_err().message,
            "negative shift count"
        );
        assert!(matches!(
            binary_op(BinOp::BitAnd, &Value::Bool(true), &Value::Bool(false)).unwrap(),
            Value::Bool(false)
        ));
    }
}
