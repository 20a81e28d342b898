//! Runtime value representation
//!
//! This module defines the [`Value`] enum, which represents all runtime values
//! of the executed program, following Python's object model:
//!
//! - Scalars: [`Value::None`], [`Value::Bool`], [`Value::Int`] (64-bit),
//!   [`Value::Float`], [`Value::Str`]
//! - Mutable containers shared by reference: [`Value::List`], [`Value::Dict`],
//!   [`Value::Set`]
//! - Immutable containers: [`Value::Tuple`], [`Value::Range`] (lazy)
//! - Callables: user functions, builtins and bound methods
//! - Imported modules
//!
//! # Aliasing
//!
//! `list`, `dict` and `set` values are `Rc<RefCell<..>>`, so `b = a` makes both
//! names refer to the same container, as in Python.
//!
//! # Hashing
//!
//! Dict keys and set members are stored under a [`HashKey`]. Numbers that
//! compare equal hash equal (`1`, `1.0` and `True` are the same key).

use crate::compiler::ir::{Constant, FunctionCode};
use crate::interpreter::builtins::Builtin;
use crate::interpreter::errors::RuntimeError;
use crate::interpreter::modules::Module;
use indexmap::IndexMap;
use std::cell::RefCell;
use std::fmt::Write as _;
use std::rc::Rc;
use std::sync::Arc;

pub type ListRef = Rc<RefCell<Vec<Value>>>;
/// Key -> (original key, value)
pub type DictRef = Rc<RefCell<IndexMap<HashKey, (Value, Value)>>>;
pub type SetRef = Rc<RefCell<IndexMap<HashKey, Value>>>;

/// Runtime values in the interpreter
#[derive(Debug, Clone, Default)]
pub enum Value {
    #[default]
    None,
    Bool(bool),
    Int(i64),
    Float(f64),
    Str(Rc<str>),
    List(ListRef),
    Tuple(Rc<Vec<Value>>),
    Dict(DictRef),
    Set(SetRef),
    Range {
        start: i64,
        stop: i64,
        step: i64,
    },
    Function(Arc<FunctionCode>),
    Builtin(Builtin),
    /// Method looked up on a value, e.g. `xs.append`
    BoundMethod {
        receiver: Box<Value>,
        name: Rc<str>,
    },
    Module(Rc<Module>),
}

/// Hashable projection of a value
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum HashKey {
    None,
    Int(i64),
    /// Bit pattern of a non-integral float
    Float(u64),
    Str(Rc<str>),
    Tuple(Vec<HashKey>),
}

impl From<&Constant> for Value {
    fn from(constant: &Constant) -> Self {
        match constant {
            Constant::None => Value::None,
            Constant::Bool(b) => Value::Bool(*b),
            Constant::Int(i) => Value::Int(*i),
            Constant::Float(f) => Value::Float(*f),
            Constant::Str(s) => Value::Str(Rc::from(&**s)),
        }
    }
}

impl Value {
    pub fn str(s: &str) -> Value {
        Value::Str(Rc::from(s))
    }

    pub fn list(items: Vec<Value>) -> Value {
        Value::List(Rc::new(RefCell::new(items)))
    }

    pub fn tuple(items: Vec<Value>) -> Value {
        Value::Tuple(Rc::new(items))
    }

    /// Build a dict, later duplicates overwriting earlier keys.
    pub fn dict(pairs: Vec<(Value, Value)>) -> Result<Value, RuntimeError> {
        let mut map = IndexMap::with_capacity(pairs.len());
        for (key, value) in pairs {
            map.insert(key.hash_key()?, (key, value));
        }
        Ok(Value::Dict(Rc::new(RefCell::new(map))))
    }

    pub fn set(items: Vec<Value>) -> Result<Value, RuntimeError> {
        let mut map = IndexMap::with_capacity(items.len());
        for item in items {
            let key = item.hash_key()?;
            map.entry(key).or_insert(item);
        }
        Ok(Value::Set(Rc::new(RefCell::new(map))))
    }

    /// Python type name, as reported by `type(x).__name__`
    pub fn type_name(&self) -> &'static str {
        match self {
            Value::None => "NoneType",
            Value::Bool(_) => "bool",
            Value::Int(_) => "int",
            Value::Float(_) => "float",
            Value::Str(_) => "str",
            Value::List(_) => "list",
            Value::Tuple(_) => "tuple",
            Value::Dict(_) => "dict",
            Value::Set(_) => "set",
            Value::Range { .. } => "range",
            Value::Function(_) => "function",
            Value::Builtin(_) | Value::BoundMethod { .. } => "builtin_function_or_method",
            Value::Module(_) => "module",
        }
    }

    pub fn is_truthy(&self) -> bool {
        match self {
            Value::None => false,
            Value::Bool(b) => *b,
            Value::Int(i) => *i != 0,
            Value::Float(f) => *f != 0.0,
            Value::Str(s) => !s.is_empty(),
            Value::List(items) => !items.borrow().is_empty(),
            Value::Tuple(items) => !items.is_empty(),
            Value::Dict(map) => !map.borrow().is_empty(),
            Value::Set(map) => !map.borrow().is_empty(),
            Value::Range { start, stop, step } => range_len(*start, *stop, *step) > 0,
            Value::Function(_) | Value::Builtin(_) | Value::BoundMethod { .. } | Value::Module(_) => true,
        }
    }

    /// `str(value)`
    pub fn py_str(&self) -> String {
        match self {
            Value::Str(s) => s.to_string(),
            other => other.repr(),
        }
    }

    /// `repr(value)`
    pub fn repr(&self) -> String {
        let mut out = String::new();
        let mut seen = Vec::new();
        self.write_repr(&mut out, &mut seen);
        out
    }

    fn write_repr(&self, out: &mut String, seen: &mut Vec<*const ()>) {
        match self {
            Value::None => out.push_str("None"),
            Value::Bool(true) => out.push_str("True"),
            Value::Bool(false) => out.push_str("False"),
            Value::Int(i) => {
                let _ = write!(out, "{}", i);
            }
            Value::Float(f) => out.push_str(&float_repr(*f)),
            Value::Str(s) => out.push_str(&str_repr(s)),
            Value::List(items) => {
                let ptr = Rc::as_ptr(items) as *const ();
                if seen.contains(&ptr) {
                    out.push_str("[...]");
                    return;
                }
                seen.push(ptr);
                out.push('[');
                write_sequence(out, items.borrow().iter(), seen);
                out.push(']');
                seen.pop();
            }
            Value::Tuple(items) => {
                out.push('(');
                write_sequence(out, items.iter(), seen);
                if items.len() == 1 {
                    out.push(',');
                }
                out.push(')');
            }
            Value::Dict(map) => {
                let ptr = Rc::as_ptr(map) as *const ();
                if seen.contains(&ptr) {
                    out.push_str("{...}");
                    return;
                }
                seen.push(ptr);
                out.push('{');
                for (i, (key, value)) in map.borrow().values().enumerate() {
                    if i > 0 {
                        out.push_str(", ");
                    }
                    key.write_repr(out, seen);
                    out.push_str(": ");
                    value.write_repr(out, seen);
                }
                out.push('}');
                seen.pop();
            }
            Value::Set(map) => {
                let map = map.borrow();
                if map.is_empty() {
                    out.push_str("set()");
                } else {
                    out.push('{');
                    write_sequence(out, map.values(), seen);
                    out.push('}');
                }
            }
            Value::Range { start, stop, step } => {
                if *step == 1 {
                    let _ = write!(out, "range({}, {})", start, stop);
                } else {
                    let _ = write!(out, "range({}, {}, {})", start, stop, step);
                }
            }
            Value::Function(code) => {
                let _ = write!(out, "<function {}>", code.name);
            }
            Value::Builtin(builtin) => {
                let _ = write!(out, "<built-in function {}>", builtin.name());
            }
            Value::BoundMethod { receiver, name } => {
                let _ = write!(
                    out,
                    "<built-in method {} of {} object>",
                    name,
                    receiver.type_name()
                );
            }
            Value::Module(module) => {
                let _ = write!(out, "<module '{}'>", module.name);
            }
        }
    }

    /// Key under which this value is stored in a dict or set
    pub fn hash_key(&self) -> Result<HashKey, RuntimeError> {
        match self {
            Value::None => Ok(HashKey::None),
            Value::Bool(b) => Ok(HashKey::Int(i64::from(*b))),
            Value::Int(i) => Ok(HashKey::Int(*i)),
            Value::Float(f) => {
                if f.fract() == 0.0 && f.abs() < 9.2e18 {
                    Ok(HashKey::Int(*f as i64))
                } else {
                    Ok(HashKey::Float(f.to_bits()))
                }
            }
            Value::Str(s) => Ok(HashKey::Str(s.clone())),
            Value::Tuple(items) => items
                .iter()
                .map(Value::hash_key)
                .collect::<Result<Vec<_>, _>>()
                .map(HashKey::Tuple),
            other => Err(RuntimeError::type_error(format!(
                "unhashable type: '{}'",
                other.type_name()
            ))),
        }
    }

    /// `==` with Python semantics
    pub fn py_eq(&self, other: &Value) -> bool {
        match (self, other) {
            (Value::None, Value::None) => true,
            (Value::Str(a), Value::Str(b)) => a == b,
            (Value::List(a), Value::List(b)) => {
                Rc::ptr_eq(a, b) || seq_eq(&a.borrow(), &b.borrow())
            }
            (Value::Tuple(a), Value::Tuple(b)) => seq_eq(a, b),
            (Value::Dict(a), Value::Dict(b)) => {
                let (a, b) = (a.borrow(), b.borrow());
                a.len() == b.len()
                    && a.iter().all(|(key, (_, value))| {
                        b.get(key).is_some_and(|(_, other)| value.py_eq(other))
                    })
            }
            (Value::Set(a), Value::Set(b)) => {
                let (a, b) = (a.borrow(), b.borrow());
                a.len() == b.len() && a.keys().all(|key| b.contains_key(key))
            }
            (
                Value::Range { start, stop, step },
                Value::Range {
                    start: s2,
                    stop: e2,
                    step: st2,
                },
            ) => {
                let (len_a, len_b) = (range_len(*start, *stop, *step), range_len(*s2, *e2, *st2));
                len_a == len_b && (len_a == 0 || (start == s2 && (len_a == 1 || step == st2)))
            }
            (Value::Function(a), Value::Function(b)) => Arc::ptr_eq(a, b),
            (Value::Builtin(a), Value::Builtin(b)) => a == b,
            (Value::Module(a), Value::Module(b)) => Rc::ptr_eq(a, b),
            (a, b) => match (a.as_number(), b.as_number()) {
                (Some(Number::Int(x)), Some(Number::Int(y))) => x == y,
                (Some(x), Some(y)) => x.as_f64() == y.as_f64(),
                _ => false,
            },
        }
    }

    /// `is` with Python semantics: identity for containers, equality for
    /// immutable scalars of the same type.
    pub fn is_same(&self, other: &Value) -> bool {
        match (self, other) {
            (Value::List(a), Value::List(b)) => Rc::ptr_eq(a, b),
            (Value::Dict(a), Value::Dict(b)) => Rc::ptr_eq(a, b),
            (Value::Set(a), Value::Set(b)) => Rc::ptr_eq(a, b),
            (Value::Tuple(a), Value::Tuple(b)) => Rc::ptr_eq(a, b),
            (Value::None, Value::None) => true,
            (Value::Bool(a), Value::Bool(b)) => a == b,
            (Value::Int(a), Value::Int(b)) => a == b,
            (Value::Float(a), Value::Float(b)) => a.to_bits() == b.to_bits(),
            (Value::Str(a), Value::Str(b)) => a == b,
            (a, b) if a.type_name() == b.type_name() => a.py_eq(b),
            _ => false,
        }
    }

    /// Numeric view; `bool` counts as an integer
    pub fn as_number(&self) -> Option<Number> {
        match self {
            Value::Bool(b) => Some(Number::Int(i64::from(*b))),
            Value::Int(i) => Some(Number::Int(*i)),
            Value::Float(f) => Some(Number::Float(*f)),
            _ => None,
        }
    }

    /// Integer view used for indices and counts
    pub fn as_index(&self) -> Result<i64, RuntimeError> {
        match self {
            Value::Bool(b) => Ok(i64::from(*b)),
            Value::Int(i) => Ok(*i),
            other => Err(RuntimeError::type_error(format!(
                "'{}' object cannot be interpreted as an integer",
                other.type_name()
            ))),
        }
    }

    /// Iterate the elements of an iterable value.
    pub fn iterate(&self) -> Result<ValueIter, RuntimeError> {
        Ok(match self {
            Value::Range { start, stop, step } => ValueIter::Range {
                next: *start,
                stop: *stop,
                step: *step,
            },
            Value::Str(s) => ValueIter::Items(
                s.chars()
                    .map(|c| Value::Str(Rc::from(c.to_string().as_str())))
                    .collect::<Vec<_>>()
                    .into_iter(),
            ),
            Value::List(items) => ValueIter::Items(items.borrow().clone().into_iter()),
            Value::Tuple(items) => ValueIter::Items(items.to_vec().into_iter()),
            Value::Dict(map) => ValueIter::Items(
                map.borrow()
                    .values()
                    .map(|(key, _)| key.clone())
                    .collect::<Vec<_>>()
                    .into_iter(),
            ),
            Value::Set(map) => ValueIter::Items(map.borrow().values().cloned().collect::<Vec<_>>().into_iter()),
            other => {
                return Err(RuntimeError::type_error(format!(
                    "'{}' object is not iterable",
                    other.type_name()
                )))
            }
        })
    }

    /// Collect an iterable into a vector.
    pub fn to_vec(&self) -> Result<Vec<Value>, RuntimeError> {
        Ok(self.iterate()?.collect())
    }
}

/// Numeric operand after `bool` promotion
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Number {
    Int(i64),
    Float(f64),
}

impl Number {
    pub fn as_f64(self) -> f64 {
        match self {
            Number::Int(i) => i as f64,
            Number::Float(f) => f,
        }
    }
}

/// Iterator over the elements of an iterable value
#[derive(Debug)]
pub enum ValueIter {
    Range { next: i64, stop: i64, step: i64 },
    Items(std::vec::IntoIter<Value>),
}

impl Iterator for ValueIter {
    type Item = Value;

    fn next(&mut self) -> Option<Value> {
        match self {
            ValueIter::Range { next, stop, step } => {
                let done = if *step > 0 { *next >= *stop } else { *next <= *stop };
                if done {
                    return None;
                }
                let current = *next;
                *next = next.saturating_add(*step);
                if *next == current {
                    // saturated: make the following call terminate
                    *next = *stop;
                }
                Some(Value::Int(current))
            }
            ValueIter::Items(items) => items.next(),
        }
    }
}

/// Number of elements in `range(start, stop, step)`
pub fn range_len(start: i64, stop: i64, step: i64) -> i64 {
    let (start, stop, step) = (i128::from(start), i128::from(stop), i128::from(step));
    let len = if step > 0 && start < stop {
        (stop - start + step - 1) / step
    } else if step < 0 && start > stop {
        (start - stop - step - 1) / (-step)
    } else {
        0
    };
    i64::try_from(len).unwrap_or(i64::MAX)
}

fn seq_eq(a: &[Value], b: &[Value]) -> bool {
    a.len() == b.len() && a.iter().zip(b).all(|(x, y)| x.py_eq(y))
}

fn write_sequence<'v>(out: &mut String, items: impl Iterator<Item = &'v Value>, seen: &mut Vec<*const ()>) {
    for (i, item) in items.enumerate() {
        if i > 0 {
            out.push_str(", ");
        }
        item.write_repr(out, seen);
    }
}

/// Python `repr` of a float: shortest round-trip digits, exponent form
/// outside `1e-4 <= |f| < 1e16`.
pub fn float_repr(f: f64) -> String {
    if f.is_nan() {
        return "nan".to_string();
    }
    if f.is_infinite() {
        return if f > 0.0 { "inf" } else { "-inf" }.to_string();
    }
    let magnitude = f.abs();
    if magnitude != 0.0 && !(1e-4..1e16).contains(&magnitude) {
        let formatted = format!("{:e}", f);
        return match formatted.split_once('e') {
            Some((mantissa, exponent)) => {
                let (sign, digits) = match exponent.strip_prefix('-') {
                    Some(digits) => ('-', digits),
                    None => ('+', exponent),
                };
                format!("{}e{}{:0>2}", mantissa, sign, digits)
            }
            None => formatted,
        };
    }
    let formatted = format!("{}", f);
    if formatted.contains('.') {
        formatted
    } else {
        formatted + ".0"
    }
}

/// Python `repr` of a string: single quotes unless the text contains a single
/// quote and no double quote.
pub fn str_repr(s: &str) -> String {
    let quote = if s.contains('\'') && !s.contains('"') { '"' } else { '\'' };
    let mut out = String::with_capacity(s.len() + 2);
    out.push(quote);
    for c in s.chars() {
        match c {
            '\\' => out.push_str("\\\\"),
            '\n' => out.push_str("\\n"),
            '\r' => out.push_str("\\r"),
            '\t' => out.push_str("\\t"),
            c if c == quote => {
                out.push('\\');
                out.push(c);
            }
            c if (c as u32) < 0x20 || c as u32 == 0x7f => {
                let _ = write!(out, "\\x{:02x}", c as u32);
            }
            c => out.push(c),
        }
    }
    out.push(quote);
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_float_repr_matches_python() {
        assert_eq!(float_repr(3.0), "3.0");
        assert_eq!(float_repr(0.1), "0.1");
        assert_eq!(float_repr(-0.0), "-0.0");
        assert_eq!(float_repr(2.5), "2.5");
        assert_eq!(float_repr(1e16), "1e+16");
        assert_eq!(float_repr(1.5e-5), "1.5e-05");
        assert_eq!(float_repr(123456789012345.0), "123456789012345.0");
        assert_eq!(float_repr(f64::INFINITY), "inf");
    }

    #[test]
    fn test_str_and_repr() {
        assert_eq!(Value::str("hi").py_str(), "hi");
        assert_eq!(Value::str("hi").repr(), "'hi'");
        assert_eq!(Value::str("it's").repr(), "\"it's\"");
        assert_eq!(Value::str("a\nb").repr(), "'a\\nb'");
        let list = Value::list(vec![Value::Int(1), Value::str("x"), Value::None]);
        assert_eq!(list.py_str(), "[1, 'x', None]");
        assert_eq!(Value::tuple(vec![Value::Int(1)]).repr(), "(1,)");
        assert_eq!(Value::set(vec![]).unwrap().repr(), "set()");
        let dict = Value::dict(vec![(Value::str("a"), Value::Float(1.0))]).unwrap();
        assert_eq!(dict.repr(), "{'a': 1.0}");
        assert_eq!(
            Value::Range { start: 0, stop: 5, step: 1 }.repr(),
            "range(0, 5)"
        );
    }

    #[test]
    fn test_self_referencing_list() {
        let list = Value::list(vec![Value::Int(1)]);
        if let Value::List(items) = &list {
            items.borrow_mut().push(list.clone());
        }
        assert_eq!(list.repr(), "[1, [...]]");
    }

    #[test]
    fn test_equal_numbers_share_a_key() {
        assert_eq!(Value::Int(1).hash_key().unwrap(), Value::Bool(true).hash_key().unwrap());
        assert_eq!(Value::Int(2).hash_key().unwrap(), Value::Float(2.0).hash_key().unwrap());
        assert!(Value::list(vec![]).hash_key().is_err());
    }

    #[test]
    fn test_equality() {
        assert!(Value::Int(1).py_eq(&Value::Float(1.0)));
        assert!(Value::Bool(true).py_eq(&Value::Int(1)));
        assert!(!Value::str("1").py_eq(&Value::Int(1)));
        let a = Value::list(vec![Value::Int(1), Value::Int(2)]);
        let b = Value::list(vec![Value::Int(1), Value::Int(2)]);
        assert!(a.py_eq(&b));
        assert!(!a.is_same(&b));
        assert!(a.is_same(&a.clone()));
    }

    #[test]
    fn test_truthiness() {
        assert!(!Value::None.is_truthy());
        assert!(!Value::str("").is_truthy());
        assert!(Value::list(vec![Value::None]).is_truthy());
        assert!(!Value::Range { start: 3, stop: 3, step: 1 }.is_truthy());
    }

    #[test]
    fn test_range_iteration() {
        let values: Vec<i64> = Value::Range { start: 10, stop: 0, step: -3 }
            .iterate()
            .unwrap()
            .filter_map(|v| v.as_index().ok())
            .collect();
        assert_eq!(values, vec![10, 7, 4, 1]);
        assert_eq!(range_len(10, 0, -3), 4);
        assert_eq!(range_len(0, 10, 3), 4);
    }
}
