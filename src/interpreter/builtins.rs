//! Built-in function implementations
//!
//! This module provides the functions a program can call without defining
//! them: the global builtins (`print`, `len`, `range`, ...), the request-mode
//! hook `set_response`, and the functions exported by the `math` module.
//!
//! # Implementation Notes
//!
//! - `print` writes each argument, each separator and the terminator as a
//!   separate stdout side effect
//! - `input` reads the next queued stdin line and raises `EOFError` when none
//!   remain
//! - `enumerate`, `zip` and `reversed` return lists
//! - `type` returns the type name as a string
//! - All built-ins are dispatched through [`Interpreter::call_builtin`]

use crate::compiler::operators::BinOp;
use crate::interpreter::engine::Interpreter;
use crate::interpreter::errors::{ExceptionType, RuntimeError};
use crate::interpreter::ops::binary::{binary_op, order};
use crate::memory::value::{range_len, Number, Value};
use std::cmp::Ordering;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Builtin {
    Print,
    Input,
    Len,
    Range,
    Str,
    Repr,
    Int,
    Float,
    Bool,
    List,
    Tuple,
    Set,
    Dict,
    Abs,
    Min,
    Max,
    Sum,
    Sorted,
    Reversed,
    Enumerate,
    Zip,
    Round,
    Chr,
    Ord,
    Type,
    SetResponse,

    // math module
    Sqrt,
    Floor,
    Ceil,
    Fabs,
    Pow,
    Gcd,
    Log,
    Sin,
    Cos,
    Isqrt,
}

/// Builtins visible as global names
const GLOBAL_BUILTINS: &[Builtin] = &[
    Builtin::Print,
    Builtin::Input,
    Builtin::Len,
    Builtin::Range,
    Builtin::Str,
    Builtin::Repr,
    Builtin::Int,
    Builtin::Float,
    Builtin::Bool,
    Builtin::List,
    Builtin::Tuple,
    Builtin::Set,
    Builtin::Dict,
    Builtin::Abs,
    Builtin::Min,
    Builtin::Max,
    Builtin::Sum,
    Builtin::Sorted,
    Builtin::Reversed,
    Builtin::Enumerate,
    Builtin::Zip,
    Builtin::Round,
    Builtin::Chr,
    Builtin::Ord,
    Builtin::Type,
    Builtin::SetResponse,
];

impl Builtin {
    /// Functions exported by the `math` module
    pub const MATH: [Builtin; 10] = [
        Builtin::Sqrt,
        Builtin::Floor,
        Builtin::Ceil,
        Builtin::Fabs,
        Builtin::Pow,
        Builtin::Gcd,
        Builtin::Log,
        Builtin::Sin,
        Builtin::Cos,
        Builtin::Isqrt,
    ];

    /// Resolve a global builtin name. `math` functions are only reachable
    /// through the module.
    pub fn lookup(name: &str) -> Option<Builtin> {
        GLOBAL_BUILTINS.iter().copied().find(|b| b.name() == name)
    }

    pub fn name(self) -> &'static str {
        match self {
            Builtin::Print => "print",
            Builtin::Input => "input",
            Builtin::Len => "len",
            Builtin::Range => "range",
            Builtin::Str => "str",
            Builtin::Repr => "repr",
            Builtin::Int => "int",
            Builtin::Float => "float",
            Builtin::Bool => "bool",
            Builtin::List => "list",
            Builtin::Tuple => "tuple",
            Builtin::Set => "set",
            Builtin::Dict => "dict",
            Builtin::Abs => "abs",
            Builtin::Min => "min",
            Builtin::Max => "max",
            Builtin::Sum => "sum",
            Builtin::Sorted => "sorted",
            Builtin::Reversed => "reversed",
            Builtin::Enumerate => "enumerate",
            Builtin::Zip => "zip",
            Builtin::Round => "round",
            Builtin::Chr => "chr",
            Builtin::Ord => "ord",
            Builtin::Type => "type",
            Builtin::SetResponse => "set_response",
            Builtin::Sqrt => "sqrt",
            Builtin::Floor => "floor",
            Builtin::Ceil => "ceil",
            Builtin::Fabs => "fabs",
            Builtin::Pow => "pow",
            Builtin::Gcd => "gcd",
            Builtin::Log => "log",
            Builtin::Sin => "sin",
            Builtin::Cos => "cos",
            Builtin::Isqrt => "isqrt",
        }
    }
}

impl Interpreter<'_> {
    pub(crate) fn call_builtin(
        &mut self,
        builtin: Builtin,
        args: Vec<Value>,
        mut kwargs: Vec<(String, Value)>,
    ) -> Result<Value, RuntimeError> {
        let name = builtin.name();
        match builtin {
            Builtin::Print => {
                let sep = text_keyword(take_keyword(&mut kwargs, "sep"), " ", "sep")?;
                let end = text_keyword(take_keyword(&mut kwargs, "end"), "\n", "end")?;
                if let Some((keyword, _)) = kwargs.first() {
                    return Err(RuntimeError::type_error(format!(
                        "'{}' is an invalid keyword argument for print()",
                        keyword
                    )));
                }
                for (i, arg) in args.iter().enumerate() {
                    if i > 0 {
                        self.write_stdout(&sep);
                    }
                    self.write_stdout(&arg.py_str());
                }
                self.write_stdout(&end);
                Ok(Value::None)
            }
            Builtin::Input => {
                no_keywords(name, &kwargs)?;
                arity(name, &args, 0, 1)?;
                if let Some(prompt) = args.first() {
                    self.write_stdout(&prompt.py_str());
                }
                let line = self.terminal.read_line().ok_or_else(RuntimeError::eof)?;
                Ok(Value::str(&line))
            }
            Builtin::SetResponse => {
                no_keywords(name, &kwargs)?;
                arity(name, &args, 1, 1)?;
                self.response = args.into_iter().next();
                Ok(Value::None)
            }
            _ => call_pure(builtin, args, kwargs),
        }
    }
}

/// Builtins that only transform their arguments.
fn call_pure(
    builtin: Builtin,
    args: Vec<Value>,
    mut kwargs: Vec<(String, Value)>,
) -> Result<Value, RuntimeError> {
    let name = builtin.name();
    match builtin {
        Builtin::Sorted => {
            let reverse = take_keyword(&mut kwargs, "reverse").is_some_and(|v| v.is_truthy());
            no_keywords(name, &kwargs)?;
            arity(name, &args, 1, 1)?;
            let mut items = args[0].to_vec()?;
            sort_values(&mut items, reverse)?;
            Ok(Value::list(items))
        }
        Builtin::Enumerate => {
            let keyword_start = take_keyword(&mut kwargs, "start");
            no_keywords(name, &kwargs)?;
            arity(name, &args, 1, 2)?;
            let start = match args.get(1).or(keyword_start.as_ref()) {
                Some(value) => value.as_index()?,
                None => 0,
            };
            let mut out = Vec::new();
            for (i, item) in args[0].iterate()?.enumerate() {
                let index = start
                    .checked_add(i as i64)
                    .ok_or_else(|| RuntimeError::overflow("enumerate"))?;
                out.push(Value::tuple(vec![Value::Int(index), item]));
            }
            Ok(Value::list(out))
        }
        Builtin::Dict => {
            arity(name, &args, 0, 1)?;
            let mut pairs = Vec::new();
            if let Some(source) = args.first() {
                pairs = dict_pairs(source)?;
            }
            pairs.extend(kwargs.into_iter().map(|(k, v)| (Value::str(&k), v)));
            Value::dict(pairs)
        }
        _ => {
            no_keywords(name, &kwargs)?;
            call_positional(builtin, args)
        }
    }
}

fn call_positional(builtin: Builtin, args: Vec<Value>) -> Result<Value, RuntimeError> {
    let name = builtin.name();
    match builtin {
        Builtin::Len => {
            arity(name, &args, 1, 1)?;
            length(&args[0]).map(Value::Int)
        }
        Builtin::Range => {
            arity(name, &args, 1, 3)?;
            let bounds = args.iter().map(Value::as_index).collect::<Result<Vec<_>, _>>()?;
            let (start, stop, step) = match bounds.as_slice() {
                [stop] => (0, *stop, 1),
                [start, stop] => (*start, *stop, 1),
                [start, stop, step, ..] => (*start, *stop, *step),
                [] => (0, 0, 1),
            };
            if step == 0 {
                return Err(RuntimeError::value_error("range() arg 3 must not be zero"));
            }
            Ok(Value::Range { start, stop, step })
        }
        Builtin::Str => {
            arity(name, &args, 0, 1)?;
            Ok(Value::str(&args.first().map(Value::py_str).unwrap_or_default()))
        }
        Builtin::Repr => {
            arity(name, &args, 1, 1)?;
            Ok(Value::str(&args[0].repr()))
        }
        Builtin::Int => {
            arity(name, &args, 0, 1)?;
            match args.first() {
                None => Ok(Value::Int(0)),
                Some(value) => to_int(value).map(Value::Int),
            }
        }
        Builtin::Float => {
            arity(name, &args, 0, 1)?;
            match args.first() {
                None => Ok(Value::Float(0.0)),
                Some(value) => to_float(value).map(Value::Float),
            }
        }
        Builtin::Bool => {
            arity(name, &args, 0, 1)?;
            Ok(Value::Bool(args.first().is_some_and(Value::is_truthy)))
        }
        Builtin::List => {
            arity(name, &args, 0, 1)?;
            match args.first() {
                None => Ok(Value::list(Vec::new())),
                Some(value) => Ok(Value::list(value.to_vec()?)),
            }
        }
        Builtin::Tuple => {
            arity(name, &args, 0, 1)?;
            match args.first() {
                None => Ok(Value::tuple(Vec::new())),
                Some(value) => Ok(Value::tuple(value.to_vec()?)),
            }
        }
        Builtin::Set => {
            arity(name, &args, 0, 1)?;
            match args.first() {
                None => Value::set(Vec::new()),
                Some(value) => Value::set(value.to_vec()?),
            }
        }
        Builtin::Abs => {
            arity(name, &args, 1, 1)?;
            match args[0].as_number() {
                Some(Number::Int(i)) => i
                    .checked_abs()
                    .map(Value::Int)
                    .ok_or_else(|| RuntimeError::overflow("abs")),
                Some(Number::Float(f)) => Ok(Value::Float(f.abs())),
                None => Err(RuntimeError::type_error(format!(
                    "bad operand type for abs(): '{}'",
                    args[0].type_name()
                ))),
            }
        }
        Builtin::Min | Builtin::Max => extreme(builtin, args),
        Builtin::Sum => {
            arity(name, &args, 1, 2)?;
            let mut total = args.get(1).cloned().unwrap_or(Value::Int(0));
            if matches!(total, Value::Str(_)) {
                return Err(RuntimeError::type_error(
                    "sum() can't sum strings [use ''.join(seq) instead]",
                ));
            }
            for item in args[0].iterate()? {
                total = binary_op(BinOp::Add, &total, &item)?;
            }
            Ok(total)
        }
        Builtin::Reversed => {
            arity(name, &args, 1, 1)?;
            if matches!(args[0], Value::Set(_)) {
                return Err(RuntimeError::type_error("'set' object is not reversible"));
            }
            let mut items = args[0].to_vec()?;
            items.reverse();
            Ok(Value::list(items))
        }
        Builtin::Zip => {
            let mut iterators = args
                .iter()
                .map(Value::iterate)
                .collect::<Result<Vec<_>, _>>()?;
            let mut out = Vec::new();
            if iterators.is_empty() {
                return Ok(Value::list(out));
            }
            'rows: loop {
                let mut row = Vec::with_capacity(iterators.len());
                for iterator in &mut iterators {
                    match iterator.next() {
                        Some(item) => row.push(item),
                        None => break 'rows,
                    }
                }
                out.push(Value::tuple(row));
            }
            Ok(Value::list(out))
        }
        Builtin::Round => {
            arity(name, &args, 1, 2)?;
            let digits = match args.get(1) {
                None | Some(Value::None) => None,
                Some(value) => Some(value.as_index()?),
            };
            round(&args[0], digits)
        }
        Builtin::Chr => {
            arity(name, &args, 1, 1)?;
            let code = args[0].as_index()?;
            u32::try_from(code)
                .ok()
                .and_then(char::from_u32)
                .map(|c| Value::str(&c.to_string()))
                .ok_or_else(|| RuntimeError::value_error("chr() arg not in range(0x110000)"))
        }
        Builtin::Ord => {
            arity(name, &args, 1, 1)?;
            match &args[0] {
                Value::Str(s) => {
                    let mut chars = s.chars();
                    match (chars.next(), chars.next()) {
                        (Some(c), None) => Ok(Value::Int(i64::from(u32::from(c)))),
                        _ => Err(RuntimeError::type_error(format!(
                            "ord() expected a character, but string of length {} found",
                            s.chars().count()
                        ))),
                    }
                }
                other => Err(RuntimeError::type_error(format!(
                    "ord() expected string of length 1, but {} found",
                    other.type_name()
                ))),
            }
        }
        Builtin::Type => {
            arity(name, &args, 1, 1)?;
            Ok(Value::str(args[0].type_name()))
        }
        Builtin::Sqrt => {
            arity(name, &args, 1, 1)?;
            let x = real(&args[0])?;
            if x < 0.0 {
                return Err(domain_error());
            }
            Ok(Value::Float(x.sqrt()))
        }
        Builtin::Floor | Builtin::Ceil => {
            arity(name, &args, 1, 1)?;
            match args[0].as_number() {
                Some(Number::Int(i)) => Ok(Value::Int(i)),
                Some(Number::Float(f)) => {
                    let rounded = if builtin == Builtin::Floor { f.floor() } else { f.ceil() };
                    float_to_int(rounded).map(Value::Int)
                }
                None => Err(not_real(&args[0])),
            }
        }
        Builtin::Fabs => {
            arity(name, &args, 1, 1)?;
            Ok(Value::Float(real(&args[0])?.abs()))
        }
        Builtin::Pow => {
            arity(name, &args, 2, 2)?;
            let (x, y) = (real(&args[0])?, real(&args[1])?);
            let result = x.powf(y);
            if result.is_nan() && !x.is_nan() && !y.is_nan() {
                return Err(domain_error());
            }
            Ok(Value::Float(result))
        }
        Builtin::Gcd => {
            let mut result: i64 = 0;
            for arg in &args {
                let mut a = arg.as_index()?.checked_abs().ok_or_else(|| RuntimeError::overflow("gcd"))?;
                let mut b = result;
                while b != 0 {
                    (a, b) = (b, a % b);
                }
                result = a;
            }
            Ok(Value::Int(result))
        }
        Builtin::Log => {
            arity(name, &args, 1, 2)?;
            let x = real(&args[0])?;
            if x <= 0.0 {
                return Err(domain_error());
            }
            match args.get(1) {
                None => Ok(Value::Float(x.ln())),
                Some(base) => {
                    let base = real(base)?;
                    if base <= 0.0 {
                        return Err(domain_error());
                    }
                    if base == 1.0 {
                        return Err(RuntimeError::zero_division("float division by zero"));
                    }
                    Ok(Value::Float(x.ln() / base.ln()))
                }
            }
        }
        Builtin::Sin => {
            arity(name, &args, 1, 1)?;
            Ok(Value::Float(real(&args[0])?.sin()))
        }
        Builtin::Cos => {
            arity(name, &args, 1, 1)?;
            Ok(Value::Float(real(&args[0])?.cos()))
        }
        Builtin::Isqrt => {
            arity(name, &args, 1, 1)?;
            let n = args[0].as_index()?;
            if n < 0 {
                return Err(RuntimeError::value_error(
                    "isqrt() argument must be nonnegative",
                ));
            }
            Ok(Value::Int(integer_sqrt(n)))
        }
        Builtin::Print
        | Builtin::Input
        | Builtin::SetResponse
        | Builtin::Sorted
        | Builtin::Enumerate
        | Builtin::Dict => Err(RuntimeError::new(
            ExceptionType::InternalError,
            format!("{}() cannot be called here", name),
        )),
    }
}

pub(crate) fn arity(name: &str, args: &[Value], min: usize, max: usize) -> Result<(), RuntimeError> {
    let given = args.len();
    if (min..=max).contains(&given) {
        return Ok(());
    }
    let message = if min == 1 && max == 1 {
        format!("{}() takes exactly one argument ({} given)", name, given)
    } else if given < min {
        format!(
            "{} expected at least {} argument{}, got {}",
            name,
            min,
            if min == 1 { "" } else { "s" },
            given
        )
    } else {
        format!(
            "{} expected at most {} argument{}, got {}",
            name,
            max,
            if max == 1 { "" } else { "s" },
            given
        )
    };
    Err(RuntimeError::type_error(message))
}

pub(crate) fn no_keywords(name: &str, kwargs: &[(String, Value)]) -> Result<(), RuntimeError> {
    match kwargs.first() {
        None => Ok(()),
        Some((keyword, _)) => Err(RuntimeError::type_error(format!(
            "{}() got an unexpected keyword argument '{}'",
            name, keyword
        ))),
    }
}

pub(crate) fn take_keyword(kwargs: &mut Vec<(String, Value)>, keyword: &str) -> Option<Value> {
    let position = kwargs.iter().position(|(k, _)| k == keyword)?;
    Some(kwargs.remove(position).1)
}

/// `sep`/`end` for print: a string, or `None` for the default.
fn text_keyword(value: Option<Value>, default: &str, keyword: &str) -> Result<String, RuntimeError> {
    match value {
        None | Some(Value::None) => Ok(default.to_string()),
        Some(Value::Str(s)) => Ok(s.to_string()),
        Some(other) => Err(RuntimeError::type_error(format!(
            "{} must be None or a string, not {}",
            keyword,
            other.type_name()
        ))),
    }
}

pub(crate) fn length(value: &Value) -> Result<i64, RuntimeError> {
    let len = match value {
        Value::Str(s) => s.chars().count(),
        Value::List(items) => items.borrow().len(),
        Value::Tuple(items) => items.len(),
        Value::Dict(map) => map.borrow().len(),
        Value::Set(map) => map.borrow().len(),
        Value::Range { start, stop, step } => return Ok(range_len(*start, *stop, *step)),
        other => {
            return Err(RuntimeError::type_error(format!(
                "object of type '{}' has no len()",
                other.type_name()
            )))
        }
    };
    i64::try_from(len).map_err(|_| RuntimeError::overflow("len"))
}

/// Stable sort with Python ordering; the first comparison error wins.
pub(crate) fn sort_values(items: &mut [Value], reverse: bool) -> Result<(), RuntimeError> {
    let mut error = None;
    items.sort_by(|a, b| {
        let (a, b) = if reverse { (b, a) } else { (a, b) };
        match order(a, b, "<") {
            Ok(ordering) => ordering.unwrap_or(Ordering::Equal),
            Err(err) => {
                error.get_or_insert(err);
                Ordering::Equal
            }
        }
    });
    match error {
        Some(err) => Err(err),
        None => Ok(()),
    }
}

fn extreme(builtin: Builtin, args: Vec<Value>) -> Result<Value, RuntimeError> {
    let name = builtin.name();
    let candidates = match args.as_slice() {
        [] => {
            return Err(RuntimeError::type_error(format!(
                "{} expected at least 1 argument, got 0",
                name
            )))
        }
        [iterable] => iterable.to_vec()?,
        _ => args,
    };
    let (symbol, wanted) = if builtin == Builtin::Min {
        ("<", Ordering::Less)
    } else {
        (">", Ordering::Greater)
    };
    let mut items = candidates.into_iter();
    let mut best = items
        .next()
        .ok_or_else(|| RuntimeError::value_error(format!("{}() arg is an empty sequence", name)))?;
    for item in items {
        if order(&item, &best, symbol)? == Some(wanted) {
            best = item;
        }
    }
    Ok(best)
}

pub(crate) fn dict_pairs(source: &Value) -> Result<Vec<(Value, Value)>, RuntimeError> {
    if let Value::Dict(map) = source {
        return Ok(map.borrow().values().cloned().collect());
    }
    let mut pairs = Vec::new();
    for (i, item) in source.iterate()?.enumerate() {
        let pair = item.to_vec().map_err(|_| {
            RuntimeError::type_error(format!(
                "cannot convert dictionary update sequence element #{} to a sequence",
                i
            ))
        })?;
        match <[Value; 2]>::try_from(pair) {
            Ok([key, value]) => pairs.push((key, value)),
            Err(pair) => {
                return Err(RuntimeError::value_error(format!(
                    "dictionary update sequence element #{} has length {}; 2 is required",
                    i,
                    pair.len()
                )))
            }
        }
    }
    Ok(pairs)
}

fn domain_error() -> RuntimeError {
    RuntimeError::value_error("math domain error")
}

fn not_real(value: &Value) -> RuntimeError {
    RuntimeError::type_error(format!("must be real number, not {}", value.type_name()))
}

fn real(value: &Value) -> Result<f64, RuntimeError> {
    value
        .as_number()
        .map(Number::as_f64)
        .ok_or_else(|| not_real(value))
}

fn float_to_int(f: f64) -> Result<i64, RuntimeError> {
    if f.is_nan() {
        return Err(RuntimeError::value_error("cannot convert float NaN to integer"));
    }
    if f.is_infinite() {
        return Err(RuntimeError::new(
            ExceptionType::OverflowError,
            "cannot convert float infinity to integer",
        ));
    }
    // i64::MAX as f64 rounds up to 2^63, which is already out of range
    if f >= 9_223_372_036_854_775_808.0 || f < -9_223_372_036_854_775_808.0 {
        return Err(RuntimeError::overflow("int conversion"));
    }
    Ok(f.trunc() as i64)
}

fn to_int(value: &Value) -> Result<i64, RuntimeError> {
    match value {
        Value::Int(_) | Value::Bool(_) => value.as_index(),
        Value::Float(f) => float_to_int(*f),
        Value::Str(s) => {
            let text = s.trim().replace('_', "");
            text.parse::<i64>().map_err(|_| {
                RuntimeError::value_error(format!(
                    "invalid literal for int() with base 10: {}",
                    value.repr()
                ))
            })
        }
        other => Err(RuntimeError::type_error(format!(
            "int() argument must be a string, a bytes-like object or a real number, not '{}'",
            other.type_name()
        ))),
    }
}

fn to_float(value: &Value) -> Result<f64, RuntimeError> {
    match value {
        Value::Str(s) => {
            let text = s.trim().to_ascii_lowercase();
            let parsed = match text.trim_start_matches(['+', '-']) {
                "inf" | "infinity" | "nan" => {
                    let magnitude = if text.ends_with("nan") { f64::NAN } else { f64::INFINITY };
                    Some(if text.starts_with('-') { -magnitude } else { magnitude })
                }
                _ => text.replace('_', "").parse::<f64>().ok(),
            };
            parsed.ok_or_else(|| {
                RuntimeError::value_error(format!(
                    "could not convert string to float: {}",
                    value.repr()
                ))
            })
        }
        other => other.as_number().map(Number::as_f64).ok_or_else(|| {
            RuntimeError::type_error(format!(
                "float() argument must be a string or a real number, not '{}'",
                other.type_name()
            ))
        }),
    }
}

/// `round(x)` rounds half to even and returns an int; `round(x, n)` keeps the
/// operand's type.
fn round(value: &Value, digits: Option<i64>) -> Result<Value, RuntimeError> {
    match (value.as_number(), digits) {
        (Some(Number::Int(i)), None) => Ok(Value::Int(i)),
        (Some(Number::Int(i)), Some(n)) if n >= 0 => Ok(Value::Int(i)),
        (Some(Number::Int(i)), Some(n)) => {
            let Some(scale) = u32::try_from(-n).ok().and_then(|p| 10i64.checked_pow(p)) else {
                return Ok(Value::Int(0));
            };
            let remainder = i.rem_euclid(scale);
            let base = i - remainder;
            let rounded = match (remainder * 2).cmp(&scale) {
                Ordering::Less => base,
                Ordering::Greater => base + scale,
                Ordering::Equal if (base / scale) % 2 == 0 => base,
                Ordering::Equal => base + scale,
            };
            Ok(Value::Int(rounded))
        }
        (Some(Number::Float(f)), None) => float_to_int(f.round_ties_even()).map(Value::Int),
        (Some(Number::Float(f)), Some(n)) => {
            let scale = 10f64.powi(i32::try_from(n.clamp(-308, 308)).unwrap_or(0));
            let rounded = (f * scale).round_ties_even() / scale;
            Ok(Value::Float(if rounded.is_finite() { rounded } else { f }))
        }
        (None, _) => Err(RuntimeError::type_error(format!(
            "type {} doesn't define __round__ method",
            value.type_name()
        ))),
    }
}

fn integer_sqrt(n: i64) -> i64 {
    let mut root = (n as f64).sqrt() as i64;
    while root.checked_mul(root).map_or(true, |sq| sq > n) {
        root -= 1;
    }
    while (root + 1).checked_mul(root + 1).is_some_and(|sq| sq <= n) {
        root += 1;
    }
    root
}
