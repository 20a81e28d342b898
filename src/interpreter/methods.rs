//! Methods of the built-in container and string types
//!
//! `xs.append(1)` is evaluated by looking up `append` on the receiver's type
//! and calling it with the receiver. Looking a method up without calling it
//! produces a [`Value::BoundMethod`], which is dispatched here when called.

use crate::interpreter::builtins::{arity, dict_pairs, no_keywords, sort_values, take_keyword};
use crate::interpreter::errors::RuntimeError;
use crate::interpreter::ops::access::normalize_index;
use crate::memory::value::{DictRef, ListRef, SetRef, Value};
use std::cell::RefCell;
use std::rc::Rc;

const LIST_METHODS: &[&str] = &[
    "append", "pop", "insert", "remove", "index", "count", "extend", "reverse", "sort", "copy",
    "clear",
];

const STR_METHODS: &[&str] = &[
    "upper",
    "lower",
    "strip",
    "lstrip",
    "rstrip",
    "split",
    "join",
    "replace",
    "startswith",
    "endswith",
    "find",
    "count",
    "isdigit",
    "isalpha",
    "title",
    "capitalize",
];

const DICT_METHODS: &[&str] = &[
    "keys", "values", "items", "get", "pop", "update", "copy", "clear",
];

const SET_METHODS: &[&str] = &["add", "remove", "discard", "copy", "clear"];

fn methods_of(value: &Value) -> &'static [&'static str] {
    match value {
        Value::List(_) => LIST_METHODS,
        Value::Str(_) => STR_METHODS,
        Value::Dict(_) => DICT_METHODS,
        Value::Set(_) => SET_METHODS,
        _ => &[],
    }
}

pub fn has_method(value: &Value, name: &str) -> bool {
    methods_of(value).contains(&name)
}

/// Call `receiver.name(*args, **kwargs)`.
pub fn call_method(
    receiver: &Value,
    name: &str,
    args: Vec<Value>,
    mut kwargs: Vec<(String, Value)>,
) -> Result<Value, RuntimeError> {
    if !has_method(receiver, name) {
        return Err(RuntimeError::attribute_error(format!(
            "'{}' object has no attribute '{}'",
            receiver.type_name(),
            name
        )));
    }
    let qualified = format!("{}.{}", receiver.type_name(), name);

    let reverse = if matches!(receiver, Value::List(_)) && name == "sort" {
        take_keyword(&mut kwargs, "reverse").is_some_and(|v| v.is_truthy())
    } else {
        false
    };
    no_keywords(&qualified, &kwargs)?;

    match receiver {
        Value::List(list) => list_method(list, name, &qualified, args, reverse),
        Value::Str(s) => str_method(s, name, &qualified, args),
        Value::Dict(map) => dict_method(map, name, &qualified, args),
        Value::Set(set) => set_method(set, name, &qualified, args),
        _ => Ok(Value::None),
    }
}

fn list_method(
    list: &ListRef,
    name: &str,
    qualified: &str,
    args: Vec<Value>,
    reverse: bool,
) -> Result<Value, RuntimeError> {
    match name {
        "append" => {
            arity(qualified, &args, 1, 1)?;
            list.borrow_mut().extend(args);
            Ok(Value::None)
        }
        "pop" => {
            arity(qualified, &args, 0, 1)?;
            let mut items = list.borrow_mut();
            if items.is_empty() {
                return Err(RuntimeError::index_error("pop from empty list"));
            }
            let index = match args.first() {
                Some(value) => value.as_index()?,
                None => -1,
            };
            let position = normalize_index(index, items.len())
                .ok_or_else(|| RuntimeError::index_error("pop index out of range"))?;
            Ok(items.remove(position))
        }
        "insert" => {
            arity(qualified, &args, 2, 2)?;
            let index = args[0].as_index()?;
            let mut items = list.borrow_mut();
            let len = i64::try_from(items.len()).unwrap_or(i64::MAX);
            let resolved = if index < 0 { index + len } else { index };
            let position = usize::try_from(resolved.clamp(0, len)).unwrap_or(0);
            items.insert(position, args[1].clone());
            Ok(Value::None)
        }
        "remove" => {
            arity(qualified, &args, 1, 1)?;
            let position = list.borrow().iter().position(|v| v.py_eq(&args[0]));
            match position {
                Some(position) => {
                    list.borrow_mut().remove(position);
                    Ok(Value::None)
                }
                None => Err(RuntimeError::value_error("list.remove(x): x not in list")),
            }
        }
        "index" => {
            arity(qualified, &args, 1, 1)?;
            let position = list.borrow().iter().position(|v| v.py_eq(&args[0]));
            position
                .map(|p| Value::Int(p as i64))
                .ok_or_else(|| RuntimeError::value_error(format!("{} is not in list", args[0].repr())))
        }
        "count" => {
            arity(qualified, &args, 1, 1)?;
            let count = list.borrow().iter().filter(|v| v.py_eq(&args[0])).count();
            Ok(Value::Int(count as i64))
        }
        "extend" => {
            arity(qualified, &args, 1, 1)?;
            let items = args[0].to_vec()?;
            list.borrow_mut().extend(items);
            Ok(Value::None)
        }
        "reverse" => {
            arity(qualified, &args, 0, 0)?;
            list.borrow_mut().reverse();
            Ok(Value::None)
        }
        "sort" => {
            arity(qualified, &args, 0, 0)?;
            // sort outside the borrow so comparisons may read the list
            let mut items = std::mem::take(&mut *list.borrow_mut());
            let sorted = sort_values(&mut items, reverse);
            *list.borrow_mut() = items;
            sorted.map(|()| Value::None)
        }
        "copy" => {
            arity(qualified, &args, 0, 0)?;
            Ok(Value::list(list.borrow().clone()))
        }
        "clear" => {
            arity(qualified, &args, 0, 0)?;
            list.borrow_mut().clear();
            Ok(Value::None)
        }
        _ => Ok(Value::None),
    }
}

fn str_arg<'a>(qualified: &str, value: &'a Value) -> Result<&'a str, RuntimeError> {
    match value {
        Value::Str(s) => Ok(s),
        other => Err(RuntimeError::type_error(format!(
            "{}() argument must be str, not {}",
            qualified,
            other.type_name()
        ))),
    }
}

/// Characters to strip: whitespace when absent or `None`.
fn strip_chars(qualified: &str, args: &[Value]) -> Result<Option<Vec<char>>, RuntimeError> {
    match args.first() {
        None | Some(Value::None) => Ok(None),
        Some(value) => Ok(Some(str_arg(qualified, value)?.chars().collect())),
    }
}

fn str_method(s: &Rc<str>, name: &str, qualified: &str, args: Vec<Value>) -> Result<Value, RuntimeError> {
    let text: &str = s;
    match name {
        "upper" => {
            arity(qualified, &args, 0, 0)?;
            Ok(Value::str(&text.to_uppercase()))
        }
        "lower" => {
            arity(qualified, &args, 0, 0)?;
            Ok(Value::str(&text.to_lowercase()))
        }
        "strip" | "lstrip" | "rstrip" => {
            arity(qualified, &args, 0, 1)?;
            let chars = strip_chars(qualified, &args)?;
            let matches = |c: char| match &chars {
                Some(set) => set.contains(&c),
                None => c.is_whitespace(),
            };
            let stripped = match name {
                "lstrip" => text.trim_start_matches(matches),
                "rstrip" => text.trim_end_matches(matches),
                _ => text.trim_matches(matches),
            };
            Ok(Value::str(stripped))
        }
        "split" => {
            arity(qualified, &args, 0, 1)?;
            let parts: Vec<Value> = match args.first() {
                None | Some(Value::None) => text.split_whitespace().map(Value::str).collect(),
                Some(sep) => {
                    let sep = str_arg(qualified, sep)?;
                    if sep.is_empty() {
                        return Err(RuntimeError::value_error("empty separator"));
                    }
                    text.split(sep).map(Value::str).collect()
                }
            };
            Ok(Value::list(parts))
        }
        "join" => {
            arity(qualified, &args, 1, 1)?;
            let mut pieces = Vec::new();
            for (i, item) in args[0].iterate()?.enumerate() {
                match item {
                    Value::Str(piece) => pieces.push(piece),
                    other => {
                        return Err(RuntimeError::type_error(format!(
                            "sequence item {}: expected str instance, {} found",
                            i,
                            other.type_name()
                        )))
                    }
                }
            }
            let pieces: Vec<&str> = pieces.iter().map(|p| &**p).collect();
            Ok(Value::str(&pieces.join(text)))
        }
        "replace" => {
            arity(qualified, &args, 2, 2)?;
            let old = str_arg(qualified, &args[0])?;
            let new = str_arg(qualified, &args[1])?;
            Ok(Value::str(&text.replace(old, new)))
        }
        "startswith" | "endswith" => {
            arity(qualified, &args, 1, 1)?;
            let candidates = match &args[0] {
                Value::Tuple(items) => items.to_vec(),
                other => vec![other.clone()],
            };
            for candidate in &candidates {
                let affix = str_arg(qualified, candidate)?;
                let hit = if name == "startswith" {
                    text.starts_with(affix)
                } else {
                    text.ends_with(affix)
                };
                if hit {
                    return Ok(Value::Bool(true));
                }
            }
            Ok(Value::Bool(false))
        }
        "find" => {
            arity(qualified, &args, 1, 1)?;
            let needle = str_arg(qualified, &args[0])?;
            let index = text
                .find(needle)
                .map_or(-1, |byte| text[..byte].chars().count() as i64);
            Ok(Value::Int(index))
        }
        "count" => {
            arity(qualified, &args, 1, 1)?;
            let needle = str_arg(qualified, &args[0])?;
            let count = if needle.is_empty() {
                text.chars().count() + 1
            } else {
                text.matches(needle).count()
            };
            Ok(Value::Int(count as i64))
        }
        "isdigit" => {
            arity(qualified, &args, 0, 0)?;
            Ok(Value::Bool(!text.is_empty() && text.chars().all(|c| c.is_numeric())))
        }
        "isalpha" => {
            arity(qualified, &args, 0, 0)?;
            Ok(Value::Bool(!text.is_empty() && text.chars().all(char::is_alphabetic)))
        }
        "title" => {
            arity(qualified, &args, 0, 0)?;
            let mut out = String::with_capacity(text.len());
            let mut previous_cased = false;
            for c in text.chars() {
                if previous_cased {
                    out.extend(c.to_lowercase());
                } else {
                    out.extend(c.to_uppercase());
                }
                previous_cased = c.is_alphabetic();
            }
            Ok(Value::str(&out))
        }
        "capitalize" => {
            arity(qualified, &args, 0, 0)?;
            let mut chars = text.chars();
            let out = match chars.next() {
                Some(first) => first.to_uppercase().chain(chars.as_str().to_lowercase().chars()).collect(),
                None => String::new(),
            };
            Ok(Value::str(&out))
        }
        _ => Ok(Value::None),
    }
}

fn dict_method(map: &DictRef, name: &str, qualified: &str, args: Vec<Value>) -> Result<Value, RuntimeError> {
    match name {
        "keys" => {
            arity(qualified, &args, 0, 0)?;
            Ok(Value::list(map.borrow().values().map(|(k, _)| k.clone()).collect()))
        }
        "values" => {
            arity(qualified, &args, 0, 0)?;
            Ok(Value::list(map.borrow().values().map(|(_, v)| v.clone()).collect()))
        }
        "items" => {
            arity(qualified, &args, 0, 0)?;
            Ok(Value::list(
                map.borrow()
                    .values()
                    .map(|(k, v)| Value::tuple(vec![k.clone(), v.clone()]))
                    .collect(),
            ))
        }
        "get" => {
            arity(qualified, &args, 1, 2)?;
            let key = args[0].hash_key()?;
            let found = map.borrow().get(&key).map(|(_, v)| v.clone());
            Ok(found.or_else(|| args.get(1).cloned()).unwrap_or_default())
        }
        "pop" => {
            arity(qualified, &args, 1, 2)?;
            let key = args[0].hash_key()?;
            let removed = map.borrow_mut().shift_remove(&key).map(|(_, v)| v);
            match (removed, args.get(1)) {
                (Some(value), _) => Ok(value),
                (None, Some(default)) => Ok(default.clone()),
                (None, None) => Err(RuntimeError::key_error(args[0].repr())),
            }
        }
        "update" => {
            arity(qualified, &args, 1, 1)?;
            let pairs = dict_pairs(&args[0])?;
            let mut map = map.borrow_mut();
            for (key, value) in pairs {
                map.insert(key.hash_key()?, (key, value));
            }
            Ok(Value::None)
        }
        "copy" => {
            arity(qualified, &args, 0, 0)?;
            Ok(Value::Dict(Rc::new(RefCell::new(map.borrow().clone()))))
        }
        "clear" => {
            arity(qualified, &args, 0, 0)?;
            map.borrow_mut().clear();
            Ok(Value::None)
        }
        _ => Ok(Value::None),
    }
}

fn set_method(set: &SetRef, name: &str, qualified: &str, args: Vec<Value>) -> Result<Value, RuntimeError> {
    match name {
        "add" => {
            arity(qualified, &args, 1, 1)?;
            let key = args[0].hash_key()?;
            set.borrow_mut().entry(key).or_insert_with(|| args[0].clone());
            Ok(Value::None)
        }
        "remove" => {
            arity(qualified, &args, 1, 1)?;
            let key = args[0].hash_key()?;
            match set.borrow_mut().shift_remove(&key) {
                Some(_) => Ok(Value::None),
                None => Err(RuntimeError::key_error(args[0].repr())),
            }
        }
        "discard" => {
            arity(qualified, &args, 1, 1)?;
            let key = args[0].hash_key()?;
            set.borrow_mut().shift_remove(&key);
            Ok(Value::None)
        }
        "copy" => {
            arity(qualified, &args, 0, 0)?;
            Ok(Value::Set(Rc::new(RefCell::new(set.borrow().clone()))))
        }
        "clear" => {
            arity(qualified, &args, 0, 0)?;
            set.borrow_mut().clear();
            Ok(Value::None)
        }
        _ => Ok(Value::None),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn call(receiver: &Value, name: &str, args: Vec<Value>) -> Result<Value, RuntimeError> {
        call_method(receiver, name, args, Vec::new())
    }

    #[test]
    fn test_list_mutation_is_shared() {
        let list = Value::list(vec![Value::Int(3)]);
        let alias = list.clone();
        call(&list, "append", vec![Value::Int(1)]).unwrap();
        call(&list, "insert", vec![Value::Int(0), Value::Int(2)]).unwrap();
        assert_eq!(alias.repr(), "[2, 3, 1]");
        call_method(&list, "sort", vec![], vec![("reverse".to_string(), Value::Bool(true))]).unwrap();
        assert_eq!(alias.repr(), "[3, 2, 1]");
        assert!(call(&list, "pop", vec![]).unwrap().py_eq(&Value::Int(1)));
        assert_eq!(
            call(&list, "index", vec![Value::Int(9)]).unwrap_err().message,
            "9 is not in list"
        );
    }

    #[test]
    fn test_pop_from_empty_list() {
        let err = call(&Value::list(vec![]), "pop", vec![]).unwrap_err();
        assert_eq!(err.to_string(), "IndexError: pop from empty list");
    }

    #[test]
    fn test_string_methods() {
        let s = Value::str("  a,b,,c  ");
        assert_eq!(call(&s, "strip", vec![]).unwrap().py_str(), "a,b,,c");
        let parts = call(&call(&s, "strip", vec![]).unwrap(), "split", vec![Value::str(",")]).unwrap();
        assert_eq!(parts.repr(), "['a', 'b', '', 'c']");
        let joined = call(&Value::str("-"), "join", vec![Value::str("xyz")]).unwrap();
        assert_eq!(joined.py_str(), "x-y-z");
        assert!(call(&Value::str("héllo"), "find", vec![Value::str("l")])
            .unwrap()
            .py_eq(&Value::Int(2)));
        assert_eq!(call(&Value::str("hello world"), "title", vec![]).unwrap().py_str(), "Hello World");
        assert_eq!(call(&Value::str("hELLO"), "capitalize", vec![]).unwrap().py_str(), "Hello");
        let err = call(&Value::str("-"), "join", vec![Value::list(vec![Value::Int(1)])]).unwrap_err();
        assert_eq!(err.message, "sequence item 0: expected str instance, int found");
    }

    #[test]
    fn test_dict_methods() {
        let dict = Value::dict(vec![(Value::str("a"), Value::Int(1))]).unwrap();
        assert!(call(&dict, "get", vec![Value::str("b"), Value::Int(0)])
            .unwrap()
            .py_eq(&Value::Int(0)));
        call(&dict, "update", vec![Value::list(vec![Value::tuple(vec![Value::str("b"), Value::Int(2)])])]).unwrap();
        assert_eq!(call(&dict, "items", vec![]).unwrap().repr(), "[('a', 1), ('b', 2)]");
        assert!(call(&dict, "pop", vec![Value::str("a")]).unwrap().py_eq(&Value::Int(1)));
        assert_eq!(
            call(&dict, "pop", vec![Value::str("a")]).unwrap_err().to_string(),
            "KeyError: 'a'"
        );
    }

    #[test]
    fn test_set_methods() {
        let set = Value::set(vec![]).unwrap();
        call(&set, "add", vec![Value::Int(1)]).unwrap();
        call(&set, "add", vec![Value::Int(1)]).unwrap();
        call(&set, "discard", vec![Value::Int(5)]).unwrap();
        assert_eq!(set.repr(), "{1}");
        assert!(call(&set, "remove", vec![Value::Int(5)]).is_err());
    }

    #[test]
    fn test_unknown_method() {
        assert!(!has_method(&Value::Int(1), "append"));
        let err = call(&Value::list(vec![]), "push", vec![]).unwrap_err();
        assert_eq!(err.to_string(), "AttributeError: 'list' object has no attribute 'push'");
    }
}
