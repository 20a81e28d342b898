//! Importable modules
//!
//! Only two modules exist: `math` and `string`. A module is a flat table of
//! attributes built on each import.

use crate::interpreter::builtins::Builtin;
use crate::interpreter::errors::{ExceptionType, RuntimeError};
use crate::memory::value::Value;
use indexmap::IndexMap;
use std::rc::Rc;

#[derive(Debug)]
pub struct Module {
    pub name: &'static str,
    attributes: IndexMap<&'static str, Value>,
}

impl Module {
    pub fn attribute(&self, name: &str) -> Option<Value> {
        self.attributes.get(name).cloned()
    }

    fn math() -> Module {
        let mut attributes = IndexMap::new();
        attributes.insert("pi", Value::Float(std::f64::consts::PI));
        attributes.insert("e", Value::Float(std::f64::consts::E));
        attributes.insert("tau", Value::Float(std::f64::consts::TAU));
        attributes.insert("inf", Value::Float(f64::INFINITY));
        for builtin in Builtin::MATH {
            attributes.insert(builtin.name(), Value::Builtin(builtin));
        }
        Module {
            name: "math",
            attributes,
        }
    }

    fn string() -> Module {
        let lowercase = "abcdefghijklmnopqrstuvwxyz";
        let uppercase = "ABCDEFGHIJKLMNOPQRSTUVWXYZ";
        let mut attributes = IndexMap::new();
        attributes.insert("ascii_lowercase", Value::str(lowercase));
        attributes.insert("ascii_uppercase", Value::str(uppercase));
        attributes.insert(
            "ascii_letters",
            Value::str(&format!("{}{}", lowercase, uppercase)),
        );
        attributes.insert("digits", Value::str("0123456789"));
        Module {
            name: "string",
            attributes,
        }
    }
}

/// Resolve `import name`.
pub fn load(name: &str) -> Result<Rc<Module>, RuntimeError> {
    match name {
        "math" => Ok(Rc::new(Module::math())),
        "string" => Ok(Rc::new(Module::string())),
        _ => Err(RuntimeError::new(
            ExceptionType::ModuleNotFoundError,
            format!("No module named '{}'", name),
        )),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_math_attributes() {
        let math = load("math").unwrap();
        assert!(matches!(math.attribute("pi"), Some(Value::Float(_))));
        assert!(matches!(
            math.attribute("sqrt"),
            Some(Value::Builtin(Builtin::Sqrt))
        ));
        assert!(math.attribute("nope").is_none());
    }

    #[test]
    fn test_unknown_module() {
        let err = load("numpy").unwrap_err();
        assert_eq!(err.to_string(), "ModuleNotFoundError: No module named 'numpy'");
    }
}
