//! Runtime error types for the interpreter
//!
//! This module defines [`RuntimeError`], the failure raised by an executing
//! program (as opposed to [`crate::compiler::errors::CompileError`], which stops
//! a program before it runs).
//!
//! Runtime errors unwind to the nearest captured function call, which records
//! them, and finally to the driver, which records them as the run's last
//! exception. They never escape [`crate::driver::Driver::run`].

use std::fmt;

/// Python exception class a runtime failure reports as.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExceptionType {
    /// Plain `Exception`, raised by the iteration limit
    Exception,
    TypeError,
    ValueError,
    ZeroDivisionError,
    IndexError,
    KeyError,
    NameError,
    UnboundLocalError,
    AttributeError,
    RecursionError,
    ModuleNotFoundError,
    ImportError,
    EOFError,
    OverflowError,
    /// The interpreter itself failed (worker panic)
    InternalError,
}

impl ExceptionType {
    pub fn as_str(self) -> &'static str {
        match self {
            ExceptionType::Exception => "Exception",
            ExceptionType::TypeError => "TypeError",
            ExceptionType::ValueError => "ValueError",
            ExceptionType::ZeroDivisionError => "ZeroDivisionError",
            ExceptionType::IndexError => "IndexError",
            ExceptionType::KeyError => "KeyError",
            ExceptionType::NameError => "NameError",
            ExceptionType::UnboundLocalError => "UnboundLocalError",
            ExceptionType::AttributeError => "AttributeError",
            ExceptionType::RecursionError => "RecursionError",
            ExceptionType::ModuleNotFoundError => "ModuleNotFoundError",
            ExceptionType::ImportError => "ImportError",
            ExceptionType::EOFError => "EOFError",
            ExceptionType::OverflowError => "OverflowError",
            ExceptionType::InternalError => "InternalError",
        }
    }
}

impl fmt::Display for ExceptionType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A failure raised while running a compiled program
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
#[error("{exception_type}: {message}")]
pub struct RuntimeError {
    pub exception_type: ExceptionType,
    pub message: String,
}

impl RuntimeError {
    pub fn new(exception_type: ExceptionType, message: impl Into<String>) -> Self {
        RuntimeError {
            exception_type,
            message: message.into(),
        }
    }

    pub fn type_error(message: impl Into<String>) -> Self {
        Self::new(ExceptionType::TypeError, message)
    }

    pub fn value_error(message: impl Into<String>) -> Self {
        Self::new(ExceptionType::ValueError, message)
    }

    pub fn index_error(message: impl Into<String>) -> Self {
        Self::new(ExceptionType::IndexError, message)
    }

    pub fn zero_division(message: impl Into<String>) -> Self {
        Self::new(ExceptionType::ZeroDivisionError, message)
    }

    pub fn attribute_error(message: impl Into<String>) -> Self {
        Self::new(ExceptionType::AttributeError, message)
    }

    /// `KeyError` messages are the repr of the missing key
    pub fn key_error(key_repr: impl Into<String>) -> Self {
        Self::new(ExceptionType::KeyError, key_repr)
    }

    pub fn name_error(name: &str) -> Self {
        Self::new(
            ExceptionType::NameError,
            format!("name '{}' is not defined", name),
        )
    }

    pub fn unbound_local(name: &str) -> Self {
        Self::new(
            ExceptionType::UnboundLocalError,
            format!(
                "cannot access local variable '{}' where it is not associated with a value",
                name
            ),
        )
    }

    pub fn overflow(operation: &str) -> Self {
        Self::new(
            ExceptionType::OverflowError,
            format!("integer overflow in {}", operation),
        )
    }

    pub fn too_many_iterations() -> Self {
        Self::new(ExceptionType::Exception, "Too many iterations.")
    }

    pub fn recursion_limit() -> Self {
        Self::new(
            ExceptionType::RecursionError,
            "maximum recursion depth exceeded",
        )
    }

    pub fn eof() -> Self {
        Self::new(ExceptionType::EOFError, "EOF when reading a line")
    }

    pub fn type_name(&self) -> &'static str {
        self.exception_type.as_str()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_display_matches_python_traceback_tail() {
        let err = RuntimeError::type_error("can only concatenate str (not \"int\") to str");
        assert_eq!(
            err.to_string(),
            "TypeError: can only concatenate str (not \"int\") to str"
        );
        assert_eq!(RuntimeError::name_error("x").message, "name 'x' is not defined");
        assert_eq!(RuntimeError::too_many_iterations().type_name(), "Exception");
    }
}
