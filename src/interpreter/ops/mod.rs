//! Operator and access evaluation
//!
//! Each submodule pairs an `impl Interpreter` entry point, which evaluates the
//! operand expressions, with free functions that apply the operation to
//! already-evaluated values. Builtins and methods reuse the free functions.

pub mod access;
pub mod assign;
pub mod binary;
pub mod unary;
