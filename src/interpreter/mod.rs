//! Program execution engine
//!
//! This module provides the core execution logic:
//! - [`engine`]: Main interpreter, scopes and function calls
//! - [`statements`], [`loops`], [`expressions`]: IR evaluation
//! - [`ops`]: Operators, subscripts and assignment targets
//! - [`builtins`], [`methods`], [`modules`]: The host environment
//! - [`terminal`]: Recorded stdout and queued stdin
//! - [`errors`]: Runtime error types
//!
//! # Execution Model
//!
//! The interpreter walks the lowered IR one statement at a time. Trace
//! instructions woven into the IR are forwarded to the borrowed
//! [`crate::capture::Capture`]; every other statement runs with Python
//! semantics.

pub mod builtins;
pub mod engine;
pub mod errors;
pub mod expressions;
pub mod loops;
pub mod methods;
pub mod modules;
pub mod ops;
pub mod statements;
pub mod terminal;
