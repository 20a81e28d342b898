//! Node-tree compiler
//!
//! This module turns an editor node tree into an instrumented program:
//! - [`operators`]: the fixed operator precedence table
//! - [`expressions`]: precedence climbing over flat token sequences
//! - [`lower`]: statement lowering with traced and plain variants
//! - [`ir`]: the lowered program the interpreter runs
//! - [`errors`]: compile-time failures
//!
//! # Pipeline
//!
//! ```text
//! Node (JSON) → tree::convert → Statement/Token → lower → ir::Program
//!                                     ↑
//!                        expressions (per token sequence)
//! ```
//!
//! Compilation is all-or-nothing: the first error aborts it.

pub mod errors;
pub mod expressions;
pub mod ir;
pub mod lower;
pub mod operators;

use crate::tree::{convert, Node};
use errors::CompileError;
use ir::Program;

/// Compile a `PYTHON_FILE` node tree into a traced program.
pub fn compile(tree: &Node) -> Result<Program, CompileError> {
    let body = convert::decode_file(tree)?;
    let program = lower::lower_module(&body)?;
    tracing::debug!(statements = program.body.len(), "compiled node tree");
    Ok(program)
}
