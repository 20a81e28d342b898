//! # Introduction
//!
//! treetrace compiles programs written in a block editor, exchanged as a JSON
//! tree of typed nodes, into an instrumented program, runs it, and records a
//! replayable trace of every value the program produced.
//!
//! ## Execution pipeline
//!
//! ```text
//! Node tree → Decoder → Expression parser → Lowering → Interpreter → Capture
//! ```
//!
//! 1. [`tree`] decodes the wire format into closed statement and token enums.
//! 2. [`compiler`] resolves flat token sequences by precedence climbing and
//!    lowers every statement twice: a traced body that reports to the capture
//!    engine and a plain body without instrumentation.
//! 3. [`interpreter`] executes the lowered program over the Python value
//!    model in [`memory`].
//! 4. [`capture`] assembles the frame tree, the detached function-call
//!    captures and the last uncaught exception.
//! 5. [`driver`] ties it together for the three run modes and returns an
//!    [`driver::Execution`].
//!
//! [`parser`] reads and prints Python source text, so programs can be moved
//! between text and node-tree form. [`limits::ExecutionLimits`] bounds loop
//! iterations, captured calls, recursion depth and the worker stack.

pub mod capture;
pub mod compiler;
pub mod driver;
pub mod interpreter;
pub mod limits;
pub mod memory;
pub mod parser;
pub mod tree;
