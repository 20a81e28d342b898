//! Memory model for the interpreter
//!
//! This module provides the core memory abstractions:
//! - [`value`]: Runtime value representation (scalars, containers, callables)
//! - [`stack`]: Call stack with one frame of local variables per user call
//!
//! Global variables live directly on the interpreter; there is no separate
//! heap, since containers are reference counted.

pub mod stack;
pub mod value;
