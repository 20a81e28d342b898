//! Call stack implementation
//!
//! This module provides the call stack for user function execution:
//! - [`Stack`]: The call stack containing frames
//! - [`StackFrame`]: A single function's activation record
//!
//! Module-level code runs with an empty stack and reads/writes globals. Each
//! user function call pushes a frame holding its local variables; functions
//! have no access to enclosing function scopes.
//!
//! # Local names
//!
//! A frame knows every name its function binds anywhere in its body. Reading
//! such a name before it is assigned raises `UnboundLocalError` instead of
//! falling back to a global of the same name.

use super::value::Value;
use crate::compiler::ir::FunctionCode;
use rustc_hash::FxHashMap;
use std::sync::Arc;

/// Stack frame for a function call
#[derive(Debug)]
pub struct StackFrame {
    pub code: Arc<FunctionCode>,
    pub locals: FxHashMap<String, Value>,
    /// Function-relative line of the statement being executed
    pub line: u32,
}

impl StackFrame {
    pub fn new(code: Arc<FunctionCode>) -> Self {
        StackFrame {
            code,
            locals: FxHashMap::default(),
            line: 1,
        }
    }

    /// Whether `name` is local to this function, bound or not
    pub fn is_local(&self, name: &str) -> bool {
        self.code.locals.contains(name)
    }

    pub fn get_var(&self, name: &str) -> Option<&Value> {
        self.locals.get(name)
    }

    pub fn set_var(&mut self, name: &str, value: Value) {
        if let Some(slot) = self.locals.get_mut(name) {
            *slot = value;
        } else {
            self.locals.insert(name.to_string(), value);
        }
    }
}

/// The call stack
#[derive(Debug, Default)]
pub struct Stack {
    frames: Vec<StackFrame>,
}

impl Stack {
    pub fn new() -> Self {
        Stack { frames: Vec::new() }
    }

    /// Push a new stack frame
    pub fn push_frame(&mut self, frame: StackFrame) {
        self.frames.push(frame);
    }

    /// Pop the top stack frame
    pub fn pop_frame(&mut self) -> Option<StackFrame> {
        self.frames.pop()
    }

    /// Get the current (top) frame
    pub fn current_frame(&self) -> Option<&StackFrame> {
        self.frames.last()
    }

    /// Get a mutable reference to the current frame
    pub fn current_frame_mut(&mut self) -> Option<&mut StackFrame> {
        self.frames.last_mut()
    }

    /// Get the depth of the call stack
    pub fn depth(&self) -> usize {
        self.frames.len()
    }

    /// Check if stack is empty (module-level code)
    pub fn is_empty(&self) -> bool {
        self.frames.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rustc_hash::FxHashSet;

    fn code(locals: &[&str]) -> Arc<FunctionCode> {
        Arc::new(FunctionCode {
            name: "f".to_string(),
            id: "f".to_string(),
            params: vec![],
            locals: locals.iter().map(|s| s.to_string()).collect::<FxHashSet<_>>(),
            traced: vec![],
            plain: vec![],
        })
    }

    #[test]
    fn test_frames_are_independent() {
        let mut stack = Stack::new();
        assert!(stack.is_empty());
        stack.push_frame(StackFrame::new(code(&["x"])));
        stack.current_frame_mut().unwrap().set_var("x", Value::Int(1));
        stack.push_frame(StackFrame::new(code(&["x"])));
        assert!(stack.current_frame().unwrap().get_var("x").is_none());
        assert!(stack.current_frame().unwrap().is_local("x"));
        stack.pop_frame();
        assert!(matches!(
            stack.current_frame().unwrap().get_var("x"),
            Some(Value::Int(1))
        ));
        assert_eq!(stack.depth(), 1);
    }
}
