// Execution engine for the lowered program

use crate::capture::{Capture, TraceKind};
use crate::compiler::ir::{FunctionCode, Program, Stmt};
use crate::interpreter::builtins::Builtin;
use crate::interpreter::errors::RuntimeError;
use crate::interpreter::methods;
use crate::interpreter::terminal::Terminal;
use crate::limits::ExecutionLimits;
use crate::memory::stack::{Stack, StackFrame};
use crate::memory::value::Value;
use rustc_hash::FxHashMap;
use std::sync::Arc;

/// How a statement sequence finished
#[derive(Debug, Clone)]
pub(crate) enum Flow {
    Normal,
    Break,
    Continue,
    Return(Value),
}

/// Tree-walking interpreter over a compiled [`Program`].
///
/// Trace instructions in the program are forwarded to the borrowed
/// [`Capture`]; everything else runs with Python semantics.
pub struct Interpreter<'c> {
    /// Receives every trace instruction
    pub(crate) capture: &'c mut Capture,

    /// Module-level variables
    pub(crate) globals: FxHashMap<String, Value>,

    /// One frame per active user function call
    pub(crate) stack: Stack,

    /// Recorded output and queued input
    pub(crate) terminal: Terminal,

    pub(crate) limits: ExecutionLimits,

    /// Whether `set_response` is available
    pub(crate) request_mode: bool,

    /// Last value passed to `set_response`
    pub(crate) response: Option<Value>,
}

impl<'c> Interpreter<'c> {
    pub fn new(capture: &'c mut Capture, limits: ExecutionLimits, terminal: Terminal) -> Self {
        Interpreter {
            capture,
            globals: FxHashMap::default(),
            stack: Stack::new(),
            terminal,
            limits,
            request_mode: false,
            response: None,
        }
    }

    /// Bind `request` and enable `set_response`.
    pub fn enable_request(&mut self, request: Value) {
        self.request_mode = true;
        self.globals.insert("request".to_string(), request);
    }

    /// Run the module body to completion.
    pub fn run(&mut self, program: &Program) -> Result<(), RuntimeError> {
        self.execute_block(&program.body)?;
        Ok(())
    }

    pub fn response(&self) -> Option<&Value> {
        self.response.as_ref()
    }

    pub fn terminal(&self) -> &Terminal {
        &self.terminal
    }

    pub fn into_terminal(self) -> Terminal {
        self.terminal
    }

    /// Execute statements until one leaves the block early.
    pub(crate) fn execute_block(&mut self, body: &[Stmt]) -> Result<Flow, RuntimeError> {
        for stmt in body {
            match self.execute_statement(stmt)? {
                Flow::Normal => {}
                other => return Ok(other),
            }
        }
        Ok(Flow::Normal)
    }

    /// Write program output to the terminal and the capture.
    pub(crate) fn write_stdout(&mut self, text: &str) {
        self.terminal.print(text);
        self.capture.log_side_effect(text);
    }

    /// Read a variable: locals, then globals, then builtins.
    pub(crate) fn load_name(&self, name: &str) -> Result<Value, RuntimeError> {
        if let Some(frame) = self.stack.current_frame() {
            if let Some(value) = frame.get_var(name) {
                return Ok(value.clone());
            }
            if frame.is_local(name) {
                return Err(RuntimeError::unbound_local(name));
            }
        }
        if let Some(value) = self.globals.get(name) {
            return Ok(value.clone());
        }
        match Builtin::lookup(name) {
            Some(Builtin::SetResponse) if !self.request_mode => Err(RuntimeError::name_error(name)),
            Some(builtin) => Ok(Value::Builtin(builtin)),
            None => Err(RuntimeError::name_error(name)),
        }
    }

    /// Bind a variable in the current scope.
    pub(crate) fn store_name(&mut self, name: &str, value: Value) {
        match self.stack.current_frame_mut() {
            Some(frame) => frame.set_var(name, value),
            None => {
                self.globals.insert(name.to_string(), value);
            }
        }
    }

    /// Call any callable value.
    pub(crate) fn call_value(
        &mut self,
        callee: &Value,
        args: Vec<Value>,
        kwargs: Vec<(String, Value)>,
    ) -> Result<Value, RuntimeError> {
        match callee {
            Value::Function(code) => self.call_function(code, args, kwargs),
            Value::Builtin(builtin) => self.call_builtin(*builtin, args, kwargs),
            Value::BoundMethod { receiver, name } => methods::call_method(receiver, name, args, kwargs),
            other => Err(RuntimeError::type_error(format!(
                "'{}' object is not callable",
                other.type_name()
            ))),
        }
    }

    /// Call a user function.
    ///
    /// The capture decides per call whether the traced body runs under a
    /// detached frame or the plain body runs unrecorded. Either way the frame
    /// stack is restored to its depth at entry once the call ends.
    pub(crate) fn call_function(
        &mut self,
        code: &Arc<FunctionCode>,
        args: Vec<Value>,
        kwargs: Vec<(String, Value)>,
    ) -> Result<Value, RuntimeError> {
        if self.stack.depth() >= self.limits.recursion_limit {
            return Err(RuntimeError::recursion_limit());
        }
        let frame = bind_arguments(code, args, kwargs)?;

        let ticket = self.capture.begin_call(&code.id);
        let depth = self.capture.depth();
        if ticket.traced {
            self.capture
                .start_detached_frame(TraceKind::FunctionCall, "body", &code.id);
        }

        self.stack.push_frame(frame);
        let body = if ticket.traced { &code.traced } else { &code.plain };
        let result = self.execute_block(body);
        let line = self.stack.pop_frame().map_or(1, |frame| frame.line);

        match result {
            Ok(flow) => {
                if ticket.traced {
                    self.capture.unwind_to(depth);
                }
                match flow {
                    Flow::Return(value) => Ok(value),
                    _ => Ok(Value::None),
                }
            }
            Err(err) => {
                if ticket.traced {
                    self.capture.log_call_exception(&err, ticket, line, depth);
                }
                Err(err)
            }
        }
    }
}

/// Build the callee's frame from call arguments.
fn bind_arguments(
    code: &Arc<FunctionCode>,
    args: Vec<Value>,
    kwargs: Vec<(String, Value)>,
) -> Result<StackFrame, RuntimeError> {
    let name = &code.name;
    let expected = code.params.len();
    if args.len() > expected {
        return Err(RuntimeError::type_error(format!(
            "{}() takes {} positional argument{} but {} {} given",
            name,
            expected,
            if expected == 1 { "" } else { "s" },
            args.len(),
            if args.len() == 1 { "was" } else { "were" }
        )));
    }

    let mut slots: Vec<Option<Value>> = args.into_iter().map(Some).collect();
    slots.resize(expected, None);

    for (keyword, value) in kwargs {
        let position = code
            .params
            .iter()
            .position(|p| *p == keyword)
            .ok_or_else(|| {
                RuntimeError::type_error(format!(
                    "{}() got an unexpected keyword argument '{}'",
                    name, keyword
                ))
            })?;
        if slots[position].is_some() {
            return Err(RuntimeError::type_error(format!(
                "{}() got multiple values for argument '{}'",
                name, keyword
            )));
        }
        slots[position] = Some(value);
    }

    let missing: Vec<&String> = code
        .params
        .iter()
        .zip(&slots)
        .filter(|(_, slot)| slot.is_none())
        .map(|(param, _)| param)
        .collect();
    if !missing.is_empty() {
        let names: Vec<String> = missing.iter().map(|p| format!("'{}'", p)).collect();
        let listed = match names.as_slice() {
            [only] => only.clone(),
            [init @ .., last] => format!("{} and {}", init.join(", "), last),
            [] => String::new(),
        };
        return Err(RuntimeError::type_error(format!(
            "{}() missing {} required positional argument{}: {}",
            name,
            missing.len(),
            if missing.len() == 1 { "" } else { "s" },
            listed
        )));
    }

    let mut frame = StackFrame::new(code.clone());
    for (param, value) in code.params.iter().zip(slots) {
        if let Some(value) = value {
            frame.set_var(param, value);
        }
    }
    Ok(frame)
}
