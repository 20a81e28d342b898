//! Execution driver
//!
//! Runs a compiled program in one of three modes and packages everything the
//! run produced into an [`Execution`]:
//!
//! - [`RunMode::Command`] and [`RunMode::Scheduled`] run the program as is
//! - [`RunMode::Request`] binds the JSON payload to the global `request` and
//!   exposes `set_response(value)`; the last published value is returned as
//!   JSON
//!
//! Compile errors are returned to the caller. Runtime failures never are:
//! they are recorded in the capture's `lastException` and the run still yields
//! an [`Execution`].
//!
//! # Threading
//!
//! The program runs on a dedicated worker thread whose stack size comes from
//! [`ExecutionLimits`], and the caller blocks until it finishes. Deep
//! recursion is therefore bounded by the recursion limit and not by the
//! caller's stack. When the worker cannot be spawned the program runs on the
//! calling thread instead.

use crate::capture::{Capture, CaptureResult};
use crate::compiler::compile;
use crate::compiler::errors::CompileError;
use crate::compiler::ir::Program;
use crate::interpreter::engine::Interpreter;
use crate::interpreter::errors::{ExceptionType, RuntimeError};
use crate::interpreter::terminal::Terminal;
use crate::limits::ExecutionLimits;
use crate::memory::value::{HashKey, Value};
use crate::tree::Node;
use indexmap::IndexMap;
use serde::Serialize;
use std::any::Any;
use std::cell::RefCell;
use std::rc::Rc;

/// How the program was triggered
#[derive(Debug, Clone, PartialEq)]
pub enum RunMode {
    Command,
    Scheduled,
    /// Request handler with its JSON payload
    Request(serde_json::Value),
}

impl RunMode {
    pub fn as_str(&self) -> &'static str {
        match self {
            RunMode::Command => "command",
            RunMode::Scheduled => "scheduled",
            RunMode::Request(_) => "request",
        }
    }
}

/// Everything one run produced
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Execution {
    pub capture: CaptureResult,
    /// Last value passed to `set_response`, in request mode
    #[serde(skip_serializing_if = "Option::is_none")]
    pub response: Option<serde_json::Value>,
    pub stdout: String,
}

/// Compiles and runs node trees under fixed limits.
#[derive(Debug, Clone, Default)]
pub struct Driver {
    limits: ExecutionLimits,
    stdin: Vec<String>,
}

impl Driver {
    pub fn new(limits: ExecutionLimits) -> Self {
        Driver {
            limits,
            stdin: Vec::new(),
        }
    }

    /// Lines served to `input()`, in order.
    pub fn with_stdin<I, S>(mut self, lines: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.stdin = lines.into_iter().map(Into::into).collect();
        self
    }

    pub fn limits(&self) -> &ExecutionLimits {
        &self.limits
    }

    /// Compile `tree` and run it. Decoding and lowering recurse over the tree,
    /// so they run on the worker stack as well.
    pub fn run(&self, tree: &Node, mode: RunMode) -> Result<Execution, CompileError> {
        let job = || -> Result<Execution, CompileError> {
            let program = compile(tree)?;
            Ok(self.execute_inline(&program, &mode))
        };
        self.on_worker(job)
            .unwrap_or_else(|message| Ok(self.internal_failure(message)))
    }

    /// Run an already compiled program on the worker thread.
    pub fn execute(&self, program: &Program, mode: RunMode) -> Execution {
        self.on_worker(|| self.execute_inline(program, &mode))
            .unwrap_or_else(|message| self.internal_failure(message))
    }

    /// Run `job` on a scoped thread with the configured stack size, or inline
    /// when no thread can be spawned. A panic comes back as its message.
    fn on_worker<T: Send>(&self, job: impl Fn() -> T + Sync) -> Result<T, String> {
        std::thread::scope(|scope| {
            let worker = std::thread::Builder::new()
                .name("treetrace-worker".to_string())
                .stack_size(self.limits.get_stack_size())
                .spawn_scoped(scope, || job());

            match worker {
                Ok(handle) => handle.join().map_err(|payload| {
                    let message = panic_message(payload.as_ref());
                    tracing::warn!(%message, "worker panicked");
                    message
                }),
                Err(err) => {
                    tracing::warn!(error = %err, "could not spawn worker, running inline");
                    Ok(job())
                }
            }
        })
    }

    fn execute_inline(&self, program: &Program, mode: &RunMode) -> Execution {
        tracing::info!(mode = mode.as_str(), "run started");
        let mut capture = Capture::new(&self.limits);
        let terminal = Terminal::with_stdin(self.stdin.iter().cloned());
        let mut interpreter = Interpreter::new(&mut capture, self.limits, terminal);
        if let RunMode::Request(payload) = mode {
            interpreter.enable_request(json_to_value(payload));
        }

        let outcome = interpreter.run(program);
        let response = interpreter.response().map(value_to_json);
        let stdout = interpreter.into_terminal().into_output();

        if let Err(err) = &outcome {
            tracing::warn!(exception = %err, "program raised an uncaught exception");
            capture.log_uncaught_exception(err);
        }

        tracing::info!(mode = mode.as_str(), failed = outcome.is_err(), "run finished");
        Execution {
            capture: capture.to_dict(),
            response,
            stdout,
        }
    }

    fn internal_failure(&self, message: String) -> Execution {
        let mut capture = Capture::new(&self.limits);
        capture.log_uncaught_exception(&RuntimeError::new(ExceptionType::InternalError, message));
        Execution {
            capture: capture.to_dict(),
            response: None,
            stdout: String::new(),
        }
    }
}

fn panic_message(payload: &(dyn Any + Send)) -> String {
    if let Some(message) = payload.downcast_ref::<&str>() {
        message.to_string()
    } else if let Some(message) = payload.downcast_ref::<String>() {
        message.clone()
    } else {
        "interpreter panicked".to_string()
    }
}

/// Convert a request payload into runtime values.
pub fn json_to_value(json: &serde_json::Value) -> Value {
    match json {
        serde_json::Value::Null => Value::None,
        serde_json::Value::Bool(b) => Value::Bool(*b),
        serde_json::Value::Number(n) => match n.as_i64() {
            Some(i) => Value::Int(i),
            None => Value::Float(n.as_f64().unwrap_or(f64::NAN)),
        },
        serde_json::Value::String(s) => Value::str(s),
        serde_json::Value::Array(items) => Value::list(items.iter().map(json_to_value).collect()),
        serde_json::Value::Object(fields) => {
            let map: IndexMap<HashKey, (Value, Value)> = fields
                .iter()
                .map(|(key, value)| {
                    let key_value = Value::str(key);
                    (HashKey::Str(Rc::from(key.as_str())), (key_value, json_to_value(value)))
                })
                .collect();
            Value::Dict(Rc::new(RefCell::new(map)))
        }
    }
}

/// Convert a published response into JSON.
///
/// Containers become arrays and objects, dict keys are stringified, and any
/// other value is represented by its `str()`. A container that contains
/// itself is cut off with its `repr` at the point of recursion.
pub fn value_to_json(value: &Value) -> serde_json::Value {
    let mut seen = Vec::new();
    to_json(value, &mut seen)
}

fn to_json(value: &Value, seen: &mut Vec<*const ()>) -> serde_json::Value {
    use serde_json::Value as Json;

    let identity = match value {
        Value::List(items) => Some(Rc::as_ptr(items) as *const ()),
        Value::Dict(map) => Some(Rc::as_ptr(map) as *const ()),
        _ => None,
    };
    if let Some(ptr) = identity {
        if seen.contains(&ptr) {
            return Json::String(value.repr());
        }
        seen.push(ptr);
    }

    let json = match value {
        Value::None => Json::Null,
        Value::Bool(b) => Json::Bool(*b),
        Value::Int(i) => Json::from(*i),
        Value::Float(f) => serde_json::Number::from_f64(*f)
            .map(Json::Number)
            .unwrap_or_else(|| Json::String(value.py_str())),
        Value::Str(s) => Json::String(s.to_string()),
        Value::List(items) => Json::Array(items.borrow().iter().map(|v| to_json(v, seen)).collect()),
        Value::Tuple(items) => Json::Array(items.iter().map(|v| to_json(v, seen)).collect()),
        Value::Set(map) => Json::Array(map.borrow().values().map(|v| to_json(v, seen)).collect()),
        Value::Dict(map) => Json::Object(
            map.borrow()
                .values()
                .map(|(key, value)| (key.py_str(), to_json(value, seen)))
                .collect(),
        ),
        other => Json::String(other.py_str()),
    };

    if identity.is_some() {
        seen.pop();
    }
    json
}
