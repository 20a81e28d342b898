//! Capture engine
//!
//! Records what a running program does so the editor can replay it:
//! - [`Capture`]: the live recorder driven by the interpreter's trace instructions
//! - [`CaptureResult`]: the finished, serializable record of one run
//!
//! # Frames
//!
//! Every traced construct (if, loop, loop iteration, import, function call)
//! opens a frame. A frame owns named child sets (`"condition"`, `"trueblock"`,
//! ...) holding entries: expression results, nested frames and exceptions.
//! Entries always go to the frame's *active* child set.
//!
//! Frames live in an arena and are referenced by index. A frame opened with
//! [`Capture::start_frame`] is linked into its parent's active child set the
//! moment it opens. Function-call frames are *detached*: they are filed under
//! the function's id instead of under the caller.
//!
//! ```text
//! root (PYTHON_FILE) body: [ASSIGNMENT, IF_STATEMENT{condition, trueblock}, ...]
//! detached: { "fact": { calls: [FUNCTION_CALL{body}, ...], invocations: 12 } }
//! ```

use crate::interpreter::errors::RuntimeError;
use crate::limits::ExecutionLimits;
use crate::memory::value::Value;
use indexmap::IndexMap;
use serde::Serialize;

/// Construct a frame or a result entry was recorded for.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum TraceKind {
    #[serde(rename = "PYTHON_FILE")]
    File,
    #[serde(rename = "PYTHON_EXPRESSION")]
    Expression,
    #[serde(rename = "PYTHON_ASSIGNMENT")]
    Assignment,
    #[serde(rename = "PYTHON_RETURN")]
    Return,
    #[serde(rename = "PYTHON_IF_STATEMENT")]
    If,
    #[serde(rename = "PYTHON_ELIF_STATEMENT")]
    Elif,
    #[serde(rename = "PYTHON_ELSE_STATEMENT")]
    Else,
    #[serde(rename = "PYTHON_WHILE_LOOP")]
    WhileLoop,
    #[serde(rename = "PYTHON_WHILE_LOOP_ITERATION")]
    WhileIteration,
    #[serde(rename = "PYTHON_FOR_LOOP")]
    ForLoop,
    #[serde(rename = "PYTHON_FOR_LOOP_ITERATION")]
    ForIteration,
    #[serde(rename = "PYTHON_FUNCTION_CALL")]
    FunctionCall,
    #[serde(rename = "PYTHON_IMPORT")]
    Import,
    #[serde(rename = "PYTHON_FROM_IMPORT")]
    FromImport,
}

impl TraceKind {
    pub fn as_str(self) -> &'static str {
        match self {
            TraceKind::File => "PYTHON_FILE",
            TraceKind::Expression => "PYTHON_EXPRESSION",
            TraceKind::Assignment => "PYTHON_ASSIGNMENT",
            TraceKind::Return => "PYTHON_RETURN",
            TraceKind::If => "PYTHON_IF_STATEMENT",
            TraceKind::Elif => "PYTHON_ELIF_STATEMENT",
            TraceKind::Else => "PYTHON_ELSE_STATEMENT",
            TraceKind::WhileLoop => "PYTHON_WHILE_LOOP",
            TraceKind::WhileIteration => "PYTHON_WHILE_LOOP_ITERATION",
            TraceKind::ForLoop => "PYTHON_FOR_LOOP",
            TraceKind::ForIteration => "PYTHON_FOR_LOOP_ITERATION",
            TraceKind::FunctionCall => "PYTHON_FUNCTION_CALL",
            TraceKind::Import => "PYTHON_IMPORT",
            TraceKind::FromImport => "PYTHON_FROM_IMPORT",
        }
    }

    /// Loop constructs (not their iterations) are the targets of `break`/`continue`
    pub fn is_loop(self) -> bool {
        matches!(self, TraceKind::WhileLoop | TraceKind::ForLoop)
    }
}

/// Output produced between two logged results
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum SideEffect {
    Stdout { value: String },
}

type FrameId = usize;

#[derive(Debug)]
enum Entry {
    Frame(FrameId),
    Result {
        kind: Option<TraceKind>,
        result: String,
        result_type: &'static str,
        side_effects: Vec<SideEffect>,
    },
    Exception {
        exception_type: &'static str,
        message: String,
    },
}

#[derive(Debug)]
struct Frame {
    kind: TraceKind,
    blocks: IndexMap<&'static str, Vec<Entry>>,
    active: &'static str,
}

impl Frame {
    fn new(kind: TraceKind, child_set: &'static str) -> Self {
        let mut blocks = IndexMap::new();
        blocks.insert(child_set, Vec::new());
        Frame {
            kind,
            blocks,
            active: child_set,
        }
    }

    fn active_entries(&mut self) -> &mut Vec<Entry> {
        self.blocks.entry(self.active).or_default()
    }

    fn active_len(&self) -> usize {
        self.blocks.get(self.active).map_or(0, Vec::len)
    }
}

#[derive(Debug, Default)]
struct DetachedCalls {
    calls: Vec<FrameId>,
    invocations: usize,
}

/// Decision for one invocation of a user function
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CallTicket {
    /// 0-based invocation index for this function
    pub index: usize,
    /// Whether this call runs the traced body under a detached frame
    pub traced: bool,
}

/// Live capture state for one run
#[derive(Debug)]
pub struct Capture {
    frames: Vec<Frame>,
    stack: Vec<FrameId>,
    detached: IndexMap<String, DetachedCalls>,
    side_effects: Vec<SideEffect>,
    last_exception: Option<LastException>,
    iteration_limit: Option<usize>,
    detached_capture_limit: usize,
}

const ROOT: FrameId = 0;

impl Capture {
    pub fn new(limits: &ExecutionLimits) -> Self {
        Capture {
            frames: vec![Frame::new(TraceKind::File, "body")],
            stack: vec![ROOT],
            detached: IndexMap::new(),
            side_effects: Vec::new(),
            last_exception: None,
            iteration_limit: limits.iteration_limit,
            detached_capture_limit: limits.detached_capture_limit,
        }
    }

    fn top(&mut self) -> &mut Frame {
        let id = self.stack.last().copied().unwrap_or(ROOT);
        &mut self.frames[id]
    }

    fn top_kind(&self) -> TraceKind {
        let id = self.stack.last().copied().unwrap_or(ROOT);
        self.frames[id].kind
    }

    fn push_frame(&mut self, kind: TraceKind, child_set: &'static str) -> FrameId {
        let id = self.frames.len();
        self.frames.push(Frame::new(kind, child_set));
        self.stack.push(id);
        id
    }

    /// Number of open frames, root included.
    pub fn depth(&self) -> usize {
        self.stack.len()
    }

    /// Open a frame linked into the current frame's active child set.
    pub fn start_frame(
        &mut self,
        kind: TraceKind,
        child_set: &'static str,
    ) -> Result<(), RuntimeError> {
        if let Some(limit) = self.iteration_limit {
            if self.top().active_len() > limit {
                tracing::debug!(kind = kind.as_str(), limit, "iteration limit reached");
                return Err(RuntimeError::too_many_iterations());
            }
        }
        let id = self.frames.len();
        self.top().active_entries().push(Entry::Frame(id));
        self.push_frame(kind, child_set);
        Ok(())
    }

    /// Count an invocation of function `id` and decide whether it is captured.
    pub fn begin_call(&mut self, id: &str) -> CallTicket {
        let calls = self.detached.entry(id.to_string()).or_default();
        let index = calls.invocations;
        calls.invocations += 1;
        let traced = index < self.detached_capture_limit;
        if index == self.detached_capture_limit {
            tracing::debug!(function = id, limit = self.detached_capture_limit, "detached capture cap reached");
        }
        CallTicket { index, traced }
    }

    /// Open a frame filed under function `id` rather than the current frame.
    pub fn start_detached_frame(&mut self, kind: TraceKind, child_set: &'static str, id: &str) {
        let frame = self.push_frame(kind, child_set);
        self.detached
            .entry(id.to_string())
            .or_default()
            .calls
            .push(frame);
    }

    pub fn start_child_set(&mut self, child_set: &'static str) {
        let frame = self.top();
        frame.active = child_set;
        frame.blocks.entry(child_set).or_default();
    }

    /// Close the innermost frame. The root never closes.
    pub fn end_frame(&mut self) {
        if self.stack.len() > 1 {
            self.stack.pop();
        }
    }

    /// Close frames until the innermost open frame is a loop.
    ///
    /// Stops at a function-call frame or the root, so a stray call can never
    /// unwind the caller's frames.
    pub fn end_loop(&mut self) {
        while self.stack.len() > 1 {
            let kind = self.top_kind();
            if kind.is_loop() || kind == TraceKind::FunctionCall {
                break;
            }
            self.stack.pop();
        }
    }

    /// Close frames back down to `depth` open frames.
    pub fn unwind_to(&mut self, depth: usize) {
        self.stack.truncate(depth.max(1));
    }

    /// Record a value with any pending side effects.
    pub fn log_expression_result(&mut self, kind: Option<TraceKind>, value: &Value) {
        let side_effects = std::mem::take(&mut self.side_effects);
        let entry = Entry::Result {
            kind,
            result: value.py_str(),
            result_type: value.type_name(),
            side_effects,
        };
        self.top().active_entries().push(entry);
    }

    /// Open a frame and record `value` as its first entry.
    pub fn log_expression_result_and_start_frame(
        &mut self,
        kind: TraceKind,
        child_set: &'static str,
        value: &Value,
    ) -> Result<(), RuntimeError> {
        self.start_frame(kind, child_set)?;
        self.log_expression_result(None, value);
        Ok(())
    }

    /// Record `value`, then close frames through the first one of kind `until`.
    pub fn log_expression_result_and_end_frames(
        &mut self,
        kind: TraceKind,
        until: TraceKind,
        value: &Value,
    ) {
        self.log_expression_result(Some(kind), value);
        while self.stack.len() > 1 {
            let closed = self.top_kind();
            self.stack.pop();
            if closed == until {
                break;
            }
        }
    }

    /// Buffer output until the next logged result. Empty writes are dropped.
    pub fn log_side_effect(&mut self, text: &str) {
        if !text.is_empty() {
            self.side_effects.push(SideEffect::Stdout {
                value: text.to_string(),
            });
        }
    }

    /// Record an exception entry in the innermost open frame.
    pub fn log_exception(&mut self, err: &RuntimeError) {
        let entry = Entry::Exception {
            exception_type: err.type_name(),
            message: err.message.clone(),
        };
        self.top().active_entries().push(entry);
    }

    /// Record an exception escaping a captured call, then close the call.
    ///
    /// Only the first exception of a run is kept as the last exception, so the
    /// innermost call (where it was raised) provides `frameno` and `lineno`.
    pub fn log_call_exception(
        &mut self,
        err: &RuntimeError,
        ticket: CallTicket,
        line: u32,
        depth: usize,
    ) {
        self.log_exception(err);
        if self.last_exception.is_none() {
            self.last_exception = Some(LastException {
                exception_type: err.type_name().to_string(),
                message: err.message.clone(),
                frameno: Some(ticket.index),
                lineno: Some(line),
            });
        }
        self.unwind_to(depth);
    }

    /// Record an exception that reached the top level.
    pub fn log_uncaught_exception(&mut self, err: &RuntimeError) {
        self.log_exception(err);
        if self.last_exception.is_none() {
            self.last_exception = Some(LastException {
                exception_type: err.type_name().to_string(),
                message: err.message.clone(),
                frameno: None,
                lineno: None,
            });
        }
    }

    pub fn last_exception(&self) -> Option<&LastException> {
        self.last_exception.as_ref()
    }

    /// Serialize everything recorded so far.
    pub fn to_dict(&self) -> CaptureResult {
        let detached = self
            .detached
            .iter()
            .map(|(id, calls)| {
                let record = DetachedRecord {
                    calls: calls.calls.iter().map(|&f| self.frame_record(f)).collect(),
                    invocations: calls.invocations,
                };
                (id.clone(), record)
            })
            .collect();
        CaptureResult {
            root: self.frame_record(ROOT),
            detached,
            last_exception: self.last_exception.clone(),
        }
    }

    fn frame_record(&self, id: FrameId) -> FrameRecord {
        let frame = &self.frames[id];
        let data = frame
            .blocks
            .iter()
            .map(|(name, entries)| {
                let records = entries.iter().map(|e| self.entry_record(e)).collect();
                (*name, records)
            })
            .collect();
        FrameRecord {
            kind: frame.kind,
            data,
        }
    }

    fn entry_record(&self, entry: &Entry) -> EntryRecord {
        match entry {
            Entry::Frame(id) => EntryRecord::Frame(self.frame_record(*id)),
            Entry::Result {
                kind,
                result,
                result_type,
                side_effects,
            } => EntryRecord::Result(ResultRecord {
                kind: *kind,
                data: ResultData {
                    result: result.clone(),
                    result_type,
                },
                side_effects: side_effects.clone(),
            }),
            Entry::Exception {
                exception_type,
                message,
            } => EntryRecord::Exception(ExceptionRecord {
                kind: "EXCEPTION",
                exception_type,
                exception_message: message.clone(),
            }),
        }
    }
}

/// Finished capture of one run
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CaptureResult {
    pub root: FrameRecord,
    pub detached: IndexMap<String, DetachedRecord>,
    #[serde(rename = "lastException", skip_serializing_if = "Option::is_none")]
    pub last_exception: Option<LastException>,
}

impl CaptureResult {
    pub fn to_json(&self) -> serde_json::Value {
        serde_json::to_value(self).unwrap_or_default()
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FrameRecord {
    #[serde(rename = "type")]
    pub kind: TraceKind,
    pub data: IndexMap<&'static str, Vec<EntryRecord>>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum EntryRecord {
    Frame(FrameRecord),
    Result(ResultRecord),
    Exception(ExceptionRecord),
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ResultRecord {
    #[serde(rename = "type", skip_serializing_if = "Option::is_none")]
    pub kind: Option<TraceKind>,
    pub data: ResultData,
    #[serde(rename = "sideEffects", skip_serializing_if = "Vec::is_empty")]
    pub side_effects: Vec<SideEffect>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ResultData {
    pub result: String,
    #[serde(rename = "resultType")]
    pub result_type: &'static str,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ExceptionRecord {
    #[serde(rename = "type")]
    pub kind: &'static str,
    #[serde(rename = "exceptionType")]
    pub exception_type: &'static str,
    #[serde(rename = "exceptionMessage")]
    pub exception_message: String,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DetachedRecord {
    pub calls: Vec<FrameRecord>,
    pub invocations: usize,
}

/// Summary of the first exception that escaped a call or the program
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct LastException {
    #[serde(rename = "type")]
    pub exception_type: String,
    pub message: String,
    /// Invocation index of the captured call the exception was raised in
    #[serde(skip_serializing_if = "Option::is_none")]
    pub frameno: Option<usize>,
    /// Line within that function
    #[serde(skip_serializing_if = "Option::is_none")]
    pub lineno: Option<u32>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn capture() -> Capture {
        Capture::new(&ExecutionLimits::default())
    }

    #[test]
    fn test_empty_capture() {
        let result = capture().to_dict().to_json();
        assert_eq!(
            result,
            json!({"root": {"type": "PYTHON_FILE", "data": {"body": []}}, "detached": {}})
        );
    }

    #[test]
    fn test_side_effects_attach_to_next_result() {
        let mut cap = capture();
        cap.log_side_effect("hi");
        cap.log_side_effect("");
        cap.log_side_effect("\n");
        cap.log_expression_result(Some(TraceKind::Expression), &Value::None);
        cap.log_expression_result(Some(TraceKind::Expression), &Value::Int(3));
        let result = cap.to_dict().to_json();
        assert_eq!(
            result["root"]["data"]["body"],
            json!([
                {
                    "type": "PYTHON_EXPRESSION",
                    "data": {"result": "None", "resultType": "NoneType"},
                    "sideEffects": [
                        {"type": "stdout", "value": "hi"},
                        {"type": "stdout", "value": "\n"}
                    ]
                },
                {"type": "PYTHON_EXPRESSION", "data": {"result": "3", "resultType": "int"}}
            ])
        );
    }

    #[test]
    fn test_frames_link_into_parent_on_start() {
        let mut cap = capture();
        cap.log_expression_result_and_start_frame(TraceKind::If, "condition", &Value::Bool(true))
            .unwrap();
        cap.start_child_set("trueblock");
        cap.log_expression_result(Some(TraceKind::Expression), &Value::Int(1));
        // still open, but already visible
        let result = cap.to_dict().to_json();
        assert_eq!(
            result["root"]["data"]["body"][0],
            json!({
                "type": "PYTHON_IF_STATEMENT",
                "data": {
                    "condition": [{"data": {"result": "True", "resultType": "bool"}}],
                    "trueblock": [{"type": "PYTHON_EXPRESSION", "data": {"result": "1", "resultType": "int"}}]
                }
            })
        );
        cap.end_frame();
        assert_eq!(cap.depth(), 1);
    }

    #[test]
    fn test_root_never_closes() {
        let mut cap = capture();
        cap.end_frame();
        cap.end_loop();
        cap.log_expression_result_and_end_frames(TraceKind::Return, TraceKind::FunctionCall, &Value::None);
        assert_eq!(cap.depth(), 1);
    }

    #[test]
    fn test_end_loop_discards_nested_frames() {
        let mut cap = capture();
        cap.start_frame(TraceKind::WhileLoop, "frames").unwrap();
        cap.log_expression_result_and_start_frame(TraceKind::WhileIteration, "condition", &Value::Bool(true))
            .unwrap();
        cap.start_child_set("block");
        cap.log_expression_result_and_start_frame(TraceKind::If, "condition", &Value::Bool(true))
            .unwrap();
        assert_eq!(cap.depth(), 4);
        cap.end_loop();
        assert_eq!(cap.depth(), 2);
        assert_eq!(cap.top_kind(), TraceKind::WhileLoop);
    }

    #[test]
    fn test_end_loop_stops_at_function_call() {
        let mut cap = capture();
        cap.start_frame(TraceKind::ForLoop, "frames").unwrap();
        cap.start_detached_frame(TraceKind::FunctionCall, "body", "f");
        cap.start_frame(TraceKind::If, "condition").unwrap();
        cap.end_loop();
        assert_eq!(cap.top_kind(), TraceKind::FunctionCall);
    }

    #[test]
    fn test_return_closes_through_function_call() {
        let mut cap = capture();
        let ticket = cap.begin_call("f");
        assert!(ticket.traced);
        cap.start_detached_frame(TraceKind::FunctionCall, "body", "f");
        cap.start_frame(TraceKind::If, "condition").unwrap();
        cap.log_expression_result_and_end_frames(TraceKind::Return, TraceKind::FunctionCall, &Value::Int(1));
        assert_eq!(cap.depth(), 1);

        let result = cap.to_dict().to_json();
        assert_eq!(result["root"]["data"]["body"], json!([]));
        assert_eq!(result["detached"]["f"]["invocations"], json!(1));
        assert_eq!(
            result["detached"]["f"]["calls"][0]["data"]["body"][0]["data"]["trueblock"],
            serde_json::Value::Null
        );
    }

    #[test]
    fn test_detached_capture_cap() {
        let limits = ExecutionLimits::new().detached_capture_limit(2);
        let mut cap = Capture::new(&limits);
        let tickets: Vec<_> = (0..4).map(|_| cap.begin_call("g")).collect();
        assert_eq!(
            tickets.iter().map(|t| t.traced).collect::<Vec<_>>(),
            vec![true, true, false, false]
        );
        assert_eq!(tickets[3].index, 3);
        assert_eq!(cap.to_dict().detached["g"].invocations, 4);
    }

    #[test]
    fn test_iteration_limit() {
        let limits = ExecutionLimits::new().iteration_limit(2);
        let mut cap = Capture::new(&limits);
        cap.start_frame(TraceKind::WhileLoop, "frames").unwrap();
        for _ in 0..3 {
            cap.start_frame(TraceKind::WhileIteration, "condition").unwrap();
            cap.end_frame();
        }
        let err = cap.start_frame(TraceKind::WhileIteration, "condition").unwrap_err();
        assert_eq!(err, RuntimeError::too_many_iterations());
    }

    #[test]
    fn test_call_exception_sets_last_exception_once() {
        let mut cap = capture();
        let outer = cap.begin_call("f");
        let outer_depth = cap.depth();
        cap.start_detached_frame(TraceKind::FunctionCall, "body", "f");
        let inner = cap.begin_call("f");
        let inner_depth = cap.depth();
        cap.start_detached_frame(TraceKind::FunctionCall, "body", "f");

        let err = RuntimeError::zero_division("division by zero");
        cap.log_call_exception(&err, inner, 3, inner_depth);
        cap.log_call_exception(&err, outer, 5, outer_depth);
        assert_eq!(cap.depth(), 1);

        let last = cap.last_exception().unwrap();
        assert_eq!(last.frameno, Some(1));
        assert_eq!(last.lineno, Some(3));

        let result = cap.to_dict().to_json();
        assert_eq!(
            result["detached"]["f"]["calls"][1]["data"]["body"][0],
            json!({
                "type": "EXCEPTION",
                "exceptionType": "ZeroDivisionError",
                "exceptionMessage": "division by zero"
            })
        );
        assert_eq!(
            result["lastException"],
            json!({"type": "ZeroDivisionError", "message": "division by zero", "frameno": 1, "lineno": 3})
        );
    }

    #[test]
    fn test_uncaught_exception_without_call_position() {
        let mut cap = capture();
        cap.log_uncaught_exception(&RuntimeError::eof());
        let result = cap.to_dict().to_json();
        assert_eq!(
            result["lastException"],
            json!({"type": "EOFError", "message": "EOF when reading a line"})
        );
        assert_eq!(result["root"]["data"]["body"][0]["exceptionType"], json!("EOFError"));
    }
}
