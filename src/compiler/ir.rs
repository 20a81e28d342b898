//! Lowered program representation
//!
//! The lowering pass turns the typed tree into this statement/expression IR.
//! Besides ordinary statements it carries explicit trace instructions
//! ([`StmtKind::StartFrame`], [`Expr::Log`], ...) that the interpreter forwards
//! to the capture engine. Untraced code is the same IR without them.
//!
//! The IR is immutable once built and shared between threads by reference, so
//! function bodies are behind [`Arc`].

use crate::capture::TraceKind;
use crate::compiler::operators::{BinOp, BoolOp, CmpOp, UnaryOp};
use rustc_hash::FxHashSet;
use std::sync::Arc;

/// A compiled program: the traced module body.
#[derive(Debug, Clone)]
pub struct Program {
    pub body: Vec<Stmt>,
}

/// A statement with the line it occupies in the generated text layout.
#[derive(Debug, Clone)]
pub struct Stmt {
    pub line: u32,
    pub kind: StmtKind,
}

impl Stmt {
    pub fn new(line: u32, kind: StmtKind) -> Self {
        Stmt { line, kind }
    }
}

#[derive(Debug, Clone)]
pub enum StmtKind {
    Expr(Expr),
    Assign {
        target: Target,
        value: Expr,
    },
    If {
        condition: Expr,
        body: Vec<Stmt>,
        orelse: Vec<Stmt>,
    },
    While {
        condition: Expr,
        body: Vec<Stmt>,
    },
    For {
        target: Target,
        iterable: Expr,
        body: Vec<Stmt>,
    },
    FunctionDef(Arc<FunctionCode>),
    Return(Expr),
    Break,
    Continue,
    Import(Vec<String>),
    FromImport {
        module: String,
        names: Vec<String>,
    },

    // Trace instructions
    StartFrame {
        kind: TraceKind,
        child_set: &'static str,
    },
    StartChildSet(&'static str),
    EndFrame,
    EndLoop,
}

/// Assignment target.
#[derive(Debug, Clone)]
pub enum Target {
    Name(String),
    Subscript { value: Expr, index: Expr },
    Tuple(Vec<Target>),
}

#[derive(Debug, Clone, PartialEq)]
pub enum Constant {
    None,
    Bool(bool),
    Int(i64),
    Float(f64),
    Str(Arc<str>),
}

#[derive(Debug, Clone)]
pub enum Expr {
    Const(Constant),
    Name(String),
    Unary {
        op: UnaryOp,
        operand: Box<Expr>,
    },
    Binary {
        op: BinOp,
        left: Box<Expr>,
        right: Box<Expr>,
    },
    Bool {
        op: BoolOp,
        left: Box<Expr>,
        right: Box<Expr>,
    },
    /// `left op0 c0 op1 c1 ...`, evaluated pairwise with short-circuit
    Compare {
        left: Box<Expr>,
        ops: Vec<CmpOp>,
        comparators: Vec<Expr>,
    },
    Call {
        func: Box<Expr>,
        args: Vec<Expr>,
        keywords: Vec<(String, Expr)>,
    },
    Attribute {
        value: Box<Expr>,
        attr: String,
    },
    Subscript {
        value: Box<Expr>,
        index: Box<Expr>,
    },
    Slice {
        value: Box<Expr>,
        lower: Option<Box<Expr>>,
        upper: Option<Box<Expr>>,
    },
    List(Vec<Expr>),
    Tuple(Vec<Expr>),
    Set(Vec<Expr>),
    Dict(Vec<(Expr, Expr)>),

    // Trace wrappers; each evaluates to its inner value
    Log {
        kind: Option<TraceKind>,
        value: Box<Expr>,
    },
    LogAndStartFrame {
        kind: TraceKind,
        child_set: &'static str,
        value: Box<Expr>,
    },
    LogAndEndFrames {
        kind: TraceKind,
        until: TraceKind,
        value: Box<Expr>,
    },
    /// Iterable whose elements each open an iteration frame before use
    TraceEach {
        kind: TraceKind,
        child_set: &'static str,
        iterable: Box<Expr>,
    },
}

/// A function declaration compiled twice: with and without trace instructions.
#[derive(Debug)]
pub struct FunctionCode {
    pub name: String,
    /// Key of the detached call list in the capture
    pub id: String,
    pub params: Vec<String>,
    /// Parameters plus every name the body binds
    pub locals: FxHashSet<String>,
    pub traced: Vec<Stmt>,
    pub plain: Vec<Stmt>,
}
