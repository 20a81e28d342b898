// Typed program model shared by the node-tree decoder, the source reader and
// the text generator

use super::tags;
use std::fmt;

/// Source location information for error reporting
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SourceLocation {
    pub line: usize,
    pub column: usize,
}

impl SourceLocation {
    pub fn new(line: usize, column: usize) -> Self {
        Self { line, column }
    }
}

impl fmt::Display for SourceLocation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "line {}, column {}", self.line, self.column)
    }
}

/// A statement inside a block.
#[derive(Debug, Clone, PartialEq)]
pub enum Statement {
    /// Empty `PYTHON_STATEMENT` placeholder (a blank line in text form)
    Blank,
    Comment(String),
    Expression(Expression),
    Assignment {
        targets: Vec<Token>,
        value: Expression,
    },
    If {
        condition: Expression,
        body: Vec<Statement>,
        else_blocks: Vec<ElseBlock>,
    },
    While {
        condition: Expression,
        body: Vec<Statement>,
    },
    For {
        targets: Vec<Token>,
        iterable: Expression,
        body: Vec<Statement>,
    },
    FunctionDeclaration(FunctionDeclaration),
    /// `return` with an optional value (empty token list = bare return)
    Return(Expression),
    Break,
    Continue,
    Import(Vec<String>),
    FromImport {
        module: String,
        names: Vec<String>,
    },
}

/// One link of an if-chain after the true block.
#[derive(Debug, Clone, PartialEq)]
pub enum ElseBlock {
    Elif {
        condition: Expression,
        body: Vec<Statement>,
    },
    Else {
        body: Vec<Statement>,
    },
}

#[derive(Debug, Clone, PartialEq)]
pub struct FunctionDeclaration {
    pub name: String,
    /// Stable id linking captured calls back to the declaring node
    pub id: Option<String>,
    pub params: Vec<String>,
    pub body: Vec<Statement>,
}

impl FunctionDeclaration {
    /// Capture key for this function: its id, or its name when no id was assigned.
    pub fn capture_id(&self) -> &str {
        self.id.as_deref().unwrap_or(&self.name)
    }
}

/// A flat token sequence, not yet resolved into a tree.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Expression {
    pub tokens: Vec<Token>,
}

impl Expression {
    pub fn new(tokens: Vec<Token>) -> Self {
        Expression { tokens }
    }

    pub fn is_empty(&self) -> bool {
        self.tokens.is_empty()
    }
}

/// Literal value of a `NUMERIC_LITERAL` token.
#[derive(Debug, Clone, PartialEq)]
pub enum Number {
    Int(i64),
    Float(f64),
    /// Numeric text as typed in the editor, resolved at compile time
    Text(String),
}

/// Operand and operator tokens of an expression.
#[derive(Debug, Clone, PartialEq)]
pub enum Token {
    /// Binary or unary operator marker
    Operator(String),
    Number(Number),
    Str(String),
    Bool(bool),
    None,
    Identifier(String),
    CallVariable {
        name: String,
        args: Vec<Argument>,
    },
    CallMember {
        object: Box<Token>,
        member: String,
        args: Vec<Argument>,
    },
    Member {
        object: Box<Token>,
        member: String,
    },
    List(Vec<Expression>),
    Tuple(Vec<Expression>),
    Set(Vec<Expression>),
    Dict(Vec<(Expression, Expression)>),
    Subscript {
        target: Box<Token>,
        key: Expression,
    },
    Slice {
        target: Box<Token>,
        start: Expression,
        end: Expression,
    },
    Bracket(Expression),
}

impl Token {
    /// Node tag this token is stored under.
    pub fn tag(&self) -> &'static str {
        match self {
            Token::Operator(_) => tags::PYTHON_BINARY_OPERATOR,
            Token::Number(_) => tags::NUMERIC_LITERAL,
            Token::Str(_) => tags::STRING_LITERAL,
            Token::Bool(_) => tags::PYTHON_BOOL,
            Token::None => tags::PYTHON_NONE,
            Token::Identifier(_) => tags::PY_IDENTIFIER,
            Token::CallVariable { .. } => tags::PYTHON_CALL_VARIABLE,
            Token::CallMember { .. } => tags::PYTHON_CALL_MEMBER,
            Token::Member { .. } => tags::PYTHON_MEMBER,
            Token::List(_) => tags::PYTHON_LIST,
            Token::Tuple(_) => tags::PY_TUPLE,
            Token::Set(_) => tags::PY_SET,
            Token::Dict(_) => tags::PY_DICT,
            Token::Subscript { .. } => tags::PYTHON_SUBSCRIPT,
            Token::Slice { .. } => tags::PY_SLICE,
            Token::Bracket(_) => tags::PY_BRACKET,
        }
    }
}

/// Call argument.
#[derive(Debug, Clone, PartialEq)]
pub enum Argument {
    Positional(Expression),
    Keyword { name: String, value: Expression },
}
