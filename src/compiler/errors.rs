//! Compile-time error types
//!
//! Every failure while decoding or lowering a node tree is fatal to the whole
//! compile step. Runtime failures of the compiled program are a separate
//! channel: see [`crate::interpreter::errors::RuntimeError`].

/// Errors raised while turning a node tree into an executable program.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum CompileError {
    /// A node carries a type tag with no rule in this position
    #[error("Unrecognised {context} type: {tag}")]
    UnrecognizedNode { tag: String, context: &'static str },

    /// A construct outside the supported language subset
    #[error("Unsupported: {feature}")]
    Unsupported { feature: String },

    #[error("{tag} node is missing child set '{child_set}'")]
    MissingChildSet {
        tag: String,
        child_set: &'static str,
    },

    #[error("{tag} node is missing property '{property}'")]
    MissingProperty {
        tag: String,
        property: &'static str,
    },

    #[error("{tag} node has an invalid '{property}' property: {value}")]
    InvalidProperty {
        tag: String,
        property: &'static str,
        value: String,
    },

    /// A slot that must hold a value holds an empty expression
    #[error("{tag} node requires a non-empty '{child_set}' expression")]
    MissingExpression {
        tag: String,
        child_set: &'static str,
    },

    #[error("Unknown operator '{symbol}'")]
    UnknownOperator { symbol: String },

    /// Operator and operand tokens do not alternate
    #[error("Malformed expression: {message}")]
    MalformedExpression { message: String },

    /// Statement placed where it cannot run (`break` outside a loop, ...)
    #[error("{message}")]
    InvalidStructure { message: String },

    /// Nesting beyond what the compiler walks recursively
    #[error("{what} nested deeper than {limit} levels")]
    TooDeep { what: &'static str, limit: usize },

    #[error("Expected a PYTHON_FILE root node, found {tag}")]
    NotAFile { tag: String },
}

impl CompileError {
    pub fn unsupported(feature: impl Into<String>) -> Self {
        CompileError::Unsupported {
            feature: feature.into(),
        }
    }

    pub fn malformed(message: impl Into<String>) -> Self {
        CompileError::MalformedExpression {
            message: message.into(),
        }
    }
}
