//! Error handling and diagnostics for the Zen language
//!
//! Lexing and parsing report `SyntaxError`s, evaluation reports a
//! `RuntimeError`. `ZenError` is what the pipeline as a whole returns.

use thiserror::Error;

pub mod diagnostic;

pub use crate::source::SourceLocation;
pub use diagnostic::Diagnostic;

use crate::runtime::environment::ScopeError;
use crate::types::{Type, TypeError};

/// Result type alias for Zen operations
pub type ZenResult<T> = Result<T, ZenError>;

fn describe_location(location: &Option<SourceLocation>) -> String {
    match location {
        Some(location) => format!(" at {}\n{}", location, location.line_with_marker()),
        None => String::new(),
    }
}

/// A lexical or grammatical error
#[derive(Debug, Clone, PartialEq, Error)]
#[error("{message}{}", describe_location(.location))]
pub struct SyntaxError {
    pub message: String,
    pub location: Option<SourceLocation>,
}

impl SyntaxError {
    pub fn new(message: impl Into<String>, location: SourceLocation) -> Self {
        Self {
            message: message.into(),
            location: Some(location),
        }
    }
}

/// Everything that can go wrong while evaluating a program
#[derive(Debug, Clone, PartialEq, Error)]
pub enum RuntimeErrorKind {
    #[error(transparent)]
    Type(#[from] TypeError),

    #[error(transparent)]
    Scope(#[from] ScopeError),

    #[error("{construct} condition must be a boolean, got {found}")]
    NonBooleanCondition { construct: &'static str, found: Type },

    #[error("{side} operand of {operator} must be boolean, got {found}")]
    NonBooleanOperand {
        side: &'static str,
        operator: &'static str,
        found: Type,
    },

    #[error("Variable '{0}' must either be initialized or declared as nullable.")]
    UninitializedVariable(String),

    #[error("Constant '{0}' must be initialized")]
    UninitializedConstant(String),

    #[error("Cannot call value of type {0}")]
    NotCallable(Type),

    #[error("{name} expects {expected} argument(s), got {found}")]
    Arity {
        name: String,
        expected: String,
        found: usize,
    },

    #[error("Invalid assignment target")]
    InvalidAssignmentTarget,

    #[error("Cannot iterate over value of type {0}")]
    NotIterable(Type),

    #[error("Cannot index value of type {0}")]
    NotIndexable(Type),

    #[error("Array index must be an integer, got {0}")]
    InvalidIndex(Type),

    #[error("Index {index} out of range for array of length {len}")]
    IndexOutOfRange { index: i64, len: usize },

    #[error("Key {0} not found in map")]
    MissingKey(String),

    #[error("Unknown member '{member}' on value of type {ty}")]
    UnknownMember { member: String, ty: Type },

    #[error("{name}: {message}")]
    Builtin { name: String, message: String },

    #[error("'{0}' used outside of a loop")]
    OutsideLoop(&'static str),

    #[error("Maximum call depth of {0} exceeded")]
    CallDepthExceeded(usize),
}

impl RuntimeErrorKind {
    /// Attach a location
    pub fn at(self, location: &SourceLocation) -> RuntimeError {
        RuntimeError {
            kind: self,
            location: Some(location.clone()),
        }
    }
}

/// An error raised while evaluating a program
#[derive(Debug, Clone, PartialEq, Error)]
#[error("{kind}{}", describe_location(.location))]
pub struct RuntimeError {
    pub kind: RuntimeErrorKind,
    pub location: Option<SourceLocation>,
}

impl From<RuntimeErrorKind> for RuntimeError {
    fn from(kind: RuntimeErrorKind) -> Self {
        Self {
            kind,
            location: None,
        }
    }
}

impl From<TypeError> for RuntimeError {
    fn from(error: TypeError) -> Self {
        RuntimeErrorKind::from(error).into()
    }
}

impl From<ScopeError> for RuntimeError {
    fn from(error: ScopeError) -> Self {
        RuntimeErrorKind::from(error).into()
    }
}

/// Main error type for the Zen language
#[derive(Debug, Clone, PartialEq, Error)]
pub enum ZenError {
    /// Every lexical or parse error found in one pass
    #[error("{}", join_errors(.0))]
    Syntax(Vec<SyntaxError>),

    #[error(transparent)]
    Runtime(#[from] RuntimeError),
}

fn join_errors(errors: &[SyntaxError]) -> String {
    errors
        .iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join("\n")
}

impl ZenError {
    /// Get the error kind as a string
    pub fn kind(&self) -> &'static str {
        match self {
            Self::Syntax(_) => "Syntax Error(s)",
            Self::Runtime(_) => "Runtime Error",
        }
    }

    /// Syntax errors carried by this error, empty for runtime errors
    pub fn syntax_errors(&self) -> &[SyntaxError] {
        match self {
            Self::Syntax(errors) => errors,
            Self::Runtime(_) => &[],
        }
    }
}

impl From<SyntaxError> for ZenError {
    fn from(error: SyntaxError) -> Self {
        Self::Syntax(vec![error])
    }
}
