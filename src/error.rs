//! Error types for compilation and evaluation.

use std::fmt;

use serde::Serialize;

use crate::source::CodeRef;

/// A compilation error with source location.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CompileError {
    pub message: String,
    pub reference: CodeRef,
    pub kind: ErrorKind,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum ErrorKind {
    Lexer,
    Parser,
    Semantic,
}

impl ErrorKind {
    fn label(self) -> &'static str {
        match self {
            ErrorKind::Lexer => "lexer",
            ErrorKind::Parser => "parser",
            ErrorKind::Semantic => "semantic",
        }
    }
}

impl CompileError {
    pub fn lexer(message: impl Into<String>, reference: CodeRef) -> Self {
        Self {
            message: message.into(),
            reference,
            kind: ErrorKind::Lexer,
        }
    }

    pub fn parser(message: impl Into<String>, reference: CodeRef) -> Self {
        Self {
            message: message.into(),
            reference,
            kind: ErrorKind::Parser,
        }
    }

    pub fn semantic(message: impl Into<String>, reference: CodeRef) -> Self {
        Self {
            message: message.into(),
            reference,
            kind: ErrorKind::Semantic,
        }
    }
}

impl fmt::Display for CompileError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "[{}] {}: {}",
            self.kind.label(),
            self.reference,
            self.message
        )
    }
}

impl std::error::Error for CompileError {}

/// A failure during evaluation of a compiled function. Aborts only the
/// current call; the function stays callable.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RuntimeError {
    /// Division whose right operand evaluated to zero, positioned at the
    /// `/` operator.
    DivideByZero(CodeRef),
    /// An identifier with no bound value. Cannot occur for analyzer-produced
    /// trees called with the declared number of arguments.
    UnboundIdentifier(String),
    /// The statement list ran out without reaching a RETURN. Cannot occur
    /// for analyzer-produced trees.
    MissingReturn,
}

impl fmt::Display for RuntimeError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RuntimeError::DivideByZero(reference) => {
                write!(f, "division by zero at {reference}")
            }
            RuntimeError::UnboundIdentifier(name) => {
                write!(f, "identifier '{name}' has no value")
            }
            RuntimeError::MissingReturn => {
                write!(f, "evaluation ended without a return")
            }
        }
    }
}

impl std::error::Error for RuntimeError {}

/// Error returned from [`crate::jit::Jit::call`]. Compile failures are
/// memoized and repeat verbatim on every call; runtime failures are fresh
/// per call.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CallError {
    Compile(CompileError),
    Runtime(RuntimeError),
    Arity { expected: usize, got: usize },
    UnknownHandle,
}

impl fmt::Display for CallError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CallError::Compile(e) => write!(f, "{e}"),
            CallError::Runtime(e) => write!(f, "{e}"),
            CallError::Arity { expected, got } => {
                write!(f, "expected {expected} argument(s), got {got}")
            }
            CallError::UnknownHandle => write!(f, "unknown function handle"),
        }
    }
}

impl std::error::Error for CallError {}

impl From<CompileError> for CallError {
    fn from(e: CompileError) -> Self {
        CallError::Compile(e)
    }
}

impl From<RuntimeError> for CallError {
    fn from(e: RuntimeError) -> Self {
        CallError::Runtime(e)
    }
}
