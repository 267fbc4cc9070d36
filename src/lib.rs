//! Compile-once, call-many execution of single functions written in a small
//! imperative expression language: optional PARAM/VAR/CONST declaration
//! sections, assignment and RETURN statements, signed 64-bit arithmetic.
//!
//! The pipeline is source → tokens → parse tree → AST + symbol table →
//! constant folding → tree-walking evaluation. [`Jit`] runs it at most once
//! per registered source and evaluates the resulting AST on every call.

#[allow(clippy::indexing_slicing)]
pub mod analyzer;
pub mod ast;
pub mod context;
#[allow(clippy::indexing_slicing)]
pub mod cst;
pub mod error;
#[allow(clippy::indexing_slicing)]
pub mod eval;
pub mod jit;
#[allow(clippy::indexing_slicing)]
pub mod lexer;
#[allow(clippy::indexing_slicing)]
pub mod optimize;
#[allow(clippy::indexing_slicing)]
pub mod parser;
pub mod source;
pub mod symbols;

pub use ast::Function;
pub use error::{CallError, CompileError, RuntimeError};
pub use jit::{Handle, Jit};
pub use source::{CodeRef, SourceMap};

/// Compile a source string into an unoptimized [`Function`].
///
/// This is the bare pipeline: tokenize → parse → analyze. [`Jit::register`]
/// plus [`Jit::call`] is the managed path, which also runs the optimizer
/// and memoizes the outcome.
pub fn compile_source(source: &str) -> Result<Function, CompileError> {
    let source = SourceMap::new(source);
    compile(&source)
}

pub(crate) fn compile(source: &SourceMap) -> Result<Function, CompileError> {
    let tokens = lexer::tokenize(source)?;
    let tree = parser::parse(&tokens, source)?;
    analyzer::analyze(&tree, source)
}
