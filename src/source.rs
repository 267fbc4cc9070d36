//! Line-indexed source storage and the position model.

use std::fmt;

use serde::Serialize;

/// A 0-based (line, column) position in the source text.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize)]
pub struct Pos {
    pub line: usize,
    pub col: usize,
}

impl Pos {
    pub fn new(line: usize, col: usize) -> Self {
        Self { line, col }
    }
}

/// Inclusive source span: `start` and `end` both point at real characters,
/// except for the end-of-input sentinel where both point one column past the
/// last character. Positions are 0-based internally; conversion to the
/// 1-based form humans read happens only in `Display`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct CodeRef {
    pub start: Pos,
    pub end: Pos,
}

impl CodeRef {
    pub fn new(start: Pos, end: Pos) -> Self {
        Self { start, end }
    }

    /// Span covering a single character.
    pub fn at(pos: Pos) -> Self {
        Self { start: pos, end: pos }
    }

    /// Span covering `[start_col, end_col]` on one line.
    pub fn on_line(line: usize, start_col: usize, end_col: usize) -> Self {
        Self {
            start: Pos::new(line, start_col),
            end: Pos::new(line, end_col),
        }
    }

    pub fn merge(self, other: CodeRef) -> CodeRef {
        CodeRef {
            start: self.start.min(other.start),
            end: self.end.max(other.end),
        }
    }
}

impl fmt::Display for CodeRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "line {}:{}", self.start.line + 1, self.start.col + 1)
    }
}

/// The original source text, split into lines once at construction.
///
/// Lines keep their text verbatim (a trailing `\r` stays put and is treated
/// as whitespace by the tokenizer), so every stored column is a direct index
/// into the line it came from.
#[derive(Debug, Clone)]
pub struct SourceMap {
    lines: Vec<String>,
}

impl SourceMap {
    pub fn new(source: &str) -> Self {
        Self {
            lines: source.split('\n').map(String::from).collect(),
        }
    }

    pub fn line(&self, index: usize) -> Option<&str> {
        self.lines.get(index).map(String::as_str)
    }

    pub fn line_count(&self) -> usize {
        self.lines.len()
    }

    /// Recover the text a single-line span points at. Returns `""` for spans
    /// that do not resolve (multi-line, or out of range) — spans produced by
    /// the tokenizer always resolve.
    pub fn snippet(&self, reference: CodeRef) -> &str {
        if reference.start.line != reference.end.line {
            return "";
        }
        self.lines
            .get(reference.start.line)
            .and_then(|line| line.get(reference.start.col..=reference.end.col))
            .unwrap_or("")
    }

    /// Sentinel position one column past the last character of the last line,
    /// used for errors reported at end of input.
    pub fn end_of_input(&self) -> Pos {
        match self.lines.last() {
            Some(line) => Pos::new(self.lines.len() - 1, line.len()),
            None => Pos::new(0, 0),
        }
    }
}
