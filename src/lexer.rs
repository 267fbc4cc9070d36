use serde::Serialize;

use crate::error::CompileError;
use crate::source::{CodeRef, SourceMap};

/// Reserved words of the language. Matching is case-sensitive: `param` is an
/// ordinary identifier.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum Keyword {
    Param,
    Var,
    Const,
    Begin,
    End,
    Return,
}

impl Keyword {
    fn from_word(word: &str) -> Option<Keyword> {
        match word {
            "PARAM" => Some(Keyword::Param),
            "VAR" => Some(Keyword::Var),
            "CONST" => Some(Keyword::Const),
            "BEGIN" => Some(Keyword::Begin),
            "END" => Some(Keyword::End),
            "RETURN" => Some(Keyword::Return),
            _ => None,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Keyword::Param => "PARAM",
            Keyword::Var => "VAR",
            Keyword::Const => "CONST",
            Keyword::Begin => "BEGIN",
            Keyword::End => "END",
            Keyword::Return => "RETURN",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum TokenKind {
    Keyword(Keyword),
    Identifier,
    Literal,
    Comma,
    Semicolon,
    /// The `.` closing a function.
    Terminator,
    /// `=` in a CONST initializer.
    ConstAssign,
    /// `:=`
    VarAssign,
    Plus,
    Minus,
    Star,
    Slash,
    OpenParen,
    CloseParen,
}

impl TokenKind {
    /// Token text as it appears in "expected ..." diagnostics.
    pub fn describe(self) -> &'static str {
        match self {
            TokenKind::Keyword(kw) => kw.as_str(),
            TokenKind::Identifier => "identifier",
            TokenKind::Literal => "literal",
            TokenKind::Comma => ",",
            TokenKind::Semicolon => ";",
            TokenKind::Terminator => ".",
            TokenKind::ConstAssign => "=",
            TokenKind::VarAssign => ":=",
            TokenKind::Plus => "+",
            TokenKind::Minus => "-",
            TokenKind::Star => "*",
            TokenKind::Slash => "/",
            TokenKind::OpenParen => "(",
            TokenKind::CloseParen => ")",
        }
    }
}

/// One lexeme with its source span. The text itself is not stored; it is
/// recovered by slicing the source lines with the span when needed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct Token {
    pub kind: TokenKind,
    pub reference: CodeRef,
}

/// Tokenize the whole source eagerly, stopping at the first invalid lexeme.
pub fn tokenize(source: &SourceMap) -> Result<Vec<Token>, CompileError> {
    let mut tokens = Vec::new();
    for line_index in 0..source.line_count() {
        let line = source.line(line_index).unwrap_or("");
        lex_line(line, line_index, &mut tokens)?;
    }
    Ok(tokens)
}

fn lex_line(line: &str, line_index: usize, tokens: &mut Vec<Token>) -> Result<(), CompileError> {
    let bytes = line.as_bytes();
    let mut col = 0;

    while col < bytes.len() {
        let ch = bytes[col];
        let start = col;

        match ch {
            // `\n` never appears: lines are pre-split.
            b' ' | b'\t' | b'\r' | 0x0b | 0x0c => {
                col += 1;
            }
            b'.' => { col += 1; push(tokens, TokenKind::Terminator, line_index, start, col); }
            b',' => { col += 1; push(tokens, TokenKind::Comma, line_index, start, col); }
            b';' => { col += 1; push(tokens, TokenKind::Semicolon, line_index, start, col); }
            b'+' => { col += 1; push(tokens, TokenKind::Plus, line_index, start, col); }
            b'-' => { col += 1; push(tokens, TokenKind::Minus, line_index, start, col); }
            b'*' => { col += 1; push(tokens, TokenKind::Star, line_index, start, col); }
            b'/' => { col += 1; push(tokens, TokenKind::Slash, line_index, start, col); }
            b'=' => { col += 1; push(tokens, TokenKind::ConstAssign, line_index, start, col); }
            b'(' => { col += 1; push(tokens, TokenKind::OpenParen, line_index, start, col); }
            b')' => { col += 1; push(tokens, TokenKind::CloseParen, line_index, start, col); }
            b':' => {
                col += 1;
                if bytes.get(col) == Some(&b'=') {
                    col += 1;
                    push(tokens, TokenKind::VarAssign, line_index, start, col);
                } else {
                    return Err(CompileError::lexer(
                        "Expected ':=' for assignment",
                        CodeRef::on_line(line_index, start, start),
                    ));
                }
            }
            b'a'..=b'z' | b'A'..=b'Z' | b'0'..=b'9' => {
                // Maximal run of letters and digits; classification looks at
                // the whole run, so `12ab` is one invalid token, not two.
                while col < bytes.len() && bytes[col].is_ascii_alphanumeric() {
                    col += 1;
                }
                let word = line.get(start..col).unwrap_or("");
                let kind = classify_word(word);
                match kind {
                    Some(kind) => push(tokens, kind, line_index, start, col),
                    None => {
                        return Err(CompileError::lexer(
                            format!("Invalid token: '{word}'"),
                            CodeRef::on_line(line_index, start, col - 1),
                        ));
                    }
                }
            }
            _ => {
                return Err(CompileError::lexer(
                    format!("Unexpected character: '{}'", char::from(ch)),
                    CodeRef::on_line(line_index, start, start),
                ));
            }
        }
    }

    Ok(())
}

fn classify_word(word: &str) -> Option<TokenKind> {
    if let Some(kw) = Keyword::from_word(word) {
        return Some(TokenKind::Keyword(kw));
    }
    if word.bytes().all(|b| b.is_ascii_alphabetic()) {
        return Some(TokenKind::Identifier);
    }
    if word.bytes().all(|b| b.is_ascii_digit()) {
        return Some(TokenKind::Literal);
    }
    None
}

fn push(tokens: &mut Vec<Token>, kind: TokenKind, line: usize, start: usize, end: usize) {
    tokens.push(Token {
        kind,
        reference: CodeRef::on_line(line, start, end - 1),
    });
}
