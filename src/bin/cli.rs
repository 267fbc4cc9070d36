// CLI binary — panicking on unrecoverable errors is standard for CLI tools.
#![allow(clippy::unwrap_used, clippy::expect_used, clippy::indexing_slicing)]

use std::path::{Path, PathBuf};
use std::process;

use clap::{Parser, Subcommand};
use serde::Serialize;

use exprjit::lexer::{self, Token};
use exprjit::{CodeRef, Jit, SourceMap};

// ── CLI argument parsing ─────────────────────────────────────────

#[derive(Parser)]
#[command(name = "exprjit", about = "JIT for a small imperative expression language", version)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Output raw JSON instead of formatted text
    #[arg(long, global = true)]
    json: bool,
}

#[derive(Subcommand)]
enum Commands {
    /// Tokenize a source file and print the token stream
    Tokens { file: PathBuf },
    /// Compile a source file and report the outcome
    Check { file: PathBuf },
    /// Compile a source file and call it with the given arguments
    Run {
        file: PathBuf,
        /// Actual parameter values, bound in declaration order
        args: Vec<i64>,
    },
}

// ── Output formatting ────────────────────────────────────────────

#[derive(Serialize)]
struct TokenDump<'a> {
    kind: &'static str,
    text: &'a str,
    reference: CodeRef,
}

fn dump_tokens(source: &SourceMap, tokens: &[Token], raw_json: bool) {
    let dumps: Vec<TokenDump<'_>> = tokens
        .iter()
        .map(|tok| TokenDump {
            kind: tok.kind.describe(),
            text: source.snippet(tok.reference),
            reference: tok.reference,
        })
        .collect();

    if raw_json {
        println!("{}", serde_json::to_string_pretty(&dumps).unwrap_or_default());
        return;
    }
    for dump in &dumps {
        println!("{}  {}  '{}'", dump.reference, dump.kind, dump.text);
    }
}

fn read_source(file: &Path) -> String {
    std::fs::read_to_string(file).unwrap_or_else(|e| {
        eprintln!("[exprjit] Failed to read {}: {e}", file.display());
        process::exit(1);
    })
}

// ── Main ─────────────────────────────────────────────────────────

fn main() {
    let cli = Cli::parse();

    match &cli.command {
        Commands::Tokens { file } => {
            let text = read_source(file);
            let source = SourceMap::new(&text);
            match lexer::tokenize(&source) {
                Ok(tokens) => dump_tokens(&source, &tokens, cli.json),
                Err(e) => {
                    eprintln!("{e}");
                    process::exit(1);
                }
            }
        }
        Commands::Check { file } => {
            let text = read_source(file);
            match exprjit::compile_source(&text) {
                Ok(function) => {
                    eprintln!(
                        "[exprjit] OK: {} parameter(s), {} statement(s)",
                        function.symbols.parameter_count(),
                        function.statements.len()
                    );
                }
                Err(e) => {
                    if cli.json {
                        println!("{}", serde_json::to_string_pretty(&e).unwrap_or_default());
                    } else {
                        eprintln!("{e}");
                    }
                    process::exit(1);
                }
            }
        }
        Commands::Run { file, args } => {
            let text = read_source(file);
            let jit = Jit::new();
            let handle = jit.register(&text);
            match jit.call(handle, args) {
                Ok(value) => println!("{value}"),
                Err(e) => {
                    eprintln!("{e}");
                    process::exit(1);
                }
            }
        }
    }
}
