use std::collections::HashSet;

use crate::ast::{BinOp, Expr, Function, Stmt, UnaryOp};
use crate::cst::{literal_value, ParseKind, ParseNode};
use crate::error::CompileError;
use crate::source::{CodeRef, Pos, SourceMap};
use crate::symbols::SymbolTable;

/// Analyze a `Function` parse tree into an AST.
///
/// One forward pass over the statement list suffices: the language has no
/// control flow, so a variable is usable exactly when an earlier statement
/// assigned it. Any failure aborts the whole compilation — there is no
/// recovery.
pub fn analyze(function: &ParseNode, source: &SourceMap) -> Result<Function, CompileError> {
    let symbols = SymbolTable::build(function, source)?;

    let Some(compound) = function.find(ParseKind::CompoundStatement) else {
        return Err(malformed(function));
    };

    let mut analyzer = Analyzer {
        source,
        symbols,
        initialized: HashSet::new(),
    };

    let mut statements = Vec::new();
    if let Some(list) = compound.find(ParseKind::StatementList) {
        for child in &list.children {
            // semicolon tokens interleave the statements
            if child.kind != ParseKind::Statement {
                continue;
            }
            statements.push(analyzer.analyze_statement(child)?);
        }
    }

    if !statements.iter().any(|s| matches!(s, Stmt::Return { .. })) {
        let end = compound
            .children
            .last()
            .and_then(ParseNode::first_terminal)
            .unwrap_or_else(|| CodeRef::at(source.end_of_input()));
        return Err(CompileError::semantic("Missing Return Statement", end));
    }

    Ok(Function {
        statements,
        symbols: analyzer.symbols,
    })
}

struct Analyzer<'a> {
    source: &'a SourceMap,
    symbols: SymbolTable,
    /// Variables assigned by an earlier statement. Grows monotonically in
    /// statement order.
    initialized: HashSet<String>,
}

impl<'a> Analyzer<'a> {
    fn analyze_statement(&mut self, node: &ParseNode) -> Result<Stmt, CompileError> {
        match node.children.as_slice() {
            [assignment] if assignment.kind == ParseKind::AssignmentExpression => {
                self.analyze_assignment(assignment)
            }
            [keyword, expr] if keyword.kind == ParseKind::Token => {
                let value = self.analyze_expression(expr)?;
                Ok(Stmt::Return { value })
            }
            _ => Err(malformed(node)),
        }
    }

    /// `identifier := expr`. The target is checked before the right-hand
    /// side is analyzed; only a successful assignment to a variable marks it
    /// initialized (parameters are usable from the start and stay so).
    fn analyze_assignment(&mut self, node: &ParseNode) -> Result<Stmt, CompileError> {
        let [target, _assign, expr] = node.children.as_slice() else {
            return Err(malformed(node));
        };
        let Some(reference) = target.leaf_reference() else {
            return Err(malformed(node));
        };
        let name = self.source.snippet(reference);
        if !self.symbols.is_declared(name) {
            return Err(CompileError::semantic("Undeclared Identifier", reference));
        }
        if self.symbols.is_constant(name) {
            return Err(CompileError::semantic("Constant Assignment", reference));
        }
        let value = self.analyze_expression(expr)?;
        if self.symbols.is_variable(name) {
            self.initialized.insert(name.to_string());
        }
        Ok(Stmt::Assignment {
            target: name.to_string(),
            reference,
            value,
        })
    }

    fn analyze_expression(&self, node: &ParseNode) -> Result<Expr, CompileError> {
        match node.kind {
            ParseKind::AdditiveExpression | ParseKind::MultiplicativeExpression => {
                self.analyze_binary(node)
            }
            ParseKind::UnaryExpression => self.analyze_unary(node),
            ParseKind::PrimaryExpression => self.analyze_primary(node),
            ParseKind::Identifier => self.analyze_identifier(node),
            ParseKind::Literal => self.analyze_literal(node),
            _ => Err(malformed(node)),
        }
    }

    fn analyze_binary(&self, node: &ParseNode) -> Result<Expr, CompileError> {
        match node.children.as_slice() {
            [single] => self.analyze_expression(single),
            [left, op_token, right] => {
                let Some(reference) = op_token.leaf_reference() else {
                    return Err(malformed(node));
                };
                let op = self.binary_op(reference)?;
                let left = self.analyze_expression(left)?;
                let right = self.analyze_expression(right)?;
                Ok(Expr::Binary {
                    op,
                    reference,
                    left: Box::new(left),
                    right: Box::new(right),
                })
            }
            _ => Err(malformed(node)),
        }
    }

    fn analyze_unary(&self, node: &ParseNode) -> Result<Expr, CompileError> {
        match node.children.as_slice() {
            [primary] => self.analyze_expression(primary),
            [sign, primary] => {
                let Some(reference) = sign.leaf_reference() else {
                    return Err(malformed(node));
                };
                let op = match self.source.snippet(reference) {
                    "+" => UnaryOp::Plus,
                    "-" => UnaryOp::Minus,
                    _ => return Err(malformed(node)),
                };
                let input = self.analyze_expression(primary)?;
                Ok(Expr::Unary {
                    op,
                    input: Box::new(input),
                })
            }
            _ => Err(malformed(node)),
        }
    }

    fn analyze_primary(&self, node: &ParseNode) -> Result<Expr, CompileError> {
        match node.children.as_slice() {
            [leaf] => self.analyze_expression(leaf),
            // `( expr )` — the parentheses leave no trace in the AST
            [_open, inner, _close] => self.analyze_expression(inner),
            _ => Err(malformed(node)),
        }
    }

    fn analyze_identifier(&self, node: &ParseNode) -> Result<Expr, CompileError> {
        let Some(reference) = node.leaf_reference() else {
            return Err(malformed(node));
        };
        let name = self.source.snippet(reference);
        if !self.symbols.is_declared(name) {
            return Err(CompileError::semantic("Undeclared Identifier", reference));
        }
        if self.symbols.is_variable(name) && !self.initialized.contains(name) {
            return Err(CompileError::semantic("Uninitialized Identifier", reference));
        }
        Ok(Expr::Identifier {
            name: name.to_string(),
            reference,
        })
    }

    fn analyze_literal(&self, node: &ParseNode) -> Result<Expr, CompileError> {
        let Some(reference) = node.leaf_reference() else {
            return Err(malformed(node));
        };
        Ok(Expr::Literal {
            value: literal_value(self.source.snippet(reference)),
        })
    }

    fn binary_op(&self, reference: CodeRef) -> Result<BinOp, CompileError> {
        match self.source.snippet(reference) {
            "+" => Ok(BinOp::Add),
            "-" => Ok(BinOp::Sub),
            "*" => Ok(BinOp::Mul),
            "/" => Ok(BinOp::Div),
            other => Err(CompileError::semantic(
                format!("unknown operator '{other}'"),
                reference,
            )),
        }
    }
}

/// Internal invariant breach: the parser never produces these shapes.
fn malformed(node: &ParseNode) -> CompileError {
    let reference = node
        .first_terminal()
        .unwrap_or_else(|| CodeRef::at(Pos::new(0, 0)));
    CompileError::semantic("malformed parse tree", reference)
}
