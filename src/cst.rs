//! Concrete parse-tree node types, one per grammar production.

use crate::source::CodeRef;

/// Grammar production (or terminal class) a node was built by.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ParseKind {
    Function,
    ParameterDeclaration,
    VariableDeclaration,
    ConstantDeclaration,
    DeclaratorList,
    InitDeclaratorList,
    InitDeclarator,
    CompoundStatement,
    StatementList,
    Statement,
    AssignmentExpression,
    AdditiveExpression,
    MultiplicativeExpression,
    UnaryExpression,
    PrimaryExpression,
    /// Terminal: an identifier lexeme.
    Identifier,
    /// Terminal: a digit-run lexeme.
    Literal,
    /// Terminal: any keyword or punctuation token kept for tree shape.
    Token,
}

/// A node of the concrete parse tree. Non-terminals own their children in
/// left-to-right source order, punctuation included; terminals own only the
/// span of their lexeme, whose text is recovered by slicing the source.
#[derive(Debug, Clone)]
pub struct ParseNode {
    pub kind: ParseKind,
    pub children: Vec<ParseNode>,
    pub reference: Option<CodeRef>,
}

impl ParseNode {
    pub fn branch(kind: ParseKind, children: Vec<ParseNode>) -> Self {
        Self {
            kind,
            children,
            reference: None,
        }
    }

    pub fn leaf(kind: ParseKind, reference: CodeRef) -> Self {
        Self {
            kind,
            children: Vec::new(),
            reference: Some(reference),
        }
    }

    pub fn child(&self, index: usize) -> Option<&ParseNode> {
        self.children.get(index)
    }

    /// First direct child of the given kind, if any.
    pub fn find(&self, kind: ParseKind) -> Option<&ParseNode> {
        self.children.iter().find(|c| c.kind == kind)
    }

    /// Span of a terminal node. `None` on non-terminals.
    pub fn leaf_reference(&self) -> Option<CodeRef> {
        self.reference
    }

    /// Span of the leftmost terminal under this node.
    pub fn first_terminal(&self) -> Option<CodeRef> {
        if self.reference.is_some() {
            return self.reference;
        }
        self.children.iter().find_map(ParseNode::first_terminal)
    }
}

/// Interpret a digit-run lexeme as a signed 64-bit value. Folding is
/// wrapping: over-long runs wrap around two's-complement rather than
/// erroring, and the result is well-defined for any digit string.
pub fn literal_value(text: &str) -> i64 {
    text.bytes()
        .filter(u8::is_ascii_digit)
        .fold(0i64, |acc, b| {
            acc.wrapping_mul(10).wrapping_add(i64::from(b - b'0'))
        })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn literal_value_parses_digit_runs() {
        assert_eq!(literal_value("0"), 0);
        assert_eq!(literal_value("042"), 42);
        assert_eq!(literal_value("9223372036854775807"), i64::MAX);
    }

    #[test]
    fn literal_value_wraps_on_overflow() {
        // one past i64::MAX wraps to i64::MIN
        assert_eq!(literal_value("9223372036854775808"), i64::MIN);
    }

    #[test]
    fn find_scans_direct_children_only() {
        let leaf = ParseNode::leaf(ParseKind::Identifier, crate::source::CodeRef::on_line(0, 0, 0));
        let inner = ParseNode::branch(ParseKind::PrimaryExpression, vec![leaf]);
        let outer = ParseNode::branch(ParseKind::UnaryExpression, vec![inner]);
        assert!(outer.find(ParseKind::PrimaryExpression).is_some());
        assert!(outer.find(ParseKind::Identifier).is_none());
    }
}
