use crate::cst::{ParseKind, ParseNode};
use crate::error::CompileError;
use crate::lexer::{Keyword, Token, TokenKind};
use crate::source::{CodeRef, SourceMap};

/// Parse the token sequence into a concrete parse tree rooted at a
/// `Function` node.
///
/// Recursive descent with one-token lookahead, no backtracking. The first
/// token that cannot extend the current production aborts the parse with an
/// "expected ..." error at that token (or at a sentinel position one column
/// past the end of input when the tokens ran out).
pub fn parse(tokens: &[Token], source: &SourceMap) -> Result<ParseNode, CompileError> {
    let mut parser = Parser {
        tokens,
        source,
        pos: 0,
    };
    parser.parse_function()
}

struct Parser<'a> {
    tokens: &'a [Token],
    source: &'a SourceMap,
    pos: usize,
}

impl<'a> Parser<'a> {
    // ── Cursor helpers ────────────────────────────────────────────

    fn peek(&self) -> Option<&Token> {
        self.tokens.get(self.pos)
    }

    fn peek_kind(&self) -> Option<TokenKind> {
        self.peek().map(|t| t.kind)
    }

    /// Consume the current token into a `Token` leaf. Callers check the kind
    /// first; at end of input this degrades to a sentinel-positioned leaf.
    fn token_leaf(&mut self) -> ParseNode {
        let reference = match self.peek() {
            Some(tok) => {
                let reference = tok.reference;
                self.pos += 1;
                reference
            }
            None => CodeRef::at(self.source.end_of_input()),
        };
        ParseNode::leaf(ParseKind::Token, reference)
    }

    fn expect_leaf(&mut self, kind: TokenKind, what: &str) -> Result<ParseNode, CompileError> {
        self.expect_as(kind, ParseKind::Token, what)
    }

    fn expect_as(
        &mut self,
        kind: TokenKind,
        node_kind: ParseKind,
        what: &str,
    ) -> Result<ParseNode, CompileError> {
        match self.peek() {
            Some(tok) if tok.kind == kind => {
                let reference = tok.reference;
                self.pos += 1;
                Ok(ParseNode::leaf(node_kind, reference))
            }
            _ => Err(self.expected(what)),
        }
    }

    /// Build the "expected ..." error for the current position. The two
    /// message shapes are a compatibility contract: unquoted at a concrete
    /// mismatched token, quoted at end of input.
    fn expected(&self, what: &str) -> CompileError {
        match self.peek() {
            Some(tok) => CompileError::parser(format!("expected {what}"), tok.reference),
            None => CompileError::parser(
                format!("expected \"{what}\""),
                CodeRef::at(self.source.end_of_input()),
            ),
        }
    }

    fn at_keyword(&self, kw: Keyword) -> bool {
        self.peek_kind() == Some(TokenKind::Keyword(kw))
    }

    // ── Productions ───────────────────────────────────────────────

    fn parse_function(&mut self) -> Result<ParseNode, CompileError> {
        let mut children = Vec::new();

        if let Some(node) = self.parse_parameter_declaration()? {
            children.push(node);
        }
        if let Some(node) = self.parse_variable_declaration()? {
            children.push(node);
        }
        if let Some(node) = self.parse_constant_declaration()? {
            children.push(node);
        }

        children.push(self.parse_compound_statement()?);
        children.push(self.expect_leaf(TokenKind::Terminator, ".")?);

        if let Some(tok) = self.peek() {
            return Err(CompileError::parser("unexpected token", tok.reference));
        }

        Ok(ParseNode::branch(ParseKind::Function, children))
    }

    /// `PARAM declarator-list ;` — the section is optional, but once the
    /// keyword is consumed the rest is mandatory.
    fn parse_parameter_declaration(&mut self) -> Result<Option<ParseNode>, CompileError> {
        if !self.at_keyword(Keyword::Param) {
            return Ok(None);
        }
        let keyword = self.token_leaf();
        let list = self.parse_declarator_list()?;
        let semicolon = self.expect_leaf(TokenKind::Semicolon, ";")?;
        Ok(Some(ParseNode::branch(
            ParseKind::ParameterDeclaration,
            vec![keyword, list, semicolon],
        )))
    }

    fn parse_variable_declaration(&mut self) -> Result<Option<ParseNode>, CompileError> {
        if !self.at_keyword(Keyword::Var) {
            return Ok(None);
        }
        let keyword = self.token_leaf();
        let list = self.parse_declarator_list()?;
        let semicolon = self.expect_leaf(TokenKind::Semicolon, ";")?;
        Ok(Some(ParseNode::branch(
            ParseKind::VariableDeclaration,
            vec![keyword, list, semicolon],
        )))
    }

    fn parse_constant_declaration(&mut self) -> Result<Option<ParseNode>, CompileError> {
        if !self.at_keyword(Keyword::Const) {
            return Ok(None);
        }
        let keyword = self.token_leaf();
        let list = self.parse_init_declarator_list()?;
        let semicolon = self.expect_leaf(TokenKind::Semicolon, ";")?;
        Ok(Some(ParseNode::branch(
            ParseKind::ConstantDeclaration,
            vec![keyword, list, semicolon],
        )))
    }

    fn parse_declarator_list(&mut self) -> Result<ParseNode, CompileError> {
        let mut children = vec![self.expect_as(
            TokenKind::Identifier,
            ParseKind::Identifier,
            "identifier",
        )?];
        while self.peek_kind() == Some(TokenKind::Comma) {
            children.push(self.token_leaf());
            children.push(self.expect_as(
                TokenKind::Identifier,
                ParseKind::Identifier,
                "identifier",
            )?);
        }
        Ok(ParseNode::branch(ParseKind::DeclaratorList, children))
    }

    fn parse_init_declarator_list(&mut self) -> Result<ParseNode, CompileError> {
        let mut children = vec![self.parse_init_declarator()?];
        while self.peek_kind() == Some(TokenKind::Comma) {
            children.push(self.token_leaf());
            children.push(self.parse_init_declarator()?);
        }
        Ok(ParseNode::branch(ParseKind::InitDeclaratorList, children))
    }

    /// `identifier = literal`
    fn parse_init_declarator(&mut self) -> Result<ParseNode, CompileError> {
        let identifier =
            self.expect_as(TokenKind::Identifier, ParseKind::Identifier, "identifier")?;
        let assign = self.expect_leaf(TokenKind::ConstAssign, "=")?;
        let literal = self.expect_as(TokenKind::Literal, ParseKind::Literal, "literal")?;
        Ok(ParseNode::branch(
            ParseKind::InitDeclarator,
            vec![identifier, assign, literal],
        ))
    }

    fn parse_compound_statement(&mut self) -> Result<ParseNode, CompileError> {
        let begin = self.expect_leaf(TokenKind::Keyword(Keyword::Begin), "BEGIN")?;
        let statements = self.parse_statement_list()?;
        let end = self.expect_leaf(TokenKind::Keyword(Keyword::End), "END")?;
        Ok(ParseNode::branch(
            ParseKind::CompoundStatement,
            vec![begin, statements, end],
        ))
    }

    fn parse_statement_list(&mut self) -> Result<ParseNode, CompileError> {
        let mut children = vec![self.parse_statement()?];
        while self.peek_kind() == Some(TokenKind::Semicolon) {
            children.push(self.token_leaf());
            children.push(self.parse_statement()?);
        }
        Ok(ParseNode::branch(ParseKind::StatementList, children))
    }

    /// `identifier := additive-expr` or `RETURN additive-expr`.
    fn parse_statement(&mut self) -> Result<ParseNode, CompileError> {
        match self.peek_kind() {
            Some(TokenKind::Keyword(Keyword::Return)) => {
                let keyword = self.token_leaf();
                let expr = self.parse_additive_expression()?;
                Ok(ParseNode::branch(ParseKind::Statement, vec![keyword, expr]))
            }
            Some(TokenKind::Identifier) => {
                let assignment = self.parse_assignment_expression()?;
                Ok(ParseNode::branch(ParseKind::Statement, vec![assignment]))
            }
            _ => Err(self.expected("statement")),
        }
    }

    fn parse_assignment_expression(&mut self) -> Result<ParseNode, CompileError> {
        let identifier =
            self.expect_as(TokenKind::Identifier, ParseKind::Identifier, "identifier")?;
        let assign = self.expect_leaf(TokenKind::VarAssign, ":=")?;
        let expr = self.parse_additive_expression()?;
        Ok(ParseNode::branch(
            ParseKind::AssignmentExpression,
            vec![identifier, assign, expr],
        ))
    }

    /// Right-recursive: `a + b + c` nests as `a + (b + c)` in tree shape.
    fn parse_additive_expression(&mut self) -> Result<ParseNode, CompileError> {
        let left = self.parse_multiplicative_expression()?;
        match self.peek_kind() {
            Some(TokenKind::Plus | TokenKind::Minus) => {
                let op = self.token_leaf();
                let right = self.parse_additive_expression()?;
                Ok(ParseNode::branch(
                    ParseKind::AdditiveExpression,
                    vec![left, op, right],
                ))
            }
            _ => Ok(ParseNode::branch(ParseKind::AdditiveExpression, vec![left])),
        }
    }

    fn parse_multiplicative_expression(&mut self) -> Result<ParseNode, CompileError> {
        let left = self.parse_unary_expression()?;
        match self.peek_kind() {
            Some(TokenKind::Star | TokenKind::Slash) => {
                let op = self.token_leaf();
                let right = self.parse_multiplicative_expression()?;
                Ok(ParseNode::branch(
                    ParseKind::MultiplicativeExpression,
                    vec![left, op, right],
                ))
            }
            _ => Ok(ParseNode::branch(
                ParseKind::MultiplicativeExpression,
                vec![left],
            )),
        }
    }

    fn parse_unary_expression(&mut self) -> Result<ParseNode, CompileError> {
        match self.peek_kind() {
            Some(TokenKind::Plus | TokenKind::Minus) => {
                let sign = self.token_leaf();
                let primary = self.parse_primary_expression()?;
                Ok(ParseNode::branch(
                    ParseKind::UnaryExpression,
                    vec![sign, primary],
                ))
            }
            _ => {
                let primary = self.parse_primary_expression()?;
                Ok(ParseNode::branch(ParseKind::UnaryExpression, vec![primary]))
            }
        }
    }

    fn parse_primary_expression(&mut self) -> Result<ParseNode, CompileError> {
        match self.peek_kind() {
            Some(TokenKind::Identifier) => {
                let identifier = self.expect_as(
                    TokenKind::Identifier,
                    ParseKind::Identifier,
                    "identifier",
                )?;
                Ok(ParseNode::branch(
                    ParseKind::PrimaryExpression,
                    vec![identifier],
                ))
            }
            Some(TokenKind::Literal) => {
                let literal =
                    self.expect_as(TokenKind::Literal, ParseKind::Literal, "literal")?;
                Ok(ParseNode::branch(ParseKind::PrimaryExpression, vec![literal]))
            }
            Some(TokenKind::OpenParen) => {
                let open = self.token_leaf();
                let inner = self.parse_additive_expression()?;
                let close = self.expect_leaf(TokenKind::CloseParen, ")")?;
                Ok(ParseNode::branch(
                    ParseKind::PrimaryExpression,
                    vec![open, inner, close],
                ))
            }
            _ => Err(self.expected("expression")),
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::lexer::tokenize;
    use crate::source::Pos;

    fn parse_source(src: &str) -> Result<ParseNode, CompileError> {
        let source = SourceMap::new(src);
        let tokens = tokenize(&source).unwrap();
        parse(&tokens, &source)
    }

    #[test]
    fn minimal_function() {
        let tree = parse_source("BEGIN RETURN 1 END.").unwrap();
        assert_eq!(tree.kind, ParseKind::Function);
        // compound statement and terminator only — no declaration sections
        assert_eq!(tree.children.len(), 2);
        assert_eq!(tree.children[0].kind, ParseKind::CompoundStatement);
        assert_eq!(tree.children[1].kind, ParseKind::Token);
    }

    #[test]
    fn all_sections_in_order() {
        let tree = parse_source("PARAM a;VAR b;CONST c=1;BEGIN b:=a;RETURN b+c END.").unwrap();
        let kinds: Vec<ParseKind> = tree.children.iter().map(|c| c.kind).collect();
        assert_eq!(
            kinds,
            vec![
                ParseKind::ParameterDeclaration,
                ParseKind::VariableDeclaration,
                ParseKind::ConstantDeclaration,
                ParseKind::CompoundStatement,
                ParseKind::Token,
            ]
        );
    }

    #[test]
    fn declarator_list_shape() {
        let tree = parse_source("PARAM a,b,c;BEGIN RETURN a END.").unwrap();
        let list = tree.children[0].find(ParseKind::DeclaratorList).unwrap();
        // identifier (comma identifier)* — 3 identifiers, 2 commas
        assert_eq!(list.children.len(), 5);
        assert_eq!(list.children[0].kind, ParseKind::Identifier);
        assert_eq!(list.children[1].kind, ParseKind::Token);
    }

    #[test]
    fn additive_is_right_recursive() {
        let tree = parse_source("BEGIN RETURN 1+2+3 END.").unwrap();
        let compound = tree.find(ParseKind::CompoundStatement).unwrap();
        let list = compound.find(ParseKind::StatementList).unwrap();
        let stmt = &list.children[0];
        let additive = &stmt.children[1];
        assert_eq!(additive.kind, ParseKind::AdditiveExpression);
        assert_eq!(additive.children.len(), 3);
        // the right child is the nested same-kind node holding 2+3
        assert_eq!(additive.children[2].kind, ParseKind::AdditiveExpression);
        assert_eq!(additive.children[2].children.len(), 3);
    }

    #[test]
    fn single_operand_productions_have_one_child() {
        let tree = parse_source("BEGIN RETURN 7 END.").unwrap();
        let compound = tree.find(ParseKind::CompoundStatement).unwrap();
        let stmt = &compound.find(ParseKind::StatementList).unwrap().children[0];
        let additive = &stmt.children[1];
        assert_eq!(additive.children.len(), 1);
        let multiplicative = &additive.children[0];
        assert_eq!(multiplicative.children.len(), 1);
        let unary = &multiplicative.children[0];
        assert_eq!(unary.children.len(), 1);
        assert_eq!(unary.children[0].kind, ParseKind::PrimaryExpression);
    }

    #[test]
    fn unary_sign_keeps_the_token() {
        let tree = parse_source("BEGIN RETURN -5 END.").unwrap();
        let compound = tree.find(ParseKind::CompoundStatement).unwrap();
        let stmt = &compound.find(ParseKind::StatementList).unwrap().children[0];
        let unary = &stmt.children[1].children[0].children[0];
        assert_eq!(unary.kind, ParseKind::UnaryExpression);
        assert_eq!(unary.children.len(), 2);
        assert_eq!(unary.children[0].kind, ParseKind::Token);
    }

    #[test]
    fn missing_begin_reports_unquoted_at_token() {
        let err = parse_source("RETURN 1 END.").unwrap_err();
        assert_eq!(err.message, "expected BEGIN");
        assert_eq!(err.reference.start, Pos::new(0, 0));
    }

    #[test]
    fn end_of_input_reports_quoted() {
        let err = parse_source("VAR a").unwrap_err();
        // the token stream is exhausted: quoted shape at the sentinel
        assert_eq!(err.message, "expected \";\"");
        assert_eq!(err.reference.start, Pos::new(0, 5));
    }

    #[test]
    fn missing_terminator_at_end_of_input() {
        let err = parse_source("BEGIN RETURN 1 END").unwrap_err();
        assert_eq!(err.message, "expected \".\"");
    }

    #[test]
    fn trailing_tokens_are_rejected() {
        let err = parse_source("BEGIN RETURN 1 END. x").unwrap_err();
        assert_eq!(err.message, "unexpected token");
        assert_eq!(err.reference.start, Pos::new(0, 20));
    }

    #[test]
    fn section_keyword_commits_the_section() {
        // PARAM consumed, so the declarator list is mandatory
        let err = parse_source("PARAM ;BEGIN RETURN 1 END.").unwrap_err();
        assert_eq!(err.message, "expected identifier");
    }

    #[test]
    fn parenthesized_expression() {
        let tree = parse_source("BEGIN RETURN (1+2)*3 END.").unwrap();
        let compound = tree.find(ParseKind::CompoundStatement).unwrap();
        let stmt = &compound.find(ParseKind::StatementList).unwrap().children[0];
        let multiplicative = &stmt.children[1].children[0];
        assert_eq!(multiplicative.kind, ParseKind::MultiplicativeExpression);
        assert_eq!(multiplicative.children.len(), 3);
        let primary = &multiplicative.children[0].children[0];
        assert_eq!(primary.kind, ParseKind::PrimaryExpression);
        // ( additive ) — three children including both parens
        assert_eq!(primary.children.len(), 3);
    }

    #[test]
    fn unclosed_paren() {
        let err = parse_source("BEGIN RETURN (1+2 END.").unwrap_err();
        assert_eq!(err.message, "expected )");
    }

    #[test]
    fn statement_needs_identifier_or_return() {
        let err = parse_source("BEGIN 1 END.").unwrap_err();
        assert_eq!(err.message, "expected statement");
    }
}
