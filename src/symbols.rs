use indexmap::IndexMap;

use crate::cst::{literal_value, ParseKind, ParseNode};
use crate::error::CompileError;
use crate::source::{CodeRef, SourceMap};

/// Per-symbol record. `index` is meaningful only for parameters (their
/// 0-based position in the PARAM list, used to bind call arguments) and
/// `value` only for constants; the other namespaces carry placeholders.
#[derive(Debug, Clone)]
pub struct SymbolInfo {
    pub reference: CodeRef,
    pub index: usize,
    pub value: Option<i64>,
}

/// Three independent name spaces built from the declaration sections.
/// An identifier may appear in at most one of them; insertion order follows
/// declaration order.
#[derive(Debug, Clone, Default)]
pub struct SymbolTable {
    parameters: IndexMap<String, SymbolInfo>,
    variables: IndexMap<String, SymbolInfo>,
    constants: IndexMap<String, SymbolInfo>,
}

impl SymbolTable {
    /// Populate the table from a `Function` parse node's declaration
    /// sections. Fails with "Already declared" at the second occurrence of a
    /// name, whether the clash is within one list or across lists.
    pub fn build(function: &ParseNode, source: &SourceMap) -> Result<SymbolTable, CompileError> {
        let mut table = SymbolTable::default();

        if let Some(section) = function.find(ParseKind::ParameterDeclaration) {
            table.collect_declarators(section, source, Namespace::Parameter)?;
        }
        if let Some(section) = function.find(ParseKind::VariableDeclaration) {
            table.collect_declarators(section, source, Namespace::Variable)?;
        }
        if let Some(section) = function.find(ParseKind::ConstantDeclaration) {
            table.collect_init_declarators(section, source)?;
        }

        Ok(table)
    }

    fn collect_declarators(
        &mut self,
        section: &ParseNode,
        source: &SourceMap,
        namespace: Namespace,
    ) -> Result<(), CompileError> {
        let Some(list) = section.find(ParseKind::DeclaratorList) else {
            return Ok(());
        };
        let mut ordinal = 0usize;
        for child in &list.children {
            if child.kind != ParseKind::Identifier {
                continue;
            }
            let Some(reference) = child.leaf_reference() else {
                continue;
            };
            let name = source.snippet(reference).to_string();
            self.declare(name, reference, ordinal, None, namespace)?;
            ordinal += 1;
        }
        Ok(())
    }

    fn collect_init_declarators(
        &mut self,
        section: &ParseNode,
        source: &SourceMap,
    ) -> Result<(), CompileError> {
        let Some(list) = section.find(ParseKind::InitDeclaratorList) else {
            return Ok(());
        };
        for declarator in &list.children {
            if declarator.kind != ParseKind::InitDeclarator {
                continue;
            }
            let identifier = declarator.find(ParseKind::Identifier);
            let literal = declarator.find(ParseKind::Literal);
            let (Some(reference), Some(literal)) =
                (identifier.and_then(ParseNode::leaf_reference), literal)
            else {
                continue;
            };
            let value = literal
                .leaf_reference()
                .map(|r| literal_value(source.snippet(r)));
            let name = source.snippet(reference).to_string();
            self.declare(name, reference, 0, value, Namespace::Constant)?;
        }
        Ok(())
    }

    fn declare(
        &mut self,
        name: String,
        reference: CodeRef,
        index: usize,
        value: Option<i64>,
        namespace: Namespace,
    ) -> Result<(), CompileError> {
        if self.is_declared(&name) {
            return Err(CompileError::semantic("Already declared", reference));
        }
        let info = SymbolInfo {
            reference,
            index,
            value,
        };
        match namespace {
            Namespace::Parameter => self.parameters.insert(name, info),
            Namespace::Variable => self.variables.insert(name, info),
            Namespace::Constant => self.constants.insert(name, info),
        };
        Ok(())
    }

    // ── Queries ───────────────────────────────────────────────────

    pub fn is_declared(&self, name: &str) -> bool {
        self.parameters.contains_key(name)
            || self.variables.contains_key(name)
            || self.constants.contains_key(name)
    }

    pub fn is_variable(&self, name: &str) -> bool {
        self.variables.contains_key(name)
    }

    pub fn is_constant(&self, name: &str) -> bool {
        self.constants.contains_key(name)
    }

    pub fn parameter_count(&self) -> usize {
        self.parameters.len()
    }

    /// Parameters in declaration order.
    pub fn parameters(&self) -> impl Iterator<Item = (&str, &SymbolInfo)> {
        self.parameters.iter().map(|(n, i)| (n.as_str(), i))
    }

    pub fn variables(&self) -> impl Iterator<Item = (&str, &SymbolInfo)> {
        self.variables.iter().map(|(n, i)| (n.as_str(), i))
    }

    pub fn constants(&self) -> impl Iterator<Item = (&str, &SymbolInfo)> {
        self.constants.iter().map(|(n, i)| (n.as_str(), i))
    }
}

#[derive(Clone, Copy)]
enum Namespace {
    Parameter,
    Variable,
    Constant,
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::lexer::tokenize;
    use crate::parser::parse;
    use crate::source::Pos;

    fn table(src: &str) -> Result<SymbolTable, CompileError> {
        let source = SourceMap::new(src);
        let tokens = tokenize(&source).unwrap();
        let tree = parse(&tokens, &source).unwrap();
        SymbolTable::build(&tree, &source)
    }

    #[test]
    fn parameters_get_ordinals_in_declaration_order() {
        let t = table("PARAM x,y,z;BEGIN RETURN x END.").unwrap();
        let ordinals: Vec<(String, usize)> = t
            .parameters()
            .map(|(n, i)| (n.to_string(), i.index))
            .collect();
        assert_eq!(
            ordinals,
            vec![
                ("x".to_string(), 0),
                ("y".to_string(), 1),
                ("z".to_string(), 2)
            ]
        );
    }

    #[test]
    fn constants_store_their_literal_value() {
        let t = table("CONST a=7,b=42;BEGIN RETURN a END.").unwrap();
        let values: Vec<Option<i64>> = t.constants().map(|(_, i)| i.value).collect();
        assert_eq!(values, vec![Some(7), Some(42)]);
    }

    #[test]
    fn namespaces_are_disjoint_queries() {
        let t = table("PARAM p;VAR v;CONST c=1;BEGIN v:=p;RETURN v END.").unwrap();
        assert!(t.is_declared("p") && t.is_declared("v") && t.is_declared("c"));
        assert!(t.is_variable("v") && !t.is_variable("p") && !t.is_variable("c"));
        assert!(t.is_constant("c") && !t.is_constant("v"));
        assert!(!t.is_declared("q"));
    }

    #[test]
    fn duplicate_within_one_list() {
        let err = table("PARAM a,a;BEGIN RETURN a END.").unwrap_err();
        assert_eq!(err.message, "Already declared");
        // the second `a`
        assert_eq!(err.reference.start, Pos::new(0, 8));
    }

    #[test]
    fn duplicate_across_namespaces() {
        let err = table("PARAM a;VAR a;BEGIN RETURN a END.").unwrap_err();
        assert_eq!(err.message, "Already declared");
        assert_eq!(err.reference.start, Pos::new(0, 12));
    }

    #[test]
    fn duplicate_constant_against_parameter() {
        let err = table("PARAM a;CONST a=1;BEGIN RETURN a END.").unwrap_err();
        assert_eq!(err.message, "Already declared");
    }
}
