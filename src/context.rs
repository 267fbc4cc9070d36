use std::collections::HashMap;

use crate::symbols::SymbolTable;

/// Mutable name→value store for one evaluation (or one optimization pass).
///
/// Constants are pre-bound from the symbol table and never written again.
/// Parameters are pre-bound from the argument vector when one is given, or
/// left unset for optimization where their values are symbolically unknown.
/// Variables always start unset and become known through assignments.
#[derive(Debug)]
pub struct EvalContext {
    parameters: HashMap<String, Option<i64>>,
    variables: HashMap<String, Option<i64>>,
    constants: HashMap<String, i64>,
}

impl EvalContext {
    /// Context for a real call: parameters bound by their ordinal index into
    /// `args`.
    pub fn for_call(symbols: &SymbolTable, args: &[i64]) -> Self {
        let mut ctx = Self::for_folding(symbols);
        for (name, info) in symbols.parameters() {
            ctx.parameters
                .insert(name.to_string(), args.get(info.index).copied());
        }
        ctx
    }

    /// Context for constant folding: parameters and variables unknown,
    /// constants known.
    pub fn for_folding(symbols: &SymbolTable) -> Self {
        let mut parameters = HashMap::new();
        for (name, _) in symbols.parameters() {
            parameters.insert(name.to_string(), None);
        }
        let mut variables = HashMap::new();
        for (name, _) in symbols.variables() {
            variables.insert(name.to_string(), None);
        }
        let mut constants = HashMap::new();
        for (name, info) in symbols.constants() {
            constants.insert(name.to_string(), info.value.unwrap_or_default());
        }
        Self {
            parameters,
            variables,
            constants,
        }
    }

    /// Current value of `name`, whichever namespace it lives in.
    pub fn get(&self, name: &str) -> Option<i64> {
        if let Some(value) = self.parameters.get(name) {
            return *value;
        }
        if let Some(value) = self.variables.get(name) {
            return *value;
        }
        self.constants.get(name).copied()
    }

    /// Set the parameter or variable slot for `name`. Constants are never a
    /// valid target; the analyzer rejects such programs before any context
    /// exists.
    pub fn update(&mut self, name: &str, value: i64) {
        debug_assert!(
            !self.constants.contains_key(name),
            "constants are immutable"
        );
        if let Some(slot) = self.parameters.get_mut(name) {
            *slot = Some(value);
        } else if let Some(slot) = self.variables.get_mut(name) {
            *slot = Some(value);
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::lexer::tokenize;
    use crate::parser::parse;
    use crate::source::SourceMap;

    fn symbols(src: &str) -> SymbolTable {
        let source = SourceMap::new(src);
        let tokens = tokenize(&source).unwrap();
        let tree = parse(&tokens, &source).unwrap();
        SymbolTable::build(&tree, &source).unwrap()
    }

    #[test]
    fn call_context_binds_parameters_by_ordinal() {
        let table = symbols("PARAM x,y;BEGIN RETURN x END.");
        let ctx = EvalContext::for_call(&table, &[10, 20]);
        assert_eq!(ctx.get("x"), Some(10));
        assert_eq!(ctx.get("y"), Some(20));
    }

    #[test]
    fn folding_context_leaves_parameters_unknown() {
        let table = symbols("PARAM x;CONST c=5;BEGIN RETURN x END.");
        let ctx = EvalContext::for_folding(&table);
        assert_eq!(ctx.get("x"), None);
        assert_eq!(ctx.get("c"), Some(5));
    }

    #[test]
    fn variables_start_unset_and_become_known() {
        let table = symbols("VAR v;BEGIN v:=1;RETURN v END.");
        let mut ctx = EvalContext::for_folding(&table);
        assert_eq!(ctx.get("v"), None);
        ctx.update("v", 9);
        assert_eq!(ctx.get("v"), Some(9));
    }

    #[test]
    fn parameters_can_be_reassigned() {
        let table = symbols("PARAM p;BEGIN p:=2;RETURN p END.");
        let mut ctx = EvalContext::for_call(&table, &[1]);
        ctx.update("p", 2);
        assert_eq!(ctx.get("p"), Some(2));
    }

    #[test]
    fn unknown_name_has_no_value() {
        let table = symbols("BEGIN RETURN 1 END.");
        let ctx = EvalContext::for_folding(&table);
        assert_eq!(ctx.get("ghost"), None);
    }
}
