use crate::ast::{Expr, Function, Stmt};
use crate::context::EvalContext;

/// Result of folding one subtree: either a provably constant value (the
/// subtree has been replaced in place by a literal) or not foldable here.
/// Deliberately distinct from the evaluator's runtime-error signal — a zero
/// divisor makes a node non-foldable, never a compile-time failure.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Fold {
    Constant(i64),
    Dynamic,
}

/// Single bottom-up constant-folding and dead-code-elimination pass,
/// mutating the function in place.
///
/// The fold context is seeded from the symbol table alone: constants are
/// known, parameters and variables are not. Values assigned from constant
/// expressions propagate to later statements through the same context.
/// Statements after the first RETURN are unreachable and dropped; a RETURN
/// of a constant collapses the whole body to that one statement. The pass
/// is idempotent — running it again changes nothing.
pub fn optimize(function: &mut Function) -> Fold {
    let mut ctx = EvalContext::for_folding(&function.symbols);

    for index in 0..function.statements.len() {
        let Some(stmt) = function.statements.get_mut(index) else {
            break;
        };
        match stmt {
            Stmt::Assignment { target, value, .. } => {
                if let Fold::Constant(known) = fold_expr(value, &ctx) {
                    // the assignment stays: its effect on the target is
                    // still observable by non-constant statements below
                    ctx.update(target, known);
                }
            }
            Stmt::Return { value } => {
                return match fold_expr(value, &ctx) {
                    Fold::Constant(known) => {
                        function.statements = vec![Stmt::Return {
                            value: Expr::Literal { value: known },
                        }];
                        Fold::Constant(known)
                    }
                    Fold::Dynamic => {
                        function.statements.truncate(index + 1);
                        Fold::Dynamic
                    }
                };
            }
        }
    }

    Fold::Dynamic
}

/// Fold one expression. A subtree that reduces to a constant is rewritten
/// into a `Literal` node; a partially constant binary keeps its node but
/// still gets its constant side(s) rewritten.
fn fold_expr(expr: &mut Expr, ctx: &EvalContext) -> Fold {
    let known = match expr {
        Expr::Literal { value } => return Fold::Constant(*value),
        Expr::Identifier { name, .. } => match ctx.get(name) {
            Some(value) => value,
            None => return Fold::Dynamic,
        },
        Expr::Unary { op, input } => match fold_expr(input, ctx) {
            Fold::Constant(value) => op.apply(value),
            Fold::Dynamic => return Fold::Dynamic,
        },
        Expr::Binary {
            op, left, right, ..
        } => {
            let lhs = fold_expr(left, ctx);
            let rhs = fold_expr(right, ctx);
            match (lhs, rhs) {
                (Fold::Constant(a), Fold::Constant(b)) => match op.apply(a, b) {
                    Some(value) => value,
                    // zero divisor: decline to fold. Whether this division
                    // ever runs depends on values we do not have here, and
                    // the runtime reports it if it does.
                    None => return Fold::Dynamic,
                },
                _ => return Fold::Dynamic,
            }
        }
    };
    *expr = Expr::Literal { value: known };
    Fold::Constant(known)
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::panic)]
mod tests {
    use super::*;
    use crate::ast::BinOp;
    use crate::compile_source;
    use crate::context::EvalContext;
    use crate::error::RuntimeError;
    use crate::eval::evaluate;

    fn optimized(src: &str) -> Function {
        let mut function = compile_source(src).unwrap();
        optimize(&mut function);
        function
    }

    fn return_expr(function: &Function) -> &Expr {
        match function.statements.last() {
            Some(Stmt::Return { value }) => value,
            other => panic!("expected a trailing return, got {other:?}"),
        }
    }

    #[test]
    fn constant_return_collapses_the_body() {
        let function = optimized("VAR a;BEGIN a:=2;RETURN a*3+4 END.");
        assert_eq!(function.statements.len(), 1);
        assert_eq!(return_expr(&function), &Expr::Literal { value: 10 });
    }

    #[test]
    fn dead_code_after_return_is_dropped() {
        let mut function = compile_source("BEGIN RETURN 1;RETURN 2 END.").unwrap();
        let mut ctx = EvalContext::for_call(&function.symbols, &[]);
        assert_eq!(evaluate(&function, &mut ctx), Ok(1));

        optimize(&mut function);
        assert_eq!(function.statements.len(), 1);
        let mut ctx = EvalContext::for_call(&function.symbols, &[]);
        assert_eq!(evaluate(&function, &mut ctx), Ok(1));
    }

    #[test]
    fn dynamic_return_still_truncates_trailing_statements() {
        let function = optimized("PARAM p;VAR v;BEGIN RETURN p;v:=1;RETURN v END.");
        assert_eq!(function.statements.len(), 1);
        assert!(matches!(
            return_expr(&function),
            Expr::Identifier { name, .. } if name == "p"
        ));
    }

    #[test]
    fn known_variable_propagates_forward() {
        let function = optimized("PARAM p;VAR a,b;BEGIN a:=5;b:=a*2;RETURN b+p END.");
        // both assignments fold to literals, the return stays dynamic
        assert_eq!(function.statements.len(), 3);
        let Stmt::Assignment { value, .. } = &function.statements[1] else {
            panic!("expected an assignment");
        };
        assert_eq!(*value, Expr::Literal { value: 10 });
    }

    #[test]
    fn assignment_from_parameter_blocks_propagation() {
        let function = optimized("PARAM p;VAR a;BEGIN a:=p;RETURN a+0 END.");
        assert_eq!(function.statements.len(), 2);
        assert!(matches!(return_expr(&function), Expr::Binary { .. }));
    }

    #[test]
    fn partial_folding_inside_dynamic_expression() {
        let function = optimized("PARAM p;BEGIN RETURN p+2*3 END.");
        let Expr::Binary { op, left, right, .. } = return_expr(&function) else {
            panic!("expected a binary node");
        };
        assert_eq!(*op, BinOp::Add);
        assert!(matches!(**left, Expr::Identifier { .. }));
        // the constant side folded even though the whole node could not
        assert_eq!(**right, Expr::Literal { value: 6 });
    }

    #[test]
    fn unary_folds_through() {
        let function = optimized("BEGIN RETURN -(-5) END.");
        assert_eq!(return_expr(&function), &Expr::Literal { value: 5 });
    }

    #[test]
    fn zero_divisor_is_not_folded_and_not_an_error() {
        let function = optimized("BEGIN RETURN 1/0 END.");
        // the node survives; both operands are literals
        let Expr::Binary { op, .. } = return_expr(&function) else {
            panic!("expected the division to survive");
        };
        assert_eq!(*op, BinOp::Div);

        // and the error still surfaces at run time
        let mut ctx = EvalContext::for_call(&function.symbols, &[]);
        assert!(matches!(
            evaluate(&function, &mut ctx),
            Err(RuntimeError::DivideByZero(_))
        ));
    }

    #[test]
    fn dynamic_divisor_is_left_alone() {
        let function = optimized("PARAM b;BEGIN RETURN 10/b END.");
        assert!(matches!(return_expr(&function), Expr::Binary { .. }));
    }

    #[test]
    fn pass_is_idempotent() {
        let mut function = compile_source("PARAM p;VAR v;BEGIN v:=2*3;RETURN v+p END.").unwrap();
        optimize(&mut function);
        let once = function.clone();
        optimize(&mut function);
        assert_eq!(function.statements, once.statements);
    }

    #[test]
    fn optimized_matches_unoptimized() {
        let sources = [
            "PARAM a,b;BEGIN RETURN (a+b)*2-1 END.",
            "PARAM p;VAR v;BEGIN v:=3*4;RETURN v/p END.",
            "CONST c=9;VAR v;BEGIN v:=c-2;RETURN v*v END.",
        ];
        for src in sources {
            let unopt = compile_source(src).unwrap();
            let mut opt = unopt.clone();
            optimize(&mut opt);
            for args in [&[1i64, 2][..], &[4, 0][..], &[-6, 3][..]] {
                let args = &args[..unopt.symbols.parameter_count()];
                let mut ctx_a = EvalContext::for_call(&unopt.symbols, args);
                let mut ctx_b = EvalContext::for_call(&opt.symbols, args);
                assert_eq!(
                    evaluate(&unopt, &mut ctx_a),
                    evaluate(&opt, &mut ctx_b),
                    "diverged on {src} with {args:?}"
                );
            }
        }
    }
}
