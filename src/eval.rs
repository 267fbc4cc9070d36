use crate::ast::{BinOp, Expr, Function, Stmt};
use crate::context::EvalContext;
use crate::error::RuntimeError;

/// Evaluate a function against a fresh per-call context.
///
/// Statements run in order; the first RETURN reached decides the result even
/// if later statements exist (there are no branches, so anything after an
/// unconditional return is unreachable — the optimizer normally prunes it,
/// but the evaluator does not rely on that). A failing assignment aborts the
/// whole call.
pub fn evaluate(function: &Function, ctx: &mut EvalContext) -> Result<i64, RuntimeError> {
    for stmt in &function.statements {
        match stmt {
            Stmt::Assignment { target, value, .. } => {
                let result = eval_expr(value, ctx)?;
                ctx.update(target, result);
            }
            Stmt::Return { value } => return eval_expr(value, ctx),
        }
    }
    // unreachable for analyzer-produced trees, which always contain a RETURN
    Err(RuntimeError::MissingReturn)
}

pub fn eval_expr(expr: &Expr, ctx: &EvalContext) -> Result<i64, RuntimeError> {
    match expr {
        Expr::Literal { value } => Ok(*value),
        Expr::Identifier { name, .. } => ctx
            .get(name)
            .ok_or_else(|| RuntimeError::UnboundIdentifier(name.clone())),
        Expr::Unary { op, input } => Ok(op.apply(eval_expr(input, ctx)?)),
        Expr::Binary {
            op,
            reference,
            left,
            right,
        } => {
            let lhs = eval_expr(left, ctx)?;
            let rhs = eval_expr(right, ctx)?;
            op.apply(lhs, rhs).ok_or_else(|| {
                debug_assert_eq!(*op, BinOp::Div);
                RuntimeError::DivideByZero(*reference)
            })
        }
    }
}
