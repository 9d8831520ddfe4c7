use crate::ast::{CompareOp, Expression, Value};
use crate::catalog::SemanticType;

/// Simplifies a predicate tree without changing which rows it matches.
pub struct AstOptimizer {
    passes: usize,
}

impl AstOptimizer {
    pub fn new() -> Self {
        Self { passes: 0 }
    }

    /// Number of passes the last call to [`optimize`](Self::optimize) needed.
    pub fn passes(&self) -> usize {
        self.passes
    }

    /// Runs optimization passes in a loop until the AST reaches a fixed point.
    pub fn optimize(&mut self, expr: Expression) -> Expression {
        self.passes = 0;
        let mut current_expr = expr;
        loop {
            self.passes += 1;
            let next = self.fold_and_eliminate_dead_code(current_expr.clone());
            if next == current_expr {
                return next;
            }
            current_expr = next;
        }
    }

    /// Constant folding and dead code elimination, children first.
    fn fold_and_eliminate_dead_code(&self, expr: Expression) -> Expression {
        let optimized_expr = match expr {
            Expression::And(l, r) => {
                let left = self.fold_and_eliminate_dead_code(*l);
                let right = self.fold_and_eliminate_dead_code(*r);

                // ($x > A) AND ($x < B) where A >= B can never hold.
                if is_empty_range(&left, &right) || is_empty_range(&right, &left) {
                    return Expression::Literal(Value::Bool(false));
                }

                Expression::And(Box::new(left), Box::new(right))
            }
            Expression::Or(l, r) => Expression::Or(
                Box::new(self.fold_and_eliminate_dead_code(*l)),
                Box::new(self.fold_and_eliminate_dead_code(*r)),
            ),
            Expression::Not(v) => Expression::Not(Box::new(self.fold_and_eliminate_dead_code(*v))),
            other => other,
        };

        self.apply_folding_rules(optimized_expr)
    }

    fn apply_folding_rules(&self, expr: Expression) -> Expression {
        match expr {
            Expression::Not(v) => match *v {
                Expression::Literal(Value::Bool(b)) => Expression::Literal(Value::Bool(!b)),
                Expression::Not(inner_v) => *inner_v,
                opt_v => Expression::Not(Box::new(opt_v)),
            },
            Expression::Or(l, r) => match (*l, *r) {
                (_, Expression::Literal(Value::Bool(true)))
                | (Expression::Literal(Value::Bool(true)), _) => {
                    Expression::Literal(Value::Bool(true))
                }
                (expr, Expression::Literal(Value::Bool(false)))
                | (Expression::Literal(Value::Bool(false)), expr) => expr,
                (opt_l, opt_r) => Expression::Or(Box::new(opt_l), Box::new(opt_r)),
            },
            Expression::And(l, r) => match (*l, *r) {
                (_, Expression::Literal(Value::Bool(false)))
                | (Expression::Literal(Value::Bool(false)), _) => {
                    Expression::Literal(Value::Bool(false))
                }
                (expr, Expression::Literal(Value::Bool(true)))
                | (Expression::Literal(Value::Bool(true)), expr) => expr,
                (opt_l, opt_r) => Expression::And(Box::new(opt_l), Box::new(opt_r)),
            },
            Expression::Compare {
                op,
                kind,
                left,
                right,
            } => match (*left, *right) {
                (Expression::Literal(lv), Expression::Literal(rv)) => {
                    Expression::Literal(Value::Bool(op.evaluate(kind, &lv, &rv)))
                }
                (l, r) => Expression::compare(op, kind, l, r),
            },
            other => other,
        }
    }
}

impl Default for AstOptimizer {
    fn default() -> Self {
        Self::new()
    }
}

/// A numeric bound on a column: `column op value` with a literal on the right.
fn numeric_bound(expr: &Expression) -> Option<(&str, CompareOp, f64)> {
    match expr {
        Expression::Compare {
            op,
            kind: SemanticType::Numeric,
            left,
            right,
        } => match (&**left, &**right) {
            (Expression::Column(name), Expression::Literal(Value::Number(n))) => {
                Some((name.as_str(), *op, *n))
            }
            _ => None,
        },
        _ => None,
    }
}

/// `true` when `lower` is a lower bound and `upper` an upper bound on the
/// same column that no value can satisfy together.
fn is_empty_range(lower: &Expression, upper: &Expression) -> bool {
    let (Some((lcol, lop, a)), Some((ucol, uop, b))) = (numeric_bound(lower), numeric_bound(upper))
    else {
        return false;
    };
    if lcol != ucol {
        return false;
    }
    match (lop, uop) {
        (CompareOp::GreaterThanOrEqual, CompareOp::SmallerThanOrEqual) => a > b,
        (
            CompareOp::GreaterThan | CompareOp::GreaterThanOrEqual,
            CompareOp::SmallerThan | CompareOp::SmallerThanOrEqual,
        ) => a >= b,
        _ => false,
    }
}
