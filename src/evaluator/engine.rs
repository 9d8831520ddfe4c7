use crate::ast::{EvaluationTrace, Expression, Value};
use crate::data::Dataset;
use std::borrow::Cow;

static MISSING: Value = Value::Null;

/// The core recursive engine for evaluating one predicate against one row.
///
/// Callers must have checked that every column the expression mentions exists;
/// a column that is still absent reads as null.
pub(super) struct AstEngine<'a> {
    expression: &'a Expression,
    dataset: &'a Dataset,
    row: usize,
}

impl<'a> AstEngine<'a> {
    pub(super) fn new(expression: &'a Expression, dataset: &'a Dataset, row: usize) -> Self {
        Self {
            expression,
            dataset,
            row,
        }
    }

    /// Whether the row matches. Allocates nothing for plain comparisons.
    pub(super) fn matches(&self) -> bool {
        self.matches_recursive(self.expression)
    }

    /// Evaluates the AST and returns a trace of the execution.
    pub(super) fn evaluate(&self) -> EvaluationTrace {
        self.evaluate_recursive(self.expression)
    }

    fn cell(&self, column: &str) -> &'a Value {
        self.dataset.value(column, self.row).unwrap_or(&MISSING)
    }

    fn operand(&self, expr: &'a Expression) -> Cow<'a, Value> {
        match expr {
            Expression::Column(name) => Cow::Borrowed(self.cell(name)),
            Expression::Literal(value) => Cow::Borrowed(value),
            other => Cow::Owned(Value::Bool(self.matches_recursive(other))),
        }
    }

    fn matches_recursive(&self, expr: &'a Expression) -> bool {
        match expr {
            Expression::And(l, r) => self.matches_recursive(l) && self.matches_recursive(r),
            Expression::Or(l, r) => self.matches_recursive(l) || self.matches_recursive(r),
            Expression::Not(v) => !self.matches_recursive(v),
            Expression::Compare {
                op,
                kind,
                left,
                right,
            } => op.evaluate(*kind, &self.operand(left), &self.operand(right)),
            Expression::Literal(value) => value.is_truthy(),
            Expression::Column(name) => self.cell(name).is_truthy(),
        }
    }

    fn evaluate_recursive(&self, expr: &'a Expression) -> EvaluationTrace {
        match expr {
            Expression::And(l, r) => {
                let left_trace = self.evaluate_recursive(l);
                if !left_trace.get_outcome().is_truthy() {
                    return EvaluationTrace::BinaryOp {
                        op_symbol: "AND",
                        left: Box::new(left_trace),
                        right: Box::new(EvaluationTrace::NotEvaluated),
                        outcome: Value::Bool(false),
                    };
                }
                let right_trace = self.evaluate_recursive(r);
                let outcome = Value::Bool(right_trace.get_outcome().is_truthy());
                EvaluationTrace::BinaryOp {
                    op_symbol: "AND",
                    left: Box::new(left_trace),
                    right: Box::new(right_trace),
                    outcome,
                }
            }
            Expression::Or(l, r) => {
                let left_trace = self.evaluate_recursive(l);
                if left_trace.get_outcome().is_truthy() {
                    return EvaluationTrace::BinaryOp {
                        op_symbol: "OR",
                        left: Box::new(left_trace),
                        right: Box::new(EvaluationTrace::NotEvaluated),
                        outcome: Value::Bool(true),
                    };
                }
                let right_trace = self.evaluate_recursive(r);
                let outcome = Value::Bool(right_trace.get_outcome().is_truthy());
                EvaluationTrace::BinaryOp {
                    op_symbol: "OR",
                    left: Box::new(left_trace),
                    right: Box::new(right_trace),
                    outcome,
                }
            }
            Expression::Not(v) => {
                let child_trace = self.evaluate_recursive(v);
                let outcome = Value::Bool(!child_trace.get_outcome().is_truthy());
                EvaluationTrace::UnaryOp {
                    op_symbol: "NOT",
                    child: Box::new(child_trace),
                    outcome,
                }
            }
            Expression::Compare {
                op,
                kind,
                left,
                right,
            } => {
                let left_trace = self.evaluate_recursive(left);
                let right_trace = self.evaluate_recursive(right);
                let outcome = Value::Bool(op.evaluate(
                    *kind,
                    &left_trace.get_outcome(),
                    &right_trace.get_outcome(),
                ));
                EvaluationTrace::BinaryOp {
                    op_symbol: op.symbol(),
                    left: Box::new(left_trace),
                    right: Box::new(right_trace),
                    outcome,
                }
            }
            Expression::Literal(value) => EvaluationTrace::Leaf {
                source: value.to_string(),
                value: value.clone(),
            },
            Expression::Column(name) => EvaluationTrace::Leaf {
                source: format!("${}", name),
                value: self.cell(name).clone(),
            },
        }
    }
}
