use super::Value;
use crate::catalog::SemanticType;
use serde::{Deserialize, Serialize};
use std::fmt;

/// The comparison operators a formula may use.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum CompareOp {
    Equal,
    NotEqual,
    GreaterThan,
    GreaterThanOrEqual,
    SmallerThan,
    SmallerThanOrEqual,
}

impl CompareOp {
    pub fn symbol(&self) -> &'static str {
        match self {
            CompareOp::Equal => "==",
            CompareOp::NotEqual => "!=",
            CompareOp::GreaterThan => ">",
            CompareOp::GreaterThanOrEqual => ">=",
            CompareOp::SmallerThan => "<",
            CompareOp::SmallerThanOrEqual => "<=",
        }
    }

    /// `true` for `>`, `>=`, `<` and `<=`, which only make sense on numbers.
    pub fn is_ordering(&self) -> bool {
        !matches!(self, CompareOp::Equal | CompareOp::NotEqual)
    }

    /// The operator obtained by swapping the operands (`5 < Age` is `Age > 5`).
    pub fn flipped(&self) -> CompareOp {
        match self {
            CompareOp::GreaterThan => CompareOp::SmallerThan,
            CompareOp::GreaterThanOrEqual => CompareOp::SmallerThanOrEqual,
            CompareOp::SmallerThan => CompareOp::GreaterThan,
            CompareOp::SmallerThanOrEqual => CompareOp::GreaterThanOrEqual,
            other => *other,
        }
    }

    /// Compares two values after coercing both to `kind`.
    ///
    /// A side that is null or cannot be coerced makes the comparison `false`,
    /// for `!=` as much as for any other operator. Text never orders.
    pub fn evaluate(&self, kind: SemanticType, left: &Value, right: &Value) -> bool {
        match kind {
            SemanticType::Numeric => match (left.as_number(), right.as_number()) {
                (Some(l), Some(r)) => self.apply(&l, &r),
                _ => false,
            },
            SemanticType::Text => match (left.as_text(), right.as_text()) {
                (Some(l), Some(r)) if !self.is_ordering() => self.apply(l.as_ref(), r.as_ref()),
                _ => false,
            },
            SemanticType::Boolean => match (left.as_bool(), right.as_bool()) {
                (Some(l), Some(r)) => self.apply(&l, &r),
                _ => false,
            },
        }
    }

    fn apply<T: PartialOrd + ?Sized>(&self, l: &T, r: &T) -> bool {
        match self {
            CompareOp::Equal => l == r,
            CompareOp::NotEqual => l != r,
            CompareOp::GreaterThan => l > r,
            CompareOp::GreaterThanOrEqual => l >= r,
            CompareOp::SmallerThan => l < r,
            CompareOp::SmallerThanOrEqual => l <= r,
        }
    }
}

impl fmt::Display for CompareOp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.symbol())
    }
}

/// The closed Abstract Syntax Tree of a compiled formula.
///
/// Columns are always physical dataset column names; catalog identifiers are
/// resolved before the tree is built.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum Expression {
    // Logical
    Not(Box<Expression>),
    And(Box<Expression>, Box<Expression>),
    Or(Box<Expression>, Box<Expression>),

    // Comparison. `kind` decides how cells are coerced before comparing.
    Compare {
        op: CompareOp,
        kind: SemanticType,
        left: Box<Expression>,
        right: Box<Expression>,
    },

    // Leaf nodes
    Literal(Value),
    Column(String),
}

impl Expression {
    pub fn compare(op: CompareOp, kind: SemanticType, left: Expression, right: Expression) -> Self {
        Expression::Compare {
            op,
            kind,
            left: Box::new(left),
            right: Box::new(right),
        }
    }

    pub fn and(left: Expression, right: Expression) -> Self {
        Expression::And(Box::new(left), Box::new(right))
    }

    pub fn or(left: Expression, right: Expression) -> Self {
        Expression::Or(Box::new(left), Box::new(right))
    }

    pub fn negate(inner: Expression) -> Self {
        Expression::Not(Box::new(inner))
    }

    /// Collects every physical column referenced by the tree, in first-seen order.
    pub fn collect_columns(&self, columns: &mut Vec<String>) {
        match self {
            Expression::Column(name) => {
                if !columns.iter().any(|c| c == name) {
                    columns.push(name.clone());
                }
            }
            Expression::And(l, r)
            | Expression::Or(l, r)
            | Expression::Compare {
                left: l, right: r, ..
            } => {
                l.collect_columns(columns);
                r.collect_columns(columns);
            }
            Expression::Not(v) => v.collect_columns(columns),
            Expression::Literal(_) => {}
        }
    }

    /// Precedence level. Higher numbers bind more tightly.
    fn precedence(&self) -> u8 {
        match self {
            Expression::Or(_, _) => 1,
            Expression::And(_, _) => 2,
            Expression::Not(_) => 3,
            Expression::Compare { .. } => 4,
            Expression::Literal(_) | Expression::Column(_) => 5,
        }
    }

    /// Formats the tree in its canonical form.
    ///
    /// Comparisons nested inside a logical operator are always parenthesized;
    /// `AND` inside `OR` is parenthesized; chains of the same operator are not.
    fn fmt_canonical(&self, f: &mut fmt::Formatter<'_>, parent_precedence: u8) -> fmt::Result {
        let current = self.precedence();
        let needs_parens = match self {
            Expression::Compare { .. } => parent_precedence > 0,
            Expression::Literal(_) | Expression::Column(_) => false,
            Expression::And(_, _) | Expression::Or(_, _) => {
                parent_precedence > 0 && parent_precedence != current
            }
            Expression::Not(_) => current < parent_precedence,
        };

        if needs_parens {
            write!(f, "(")?;
        }

        match self {
            Expression::Or(l, r) => {
                l.fmt_canonical(f, current)?;
                write!(f, " OR ")?;
                r.fmt_canonical(f, current)?;
            }
            Expression::And(l, r) => {
                l.fmt_canonical(f, current)?;
                write!(f, " AND ")?;
                r.fmt_canonical(f, current)?;
            }
            Expression::Not(v) => {
                write!(f, "NOT ")?;
                // A nested logical operator under NOT always needs its own group.
                v.fmt_canonical(f, current + 1)?;
            }
            Expression::Compare {
                op, left, right, ..
            } => {
                left.fmt_canonical(f, current)?;
                write!(f, " {} ", op)?;
                right.fmt_canonical(f, current)?;
            }
            Expression::Literal(v) => write!(f, "{}", v)?,
            Expression::Column(name) => write!(f, "{}", name)?,
        }

        if needs_parens {
            write!(f, ")")?;
        }
        Ok(())
    }
}

impl fmt::Display for Expression {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.fmt_canonical(f, 0)
    }
}
