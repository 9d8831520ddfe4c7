use crate::ast::{EvaluationTrace, Value};

/// Formats evaluation traces into human-readable strings
pub struct TraceFormatter;

impl TraceFormatter {
    /// Format an evaluation trace into a human-readable explanation.
    ///
    /// Columns are shown with the cell they held, e.g. `$AGE (was 62) >= 60`.
    pub fn format_trace(trace: &EvaluationTrace) -> String {
        Self::format_recursive(trace, 0)
    }

    fn format_recursive(trace: &EvaluationTrace, parent_precedence: u8) -> String {
        let current_precedence = trace.precedence();
        let needs_parens = current_precedence < parent_precedence;

        let mut result = String::new();
        if needs_parens {
            result.push('(');
        }

        match trace {
            EvaluationTrace::BinaryOp {
                op_symbol,
                left,
                right,
                ..
            } => {
                let left_str = Self::format_recursive(left, current_precedence);
                if matches!(**right, EvaluationTrace::NotEvaluated) {
                    // Short-circuited: the left side alone decided the outcome.
                    result.push_str(&left_str);
                } else {
                    let right_str = Self::format_recursive(right, current_precedence);
                    result.push_str(&format!("{} {} {}", left_str, op_symbol, right_str));
                }
            }
            EvaluationTrace::UnaryOp {
                op_symbol, child, ..
            } => {
                // Only a single cell stays ungrouped under NOT.
                let child_str = Self::format_recursive(child, 5);
                result.push_str(&format!("{} {}", op_symbol, child_str));
            }
            EvaluationTrace::Leaf { source, value } => {
                if source.starts_with('$') {
                    result.push_str(&format!("{} (was {})", source, Self::format_value(value)));
                } else {
                    result.push_str(source);
                }
            }
            EvaluationTrace::NotEvaluated => {}
        }

        if needs_parens {
            result.push(')');
        }
        result
    }

    fn format_value(value: &Value) -> String {
        match value {
            Value::Null => "missing".to_string(),
            other => other.to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn column(name: &str, value: Value) -> EvaluationTrace {
        EvaluationTrace::Leaf {
            source: format!("${}", name),
            value,
        }
    }

    fn literal(value: Value) -> EvaluationTrace {
        EvaluationTrace::Leaf {
            source: value.to_string(),
            value,
        }
    }

    fn compare(
        op: &'static str,
        left: EvaluationTrace,
        right: EvaluationTrace,
        outcome: bool,
    ) -> EvaluationTrace {
        EvaluationTrace::BinaryOp {
            op_symbol: op,
            left: Box::new(left),
            right: Box::new(right),
            outcome: Value::Bool(outcome),
        }
    }

    #[test]
    fn shows_cell_values_and_missing_cells() {
        let trace = compare(
            "AND",
            compare(">=", column("AGE", Value::Number(62.0)), literal(Value::Number(60.0)), true),
            compare(">=", column("EQUITY", Value::Null), literal(Value::Number(200000.0)), false),
            false,
        );
        assert_eq!(
            TraceFormatter::format_trace(&trace),
            "$AGE (was 62) >= 60 AND $EQUITY (was missing) >= 200000"
        );
    }

    #[test]
    fn short_circuit_hides_the_unevaluated_side() {
        let trace = EvaluationTrace::BinaryOp {
            op_symbol: "OR",
            left: Box::new(compare(
                "==",
                column("EMPLOYMENT_STATUS", Value::from("Retired")),
                literal(Value::from("Retired")),
                true,
            )),
            right: Box::new(EvaluationTrace::NotEvaluated),
            outcome: Value::Bool(true),
        };
        assert_eq!(
            TraceFormatter::format_trace(&trace),
            "$EMPLOYMENT_STATUS (was 'Retired') == 'Retired'"
        );
    }

    #[test]
    fn groups_operands_of_not() {
        let trace = EvaluationTrace::UnaryOp {
            op_symbol: "NOT",
            child: Box::new(compare(
                "<",
                column("AGE", Value::Number(45.0)),
                literal(Value::Number(50.0)),
                true,
            )),
            outcome: Value::Bool(false),
        };
        assert_eq!(
            TraceFormatter::format_trace(&trace),
            "NOT ($AGE (was 45) < 50)"
        );
    }
}
