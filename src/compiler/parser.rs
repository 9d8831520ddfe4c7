use super::lexer::{Token, TokenKind};
use crate::ast::{CompareOp, Expression, Value};
use crate::catalog::SemanticType;
use crate::error::FormulaError;

/// Deepest tree a formula may produce. Every pass after parsing walks the tree
/// recursively, so this bounds their stack use as well.
pub(super) const MAX_DEPTH: usize = 256;

/// A parsed operand together with the type the compiler inferred for it.
struct Operand {
    expr: Expression,
    kind: SemanticType,
    position: usize,
}

/// Recursive-descent parser over resolved tokens.
///
/// `or` binds loosest, then `and`, then `not`, then comparisons.
pub(super) struct Parser<'a> {
    tokens: &'a [Token],
    pos: usize,
    /// Character length of the formula, reported for errors at end of input.
    end: usize,
    /// Open `(` groups and `not`s on the current parse path.
    nesting: usize,
}

impl<'a> Parser<'a> {
    pub(super) fn new(tokens: &'a [Token], end: usize) -> Self {
        Self {
            tokens,
            pos: 0,
            end,
            nesting: 0,
        }
    }

    pub(super) fn parse(mut self) -> Result<Expression, FormulaError> {
        let (expr, _) = self.parse_or()?;
        match self.peek() {
            None => Ok(expr),
            Some(token) => Err(FormulaError::syntax(
                token.position,
                format!("unexpected {} after a complete condition", token.kind),
            )),
        }
    }

    fn peek(&self) -> Option<&'a Token> {
        self.tokens.get(self.pos)
    }

    fn advance(&mut self) -> Option<&'a Token> {
        let token = self.tokens.get(self.pos);
        if token.is_some() {
            self.pos += 1;
        }
        token
    }

    /// Consumes the next token if it is `kind`, returning its position.
    fn eat(&mut self, kind: &TokenKind) -> Option<usize> {
        let position = self.peek().filter(|t| &t.kind == kind)?.position;
        self.pos += 1;
        Some(position)
    }

    fn enter(&mut self, position: usize) -> Result<(), FormulaError> {
        self.nesting += 1;
        if self.nesting > MAX_DEPTH {
            return Err(too_deep(position));
        }
        Ok(())
    }

    // Each parse step returns the expression with the depth of its tree.

    fn parse_or(&mut self) -> Result<(Expression, usize), FormulaError> {
        let (mut expr, mut depth) = self.parse_and()?;
        while let Some(position) = self.eat(&TokenKind::Or) {
            let (rhs, rhs_depth) = self.parse_and()?;
            depth = parent_depth(depth.max(rhs_depth), position)?;
            expr = Expression::or(expr, rhs);
        }
        Ok((expr, depth))
    }

    fn parse_and(&mut self) -> Result<(Expression, usize), FormulaError> {
        let (mut expr, mut depth) = self.parse_not()?;
        while let Some(position) = self.eat(&TokenKind::And) {
            let (rhs, rhs_depth) = self.parse_not()?;
            depth = parent_depth(depth.max(rhs_depth), position)?;
            expr = Expression::and(expr, rhs);
        }
        Ok((expr, depth))
    }

    fn parse_not(&mut self) -> Result<(Expression, usize), FormulaError> {
        if let Some(position) = self.eat(&TokenKind::Not) {
            self.enter(position)?;
            let (inner, depth) = self.parse_not()?;
            self.nesting -= 1;
            return Ok((Expression::negate(inner), parent_depth(depth, position)?));
        }
        self.parse_condition()
    }

    fn parse_condition(&mut self) -> Result<(Expression, usize), FormulaError> {
        if let Some(position) = self.eat(&TokenKind::LParen) {
            self.enter(position)?;
            let inner = self.parse_or()?;
            self.nesting -= 1;
            return match self.advance() {
                Some(Token {
                    kind: TokenKind::RParen,
                    ..
                }) => Ok(inner),
                Some(token) => Err(FormulaError::syntax(
                    token.position,
                    format!("expected ')' but found {}", token.kind),
                )),
                None => Err(FormulaError::syntax(self.end, "expected ')' before end of formula")),
            };
        }

        let left = self.parse_operand()?;
        let (op, op_position) = match self.peek() {
            Some(Token {
                kind: TokenKind::Op(op),
                position,
            }) => (*op, *position),
            _ => return Ok((bare_condition(left)?, 1)),
        };
        self.pos += 1;
        let right = self.parse_operand()?;
        Ok((build_comparison(op, op_position, left, right)?, 2))
    }

    fn parse_operand(&mut self) -> Result<Operand, FormulaError> {
        let token = self.advance().ok_or_else(|| {
            FormulaError::syntax(self.end, "unexpected end of formula; expected a field or value")
        })?;
        let position = token.position;
        let (expr, kind) = match &token.kind {
            TokenKind::Column { name, kind } => (Expression::Column(name.clone()), *kind),
            TokenKind::Number(n) => (Expression::Literal(Value::Number(*n)), SemanticType::Numeric),
            TokenKind::Str(s) => (Expression::Literal(Value::Text(s.clone())), SemanticType::Text),
            TokenKind::Bool(b) => (Expression::Literal(Value::Bool(*b)), SemanticType::Boolean),
            TokenKind::Minus => match self.advance() {
                Some(Token {
                    kind: TokenKind::Number(n),
                    ..
                }) => (Expression::Literal(Value::Number(-*n)), SemanticType::Numeric),
                _ => return Err(FormulaError::syntax(position, "expected a number after '-'")),
            },
            other => {
                return Err(FormulaError::syntax(
                    position,
                    format!("expected a field or value but found {}", other),
                ));
            }
        };
        Ok(Operand {
            expr,
            kind,
            position,
        })
    }
}

fn too_deep(position: usize) -> FormulaError {
    FormulaError::syntax(position, "formula nests too deeply")
}

/// Depth of a node whose deepest child has depth `child`.
fn parent_depth(child: usize, position: usize) -> Result<usize, FormulaError> {
    let depth = child + 1;
    if depth > MAX_DEPTH {
        return Err(too_deep(position));
    }
    Ok(depth)
}

/// An operand with no comparison is only a condition when it is boolean.
fn bare_condition(operand: Operand) -> Result<Expression, FormulaError> {
    if operand.kind == SemanticType::Boolean {
        return Ok(operand.expr);
    }
    Err(FormulaError::syntax(
        operand.position,
        format!(
            "expected a comparison operator after {}",
            describe(&operand.expr)
        ),
    ))
}

fn build_comparison(
    op: CompareOp,
    op_position: usize,
    left: Operand,
    right: Operand,
) -> Result<Expression, FormulaError> {
    use SemanticType::*;

    let kind = match (left.kind, right.kind) {
        (Numeric, Numeric) | (Numeric, Boolean) | (Boolean, Numeric) => Numeric,
        (Text, Text) => Text,
        (Boolean, Boolean) => Boolean,
        (l, r) => {
            return Err(FormulaError::syntax(
                op_position,
                format!("cannot compare a {} value with a {} value", l, r),
            ));
        }
    };
    if op.is_ordering() && kind != Numeric {
        return Err(FormulaError::syntax(
            op_position,
            format!("operator '{}' needs numeric operands, found {} values", op, kind),
        ));
    }

    // Keep the column on the left: `60 <= Age` reads as `Age >= 60`.
    let flip = matches!(left.expr, Expression::Literal(_))
        && matches!(right.expr, Expression::Column(_));
    Ok(if flip {
        Expression::compare(op.flipped(), kind, right.expr, left.expr)
    } else {
        Expression::compare(op, kind, left.expr, right.expr)
    })
}

fn describe(expr: &Expression) -> String {
    match expr {
        Expression::Column(name) => format!("field '{}'", name),
        Expression::Literal(v) => format!("value {}", v),
        other => other.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn col(name: &str, kind: SemanticType, position: usize) -> Token {
        Token::new(
            TokenKind::Column {
                name: name.to_string(),
                kind,
            },
            position,
        )
    }

    fn num(n: f64, position: usize) -> Token {
        Token::new(TokenKind::Number(n), position)
    }

    fn op(op: CompareOp, position: usize) -> Token {
        Token::new(TokenKind::Op(op), position)
    }

    #[test]
    fn literal_on_the_left_is_flipped() {
        let tokens = [
            num(60.0, 0),
            op(CompareOp::SmallerThanOrEqual, 3),
            col("AGE", SemanticType::Numeric, 6),
        ];
        let expr = Parser::new(&tokens, 9).parse().unwrap();
        assert_eq!(
            expr,
            Expression::compare(
                CompareOp::GreaterThanOrEqual,
                SemanticType::Numeric,
                Expression::Column("AGE".to_string()),
                Expression::Literal(Value::Number(60.0)),
            )
        );
    }

    #[test]
    fn bare_boolean_field_is_a_condition() {
        let tokens = [col("IS_OWNER", SemanticType::Boolean, 0)];
        assert_eq!(
            Parser::new(&tokens, 7).parse().unwrap(),
            Expression::Column("IS_OWNER".to_string())
        );
    }

    #[test]
    fn bare_numeric_field_is_rejected() {
        let tokens = [col("AGE", SemanticType::Numeric, 0)];
        assert_eq!(
            Parser::new(&tokens, 3).parse().unwrap_err(),
            FormulaError::syntax(0, "expected a comparison operator after field 'AGE'")
        );
    }

    #[test]
    fn ordering_on_text_is_rejected() {
        let tokens = [
            col("EMPLOYMENT_STATUS", SemanticType::Text, 0),
            op(CompareOp::GreaterThan, 17),
            Token::new(TokenKind::Str("A".to_string()), 19),
        ];
        assert!(matches!(
            Parser::new(&tokens, 22).parse(),
            Err(FormulaError::SyntaxError { position: 17, .. })
        ));
    }

    #[test]
    fn nesting_is_bounded() {
        let mut tokens: Vec<Token> = (0..MAX_DEPTH + 1)
            .map(|i| Token::new(TokenKind::Not, i * 4))
            .collect();
        tokens.push(col("IS_OWNER", SemanticType::Boolean, tokens.len() * 4));
        assert_eq!(
            Parser::new(&tokens, tokens.len() * 4 + 8).parse().unwrap_err(),
            FormulaError::syntax(MAX_DEPTH * 4, "formula nests too deeply")
        );

        let shallow = &tokens[MAX_DEPTH - 8..];
        assert!(Parser::new(shallow, 2048).parse().is_ok());
    }

    #[test]
    fn missing_right_operand_reports_end_of_input() {
        let tokens = [
            col("AGE", SemanticType::Numeric, 0),
            op(CompareOp::GreaterThan, 4),
        ];
        assert!(matches!(
            Parser::new(&tokens, 5).parse(),
            Err(FormulaError::SyntaxError { position: 5, .. })
        ));
    }
}
