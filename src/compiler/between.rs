use super::lexer::{Token, TokenKind};
use crate::ast::CompareOp;
use crate::error::FormulaError;

/// Rewrites every `Field BETWEEN lo AND hi` into
/// `((Field >= lo) and (Field <= hi))`.
///
/// The outer group keeps the rewrite atomic under `not` and mixed `and`/`or`.
pub(super) fn desugar(tokens: Vec<Token>) -> Result<Vec<Token>, FormulaError> {
    if !tokens.iter().any(|t| t.kind == TokenKind::Between) {
        return Ok(tokens);
    }

    let mut out: Vec<Token> = Vec::with_capacity(tokens.len() + 8);
    let mut i = 0;
    while i < tokens.len() {
        let token = &tokens[i];
        if token.kind != TokenKind::Between {
            out.push(token.clone());
            i += 1;
            continue;
        }

        let between_pos = token.position;
        let field = match out.pop() {
            Some(t @ Token {
                kind: TokenKind::Ident(_),
                ..
            }) => t,
            _ => {
                return Err(FormulaError::MalformedBetween(format!(
                    "BETWEEN at position {} must follow a field name",
                    between_pos
                )));
            }
        };

        i += 1;
        let (low, low_pos) = take_bound(&tokens, &mut i).ok_or_else(|| {
            FormulaError::MalformedBetween(format!(
                "expected a numeric lower bound after BETWEEN at position {}",
                between_pos
            ))
        })?;

        match tokens.get(i) {
            Some(Token {
                kind: TokenKind::And,
                ..
            }) => i += 1,
            _ => {
                return Err(FormulaError::MalformedBetween(format!(
                    "expected AND between the bounds of BETWEEN at position {}",
                    between_pos
                )));
            }
        }

        let (high, high_pos) = take_bound(&tokens, &mut i).ok_or_else(|| {
            FormulaError::MalformedBetween(format!(
                "expected a numeric upper bound for BETWEEN at position {}",
                between_pos
            ))
        })?;

        let at = field.position;
        out.extend([
            Token::new(TokenKind::LParen, at),
            Token::new(TokenKind::LParen, at),
            field.clone(),
            Token::new(TokenKind::Op(CompareOp::GreaterThanOrEqual), between_pos),
            Token::new(TokenKind::Number(low), low_pos),
            Token::new(TokenKind::RParen, low_pos),
            Token::new(TokenKind::And, between_pos),
            Token::new(TokenKind::LParen, at),
            field,
            Token::new(TokenKind::Op(CompareOp::SmallerThanOrEqual), between_pos),
            Token::new(TokenKind::Number(high), high_pos),
            Token::new(TokenKind::RParen, high_pos),
            Token::new(TokenKind::RParen, high_pos),
        ]);
    }

    Ok(out)
}

/// Reads an optionally negated number literal starting at `*i`.
fn take_bound(tokens: &[Token], i: &mut usize) -> Option<(f64, usize)> {
    match tokens.get(*i).map(|t| (&t.kind, t.position)) {
        Some((TokenKind::Number(n), pos)) => {
            *i += 1;
            Some((*n, pos))
        }
        Some((TokenKind::Minus, pos)) => match tokens.get(*i + 1).map(|t| &t.kind) {
            Some(TokenKind::Number(n)) => {
                *i += 2;
                Some((-*n, pos))
            }
            _ => None,
        },
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::compiler::lexer::tokenize;

    fn desugared(text: &str) -> Result<Vec<TokenKind>, FormulaError> {
        desugar(tokenize(text).unwrap()).map(|ts| ts.into_iter().map(|t| t.kind).collect())
    }

    #[test]
    fn rewrites_into_inclusive_range() {
        let age = || TokenKind::Ident("Age".to_string());
        assert_eq!(
            desugared("Age between 30 AND 45").unwrap(),
            vec![
                TokenKind::LParen,
                TokenKind::LParen,
                age(),
                TokenKind::Op(CompareOp::GreaterThanOrEqual),
                TokenKind::Number(30.0),
                TokenKind::RParen,
                TokenKind::And,
                TokenKind::LParen,
                age(),
                TokenKind::Op(CompareOp::SmallerThanOrEqual),
                TokenKind::Number(45.0),
                TokenKind::RParen,
                TokenKind::RParen,
            ]
        );
    }

    #[test]
    fn handles_several_clauses_and_negative_bounds() {
        let kinds = desugared("Age BETWEEN 30 AND 45 or Rate BETWEEN -1 AND 0.5").unwrap();
        assert_eq!(kinds.iter().filter(|k| **k == TokenKind::Between).count(), 0);
        assert!(kinds.contains(&TokenKind::Number(-1.0)));
        assert!(kinds.contains(&TokenKind::Number(0.5)));
    }

    #[test]
    fn rejects_missing_bounds_and_non_field_operands() {
        for text in [
            "Age BETWEEN 30",
            "Age BETWEEN AND 45",
            "Age BETWEEN 30 45",
            "Age BETWEEN 30 AND",
            "Age BETWEEN 'a' AND 45",
            "BETWEEN 1 AND 2",
            "5 BETWEEN 1 AND 2",
            "(Age) BETWEEN 1 AND 2",
        ] {
            assert!(
                matches!(desugared(text), Err(FormulaError::MalformedBetween(_))),
                "{} should be malformed",
                text
            );
        }
    }
}
