use crate::ast::CompareOp;
use crate::catalog::SemanticType;
use crate::error::FormulaError;
use std::fmt;

#[derive(Debug, Clone, PartialEq)]
pub enum TokenKind {
    /// A bare word that is not a keyword. Replaced by `Column` during resolution.
    Ident(String),
    Column { name: String, kind: SemanticType },
    Number(f64),
    Str(String),
    Bool(bool),
    Op(CompareOp),
    And,
    Or,
    Not,
    Between,
    Minus,
    LParen,
    RParen,
}

impl fmt::Display for TokenKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TokenKind::Ident(name) => write!(f, "'{}'", name),
            TokenKind::Column { name, .. } => write!(f, "field '{}'", name),
            TokenKind::Number(n) => write!(f, "number {}", n),
            TokenKind::Str(s) => write!(f, "text '{}'", s),
            TokenKind::Bool(b) => write!(f, "'{}'", b),
            TokenKind::Op(op) => write!(f, "'{}'", op),
            TokenKind::And => write!(f, "'and'"),
            TokenKind::Or => write!(f, "'or'"),
            TokenKind::Not => write!(f, "'not'"),
            TokenKind::Between => write!(f, "'BETWEEN'"),
            TokenKind::Minus => write!(f, "'-'"),
            TokenKind::LParen => write!(f, "'('"),
            TokenKind::RParen => write!(f, "')'"),
        }
    }
}

/// A token and the character offset where it starts in the formula text.
#[derive(Debug, Clone, PartialEq)]
pub struct Token {
    pub kind: TokenKind,
    pub position: usize,
}

impl Token {
    pub fn new(kind: TokenKind, position: usize) -> Self {
        Self { kind, position }
    }
}

/// Counts parentheses outside string literals.
pub fn check_parentheses(text: &str) -> Result<(), FormulaError> {
    let (mut open, mut close) = (0usize, 0usize);
    let mut quote: Option<char> = None;
    let mut escaped = false;
    for c in text.chars() {
        if let Some(q) = quote {
            if escaped {
                escaped = false;
            } else if c == '\\' {
                escaped = true;
            } else if c == q {
                quote = None;
            }
            continue;
        }
        match c {
            '\'' | '"' => quote = Some(c),
            '(' => open += 1,
            ')' => close += 1,
            _ => {}
        }
    }
    if open != close {
        return Err(FormulaError::UnbalancedParentheses { open, close });
    }
    Ok(())
}

/// Splits a formula into tokens.
///
/// The glyphs `≠`, `≥` and `≤` are read as `!=`, `>=` and `<=`, and the
/// keywords `and`, `or`, `not`, `between`, `true` and `false` are matched in
/// any case. Positions refer to the text exactly as the operator wrote it.
pub fn tokenize(text: &str) -> Result<Vec<Token>, FormulaError> {
    let chars: Vec<char> = text.chars().collect();
    let mut tokens = Vec::new();
    let mut i = 0;

    while i < chars.len() {
        let c = chars[i];
        let start = i;

        if c.is_whitespace() {
            i += 1;
            continue;
        }

        let next = chars.get(i + 1).copied();
        let (kind, width) = match c {
            '(' => (TokenKind::LParen, 1),
            ')' => (TokenKind::RParen, 1),
            '-' => (TokenKind::Minus, 1),
            '≠' => (TokenKind::Op(CompareOp::NotEqual), 1),
            '≥' => (TokenKind::Op(CompareOp::GreaterThanOrEqual), 1),
            '≤' => (TokenKind::Op(CompareOp::SmallerThanOrEqual), 1),
            '=' if next == Some('=') => (TokenKind::Op(CompareOp::Equal), 2),
            '=' => (TokenKind::Op(CompareOp::Equal), 1),
            '!' if next == Some('=') => (TokenKind::Op(CompareOp::NotEqual), 2),
            '!' => return Err(FormulaError::syntax(start, "unexpected '!', did you mean '!='?")),
            '>' if next == Some('=') => (TokenKind::Op(CompareOp::GreaterThanOrEqual), 2),
            '>' => (TokenKind::Op(CompareOp::GreaterThan), 1),
            '<' if next == Some('=') => (TokenKind::Op(CompareOp::SmallerThanOrEqual), 2),
            '<' => (TokenKind::Op(CompareOp::SmallerThan), 1),
            '&' if next == Some('&') => (TokenKind::And, 2),
            '&' => (TokenKind::And, 1),
            '|' if next == Some('|') => (TokenKind::Or, 2),
            '|' => (TokenKind::Or, 1),
            '~' => (TokenKind::Not, 1),
            '\'' | '"' => {
                let (value, end) = lex_string(&chars, start)?;
                tokens.push(Token::new(TokenKind::Str(value), start));
                i = end;
                continue;
            }
            c if c.is_ascii_digit() || (c == '.' && next.is_some_and(|n| n.is_ascii_digit())) => {
                let (value, end) = lex_number(&chars, start)?;
                tokens.push(Token::new(TokenKind::Number(value), start));
                i = end;
                continue;
            }
            c if c.is_alphabetic() || c == '_' => {
                let end = scan_while(&chars, start, |c| c.is_alphanumeric() || c == '_');
                let word: String = chars[start..end].iter().collect();
                tokens.push(Token::new(keyword_or_ident(word), start));
                i = end;
                continue;
            }
            other => {
                return Err(FormulaError::syntax(
                    start,
                    format!("unexpected character '{}'", other),
                ));
            }
        };

        tokens.push(Token::new(kind, start));
        i += width;
    }

    Ok(tokens)
}

/// Whether `name` lexes as a single identifier, i.e. can be written in a formula.
pub fn is_identifier(name: &str) -> bool {
    let mut chars = name.chars();
    let starts_well = chars.next().is_some_and(|c| c.is_alphabetic() || c == '_');
    starts_well
        && chars.all(|c| c.is_alphanumeric() || c == '_')
        && matches!(keyword_or_ident(name.to_string()), TokenKind::Ident(_))
}

fn keyword_or_ident(word: String) -> TokenKind {
    match word.to_ascii_lowercase().as_str() {
        "and" => TokenKind::And,
        "or" => TokenKind::Or,
        "not" => TokenKind::Not,
        "between" => TokenKind::Between,
        "true" => TokenKind::Bool(true),
        "false" => TokenKind::Bool(false),
        _ => TokenKind::Ident(word),
    }
}

fn scan_while(chars: &[char], start: usize, pred: impl Fn(char) -> bool) -> usize {
    let mut end = start;
    while end < chars.len() && pred(chars[end]) {
        end += 1;
    }
    end
}

fn lex_number(chars: &[char], start: usize) -> Result<(f64, usize), FormulaError> {
    let mut end = scan_while(chars, start, |c| c.is_ascii_digit());
    if chars.get(end) == Some(&'.') {
        end = scan_while(chars, end + 1, |c| c.is_ascii_digit());
    }
    // `60abc`, `1.2.3` and friends are typos, not two adjacent tokens.
    if let Some(&c) = chars.get(end) {
        if c.is_alphanumeric() || c == '_' || c == '.' {
            let bad_end = scan_while(chars, end, |c| c.is_alphanumeric() || c == '_' || c == '.');
            let literal: String = chars[start..bad_end].iter().collect();
            return Err(FormulaError::syntax(
                start,
                format!("invalid numeric literal '{}'", literal),
            ));
        }
    }
    let literal: String = chars[start..end].iter().collect();
    match literal.parse::<f64>() {
        Ok(value) if value.is_finite() => Ok((value, end)),
        _ => Err(FormulaError::syntax(
            start,
            format!("invalid numeric literal '{}'", literal),
        )),
    }
}

fn lex_string(chars: &[char], start: usize) -> Result<(String, usize), FormulaError> {
    let quote = chars[start];
    let mut value = String::new();
    let mut i = start + 1;
    while i < chars.len() {
        match chars[i] {
            '\\' if i + 1 < chars.len() => {
                value.push(chars[i + 1]);
                i += 2;
            }
            c if c == quote => return Ok((value, i + 1)),
            c => {
                value.push(c);
                i += 1;
            }
        }
    }
    Err(FormulaError::syntax(start, "unterminated string literal"))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn kinds(text: &str) -> Vec<TokenKind> {
        tokenize(text).unwrap().into_iter().map(|t| t.kind).collect()
    }

    #[test]
    fn reads_glyphs_as_ascii_operators() {
        assert_eq!(
            kinds("Age ≥ 60 ≠ ≤"),
            vec![
                TokenKind::Ident("Age".to_string()),
                TokenKind::Op(CompareOp::GreaterThanOrEqual),
                TokenKind::Number(60.0),
                TokenKind::Op(CompareOp::NotEqual),
                TokenKind::Op(CompareOp::SmallerThanOrEqual),
            ]
        );
    }

    #[test]
    fn keywords_are_case_insensitive() {
        assert_eq!(
            kinds("AND and Or BETWEEN Not TRUE false"),
            vec![
                TokenKind::And,
                TokenKind::And,
                TokenKind::Or,
                TokenKind::Between,
                TokenKind::Not,
                TokenKind::Bool(true),
                TokenKind::Bool(false),
            ]
        );
    }

    #[test]
    fn identifiers_are_whole_words() {
        assert_eq!(
            kinds("AverageAge Age_2"),
            vec![
                TokenKind::Ident("AverageAge".to_string()),
                TokenKind::Ident("Age_2".to_string()),
            ]
        );
    }

    #[test]
    fn identifier_names() {
        assert!(is_identifier("Age"));
        assert!(is_identifier("_Median_2"));
        assert!(!is_identifier(""));
        assert!(!is_identifier("2Fast"));
        assert!(!is_identifier("Home Value"));
        assert!(!is_identifier("Home-Value"));
        assert!(!is_identifier("Between"));
        assert!(!is_identifier("TRUE"));
    }

    #[test]
    fn string_literals_keep_glyphs_and_escapes() {
        assert_eq!(
            kinds(r#"'it\'s ≠' "(x""#),
            vec![
                TokenKind::Str("it's ≠".to_string()),
                TokenKind::Str("(x".to_string()),
            ]
        );
    }

    #[test]
    fn positions_are_character_offsets() {
        let tokens = tokenize("Rate ≤ 0.065").unwrap();
        let positions: Vec<usize> = tokens.iter().map(|t| t.position).collect();
        assert_eq!(positions, vec![0, 5, 7]);
    }

    #[test]
    fn rejects_malformed_numbers() {
        let err = tokenize("Age > 60abc").unwrap_err();
        assert_eq!(
            err,
            FormulaError::SyntaxError {
                position: 6,
                message: "invalid numeric literal '60abc'".to_string()
            }
        );
        assert!(tokenize("Rate > 1.2.3").is_err());
    }

    #[test]
    fn rejects_numbers_too_large_for_f64() {
        let huge = format!("1{}", "0".repeat(400));
        let err = tokenize(&format!("Age < {}", huge)).unwrap_err();
        assert_eq!(
            err,
            FormulaError::SyntaxError {
                position: 6,
                message: format!("invalid numeric literal '{}'", huge)
            }
        );
        assert!(tokenize(&format!("Age < 1{}", "0".repeat(300))).is_ok());
    }

    #[test]
    fn rejects_unterminated_strings_and_stray_characters() {
        assert!(matches!(
            tokenize("EmploymentStatus == 'Retired"),
            Err(FormulaError::SyntaxError { position: 20, .. })
        ));
        assert!(matches!(
            tokenize("Age > $5"),
            Err(FormulaError::SyntaxError { position: 6, .. })
        ));
    }

    #[test]
    fn parentheses_inside_strings_are_ignored() {
        assert!(check_parentheses("(Age > 5) and EmploymentStatus == ')'").is_ok());
        assert_eq!(
            check_parentheses("((Age > 5)"),
            Err(FormulaError::UnbalancedParentheses { open: 2, close: 1 })
        );
    }
}
