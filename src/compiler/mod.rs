//! Turns operator-authored formula text into a [`Predicate`].
//!
//! The pipeline is: blank check, parenthesis balance, tokenizing (glyph
//! synonyms included), `BETWEEN` desugaring, identifier resolution through the
//! [`FieldCatalog`], recursive-descent parsing with type checks, and finally
//! the [`AstOptimizer`]. Operator text is never evaluated directly; the only
//! executable form is the closed [`Expression`] tree.

use crate::ast::Expression;
use crate::catalog::FieldCatalog;
use crate::error::FormulaError;
use serde::Serialize;
use std::fmt;

mod between;
pub mod lexer;
mod optimizer;
mod parser;

use lexer::{Token, TokenKind};
pub use optimizer::AstOptimizer;
use parser::Parser;

/// A compiled formula. Immutable and cheap to share between threads.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Predicate {
    source: String,
    expression: Expression,
    columns: Vec<String>,
}

impl Predicate {
    /// The formula text exactly as it was compiled.
    pub fn source(&self) -> &str {
        &self.source
    }

    pub fn expression(&self) -> &Expression {
        &self.expression
    }

    /// Every physical column the formula mentions, in first-seen order.
    ///
    /// Recorded before optimization, so a column that folds away is still
    /// required to exist in the dataset.
    pub fn columns(&self) -> &[String] {
        &self.columns
    }

    /// Canonical, fully parenthesized rendering used for operator confirmation.
    pub fn normalized_form(&self) -> String {
        self.expression.to_string()
    }
}

impl fmt::Display for Predicate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.expression)
    }
}

/// Compiles formulas against one field catalog.
pub struct Compiler<'a> {
    catalog: &'a FieldCatalog,
    optimize: bool,
}

impl<'a> Compiler<'a> {
    pub fn new(catalog: &'a FieldCatalog) -> Self {
        Self {
            catalog,
            optimize: true,
        }
    }

    /// Disables the optimizer, keeping the tree exactly as parsed.
    pub fn with_optimizations(mut self, enabled: bool) -> Self {
        self.optimize = enabled;
        self
    }

    pub fn compile(&self, text: &str) -> Result<Predicate, FormulaError> {
        if text.trim().is_empty() {
            return Err(FormulaError::EmptyFormula);
        }
        lexer::check_parentheses(text)?;

        let tokens = lexer::tokenize(text)?;
        let tokens = between::desugar(tokens)?;
        let tokens = self.resolve_identifiers(tokens)?;

        let parsed = Parser::new(&tokens, text.chars().count()).parse()?;
        let mut columns = Vec::new();
        parsed.collect_columns(&mut columns);

        let expression = if self.optimize {
            let mut optimizer = AstOptimizer::new();
            let optimized = optimizer.optimize(parsed);
            log::debug!(
                "Optimized formula '{}' in {} pass(es)",
                text.trim(),
                optimizer.passes()
            );
            optimized
        } else {
            parsed
        };

        log::debug!("Compiled '{}' into {}", text.trim(), expression);
        Ok(Predicate {
            source: text.to_string(),
            expression,
            columns,
        })
    }

    /// Replaces every identifier token with the physical column it names.
    ///
    /// Identifiers are whole tokens, so `Age` can never match inside `AverageAge`.
    fn resolve_identifiers(&self, tokens: Vec<Token>) -> Result<Vec<Token>, FormulaError> {
        tokens
            .into_iter()
            .map(|Token { kind, position }| match kind {
                TokenKind::Ident(name) => match self.catalog.resolve(&name) {
                    Some((column, kind)) => Ok(Token::new(
                        TokenKind::Column {
                            name: column.to_string(),
                            kind,
                        },
                        position,
                    )),
                    None => Err(FormulaError::UnresolvedIdentifier(name)),
                },
                other => Ok(Token::new(other, position)),
            })
            .collect()
    }
}

/// Compiles `text` against `catalog` with the default settings.
pub fn compile(text: &str, catalog: &FieldCatalog) -> Result<Predicate, FormulaError> {
    Compiler::new(catalog).compile(text)
}
