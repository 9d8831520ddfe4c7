use crate::ast::EvaluationTrace;
use crate::compiler::Predicate;
use crate::data::Dataset;
use crate::error::EvaluationError;
use crate::trace::TraceFormatter;
use rayon::prelude::*;
use serde::Serialize;

mod engine;

use engine::AstEngine;

/// The result of an evaluation run.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct EvaluationResult {
    /// Number of rows the predicate matched.
    pub match_count: usize,
    /// Indices of the matching rows, ascending.
    pub matched_row_indices: Vec<usize>,
}

/// Why a single row did or did not match.
#[derive(Debug, Clone)]
pub struct RowExplanation {
    pub row: usize,
    pub matched: bool,
    /// A human-readable rendering of `trace`.
    pub reason: String,
    pub trace: EvaluationTrace,
}

/// Evaluates compiled predicates against one dataset.
///
/// An `Evaluator` only borrows the dataset and can be shared across threads to
/// run several predicates concurrently.
pub struct Evaluator<'a> {
    dataset: &'a Dataset,
}

impl<'a> Evaluator<'a> {
    pub fn new(dataset: &'a Dataset) -> Self {
        Self { dataset }
    }

    /// Fails with [`EvaluationError::MissingColumn`] for the first column the
    /// predicate needs that the dataset lacks.
    pub fn check_columns(&self, predicate: &Predicate) -> Result<(), EvaluationError> {
        match predicate
            .columns()
            .iter()
            .find(|c| !self.dataset.has_column(c))
        {
            Some(missing) => Err(EvaluationError::MissingColumn(missing.clone())),
            None => Ok(()),
        }
    }

    /// Evaluates the predicate on every row in parallel.
    ///
    /// Missing or non-coercible cells make the comparison they appear in
    /// false; they never abort the run. Only an absent column does.
    pub fn evaluate(&self, predicate: &Predicate) -> Result<EvaluationResult, EvaluationError> {
        self.check_columns(predicate)?;

        let expression = predicate.expression();
        let matched_row_indices: Vec<usize> = (0..self.dataset.row_count())
            .into_par_iter()
            .filter(|&row| AstEngine::new(expression, self.dataset, row).matches())
            .collect();

        log::info!(
            "Formula '{}' matched {} of {} rows",
            predicate.source().trim(),
            matched_row_indices.len(),
            self.dataset.row_count()
        );

        Ok(EvaluationResult {
            match_count: matched_row_indices.len(),
            matched_row_indices,
        })
    }

    /// Evaluates a single row and records how each condition came out.
    pub fn explain(
        &self,
        predicate: &Predicate,
        row: usize,
    ) -> Result<RowExplanation, EvaluationError> {
        self.check_columns(predicate)?;
        let rows = self.dataset.row_count();
        if row >= rows {
            return Err(EvaluationError::RowOutOfBounds { row, rows });
        }

        let trace = AstEngine::new(predicate.expression(), self.dataset, row).evaluate();
        Ok(RowExplanation {
            row,
            matched: trace.get_outcome().is_truthy(),
            reason: TraceFormatter::format_trace(&trace),
            trace,
        })
    }
}

/// Evaluates `predicate` against `dataset`.
pub fn evaluate(
    predicate: &Predicate,
    dataset: &Dataset,
) -> Result<EvaluationResult, EvaluationError> {
    Evaluator::new(dataset).evaluate(predicate)
}
