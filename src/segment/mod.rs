//! Segments: named formulas with a cached match count, their persistence, and
//! the operator-facing validation call.

mod model;
mod store;
mod validate;

pub use model::*;
pub use store::*;
pub use validate::*;

use crate::catalog::FieldCatalog;
use crate::data::Dataset;
use crate::error::{SegmentError, StoreError};
use crate::evaluator::{self, EvaluationResult};

/// The outcome of refreshing one segment.
#[derive(Debug)]
pub struct RefreshOutcome {
    pub id: String,
    /// The new count, or why the old one was kept.
    pub result: Result<usize, SegmentError>,
}

/// Recompiles the segment's formula and re-runs it against `dataset`.
///
/// `count` is only updated on success. A failure leaves the cached count as it
/// was, so "matched nothing" and "could not be evaluated" stay distinct.
pub fn refresh_count(
    segment: &mut Segment,
    catalog: &FieldCatalog,
    dataset: &Dataset,
) -> Result<EvaluationResult, SegmentError> {
    let predicate = segment.predicate(catalog)?;
    let result = evaluator::evaluate(&predicate, dataset)?;
    segment.count = Some(result.match_count);
    Ok(result)
}

/// Refreshes every segment in the store and saves the updated counts.
pub fn refresh_all<S>(
    store: &S,
    catalog: &FieldCatalog,
    dataset: &Dataset,
) -> Result<Vec<RefreshOutcome>, StoreError>
where
    S: SegmentStore + ?Sized,
{
    let mut segments = store.load_segments()?;
    let outcomes = segments
        .iter_mut()
        .map(|segment| {
            let result = refresh_count(segment, catalog, dataset).map(|r| r.match_count);
            if let Err(e) = &result {
                log::warn!("Segment '{}' kept its previous count: {}", segment.id, e);
            }
            RefreshOutcome {
                id: segment.id.clone(),
                result,
            }
        })
        .collect();
    store.save_segments(&segments)?;
    Ok(outcomes)
}
