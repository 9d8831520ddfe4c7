//! Prelude module for convenient imports
//!
//! This module re-exports the most commonly used types from the crate.
//!
//! # Example
//!
//! ```rust,no_run
//! use segment_formula::prelude::*;
//!
//! # fn run_example() -> Result<()> {
//! let catalog = FieldCatalog::from_file("path/to/catalog.json")?;
//! let raw = Dataset::from_file("path/to/homeowners.json")?;
//! let dataset = prepare(raw, &PreparationConfig::default())?;
//!
//! let store = JsonFileStore::new("path/to/segments.json");
//! for outcome in refresh_all(&store, &catalog, &dataset)? {
//!     println!("{}: {:?}", outcome.id, outcome.result);
//! }
//! # Ok(())
//! # }
//! ```

// Core compilation and evaluation
pub use crate::compiler::{Compiler, Predicate, compile};
pub use crate::evaluator::{EvaluationResult, Evaluator, RowExplanation, evaluate};

// Catalog
pub use crate::catalog::{CatalogBuilder, FieldCatalog, FieldDescriptor, SemanticType};

// AST and expression types
pub use crate::ast::{CompareOp, EvaluationTrace, Expression, Value};

// Data structures
pub use crate::data::{Dataset, PreparationConfig, prepare};

// Segments
pub use crate::segment::{
    JsonFileStore, MemoryStore, RefreshOutcome, Segment, SegmentStore, ValidationReport,
    refresh_all, refresh_count, validate,
};

// Error types
pub use crate::error::{
    CatalogError, DatasetError, EvaluationError, FormulaError, SegmentError, StoreError,
};

// Trace formatting
pub use crate::trace::TraceFormatter;

// Result type alias for convenience
pub type Result<T> = std::result::Result<T, Box<dyn std::error::Error>>;
