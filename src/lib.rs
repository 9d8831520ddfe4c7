//! # segment-formula - Audience Segment Formula Engine
//!
//! **segment-formula** compiles operator-authored boolean formulas over homeowner
//! attributes into a closed Abstract Syntax Tree and evaluates them against a
//! tabular dataset. Formula text is never handed to a general-purpose
//! evaluator: it is tokenized, desugared, resolved against a [`FieldCatalog`]
//! and parsed into an [`Expression`](ast::Expression) that the evaluator walks.
//!
//! ## Core Workflow
//!
//! 1.  **Describe Your Fields**: Use [`FieldCatalog::default`] or load one from JSON.
//!     The catalog maps formula identifiers (`Age`, `Equity`) to dataset columns.
//! 2.  **Load Your Data**: Build a [`Dataset`](data::Dataset) from JSON records and,
//!     for raw exports, run [`prepare`](data::prepare) to derive `EQUITY` and friends.
//! 3.  **Compile**: [`Compiler::compile`] turns the formula into a [`Predicate`].
//! 4.  **Evaluate**: [`Evaluator::evaluate`] returns the match count and matching rows;
//!     [`Evaluator::explain`] tells you why a single row matched.
//!
//! ## Quick Start
//!
//! ```rust
//! use segment_formula::prelude::*;
//!
//! fn main() -> Result<()> {
//!     let catalog = FieldCatalog::default();
//!     let dataset = Dataset::from_json(
//!         r#"[
//!             {"AGE": 58, "EQUITY": 210000},
//!             {"AGE": 62, "EQUITY": 190000},
//!             {"AGE": 70, "EQUITY": 500000}
//!         ]"#,
//!     )?;
//!
//!     let predicate = Compiler::new(&catalog).compile("Age ≥ 60 and Equity >= 200000")?;
//!     assert_eq!(predicate.normalized_form(), "(AGE >= 60) AND (EQUITY >= 200000)");
//!
//!     let evaluator = Evaluator::new(&dataset);
//!     let result = evaluator.evaluate(&predicate)?;
//!     assert_eq!(result.match_count, 1);
//!     assert_eq!(result.matched_row_indices, vec![2]);
//!
//!     let why = evaluator.explain(&predicate, 1)?;
//!     assert!(!why.matched);
//!     println!("Row 1: {}", why.reason);
//!     Ok(())
//! }
//! ```
//!
//! [`FieldCatalog`]: catalog::FieldCatalog
//! [`FieldCatalog::default`]: catalog::FieldCatalog
//! [`Compiler::compile`]: compiler::Compiler::compile
//! [`Predicate`]: compiler::Predicate
//! [`Evaluator::evaluate`]: evaluator::Evaluator::evaluate
//! [`Evaluator::explain`]: evaluator::Evaluator::explain

pub mod ast;
pub mod catalog;
pub mod compiler;
pub mod data;
pub mod error;
pub mod evaluator;
pub mod prelude;
pub mod segment;
pub mod trace;
