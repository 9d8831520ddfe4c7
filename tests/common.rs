//! Common test utilities for building catalogs and datasets.
use segment_formula::prelude::*;

/// The five-row homeowner fixture.
///
/// `AGE = [58, 62, 70, 45, 66]`, `EQUITY = [210000, 190000, 500000, 50000, 300000]`.
#[allow(dead_code)]
pub fn five_row_dataset() -> Dataset {
    Dataset::from_columns([
        ("AGE", vec![58.0, 62.0, 70.0, 45.0, 66.0]),
        (
            "EQUITY",
            vec![210000.0, 190000.0, 500000.0, 50000.0, 300000.0],
        ),
    ])
    .expect("fixture columns have equal length")
}

/// A mixed-type dataset with gaps and spreadsheet-style cells.
///
/// | row | AGE    | EQUITY      | RATE    | EMPLOYMENT_STATUS | IS_OWNER |
/// |-----|--------|-------------|---------|-------------------|----------|
/// | 0   | 61     | 250000      | 0.07    | Retired           | true     |
/// | 1   | null   | 400000      | "6.5%"  | Employed          | "yes"    |
/// | 2   | "abc"  | "$120,000"  | 0.03    | null              | false    |
/// | 3   | 72     | null        | 0.055   | Retired           | 1        |
#[allow(dead_code)]
pub fn mixed_dataset() -> Dataset {
    Dataset::from_json(
        r#"[
            {"AGE": 61, "EQUITY": 250000, "CURRENT_SALE_MTG_1_INT_RATE": 0.07,
             "EMPLOYMENT_STATUS": "Retired", "IS_OWNER": true},
            {"AGE": null, "EQUITY": 400000, "CURRENT_SALE_MTG_1_INT_RATE": "6.5%",
             "EMPLOYMENT_STATUS": "Employed", "IS_OWNER": "yes"},
            {"AGE": "abc", "EQUITY": "$120,000", "CURRENT_SALE_MTG_1_INT_RATE": 0.03,
             "EMPLOYMENT_STATUS": null, "IS_OWNER": false},
            {"AGE": 72, "EQUITY": null, "CURRENT_SALE_MTG_1_INT_RATE": 0.055,
             "EMPLOYMENT_STATUS": "Retired", "IS_OWNER": 1}
        ]"#,
    )
    .expect("fixture JSON is valid")
}

/// Compiles against the default catalog, panicking on failure.
#[allow(dead_code)]
pub fn compile_default(formula: &str) -> Predicate {
    let catalog = FieldCatalog::default();
    Compiler::new(&catalog)
        .compile(formula)
        .unwrap_or_else(|e| panic!("'{}' should compile: {}", formula, e))
}

/// Compiles and evaluates, returning the matching row indices.
#[allow(dead_code)]
pub fn matching_rows(formula: &str, dataset: &Dataset) -> Vec<usize> {
    let predicate = compile_default(formula);
    Evaluator::new(dataset)
        .evaluate(&predicate)
        .unwrap_or_else(|e| panic!("'{}' should evaluate: {}", formula, e))
        .matched_row_indices
}
