mod common;

use common::*;
use segment_formula::prelude::*;
use std::fs;

const RAW_EXPORT: &str = r#"[
    {"AGE": 67, "LENGTH_OF_RESIDENCE": 25, "CURRENT_AVM_VALUE": "$640,000",
     "CURRENT_SALE_MTG_1_LOAN_AMOUNT": 40000, "CURRENT_SALE_MTG_1_INT_RATE": "3.25%",
     "CURRENT_SALE_RECORDING_DATE": "06/01/2000", "SUM_BUILDING_SQFT": 3200,
     "MEDIAN_SQFT": 1900, "EMPLOYMENT_STATUS": "Retired", "IS_OWNER": true},
    {"AGE": 34, "LENGTH_OF_RESIDENCE": 2, "CURRENT_AVM_VALUE": 420000,
     "CURRENT_SALE_MTG_1_LOAN_AMOUNT": 380000, "CURRENT_SALE_MTG_1_INT_RATE": 0.071,
     "CURRENT_SALE_RECORDING_DATE": "2023-02-14", "SUM_BUILDING_SQFT": 1500,
     "EMPLOYMENT_STATUS": "Employed", "IS_OWNER": true},
    {"AGE": 72, "LENGTH_OF_RESIDENCE": 30, "CURRENT_AVM_VALUE": 510000,
     "CURRENT_SALE_MTG_1_INT_RATE": null,
     "CURRENT_SALE_RECORDING_DATE": "19950301", "SUM_BUILDING_SQFT": 2600,
     "EMPLOYMENT_STATUS": "Retired", "IS_OWNER": "yes"},
    {"AGE": 58, "LENGTH_OF_RESIDENCE": 12, "CURRENT_AVM_VALUE": null,
     "CURRENT_SALE_MTG_1_LOAN_AMOUNT": 150000, "CURRENT_SALE_MTG_1_INT_RATE": 0.045,
     "CURRENT_SALE_RECORDING_DATE": "2013-09-30", "SUM_BUILDING_SQFT": 2100,
     "EMPLOYMENT_STATUS": null, "IS_OWNER": false}
]"#;

fn prepared_export() -> Dataset {
    let raw = Dataset::from_json(RAW_EXPORT).unwrap();
    prepare(raw, &PreparationConfig::default()).unwrap()
}

#[test]
fn test_campaign_formulas_on_prepared_export() {
    let dataset = prepared_export();
    assert_eq!(dataset.row_count(), 4);

    // Equity: 600000, 40000, 510000, null.
    assert_eq!(
        matching_rows("Age >= 60 and Equity >= 200000", &dataset),
        vec![0, 2]
    );
    // Downsizers: big homes relative to the ZIP median (1800 fallback).
    assert_eq!(
        matching_rows("YearsOwned > 10 and HomeSQFT > MedianSQFT", &dataset),
        vec![0, 2, 3]
    );
    // Refinance candidates; row 2 has no rate and stays out.
    assert_eq!(matching_rows("Rate >= 0.045 and Mortgage_Balance > 0", &dataset), vec![1, 3]);
    assert_eq!(matching_rows("LastSaleDate < 2005", &dataset), vec![0, 2]);
    assert_eq!(
        matching_rows("IsOwner and EmploymentStatus != 'Retired'", &dataset),
        vec![1]
    );
}

#[test]
fn test_snapshot_file_freezes_prepared_data() {
    let dir = tempfile::tempdir().unwrap();
    let snapshot = dir.path().join("homeowners.bin");

    let dataset = prepared_export();
    dataset.save_snapshot(&snapshot).unwrap();
    let restored = Dataset::load_snapshot(&snapshot).unwrap();
    assert_eq!(restored, dataset);

    let formula = "Age BETWEEN 55 AND 70 or Equity > 500000";
    assert_eq!(
        matching_rows(formula, &restored),
        matching_rows(formula, &dataset)
    );
    assert!(matches!(
        Dataset::load_snapshot(dir.path().join("missing.bin")),
        Err(DatasetError::Io { .. })
    ));
}

#[test]
fn test_dataset_and_config_files() {
    let dir = tempfile::tempdir().unwrap();
    let data_path = dir.path().join("homeowners.json");
    let config_path = dir.path().join("prepare.json");
    fs::write(&data_path, RAW_EXPORT).unwrap();
    fs::write(
        &config_path,
        r#"{"median_sqft_fallback": 3000, "median_home_price_fallback": 500000}"#,
    )
    .unwrap();

    let config = PreparationConfig::from_file(&config_path).unwrap();
    let dataset = prepare(Dataset::from_file(&data_path).unwrap(), &config).unwrap();

    // Row 0 has its own median; the others fall back to 3000.
    assert_eq!(
        matching_rows("HomeSQFT > MedianSQFT", &dataset),
        vec![0]
    );
    assert_eq!(
        matching_rows("MedianHomePrice == 500000", &dataset),
        vec![0, 1, 2, 3]
    );
}

#[test]
fn test_end_to_end_segment_workflow() {
    let dir = tempfile::tempdir().unwrap();
    let store = JsonFileStore::new(dir.path().join("segments.json"));
    let catalog = FieldCatalog::default();
    let dataset = prepared_export();

    for (id, name, formula) in [
        ("equity-rich", "Equity Rich Seniors", "Age ≥ 60 and Equity ≥ 200000"),
        ("refi", "Refinance Candidates", "Rate > 0.06"),
        ("typo", "Typo", "Age >= 60 and Equity >= "),
    ] {
        store
            .upsert_segment(Segment::new(id, name, formula))
            .unwrap();
    }

    let outcomes = refresh_all(&store, &catalog, &dataset).unwrap();
    let counts: Vec<Option<usize>> = outcomes.iter().map(|o| o.result.clone().ok()).collect();
    assert_eq!(counts, vec![Some(2), Some(1), None]);

    let stored = store.load_segments().unwrap();
    assert_eq!(stored[0].count, Some(2));
    assert_eq!(stored[1].count, Some(1));
    assert_eq!(stored[2].count, None);

    // Explain why the younger owner is not an equity-rich senior.
    let predicate = stored[0].predicate(&catalog).unwrap();
    let explanation = Evaluator::new(&dataset).explain(&predicate, 1).unwrap();
    assert!(!explanation.matched);
    assert_eq!(explanation.reason, "$AGE (was 34) >= 60");
}

#[test]
fn test_parallel_evaluation_matches_sequential_explain() {
    let values: Vec<f64> = (0..2_000).map(|i| (i % 97) as f64).collect();
    let equity: Vec<f64> = (0..2_000).map(|i| (i * 1_000) as f64).collect();
    let dataset = Dataset::from_columns([("AGE", values), ("EQUITY", equity)]).unwrap();

    let predicate = compile_default("(Age > 60 and Equity < 1000000) or Age BETWEEN 10 AND 12");
    let evaluator = Evaluator::new(&dataset);
    let result = evaluator.evaluate(&predicate).unwrap();

    let expected: Vec<usize> = (0..dataset.row_count())
        .filter(|&row| evaluator.explain(&predicate, row).unwrap().matched)
        .collect();
    assert_eq!(result.matched_row_indices, expected);
    assert_eq!(result.match_count, expected.len());
    assert!(result.matched_row_indices.windows(2).all(|w| w[0] < w[1]));
}
