use super::Dataset;
use crate::ast::Value;
use crate::catalog::{
    EQUITY_COLUMN, INTEREST_RATE_COLUMN, MEDIAN_HOME_PRICE_COLUMN, MEDIAN_SQFT_COLUMN,
    MORTGAGE_BALANCE_COLUMN, SALE_YEAR_COLUMN,
};
use crate::error::DatasetError;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;

pub const DEFAULT_MEDIAN_HOME_PRICE: f64 = 400_000.0;
pub const DEFAULT_MEDIAN_SQFT: f64 = 1_800.0;

/// How raw homeowner exports are turned into a dataset the catalog can query.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PreparationConfig {
    /// Columns coerced to numbers. Unparseable cells become null.
    pub numeric_columns: Vec<String>,
    pub avm_column: String,
    pub mortgage_balance_column: String,
    pub recording_date_column: String,
    /// Used when the ZIP reference data has no median price for a row.
    pub median_home_price_fallback: f64,
    pub median_sqft_fallback: f64,
}

impl Default for PreparationConfig {
    fn default() -> Self {
        Self {
            numeric_columns: [
                "AGE",
                "LENGTH_OF_RESIDENCE",
                "CURRENT_AVM_VALUE",
                MORTGAGE_BALANCE_COLUMN,
                INTEREST_RATE_COLUMN,
                "SUM_BUILDING_SQFT",
                MEDIAN_SQFT_COLUMN,
                MEDIAN_HOME_PRICE_COLUMN,
                EQUITY_COLUMN,
                SALE_YEAR_COLUMN,
            ]
            .into_iter()
            .map(String::from)
            .collect(),
            avm_column: "CURRENT_AVM_VALUE".to_string(),
            mortgage_balance_column: MORTGAGE_BALANCE_COLUMN.to_string(),
            recording_date_column: "CURRENT_SALE_RECORDING_DATE".to_string(),
            median_home_price_fallback: DEFAULT_MEDIAN_HOME_PRICE,
            median_sqft_fallback: DEFAULT_MEDIAN_SQFT,
        }
    }
}

impl PreparationConfig {
    pub fn from_json(json: &str) -> Result<Self, DatasetError> {
        serde_json::from_str(json).map_err(|e| DatasetError::Parse(e.to_string()))
    }

    pub fn from_file(path: impl AsRef<Path>) -> Result<Self, DatasetError> {
        let path = path.as_ref();
        let content = fs::read_to_string(path).map_err(|e| DatasetError::Io {
            path: path.display().to_string(),
            message: e.to_string(),
        })?;
        Self::from_json(&content)
    }
}

/// Coerces raw columns and derives `EQUITY`, `SALE_YEAR` and the ZIP medians.
///
/// Derived cells that are already present and non-null are kept. `EQUITY` is
/// only derived when the AVM column exists; a missing balance counts as zero,
/// a missing AVM leaves the cell null. `SALE_YEAR` is only derived when the
/// recording date column exists.
pub fn prepare(mut raw: Dataset, config: &PreparationConfig) -> Result<Dataset, DatasetError> {
    let rows = raw.row_count();

    for name in &config.numeric_columns {
        if let Some(values) = raw.column(name) {
            let coerced = values.iter().map(coerce_number).collect();
            raw.insert_column(name.as_str(), coerced)?;
        }
    }

    if let Some(avm) = raw.column(&config.avm_column) {
        let balance = raw.column(&config.mortgage_balance_column);
        let derived: Vec<Value> = (0..rows)
            .map(|row| match avm[row].as_number() {
                Some(value) => {
                    let owed = balance
                        .and_then(|b| b[row].as_number())
                        .unwrap_or(0.0);
                    Value::Number(value - owed)
                }
                None => Value::Null,
            })
            .collect();
        let merged = keep_present(raw.column(EQUITY_COLUMN), derived);
        raw.insert_column(EQUITY_COLUMN, merged)?;
    }

    if let Some(dates) = raw.column(&config.recording_date_column) {
        let derived: Vec<Value> = dates
            .iter()
            .map(|d| sale_year(d).map_or(Value::Null, Value::Number))
            .collect();
        let merged = keep_present(raw.column(SALE_YEAR_COLUMN), derived);
        raw.insert_column(SALE_YEAR_COLUMN, merged)?;
    }

    for (column, fallback) in [
        (MEDIAN_HOME_PRICE_COLUMN, config.median_home_price_fallback),
        (MEDIAN_SQFT_COLUMN, config.median_sqft_fallback),
    ] {
        let filled = keep_present(raw.column(column), vec![Value::Number(fallback); rows]);
        raw.insert_column(column, filled)?;
    }

    log::debug!(
        "Prepared dataset with {} rows and {} columns",
        rows,
        raw.columns().len()
    );
    Ok(raw)
}

fn coerce_number(value: &Value) -> Value {
    match value {
        Value::Null => Value::Null,
        other => other.as_number().map_or(Value::Null, Value::Number),
    }
}

fn keep_present(existing: Option<&[Value]>, derived: Vec<Value>) -> Vec<Value> {
    match existing {
        None => derived,
        Some(existing) => existing
            .iter()
            .zip(derived)
            .map(|(old, new)| if old.is_null() { new } else { old.clone() })
            .collect(),
    }
}

/// Reads the year out of `2019-03-15`, `20190315`, `03/15/2019` or a bare year.
fn sale_year(value: &Value) -> Option<f64> {
    match value {
        Value::Number(n) if n.fract() == 0.0 && (1000.0..=9999.0).contains(n) => Some(*n),
        Value::Number(n) if n.fract() == 0.0 && (10_000_000.0..=99_999_999.0).contains(n) => {
            Some((n / 10_000.0).floor())
        }
        Value::Text(s) => {
            let s = s.trim();
            let candidate = if s.contains('/') {
                s.rsplit('/').next().unwrap_or_default()
            } else {
                s
            };
            let digits: String = candidate.chars().take(4).collect();
            if digits.len() == 4 && digits.chars().all(|c| c.is_ascii_digit()) {
                digits.parse().ok()
            } else {
                None
            }
        }
        _ => None,
    }
}
