use crate::catalog::FieldCatalog;
use crate::compiler;
use serde::{Deserialize, Serialize};

pub const VALID_MESSAGE: &str = "Formula is valid";

/// What the operator sees after submitting a formula.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ValidationReport {
    pub valid: bool,
    pub message: String,
    /// Canonical rendering of the compiled formula. Empty when invalid.
    pub normalized_form: String,
}

/// Checks a formula before it is saved on a segment. Never fails; problems
/// are reported in the returned message.
pub fn validate(text: &str, catalog: &FieldCatalog) -> ValidationReport {
    match compiler::compile(text, catalog) {
        Ok(predicate) => ValidationReport {
            valid: true,
            message: VALID_MESSAGE.to_string(),
            normalized_form: predicate.normalized_form(),
        },
        Err(e) => {
            log::debug!("Rejected formula '{}': {}", text, e);
            ValidationReport {
                valid: false,
                message: e.to_string(),
                normalized_form: String::new(),
            }
        }
    }
}
