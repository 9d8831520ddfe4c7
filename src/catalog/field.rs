use serde::{Deserialize, Serialize};
use std::fmt;

/// The semantic type of a catalog field. It decides which comparisons a
/// formula may use on the field and how cells are coerced at evaluation time.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SemanticType {
    Numeric,
    Text,
    Boolean,
}

impl fmt::Display for SemanticType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SemanticType::Numeric => write!(f, "numeric"),
            SemanticType::Text => write!(f, "text"),
            SemanticType::Boolean => write!(f, "boolean"),
        }
    }
}

/// One identifier an operator may use in a formula.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FieldDescriptor {
    /// The identifier as written in formulas, e.g. `Age`.
    pub name: String,
    #[serde(alias = "type")]
    pub semantic_type: SemanticType,
    /// The dataset column holding the value, e.g. `AGE`.
    pub physical_column: String,
    /// Documentation for authoring help. Never evaluated.
    #[serde(default)]
    pub description: String,
}

impl FieldDescriptor {
    pub fn new(
        name: impl Into<String>,
        semantic_type: SemanticType,
        physical_column: impl Into<String>,
        description: impl Into<String>,
    ) -> Self {
        Self {
            name: name.into(),
            semantic_type,
            physical_column: physical_column.into(),
            description: description.into(),
        }
    }

    pub fn numeric(name: &str, physical_column: &str, description: &str) -> Self {
        Self::new(name, SemanticType::Numeric, physical_column, description)
    }

    pub fn text(name: &str, physical_column: &str, description: &str) -> Self {
        Self::new(name, SemanticType::Text, physical_column, description)
    }

    pub fn boolean(name: &str, physical_column: &str, description: &str) -> Self {
        Self::new(name, SemanticType::Boolean, physical_column, description)
    }
}
