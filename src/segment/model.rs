use crate::catalog::FieldCatalog;
use crate::compiler::{self, Predicate};
use crate::error::FormulaError;
use serde::{Deserialize, Serialize};
use serde_json::Map;

pub const DEFAULT_SEGMENT_COLOR: &str = "#1a3d3a";

fn default_color() -> String {
    DEFAULT_SEGMENT_COLOR.to_string()
}

/// A named, persisted audience definition.
///
/// Records written by older tools use `audience_name` and `segment_summary`;
/// both are accepted on read and written back as `name` and `description`.
/// Keys this schema does not know about are preserved in `extra`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Segment {
    pub id: String,
    #[serde(alias = "audience_name")]
    pub name: String,
    #[serde(default, alias = "segment_summary")]
    pub description: String,
    /// Presentation only.
    #[serde(default = "default_color")]
    pub color: String,
    #[serde(default)]
    pub formula: String,
    /// Last known match count. `None` until the formula has been evaluated.
    #[serde(default)]
    pub count: Option<usize>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub source_datasets: Vec<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub created_at: Option<String>,
    #[serde(flatten)]
    pub extra: Map<String, serde_json::Value>,
}

impl Segment {
    pub fn new(id: impl Into<String>, name: impl Into<String>, formula: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            description: String::new(),
            color: default_color(),
            formula: formula.into(),
            count: None,
            source_datasets: Vec::new(),
            created_at: None,
            extra: Map::new(),
        }
    }

    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = description.into();
        self
    }

    pub fn with_color(mut self, color: impl Into<String>) -> Self {
        self.color = color.into();
        self
    }

    pub fn with_source_dataset(mut self, dataset: impl Into<String>) -> Self {
        self.source_datasets.push(dataset.into());
        self
    }

    pub fn with_created_at(mut self, created_at: impl Into<String>) -> Self {
        self.created_at = Some(created_at.into());
        self
    }

    /// Compiles the segment's formula. Editing `formula` does not touch `count`.
    pub fn predicate(&self, catalog: &FieldCatalog) -> Result<Predicate, FormulaError> {
        compiler::compile(&self.formula, catalog)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn reads_legacy_audience_records() {
        let segment: Segment = serde_json::from_str(
            r#"{
                "id": "audience_1717171717",
                "audience_name": "Equity Rich Empty Nesters",
                "segment_summary": "Long-tenure owners sitting on equity.",
                "formula": "Age >= 60 and Equity >= 200000",
                "count": 0,
                "created_at": "2024-05-31 12:00:00",
                "demographics": {"age": "60+"}
            }"#,
        )
        .unwrap();
        assert_eq!(segment.name, "Equity Rich Empty Nesters");
        assert_eq!(segment.description, "Long-tenure owners sitting on equity.");
        assert_eq!(segment.color, DEFAULT_SEGMENT_COLOR);
        assert_eq!(segment.count, Some(0));
        assert_eq!(segment.extra["demographics"]["age"], "60+");

        let written = serde_json::to_value(&segment).unwrap();
        assert_eq!(written["name"], "Equity Rich Empty Nesters");
        assert!(written.get("audience_name").is_none());
        assert_eq!(written["demographics"]["age"], "60+");
    }

    #[test]
    fn unevaluated_segments_have_no_count() {
        let segment: Segment =
            serde_json::from_str(r#"{"id": "s1", "name": "New", "formula": "Age > 1"}"#).unwrap();
        assert_eq!(segment.count, None);
        assert!(segment.source_datasets.is_empty());
    }
}
