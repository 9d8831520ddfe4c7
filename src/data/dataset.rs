use crate::ast::Value;
use crate::error::DatasetError;
use ahash::{AHashMap, AHashSet};
use bincode::config::standard;
use bincode::serde::{decode_from_slice, encode_to_vec};
use serde::{Deserialize, Serialize};
use serde_json::Map;
use std::fs;
use std::path::Path;

/// One named column of cells.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Column {
    pub name: String,
    pub values: Vec<Value>,
}

/// A columnar table of homeowner records.
///
/// Every column holds exactly `row_count` cells. The evaluator only reads
/// from a dataset; preparation produces a new one.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Dataset {
    columns: Vec<Column>,
    rows: usize,
    #[serde(skip)]
    index: AHashMap<String, usize>,
}

impl PartialEq for Dataset {
    fn eq(&self, other: &Self) -> bool {
        self.rows == other.rows && self.columns == other.columns
    }
}

impl Dataset {
    pub fn new() -> Self {
        Self::default()
    }

    /// Builds a dataset from `(name, cells)` pairs. All columns must have the
    /// same length.
    pub fn from_columns<I, N, V>(columns: I) -> Result<Self, DatasetError>
    where
        I: IntoIterator<Item = (N, Vec<V>)>,
        N: Into<String>,
        V: Into<Value>,
    {
        let mut dataset = Self::new();
        for (name, values) in columns {
            dataset.insert_column(name, values.into_iter().map(Into::into).collect())?;
        }
        Ok(dataset)
    }

    /// Builds a dataset from JSON objects, one per row.
    ///
    /// The column set is the union of all keys in first-seen order; a key that
    /// a record lacks reads as null.
    pub fn from_records(records: &[Map<String, serde_json::Value>]) -> Self {
        let mut names: Vec<&str> = Vec::new();
        let mut seen: AHashSet<&str> = AHashSet::new();
        for record in records {
            for key in record.keys() {
                if seen.insert(key.as_str()) {
                    names.push(key.as_str());
                }
            }
        }

        let columns = names
            .iter()
            .map(|name| Column {
                name: name.to_string(),
                values: records
                    .iter()
                    .map(|r| r.get(*name).map(json_to_value).unwrap_or(Value::Null))
                    .collect(),
            })
            .collect();

        let mut dataset = Self {
            columns,
            rows: records.len(),
            index: AHashMap::new(),
        };
        dataset.rebuild_index();
        dataset
    }

    /// Parses a JSON array of records.
    pub fn from_json(json: &str) -> Result<Self, DatasetError> {
        let raw: Vec<serde_json::Value> =
            serde_json::from_str(json).map_err(|e| DatasetError::Parse(e.to_string()))?;
        let records = raw
            .into_iter()
            .enumerate()
            .map(|(i, v)| match v {
                serde_json::Value::Object(map) => Ok(map),
                _ => Err(DatasetError::RecordNotObject(i)),
            })
            .collect::<Result<Vec<_>, _>>()?;
        Ok(Self::from_records(&records))
    }

    /// Loads a JSON array of records from a file.
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self, DatasetError> {
        let path = path.as_ref();
        let content = fs::read_to_string(path).map_err(|e| io_error(path, e))?;
        Self::from_json(&content)
    }

    /// Adds a column, replacing any column with the same name.
    pub fn insert_column(
        &mut self,
        name: impl Into<String>,
        values: Vec<Value>,
    ) -> Result<(), DatasetError> {
        let name = name.into();
        if self.columns.is_empty() {
            self.rows = values.len();
        } else if values.len() != self.rows {
            return Err(DatasetError::ColumnLength {
                column: name,
                expected: self.rows,
                found: values.len(),
            });
        }

        match self.index.get(&name) {
            Some(&idx) => self.columns[idx].values = values,
            None => {
                self.index.insert(name.clone(), self.columns.len());
                self.columns.push(Column { name, values });
            }
        }
        Ok(())
    }

    pub fn row_count(&self) -> usize {
        self.rows
    }

    pub fn has_column(&self, name: &str) -> bool {
        self.index.contains_key(name)
    }

    pub fn column(&self, name: &str) -> Option<&[Value]> {
        self.index
            .get(name)
            .map(|&idx| self.columns[idx].values.as_slice())
    }

    /// The cell at (`column`, `row`), if both exist.
    pub fn value(&self, column: &str, row: usize) -> Option<&Value> {
        self.column(column).and_then(|values| values.get(row))
    }

    pub fn column_names(&self) -> impl Iterator<Item = &str> {
        self.columns.iter().map(|c| c.name.as_str())
    }

    pub fn columns(&self) -> &[Column] {
        &self.columns
    }

    /// Encodes the dataset as a bincode snapshot.
    pub fn to_bytes(&self) -> Result<Vec<u8>, DatasetError> {
        encode_to_vec(self, standard())
            .map_err(|e| DatasetError::Snapshot(format!("Serialization failed: {}", e)))
    }

    /// Decodes a bincode snapshot.
    pub fn from_bytes(bytes: &[u8]) -> Result<Self, DatasetError> {
        let (mut dataset, _): (Dataset, usize) = decode_from_slice(bytes, standard())
            .map_err(|e| DatasetError::Snapshot(format!("Deserialization failed: {}", e)))?;
        if let Some(bad) = dataset.columns.iter().find(|c| c.values.len() != dataset.rows) {
            return Err(DatasetError::ColumnLength {
                column: bad.name.clone(),
                expected: dataset.rows,
                found: bad.values.len(),
            });
        }
        dataset.rebuild_index();
        Ok(dataset)
    }

    /// Writes a snapshot so later evaluations see a frozen copy of the data.
    pub fn save_snapshot(&self, path: impl AsRef<Path>) -> Result<(), DatasetError> {
        let path = path.as_ref();
        let bytes = self.to_bytes()?;
        fs::write(path, bytes).map_err(|e| io_error(path, e))
    }

    pub fn load_snapshot(path: impl AsRef<Path>) -> Result<Self, DatasetError> {
        let path = path.as_ref();
        let bytes = fs::read(path).map_err(|e| io_error(path, e))?;
        Self::from_bytes(&bytes)
    }

    fn rebuild_index(&mut self) {
        self.index = self
            .columns
            .iter()
            .enumerate()
            .map(|(idx, c)| (c.name.clone(), idx))
            .collect();
    }
}

/// Maps a JSON cell onto a [`Value`]. Arrays and objects keep their JSON text.
pub fn json_to_value(value: &serde_json::Value) -> Value {
    match value {
        serde_json::Value::Null => Value::Null,
        serde_json::Value::Bool(b) => Value::Bool(*b),
        serde_json::Value::Number(n) => n.as_f64().map_or(Value::Null, Value::Number),
        serde_json::Value::String(s) => Value::Text(s.clone()),
        other => Value::Text(other.to_string()),
    }
}

fn io_error(path: &Path, e: std::io::Error) -> DatasetError {
    DatasetError::Io {
        path: path.display().to_string(),
        message: e.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn records_become_columns_with_nulls_for_gaps() {
        let dataset = Dataset::from_json(
            r#"[{"AGE": 58, "EMPLOYMENT_STATUS": "Retired"}, {"AGE": "62", "IS_OWNER": true}]"#,
        )
        .unwrap();
        assert_eq!(dataset.row_count(), 2);
        assert_eq!(
            dataset.column_names().collect::<Vec<_>>(),
            vec!["AGE", "EMPLOYMENT_STATUS", "IS_OWNER"]
        );
        assert_eq!(dataset.value("AGE", 1), Some(&Value::Text("62".to_string())));
        assert_eq!(dataset.value("IS_OWNER", 0), Some(&Value::Null));
        assert_eq!(dataset.value("IS_OWNER", 2), None);
    }

    #[test]
    fn rejects_non_object_records() {
        assert_eq!(
            Dataset::from_json(r#"[{"AGE": 1}, 5]"#).unwrap_err(),
            DatasetError::RecordNotObject(1)
        );
        assert!(matches!(
            Dataset::from_json("{not json"),
            Err(DatasetError::Parse(_))
        ));
    }

    #[test]
    fn columns_must_share_a_length() {
        let mut dataset = Dataset::from_columns([("AGE", vec![1.0, 2.0])]).unwrap();
        let err = dataset
            .insert_column("EQUITY", vec![Value::Number(1.0)])
            .unwrap_err();
        assert_eq!(
            err,
            DatasetError::ColumnLength {
                column: "EQUITY".to_string(),
                expected: 2,
                found: 1
            }
        );
    }

    #[test]
    fn replacing_a_column_keeps_its_position() {
        let mut dataset =
            Dataset::from_columns([("AGE", vec![1.0, 2.0]), ("EQUITY", vec![3.0, 4.0])]).unwrap();
        dataset
            .insert_column("AGE", vec![Value::Number(9.0), Value::Null])
            .unwrap();
        assert_eq!(dataset.column_names().collect::<Vec<_>>(), vec!["AGE", "EQUITY"]);
        assert_eq!(dataset.value("AGE", 0), Some(&Value::Number(9.0)));
    }

    #[test]
    fn snapshot_restores_the_column_index() {
        let dataset = Dataset::from_json(r#"[{"AGE": 58, "NOTE": null}]"#).unwrap();
        let restored = Dataset::from_bytes(&dataset.to_bytes().unwrap()).unwrap();
        assert_eq!(restored, dataset);
        assert!(restored.has_column("AGE"));
        assert_eq!(restored.value("NOTE", 0), Some(&Value::Null));
    }
}
