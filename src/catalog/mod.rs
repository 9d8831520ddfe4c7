//! The field catalog: the single source of truth mapping formula identifiers to
//! physical dataset columns.
//!
//! A catalog is immutable once built and can be shared freely between threads.
//! Adding a field means adding its descriptor here *and* making sure dataset
//! preparation produces the physical column; the catalog itself cannot check the
//! latter, evaluation reports it as [`EvaluationError::MissingColumn`].
//!
//! [`EvaluationError::MissingColumn`]: crate::error::EvaluationError::MissingColumn

mod defaults;
mod field;

pub use defaults::*;
pub use field::*;

use crate::compiler::lexer;
use crate::error::CatalogError;
use ahash::{AHashMap, AHashSet};
use std::fs;
use std::path::Path;

/// An ordered, validated set of [`FieldDescriptor`]s.
#[derive(Debug, Clone)]
pub struct FieldCatalog {
    fields: Vec<FieldDescriptor>,
    by_name: AHashMap<String, usize>,
    by_column: AHashMap<String, SemanticType>,
}

impl Default for FieldCatalog {
    /// The homeowner catalog used by the campaign builder.
    fn default() -> Self {
        Self::index(defaults::homeowner_fields())
    }
}

impl FieldCatalog {
    /// Starts a builder pre-populated with the homeowner fields.
    pub fn builder() -> CatalogBuilder {
        CatalogBuilder::new(defaults::homeowner_fields())
    }

    /// Validates and indexes a list of descriptors.
    pub fn from_descriptors(fields: Vec<FieldDescriptor>) -> Result<Self, CatalogError> {
        let mut names = AHashSet::with_capacity(fields.len());
        for field in &fields {
            if !lexer::is_identifier(&field.name) {
                return Err(CatalogError::InvalidFieldName(field.name.clone()));
            }
            if field.physical_column.trim().is_empty() {
                return Err(CatalogError::EmptyColumn(field.name.clone()));
            }
            if !names.insert(field.name.as_str()) {
                return Err(CatalogError::DuplicateField(field.name.clone()));
            }
        }
        Ok(Self::index(fields))
    }

    // Callers must have checked names are unique.
    fn index(fields: Vec<FieldDescriptor>) -> Self {
        let mut by_name = AHashMap::with_capacity(fields.len());
        let mut by_column = AHashMap::with_capacity(fields.len());
        for (idx, field) in fields.iter().enumerate() {
            by_name.insert(field.name.clone(), idx);
            by_column
                .entry(field.physical_column.clone())
                .or_insert(field.semantic_type);
        }
        Self {
            fields,
            by_name,
            by_column,
        }
    }

    /// Parses a catalog from a JSON array of descriptors.
    pub fn from_json(json: &str) -> Result<Self, CatalogError> {
        let fields: Vec<FieldDescriptor> =
            serde_json::from_str(json).map_err(|e| CatalogError::Parse(e.to_string()))?;
        Self::from_descriptors(fields)
    }

    /// Loads a catalog from a JSON file.
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self, CatalogError> {
        let path = path.as_ref();
        let content = fs::read_to_string(path).map_err(|e| CatalogError::Io {
            path: path.display().to_string(),
            message: e.to_string(),
        })?;
        Self::from_json(&content)
    }

    /// All fields, in a stable order.
    pub fn list_fields(&self) -> &[FieldDescriptor] {
        &self.fields
    }

    /// Exact, case-sensitive lookup of a formula identifier.
    pub fn lookup(&self, name: &str) -> Option<&FieldDescriptor> {
        self.by_name.get(name).map(|&idx| &self.fields[idx])
    }

    /// Resolves an identifier written in a formula to a physical column.
    ///
    /// Catalog names win; otherwise a physical column that the catalog already
    /// exposes is accepted under its own name. Anything else is unresolved.
    pub fn resolve(&self, identifier: &str) -> Option<(&str, SemanticType)> {
        if let Some(field) = self.lookup(identifier) {
            return Some((field.physical_column.as_str(), field.semantic_type));
        }
        self.by_column
            .get_key_value(identifier)
            .map(|(column, ty)| (column.as_str(), *ty))
    }

    /// The semantic type of a physical column, if any field maps to it.
    pub fn semantic_type_of(&self, physical_column: &str) -> Option<SemanticType> {
        self.by_column.get(physical_column).copied()
    }

    /// Distinct physical columns, in field order.
    pub fn physical_columns(&self) -> Vec<&str> {
        let mut seen = Vec::new();
        for field in &self.fields {
            if !seen.contains(&field.physical_column.as_str()) {
                seen.push(field.physical_column.as_str());
            }
        }
        seen
    }

    pub fn len(&self) -> usize {
        self.fields.len()
    }

    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }
}

/// Incrementally assembles a [`FieldCatalog`]. Validation happens in [`build`](Self::build).
pub struct CatalogBuilder {
    fields: Vec<FieldDescriptor>,
    aliases: Vec<(String, String)>,
}

impl CatalogBuilder {
    pub fn new(fields: Vec<FieldDescriptor>) -> Self {
        Self {
            fields,
            aliases: Vec::new(),
        }
    }

    /// A builder with no fields at all.
    pub fn empty() -> Self {
        Self::new(Vec::new())
    }

    pub fn with_field(mut self, field: FieldDescriptor) -> Self {
        self.fields.push(field);
        self
    }

    /// Registers `alias` as another name for the existing field `target`.
    pub fn with_alias(mut self, alias: &str, target: &str) -> Self {
        self.aliases.push((alias.to_string(), target.to_string()));
        self
    }

    pub fn build(mut self) -> Result<FieldCatalog, CatalogError> {
        for (alias, target) in std::mem::take(&mut self.aliases) {
            let original = self
                .fields
                .iter()
                .find(|f| f.name == target)
                .cloned()
                .ok_or_else(|| CatalogError::UnknownAliasTarget {
                    alias: alias.clone(),
                    target: target.clone(),
                })?;
            self.fields.push(FieldDescriptor {
                name: alias,
                description: format!("{} (alias of {})", original.description, original.name),
                ..original
            });
        }
        FieldCatalog::from_descriptors(self.fields)
    }
}
