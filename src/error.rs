use thiserror::Error;

/// Errors raised while compiling an operator-authored formula.
///
/// Every variant is caused by the formula text itself and carries a message that
/// can be shown to the operator as-is.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum FormulaError {
    #[error("Formula cannot be empty")]
    EmptyFormula,

    #[error("Unbalanced parentheses: found {open} '(' and {close} ')'")]
    UnbalancedParentheses { open: usize, close: usize },

    #[error("Unknown field '{0}'. Use one of the fields listed in the field catalog")]
    UnresolvedIdentifier(String),

    #[error("Malformed BETWEEN clause: {0}")]
    MalformedBetween(String),

    #[error("Syntax error at position {position}: {message}")]
    SyntaxError { position: usize, message: String },
}

impl FormulaError {
    pub(crate) fn syntax(position: usize, message: impl Into<String>) -> Self {
        FormulaError::SyntaxError {
            position,
            message: message.into(),
        }
    }
}

/// Errors that abort the evaluation of a compiled predicate against a dataset.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum EvaluationError {
    #[error("Column '{0}' is referenced by the formula but missing from the dataset")]
    MissingColumn(String),

    #[error("Row {row} is out of bounds for a dataset with {rows} rows")]
    RowOutOfBounds { row: usize, rows: usize },
}

/// Errors raised while building or loading a field catalog.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum CatalogError {
    #[error("Field '{0}' is defined more than once")]
    DuplicateField(String),

    #[error("Field name '{0}' cannot be written in a formula; use letters, digits and '_' and avoid keywords")]
    InvalidFieldName(String),

    #[error("Field '{0}' has an empty physical column")]
    EmptyColumn(String),

    #[error("Alias '{alias}' points to unknown field '{target}'")]
    UnknownAliasTarget { alias: String, target: String },

    #[error("Failed to parse field catalog: {0}")]
    Parse(String),

    #[error("Could not read field catalog '{path}': {message}")]
    Io { path: String, message: String },
}

/// Errors raised while constructing, loading or snapshotting a dataset.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum DatasetError {
    #[error("Column '{column}' has {found} values, but the dataset has {expected} rows")]
    ColumnLength {
        column: String,
        expected: usize,
        found: usize,
    },

    #[error("Record {0} is not a JSON object")]
    RecordNotObject(usize),

    #[error("Failed to parse dataset JSON: {0}")]
    Parse(String),

    #[error("Snapshot error: {0}")]
    Snapshot(String),

    #[error("Could not access dataset file '{path}': {message}")]
    Io { path: String, message: String },
}

/// Errors raised by a segment store.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum StoreError {
    #[error("Could not access segment store '{path}': {message}")]
    Io { path: String, message: String },

    #[error("Segment store contains invalid JSON: {0}")]
    Parse(String),

    #[error("Segment store lock was poisoned")]
    Poisoned,

    #[error("Segment '{0}' not found")]
    NotFound(String),
}

/// Errors raised while refreshing a segment against a dataset.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum SegmentError {
    #[error(transparent)]
    Formula(#[from] FormulaError),

    #[error(transparent)]
    Evaluation(#[from] EvaluationError),

    #[error(transparent)]
    Store(#[from] StoreError),
}
