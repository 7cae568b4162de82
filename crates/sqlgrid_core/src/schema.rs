use serde::{Deserialize, Serialize};

/// Storage class a grid column is edited, filtered and sorted as.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ColumnKind {
    Integer,
    Real,
    Text,
    Blob,
}

impl ColumnKind {
    /// Map a declared SQLite column type to a grid kind using SQLite's
    /// affinity rules. NUMERIC affinity is treated as `Real`; an empty
    /// declaration is edited as text.
    pub fn from_declared_type(type_name: &str) -> Self {
        let upper = type_name.to_uppercase();

        if upper.contains("INT") {
            Self::Integer
        } else if upper.contains("CHAR") || upper.contains("CLOB") || upper.contains("TEXT") {
            Self::Text
        } else if upper.contains("BLOB") {
            Self::Blob
        } else if upper.trim().is_empty() {
            Self::Text
        } else {
            Self::Real
        }
    }

    pub fn is_numeric(&self) -> bool {
        matches!(self, Self::Integer | Self::Real)
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Integer => "INTEGER",
            Self::Real => "REAL",
            Self::Text => "TEXT",
            Self::Blob => "BLOB",
        }
    }
}

/// Column metadata within a table or query result.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ColumnInfo {
    pub name: String,

    /// Declared type as written in the schema (e.g. "integer", "varchar(255)").
    /// Empty for query columns.
    pub type_name: String,

    pub kind: ColumnKind,

    pub nullable: bool,
    pub is_primary_key: bool,

    /// Default value expression, if any.
    pub default_value: Option<String>,
}

impl ColumnInfo {
    pub fn new(name: impl Into<String>, type_name: impl Into<String>) -> Self {
        let type_name = type_name.into();
        Self {
            name: name.into(),
            kind: ColumnKind::from_declared_type(&type_name),
            type_name,
            nullable: true,
            is_primary_key: false,
            default_value: None,
        }
    }

    /// Column of a query result: no declared type, edited as text until
    /// refined from sampled values.
    pub fn query_column(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            type_name: String::new(),
            kind: ColumnKind::Text,
            nullable: true,
            is_primary_key: false,
            default_value: None,
        }
    }

    pub fn primary_key(mut self) -> Self {
        self.is_primary_key = true;
        self
    }

    pub fn not_null(mut self) -> Self {
        self.nullable = false;
        self
    }
}
