use std::fmt;

use thiserror::Error;

use crate::grid::RowId;

/// Failure reported by a storage facade or while opening a data source.
#[derive(Debug, Error)]
pub enum DbError {
    #[error("Connection failed: {0}")]
    ConnectionFailed(String),

    #[error("Query failed: {0}")]
    QueryFailed(String),

    #[error("Table not found: {0}")]
    TableNotFound(String),

    #[error("Operation not supported: {0}")]
    NotSupported(String),

    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),
}

impl DbError {
    pub fn query_failed(message: impl Into<String>) -> Self {
        Self::QueryFailed(message.into())
    }

    pub fn connection_failed(message: impl Into<String>) -> Self {
        Self::ConnectionFailed(message.into())
    }
}

/// Malformed cell or filter input.
///
/// Grid operations swallow this error and leave the edited value unchanged;
/// it is only surfaced by the parsing helpers.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValidationError {
    #[error("'{0}' is not a valid number")]
    InvalidNumber(String),

    #[error("invalid escape sequence at offset {offset}: {sequence}")]
    InvalidEscape { offset: usize, sequence: String },
}

/// Which commit phase a row was being written in.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ChangeCategory {
    Changed,
    New,
    Deleted,
}

impl ChangeCategory {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Changed => "changed",
            Self::New => "new",
            Self::Deleted => "deleted",
        }
    }

    fn verb(&self) -> &'static str {
        match self {
            Self::Changed => "update",
            Self::New => "insert",
            Self::Deleted => "delete",
        }
    }
}

impl fmt::Display for ChangeCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A write failed while saving grid changes.
///
/// Rows written before the failure stay committed; the failed row and every
/// row after it keep their dirty state.
#[derive(Debug, Error)]
#[error("Failed to {} {} row {row_id} in table {table}: {source}", .category.verb(), .category)]
pub struct CommitError {
    pub table: String,
    pub category: ChangeCategory,
    pub row_id: RowId,
    #[source]
    pub source: DbError,
}

#[derive(Debug, Error)]
pub enum GridError {
    #[error(transparent)]
    DataSource(#[from] DbError),

    #[error("Grid is read-only: {0}")]
    ReadOnly(String),

    #[error(transparent)]
    Commit(#[from] CommitError),
}
