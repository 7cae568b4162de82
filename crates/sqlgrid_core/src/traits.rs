use std::collections::VecDeque;

use crate::{ColumnInfo, CrudResult, DbError, Row, RowDelete, RowInsert, RowPatch, SqlDialect};

/// Open result cursor handed out by [`StorageFacade::execute`].
///
/// Yields one row per call, with values in `columns()` order.
pub trait RowCursor: Send {
    /// Column names from the result description.
    fn columns(&self) -> &[String];

    /// Pull the next row. `Ok(None)` means the cursor is exhausted.
    fn next_row(&mut self) -> Result<Option<Row>, DbError>;
}

/// Synchronous connection a grid reads from and writes back to.
///
/// The grid never talks to the database directly; every statement and every
/// write goes through this trait. Implementations enforce their own
/// single-writer discipline.
pub trait StorageFacade: Send + Sync {
    /// Prepare and run a read statement.
    ///
    /// Fails immediately when the statement cannot be prepared.
    fn execute(&self, sql: &str) -> Result<Box<dyn RowCursor>, DbError>;

    /// Schema columns of a table, in declaration order.
    fn table_columns(&self, table: &str) -> Result<Vec<ColumnInfo>, DbError>;

    /// Write an edited row back. Locates the row by `patch.rowid` when set,
    /// else by the primary key values in `patch.original`.
    fn update_row(&self, patch: &RowPatch) -> Result<CrudResult, DbError>;

    /// Insert a new row and report the assigned rowid.
    fn insert_row(&self, insert: &RowInsert) -> Result<CrudResult, DbError>;

    /// Delete a row, located by rowid when set, else by primary key values.
    fn delete_row(&self, delete: &RowDelete) -> Result<CrudResult, DbError>;

    fn dialect(&self) -> &dyn SqlDialect;
}

/// Cursor over rows that were already read into memory.
#[derive(Debug, Clone, Default)]
pub struct BufferedCursor {
    columns: Vec<String>,
    rows: VecDeque<Row>,
}

impl BufferedCursor {
    pub fn new(columns: Vec<String>, rows: impl IntoIterator<Item = Row>) -> Self {
        Self {
            columns,
            rows: rows.into_iter().collect(),
        }
    }

    pub fn remaining(&self) -> usize {
        self.rows.len()
    }
}

impl RowCursor for BufferedCursor {
    fn columns(&self) -> &[String] {
        &self.columns
    }

    fn next_row(&mut self) -> Result<Option<Row>, DbError> {
        Ok(self.rows.pop_front())
    }
}
