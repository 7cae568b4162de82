use crate::Value;

/// How a storage facade locates the physical row for UPDATE/DELETE.
#[derive(Debug, Clone, PartialEq)]
pub enum RecordIdentity {
    /// SQLite's own row locator.
    Rowid(i64),

    /// Primary key columns and their values (same order).
    Composite {
        columns: Vec<String>,
        values: Vec<Value>,
    },
}

impl RecordIdentity {
    pub fn rowid(rowid: i64) -> Self {
        Self::Rowid(rowid)
    }

    pub fn composite(columns: Vec<String>, values: Vec<Value>) -> Self {
        debug_assert_eq!(
            columns.len(),
            values.len(),
            "RecordIdentity: columns and values must have same length"
        );
        Self::Composite { columns, values }
    }

    /// Pick the identity for a row: the rowid when known, otherwise the
    /// primary key values taken from `values`. Returns `None` when neither
    /// is available.
    pub fn resolve(
        rowid: Option<i64>,
        primary_key: &[String],
        columns: &[String],
        values: &[Value],
    ) -> Option<Self> {
        if let Some(rowid) = rowid {
            return Some(Self::Rowid(rowid));
        }

        if primary_key.is_empty() {
            return None;
        }

        let mut pk_values = Vec::with_capacity(primary_key.len());
        for pk in primary_key {
            let position = columns.iter().position(|c| c == pk)?;
            pk_values.push(values.get(position)?.clone());
        }

        Some(Self::composite(primary_key.to_vec(), pk_values))
    }

    pub fn is_valid(&self) -> bool {
        match self {
            Self::Rowid(_) => true,
            Self::Composite { columns, values } => {
                !columns.is_empty() && columns.len() == values.len()
            }
        }
    }
}

/// An edited row to write back via UPDATE.
///
/// Carries the pre-edit values next to the current ones: facades without a
/// rowid locate the row by its original primary key.
#[derive(Debug, Clone)]
pub struct RowPatch {
    pub table: String,
    pub columns: Vec<String>,
    pub values: Vec<Value>,
    pub original: Vec<Value>,
    pub rowid: Option<i64>,
}

impl RowPatch {
    pub fn new(
        table: String,
        columns: Vec<String>,
        values: Vec<Value>,
        original: Vec<Value>,
        rowid: Option<i64>,
    ) -> Self {
        Self {
            table,
            columns,
            values,
            original,
            rowid,
        }
    }

    /// Columns whose current value differs from the original.
    pub fn changes(&self) -> Vec<(String, Value)> {
        self.columns
            .iter()
            .zip(self.values.iter())
            .zip(self.original.iter())
            .filter(|((_, value), original)| value != original)
            .map(|((column, value), _)| (column.clone(), value.clone()))
            .collect()
    }

    pub fn has_changes(&self) -> bool {
        !self.changes().is_empty()
    }

    pub fn identity(&self, primary_key: &[String]) -> Option<RecordIdentity> {
        RecordIdentity::resolve(self.rowid, primary_key, &self.columns, &self.original)
    }
}

/// A new row to write via INSERT.
#[derive(Debug, Clone)]
pub struct RowInsert {
    pub table: String,
    pub columns: Vec<String>,
    pub values: Vec<Value>,
}

impl RowInsert {
    pub fn new(table: String, columns: Vec<String>, values: Vec<Value>) -> Self {
        Self {
            table,
            columns,
            values,
        }
    }

    /// Copy of this insert without NULL columns, so column defaults and
    /// auto-assigned keys apply.
    pub fn without_nulls(&self) -> Self {
        let (columns, values) = self
            .columns
            .iter()
            .zip(self.values.iter())
            .filter(|(_, value)| !value.is_null())
            .map(|(column, value)| (column.clone(), value.clone()))
            .unzip();

        Self {
            table: self.table.clone(),
            columns,
            values,
        }
    }

    pub fn is_empty(&self) -> bool {
        self.columns.is_empty()
    }
}

/// A row to remove via DELETE.
#[derive(Debug, Clone)]
pub struct RowDelete {
    pub table: String,
    pub columns: Vec<String>,
    pub values: Vec<Value>,
    pub rowid: Option<i64>,
}

impl RowDelete {
    pub fn new(table: String, columns: Vec<String>, values: Vec<Value>, rowid: Option<i64>) -> Self {
        Self {
            table,
            columns,
            values,
            rowid,
        }
    }

    pub fn identity(&self, primary_key: &[String]) -> Option<RecordIdentity> {
        RecordIdentity::resolve(self.rowid, primary_key, &self.columns, &self.values)
    }
}

/// Result of a CRUD operation.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CrudResult {
    /// Number of rows affected by the operation.
    pub affected_rows: u64,

    /// Rowid assigned by an INSERT. For tables with an INTEGER PRIMARY KEY
    /// this is also the key value.
    pub last_insert_rowid: Option<i64>,
}

impl CrudResult {
    pub fn new(affected_rows: u64) -> Self {
        Self {
            affected_rows,
            last_insert_rowid: None,
        }
    }

    pub fn inserted(rowid: i64) -> Self {
        Self {
            affected_rows: 1,
            last_insert_rowid: Some(rowid),
        }
    }

    pub fn empty() -> Self {
        Self::default()
    }
}
