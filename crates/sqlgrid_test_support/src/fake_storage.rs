use sqlgrid_core::{
    ColumnInfo, ColumnKind, CrudResult, DbError, DefaultSqlDialect, RecordIdentity, Row,
    RowCursor, RowDelete, RowInsert, RowPatch, SqlDialect, StorageFacade, Value,
};
use std::collections::{HashMap, VecDeque};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, RwLock, RwLockReadGuard, RwLockWriteGuard};

/// A write the fake received, in call order.
#[derive(Debug, Clone, PartialEq)]
pub enum FakeWrite {
    Update {
        table: String,
        rowid: Option<i64>,
        values: Row,
        original: Row,
    },
    Insert {
        table: String,
        values: Row,
    },
    Delete {
        table: String,
        rowid: Option<i64>,
        values: Row,
    },
}

impl FakeWrite {
    pub fn kind(&self) -> &'static str {
        match self {
            Self::Update { .. } => "update",
            Self::Insert { .. } => "insert",
            Self::Delete { .. } => "delete",
        }
    }
}

#[derive(Debug, Clone, Default)]
pub struct FakeStorageStats {
    pub executed_sql: Vec<String>,
    pub cursor_pulls: usize,
    pub writes: Vec<FakeWrite>,
}

#[derive(Debug, Clone)]
struct FakeTable {
    columns: Vec<ColumnInfo>,
    rows: Vec<(i64, Row)>,
    next_rowid: i64,
    without_rowid: bool,
}

impl FakeTable {
    fn new(columns: Vec<ColumnInfo>, rows: Vec<Row>, without_rowid: bool) -> Self {
        let rows: Vec<(i64, Row)> = rows
            .into_iter()
            .enumerate()
            .map(|(index, row)| (index as i64 + 1, row))
            .collect();

        Self {
            columns,
            next_rowid: rows.len() as i64 + 1,
            rows,
            without_rowid,
        }
    }

    fn primary_key(&self) -> Vec<String> {
        self.columns
            .iter()
            .filter(|column| column.is_primary_key)
            .map(|column| column.name.clone())
            .collect()
    }

    fn locate(&self, identity: &RecordIdentity, columns: &[String]) -> Option<usize> {
        match identity {
            RecordIdentity::Rowid(rowid) => self.rows.iter().position(|(id, _)| id == rowid),
            RecordIdentity::Composite {
                columns: key_columns,
                values,
            } => self.rows.iter().position(|(_, row)| {
                key_columns.iter().zip(values.iter()).all(|(name, value)| {
                    columns
                        .iter()
                        .position(|c| c == name)
                        .and_then(|position| row.get(position))
                        == Some(value)
                })
            }),
        }
    }
}

#[derive(Default)]
struct FakeStorageState {
    tables: RwLock<HashMap<String, FakeTable>>,
    query_results: RwLock<HashMap<String, (Vec<String>, Vec<Row>)>>,
    query_errors: RwLock<HashMap<String, String>>,
    update_error: RwLock<Option<String>>,
    insert_error: RwLock<Option<String>>,
    delete_error: RwLock<Option<String>>,
    executed_sql: Mutex<Vec<String>>,
    writes: Mutex<Vec<FakeWrite>>,
    cursor_pulls: AtomicUsize,
}

/// In-memory [`StorageFacade`] serving canned tables and query results.
///
/// Understands the table statements a `RowCache` issues (`SELECT rowid AS
/// .., *`, `SELECT *` and `SELECT COUNT(*)`); WHERE and ORDER BY clauses are
/// not evaluated. Any other statement must be registered with
/// [`FakeStorage::with_query_result`].
#[derive(Clone, Default)]
pub struct FakeStorage {
    state: Arc<FakeStorageState>,
}

impl FakeStorage {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_table(
        self,
        name: impl Into<String>,
        columns: Vec<ColumnInfo>,
        rows: Vec<Row>,
    ) -> Self {
        rwlock_write(&self.state.tables).insert(name.into(), FakeTable::new(columns, rows, false));
        self
    }

    /// Table whose `rowid` cannot be selected, like SQLite `WITHOUT ROWID`.
    pub fn with_without_rowid_table(
        self,
        name: impl Into<String>,
        columns: Vec<ColumnInfo>,
        rows: Vec<Row>,
    ) -> Self {
        rwlock_write(&self.state.tables).insert(name.into(), FakeTable::new(columns, rows, true));
        self
    }

    pub fn with_query_result(
        self,
        sql: impl Into<String>,
        columns: Vec<String>,
        rows: Vec<Row>,
    ) -> Self {
        rwlock_write(&self.state.query_results).insert(sql.into(), (columns, rows));
        self
    }

    pub fn with_query_error(self, sql: impl Into<String>, message: impl Into<String>) -> Self {
        rwlock_write(&self.state.query_errors).insert(sql.into(), message.into());
        self
    }

    pub fn with_update_error(self, message: impl Into<String>) -> Self {
        self.set_update_error(Some(message.into()));
        self
    }

    pub fn with_insert_error(self, message: impl Into<String>) -> Self {
        self.set_insert_error(Some(message.into()));
        self
    }

    pub fn with_delete_error(self, message: impl Into<String>) -> Self {
        self.set_delete_error(Some(message.into()));
        self
    }

    pub fn set_update_error(&self, message: Option<String>) {
        *rwlock_write(&self.state.update_error) = message;
    }

    pub fn set_insert_error(&self, message: Option<String>) {
        *rwlock_write(&self.state.insert_error) = message;
    }

    pub fn set_delete_error(&self, message: Option<String>) {
        *rwlock_write(&self.state.delete_error) = message;
    }

    pub fn stats(&self) -> FakeStorageStats {
        FakeStorageStats {
            executed_sql: mutex_lock(&self.state.executed_sql).clone(),
            cursor_pulls: self.state.cursor_pulls.load(Ordering::Relaxed),
            writes: mutex_lock(&self.state.writes).clone(),
        }
    }

    /// Current rows of a table, without rowids.
    pub fn table_rows(&self, table: &str) -> Vec<Row> {
        rwlock_read(&self.state.tables)
            .get(table)
            .map(|t| t.rows.iter().map(|(_, row)| row.clone()).collect())
            .unwrap_or_default()
    }

    pub fn as_storage_arc(self) -> Arc<dyn StorageFacade> {
        Arc::new(self)
    }

    fn record_write(&self, write: FakeWrite) {
        mutex_lock(&self.state.writes).push(write);
    }

    fn cursor(&self, columns: Vec<String>, rows: Vec<Row>) -> Box<dyn RowCursor> {
        Box::new(FakeCursor {
            columns,
            rows: rows.into(),
            state: Arc::clone(&self.state),
        })
    }

    fn execute_table_statement(&self, sql: &str) -> Result<Box<dyn RowCursor>, DbError> {
        let table_name = quoted_table_name(sql)
            .ok_or_else(|| DbError::query_failed(format!("unsupported statement: {}", sql)))?;

        let tables = rwlock_read(&self.state.tables);
        let table = tables
            .get(&table_name)
            .ok_or_else(|| DbError::query_failed(format!("no such table: {}", table_name)))?;

        let names: Vec<String> = table.columns.iter().map(|c| c.name.clone()).collect();

        if sql.starts_with("SELECT COUNT(*)") {
            return Ok(self.cursor(
                vec!["row_count".to_string()],
                vec![vec![Value::Int(table.rows.len() as i64)]],
            ));
        }

        if let Some(alias) = rowid_alias(sql) {
            if table.without_rowid {
                return Err(DbError::query_failed("no such column: rowid"));
            }

            let mut columns = vec![alias];
            columns.extend(names);

            let rows = table
                .rows
                .iter()
                .map(|(rowid, row)| {
                    let mut values = vec![Value::Int(*rowid)];
                    values.extend(row.iter().cloned());
                    values
                })
                .collect();

            return Ok(self.cursor(columns, rows));
        }

        if sql.starts_with("SELECT * FROM") {
            let rows = table.rows.iter().map(|(_, row)| row.clone()).collect();
            return Ok(self.cursor(names, rows));
        }

        Err(DbError::query_failed(format!("unsupported statement: {}", sql)))
    }
}

impl StorageFacade for FakeStorage {
    fn execute(&self, sql: &str) -> Result<Box<dyn RowCursor>, DbError> {
        mutex_lock(&self.state.executed_sql).push(sql.to_string());

        if let Some(message) = rwlock_read(&self.state.query_errors).get(sql) {
            return Err(DbError::query_failed(message.clone()));
        }

        if let Some((columns, rows)) = rwlock_read(&self.state.query_results).get(sql) {
            return Ok(self.cursor(columns.clone(), rows.clone()));
        }

        self.execute_table_statement(sql)
    }

    fn table_columns(&self, table: &str) -> Result<Vec<ColumnInfo>, DbError> {
        Ok(rwlock_read(&self.state.tables)
            .get(table)
            .map(|t| t.columns.clone())
            .unwrap_or_default())
    }

    fn update_row(&self, patch: &RowPatch) -> Result<CrudResult, DbError> {
        self.record_write(FakeWrite::Update {
            table: patch.table.clone(),
            rowid: patch.rowid,
            values: patch.values.clone(),
            original: patch.original.clone(),
        });

        if let Some(message) = rwlock_read(&self.state.update_error).clone() {
            return Err(DbError::query_failed(message));
        }

        let mut tables = rwlock_write(&self.state.tables);
        let table = tables
            .get_mut(&patch.table)
            .ok_or_else(|| DbError::TableNotFound(patch.table.clone()))?;

        let identity = patch
            .identity(&table.primary_key())
            .ok_or_else(|| DbError::query_failed("row cannot be identified"))?;

        match table.locate(&identity, &patch.columns) {
            Some(position) => {
                table.rows[position].1 = patch.values.clone();
                Ok(CrudResult::new(1))
            }
            None => Ok(CrudResult::new(0)),
        }
    }

    fn insert_row(&self, insert: &RowInsert) -> Result<CrudResult, DbError> {
        self.record_write(FakeWrite::Insert {
            table: insert.table.clone(),
            values: insert.values.clone(),
        });

        if let Some(message) = rwlock_read(&self.state.insert_error).clone() {
            return Err(DbError::query_failed(message));
        }

        let mut tables = rwlock_write(&self.state.tables);
        let table = tables
            .get_mut(&insert.table)
            .ok_or_else(|| DbError::TableNotFound(insert.table.clone()))?;

        let mut values = insert.values.clone();
        let integer_key = single_integer_key(&table.columns);

        let rowid = match integer_key.and_then(|col| values.get(col)) {
            Some(Value::Int(key)) => *key,
            _ => table.next_rowid,
        };
        if let Some(cell) = integer_key.and_then(|col| values.get_mut(col)) {
            *cell = Value::Int(rowid);
        }

        table.next_rowid = table.next_rowid.max(rowid + 1);
        table.rows.push((rowid, values));

        Ok(CrudResult::inserted(rowid))
    }

    fn delete_row(&self, delete: &RowDelete) -> Result<CrudResult, DbError> {
        self.record_write(FakeWrite::Delete {
            table: delete.table.clone(),
            rowid: delete.rowid,
            values: delete.values.clone(),
        });

        if let Some(message) = rwlock_read(&self.state.delete_error).clone() {
            return Err(DbError::query_failed(message));
        }

        let mut tables = rwlock_write(&self.state.tables);
        let table = tables
            .get_mut(&delete.table)
            .ok_or_else(|| DbError::TableNotFound(delete.table.clone()))?;

        let identity = delete
            .identity(&table.primary_key())
            .ok_or_else(|| DbError::query_failed("row cannot be identified"))?;

        match table.locate(&identity, &delete.columns) {
            Some(position) => {
                table.rows.remove(position);
                Ok(CrudResult::new(1))
            }
            None => Ok(CrudResult::new(0)),
        }
    }

    fn dialect(&self) -> &dyn SqlDialect {
        &DEFAULT_SQL_DIALECT
    }
}

struct FakeCursor {
    columns: Vec<String>,
    rows: VecDeque<Row>,
    state: Arc<FakeStorageState>,
}

impl RowCursor for FakeCursor {
    fn columns(&self) -> &[String] {
        &self.columns
    }

    fn next_row(&mut self) -> Result<Option<Row>, DbError> {
        self.state.cursor_pulls.fetch_add(1, Ordering::Relaxed);
        Ok(self.rows.pop_front())
    }
}

fn single_integer_key(columns: &[ColumnInfo]) -> Option<usize> {
    let keys: Vec<usize> = columns
        .iter()
        .enumerate()
        .filter(|(_, column)| column.is_primary_key)
        .map(|(index, _)| index)
        .collect();

    match keys.as_slice() {
        [index] if columns[*index].kind == ColumnKind::Integer => Some(*index),
        _ => None,
    }
}

/// Table name following `FROM "`, with doubled quotes unescaped.
fn quoted_table_name(sql: &str) -> Option<String> {
    let start = sql.find("FROM \"")? + "FROM \"".len();
    let mut name = String::new();
    let mut chars = sql[start..].chars().peekable();

    while let Some(ch) = chars.next() {
        if ch == '"' {
            if chars.peek() == Some(&'"') {
                chars.next();
                name.push('"');
            } else {
                return Some(name);
            }
        } else {
            name.push(ch);
        }
    }

    None
}

/// Alias from `SELECT rowid AS "alias", *`.
fn rowid_alias(sql: &str) -> Option<String> {
    let rest = sql.strip_prefix("SELECT rowid AS \"")?;
    let end = rest.find('"')?;
    Some(rest[..end].to_string())
}

fn rwlock_read<T>(lock: &RwLock<T>) -> RwLockReadGuard<'_, T> {
    match lock.read() {
        Ok(guard) => guard,
        Err(poison_error) => poison_error.into_inner(),
    }
}

fn rwlock_write<T>(lock: &RwLock<T>) -> RwLockWriteGuard<'_, T> {
    match lock.write() {
        Ok(guard) => guard,
        Err(poison_error) => poison_error.into_inner(),
    }
}

fn mutex_lock<T>(lock: &Mutex<T>) -> MutexGuard<'_, T> {
    match lock.lock() {
        Ok(guard) => guard,
        Err(poison_error) => poison_error.into_inner(),
    }
}

static DEFAULT_SQL_DIALECT: DefaultSqlDialect = DefaultSqlDialect;
