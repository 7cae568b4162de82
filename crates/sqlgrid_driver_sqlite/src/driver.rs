use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Mutex, MutexGuard};
use std::time::Instant;

use rusqlite::Connection as RusqliteConnection;
use rusqlite::types::ValueRef;
use sqlgrid_core::{
    ColumnInfo, CrudResult, DbError, RowCursor, RowDelete, RowInsert, RowPatch, SqlDialect,
    SqlQueryBuilder, StorageFacade, Value,
};

use crate::cursor::{ReadTarget, SqliteCursor};

/// SQLite SQL dialect implementation.
pub struct SqliteDialect;

impl SqlDialect for SqliteDialect {
    fn quote_identifier(&self, name: &str) -> String {
        sqlite_quote_ident(name)
    }

    fn value_to_literal(&self, value: &Value) -> String {
        value_to_sqlite_literal(value)
    }

    fn escape_string(&self, s: &str) -> String {
        sqlite_escape_string(s)
    }
}

static SQLITE_DIALECT: SqliteDialect = SqliteDialect;

static NEXT_MEMORY_DB: AtomicU64 = AtomicU64::new(1);

/// Storage facade over a SQLite database.
///
/// Writes and schema reads run on one connection behind a mutex, so writes
/// from several grids sharing the facade are serialized. Each cursor from
/// [`StorageFacade::execute`] reads on a connection of its own. File
/// databases are switched to WAL so an open cursor keeps its snapshot while
/// the writer commits.
pub struct SqliteStorage {
    conn: Mutex<RusqliteConnection>,
    path: Option<PathBuf>,
    reads: ReadTarget,
}

impl SqliteStorage {
    /// Open (or create) a database file.
    pub fn open(path: impl AsRef<Path>) -> Result<Self, DbError> {
        let path = path.as_ref().to_path_buf();

        let conn = RusqliteConnection::open(&path)
            .map_err(|e| DbError::ConnectionFailed(e.to_string()))?;

        conn.execute_batch("SELECT 1")
            .map_err(|e| DbError::ConnectionFailed(e.to_string()))?;

        let journal_mode: String = conn
            .query_row("PRAGMA journal_mode = WAL", [], |row| row.get(0))
            .map_err(|e| DbError::ConnectionFailed(e.to_string()))?;
        if !journal_mode.eq_ignore_ascii_case("wal") {
            log::warn!(
                "[SQLITE] {} stays in {} journal mode; open cursors may block writes",
                path.display(),
                journal_mode
            );
        }

        log::info!("[SQLITE] Opened {}", path.display());

        Ok(Self {
            conn: Mutex::new(conn),
            reads: ReadTarget::File(path.clone()),
            path: Some(path),
        })
    }

    /// Open a private in-memory database.
    ///
    /// The database is a named shared-cache one so cursor connections can
    /// reach it; it lives as long as this storage.
    pub fn open_in_memory() -> Result<Self, DbError> {
        let uri = format!(
            "file:sqlgrid-mem-{}-{}?mode=memory&cache=shared",
            std::process::id(),
            NEXT_MEMORY_DB.fetch_add(1, Ordering::Relaxed)
        );

        let conn = RusqliteConnection::open(&uri)
            .map_err(|e| DbError::ConnectionFailed(e.to_string()))?;

        Ok(Self {
            conn: Mutex::new(conn),
            path: None,
            reads: ReadTarget::SharedMemory(uri),
        })
    }

    /// Database file, `None` for in-memory databases.
    pub fn path(&self) -> Option<&Path> {
        self.path.as_deref()
    }

    /// Run one or more statements that return no rows (DDL, seeding).
    pub fn execute_batch(&self, sql: &str) -> Result<(), DbError> {
        let conn = self.lock()?;
        conn.execute_batch(sql)
            .map_err(|e| format_sqlite_query_error(&e))
    }

    fn lock(&self) -> Result<MutexGuard<'_, RusqliteConnection>, DbError> {
        self.conn
            .lock()
            .map_err(|e| DbError::QueryFailed(format!("Lock error: {}", e)))
    }
}

impl StorageFacade for SqliteStorage {
    fn execute(&self, sql: &str) -> Result<Box<dyn RowCursor>, DbError> {
        let start = Instant::now();
        let cursor = SqliteCursor::open(&self.reads, sql)?;

        log::debug!("[QUERY] Cursor opened in {:.2?}: {}", start.elapsed(), sql);

        Ok(Box::new(cursor))
    }

    fn table_columns(&self, table: &str) -> Result<Vec<ColumnInfo>, DbError> {
        let conn = self.lock()?;
        get_columns(&conn, table)
    }

    fn update_row(&self, patch: &RowPatch) -> Result<CrudResult, DbError> {
        if !patch.has_changes() {
            return Ok(CrudResult::empty());
        }

        let conn = self.lock()?;
        let primary_key = primary_key_columns(&get_columns(&conn, &patch.table)?);

        let update_sql = SqlQueryBuilder::new(&SQLITE_DIALECT)
            .build_update(patch, &primary_key)
            .ok_or_else(|| {
                DbError::QueryFailed(
                    "Cannot update row: invalid row identity (missing primary key)".to_string(),
                )
            })?;

        log::debug!("[UPDATE] Executing: {}", update_sql);

        let affected = conn
            .execute(&update_sql, [])
            .map_err(|e| format_sqlite_query_error(&e))?;

        if affected == 0 {
            log::warn!("[UPDATE] No row matched in {}", patch.table);
            return Ok(CrudResult::empty());
        }

        Ok(CrudResult::new(affected as u64))
    }

    fn insert_row(&self, insert: &RowInsert) -> Result<CrudResult, DbError> {
        let insert_sql = SqlQueryBuilder::new(&SQLITE_DIALECT).build_insert(&insert.without_nulls());

        log::debug!("[INSERT] Executing: {}", insert_sql);

        let conn = self.lock()?;

        conn.execute(&insert_sql, [])
            .map_err(|e| format_sqlite_query_error(&e))?;

        Ok(CrudResult::inserted(conn.last_insert_rowid()))
    }

    fn delete_row(&self, delete: &RowDelete) -> Result<CrudResult, DbError> {
        let conn = self.lock()?;
        let primary_key = primary_key_columns(&get_columns(&conn, &delete.table)?);

        let delete_sql = SqlQueryBuilder::new(&SQLITE_DIALECT)
            .build_delete(delete, &primary_key)
            .ok_or_else(|| {
                DbError::QueryFailed(
                    "Cannot delete row: invalid row identity (missing primary key)".to_string(),
                )
            })?;

        log::debug!("[DELETE] Executing: {}", delete_sql);

        let affected = conn
            .execute(&delete_sql, [])
            .map_err(|e| format_sqlite_query_error(&e))?;

        if affected == 0 {
            log::warn!("[DELETE] No row matched in {}", delete.table);
            return Ok(CrudResult::empty());
        }

        Ok(CrudResult::new(affected as u64))
    }

    fn dialect(&self) -> &dyn SqlDialect {
        &SQLITE_DIALECT
    }
}

fn get_columns(conn: &RusqliteConnection, table: &str) -> Result<Vec<ColumnInfo>, DbError> {
    let mut stmt = conn
        .prepare(&format!("PRAGMA table_info({})", sqlite_quote_ident(table)))
        .map_err(|e| format_sqlite_query_error(&e))?;

    let columns: Vec<ColumnInfo> = stmt
        .query_map([], |row| {
            let mut column = ColumnInfo::new(
                row.get::<_, String>(1)?,
                row.get::<_, Option<String>>(2).unwrap_or(None).unwrap_or_default(),
            );
            column.nullable = row.get::<_, i32>(3).unwrap_or(0) == 0;
            column.default_value = row.get::<_, Option<String>>(4).unwrap_or(None);
            column.is_primary_key = row.get::<_, i32>(5).unwrap_or(0) > 0;

            Ok(column)
        })
        .map_err(|e| format_sqlite_query_error(&e))?
        .filter_map(|r| r.ok())
        .collect();

    log::debug!("[SCHEMA] {} columns in {}", columns.len(), table);

    Ok(columns)
}

fn primary_key_columns(columns: &[ColumnInfo]) -> Vec<String> {
    columns
        .iter()
        .filter(|column| column.is_primary_key)
        .map(|column| column.name.clone())
        .collect()
}

pub(crate) fn sqlite_value_to_value(row: &rusqlite::Row, idx: usize) -> Value {
    match row.get_ref(idx) {
        Ok(ValueRef::Null) => Value::Null,
        Ok(ValueRef::Integer(i)) => Value::Int(i),
        Ok(ValueRef::Real(f)) => Value::Float(f),
        Ok(ValueRef::Text(t)) => Value::Text(String::from_utf8_lossy(t).to_string()),
        Ok(ValueRef::Blob(b)) => Value::Bytes(b.to_vec()),
        Err(_) => Value::Null,
    }
}

/// Turns rusqlite failures into user-facing messages.
pub struct SqliteErrorFormatter;

impl SqliteErrorFormatter {
    /// Message text, followed by the SQLite result code when there is one.
    pub fn format_sqlite_error(e: &rusqlite::Error) -> String {
        match e {
            rusqlite::Error::SqliteFailure(err, msg) => {
                let message = msg.clone().unwrap_or_else(|| format!("{:?}", err.code));
                format!("{} [{:?} ({})]", message, err.code, err.extended_code)
            }
            _ => e.to_string(),
        }
    }
}

pub(crate) fn format_sqlite_query_error(e: &rusqlite::Error) -> DbError {
    let message = SqliteErrorFormatter::format_sqlite_error(e);
    log::error!("SQLite query failed: {}", message);
    DbError::QueryFailed(message)
}

fn sqlite_quote_ident(ident: &str) -> String {
    debug_assert!(!ident.is_empty(), "identifier cannot be empty");
    format!("\"{}\"", ident.replace('"', "\"\""))
}

/// Convert a Value to a safe SQLite literal string.
fn value_to_sqlite_literal(value: &Value) -> String {
    match value {
        Value::Null => "NULL".to_string(),
        Value::Int(i) => i.to_string(),
        Value::Float(f) => {
            if f.is_nan() || f.is_infinite() {
                // SQLite doesn't have NaN/Infinity, store as NULL
                "NULL".to_string()
            } else {
                format!("{:?}", f)
            }
        }
        Value::Text(s) => format!("'{}'", sqlite_escape_string(s)),
        Value::Bytes(b) => format!("X'{}'", hex::encode(b)),
    }
}

/// Escape a string for use inside a SQLite single-quoted literal.
fn sqlite_escape_string(s: &str) -> String {
    s.replace('\'', "''")
}
