use std::path::PathBuf;
use std::sync::mpsc::{self, Receiver};
use std::thread;

use rusqlite::{Connection as RusqliteConnection, InterruptHandle, OpenFlags, Rows};
use sqlgrid_core::{DbError, Row, RowCursor};

use crate::driver::{format_sqlite_query_error, sqlite_value_to_value};

/// Database a cursor thread opens its own connection to.
#[derive(Debug, Clone)]
pub(crate) enum ReadTarget {
    File(PathBuf),

    /// URI of a named shared-cache in-memory database.
    SharedMemory(String),
}

impl ReadTarget {
    fn connect(&self) -> Result<RusqliteConnection, DbError> {
        let flags = OpenFlags::SQLITE_OPEN_READ_WRITE
            | OpenFlags::SQLITE_OPEN_URI
            | OpenFlags::SQLITE_OPEN_NO_MUTEX;

        let conn = match self {
            Self::File(path) => RusqliteConnection::open_with_flags(path, flags),
            Self::SharedMemory(uri) => RusqliteConnection::open_with_flags(uri, flags),
        }
        .map_err(|e| DbError::ConnectionFailed(e.to_string()))?;

        conn.execute_batch("PRAGMA query_only = ON")
            .map_err(|e| format_sqlite_query_error(&e))?;

        // Shared-cache readers would otherwise table-lock out the writer.
        if matches!(self, Self::SharedMemory(_)) {
            conn.execute_batch("PRAGMA read_uncommitted = ON")
                .map_err(|e| format_sqlite_query_error(&e))?;
        }

        Ok(conn)
    }
}

/// Live cursor over a statement stepped on its own thread.
///
/// The thread owns a dedicated read connection and hands rows over a
/// rendezvous channel, so it runs at most one row ahead of `next_row`.
/// Dropping the cursor stops the thread and finalizes the statement.
pub struct SqliteCursor {
    columns: Vec<String>,
    rows: Receiver<Result<Row, DbError>>,
    interrupt: InterruptHandle,
    finished: bool,
}

impl SqliteCursor {
    /// Prepare `sql` on a new read connection and step its first row.
    ///
    /// Fails when the connection cannot be opened or the statement cannot be
    /// prepared.
    pub(crate) fn open(target: &ReadTarget, sql: &str) -> Result<Self, DbError> {
        let (ready_tx, ready_rx) = mpsc::sync_channel(1);
        let (row_tx, row_rx) = mpsc::sync_channel(0);
        let target = target.clone();
        let sql = sql.to_string();

        thread::Builder::new()
            .name("sqlgrid-cursor".to_string())
            .spawn(move || {
                let conn = match target.connect() {
                    Ok(conn) => conn,
                    Err(e) => {
                        let _ = ready_tx.send(Err(e));
                        return;
                    }
                };

                let mut stmt = match conn.prepare(&sql) {
                    Ok(stmt) => stmt,
                    Err(e) => {
                        let _ = ready_tx.send(Err(format_sqlite_query_error(&e)));
                        return;
                    }
                };

                let column_count = stmt.column_count();
                let columns: Vec<String> =
                    stmt.column_names().iter().map(|s| s.to_string()).collect();

                let mut rows = match stmt.query([]) {
                    Ok(rows) => rows,
                    Err(e) => {
                        let _ = ready_tx.send(Err(format_sqlite_query_error(&e)));
                        return;
                    }
                };

                // The first step opens the read snapshot before the caller
                // gets the cursor back.
                let mut next = step(&mut rows, column_count);
                if ready_tx
                    .send(Ok((columns, conn.get_interrupt_handle())))
                    .is_err()
                {
                    return;
                }

                while let Some(item) = next {
                    let failed = item.is_err();
                    if row_tx.send(item).is_err() || failed {
                        return;
                    }
                    next = step(&mut rows, column_count);
                }
            })?;

        let (columns, interrupt) = ready_rx
            .recv()
            .map_err(|_| DbError::query_failed("Cursor thread exited before the statement ran"))??;

        Ok(Self {
            columns,
            rows: row_rx,
            interrupt,
            finished: false,
        })
    }
}

fn step(rows: &mut Rows<'_>, column_count: usize) -> Option<Result<Row, DbError>> {
    match rows.next() {
        Ok(Some(row)) => Some(Ok((0..column_count)
            .map(|i| sqlite_value_to_value(row, i))
            .collect())),
        Ok(None) => None,
        Err(e) => Some(Err(format_sqlite_query_error(&e))),
    }
}

impl RowCursor for SqliteCursor {
    fn columns(&self) -> &[String] {
        &self.columns
    }

    fn next_row(&mut self) -> Result<Option<Row>, DbError> {
        if self.finished {
            return Ok(None);
        }

        match self.rows.recv() {
            Ok(Ok(row)) => Ok(Some(row)),
            Ok(Err(e)) => {
                self.finished = true;
                Err(e)
            }
            Err(_) => {
                self.finished = true;
                Ok(None)
            }
        }
    }
}

impl Drop for SqliteCursor {
    fn drop(&mut self) {
        if !self.finished {
            self.interrupt.interrupt();
        }
    }
}
