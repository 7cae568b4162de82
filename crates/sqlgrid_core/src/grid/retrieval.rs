use super::{GridRow, RowCache};
use crate::{Row, Value};

impl RowCache {
    /// Pull rows until at least `row + 1` have been retrieved or the cursor
    /// is exhausted. A no-op for rows already retrieved.
    ///
    /// Query grids track the retrieved count as their row count and notify
    /// the view whenever it moves.
    pub fn seek_to_row(&mut self, row: usize) {
        let rows_before = self.row_count();
        let retrieved_before = self.retrieved;

        while self.retrieved <= row {
            let Some(cursor) = self.cursor.as_mut() else {
                break;
            };

            match cursor.next_row() {
                Ok(Some(raw)) => self.push_retrieved(raw),
                Ok(None) => {
                    log::info!("[GRID] Cursor exhausted after {} rows", self.retrieved);
                    self.cursor = None;
                }
                Err(e) => {
                    log::error!(
                        "[GRID] Retrieval failed after {} rows: {}",
                        self.retrieved,
                        e
                    );
                    self.cursor = None;
                }
            }
        }

        if self.retrieved != retrieved_before {
            log::debug!(
                "[GRID] Retrieved rows {}..{}",
                retrieved_before,
                self.retrieved
            );
        }

        if self.is_query() && self.row_count != self.retrieved {
            self.row_count = self.retrieved;
        }

        self.notify_row_delta(rows_before);
    }

    /// Seek one chunk past the known row count, or drain the cursor.
    pub fn seek_ahead(&mut self, to_end: bool) {
        let target = if to_end {
            usize::MAX
        } else {
            (self.row_count + self.chunk_length).saturating_sub(1)
        };

        self.seek_to_row(target);
    }

    /// Retrieve every row a table cursor is known to hold. Query grids have
    /// no known end and stay at what was retrieved.
    pub(crate) fn seek_to_known_end(&mut self) {
        let target = self.source_rows.unwrap_or(self.retrieved);
        self.seek_to_row(target.saturating_sub(1));
    }

    /// Retrieve until visible position `row` exists or the cursor runs out.
    pub(crate) fn ensure_visible(&mut self, row: usize) {
        let mut target = row;

        while self.rows_current.len() <= row && self.cursor.is_some() {
            self.seek_to_row(target);
            target = self.retrieved.max(target.saturating_add(1));
        }
    }

    fn push_retrieved(&mut self, raw: Row) {
        let (rowid, values) = self.split_rowid(raw);
        let id = self.allocate_id();
        let row = GridRow::retrieved(id, values, rowid);

        if self.matches_filters(&row) {
            self.rows_current.push(id);
        }
        self.idx_all.push(id);
        self.rows.insert(id, row);
        self.retrieved += 1;
    }

    /// Strip the rowid alias column and fit the values to the grid columns.
    fn split_rowid(&self, raw: Row) -> (Option<i64>, Row) {
        let mut values = raw.into_iter();

        let rowid = match self.rowid_alias {
            Some(_) => match values.next() {
                Some(Value::Int(rowid)) => Some(rowid),
                _ => None,
            },
            None => None,
        };

        let mut values: Row = values.take(self.columns.len()).collect();
        values.resize(self.columns.len(), Value::Null);

        (rowid, values)
    }
}
