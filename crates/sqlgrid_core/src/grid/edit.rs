use super::{GridEvent, GridRow, RowCache, RowState};
use crate::{ColumnKind, GridError, ValidationError, Value, blob};

/// Parse a number typed by the user.
///
/// A comma is accepted as decimal separator. Input with a decimal point
/// becomes a float, anything else must be an integer.
pub fn parse_numeric(raw: &str) -> Result<Value, ValidationError> {
    let trimmed = raw.trim();
    let invalid = || ValidationError::InvalidNumber(raw.to_string());

    if trimmed.is_empty() {
        return Err(invalid());
    }

    let normalized = trimmed.replace(',', ".");
    if normalized.contains('.') {
        match normalized.parse::<f64>() {
            Ok(number) if number.is_finite() => Ok(Value::Float(number)),
            _ => Err(invalid()),
        }
    } else {
        normalized.parse::<i64>().map(Value::Int).map_err(|_| invalid())
    }
}

/// Coerce cell editor text to a value of the given column kind.
///
/// Empty numeric input means NULL. Blob input must use the escaped printable
/// encoding the grid displays blobs in.
pub fn parse_cell_input(kind: ColumnKind, raw: &str) -> Result<Value, ValidationError> {
    match kind {
        ColumnKind::Integer | ColumnKind::Real => {
            if raw.trim().is_empty() {
                Ok(Value::Null)
            } else {
                parse_numeric(raw)
            }
        }
        ColumnKind::Blob => blob::unescape(raw).map(Value::Bytes),
        ColumnKind::Text => Ok(Value::Text(raw.to_string())),
    }
}

impl RowCache {
    fn ensure_writable(&self, operation: &str) -> Result<(), GridError> {
        if self.is_query() {
            log::warn!("[EDIT] Rejected {} on read-only query grid", operation);
            return Err(GridError::ReadOnly(format!(
                "cannot {} rows of a query result",
                operation
            )));
        }
        Ok(())
    }

    /// Set a cell from editor text.
    ///
    /// Returns `Ok(false)` when the input does not parse for the column or
    /// the position does not exist; the cell is left unchanged.
    pub fn set_value(&mut self, row: usize, col: usize, raw: &str) -> Result<bool, GridError> {
        self.ensure_writable("edit")?;

        let Some(column) = self.columns.get(col) else {
            return Ok(false);
        };

        let value = match parse_cell_input(column.kind, raw) {
            Ok(value) => value,
            Err(e) => {
                log::debug!("[EDIT] Rejected input for column {}: {}", column.name, e);
                return Ok(false);
            }
        };

        if row >= self.row_count() {
            return Ok(false);
        }
        self.ensure_visible(row);

        let Some(&id) = self.rows_current.get(row) else {
            return Ok(false);
        };
        let Some(data) = self.rows.get_mut(&id) else {
            return Ok(false);
        };

        if data.state == RowState::Clean {
            self.rows_backup.insert(id, data.values.clone());
            data.state = RowState::Changed;
            self.idx_changed.insert(id);
        }

        if let Some(cell) = data.values.get_mut(col) {
            *cell = value;
        }

        log::debug!("[EDIT] Row {} column {} set", id, col);
        self.emit(GridEvent::Refresh);

        Ok(true)
    }

    /// Add `count` blank rows at the top of the visible order.
    ///
    /// `_at` is accepted for view compatibility; new rows always go first so
    /// they can be edited without retrieving the whole result.
    pub fn insert_rows(&mut self, _at: usize, count: usize) -> Result<(), GridError> {
        self.ensure_writable("insert")?;

        if count == 0 {
            return Ok(());
        }

        let rows_before = self.row_count();

        for _ in 0..count {
            let id = self.allocate_id();
            self.rows.insert(id, GridRow::blank(id, self.columns.len()));
            self.idx_all.insert(0, id);
            self.rows_current.insert(0, id);
            self.idx_new.insert(id);
        }

        self.row_count += count;
        log::debug!("[EDIT] Inserted {} new rows", count);
        self.notify_row_delta(rows_before);

        Ok(())
    }

    /// Delete `count` visible rows starting at `at`.
    ///
    /// New rows are dropped outright. Changed rows revert to their stored
    /// values before being marked deleted. Returns how many rows went away.
    pub fn delete_rows(&mut self, at: usize, count: usize) -> Result<usize, GridError> {
        self.ensure_writable("delete")?;

        if count == 0 {
            return Ok(0);
        }

        self.ensure_visible(at.saturating_add(count - 1));

        let end = at.saturating_add(count).min(self.rows_current.len());
        if at >= end {
            return Ok(0);
        }

        let removed: Vec<_> = self.rows_current.drain(at..end).collect();

        for id in &removed {
            if self.idx_new.shift_remove(id) {
                self.idx_all.retain(|other| other != id);
                self.rows.remove(id);
                continue;
            }

            let backup = self.rows_backup.remove(id);
            self.idx_changed.shift_remove(id);

            if let Some(data) = self.rows.get_mut(id) {
                if let Some(values) = backup {
                    data.values = values;
                }
                data.state = RowState::Deleted;
            }
            self.idx_deleted.insert(*id);
        }

        self.row_count = self.row_count.saturating_sub(removed.len());
        log::debug!("[EDIT] Deleted {} rows at {}", removed.len(), at);
        self.emit(GridEvent::RowsDeleted {
            at,
            count: removed.len(),
        });

        Ok(removed.len())
    }
}
