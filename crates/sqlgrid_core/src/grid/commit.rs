use std::fmt;

use super::{GridEvent, RowCache, RowId, RowState};
use crate::{
    ChangeCategory, ColumnKind, CommitError, GridError, RowDelete, RowInsert, RowPatch, Value,
};

/// Pending (or written) row counts per change category.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ChangeSummary {
    pub new: usize,
    pub changed: usize,
    pub deleted: usize,
}

impl ChangeSummary {
    pub fn is_empty(&self) -> bool {
        self.total() == 0
    }

    pub fn total(&self) -> usize {
        self.new + self.changed + self.deleted
    }
}

/// `1 new row, 2 changed rows`; empty when nothing is pending.
impl fmt::Display for ChangeSummary {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let parts: Vec<String> = [
            (self.new, ChangeCategory::New),
            (self.changed, ChangeCategory::Changed),
            (self.deleted, ChangeCategory::Deleted),
        ]
        .into_iter()
        .filter(|(count, _)| *count > 0)
        .map(|(count, category)| {
            format!(
                "{} {} row{}",
                count,
                category,
                if count == 1 { "" } else { "s" }
            )
        })
        .collect();

        f.write_str(&parts.join(", "))
    }
}

impl RowCache {
    /// True while any row is changed, new or deleted.
    pub fn is_changed(&self) -> bool {
        !self.change_summary().is_empty()
    }

    pub fn change_summary(&self) -> ChangeSummary {
        ChangeSummary {
            new: self.idx_new.len(),
            changed: self.idx_changed.len(),
            deleted: self.idx_deleted.len(),
        }
    }

    /// Human-readable pending change counts, for confirmation prompts.
    pub fn changed_info(&self) -> String {
        self.change_summary().to_string()
    }

    /// Write pending changes: updates first, then inserts, then deletes.
    ///
    /// Stops at the first failing row. Rows written before it stay written
    /// and clean; the failing row and the rest stay dirty so the save can be
    /// retried or undone.
    pub fn save_changes(&mut self) -> Result<ChangeSummary, GridError> {
        if !self.is_changed() {
            return Ok(ChangeSummary::default());
        }

        let table = match self.table_name() {
            Some(table) => table.to_string(),
            None => {
                return Err(GridError::ReadOnly(
                    "cannot save changes of a query result".to_string(),
                ));
            }
        };

        let mut written = ChangeSummary::default();
        let result = self.write_changes(&table, &mut written);
        self.emit(GridEvent::Refresh);

        match result {
            Ok(()) => {
                log::info!("[COMMIT] Saved {} in {}", written, table);
                Ok(written)
            }
            Err(e) => {
                log::error!("[COMMIT] {} (saved before failure: {})", e, written);
                Err(e.into())
            }
        }
    }

    fn write_changes(
        &mut self,
        table: &str,
        written: &mut ChangeSummary,
    ) -> Result<(), CommitError> {
        let column_names: Vec<String> = self.columns.iter().map(|c| c.name.clone()).collect();
        let fail = |category, row_id, source| CommitError {
            table: table.to_string(),
            category,
            row_id,
            source,
        };

        for id in self.idx_changed.clone() {
            let Some(row) = self.rows.get(&id) else {
                continue;
            };
            let original = self
                .rows_backup
                .get(&id)
                .cloned()
                .unwrap_or_else(|| row.values.clone());

            let patch = RowPatch::new(
                table.to_string(),
                column_names.clone(),
                row.values.clone(),
                original,
                row.rowid,
            );

            if patch.has_changes() {
                self.storage
                    .update_row(&patch)
                    .map_err(|e| fail(ChangeCategory::Changed, id, e))?;
            }

            self.mark_clean(id);
            self.idx_changed.shift_remove(&id);
            self.rows_backup.remove(&id);
            written.changed += 1;
        }

        let auto_key = self.auto_increment_key();

        for id in self.idx_new.clone() {
            let Some(row) = self.rows.get(&id) else {
                continue;
            };

            let insert = RowInsert::new(table.to_string(), column_names.clone(), row.values.clone());
            let result = self
                .storage
                .insert_row(&insert)
                .map_err(|e| fail(ChangeCategory::New, id, e))?;

            let has_rowid = self.rowid_alias.is_some();
            if let Some(row) = self.rows.get_mut(&id) {
                if let Some(rowid) = result.last_insert_rowid {
                    if let Some(cell) = auto_key.and_then(|col| row.values.get_mut(col)) {
                        if cell.is_null() {
                            *cell = Value::Int(rowid);
                        }
                    }
                    if has_rowid {
                        row.rowid = Some(rowid);
                    }
                }
                row.state = RowState::Clean;
            }

            self.idx_new.shift_remove(&id);
            written.new += 1;
        }

        for id in self.idx_deleted.clone() {
            let Some(row) = self.rows.get(&id) else {
                continue;
            };

            let delete = RowDelete::new(
                table.to_string(),
                column_names.clone(),
                row.values.clone(),
                row.rowid,
            );
            self.storage
                .delete_row(&delete)
                .map_err(|e| fail(ChangeCategory::Deleted, id, e))?;

            self.rows.remove(&id);
            self.idx_all.retain(|other| *other != id);
            self.idx_deleted.shift_remove(&id);
            written.deleted += 1;
        }

        Ok(())
    }

    /// Discard every pending change without touching storage.
    pub fn undo_changes(&mut self) {
        if !self.is_changed() {
            return;
        }

        let rows_before = self.row_count();
        let summary = self.change_summary();

        for (id, backup) in self.rows_backup.drain() {
            if let Some(row) = self.rows.get_mut(&id) {
                row.values = backup;
                row.state = RowState::Clean;
            }
        }
        self.idx_changed.clear();

        for id in self.idx_new.drain(..) {
            self.rows.remove(&id);
            self.idx_all.retain(|other| *other != id);
        }
        self.row_count = self.row_count.saturating_sub(summary.new);

        for id in self.idx_deleted.drain(..) {
            if let Some(row) = self.rows.get_mut(&id) {
                row.state = RowState::Clean;
            }
        }
        self.row_count += summary.deleted;

        self.rebuild_visible();
        self.reapply_sort();

        log::info!("[UNDO] Discarded {}", summary);
        self.notify_row_delta(rows_before);
        self.emit(GridEvent::Refresh);
    }

    /// Column index of a single INTEGER primary key, whose NULL value SQLite
    /// replaces with the rowid on insert.
    fn auto_increment_key(&self) -> Option<usize> {
        let mut keys = self
            .columns
            .iter()
            .enumerate()
            .filter(|(_, column)| column.is_primary_key);

        match (keys.next(), keys.next()) {
            (Some((col, column)), None) if column.kind == ColumnKind::Integer => Some(col),
            _ => None,
        }
    }

    fn mark_clean(&mut self, id: RowId) {
        if let Some(row) = self.rows.get_mut(&id) {
            row.state = RowState::Clean;
        }
    }
}
