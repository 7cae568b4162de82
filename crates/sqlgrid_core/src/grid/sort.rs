use std::cmp::Ordering;
use std::collections::HashMap;

use super::{GridEvent, RowCache, RowId, SortDirection, SortState, cell_text};
use crate::Value;

impl RowCache {
    /// Sort by a column. Sorting the active column again flips the
    /// direction; a newly sorted column starts descending.
    pub fn sort_column(&mut self, col: usize) {
        if col >= self.columns.len() {
            return;
        }

        self.seek_to_known_end();

        let direction = match self.sort {
            Some(sort) if sort.column_ix == col => sort.direction.toggled(),
            _ => SortDirection::default(),
        };

        self.sort = Some(SortState::new(col, direction));
        log::debug!("[SORT] Column {} {:?}", col, direction);

        self.reapply_sort();
        self.emit(GridEvent::Refresh);
    }

    /// Drop the sort and restore retrieval order.
    pub fn clear_sort(&mut self) {
        self.sort = None;

        let positions: HashMap<RowId, usize> = self
            .idx_all
            .iter()
            .enumerate()
            .map(|(position, id)| (*id, position))
            .collect();

        self.rows_current
            .sort_by_key(|id| positions.get(id).copied().unwrap_or(usize::MAX));

        log::debug!("[SORT] Cleared");
        self.emit(GridEvent::Refresh);
    }

    /// Sort the visible rows again by the active sort, if any, without
    /// changing its direction.
    pub fn reapply_sort(&mut self) {
        let Some(SortState {
            column_ix,
            direction,
        }) = self.sort
        else {
            return;
        };
        let Some(column) = self.columns.get(column_ix) else {
            return;
        };

        let cell = |id: &RowId| {
            self.rows
                .get(id)
                .and_then(|row| row.values.get(column_ix))
                .unwrap_or(&Value::Null)
        };

        let numeric = self
            .rows_current
            .iter()
            .all(|id| cell(id).is_numeric_or_null());

        let mut keyed: Vec<(RowId, SortKey)> = self
            .rows_current
            .iter()
            .map(|id| {
                let value = cell(id);
                let key = if numeric {
                    SortKey::Number(value.clone())
                } else {
                    SortKey::Text(cell_text(column, value).to_lowercase())
                };
                (*id, key)
            })
            .collect();

        keyed.sort_by(|(_, a), (_, b)| match direction {
            SortDirection::Ascending => a.cmp(b),
            SortDirection::Descending => b.cmp(a),
        });

        self.rows_current = keyed.into_iter().map(|(id, _)| id).collect();
    }
}

/// Numbers sort with NULL lowest; everything else as lowercase text with
/// NULL as the empty string.
#[derive(Debug, PartialEq, Eq)]
enum SortKey {
    Number(Value),
    Text(String),
}

impl PartialOrd for SortKey {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for SortKey {
    fn cmp(&self, other: &Self) -> Ordering {
        match (self, other) {
            (Self::Number(a), Self::Number(b)) => a.cmp(b),
            (Self::Text(a), Self::Text(b)) => a.cmp(b),
            (Self::Number(_), Self::Text(_)) => Ordering::Less,
            (Self::Text(_), Self::Number(_)) => Ordering::Greater,
        }
    }
}
