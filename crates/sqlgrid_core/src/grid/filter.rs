use super::{ColumnFilter, GridEvent, GridRow, RowCache, cell_text, parse_numeric};

impl RowCache {
    /// Filter a column by a value typed by the user.
    ///
    /// Numeric columns match the number exactly and reject unparsable input,
    /// leaving the filters unchanged. Other columns match a case-insensitive
    /// substring. Returns whether the filter was applied.
    pub fn add_filter(&mut self, col: usize, raw: &str) -> bool {
        let Some(column) = self.columns.get(col) else {
            return false;
        };

        let filter = if column.kind.is_numeric() {
            match parse_numeric(raw) {
                Ok(value) => ColumnFilter::Equals(value),
                Err(e) => {
                    log::debug!("[FILTER] Ignored filter on {}: {}", column.name, e);
                    return false;
                }
            }
        } else {
            ColumnFilter::Contains(raw.to_string())
        };

        log::debug!("[FILTER] {} {}", column.name, filter);
        self.seek_to_known_end();
        let rows_before = self.row_count();
        self.filters.insert(col, filter);
        self.refilter(rows_before);

        true
    }

    pub fn remove_filter(&mut self, col: usize) {
        self.seek_to_known_end();
        let rows_before = self.row_count();
        self.filters.remove(&col);
        self.refilter(rows_before);
    }

    pub fn clear_filter(&mut self) {
        self.seek_to_known_end();
        let rows_before = self.row_count();
        self.filters.clear();
        self.refilter(rows_before);
    }

    /// Rebuild the visible rows from the retrieved ones and the active
    /// filters, then reapply the active sort.
    ///
    /// Rows the cursor has not produced yet are not considered; query grids
    /// should be drained first when a complete result matters.
    pub fn filter(&mut self) {
        self.seek_to_known_end();
        let rows_before = self.row_count();
        self.refilter(rows_before);
    }

    fn refilter(&mut self, rows_before: usize) {
        self.rebuild_visible();
        self.reapply_sort();

        log::debug!(
            "[FILTER] {} of {} rows visible",
            self.rows_current.len(),
            self.idx_all.len()
        );

        self.notify_row_delta(rows_before);
        self.emit(GridEvent::Refresh);
    }

    /// `idx_all` minus deleted rows and rows failing a filter.
    pub(crate) fn rebuild_visible(&mut self) {
        let visible: Vec<_> = self
            .idx_all
            .iter()
            .filter(|id| {
                self.rows
                    .get(id)
                    .is_some_and(|row| !row.state.is_deleted() && self.matches_filters(row))
            })
            .copied()
            .collect();

        self.rows_current = visible;
    }

    pub(crate) fn matches_filters(&self, row: &GridRow) -> bool {
        self.filters.iter().all(|(&col, filter)| {
            let (Some(column), Some(value)) = (self.columns.get(col), row.values.get(col)) else {
                return true;
            };

            match filter {
                ColumnFilter::Equals(expected) => value.numeric_eq(expected),
                ColumnFilter::Contains(needle) => cell_text(column, value)
                    .to_lowercase()
                    .contains(&needle.to_lowercase()),
            }
        })
    }
}
