//! Virtual row cache behind a data grid.
//!
//! A [`RowCache`] wraps either a whole table or a free-form read query. Rows
//! are pulled from the storage cursor only as far as the view asks for them,
//! while filtering, sorting and edits operate on the rows retrieved so far.
//! Edits stay local until [`RowCache::save_changes`] writes them through the
//! [`StorageFacade`] or [`RowCache::undo_changes`] discards them.

mod commit;
mod edit;
mod events;
mod filter;
mod iter;
mod retrieval;
mod row;
mod sort;
mod style;

pub use commit::ChangeSummary;
pub use edit::{parse_cell_input, parse_numeric};
pub use events::{ColumnFilter, GridEvent, GridView, SortDirection, SortState};
pub use iter::RowIter;
pub use row::{GridRow, RowId, RowState};
pub use style::{CellStyle, CellStyleHint};

use std::collections::{BTreeMap, HashMap};
use std::sync::Arc;

use indexmap::IndexSet;

use crate::config::GridConfig;
use crate::sql_query_builder::SqlQueryBuilder;
use crate::{
    ColumnInfo, ColumnKind, DbError, Row, RowCursor, StorageFacade, Value, blob,
};

/// A table and the optional clauses restricting which of its rows a grid
/// shows.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct TableSource {
    pub name: String,

    /// Condition without the `WHERE` keyword, e.g. `a = b AND c < 3`.
    pub where_clause: Option<String>,

    /// Ordering without the `ORDER BY` keywords, e.g. `a DESC, b`.
    pub order_by: Option<String>,
}

impl TableSource {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            where_clause: None,
            order_by: None,
        }
    }

    pub fn with_where(mut self, where_clause: impl Into<String>) -> Self {
        self.where_clause = Some(where_clause.into());
        self
    }

    pub fn with_order(mut self, order_by: impl Into<String>) -> Self {
        self.order_by = Some(order_by.into());
        self
    }
}

/// Where the rows of a grid come from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum GridSource {
    Table(TableSource),
    Query(String),
}

/// Lazily filled, editable view over a table or query result.
pub struct RowCache {
    storage: Arc<dyn StorageFacade>,
    source: GridSource,
    columns: Vec<ColumnInfo>,

    /// Alias the rowid is selected under; `None` for query grids and tables
    /// without rowid.
    rowid_alias: Option<String>,

    cursor: Option<Box<dyn RowCursor>>,
    chunk_length: usize,

    rows: HashMap<RowId, GridRow>,

    /// Every live row in retrieval order, inserted rows first.
    idx_all: Vec<RowId>,

    /// Visible rows: `idx_all` filtered, then sorted.
    rows_current: Vec<RowId>,

    idx_changed: IndexSet<RowId>,
    idx_new: IndexSet<RowId>,
    idx_deleted: IndexSet<RowId>,
    rows_backup: HashMap<RowId, Row>,

    filters: BTreeMap<usize, ColumnFilter>,
    sort: Option<SortState>,

    /// Exact for table grids, optimistic for query grids until the cursor is
    /// exhausted.
    row_count: usize,

    /// Rows the table cursor produces in total, from the COUNT taken at
    /// construction. `None` for query grids.
    source_rows: Option<usize>,

    /// Rows pulled from the cursor so far.
    retrieved: usize,
    next_id: u64,

    view: Option<Box<dyn GridView>>,
}

impl RowCache {
    /// Grid over a whole table, editable.
    pub fn from_table(
        storage: Arc<dyn StorageFacade>,
        table: TableSource,
        config: &GridConfig,
    ) -> Result<Self, DbError> {
        let columns = storage.table_columns(&table.name)?;
        if columns.is_empty() {
            return Err(DbError::TableNotFound(table.name.clone()));
        }

        let alias = collision_safe_alias(&config.rowid_alias, &columns);
        let where_clause = table.where_clause.as_deref();
        let order_by = table.order_by.as_deref();

        let (cursor, rowid_alias, row_count) = {
            let builder = SqlQueryBuilder::new(storage.dialect());

            let select_with_rowid =
                builder.build_table_select(&table.name, Some(&alias), where_clause, order_by);

            let (cursor, rowid_alias) = match storage.execute(&select_with_rowid) {
                Ok(cursor) => (cursor, Some(alias)),
                Err(e) => {
                    log::debug!(
                        "[GRID] Rowid select on {} failed ({}), falling back to primary key",
                        table.name,
                        e
                    );
                    let select = builder.build_table_select(&table.name, None, where_clause, order_by);
                    (storage.execute(&select)?, None)
                }
            };

            let count_sql = builder.build_table_count(&table.name, where_clause);
            let row_count = fetch_count(storage.as_ref(), &count_sql)?;

            (cursor, rowid_alias, row_count)
        };

        log::info!(
            "[GRID] Opened table {} ({} columns, {} rows{})",
            table.name,
            columns.len(),
            row_count,
            if rowid_alias.is_some() { "" } else { ", no rowid" }
        );

        let mut cache = Self::new(storage, GridSource::Table(table), columns, cursor, config);
        cache.rowid_alias = rowid_alias;
        cache.row_count = row_count;
        cache.source_rows = Some(row_count);

        Ok(cache)
    }

    /// Grid over an arbitrary read statement. Query grids are read-only.
    pub fn from_query(
        storage: Arc<dyn StorageFacade>,
        sql: impl Into<String>,
        config: &GridConfig,
    ) -> Result<Self, DbError> {
        let sql = sql.into();
        let cursor = storage.execute(&sql)?;

        let columns = cursor
            .columns()
            .iter()
            .map(|name| ColumnInfo::query_column(name.clone()))
            .collect();

        let mut cache = Self::new(storage, GridSource::Query(sql), columns, cursor, config);
        cache.row_count = cache.chunk_length;
        cache.seek_to_row(cache.chunk_length - 1);
        cache.refine_query_column_kinds();

        log::info!(
            "[GRID] Opened query grid ({} columns, {} rows retrieved{})",
            cache.columns.len(),
            cache.retrieved,
            if cache.is_exhausted() { ", complete" } else { "" }
        );

        Ok(cache)
    }

    fn new(
        storage: Arc<dyn StorageFacade>,
        source: GridSource,
        columns: Vec<ColumnInfo>,
        cursor: Box<dyn RowCursor>,
        config: &GridConfig,
    ) -> Self {
        Self {
            storage,
            source,
            columns,
            rowid_alias: None,
            cursor: Some(cursor),
            chunk_length: config.chunk_length(),
            rows: HashMap::new(),
            idx_all: Vec::new(),
            rows_current: Vec::new(),
            idx_changed: IndexSet::new(),
            idx_new: IndexSet::new(),
            idx_deleted: IndexSet::new(),
            rows_backup: HashMap::new(),
            filters: BTreeMap::new(),
            sort: None,
            row_count: 0,
            source_rows: None,
            retrieved: 0,
            next_id: 0,
            view: None,
        }
    }

    /// Query columns start as text; numbers in the first row refine them.
    fn refine_query_column_kinds(&mut self) {
        let Some(first) = self.idx_all.first().and_then(|id| self.rows.get(id)) else {
            return;
        };

        for (column, value) in self.columns.iter_mut().zip(first.values.iter()) {
            match value {
                Value::Int(_) => column.kind = ColumnKind::Integer,
                Value::Float(_) => column.kind = ColumnKind::Real,
                _ => {}
            }
        }
    }

    /// Attach the view that receives [`GridEvent`]s.
    pub fn set_view(&mut self, view: Box<dyn GridView>) {
        self.view = Some(view);
    }

    pub fn take_view(&mut self) -> Option<Box<dyn GridView>> {
        self.view.take()
    }

    pub fn source(&self) -> &GridSource {
        &self.source
    }

    pub fn table_name(&self) -> Option<&str> {
        match &self.source {
            GridSource::Table(table) => Some(&table.name),
            GridSource::Query(_) => None,
        }
    }

    pub fn is_query(&self) -> bool {
        matches!(self.source, GridSource::Query(_))
    }

    pub fn columns(&self) -> &[ColumnInfo] {
        &self.columns
    }

    pub fn rowid_alias(&self) -> Option<&str> {
        self.rowid_alias.as_deref()
    }

    // --- Read contract ---

    /// Visible rows when a filter is active, else the tracked row count.
    pub fn row_count(&self) -> usize {
        if self.filters.is_empty() {
            self.row_count
        } else {
            self.rows_current.len()
        }
    }

    pub fn column_count(&self) -> usize {
        self.columns.len()
    }

    /// Column name with the sort marker and filter suffix, if any.
    pub fn column_label(&self, col: usize) -> String {
        let Some(column) = self.columns.get(col) else {
            return String::new();
        };

        let mut label = column.name.clone();

        if let Some(sort) = self.sort.filter(|sort| sort.column_ix == col) {
            label.push(' ');
            label.push_str(sort.direction.marker());
        }

        if let Some(filter) = self.filters.get(&col) {
            label.push('\n');
            label.push_str(&filter.to_string());
        }

        label
    }

    /// Cell text at a visible position, retrieving rows as needed.
    ///
    /// Empty for NULL and out-of-range cells. Blob cells come back in the
    /// escaped printable encoding.
    pub fn value(&mut self, row: usize, col: usize) -> String {
        if row < self.row_count() {
            self.ensure_visible(row);
        }

        let Some(column) = self.columns.get(col) else {
            return String::new();
        };

        self.rows_current
            .get(row)
            .and_then(|id| self.rows.get(id))
            .and_then(|data| data.values.get(col))
            .map(|value| cell_text(column, value))
            .unwrap_or_default()
    }

    /// Full record at a visible position, retrieving rows as needed.
    pub fn row(&mut self, row: usize) -> Option<&GridRow> {
        if row < self.row_count() {
            self.ensure_visible(row);
        }

        let id = self.rows_current.get(row)?;
        self.rows.get(id)
    }

    /// Identity of the row at a visible position, without retrieving.
    pub fn row_id(&self, row: usize) -> Option<RowId> {
        self.rows_current.get(row).copied()
    }

    pub fn get(&self, id: RowId) -> Option<&GridRow> {
        self.rows.get(&id)
    }

    /// Every live row id in retrieval order.
    pub fn retrieval_order(&self) -> &[RowId] {
        &self.idx_all
    }

    /// Visible row ids in display order.
    pub fn visible_order(&self) -> &[RowId] {
        &self.rows_current
    }

    pub fn filters(&self) -> &BTreeMap<usize, ColumnFilter> {
        &self.filters
    }

    pub fn sort(&self) -> Option<SortState> {
        self.sort
    }

    /// Rows pulled from the cursor so far.
    pub fn retrieved_count(&self) -> usize {
        self.retrieved
    }

    /// True once the cursor has been drained or closed.
    pub fn is_exhausted(&self) -> bool {
        self.cursor.is_none()
    }

    /// Release the cursor. Later seeks retrieve nothing.
    pub fn close(&mut self) {
        if self.cursor.take().is_some() {
            log::debug!("[GRID] Closed cursor after {} rows", self.retrieved);
        }
    }

    // --- Internal helpers ---

    fn allocate_id(&mut self) -> RowId {
        self.next_id += 1;
        RowId::new(self.next_id)
    }

    fn emit(&mut self, event: GridEvent) {
        if let Some(view) = self.view.as_mut() {
            view.handle_event(&event);
        }
    }

    /// Tell the view how the visible row count moved since `rows_before`.
    fn notify_row_delta(&mut self, rows_before: usize) {
        let rows_now = self.row_count();

        if rows_now > rows_before {
            self.emit(GridEvent::RowsAppended(rows_now - rows_before));
        } else if rows_now < rows_before {
            self.emit(GridEvent::RowsDeleted {
                at: rows_now,
                count: rows_before - rows_now,
            });
        }
    }
}

impl Drop for RowCache {
    fn drop(&mut self) {
        self.close();
    }
}

/// Text a cell is shown and edited as.
pub(crate) fn cell_text(column: &ColumnInfo, value: &Value) -> String {
    match (column.kind, value) {
        (ColumnKind::Blob, Value::Text(text)) => blob::escape(text.as_bytes()),
        _ => value.as_edit_text(),
    }
}

fn collision_safe_alias(base: &str, columns: &[ColumnInfo]) -> String {
    let mut alias = base.to_string();

    while columns
        .iter()
        .any(|column| column.name.eq_ignore_ascii_case(&alias))
    {
        alias.insert(0, '_');
    }

    alias
}

fn fetch_count(storage: &dyn StorageFacade, sql: &str) -> Result<usize, DbError> {
    let mut cursor = storage.execute(sql)?;
    let row = cursor
        .next_row()?
        .ok_or_else(|| DbError::query_failed(format!("No result from count query: {}", sql)))?;

    match row.first() {
        Some(Value::Int(count)) => Ok(usize::try_from(*count).unwrap_or(0)),
        Some(other) => Err(DbError::query_failed(format!(
            "Unexpected count result: {}",
            other
        ))),
        None => Err(DbError::query_failed("Count query returned no columns")),
    }
}
