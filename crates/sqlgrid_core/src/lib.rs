pub mod blob;
mod config;
mod crud;
mod error;
pub mod grid;
mod schema;
mod sql_dialect;
mod sql_query_builder;
mod traits;
mod value;

pub use config::{ConfigStore, DEFAULT_ROWID_ALIAS, DEFAULT_SEEK_CHUNK_LENGTH, GridConfig};
pub use crud::{CrudResult, RecordIdentity, RowDelete, RowInsert, RowPatch};
pub use error::{ChangeCategory, CommitError, DbError, GridError, ValidationError};
pub use grid::{
    CellStyle, CellStyleHint, ChangeSummary, ColumnFilter, GridEvent, GridRow, GridSource,
    GridView, RowCache, RowId, RowIter, RowState, SortDirection, SortState, TableSource,
};
pub use schema::{ColumnInfo, ColumnKind};
pub use sql_dialect::{DefaultSqlDialect, SqlDialect};
pub use sql_query_builder::SqlQueryBuilder;
pub use traits::{BufferedCursor, RowCursor, StorageFacade};
pub use value::{Row, Value};
