//! rusqlite-backed storage facade for `sqlgrid_core` grids.

mod cursor;
mod driver;

pub use cursor::SqliteCursor;
pub use driver::{SqliteDialect, SqliteErrorFormatter, SqliteStorage};
