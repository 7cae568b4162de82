use std::fmt;

use crate::Value;

/// Row-count and content changes pushed to the attached view.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum GridEvent {
    /// Rows were added at the end of the visible range.
    RowsAppended(usize),

    /// `count` rows were removed starting at visible position `at`.
    RowsDeleted { at: usize, count: usize },

    /// Cell contents, order or styles changed; row count is unchanged.
    Refresh,
}

/// Pull-based consumer of a [`RowCache`](super::RowCache).
///
/// The view owns no grid state; it reads counts and values back from the
/// cache after each event.
pub trait GridView: Send {
    fn handle_event(&mut self, event: &GridEvent);
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SortDirection {
    Ascending,
    #[default]
    Descending,
}

impl SortDirection {
    pub fn toggled(self) -> Self {
        match self {
            Self::Ascending => Self::Descending,
            Self::Descending => Self::Ascending,
        }
    }

    /// Marker appended to the sorted column's label.
    pub fn marker(&self) -> &'static str {
        match self {
            Self::Ascending => "↑",
            Self::Descending => "↓",
        }
    }
}

/// Active sort of a grid.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SortState {
    pub column_ix: usize,
    pub direction: SortDirection,
}

impl SortState {
    pub fn new(column_ix: usize, direction: SortDirection) -> Self {
        Self {
            column_ix,
            direction,
        }
    }

    pub fn ascending(column_ix: usize) -> Self {
        Self::new(column_ix, SortDirection::Ascending)
    }

    pub fn descending(column_ix: usize) -> Self {
        Self::new(column_ix, SortDirection::Descending)
    }
}

/// Filter on one column.
#[derive(Debug, Clone, PartialEq)]
pub enum ColumnFilter {
    /// Numeric columns: the cell must equal the number.
    Equals(Value),

    /// Other columns: case-insensitive substring of the cell text.
    Contains(String),
}

impl fmt::Display for ColumnFilter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Equals(value) => write!(f, "= {}", value),
            Self::Contains(text) => write!(f, "like \"{}\"", text),
        }
    }
}
