use std::fmt;

use crate::{Row, Value};

/// Process-local identity of a grid row.
///
/// Assigned when a row is retrieved or inserted and never reused by the same
/// cache, so it survives sorting and filtering.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct RowId(u64);

impl RowId {
    pub fn new(value: u64) -> Self {
        Self(value)
    }

    pub fn get(&self) -> u64 {
        self.0
    }
}

impl fmt::Display for RowId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// What has to happen to a row at commit time.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum RowState {
    /// Matches the stored row.
    #[default]
    Clean,

    /// Edited; a backup of the stored values exists.
    Changed,

    /// Inserted locally, not yet written.
    New,

    /// Removed from the visible set, deleted on commit.
    Deleted,
}

impl RowState {
    pub fn is_clean(&self) -> bool {
        matches!(self, Self::Clean)
    }

    pub fn is_changed(&self) -> bool {
        matches!(self, Self::Changed)
    }

    pub fn is_new(&self) -> bool {
        matches!(self, Self::New)
    }

    pub fn is_deleted(&self) -> bool {
        matches!(self, Self::Deleted)
    }
}

/// A row held by a [`RowCache`](super::RowCache).
#[derive(Debug, Clone, PartialEq)]
pub struct GridRow {
    pub(crate) id: RowId,
    pub(crate) values: Row,
    pub(crate) state: RowState,

    /// Physical rowid, known for retrieved rows of rowid tables and for
    /// inserted rows once committed.
    pub(crate) rowid: Option<i64>,
}

impl GridRow {
    pub(crate) fn retrieved(id: RowId, values: Row, rowid: Option<i64>) -> Self {
        Self {
            id,
            values,
            state: RowState::Clean,
            rowid,
        }
    }

    pub(crate) fn blank(id: RowId, column_count: usize) -> Self {
        Self {
            id,
            values: vec![Value::Null; column_count],
            state: RowState::New,
            rowid: None,
        }
    }

    pub fn id(&self) -> RowId {
        self.id
    }

    pub fn values(&self) -> &[Value] {
        &self.values
    }

    pub fn value(&self, col: usize) -> Option<&Value> {
        self.values.get(col)
    }

    pub fn state(&self) -> RowState {
        self.state
    }

    pub fn rowid(&self) -> Option<i64> {
        self.rowid
    }
}
