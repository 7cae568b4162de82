use super::{RowCache, RowState};
use crate::ColumnKind;

/// Rendering hint for one cell, derived from its row state.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum CellStyleHint {
    #[default]
    Default,

    /// Row inserted and not yet saved.
    New,

    /// Row has unsaved edits, but not in this cell.
    RowChanged,

    /// This cell differs from the stored value.
    CellChanged,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct CellStyle {
    pub hint: CellStyleHint,

    /// Blob columns want an editor that can hold several lines.
    pub multiline: bool,
}

impl RowCache {
    /// Style of a visible cell. Computed on every call from the current row
    /// state; never retrieves rows.
    pub fn cell_style(&self, row: usize, col: usize) -> CellStyle {
        let multiline = self
            .columns
            .get(col)
            .is_some_and(|column| column.kind == ColumnKind::Blob);

        let hint = self
            .rows_current
            .get(row)
            .and_then(|id| self.rows.get(id).map(|data| (id, data)))
            .map(|(id, data)| match data.state {
                RowState::New => CellStyleHint::New,
                RowState::Changed => {
                    let stored = self.rows_backup.get(id).and_then(|backup| backup.get(col));
                    if stored.is_some_and(|stored| Some(stored) != data.values.get(col)) {
                        CellStyleHint::CellChanged
                    } else {
                        CellStyleHint::RowChanged
                    }
                }
                RowState::Clean | RowState::Deleted => CellStyleHint::Default,
            })
            .unwrap_or_default();

        CellStyle { hint, multiline }
    }
}
