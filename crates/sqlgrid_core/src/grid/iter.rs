use super::RowCache;
use crate::Row;

/// Rows of a grid in visible order, retrieving from the live cursor as it
/// goes. Created by [`RowCache::rows`].
pub struct RowIter<'a> {
    cache: &'a mut RowCache,
    position: usize,
}

impl RowCache {
    /// Iterate all rows matching the current filter, in the current order.
    ///
    /// Rows not yet retrieved are pulled from the open cursor rather than by
    /// re-running the query, so a second pass only sees what the first one
    /// left retrieved plus whatever the cursor still holds.
    pub fn rows(&mut self) -> RowIter<'_> {
        RowIter {
            cache: self,
            position: 0,
        }
    }
}

impl Iterator for RowIter<'_> {
    type Item = Row;

    fn next(&mut self) -> Option<Row> {
        self.cache.ensure_visible(self.position);

        let id = self.cache.rows_current.get(self.position)?;
        let row = self.cache.rows.get(id)?.values.clone();
        self.position += 1;

        Some(row)
    }
}
