use crate::{ExportError, Exporter, column_names};
use sqlgrid_core::RowCache;
use std::io::Write;

/// Tab-separated rows under a header line.
pub struct TextExporter;

impl Exporter for TextExporter {
    fn name(&self) -> &'static str {
        "Text"
    }

    fn extension(&self) -> &'static str {
        "txt"
    }

    fn export(&self, grid: &mut RowCache, writer: &mut dyn Write) -> Result<(), ExportError> {
        let header = column_names(grid);
        if !header.is_empty() {
            writeln!(writer, "{}", header.join("\t"))?;
        }

        for row in grid.rows() {
            let fields: Vec<String> = row.iter().map(|v| v.as_display_string()).collect();
            writeln!(writer, "{}", fields.join("\t"))?;
        }

        Ok(())
    }
}
