mod csv;
mod json;
mod text;

use sqlgrid_core::RowCache;
use std::io::Write;
use thiserror::Error;

pub use csv::CsvExporter;
pub use json::JsonExporter;
pub use text::TextExporter;

#[derive(Debug, Error)]
pub enum ExportError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("CSV error: {0}")]
    Csv(#[from] ::csv::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

/// Writes the rows of a grid, in its current filter and sort order.
pub trait Exporter {
    fn name(&self) -> &'static str;

    fn extension(&self) -> &'static str;

    fn export(&self, grid: &mut RowCache, writer: &mut dyn Write) -> Result<(), ExportError>;
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExportFormat {
    Csv,
    JsonPretty,
    JsonCompact,
    Text,
}

impl ExportFormat {
    pub const ALL: [ExportFormat; 4] = [
        ExportFormat::Csv,
        ExportFormat::JsonPretty,
        ExportFormat::JsonCompact,
        ExportFormat::Text,
    ];

    pub fn name(self) -> &'static str {
        match self {
            Self::Csv => "CSV",
            Self::JsonPretty => "JSON (pretty)",
            Self::JsonCompact => "JSON (compact)",
            Self::Text => "Text",
        }
    }

    pub fn extension(self) -> &'static str {
        match self {
            Self::Csv => "csv",
            Self::JsonPretty | Self::JsonCompact => "json",
            Self::Text => "txt",
        }
    }

    /// Format for a command-line name such as `csv` or `json-compact`.
    pub fn from_cli_name(name: &str) -> Option<Self> {
        match name.to_ascii_lowercase().as_str() {
            "csv" => Some(Self::Csv),
            "json" | "json-pretty" => Some(Self::JsonPretty),
            "json-compact" => Some(Self::JsonCompact),
            "text" | "txt" | "tsv" => Some(Self::Text),
            _ => None,
        }
    }
}

/// Export every row of `grid` that passes its filters.
///
/// Drains the grid's cursor first, so the output is complete even when only
/// part of the result had been retrieved. Rows drained that way are run
/// through the active filters and sort before anything is written.
pub fn export(
    grid: &mut RowCache,
    format: ExportFormat,
    writer: &mut dyn Write,
) -> Result<(), ExportError> {
    let drained_from = grid.retrieved_count();
    grid.seek_ahead(true);
    if grid.retrieved_count() != drained_from {
        grid.filter();
    }
    log::debug!(
        "[EXPORT] Writing {} rows as {}",
        grid.row_count(),
        format.name()
    );

    match format {
        ExportFormat::Csv => CsvExporter.export(grid, writer),
        ExportFormat::JsonPretty => JsonExporter { pretty: true }.export(grid, writer),
        ExportFormat::JsonCompact => JsonExporter { pretty: false }.export(grid, writer),
        ExportFormat::Text => TextExporter.export(grid, writer),
    }
}

fn column_names(grid: &RowCache) -> Vec<String> {
    grid.columns().iter().map(|c| c.name.clone()).collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn cli_names_map_to_formats() {
        assert_eq!(ExportFormat::from_cli_name("CSV"), Some(ExportFormat::Csv));
        assert_eq!(
            ExportFormat::from_cli_name("json-compact"),
            Some(ExportFormat::JsonCompact)
        );
        assert_eq!(ExportFormat::from_cli_name("tsv"), Some(ExportFormat::Text));
        assert_eq!(ExportFormat::from_cli_name("xml"), None);
        assert_eq!(ExportFormat::JsonCompact.extension(), "json");
    }
}
