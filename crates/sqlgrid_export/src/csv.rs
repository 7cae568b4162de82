use crate::{ExportError, Exporter, column_names};
use csv::Writer;
use sqlgrid_core::{RowCache, Value};
use std::io::Write;

pub struct CsvExporter;

impl Exporter for CsvExporter {
    fn name(&self) -> &'static str {
        "CSV"
    }

    fn extension(&self) -> &'static str {
        "csv"
    }

    fn export(&self, grid: &mut RowCache, writer: &mut dyn Write) -> Result<(), ExportError> {
        let mut csv_writer = Writer::from_writer(writer);

        csv_writer.write_record(column_names(grid))?;

        for row in grid.rows() {
            for value in row.iter() {
                let field = value_to_csv_field(value);
                csv_writer.write_field(&field)?;
            }
            csv_writer.write_record(None::<&[u8]>)?;
        }

        csv_writer.flush()?;
        Ok(())
    }
}

fn value_to_csv_field(value: &Value) -> String {
    match value {
        Value::Null => "\\N".to_string(),
        Value::Int(i) => i.to_string(),
        Value::Float(f) => {
            if f.is_nan() {
                "NaN".to_string()
            } else if f.is_infinite() {
                if f.is_sign_positive() {
                    "Infinity".to_string()
                } else {
                    "-Infinity".to_string()
                }
            } else {
                f.to_string()
            }
        }
        Value::Text(s) => s.clone(),
        Value::Bytes(b) => format!("\\x{}", hex::encode(b)),
    }
}
