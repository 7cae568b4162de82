use crate::{ExportError, Exporter, column_names};
use sqlgrid_core::{RowCache, Value};
use std::io::Write;

pub struct JsonExporter {
    pub pretty: bool,
}

impl Exporter for JsonExporter {
    fn name(&self) -> &'static str {
        if self.pretty {
            "JSON (pretty)"
        } else {
            "JSON (compact)"
        }
    }

    fn extension(&self) -> &'static str {
        "json"
    }

    fn export(&self, grid: &mut RowCache, writer: &mut dyn Write) -> Result<(), ExportError> {
        let columns = column_names(grid);
        let json_value = serde_json::Value::Array(
            grid.rows()
                .map(|row| row_to_json_object(&columns, &row))
                .collect(),
        );

        if self.pretty {
            serde_json::to_writer_pretty(writer, &json_value)?;
        } else {
            serde_json::to_writer(writer, &json_value)?;
        }

        Ok(())
    }
}

fn row_to_json_object(columns: &[String], row: &[Value]) -> serde_json::Value {
    let mut map = serde_json::Map::new();

    for (col, value) in columns.iter().zip(row.iter()) {
        map.insert(col.clone(), Value::to_serde_json(value));
    }

    serde_json::Value::Object(map)
}
