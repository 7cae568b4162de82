use crate::FakeStorage;
use sqlgrid_core::{ColumnInfo, Row, Value};

pub const NUMBERS_QUERY: &str = "SELECT n, label FROM numbers";

pub fn column(name: impl Into<String>, type_name: impl Into<String>) -> ColumnInfo {
    ColumnInfo::new(name, type_name)
}

pub fn pk_column(name: impl Into<String>, type_name: impl Into<String>) -> ColumnInfo {
    ColumnInfo::new(name, type_name).primary_key().not_null()
}

pub fn int_cell(value: i64) -> Value {
    Value::Int(value)
}

pub fn float_cell(value: f64) -> Value {
    Value::Float(value)
}

pub fn text_cell(value: impl Into<String>) -> Value {
    Value::Text(value.into())
}

pub fn blob_cell(value: impl Into<Vec<u8>>) -> Value {
    Value::Bytes(value.into())
}

/// `T(id INTEGER PRIMARY KEY, name TEXT)` holding `(1, "a"), (2, "b")`.
pub fn two_row_table() -> FakeStorage {
    FakeStorage::new().with_table(
        "T",
        vec![pk_column("id", "INTEGER"), column("name", "TEXT")],
        vec![
            vec![int_cell(1), text_cell("a")],
            vec![int_cell(2), text_cell("b")],
        ],
    )
}

/// `people(id INTEGER PRIMARY KEY, name TEXT, age INTEGER, photo BLOB)`.
pub fn people_table() -> FakeStorage {
    FakeStorage::new().with_table(
        "people",
        vec![
            pk_column("id", "INTEGER"),
            column("name", "TEXT"),
            column("age", "INTEGER"),
            column("photo", "BLOB"),
        ],
        vec![
            vec![int_cell(1), text_cell("Carol"), int_cell(41), Value::Null],
            vec![int_cell(2), text_cell("alice"), int_cell(30), blob_cell(vec![0u8, 1])],
            vec![int_cell(3), text_cell("Bob"), Value::Null, Value::Null],
            vec![int_cell(4), text_cell("dave"), int_cell(30), Value::Null],
        ],
    )
}

/// Rows `(0, "row 0") .. (count - 1, "row count-1")` served for
/// [`NUMBERS_QUERY`].
pub fn numbers_rows(count: usize) -> Vec<Row> {
    (0..count)
        .map(|n| vec![int_cell(n as i64), text_cell(format!("row {}", n))])
        .collect()
}

pub fn numbers_query(count: usize) -> FakeStorage {
    FakeStorage::new().with_query_result(
        NUMBERS_QUERY,
        vec!["n".to_string(), "label".to_string()],
        numbers_rows(count),
    )
}
