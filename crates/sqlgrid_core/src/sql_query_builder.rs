use crate::Value;
use crate::crud::{RecordIdentity, RowDelete, RowInsert, RowPatch};
use crate::sql_dialect::SqlDialect;

/// Builds grid and CRUD SQL statements using a specific dialect.
pub struct SqlQueryBuilder<'a> {
    dialect: &'a dyn SqlDialect,
}

impl<'a> SqlQueryBuilder<'a> {
    pub fn new(dialect: &'a dyn SqlDialect) -> Self {
        Self { dialect }
    }

    /// Build the row query of a table-backed grid.
    ///
    /// Returns SQL like: `SELECT rowid AS "_rowid_", * FROM "table" WHERE .. ORDER BY ..`.
    /// Without `rowid_alias` the rowid column is omitted.
    pub fn build_table_select(
        &self,
        table: &str,
        rowid_alias: Option<&str>,
        where_clause: Option<&str>,
        order_by: Option<&str>,
    ) -> String {
        let columns = match rowid_alias {
            Some(alias) => format!("rowid AS {}, *", self.dialect.quote_identifier(alias)),
            None => "*".to_string(),
        };

        let mut sql = format!(
            "SELECT {} FROM {}",
            columns,
            self.dialect.quote_identifier(table)
        );
        push_clauses(&mut sql, where_clause, order_by);
        sql
    }

    /// Build `SELECT COUNT(*) FROM "table" WHERE ..`.
    pub fn build_table_count(&self, table: &str, where_clause: Option<&str>) -> String {
        let mut sql = format!(
            "SELECT COUNT(*) AS row_count FROM {}",
            self.dialect.quote_identifier(table)
        );
        push_clauses(&mut sql, where_clause, None);
        sql
    }

    /// Build UPDATE statement from RowPatch.
    ///
    /// Returns SQL like: `UPDATE "table" SET "col1" = val1 WHERE rowid = 5`.
    /// Only columns that differ from the original are set; returns None when
    /// nothing changed or the row cannot be identified.
    pub fn build_update(&self, patch: &RowPatch, primary_key: &[String]) -> Option<String> {
        let changes = patch.changes();
        if changes.is_empty() {
            return None;
        }

        let identity = patch.identity(primary_key)?;
        let where_clause = self.build_where_clause(&identity)?;

        Some(format!(
            "UPDATE {} SET {} WHERE {}",
            self.dialect.quote_identifier(&patch.table),
            self.build_set_clause(&changes),
            where_clause
        ))
    }

    /// Build INSERT statement from RowInsert.
    ///
    /// Returns SQL like: `INSERT INTO "table" ("col1", "col2") VALUES (val1, val2)`,
    /// or `INSERT INTO "table" DEFAULT VALUES` when no columns are given.
    pub fn build_insert(&self, insert: &RowInsert) -> String {
        let table = self.dialect.quote_identifier(&insert.table);

        if insert.is_empty() {
            return format!("INSERT INTO {} DEFAULT VALUES", table);
        }

        format!(
            "INSERT INTO {} ({}) VALUES ({})",
            table,
            self.build_column_list(&insert.columns),
            self.build_values_list(&insert.values)
        )
    }

    /// Build DELETE statement from RowDelete.
    ///
    /// Returns SQL like: `DELETE FROM "table" WHERE "pk" IS pkval`.
    pub fn build_delete(&self, delete: &RowDelete, primary_key: &[String]) -> Option<String> {
        let identity = delete.identity(primary_key)?;
        let where_clause = self.build_where_clause(&identity)?;

        Some(format!(
            "DELETE FROM {} WHERE {}",
            self.dialect.quote_identifier(&delete.table),
            where_clause
        ))
    }

    /// Build WHERE clause from RecordIdentity.
    ///
    /// Returns `rowid = 5` or `"col1" IS val1 AND "col2" IS val2`.
    pub fn build_where_clause(&self, identity: &RecordIdentity) -> Option<String> {
        if !identity.is_valid() {
            return None;
        }

        match identity {
            RecordIdentity::Rowid(rowid) => Some(format!("rowid = {}", rowid)),
            RecordIdentity::Composite { columns, values } => {
                let conditions: Vec<String> = columns
                    .iter()
                    .zip(values.iter())
                    .map(|(col, val)| {
                        format!(
                            "{} IS {}",
                            self.dialect.quote_identifier(col),
                            self.dialect.value_to_literal(val)
                        )
                    })
                    .collect();

                Some(conditions.join(" AND "))
            }
        }
    }

    /// Build SET clause for UPDATE.
    ///
    /// Returns `"col1" = val1, "col2" = val2`.
    pub fn build_set_clause(&self, changes: &[(String, Value)]) -> String {
        let assignments: Vec<String> = changes
            .iter()
            .map(|(col, val)| {
                format!(
                    "{} = {}",
                    self.dialect.quote_identifier(col),
                    self.dialect.value_to_literal(val)
                )
            })
            .collect();

        assignments.join(", ")
    }

    pub fn build_column_list(&self, columns: &[String]) -> String {
        columns
            .iter()
            .map(|c| self.dialect.quote_identifier(c))
            .collect::<Vec<_>>()
            .join(", ")
    }

    pub fn build_values_list(&self, values: &[Value]) -> String {
        values
            .iter()
            .map(|v| self.dialect.value_to_literal(v))
            .collect::<Vec<_>>()
            .join(", ")
    }
}

fn push_clauses(sql: &mut String, where_clause: Option<&str>, order_by: Option<&str>) {
    if let Some(filter) = where_clause.map(str::trim).filter(|s| !s.is_empty()) {
        sql.push_str(" WHERE ");
        sql.push_str(filter);
    }

    if let Some(order) = order_by.map(str::trim).filter(|s| !s.is_empty()) {
        sql.push_str(" ORDER BY ");
        sql.push_str(order);
    }
}
