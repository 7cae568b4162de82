use std::collections::HashSet;

use sqlgrid_core::{
    CellStyleHint, ChangeCategory, ColumnFilter, ColumnKind, DbError, GridConfig, GridError,
    GridEvent, RowCache, RowId, TableSource, Value,
};
use sqlgrid_test_support::fixtures::{
    NUMBERS_QUERY, column, int_cell, numbers_query, people_table, pk_column, text_cell,
    two_row_table,
};
use sqlgrid_test_support::{FakeStorage, FakeWrite, RecordingView};

fn table_grid(storage: &FakeStorage, table: &str) -> Result<RowCache, DbError> {
    RowCache::from_table(
        storage.clone().as_storage_arc(),
        TableSource::new(table),
        &GridConfig::default(),
    )
}

fn query_grid(storage: &FakeStorage, chunk: usize) -> Result<RowCache, DbError> {
    RowCache::from_query(
        storage.clone().as_storage_arc(),
        NUMBERS_QUERY,
        &GridConfig::default().with_seek_chunk_length(chunk),
    )
}

fn column_values(grid: &mut RowCache, col: usize) -> Vec<String> {
    (0..grid.row_count()).map(|row| grid.value(row, col)).collect()
}

fn write_kinds(storage: &FakeStorage) -> Vec<&'static str> {
    storage.stats().writes.iter().map(FakeWrite::kind).collect()
}

/// Ids in retrieval order that are live and pass every active filter.
fn expected_visible(grid: &RowCache) -> HashSet<RowId> {
    grid.retrieval_order()
        .iter()
        .copied()
        .filter(|id| {
            let Some(row) = grid.get(*id) else {
                return false;
            };
            !row.state().is_deleted()
                && grid.filters().iter().all(|(col, filter)| {
                    let value = &row.values()[*col];
                    match filter {
                        ColumnFilter::Equals(expected) => value.numeric_eq(expected),
                        ColumnFilter::Contains(needle) => value
                            .as_edit_text()
                            .to_lowercase()
                            .contains(&needle.to_lowercase()),
                    }
                })
        })
        .collect()
}

fn visible_set(grid: &RowCache) -> HashSet<RowId> {
    grid.visible_order().iter().copied().collect()
}

// ---------------------------------------------------------------------------
// Construction
// ---------------------------------------------------------------------------

#[test]
fn table_grid_counts_rows_and_selects_rowid() -> Result<(), GridError> {
    let storage = people_table();
    let grid = RowCache::from_table(
        storage.clone().as_storage_arc(),
        TableSource::new("people")
            .with_where("age > 3")
            .with_order("name"),
        &GridConfig::default(),
    )?;

    assert_eq!(grid.row_count(), 4);
    assert_eq!(grid.column_count(), 4);
    assert_eq!(grid.rowid_alias(), Some("_rowid_"));
    assert_eq!(grid.retrieved_count(), 0);

    let executed = storage.stats().executed_sql;
    assert!(executed.contains(
        &"SELECT rowid AS \"_rowid_\", * FROM \"people\" WHERE age > 3 ORDER BY name".to_string()
    ));
    assert!(
        executed.contains(&"SELECT COUNT(*) AS row_count FROM \"people\" WHERE age > 3".to_string())
    );

    Ok(())
}

#[test]
fn rowid_alias_avoids_column_names() -> Result<(), GridError> {
    let storage = FakeStorage::new().with_table(
        "odd",
        vec![pk_column("_rowid_", "INTEGER"), column("v", "TEXT")],
        vec![vec![int_cell(9), text_cell("x")]],
    );

    let mut grid = table_grid(&storage, "odd")?;

    assert_eq!(grid.rowid_alias(), Some("__rowid_"));
    assert_eq!(grid.value(0, 0), "9");
    assert_eq!(grid.row(0).and_then(|row| row.rowid()), Some(1));

    Ok(())
}

#[test]
fn missing_table_is_reported() {
    let storage = FakeStorage::new();

    assert!(matches!(
        table_grid(&storage, "nope"),
        Err(DbError::TableNotFound(name)) if name == "nope"
    ));
}

#[test]
fn broken_query_fails_construction() {
    let storage = FakeStorage::new().with_query_error("SELECT oops", "near \"oops\": syntax error");

    let result = RowCache::from_query(
        storage.as_storage_arc(),
        "SELECT oops",
        &GridConfig::default(),
    );

    assert!(matches!(result, Err(DbError::QueryFailed(message)) if message.contains("syntax")));
}

#[test]
fn query_columns_are_refined_from_first_row() -> Result<(), GridError> {
    let storage = numbers_query(5);
    let grid = query_grid(&storage, 100)?;

    assert_eq!(grid.columns()[0].kind, ColumnKind::Integer);
    assert_eq!(grid.columns()[1].kind, ColumnKind::Text);
    assert!(grid.is_query());

    Ok(())
}

// ---------------------------------------------------------------------------
// Retrieval
// ---------------------------------------------------------------------------

#[test]
fn seek_to_row_twice_is_a_no_op() -> Result<(), GridError> {
    let storage = people_table();
    let mut grid = table_grid(&storage, "people")?;

    grid.seek_to_row(1);
    let pulls = storage.stats().cursor_pulls;
    let retrieved: Vec<RowId> = grid.retrieval_order().to_vec();
    assert_eq!(retrieved.len(), 2);

    grid.seek_to_row(1);

    assert_eq!(storage.stats().cursor_pulls, pulls);
    assert_eq!(grid.retrieval_order(), retrieved.as_slice());

    Ok(())
}

#[test]
fn reading_a_value_retrieves_lazily() -> Result<(), GridError> {
    let storage = people_table();
    let mut grid = table_grid(&storage, "people")?;

    assert_eq!(grid.value(1, 1), "alice");
    assert_eq!(grid.retrieved_count(), 2);

    assert_eq!(grid.value(2, 2), "");
    assert_eq!(grid.value(10, 1), "");
    assert_eq!(grid.value(0, 10), "");

    Ok(())
}

#[test]
fn query_grid_count_grows_until_exhausted() -> Result<(), GridError> {
    let storage = numbers_query(250);
    let mut grid = query_grid(&storage, 100)?;
    let view = RecordingView::new();
    grid.set_view(view.boxed());

    grid.seek_to_row(0);
    assert_eq!(grid.row_count(), 100);

    grid.seek_ahead(true);

    assert_eq!(grid.row_count(), 250);
    assert!(grid.is_exhausted());
    assert_eq!(view.count_changes(), vec![GridEvent::RowsAppended(150)]);

    Ok(())
}

#[test]
fn chunked_seeks_notify_once_per_chunk_plus_final_count() -> Result<(), GridError> {
    let storage = numbers_query(250);
    let mut grid = query_grid(&storage, 100)?;
    let view = RecordingView::new();
    grid.set_view(view.boxed());

    grid.seek_ahead(false);
    assert_eq!(grid.row_count(), 200);

    grid.seek_ahead(false);
    assert_eq!(grid.row_count(), 250);

    grid.seek_ahead(false);

    assert_eq!(
        view.count_changes(),
        vec![GridEvent::RowsAppended(100), GridEvent::RowsAppended(50)]
    );

    Ok(())
}

#[test]
fn row_iterator_drains_the_live_cursor() -> Result<(), GridError> {
    let storage = numbers_query(250);
    let mut grid = query_grid(&storage, 100)?;

    let rows: Vec<_> = grid.rows().collect();

    assert_eq!(rows.len(), 250);
    assert_eq!(rows[249][0], Value::Int(249));
    assert!(grid.is_exhausted());
    assert_eq!(storage.stats().executed_sql.len(), 1);

    Ok(())
}

#[test]
fn row_iterator_follows_filter() -> Result<(), GridError> {
    let storage = numbers_query(250);
    let mut grid = query_grid(&storage, 100)?;

    assert!(grid.add_filter(0, "7"));
    let rows: Vec<_> = grid.rows().collect();

    assert_eq!(rows, vec![vec![int_cell(7), text_cell("row 7")]]);

    Ok(())
}

#[test]
fn close_is_idempotent_and_stops_retrieval() -> Result<(), GridError> {
    let storage = people_table();
    let mut grid = table_grid(&storage, "people")?;

    grid.close();
    grid.close();

    assert!(grid.is_exhausted());
    assert_eq!(grid.value(0, 1), "");
    assert_eq!(grid.retrieved_count(), 0);

    Ok(())
}

// ---------------------------------------------------------------------------
// Editing
// ---------------------------------------------------------------------------

#[test]
fn inserted_row_is_saved_with_assigned_key() -> Result<(), GridError> {
    let storage = two_row_table();
    let mut grid = table_grid(&storage, "T")?;

    grid.insert_rows(0, 1)?;
    assert_eq!(grid.row_count(), 3);
    assert!(grid.is_changed());
    assert_eq!(grid.row(0).map(|row| row.state().is_new()), Some(true));

    assert!(grid.set_value(0, 1, "c")?);
    let summary = grid.change_summary();
    assert_eq!((summary.new, summary.changed), (1, 0));

    let saved = grid.save_changes()?;
    assert_eq!(saved.new, 1);
    assert_eq!(grid.row_count(), 3);
    assert!(!grid.is_changed());
    assert_eq!(grid.value(0, 0), "3");

    let rows = storage.table_rows("T");
    assert_eq!(rows.len(), 3);
    assert!(rows.contains(&vec![int_cell(3), text_cell("c")]));

    Ok(())
}

#[test]
fn insert_then_delete_leaves_nothing_pending() -> Result<(), GridError> {
    let storage = two_row_table();
    let mut grid = table_grid(&storage, "T")?;

    grid.insert_rows(0, 1)?;
    let new_id = grid.row_id(0);

    assert_eq!(grid.delete_rows(0, 1)?, 1);

    assert!(!grid.is_changed());
    assert_eq!(grid.row_count(), 2);
    assert!(new_id.is_some_and(|id| !grid.retrieval_order().contains(&id)));

    Ok(())
}

#[test]
fn set_value_then_undo_restores_original() -> Result<(), GridError> {
    let storage = two_row_table();
    let mut grid = table_grid(&storage, "T")?;

    assert!(grid.set_value(0, 1, "x")?);
    assert_eq!(grid.value(0, 1), "x");
    assert_eq!(grid.changed_info(), "1 changed row");

    grid.undo_changes();

    assert_eq!(grid.value(0, 1), "a");
    assert!(!grid.is_changed());
    assert_eq!(grid.cell_style(0, 1).hint, CellStyleHint::Default);
    assert!(storage.stats().writes.is_empty());

    Ok(())
}

#[test]
fn set_value_then_save_persists() -> Result<(), GridError> {
    let storage = two_row_table();
    let mut grid = table_grid(&storage, "T")?;

    assert!(grid.set_value(0, 1, "x")?);
    grid.save_changes()?;
    assert!(!grid.is_changed());

    assert_eq!(
        storage.stats().writes,
        vec![FakeWrite::Update {
            table: "T".to_string(),
            rowid: Some(1),
            values: vec![int_cell(1), text_cell("x")],
            original: vec![int_cell(1), text_cell("a")],
        }]
    );

    let mut fresh = table_grid(&storage, "T")?;
    assert_eq!(fresh.value(0, 1), "x");

    Ok(())
}

#[test]
fn numeric_cells_reject_garbage() -> Result<(), GridError> {
    let storage = people_table();
    let mut grid = table_grid(&storage, "people")?;

    assert!(!grid.set_value(0, 2, "abc")?);
    assert_eq!(grid.value(0, 2), "41");
    assert!(!grid.is_changed());

    assert!(grid.set_value(0, 2, "3,5")?);
    assert_eq!(grid.value(0, 2), "3.5");

    assert!(grid.set_value(0, 2, "")?);
    assert_eq!(grid.row(0).map(|row| row.values()[2].clone()), Some(Value::Null));

    Ok(())
}

#[test]
fn blob_cells_use_escaped_text() -> Result<(), GridError> {
    let storage = people_table();
    let mut grid = table_grid(&storage, "people")?;

    assert_eq!(grid.value(1, 3), "\\x00\\x01");

    assert!(!grid.set_value(1, 3, "\\q")?);
    assert_eq!(grid.value(1, 3), "\\x00\\x01");

    assert!(grid.set_value(1, 3, "\\xff\\n")?);
    assert_eq!(
        grid.row(1).map(|row| row.values()[3].clone()),
        Some(Value::Bytes(vec![0xff, b'\n']))
    );

    Ok(())
}

#[test]
fn query_grids_reject_edits() -> Result<(), GridError> {
    let storage = numbers_query(3);
    let mut grid = query_grid(&storage, 100)?;

    assert!(matches!(grid.set_value(0, 1, "x"), Err(GridError::ReadOnly(_))));
    assert!(matches!(grid.insert_rows(0, 1), Err(GridError::ReadOnly(_))));
    assert!(matches!(grid.delete_rows(0, 1), Err(GridError::ReadOnly(_))));
    assert_eq!(grid.value(0, 1), "row 0");

    Ok(())
}

#[test]
fn deleting_a_changed_row_reverts_it_first() -> Result<(), GridError> {
    let storage = people_table();
    let mut grid = table_grid(&storage, "people")?;

    assert!(grid.set_value(0, 1, "x")?);
    grid.delete_rows(0, 1)?;

    let summary = grid.change_summary();
    assert_eq!((summary.changed, summary.deleted), (0, 1));
    assert_eq!(grid.row_count(), 3);
    assert_eq!(grid.value(0, 1), "alice");

    grid.save_changes()?;

    assert_eq!(
        storage.stats().writes,
        vec![FakeWrite::Delete {
            table: "people".to_string(),
            rowid: Some(1),
            values: vec![int_cell(1), text_cell("Carol"), int_cell(41), Value::Null],
        }]
    );
    assert_eq!(storage.table_rows("people").len(), 3);

    Ok(())
}

#[test]
fn edits_notify_the_view() -> Result<(), GridError> {
    let storage = two_row_table();
    let mut grid = table_grid(&storage, "T")?;
    let view = RecordingView::new();
    grid.set_view(view.boxed());

    grid.insert_rows(0, 1)?;
    grid.set_value(0, 1, "c")?;
    grid.delete_rows(0, 1)?;

    assert_eq!(
        view.events(),
        vec![
            GridEvent::RowsAppended(1),
            GridEvent::Refresh,
            GridEvent::RowsDeleted { at: 0, count: 1 },
        ]
    );

    Ok(())
}

// ---------------------------------------------------------------------------
// Filtering and sorting
// ---------------------------------------------------------------------------

#[test]
fn filter_follows_edited_value() -> Result<(), GridError> {
    let storage = two_row_table();
    let mut grid = table_grid(&storage, "T")?;

    assert!(grid.set_value(0, 1, "x")?);
    assert!(grid.add_filter(1, "x"));

    assert_eq!(grid.row_count(), 1);
    assert_eq!(grid.value(0, 0), "1");
    assert_eq!(grid.column_label(1), "name\nlike \"x\"");

    grid.remove_filter(1);
    assert_eq!(grid.row_count(), 2);

    Ok(())
}

#[test]
fn filter_counts_saved_insert() -> Result<(), GridError> {
    let storage = two_row_table();
    let mut grid = table_grid(&storage, "T")?;

    grid.insert_rows(0, 1)?;
    grid.set_value(0, 1, "c")?;
    grid.save_changes()?;

    assert!(grid.set_value(1, 1, "x")?);
    assert_eq!(grid.value(1, 0), "1");

    assert!(grid.add_filter(1, "x"));
    assert_eq!(grid.row_count(), 1);

    grid.remove_filter(1);
    assert_eq!(grid.row_count(), 3);

    Ok(())
}

#[test]
fn filter_and_sort_reach_tail_rows_after_saved_delete() -> Result<(), GridError> {
    let storage = FakeStorage::new().with_table(
        "t",
        vec![pk_column("id", "INTEGER"), column("name", "TEXT")],
        vec![
            vec![int_cell(1), text_cell("a")],
            vec![int_cell(2), text_cell("b")],
            vec![int_cell(3), text_cell("c")],
        ],
    );
    let mut grid = table_grid(&storage, "t")?;

    assert_eq!(grid.value(0, 1), "a");
    assert_eq!(grid.retrieved_count(), 1);
    grid.delete_rows(0, 1)?;
    grid.save_changes()?;
    assert_eq!(grid.row_count(), 2);

    assert!(grid.add_filter(1, "c"));
    assert_eq!(grid.row_count(), 1);
    assert_eq!(grid.retrieved_count(), 3);
    assert_eq!(grid.value(0, 0), "3");
    assert_eq!(visible_set(&grid), expected_visible(&grid));

    grid.remove_filter(1);
    grid.sort_column(0);
    assert_eq!(column_values(&mut grid, 0), ["3", "2"]);

    Ok(())
}

#[test]
fn numeric_filter_rejects_unparsable_input() -> Result<(), GridError> {
    let storage = people_table();
    let mut grid = table_grid(&storage, "people")?;

    assert!(!grid.add_filter(2, "abc"));
    assert!(grid.filters().is_empty());
    assert_eq!(grid.row_count(), 4);

    assert!(grid.add_filter(2, "30"));
    assert_eq!(grid.filters().get(&2), Some(&ColumnFilter::Equals(Value::Int(30))));
    assert_eq!(column_values(&mut grid, 1), vec!["alice", "dave"]);
    assert_eq!(grid.column_label(2), "age\n= 30");

    assert!(!grid.add_filter(2, "x"));
    assert_eq!(grid.filters().get(&2), Some(&ColumnFilter::Equals(Value::Int(30))));

    Ok(())
}

#[test]
fn text_filters_match_case_insensitive_substrings() -> Result<(), GridError> {
    let storage = people_table();
    let mut grid = table_grid(&storage, "people")?;

    assert!(grid.add_filter(1, "AL"));
    assert_eq!(column_values(&mut grid, 1), vec!["alice"]);

    assert!(grid.add_filter(1, "o"));
    assert_eq!(column_values(&mut grid, 1), vec!["Carol", "Bob"]);

    grid.clear_filter();
    assert_eq!(grid.row_count(), 4);
    assert_eq!(grid.column_label(1), "name");

    Ok(())
}

#[test]
fn first_sort_is_descending_then_toggles() -> Result<(), GridError> {
    let storage = people_table();
    let mut grid = table_grid(&storage, "people")?;

    grid.sort_column(2);
    assert_eq!(column_values(&mut grid, 0), vec!["1", "2", "4", "3"]);
    assert_eq!(grid.column_label(2), "age ↓");

    grid.sort_column(2);
    assert_eq!(column_values(&mut grid, 0), vec!["3", "2", "4", "1"]);
    assert_eq!(grid.column_label(2), "age ↑");

    Ok(())
}

#[test]
fn text_sort_ignores_case() -> Result<(), GridError> {
    let storage = people_table();
    let mut grid = table_grid(&storage, "people")?;

    grid.sort_column(1);
    assert_eq!(column_values(&mut grid, 1), vec!["dave", "Carol", "Bob", "alice"]);

    grid.sort_column(1);
    assert_eq!(column_values(&mut grid, 1), vec!["alice", "Bob", "Carol", "dave"]);

    Ok(())
}

#[test]
fn clear_sort_restores_retrieval_order() -> Result<(), GridError> {
    let storage = people_table();
    let mut grid = table_grid(&storage, "people")?;

    grid.sort_column(1);
    grid.sort_column(2);
    grid.sort_column(2);
    grid.sort_column(0);
    grid.clear_sort();

    assert_eq!(grid.visible_order(), grid.retrieval_order());
    assert_eq!(grid.sort(), None);
    assert_eq!(grid.column_label(0), "id");

    Ok(())
}

#[test]
fn visible_rows_always_match_filters() -> Result<(), GridError> {
    let storage = people_table();
    let mut grid = table_grid(&storage, "people")?;

    let steps: Vec<Box<dyn Fn(&mut RowCache)>> = vec![
        Box::new(|g: &mut RowCache| g.sort_column(1)),
        Box::new(|g: &mut RowCache| {
            g.add_filter(2, "30");
        }),
        Box::new(|g: &mut RowCache| g.sort_column(2)),
        Box::new(|g: &mut RowCache| g.clear_sort()),
        Box::new(|g: &mut RowCache| {
            g.add_filter(1, "a");
        }),
        Box::new(|g: &mut RowCache| g.sort_column(1)),
        Box::new(|g: &mut RowCache| g.remove_filter(2)),
        Box::new(|g: &mut RowCache| g.clear_sort()),
        Box::new(|g: &mut RowCache| g.clear_filter()),
    ];

    for step in steps {
        step(&mut grid);
        assert_eq!(visible_set(&grid), expected_visible(&grid));
    }

    Ok(())
}

#[test]
fn filter_keeps_active_sort() -> Result<(), GridError> {
    let storage = people_table();
    let mut grid = table_grid(&storage, "people")?;

    grid.sort_column(1);
    assert!(grid.add_filter(2, "30"));

    assert_eq!(column_values(&mut grid, 1), vec!["dave", "alice"]);
    assert_eq!(grid.column_label(2), "age\n= 30");

    Ok(())
}

// ---------------------------------------------------------------------------
// Commit and rollback
// ---------------------------------------------------------------------------

fn stage_one_of_each(grid: &mut RowCache) -> Result<(), GridError> {
    assert!(grid.set_value(0, 1, "Caroline")?);
    grid.delete_rows(1, 1)?;
    grid.insert_rows(0, 1)?;
    assert!(grid.set_value(0, 1, "Eve")?);
    Ok(())
}

#[test]
fn save_writes_updates_then_inserts_then_deletes() -> Result<(), GridError> {
    let storage = people_table();
    let mut grid = table_grid(&storage, "people")?;

    stage_one_of_each(&mut grid)?;
    assert_eq!(grid.changed_info(), "1 new row, 1 changed row, 1 deleted row");

    let saved = grid.save_changes()?;

    assert_eq!(saved.total(), 3);
    assert_eq!(write_kinds(&storage), vec!["update", "insert", "delete"]);

    let names: Vec<Value> = storage
        .table_rows("people")
        .into_iter()
        .map(|row| row[1].clone())
        .collect();
    assert_eq!(
        names,
        vec![
            text_cell("Caroline"),
            text_cell("Bob"),
            text_cell("dave"),
            text_cell("Eve"),
        ]
    );

    Ok(())
}

#[test]
fn failed_insert_aborts_and_keeps_remaining_changes() -> Result<(), GridError> {
    let storage = people_table();
    let mut grid = table_grid(&storage, "people")?;
    stage_one_of_each(&mut grid)?;

    storage.set_insert_error(Some("UNIQUE constraint failed: people.name".to_string()));

    match grid.save_changes() {
        Err(GridError::Commit(error)) => {
            assert_eq!(error.category, ChangeCategory::New);
            assert_eq!(error.table, "people");
            assert!(error.to_string().contains("insert new row"));
        }
        other => panic!("expected commit error, got {:?}", other.map(|s| s.total())),
    }

    assert_eq!(write_kinds(&storage), vec!["update", "insert"]);
    let pending = grid.change_summary();
    assert_eq!((pending.changed, pending.new, pending.deleted), (0, 1, 1));
    assert_eq!(storage.table_rows("people")[0][1], text_cell("Caroline"));

    storage.set_insert_error(None);
    let saved = grid.save_changes()?;

    assert_eq!((saved.new, saved.deleted), (1, 1));
    assert!(!grid.is_changed());
    assert_eq!(
        write_kinds(&storage),
        vec!["update", "insert", "insert", "delete"]
    );

    Ok(())
}

#[test]
fn undo_discards_every_pending_change() -> Result<(), GridError> {
    let storage = people_table();
    let mut grid = table_grid(&storage, "people")?;
    stage_one_of_each(&mut grid)?;
    assert_eq!(grid.row_count(), 4);

    grid.undo_changes();

    assert!(!grid.is_changed());
    assert_eq!(grid.row_count(), 4);
    assert_eq!(
        column_values(&mut grid, 1),
        vec!["Carol", "alice", "Bob", "dave"]
    );
    assert!(storage.stats().writes.is_empty());

    Ok(())
}

#[test]
fn undo_restores_deleted_rows_only_if_they_match_filter() -> Result<(), GridError> {
    let storage = people_table();
    let mut grid = table_grid(&storage, "people")?;

    assert!(grid.add_filter(2, "30"));
    grid.delete_rows(0, 1)?;
    assert_eq!(column_values(&mut grid, 1), vec!["dave"]);

    grid.undo_changes();
    assert_eq!(column_values(&mut grid, 1), vec!["alice", "dave"]);

    grid.clear_filter();
    assert_eq!(grid.row_count(), 4);

    Ok(())
}

#[test]
fn undo_drops_inserted_rows() -> Result<(), GridError> {
    let storage = two_row_table();
    let mut grid = table_grid(&storage, "T")?;
    let view = RecordingView::new();
    grid.set_view(view.boxed());

    grid.insert_rows(0, 2)?;
    assert_eq!(grid.row_count(), 4);

    grid.undo_changes();

    assert_eq!(grid.row_count(), 2);
    assert!(grid.retrieval_order().iter().all(|id| {
        grid.get(*id).is_some_and(|row| !row.state().is_new())
    }));
    assert_eq!(
        view.count_changes(),
        vec![
            GridEvent::RowsAppended(2),
            GridEvent::RowsDeleted { at: 2, count: 2 },
        ]
    );

    Ok(())
}

#[test]
fn tables_without_rowid_are_written_by_primary_key() -> Result<(), GridError> {
    let storage = FakeStorage::new().with_without_rowid_table(
        "kv",
        vec![pk_column("key", "TEXT"), column("value", "TEXT")],
        vec![
            vec![text_cell("a"), text_cell("1")],
            vec![text_cell("b"), text_cell("2")],
        ],
    );
    let mut grid = table_grid(&storage, "kv")?;
    assert_eq!(grid.rowid_alias(), None);

    assert!(grid.set_value(0, 0, "z")?);
    grid.delete_rows(1, 1)?;
    grid.save_changes()?;

    assert_eq!(
        storage.table_rows("kv"),
        vec![vec![text_cell("z"), text_cell("1")]]
    );
    assert!(storage.stats().writes.iter().all(|write| match write {
        FakeWrite::Update { rowid, .. } | FakeWrite::Delete { rowid, .. } => rowid.is_none(),
        FakeWrite::Insert { .. } => true,
    }));

    Ok(())
}

// ---------------------------------------------------------------------------
// Cell styles
// ---------------------------------------------------------------------------

#[test]
fn cell_styles_follow_row_state() -> Result<(), GridError> {
    let storage = people_table();
    let mut grid = table_grid(&storage, "people")?;

    assert!(grid.set_value(0, 1, "Zed")?);
    assert_eq!(grid.cell_style(0, 1).hint, CellStyleHint::CellChanged);
    assert_eq!(grid.cell_style(0, 2).hint, CellStyleHint::RowChanged);

    grid.insert_rows(0, 1)?;
    assert_eq!(grid.cell_style(0, 0).hint, CellStyleHint::New);
    assert_eq!(grid.cell_style(1, 1).hint, CellStyleHint::CellChanged);

    assert!(grid.cell_style(0, 3).multiline);
    assert!(!grid.cell_style(0, 1).multiline);
    assert_eq!(grid.cell_style(99, 0).hint, CellStyleHint::Default);

    Ok(())
}
