use anyhow::{Context, anyhow, bail};
use clap::error::ErrorKind;
use clap::{ArgGroup, CommandFactory, Parser};
use sqlgrid_core::{ConfigStore, GridConfig, RowCache, TableSource};
use sqlgrid_driver_sqlite::SqliteStorage;
use sqlgrid_export::{ExportFormat, export};
use std::io::{self, Write};
use std::path::PathBuf;
use std::sync::Arc;

/// Export a filtered, sorted view of a SQLite table or read query.
#[derive(Parser, Debug)]
#[command(name = "sqlgrid")]
#[command(group(ArgGroup::new("source").required(true).args(["table", "query"])))]
struct Args {
    /// SQLite database file. It must already exist.
    db_path: PathBuf,

    /// Table to open.
    #[arg(long, value_name = "NAME")]
    table: Option<String>,

    /// Read statement to open instead of a table.
    #[arg(long, value_name = "SQL")]
    query: Option<String>,

    /// Restrict table rows, without the WHERE keyword.
    #[arg(long = "where", value_name = "EXPR", requires = "table")]
    where_clause: Option<String>,

    /// Order table rows, without the ORDER BY keywords.
    #[arg(long = "order", value_name = "EXPR", requires = "table")]
    order_by: Option<String>,

    /// Keep rows whose COL matches TEXT (repeatable).
    #[arg(long = "filter", value_name = "COL=TEXT", value_parser = parse_filter)]
    filters: Vec<(String, String)>,

    /// Sort by COL, descending.
    #[arg(long, value_name = "COL")]
    sort: Option<String>,

    /// Sort ascending instead.
    #[arg(long, requires = "sort")]
    ascending: bool,

    /// csv, json, json-compact or text.
    #[arg(long, value_name = "FORMAT", default_value = "csv", value_parser = parse_format)]
    format: ExportFormat,

    /// Rows retrieved per seek-ahead.
    #[arg(long, value_name = "N")]
    chunk: Option<usize>,

    /// Settings file to read.
    #[arg(long = "config", value_name = "PATH")]
    config_path: Option<PathBuf>,
}

fn parse_filter(raw: &str) -> Result<(String, String), String> {
    raw.split_once('=')
        .map(|(column, text)| (column.to_string(), text.to_string()))
        .ok_or_else(|| format!("expected COL=TEXT, got '{}'", raw))
}

fn parse_format(raw: &str) -> Result<ExportFormat, String> {
    ExportFormat::from_cli_name(raw).ok_or_else(|| format!("unknown format '{}'", raw))
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CliSource {
    Table(TableSource),
    Query(String),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CliOptions {
    pub db_path: PathBuf,
    pub source: CliSource,
    pub format: ExportFormat,
    pub filters: Vec<(String, String)>,
    pub sort: Option<String>,
    pub ascending: bool,
    pub chunk: Option<usize>,
    pub config_path: Option<PathBuf>,
}

pub fn run(args: &[String]) -> i32 {
    let options = match parse_args(args) {
        Ok(options) => options,
        Err(e) => {
            let _ = e.print();
            return e.exit_code();
        }
    };

    let stdout = io::stdout();
    let mut out = stdout.lock();

    match execute(&options, &mut out) {
        Ok(()) => 0,
        Err(e) => {
            eprintln!("sqlgrid: {:#}", e);
            1
        }
    }
}

pub fn parse_args(args: &[String]) -> Result<CliOptions, clap::Error> {
    let args = Args::try_parse_from(args)?;

    let source = match (args.table, args.query) {
        (Some(name), _) => {
            let mut source = TableSource::new(name);
            source.where_clause = args.where_clause;
            source.order_by = args.order_by;
            CliSource::Table(source)
        }
        (None, Some(sql)) => CliSource::Query(sql),
        (None, None) => {
            return Err(Args::command().error(
                ErrorKind::MissingRequiredArgument,
                "one of --table or --query is required",
            ));
        }
    };

    Ok(CliOptions {
        db_path: args.db_path,
        source,
        format: args.format,
        filters: args.filters,
        sort: args.sort,
        ascending: args.ascending,
        chunk: args.chunk,
        config_path: args.config_path,
    })
}

fn load_config(options: &CliOptions) -> anyhow::Result<GridConfig> {
    let store = match &options.config_path {
        Some(path) => ConfigStore::from_path(path.clone()),
        None => ConfigStore::new()?,
    };

    let mut config = store
        .load()
        .with_context(|| format!("reading {}", store.path().display()))?;

    if let Some(chunk) = options.chunk {
        config = config.with_seek_chunk_length(chunk);
    }

    Ok(config)
}

pub fn execute(options: &CliOptions, out: &mut dyn Write) -> anyhow::Result<()> {
    let config = load_config(options)?;

    if !options.db_path.exists() {
        bail!("{} does not exist", options.db_path.display());
    }
    let storage = Arc::new(SqliteStorage::open(&options.db_path)?);

    let mut grid = match &options.source {
        CliSource::Table(table) => RowCache::from_table(storage, table.clone(), &config)
            .with_context(|| format!("opening table {}", table.name))?,
        CliSource::Query(sql) => RowCache::from_query(storage, sql.clone(), &config)?,
    };
    grid.seek_ahead(true);

    for (name, text) in &options.filters {
        let col = column_index(&grid, name)?;
        if !grid.add_filter(col, text) {
            bail!("'{}' is not a valid filter for column {}", text, name);
        }
    }

    if let Some(name) = &options.sort {
        let col = column_index(&grid, name)?;
        grid.sort_column(col);
        if options.ascending {
            grid.sort_column(col);
        }
    }

    export(&mut grid, options.format, out)?;
    out.flush()?;

    log::info!("Exported {} rows", grid.row_count());
    Ok(())
}

fn column_index(grid: &RowCache, name: &str) -> anyhow::Result<usize> {
    grid.columns()
        .iter()
        .position(|column| column.name.eq_ignore_ascii_case(name))
        .ok_or_else(|| anyhow!("no column named {}", name))
}
