//! Result registry backends: append-only metric rows over CSV or SQLite.
//!
//! Both backends store one row per (hyperparameter tuple, run, metric) and
//! answer existence queries for missing-result detection. The SQLite
//! backend additionally deduplicates hyperparameter tuples by their
//! canonical hash. Concurrent writers are expected to hold an exclusive
//! advisory lock on the registry file for the duration of an append; the
//! locking itself belongs to the scheduler layer driving the workers.

use std::fs::{self, OpenOptions};
use std::io::BufWriter;
use std::path::{Path, PathBuf};

use chrono::Utc;
use csv::{ReaderBuilder, WriterBuilder};
use rusqlite::types::Value as SqlValue;
use rusqlite::{params_from_iter, Connection};
use serde::{Deserialize, Serialize};
use serde_json::Value;

use exu_core::errors::{ErrorInfo, ExuError};
use exu_sweep::{stable_hash_string, ExperimentDescription};

/// Supported registry backends, chosen by file extension.
#[derive(Debug, Clone, PartialEq)]
pub enum Backend {
    /// Append-only CSV file.
    Csv(PathBuf),
    /// Embedded SQLite database.
    Sqlite(PathBuf),
}

impl Backend {
    /// Construct a registry handle from a filesystem path.
    pub fn from_path(path: impl Into<PathBuf>) -> Self {
        let path = path.into();
        match path.extension().and_then(|ext| ext.to_str()) {
            Some("sqlite") | Some("db") => Backend::Sqlite(path),
            _ => Backend::Csv(path),
        }
    }
}

/// One metric observation tied to a hyperparameter setting and run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ResultRow {
    /// Experiment identifier (usually the derived experiment name).
    pub experiment: String,
    /// Concrete hyperparameter values for the permutation.
    pub params: Value,
    /// Run number (index wrapped around the permutation count).
    pub run: u64,
    /// Metric name.
    pub metric: String,
    /// Metric value.
    pub value: f64,
}

/// Filter describing a registry lookup.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
pub struct Query {
    /// Restrict to one hyperparameter tuple by canonical hash.
    #[serde(default)]
    pub params_hash: Option<String>,
    /// Restrict to one run number.
    #[serde(default)]
    pub run: Option<u64>,
    /// Restrict to one metric name.
    #[serde(default)]
    pub metric: Option<String>,
    /// Cap the number of returned rows.
    #[serde(default)]
    pub limit: Option<usize>,
}

/// Table representation returned from registry queries.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Table {
    /// Column names, in storage order.
    pub columns: Vec<String>,
    /// Row values rendered as strings.
    pub rows: Vec<Vec<String>>,
}

/// Appends result rows to the registry backend.
pub fn append_rows(backend: &Backend, rows: &[ResultRow]) -> Result<(), ExuError> {
    match backend {
        Backend::Csv(path) => append_csv(path, rows),
        Backend::Sqlite(path) => append_sqlite(path, rows),
    }
}

/// Queries the registry, returning a structured table.
///
/// A registry file that does not exist yet yields an empty table rather
/// than an error: analysis code must tolerate partially-complete sweeps.
pub fn query(backend: &Backend, query: &Query) -> Result<Table, ExuError> {
    match backend {
        Backend::Csv(path) => query_csv(path, query),
        Backend::Sqlite(path) => query_sqlite(path, query),
    }
}

/// Whether any row exists for the exact hyperparameter tuple and run of
/// one permutation index.
pub fn has_result_for(
    backend: &Backend,
    exp: &ExperimentDescription,
    idx: u64,
) -> Result<bool, ExuError> {
    let hash = stable_hash_string(&exp.swept_values(idx)?)?;
    has_result(backend, &hash, exp.get_run(idx))
}

/// Whether any row exists for the given hyperparameter tuple and run.
pub fn has_result(backend: &Backend, params_hash: &str, run: u64) -> Result<bool, ExuError> {
    let table = query(
        backend,
        &Query {
            params_hash: Some(params_hash.to_string()),
            run: Some(run),
            metric: None,
            limit: Some(1),
        },
    )?;
    Ok(!table.rows.is_empty())
}

fn append_csv(path: &Path, rows: &[ResultRow]) -> Result<(), ExuError> {
    ensure_parent(path)?;
    let file_exists = path.exists();
    let file = OpenOptions::new()
        .append(true)
        .create(true)
        .open(path)
        .map_err(|err| {
            ExuError::Store(
                ErrorInfo::new("registry-open", "failed to open CSV registry")
                    .with_context("path", path.display().to_string())
                    .with_hint(err.to_string()),
            )
        })?;
    let mut writer = WriterBuilder::new()
        .has_headers(false)
        .from_writer(BufWriter::new(file));
    if !file_exists {
        writer
            .write_record(table_columns())
            .map_err(|err| wrap_csv("registry-write-header", err))?;
    }
    let date = Utc::now().to_rfc3339();
    for row in rows {
        let record = vec![
            date.clone(),
            row.experiment.clone(),
            stable_hash_string(&row.params)?,
            canonical_string(&row.params)?,
            row.run.to_string(),
            row.metric.clone(),
            row.value.to_string(),
        ];
        writer
            .write_record(&record)
            .map_err(|err| wrap_csv("registry-write-row", err))?;
    }
    writer
        .flush()
        .map_err(|err| wrap_csv("registry-flush", err.into()))?;
    Ok(())
}

fn append_sqlite(path: &Path, rows: &[ResultRow]) -> Result<(), ExuError> {
    ensure_parent(path)?;
    let mut conn = Connection::open(path).map_err(|err| {
        ExuError::Store(
            ErrorInfo::new("registry-sqlite-open", "failed to open sqlite registry")
                .with_context("path", path.display().to_string())
                .with_hint(err.to_string()),
        )
    })?;
    conn.execute_batch(
        "CREATE TABLE IF NOT EXISTS params (
            hash TEXT PRIMARY KEY,
            params TEXT NOT NULL
        );
        CREATE TABLE IF NOT EXISTS results (
            date TEXT NOT NULL,
            experiment TEXT NOT NULL,
            params_hash TEXT NOT NULL,
            run INTEGER NOT NULL,
            metric TEXT NOT NULL,
            value REAL NOT NULL,
            FOREIGN KEY(params_hash) REFERENCES params(hash)
        );",
    )
    .map_err(|err| wrap_sqlite("registry-sqlite-schema", err))?;

    let tx = conn
        .transaction()
        .map_err(|err| wrap_sqlite("registry-sqlite-transaction", err))?;
    let date = Utc::now().to_rfc3339();
    for row in rows {
        let hash = stable_hash_string(&row.params)?;
        // hyperparameter tuples are stored once, keyed by canonical hash
        tx.execute(
            "INSERT OR IGNORE INTO params (hash, params) VALUES (?1, ?2)",
            rusqlite::params![hash, canonical_string(&row.params)?],
        )
        .map_err(|err| wrap_sqlite("registry-sqlite-params", err))?;
        tx.execute(
            "INSERT INTO results (date, experiment, params_hash, run, metric, value)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6)",
            rusqlite::params![
                date,
                row.experiment,
                hash,
                row.run as i64,
                row.metric,
                row.value,
            ],
        )
        .map_err(|err| wrap_sqlite("registry-sqlite-insert", err))?;
    }
    tx.commit()
        .map_err(|err| wrap_sqlite("registry-sqlite-commit", err))?;
    Ok(())
}

fn query_csv(path: &Path, query: &Query) -> Result<Table, ExuError> {
    if !path.exists() {
        return Ok(empty_table());
    }
    let mut reader = ReaderBuilder::new()
        .has_headers(true)
        .from_path(path)
        .map_err(|err| wrap_csv("registry-read", err))?;
    let mut rows = Vec::new();
    for result in reader.records() {
        let record = result.map_err(|err| wrap_csv("registry-record", err))?;
        if let Some(hash) = &query.params_hash {
            if record.get(2) != Some(hash) {
                continue;
            }
        }
        if let Some(run) = query.run {
            if record.get(4) != Some(run.to_string().as_str()) {
                continue;
            }
        }
        if let Some(metric) = &query.metric {
            if record.get(5) != Some(metric) {
                continue;
            }
        }
        rows.push(record.iter().map(|s| s.to_string()).collect::<Vec<_>>());
        if let Some(limit) = query.limit {
            if rows.len() >= limit {
                break;
            }
        }
    }
    Ok(Table {
        columns: table_columns(),
        rows,
    })
}

fn query_sqlite(path: &Path, query: &Query) -> Result<Table, ExuError> {
    if !path.exists() {
        return Ok(empty_table());
    }
    let conn = Connection::open(path)
        .map_err(|err| wrap_sqlite("registry-sqlite-open", err))?;

    let mut sql = "SELECT r.date, r.experiment, r.params_hash, p.params, r.run, r.metric, r.value
         FROM results r JOIN params p ON p.hash = r.params_hash"
        .to_string();
    let mut clauses: Vec<String> = Vec::new();
    let mut bindings: Vec<SqlValue> = Vec::new();
    if let Some(hash) = &query.params_hash {
        bindings.push(SqlValue::Text(hash.clone()));
        clauses.push(format!("r.params_hash = ?{}", bindings.len()));
    }
    if let Some(run) = query.run {
        bindings.push(SqlValue::Integer(run as i64));
        clauses.push(format!("r.run = ?{}", bindings.len()));
    }
    if let Some(metric) = &query.metric {
        bindings.push(SqlValue::Text(metric.clone()));
        clauses.push(format!("r.metric = ?{}", bindings.len()));
    }
    if !clauses.is_empty() {
        sql.push_str(" WHERE ");
        sql.push_str(&clauses.join(" AND "));
    }
    sql.push_str(" ORDER BY r.date, r.params_hash, r.run, r.metric");
    if let Some(limit) = query.limit {
        sql.push_str(&format!(" LIMIT {}", limit));
    }

    let mut stmt = conn
        .prepare(&sql)
        .map_err(|err| wrap_sqlite("registry-sqlite-prepare", err))?;
    let mut rows_iter = stmt
        .query(params_from_iter(bindings.iter()))
        .map_err(|err| wrap_sqlite("registry-sqlite-query", err))?;

    let mut rows = Vec::new();
    while let Some(row) = rows_iter
        .next()
        .map_err(|err| wrap_sqlite("registry-sqlite-row", err))?
    {
        let mut result = Vec::with_capacity(7);
        for idx in 0..7 {
            let value = row
                .get_ref(idx)
                .map_err(|err| wrap_sqlite("registry-sqlite-get", err))?;
            result.push(render_sql_value(value));
        }
        rows.push(result);
    }
    Ok(Table {
        columns: table_columns(),
        rows,
    })
}

fn render_sql_value(value: rusqlite::types::ValueRef<'_>) -> String {
    use rusqlite::types::ValueRef;
    match value {
        ValueRef::Null => String::new(),
        ValueRef::Integer(i) => i.to_string(),
        ValueRef::Real(f) => f.to_string(),
        ValueRef::Text(t) => String::from_utf8_lossy(t).to_string(),
        ValueRef::Blob(_) => String::new(),
    }
}

fn canonical_string(value: &Value) -> Result<String, ExuError> {
    serde_json::to_string(value).map_err(|err| {
        ExuError::Serde(
            ErrorInfo::new("registry-canonical", "failed to encode canonical json")
                .with_hint(err.to_string()),
        )
    })
}

fn ensure_parent(path: &Path) -> Result<(), ExuError> {
    if let Some(parent) = path.parent() {
        if !parent.as_os_str().is_empty() {
            fs::create_dir_all(parent).map_err(|err| {
                ExuError::Store(
                    ErrorInfo::new("registry-create", "failed to create registry directory")
                        .with_context("path", parent.display().to_string())
                        .with_hint(err.to_string()),
                )
            })?;
        }
    }
    Ok(())
}

fn table_columns() -> Vec<String> {
    vec![
        "date".into(),
        "experiment".into(),
        "params_hash".into(),
        "params".into(),
        "run".into(),
        "metric".into(),
        "value".into(),
    ]
}

fn empty_table() -> Table {
    Table {
        columns: table_columns(),
        rows: Vec::new(),
    }
}

fn wrap_csv(code: &str, err: csv::Error) -> ExuError {
    ExuError::Store(ErrorInfo::new(code, "CSV registry failure").with_hint(err.to_string()))
}

fn wrap_sqlite(code: &str, err: rusqlite::Error) -> ExuError {
    ExuError::Store(ErrorInfo::new(code, "sqlite registry failure").with_hint(err.to_string()))
}
