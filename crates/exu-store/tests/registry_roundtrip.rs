use exu_store::{append_rows, has_result, has_result_for, query, Backend, Query, ResultRow};
use exu_sweep::{stable_hash_string, ExperimentDescription};
use serde_json::json;
use tempfile::tempdir;

fn sample_rows() -> Vec<ResultRow> {
    vec![
        ResultRow {
            experiment: "Cliff".to_string(),
            params: json!({"alpha": 0.5, "lambda": 0.99}),
            run: 0,
            metric: "return".to_string(),
            value: -31.5,
        },
        ResultRow {
            experiment: "Cliff".to_string(),
            params: json!({"alpha": 0.5, "lambda": 0.99}),
            run: 1,
            metric: "return".to_string(),
            value: -28.0,
        },
        ResultRow {
            experiment: "Cliff".to_string(),
            params: json!({"alpha": 0.25, "lambda": 0.99}),
            run: 0,
            metric: "return".to_string(),
            value: -40.25,
        },
    ]
}

#[test]
fn roundtrip_csv_and_sqlite() {
    let dir = tempdir().unwrap();
    let rows = sample_rows();

    for file in ["registry.csv", "registry.sqlite"] {
        let backend = Backend::from_path(dir.path().join(file));
        append_rows(&backend, &rows).unwrap();
        let table = query(&backend, &Query::default()).unwrap();
        assert_eq!(table.rows.len(), rows.len(), "backend {file}");
        assert_eq!(table.columns.len(), 7);
    }
}

#[test]
fn filters_by_hash_run_and_metric() {
    let dir = tempdir().unwrap();
    let rows = sample_rows();
    let hash = stable_hash_string(&rows[0].params).unwrap();

    for file in ["registry.csv", "registry.sqlite"] {
        let backend = Backend::from_path(dir.path().join(file));
        append_rows(&backend, &rows).unwrap();

        let table = query(
            &backend,
            &Query {
                params_hash: Some(hash.clone()),
                ..Query::default()
            },
        )
        .unwrap();
        assert_eq!(table.rows.len(), 2, "backend {file}");

        let table = query(
            &backend,
            &Query {
                params_hash: Some(hash.clone()),
                run: Some(1),
                ..Query::default()
            },
        )
        .unwrap();
        assert_eq!(table.rows.len(), 1, "backend {file}");

        let table = query(
            &backend,
            &Query {
                metric: Some("loss".to_string()),
                ..Query::default()
            },
        )
        .unwrap();
        assert!(table.rows.is_empty(), "backend {file}");
    }
}

#[test]
fn existence_checks_drive_missing_detection() {
    let dir = tempdir().unwrap();
    let rows = sample_rows();
    let seen = stable_hash_string(&rows[0].params).unwrap();
    let unseen = stable_hash_string(&json!({"alpha": 1.0})).unwrap();

    for file in ["registry.csv", "registry.sqlite"] {
        let backend = Backend::from_path(dir.path().join(file));
        append_rows(&backend, &rows).unwrap();
        assert!(has_result(&backend, &seen, 0).unwrap(), "backend {file}");
        assert!(!has_result(&backend, &seen, 7).unwrap(), "backend {file}");
        assert!(!has_result(&backend, &unseen, 0).unwrap(), "backend {file}");
    }
}

#[test]
fn index_level_existence_uses_the_exact_tuple() {
    let dir = tempdir().unwrap();
    let exp = ExperimentDescription::new(
        json!({
            "name": "Cliff",
            "metaParameters": {"alpha": [0.5, 0.25], "lambda": [0.99]},
        }),
        None,
    )
    .unwrap();

    // persist results for index 0 only
    let rows = vec![ResultRow {
        experiment: "Cliff".to_string(),
        params: exp.swept_values(0).unwrap(),
        run: exp.get_run(0),
        metric: "return".to_string(),
        value: -31.5,
    }];

    for file in ["registry.csv", "registry.sqlite"] {
        let backend = Backend::from_path(dir.path().join(file));
        append_rows(&backend, &rows).unwrap();
        assert!(has_result_for(&backend, &exp, 0).unwrap(), "backend {file}");
        assert!(!has_result_for(&backend, &exp, 1).unwrap(), "backend {file}");
        // same tuple, later run
        assert!(!has_result_for(&backend, &exp, 2).unwrap(), "backend {file}");
    }
}

#[test]
fn missing_registry_files_yield_empty_tables() {
    let dir = tempdir().unwrap();
    for file in ["absent.csv", "absent.sqlite"] {
        let backend = Backend::from_path(dir.path().join(file));
        let table = query(&backend, &Query::default()).unwrap();
        assert!(table.rows.is_empty(), "backend {file}");
    }
}

#[test]
fn sqlite_deduplicates_hyperparameter_tuples() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("registry.sqlite");
    let backend = Backend::from_path(&path);
    append_rows(&backend, &sample_rows()).unwrap();
    append_rows(&backend, &sample_rows()).unwrap();

    let conn = rusqlite::Connection::open(&path).unwrap();
    let tuples: i64 = conn
        .query_row("SELECT COUNT(*) FROM params", [], |row| row.get(0))
        .unwrap();
    // two distinct hyperparameter settings, appended twice
    assert_eq!(tuples, 2);
    let results: i64 = conn
        .query_row("SELECT COUNT(*) FROM results", [], |row| row.get(0))
        .unwrap();
    assert_eq!(results, 6);
}

#[test]
fn extension_selects_the_backend() {
    assert!(matches!(
        Backend::from_path("runs/registry.sqlite"),
        Backend::Sqlite(_)
    ));
    assert!(matches!(
        Backend::from_path("runs/registry.db"),
        Backend::Sqlite(_)
    ));
    assert!(matches!(
        Backend::from_path("runs/registry.csv"),
        Backend::Csv(_)
    ));
}
