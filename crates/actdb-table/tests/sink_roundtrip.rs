use std::time::Duration;

use actdb_core::ActError;
use actdb_table::{ActivationTable, Cell, CsvSink, Sink, SqliteSink, TableSink};
use rusqlite::Connection;
use tempfile::{tempdir, NamedTempFile};

fn sample(rows: usize) -> ActivationTable {
    let mut table = ActivationTable::new(vec![
        "nuclide".into(),
        "num_dens_(atoms/cm3)".into(),
        "num_pulses".into(),
        "flux_spectrum_shape".into(),
    ]);
    for idx in 0..rows {
        table
            .push_row(vec![
                Cell::from(format!("n{idx}")),
                Cell::Real(1.0e20 * (idx as f64 + 1.0)),
                Cell::Integer(4),
                Cell::from("[0.25,0.75]"),
            ])
            .expect("row");
    }
    table
}

#[test]
fn sqlite_write_replaces_existing_table() {
    let db = NamedTempFile::new().expect("db temp");
    let mut sink = SqliteSink::open(db.path()).expect("open");
    sink.write_table("number_densities", &sample(3)).expect("first write");
    sink.write_table("number_densities", &sample(2)).expect("second write");
    let stored = sink.read_table("number_densities").expect("read back");
    assert_eq!(stored, sample(2));
}

#[test]
fn sqlite_columns_keep_storage_classes() {
    let db = NamedTempFile::new().expect("db temp");
    let mut sink = SqliteSink::open(db.path()).expect("open");
    sink.write_table("t", &sample(1)).expect("write");
    let conn = Connection::open(db.path()).expect("reopen");
    let kinds: Vec<String> = conn
        .prepare("SELECT type FROM pragma_table_info('t') ORDER BY cid")
        .expect("prepare")
        .query_map([], |row| row.get(0))
        .expect("query")
        .collect::<Result<_, _>>()
        .expect("rows");
    assert_eq!(kinds, vec!["TEXT", "REAL", "INTEGER", "TEXT"]);
}

#[test]
fn locked_database_reports_persistence_error() {
    let db = NamedTempFile::new().expect("db temp");
    let mut sink = SqliteSink::open(db.path()).expect("open");
    sink.write_table("number_densities", &sample(1)).expect("seed");

    let holder = Connection::open(db.path()).expect("holder");
    holder.execute_batch("BEGIN EXCLUSIVE;").expect("lock");
    let blocked = Connection::open(db.path()).expect("second");
    blocked.busy_timeout(Duration::ZERO).expect("timeout");
    let mut blocked = SqliteSink::from_connection(blocked);
    let err = blocked
        .write_table("number_densities", &sample(5))
        .unwrap_err();
    assert!(matches!(err, ActError::Persistence(_)));
    assert_eq!(err.context("table"), Some("number_densities"));
    holder.execute_batch("ROLLBACK;").expect("unlock");

    assert_eq!(sink.read_table("number_densities").expect("read"), sample(1));
}

#[test]
fn csv_sink_roundtrips_through_loader() {
    let dir = tempdir().expect("dir");
    let mut sink = CsvSink::new(dir.path().join("out"));
    sink.write_table("number_densities", &sample(2)).expect("write");
    let path = sink.table_path("number_densities");
    let loaded = ActivationTable::from_csv_path(&path).expect("load");
    assert_eq!(loaded.columns(), sample(2).columns());
    assert_eq!(loaded.rows()[1][1], Cell::Real(2.0e20));
    assert!(!path.with_extension("csv.partial").exists());
}

#[test]
fn sink_kind_follows_extension() {
    let dir = tempdir().expect("dir");
    assert!(matches!(
        Sink::from_path(&dir.path().join("results.db")).expect("db"),
        Sink::Sqlite(_)
    ));
    assert!(matches!(
        Sink::from_path(&dir.path().join("results")).expect("csv"),
        Sink::Csv(_)
    ));
}

#[test]
fn failed_second_table_rolls_back_the_first() {
    let db = NamedTempFile::new().expect("db temp");
    let mut sink = SqliteSink::open(db.path()).expect("open");
    sink.write_table("number_densities", &sample(1)).expect("seed");

    let mut broken = ActivationTable::new(vec!["x".into(), "x".into()]);
    broken.push_row(vec![Cell::Integer(1), Cell::Integer(2)]).expect("row");
    let err = sink
        .write_tables(&[("number_densities", &sample(4)), ("run_provenance", &broken)])
        .unwrap_err();
    assert!(matches!(err, ActError::Persistence(_)));
    assert_eq!(err.context("table"), Some("run_provenance"));

    assert_eq!(sink.read_table("number_densities").expect("read"), sample(1));
    assert!(sink.read_table("run_provenance").is_err());
}

#[test]
fn csv_sink_writes_nothing_when_a_table_fails() {
    let dir = tempdir().expect("dir");
    let out = dir.path().join("out");
    let mut sink = CsvSink::new(&out);
    sink.write_table("number_densities", &sample(1)).expect("seed");
    // A directory squatting on the staging path makes the second table fail.
    std::fs::create_dir_all(out.join("run_provenance.csv.partial")).expect("squat");

    let err = sink
        .write_tables(&[("number_densities", &sample(3)), ("run_provenance", &sample(1))])
        .unwrap_err();
    assert!(matches!(err, ActError::Persistence(_)));
    let kept = ActivationTable::from_csv_path(&sink.table_path("number_densities")).expect("load");
    assert_eq!(kept.len(), 1);
    assert!(!out.join("number_densities.csv.partial").exists());
}
