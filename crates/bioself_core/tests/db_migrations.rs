use bioself_core::db::{latest_version, open_db, open_db_in_memory, schema_version, DbError};
use rusqlite::Connection;

#[test]
fn open_db_in_memory_applies_all_migrations() {
    let conn = open_db_in_memory().unwrap();

    assert_eq!(schema_version(&conn).unwrap(), latest_version());
    assert_table_exists(&conn, "condition_drafts");
    assert_column_exists(&conn, "condition_drafts", "sync_attempts");
}

#[test]
fn opening_same_database_twice_is_idempotent() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("drafts.db");

    let conn_first = open_db(&path).unwrap();
    assert_eq!(schema_version(&conn_first).unwrap(), latest_version());
    drop(conn_first);

    let conn_second = open_db(&path).unwrap();
    assert_eq!(schema_version(&conn_second).unwrap(), latest_version());
    assert_table_exists(&conn_second, "condition_drafts");
}

#[test]
fn version_one_cache_is_upgraded_in_place() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("drafts.db");

    let conn = Connection::open(&path).unwrap();
    conn.execute_batch(
        "CREATE TABLE condition_drafts (
            id TEXT PRIMARY KEY NOT NULL,
            name TEXT NOT NULL,
            codes TEXT NOT NULL DEFAULT '[]',
            status TEXT NOT NULL,
            severity TEXT NOT NULL,
            diagnosed_date TEXT NOT NULL,
            resolved_date TEXT,
            notes TEXT NOT NULL DEFAULT '',
            created_at INTEGER NOT NULL DEFAULT 0,
            updated_at INTEGER NOT NULL DEFAULT 0,
            synced_at INTEGER,
            last_error TEXT
        );
        INSERT INTO condition_drafts (id, name, status, severity, diagnosed_date)
        VALUES ('00000000-0000-0000-0000-000000000001', 'Gout', 'active', 'mild', '2020-01-01');
        PRAGMA user_version = 1;",
    )
    .unwrap();
    drop(conn);

    let conn = open_db(&path).unwrap();
    assert_eq!(schema_version(&conn).unwrap(), latest_version());
    let attempts: i64 = conn
        .query_row("SELECT sync_attempts FROM condition_drafts;", [], |row| {
            row.get(0)
        })
        .unwrap();
    assert_eq!(attempts, 0);
}

#[test]
fn opening_database_with_newer_schema_version_returns_error() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("future.db");

    let conn = Connection::open(&path).unwrap();
    conn.execute_batch("PRAGMA user_version = 999;").unwrap();
    drop(conn);

    let err = open_db(&path).unwrap_err();
    match err {
        DbError::UnsupportedSchemaVersion {
            db_version,
            latest_supported,
        } => {
            assert_eq!(db_version, 999);
            assert_eq!(latest_supported, latest_version());
        }
        other => panic!("unexpected error: {other}"),
    }
}

#[test]
fn unreachable_cache_path_is_reported_with_its_path() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("missing").join("drafts.db");

    let err = open_db(&path).unwrap_err();
    assert_eq!(err.kind(), "draft_cache_unavailable");
    match err {
        DbError::Open { path: reported, .. } => assert_eq!(reported, path),
        other => panic!("unexpected error: {other}"),
    }
}

#[test]
fn failed_migration_names_its_version_and_rolls_back() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("drafts.db");

    // Claims version 1 but already carries the column version 2 adds.
    let conn = Connection::open(&path).unwrap();
    conn.execute_batch(
        "CREATE TABLE condition_drafts (
            id TEXT PRIMARY KEY NOT NULL,
            sync_attempts INTEGER NOT NULL DEFAULT 0
        );
        PRAGMA user_version = 1;",
    )
    .unwrap();
    drop(conn);

    let err = open_db(&path).unwrap_err();
    assert_eq!(err.kind(), "draft_cache_schema_mismatch");
    assert!(matches!(err, DbError::Migration { version: 2, .. }), "{err}");

    let conn = Connection::open(&path).unwrap();
    assert_eq!(schema_version(&conn).unwrap(), 1);
}

fn assert_table_exists(conn: &Connection, table_name: &str) {
    let exists: i64 = conn
        .query_row(
            "SELECT EXISTS(
                SELECT 1
                FROM sqlite_master
                WHERE type = 'table' AND name = ?1
            );",
            [table_name],
            |row| row.get(0),
        )
        .unwrap();
    assert_eq!(exists, 1, "table {table_name} does not exist");
}

fn assert_column_exists(conn: &Connection, table_name: &str, column: &str) {
    let exists: i64 = conn
        .query_row(
            &format!("SELECT EXISTS(SELECT 1 FROM pragma_table_info('{table_name}') WHERE name = ?1);"),
            [column],
            |row| row.get(0),
        )
        .unwrap();
    assert_eq!(exists, 1, "column {table_name}.{column} does not exist");
}
