//! Failures surface as `None`/`false` on the plain API and as typed errors on `try_*`, with
//! exactly one logged diagnostic per driver error.

use std::io::{self, Write};
use std::sync::{Arc, Mutex};

use sqlite_table::prelude::*;
use tracing::Level;
use tracing_subscriber::fmt::writer::MakeWriter;

type TestResult = Result<(), Box<dyn std::error::Error>>;

#[derive(Clone, Default)]
struct CapturedLog {
    buf: Arc<Mutex<Vec<u8>>>,
}

impl CapturedLog {
    fn contents(&self) -> String {
        String::from_utf8_lossy(&self.buf.lock().unwrap()).into_owned()
    }

    fn error_lines(&self) -> Vec<String> {
        self.contents()
            .lines()
            .filter(|l| l.contains("ERROR"))
            .map(str::to_owned)
            .collect()
    }
}

impl<'a> MakeWriter<'a> for CapturedLog {
    type Writer = CapturedLog;

    fn make_writer(&'a self) -> Self::Writer {
        self.clone()
    }
}

impl Write for CapturedLog {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        self.buf.lock().unwrap().extend_from_slice(buf);
        Ok(buf.len())
    }

    fn flush(&mut self) -> io::Result<()> {
        Ok(())
    }
}

fn capture() -> (CapturedLog, tracing::subscriber::DefaultGuard) {
    let log = CapturedLog::default();
    let subscriber = tracing_subscriber::fmt()
        .with_writer(log.clone())
        .with_ansi(false)
        .with_max_level(Level::ERROR)
        .finish();
    let guard = tracing::subscriber::set_default(subscriber);
    (log, guard)
}

#[tokio::test]
async fn get_failure_is_none_and_logged_once() -> TestResult {
    let (log, _guard) = capture();
    let db = Database::open(":memory:").await?;

    let query = "SELECT * FROM missing_get";
    assert!(db.get(query).await.is_none());

    let lines = log.error_lines();
    assert_eq!(lines.len(), 1, "{lines:?}");
    assert!(lines[0].contains(query), "{}", lines[0]);
    assert!(lines[0].contains("SQLite Get Error"), "{}", lines[0]);
    Ok(())
}

#[tokio::test]
async fn all_failure_is_none_and_logged_once() -> TestResult {
    let (log, _guard) = capture();
    let db = Database::open(":memory:").await?;

    let query = "SELECT * FROM missing_all";
    assert!(db.all(query).await.is_none());

    let lines = log.error_lines();
    assert_eq!(lines.len(), 1, "{lines:?}");
    assert!(lines[0].contains(query), "{}", lines[0]);
    Ok(())
}

#[tokio::test]
async fn run_failure_is_false_and_logged_once() -> TestResult {
    let (log, _guard) = capture();
    let db = Database::open(":memory:").await?;

    let query = "INSERT INTO missing_run (a) VALUES (1)";
    assert!(!db.run(query).await);

    let err = db.try_run(query).await.unwrap_err();
    assert_eq!(err.kind(), ErrorKind::Driver);
    assert!(matches!(err, SqliteTableError::SqliteError(_)));

    // one line per failing call
    let lines = log.error_lines();
    assert_eq!(lines.len(), 2, "{lines:?}");
    assert!(lines.iter().all(|l| l.contains(query)));
    Ok(())
}

#[tokio::test]
async fn empty_all_looks_like_failure_but_kind_differs() -> TestResult {
    let (log, _guard) = capture();
    let db = Database::open(":memory:").await?;
    db.try_run("CREATE TABLE empty_t (a INTEGER)").await?;

    // the plain API cannot tell "no rows" from an error
    assert!(db.all("SELECT * FROM empty_t").await.is_none());
    assert!(db.all("SELECT * FROM not_there").await.is_none());

    let empty = db.try_all("SELECT * FROM empty_t").await.unwrap_err();
    assert_eq!(empty.kind(), ErrorKind::EmptyResult);
    let failed = db.try_all("SELECT * FROM not_there").await.unwrap_err();
    assert_eq!(failed.kind(), ErrorKind::Driver);

    // empty results are never logged
    let lines = log.error_lines();
    assert_eq!(lines.len(), 2, "{lines:?}");
    assert!(lines.iter().all(|l| l.contains("not_there")));

    let table = db.table("empty_t");
    assert!(table.find(&Fields::new(), &FindOptions::new()).await.is_none());
    assert_eq!(table.count(&Fields::new()).await, Some(0));
    Ok(())
}

#[tokio::test]
async fn get_with_no_row_is_ok_none() -> TestResult {
    let db = Database::open(":memory:").await?;
    db.try_run("CREATE TABLE g (a INTEGER)").await?;
    assert!(db.try_get("SELECT * FROM g").await?.is_none());
    Ok(())
}

#[tokio::test]
async fn drop_and_truncate_failures_are_logged_with_table_name() -> TestResult {
    let (log, _guard) = capture();
    let db = Database::open(":memory:").await?;

    assert!(db.drop_table("never_created").await);
    assert!(!db.truncate("never_created").await);

    let lines = log.error_lines();
    assert_eq!(lines.len(), 1, "{lines:?}");
    assert!(lines[0].contains("SQLite Truncate 'never_created' Table Error"));
    assert!(lines[0].contains("DELETE FROM `never_created`"));
    Ok(())
}

#[tokio::test]
async fn each_failure_is_false() -> TestResult {
    let (log, _guard) = capture();
    let db = Database::open(":memory:").await?;

    let mut rows = 0;
    assert!(!db.each("SELECT * FROM nowhere", |_| rows += 1).await);
    assert_eq!(rows, 0);
    assert_eq!(log.error_lines().len(), 1);
    Ok(())
}

#[tokio::test]
async fn open_rejects_an_empty_path() {
    let err = Database::open("").await.unwrap_err();
    assert!(matches!(err, SqliteTableError::ConfigError(_)));
}

#[tokio::test]
async fn invalid_utf8_text_does_not_kill_the_handle() -> TestResult {
    let db = Database::open(":memory:").await?;
    db.try_run("CREATE TABLE raw (a TEXT)").await?;
    db.try_run("INSERT INTO raw (a) VALUES (CAST(x'61ff' AS TEXT))")
        .await?;

    let rows = db.try_all("SELECT a FROM raw").await?;
    assert_eq!(rows[0].get("a"), Some(&Value::Text("a\u{fffd}".into())));

    // the same handle keeps serving statements afterwards
    db.try_run("CREATE TABLE after_raw (b INTEGER)").await?;
    assert_eq!(db.table("raw").try_count(&Fields::new()).await?, 1);
    Ok(())
}

#[tokio::test]
async fn run_accepts_row_returning_statements() -> TestResult {
    let (log, _guard) = capture();
    let dir = tempfile::tempdir()?;
    let path = dir.path().join("wal.db").to_string_lossy().into_owned();
    let db = Database::open(path).await?;

    assert!(db.run("SELECT 1").await);
    assert!(db.run("PRAGMA journal_mode=WAL").await);
    db.try_run("CREATE TABLE r (id INTEGER PRIMARY KEY, v TEXT)")
        .await?;
    assert_eq!(
        db.try_run("INSERT INTO r (v) VALUES ('a'), ('b') RETURNING id")
            .await?,
        2
    );
    assert_eq!(db.try_run("UPDATE r SET v = 'c'").await?, 2);
    assert!(log.error_lines().is_empty(), "{:?}", log.error_lines());
    Ok(())
}
