use std::any::Any;
use std::sync::Arc;
use std::sync::mpsc::{self, Receiver, Sender};
use std::thread;

use rusqlite::types::Value as SqlValue;
use rusqlite::{Connection, params_from_iter};
use tokio::sync::{mpsc as async_mpsc, oneshot};

use crate::error::SqliteTableError;
use crate::query_builder::build_truncate;
use crate::results::Row;

use super::config::DatabaseOptions;
use super::query::{collect_rows, first_row, for_each_row};

/// Per-row outcome of a batch insert: rows changed, or the driver error for that row.
pub(crate) type RowOutcome = Result<usize, SqliteTableError>;

/// Handle to the thread that owns the `rusqlite` connection.
///
/// Commands are processed one at a time in arrival order. Dropping the handle asks the thread
/// to stop, which closes the connection.
pub(crate) struct SqliteWorker {
    sender: Sender<Command>,
}

impl SqliteWorker {
    /// Spawn the worker and wait until it has opened the database.
    pub(crate) async fn open(options: &DatabaseOptions) -> Result<Self, SqliteTableError> {
        let (sender, receiver) = mpsc::channel::<Command>();
        let (ready_tx, ready_rx) = oneshot::channel();
        let opts = options.clone();
        thread::Builder::new()
            .name(format!("sqlite-worker-{}", opts.db_path))
            .spawn(move || match open_connection(&opts) {
                Ok(conn) => {
                    let _ = ready_tx.send(Ok(()));
                    run_sqlite_worker(conn, &receiver);
                }
                Err(err) => {
                    let _ = ready_tx.send(Err(err));
                }
            })
            .map_err(|err| {
                SqliteTableError::ConnectionError(format!(
                    "failed to spawn SQLite worker thread: {err}"
                ))
            })?;

        ready_rx.await.map_err(|_| {
            SqliteTableError::ConnectionError("SQLite worker exited while opening".into())
        })??;
        tracing::debug!(path = %options.db_path, "sqlite worker started");
        Ok(Self { sender })
    }

    fn send_command(&self, command: Command) -> Result<(), SqliteTableError> {
        self.sender
            .send(command)
            .map_err(|_| SqliteTableError::ConnectionError("SQLite worker closed".into()))
    }

    async fn request<T>(
        &self,
        what: &str,
        build: impl FnOnce(oneshot::Sender<Result<T, SqliteTableError>>) -> Command,
    ) -> Result<T, SqliteTableError> {
        let (tx, rx) = oneshot::channel();
        self.send_command(build(tx))?;
        rx.await.map_err(|_| {
            SqliteTableError::ConnectionError(format!("SQLite worker dropped while {what}"))
        })?
    }

    pub(crate) async fn get(&self, query: String) -> Result<Option<Row>, SqliteTableError> {
        self.request("executing get", |respond_to| Command::Get { query, respond_to })
            .await
    }

    pub(crate) async fn all(&self, query: String) -> Result<Vec<Row>, SqliteTableError> {
        self.request("executing all", |respond_to| Command::All { query, respond_to })
            .await
    }

    pub(crate) async fn run(&self, query: String) -> Result<usize, SqliteTableError> {
        self.request("executing run", |respond_to| Command::Run { query, respond_to })
            .await
    }

    /// Start streaming a query; rows arrive on `rows`, the final count on the returned receiver.
    pub(crate) fn each(
        &self,
        query: String,
        rows: async_mpsc::UnboundedSender<Row>,
    ) -> Result<oneshot::Receiver<Result<usize, SqliteTableError>>, SqliteTableError> {
        let (tx, rx) = oneshot::channel();
        self.send_command(Command::Each {
            query,
            rows,
            respond_to: tx,
        })?;
        Ok(rx)
    }

    pub(crate) async fn truncate(&self, table: String) -> Result<usize, SqliteTableError> {
        self.request("truncating", |respond_to| Command::Truncate { table, respond_to })
            .await
    }

    pub(crate) async fn insert_batch(
        &self,
        query: String,
        rows: Vec<Vec<SqlValue>>,
    ) -> Result<Vec<RowOutcome>, SqliteTableError> {
        self.request("executing batch insert", |respond_to| Command::InsertBatch {
            query,
            rows,
            respond_to,
        })
        .await
    }

    pub(crate) async fn prepare_statement(
        &self,
        query: Arc<String>,
    ) -> Result<(), SqliteTableError> {
        self.request("preparing statement", |respond_to| Command::PrepareStatement {
            query,
            respond_to,
        })
        .await
    }

    pub(crate) async fn execute_prepared(
        &self,
        query: Arc<String>,
        params: Vec<SqlValue>,
    ) -> Result<usize, SqliteTableError> {
        self.request("executing prepared statement", |respond_to| {
            Command::ExecutePrepared {
                query,
                params,
                respond_to,
            }
        })
        .await
    }

    pub(crate) async fn query_prepared(
        &self,
        query: Arc<String>,
        params: Vec<SqlValue>,
    ) -> Result<Vec<Row>, SqliteTableError> {
        self.request("querying prepared statement", |respond_to| {
            Command::QueryPrepared {
                query,
                params,
                respond_to,
            }
        })
        .await
    }

    pub(crate) fn discard_statement(&self, query: Arc<String>) -> Result<(), SqliteTableError> {
        self.send_command(Command::DiscardStatement { query })
    }

    pub(crate) async fn with_connection<F, R>(&self, func: F) -> Result<R, SqliteTableError>
    where
        F: FnOnce(&mut Connection) -> Result<R, SqliteTableError> + Send + 'static,
        R: Send + 'static,
    {
        let callback: BoxedCallback =
            Box::new(move |conn| func(conn).map(|value| Box::new(value) as Box<dyn Any + Send>));
        let payload = self
            .request("handling custom callback", |respond_to| Command::WithConnection {
                callback,
                respond_to,
            })
            .await?;
        payload.downcast::<R>().map(|boxed| *boxed).map_err(|_| {
            SqliteTableError::ExecutionError("SQLite worker response downcast failure".into())
        })
    }

    pub(crate) async fn close(&self) -> Result<(), SqliteTableError> {
        self.request("closing", |respond_to| Command::Close { respond_to })
            .await
    }
}

impl Drop for SqliteWorker {
    fn drop(&mut self) {
        let _ = self.sender.send(Command::Shutdown);
    }
}

type Respond<T> = oneshot::Sender<Result<T, SqliteTableError>>;
type BoxedCallback =
    Box<dyn FnOnce(&mut Connection) -> Result<Box<dyn Any + Send>, SqliteTableError> + Send>;

enum Command {
    Get {
        query: String,
        respond_to: Respond<Option<Row>>,
    },
    All {
        query: String,
        respond_to: Respond<Vec<Row>>,
    },
    Run {
        query: String,
        respond_to: Respond<usize>,
    },
    Each {
        query: String,
        rows: async_mpsc::UnboundedSender<Row>,
        respond_to: Respond<usize>,
    },
    Truncate {
        table: String,
        respond_to: Respond<usize>,
    },
    InsertBatch {
        query: String,
        rows: Vec<Vec<SqlValue>>,
        respond_to: Respond<Vec<RowOutcome>>,
    },
    PrepareStatement {
        query: Arc<String>,
        respond_to: Respond<()>,
    },
    ExecutePrepared {
        query: Arc<String>,
        params: Vec<SqlValue>,
        respond_to: Respond<usize>,
    },
    QueryPrepared {
        query: Arc<String>,
        params: Vec<SqlValue>,
        respond_to: Respond<Vec<Row>>,
    },
    DiscardStatement {
        query: Arc<String>,
    },
    WithConnection {
        callback: BoxedCallback,
        respond_to: Respond<Box<dyn Any + Send>>,
    },
    Close {
        respond_to: Respond<()>,
    },
    Shutdown,
}

fn open_connection(options: &DatabaseOptions) -> Result<Connection, SqliteTableError> {
    let conn = Connection::open(&options.db_path)?;
    if let Some(timeout) = options.busy_timeout {
        conn.busy_timeout(timeout)?;
    }
    Ok(conn)
}

fn run_sqlite_worker(mut conn: Connection, receiver: &Receiver<Command>) {
    while let Ok(command) = receiver.recv() {
        match command {
            Command::Get { query, respond_to } => {
                let outcome = conn
                    .prepare(&query)
                    .map_err(SqliteTableError::from)
                    .and_then(|mut stmt| first_row(&mut stmt, &[]));
                let _ = respond_to.send(outcome);
            }
            Command::All { query, respond_to } => {
                let outcome = conn
                    .prepare(&query)
                    .map_err(SqliteTableError::from)
                    .and_then(|mut stmt| collect_rows(&mut stmt, &[]));
                let _ = respond_to.send(outcome);
            }
            Command::Run { query, respond_to } => {
                let outcome = run_statement(&conn, &query);
                let _ = respond_to.send(outcome);
            }
            Command::Each {
                query,
                rows,
                respond_to,
            } => {
                let outcome = conn
                    .prepare(&query)
                    .map_err(SqliteTableError::from)
                    .and_then(|mut stmt| {
                        for_each_row(&mut stmt, &[], |row| rows.send(row).is_ok())
                    });
                drop(rows);
                let _ = respond_to.send(outcome);
            }
            Command::Truncate { table, respond_to } => {
                let (delete, reset_sequence) = build_truncate(&table);
                let outcome = conn.execute(&delete, []).map_err(SqliteTableError::from);
                if outcome.is_ok() {
                    // sqlite_sequence only exists once an AUTOINCREMENT table has been created.
                    let _ = conn.execute(&reset_sequence, []);
                }
                let _ = respond_to.send(outcome);
            }
            Command::InsertBatch {
                query,
                rows,
                respond_to,
            } => {
                let outcome = insert_batch(&conn, &query, &rows);
                let _ = respond_to.send(outcome);
            }
            Command::PrepareStatement { query, respond_to } => {
                let outcome = conn
                    .prepare_cached(&query)
                    .map(|_| ())
                    .map_err(SqliteTableError::from);
                let _ = respond_to.send(outcome);
            }
            Command::ExecutePrepared {
                query,
                params,
                respond_to,
            } => {
                let outcome = conn
                    .prepare_cached(&query)
                    .and_then(|mut stmt| stmt.execute(params_from_iter(params.iter())))
                    .map_err(SqliteTableError::from);
                let _ = respond_to.send(outcome);
            }
            Command::QueryPrepared {
                query,
                params,
                respond_to,
            } => {
                let outcome = conn
                    .prepare_cached(&query)
                    .map_err(SqliteTableError::from)
                    .and_then(|mut stmt| collect_rows(&mut stmt, &params));
                let _ = respond_to.send(outcome);
            }
            Command::DiscardStatement { query } => {
                if let Ok(stmt) = conn.prepare_cached(&query) {
                    stmt.discard();
                }
            }
            Command::WithConnection {
                callback,
                respond_to,
            } => {
                let outcome = callback(&mut conn);
                let _ = respond_to.send(outcome);
            }
            Command::Close { respond_to } => {
                let outcome = conn.close().map_err(|(_, err)| SqliteTableError::from(err));
                let _ = respond_to.send(outcome);
                tracing::debug!("sqlite worker closed");
                return;
            }
            Command::Shutdown => break,
        }
    }
    tracing::debug!("sqlite worker stopped");
}

/// Step a statement to completion.
///
/// Statements without result columns report rows changed. Row-returning statements
/// (`SELECT`, most pragmas, `RETURNING`) are drained and report the rows stepped.
fn run_statement(conn: &Connection, query: &str) -> Result<usize, SqliteTableError> {
    let mut stmt = conn.prepare(query)?;
    if stmt.column_count() == 0 {
        return Ok(stmt.execute([])?);
    }
    let mut rows = stmt.query([])?;
    let mut stepped = 0;
    while rows.next()?.is_some() {
        stepped += 1;
    }
    Ok(stepped)
}

/// One statement, executed once per row, finalized only after every row has completed.
fn insert_batch(
    conn: &Connection,
    query: &str,
    rows: &[Vec<SqlValue>],
) -> Result<Vec<RowOutcome>, SqliteTableError> {
    let mut stmt = conn.prepare(query)?;
    let outcomes = rows
        .iter()
        .map(|values| {
            stmt.execute(params_from_iter(values.iter()))
                .map_err(SqliteTableError::from)
        })
        .collect();
    stmt.finalize()?;
    Ok(outcomes)
}
