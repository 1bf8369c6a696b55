//! Enrollee database connections.
//!
//! Every connection handed out here has foreign keys enforced, a busy
//! timeout, and the schema at the latest version. `SqliteConnectionProvider`
//! wraps that into one transactional session per record-manager operation.
//! Connection passwords are never logged.

use super::migrations::apply_migrations;
use super::session::SqliteSession;
use super::{ConnectionProvider, DbError, DbResult};
use crate::config::ConnectionSettings;
use log::{error, info};
use rusqlite::Connection;
use std::path::Path;
use std::time::{Duration, Instant};

const BUSY_TIMEOUT: Duration = Duration::from_secs(5);

/// Opens (creating if needed) the enrollee database at `path`.
///
/// Logs `db_open` start/outcome events with the elapsed time.
pub fn open_db(path: impl AsRef<Path>) -> DbResult<Connection> {
    open_with("file", || Connection::open(path))
}

/// Throwaway database for tests and tooling.
pub fn open_db_in_memory() -> DbResult<Connection> {
    open_with("memory", Connection::open_in_memory)
}

fn open_with(
    mode: &str,
    open: impl FnOnce() -> rusqlite::Result<Connection>,
) -> DbResult<Connection> {
    let started_at = Instant::now();
    info!("event=db_open module=db status=start mode={}", mode);

    let outcome = open()
        .map_err(|err| ("db_open_failed", DbError::from(err)))
        .and_then(|mut conn| match prepare(&mut conn) {
            Ok(()) => Ok(conn),
            Err(err) => Err(("db_bootstrap_failed", err)),
        });

    let elapsed_ms = started_at.elapsed().as_millis();
    match outcome {
        Ok(conn) => {
            info!(
                "event=db_open module=db status=ok mode={} duration_ms={}",
                mode, elapsed_ms
            );
            Ok(conn)
        }
        Err((code, err)) => {
            error!(
                "event=db_open module=db status=error mode={} duration_ms={} error_code={} error={}",
                mode, elapsed_ms, code, err
            );
            Err(err)
        }
    }
}

fn prepare(conn: &mut Connection) -> DbResult<()> {
    conn.execute_batch("PRAGMA foreign_keys = ON;")?;
    conn.busy_timeout(BUSY_TIMEOUT)?;
    apply_migrations(conn)?;
    Ok(())
}

/// Connection provider backed by a SQLite database file.
///
/// `settings.database` is the file path. `server_name` and `user` are only
/// reported in diagnostics; SQLite has no notion of either.
#[derive(Debug, Clone)]
pub struct SqliteConnectionProvider {
    settings: ConnectionSettings,
}

impl SqliteConnectionProvider {
    pub fn new(settings: ConnectionSettings) -> Self {
        Self { settings }
    }
}

impl ConnectionProvider for SqliteConnectionProvider {
    type Session = SqliteSession;

    fn connect(&self) -> DbResult<SqliteSession> {
        info!(
            "event=session_open module=db status=start server={} database={} user={}",
            self.settings.server_name, self.settings.database, self.settings.user
        );
        let conn = open_db(&self.settings.database)?;
        conn.execute_batch("BEGIN DEFERRED;")?;
        Ok(SqliteSession::new(conn))
    }
}
