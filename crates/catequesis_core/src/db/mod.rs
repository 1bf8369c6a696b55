//! Database boundary: connection provider, procedure sessions, SQLite backend.
//!
//! # Responsibility
//! - Define the contract between the record manager and the stored procedures.
//! - Provide the SQLite-backed connection provider and its procedure bodies.
//! - Apply schema migrations in deterministic order.
//!
//! # Invariants
//! - One `connect()` call yields one session owning one connection.
//! - A session that is dropped without `commit()` rolls its transaction back.
//! - Migration version is tracked via `PRAGMA user_version`.

use rusqlite::types::Value;
use std::error::Error;
use std::fmt::{Display, Formatter};

pub mod migrations;
mod open;
mod procedures;
mod session;

pub use open::{open_db, open_db_in_memory, SqliteConnectionProvider};
pub use session::SqliteSession;

pub type DbResult<T> = Result<T, DbError>;

#[derive(Debug)]
pub enum DbError {
    Sqlite(rusqlite::Error),
    UnsupportedSchemaVersion {
        db_version: u32,
        latest_supported: u32,
    },
    /// Procedure called with the wrong number of parameters.
    ParameterCount {
        procedure: Procedure,
        expected: usize,
        actual: usize,
    },
    /// Parameter at `index` has the wrong SQL type.
    ParameterType { procedure: Procedure, index: usize },
    /// Row-set procedure invoked for a status message, or the reverse.
    ProcedureShape { procedure: Procedure },
}

impl Display for DbError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Sqlite(err) => write!(f, "{err}"),
            Self::UnsupportedSchemaVersion {
                db_version,
                latest_supported,
            } => write!(
                f,
                "database schema version {db_version} is newer than supported {latest_supported}"
            ),
            Self::ParameterCount {
                procedure,
                expected,
                actual,
            } => write!(
                f,
                "procedure {procedure} expects {expected} parameters, got {actual}"
            ),
            Self::ParameterType { procedure, index } => {
                write!(f, "procedure {procedure} got a mistyped parameter at position {index}")
            }
            Self::ProcedureShape { procedure } => {
                write!(f, "procedure {procedure} does not return that kind of result")
            }
        }
    }
}

impl Error for DbError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Sqlite(err) => Some(err),
            _ => None,
        }
    }
}

impl From<rusqlite::Error> for DbError {
    fn from(value: rusqlite::Error) -> Self {
        Self::Sqlite(value)
    }
}

/// The five enrollee procedures exposed by the store.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Procedure {
    /// 11 in-params, one status message out.
    RegisterEnrollee,
    /// No params, row set out.
    ListEnrollees,
    /// 1 in-param, enrollee row or single status column out.
    FindEnrolleeByNationalId,
    /// 12 in-params (target national id first), one status message out.
    UpdateEnrollee,
    /// 1 in-param, one status message out.
    DeleteEnrolleeByNationalId,
}

impl Procedure {
    pub fn name(self) -> &'static str {
        match self {
            Self::RegisterEnrollee => "process.register_enrollee",
            Self::ListEnrollees => "process.list_enrollees",
            Self::FindEnrolleeByNationalId => "process.find_enrollee_by_national_id",
            Self::UpdateEnrollee => "process.update_enrollee",
            Self::DeleteEnrolleeByNationalId => "process.delete_enrollee_by_national_id",
        }
    }

    pub fn parameter_count(self) -> usize {
        match self {
            Self::RegisterEnrollee => 11,
            Self::ListEnrollees => 0,
            Self::FindEnrolleeByNationalId | Self::DeleteEnrolleeByNationalId => 1,
            Self::UpdateEnrollee => 12,
        }
    }

    /// Whether the procedure answers with a row set rather than a status message.
    pub fn returns_rows(self) -> bool {
        matches!(self, Self::ListEnrollees | Self::FindEnrolleeByNationalId)
    }
}

impl Display for Procedure {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.name())
    }
}

/// Name of the single column carried by a status-only row set.
pub const STATUS_COLUMN: &str = "status_message";

/// Column-named result of a row-returning procedure.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RowSet {
    pub columns: Vec<String>,
    pub rows: Vec<Vec<Value>>,
}

impl RowSet {
    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    pub fn column_index(&self, name: &str) -> Option<usize> {
        self.columns.iter().position(|column| column == name)
    }

    /// Pairs every column name of `row` with its value.
    pub fn named<'a>(&'a self, row: &'a [Value]) -> impl Iterator<Item = (&'a str, &'a Value)> {
        self.columns.iter().map(String::as_str).zip(row.iter())
    }
}

/// Renders one SQL value for console display.
pub fn display_value(value: &Value) -> String {
    match value {
        Value::Null => "NULL".to_string(),
        Value::Integer(number) => number.to_string(),
        Value::Real(number) => number.to_string(),
        Value::Text(text) => text.clone(),
        Value::Blob(bytes) => format!("<{} bytes>", bytes.len()),
    }
}

/// Supplies one fresh procedure session per operation.
pub trait ConnectionProvider {
    type Session: ProcedureSession;

    /// Opens a connection and starts a transaction on it.
    fn connect(&self) -> DbResult<Self::Session>;
}

/// One open connection with an active transaction.
///
/// Implementations release the connection when dropped and roll back any
/// transaction that was neither committed nor rolled back.
pub trait ProcedureSession {
    /// Calls a status-returning procedure. `None` means no status row came back.
    fn call_for_status(&mut self, procedure: Procedure, params: &[Value])
        -> DbResult<Option<String>>;

    /// Calls a row-returning procedure.
    fn call_for_rows(&mut self, procedure: Procedure, params: &[Value]) -> DbResult<RowSet>;

    fn commit(&mut self) -> DbResult<()>;

    fn rollback(&mut self) -> DbResult<()>;
}
