//! Enrollee record manager.
//!
//! # Responsibility
//! - Run the five enrollee operations against the stored procedures.
//! - Turn status messages into commit/rollback decisions and typed results.
//!
//! # Invariants
//! - Every operation opens its own session and releases it before returning,
//!   on success and on every error path.
//! - A status message starting with `OK:` commits; anything else, or no
//!   message at all, rolls back.
//! - `list` and `find_by_national_id` never commit.

use crate::db::{
    ConnectionProvider, DbError, Procedure, ProcedureSession, RowSet, STATUS_COLUMN,
};
use crate::model::enrollee::{EnrolleeDraft, EnrolleeRecord, Field};
use crate::model::status::ProcedureStatus;
use log::{error, info, warn};
use rusqlite::types::Value;
use std::error::Error;
use std::fmt::{Display, Formatter};
use std::time::Instant;
use uuid::Uuid;

pub type ServiceResult<T> = Result<T, ServiceError>;

/// Failure of one record-manager operation.
#[derive(Debug)]
pub enum ServiceError {
    /// The connection provider could not open a session.
    Connection(DbError),
    /// The procedure answered without the `OK:` prefix. Rolled back.
    Procedure(String),
    /// The procedure returned no status row. Rolled back.
    MissingResult,
    /// A call, commit or rollback failed on an open session.
    Db(DbError),
    /// The store returned a row the enrollee model cannot represent.
    InvalidData(String),
}

impl Display for ServiceError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Connection(err) => write!(f, "could not connect to the database: {err}"),
            Self::Procedure(message) => f.write_str(message),
            Self::MissingResult => f.write_str("no result message was received"),
            Self::Db(err) => write!(f, "{err}"),
            Self::InvalidData(message) => write!(f, "invalid stored enrollee data: {message}"),
        }
    }
}

impl Error for ServiceError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Connection(err) | Self::Db(err) => Some(err),
            _ => None,
        }
    }
}

impl From<DbError> for ServiceError {
    fn from(value: DbError) -> Self {
        Self::Db(value)
    }
}

/// Committed mutation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MutationReceipt {
    /// The procedure's `OK:` message, verbatim.
    pub status_message: String,
    /// Operator-facing confirmation naming the affected enrollee.
    pub summary: String,
}

/// Enrollee as held by the store.
///
/// Stored values are not re-validated: rows written before the current input
/// rules (or by other tools) are still returned as they are.
#[derive(Debug, Clone, PartialEq)]
pub struct StoredEnrollee {
    /// Store-owned surrogate key, when the procedure exposes it.
    pub enrollee_id: Option<i64>,
    /// The 11 enrollee fields, looked up by column name.
    pub fields: EnrolleeDraft,
    /// Every column of the matching row, in the order the procedure returned them.
    pub row: Vec<(String, Value)>,
}

/// Outcome of a lookup by national id.
#[derive(Debug, Clone, PartialEq)]
pub enum Lookup {
    Found(StoredEnrollee),
    /// The procedure's not-found (or error) message, verbatim.
    NotFound(String),
}

/// Record manager over an injected connection provider.
pub struct EnrolleeService<P: ConnectionProvider> {
    provider: P,
}

impl<P: ConnectionProvider> EnrolleeService<P> {
    pub fn new(provider: P) -> Self {
        Self { provider }
    }

    pub fn provider(&self) -> &P {
        &self.provider
    }

    /// Registers a new enrollee through the register procedure.
    ///
    /// Sends the 11 record fields in `Field::ALL` order.
    pub fn create(&self, record: &EnrolleeRecord) -> ServiceResult<MutationReceipt> {
        let status_message = self.run_mutation(Procedure::RegisterEnrollee, &record.to_params())?;
        Ok(MutationReceipt {
            status_message,
            summary: format!(
                "ENROLLEE {} REGISTERED SUCCESSFULLY.",
                record.full_name()
            ),
        })
    }

    /// Lists every enrollee row with its column names. Read-only.
    pub fn list(&self) -> ServiceResult<RowSet> {
        let op = OperationLog::start(Procedure::ListEnrollees);
        let mut session = self.open(&op)?;
        let rows = session
            .call_for_rows(Procedure::ListEnrollees, &[])
            .map_err(|err| op.fail(err.into()))?;
        op.ok(&format!("rows={}", rows.rows.len()));
        Ok(rows)
    }

    /// Looks up one enrollee by national id. Read-only.
    ///
    /// A multi-column row is a match. A single status column is a not-found
    /// signal carrying the procedure's message. No row at all is
    /// `ServiceError::MissingResult`.
    pub fn find_by_national_id(&self, national_id: &str) -> ServiceResult<Lookup> {
        let op = OperationLog::start(Procedure::FindEnrolleeByNationalId);
        let mut session = self.open(&op)?;
        let rows = session
            .call_for_rows(
                Procedure::FindEnrolleeByNationalId,
                &[Value::Text(national_id.to_string())],
            )
            .map_err(|err| op.fail(err.into()))?;

        let lookup = parse_lookup(&rows).map_err(|err| op.fail(err))?;
        match &lookup {
            Lookup::Found(_) => op.ok("found=true"),
            Lookup::NotFound(_) => op.ok("found=false"),
        }
        Ok(lookup)
    }

    /// Replaces the enrollee identified by `target_national_id` with `record`.
    ///
    /// Sends 12 parameters: the target key, then the 11 record fields.
    pub fn update(
        &self,
        target_national_id: &str,
        record: &EnrolleeRecord,
    ) -> ServiceResult<MutationReceipt> {
        let mut params = Vec::with_capacity(Procedure::UpdateEnrollee.parameter_count());
        params.push(Value::Text(target_national_id.to_string()));
        params.extend(record.to_params());

        let status_message = self.run_mutation(Procedure::UpdateEnrollee, &params)?;
        Ok(MutationReceipt {
            status_message,
            summary: format!("ENROLLEE {} UPDATED SUCCESSFULLY.", record.full_name()),
        })
    }

    /// Deletes the enrollee identified by `national_id`.
    pub fn delete(&self, national_id: &str) -> ServiceResult<MutationReceipt> {
        let status_message = self.run_mutation(
            Procedure::DeleteEnrolleeByNationalId,
            &[Value::Text(national_id.to_string())],
        )?;
        Ok(MutationReceipt {
            status_message,
            summary: format!("ENROLLEE WITH NATIONAL ID {national_id} DELETED SUCCESSFULLY."),
        })
    }

    fn open(&self, op: &OperationLog) -> ServiceResult<P::Session> {
        self.provider
            .connect()
            .map_err(|err| op.fail(ServiceError::Connection(err)))
    }

    /// Shared body of create/update/delete. Returns the `OK:` message.
    fn run_mutation(&self, procedure: Procedure, params: &[Value]) -> ServiceResult<String> {
        let op = OperationLog::start(procedure);
        let mut session = self.open(&op)?;

        let reply = match session.call_for_status(procedure, params) {
            Ok(reply) => reply,
            Err(err) => {
                rollback_quietly(&mut session, &op);
                return Err(op.fail(err.into()));
            }
        };

        match reply.map(ProcedureStatus::from_message) {
            Some(ProcedureStatus::Ok(message)) => {
                session.commit().map_err(|err| op.fail(err.into()))?;
                op.ok("decision=commit");
                Ok(message)
            }
            Some(ProcedureStatus::Rejected(message)) => {
                rollback_quietly(&mut session, &op);
                Err(op.fail(ServiceError::Procedure(message)))
            }
            None => {
                rollback_quietly(&mut session, &op);
                Err(op.fail(ServiceError::MissingResult))
            }
        }
    }
}

fn rollback_quietly<S: ProcedureSession>(session: &mut S, op: &OperationLog) {
    if let Err(err) = session.rollback() {
        warn!(
            "event=enrollee_op module=service op_id={} procedure={} status=error error_code=rollback_failed error={}",
            op.id, op.procedure, err
        );
    }
}

fn parse_lookup(rows: &RowSet) -> ServiceResult<Lookup> {
    let Some(row) = rows.rows.first() else {
        return Err(ServiceError::MissingResult);
    };

    if rows.columns.len() <= 1 {
        let message = row
            .first()
            .map(crate::db::display_value)
            .unwrap_or_default();
        if rows.columns.first().map(String::as_str) != Some(STATUS_COLUMN) {
            warn!(
                "event=enrollee_lookup module=service status=unexpected_shape columns={:?}",
                rows.columns
            );
        }
        return Ok(Lookup::NotFound(message));
    }

    if row.len() != rows.columns.len() {
        return Err(ServiceError::InvalidData(format!(
            "row has {} values for {} columns",
            row.len(),
            rows.columns.len()
        )));
    }

    let mut fields = EnrolleeDraft::default();
    for field in Field::ALL {
        fields.set(field, column_value(rows, row, field.column())?);
    }

    let enrollee_id = match rows.column_index("enrollee_id").and_then(|index| row.get(index)) {
        Some(Value::Integer(id)) => Some(*id),
        _ => None,
    };

    Ok(Lookup::Found(StoredEnrollee {
        enrollee_id,
        fields,
        row: rows
            .named(row)
            .map(|(column, value)| (column.to_string(), value.clone()))
            .collect(),
    }))
}

fn column_value(rows: &RowSet, row: &[Value], column: &str) -> ServiceResult<String> {
    let index = rows
        .column_index(column)
        .ok_or_else(|| ServiceError::InvalidData(format!("missing column `{column}`")))?;
    match row.get(index) {
        Some(Value::Text(text)) => Ok(text.clone()),
        Some(Value::Integer(number)) => Ok(number.to_string()),
        Some(Value::Null) => Ok(String::new()),
        Some(other) => Err(ServiceError::InvalidData(format!(
            "unexpected value {} in column `{column}`",
            crate::db::display_value(other)
        ))),
        None => Err(ServiceError::InvalidData(format!(
            "row is shorter than its columns at `{column}`"
        ))),
    }
}

/// Start/outcome log events of one operation, keyed by a correlation id.
struct OperationLog {
    id: Uuid,
    procedure: Procedure,
    started_at: Instant,
}

impl OperationLog {
    fn start(procedure: Procedure) -> Self {
        let op = Self {
            id: Uuid::new_v4(),
            procedure,
            started_at: Instant::now(),
        };
        info!(
            "event=enrollee_op module=service op_id={} procedure={} status=start",
            op.id, op.procedure
        );
        op
    }

    fn ok(&self, detail: &str) {
        info!(
            "event=enrollee_op module=service op_id={} procedure={} status=ok duration_ms={} {}",
            self.id,
            self.procedure,
            self.started_at.elapsed().as_millis(),
            detail
        );
    }

    /// Logs `err` and hands it back for propagation.
    fn fail(&self, err: ServiceError) -> ServiceError {
        let code = match &err {
            ServiceError::Connection(_) => "connection_failed",
            ServiceError::Procedure(_) => "procedure_rejected",
            ServiceError::MissingResult => "missing_result",
            ServiceError::Db(_) => "db_error",
            ServiceError::InvalidData(_) => "invalid_data",
        };
        error!(
            "event=enrollee_op module=service op_id={} procedure={} status=error duration_ms={} error_code={} error={}",
            self.id,
            self.procedure,
            self.started_at.elapsed().as_millis(),
            code,
            err
        );
        err
    }
}
