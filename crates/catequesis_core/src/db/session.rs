//! Scoped SQLite procedure session.
//!
//! # Invariants
//! - The wrapped connection is inside a transaction from `connect()` until
//!   `commit()`/`rollback()`.
//! - Drop rolls back a still-open transaction, then closes the connection.

use super::procedures;
use super::{DbResult, Procedure, ProcedureSession, RowSet};
use log::{debug, info, warn};
use rusqlite::types::Value;
use rusqlite::Connection;
use std::time::Instant;

pub struct SqliteSession {
    conn: Connection,
    opened_at: Instant,
}

impl SqliteSession {
    pub(super) fn new(conn: Connection) -> Self {
        Self {
            conn,
            opened_at: Instant::now(),
        }
    }

    /// Whether a transaction is still pending on this session.
    pub fn in_transaction(&self) -> bool {
        !self.conn.is_autocommit()
    }
}

impl ProcedureSession for SqliteSession {
    fn call_for_status(
        &mut self,
        procedure: Procedure,
        params: &[Value],
    ) -> DbResult<Option<String>> {
        debug!(
            "event=procedure_call module=db procedure={} params={}",
            procedure,
            params.len()
        );
        procedures::call_for_status(&self.conn, procedure, params)
    }

    fn call_for_rows(&mut self, procedure: Procedure, params: &[Value]) -> DbResult<RowSet> {
        debug!(
            "event=procedure_call module=db procedure={} params={}",
            procedure,
            params.len()
        );
        procedures::call_for_rows(&self.conn, procedure, params)
    }

    fn commit(&mut self) -> DbResult<()> {
        if self.in_transaction() {
            self.conn.execute_batch("COMMIT;")?;
        }
        Ok(())
    }

    fn rollback(&mut self) -> DbResult<()> {
        if self.in_transaction() {
            self.conn.execute_batch("ROLLBACK;")?;
        }
        Ok(())
    }
}

impl Drop for SqliteSession {
    fn drop(&mut self) {
        if self.in_transaction() {
            if let Err(err) = self.conn.execute_batch("ROLLBACK;") {
                warn!(
                    "event=session_close module=db status=error error_code=rollback_failed error={}",
                    err
                );
            }
        }
        info!(
            "event=session_close module=db status=ok held_ms={}",
            self.opened_at.elapsed().as_millis()
        );
    }
}
