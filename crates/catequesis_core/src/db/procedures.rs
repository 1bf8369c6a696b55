//! SQLite bodies of the enrollee procedures.
//!
//! Each mutating procedure answers with an `OK:`/`ERROR:` status message and
//! leaves transaction control to the caller. Business rejections (duplicate
//! national id, unknown parish, unknown enrollee) are status messages, not
//! `DbError`s.

use super::{DbError, DbResult, Procedure, RowSet, STATUS_COLUMN};
use rusqlite::types::Value;
use rusqlite::{params_from_iter, Connection, OptionalExtension};

const ENROLLEE_SELECT_SQL: &str = "SELECT
    enrollee_id,
    parish_id,
    first_names,
    last_names,
    national_id,
    birth_date,
    home_address,
    guardian_name,
    guardian_phone,
    guardian_email,
    baptism_date,
    baptism_parish
FROM enrollees";

pub(super) fn call_for_status(
    conn: &Connection,
    procedure: Procedure,
    params: &[Value],
) -> DbResult<Option<String>> {
    check_arity(procedure, params)?;
    let message = match procedure {
        Procedure::RegisterEnrollee => register_enrollee(conn, params)?,
        Procedure::UpdateEnrollee => update_enrollee(conn, params)?,
        Procedure::DeleteEnrolleeByNationalId => delete_enrollee(conn, params)?,
        Procedure::ListEnrollees | Procedure::FindEnrolleeByNationalId => {
            return Err(DbError::ProcedureShape { procedure });
        }
    };
    Ok(Some(message))
}

pub(super) fn call_for_rows(
    conn: &Connection,
    procedure: Procedure,
    params: &[Value],
) -> DbResult<RowSet> {
    check_arity(procedure, params)?;
    match procedure {
        Procedure::ListEnrollees => query_row_set(
            conn,
            &format!("{ENROLLEE_SELECT_SQL} ORDER BY enrollee_id ASC;"),
            params,
        ),
        Procedure::FindEnrolleeByNationalId => {
            let national_id = text_param(procedure, params, 0)?;
            let found = query_row_set(
                conn,
                &format!("{ENROLLEE_SELECT_SQL} WHERE national_id = ?1;"),
                params,
            )?;
            if !found.is_empty() {
                return Ok(found);
            }
            Ok(RowSet {
                columns: vec![STATUS_COLUMN.to_string()],
                rows: vec![vec![Value::Text(not_found_message(national_id))]],
            })
        }
        _ => Err(DbError::ProcedureShape { procedure }),
    }
}

fn register_enrollee(conn: &Connection, params: &[Value]) -> DbResult<String> {
    let procedure = Procedure::RegisterEnrollee;
    let national_id = text_param(procedure, params, 3)?;

    if enrollee_exists(conn, national_id)? {
        return Ok(format!(
            "ERROR: an enrollee with national id {national_id} is already registered"
        ));
    }
    if !parish_exists(conn, &params[0])? {
        return Ok(unknown_parish_message(&params[0]));
    }

    conn.execute(
        "INSERT INTO enrollees (
            parish_id,
            first_names,
            last_names,
            national_id,
            birth_date,
            home_address,
            guardian_name,
            guardian_phone,
            guardian_email,
            baptism_date,
            baptism_parish
        ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11);",
        params_from_iter(params),
    )?;

    Ok(format!("OK: enrollee {national_id} registered"))
}

fn update_enrollee(conn: &Connection, params: &[Value]) -> DbResult<String> {
    let procedure = Procedure::UpdateEnrollee;
    let target = text_param(procedure, params, 0)?;
    let fields = &params[1..];
    let new_national_id = text_param(procedure, params, 4)?;

    if !enrollee_exists(conn, target)? {
        return Ok(not_found_message(target));
    }
    if new_national_id != target && enrollee_exists(conn, new_national_id)? {
        return Ok(format!(
            "ERROR: national id {new_national_id} already belongs to another enrollee"
        ));
    }
    if !parish_exists(conn, &fields[0])? {
        return Ok(unknown_parish_message(&fields[0]));
    }

    conn.execute(
        "UPDATE enrollees
         SET
            parish_id = ?1,
            first_names = ?2,
            last_names = ?3,
            national_id = ?4,
            birth_date = ?5,
            home_address = ?6,
            guardian_name = ?7,
            guardian_phone = ?8,
            guardian_email = ?9,
            baptism_date = ?10,
            baptism_parish = ?11,
            updated_at = (strftime('%s', 'now') * 1000)
         WHERE national_id = ?12;",
        params_from_iter(fields.iter().chain(std::iter::once(&params[0]))),
    )?;

    Ok(format!("OK: enrollee {target} updated"))
}

fn delete_enrollee(conn: &Connection, params: &[Value]) -> DbResult<String> {
    let national_id = text_param(Procedure::DeleteEnrolleeByNationalId, params, 0)?;

    let changed = conn.execute(
        "DELETE FROM enrollees WHERE national_id = ?1;",
        [national_id],
    )?;
    if changed == 0 {
        return Ok(not_found_message(national_id));
    }

    Ok(format!("OK: enrollee {national_id} deleted"))
}

fn query_row_set(conn: &Connection, sql: &str, params: &[Value]) -> DbResult<RowSet> {
    let mut stmt = conn.prepare(sql)?;
    let columns = stmt
        .column_names()
        .into_iter()
        .map(str::to_string)
        .collect::<Vec<_>>();
    let width = columns.len();

    let mut rows = stmt.query(params_from_iter(params))?;
    let mut out = Vec::new();
    while let Some(row) = rows.next()? {
        let mut values = Vec::with_capacity(width);
        for index in 0..width {
            values.push(row.get::<_, Value>(index)?);
        }
        out.push(values);
    }

    Ok(RowSet { columns, rows: out })
}

fn enrollee_exists(conn: &Connection, national_id: &str) -> DbResult<bool> {
    let found = conn
        .query_row(
            "SELECT 1 FROM enrollees WHERE national_id = ?1;",
            [national_id],
            |row| row.get::<_, i64>(0),
        )
        .optional()?;
    Ok(found.is_some())
}

fn parish_exists(conn: &Connection, parish_id: &Value) -> DbResult<bool> {
    let found = conn
        .query_row(
            "SELECT 1 FROM parishes WHERE parish_id = ?1;",
            [parish_id],
            |row| row.get::<_, i64>(0),
        )
        .optional()?;
    Ok(found.is_some())
}

fn check_arity(procedure: Procedure, params: &[Value]) -> DbResult<()> {
    let expected = procedure.parameter_count();
    if params.len() != expected {
        return Err(DbError::ParameterCount {
            procedure,
            expected,
            actual: params.len(),
        });
    }
    Ok(())
}

fn text_param(procedure: Procedure, params: &[Value], index: usize) -> DbResult<&str> {
    match params.get(index) {
        Some(Value::Text(text)) => Ok(text.as_str()),
        _ => Err(DbError::ParameterType { procedure, index }),
    }
}

fn not_found_message(national_id: &str) -> String {
    format!("ERROR: no enrollee found with national id {national_id}")
}

fn unknown_parish_message(parish_id: &Value) -> String {
    format!(
        "ERROR: parish {} does not exist",
        super::display_value(parish_id)
    )
}
