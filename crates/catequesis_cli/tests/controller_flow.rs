use catequesis_cli::{Console, InteractionController};
use catequesis_core::db::{DbResult, STATUS_COLUMN};
use catequesis_core::{
    ConnectionProvider, DbError, EnrolleeService, Field, Procedure, ProcedureSession, RowSet,
};
use rusqlite::types::Value;
use std::cell::RefCell;
use std::collections::VecDeque;
use std::rc::Rc;

enum Reply {
    Status(Option<String>),
    Rows(RowSet),
}

#[derive(Default)]
struct Journal {
    connects: usize,
    calls: Vec<(Procedure, Vec<Value>)>,
    commits: usize,
    rollbacks: usize,
}

#[derive(Default)]
struct ScriptedProvider {
    journal: Rc<RefCell<Journal>>,
    replies: Rc<RefCell<VecDeque<Reply>>>,
    refuse_connect: bool,
}

impl ScriptedProvider {
    fn with_replies(replies: Vec<Reply>) -> Self {
        Self {
            replies: Rc::new(RefCell::new(replies.into())),
            ..Self::default()
        }
    }
}

struct ScriptedSession {
    journal: Rc<RefCell<Journal>>,
    replies: Rc<RefCell<VecDeque<Reply>>>,
}

impl ConnectionProvider for ScriptedProvider {
    type Session = ScriptedSession;

    fn connect(&self) -> DbResult<ScriptedSession> {
        self.journal.borrow_mut().connects += 1;
        if self.refuse_connect {
            return Err(DbError::Sqlite(rusqlite::Error::InvalidQuery));
        }
        Ok(ScriptedSession {
            journal: Rc::clone(&self.journal),
            replies: Rc::clone(&self.replies),
        })
    }
}

impl ProcedureSession for ScriptedSession {
    fn call_for_status(
        &mut self,
        procedure: Procedure,
        params: &[Value],
    ) -> DbResult<Option<String>> {
        self.journal
            .borrow_mut()
            .calls
            .push((procedure, params.to_vec()));
        match self.replies.borrow_mut().pop_front() {
            Some(Reply::Status(message)) => Ok(message),
            _ => Err(DbError::ProcedureShape { procedure }),
        }
    }

    fn call_for_rows(&mut self, procedure: Procedure, params: &[Value]) -> DbResult<RowSet> {
        self.journal
            .borrow_mut()
            .calls
            .push((procedure, params.to_vec()));
        match self.replies.borrow_mut().pop_front() {
            Some(Reply::Rows(rows)) => Ok(rows),
            _ => Err(DbError::ProcedureShape { procedure }),
        }
    }

    fn commit(&mut self) -> DbResult<()> {
        self.journal.borrow_mut().commits += 1;
        Ok(())
    }

    fn rollback(&mut self) -> DbResult<()> {
        self.journal.borrow_mut().rollbacks += 1;
        Ok(())
    }
}

/// Runs one controller session over `script` and returns the console output.
fn run(service: &EnrolleeService<ScriptedProvider>, script: &str) -> String {
    let mut output = Vec::new();
    InteractionController::new(service, Console::new(script.as_bytes(), &mut output))
        .run()
        .unwrap();
    String::from_utf8(output).unwrap()
}

fn register_script(birth: &str, baptism: &str) -> String {
    [
        "1",
        "3",
        "Ana",
        "Vera",
        "0102030405",
        birth,
        "Av. Loja 12-34",
        "Rosa Mora",
        "0991234567",
        "rosa@example.com",
        baptism,
        "San Sebastián",
        "6",
    ]
    .join("\n")
        + "\n"
}

fn found_row(national_id: &str) -> RowSet {
    let values = [
        (Field::ParishId, Value::Integer(3)),
        (Field::FirstNames, Value::Text("Ana".into())),
        (Field::LastNames, Value::Text("Vera".into())),
        (Field::NationalId, Value::Text(national_id.into())),
        (Field::BirthDate, Value::Text("2010-05-01".into())),
        (Field::HomeAddress, Value::Text("Av. Loja 12-34".into())),
        (Field::GuardianName, Value::Text("Rosa Mora".into())),
        (Field::GuardianPhone, Value::Text("0991234567".into())),
        (Field::GuardianEmail, Value::Text("rosa@example.com".into())),
        (Field::BaptismDate, Value::Text("2010-06-01".into())),
        (Field::BaptismParish, Value::Text("San Sebastián".into())),
    ];
    let mut columns = vec!["enrollee_id".to_string()];
    let mut row = vec![Value::Integer(8)];
    for (field, value) in values {
        columns.push(field.column().to_string());
        row.push(value);
    }
    RowSet {
        columns,
        rows: vec![row],
    }
}

fn not_found(message: &str) -> Reply {
    Reply::Rows(RowSet {
        columns: vec![STATUS_COLUMN.to_string()],
        rows: vec![vec![Value::Text(message.to_string())]],
    })
}

#[test]
fn baptism_before_birth_is_rejected_before_any_database_call() {
    let service = EnrolleeService::new(ScriptedProvider::default());

    let output = run(&service, &register_script("2010-05-01", "2010-04-01"));

    assert!(output.contains("[ERROR] baptism date"));
    assert_eq!(service.provider().journal.borrow().connects, 0);
}

#[test]
fn valid_registration_issues_one_register_call_and_commits() {
    let service = EnrolleeService::new(ScriptedProvider::with_replies(vec![Reply::Status(
        Some("OK: inserted".to_string()),
    )]));

    let output = run(&service, &register_script("2010-05-01", "2010-06-01"));

    assert!(output.contains("OK: inserted"));
    assert!(output.contains("ENROLLEE Ana Vera REGISTERED SUCCESSFULLY."));
    let journal = service.provider().journal.borrow();
    assert_eq!(journal.calls.len(), 1);
    assert_eq!(journal.calls[0].0, Procedure::RegisterEnrollee);
    assert_eq!(journal.calls[0].1.len(), 11);
    assert_eq!(journal.calls[0].1[0], Value::Integer(3));
    assert_eq!(journal.calls[0].1[3], Value::Text("0102030405".to_string()));
    assert_eq!((journal.commits, journal.rollbacks), (1, 0));
}

#[test]
fn rejected_registration_prints_the_exact_message_and_rolls_back() {
    let service = EnrolleeService::new(ScriptedProvider::with_replies(vec![Reply::Status(
        Some("ERROR: duplicate national id".to_string()),
    )]));

    let output = run(&service, &register_script("2010-05-01", "2010-06-01"));

    assert!(output.contains("Baptism parish: ERROR: duplicate national id\n"));
    assert!(!output.contains("SUCCESSFULLY"));
    let journal = service.provider().journal.borrow();
    assert_eq!((journal.commits, journal.rollbacks), (0, 1));
}

#[test]
fn blank_field_names_the_field_and_skips_the_database() {
    let service = EnrolleeService::new(ScriptedProvider::default());
    let script = register_script("2010-05-01", "2010-06-01").replacen("Rosa Mora", "  ", 1);

    let output = run(&service, &script);

    assert!(output.contains("[ERROR] field `guardian_name` cannot be empty"));
    assert_eq!(service.provider().journal.borrow().connects, 0);
}

#[test]
fn declined_delete_issues_no_procedure_call() {
    let service = EnrolleeService::new(ScriptedProvider::default());

    let output = run(&service, "4\n0102030405\nn\n6\n");

    assert!(output.contains("Operation cancelled."));
    let journal = service.provider().journal.borrow();
    assert_eq!(journal.connects, 0);
    assert!(journal.calls.is_empty());
}

#[test]
fn confirmed_delete_calls_the_delete_procedure() {
    let service = EnrolleeService::new(ScriptedProvider::with_replies(vec![Reply::Status(
        Some("OK: deleted".to_string()),
    )]));

    let output = run(&service, "4\n0102030405\ny\n6\n");

    assert!(output.contains("ENROLLEE WITH NATIONAL ID 0102030405 DELETED SUCCESSFULLY."));
    let journal = service.provider().journal.borrow();
    assert_eq!(
        journal.calls,
        vec![(
            Procedure::DeleteEnrolleeByNationalId,
            vec![Value::Text("0102030405".to_string())]
        )]
    );
    assert_eq!(journal.commits, 1);
}

#[test]
fn update_of_unknown_enrollee_never_calls_update() {
    let service = EnrolleeService::new(ScriptedProvider::with_replies(vec![not_found(
        "ERROR: no enrollee found with national id 0999",
    )]));

    let output = run(&service, "3\n0999\n6\n");

    assert!(output.contains("ERROR: no enrollee found with national id 0999"));
    assert!(output.contains("Cannot update an enrollee that does not exist."));
    let journal = service.provider().journal.borrow();
    assert_eq!(journal.calls.len(), 1);
    assert_eq!(journal.calls[0].0, Procedure::FindEnrolleeByNationalId);
}

#[test]
fn update_defaults_come_from_the_matching_fields() {
    let service = EnrolleeService::new(ScriptedProvider::with_replies(vec![
        Reply::Rows(found_row("0102030405")),
        Reply::Status(Some("OK: updated".to_string())),
    ]));

    // Keep every field except guardian phone.
    let mut script = String::from("3\n0102030405\n");
    for field in Field::ALL {
        if field == Field::GuardianPhone {
            script.push_str("0987654321\n");
        } else {
            script.push('\n');
        }
    }
    script.push_str("6\n");

    let output = run(&service, &script);

    assert!(output.contains("Parish ID [3]: "));
    assert!(output.contains("First names [Ana]: "));
    assert!(output.contains("Birth date (YYYY-MM-DD) [2010-05-01]: "));
    assert!(output.contains("ENROLLEE Ana Vera UPDATED SUCCESSFULLY."));

    let journal = service.provider().journal.borrow();
    let (procedure, params) = &journal.calls[1];
    assert_eq!(*procedure, Procedure::UpdateEnrollee);
    assert_eq!(params.len(), 12);
    assert_eq!(params[0], Value::Text("0102030405".to_string()));
    assert_eq!(params[1], Value::Integer(3));
    assert_eq!(params[2], Value::Text("Ana".to_string()));
    assert_eq!(params[8], Value::Text("0987654321".to_string()));
    assert_eq!(journal.commits, 1);
}

#[test]
fn blank_national_id_is_rejected_for_find() {
    let service = EnrolleeService::new(ScriptedProvider::default());

    let output = run(&service, "2\n   \n6\n");

    assert!(output.contains("[ERROR] The national ID cannot be empty."));
    assert_eq!(service.provider().journal.borrow().connects, 0);
}

#[test]
fn connection_failure_is_reported_and_loop_continues() {
    let service = EnrolleeService::new(ScriptedProvider {
        refuse_connect: true,
        ..ScriptedProvider::default()
    });

    let output = run(&service, "5\n6\n");

    assert!(output.contains("Error connecting to the database:"));
    assert!(output.contains("Exiting the system..."));
}

#[test]
fn invalid_option_redisplays_menu_and_eof_exits() {
    let service = EnrolleeService::new(ScriptedProvider::default());

    let output = run(&service, "9\n");

    assert!(output.contains("Invalid option. Please try again."));
    assert_eq!(output.matches("Select an option: ").count(), 2);
}

#[test]
fn list_prints_each_column_with_its_name() {
    let service = EnrolleeService::new(ScriptedProvider::with_replies(vec![Reply::Rows(
        found_row("0102030405"),
    )]));

    let output = run(&service, "5\n6\n");

    assert!(output.contains("enrollee_id: 8\n"));
    assert!(output.contains("national_id: 0102030405\n"));
    assert!(output.contains("baptism_parish: San Sebastián\n"));
}

#[test]
fn non_utf8_selection_is_an_invalid_option() {
    let service = EnrolleeService::new(ScriptedProvider::default());
    let mut output = Vec::new();

    InteractionController::new(&service, Console::new(&b"\xff\n6\n"[..], &mut output))
        .run()
        .unwrap();

    let output = String::from_utf8(output).unwrap();
    assert!(output.contains("Invalid option. Please try again."));
    assert!(output.contains("Exiting the system..."));
}

#[test]
fn find_prints_every_returned_column_in_order() {
    let mut rows = found_row("0102030405");
    rows.columns.insert(2, "parish_name".to_string());
    rows.rows[0].insert(2, Value::Text("La Merced".to_string()));
    let service = EnrolleeService::new(ScriptedProvider::with_replies(vec![Reply::Rows(rows)]));

    let output = run(&service, "2\n0102030405\n6\n");

    let id = output.find("enrollee_id: 8\n").unwrap();
    let parish = output.find("parish_id: 3\n").unwrap();
    let parish_name = output.find("parish_name: La Merced\n").unwrap();
    let first_names = output.find("first_names: Ana\n").unwrap();
    assert!(id < parish && parish < parish_name && parish_name < first_names);
}

#[test]
fn stored_row_with_bad_dates_can_be_found_and_corrected() {
    let mut rows = found_row("0102030405");
    let baptism = rows.column_index(Field::BaptismDate.column()).unwrap();
    rows.rows[0][baptism] = Value::Text("2010-04-01".to_string());
    let service = EnrolleeService::new(ScriptedProvider::with_replies(vec![
        Reply::Rows(rows),
        Reply::Status(Some("OK: updated".to_string())),
    ]));

    // Keep every field except the baptism date.
    let mut script = String::from("3\n0102030405\n");
    for field in Field::ALL {
        if field == Field::BaptismDate {
            script.push_str("2010-06-01\n");
        } else {
            script.push('\n');
        }
    }
    script.push_str("6\n");

    let output = run(&service, &script);

    assert!(output.contains("baptism_date: 2010-04-01\n"));
    assert!(output.contains("Baptism date (YYYY-MM-DD) [2010-04-01]: "));
    assert!(!output.contains("Cannot update an enrollee that does not exist."));
    let journal = service.provider().journal.borrow();
    assert_eq!(journal.calls.len(), 2);
    assert_eq!(journal.calls[1].0, Procedure::UpdateEnrollee);
    assert_eq!(journal.calls[1].1[10], Value::Text("2010-06-01".to_string()));
    assert_eq!(journal.commits, 1);
}
