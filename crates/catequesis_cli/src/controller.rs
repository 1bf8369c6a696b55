//! Menu loop and operation handlers.
//!
//! # Responsibility
//! - Render the operation menu and dispatch selections.
//! - Collect and validate field input before any database call.
//! - Print procedure outcomes; never let an operation failure end the loop.
//!
//! # Invariants
//! - Validation failures and blank national ids never reach the service.
//! - Update fetches first and never calls the update procedure for an
//!   enrollee that was not found.
//! - Delete calls nothing unless the operator confirms.

use crate::console::Prompter;
use catequesis_core::db::display_value;
use catequesis_core::{
    ConnectionProvider, EnrolleeDraft, EnrolleeRecord, EnrolleeService, Field, Lookup,
    ServiceError, StoredEnrollee,
};
use log::{info, warn};
use std::io;

const RULE: &str = "-------------------------------------------";

/// One entry of the numbered menu.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MenuChoice {
    Register,
    Find,
    Update,
    Delete,
    List,
    Exit,
}

impl MenuChoice {
    /// Parses a menu selection (`1`–`6`, surrounding whitespace ignored).
    pub fn parse(input: &str) -> Option<Self> {
        match input.trim() {
            "1" => Some(Self::Register),
            "2" => Some(Self::Find),
            "3" => Some(Self::Update),
            "4" => Some(Self::Delete),
            "5" => Some(Self::List),
            "6" => Some(Self::Exit),
            _ => None,
        }
    }
}

/// Drives an injected `EnrolleeService` from operator prompts.
pub struct InteractionController<'svc, P: ConnectionProvider, C> {
    service: &'svc EnrolleeService<P>,
    console: C,
}

impl<'svc, P, C> InteractionController<'svc, P, C>
where
    P: ConnectionProvider,
    C: Prompter,
{
    pub fn new(service: &'svc EnrolleeService<P>, console: C) -> Self {
        Self { service, console }
    }

    /// Runs the menu loop until `Exit` or end of input.
    ///
    /// Only console I/O errors end the loop early; operation failures are
    /// reported and the menu is shown again.
    pub fn run(&mut self) -> io::Result<()> {
        loop {
            let Some(selection) = self.show_menu()? else {
                info!("event=menu_exit module=cli reason=eof");
                return Ok(());
            };

            match MenuChoice::parse(&selection) {
                Some(MenuChoice::Register) => self.register()?,
                Some(MenuChoice::Find) => self.find()?,
                Some(MenuChoice::Update) => self.update()?,
                Some(MenuChoice::Delete) => self.delete()?,
                Some(MenuChoice::List) => self.list()?,
                Some(MenuChoice::Exit) => {
                    self.console.say("Exiting the system...")?;
                    info!("event=menu_exit module=cli reason=selected");
                    return Ok(());
                }
                None => self.console.say("Invalid option. Please try again.")?,
            }
        }
    }

    fn show_menu(&mut self) -> io::Result<Option<String>> {
        self.console.say("")?;
        self.console.say("--- Catechesis Enrollment System ---")?;
        self.console.say("1. Register new enrollee")?;
        self.console.say("2. Find enrollee by national ID")?;
        self.console.say("3. Update enrollee")?;
        self.console.say("4. Delete enrollee")?;
        self.console.say("5. List all enrollees")?;
        self.console.say("6. Exit")?;
        self.console.prompt("Select an option: ")
    }

    fn register(&mut self) -> io::Result<()> {
        self.console.say("\n--- 1. Register New Enrollee ---")?;

        let mut draft = EnrolleeDraft::default();
        for field in Field::ALL {
            let Some(value) = self.console.prompt(&format!("{}: ", field.label()))? else {
                return Ok(());
            };
            draft.set(field, value);
        }

        let Some(record) = self.checked(&draft)? else {
            return Ok(());
        };
        match self.service.create(&record) {
            Ok(receipt) => {
                self.console.say(&receipt.status_message)?;
                self.console.say(&receipt.summary)
            }
            Err(err) => self.report(&err),
        }
    }

    fn find(&mut self) -> io::Result<()> {
        self.console.say("\n--- 2. Find Enrollee ---")?;
        let Some(national_id) = self.national_id("Enter the national ID to search: ")? else {
            return Ok(());
        };

        self.lookup(&national_id).map(|_| ())
    }

    fn update(&mut self) -> io::Result<()> {
        self.console.say("\n--- 3. Update Enrollee ---")?;
        let Some(current_id) =
            self.national_id("Enter the CURRENT national ID of the enrollee to edit: ")?
        else {
            return Ok(());
        };

        let Some(stored) = self.lookup(&current_id)? else {
            return self
                .console
                .say("Cannot update an enrollee that does not exist.");
        };

        self.console
            .say("\nEnter the new values (press Enter to keep the current value):")?;
        // Stored values are offered as-is; the edited draft is validated below.
        let mut draft = stored.fields.clone();
        for field in Field::ALL {
            let current = draft.get(field).to_string();
            let Some(value) = self.console.prompt_with_default(field.label(), &current)? else {
                return Ok(());
            };
            draft.set(field, value);
        }

        let Some(record) = self.checked(&draft)? else {
            return Ok(());
        };
        match self.service.update(&current_id, &record) {
            Ok(receipt) => {
                self.console.say(&receipt.status_message)?;
                self.console.say(&receipt.summary)
            }
            Err(err) => self.report(&err),
        }
    }

    fn delete(&mut self) -> io::Result<()> {
        self.console.say("\n--- 4. Delete Enrollee ---")?;
        let Some(national_id) = self.national_id("Enter the national ID to delete: ")? else {
            return Ok(());
        };

        let question = format!(
            "Are you sure you want to delete the enrollee with national ID {national_id}?"
        );
        if !self.console.confirm(&question)? {
            return self.console.say("Operation cancelled.");
        }

        match self.service.delete(&national_id) {
            Ok(receipt) => {
                self.console.say(&receipt.status_message)?;
                self.console.say(&receipt.summary)
            }
            Err(err) => self.report(&err),
        }
    }

    fn list(&mut self) -> io::Result<()> {
        self.console.say("\n--- 5. Enrollee List ---")?;
        let rows = match self.service.list() {
            Ok(rows) => rows,
            Err(err) => return self.report(&err),
        };

        self.console.say("\n---------- ENROLLEE LIST ----------")?;
        if rows.is_empty() {
            return self.console.say("No enrollees registered.");
        }
        for row in &rows.rows {
            for (column, value) in rows.named(row) {
                self.console
                    .say(&format!("{column}: {}", display_value(value)))?;
            }
            self.console.say(RULE)?;
        }
        Ok(())
    }

    /// Runs a lookup and prints its outcome. `None` when nothing was found or
    /// the lookup failed.
    fn lookup(&mut self, national_id: &str) -> io::Result<Option<StoredEnrollee>> {
        match self.service.find_by_national_id(national_id) {
            Ok(Lookup::Found(stored)) => {
                self.print_enrollee(&stored)?;
                Ok(Some(stored))
            }
            Ok(Lookup::NotFound(message)) => {
                self.console.say(&message)?;
                Ok(None)
            }
            Err(err) => {
                self.report(&err)?;
                Ok(None)
            }
        }
    }

    fn print_enrollee(&mut self, stored: &StoredEnrollee) -> io::Result<()> {
        self.console.say("\n---------- ENROLLEE FOUND ----------")?;
        for (column, value) in &stored.row {
            self.console
                .say(&format!("{column}: {}", display_value(value)))?;
        }
        self.console.say(RULE)
    }

    /// Reads a national id; a blank answer is reported and yields `None`.
    fn national_id(&mut self, label: &str) -> io::Result<Option<String>> {
        let Some(value) = self.console.prompt(label)? else {
            return Ok(None);
        };
        let value = value.trim();
        if value.is_empty() {
            self.console.say("[ERROR] The national ID cannot be empty.")?;
            return Ok(None);
        }
        Ok(Some(value.to_string()))
    }

    /// Validates `draft`, printing the failure. `None` aborts the operation.
    fn checked(&mut self, draft: &EnrolleeDraft) -> io::Result<Option<EnrolleeRecord>> {
        match draft.validate() {
            Ok(record) => Ok(Some(record)),
            Err(err) => {
                warn!("event=input_rejected module=cli reason={}", err);
                self.console.say(&format!("[ERROR] {err}"))?;
                Ok(None)
            }
        }
    }

    fn report(&mut self, err: &ServiceError) -> io::Result<()> {
        let text = match err {
            ServiceError::Connection(cause) => {
                format!("Error connecting to the database: {cause}")
            }
            ServiceError::Procedure(message) => message.clone(),
            ServiceError::MissingResult => "No result message was received.".to_string(),
            ServiceError::Db(cause) => format!("Error while running the operation: {cause}"),
            ServiceError::InvalidData(_) => format!("[ERROR] {err}"),
        };
        self.console.say(&text)
    }
}
