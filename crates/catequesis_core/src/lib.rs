//! Core of the catechesis enrollee registry.
//! This crate is the single source of truth for enrollee invariants and for
//! the status-message protocol of the enrollee procedures.

pub mod config;
pub mod db;
pub mod logging;
pub mod model;
pub mod service;

pub use config::{config_path, load_config, AppConfig, ConfigError, ConnectionSettings};
pub use db::{
    ConnectionProvider, DbError, Procedure, ProcedureSession, RowSet, SqliteConnectionProvider,
};
pub use logging::{default_log_level, init_logging, logging_status, resolve_logging};
pub use model::enrollee::{EnrolleeDraft, EnrolleeRecord, Field, ValidationError};
pub use model::status::ProcedureStatus;
pub use service::enrollee_service::{
    EnrolleeService, Lookup, MutationReceipt, ServiceError, ServiceResult, StoredEnrollee,
};

/// Returns the core crate version.
pub fn core_version() -> &'static str {
    env!("CARGO_PKG_VERSION")
}
