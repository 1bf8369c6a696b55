//! Domain model for catechism enrollees.
//!
//! # Responsibility
//! - Define the enrollee record and its client-side validation rules.
//! - Define the status-message protocol spoken by the stored procedures.
//!
//! # Invariants
//! - A record only exists for the duration of one operation; the store is the
//!   source of truth.

pub mod enrollee;
pub mod status;
