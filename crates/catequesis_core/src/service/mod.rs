//! Core use-case services.
//!
//! # Responsibility
//! - Orchestrate procedure sessions into enrollee use-case APIs.
//! - Keep the console layer decoupled from storage details.

pub mod enrollee_service;
