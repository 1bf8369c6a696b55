//! Console front end for the catechesis enrollee registry.
//!
//! # Responsibility
//! - Operator prompts: `inquire` on a terminal, plain lines otherwise.
//! - The menu loop that drives `EnrolleeService`.

pub mod console;
pub mod controller;

pub use console::{Console, Prompter, TerminalConsole};
pub use controller::{InteractionController, MenuChoice};
