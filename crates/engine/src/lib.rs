//! Armory Engine library.
//!
//! This crate contains all server-side code for the Armory loadout bot.
//!
//! ## Structure
//!
//! - `infrastructure/` - External dependency implementations (ports + adapters)
//! - `session` - Per-user session state and registry
//! - `wizards/` - The create/browse/delete conversation state machines
//! - `commands` - Stateless commands (status, help, show_all, ...)
//! - `dispatch` - Event routing into wizards and commands
//! - `app` - Application composition

pub mod app;
pub mod commands;
pub mod dispatch;
pub mod errors;
pub mod infrastructure;
pub mod render;
pub mod session;
pub mod wizards;

/// End-to-end wizard flows driven through the dispatcher with fakes.
#[cfg(test)]
mod flow_tests;

pub use app::{App, AppConfig};
pub use dispatch::{DispatchOutcome, Dispatcher};
