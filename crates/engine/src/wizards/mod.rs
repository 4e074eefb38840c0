//! The three conversation state machines: create, browse, delete.
//!
//! Each wizard is a service holding its port dependencies; the per-user
//! state lives in the session and is threaded into `handle` by the
//! dispatcher. Handlers recover from bad input by re-prompting the same
//! step and only surface infrastructure failures as errors.

pub mod browse;
pub mod create;
pub mod delete;

use armory_shared::Reply;

/// What the dispatcher should do with the session after a wizard handled
/// an event.
#[derive(Debug)]
pub enum Flow {
    /// Stay in the wizard; the step may or may not have advanced.
    Continue(Vec<Reply>),
    /// The wizard finished or was abandoned; clear the session.
    Done(Vec<Reply>),
    /// Clear the session and return the user to the main menu.
    Home(Vec<Reply>),
}
