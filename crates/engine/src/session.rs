//! Per-user session state and the registry that owns it.

use std::sync::Arc;

use dashmap::DashMap;
use tokio::sync::Mutex;

use armory_domain::UserId;

use crate::wizards::browse::BrowseState;
use crate::wizards::create::CreateState;
use crate::wizards::delete::DeleteState;

/// The active wizard, one variant per workflow.
///
/// Each wizard carries its own strongly-typed field struct, so a step can
/// only ever see the fields its workflow accumulates. There is no shared
/// string-keyed scratch bag.
#[derive(Debug, Default)]
pub enum WizardState {
    #[default]
    Idle,
    Create(CreateState),
    Browse(BrowseState),
    Delete(DeleteState),
}

/// Ephemeral per-user conversation state.
///
/// Created on demand, cleared on wizard completion, cancellation, or home
/// navigation. Never persisted: an in-flight wizard does not survive a
/// process restart.
#[derive(Debug, Default)]
pub struct Session {
    pub wizard: WizardState,
}

impl Session {
    /// Clear all wizard state.
    pub fn reset(&mut self) {
        self.wizard = WizardState::Idle;
    }

    pub fn is_idle(&self) -> bool {
        matches!(self.wizard, WizardState::Idle)
    }
}

/// Owner of all sessions, keyed by user id.
///
/// Each session sits behind its own async mutex: events for one user are
/// handled strictly in arrival order, while different users' wizards
/// interleave freely.
#[derive(Default)]
pub struct SessionRegistry {
    inner: DashMap<UserId, Arc<Mutex<Session>>>,
}

impl SessionRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Fetch (or lazily create) the session handle for a user.
    pub fn session(&self, user: UserId) -> Arc<Mutex<Session>> {
        self.inner
            .entry(user)
            .or_insert_with(|| Arc::new(Mutex::new(Session::default())))
            .clone()
    }

    #[cfg(test)]
    pub fn active_count(&self) -> usize {
        self.inner.len()
    }
}

impl From<CreateState> for WizardState {
    fn from(state: CreateState) -> Self {
        WizardState::Create(state)
    }
}

impl From<BrowseState> for WizardState {
    fn from(state: BrowseState) -> Self {
        WizardState::Browse(state)
    }
}

impl From<DeleteState> for WizardState {
    fn from(state: DeleteState) -> Self {
        WizardState::Delete(state)
    }
}
