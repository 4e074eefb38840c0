//! Engine-level error type for wizard and command handlers.

use thiserror::Error;

use crate::infrastructure::ports::{AssetError, ChatError, ReferenceError, StoreError};
use armory_domain::DomainError;

/// Errors a wizard or command handler can surface to the dispatcher.
///
/// User-input problems never appear here: wizards recover from those locally
/// by re-prompting the same step. What remains are infrastructure failures,
/// which the dispatcher converts into a user-visible "feature unavailable"
/// message plus a log entry, leaving the session in its pre-error step.
#[derive(Debug, Error)]
pub enum HandlerError {
    #[error(transparent)]
    Store(#[from] StoreError),

    #[error(transparent)]
    Reference(#[from] ReferenceError),

    #[error(transparent)]
    Asset(#[from] AssetError),

    #[error(transparent)]
    Chat(#[from] ChatError),

    #[error(transparent)]
    Domain(#[from] DomainError),
}

impl HandlerError {
    /// The message shown to the user when this error reaches the dispatch
    /// boundary.
    pub fn user_message(&self) -> &'static str {
        match self {
            HandlerError::Store(_) => "The build catalog is unavailable right now. Try again later.",
            HandlerError::Reference(_) => {
                "Module data for this weapon type is not configured yet."
            }
            HandlerError::Asset(_) => "Could not store the image. Try again later.",
            HandlerError::Chat(_) => "Could not reach the chat service. Try again later.",
            HandlerError::Domain(_) => "That build is not valid. Start over with /add.",
        }
    }
}
