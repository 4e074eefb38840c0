//! Error types for port operations.

/// Catalog store failures.
#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    /// Backing file exists but is not a well-formed array of build records.
    #[error("Catalog store corrupt: {0}")]
    Corrupt(String),

    /// Filesystem operation failed - includes operation name for tracing.
    #[error("Store I/O error in {operation}: {message}")]
    Io {
        operation: &'static str,
        message: String,
    },
}

impl StoreError {
    pub fn corrupt(message: impl ToString) -> Self {
        Self::Corrupt(message.to_string())
    }

    pub fn io(operation: &'static str, message: impl ToString) -> Self {
        Self::Io {
            operation,
            message: message.to_string(),
        }
    }
}

/// Reference catalog failures.
#[derive(Debug, thiserror::Error)]
pub enum ReferenceError {
    /// No module data file exists for this weapon-type key.
    #[error("Unknown weapon type: {0}")]
    UnknownType(String),

    #[error("Reference data unreadable: {0}")]
    Unreadable(String),

    #[error("Reference data malformed: {0}")]
    Malformed(String),
}

/// Image asset store failures.
#[derive(Debug, thiserror::Error)]
pub enum AssetError {
    #[error("Asset not found: {0}")]
    Missing(String),

    #[error("Asset I/O error: {0}")]
    Io(String),
}

/// Chat transport failures. Logged and dropped, never surfaced to users.
#[derive(Debug, thiserror::Error)]
pub enum ChatError {
    #[error("Chat request failed: {0}")]
    RequestFailed(String),

    #[error("Invalid chat API response: {0}")]
    InvalidResponse(String),
}
