//! One-shot restart marker file.
//!
//! Written just before an operator-issued restart terminates the process,
//! and consumed exactly once at the next startup to tell that user the
//! service is back. Strictly a delivery-confirmation side channel; no
//! session state survives a restart.

use std::path::PathBuf;

use armory_domain::UserId;

pub struct RestartMarker {
    path: PathBuf,
}

impl RestartMarker {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    /// Record the user to notify after the next startup.
    pub async fn write(&self, user: UserId) -> std::io::Result<()> {
        tokio::fs::write(&self.path, user.to_string()).await
    }

    /// Read and delete the marker, if present. Unreadable content is
    /// discarded with a warning rather than blocking startup.
    pub async fn consume(&self) -> Option<UserId> {
        let content = tokio::fs::read_to_string(&self.path).await.ok()?;
        if let Err(e) = tokio::fs::remove_file(&self.path).await {
            tracing::warn!("Failed to remove restart marker: {e}");
        }
        match content.trim().parse::<i64>() {
            Ok(raw) => Some(UserId::new(raw)),
            Err(e) => {
                tracing::warn!("Discarding unreadable restart marker: {e}");
                None
            }
        }
    }
}
