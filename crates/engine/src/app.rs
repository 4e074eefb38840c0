//! Application state and composition.

use std::path::PathBuf;
use std::sync::Arc;

use armory_domain::UserId;

use crate::infrastructure::ports::{AssetStore, CatalogStore, ChatPort, ReferenceCatalog};
use crate::infrastructure::restart_marker::RestartMarker;
use crate::session::SessionRegistry;
use crate::wizards::browse::BrowseWizard;
use crate::wizards::create::CreateWizard;
use crate::wizards::delete::DeleteWizard;

/// Runtime configuration, collected from the environment in `main`.
#[derive(Debug, Clone, Default)]
pub struct AppConfig {
    /// Static allow-list for privileged commands.
    pub allowed_users: Vec<UserId>,
    /// Log file backing the `log` command, if any.
    pub log_file: Option<PathBuf>,
    /// Deployment-refresh command run by `update`, if any.
    pub update_cmd: Option<String>,
}

impl AppConfig {
    pub fn new(allowed_users: Vec<UserId>) -> Self {
        Self {
            allowed_users,
            ..Default::default()
        }
    }

    pub fn with_log_file(mut self, log_file: Option<PathBuf>) -> Self {
        self.log_file = log_file;
        self
    }

    pub fn with_update_cmd(mut self, update_cmd: Option<String>) -> Self {
        self.update_cmd = update_cmd;
        self
    }

    pub fn is_allowed(&self, user: UserId) -> bool {
        self.allowed_users.contains(&user)
    }
}

/// Main application state.
///
/// Holds the ports, the session registry and the three wizards.
/// Owned by the dispatcher for the lifetime of the process.
pub struct App {
    pub config: AppConfig,
    pub catalog: Arc<dyn CatalogStore>,
    pub reference: Arc<dyn ReferenceCatalog>,
    pub assets: Arc<dyn AssetStore>,
    pub chat: Arc<dyn ChatPort>,
    pub restart_marker: RestartMarker,
    pub sessions: SessionRegistry,
    pub create: CreateWizard,
    pub browse: BrowseWizard,
    pub delete: DeleteWizard,
}

impl App {
    /// Create a new App with all dependencies wired up.
    pub fn new(
        config: AppConfig,
        catalog: Arc<dyn CatalogStore>,
        reference: Arc<dyn ReferenceCatalog>,
        assets: Arc<dyn AssetStore>,
        chat: Arc<dyn ChatPort>,
        restart_marker: RestartMarker,
    ) -> Self {
        let create = CreateWizard::new(
            catalog.clone(),
            reference.clone(),
            assets.clone(),
            chat.clone(),
        );
        let browse = BrowseWizard::new(catalog.clone(), reference.clone(), assets.clone());
        let delete = DeleteWizard::new(catalog.clone());

        Self {
            config,
            catalog,
            reference,
            assets,
            chat,
            restart_marker,
            sessions: SessionRegistry::new(),
            create,
            browse,
            delete,
        }
    }
}
