//! Delete wizard: list records under session-scoped identifiers, confirm,
//! remove.

use std::collections::BTreeMap;
use std::sync::Arc;

use armory_domain::{Build, BuildId};
use armory_shared::{InboundEvent, Keyboard, Reply};

use crate::errors::HandlerError;
use crate::infrastructure::ports::CatalogStore;
use crate::render::{self, BTN_CANCEL, BTN_YES};
use crate::wizards::Flow;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum DeleteStep {
    #[default]
    EnterId,
    Confirm,
}

/// The record picked at `EnterId`, remembered across the confirm step.
#[derive(Debug, Clone)]
pub struct PendingDeletion {
    pub position: u32,
    pub id: BuildId,
    pub weapon_name: String,
}

/// Delete-wizard scratch state.
///
/// Positional identifiers are scoped to this session: they are re-assigned
/// from 1 on every listing and mean nothing outside it. The stable
/// [`BuildId`] behind the chosen position is what actually gets deleted.
#[derive(Debug, Default)]
pub struct DeleteState {
    pub step: DeleteStep,
    pub id_map: BTreeMap<u32, BuildId>,
    pub pending: Option<PendingDeletion>,
}

pub struct DeleteWizard {
    catalog: Arc<dyn CatalogStore>,
}

impl DeleteWizard {
    pub fn new(catalog: Arc<dyn CatalogStore>) -> Self {
        Self { catalog }
    }

    /// Enter the wizard. The dispatcher has already checked the allow-list.
    ///
    /// Returns `None` for the state when the catalog is empty, in which case
    /// no identifier map is created.
    pub async fn start(&self) -> Result<(Option<DeleteState>, Vec<Reply>), HandlerError> {
        let builds = self.catalog.load().await?;
        if builds.is_empty() {
            return Ok((None, vec![Reply::text("No builds to delete.")]));
        }

        let mut state = DeleteState::default();
        let reply = index_and_render(&mut state, &builds);
        Ok((Some(state), vec![reply]))
    }

    pub async fn handle(
        &self,
        state: &mut DeleteState,
        event: &InboundEvent,
    ) -> Result<Flow, HandlerError> {
        let text = match event {
            InboundEvent::Text { content } => content.trim(),
            _ => {
                return Ok(Flow::Continue(vec![Reply::text(
                    "Type the build ID, or use the buttons.",
                )]))
            }
        };

        match state.step {
            DeleteStep::EnterId => self.on_enter_id(state, text).await,
            DeleteStep::Confirm => self.on_confirm(state, text).await,
        }
    }

    async fn on_enter_id(&self, state: &mut DeleteState, text: &str) -> Result<Flow, HandlerError> {
        let chosen = text
            .parse::<u32>()
            .ok()
            .and_then(|pos| state.id_map.get(&pos).map(|id| (pos, *id)));
        let Some((position, id)) = chosen else {
            return Ok(Flow::Continue(vec![Reply::text(
                "Invalid ID. Try again.",
            )]));
        };

        // The name is only for the confirmation prompt; deletion is by id.
        let weapon_name = self
            .catalog
            .load()
            .await?
            .into_iter()
            .find(|b| b.id == id)
            .map(|b| b.weapon_name)
            .unwrap_or_else(|| "(already removed)".to_string());

        state.pending = Some(PendingDeletion {
            position,
            id,
            weapon_name: weapon_name.clone(),
        });
        state.step = DeleteStep::Confirm;
        Ok(Flow::Continue(vec![Reply::text_with_keyboard(
            format!("Delete build {weapon_name} (ID: {position})?"),
            Keyboard::single_column([BTN_YES, BTN_CANCEL]),
        )]))
    }

    async fn on_confirm(&self, state: &mut DeleteState, text: &str) -> Result<Flow, HandlerError> {
        match text {
            BTN_YES => {
                let Some(pending) = state.pending.take() else {
                    state.step = DeleteStep::EnterId;
                    return self.relist(state, "Lost track of the chosen build.").await;
                };
                let removed = self.catalog.delete(pending.id).await?;
                let message = if removed {
                    tracing::info!(build_id = %pending.id, "Build deleted");
                    "Build deleted."
                } else {
                    "That build was already removed."
                };
                state.step = DeleteStep::EnterId;
                self.relist(state, message).await
            }
            BTN_CANCEL => {
                state.pending = None;
                state.step = DeleteStep::EnterId;
                self.relist(state, "Cancelled.").await
            }
            // Neither yes nor cancel: re-prompt rather than fall through.
            _ => Ok(Flow::Continue(vec![Reply::text_with_keyboard(
                "Press \"Yes\" to delete, or \"Cancel\" to go back.",
                Keyboard::single_column([BTN_YES, BTN_CANCEL]),
            )])),
        }
    }

    /// Re-render the (renumbered) listing after a deletion or cancel.
    async fn relist(&self, state: &mut DeleteState, message: &str) -> Result<Flow, HandlerError> {
        let builds = self.catalog.load().await?;
        if builds.is_empty() {
            return Ok(Flow::Done(vec![Reply::text(format!(
                "{message}\n\nNo builds left."
            ))]));
        }
        let listing = index_and_render(state, &builds);
        Ok(Flow::Continue(vec![Reply::text(message), listing]))
    }
}

/// Rebuild the session's positional identifier map and render the listing.
fn index_and_render(state: &mut DeleteState, builds: &[Build]) -> Reply {
    state.id_map.clear();
    let mut blocks = vec!["Builds available for deletion:".to_string()];
    for (idx, build) in builds.iter().enumerate() {
        let position = (idx + 1) as u32;
        state.id_map.insert(position, build.id);

        // Admin view: raw variant codes, no translation.
        let modules = build
            .modules
            .iter()
            .map(|(slot, code)| format!("  {slot}: {code}"))
            .collect::<Vec<_>>()
            .join("\n");
        blocks.push(format!(
            "{} (ID {position})\nType: {}\nModules: {}\n{modules}\nAuthor: {}",
            build.weapon_name,
            build.weapon_type,
            build.module_count(),
            build.author,
        ));
    }
    blocks.push("Enter the build ID to delete (e.g. 1)".to_string());

    Reply::text_with_keyboard(blocks.join("\n\n"), render::with_home(Keyboard::default()))
}
