//! Creation wizard: collects a full build record step by step.

use std::collections::{BTreeMap, HashMap};
use std::sync::Arc;

use armory_domain::{Build, BuildId, Category, DomainError, Mode};
use armory_shared::{ChoiceOption, InboundEvent, Keyboard, Reply};

use crate::errors::HandlerError;
use crate::infrastructure::ports::{AssetStore, CatalogStore, ChatPort, ReferenceCatalog, Variant};
use crate::render::{BTN_ADD_ANOTHER, BTN_CANCEL, BTN_CONFIRM, BTN_HOME};
use crate::wizards::Flow;

/// Steps of the creation wizard, in order.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CreateStep {
    WeaponName,
    Role,
    CategorySelect,
    ModeSelect,
    TypeChoice,
    ModuleCount,
    ModuleSelect,
    ImageUpload,
    Confirmation,
    PostConfirm,
}

/// Accumulated creation state. Only ever touched by this wizard.
#[derive(Debug)]
pub struct CreateState {
    pub step: CreateStep,
    /// Record id minted up front so the image asset can be named after it.
    pub draft_id: BuildId,
    pub weapon_name: String,
    pub role: String,
    pub category: Option<Category>,
    pub mode: Option<Mode>,
    pub type_key: Option<String>,
    pub type_label: String,
    /// Slot names for the chosen type, in reference-catalog order.
    pub slots: Vec<String>,
    /// Slot name -> allowed variants, from the reference catalog.
    pub variants: HashMap<String, Vec<Variant>>,
    /// Slot count the finished build must have (5 or 8).
    pub target_count: usize,
    /// Slot name -> chosen variant code.
    pub selected: BTreeMap<String, String>,
    /// Slot whose variant choice surface is currently open.
    pub current_slot: Option<String>,
    /// Stored asset path once the image arrived.
    pub image: Option<String>,
}

impl Default for CreateState {
    fn default() -> Self {
        Self {
            step: CreateStep::WeaponName,
            draft_id: BuildId::new(),
            weapon_name: String::new(),
            role: String::new(),
            category: None,
            mode: None,
            type_key: None,
            type_label: String::new(),
            slots: Vec::new(),
            variants: HashMap::new(),
            target_count: 0,
            selected: BTreeMap::new(),
            current_slot: None,
            image: None,
        }
    }
}

impl CreateState {
    fn remaining_slots(&self) -> Vec<String> {
        self.slots
            .iter()
            .filter(|s| !self.selected.contains_key(*s))
            .cloned()
            .collect()
    }
}

pub struct CreateWizard {
    catalog: Arc<dyn CatalogStore>,
    reference: Arc<dyn ReferenceCatalog>,
    assets: Arc<dyn AssetStore>,
    chat: Arc<dyn ChatPort>,
}

impl CreateWizard {
    pub fn new(
        catalog: Arc<dyn CatalogStore>,
        reference: Arc<dyn ReferenceCatalog>,
        assets: Arc<dyn AssetStore>,
        chat: Arc<dyn ChatPort>,
    ) -> Self {
        Self {
            catalog,
            reference,
            assets,
            chat,
        }
    }

    /// Enter the wizard. The dispatcher has already checked the allow-list.
    pub fn start(&self) -> (CreateState, Vec<Reply>) {
        (
            CreateState::default(),
            vec![Reply::text("Enter the weapon name:")],
        )
    }

    pub async fn handle(
        &self,
        state: &mut CreateState,
        author: &str,
        event: &InboundEvent,
    ) -> Result<Flow, HandlerError> {
        match state.step {
            CreateStep::WeaponName => Ok(self.on_weapon_name(state, event)),
            CreateStep::Role => Ok(self.on_role(state, event)),
            CreateStep::CategorySelect => Ok(self.on_category(state, event)),
            CreateStep::ModeSelect => self.on_mode(state, event).await,
            CreateStep::TypeChoice => self.on_type(state, event).await,
            CreateStep::ModuleCount => Ok(self.on_module_count(state, event)),
            CreateStep::ModuleSelect => Ok(self.on_module_select(state, event)),
            CreateStep::ImageUpload => self.on_image(state, event).await,
            CreateStep::Confirmation => self.on_confirmation(state, author, event).await,
            CreateStep::PostConfirm => Ok(self.on_post_confirm(state, event)),
        }
    }

    fn on_weapon_name(&self, state: &mut CreateState, event: &InboundEvent) -> Flow {
        match event {
            InboundEvent::Text { content } if !content.trim().is_empty() => {
                state.weapon_name = content.trim().to_string();
                state.step = CreateStep::Role;
                continue_with(Reply::text("Now enter the weapon's range:"))
            }
            _ => continue_with(Reply::text("Enter the weapon name:")),
        }
    }

    fn on_role(&self, state: &mut CreateState, event: &InboundEvent) -> Flow {
        match event {
            InboundEvent::Text { content } => {
                state.role = content.trim().to_string();
                state.step = CreateStep::CategorySelect;
                continue_with(Reply::text_with_keyboard(
                    "Choose a build category:",
                    category_keyboard(),
                ))
            }
            _ => continue_with(Reply::text("Now enter the weapon's range:")),
        }
    }

    fn on_category(&self, state: &mut CreateState, event: &InboundEvent) -> Flow {
        let chosen = match event {
            InboundEvent::Text { content } => Category::from_label(content.trim()),
            _ => None,
        };
        match chosen {
            Some(category) => {
                state.category = Some(category);
                state.step = CreateStep::ModeSelect;
                continue_with(Reply::text_with_keyboard(
                    "Choose a mode:",
                    mode_keyboard(),
                ))
            }
            None => continue_with(Reply::text_with_keyboard(
                "Please choose one of the listed categories.",
                category_keyboard(),
            )),
        }
    }

    async fn on_mode(
        &self,
        state: &mut CreateState,
        event: &InboundEvent,
    ) -> Result<Flow, HandlerError> {
        let chosen = match event {
            InboundEvent::Text { content } => Mode::from_label(content.trim()),
            _ => None,
        };
        let Some(mode) = chosen else {
            return Ok(continue_with(Reply::text_with_keyboard(
                "Please choose a mode from the keyboard.",
                mode_keyboard(),
            )));
        };

        let types = self.reference.weapon_types().await?;
        state.mode = Some(mode);
        state.step = CreateStep::TypeChoice;
        Ok(continue_with(Reply::text_with_keyboard(
            "Choose a weapon type:",
            Keyboard::paired(types.into_iter().map(|t| t.label)),
        )))
    }

    async fn on_type(
        &self,
        state: &mut CreateState,
        event: &InboundEvent,
    ) -> Result<Flow, HandlerError> {
        let types = self.reference.weapon_types().await?;
        let chosen = match event {
            InboundEvent::Text { content } => {
                types.into_iter().find(|t| t.label == content.trim())
            }
            _ => None,
        };
        let Some(weapon_type) = chosen else {
            let types = self.reference.weapon_types().await?;
            return Ok(continue_with(Reply::text_with_keyboard(
                "Please choose a weapon type from the keyboard.",
                Keyboard::paired(types.into_iter().map(|t| t.label)),
            )));
        };

        // A type without module data aborts the step, not the wizard.
        let slots = self.reference.modules_for(&weapon_type.key).await?;

        state.slots = slots.iter().map(|(name, _)| name.clone()).collect();
        state.variants = slots.into_iter().collect();
        state.type_key = Some(weapon_type.key);
        state.type_label = weapon_type.label;
        state.step = CreateStep::ModuleCount;
        Ok(continue_with(Reply::text_with_keyboard(
            "How many modules?",
            Keyboard::single_column(["5", "8"]),
        )))
    }

    fn on_module_count(&self, state: &mut CreateState, event: &InboundEvent) -> Flow {
        let count = match event {
            InboundEvent::Text { content } => content.trim().parse::<usize>().ok(),
            _ => None,
        };
        match count {
            Some(count) if count == 5 || count == 8 => {
                state.target_count = count;
                state.selected.clear();
                state.current_slot = None;
                state.step = CreateStep::ModuleSelect;
                continue_with(Reply::text_with_keyboard(
                    "Choose a module:",
                    Keyboard::paired(state.remaining_slots()),
                ))
            }
            _ => continue_with(Reply::text_with_keyboard(
                "Choose 5 or 8 modules.",
                Keyboard::single_column(["5", "8"]),
            )),
        }
    }

    fn on_module_select(&self, state: &mut CreateState, event: &InboundEvent) -> Flow {
        match event {
            InboundEvent::Text { content } => {
                // A slot request after the target is met routes straight to
                // the image upload instead of offering more slots.
                if state.selected.len() >= state.target_count {
                    state.current_slot = None;
                    state.step = CreateStep::ImageUpload;
                    return continue_with(Reply::text(
                        "All modules selected. Now attach an image of the build (photo or file):",
                    ));
                }

                let slot = content.trim();
                if !state.slots.iter().any(|s| s == slot)
                    || state.selected.contains_key(slot)
                {
                    return continue_with(Reply::text_with_keyboard(
                        "That module is unknown or already selected.",
                        Keyboard::paired(state.remaining_slots()),
                    ));
                }

                let options: Vec<ChoiceOption> = state
                    .variants
                    .get(slot)
                    .map(|variants| {
                        variants
                            .iter()
                            .map(|v| ChoiceOption::new(v.code.as_str(), v.label.as_str()))
                            .collect()
                    })
                    .unwrap_or_default();
                state.current_slot = Some(slot.to_string());
                Flow::Continue(vec![Reply::choices(
                    format!("Choose a variant for {slot}:"),
                    options,
                )])
            }
            InboundEvent::Choice { value } => self.on_variant_choice(state, value),
            InboundEvent::Image { .. } => continue_with(Reply::text(
                "Select all modules first, then send the image.",
            )),
            InboundEvent::Command { .. } => continue_with(Reply::text_with_keyboard(
                "Choose a module:",
                Keyboard::paired(state.remaining_slots()),
            )),
        }
    }

    fn on_variant_choice(&self, state: &mut CreateState, value: &str) -> Flow {
        let Some(slot) = state.current_slot.clone() else {
            return continue_with(Reply::text_with_keyboard(
                "Choose a module first:",
                Keyboard::paired(state.remaining_slots()),
            ));
        };
        let variant = state
            .variants
            .get(&slot)
            .and_then(|variants| variants.iter().find(|v| v.code == value))
            .cloned();
        let Some(variant) = variant else {
            return continue_with(Reply::text("Pick a variant from the list."));
        };

        state.selected.insert(slot.clone(), variant.code.clone());
        state.current_slot = None;

        let mut replies = vec![Reply::text(format!("{slot}: {}", variant.label))];
        if state.selected.len() >= state.target_count {
            state.step = CreateStep::ImageUpload;
            replies.push(Reply::text(
                "All modules selected. Now attach an image of the build (photo or file):",
            ));
        } else {
            replies.push(Reply::text_with_keyboard(
                "Choose the next module:",
                Keyboard::paired(state.remaining_slots()),
            ));
        }
        Flow::Continue(replies)
    }

    async fn on_image(
        &self,
        state: &mut CreateState,
        event: &InboundEvent,
    ) -> Result<Flow, HandlerError> {
        let InboundEvent::Image { asset } = event else {
            return Ok(continue_with(Reply::text(
                "Please attach the image as a photo or a file.",
            )));
        };

        let bytes = self.chat.fetch_asset(asset).await?;
        let path = self
            .assets
            .save(&format!("{}.jpg", state.draft_id), &bytes)
            .await?;

        state.image = Some(path);
        state.step = CreateStep::Confirmation;
        Ok(continue_with(Reply::text_with_keyboard(
            "Image received.\n\nPress \"Confirm\" to save the build, or \"Cancel\" to abort.",
            Keyboard::from_rows(vec![vec![
                BTN_CONFIRM.to_string(),
                BTN_CANCEL.to_string(),
            ]]),
        )))
    }

    async fn on_confirmation(
        &self,
        state: &mut CreateState,
        author: &str,
        event: &InboundEvent,
    ) -> Result<Flow, HandlerError> {
        let text = match event {
            InboundEvent::Text { content } => content.trim(),
            _ => "",
        };
        match text {
            BTN_CONFIRM => {
                let build = self.assemble(state, author)?;
                self.catalog.append(&build).await?;
                tracing::info!(build_id = %build.id, weapon = %build.weapon_name, "Build saved");

                state.step = CreateStep::PostConfirm;
                Ok(continue_with(Reply::text_with_keyboard(
                    "Build saved.\n\nWhat next?",
                    Keyboard::single_column([BTN_ADD_ANOTHER, BTN_HOME]),
                )))
            }
            BTN_CANCEL => Ok(Flow::Done(vec![Reply::text("Action cancelled.")])),
            _ => Ok(continue_with(Reply::text(
                "Please press \"Confirm\" to save the build, or \"Cancel\" to exit.",
            ))),
        }
    }

    fn on_post_confirm(&self, state: &mut CreateState, event: &InboundEvent) -> Flow {
        let text = match event {
            InboundEvent::Text { content } => content.trim(),
            _ => "",
        };
        match text {
            BTN_ADD_ANOTHER => {
                *state = CreateState::default();
                continue_with(Reply::text("Enter the weapon name:"))
            }
            BTN_HOME | BTN_CANCEL => Flow::Home(Vec::new()),
            _ => continue_with(Reply::text_with_keyboard(
                "What next?",
                Keyboard::single_column([BTN_ADD_ANOTHER, BTN_HOME]),
            )),
        }
    }

    /// Build the validated record from accumulated state.
    fn assemble(&self, state: &CreateState, author: &str) -> Result<Build, HandlerError> {
        let category = state
            .category
            .ok_or_else(|| DomainError::validation("category was never chosen"))?;
        let mode = state
            .mode
            .ok_or_else(|| DomainError::validation("mode was never chosen"))?;
        let type_key = state
            .type_key
            .as_deref()
            .ok_or_else(|| DomainError::validation("weapon type was never chosen"))?;
        let image = state
            .image
            .as_deref()
            .ok_or_else(|| DomainError::validation("image was never uploaded"))?;

        let build = Build::new(
            state.weapon_name.clone(),
            state.role.clone(),
            category,
            mode,
            type_key,
            state.selected.clone(),
            image,
            author,
        )?
        .with_id(state.draft_id);
        Ok(build)
    }
}

fn continue_with(reply: Reply) -> Flow {
    Flow::Continue(vec![reply])
}

fn category_keyboard() -> Keyboard {
    Keyboard::single_column(Category::ALL.map(|c| c.label()))
}

fn mode_keyboard() -> Keyboard {
    Keyboard::single_column([Mode::Warzone.label()])
}
