//! Browse wizard: narrows the catalog by category, type, weapon and module
//! count, then walks the matches one record at a time.

use std::collections::BTreeSet;
use std::sync::Arc;

use armory_domain::{Build, Category, Mode};
use armory_shared::{InboundEvent, Keyboard, Reply};

use crate::errors::HandlerError;
use crate::infrastructure::ports::{AssetStore, CatalogStore, ReferenceCatalog};
use crate::render::{self, BTN_BROWSE, BTN_NEXT, BTN_PREV};
use crate::wizards::Flow;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum BrowseStep {
    #[default]
    CategorySelect,
    TypeSelect,
    WeaponSelect,
    CountSelect,
    Display,
}

/// Accumulated browse filters plus the current result window.
#[derive(Debug, Default)]
pub struct BrowseState {
    pub step: BrowseStep,
    pub category: Option<Category>,
    pub type_key: Option<String>,
    pub type_label: String,
    pub weapon: Option<String>,
    /// Matching records, in store order. Filled on entering `Display`.
    pub results: Vec<Build>,
    pub index: usize,
}

pub struct BrowseWizard {
    catalog: Arc<dyn CatalogStore>,
    reference: Arc<dyn ReferenceCatalog>,
    assets: Arc<dyn AssetStore>,
}

impl BrowseWizard {
    pub fn new(
        catalog: Arc<dyn CatalogStore>,
        reference: Arc<dyn ReferenceCatalog>,
        assets: Arc<dyn AssetStore>,
    ) -> Self {
        Self {
            catalog,
            reference,
            assets,
        }
    }

    /// Enter (or re-enter) the wizard at the category step.
    ///
    /// Returns `None` for the state when there is nothing to browse.
    pub async fn start(&self) -> Result<(Option<BrowseState>, Vec<Reply>), HandlerError> {
        let builds = self.warzone_builds().await?;
        if builds.is_empty() {
            return Ok((None, vec![Reply::text("No Warzone builds yet.")]));
        }

        let reply = Reply::text_with_keyboard("Choose a category:", category_keyboard(&builds));
        Ok((Some(BrowseState::default()), vec![reply]))
    }

    pub async fn handle(
        &self,
        state: &mut BrowseState,
        event: &InboundEvent,
    ) -> Result<Flow, HandlerError> {
        let text = match event {
            InboundEvent::Text { content } => content.trim(),
            // The browse wizard only consumes the text channel.
            _ => {
                return Ok(Flow::Continue(vec![Reply::text(
                    "Use the buttons to browse builds.",
                )]))
            }
        };

        match state.step {
            BrowseStep::CategorySelect => self.on_category(state, text).await,
            BrowseStep::TypeSelect => self.on_type(state, text).await,
            BrowseStep::WeaponSelect => self.on_weapon(state, text).await,
            BrowseStep::CountSelect => self.on_count(state, text).await,
            BrowseStep::Display => self.on_display(state, text).await,
        }
    }

    async fn on_category(&self, state: &mut BrowseState, text: &str) -> Result<Flow, HandlerError> {
        let builds = self.warzone_builds().await?;
        let Some(category) = Category::from_label(strip_count_suffix(text)) else {
            return Ok(Flow::Continue(vec![Reply::text_with_keyboard(
                "Please choose a category from the keyboard.",
                category_keyboard(&builds),
            )]));
        };

        let type_keys: BTreeSet<String> = builds
            .iter()
            .filter(|b| b.category == category)
            .map(|b| b.weapon_type.clone())
            .collect();
        if type_keys.is_empty() {
            return Ok(Flow::Done(vec![Reply::text(
                "No builds in this category yet.",
            )]));
        }

        let labels = self.type_labels(&type_keys).await;
        state.category = Some(category);
        state.step = BrowseStep::TypeSelect;
        Ok(Flow::Continue(vec![Reply::text_with_keyboard(
            "Choose a weapon type:",
            render::with_home(Keyboard::single_column(labels)),
        )]))
    }

    async fn on_type(&self, state: &mut BrowseState, text: &str) -> Result<Flow, HandlerError> {
        let category = state.category.unwrap_or_default();
        let builds = self.warzone_builds().await?;
        let type_keys: BTreeSet<String> = builds
            .iter()
            .filter(|b| b.category == category)
            .map(|b| b.weapon_type.clone())
            .collect();

        let Some((key, label)) = self.resolve_type_label(&type_keys, text).await else {
            let labels = self.type_labels(&type_keys).await;
            return Ok(Flow::Continue(vec![Reply::text_with_keyboard(
                "Please choose a weapon type from the keyboard.",
                render::with_home(Keyboard::single_column(labels)),
            )]));
        };

        let weapons: BTreeSet<&str> = builds
            .iter()
            .filter(|b| b.category == category && b.weapon_type == key)
            .map(|b| b.weapon_name.as_str())
            .collect();
        if weapons.is_empty() {
            return Ok(Flow::Done(vec![Reply::text("No builds for this type yet.")]));
        }

        state.type_key = Some(key);
        state.type_label = label;
        state.step = BrowseStep::WeaponSelect;
        Ok(Flow::Continue(vec![Reply::text_with_keyboard(
            "Choose a weapon:",
            render::with_home(Keyboard::single_column(weapons)),
        )]))
    }

    async fn on_weapon(&self, state: &mut BrowseState, text: &str) -> Result<Flow, HandlerError> {
        let category = state.category.unwrap_or_default();
        let type_key = state.type_key.clone().unwrap_or_default();
        let builds = self.warzone_builds().await?;

        let known = builds
            .iter()
            .any(|b| b.category == category && b.weapon_type == type_key && b.weapon_name == text);
        if !known {
            let weapons: BTreeSet<&str> = builds
                .iter()
                .filter(|b| b.category == category && b.weapon_type == type_key)
                .map(|b| b.weapon_name.as_str())
                .collect();
            return Ok(Flow::Continue(vec![Reply::text_with_keyboard(
                "Please choose a weapon from the keyboard.",
                render::with_home(Keyboard::single_column(weapons)),
            )]));
        }

        state.weapon = Some(text.to_string());
        state.step = BrowseStep::CountSelect;
        Ok(Flow::Continue(vec![Reply::text_with_keyboard(
            "Choose a module count:",
            count_keyboard(&builds, &type_key, text),
        )]))
    }

    async fn on_count(&self, state: &mut BrowseState, text: &str) -> Result<Flow, HandlerError> {
        self.apply_count_filter(state, text).await
    }

    async fn on_display(&self, state: &mut BrowseState, text: &str) -> Result<Flow, HandlerError> {
        match text {
            BTN_NEXT => {
                // Clamped: a press at the last record is a no-op.
                if state.index + 1 < state.results.len() {
                    state.index += 1;
                    return self.render_current(state).await.map(Flow::Continue);
                }
                Ok(Flow::Continue(Vec::new()))
            }
            BTN_PREV => {
                if state.index > 0 {
                    state.index -= 1;
                    return self.render_current(state).await.map(Flow::Continue);
                }
                Ok(Flow::Continue(Vec::new()))
            }
            _ if leading_count(text).is_some() => self.apply_count_filter(state, text).await,
            _ => Ok(Flow::Continue(vec![Reply::text(
                "Use the navigation buttons, or pick a module count.",
            )])),
        }
    }

    /// Shared by `CountSelect` and `Display`: parse the leading integer off
    /// the button label and filter. An empty result re-shows refreshed count
    /// buttons without leaving the current step.
    async fn apply_count_filter(
        &self,
        state: &mut BrowseState,
        text: &str,
    ) -> Result<Flow, HandlerError> {
        let category = state.category.unwrap_or_default();
        let type_key = state.type_key.clone().unwrap_or_default();
        let weapon = state.weapon.clone().unwrap_or_default();
        let builds = self.warzone_builds().await?;

        let Some(count) = leading_count(text) else {
            return Ok(Flow::Continue(vec![Reply::text_with_keyboard(
                "Please choose a module count from the keyboard.",
                count_keyboard(&builds, &type_key, &weapon),
            )]));
        };

        let filtered = filter_builds(&builds, &type_key, &weapon, category, count);
        if filtered.is_empty() {
            return Ok(Flow::Continue(vec![Reply::text_with_keyboard(
                "No matching builds found.\n\nChoose another module count:",
                count_keyboard(&builds, &type_key, &weapon),
            )]));
        }

        state.results = filtered;
        state.index = 0;
        state.step = BrowseStep::Display;
        self.render_current(state).await.map(Flow::Continue)
    }

    /// Render the record at the current index, with conditional navigation.
    async fn render_current(&self, state: &BrowseState) -> Result<Vec<Reply>, HandlerError> {
        let Some(build) = state.results.get(state.index) else {
            return Ok(vec![Reply::text("Nothing to show.")]);
        };

        // Missing reference data degrades to raw codes instead of failing
        // the whole record display.
        let translation = match self.reference.translation_for(&build.weapon_type).await {
            Ok(map) => map,
            Err(e) => {
                tracing::warn!("No translation for type {}: {e}", build.weapon_type);
                Default::default()
            }
        };
        let type_label = if state.type_label.is_empty() {
            build.weapon_type.clone()
        } else {
            state.type_label.clone()
        };
        let caption = render::build_caption(build, &type_label, &translation);

        let mut nav_row = Vec::new();
        if state.index > 0 {
            nav_row.push(BTN_PREV.to_string());
        }
        if state.index + 1 < state.results.len() {
            nav_row.push(BTN_NEXT.to_string());
        }
        let mut rows = Vec::new();
        if !nav_row.is_empty() {
            rows.push(nav_row);
        }
        rows.push(vec![BTN_BROWSE.to_string()]);
        let keyboard = render::with_home(Keyboard::from_rows(rows));

        // Asset gone from disk: degrade to a text-only rendering.
        let reply = if self.assets.exists(&build.image).await {
            Reply::image(build.image.as_str(), caption, Some(keyboard))
        } else {
            Reply::text_with_keyboard(caption, keyboard)
        };
        Ok(vec![reply])
    }

    async fn warzone_builds(&self) -> Result<Vec<Build>, HandlerError> {
        let mut builds = self.catalog.load().await?;
        builds.retain(|b| b.mode == Mode::Warzone);
        Ok(builds)
    }

    /// Display labels for a set of type keys, falling back to the raw key
    /// for types the reference catalog no longer lists.
    async fn type_labels(&self, keys: &BTreeSet<String>) -> Vec<String> {
        let reference = self.reference.weapon_types().await.unwrap_or_default();
        keys.iter()
            .map(|key| {
                reference
                    .iter()
                    .find(|t| &t.key == key)
                    .map(|t| t.label.clone())
                    .unwrap_or_else(|| key.clone())
            })
            .collect()
    }

    async fn resolve_type_label(
        &self,
        keys: &BTreeSet<String>,
        label: &str,
    ) -> Option<(String, String)> {
        let reference = self.reference.weapon_types().await.unwrap_or_default();
        keys.iter().find_map(|key| {
            let display = reference
                .iter()
                .find(|t| &t.key == key)
                .map(|t| t.label.clone())
                .unwrap_or_else(|| key.clone());
            (display == label).then(|| (key.clone(), display))
        })
    }
}

/// Filter the catalog by the full browse facet set, preserving store order.
pub(crate) fn filter_builds(
    builds: &[Build],
    type_key: &str,
    weapon: &str,
    category: Category,
    count: usize,
) -> Vec<Build> {
    builds
        .iter()
        .filter(|b| {
            b.weapon_type == type_key
                && b.weapon_name == weapon
                && b.category == category
                && b.module_count() == count
        })
        .cloned()
        .collect()
}

/// "8 (3)" -> 8. Button labels carry live counts after the number.
fn leading_count(text: &str) -> Option<usize> {
    text.split_whitespace().next()?.parse().ok()
}

/// "Meta (3)" -> "Meta".
fn strip_count_suffix(text: &str) -> &str {
    match text.rsplit_once(" (") {
        Some((label, rest)) if rest.ends_with(')') => label,
        _ => text,
    }
}

fn category_keyboard(builds: &[Build]) -> Keyboard {
    let labels = Category::ALL.into_iter().filter_map(|category| {
        let count = builds.iter().filter(|b| b.category == category).count();
        (count > 0).then(|| format!("{} ({count})", category.label()))
    });
    render::with_home(Keyboard::single_column(labels))
}

fn count_keyboard(builds: &[Build], type_key: &str, weapon: &str) -> Keyboard {
    let count_for = |n: usize| {
        builds
            .iter()
            .filter(|b| {
                b.weapon_type == type_key && b.weapon_name == weapon && b.module_count() == n
            })
            .count()
    };
    render::with_home(Keyboard::single_column([
        format!("5 ({})", count_for(5)),
        format!("8 ({})", count_for(8)),
    ]))
}

#[cfg(test)]
mod tests {
    use std::collections::BTreeMap;

    use super::*;

    fn build(name: &str, type_key: &str, category: Category, count: usize) -> Build {
        let modules: BTreeMap<String, String> = (0..count)
            .map(|i| (format!("Slot {i}"), format!("code-{i}")))
            .collect();
        Build::new(
            name,
            "Mid",
            category,
            Mode::Warzone,
            type_key,
            modules,
            "images/x.jpg",
            "Tester",
        )
        .expect("valid build")
    }

    #[test]
    fn filtering_is_idempotent() {
        let builds = vec![
            build("M4A1", "assault", Category::Meta, 5),
            build("M4A1", "assault", Category::Meta, 8),
            build("M4A1", "assault", Category::New, 5),
            build("AK-47", "assault", Category::Meta, 5),
        ];

        let once = filter_builds(&builds, "assault", "M4A1", Category::Meta, 5);
        let twice = filter_builds(&once, "assault", "M4A1", Category::Meta, 5);
        assert_eq!(once.len(), 1);
        assert_eq!(once, twice);
    }

    #[test]
    fn leading_count_parses_annotated_labels() {
        assert_eq!(leading_count("5 (3)"), Some(5));
        assert_eq!(leading_count("8"), Some(8));
        assert_eq!(leading_count("lots"), None);
    }

    #[test]
    fn count_suffix_stripping() {
        assert_eq!(strip_count_suffix("Meta (3)"), "Meta");
        assert_eq!(strip_count_suffix("Meta"), "Meta");
        assert_eq!(strip_count_suffix("Top meta (12)"), "Top meta");
    }

    #[test]
    fn category_keyboard_skips_empty_categories() {
        let builds = vec![
            build("M4A1", "assault", Category::Meta, 5),
            build("AK-47", "assault", Category::Meta, 5),
        ];
        let kb = category_keyboard(&builds);
        assert!(kb.rows.iter().any(|row| row[0] == "Meta (2)"));
        assert!(!kb
            .rows
            .iter()
            .any(|row| row[0].starts_with("Top meta")));
    }
}
