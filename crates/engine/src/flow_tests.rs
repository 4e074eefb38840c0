//! End-to-end wizard flows driven through the dispatcher.
//!
//! Uses in-memory fakes for every port: a Vec-backed catalog, a fixed
//! reference catalog, and a chat transport that records outbound replies
//! instead of sending them.

use std::collections::{BTreeMap, HashMap, HashSet};
use std::sync::Arc;
use std::sync::Mutex;

use async_trait::async_trait;

use armory_domain::{Build, BuildId, Category, Mode, UserId};
use armory_shared::{ChoiceOption, Envelope, InboundEvent, Keyboard, Reply};

use crate::app::{App, AppConfig};
use crate::dispatch::{DispatchOutcome, Dispatcher};
use crate::infrastructure::ports::{
    AssetError, AssetStore, CatalogStore, ChatError, ChatPort, ReferenceCatalog, ReferenceError,
    SlotModules, StoreError, Variant, WeaponType,
};
use crate::infrastructure::restart_marker::RestartMarker;

const ADMIN: i64 = 1;
const GUEST: i64 = 2;

const ASSAULT_SLOTS: [&str; 8] = [
    "Muzzle",
    "Barrel",
    "Optic",
    "Underbarrel",
    "Magazine",
    "Stock",
    "Laser",
    "Rear Grip",
];

// =============================================================================
// Fakes
// =============================================================================

struct InMemoryCatalog {
    builds: Mutex<Vec<Build>>,
}

impl InMemoryCatalog {
    fn new(seed: Vec<Build>) -> Self {
        Self {
            builds: Mutex::new(seed),
        }
    }

    fn snapshot(&self) -> Vec<Build> {
        self.builds.lock().expect("lock").clone()
    }
}

#[async_trait]
impl CatalogStore for InMemoryCatalog {
    async fn load(&self) -> Result<Vec<Build>, StoreError> {
        Ok(self.snapshot())
    }

    async fn append(&self, build: &Build) -> Result<(), StoreError> {
        self.builds.lock().expect("lock").push(build.clone());
        Ok(())
    }

    async fn delete(&self, id: BuildId) -> Result<bool, StoreError> {
        let mut builds = self.builds.lock().expect("lock");
        let before = builds.len();
        builds.retain(|b| b.id != id);
        Ok(builds.len() != before)
    }
}

struct FixedReference;

fn slots_for(prefix: &str) -> SlotModules {
    ASSAULT_SLOTS
        .iter()
        .map(|slot| {
            let slug = slot.to_lowercase().replace(' ', "-");
            let variants = vec![
                Variant {
                    code: format!("{prefix}-{slug}-a"),
                    label: format!("{slot} A"),
                },
                Variant {
                    code: format!("{prefix}-{slug}-b"),
                    label: format!("{slot} B"),
                },
            ];
            ((*slot).to_string(), variants)
        })
        .collect()
}

#[async_trait]
impl ReferenceCatalog for FixedReference {
    async fn weapon_types(&self) -> Result<Vec<WeaponType>, ReferenceError> {
        Ok(vec![
            WeaponType {
                key: "assault".to_string(),
                label: "Assault rifles".to_string(),
            },
            WeaponType {
                key: "sniper".to_string(),
                label: "Sniper rifles".to_string(),
            },
        ])
    }

    async fn modules_for(&self, type_key: &str) -> Result<SlotModules, ReferenceError> {
        match type_key {
            "assault" | "sniper" => Ok(slots_for(type_key)),
            other => Err(ReferenceError::UnknownType(other.to_string())),
        }
    }

    async fn translation_for(
        &self,
        type_key: &str,
    ) -> Result<HashMap<String, String>, ReferenceError> {
        let mut map = HashMap::new();
        for (_, variants) in self.modules_for(type_key).await? {
            for v in variants {
                map.insert(v.code, v.label);
            }
        }
        Ok(map)
    }
}

struct FakeAssets {
    existing: Mutex<HashSet<String>>,
}

impl FakeAssets {
    fn new() -> Self {
        Self {
            existing: Mutex::new(HashSet::new()),
        }
    }
}

#[async_trait]
impl AssetStore for FakeAssets {
    async fn save(&self, name: &str, _bytes: &[u8]) -> Result<String, AssetError> {
        let path = format!("images/{name}");
        self.existing.lock().expect("lock").insert(path.clone());
        Ok(path)
    }

    async fn exists(&self, path: &str) -> bool {
        self.existing.lock().expect("lock").contains(path)
    }

    async fn read(&self, path: &str) -> Result<Vec<u8>, AssetError> {
        if self.exists(path).await {
            Ok(b"image-bytes".to_vec())
        } else {
            Err(AssetError::Missing(path.to_string()))
        }
    }
}

#[derive(Default)]
struct RecordingChat {
    sent: Mutex<Vec<(UserId, Reply)>>,
}

impl RecordingChat {
    fn sent(&self) -> Vec<(UserId, Reply)> {
        self.sent.lock().expect("lock").clone()
    }

    fn sent_count(&self) -> usize {
        self.sent.lock().expect("lock").len()
    }

    fn last_body(&self) -> String {
        match self.sent.lock().expect("lock").last() {
            Some((_, Reply::Text { body, .. })) => body.clone(),
            Some((_, Reply::Image { caption, .. })) => caption.clone(),
            Some((_, Reply::Choices { prompt, .. })) => prompt.clone(),
            None => String::new(),
        }
    }

    fn last_keyboard(&self) -> Option<Keyboard> {
        match self.sent.lock().expect("lock").last() {
            Some((_, Reply::Text { keyboard, .. })) => keyboard.clone(),
            Some((_, Reply::Image { keyboard, .. })) => keyboard.clone(),
            _ => None,
        }
    }

    fn last_choices(&self) -> Vec<ChoiceOption> {
        self.sent
            .lock()
            .expect("lock")
            .iter()
            .rev()
            .find_map(|(_, reply)| match reply {
                Reply::Choices { options, .. } => Some(options.clone()),
                _ => None,
            })
            .unwrap_or_default()
    }
}

#[async_trait]
impl ChatPort for RecordingChat {
    async fn send_text<'a>(
        &self,
        user: UserId,
        body: &str,
        keyboard: Option<&'a Keyboard>,
    ) -> Result<(), ChatError> {
        self.sent.lock().expect("lock").push((
            user,
            Reply::Text {
                body: body.to_string(),
                keyboard: keyboard.cloned(),
            },
        ));
        Ok(())
    }

    async fn send_image<'a>(
        &self,
        user: UserId,
        asset: &str,
        caption: &str,
        keyboard: Option<&'a Keyboard>,
    ) -> Result<(), ChatError> {
        self.sent.lock().expect("lock").push((
            user,
            Reply::Image {
                asset: asset.to_string(),
                caption: caption.to_string(),
                keyboard: keyboard.cloned(),
            },
        ));
        Ok(())
    }

    async fn present_choices(
        &self,
        user: UserId,
        prompt: &str,
        options: &[ChoiceOption],
    ) -> Result<(), ChatError> {
        self.sent.lock().expect("lock").push((
            user,
            Reply::Choices {
                prompt: prompt.to_string(),
                options: options.to_vec(),
            },
        ));
        Ok(())
    }

    async fn fetch_asset(&self, _handle: &str) -> Result<Vec<u8>, ChatError> {
        Ok(b"downloaded-image".to_vec())
    }
}

// =============================================================================
// Harness
// =============================================================================

struct Harness {
    app: Arc<App>,
    dispatcher: Dispatcher,
    chat: Arc<RecordingChat>,
    catalog: Arc<InMemoryCatalog>,
    tmp: tempfile::TempDir,
}

impl Harness {
    fn new(seed: Vec<Build>) -> Self {
        let tmp = tempfile::tempdir().expect("tempdir");
        let catalog = Arc::new(InMemoryCatalog::new(seed));
        let chat = Arc::new(RecordingChat::default());
        let app = Arc::new(App::new(
            AppConfig::new(vec![UserId::new(ADMIN)]),
            catalog.clone(),
            Arc::new(FixedReference),
            Arc::new(FakeAssets::new()),
            chat.clone(),
            RestartMarker::new(tmp.path().join("restart_message.txt")),
        ));
        Self {
            app: app.clone(),
            dispatcher: Dispatcher::new(app),
            chat,
            catalog,
            tmp,
        }
    }

    fn display_name(user: i64) -> &'static str {
        if user == ADMIN {
            "Admin Tester"
        } else {
            "Guest"
        }
    }

    async fn event(&self, user: i64, event: InboundEvent) -> DispatchOutcome {
        self.dispatcher
            .dispatch(Envelope::new(
                UserId::new(user),
                Self::display_name(user),
                event,
            ))
            .await
    }

    async fn text(&self, user: i64, content: &str) -> DispatchOutcome {
        self.event(
            user,
            InboundEvent::Text {
                content: content.to_string(),
            },
        )
        .await
    }

    async fn choice(&self, user: i64, value: &str) -> DispatchOutcome {
        self.event(
            user,
            InboundEvent::Choice {
                value: value.to_string(),
            },
        )
        .await
    }

    async fn command(&self, user: i64, name: &str) -> DispatchOutcome {
        self.event(
            user,
            InboundEvent::Command {
                name: name.to_string(),
            },
        )
        .await
    }

    async fn image(&self, user: i64, asset: &str) -> DispatchOutcome {
        self.event(
            user,
            InboundEvent::Image {
                asset: asset.to_string(),
            },
        )
        .await
    }

    async fn is_idle(&self, user: i64) -> bool {
        let handle = self.app.sessions.session(UserId::new(user));
        let session = handle.lock().await;
        session.is_idle()
    }
}

fn seed_build(name: &str, type_key: &str, category: Category, count: usize, role: &str) -> Build {
    let slots = slots_for(type_key);
    let modules: BTreeMap<String, String> = slots
        .into_iter()
        .take(count)
        .map(|(slot, variants)| (slot, variants[0].code.clone()))
        .collect();
    Build::new(
        name,
        role,
        category,
        Mode::Warzone,
        type_key,
        modules,
        "images/missing.jpg",
        "Seeder",
    )
    .expect("valid seed build")
}

// =============================================================================
// Creation
// =============================================================================

#[tokio::test]
async fn full_creation_flow_persists_a_valid_build() {
    let h = Harness::new(Vec::new());

    h.command(ADMIN, "add").await;
    assert_eq!(h.chat.last_body(), "Enter the weapon name:");

    h.text(ADMIN, "M4A1").await;
    h.text(ADMIN, "Mid range").await;
    h.text(ADMIN, "Meta").await;
    h.text(ADMIN, "Warzone").await;
    h.text(ADMIN, "Assault rifles").await;
    h.text(ADMIN, "5").await;
    assert_eq!(h.chat.last_body(), "Choose a module:");

    // Select exactly five distinct slots, each resolved on the choice surface.
    for slot in &ASSAULT_SLOTS[..5] {
        h.text(ADMIN, slot).await;
        let options = h.chat.last_choices();
        assert!(!options.is_empty(), "variants offered for {slot}");
        h.choice(ADMIN, &options[0].value).await;
    }
    assert!(h.chat.last_body().contains("attach an image"));

    h.image(ADMIN, "file-99").await;
    assert!(h.chat.last_body().contains("Confirm"));

    h.text(ADMIN, "Confirm").await;
    assert!(h.chat.last_body().contains("Build saved"));

    let builds = h.catalog.snapshot();
    assert_eq!(builds.len(), 1);
    let build = &builds[0];
    assert_eq!(build.module_count(), 5);
    assert_eq!(build.weapon_type, "assault");
    assert_eq!(build.category, Category::Meta);
    assert_eq!(build.author, "Admin Tester");
    // Every slot/variant pair is legal for the chosen type.
    let reference = slots_for("assault");
    for (slot, code) in &build.modules {
        let variants = reference
            .iter()
            .find(|(s, _)| s == slot)
            .map(|(_, v)| v)
            .expect("slot is a legal slot");
        assert!(variants.iter().any(|v| &v.code == code));
    }
    // Image asset is named after the record id.
    assert_eq!(build.image, format!("images/{}.jpg", build.id));
}

#[tokio::test]
async fn guest_cannot_enter_the_creation_wizard() {
    let h = Harness::new(Vec::new());

    h.text(GUEST, "Add build").await;
    assert!(h.chat.last_body().contains("permission"));
    assert!(h.is_idle(GUEST).await);
    assert!(h.catalog.snapshot().is_empty());
}

#[tokio::test]
async fn cancel_at_confirmation_discards_the_draft() {
    let h = Harness::new(Vec::new());

    h.command(ADMIN, "add").await;
    h.text(ADMIN, "M4A1").await;
    h.text(ADMIN, "Close").await;
    h.text(ADMIN, "New").await;
    h.text(ADMIN, "Warzone").await;
    h.text(ADMIN, "Assault rifles").await;
    h.text(ADMIN, "5").await;
    for slot in &ASSAULT_SLOTS[..5] {
        h.text(ADMIN, slot).await;
        let options = h.chat.last_choices();
        h.choice(ADMIN, &options[0].value).await;
    }
    h.image(ADMIN, "file-1").await;
    h.text(ADMIN, "Cancel").await;

    assert!(h.catalog.snapshot().is_empty());
    assert!(h.is_idle(ADMIN).await);
}

#[tokio::test]
async fn home_button_abandons_a_wizard_midway() {
    let h = Harness::new(Vec::new());

    h.command(ADMIN, "add").await;
    h.text(ADMIN, "M4A1").await;
    h.text(ADMIN, "Main menu").await;

    assert!(h.is_idle(ADMIN).await);
    assert!(h.chat.last_body().contains("Welcome"));
}

// =============================================================================
// Browsing
// =============================================================================

async fn browse_to_display(h: &Harness, count_label: &str) {
    h.text(GUEST, "Warzone builds").await;
    h.text(GUEST, "Meta (3)").await;
    h.text(GUEST, "Assault rifles").await;
    h.text(GUEST, "M4A1").await;
    h.text(GUEST, count_label).await;
}

fn browse_seed() -> Vec<Build> {
    vec![
        seed_build("M4A1", "assault", Category::Meta, 5, "first"),
        seed_build("M4A1", "assault", Category::Meta, 5, "second"),
        seed_build("M4A1", "assault", Category::Meta, 5, "third"),
        seed_build("AK-47", "assault", Category::New, 8, "other"),
    ]
}

#[tokio::test]
async fn browse_narrows_and_renders_the_first_match() {
    let h = Harness::new(browse_seed());

    h.text(GUEST, "Warzone builds").await;
    let kb = h.chat.last_keyboard().expect("category keyboard");
    assert!(kb.rows.iter().any(|r| r[0] == "Meta (3)"));
    assert!(kb.rows.iter().any(|r| r[0] == "New (1)"));

    h.text(GUEST, "Meta (3)").await;
    h.text(GUEST, "Assault rifles").await;
    h.text(GUEST, "M4A1").await;
    let kb = h.chat.last_keyboard().expect("count keyboard");
    assert!(kb.rows.iter().any(|r| r[0] == "5 (3)"));
    assert!(kb.rows.iter().any(|r| r[0] == "8 (0)"));

    h.text(GUEST, "5 (3)").await;
    let body = h.chat.last_body();
    assert!(body.contains("Weapon: M4A1"));
    assert!(body.contains("Range: first"));
    // Slot codes render through the translation map.
    assert!(body.contains("Muzzle: Muzzle A"));

    // Only forward navigation from index 0.
    let kb = h.chat.last_keyboard().expect("nav keyboard");
    assert!(kb.rows[0].contains(&"Next".to_string()));
    assert!(!kb.rows[0].contains(&"Previous".to_string()));
}

#[tokio::test]
async fn navigation_clamps_at_both_ends() {
    let h = Harness::new(browse_seed());
    browse_to_display(&h, "5 (3)").await;
    assert!(h.chat.last_body().contains("Range: first"));

    // L-1 presses from index 0 reach the last record.
    h.text(GUEST, "Next").await;
    h.text(GUEST, "Next").await;
    assert!(h.chat.last_body().contains("Range: third"));

    // At the last index, "Next" is a no-op: nothing new is sent.
    let before = h.chat.sent_count();
    h.text(GUEST, "Next").await;
    assert_eq!(h.chat.sent_count(), before);

    h.text(GUEST, "Previous").await;
    h.text(GUEST, "Previous").await;
    assert!(h.chat.last_body().contains("Range: first"));

    let before = h.chat.sent_count();
    h.text(GUEST, "Previous").await;
    assert_eq!(h.chat.sent_count(), before);
}

#[tokio::test]
async fn empty_count_selection_keeps_the_step_with_refreshed_buttons() {
    let h = Harness::new(browse_seed());
    browse_to_display(&h, "8 (0)").await;

    assert!(h.chat.last_body().contains("No matching builds found"));
    let kb = h.chat.last_keyboard().expect("refreshed count keyboard");
    assert!(kb.rows.iter().any(|r| r[0] == "5 (3)"));
    assert!(kb.rows.iter().any(|r| r[0] == "8 (0)"));

    // Still in the count-accepting step: a valid count now renders.
    h.text(GUEST, "5 (3)").await;
    assert!(h.chat.last_body().contains("Weapon: M4A1"));
}

#[tokio::test]
async fn browse_with_empty_catalog_ends_immediately() {
    let h = Harness::new(Vec::new());

    h.text(GUEST, "Warzone builds").await;
    assert!(h.chat.last_body().contains("No Warzone builds yet"));
    assert!(h.is_idle(GUEST).await);
}

// =============================================================================
// Deletion
// =============================================================================

#[tokio::test]
async fn delete_removes_exactly_the_identified_record() {
    let seed = browse_seed();
    let keep = seed[0].id;
    let doomed = seed[1].id;
    let h = Harness::new(seed);

    h.command(ADMIN, "delete").await;
    assert!(h.chat.last_body().contains("(ID 1)"));
    assert!(h.chat.last_body().contains("(ID 2)"));

    h.text(ADMIN, "2").await;
    assert!(h.chat.last_body().contains("Delete build M4A1 (ID: 2)?"));

    let before = h.catalog.snapshot().len();
    h.text(ADMIN, "Yes").await;

    let after = h.catalog.snapshot();
    assert_eq!(after.len(), before - 1);
    assert!(after.iter().any(|b| b.id == keep));
    assert!(!after.iter().any(|b| b.id == doomed));
    // Back at the (renumbered) listing.
    assert!(h.chat.last_body().contains("Enter the build ID"));
}

#[tokio::test]
async fn guest_delete_is_denied_without_creating_state() {
    let h = Harness::new(browse_seed());

    h.command(GUEST, "delete").await;
    assert!(h.chat.last_body().contains("permission"));
    assert!(h.is_idle(GUEST).await);
    assert_eq!(h.catalog.snapshot().len(), 4);
}

// =============================================================================
// Commands and shutdown
// =============================================================================

#[tokio::test]
async fn unknown_command_and_free_text_get_hints() {
    let h = Harness::new(Vec::new());

    h.command(GUEST, "hack").await;
    assert!(h.chat.last_body().contains("don't know that command"));

    h.text(GUEST, "hello there").await;
    assert!(h.chat.last_body().contains("Use the buttons"));
}

#[tokio::test]
async fn status_and_show_all_are_admin_only() {
    let h = Harness::new(browse_seed());

    h.command(GUEST, "status").await;
    assert!(h.chat.last_body().contains("permission"));

    h.command(ADMIN, "status").await;
    assert!(h.chat.last_body().contains("Total builds: 4"));

    h.command(ADMIN, "show_all").await;
    assert!(h.chat.last_body().contains("1. M4A1"));
}

#[tokio::test]
async fn restart_writes_the_marker_and_shuts_down() {
    let h = Harness::new(Vec::new());

    assert_eq!(h.command(GUEST, "restart").await, DispatchOutcome::Continue);

    let outcome = h.command(ADMIN, "restart").await;
    assert_eq!(outcome, DispatchOutcome::Shutdown);

    let marker = std::fs::read_to_string(h.tmp.path().join("restart_message.txt"))
        .expect("marker written");
    assert_eq!(marker.trim(), ADMIN.to_string());
}

#[tokio::test]
async fn users_browse_independently() {
    let h = Harness::new(browse_seed());

    // Two users in different wizards at once.
    h.command(ADMIN, "add").await;
    h.text(GUEST, "Warzone builds").await;
    h.text(GUEST, "Meta (3)").await;

    assert!(!h.is_idle(ADMIN).await);
    assert!(!h.is_idle(GUEST).await);

    // The admin's create wizard still expects a weapon name.
    h.text(ADMIN, "M4A1").await;
    let admin_last = h
        .chat
        .sent()
        .iter()
        .rev()
        .find(|(u, _)| *u == UserId::new(ADMIN))
        .map(|(_, r)| r.clone());
    assert!(
        matches!(admin_last, Some(Reply::Text { body, .. }) if body.contains("range")),
        "create wizard advanced independently"
    );
}
