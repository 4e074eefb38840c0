//! Build entity - a persisted weapon loadout.

use std::collections::BTreeMap;
use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::{BuildId, DomainError};

/// Module counts a build may carry.
pub const ALLOWED_MODULE_COUNTS: [usize; 2] = [5, 8];

/// Closed set of build categories.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "kebab-case")]
pub enum Category {
    TopMeta,
    #[default]
    Meta,
    New,
}

impl Category {
    /// All categories, in menu order.
    pub const ALL: [Category; 3] = [Category::TopMeta, Category::Meta, Category::New];

    /// Human-readable button label.
    pub fn label(&self) -> &'static str {
        match self {
            Category::TopMeta => "Top meta",
            Category::Meta => "Meta",
            Category::New => "New",
        }
    }

    /// Match a button label back to a category.
    pub fn from_label(label: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|c| c.label() == label)
    }
}

impl fmt::Display for Category {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// Game mode a build targets. Currently a single supported value.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum Mode {
    #[default]
    Warzone,
}

impl Mode {
    pub fn label(&self) -> &'static str {
        match self {
            Mode::Warzone => "Warzone",
        }
    }

    pub fn from_label(label: &str) -> Option<Self> {
        (label == Mode::Warzone.label()).then_some(Mode::Warzone)
    }
}

impl fmt::Display for Mode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// A persisted weapon loadout.
///
/// Records are append-only: created through a completed creation wizard,
/// deleted wholesale by id, never edited in place.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Build {
    #[serde(default)]
    pub id: BuildId,
    pub weapon_name: String,
    /// Free-text role/range tag (the UI calls this "distance").
    #[serde(default)]
    pub role: String,
    #[serde(default)]
    pub category: Category,
    #[serde(default)]
    pub mode: Mode,
    /// Weapon-type key, foreign key into the reference catalog.
    #[serde(rename = "type")]
    pub weapon_type: String,
    /// Slot name -> selected variant code. Size is exactly 5 or 8.
    pub modules: BTreeMap<String, String>,
    /// Relative path of the stored image asset.
    #[serde(default)]
    pub image: String,
    /// Author display name captured at creation time (not a stable user id).
    #[serde(default)]
    pub author: String,
    #[serde(default = "Utc::now")]
    pub created_at: DateTime<Utc>,
}

impl Build {
    /// Create a validated build record with a fresh id.
    ///
    /// Slot/variant legality against the reference catalog is the creation
    /// wizard's responsibility; the domain enforces the shape invariants.
    pub fn new(
        weapon_name: impl Into<String>,
        role: impl Into<String>,
        category: Category,
        mode: Mode,
        weapon_type: impl Into<String>,
        modules: BTreeMap<String, String>,
        image: impl Into<String>,
        author: impl Into<String>,
    ) -> Result<Self, DomainError> {
        let weapon_name = weapon_name.into();
        if weapon_name.trim().is_empty() {
            return Err(DomainError::validation("weapon name cannot be empty"));
        }
        let weapon_type = weapon_type.into();
        if weapon_type.trim().is_empty() {
            return Err(DomainError::validation("weapon type cannot be empty"));
        }
        if !ALLOWED_MODULE_COUNTS.contains(&modules.len()) {
            return Err(DomainError::constraint(format!(
                "a build carries 5 or 8 modules, got {}",
                modules.len()
            )));
        }
        if modules.values().any(|code| code.trim().is_empty()) {
            return Err(DomainError::validation("module variant codes cannot be empty"));
        }

        Ok(Self {
            id: BuildId::new(),
            weapon_name,
            role: role.into(),
            category,
            mode,
            weapon_type,
            modules,
            image: image.into(),
            author: author.into(),
            created_at: Utc::now(),
        })
    }

    /// Replace the generated id with a pre-assigned one.
    ///
    /// The creation wizard mints the id up front so the image asset can be
    /// stored under it before the record is committed.
    pub fn with_id(mut self, id: BuildId) -> Self {
        self.id = id;
        self
    }

    pub fn module_count(&self) -> usize {
        self.modules.len()
    }
}
