//! Storage port traits: build catalog, reference catalog, image assets.

use std::collections::HashMap;

use async_trait::async_trait;

use armory_domain::{Build, BuildId};

use super::error::{AssetError, ReferenceError, StoreError};

/// One weapon type as listed in the reference catalog, in menu order.
#[derive(Debug, Clone, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub struct WeaponType {
    pub key: String,
    pub label: String,
}

/// One selectable variant for a module slot.
#[derive(Debug, Clone, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub struct Variant {
    pub code: String,
    pub label: String,
}

/// Ordered slot-name -> variants pairs for one weapon type.
pub type SlotModules = Vec<(String, Vec<Variant>)>;

/// The persisted build catalog.
///
/// All three operations are whole-file: there is no partial update. The
/// adapter serializes mutations so concurrent users cannot lose each
/// other's writes.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait CatalogStore: Send + Sync {
    /// Read every record. A missing backing file yields an empty catalog.
    async fn load(&self) -> Result<Vec<Build>, StoreError>;

    /// Load, push, rewrite.
    async fn append(&self, build: &Build) -> Result<(), StoreError>;

    /// Load, filter by id, rewrite. Returns whether a record was removed.
    async fn delete(&self, id: BuildId) -> Result<bool, StoreError>;
}

/// Static reference data: weapon types, their module slots and variants.
/// Read-only at runtime.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait ReferenceCatalog: Send + Sync {
    /// Ordered weapon types for the type-choice keyboard.
    async fn weapon_types(&self) -> Result<Vec<WeaponType>, ReferenceError>;

    /// Ordered module slots with their variants for one weapon type.
    async fn modules_for(&self, type_key: &str) -> Result<SlotModules, ReferenceError>;

    /// Flattened code -> label map for rendering. Codes are expected
    /// globally unique within a type; collisions resolve last-write-wins.
    async fn translation_for(&self, type_key: &str)
        -> Result<HashMap<String, String>, ReferenceError>;
}

/// Stored build images.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait AssetStore: Send + Sync {
    /// Persist image bytes under `name`, returning the asset path to record.
    async fn save(&self, name: &str, bytes: &[u8]) -> Result<String, AssetError>;

    /// Whether the asset at `path` still exists (render-time degrade check).
    async fn exists(&self, path: &str) -> bool;

    /// Read an asset back, for transports that upload from disk.
    async fn read(&self, path: &str) -> Result<Vec<u8>, AssetError>;
}
