//! File adapter for the reference catalog.
//!
//! Layout under the data directory:
//! - `types.json` - ordered `[{ "key": ..., "label": ... }]`
//! - `modules-<key>.json` - `{ "<slot name>": [{ "code": ..., "label": ... }] }`
//!
//! Reference data is immutable at runtime, so everything is cached after
//! the first read.

use std::collections::HashMap;
use std::io::ErrorKind;
use std::path::PathBuf;
use std::sync::Arc;

use async_trait::async_trait;
use tokio::sync::RwLock;

use crate::infrastructure::ports::{
    ReferenceCatalog, ReferenceError, SlotModules, Variant, WeaponType,
};

pub struct FileReferenceCatalog {
    dir: PathBuf,
    types: RwLock<Option<Arc<Vec<WeaponType>>>>,
    modules: RwLock<HashMap<String, Arc<SlotModules>>>,
}

impl FileReferenceCatalog {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self {
            dir: dir.into(),
            types: RwLock::new(None),
            modules: RwLock::new(HashMap::new()),
        }
    }

    async fn load_types(&self) -> Result<Arc<Vec<WeaponType>>, ReferenceError> {
        if let Some(cached) = self.types.read().await.as_ref() {
            return Ok(cached.clone());
        }

        let path = self.dir.join("types.json");
        let bytes = tokio::fs::read(&path)
            .await
            .map_err(|e| ReferenceError::Unreadable(format!("{}: {e}", path.display())))?;
        let types: Vec<WeaponType> = serde_json::from_slice(&bytes)
            .map_err(|e| ReferenceError::Malformed(format!("{}: {e}", path.display())))?;

        let types = Arc::new(types);
        *self.types.write().await = Some(types.clone());
        Ok(types)
    }

    async fn load_modules(&self, type_key: &str) -> Result<Arc<SlotModules>, ReferenceError> {
        if let Some(cached) = self.modules.read().await.get(type_key) {
            return Ok(cached.clone());
        }

        let path = self.dir.join(format!("modules-{type_key}.json"));
        let bytes = match tokio::fs::read(&path).await {
            Ok(bytes) => bytes,
            Err(e) if e.kind() == ErrorKind::NotFound => {
                return Err(ReferenceError::UnknownType(type_key.to_string()));
            }
            Err(e) => {
                return Err(ReferenceError::Unreadable(format!("{}: {e}", path.display())));
            }
        };

        // serde_json's preserve_order feature keeps slots in authored order.
        let raw: serde_json::Map<String, serde_json::Value> = serde_json::from_slice(&bytes)
            .map_err(|e| ReferenceError::Malformed(format!("{}: {e}", path.display())))?;

        let mut slots: SlotModules = Vec::with_capacity(raw.len());
        for (slot, value) in raw {
            let variants: Vec<Variant> = serde_json::from_value(value).map_err(|e| {
                ReferenceError::Malformed(format!("{}: slot {slot}: {e}", path.display()))
            })?;
            slots.push((slot, variants));
        }

        let slots = Arc::new(slots);
        self.modules
            .write()
            .await
            .insert(type_key.to_string(), slots.clone());
        Ok(slots)
    }
}

#[async_trait]
impl ReferenceCatalog for FileReferenceCatalog {
    async fn weapon_types(&self) -> Result<Vec<WeaponType>, ReferenceError> {
        Ok(self.load_types().await?.as_ref().clone())
    }

    async fn modules_for(&self, type_key: &str) -> Result<SlotModules, ReferenceError> {
        Ok(self.load_modules(type_key).await?.as_ref().clone())
    }

    async fn translation_for(
        &self,
        type_key: &str,
    ) -> Result<HashMap<String, String>, ReferenceError> {
        let slots = self.load_modules(type_key).await?;
        let mut map = HashMap::new();
        for (_, variants) in slots.iter() {
            for v in variants {
                map.insert(v.code.clone(), v.label.clone());
            }
        }
        Ok(map)
    }
}
