//! Port traits decoupling the engine from storage and transport.

mod catalog;
mod chat;
mod error;

pub use catalog::{AssetStore, CatalogStore, ReferenceCatalog, SlotModules, Variant, WeaponType};
pub use chat::{ChatPort, EventSource};
pub use error::{AssetError, ChatError, ReferenceError, StoreError};

#[cfg(test)]
pub use catalog::{MockAssetStore, MockCatalogStore, MockReferenceCatalog};
#[cfg(test)]
pub use chat::MockChatPort;
