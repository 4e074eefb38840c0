//! Filesystem-backed adapters for the storage ports.

mod assets;
mod json_catalog;
mod reference_files;

pub use assets::FileAssetStore;
pub use json_catalog::JsonCatalogStore;
pub use reference_files::FileReferenceCatalog;
