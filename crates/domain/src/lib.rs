//! Armory Domain - core types for the loadout catalog.
//!
//! This crate contains the persisted `Build` record, its closed vocabulary
//! types (`Category`, `Mode`), typed identifiers, and the domain error type.
//! No I/O and no transport concerns live here.

pub mod build;
pub mod error;
pub mod ids;

pub use build::{Build, Category, Mode};
pub use error::DomainError;
pub use ids::{BuildId, UserId};
