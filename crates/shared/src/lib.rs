//! Armory Shared - wire types between the engine and chat front-ends.
//!
//! This crate contains the event and reply types carried over whatever
//! transport delivers chat traffic (long-poll HTTP, tests, future
//! websockets):
//! - Inbound events (`InboundEvent`, `Envelope`)
//! - Outbound replies (`Reply`, `Keyboard`, `ChoiceOption`)
//!
//! # Design Principles
//!
//! 1. **Minimal dependencies** - only serde and the domain vocabulary
//! 2. **No business logic** - pure data types and serialization

pub mod messages;

pub use messages::{ChoiceOption, Envelope, InboundEvent, Keyboard, Reply};
