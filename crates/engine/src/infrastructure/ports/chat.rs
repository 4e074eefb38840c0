//! Chat transport port traits.
//!
//! The messaging platform is an external collaborator: the engine only ever
//! talks to these traits. Adapters translate to a concrete bot API.

use async_trait::async_trait;

use armory_domain::UserId;
use armory_shared::{ChoiceOption, Envelope, Keyboard};

use super::error::ChatError;

/// Outbound side of the transport.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait ChatPort: Send + Sync {
    async fn send_text<'a>(
        &self,
        user: UserId,
        body: &str,
        keyboard: Option<&'a Keyboard>,
    ) -> Result<(), ChatError>;

    async fn send_image<'a>(
        &self,
        user: UserId,
        asset: &str,
        caption: &str,
        keyboard: Option<&'a Keyboard>,
    ) -> Result<(), ChatError>;

    /// Present an ephemeral choice surface tied to one message. Selections
    /// come back as `InboundEvent::Choice`, decoupled from the text channel.
    async fn present_choices(
        &self,
        user: UserId,
        prompt: &str,
        options: &[ChoiceOption],
    ) -> Result<(), ChatError>;

    /// Download the bytes behind an image event's asset handle.
    async fn fetch_asset(&self, handle: &str) -> Result<Vec<u8>, ChatError>;
}

/// Inbound side of the transport: a blocking long-poll for the next batch
/// of events, in arrival order.
#[async_trait]
pub trait EventSource: Send + Sync {
    async fn next_batch(&self) -> Result<Vec<Envelope>, ChatError>;
}
